//! Registration-time checks on command definitions.
//!
//! Everything here fails fast with the first [`ConfigurationError`] found;
//! a command that passes can be invoked without any further structural
//! checks.

use std::collections::BTreeSet;

use crate::error::ConfigurationError;
use crate::parameter::{BindingBehavior, ConsumedCount, ParameterDescriptor, ParameterKind};

/// Aliases must exist and be non-blank.
pub fn validate_aliases(aliases: &[String]) -> Result<(), ConfigurationError> {
    let Some(primary) = aliases.first() else {
        return Err(ConfigurationError::NoAliases);
    };
    for alias in aliases {
        if alias.trim().is_empty() || alias.contains(' ') {
            return Err(ConfigurationError::EmptyAlias(primary.clone()));
        }
    }
    Ok(())
}

/// Checks one parameter against the binder it was paired with.
pub fn validate_parameter(
    command: &str,
    index: usize,
    parameter: &ParameterDescriptor,
) -> Result<(), ConfigurationError> {
    let binder = parameter.binder().name().to_string();
    let kind = parameter.kind();

    if let Some(flag) = kind.flag() {
        if !flag.is_ascii_alphabetic() {
            return Err(ConfigurationError::InvalidFlag {
                command: command.to_string(),
                flag,
            });
        }
    }

    match parameter.behavior() {
        BindingBehavior::Indeterminate if kind.flag().is_none() => {
            return Err(ConfigurationError::IndeterminateWithoutFlag {
                command: command.to_string(),
                index,
                binder,
            });
        }
        BindingBehavior::Provides => {
            if parameter.consumed_count() != ConsumedCount::Fixed(0) {
                return Err(ConfigurationError::ProvidesConsumes {
                    command: command.to_string(),
                    index,
                    binder,
                });
            }
            if kind != ParameterKind::Provided {
                return Err(ConfigurationError::KindMismatch {
                    command: command.to_string(),
                    index,
                    declared: kind.label(),
                    binder,
                });
            }
        }
        BindingBehavior::Consumes | BindingBehavior::Indeterminate => {
            if parameter.consumed_count() == ConsumedCount::Fixed(0) {
                return Err(ConfigurationError::ConsumesNothing {
                    command: command.to_string(),
                    index,
                    binder,
                });
            }
            if kind == ParameterKind::Provided {
                return Err(ConfigurationError::KindMismatch {
                    command: command.to_string(),
                    index,
                    declared: kind.label(),
                    binder,
                });
            }
        }
    }
    Ok(())
}

/// Checks relationships between parameters: unique flags, and no
/// variable-count consumer after an optional positional, since the
/// lookahead could not tell how much input to reserve for it.
pub fn validate_parameters(
    command: &str,
    parameters: &[ParameterDescriptor],
) -> Result<(), ConfigurationError> {
    let mut flags = BTreeSet::new();
    let mut seen_optional = false;

    for (index, parameter) in parameters.iter().enumerate() {
        validate_parameter(command, index, parameter)?;

        if let Some(flag) = parameter.flag() {
            if !flags.insert(flag) {
                return Err(ConfigurationError::DuplicateFlag {
                    command: command.to_string(),
                    flag,
                });
            }
            continue;
        }

        if !parameter.is_positional_consumer() {
            continue;
        }
        if parameter.is_optional() {
            seen_optional = true;
        } else if seen_optional && parameter.consumed_count() == ConsumedCount::Variable {
            return Err(ConfigurationError::VariableAfterOptional {
                command: command.to_string(),
                index,
                binder: parameter.binder().name().to_string(),
            });
        }
    }
    Ok(())
}
