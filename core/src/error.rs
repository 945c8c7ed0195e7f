//! Error taxonomy for tokenizing, binding, registration and invocation.
//!
//! Every failure the engine can produce maps onto one of these enums.
//! [`ConfigurationError`] is raised only while building commands and
//! represents a defect in a command definition; everything else is
//! recovered at the dispatcher boundary as a single [`CommandError`].

use thiserror::Error;

use crate::convert::HandlerError;

/// Malformed command-line text detected by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A pre-split token array had no tokens at all.
    #[error("a command line needs at least a command name")]
    EmptyLine,
    /// A value flag appeared twice on the same line.
    #[error("Value flag '{0}' already given")]
    DuplicateValueFlag(char),
    /// A value flag was the last token, leaving nothing to consume.
    #[error("No value specified for the '-{0}' flag.")]
    MissingFlagValue(char),
}

/// Failure reported by a binder while resolving one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// The cursor ran out of input.
    #[error("Too few parameters!")]
    Missing,
    /// Input was consumed but rejected.
    #[error("{0}")]
    Invalid(String),
}

impl ParameterError {
    /// Shorthand for [`ParameterError::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Defect in a command definition, detected once at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The command declares no aliases.
    #[error("command must declare at least one alias")]
    NoAliases,
    /// An alias is empty or whitespace-only.
    #[error("command '{0}' has an empty alias")]
    EmptyAlias(String),
    /// Alias already taken by another registered command.
    #[error("alias '{0}' is already registered")]
    DuplicateAlias(String),
    /// No binder is registered for the parameter's classifier or type.
    #[error("don't know how to handle the parameter type '{type_name}' for parameter #{index} of '{command}'")]
    UnknownType {
        command: String,
        index: usize,
        type_name: String,
    },
    /// An indeterminate binder is used by a parameter that is not a flag.
    #[error("flag missing for indeterminate consumer '{binder}' at parameter #{index} of '{command}'")]
    IndeterminateWithoutFlag {
        command: String,
        index: usize,
        binder: String,
    },
    /// A providing binder reported a non-zero consumption count.
    #[error("binder '{binder}' provides parameter #{index} of '{command}' but reports consuming input")]
    ProvidesConsumes {
        command: String,
        index: usize,
        binder: String,
    },
    /// A consuming binder reported a consumption count of zero.
    #[error("binder '{binder}' must not report consuming 0 arguments for parameter #{index} of '{command}'")]
    ConsumesNothing {
        command: String,
        index: usize,
        binder: String,
    },
    /// Declared parameter kind disagrees with the binder's behavior.
    #[error("parameter #{index} of '{command}' is declared {declared} but binder '{binder}' disagrees")]
    KindMismatch {
        command: String,
        index: usize,
        declared: &'static str,
        binder: String,
    },
    /// A variable-count consumer follows an optional positional parameter.
    #[error("parameter #{index} of '{command}' uses binder '{binder}' that does not know how many arguments it consumes, but it follows an optional parameter")]
    VariableAfterOptional {
        command: String,
        index: usize,
        binder: String,
    },
    /// Two parameters claim the same flag character.
    #[error("flag '-{flag}' is claimed twice in '{command}'")]
    DuplicateFlag { command: String, flag: char },
    /// Flag characters must be ASCII letters to be reachable by the tokenizer.
    #[error("flag '{flag}' in '{command}' is not a letter")]
    InvalidFlag { command: String, flag: char },
}

/// User-facing outcome of a failed invocation.
///
/// Every variant renders to exactly one message suitable for echoing back
/// to the player or console that issued the command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command line could not be tokenized.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    /// A required parameter had no input left.
    #[error("Too few parameters!\nUsage: {usage}")]
    MissingParameter { usage: String },
    /// Positional input or flags were left over after resolution.
    #[error("Too many parameters! Unused parameters: {unconsumed}\nUsage: {usage}")]
    UnconsumedParameter { unconsumed: String, usage: String },
    /// A binder rejected the input it consumed.
    #[error("For parameter '{name}': {message}\nUsage: {usage}")]
    InvalidParameter {
        name: String,
        message: String,
        usage: String,
    },
    /// Usage rejected by an invocation hook.
    #[error("{message}\nUsage: {usage}")]
    InvalidUsage { message: String, usage: String },
    /// The caller may not run this command.
    #[error("You are not permitted to do that. Are you in the right mode?")]
    PermissionDenied,
    /// A handler error that a converter turned into a message.
    #[error("{0}")]
    Handler(String),
    /// A handler error no converter recognized.
    #[error("An unexpected error occurred: {0}")]
    Wrapped(#[source] HandlerError),
}

impl CommandError {
    /// Builds an [`CommandError::InvalidUsage`].
    pub fn usage(message: impl Into<String>, usage: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
            usage: usage.into(),
        }
    }

    /// Returns `true` for argument/usage problems.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Tokenize(_)
                | Self::MissingParameter { .. }
                | Self::UnconsumedParameter { .. }
                | Self::InvalidParameter { .. }
                | Self::InvalidUsage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_messages() {
        assert_eq!(
            TokenizeError::DuplicateValueFlag('f').to_string(),
            "Value flag 'f' already given"
        );
        assert_eq!(
            TokenizeError::MissingFlagValue('f').to_string(),
            "No value specified for the '-f' flag."
        );
    }

    #[test]
    fn test_usage_error_includes_usage_line() {
        let err = CommandError::usage("Too few parameters!", "/sphere <block> [radius]");
        assert_eq!(
            err.to_string(),
            "Too few parameters!\nUsage: /sphere <block> [radius]"
        );
        assert!(err.is_usage());
        assert!(!CommandError::PermissionDenied.is_usage());
    }

    #[test]
    fn test_unconsumed_message_echoes_leftovers() {
        let err = CommandError::UnconsumedParameter {
            unconsumed: "extra -q".into(),
            usage: "cmd [-x <value>]".into(),
        };
        assert!(err.to_string().starts_with("Too many parameters! Unused parameters: extra -q"));
    }
}
