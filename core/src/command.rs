//! Command declarations and registered command descriptors.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::convert::HandlerError;
use crate::locals::Locals;
use crate::parameter::{ConsumedCount, Parameter, ParameterDescriptor, ParameterKind};
use crate::suggest::CommandSuggester;
use crate::value::BoundArgs;

/// The body of a command.
pub type Handler = Arc<dyn Fn(&BoundArgs, &Locals) -> Result<(), HandlerError> + Send + Sync>;

/// A command as written by its author, before registration.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{CommandSpec, Parameter, types};
///
/// let spec = CommandSpec::new(["sphere", "s"], |_args, _locals| Ok(()))
///     .description("Generates a filled sphere.")
///     .permission("worldedit.generation.sphere")
///     .param(Parameter::positional("block", types::STRING))
///     .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
///     .param(Parameter::switch('h', "hollow"));
/// assert_eq!(spec.aliases(), ["sphere", "s"]);
/// ```
#[derive(Clone)]
pub struct CommandSpec {
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) help: Option<String>,
    pub(crate) usage: Option<String>,
    pub(crate) permissions: Vec<String>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) any_flags: bool,
    pub(crate) legacy_flags: BTreeSet<char>,
    pub(crate) min_args: Option<usize>,
    pub(crate) max_args: Option<usize>,
    pub(crate) handler: Handler,
    pub(crate) suggester: Option<Arc<dyn CommandSuggester>>,
}

impl CommandSpec {
    pub fn new<I, S, F>(aliases: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs, &Locals) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            description: None,
            help: None,
            usage: None,
            permissions: Vec::new(),
            parameters: Vec::new(),
            any_flags: false,
            legacy_flags: BTreeSet::new(),
            min_args: None,
            max_args: None,
            handler: Arc::new(handler),
            suggester: None,
        }
    }

    /// Appends another alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// One-line summary.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Longer help text.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Overrides the generated usage string.
    pub fn usage(mut self, text: impl Into<String>) -> Self {
        self.usage = Some(text.into());
        self
    }

    /// Requires a permission tag. Any one granted tag is enough.
    pub fn permission(mut self, tag: impl Into<String>) -> Self {
        self.permissions.push(tag.into());
        self
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Accepts flags no parameter claims.
    pub fn any_flags(mut self) -> Self {
        self.any_flags = true;
        self
    }

    /// Flags read directly from the line by the handler.
    pub fn legacy_flags(mut self, flags: &str) -> Self {
        self.legacy_flags.extend(flags.chars());
        self
    }

    /// Bounds on positional argument count, checked before binding.
    pub fn arg_limits(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_args = Some(min);
        self.max_args = max;
        self
    }

    pub fn suggester(mut self, suggester: Arc<dyn CommandSuggester>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// An immutable, validated command.
#[derive(Clone)]
pub struct CommandDescriptor {
    aliases: Vec<String>,
    description: Option<String>,
    help: Option<String>,
    usage: String,
    permissions: Vec<String>,
    parameters: Vec<ParameterDescriptor>,
    value_flags: BTreeSet<char>,
    claimed_flags: BTreeSet<char>,
    any_flags: bool,
    legacy_flags: BTreeSet<char>,
    min_args: Option<usize>,
    max_args: Option<usize>,
    handler: Handler,
    suggester: Option<Arc<dyn CommandSuggester>>,
}

impl CommandDescriptor {
    /// Assembles a descriptor from a validated spec.
    pub(crate) fn assemble(spec: CommandSpec, parameters: Vec<ParameterDescriptor>) -> Self {
        let value_flags = parameters
            .iter()
            .filter_map(|p| match p.kind() {
                ParameterKind::ValueFlag(c) => Some(c),
                _ => None,
            })
            .collect();
        let claimed_flags = parameters.iter().filter_map(ParameterDescriptor::flag).collect();
        let usage = spec
            .usage
            .unwrap_or_else(|| generate_usage(&parameters));
        Self {
            aliases: spec.aliases,
            description: spec.description,
            help: spec.help,
            usage,
            permissions: spec.permissions,
            parameters,
            value_flags,
            claimed_flags,
            any_flags: spec.any_flags,
            legacy_flags: spec.legacy_flags,
            min_args: spec.min_args,
            max_args: spec.max_args,
            handler: spec.handler,
            suggester: spec.suggester,
        }
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// First declared alias.
    pub fn primary_alias(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or_default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Parameter part of the usage line.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Usage line as invoked through `alias`.
    pub fn full_usage(&self, alias: &str) -> String {
        if self.usage.is_empty() {
            alias.to_string()
        } else {
            format!("{alias} {}", self.usage)
        }
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Flag characters the tokenizer must treat as taking a value.
    pub fn value_flags(&self) -> &BTreeSet<char> {
        &self.value_flags
    }

    /// Flag characters owned by a parameter.
    pub fn claimed_flags(&self) -> &BTreeSet<char> {
        &self.claimed_flags
    }

    pub fn allows_any_flags(&self) -> bool {
        self.any_flags
    }

    pub fn legacy_flags(&self) -> &BTreeSet<char> {
        &self.legacy_flags
    }

    pub fn min_args(&self) -> Option<usize> {
        self.min_args
    }

    pub fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn suggester(&self) -> Option<&Arc<dyn CommandSuggester>> {
        self.suggester.as_ref()
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("aliases", &self.aliases)
            .field("usage", &self.usage)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Bracketed placeholder for one user-facing parameter.
pub fn placeholder(parameter: &ParameterDescriptor) -> String {
    let mut name = parameter.name().to_string();
    if parameter.consumed_count() == ConsumedCount::Variable {
        name.push_str("...");
    }
    if parameter.is_optional() {
        format!("[{name}]")
    } else {
        format!("<{name}>")
    }
}

/// Builds `[-hr] [-f <mask>] <block> [radius]` from the user-facing
/// parameters. Provided parameters never appear.
pub fn generate_usage(parameters: &[ParameterDescriptor]) -> String {
    let mut parts = Vec::new();

    let switches: String = parameters
        .iter()
        .filter(|p| p.is_user_input())
        .filter_map(|p| match p.kind() {
            ParameterKind::BooleanFlag(c) => Some(c),
            _ => None,
        })
        .collect();
    if !switches.is_empty() {
        parts.push(format!("[-{switches}]"));
    }

    for parameter in parameters.iter().filter(|p| p.is_user_input()) {
        if let ParameterKind::ValueFlag(c) = parameter.kind() {
            parts.push(format!("[-{c} <{}>]", parameter.name()));
        }
    }

    for parameter in parameters.iter().filter(|p| p.is_positional_consumer()) {
        parts.push(placeholder(parameter));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{BooleanBinder, DoubleBinder, StringBinder, TextBinder};
    use crate::types;

    fn descriptor(parameter: Parameter) -> ParameterDescriptor {
        let binder: Arc<dyn crate::binder::Binder> = match parameter.type_key().as_str() {
            "double" => Arc::new(DoubleBinder),
            "bool" => Arc::new(BooleanBinder),
            _ if parameter.classifier_tag() == Some(&types::TEXT) => Arc::new(TextBinder),
            _ => Arc::new(StringBinder),
        };
        ParameterDescriptor::new(parameter, binder)
    }

    #[test]
    fn test_generate_usage_orders_flags_first() {
        let params = vec![
            descriptor(Parameter::positional("block", types::STRING)),
            descriptor(Parameter::positional("radius", types::DOUBLE).default_value(["2"])),
            descriptor(Parameter::switch('h', "hollow")),
            descriptor(Parameter::switch('r', "raised")),
            descriptor(Parameter::value_flag('m', "mask", types::STRING)),
        ];
        assert_eq!(generate_usage(&params), "[-hr] [-m <mask>] <block> [radius]");
    }

    #[test]
    fn test_variable_count_placeholder() {
        let params = vec![descriptor(
            Parameter::positional("message", types::STRING).classifier(types::TEXT),
        )];
        assert_eq!(generate_usage(&params), "<message...>");
    }

    #[test]
    fn test_full_usage_without_parameters() {
        let spec = CommandSpec::new(["undo"], |_, _| Ok(()));
        let command = CommandDescriptor::assemble(spec, Vec::new());
        assert_eq!(command.full_usage("undo"), "undo");
        assert_eq!(command.primary_alias(), "undo");
    }

    #[test]
    fn test_explicit_usage_is_kept() {
        let spec = CommandSpec::new(["say"], |_, _| Ok(())).usage("<anything>");
        let command = CommandDescriptor::assemble(spec, Vec::new());
        assert_eq!(command.full_usage("say"), "say <anything>");
    }
}
