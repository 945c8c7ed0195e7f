//! Serializable help data for registered commands.

use serde::{Deserialize, Serialize};
use worldcmd_core::{CommandDescriptor, Locals, ParameterDescriptor, ParameterKind};

use crate::error::Result;
use crate::registry::Dispatcher;

/// One user-facing parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterHelp {
    pub name: String,
    /// `positional`, `value_flag` or `switch`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<char>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterHelp {
    /// `None` for provided parameters, which the user never types.
    pub fn from_descriptor(parameter: &ParameterDescriptor) -> Option<Self> {
        if !parameter.is_user_input() {
            return None;
        }
        let kind = match parameter.kind() {
            ParameterKind::Positional => "positional",
            ParameterKind::ValueFlag(_) => "value_flag",
            ParameterKind::BooleanFlag(_) => "switch",
            ParameterKind::Provided => return None,
        };
        Some(Self {
            name: parameter.name().to_string(),
            kind: kind.to_string(),
            flag: parameter.flag(),
            optional: parameter.is_optional(),
            default: parameter
                .parameter()
                .default_tokens()
                .map(|tokens| tokens.join(" ")),
            description: parameter.parameter().description().map(str::to_string),
        })
    }
}

/// Help entry for one command.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{CommandBuilder, CommandSpec, Parameter, types};
/// use worldcmd_dispatch::CommandHelp;
///
/// let command = CommandBuilder::new()
///     .build(
///         CommandSpec::new(["undo"], |_, _| Ok(()))
///             .description("Undoes the last action.")
///             .param(Parameter::positional("times", types::INT).default_value(["1"])),
///     )
///     .unwrap();
/// let help = CommandHelp::from_descriptor(&command, "/");
/// assert_eq!(help.usage, "/undo [times]");
/// assert_eq!(help.parameters[0].default.as_deref(), Some("1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHelp {
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub usage: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ParameterHelp>,
}

impl CommandHelp {
    pub fn from_descriptor(command: &CommandDescriptor, prefix: &str) -> Self {
        Self {
            aliases: command.aliases().to_vec(),
            description: command.description().map(str::to_string),
            help: command.help().map(str::to_string),
            usage: format!("{prefix}{}", command.full_usage(command.primary_alias())),
            permissions: command.permissions().to_vec(),
            parameters: command
                .parameters()
                .iter()
                .filter_map(ParameterHelp::from_descriptor)
                .collect(),
        }
    }
}

/// Renders help entries as pretty JSON.
///
/// # Errors
///
/// [`JsonError`](crate::ConfigError::JsonError) if serialization fails.
pub fn to_json(help: &[CommandHelp]) -> Result<String> {
    Ok(serde_json::to_string_pretty(help)?)
}

/// Renders help entries as YAML.
///
/// # Errors
///
/// [`YamlError`](crate::ConfigError::YamlError) if serialization fails.
pub fn to_yaml(help: &[CommandHelp]) -> Result<String> {
    Ok(serde_yaml::to_string(help)?)
}

impl Dispatcher {
    /// Help for every command visible to the caller, ordered by primary
    /// alias.
    pub fn help(&self, locals: &Locals) -> Vec<CommandHelp> {
        self.commands()
            .iter()
            .filter(|command| {
                Self::probe_line(command)
                    .is_none_or(|line| self.is_visible(command, &line, locals))
            })
            .map(|command| CommandHelp::from_descriptor(command, &self.config().command_prefix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldcmd_core::{CommandBuilder, CommandSpec, LocalsBinder, Parameter, types};

    fn brush() -> CommandDescriptor {
        let mut builder = CommandBuilder::new();
        builder
            .binders_mut()
            .register_binder(std::sync::Arc::new(LocalsBinder::<String>::new("player")));
        builder
            .build(
                CommandSpec::new(["brush", "br"], |_, _| Ok(()))
                    .description("Binds a sphere brush.")
                    .permission("worldedit.brush")
                    .param(Parameter::provided("player"))
                    .param(Parameter::positional("block", types::STRING))
                    .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
                    .param(Parameter::value_flag('f', "mask", types::STRING)),
            )
            .unwrap()
    }

    #[test]
    fn test_provided_parameters_are_omitted() {
        let help = CommandHelp::from_descriptor(&brush(), "/");
        let names: Vec<&str> = help.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["block", "radius", "mask"]);
        assert_eq!(help.usage, "/brush [-f <mask>] <block> [radius]");
        assert_eq!(help.parameters[2].flag, Some('f'));
        assert_eq!(help.parameters[2].kind, "value_flag");
    }

    #[test]
    fn test_json_export() {
        let help = vec![CommandHelp::from_descriptor(&brush(), "/")];
        let json = to_json(&help).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["aliases"][1], "br");
        assert_eq!(parsed[0]["permissions"][0], "worldedit.brush");
        assert!(parsed[0].get("help").is_none());
    }

    #[test]
    fn test_yaml_export_parses_back() {
        let help = vec![CommandHelp::from_descriptor(&brush(), "")];
        let yaml = to_yaml(&help).unwrap();
        let back: Vec<CommandHelp> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, help);
    }
}
