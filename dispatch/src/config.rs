//! Dispatcher configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! command_prefix: "/"
//! execute_only_visible: true
//! allow_unclaimed_flags: false
//! disabled_commands:
//!   - tree
//! alias_overrides:
//!   sphere:
//!     - ball
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings applied by a [`Dispatcher`](crate::Dispatcher).
///
/// Every field has a default, so a partial file is valid.
///
/// # Examples
///
/// ```
/// use worldcmd_dispatch::DispatcherConfig;
///
/// let config: DispatcherConfig = serde_yaml::from_str("disabled_commands: [Tree]").unwrap();
/// assert_eq!(config.command_prefix, "/");
/// assert!(config.is_disabled("tree"));
/// assert!(!config.is_disabled("sphere"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Stripped from the start of a line before tokenizing, if present.
    pub command_prefix: String,
    /// Hidden commands are reported as not handled instead of running.
    pub execute_only_visible: bool,
    /// Accept flags no parameter claims on every command.
    pub allow_unclaimed_flags: bool,
    /// Primary aliases that are skipped at registration.
    pub disabled_commands: Vec<String>,
    /// Extra aliases per primary alias, added at registration.
    pub alias_overrides: BTreeMap<String, Vec<String>>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            command_prefix: "/".into(),
            execute_only_visible: true,
            allow_unclaimed_flags: false,
            disabled_commands: Vec::new(),
            alias_overrides: BTreeMap::new(),
        }
    }
}

impl DispatcherConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ConfigError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ConfigError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `alias` is in the disabled list (case-insensitive).
    pub fn is_disabled(&self, alias: &str) -> bool {
        self.disabled_commands
            .iter()
            .any(|c| c.eq_ignore_ascii_case(alias))
    }

    /// Extra aliases configured for `primary`.
    pub fn extra_aliases(&self, primary: &str) -> &[String] {
        self.alias_overrides
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(primary))
            .map(|(_, v)| v.as_slice())
            .unwrap_or_default()
    }

    /// `line` with the command prefix removed, if it starts with it.
    pub fn strip_prefix<'a>(&self, line: &'a str) -> &'a str {
        if self.command_prefix.is_empty() {
            return line;
        }
        line.strip_prefix(self.command_prefix.as_str()).unwrap_or(line)
    }
}
