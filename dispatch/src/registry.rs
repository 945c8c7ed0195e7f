//! Alias table and line dispatch.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};
use worldcmd_core::{
    CommandBuilder, CommandDescriptor, CommandError, CommandSpec, CommandSuggester,
    ConfigurationError, Locals, ParsedLine,
};

use crate::config::DispatcherConfig;

/// Decides whether a command is shown to (and runnable by) the caller.
pub type Visibility =
    dyn Fn(&CommandDescriptor, &ParsedLine, &Locals) -> VisibilityResult + Send + Sync;

/// Outcome of a visibility predicate.
pub type VisibilityResult = Result<bool, Box<dyn Error + Send + Sync>>;

/// Thread-safe alias table in front of a [`CommandBuilder`].
///
/// The table lock covers lookups and structural changes only; handlers
/// run after it is released, so registering a command never waits for
/// an in-flight invocation.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{CommandBuilder, CommandSpec, Locals, Parameter, types};
/// use worldcmd_dispatch::Dispatcher;
///
/// let dispatcher = Dispatcher::new(CommandBuilder::new());
/// dispatcher
///     .register(
///         CommandSpec::new(["sphere", "s"], |args, _| {
///             assert_eq!(args.double("radius"), Some(2.0));
///             Ok(())
///         })
///         .param(Parameter::positional("block", types::STRING))
///         .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
///         .param(Parameter::switch('h', "hollow")),
///     )
///     .unwrap();
///
/// let locals = Locals::new();
/// assert!(dispatcher.dispatch("/s stone -h", &locals).unwrap());
/// assert!(!dispatcher.dispatch("", &locals).unwrap());
/// assert!(!dispatcher.dispatch("cyl stone 3", &locals).unwrap());
/// ```
pub struct Dispatcher {
    builder: CommandBuilder,
    config: DispatcherConfig,
    commands: RwLock<HashMap<String, Arc<CommandDescriptor>>>,
    visibility: Option<Arc<Visibility>>,
    default_suggester: Option<Arc<dyn CommandSuggester>>,
}

impl Dispatcher {
    pub fn new(builder: CommandBuilder) -> Self {
        Self::with_config(builder, DispatcherConfig::default())
    }

    pub fn with_config(mut builder: CommandBuilder, config: DispatcherConfig) -> Self {
        if config.allow_unclaimed_flags {
            builder.set_allow_unclaimed_flags(true);
        }
        Self {
            builder,
            config,
            commands: RwLock::new(HashMap::new()),
            visibility: None,
            default_suggester: None,
        }
    }

    /// Installs the visibility predicate. Predicate errors count as
    /// visible.
    pub fn with_visibility<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CommandDescriptor, &ParsedLine, &Locals) -> VisibilityResult
            + Send
            + Sync
            + 'static,
    {
        self.visibility = Some(Arc::new(predicate));
        self
    }

    /// Suggester used for commands that do not bring their own.
    pub fn with_default_suggester(mut self, suggester: Arc<dyn CommandSuggester>) -> Self {
        self.default_suggester = Some(suggester);
        self
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Builds `spec` and adds every alias, lower-cased.
    ///
    /// Returns `Ok(false)` when the configuration disables the command.
    ///
    /// # Errors
    ///
    /// Any [`ConfigurationError`] from building, or
    /// [`ConfigurationError::DuplicateAlias`] if an alias is taken. On
    /// error the table is left unchanged.
    pub fn register(&self, spec: CommandSpec) -> Result<bool, ConfigurationError> {
        let primary = spec.aliases().first().cloned().unwrap_or_default();
        if self.config.is_disabled(&primary) {
            debug!(command = %primary, "command disabled by configuration");
            return Ok(false);
        }

        let mut spec = spec;
        for alias in self.config.extra_aliases(&primary) {
            spec = spec.alias(alias.clone());
        }

        let command = Arc::new(self.builder.build(spec)?);
        let keys: Vec<String> = command.aliases().iter().map(|a| a.to_lowercase()).collect();

        let mut table = self.commands.write();
        let mut seen = HashSet::new();
        for key in &keys {
            if table.contains_key(key) || !seen.insert(key.as_str()) {
                return Err(ConfigurationError::DuplicateAlias(key.clone()));
            }
        }
        for key in keys {
            table.insert(key, Arc::clone(&command));
        }
        debug!(command = %primary, aliases = ?command.aliases(), "registered command");
        Ok(true)
    }

    /// Removes the command owning `alias`, together with all its aliases.
    pub fn unregister(&self, alias: &str) -> Option<Arc<CommandDescriptor>> {
        let mut table = self.commands.write();
        let command = table.remove(&alias.to_lowercase())?;
        table.retain(|_, other| !Arc::ptr_eq(other, &command));
        debug!(command = command.primary_alias(), "unregistered command");
        Some(command)
    }

    pub fn clear(&self) {
        self.commands.write().clear();
    }

    /// Number of distinct commands.
    pub fn len(&self) -> usize {
        self.commands().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.commands.read().contains_key(&alias.to_lowercase())
    }

    pub fn get(&self, alias: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands.read().get(&alias.to_lowercase()).cloned()
    }

    /// Snapshot of distinct commands, ordered by primary alias.
    pub fn commands(&self) -> Vec<Arc<CommandDescriptor>> {
        let table = self.commands.read();
        let mut commands: Vec<Arc<CommandDescriptor>> = Vec::new();
        for command in table.values() {
            if !commands.iter().any(|c| Arc::ptr_eq(c, command)) {
                commands.push(Arc::clone(command));
            }
        }
        commands.sort_by(|a, b| a.primary_alias().cmp(b.primary_alias()));
        commands
    }

    /// Runs the visibility predicate; a failing predicate counts as visible.
    pub fn is_visible(
        &self,
        command: &CommandDescriptor,
        line: &ParsedLine,
        locals: &Locals,
    ) -> bool {
        let Some(predicate) = &self.visibility else {
            return true;
        };
        match predicate(command, line, locals) {
            Ok(visible) => visible,
            Err(err) => {
                warn!(
                    command = command.primary_alias(),
                    error = %err,
                    "visibility check failed; treating command as visible"
                );
                true
            }
        }
    }

    /// Looks up the first token of `raw` and invokes the matching command.
    ///
    /// Returns `Ok(false)` when nothing matched or the command is hidden.
    ///
    /// # Errors
    ///
    /// The [`CommandError`] of a failed invocation.
    pub fn dispatch(&self, raw: &str, locals: &Locals) -> Result<bool, CommandError> {
        let text = self.config.strip_prefix(raw.trim_start());
        let alias = text.split(' ').next().unwrap_or_default();
        if alias.is_empty() {
            return Ok(false);
        }

        let Some(command) = self.get(alias) else {
            debug!(alias, "no command matched");
            return Ok(false);
        };

        let line = ParsedLine::parse(text, command.value_flags())?;
        if self.config.execute_only_visible && !self.is_visible(&command, &line, locals) {
            debug!(command = command.primary_alias(), "command not visible to caller");
            return Ok(false);
        }

        self.builder.invoke(&command, &line, locals)?;
        Ok(true)
    }

    pub(crate) fn default_suggester(&self) -> Option<&Arc<dyn CommandSuggester>> {
        self.default_suggester.as_ref()
    }

    /// A bare line naming `command`, for visibility checks without input.
    pub(crate) fn probe_line(command: &CommandDescriptor) -> Option<ParsedLine> {
        ParsedLine::parse(command.primary_alias(), &BTreeSet::new()).ok()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aliases: Vec<String> = self.commands.read().keys().cloned().collect();
        aliases.sort();
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("aliases", &aliases)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use worldcmd_core::{Parameter, types};

    fn noop(aliases: &[&'static str]) -> CommandSpec {
        CommandSpec::new(aliases.iter().copied(), |_, _| Ok(()))
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        let dispatcher = Dispatcher::new(CommandBuilder::new());
        dispatcher.register(noop(&["Sphere", "S"])).unwrap();
        assert!(dispatcher.contains("sphere"));
        assert!(dispatcher.contains("SPHERE"));
        assert!(dispatcher.dispatch("s", &Locals::new()).unwrap());
    }

    #[test]
    fn test_duplicate_alias_leaves_table_unchanged() {
        let dispatcher = Dispatcher::new(CommandBuilder::new());
        dispatcher.register(noop(&["sphere", "s"])).unwrap();
        let err = dispatcher.register(noop(&["set", "s"])).unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateAlias("s".into()));
        assert!(!dispatcher.contains("set"));
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn test_unregister_removes_every_alias() {
        let dispatcher = Dispatcher::new(CommandBuilder::new());
        dispatcher.register(noop(&["sphere", "s"])).unwrap();
        dispatcher.register(noop(&["set"])).unwrap();
        let removed = dispatcher.unregister("S").unwrap();
        assert_eq!(removed.primary_alias(), "sphere");
        assert!(!dispatcher.contains("sphere"));
        assert_eq!(dispatcher.len(), 1);
        assert!(dispatcher.unregister("nope").is_none());
        dispatcher.clear();
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_config_disables_and_adds_aliases() {
        let mut config = DispatcherConfig::default();
        config.disabled_commands.push("tree".into());
        config
            .alias_overrides
            .insert("sphere".into(), vec!["ball".into()]);
        let dispatcher = Dispatcher::with_config(CommandBuilder::new(), config);

        assert!(!dispatcher.register(noop(&["tree"])).unwrap());
        assert!(dispatcher.register(noop(&["sphere"])).unwrap());
        assert!(!dispatcher.contains("tree"));
        assert!(dispatcher.contains("ball"));
    }

    #[test]
    fn test_hidden_command_is_not_handled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let dispatcher = Dispatcher::new(CommandBuilder::new())
            .with_visibility(|command, _, _| Ok(command.primary_alias() != "secret"));
        dispatcher
            .register(CommandSpec::new(["secret"], move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
        assert!(!dispatcher.dispatch("secret", &Locals::new()).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_visibility_fails_open() {
        let dispatcher = Dispatcher::new(CommandBuilder::new())
            .with_visibility(|_, _, _| Err("permission backend offline".into()));
        dispatcher.register(noop(&["set"])).unwrap();
        assert!(dispatcher.dispatch("set", &Locals::new()).unwrap());
    }

    #[test]
    fn test_empty_and_blank_lines_are_not_handled() {
        let dispatcher = Dispatcher::new(CommandBuilder::new());
        dispatcher.register(noop(&["set"])).unwrap();
        let locals = Locals::new();
        assert!(!dispatcher.dispatch("", &locals).unwrap());
        assert!(!dispatcher.dispatch("   ", &locals).unwrap());
        assert!(!dispatcher.dispatch("/", &locals).unwrap());
    }

    #[test]
    fn test_dispatch_reports_usage_errors() {
        let dispatcher = Dispatcher::new(CommandBuilder::new());
        dispatcher
            .register(noop(&["set"]).param(Parameter::positional("block", types::STRING)))
            .unwrap();
        let err = dispatcher.dispatch("/set", &Locals::new()).unwrap_err();
        assert_eq!(err.to_string(), "Too few parameters!\nUsage: set <block>");
    }
}
