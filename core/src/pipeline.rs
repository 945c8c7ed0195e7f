//! Building commands from specs and running them against parsed lines.
//!
//! [`CommandBuilder`] owns the binder registry, the invocation hooks and
//! the converter chain. [`CommandBuilder::build`] resolves every
//! parameter's binder and validates the result once;
//! [`CommandBuilder::invoke`] then runs the fixed phase order:
//!
//! 1. `pre_process` hooks
//! 2. parameter resolution (lookahead, defaults, unconsumed check)
//! 3. `pre_invoke` hooks
//! 4. the handler, with its errors passed through the converter chain
//! 5. `post_invoke` hooks
//!
//! The first error ends the invocation.

use std::sync::Arc;

use tracing::{debug, error};

use crate::binder::BinderRegistry;
use crate::command::{CommandDescriptor, CommandSpec};
use crate::convert::{ConverterChain, ExceptionConverter};
use crate::cursor::ArgumentCursor;
use crate::error::{CommandError, ConfigurationError, ParameterError};
use crate::hooks::InvokeHook;
use crate::line::ParsedLine;
use crate::locals::Locals;
use crate::parameter::{ConsumedCount, ParameterDescriptor, ParameterKind};
use crate::validate::{validate_aliases, validate_parameters};
use crate::value::{BoundArgs, Value};

/// Turns [`CommandSpec`]s into [`CommandDescriptor`]s and invokes them.
///
/// Hooks and converters are set up before the first command is built and
/// shared read-only afterwards.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{CommandBuilder, CommandSpec, Locals, ParsedLine, Parameter, types};
///
/// let builder = CommandBuilder::new();
/// let command = builder
///     .build(
///         CommandSpec::new(["sphere", "s"], |args, _| {
///             assert_eq!(args.str("block"), Some("stone"));
///             assert_eq!(args.double("radius"), Some(2.0));
///             assert!(args.flag("hollow"));
///             Ok(())
///         })
///         .param(Parameter::positional("block", types::STRING))
///         .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
///         .param(Parameter::switch('h', "hollow")),
///     )
///     .unwrap();
///
/// let line = ParsedLine::parse("s stone -h", command.value_flags()).unwrap();
/// builder.invoke(&command, &line, &Locals::new()).unwrap();
/// ```
#[derive(Clone)]
pub struct CommandBuilder {
    binders: BinderRegistry,
    hooks: Vec<Arc<dyn InvokeHook>>,
    converters: ConverterChain,
    allow_unclaimed_flags: bool,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuilder {
    /// A builder with the primitive binders and the `command` passthrough
    /// converter.
    pub fn new() -> Self {
        Self::with_binders(BinderRegistry::with_primitives())
    }

    pub fn with_binders(binders: BinderRegistry) -> Self {
        Self {
            binders,
            hooks: Vec::new(),
            converters: ConverterChain::new(),
            allow_unclaimed_flags: false,
        }
    }

    pub fn binders(&self) -> &BinderRegistry {
        &self.binders
    }

    pub fn binders_mut(&mut self) -> &mut BinderRegistry {
        &mut self.binders
    }

    /// Appends a hook; hooks run in the order added.
    pub fn add_hook(&mut self, hook: Arc<dyn InvokeHook>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn add_converter(&mut self, converter: impl ExceptionConverter + 'static) -> &mut Self {
        self.converters.register(converter);
        self
    }

    pub fn converters(&self) -> &ConverterChain {
        &self.converters
    }

    /// Accept flags no parameter claims on every command.
    pub fn set_allow_unclaimed_flags(&mut self, allow: bool) -> &mut Self {
        self.allow_unclaimed_flags = allow;
        self
    }

    pub fn allows_unclaimed_flags(&self) -> bool {
        self.allow_unclaimed_flags
    }

    /// Resolves binders and validates the command.
    ///
    /// # Errors
    ///
    /// A [`ConfigurationError`] describing the first defect found.
    pub fn build(&self, spec: CommandSpec) -> Result<CommandDescriptor, ConfigurationError> {
        validate_aliases(&spec.aliases)?;
        let name = spec.aliases[0].clone();

        let mut parameters = Vec::with_capacity(spec.parameters.len());
        for (index, parameter) in spec.parameters.iter().enumerate() {
            let Some(binder) = self.binders.lookup(parameter) else {
                let type_name = match parameter.classifier_tag() {
                    Some(classifier) => format!("@{classifier} {}", parameter.type_key()),
                    None => parameter.type_key().to_string(),
                };
                return Err(ConfigurationError::UnknownType {
                    command: name,
                    index,
                    type_name,
                });
            };
            parameters.push(ParameterDescriptor::new(parameter.clone(), binder));
        }
        validate_parameters(&name, &parameters)?;

        let command = CommandDescriptor::assemble(spec, parameters);
        debug!(
            command = %name,
            aliases = ?command.aliases(),
            usage = command.usage(),
            "built command"
        );
        Ok(command)
    }

    /// Runs `command` against an already tokenized line.
    ///
    /// # Errors
    ///
    /// Whatever the first failing phase reports.
    pub fn invoke(
        &self,
        command: &CommandDescriptor,
        line: &ParsedLine,
        locals: &Locals,
    ) -> Result<(), CommandError> {
        for hook in &self.hooks {
            hook.pre_process(command, line, locals)?;
        }

        let args = self.resolve(command, line, locals)?;

        for hook in &self.hooks {
            hook.pre_invoke(command, &args, line, locals)?;
        }

        (command.handler())(&args, locals).map_err(|e| self.converters.convert(e))?;

        for hook in &self.hooks {
            hook.post_invoke(command, &args, line, locals)?;
        }
        Ok(())
    }

    /// Binds every parameter in declaration order.
    pub fn resolve(
        &self,
        command: &CommandDescriptor,
        line: &ParsedLine,
        locals: &Locals,
    ) -> Result<BoundArgs, CommandError> {
        let usage = || command.full_usage(line.command());
        let parameters = command.parameters();
        let mut positional = ArgumentCursor::over(line.args(), locals);
        let mut values = Vec::with_capacity(parameters.len());

        for (index, parameter) in parameters.iter().enumerate() {
            let value = if may_consume(parameters, index, line, &positional) {
                let bound = match parameter.kind() {
                    ParameterKind::ValueFlag(flag) => {
                        let raw = line.flag_value(flag).unwrap_or_default();
                        let mut scoped = ArgumentCursor::single(raw, locals);
                        parameter.binder().bind(parameter.parameter(), &mut scoped)
                    }
                    ParameterKind::BooleanFlag(flag) => {
                        let raw = if line.has_flag(flag) { "true" } else { "false" };
                        let mut scoped = ArgumentCursor::single(raw, locals);
                        parameter.binder().bind(parameter.parameter(), &mut scoped)
                    }
                    ParameterKind::Positional | ParameterKind::Provided => parameter
                        .binder()
                        .bind(parameter.parameter(), &mut positional),
                };
                match bound {
                    Ok(value) => Some(value),
                    Err(ParameterError::Missing) if parameter.is_optional() => {
                        default_value(parameter, locals, &usage)?
                    }
                    Err(ParameterError::Missing) => {
                        return Err(CommandError::MissingParameter { usage: usage() });
                    }
                    Err(ParameterError::Invalid(message)) => {
                        return Err(CommandError::InvalidParameter {
                            name: parameter.name().to_string(),
                            message,
                            usage: usage(),
                        });
                    }
                }
            } else {
                default_value(parameter, locals, &usage)?
            };
            values.push((parameter.name().to_string(), value));
        }

        let leftover = positional.unconsumed();
        let flags = if command.allows_any_flags() || self.allow_unclaimed_flags {
            None
        } else {
            unclaimed_flags(command, line)
        };
        let unconsumed = match (leftover, flags) {
            (Some(rest), Some(flags)) => Some(format!("{rest} {flags}")),
            (Some(rest), None) => Some(rest),
            (None, flags) => flags,
        };
        if let Some(unconsumed) = unconsumed {
            return Err(CommandError::UnconsumedParameter {
                unconsumed,
                usage: usage(),
            });
        }

        Ok(BoundArgs::new(values))
    }
}

/// Decides whether parameter `index` gets to read input at all.
///
/// Required parameters always try. An optional positional only tries when
/// enough tokens remain to also satisfy every required fixed-count
/// positional after it; otherwise it yields to them and takes its default.
fn may_consume(
    parameters: &[ParameterDescriptor],
    index: usize,
    line: &ParsedLine,
    positional: &ArgumentCursor<'_>,
) -> bool {
    let parameter = &parameters[index];
    match parameter.kind() {
        ParameterKind::BooleanFlag(_) | ParameterKind::Provided => true,
        ParameterKind::ValueFlag(flag) => line.flag_value(flag).is_some(),
        ParameterKind::Positional if !parameter.is_optional() => true,
        ParameterKind::Positional => {
            let reserved: usize = parameters[index + 1..]
                .iter()
                .filter(|p| p.is_positional_consumer() && !p.is_optional())
                .map(|p| match p.consumed_count() {
                    ConsumedCount::Fixed(n) => n,
                    ConsumedCount::Variable => 1,
                })
                .sum();
            positional.remaining_count() > reserved
        }
    }
}

fn default_value(
    parameter: &ParameterDescriptor,
    locals: &Locals,
    usage: &dyn Fn() -> String,
) -> Result<Option<Value>, CommandError> {
    let Some(tokens) = parameter.parameter().default_tokens() else {
        return Ok(None);
    };
    let mut cursor = ArgumentCursor::synthetic(tokens.to_vec(), locals);
    match parameter.binder().bind(parameter.parameter(), &mut cursor) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            error!(parameter = parameter.name(), error = %err, "default value does not bind");
            Err(CommandError::InvalidParameter {
                name: parameter.name().to_string(),
                message: format!("invalid default value: {err}"),
                usage: usage(),
            })
        }
    }
}

fn unclaimed_flags(command: &CommandDescriptor, line: &ParsedLine) -> Option<String> {
    let unused: Vec<String> = line
        .flags()
        .into_iter()
        .filter(|flag| !command.claimed_flags().contains(flag))
        .filter(|flag| !command.legacy_flags().contains(flag))
        .map(|flag| format!("-{flag}"))
        .collect();
    (!unused.is_empty()).then(|| unused.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{FnConverter, HandlerError};
    use crate::parameter::Parameter;
    use crate::types;
    use std::sync::Mutex;

    fn run(builder: &CommandBuilder, spec: CommandSpec, text: &str) -> Result<(), CommandError> {
        let command = builder.build(spec).unwrap();
        let line = ParsedLine::parse(text, command.value_flags())?;
        builder.invoke(&command, &line, &Locals::new())
    }

    type Slot = Arc<Mutex<Option<BoundArgs>>>;

    fn capture() -> (
        Slot,
        impl Fn(&BoundArgs, &Locals) -> Result<(), HandlerError> + Send + Sync + 'static,
    ) {
        let slot = Arc::new(Mutex::new(None));
        let writer = Arc::clone(&slot);
        (slot, move |args: &BoundArgs, _: &Locals| {
            *writer.lock().unwrap() = Some(args.clone());
            Ok(())
        })
    }

    #[test]
    fn test_optional_yields_to_later_required() {
        let builder = CommandBuilder::new();
        let (slot, handler) = capture();
        let spec = CommandSpec::new(["cmd"], handler)
            .param(Parameter::positional("opt", types::INT).default_value(["7"]))
            .param(Parameter::positional("req", types::STRING));
        run(&builder, spec, "cmd only").unwrap();
        let args = slot.lock().unwrap().take().unwrap();
        assert_eq!(args.int("opt"), Some(7));
        assert_eq!(args.str("req"), Some("only"));
    }

    #[test]
    fn test_required_then_optional_with_one_token() {
        let builder = CommandBuilder::new();
        let (slot, handler) = capture();
        let spec = CommandSpec::new(["cmd"], handler)
            .param(Parameter::positional("req", types::STRING))
            .param(Parameter::positional("opt", types::STRING).optional());
        run(&builder, spec, "cmd a").unwrap();
        let args = slot.lock().unwrap().take().unwrap();
        assert_eq!(args.str("req"), Some("a"));
        assert_eq!(args.get("opt"), None);
    }

    #[test]
    fn test_missing_required() {
        let builder = CommandBuilder::new();
        let spec = CommandSpec::new(["cmd"], |_, _| Ok(()))
            .param(Parameter::positional("req", types::STRING));
        let err = run(&builder, spec, "cmd").unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingParameter { ref usage } if usage == "cmd <req>"
        ));
    }

    #[test]
    fn test_leftover_positional_is_reported() {
        let builder = CommandBuilder::new();
        let spec = CommandSpec::new(["cmd"], |_, _| Ok(()))
            .param(Parameter::value_flag('x', "x", types::INT));
        let err = run(&builder, spec, "cmd -x 5 extra").unwrap_err();
        assert!(matches!(
            err,
            CommandError::UnconsumedParameter { ref unconsumed, .. } if unconsumed.contains("extra")
        ));
    }

    #[test]
    fn test_unclaimed_flag_is_reported_unless_allowed() {
        let spec = || CommandSpec::new(["cmd"], |_, _| Ok(()));
        let strict = CommandBuilder::new();
        let err = run(&strict, spec(), "cmd -q").unwrap_err();
        assert!(matches!(
            err,
            CommandError::UnconsumedParameter { ref unconsumed, .. } if unconsumed == "-q"
        ));

        assert!(run(&strict, spec().any_flags(), "cmd -q").is_ok());
        assert!(run(&strict, spec().legacy_flags("q"), "cmd -q").is_ok());

        let mut lenient = CommandBuilder::new();
        lenient.set_allow_unclaimed_flags(true);
        assert!(run(&lenient, spec(), "cmd -q").is_ok());
    }

    #[test]
    fn test_invalid_parameter_names_parameter() {
        let builder = CommandBuilder::new();
        let spec = CommandSpec::new(["cmd"], |_, _| Ok(()))
            .param(Parameter::positional("radius", types::DOUBLE));
        let err = run(&builder, spec, "cmd big").unwrap_err();
        assert!(
            err.to_string()
                .starts_with("For parameter 'radius': Expected 'big' to be a number")
        );
    }

    #[test]
    fn test_value_flag_default_and_present() {
        let builder = CommandBuilder::new();
        let (slot, handler) = capture();
        let spec = CommandSpec::new(["brush"], handler)
            .param(Parameter::value_flag('m', "mask", types::STRING).default_value(["air"]));
        let command = builder.build(spec).unwrap();

        let line = ParsedLine::parse("brush", command.value_flags()).unwrap();
        builder.invoke(&command, &line, &Locals::new()).unwrap();
        assert_eq!(slot.lock().unwrap().take().unwrap().str("mask"), Some("air"));

        let line = ParsedLine::parse("brush -m stone", command.value_flags()).unwrap();
        builder.invoke(&command, &line, &Locals::new()).unwrap();
        assert_eq!(slot.lock().unwrap().take().unwrap().str("mask"), Some("stone"));
    }

    #[test]
    fn test_unknown_type_is_configuration_error() {
        let builder = CommandBuilder::new();
        let spec = CommandSpec::new(["cmd"], |_, _| Ok(()))
            .param(Parameter::positional("block", "block"));
        assert!(matches!(
            builder.build(spec),
            Err(ConfigurationError::UnknownType { index: 0, .. })
        ));
    }

    #[test]
    fn test_handler_error_is_converted() {
        let mut builder = CommandBuilder::new();
        builder.add_converter(FnConverter::new(["edit.radius"], |e| {
            format!("Radius too large: {}", e.message())
        }));
        let spec =
            CommandSpec::new(["cmd"], |_, _| Err(HandlerError::new("edit.radius.max", "60")));
        let err = run(&builder, spec, "cmd").unwrap_err();
        assert!(matches!(err, CommandError::Handler(ref m) if m == "Radius too large: 60"));
    }

    #[test]
    fn test_hooks_run_in_phase_order() {
        struct Recorder(Arc<Mutex<Vec<&'static str>>>);

        impl InvokeHook for Recorder {
            fn pre_process(
                &self,
                _: &CommandDescriptor,
                _: &ParsedLine,
                _: &Locals,
            ) -> Result<(), CommandError> {
                self.0.lock().unwrap().push("pre_process");
                Ok(())
            }
            fn pre_invoke(
                &self,
                _: &CommandDescriptor,
                _: &BoundArgs,
                _: &ParsedLine,
                _: &Locals,
            ) -> Result<(), CommandError> {
                self.0.lock().unwrap().push("pre_invoke");
                Ok(())
            }
            fn post_invoke(
                &self,
                _: &CommandDescriptor,
                _: &BoundArgs,
                _: &ParsedLine,
                _: &Locals,
            ) -> Result<(), CommandError> {
                self.0.lock().unwrap().push("post_invoke");
                Ok(())
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = CommandBuilder::new();
        builder.add_hook(Arc::new(Recorder(Arc::clone(&log))));
        let handler_log = Arc::clone(&log);
        let spec = CommandSpec::new(["cmd"], move |_, _| {
            handler_log.lock().unwrap().push("handler");
            Ok(())
        });
        run(&builder, spec, "cmd").unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["pre_process", "pre_invoke", "handler", "post_invoke"]
        );
    }

    #[test]
    fn test_failing_pre_process_skips_handler() {
        struct Deny;
        impl InvokeHook for Deny {
            fn pre_process(
                &self,
                _: &CommandDescriptor,
                _: &ParsedLine,
                _: &Locals,
            ) -> Result<(), CommandError> {
                Err(CommandError::PermissionDenied)
            }
        }

        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);
        let mut builder = CommandBuilder::new();
        builder.add_hook(Arc::new(Deny));
        let spec = CommandSpec::new(["cmd"], move |_, _| {
            *flag.lock().unwrap() = true;
            Ok(())
        });
        assert!(matches!(run(&builder, spec, "cmd"), Err(CommandError::PermissionDenied)));
        assert!(!*called.lock().unwrap());
    }
}
