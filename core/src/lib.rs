//! Command argument resolution engine.
//!
//! This crate turns a raw command line into typed handler arguments:
//!
//! - [`ParsedLine`] tokenizes input, merges quoted runs and extracts
//!   boolean and value flags.
//! - [`ArgumentCursor`] is the forward-only view binders read from.
//! - [`Binder`] implementations convert tokens (or ambient [`Locals`]) into
//!   [`Value`]s; [`BinderRegistry`] maps type keys and classifiers to them.
//! - [`CommandSpec`] declares a command; [`CommandBuilder::build`] resolves
//!   and validates it into a [`CommandDescriptor`].
//! - [`CommandBuilder::invoke`] runs hooks, binds parameters with optional
//!   lookahead and defaults, calls the handler and converts its errors.
//!
//! # Example
//!
//! ```
//! use worldcmd_core::*;
//!
//! let builder = CommandBuilder::new();
//! let say = builder
//!     .build(
//!         CommandSpec::new(["say"], |args, _| {
//!             assert_eq!(args.str("message"), Some("hello \"quoted\" world"));
//!             Ok(())
//!         })
//!         .param(Parameter::positional("message", types::STRING).classifier(types::TEXT)),
//!     )
//!     .unwrap();
//! assert_eq!(say.usage(), "<message...>");
//!
//! let line = ParsedLine::parse("say hello '\"quoted\"' world", say.value_flags()).unwrap();
//! builder.invoke(&say, &line, &Locals::new()).unwrap();
//! ```

mod binder;
mod bindings;
mod command;
mod convert;
mod cursor;
mod error;
mod hooks;
mod line;
mod locals;
mod parameter;
mod pipeline;
mod suggest;
pub mod types;
mod validate;
mod value;

pub use binder::{Binder, BinderRegistry, BindingKey};
pub use bindings::{
    BooleanBinder, DoubleBinder, IntegerBinder, ListBinder, LocalsBinder, StringBinder,
    TextBinder, check_pattern, check_range,
};
pub use command::{CommandDescriptor, CommandSpec, Handler, generate_usage, placeholder};
pub use convert::{
    COMMAND_KIND, ConverterChain, ExceptionConverter, FnConverter, HandlerError,
    PassthroughConverter,
};
pub use cursor::ArgumentCursor;
pub use error::{CommandError, ConfigurationError, ParameterError, TokenizeError};
pub use hooks::{
    Authorizer, CallerName, InvokeHook, LegacyArgsHook, LoggingHook, PermissionHook, is_permitted,
};
pub use line::{FLAG_TERMINATOR, ParsedLine};
pub use locals::Locals;
pub use parameter::{
    BindingBehavior, Classifier, ConsumedCount, Modifier, Parameter, ParameterDescriptor,
    ParameterKind, TypeKey,
};
pub use pipeline::CommandBuilder;
pub use suggest::{CommandSuggester, Confidence, ParameterHintSuggester, Proposal};
pub use validate::{validate_aliases, validate_parameter, validate_parameters};
pub use value::{BoundArgs, Value};
