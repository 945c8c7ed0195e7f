//! Handler error conversion.
//!
//! Handlers fail with a [`HandlerError`] carrying a dotted, hierarchical
//! kind such as `edit.radius.max`. A [`ConverterChain`] maps each kind to
//! a user-facing message: the converter declaring the most specific
//! matching kind wins (`edit.radius` beats `edit`), and among equally
//! specific converters the earliest registered wins. Errors no converter
//! claims are logged and wrapped.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::CommandError;

/// Kind for errors whose message is already meant for the user.
pub const COMMAND_KIND: &str = "command";

/// Failure raised by a command handler.
///
/// # Examples
///
/// ```
/// use worldcmd_core::HandlerError;
///
/// let err = HandlerError::new("edit.radius.max", "Maximum radius: 50");
/// assert!(err.is_kind("edit"));
/// assert!(err.is_kind("edit.radius"));
/// assert!(!err.is_kind("edit.rad"));
/// ```
#[derive(Debug)]
pub struct HandlerError {
    kind: String,
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// A message meant to reach the user as-is.
    pub fn command(message: impl Into<String>) -> Self {
        Self::new(COMMAND_KIND, message)
    }

    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `true` if this error's kind is `kind` or a descendant of it.
    pub fn is_kind(&self, kind: &str) -> bool {
        kind_matches(kind, &self.kind)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

fn kind_matches(declared: &str, actual: &str) -> bool {
    actual == declared
        || actual
            .strip_prefix(declared)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn specificity(kind: &str) -> usize {
    kind.split('.').count()
}

/// Turns handler errors of some kinds into user-facing messages.
pub trait ExceptionConverter: Send + Sync {
    /// Kinds this converter handles, descendants included.
    fn kinds(&self) -> Vec<String>;

    fn convert(&self, error: &HandlerError) -> String;
}

/// Converter built from a closure.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{ConverterChain, FnConverter, HandlerError};
///
/// let mut chain = ConverterChain::new();
/// chain.register(FnConverter::new(["edit.radius"], |e| format!("Too big: {}", e.message())));
/// let err = chain.convert(HandlerError::new("edit.radius.max", "60"));
/// assert_eq!(err.to_string(), "Too big: 60");
/// ```
pub struct FnConverter<F> {
    kinds: Vec<String>,
    convert: F,
}

impl<F> FnConverter<F>
where
    F: Fn(&HandlerError) -> String + Send + Sync,
{
    pub fn new<I, S>(kinds: I, convert: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            convert,
        }
    }
}

impl<F> ExceptionConverter for FnConverter<F>
where
    F: Fn(&HandlerError) -> String + Send + Sync,
{
    fn kinds(&self) -> Vec<String> {
        self.kinds.clone()
    }

    fn convert(&self, error: &HandlerError) -> String {
        (self.convert)(error)
    }
}

/// Passes `command` errors through verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

impl ExceptionConverter for PassthroughConverter {
    fn kinds(&self) -> Vec<String> {
        vec![COMMAND_KIND.to_string()]
    }

    fn convert(&self, error: &HandlerError) -> String {
        error.message().to_string()
    }
}

/// Ordered set of converters.
#[derive(Clone)]
pub struct ConverterChain {
    converters: Vec<(Vec<String>, Arc<dyn ExceptionConverter>)>,
}

impl Default for ConverterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterChain {
    /// A chain holding only the `command` passthrough.
    pub fn new() -> Self {
        let mut chain = Self {
            converters: Vec::new(),
        };
        chain.register(PassthroughConverter);
        chain
    }

    pub fn register(&mut self, converter: impl ExceptionConverter + 'static) {
        self.register_arc(Arc::new(converter));
    }

    pub fn register_arc(&mut self, converter: Arc<dyn ExceptionConverter>) {
        let kinds = converter.kinds();
        self.converters.push((kinds, converter));
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// The converter responsible for `kind`, if any.
    pub fn find(&self, kind: &str) -> Option<&Arc<dyn ExceptionConverter>> {
        let mut best: Option<(usize, &Arc<dyn ExceptionConverter>)> = None;
        for (kinds, converter) in &self.converters {
            let score = kinds
                .iter()
                .filter(|declared| kind_matches(declared, kind))
                .map(|declared| specificity(declared))
                .max();
            let Some(score) = score else {
                continue;
            };
            // Strictly greater keeps the earliest converter on ties.
            if best.is_none_or(|(current, _)| score > current) {
                best = Some((score, converter));
            }
        }
        best.map(|(_, converter)| converter)
    }

    /// Converts `error` into the invocation's outcome.
    pub fn convert(&self, error: HandlerError) -> CommandError {
        match self.find(error.kind()) {
            Some(converter) => CommandError::Handler(converter.convert(&error)),
            None => {
                warn!(kind = error.kind(), error = %error, "unhandled command error");
                CommandError::Wrapped(error)
            }
        }
    }
}

impl fmt::Debug for ConverterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<&Vec<String>> = self.converters.iter().map(|(k, _)| k).collect();
        f.debug_struct("ConverterChain").field("kinds", &kinds).finish()
    }
}
