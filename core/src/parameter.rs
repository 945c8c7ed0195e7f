//! Parameter declarations and their registration-time descriptors.
//!
//! A [`Parameter`] is what a command author writes: a type key, an
//! optional classifier, how the value is supplied (positional, flag, or
//! provided from locals), and whether it may be omitted. Registration
//! pairs each declaration with a binder and freezes the result into a
//! [`ParameterDescriptor`].

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::binder::Binder;

/// Identifier of a declared value type, e.g. `"int"` or `"block"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag that selects an alternate binder for an otherwise ordinary type,
/// e.g. `"text"` turns a string parameter into "rest of the line".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Classifier(Cow<'static, str>);

impl Classifier {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Classifier {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for Classifier {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a binder obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingBehavior {
    /// Reads user input from the cursor.
    Consumes,
    /// Produces a value from ambient context without reading input.
    Provides,
    /// May or may not read input; only legal behind a flag.
    Indeterminate,
}

/// Number of tokens a binder consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumedCount {
    Fixed(usize),
    /// Unknown in advance, e.g. rest-of-line text.
    Variable,
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Next positional argument(s).
    Positional,
    /// The argument following `-c`.
    ValueFlag(char),
    /// Presence of `-c`.
    BooleanFlag(char),
    /// Ambient context; never typed by the user.
    Provided,
}

impl ParameterKind {
    pub fn flag(self) -> Option<char> {
        match self {
            Self::ValueFlag(c) | Self::BooleanFlag(c) => Some(c),
            Self::Positional | Self::Provided => None,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Positional => "positional",
            Self::ValueFlag(_) => "a value flag",
            Self::BooleanFlag(_) => "a boolean flag",
            Self::Provided => "provided",
        }
    }
}

/// Extra constraints checked by primitive binders after parsing.
#[derive(Debug, Clone)]
pub enum Modifier {
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Text must match the whole pattern.
    Validate(Regex),
}

impl Modifier {
    pub fn at_least(min: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self::Range {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// A parameter as written by the command author.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{Modifier, Parameter, ParameterKind, types};
///
/// let radius = Parameter::positional("radius", types::DOUBLE)
///     .default_value(["2"])
///     .modifier(Modifier::at_least(0.0));
/// assert!(radius.is_optional());
///
/// let hollow = Parameter::switch('h', "hollow");
/// assert_eq!(hollow.kind(), ParameterKind::BooleanFlag('h'));
/// ```
#[derive(Debug, Clone)]
pub struct Parameter {
    name: Option<String>,
    type_key: TypeKey,
    classifier: Option<Classifier>,
    kind: ParameterKind,
    optional: bool,
    default: Option<Vec<String>>,
    modifiers: Vec<Modifier>,
    description: Option<String>,
}

impl Parameter {
    fn new(name: Option<String>, type_key: TypeKey, kind: ParameterKind) -> Self {
        let optional = matches!(kind, ParameterKind::ValueFlag(_) | ParameterKind::BooleanFlag(_));
        Self {
            name,
            type_key,
            classifier: None,
            kind,
            optional,
            default: None,
            modifiers: Vec::new(),
            description: None,
        }
    }

    /// Required positional parameter.
    pub fn positional(name: impl Into<String>, type_key: impl Into<TypeKey>) -> Self {
        Self::new(Some(name.into()), type_key.into(), ParameterKind::Positional)
    }

    /// `-flag <value>`; implicitly optional.
    pub fn value_flag(flag: char, name: impl Into<String>, type_key: impl Into<TypeKey>) -> Self {
        Self::new(
            Some(name.into()),
            type_key.into(),
            ParameterKind::ValueFlag(flag),
        )
    }

    /// Boolean `-flag`; implicitly optional and bound through the `bool` type.
    pub fn switch(flag: char, name: impl Into<String>) -> Self {
        Self::new(
            Some(name.into()),
            crate::types::BOOL.into(),
            ParameterKind::BooleanFlag(flag),
        )
    }

    /// Value drawn from locals. Unnamed unless [`named`](Self::named).
    pub fn provided(type_key: impl Into<TypeKey>) -> Self {
        Self::new(None, type_key.into(), ParameterKind::Provided)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn classifier(mut self, classifier: impl Into<Classifier>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Omittable, resolving to no value when absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Omittable, resolving by binding these tokens when absent.
    pub fn default_value<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional = true;
        self.default = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn classifier_tag(&self) -> Option<&Classifier> {
        self.classifier.as_ref()
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn flag(&self) -> Option<char> {
        self.kind.flag()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_tokens(&self) -> Option<&[String]> {
        self.default.as_deref()
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A parameter after registration: declaration, resolved binder, and the
/// binder's behavior and consumption count, fixed for the command's
/// lifetime.
#[derive(Clone)]
pub struct ParameterDescriptor {
    parameter: Parameter,
    name: String,
    binder: Arc<dyn Binder>,
    behavior: BindingBehavior,
    consumed: ConsumedCount,
}

impl ParameterDescriptor {
    /// Pairs `parameter` with `binder`. Unnamed parameters are called after
    /// their classifier, falling back to the type key.
    pub fn new(parameter: Parameter, binder: Arc<dyn Binder>) -> Self {
        let name = parameter.name.clone().unwrap_or_else(|| {
            parameter
                .classifier
                .as_ref()
                .map(|c| c.as_str().to_ascii_lowercase())
                .unwrap_or_else(|| parameter.type_key.as_str().to_ascii_lowercase())
        });
        let behavior = binder.behavior(&parameter);
        let consumed = binder.consumed_count(&parameter);
        Self {
            parameter,
            name,
            binder,
            behavior,
            consumed,
        }
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.parameter.kind
    }

    pub fn flag(&self) -> Option<char> {
        self.parameter.flag()
    }

    pub fn is_optional(&self) -> bool {
        self.parameter.optional
    }

    pub fn binder(&self) -> &Arc<dyn Binder> {
        &self.binder
    }

    pub fn behavior(&self) -> BindingBehavior {
        self.behavior
    }

    pub fn consumed_count(&self) -> ConsumedCount {
        self.consumed
    }

    /// Positional parameter that reads user input.
    pub fn is_positional_consumer(&self) -> bool {
        self.kind() == ParameterKind::Positional && self.behavior != BindingBehavior::Provides
    }

    /// Appears in usage text and help output.
    pub fn is_user_input(&self) -> bool {
        self.behavior != BindingBehavior::Provides && self.kind() != ParameterKind::Provided
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("name", &self.name)
            .field("kind", &self.parameter.kind)
            .field("binder", &self.binder.name())
            .field("behavior", &self.behavior)
            .field("consumed", &self.consumed)
            .field("optional", &self.parameter.optional)
            .finish()
    }
}
