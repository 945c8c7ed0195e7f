//! Binder trait and the type/classifier registry.
//!
//! A binder turns cursor input (or ambient locals) into a [`Value`] for one
//! parameter. Binders declare the keys they service; the
//! [`BinderRegistry`] resolves a parameter's classifier first and its type
//! key second.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::bindings::{
    BooleanBinder, DoubleBinder, IntegerBinder, ListBinder, StringBinder, TextBinder,
};
use crate::cursor::ArgumentCursor;
use crate::error::ParameterError;
use crate::parameter::{BindingBehavior, Classifier, ConsumedCount, Parameter, TypeKey};
use crate::value::Value;

/// Registry key a binder can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKey {
    Type(TypeKey),
    Classifier(Classifier),
}

impl From<TypeKey> for BindingKey {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl From<Classifier> for BindingKey {
    fn from(classifier: Classifier) -> Self {
        Self::Classifier(classifier)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(t) => write!(f, "{t}"),
            Self::Classifier(c) => write!(f, "@{c}"),
        }
    }
}

/// Converts input for one family of parameters.
///
/// `behavior` and `consumed_count` are queried once at registration and
/// must be consistent with what `bind` actually does: a `Provides` binder
/// never touches the cursor, a `Fixed(n)` binder reads exactly `n` tokens
/// on success.
pub trait Binder: Send + Sync {
    /// Name used in configuration errors and debug output.
    fn name(&self) -> &str;

    /// Keys this binder services when added with
    /// [`BinderRegistry::register_binder`].
    fn keys(&self) -> Vec<BindingKey>;

    fn behavior(&self, parameter: &Parameter) -> BindingBehavior;

    fn consumed_count(&self, parameter: &Parameter) -> ConsumedCount;

    /// Produces the value, or [`ParameterError::Missing`] if the cursor ran
    /// dry, or [`ParameterError::Invalid`] if the input was rejected.
    fn bind(
        &self,
        parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError>;

    /// Completions for a partially typed argument.
    fn suggestions(&self, _parameter: &Parameter, _prefix: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Lookup table from type keys and classifiers to binders.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{BinderRegistry, Parameter, types};
///
/// let registry = BinderRegistry::with_primitives();
/// let text = Parameter::positional("message", types::STRING).classifier(types::TEXT);
/// assert_eq!(registry.lookup(&text).unwrap().name(), "text");
///
/// let block = Parameter::positional("block", "block");
/// assert!(registry.lookup(&block).is_none());
/// ```
#[derive(Clone, Default)]
pub struct BinderRegistry {
    binders: HashMap<BindingKey, Arc<dyn Binder>>,
}

impl BinderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with string, int, double, bool, text and list.
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        registry.register_binder(Arc::new(StringBinder));
        registry.register_binder(Arc::new(TextBinder));
        registry.register_binder(Arc::new(IntegerBinder));
        registry.register_binder(Arc::new(DoubleBinder));
        registry.register_binder(Arc::new(BooleanBinder));
        registry.register_binder(Arc::new(ListBinder));
        registry
    }

    /// Maps one key, returning the binder it replaced.
    pub fn register(
        &mut self,
        key: impl Into<BindingKey>,
        binder: Arc<dyn Binder>,
    ) -> Option<Arc<dyn Binder>> {
        let key = key.into();
        debug!(key = %key, binder = binder.name(), "registering binder");
        self.binders.insert(key, binder)
    }

    /// Maps every key the binder declares.
    pub fn register_binder(&mut self, binder: Arc<dyn Binder>) {
        for key in binder.keys() {
            self.register(key, Arc::clone(&binder));
        }
    }

    /// Classifier match wins over type match.
    pub fn lookup(&self, parameter: &Parameter) -> Option<Arc<dyn Binder>> {
        if let Some(classifier) = parameter.classifier_tag() {
            let found = self
                .binders
                .get(&BindingKey::Classifier(classifier.clone()));
            if found.is_some() {
                return found.cloned();
            }
        }
        self.binders
            .get(&BindingKey::Type(parameter.type_key().clone()))
            .cloned()
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        self.binders.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.binders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }
}

impl fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.binders.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("BinderRegistry").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types;

    #[test]
    fn test_primitives_cover_builtin_keys() {
        let registry = BinderRegistry::with_primitives();
        for key in [types::STRING, types::INT, types::DOUBLE, types::BOOL] {
            assert!(registry.contains(&BindingKey::Type(key)));
        }
        assert!(registry.contains(&BindingKey::Classifier(types::TEXT)));
        assert!(registry.contains(&BindingKey::Classifier(types::LIST)));
    }

    #[test]
    fn test_unknown_classifier_falls_back_to_type() {
        let registry = BinderRegistry::with_primitives();
        let param = Parameter::positional("x", types::INT).classifier("unknown");
        assert_eq!(registry.lookup(&param).unwrap().name(), "int");
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = BinderRegistry::with_primitives();
        let previous = registry.register(types::INT, Arc::new(StringBinder));
        assert_eq!(previous.unwrap().name(), "int");
        let param = Parameter::positional("x", types::INT);
        assert_eq!(registry.lookup(&param).unwrap().name(), "string");
    }
}
