//! Ambient invocation context.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

/// Type-keyed bag of values describing who or what issued a command.
///
/// Providing binders read from it (the issuing actor, their session, the
/// world they stand in) instead of consuming user input.
///
/// # Examples
///
/// ```
/// use worldcmd_core::Locals;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Actor(String);
///
/// let mut locals = Locals::new();
/// locals.put(Actor("sk89q".into()));
/// assert_eq!(locals.get::<Actor>(), Some(&Actor("sk89q".into())));
/// assert!(locals.get::<u32>().is_none());
/// ```
#[derive(Default)]
pub struct Locals {
    values: HashMap<TypeId, (&'static str, Box<dyn Any + Send + Sync>)>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, replacing any previous value of the same type.
    pub fn put<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.values
            .insert(TypeId::of::<T>(), (type_name::<T>(), Box::new(value)));
        self
    }

    /// Builder-style [`put`](Self::put).
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.put(value);
        self
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|(_, value)| value.downcast_ref::<T>())
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Locals").field("types", &names).finish()
    }
}
