//! Resolved argument values handed to command handlers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One resolved parameter value.
///
/// Primitive bindings produce the scalar variants; domain bindings (block
/// types, patterns, the issuing actor) wrap their own types in
/// [`Value::Custom`].
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    List(Vec<Value>),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps a domain value.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to doubles.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Downcasts a [`Value::Custom`] payload.
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Double(v) => write!(f, "Double({v})"),
            Self::Text(v) => write!(f, "Text({v:?})"),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::List(v) => {
                let parts: Vec<String> = v.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
            Self::Custom(_) => f.write_str("<value>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// The fully resolved argument list of one invocation, in declaration
/// order. Parameters left at "no default" resolve to `None`.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{BoundArgs, Value};
///
/// let args = BoundArgs::new(vec![
///     ("block".into(), Some(Value::from("stone"))),
///     ("radius".into(), Some(Value::Double(2.0))),
///     ("hollow".into(), Some(Value::Bool(true))),
///     ("mask".into(), None),
/// ]);
/// assert_eq!(args.str("block"), Some("stone"));
/// assert_eq!(args.double("radius"), Some(2.0));
/// assert!(args.flag("hollow"));
/// assert!(args.get("mask").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<(String, Option<Value>)>,
}

impl BoundArgs {
    pub fn new(values: Vec<(String, Option<Value>)>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Value at declaration position `index`.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(|(_, v)| v.as_ref())
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_double)
    }

    /// Boolean parameter; absent counts as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn custom<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(Value::downcast::<T>)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }
}
