//! Built-in type keys and classifiers.

use crate::parameter::{Classifier, TypeKey};

pub const STRING: TypeKey = TypeKey::new("string");
pub const INT: TypeKey = TypeKey::new("int");
pub const DOUBLE: TypeKey = TypeKey::new("double");
pub const BOOL: TypeKey = TypeKey::new("bool");

/// Rest of the line as a single string.
pub const TEXT: Classifier = Classifier::new("text");
/// Comma-separated numbers, e.g. ellipsoid radii `3,5,3`.
pub const LIST: Classifier = Classifier::new("list");
