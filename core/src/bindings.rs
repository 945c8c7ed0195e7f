//! Primitive binders plus a generic binder for values held in locals.

use std::any::{Any, type_name};
use std::marker::PhantomData;

use crate::binder::{Binder, BindingKey};
use crate::cursor::ArgumentCursor;
use crate::error::ParameterError;
use crate::parameter::{BindingBehavior, ConsumedCount, Modifier, Parameter, TypeKey};
use crate::types;
use crate::value::Value;

/// Applies [`Modifier::Range`] bounds to a parsed number.
pub fn check_range(parameter: &Parameter, number: f64) -> Result<(), ParameterError> {
    for modifier in parameter.modifiers() {
        let Modifier::Range { min, max } = modifier else {
            continue;
        };
        if let Some(min) = min {
            if number < *min {
                return Err(ParameterError::invalid(format!(
                    "A valid value is greater than or equal to {min} (you entered {number})"
                )));
            }
        }
        if let Some(max) = max {
            if number > *max {
                return Err(ParameterError::invalid(format!(
                    "A valid value is less than or equal to {max} (you entered {number})"
                )));
            }
        }
    }
    Ok(())
}

/// Applies [`Modifier::Validate`] patterns to text. The whole string must
/// match.
pub fn check_pattern(parameter: &Parameter, text: &str) -> Result<(), ParameterError> {
    for modifier in parameter.modifiers() {
        let Modifier::Validate(pattern) = modifier else {
            continue;
        };
        let full = pattern
            .find(text)
            .is_some_and(|m| m.start() == 0 && m.end() == text.len());
        if !full {
            return Err(ParameterError::invalid(format!(
                "The given text doesn't match the right format (technically speaking, the 'format' is {})",
                pattern.as_str()
            )));
        }
    }
    Ok(())
}

/// One word.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringBinder;

impl Binder for StringBinder {
    fn name(&self) -> &str {
        "string"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![types::STRING.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        let text = cursor.next()?;
        check_pattern(parameter, &text)?;
        Ok(Value::Text(text))
    }
}

/// Everything left on the line, joined by spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBinder;

impl Binder for TextBinder {
    fn name(&self) -> &str {
        "text"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![types::TEXT.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Variable
    }

    fn bind(
        &self,
        parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        let text = cursor.remaining()?;
        check_pattern(parameter, &text)?;
        Ok(Value::Text(text))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerBinder;

impl Binder for IntegerBinder {
    fn name(&self) -> &str {
        "int"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![types::INT.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        let number = cursor.next_int()?;
        check_range(parameter, number as f64)?;
        Ok(Value::Int(number))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBinder;

impl Binder for DoubleBinder {
    fn name(&self) -> &str {
        "double"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![types::DOUBLE.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        let number = cursor.next_double()?;
        check_range(parameter, number)?;
        Ok(Value::Double(number))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanBinder;

impl Binder for BooleanBinder {
    fn name(&self) -> &str {
        "bool"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![types::BOOL.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        _parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        cursor.next_bool().map(Value::Bool)
    }

    fn suggestions(&self, _parameter: &Parameter, prefix: &str) -> Vec<String> {
        ["true", "false"]
            .into_iter()
            .filter(|v| v.starts_with(&prefix.to_ascii_lowercase()))
            .map(str::to_string)
            .collect()
    }
}

/// Comma-separated numbers in one token, e.g. `3,5,3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListBinder;

impl Binder for ListBinder {
    fn name(&self) -> &str {
        "list"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![types::LIST.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        let raw = cursor.next()?;
        let mut items = Vec::new();
        for part in raw.split(',') {
            let number = part
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ParameterError::invalid(format!("Expected '{part}' to be a number"))
                })?;
            check_range(parameter, number)?;
            items.push(Value::Double(number));
        }
        Ok(Value::List(items))
    }
}

/// Provides a `T` stored in the invocation's locals.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use worldcmd_core::{ArgumentCursor, Binder, Locals, LocalsBinder, Parameter};
///
/// #[derive(Clone)]
/// struct World(&'static str);
///
/// let binder = LocalsBinder::<World>::new("world");
/// let locals = Locals::new().with(World("overworld"));
/// let mut cursor = ArgumentCursor::synthetic(Vec::new(), &locals);
/// let value = binder.bind(&Parameter::provided("world"), &mut cursor).unwrap();
/// assert_eq!(value.downcast::<World>().unwrap().0, "overworld");
/// ```
pub struct LocalsBinder<T> {
    key: TypeKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> LocalsBinder<T> {
    pub fn new(key: impl Into<TypeKey>) -> Self {
        Self {
            key: key.into(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Clone + Send + Sync> Binder for LocalsBinder<T> {
    fn name(&self) -> &str {
        self.key.as_str()
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![self.key.clone().into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Provides
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(0)
    }

    fn bind(
        &self,
        _parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        cursor
            .locals()
            .get::<T>()
            .cloned()
            .map(Value::custom)
            .ok_or_else(|| {
                ParameterError::invalid(format!("No {} is available here", type_name::<T>()))
            })
    }
}
