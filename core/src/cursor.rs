//! Forward-only argument cursor handed to binders.

use std::borrow::Cow;

use crate::error::ParameterError;
use crate::locals::Locals;

/// A position-tracked view over the arguments a binder may consume.
///
/// Ordinary parameters share one cursor over the line's positional
/// arguments; flag parameters and default values get a synthetic cursor
/// over just their own tokens. Every `next*` call advances the position,
/// including calls that fail to parse.
///
/// # Examples
///
/// ```
/// use worldcmd_core::{ArgumentCursor, Locals, ParameterError};
///
/// let locals = Locals::new();
/// let args = vec!["stone".to_string(), "5".to_string()];
/// let mut cursor = ArgumentCursor::over(&args, &locals);
///
/// assert_eq!(cursor.next().unwrap(), "stone");
/// assert_eq!(cursor.next_int().unwrap(), 5);
/// assert_eq!(cursor.next(), Err(ParameterError::Missing));
/// ```
#[derive(Debug)]
pub struct ArgumentCursor<'a> {
    args: Cow<'a, [String]>,
    position: usize,
    locals: &'a Locals,
}

impl<'a> ArgumentCursor<'a> {
    /// Cursor over borrowed arguments, typically a line's positionals.
    pub fn over(args: &'a [String], locals: &'a Locals) -> Self {
        Self {
            args: Cow::Borrowed(args),
            position: 0,
            locals,
        }
    }

    /// Cursor over owned tokens, used for flag values and defaults.
    pub fn synthetic(args: Vec<String>, locals: &'a Locals) -> Self {
        Self {
            args: Cow::Owned(args),
            position: 0,
            locals,
        }
    }

    /// Cursor over exactly one token.
    pub fn single(value: impl Into<String>, locals: &'a Locals) -> Self {
        Self::synthetic(vec![value.into()], locals)
    }

    /// Ambient context of the invocation.
    pub fn locals(&self) -> &'a Locals {
        self.locals
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.position < self.args.len()
    }

    /// Number of tokens not yet consumed.
    pub fn remaining_count(&self) -> usize {
        self.args.len().saturating_sub(self.position)
    }

    pub fn peek(&self) -> Result<&str, ParameterError> {
        self.args
            .get(self.position)
            .map(String::as_str)
            .ok_or(ParameterError::Missing)
    }

    pub fn next(&mut self) -> Result<String, ParameterError> {
        let value = self.peek()?.to_string();
        self.position += 1;
        Ok(value)
    }

    pub fn next_int(&mut self) -> Result<i64, ParameterError> {
        let raw = self.next()?;
        raw.parse::<i64>()
            .map_err(|_| ParameterError::invalid(format!("Expected '{raw}' to be a number")))
    }

    pub fn next_double(&mut self) -> Result<f64, ParameterError> {
        let raw = self.next()?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParameterError::invalid(format!("Expected '{raw}' to be a number")))
    }

    pub fn next_bool(&mut self) -> Result<bool, ParameterError> {
        let raw = self.next()?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "y" | "1" => Ok(true),
            "false" | "no" | "off" | "n" | "0" => Ok(false),
            _ => Err(ParameterError::invalid(format!(
                "Expected '{raw}' to be true or false"
            ))),
        }
    }

    /// Joins every remaining token with spaces and exhausts the cursor.
    ///
    /// # Errors
    ///
    /// [`ParameterError::Missing`] when nothing is left.
    pub fn remaining(&mut self) -> Result<String, ParameterError> {
        if !self.has_next() {
            return Err(ParameterError::Missing);
        }
        let joined = self.args[self.position..].join(" ");
        self.mark_consumed();
        Ok(joined)
    }

    /// Forces the cursor to the end, e.g. after a binder read the raw rest
    /// of the line by other means.
    pub fn mark_consumed(&mut self) {
        self.position = self.args.len();
    }

    /// Leftover tokens joined by spaces, if any.
    pub fn unconsumed(&self) -> Option<String> {
        self.has_next()
            .then(|| self.args[self.position..].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_failed_parse_still_advances() {
        let locals = Locals::new();
        let args = strings(&["abc", "4"]);
        let mut cursor = ArgumentCursor::over(&args, &locals);
        assert_eq!(
            cursor.next_int(),
            Err(ParameterError::invalid("Expected 'abc' to be a number"))
        );
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.next_double(), Ok(4.0));
    }

    #[test]
    fn test_booleans() {
        let locals = Locals::new();
        let mut cursor = ArgumentCursor::synthetic(strings(&["yes", "OFF", "maybe"]), &locals);
        assert_eq!(cursor.next_bool(), Ok(true));
        assert_eq!(cursor.next_bool(), Ok(false));
        assert!(matches!(cursor.next_bool(), Err(ParameterError::Invalid(_))));
    }

    #[test]
    fn test_remaining_exhausts() {
        let locals = Locals::new();
        let args = strings(&["a", "b c", "d"]);
        let mut cursor = ArgumentCursor::over(&args, &locals);
        cursor.next().unwrap();
        assert_eq!(cursor.unconsumed().as_deref(), Some("b c d"));
        assert_eq!(cursor.remaining().as_deref(), Ok("b c d"));
        assert!(!cursor.has_next());
        assert_eq!(cursor.remaining(), Err(ParameterError::Missing));
        assert_eq!(cursor.unconsumed(), None);
    }

    #[test]
    fn test_remaining_from_start_reconstructs_args() {
        let locals = Locals::new();
        let args = strings(&["one", "two words", "three"]);
        let mut cursor = ArgumentCursor::over(&args, &locals);
        assert_eq!(cursor.remaining().unwrap(), args.join(" "));
    }

    #[test]
    fn test_mark_consumed() {
        let locals = Locals::new();
        let mut cursor = ArgumentCursor::single("x", &locals);
        cursor.mark_consumed();
        assert_eq!(cursor.position(), cursor.len());
        assert_eq!(cursor.remaining_count(), 0);
    }
}
