//! Tokenizer and flag extractor.
//!
//! A raw command line is split on single spaces (so that a trailing space
//! survives as an empty "hanging" token), quoted runs are merged back into
//! single arguments, and dash-prefixed letter groups are pulled out as
//! boolean or value flags. The result is an immutable [`ParsedLine`].
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeSet;
//! use worldcmd_core::ParsedLine;
//!
//! let value_flags = BTreeSet::from(['m']);
//! let line = ParsedLine::parse("brush \"red wool\" -h -m air 5", &value_flags).unwrap();
//!
//! assert_eq!(line.command(), "brush");
//! assert_eq!(line.args(), ["red wool", "5"]);
//! assert!(line.has_flag('h'));
//! assert_eq!(line.flag_value('m'), Some("air"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TokenizeError;

/// Token that stops flag scanning; everything after it is positional.
pub const FLAG_TERMINATOR: &str = "--";

/// A tokenized command line.
///
/// Positional arguments are quote-merged; flag characters are split into
/// [`boolean_flags`](Self::boolean_flags) and
/// [`value_flags`](Self::value_flags). The raw tokens are kept so that
/// [`joined_from`](Self::joined_from) can return exactly what the user
/// typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    command: String,
    args: Vec<String>,
    offsets: Vec<usize>,
    original: Vec<String>,
    boolean_flags: BTreeSet<char>,
    value_flags: BTreeMap<char, String>,
    hanging: bool,
}

impl ParsedLine {
    /// Tokenizes `line`, treating every character in `value_flags` as a
    /// flag that consumes the following argument.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizeError::DuplicateValueFlag`] when a value flag is
    /// given twice and [`TokenizeError::MissingFlagValue`] when a value flag
    /// has nothing after it.
    pub fn parse(line: &str, value_flags: &BTreeSet<char>) -> Result<Self, TokenizeError> {
        Self::from_tokens(line.split(' '), value_flags)
    }

    /// Tokenizes a pre-split token array. The first token is the command.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse), plus [`TokenizeError::EmptyLine`]
    /// when `tokens` is empty.
    pub fn from_tokens<I, S>(tokens: I, value_flags: &BTreeSet<char>) -> Result<Self, TokenizeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let original: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let Some(command) = original.first().cloned() else {
            return Err(TokenizeError::EmptyLine);
        };
        let hanging = original.len() > 1 && original.last().is_some_and(|t| t.is_empty());

        let (merged, merged_offsets) = merge_quoted(&original);

        let mut args = Vec::with_capacity(merged.len());
        let mut offsets = Vec::with_capacity(merged.len());
        let mut boolean_flags = BTreeSet::new();
        let mut parsed_value_flags = BTreeMap::new();
        let mut terminated = false;

        let mut next = 0;
        while next < merged.len() {
            let arg = &merged[next];
            let offset = merged_offsets[next];
            next += 1;

            if terminated || !is_flag_token(arg) {
                if !terminated && arg == FLAG_TERMINATOR {
                    terminated = true;
                    continue;
                }
                args.push(arg.clone());
                offsets.push(offset);
                continue;
            }

            for flag in arg.chars().skip(1) {
                if !value_flags.contains(&flag) {
                    boolean_flags.insert(flag);
                    continue;
                }
                if parsed_value_flags.contains_key(&flag) {
                    return Err(TokenizeError::DuplicateValueFlag(flag));
                }
                let Some(value) = merged.get(next) else {
                    return Err(TokenizeError::MissingFlagValue(flag));
                };
                parsed_value_flags.insert(flag, value.clone());
                next += 1;
            }
        }

        Ok(Self {
            command,
            args,
            offsets,
            original,
            boolean_flags,
            value_flags: parsed_value_flags,
            hanging,
        })
    }

    /// The command token exactly as typed.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Case-insensitive comparison against the command token.
    pub fn matches(&self, alias: &str) -> bool {
        self.command.eq_ignore_ascii_case(alias)
    }

    /// Quote-merged positional arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` when there are no positional arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Positional argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Positional argument at `index`, or `default` when absent.
    pub fn arg_or<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        self.arg(index).unwrap_or(default)
    }

    /// Indices into the raw token array for each positional argument.
    pub fn original_offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Raw text from positional argument `index` to the end of the line,
    /// unmerged and with quotes intact.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use worldcmd_core::ParsedLine;
    ///
    /// let line = ParsedLine::parse("say hello \"big  world\"", &BTreeSet::new()).unwrap();
    /// assert_eq!(line.args(), ["hello", "big  world"]);
    /// assert_eq!(line.joined_from(1).as_deref(), Some("\"big  world\""));
    /// ```
    pub fn joined_from(&self, index: usize) -> Option<String> {
        let offset = *self.offsets.get(index)?;
        Some(self.original[offset..].join(" "))
    }

    /// Quote-stripped positional arguments from `index` joined by spaces.
    pub fn remaining_from(&self, index: usize) -> String {
        self.args.get(index..).map(|rest| rest.join(" ")).unwrap_or_default()
    }

    /// Flags that were given without a value.
    pub fn boolean_flags(&self) -> &BTreeSet<char> {
        &self.boolean_flags
    }

    /// Flags that consumed a following value.
    pub fn value_flags(&self) -> &BTreeMap<char, String> {
        &self.value_flags
    }

    /// Every flag character present, boolean or value.
    pub fn flags(&self) -> BTreeSet<char> {
        self.boolean_flags
            .iter()
            .chain(self.value_flags.keys())
            .copied()
            .collect()
    }

    /// Returns `true` if `flag` was given, with or without a value.
    pub fn has_flag(&self, flag: char) -> bool {
        self.boolean_flags.contains(&flag) || self.value_flags.contains_key(&flag)
    }

    /// Value given for a value flag.
    pub fn flag_value(&self, flag: char) -> Option<&str> {
        self.value_flags.get(&flag).map(String::as_str)
    }

    /// Value given for a value flag, or `default` when absent.
    pub fn flag_or<'a>(&'a self, flag: char, default: &'a str) -> &'a str {
        self.flag_value(flag).unwrap_or(default)
    }

    /// `true` when the line ends in a space: the user is about to type a
    /// new argument.
    pub fn is_hanging(&self) -> bool {
        self.hanging
    }

    /// `true` for a line with no command and no arguments.
    pub fn is_completely_empty(&self) -> bool {
        self.command.is_empty() && self.args.is_empty()
    }
}

/// A token is a flag group iff it is `-` followed by one or more ASCII
/// letters.
fn is_flag_token(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next() == Some('-') && token.len() > 1 && chars.all(|c| c.is_ascii_alphabetic())
}

/// Drops empty tokens and merges quoted runs, skipping the command token.
/// Returns the merged arguments and the raw index each one started at.
fn merge_quoted(tokens: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut offsets = Vec::with_capacity(tokens.len());

    let mut i = 1;
    while i < tokens.len() {
        let start = i;
        let token = &tokens[i];
        i += 1;
        if token.is_empty() {
            continue;
        }

        let mut arg = token.clone();
        if let Some(quote) = token.chars().next().filter(|c| *c == '\'' || *c == '"') {
            // Unterminated quotes fall through and keep the token literally.
            if let Some((end, text)) = close_quote(tokens, start, quote) {
                arg = text;
                i = end + 1;
            }
        }

        if arg.is_empty() {
            continue;
        }
        merged.push(arg);
        offsets.push(start);
    }

    (merged, offsets)
}

fn close_quote(tokens: &[String], start: usize, quote: char) -> Option<(usize, String)> {
    let mut text = String::new();
    for (end, token) in tokens.iter().enumerate().skip(start) {
        let body = if end == start {
            &token[quote.len_utf8()..]
        } else {
            text.push(' ');
            token.as_str()
        };
        if let Some(stripped) = body.strip_suffix(quote) {
            text.push_str(stripped);
            return Some((end, text));
        }
        text.push_str(body);
    }
    None
}
