//! Completion proposals and per-command suggesters.

use std::cmp::Ordering;

use crate::command::{CommandDescriptor, placeholder};
use crate::locals::Locals;
use crate::line::ParsedLine;
use crate::parameter::ConsumedCount;

/// How strongly a proposal should be ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    Low,
    #[default]
    Default,
    High,
}

/// One completion candidate.
///
/// Literal proposals are text to insert; hints (`<radius>`) only describe
/// what belongs at the cursor. With `replace_word` set the proposal
/// replaces the word being typed instead of extending it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proposal {
    text: String,
    hint: bool,
    replace_word: bool,
    confidence: Confidence,
}

impl Proposal {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hint: false,
            replace_word: false,
            confidence: Confidence::Default,
        }
    }

    pub fn hint(text: impl Into<String>) -> Self {
        Self {
            hint: true,
            ..Self::literal(text)
        }
    }

    pub fn replacing_word(mut self) -> Self {
        self.replace_word = true;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_hint(&self) -> bool {
        self.hint
    }

    pub fn replaces_word(&self) -> bool {
        self.replace_word
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }
}

impl PartialOrd for Proposal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Higher confidence first, then literals before hints, then by text.
impl Ord for Proposal {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .cmp(&self.confidence)
            .then_with(|| self.hint.cmp(&other.hint))
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.replace_word.cmp(&other.replace_word))
    }
}

/// Completes arguments of one command once its alias has been typed.
pub trait CommandSuggester: Send + Sync {
    /// `line` is the partial input, already tokenized with the command's
    /// value flags when possible.
    fn suggest(
        &self,
        command: &CommandDescriptor,
        line: &ParsedLine,
        locals: &Locals,
    ) -> Vec<Proposal>;
}

/// Proposes the next positional parameter: binder completions as literals
/// plus a `<name>` hint.
///
/// While a word is being typed it completes that word; after a trailing
/// space it looks at the following parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterHintSuggester;

impl CommandSuggester for ParameterHintSuggester {
    fn suggest(
        &self,
        command: &CommandDescriptor,
        line: &ParsedLine,
        _locals: &Locals,
    ) -> Vec<Proposal> {
        let (target, prefix) = if line.is_hanging() || line.is_empty() {
            (line.len(), "")
        } else {
            (line.len() - 1, line.arg(line.len() - 1).unwrap_or_default())
        };

        let mut consumed: usize = 0;
        for parameter in command.parameters().iter().filter(|p| p.is_positional_consumer()) {
            let width = match parameter.consumed_count() {
                ConsumedCount::Fixed(n) => n,
                ConsumedCount::Variable => usize::MAX,
            };
            if target >= consumed.saturating_add(width) {
                consumed = consumed.saturating_add(width);
                continue;
            }

            let mut proposals: Vec<Proposal> = parameter
                .binder()
                .suggestions(parameter.parameter(), prefix)
                .into_iter()
                .map(|text| {
                    let proposal = Proposal::literal(text);
                    if prefix.is_empty() {
                        proposal
                    } else {
                        proposal.replacing_word()
                    }
                })
                .collect();
            proposals.push(Proposal::hint(placeholder(parameter)).with_confidence(Confidence::Low));
            return proposals;
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSpec;
    use crate::parameter::Parameter;
    use crate::pipeline::CommandBuilder;
    use crate::types;

    fn hints(text: &str) -> Vec<Proposal> {
        let builder = CommandBuilder::new();
        let spec = CommandSpec::new(["s"], |_, _| Ok(()))
            .param(Parameter::positional("block", types::STRING))
            .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
            .param(Parameter::positional("filled", types::BOOL).optional());
        let command = builder.build(spec).unwrap();
        let line = ParsedLine::parse(text, command.value_flags()).unwrap();
        ParameterHintSuggester.suggest(&command, &line, &Locals::new())
    }

    #[test]
    fn test_ordering_puts_confident_literals_first() {
        let mut proposals = vec![
            Proposal::hint("<radius>").with_confidence(Confidence::Low),
            Proposal::literal("sphere"),
            Proposal::literal("set").with_confidence(Confidence::High),
            Proposal::literal("brush"),
        ];
        proposals.sort();
        let texts: Vec<&str> = proposals.iter().map(Proposal::text).collect();
        assert_eq!(texts, ["set", "brush", "sphere", "<radius>"]);
    }

    #[test]
    fn test_hint_flag() {
        assert!(Proposal::hint("<x>").is_hint());
        assert!(!Proposal::literal("x").is_hint());
        assert!(Proposal::literal("x").replacing_word().replaces_word());
    }

    #[test]
    fn test_hint_skips_filled_positionals() {
        let proposals = hints("s stone ");
        assert_eq!(proposals, [Proposal::hint("[radius]").with_confidence(Confidence::Low)]);

        let proposals = hints("s stone 3 t");
        assert_eq!(proposals[0], Proposal::literal("true").replacing_word());
        assert_eq!(proposals.last().map(Proposal::text), Some("[filled]"));
    }
}
