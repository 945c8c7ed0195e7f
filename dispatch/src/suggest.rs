//! Completion of partially typed lines.

use std::collections::BTreeSet;

use tracing::debug;
use worldcmd_core::{Confidence, Locals, ParsedLine, Proposal};

use crate::registry::Dispatcher;

impl Dispatcher {
    /// Proposals for `partial`, best first.
    ///
    /// - An empty line proposes the primary alias of every visible command.
    /// - A command token still being typed is completed: prefix matches
    ///   propose the missing suffix, substring matches of at least two
    ///   characters propose the whole alias as a low-confidence
    ///   replacement, exact matches propose nothing.
    /// - Once the command is typed and followed by a space, the command's
    ///   own suggester (or the dispatcher's default) takes over.
    ///
    /// # Examples
    ///
    /// ```
    /// use worldcmd_core::{CommandBuilder, CommandSpec, Locals};
    /// use worldcmd_dispatch::Dispatcher;
    ///
    /// let dispatcher = Dispatcher::new(CommandBuilder::new());
    /// dispatcher.register(CommandSpec::new(["sphere", "s"], |_, _| Ok(()))).unwrap();
    /// dispatcher.register(CommandSpec::new(["hsphere"], |_, _| Ok(()))).unwrap();
    ///
    /// let proposals = dispatcher.suggest("sph", &Locals::new());
    /// let texts: Vec<&str> = proposals.iter().map(|p| p.text()).collect();
    /// assert_eq!(texts, ["ere", "hsphere"]);
    /// ```
    pub fn suggest(&self, partial: &str, locals: &Locals) -> Vec<Proposal> {
        let text = self.config().strip_prefix(partial.trim_start());
        let Ok(line) = ParsedLine::parse(text, &BTreeSet::new()) else {
            return Vec::new();
        };

        let mut proposals = if line.is_completely_empty() {
            self.suggest_all(&line, locals)
        } else if !line.is_hanging() && line.is_empty() {
            self.suggest_alias(&line, locals)
        } else {
            self.suggest_arguments(text, &line, locals)
        };
        proposals.sort();
        proposals.dedup();
        proposals
    }

    fn suggest_all(&self, line: &ParsedLine, locals: &Locals) -> Vec<Proposal> {
        self.commands()
            .iter()
            .filter(|command| self.is_visible(command, line, locals))
            .map(|command| {
                Proposal::literal(command.primary_alias()).with_confidence(Confidence::High)
            })
            .collect()
    }

    fn suggest_alias(&self, line: &ParsedLine, locals: &Locals) -> Vec<Proposal> {
        let typed = line.command().to_lowercase();
        let mut proposals = Vec::new();

        for command in self.commands() {
            if !self.is_visible(&command, line, locals) {
                continue;
            }
            for alias in command.aliases() {
                let lower = alias.to_lowercase();
                if lower == typed {
                    break;
                }
                if lower.starts_with(&typed) {
                    proposals.push(Proposal::literal(&lower[typed.len()..]));
                    break;
                }
                if typed.chars().count() >= 2 && lower.contains(&typed) {
                    proposals.push(
                        Proposal::literal(alias.as_str())
                            .replacing_word()
                            .with_confidence(Confidence::Low),
                    );
                    break;
                }
            }
        }
        proposals
    }

    fn suggest_arguments(&self, text: &str, line: &ParsedLine, locals: &Locals) -> Vec<Proposal> {
        let Some(command) = self.get(line.command()) else {
            return Vec::new();
        };
        if !self.is_visible(&command, line, locals) {
            return Vec::new();
        }
        let Some(suggester) = command.suggester().or(self.default_suggester()) else {
            return Vec::new();
        };

        // Re-tokenize with the command's value flags so flag values are not
        // mistaken for positionals; fall back to the plain split mid-flag.
        let scoped = match ParsedLine::parse(text, command.value_flags()) {
            Ok(scoped) => scoped,
            Err(err) => {
                debug!(error = %err, "partial line does not tokenize with value flags");
                line.clone()
            }
        };
        suggester.suggest(&command, &scoped, locals)
    }
}
