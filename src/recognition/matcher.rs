//! Incremental command matching.
//!
//! Every transcript update is evaluated against the whole table. A command is
//! a candidate when its name is a word-aligned prefix of the transcript, and it
//! is confirmed once enough argument words follow it. A transcript that is
//! neither named by nor growing towards any command has diverged.

use crate::recognition::command::{Command, CommandTable, word_count};
use tokio::time::Instant;

/// The command currently satisfied by the transcript-so-far.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub command: Command,
    /// Argument words following the command name when this state was taken.
    pub word_count: usize,
    /// Transcript with the command name stripped.
    pub argument: String,
    pub matched_at: Instant,
}

/// Result of evaluating one transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Some command can still match once more words arrive.
    Pending,
    /// A command is confirmed. `complete` means it reached `max_words` and no
    /// longer command could still outrank it.
    Matched { state: MatchState, complete: bool },
    /// The transcript no longer matches any command.
    Exhausted,
}

impl Evaluation {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Evaluation::Exhausted)
    }
}

#[derive(Debug, Clone)]
pub struct CommandMatcher {
    table: CommandTable,
}

/// `transcript` starts with `name` on a word boundary.
fn names(name: &str, transcript: &str) -> bool {
    transcript == name
        || (transcript.starts_with(name) && transcript[name.len()..].starts_with(' '))
}

/// `transcript` may still grow into `name` (e.g. "pl" → "play").
fn grows_into(name: &str, transcript: &str) -> bool {
    name.len() > transcript.len() && name.starts_with(transcript)
}

impl CommandMatcher {
    pub fn new(table: CommandTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Evaluates a normalized transcript.
    ///
    /// When several commands are satisfied, the one confirmed at the longest
    /// transcript (name words plus `min_words`) wins; ties go to the command
    /// defined first.
    pub fn evaluate(&self, transcript: &str, now: Instant) -> Evaluation {
        let words = word_count(transcript);
        let mut best: Option<(usize, &Command, usize)> = None;
        let mut alive = false;

        for (index, command) in self.table.iter().enumerate() {
            let name = command.name();
            if names(name, transcript) {
                alive = true;
                let args = words - command.name_words();
                if args < command.min_words {
                    continue;
                }
                let rank = command.name_words() + command.min_words;
                if best.is_none_or(|(_, _, best_rank)| rank > best_rank) {
                    best = Some((index, command, rank));
                }
            } else if grows_into(name, transcript) {
                alive = true;
            }
        }

        let Some((best_index, command, best_rank)) = best else {
            return if alive {
                Evaluation::Pending
            } else {
                Evaluation::Exhausted
            };
        };

        let argument = transcript[command.name().len()..].trim().to_string();
        let word_count = word_count(&argument);
        // Only a longer command that would outrank the winner once confirmed
        let contested = self.table.iter().enumerate().any(|(index, other)| {
            let rank = other.name_words() + other.min_words;
            other.name().len() > command.name().len()
                && (rank > best_rank || (rank == best_rank && index < best_index))
                && (names(other.name(), transcript) || grows_into(other.name(), transcript))
        });

        Evaluation::Matched {
            complete: word_count >= command.max_words && !contested,
            state: MatchState {
                command: command.clone(),
                word_count,
                argument,
                matched_at: now,
            },
        }
    }
}
