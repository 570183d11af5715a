//! Voice command vocabulary.

use serde::{Deserialize, Deserializer, Serialize};

/// A spoken command and the argument length it accepts.
///
/// `min_words` and `max_words` count the words that follow the command name:
/// `min_words` must be reached before the command can be confirmed, reaching
/// `max_words` finalizes it immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(deserialize_with = "deserialize_name")]
    name: String,
    pub min_words: usize,
    pub max_words: usize,
}

fn deserialize_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(normalize(&raw))
}

impl Command {
    /// Creates a command; the name is normalized like transcripts are.
    pub fn new(name: &str, min_words: usize, max_words: usize) -> Self {
        Self {
            name: normalize(name),
            min_words,
            max_words,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of words in the command name itself.
    pub fn name_words(&self) -> usize {
        word_count(&self.name)
    }
}

/// Lowercases and collapses whitespace so matching is insensitive to both.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Joins the accumulated final text with a partial tail.
pub fn join_transcript(finalized: &str, tail: &str) -> String {
    match (finalized.trim().is_empty(), tail.trim().is_empty()) {
        (true, _) => normalize(tail),
        (false, true) => normalize(finalized),
        (false, false) => normalize(&format!("{finalized} {tail}")),
    }
}

/// The static command table, kept in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl CommandTable {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Command names, used as phrase hints for the speech engine.
    pub fn phrases(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.name.clone()).collect()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new(
            crate::defaults::COMMANDS
                .iter()
                .map(|(name, min, max)| Command::new(name, *min, *max))
                .collect(),
        )
    }
}
