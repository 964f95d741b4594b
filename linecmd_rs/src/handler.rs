//! Top-level command lookup: the first token of a line names a command.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use strsim::levenshtein;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::context::CommandContext;
use crate::error::{CommandError, Result};
use crate::tokenizer::split_parameters;

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 2;

/// Something an interface can route lines to.
pub trait CommandHandler: Send + Sync {
    /// Whether the first token of `line` names a command of this handler.
    fn can_handle(&self, line: &str) -> bool;

    /// Add `command` under `name`. Returns false if the name is taken.
    fn register(&self, name: &str, command: Arc<dyn Command>) -> bool;

    fn command(&self, name: &str) -> Result<Arc<dyn Command>>;

    /// Tokenize `line`, look up its command and run it.
    fn invoke(&self, line: &str) -> Result<String>;

    /// Registered command names, sorted.
    fn commands(&self) -> Vec<String>;
}

/// Name to command table.
///
/// Registration goes through `&self` so a registry can be shared behind an
/// `Arc` with the interface that routes to it.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<BTreeMap<String, Arc<dyn Command>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`register`](CommandHandler::register) for an owned command.
    pub fn add(&self, name: &str, command: impl Command + 'static) -> bool {
        self.register(name, Arc::new(command))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// The registered name closest to `input`, if any is close enough.
    pub fn suggest(&self, input: &str) -> Option<String> {
        suggest_similar(input, self.read().keys().map(String::as_str))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<dyn Command>>> {
        self.commands
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CommandHandler for CommandRegistry {
    fn can_handle(&self, line: &str) -> bool {
        match split_parameters(line) {
            Ok(splits) => splits
                .first()
                .is_some_and(|name| self.read().contains_key(name)),
            Err(_) => false,
        }
    }

    fn register(&self, name: &str, command: Arc<dyn Command>) -> bool {
        let mut commands = self
            .commands
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if commands.contains_key(name) {
            warn!(command = name, "command already registered, keeping the first");
            return false;
        }
        commands.insert(name.to_string(), command);
        info!(command = name, "registered command");
        true
    }

    fn command(&self, name: &str) -> Result<Arc<dyn Command>> {
        let found = self.read().get(name).cloned();
        found.ok_or_else(|| CommandError::UnknownCommand {
            name: name.to_string(),
            suggestion: self.suggest(name),
        })
    }

    fn invoke(&self, line: &str) -> Result<String> {
        if line.trim().is_empty() {
            return Err(CommandError::EmptyCommand);
        }
        let splits = split_parameters(line)?;
        let Some((name, args)) = splits.split_first() else {
            return Err(CommandError::EmptyCommand);
        };

        let command = self.command(name)?;
        let context = CommandContext::from_tokens(args)
            .map_err(|err| err.with_prefix(&splits[..1]))?;
        debug!(
            command = name.as_str(),
            parameters = context.parameters().len(),
            flags = context.flags().len(),
            "invoking"
        );
        command
            .invoke(&context)
            .map_err(|err| err.with_prefix(&splits[..1]))
    }

    fn commands(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }
}

/// Closest candidate to `input` within [`SUGGESTION_DISTANCE`] edits.
///
/// Comparison is case-insensitive; ties keep the first candidate.
pub fn suggest_similar<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    let input_lower = input.to_lowercase();
    let mut best_match: Option<(&str, usize)> = None;

    for candidate in candidates {
        let distance = levenshtein(&input_lower, &candidate.to_lowercase());
        if distance > SUGGESTION_DISTANCE {
            continue;
        }
        if best_match.is_none_or(|(_, best)| distance < best) {
            best_match = Some((candidate, distance));
        }
    }

    best_match.map(|(name, _)| name.to_string())
}
