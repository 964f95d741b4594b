//! Error taxonomy for tokenizing, binding and dispatching command lines.
//!
//! Parse failures carry the token split they were raised against plus the
//! index of the offending token, so the message can point a caret at the
//! exact column of the input line. The column is only computed when the
//! message is rendered.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CommandError>;

/// What went wrong while turning tokens into parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A quote group was opened but never closed.
    Grouping { delimiter: char },
    /// A single-dash flag was the last token, so it has no value.
    MissingFlagValue { flag: String },
    /// A numeric parameter received a token that is not a number.
    InvalidNumber { token: String, expected: &'static str },
    /// A character parameter received an empty token.
    InvalidCharacter,
}

/// A parse failure positioned on one token of a split command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterParseError {
    kind: ParseErrorKind,
    input: Vec<String>,
    index: usize,
}

impl ParameterParseError {
    pub fn new(kind: ParseErrorKind, input: &[String], index: usize) -> Self {
        Self {
            kind,
            input: input.to_vec(),
            index,
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Index into [`input_splits`](Self::input_splits) of the faulty token.
    pub fn split_index_at_fault(&self) -> usize {
        self.index
    }

    /// 1-based column of the faulty token in the joined input.
    pub fn index_at_fault(&self) -> usize {
        1 + self
            .input
            .iter()
            .take(self.index)
            .map(|token| token.chars().count() + 1)
            .sum::<usize>()
    }

    pub fn input_splits(&self) -> &[String] {
        &self.input
    }

    /// The split tokens joined back with single spaces.
    pub fn input(&self) -> String {
        self.input.join(" ")
    }

    /// Re-bases the error onto a longer split whose tail is `self.input`.
    ///
    /// Used when flags were extracted from the arguments of a command but the
    /// caret should point into the whole line, command name included.
    pub fn with_prefix(mut self, prefix: &[String]) -> Self {
        let mut input = prefix.to_vec();
        input.append(&mut self.input);
        self.index += prefix.len();
        self.input = input;
        self
    }

    pub fn error_message(&self) -> String {
        let at = self.index_at_fault();
        match &self.kind {
            ParseErrorKind::Grouping { delimiter } => format!(
                "Failed to parse command parameters as the bracket [{delimiter}] at index {at} is never closed!"
            ),
            ParseErrorKind::MissingFlagValue { flag } => format!(
                "Failed to parse command parameters as the optional parameter [{flag}] at index {at} has no value!"
            ),
            ParseErrorKind::InvalidNumber { token, expected } => {
                format!("'{token}' at index {at} is not a valid {expected}!")
            }
            ParseErrorKind::InvalidCharacter => {
                format!("Expected a character at index {at} but the parameter is empty!")
            }
        }
    }

    /// Two lines: the input, then a caret under the faulty column.
    pub fn fault_display(&self) -> String {
        format!(
            "{}\n{}^",
            self.input(),
            " ".repeat(self.index_at_fault() - 1)
        )
    }
}

impl fmt::Display for ParameterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.error_message(), self.fault_display())
    }
}

impl std::error::Error for ParameterParseError {}

/// Everything that can go wrong between receiving a line and returning its result.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Can't parse an empty command!")]
    EmptyCommand,

    #[error(
        "No command with the name '{name}' exists!{}",
        suggestion_hint(.suggestion)
    )]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },

    #[error(transparent)]
    Parse(#[from] ParameterParseError),

    #[error("Missing argument {index} of type {expected}")]
    MissingArgument {
        index: usize,
        expected: Cow<'static, str>,
    },

    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    /// Name carried by an [`UnknownCommand`](CommandError::UnknownCommand) error.
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Self::UnknownCommand { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Re-base a parse error onto a split that starts with `prefix`.
    ///
    /// Other variants carry no position and are returned unchanged.
    pub fn with_prefix(self, prefix: &[String]) -> Self {
        match self {
            Self::Parse(err) => Self::Parse(err.with_prefix(prefix)),
            other => other,
        }
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" Did you mean '{s}'?"))
        .unwrap_or_default()
}

/// A path segment matched neither an operation nor a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no operation or field matches {} at depth {depth}", describe_segment(.segment))]
pub struct PathNotFound {
    /// The unmatched segment, or `None` when the path ran out inside a scope
    /// without a default operation.
    pub segment: Option<String>,
    pub depth: usize,
}

fn describe_segment(segment: &Option<String>) -> String {
    match segment {
        Some(segment) => format!("'{segment}'"),
        None => "an empty path".to_string(),
    }
}

/// A controller table that cannot be dispatched deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("controller '{scope}' marks both '{first}' and '{second}' as default")]
    MultipleDefaults {
        scope: String,
        first: String,
        second: String,
    },
    #[error("controller '{scope}' declares '{name}' twice with {arity} parameter(s)")]
    DuplicateOperation {
        scope: String,
        name: String,
        arity: usize,
    },
    #[error("controller '{scope}' declares field '{name}' twice")]
    DuplicateField { scope: String, name: String },
}
