//! Per-invocation view of a command's arguments.
//!
//! Tokens that start with a dash are flags. `-k value` consumes the token
//! after it as its value; `--switch` never consumes anything. Everything
//! else stays positional, in order.

use std::collections::BTreeMap;

use crate::error::{ParameterParseError, ParseErrorKind};

/// Flag key to optional value, keyed with the dashes included (`-n`, `--all`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(BTreeMap<String, Option<String>>);

impl Flags {
    /// Extract every flag from `tokens`.
    ///
    /// A single-dash flag that is the last token fails with
    /// [`ParseErrorKind::MissingFlagValue`] positioned on that flag.
    pub fn extract(tokens: &[String]) -> Result<Self, ParameterParseError> {
        let mut map = BTreeMap::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if token.starts_with("--") {
                map.insert(token.clone(), None);
            } else if token.starts_with('-') {
                let value = tokens.get(i + 1).ok_or_else(|| {
                    ParameterParseError::new(
                        ParseErrorKind::MissingFlagValue {
                            flag: token.clone(),
                        },
                        tokens,
                        i,
                    )
                })?;
                map.insert(token.clone(), Some(value.clone()));
                i += 1;
            }
            i += 1;
        }
        Ok(Self(map))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// `None` if the flag is absent, `Some(None)` for a value-less flag.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.0.get(key).map(Option::as_deref)
    }

    /// The flag's value, if the flag is present and carries one.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Option<String>)> for Flags {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Drop flags (and the values of single-dash flags) from `tokens`.
pub fn filter_flags(tokens: &[String]) -> Vec<String> {
    let mut positional = Vec::with_capacity(tokens.len());
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if token.starts_with('-') {
            if !token.starts_with("--") {
                iter.next();
            }
            continue;
        }
        positional.push(token.clone());
    }
    positional
}

/// `tokens` without their first `count` positional tokens.
fn drop_positional(tokens: &[String], count: usize) -> Vec<String> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut dropped = 0;
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if token.starts_with('-') {
            kept.push(token.clone());
            if !token.starts_with("--") {
                kept.extend(iter.next().cloned());
            }
        } else if dropped < count {
            dropped += 1;
        } else {
            kept.push(token.clone());
        }
    }
    kept
}

/// Positional parameters and flags of one invocation.
///
/// Contexts are never mutated; narrowing the parameters after a path walk
/// produces a new context via [`skip`](Self::skip). The raw tokens are kept
/// alongside so flag errors can point at the token that caused them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandContext {
    parameters: Vec<String>,
    flags: Flags,
    tokens: Vec<String>,
}

impl CommandContext {
    /// Tokens are rebuilt as the parameters followed by the flags.
    pub fn new(parameters: Vec<String>, flags: Flags) -> Self {
        let mut tokens = parameters.clone();
        for (key, value) in flags.iter() {
            tokens.push(key.to_string());
            tokens.extend(value.map(str::to_string));
        }
        Self {
            parameters,
            flags,
            tokens,
        }
    }

    /// Build a context from the argument tokens that follow a command name.
    pub fn from_tokens(tokens: &[String]) -> Result<Self, ParameterParseError> {
        let flags = Flags::extract(tokens)?;
        Ok(Self {
            parameters: filter_flags(tokens),
            flags,
            tokens: tokens.to_vec(),
        })
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Positional parameters and flags in their original order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Index into [`tokens`](Self::tokens) of the value of flag `key`.
    ///
    /// A repeated flag resolves to its last occurrence, as in [`Flags`].
    pub fn flag_value_position(&self, key: &str) -> Option<usize> {
        let mut found = None;
        let mut i = 0;
        while i < self.tokens.len() {
            let token = &self.tokens[i];
            if token.starts_with('-') && !token.starts_with("--") {
                if token == key {
                    found = Some(i + 1);
                }
                i += 1;
            }
            i += 1;
        }
        found.filter(|&index| index < self.tokens.len())
    }

    /// Same flags, different positional parameters.
    pub fn with_parameters(self, parameters: Vec<String>) -> Self {
        let mut tokens = parameters.clone();
        tokens.extend(drop_positional(&self.tokens, usize::MAX));
        Self {
            parameters,
            flags: self.flags,
            tokens,
        }
    }

    /// Same flags, without the first `consumed` positional parameters.
    pub fn skip(&self, consumed: usize) -> Self {
        let start = consumed.min(self.parameters.len());
        Self {
            parameters: self.parameters[start..].to_vec(),
            flags: self.flags.clone(),
            tokens: drop_positional(&self.tokens, consumed),
        }
    }
}
