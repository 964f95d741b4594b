//! Binding positional tokens to an operation's formal parameters.
//!
//! The reader walks the context's positional parameters with one cursor.
//! Primitive parameters consume one token each; custom parameters hand the
//! reader to their type parser, which may consume any number of tokens.
//! Flags are never bound positionally, only read on demand by key.

use crate::context::CommandContext;
use crate::error::{ParameterParseError, Result};
use crate::types::{Argument, BoundValue, ParamType, PrimitiveKind, TypeParsers};

/// Cursor over one invocation's positional parameters.
pub struct ParameterReader<'a> {
    context: &'a CommandContext,
    parsers: &'a TypeParsers,
    pointer: usize,
}

impl<'a> ParameterReader<'a> {
    pub fn new(context: &'a CommandContext, parsers: &'a TypeParsers) -> Self {
        Self {
            context,
            parsers,
            pointer: 0,
        }
    }

    pub fn context(&self) -> &'a CommandContext {
        self.context
    }

    pub fn has_next(&self) -> bool {
        self.pointer < self.context.parameters().len()
    }

    /// Index of the next unread token.
    pub fn position(&self) -> usize {
        self.pointer
    }

    pub fn remaining(&self) -> usize {
        self.context.parameters().len().saturating_sub(self.pointer)
    }

    /// Read the next raw token and advance the cursor.
    pub fn read_string(&mut self) -> Option<String> {
        let token = self.context.parameters().get(self.pointer)?.clone();
        self.pointer += 1;
        Some(token)
    }

    /// Read one value of type `ty`.
    ///
    /// `Ok(None)` when the tokens ran out or no parser is registered for a
    /// custom type; neither is an error at this layer.
    pub fn read(&mut self, ty: &ParamType) -> Result<Option<BoundValue>> {
        match ty {
            ParamType::Primitive(kind) => {
                let index = self.pointer;
                let Some(token) = self.read_string() else {
                    return Ok(None);
                };
                kind.coerce(&token).map(Some).map_err(|err| {
                    ParameterParseError::new(err, self.context.parameters(), index).into()
                })
            }
            ParamType::Custom { id, .. } => {
                let (context, parsers) = (self.context, self.parsers);
                parsers.parse(*id, context, self)
            }
            ParamType::Flags => Ok(Some(Box::new(self.context.flags().clone()))),
        }
    }

    /// Read the next token as `T`; `Ok(None)` when nothing could be bound.
    pub fn read_as<T: Argument>(&mut self) -> Result<Option<T>> {
        let index = self.pointer;
        match self.read(&T::param_type())? {
            Some(value) => T::from_bound(Some(value), index).map(Some),
            None => Ok(None),
        }
    }

    /// Read the flag `key` as `T` without moving the cursor.
    ///
    /// Absent flags and non-primitive `T` give `None`. A value-less flag
    /// (`--verbose`) reads as `true` for `bool` and `None` otherwise.
    pub fn read_optional<T: Argument>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.context.flags().get(key) else {
            return Ok(None);
        };
        let ParamType::Primitive(kind) = T::param_type() else {
            return Ok(None);
        };
        let raw = match value {
            Some(raw) => raw,
            None if kind == PrimitiveKind::Bool => "true",
            None => return Ok(None),
        };
        let bound = kind.coerce(raw).map_err(|err| {
            match self.context.flag_value_position(key) {
                Some(index) => ParameterParseError::new(err, self.context.tokens(), index),
                None => ParameterParseError::new(err, &[key.to_string(), raw.to_string()], 1),
            }
        })?;
        T::from_bound(Some(bound), 0).map(Some)
    }
}

/// Bind tokens to `params` in declared order.
///
/// A parameter with no token left binds to `None`; tokens beyond the last
/// parameter are ignored.
pub fn bind(
    params: &[ParamType],
    reader: &mut ParameterReader<'_>,
) -> Result<Vec<Option<BoundValue>>> {
    params
        .iter()
        .map(|ty| {
            if ty.takes_token() && !reader.has_next() {
                Ok(None)
            } else {
                reader.read(ty)
            }
        })
        .collect()
}
