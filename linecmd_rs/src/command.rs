//! Commands: what a registry name maps to.
//!
//! Two flavors share the [`Command`] trait:
//!
//! - [`SimpleCommand`] wraps a closure and does no path resolution.
//! - [`ControllerCommand`] walks the arguments through a [`Controller`]
//!   scope tree and invokes the leaf operation with typed arguments.

use std::fmt::Display;
use std::sync::Arc;

use tracing::debug;

use crate::context::CommandContext;
use crate::controller::Controller;
use crate::error::{CommandError, Result};
use crate::tokenizer::plain_split;
use crate::types::TypeParsers;

/// Result text of a controller command whose path matched nothing.
pub const COMMAND_NOT_FOUND: &str = "Command not found";

/// A named entry of a command registry.
pub trait Command: Send + Sync {
    /// Run the command against one invocation's arguments.
    fn invoke(&self, context: &CommandContext) -> Result<String>;

    /// Candidates for the next word after `prefix` (the text typed so far).
    fn next_completion(&self, _prefix: &str) -> Vec<String> {
        Vec::new()
    }

    fn usage(&self) -> String {
        String::new()
    }
}

/// Conversion of a handler's return value into the command result text.
pub trait IntoOutput {
    fn into_output(self) -> Result<String>;
}

impl IntoOutput for String {
    fn into_output(self) -> Result<String> {
        Ok(self)
    }
}

impl IntoOutput for &'static str {
    fn into_output(self) -> Result<String> {
        Ok(self.to_string())
    }
}

impl IntoOutput for () {
    fn into_output(self) -> Result<String> {
        Ok(String::new())
    }
}

macro_rules! display_output {
    ($($ty:ty),*) => {
        $(
            impl IntoOutput for $ty {
                fn into_output(self) -> Result<String> {
                    Ok(self.to_string())
                }
            }
        )*
    };
}

display_output!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: IntoOutput, E: Display> IntoOutput for std::result::Result<T, E> {
    fn into_output(self) -> Result<String> {
        self.map_err(|e| CommandError::Failed(e.to_string()))?
            .into_output()
    }
}

type Action = Box<dyn Fn(&CommandContext) -> Result<String> + Send + Sync>;

/// A closure-backed command.
pub struct SimpleCommand {
    action: Action,
    usage: String,
}

impl SimpleCommand {
    /// Wrap a closure that ignores the arguments.
    ///
    /// Closures returning `()` produce an empty result.
    pub fn new<F, R>(action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoOutput,
    {
        Self::with_context(move |_| action())
    }

    /// Wrap a closure that reads the invocation's parameters and flags itself.
    pub fn with_context<F, R>(action: F) -> Self
    where
        F: Fn(&CommandContext) -> R + Send + Sync + 'static,
        R: IntoOutput,
    {
        Self {
            action: Box::new(move |context| action(context).into_output()),
            usage: String::new(),
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }
}

impl Command for SimpleCommand {
    fn invoke(&self, context: &CommandContext) -> Result<String> {
        (self.action)(context)
    }

    fn usage(&self) -> String {
        self.usage.clone()
    }
}

/// A command resolved through a controller scope tree.
pub struct ControllerCommand {
    controller: Arc<Controller>,
    parsers: Arc<TypeParsers>,
}

impl ControllerCommand {
    pub fn new(controller: impl Into<Arc<Controller>>) -> Self {
        Self {
            controller: controller.into(),
            parsers: Arc::new(TypeParsers::new()),
        }
    }

    /// Use `parsers` for non-primitive operation arguments.
    pub fn with_parsers(mut self, parsers: Arc<TypeParsers>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl Command for ControllerCommand {
    fn invoke(&self, context: &CommandContext) -> Result<String> {
        let resolution = match self.controller.resolve(context.parameters()) {
            Ok(resolution) => resolution,
            Err(miss) => {
                debug!(controller = self.controller.type_name(), %miss, "path not found");
                return Ok(COMMAND_NOT_FOUND.to_string());
            }
        };
        debug!(
            controller = self.controller.type_name(),
            operation = resolution.operation.name(),
            consumed = resolution.consumed,
            "resolved"
        );
        let leaf_context = context.skip(resolution.consumed);
        resolution
            .operation
            .invoke(&leaf_context, &self.parsers)
            .map_err(|err| err.with_prefix(&context.parameters()[..resolution.consumed]))
    }

    fn next_completion(&self, prefix: &str) -> Vec<String> {
        let mut words = plain_split(prefix);
        let partial = if prefix.is_empty() || prefix.ends_with(' ') {
            String::new()
        } else {
            words.pop().unwrap_or_default()
        };
        self.controller.completions(&words, &partial)
    }

    fn usage(&self) -> String {
        self.controller.usage_lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Tag;

    fn context(line: &str) -> CommandContext {
        let tokens: Vec<String> = line.split(' ').map(str::to_string).collect();
        CommandContext::from_tokens(&tokens).unwrap()
    }

    fn test_controller() -> Controller {
        Controller::builder("TestCommand")
            .operation(Tag::default_op(), "run", |msg: String| msg)
            .operation(Tag::named("Something"), "run", |msg: String, i: i32| {
                msg.repeat(i.max(0) as usize)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_simple_command_result() {
        let cmd = SimpleCommand::new(|| "say hi");
        assert_eq!(cmd.invoke(&CommandContext::default()).unwrap(), "say hi");

        let silent = SimpleCommand::new(|| ());
        assert_eq!(silent.invoke(&CommandContext::default()).unwrap(), "");
    }

    #[test]
    fn test_simple_command_with_context() {
        let cmd = SimpleCommand::with_context(|ctx: &CommandContext| ctx.parameters().join("+"))
            .with_usage("join <words...>");
        assert_eq!(cmd.invoke(&context("a b c")).unwrap(), "a+b+c");
        assert_eq!(cmd.usage(), "join <words...>");
        assert!(cmd.next_completion("").is_empty());
    }

    #[test]
    fn test_controller_command_dispatch() {
        let cmd = ControllerCommand::new(test_controller());
        assert_eq!(cmd.invoke(&context("hello")).unwrap(), "hello");
        assert_eq!(cmd.invoke(&context("Something hi 3")).unwrap(), "hihihi");
    }

    #[test]
    fn test_parse_error_positioned_on_path() {
        let cmd = ControllerCommand::new(test_controller());
        match cmd.invoke(&context("Something hi x")) {
            Err(CommandError::Parse(err)) => {
                assert_eq!(err.input(), "Something hi x");
                assert_eq!(err.split_index_at_fault(), 2);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_path_is_soft_failure() {
        let cmd = ControllerCommand::new(
            Controller::builder("NoDefault")
                .operation(Tag::none(), "ping", || "pong")
                .build()
                .unwrap(),
        );
        assert_eq!(cmd.invoke(&context("pong")).unwrap(), COMMAND_NOT_FOUND);
        assert_eq!(
            cmd.invoke(&CommandContext::default()).unwrap(),
            COMMAND_NOT_FOUND
        );
    }

    #[test]
    fn test_controller_command_usage_and_completion() {
        let cmd = ControllerCommand::new(test_controller());
        assert_eq!(cmd.usage(), "run <string> (default)\nSomething <string> <i32>");
        assert_eq!(cmd.next_completion("So"), ["Something"]);
        assert_eq!(cmd.next_completion(""), ["Something", "run"]);
        assert!(cmd.next_completion("Something ").is_empty());
    }

    #[test]
    fn test_result_output() {
        let ok: std::result::Result<i32, String> = Ok(4);
        assert_eq!(ok.into_output().unwrap(), "4");
        let err: std::result::Result<i32, String> = Err("bad".to_string());
        assert!(matches!(err.into_output(), Err(CommandError::Failed(msg)) if msg == "bad"));
    }
}
