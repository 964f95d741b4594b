//! Routing lines to handlers, and the background line loop.
//!
//! An [`Interface`] owns the attached handlers. [`CliLoop`] moves an
//! interface onto a worker thread that reads one line at a time from a
//! stream and writes results and errors to two others.

use std::io::{self, BufRead, Write};
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::colors::Painter;
use crate::error::CommandError;
use crate::handler::{CommandHandler, CommandRegistry, suggest_similar};
use crate::tokenizer::{plain_split, split_parameters};

/// First token that answers with the help listing.
pub const HELP_COMMAND: &str = "help";

/// Reported when no attached handler accepts a line.
pub const UNKNOWN_COMMAND: &str = "Unknown command.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceSettings {
    /// Run every capable handler instead of only the first.
    pub multi_handle_commands: bool,
    /// Report the error's debug form after its message.
    pub print_error_chain: bool,
}

/// Ordered set of handlers a line can be routed to.
#[derive(Default)]
pub struct Interface {
    handlers: Vec<Arc<dyn CommandHandler>>,
    settings: InterfaceSettings,
    help: bool,
}

impl Interface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: InterfaceSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> InterfaceSettings {
        self.settings
    }

    pub fn settings_mut(&mut self) -> &mut InterfaceSettings {
        &mut self.settings
    }

    /// Create a registry, attach it and hand it back for registration.
    pub fn construct_handler(&mut self) -> Arc<CommandRegistry> {
        let registry = Arc::new(CommandRegistry::new());
        self.attach_handler(registry.clone());
        registry
    }

    /// Returns false if this exact handler is attached already.
    pub fn attach_handler(&mut self, handler: Arc<dyn CommandHandler>) -> bool {
        if self.position(&handler).is_some() {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    /// Returns false if the handler was not attached.
    pub fn detach_handler<H: CommandHandler + ?Sized>(&mut self, handler: &Arc<H>) -> bool {
        match self.position(handler) {
            Some(index) => {
                self.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    fn position<H: CommandHandler + ?Sized>(&self, handler: &Arc<H>) -> Option<usize> {
        self.handlers
            .iter()
            .position(|attached| ptr::addr_eq(Arc::as_ptr(attached), Arc::as_ptr(handler)))
    }

    /// Answer lines whose first token is `help` with the command listing.
    ///
    /// A command registered as `help` in an attached handler takes
    /// precedence; the listing only answers when no handler accepts the line.
    pub fn attach_help_command(&mut self) {
        self.help = true;
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn can_handle(&self, line: &str) -> bool {
        self.is_help(line) || self.handlers.iter().any(|h| h.can_handle(line))
    }

    /// Every command of every attached handler, in attachment order.
    pub fn commands(&self) -> Vec<String> {
        self.handlers.iter().flat_map(|h| h.commands()).collect()
    }

    /// Route `line` and collect the results.
    ///
    /// Failures are reported to `sink` and contribute no result; with
    /// `multi_handle_commands` the remaining handlers still run.
    pub fn handle_command(&self, line: &str, sink: &mut dyn FnMut(&str)) -> Vec<String> {
        if self.is_help(line) {
            return vec![self.help_listing(&Painter::plain())];
        }
        if !self.can_handle(line) {
            sink(&self.unhandled(line));
            return Vec::new();
        }

        let mut results = Vec::new();
        for handler in self.handlers.iter().filter(|h| h.can_handle(line)) {
            match handler.invoke(line) {
                Ok(result) => results.push(result),
                Err(err) => {
                    debug!(%err, line, "command failed");
                    sink(&self.describe(&err));
                }
            }
            if !self.settings.multi_handle_commands {
                break;
            }
        }
        results
    }

    /// [`handle_command`](Self::handle_command) with failures sent to the log.
    pub fn execute(&self, line: &str) -> Vec<String> {
        self.handle_command(line, &mut |message| warn!(line, "{message}"))
    }

    /// "All available commands" followed by one entry per command.
    pub fn help_listing(&self, painter: &Painter) -> String {
        let mut listing = painter.header("All available commands:");
        for handler in &self.handlers {
            for name in handler.commands() {
                listing.push_str(&format!("\n- {name}"));
                let usage = handler
                    .command(&name)
                    .map(|command| command.usage())
                    .unwrap_or_default();
                for line in usage.lines() {
                    listing.push_str(&format!("\n    {}", painter.dim(line)));
                }
            }
        }
        listing
    }

    fn is_help(&self, line: &str) -> bool {
        self.help
            && plain_split(line).first().map(String::as_str) == Some(HELP_COMMAND)
            && !self.handlers.iter().any(|h| h.can_handle(line))
    }

    /// Message for a line no handler accepted.
    fn unhandled(&self, line: &str) -> String {
        // Unbalanced quotes: show the caret.
        let name = match split_parameters(line) {
            Ok(splits) => splits.into_iter().next(),
            Err(err) => return err.to_string(),
        };
        let Some(name) = name else {
            return CommandError::EmptyCommand.to_string();
        };
        let mut known = self.commands();
        if self.help && !known.iter().any(|c| c == HELP_COMMAND) {
            known.push(HELP_COMMAND.to_string());
        }
        let suggestion = suggest_similar(&name, known.iter().map(String::as_str));
        let err = CommandError::UnknownCommand { name, suggestion };
        format!("{UNKNOWN_COMMAND} {err}")
    }

    fn describe(&self, err: &CommandError) -> String {
        if self.settings.print_error_chain {
            format!("{err}\n{err:?}")
        } else {
            err.to_string()
        }
    }
}

/// Reads lines from `input` and routes them through an [`Interface`].
pub struct CliLoop {
    interface: Interface,
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
    error: Box<dyn Write + Send>,
    prompt: Option<String>,
    painter: Painter,
}

impl CliLoop {
    pub fn new(
        interface: Interface,
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
        error: impl Write + Send + 'static,
    ) -> Self {
        Self {
            interface,
            input: Box::new(input),
            output: Box::new(output),
            error: Box::new(error),
            prompt: None,
            painter: Painter::plain(),
        }
    }

    /// Write `prompt` to the output before every read.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn with_painter(mut self, painter: Painter) -> Self {
        self.painter = painter;
        self
    }

    /// Spawn the worker thread.
    pub fn start(self) -> io::Result<LoopHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let worker = thread::Builder::new()
            .name("linecmd-loop".to_string())
            .spawn(move || self.run(&flag))?;
        Ok(LoopHandle { stop, worker })
    }

    /// Run on the current thread until end of input or until `stop` is set.
    ///
    /// `stop` is only checked between lines; a blocked read is not interrupted.
    pub fn run(mut self, stop: &AtomicBool) -> io::Result<()> {
        info!(handlers = self.interface.handler_count(), "command loop started");
        let mut buf = Vec::new();

        while !stop.load(Ordering::Acquire) {
            if let Some(prompt) = &self.prompt {
                write!(self.output, "{}", self.painter.prompt(prompt))?;
                self.output.flush()?;
            }

            buf.clear();
            if self.input.read_until(b'\n', &mut buf)? == 0 {
                debug!("end of input");
                break;
            }
            // Invalid UTF-8 is replaced, never fatal.
            let line = String::from_utf8_lossy(&buf);
            let command = line.trim_end_matches(['\r', '\n']);
            if command.trim().is_empty() {
                continue;
            }
            self.dispatch(command)?;
        }

        info!("command loop stopped");
        Ok(())
    }

    fn dispatch(&mut self, command: &str) -> io::Result<()> {
        if self.interface.is_help(command) {
            writeln!(self.output, "{}", self.interface.help_listing(&self.painter))?;
            return self.output.flush();
        }

        let mut errors = Vec::new();
        let results = self
            .interface
            .handle_command(command, &mut |message| errors.push(message.to_string()));

        for result in results.iter().filter(|r| !r.is_empty()) {
            writeln!(self.output, "{result}")?;
        }
        self.output.flush()?;

        for message in &errors {
            let painted = if message.starts_with(UNKNOWN_COMMAND) {
                self.painter.warn(message)
            } else {
                self.painter.error(message)
            };
            writeln!(self.error, "{painted}")?;
        }
        self.error.flush()
    }
}

/// Handle to a running [`CliLoop`] worker.
pub struct LoopHandle {
    stop: Arc<AtomicBool>,
    worker: JoinHandle<io::Result<()>>,
}

impl LoopHandle {
    /// Ask the worker to exit before its next read.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and return how its loop ended.
    pub fn join(self) -> io::Result<()> {
        self.worker
            .join()
            .map_err(|_| io::Error::other("command loop worker panicked"))?
    }
}
