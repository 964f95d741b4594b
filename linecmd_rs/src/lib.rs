//! # linecmd
//!
//! **Line-oriented command interfaces** - turn raw text lines into typed
//! function calls.
//!
//! A line goes through three stages:
//!
//! - **Tokenizer** - quote-aware splitting into parameters
//! - **Resolver** - walks a tree of controller scopes to a leaf operation
//! - **Binder** - converts the remaining tokens into the operation's
//!   argument types, with a pluggable parser registry for custom types
//!
//! Around that core sit a name-to-command registry, an [`Interface`] that
//! routes lines across several registries, and a [`CliLoop`] that feeds an
//! interface from a stream on a background thread.
//!
//! ## Quick Start
//!
//! ```rust
//! use linecmd::{Controller, ControllerCommand, Interface, SimpleCommand, Tag};
//!
//! let test = Controller::builder("TestCommand")
//!     .operation(Tag::default_op(), "run", |msg: String| msg)
//!     .operation(Tag::named("Something"), "run", |msg: String, i: i32| {
//!         msg.repeat(i.max(0) as usize)
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut interface = Interface::new();
//! let registry = interface.construct_handler();
//! registry.add("test", ControllerCommand::new(test));
//! registry.add("hello", SimpleCommand::new(|| "say hi"));
//!
//! assert_eq!(interface.execute("test hello"), ["hello"]);
//! assert_eq!(interface.execute("test Something hi 3"), ["hihihi"]);
//! assert_eq!(interface.execute("hello"), ["say hi"]);
//! ```

// ============================================================================
// Core Modules
// ============================================================================

/// Quote-aware splitting of raw lines.
pub mod tokenizer;

/// Per-invocation parameters and flags.
pub mod context;

/// Parameter types, coercion and the type-parser registry.
pub mod types;

/// Binding tokens to formal parameters.
pub mod binder;

/// Controller scopes, tags and path resolution.
pub mod controller;

/// The [`Command`](command::Command) trait and its two implementations.
pub mod command;

/// Name to command registries.
pub mod handler;

/// Multi-handler routing and the background line loop.
pub mod interface;

// ============================================================================
// Support Modules
// ============================================================================

pub mod colors;

/// `.linecmd/config.toml` loading.
pub mod config;

pub mod error;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, ControllerCommand, SimpleCommand};
pub use context::{CommandContext, Flags};
pub use controller::{Controller, Tag};
pub use error::{CommandError, DefinitionError, ParameterParseError, PathNotFound, Result};
pub use handler::{CommandHandler, CommandRegistry};
pub use interface::{CliLoop, Interface, InterfaceSettings, LoopHandle};
pub use types::{Parsed, TypeParser, TypeParsers};
