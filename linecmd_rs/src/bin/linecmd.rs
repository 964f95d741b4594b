//! # linecmd
//!
//! Interactive demo of the linecmd dispatch pipeline.
//!
//! ```bash
//! # Read commands from stdin until end of input
//! linecmd
//!
//! # Run lines and exit
//! linecmd -c "test Something hi 3" -c "test math add 2 3"
//! ```
//!
//! Commands:
//!
//! - `hello` prints a greeting
//! - `test <msg>` echoes, `test Something <msg> <n>` repeats
//! - `test math add|sub|mul|div <a> <b>` and `test math len <x> <y>`
//! - `help` lists all of the above

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use linecmd::colors::{ColorMode, Painter};
use linecmd::config::LinecmdConfig;
use linecmd::error::DefinitionError;
use linecmd::{
    CliLoop, Controller, ControllerCommand, Interface, Parsed, SimpleCommand, Tag, TypeParsers,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "linecmd")]
#[command(about = "Line-oriented command interface demo")]
#[command(version)]
struct Args {
    /// Config file (default: .linecmd/config.toml in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Run every handler that accepts a line, not only the first
    #[arg(long)]
    multi: bool,

    /// When to color prompts and errors
    #[arg(long, value_enum)]
    color: Option<ColorMode>,

    /// Run this line and exit instead of reading stdin (repeatable)
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    commands: Vec<String>,
}

// ============================================================================
// Demo Commands
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Point {
    x: f64,
    y: f64,
}

fn math_controller() -> Result<Controller, DefinitionError> {
    Controller::builder("Math")
        .operation(Tag::none(), "add", |a: f64, b: f64| a + b)
        .operation(Tag::none(), "sub", |a: f64, b: f64| a - b)
        .operation(Tag::none(), "mul", |a: f64, b: f64| a * b)
        .operation(Tag::none(), "div", |a: f64, b: f64| {
            if b == 0.0 {
                Err("division by zero")
            } else {
                Ok(a / b)
            }
        })
        .operation(Tag::named("len"), "length", |p: Parsed<Point>| {
            p.0.x.hypot(p.0.y)
        })
        .build()
}

fn test_controller() -> Result<Controller, DefinitionError> {
    Controller::builder("TestCommand")
        .operation(Tag::default_op(), "run", |msg: String| msg)
        .operation(Tag::named("Something"), "run", |msg: String, i: i32| {
            msg.repeat(i.max(0) as usize)
        })
        .field(Tag::none(), "math", math_controller()?)
        .build()
}

fn demo_parsers() -> TypeParsers {
    let mut parsers = TypeParsers::new();
    parsers.register(|_, reader| {
        let x = reader.read_as::<f64>()?.unwrap_or_default();
        let y = reader.read_as::<f64>()?.unwrap_or_default();
        Ok(Point { x, y })
    });
    parsers
}

fn build_interface(config: &LinecmdConfig, multi: bool) -> Result<Interface> {
    let mut settings = config.interface_settings();
    settings.multi_handle_commands |= multi;

    let mut interface = Interface::with_settings(settings);
    if config.interface.help {
        interface.attach_help_command();
    }

    let registry = interface.construct_handler();
    let test = test_controller().context("invalid demo controller")?;
    registry.add(
        "test",
        ControllerCommand::new(test).with_parsers(Arc::new(demo_parsers())),
    );
    registry.add("hello", SimpleCommand::new(|| "say hi"));
    Ok(interface)
}

// ============================================================================
// Entry Point
// ============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<LinecmdConfig> {
    match path {
        Some(path) => LinecmdConfig::try_load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("failed to resolve working directory")?;
            Ok(LinecmdConfig::load(&cwd))
        }
    }
}

fn run_lines(interface: &Interface, lines: &[String], painter: Painter) -> ExitCode {
    let mut failed = false;
    for line in lines {
        let results = interface.handle_command(line, &mut |message| {
            failed = true;
            eprintln!("{}", painter.error(message));
        });
        for result in results.iter().filter(|r| !r.is_empty()) {
            println!("{result}");
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries command results
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    let config = load_config(args.config.as_ref())?;
    let painter = Painter::new(args.color.unwrap_or(config.output.color));
    let interface = build_interface(&config, args.multi)?;

    if !args.commands.is_empty() {
        return Ok(run_lines(&interface, &args.commands, painter));
    }

    info!("linecmd v{} reading stdin", env!("CARGO_PKG_VERSION"));
    let mut cli = CliLoop::new(
        interface,
        BufReader::new(io::stdin()),
        io::stdout(),
        io::stderr(),
    )
    .with_painter(painter);
    if let Some(prompt) = &config.cli_loop.prompt {
        cli = cli.with_prompt(prompt.clone());
    }

    let handle = cli.start().context("failed to start the command loop")?;
    handle.join().context("command loop failed")?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[linecmd] Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
