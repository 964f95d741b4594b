//! End-to-End CLI Tests for linecmd
//!
//! Drives the demo binary through stdin scripts and `-c` lines.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command pointing to the linecmd binary, isolated from any config
/// in the working directory.
fn linecmd(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("linecmd");
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

fn workdir() -> TempDir {
    TempDir::new().expect("temp dir")
}

// ============================================
// Basic CLI Tests
// ============================================

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        let dir = workdir();
        linecmd(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("linecmd"))
            .stdout(predicate::str::contains("--command"));
    }

    #[test]
    fn shows_version() {
        let dir = workdir();
        linecmd(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn empty_input_exits_cleanly() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("")
            .assert()
            .success()
            .stdout("");
    }
}

// ============================================
// Stdin Loop Tests
// ============================================

mod stdin_loop {
    use super::*;

    #[test]
    fn default_operation_echoes() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test hello\n")
            .assert()
            .success()
            .stdout("hello\n");
    }

    #[test]
    fn named_operation_repeats() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test Something hi 3\n")
            .assert()
            .success()
            .stdout("hihihi\n");
    }

    #[test]
    fn quoted_argument_stays_whole() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test Something \"a b \" 2\n")
            .assert()
            .success()
            .stdout("a b a b \n");
    }

    #[test]
    fn field_descent_reaches_nested_scope() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test math add 2 3\ntest math len 3 4\n")
            .assert()
            .success()
            .stdout("5\n5\n");
    }

    #[test]
    fn simple_command_and_blank_lines() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("\nhello\n   \nhello\n")
            .assert()
            .success()
            .stdout("say hi\nsay hi\n");
    }

    #[test]
    fn unknown_command_goes_to_stderr() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("bogus\nhello\n")
            .assert()
            .success()
            .stdout("say hi\n")
            .stderr(predicate::str::contains("Unknown command."))
            .stderr(predicate::str::contains("'bogus'"));
    }

    #[test]
    fn invalid_utf8_line_is_reported_and_loop_continues() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin(b"\xff\xfe bad\nhello\n".to_vec())
            .assert()
            .success()
            .stdout("say hi\n")
            .stderr(predicate::str::contains("Unknown command."));
    }

    #[test]
    fn unknown_command_suggests_close_name() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("tset hi\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("Did you mean 'test'?"));
    }

    #[test]
    fn unclosed_quote_shows_caret() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test \"never closed\n")
            .assert()
            .success()
            .stdout("")
            .stderr(predicate::str::contains("is never closed!"))
            .stderr(predicate::str::contains("test \"never closed\n     ^"));
    }

    #[test]
    fn invalid_number_is_reported_and_loop_continues() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test math add 2 x\ntest math add 1 1\n")
            .assert()
            .success()
            .stdout("2\n")
            .stderr(predicate::str::contains("'x' at index 17 is not a valid f64!"));
    }

    #[test]
    fn operation_failure_is_reported() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test math div 1 0\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("division by zero"));
    }

    #[test]
    fn path_miss_is_soft() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("test math pow 2 3\n")
            .assert()
            .success()
            .stdout("Command not found\n");
    }

    #[test]
    fn help_lists_commands() {
        let dir = workdir();
        linecmd(&dir)
            .write_stdin("help\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("All available commands:"))
            .stdout(predicate::str::contains("- hello"))
            .stdout(predicate::str::contains("- test"))
            .stdout(predicate::str::contains("math add <f64> <f64>"));
    }
}

// ============================================
// Command Flag Tests
// ============================================

mod command_flag {
    use super::*;

    #[test]
    fn runs_lines_and_exits() {
        let dir = workdir();
        linecmd(&dir)
            .args(["-c", "test Something ab 2", "-c", "test math mul 4 2.5"])
            .assert()
            .success()
            .stdout("abab\n10\n");
    }

    #[test]
    fn failing_line_sets_exit_code() {
        let dir = workdir();
        linecmd(&dir)
            .args(["-c", "hello", "-c", "nope"])
            .assert()
            .failure()
            .stdout("say hi\n")
            .stderr(predicate::str::contains("Unknown command."));
    }

    #[test]
    fn never_color_has_no_escapes() {
        let dir = workdir();
        linecmd(&dir)
            .args(["--color", "never", "-c", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("\x1b[").not());
    }

    #[test]
    fn always_color_paints_errors() {
        let dir = workdir();
        linecmd(&dir)
            .args(["--color", "always", "-c", "test math div 1 0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("\x1b[31mdivision by zero"));
    }
}

// ============================================
// Configuration Tests
// ============================================

mod configuration {
    use super::*;

    fn write_config(dir: &TempDir, body: &str) {
        let config_dir = dir.path().join(".linecmd");
        std::fs::create_dir_all(&config_dir).expect("create .linecmd");
        std::fs::write(config_dir.join("config.toml"), body).expect("write config");
    }

    #[test]
    fn prompt_from_config() {
        let dir = workdir();
        write_config(&dir, "[loop]\nprompt = \"> \"\n[output]\ncolor = \"never\"\n");
        linecmd(&dir)
            .write_stdin("hello\n")
            .assert()
            .success()
            .stdout("> say hi\n> ");
    }

    #[test]
    fn help_can_be_disabled() {
        let dir = workdir();
        write_config(&dir, "[interface]\nhelp = false\n");
        linecmd(&dir)
            .write_stdin("help\n")
            .assert()
            .success()
            .stdout("")
            .stderr(predicate::str::contains("Unknown command."));
    }

    #[test]
    fn invalid_config_warns_and_uses_defaults() {
        let dir = workdir();
        write_config(&dir, "[interface]\nhelp = \"sometimes\"\n");
        linecmd(&dir)
            .write_stdin("hello\n")
            .assert()
            .success()
            .stdout("say hi\n")
            .stderr(predicate::str::contains("[linecmd][warn] failed to parse"));
    }

    #[test]
    fn explicit_config_must_be_valid() {
        let dir = workdir();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "not = [valid").expect("write config");
        linecmd(&dir)
            .arg("--config")
            .arg(&path)
            .write_stdin("hello\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("[linecmd] Error: failed to load config"));
    }

    #[test]
    fn explicit_config_is_used() {
        let dir = workdir();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[loop]\nprompt = \"$ \"\n").expect("write config");
        linecmd(&dir)
            .arg("--config")
            .arg(&path)
            .write_stdin("")
            .assert()
            .success()
            .stdout("$ ");
    }
}
