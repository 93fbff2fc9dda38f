// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic output helpers for consistent error/warning formatting.
//!
//! Provides ANSI color support with automatic terminal detection.

use std::io::{self, IsTerminal, Write};

/// Print an error message to stderr.
///
/// Displays in red when stderr is a terminal, plain text otherwise.
pub fn print_error(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_error(&mut io::stderr(), msg, is_tty);
}

fn write_error<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    write_tagged(writer, "31", "Error: ", msg, is_terminal);
}

/// Print a warning message to stderr.
///
/// Displays in yellow when stderr is a terminal, plain text otherwise.
pub fn print_warning(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_warning(&mut io::stderr(), msg, is_tty);
}

fn write_warning<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    write_tagged(writer, "33", "Warning: ", msg, is_terminal);
}

/// Print a progress note to stderr, dimmed on a terminal.
///
/// Keeps stdout free for command results.
pub fn print_info(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_info(&mut io::stderr(), msg, is_tty);
}

fn write_info<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    write_tagged(writer, "2", "", msg, is_terminal);
}

fn write_tagged<W: Write>(
    writer: &mut W,
    color: &str,
    prefix: &str,
    msg: impl std::fmt::Display,
    is_terminal: bool,
) {
    if is_terminal {
        let _ = writeln!(writer, "\x1b[{color}m{prefix}{msg}\x1b[0m");
    } else {
        let _ = writeln!(writer, "{prefix}{msg}");
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
