//! ui::output
//!
//! Console output for command results.
//!
//! # Streams
//!
//! - stdout: command results ([`result`]) and headers ([`print`]). Results
//!   are what scripts parse, so quiet mode never hides them.
//! - stderr: warnings, errors and `--debug` notes.
//!
//! Diagnostics for developers go through `tracing` instead.

use std::fmt::Display;

/// How much the CLI says besides its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Results and errors only
    Quiet,
    #[default]
    Normal,
    /// Also `[debug]` notes
    Debug,
}

impl Verbosity {
    /// Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }

    fn shows_notices(self) -> bool {
        self != Verbosity::Quiet
    }
}

/// Print an informational line to stdout, unless quiet.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_notices() {
        println!("{}", message);
    }
}

/// Print a command result (always shown).
pub fn result(message: impl Display) {
    println!("{}", message);
}

pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_notices() {
        eprintln!("warning: {}", message);
    }
}

/// Print an error (always shown). Only `main` reports fatal errors.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}
