//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to do the work
//! 3. Formats and displays output
//!
//! Handlers never call plugins directly.

mod analyze;
mod completion;
mod inspect;
mod mimetypes;
mod transcode;

pub use analyze::analyze;
pub use completion::completion;
pub use inspect::inspect;
pub use mimetypes::mimetypes;
pub use transcode::{parse_raw_options, transcode};

use crate::cli::args::Command;
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Analyze { file, store } => analyze(ctx, &file, store.as_deref()),
        Command::Inspect { entry, json } => inspect(ctx, &entry, json),
        Command::Mimetypes { source } => mimetypes(ctx, source.as_deref()),
        Command::Transcode {
            entry,
            asset,
            target,
            options,
        } => transcode(ctx, &entry, &asset, &target, &options),
        Command::Completion { shell } => completion(shell),
    }
}
