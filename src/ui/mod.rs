//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware console output
//! - [`pretty`] - Text rendering of asset graphs and capability indexes
//!
//! # Design
//!
//! All command output goes through this module so quiet mode and the
//! stdout/stderr split are handled in one place.

pub mod output;
pub mod pretty;
