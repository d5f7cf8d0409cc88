//! plugins
//!
//! Analyzer and transcoder plugins.
//!
//! # Architecture
//!
//! The [`Analyzer`] and [`Transcoder`] traits define what a plugin can do.
//! Plugins are registered on an explicit [`Registry`] value which the engine
//! borrows; commands never name a concrete plugin.
//!
//! # Modules
//!
//! - `traits`: capability traits, `ConvertMap` and capability records
//! - `registry`: the `Registry`
//! - [`text`]: built-in plain text analyzer and transcoder
//! - [`mock`]: mock plugins for deterministic testing

pub mod mock;
mod registry;
pub mod text;
mod traits;

pub use registry::Registry;
pub use traits::*;
