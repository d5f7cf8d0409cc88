//! damn - Digital Assets Managed Neatly
//!
//! damn catalogs the sub-assets embedded in authoring files (meshes,
//! materials, images, text blocks), records them as a dependency graph with
//! typed metadata, persists the graph in a content-addressed store, and
//! routes conversion requests for a single asset to the right plugin.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Analysis and transcode orchestration, the dispatch index
//! - [`plugins`] - Analyzer and transcoder traits, registry, built-ins
//! - [`core`] - Domain types, wire codec, store, options, configuration
//! - [`ui`] - Console output and rendering
//!
//! # Invariants
//!
//! 1. A stored entry decodes to exactly the graph that was written
//! 2. Malformed input is an error, never a partially decoded value
//! 3. Asset and target resolution is exact; ambiguity is reported, not guessed
//! 4. Only `main` turns an error into a process exit status

pub mod cli;
pub mod core;
pub mod engine;
pub mod plugins;
pub mod ui;
