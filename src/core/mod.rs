//! core
//!
//! Core domain types, schemas, and operations for damn.
//!
//! # Modules
//!
//! - [`types`] - Identity types: FileId, AssetId, MetaDataValue, AssetSelector
//! - [`metadata`] - Asset graph schema, wire codec and filesystem store
//! - [`graph`] - Dependency graph indexing and validation
//! - [`options`] - Typed conversion options and output path templates
//! - [`mimetypes`] - Mimetype ⇄ extension table
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Identity is structural: an asset is its `(subname, mimetype, file)`
//! - Decoding is strict; malformed input never yields a partial value
//! - Nothing in `core` knows about concrete plugins

pub mod config;
pub mod graph;
pub mod metadata;
pub mod mimetypes;
pub mod options;
pub mod types;
