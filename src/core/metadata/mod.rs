//! core::metadata
//!
//! Asset graph schema, wire codec and storage.
//!
//! # Modules
//!
//! - [`schema`] - `FileReference` / `AssetReference` value types
//! - [`codec`] - Binary wire encoding of a `FileReference`
//! - [`store`] - Local, file-per-key metadata store
//!
//! # Architecture
//!
//! An analyzer produces a `FileReference`, the codec turns it into bytes and
//! the store writes those bytes to `<root>/<key>`. The key is chosen by the
//! caller (conventionally the file hash); the store never hashes anything.
//!
//! # Example
//!
//! ```
//! use damn::core::metadata::{codec, FileReference};
//! use damn::core::types::FileId;
//!
//! let graph = FileReference::new(FileId::new("/tmp/a.txt"), "abc");
//! let bytes = codec::encode(&graph);
//! assert_eq!(codec::decode(&bytes).unwrap(), graph);
//! ```

pub mod codec;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use codec::{decode, encode, CodecError};
pub use schema::{AssetReference, FileReference, FileReferenceBuilder};
pub use store::{MetadataStore, StoreError};
