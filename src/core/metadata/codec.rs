//! core::metadata::codec
//!
//! Binary wire encoding of the asset graph.
//!
//! # Format
//!
//! The layout is the Thrift binary protocol, big-endian throughout, so stores
//! written by earlier tools stay readable:
//!
//! ```text
//! struct  := field* STOP
//! field   := tag:u8 id:i16 value
//! string  := len:i32 utf8-bytes
//! list    := elem-tag:u8 count:i32 value*
//! map     := key-tag:u8 value-tag:u8 count:i32 (key value)*
//! ```
//!
//! # Compatibility
//!
//! Unknown field ids are skipped whatever their type, so newer producers may
//! add fields. Everything else that does not match the schema (a known field
//! with the wrong tag, a short read, a bad length, invalid UTF-8, a missing
//! required field) fails with a [`CodecError`]. Nothing is coerced.

use std::collections::BTreeMap;

use thiserror::Error;

use super::schema::{AssetReference, FileReference};
use crate::core::types::{AssetId, FileId, MetaDataType, MetaDataValue};

/// Maximum struct/collection nesting accepted when skipping unknown fields.
pub const MAX_DEPTH: usize = 64;

/// Wire type tags.
pub mod tag {
    pub const STOP: u8 = 0;
    pub const BOOL: u8 = 2;
    pub const BYTE: u8 = 3;
    pub const DOUBLE: u8 = 4;
    pub const I16: u8 = 6;
    pub const I32: u8 = 8;
    pub const I64: u8 = 10;
    pub const STRING: u8 = 11;
    pub const STRUCT: u8 = 12;
    pub const MAP: u8 = 13;
    pub const SET: u8 = 14;
    pub const LIST: u8 = 15;
}

/// A payload that could not be decoded.
///
/// Every variant is a malformed-payload condition; the variants only say
/// where decoding went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed payload: unexpected end of input at byte {offset}")]
    Truncated { offset: usize },

    #[error("malformed payload: {strukt}.{field} has type tag {found}, expected {expected}")]
    TypeMismatch {
        strukt: &'static str,
        field: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("malformed payload: unknown type tag {tag} at byte {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("malformed payload: invalid length {len} at byte {offset}")]
    InvalidLength { len: i64, offset: usize },

    #[error("malformed payload: invalid UTF-8 string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("malformed payload: missing required field {strukt}.{field}")]
    MissingField {
        strukt: &'static str,
        field: &'static str,
    },

    #[error("malformed payload: nesting deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    #[error("malformed payload: {count} trailing bytes after end of message")]
    TrailingBytes { count: usize },

    #[error("malformed payload: {0}")]
    Invalid(String),
}

/// Encode a file reference.
///
/// Lengths are written as `i32`; strings and collections are expected to stay
/// below `i32::MAX` entries.
pub fn encode(file: &FileReference) -> Vec<u8> {
    let mut w = Writer::default();
    write_file_reference(&mut w, file);
    w.buf
}

/// Decode a file reference, rejecting trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<FileReference, CodecError> {
    let mut r = Reader::new(bytes);
    let file = read_file_reference(&mut r)?;
    if r.remaining() > 0 {
        return Err(CodecError::TrailingBytes {
            count: r.remaining(),
        });
    }
    Ok(file)
}

// =============================================================================
// Writing
// =============================================================================

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn field(&mut self, tag: u8, id: i16) {
        self.buf.push(tag);
        self.buf.extend_from_slice(&id.to_be_bytes());
    }

    fn stop(&mut self) {
        self.buf.push(tag::STOP);
    }

    fn bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    fn len(&mut self, len: usize) {
        debug_assert!(len <= i32::MAX as usize);
        self.i32(len as i32);
    }

    fn string(&mut self, v: &str) {
        self.len(v.len());
        self.buf.extend_from_slice(v.as_bytes());
    }

    fn list_begin(&mut self, elem: u8, len: usize) {
        self.buf.push(elem);
        self.len(len);
    }

    fn map_begin(&mut self, key: u8, value: u8, len: usize) {
        self.buf.push(key);
        self.buf.push(value);
        self.len(len);
    }
}

fn write_file_id(w: &mut Writer, file: &FileId) {
    w.field(tag::STRING, 1);
    w.string(file.filename());
    w.stop();
}

fn write_asset_id(w: &mut Writer, asset: &AssetId) {
    w.field(tag::STRING, 1);
    w.string(&asset.subname);
    w.field(tag::STRING, 2);
    w.string(&asset.mimetype);
    w.field(tag::STRUCT, 3);
    write_file_id(w, &asset.file);
    w.stop();
}

fn write_metadata_value(w: &mut Writer, value: &MetaDataValue) {
    w.field(tag::I32, 1);
    w.i32(value.kind().tag());
    match value {
        MetaDataValue::Bool(v) => {
            w.field(tag::BOOL, 2);
            w.bool(*v);
        }
        MetaDataValue::Int(v) => {
            w.field(tag::I64, 3);
            w.i64(*v);
        }
        MetaDataValue::Double(v) => {
            w.field(tag::DOUBLE, 4);
            w.f64(*v);
        }
        MetaDataValue::String(v) => {
            w.field(tag::STRING, 5);
            w.string(v);
        }
    }
    w.stop();
}

fn write_asset_reference(w: &mut Writer, asset: &AssetReference) {
    w.field(tag::STRUCT, 1);
    write_asset_id(w, &asset.asset);

    w.field(tag::MAP, 2);
    w.map_begin(tag::STRING, tag::STRUCT, asset.metadata.len());
    for (key, value) in &asset.metadata {
        w.string(key);
        write_metadata_value(w, value);
    }

    w.field(tag::LIST, 3);
    w.list_begin(tag::STRUCT, asset.dependencies.len());
    for dep in &asset.dependencies {
        write_asset_id(w, dep);
    }
    w.stop();
}

fn write_file_reference(w: &mut Writer, file: &FileReference) {
    w.field(tag::STRUCT, 1);
    write_file_id(w, &file.file);
    w.field(tag::STRING, 2);
    w.string(&file.hash);
    w.field(tag::LIST, 3);
    w.list_begin(tag::STRUCT, file.assets.len());
    for asset in &file.assets {
        write_asset_reference(w, asset);
    }
    w.stop();
}

// =============================================================================
// Reading
// =============================================================================

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                offset: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.array()?)))
    }

    fn bool(&mut self) -> Result<bool, CodecError> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::Invalid(format!(
                "boolean byte {} at byte {}",
                other, offset
            ))),
        }
    }

    /// Read an `i32` length and check it against the bytes left.
    ///
    /// Every element occupies at least `min_elem` bytes, which bounds
    /// allocations by the input size.
    fn len(&mut self, min_elem: usize) -> Result<usize, CodecError> {
        let offset = self.pos;
        let len = self.i32()?;
        let invalid = CodecError::InvalidLength {
            len: i64::from(len),
            offset,
        };
        let len = usize::try_from(len).map_err(|_| invalid.clone())?;
        if len.saturating_mul(min_elem) > self.remaining() {
            return Err(invalid);
        }
        Ok(len)
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let len = self.len(1)?;
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    /// Read a field header; `None` at the stop marker.
    fn field(&mut self) -> Result<Option<(u8, i16)>, CodecError> {
        let tag = self.u8()?;
        if tag == tag::STOP {
            return Ok(None);
        }
        Ok(Some((tag, self.i16()?)))
    }

    /// Skip a value of any type.
    fn skip(&mut self, ty: u8, depth: usize) -> Result<(), CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::TooDeep);
        }
        match ty {
            tag::BOOL | tag::BYTE => {
                self.take(1)?;
            }
            tag::I16 => {
                self.take(2)?;
            }
            tag::I32 => {
                self.take(4)?;
            }
            tag::DOUBLE | tag::I64 => {
                self.take(8)?;
            }
            tag::STRING => {
                let len = self.len(1)?;
                self.take(len)?;
            }
            tag::STRUCT => {
                while let Some((field_ty, _)) = self.field()? {
                    self.skip(field_ty, depth + 1)?;
                }
            }
            tag::MAP => {
                let key = self.u8()?;
                let value = self.u8()?;
                let count = self.len(2)?;
                for _ in 0..count {
                    self.skip(key, depth + 1)?;
                    self.skip(value, depth + 1)?;
                }
            }
            tag::SET | tag::LIST => {
                let elem = self.u8()?;
                let count = self.len(1)?;
                for _ in 0..count {
                    self.skip(elem, depth + 1)?;
                }
            }
            other => {
                return Err(CodecError::UnknownTag {
                    tag: other,
                    offset: self.pos.saturating_sub(1),
                })
            }
        }
        Ok(())
    }
}

fn expect(
    found: u8,
    expected: u8,
    strukt: &'static str,
    field: &'static str,
) -> Result<(), CodecError> {
    if found != expected {
        return Err(CodecError::TypeMismatch {
            strukt,
            field,
            expected,
            found,
        });
    }
    Ok(())
}

fn required<T>(value: Option<T>, strukt: &'static str, field: &'static str) -> Result<T, CodecError> {
    value.ok_or(CodecError::MissingField { strukt, field })
}

fn read_file_id(r: &mut Reader<'_>) -> Result<FileId, CodecError> {
    let mut filename = None;
    while let Some((ty, id)) = r.field()? {
        match id {
            1 => {
                expect(ty, tag::STRING, "FileId", "filename")?;
                filename = Some(r.string()?);
            }
            _ => r.skip(ty, 1)?,
        }
    }
    Ok(FileId::new(required(filename, "FileId", "filename")?))
}

fn read_asset_id(r: &mut Reader<'_>) -> Result<AssetId, CodecError> {
    let mut subname = None;
    let mut mimetype = None;
    let mut file = None;
    while let Some((ty, id)) = r.field()? {
        match id {
            1 => {
                expect(ty, tag::STRING, "AssetId", "subname")?;
                subname = Some(r.string()?);
            }
            2 => {
                expect(ty, tag::STRING, "AssetId", "mimetype")?;
                mimetype = Some(r.string()?);
            }
            3 => {
                expect(ty, tag::STRUCT, "AssetId", "file")?;
                file = Some(read_file_id(r)?);
            }
            _ => r.skip(ty, 1)?,
        }
    }
    Ok(AssetId {
        subname: required(subname, "AssetId", "subname")?,
        mimetype: required(mimetype, "AssetId", "mimetype")?,
        file: required(file, "AssetId", "file")?,
    })
}

fn read_metadata_value(r: &mut Reader<'_>) -> Result<MetaDataValue, CodecError> {
    let mut kind = None;
    let mut bool_value = None;
    let mut int_value = None;
    let mut double_value = None;
    let mut string_value = None;
    while let Some((ty, id)) = r.field()? {
        match id {
            1 => {
                expect(ty, tag::I32, "MetaDataValue", "type")?;
                kind = Some(r.i32()?);
            }
            2 => {
                expect(ty, tag::BOOL, "MetaDataValue", "bool_value")?;
                bool_value = Some(r.bool()?);
            }
            3 => {
                expect(ty, tag::I64, "MetaDataValue", "int_value")?;
                int_value = Some(r.i64()?);
            }
            4 => {
                expect(ty, tag::DOUBLE, "MetaDataValue", "double_value")?;
                double_value = Some(r.f64()?);
            }
            5 => {
                expect(ty, tag::STRING, "MetaDataValue", "string_value")?;
                string_value = Some(r.string()?);
            }
            _ => r.skip(ty, 1)?,
        }
    }

    let kind = required(kind, "MetaDataValue", "type")?;
    let kind = MetaDataType::from_tag(kind).map_err(|e| CodecError::Invalid(e.to_string()))?;
    let value = match kind {
        MetaDataType::Bool => bool_value.map(MetaDataValue::Bool),
        MetaDataType::Int => int_value.map(MetaDataValue::Int),
        MetaDataType::Double => double_value.map(MetaDataValue::Double),
        MetaDataType::String => string_value.map(MetaDataValue::String),
    };
    value.ok_or_else(|| {
        CodecError::Invalid(format!(
            "metadata value tagged {} carries no {} payload",
            kind.name(),
            kind.name()
        ))
    })
}

fn read_asset_reference(r: &mut Reader<'_>) -> Result<AssetReference, CodecError> {
    let mut asset = None;
    let mut metadata = BTreeMap::new();
    let mut dependencies = Vec::new();
    while let Some((ty, id)) = r.field()? {
        match id {
            1 => {
                expect(ty, tag::STRUCT, "AssetReference", "asset")?;
                asset = Some(read_asset_id(r)?);
            }
            2 => {
                expect(ty, tag::MAP, "AssetReference", "metadata")?;
                let key_ty = r.u8()?;
                let value_ty = r.u8()?;
                let count = r.len(2)?;
                if count > 0 {
                    expect(key_ty, tag::STRING, "AssetReference", "metadata key")?;
                    expect(value_ty, tag::STRUCT, "AssetReference", "metadata value")?;
                }
                metadata = BTreeMap::new();
                for _ in 0..count {
                    let key = r.string()?;
                    let value = read_metadata_value(r)?;
                    if metadata.insert(key.clone(), value).is_some() {
                        return Err(CodecError::Invalid(format!(
                            "duplicate metadata key '{}'",
                            key
                        )));
                    }
                }
            }
            3 => {
                expect(ty, tag::LIST, "AssetReference", "dependencies")?;
                dependencies = read_list(r, "AssetReference", "dependencies", read_asset_id)?;
            }
            _ => r.skip(ty, 1)?,
        }
    }
    Ok(AssetReference {
        asset: required(asset, "AssetReference", "asset")?,
        metadata,
        dependencies,
    })
}

fn read_file_reference(r: &mut Reader<'_>) -> Result<FileReference, CodecError> {
    let mut file = None;
    let mut hash = None;
    let mut assets = Vec::new();
    while let Some((ty, id)) = r.field()? {
        match id {
            1 => {
                expect(ty, tag::STRUCT, "FileReference", "file")?;
                file = Some(read_file_id(r)?);
            }
            2 => {
                expect(ty, tag::STRING, "FileReference", "hash")?;
                hash = Some(r.string()?);
            }
            3 => {
                expect(ty, tag::LIST, "FileReference", "assets")?;
                assets = read_list(r, "FileReference", "assets", read_asset_reference)?;
            }
            _ => r.skip(ty, 1)?,
        }
    }
    Ok(FileReference {
        file: required(file, "FileReference", "file")?,
        hash: hash.unwrap_or_default(),
        assets,
    })
}

fn read_list<T>(
    r: &mut Reader<'_>,
    strukt: &'static str,
    field: &'static str,
    read: fn(&mut Reader<'_>) -> Result<T, CodecError>,
) -> Result<Vec<T>, CodecError> {
    let elem = r.u8()?;
    let count = r.len(1)?;
    if count > 0 {
        expect(elem, tag::STRUCT, strukt, field)?;
    }
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read(r)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileReference {
        let file = FileId::new("/scenes/car.blend");
        let texture = AssetId::new("paint", "image/png", file.clone());
        let linked = AssetId::new("engine", "application/x-blender.object", FileId::new("/lib/parts.blend"));
        FileReference::builder(file.clone(), "d41d8cd98f00b204")
            .asset(
                AssetReference::new(texture.clone())
                    .with_metadata("width", 512i64)
                    .with_metadata("alpha", true)
                    .with_metadata("gamma", 2.2f64)
                    .with_metadata("colorspace", "sRGB"),
            )
            .asset(
                AssetReference::new(AssetId::new("body", "application/x-blender.mesh", file))
                    .depends_on(texture)
                    .depends_on(linked),
            )
            .build()
    }

    /// Field header + string value, as raw bytes.
    fn string_field(id: i16, value: &str) -> Vec<u8> {
        let mut out = vec![tag::STRING];
        out.extend_from_slice(&id.to_be_bytes());
        out.extend_from_slice(&(value.len() as i32).to_be_bytes());
        out.extend_from_slice(value.as_bytes());
        out
    }

    #[test]
    fn roundtrip_sample() {
        let graph = sample();
        assert_eq!(decode(&encode(&graph)).unwrap(), graph);
    }

    #[test]
    fn roundtrip_empty_graph() {
        let graph = FileReference::new(FileId::new(""), "");
        assert_eq!(decode(&encode(&graph)).unwrap(), graph);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode(&sample()), encode(&sample()));
    }

    #[test]
    fn layout_of_file_id() {
        let mut w = Writer::default();
        write_file_id(&mut w, &FileId::new("ab"));
        assert_eq!(w.buf, vec![11, 0, 1, 0, 0, 0, 2, b'a', b'b', 0]);
    }

    #[test]
    fn skips_unknown_fields() {
        let graph = sample();
        let mut bytes = encode(&graph);
        // Insert an unknown string field and an unknown nested struct
        // just before the top-level stop marker.
        let stop = bytes.pop().unwrap();
        assert_eq!(stop, tag::STOP);
        bytes.extend(string_field(42, "from the future"));
        bytes.extend_from_slice(&[tag::STRUCT, 0, 43]);
        bytes.extend(string_field(1, "nested"));
        bytes.push(tag::STOP);
        bytes.push(tag::STOP);

        assert_eq!(decode(&bytes).unwrap(), graph);
    }

    /// An i32 field id 77, unknown to every struct.
    fn unknown_field(w: &mut Writer) {
        w.field(tag::I32, 77);
        w.i32(1);
    }

    fn file_id_with_unknown_field(w: &mut Writer, filename: &str) {
        w.field(tag::STRING, 1);
        w.string(filename);
        unknown_field(w);
        w.stop();
    }

    #[test]
    fn skips_unknown_fields_in_nested_structs() {
        let mut w = Writer::default();
        w.field(tag::STRUCT, 1);
        file_id_with_unknown_field(&mut w, "/a.obj");
        w.field(tag::STRING, 2);
        w.string("h");
        w.field(tag::LIST, 3);
        w.list_begin(tag::STRUCT, 1);

        // AssetReference
        unknown_field(&mut w);
        w.field(tag::STRUCT, 1);
        w.field(tag::STRING, 1);
        w.string("mesh");
        unknown_field(&mut w);
        w.field(tag::STRING, 2);
        w.string("application/wavefront-obj");
        w.field(tag::STRUCT, 3);
        file_id_with_unknown_field(&mut w, "/a.obj");
        w.stop();

        w.field(tag::MAP, 2);
        w.map_begin(tag::STRING, tag::STRUCT, 1);
        w.string("faces");
        w.field(tag::I32, 1);
        w.i32(MetaDataType::Int.tag());
        unknown_field(&mut w);
        w.field(tag::I64, 3);
        w.i64(6);
        w.stop();

        w.field(tag::LIST, 3);
        w.list_begin(tag::STRUCT, 0);
        w.stop();
        w.stop();

        let file = FileId::new("/a.obj");
        let expected = FileReference::builder(file.clone(), "h")
            .asset(
                AssetReference::new(AssetId::new("mesh", "application/wavefront-obj", file))
                    .with_metadata("faces", 6i64),
            )
            .build();
        assert_eq!(decode(&w.buf).unwrap(), expected);
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        // FileReference.file.filename = [0xff]
        let bytes = [
            tag::STRUCT, 0, 1, tag::STRING, 0, 1, 0, 0, 0, 1, 0xff, tag::STOP, tag::STOP,
        ];
        assert_eq!(decode(&bytes), Err(CodecError::InvalidUtf8 { offset: 10 }));
    }

    #[test]
    fn duplicate_metadata_key_is_rejected() {
        let mut w = Writer::default();
        w.field(tag::STRUCT, 1);
        w.field(tag::STRING, 1);
        w.string("mesh");
        w.field(tag::STRING, 2);
        w.string("application/wavefront-obj");
        w.field(tag::STRUCT, 3);
        write_file_id(&mut w, &FileId::new("/a.obj"));
        w.stop();

        w.field(tag::MAP, 2);
        w.map_begin(tag::STRING, tag::STRUCT, 2);
        for value in [1, 2] {
            w.string("faces");
            write_metadata_value(&mut w, &MetaDataValue::Int(value));
        }
        w.stop();

        let mut r = Reader::new(&w.buf);
        let err = read_asset_reference(&mut r).unwrap_err();
        assert!(matches!(err, CodecError::Invalid(ref msg) if msg.contains("'faces'")));
        assert!(err.to_string().starts_with("malformed payload"));
    }

    #[test]
    fn truncation_is_malformed() {
        let bytes = encode(&sample());
        for cut in 0..bytes.len() {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(err.to_string().starts_with("malformed payload"), "{}", err);
        }
    }

    #[test]
    fn known_field_with_wrong_tag_is_rejected() {
        // FileReference.hash (id 2) sent as an i32.
        let mut bytes = vec![tag::STRUCT, 0, 1];
        bytes.extend(string_field(1, "/a"));
        bytes.push(tag::STOP);
        bytes.extend_from_slice(&[tag::I32, 0, 2, 0, 0, 0, 7]);
        bytes.push(tag::STOP);

        assert_eq!(
            decode(&bytes),
            Err(CodecError::TypeMismatch {
                strukt: "FileReference",
                field: "hash",
                expected: tag::STRING,
                found: tag::I32,
            })
        );
    }

    #[test]
    fn missing_file_is_rejected() {
        let bytes = [tag::STOP];
        assert_eq!(
            decode(&bytes),
            Err(CodecError::MissingField {
                strukt: "FileReference",
                field: "file",
            })
        );
    }

    #[test]
    fn missing_hash_decodes_as_empty() {
        let mut bytes = vec![tag::STRUCT, 0, 1];
        bytes.extend(string_field(1, "/a"));
        bytes.push(tag::STOP);
        bytes.push(tag::STOP);

        let graph = decode(&bytes).unwrap();
        assert_eq!(graph.hash, "");
        assert!(graph.assets.is_empty());
    }

    #[test]
    fn metadata_tag_without_payload_is_rejected() {
        let mut r_bytes = vec![tag::I32, 0, 1, 0, 0, 0, 2]; // INT
        r_bytes.extend(string_field(5, "not an int"));
        r_bytes.push(tag::STOP);
        let mut r = Reader::new(&r_bytes);
        let err = read_metadata_value(&mut r).unwrap_err();
        assert!(matches!(err, CodecError::Invalid(_)));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = [7u8, 0, 9, 0];
        assert!(matches!(decode(&bytes), Err(CodecError::UnknownTag { tag: 7, .. })));
    }

    #[test]
    fn negative_length_is_rejected() {
        let mut bytes = vec![tag::STRING, 0, 2];
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidLength { len: -1, .. })));
    }

    #[test]
    fn huge_list_count_does_not_allocate() {
        let mut bytes = vec![tag::LIST, 0, 3, tag::STRUCT];
        bytes.extend_from_slice(&i32::MAX.to_be_bytes());
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidLength { .. })));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode(&sample());
        bytes.push(0);
        assert_eq!(decode(&bytes), Err(CodecError::TrailingBytes { count: 1 }));
    }

    #[test]
    fn deep_unknown_nesting_is_bounded() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_DEPTH + 1 {
            bytes.extend_from_slice(&[tag::STRUCT, 0, 99]);
        }
        assert_eq!(decode(&bytes), Err(CodecError::TooDeep));
    }
}
