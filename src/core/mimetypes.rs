//! core::mimetypes
//!
//! Static mimetype ⇄ file extension table.
//!
//! Matching is exact and case-sensitive on the mimetype side; extensions are
//! compared case-insensitively. The first entry for a mimetype gives its
//! canonical extension.

/// `(extension, mimetype)` pairs.
const TABLE: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("md", "text/markdown"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("tga", "image/x-tga"),
    ("exr", "image/x-exr"),
    ("obj", "application/wavefront-obj"),
    ("mtl", "application/wavefront-mtl"),
    ("blend", "application/x-blender"),
    ("dae", "model/vnd.collada+xml"),
    ("gltf", "model/gltf+json"),
    ("glb", "model/gltf-binary"),
    ("stl", "model/stl"),
    ("fbx", "application/x-fbx"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("wav", "audio/x-wav"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("woff2", "font/woff2"),
];

/// Canonical extension (without the dot) for a mimetype.
///
/// ```
/// use damn::core::mimetypes::guess_extension;
///
/// assert_eq!(guess_extension("image/jpeg"), Some("jpg"));
/// assert_eq!(guess_extension("application/x-unknown"), None);
/// ```
pub fn guess_extension(mimetype: &str) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|(_, mime)| *mime == mimetype)
        .map(|(ext, _)| *ext)
}

/// Guess a mimetype from a file path's extension.
///
/// ```
/// use damn::core::mimetypes::guess_type;
///
/// assert_eq!(guess_type("scene/Car.OBJ"), Some("application/wavefront-obj"));
/// assert_eq!(guess_type("README"), None);
/// ```
pub fn guess_type(path: &str) -> Option<&'static str> {
    let name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;
    TABLE
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}
