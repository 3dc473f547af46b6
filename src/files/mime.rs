//! # Tipos MIME
//! src/files/mime.rs
//!
//! Content-Type por extensión, cubriendo lo que usa una página web con
//! módulos JS, modelos 3D, audio y fuentes. Lo desconocido se envía como
//! `application/octet-stream`.

use std::path::Path;

/// Content-Type para extensiones no registradas
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const CONTENT_TYPES: &[(&str, &str)] = &[
    // Documentos y código
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("xml", "text/xml"),
    ("csv", "text/csv"),
    ("pdf", "application/pdf"),
    ("wasm", "application/wasm"),
    ("webmanifest", "application/manifest+json"),
    // Imágenes
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/vnd.microsoft.icon"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("bmp", "image/bmp"),
    // Audio y video
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("m4a", "audio/mp4"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    // Fuentes
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    // Modelos 3D
    ("glb", "model/gltf-binary"),
    ("gltf", "model/gltf+json"),
    ("obj", "model/obj"),
    // Archivos
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
];

/// Deduce el Content-Type de un archivo a partir de su extensión
///
/// # Ejemplo
/// ```
/// use crane_server::files::mime::content_type;
/// use std::path::Path;
///
/// assert_eq!(content_type(Path::new("web/main.js")), "text/javascript");
/// assert_eq!(content_type(Path::new("CLAW.PNG")), "image/png");
/// assert_eq!(content_type(Path::new("replay.bin")), "application/octet-stream");
/// ```
pub fn content_type(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_CONTENT_TYPE;
    };
    let extension = extension.to_ascii_lowercase();

    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
