//! Media type detection and display helpers for picked files.
//!
//! Only `image/*` files are accepted by the uploader. Detection tries magic
//! bytes first and falls back to the file extension.

const FALLBACK_MIME: &str = "application/octet-stream";

/// Extension → MIME fallbacks for formats `infer` may not sniff (e.g. SVG).
const EXTENSION_MIME: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("bmp", "image/bmp"),
];

/// Detect the MIME type of a file from its contents, then its name.
pub fn detect_mime_type(name: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    EXTENSION_MIME
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| (*mime).to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// Whether a MIME type is an image type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Human-readable byte size: `0 B`, `512 B`, `1.5 KB`, `2.0 MB`, `1.1 GB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut index = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    if index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[index])
    }
}
