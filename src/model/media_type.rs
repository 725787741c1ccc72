//! Media types for binary assets.
//!
//! Sections and stylesheets get their media types from the package document
//! writer, so only image, font and audio extensions are recognized here.
//! Anything else falls back to `application/octet-stream`; callers with other
//! content use [`Publication::add_asset_with_media_type`].
//!
//! [`Publication::add_asset_with_media_type`]: crate::Publication::add_asset_with_media_type

use std::path::Path;

/// Guess an asset's media type from its file extension (case-insensitive).
pub fn guess_media_type(filename: &str) -> &'static str {
    let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
        return "application/octet-stream";
    };

    match ext.to_ascii_lowercase().as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        // Fonts
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        // Audio
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "opus" => "audio/ogg",
        _ => "application/octet-stream",
    }
}
