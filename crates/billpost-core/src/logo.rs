//! Process-wide inline logo.
//!
//! The logo is read from disk on first use and kept for the lifetime of the
//! process. A missing or unreadable file is remembered as "no logo" too, so
//! the file system is touched at most once.

use std::path::Path;
use std::sync::OnceLock;

use billpost_mime::{ContentType, InlineAsset};

/// Content id the invoice HTML uses to reference the logo.
pub const LOGO_CONTENT_ID: &str = "logo@billpost";

static LOGO: OnceLock<Option<InlineAsset>> = OnceLock::new();

/// Returns the cached logo, loading it from `path` on the first call.
///
/// Later calls return the first result whatever path they pass.
pub fn cached_logo(path: &Path) -> Option<InlineAsset> {
    LOGO.get_or_init(|| load_logo(path)).clone()
}

/// Reads an image file into an inline asset.
#[must_use]
pub fn load_logo(path: &Path) -> Option<InlineAsset> {
    match std::fs::read(path) {
        Ok(bytes) => {
            tracing::debug!(path = %path.display(), size = bytes.len(), "Loaded inline logo");
            let filename = header_filename(path);
            Some(InlineAsset::new(
                bytes,
                media_type(path),
                LOGO_CONTENT_ID,
                filename,
            ))
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "No inline logo");
            None
        }
    }
}

/// File name for the MIME headers; names that are not plain printable ASCII
/// become `logo` with the original extension.
fn header_filename(path: &Path) -> String {
    let printable = |name: &str| {
        !name.is_empty()
            && name.chars().all(|c| c.is_ascii_graphic() || c == ' ')
            && !name.contains(['"', '\\'])
    };

    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) if printable(name) => name.to_string(),
        _ => match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if printable(ext) && !ext.contains(' ') => format!("logo.{ext}"),
            _ => "logo".to_string(),
        },
    }
}

fn media_type(path: &Path) -> ContentType {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => ContentType::new("image", "jpeg"),
        Some("gif") => ContentType::new("image", "gif"),
        Some("svg") => ContentType::new("image", "svg+xml"),
        Some("webp") => ContentType::new("image", "webp"),
        _ => ContentType::new("image", "png"),
    }
}
