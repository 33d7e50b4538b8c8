//! Inline assets referenced from HTML through `cid:` URIs.

use std::sync::Arc;

use crate::content_type::ContentType;
use crate::error::{Error, Result};

/// Binary attachment shown inline, such as a logo in an invoice email.
///
/// The bytes are shared, so cloning an asset out of a process-wide cache
/// does not copy the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAsset {
    data: Arc<[u8]>,
    content_type: ContentType,
    content_id: String,
    filename: String,
}

impl InlineAsset {
    /// Creates an inline asset.
    #[must_use]
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        content_type: ContentType,
        content_id: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            content_type,
            content_id: content_id.into(),
            filename: filename.into(),
        }
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the media type.
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Returns the content id, without angle brackets.
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Returns the suggested filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the `cid:` URI for use in HTML `src` attributes.
    #[must_use]
    pub fn cid_uri(&self) -> String {
        format!("cid:{}", self.content_id)
    }

    /// Checks that the id and filename are printable ASCII safe to place in
    /// headers.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.content_id.is_empty()
            || self
                .content_id
                .chars()
                .any(|c| !c.is_ascii_graphic() || matches!(c, '<' | '>' | '"'))
        {
            return Err(Error::InvalidHeader(format!(
                "Invalid Content-ID: {:?}",
                self.content_id
            )));
        }
        if self
            .filename
            .chars()
            .any(|c| !c.is_ascii() || c.is_control() || matches!(c, '"' | '\\'))
        {
            return Err(Error::InvalidHeader(format!(
                "Invalid inline filename: {:?}",
                self.filename
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(id: &str, filename: &str) -> InlineAsset {
        InlineAsset::new(
            vec![0x89, b'P', b'N', b'G'],
            ContentType::new("image", "png"),
            id,
            filename,
        )
    }

    #[test]
    fn test_cid_uri() {
        let asset = logo("logo@billpost", "logo.png");
        assert_eq!(asset.cid_uri(), "cid:logo@billpost");
        assert_eq!(asset.data(), &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_clone_shares_bytes() {
        let asset = logo("logo@billpost", "logo.png");
        let copy = asset.clone();
        assert!(std::ptr::eq(asset.data(), copy.data()));
    }

    #[test]
    fn test_validate() {
        assert!(logo("logo@billpost", "logo.png").validate().is_ok());
        assert!(logo("", "logo.png").validate().is_err());
        assert!(logo("a b", "logo.png").validate().is_err());
        assert!(logo("<logo>", "logo.png").validate().is_err());
        assert!(logo("logo", "lo\r\ngo.png").validate().is_err());
        assert!(logo("logo", "логотип.png").validate().is_err());
        assert!(logo("лого@billpost", "logo.png").validate().is_err());
    }
}
