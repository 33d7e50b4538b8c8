//! Composition of outgoing messages.

use chrono::{DateTime, FixedOffset, Local};

use crate::asset::InlineAsset;
use crate::boundary::choose_boundary;
use crate::content_type::ContentType;
use crate::encoding::{encode_rfc2047, escape_html, normalize_crlf};
use crate::error::{Error, Result};
use crate::header::{Headers, check_header_value, format_mailbox};
use crate::message::{Message, Part};

/// Builder for an outgoing message.
///
/// The body is always `multipart/alternative` (plain text, then HTML). With
/// an inline asset it becomes the first child of a `multipart/related` root
/// whose second child is the asset.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<(String, String)>,
    to: Vec<String>,
    subject: Option<String>,
    date: Option<DateTime<FixedOffset>>,
    text: String,
    html: Option<String>,
    inline: Option<InlineAsset>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender display name and address.
    #[must_use]
    pub fn from(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.from = Some((name.into(), address.into()));
        self
    }

    /// Adds a recipient address.
    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the `Date` header. Defaults to the local time at build.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the HTML body. Without one, HTML is derived from the text.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets the html body if `html` is `Some`.
    #[must_use]
    pub fn html_body_opt(mut self, html: Option<String>) -> Self {
        if html.is_some() {
            self.html = html;
        }
        self
    }

    /// Attaches an inline asset.
    #[must_use]
    pub fn inline(mut self, asset: InlineAsset) -> Self {
        self.inline = Some(asset);
        self
    }

    /// Composes the message.
    ///
    /// # Errors
    ///
    /// Returns an error if `From`, `To` or `Subject` is missing, a header
    /// value contains a line break, the inline asset has an unusable id, or
    /// no collision-free boundary could be found.
    pub fn build(self) -> Result<Message> {
        let (name, address) = self
            .from
            .ok_or_else(|| Error::MissingHeader("From".to_string()))?;
        let subject = self
            .subject
            .ok_or_else(|| Error::MissingHeader("Subject".to_string()))?;
        if self.to.is_empty() {
            return Err(Error::MissingHeader("To".to_string()));
        }

        let from = format_mailbox(&name, &address)?;
        for to in &self.to {
            check_header_value("To", to)?;
        }
        check_header_value("Subject", &subject)?;
        if let Some(asset) = &self.inline {
            asset.validate()?;
        }

        let html = self
            .html
            .unwrap_or_else(|| derive_html(&self.text, self.inline.as_ref()));

        let text_part = Part::text(&ContentType::text_plain(), &self.text);
        let html_part = Part::text(&ContentType::text_html(), &html);
        let boundary = choose_boundary(&[&text_part.to_string(), &html_part.to_string()])?;
        let alternative = Part::multipart(
            &ContentType::multipart_alternative(boundary),
            vec![text_part, html_part],
        )?;

        let mut root = match &self.inline {
            Some(asset) => {
                let inline_part = Part::inline(asset);
                let boundary =
                    choose_boundary(&[&alternative.to_string(), &inline_part.to_string()])?;
                Part::multipart(
                    &ContentType::multipart_related(boundary),
                    vec![alternative, inline_part],
                )?
            }
            None => alternative,
        };

        let date = self.date.unwrap_or_else(|| Local::now().fixed_offset());

        let mut headers = Headers::new();
        headers.add("From", from);
        headers.add("To", self.to.join(", "));
        headers.add("Subject", encode_rfc2047(&subject, "utf-8"));
        headers.add("Date", date.to_rfc2822());
        headers.add("MIME-Version", "1.0");
        for (name, value) in root.headers.iter() {
            headers.add(name, value);
        }
        root.headers = headers;

        Ok(Message::new(root))
    }
}

/// Wraps escaped text in a paragraph with `<br />` line breaks, preceded by
/// the inline asset when there is one.
fn derive_html(text: &str, inline: Option<&InlineAsset>) -> String {
    let body = normalize_crlf(&escape_html(text)).replace("\r\n", "<br />\r\n");
    match inline {
        Some(asset) => format!("<img src=\"{}\" alt=\"\" />\r\n<p>{body}</p>", asset.cid_uri()),
        None => format!("<p>{body}</p>"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::Body;

    fn base() -> MessageBuilder {
        MessageBuilder::new()
            .from("IMAGICITY", "billing@example.com")
            .to("client@example.com")
            .subject("Invoice INV-0001 from IMAGICITY")
            .date(DateTime::parse_from_rfc2822("Mon, 19 Oct 2026 10:00:00 +0530").unwrap())
            .text_body("Hi Asha,\nYour invoice is ready.")
    }

    #[test]
    fn test_top_level_headers_in_order() {
        let message = base().build().unwrap();
        let names: Vec<&str> = message.headers().iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["From", "To", "Subject", "Date", "MIME-Version", "Content-Type"]
        );
        assert_eq!(message.from(), Some("\"IMAGICITY\" <billing@example.com>"));
        assert_eq!(message.date(), Some("Mon, 19 Oct 2026 10:00:00 +0530"));
        assert!(message.content_type().unwrap().is("multipart", "alternative"));
    }

    #[test]
    fn test_derived_html() {
        let message = base().text_body("Tom & Jerry\n<ok>").build().unwrap();
        assert_eq!(
            message.html_part().unwrap(),
            "<p>Tom &amp; Jerry<br />\r\n&lt;ok&gt;</p>"
        );
    }

    #[test]
    fn test_derived_html_references_asset() {
        let asset = InlineAsset::new(
            vec![1, 2, 3],
            ContentType::new("image", "png"),
            "logo@billpost",
            "logo.png",
        );
        let message = base().inline(asset).build().unwrap();
        assert!(message.html_part().unwrap().contains("src=\"cid:logo@billpost\""));
    }

    #[test]
    fn test_related_structure() {
        let asset = InlineAsset::new(
            vec![0u8; 10],
            ContentType::new("image", "png"),
            "logo@billpost",
            "logo.png",
        );
        let message = base()
            .html_body("<img src=\"cid:logo@billpost\">")
            .inline(asset)
            .build()
            .unwrap();

        let root = message.root();
        assert!(root.content_type().unwrap().is("multipart", "related"));
        assert_eq!(root.parts().len(), 2);
        assert!(root.parts()[0].content_type().unwrap().is("multipart", "alternative"));

        let inline = &root.parts()[1];
        assert_eq!(inline.headers.get("Content-ID"), Some("<logo@billpost>"));
        assert_eq!(
            inline.headers.get("Content-Disposition"),
            Some("inline; filename=\"logo.png\"")
        );
        assert_eq!(inline.headers.get("Content-Transfer-Encoding"), Some("base64"));

        let (Body::Multipart { boundary: outer, .. }, Body::Multipart { boundary: inner, .. }) =
            (&root.body, &root.parts()[0].body)
        else {
            panic!("expected nested multipart bodies");
        };
        assert_ne!(outer, inner);
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let message = base().subject("Rechnung für März").build().unwrap();
        assert!(message.subject().unwrap().starts_with("=?utf-8?B?"));
        assert_eq!(
            message.headers().get_decoded("Subject").unwrap().as_deref(),
            Some("Rechnung für März")
        );
    }

    #[test]
    fn test_missing_fields() {
        let err = MessageBuilder::new().subject("x").to("a@b.c").build().unwrap_err();
        assert!(matches!(err, Error::MissingHeader(ref h) if h == "From"));

        let err = MessageBuilder::new().from("", "a@b.c").subject("x").build().unwrap_err();
        assert!(matches!(err, Error::MissingHeader(ref h) if h == "To"));
    }

    #[test]
    fn test_non_ascii_inline_filename_rejected() {
        let asset = InlineAsset::new(
            vec![1, 2, 3],
            ContentType::new("image", "png"),
            "logo@billpost",
            "логотип.png",
        );
        let err = base().inline(asset).build().unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_header_injection_rejected() {
        let err = base().subject("Hi\r\nBcc: evil@example.com").build().unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));

        let err = base().to("a@example.com\nBcc: x@example.com").build().unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }
}
