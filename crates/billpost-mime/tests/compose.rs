//! Composition tests against the rendered wire form.

use billpost_mime::encoding::{decode_base64, encode_base64_wrapped};
use billpost_mime::{Body, ContentType, InlineAsset, Message, MessageBuilder};
use proptest::prelude::*;

fn builder() -> MessageBuilder {
    MessageBuilder::new()
        .from("IMAGICITY", "billing@example.com")
        .to("client@example.com")
        .subject("Invoice INV-0042 from IMAGICITY")
}

fn boundary_of(body: &Body) -> &str {
    match body {
        Body::Multipart { boundary, .. } => boundary,
        Body::Leaf(_) => panic!("expected a multipart body"),
    }
}

#[test]
fn alternative_has_three_boundary_markers() {
    let message = builder()
        .text_body("Hi")
        .html_body("<p>Hi</p>")
        .build()
        .unwrap();
    let wire = message.to_string();
    let marker = format!("--{}", boundary_of(&message.root().body));

    assert_eq!(wire.matches(&marker).count(), 3);
    assert!(wire.contains(&format!("\r\n{marker}--\r\n")));

    // text/plain comes before text/html
    let plain = wire.find("Content-Type: text/plain").unwrap();
    let html = wire.find("Content-Type: text/html").unwrap();
    assert!(plain < html);

    // Top-level headers come before the first marker and appear once
    let first_marker = wire.find(&marker).unwrap();
    for header in ["From: ", "To: ", "Subject: ", "MIME-Version: 1.0", "Date: "] {
        assert_eq!(wire.matches(header).count(), 1, "{header} repeated");
        assert!(wire.find(header).unwrap() < first_marker, "{header} after first boundary");
    }
}

#[test]
fn wire_form_uses_crlf_only() {
    let message = builder()
        .text_body("line one\nline two\r\nline three\r")
        .build()
        .unwrap();
    let wire = message.to_string();

    assert!(!wire.replace("\r\n", "").contains(['\r', '\n']));
    assert!(wire.ends_with("--\r\n"));
    assert_eq!(
        message.text_part().unwrap(),
        "line one\r\nline two\r\nline three\r\n"
    );
}

#[test]
fn related_message_round_trips_inline_bytes() {
    let bytes: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
    let logo = InlineAsset::new(
        bytes.clone(),
        ContentType::new("image", "png"),
        "logo@billpost",
        "logo.png",
    );
    let message = builder()
        .text_body("Your invoice is ready.")
        .html_body(format!("<img src=\"{}\"><p>Your invoice is ready.</p>", logo.cid_uri()))
        .inline(logo)
        .build()
        .unwrap();
    let wire = message.to_string();

    let parsed = Message::parse(&wire).unwrap();
    assert!(parsed.content_type().unwrap().is("multipart", "related"));

    let inline = parsed.find_content_id("logo@billpost").unwrap();
    assert_eq!(inline.decode_body().unwrap(), bytes);
    assert!(
        parsed
            .html_part()
            .unwrap()
            .contains("src=\"cid:logo@billpost\"")
    );

    // Every base64 line of the asset is at most 76 characters
    let Body::Leaf(encoded) = &inline.body else {
        panic!("inline part must be a leaf");
    };
    assert!(encoded.split("\r\n").all(|line| line.len() <= 76));

    // Distinct boundary per nesting level
    let outer = boundary_of(&parsed.root().body);
    let inner = boundary_of(&parsed.root().parts()[0].body);
    assert_ne!(outer, inner);
    assert_eq!(wire.matches(&format!("--{outer}")).count(), 3);
    assert_eq!(wire.matches(&format!("--{inner}")).count(), 3);
}

#[test]
fn quoted_printable_text_survives_parse() {
    let text = "Hi Asha,\n\nYour invoice INV-7 for amount ₹1,180.00 is ready.\n\nThanks,\nIMAGICITY";
    let message = builder().text_body(text).build().unwrap();
    let parsed = Message::parse(&message.to_string()).unwrap();

    assert_eq!(parsed.text_part().unwrap(), text.replace('\n', "\r\n"));
}

proptest! {
    #[test]
    fn wrapped_base64_lines_are_bounded(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let wrapped = encode_base64_wrapped(&data);
        prop_assert!(wrapped.split("\r\n").all(|line| line.len() <= 76));
        prop_assert!(!wrapped.ends_with("\r\n"));
        prop_assert_eq!(decode_base64(&wrapped).unwrap(), data);
    }

    #[test]
    fn arbitrary_text_never_breaks_the_structure(text in "\\PC{0,300}", html in "\\PC{0,300}") {
        let message = builder().text_body(text.clone()).html_body(html).build().unwrap();
        let parsed = Message::parse(&message.to_string()).unwrap();
        prop_assert_eq!(parsed.root().parts().len(), 2);
        prop_assert_eq!(parsed.text_part().unwrap(), text);
    }
}
