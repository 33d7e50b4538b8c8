//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// A single line of an SMTP reply.
///
/// RFC 5321 section 4.2:
/// - Continuation: `250-First line`
/// - Final: `250 Last line` or a bare `250`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyLine<'a> {
    /// Three-digit reply code.
    pub code: ReplyCode,
    /// True when the code is followed by a space (or nothing).
    pub last: bool,
    /// Text after the separator.
    pub text: &'a str,
}

/// Parses one reply line (without its CRLF).
///
/// # Errors
///
/// Returns an error if the line does not start with a three-digit code
/// followed by a space, a hyphen, or end of line.
pub fn parse_line(line: &str) -> Result<ReplyLine<'_>> {
    let bytes = line.as_bytes();
    let Some(digits) = bytes.get(..3) else {
        return Err(Error::MalformedReply(line.to_string()));
    };
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::MalformedReply(line.to_string()));
    }

    let code = digits
        .iter()
        .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
    let code = ReplyCode::new(code);

    match bytes.get(3) {
        None => Ok(ReplyLine {
            code,
            last: true,
            text: "",
        }),
        Some(b' ') => Ok(ReplyLine {
            code,
            last: true,
            text: &line[4..],
        }),
        Some(b'-') => Ok(ReplyLine {
            code,
            last: false,
            text: &line[4..],
        }),
        Some(_) => Err(Error::MalformedReply(line.to_string())),
    }
}

/// Parses an SMTP reply from response lines.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
///
/// The code of the final line decides the reply code.
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(last) = lines.last() else {
        return Err(Error::MalformedReply("empty reply".into()));
    };

    let code = parse_line(last)?.code;
    let message = lines
        .iter()
        .map(|line| parse_line(line).map(|parsed| parsed.text.to_string()))
        .collect::<Result<Vec<_>>>()?;

    Ok(Reply::new(code, message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_line() {
        let line = parse_line("250 OK").unwrap();
        assert_eq!(line.code, ReplyCode::OK);
        assert!(line.last);
        assert_eq!(line.text, "OK");
    }

    #[test]
    fn test_parse_continuation_line() {
        let line = parse_line("250-PIPELINING").unwrap();
        assert_eq!(line.code, ReplyCode::OK);
        assert!(!line.last);
        assert_eq!(line.text, "PIPELINING");
    }

    #[test]
    fn test_parse_bare_code_is_final() {
        let line = parse_line("354").unwrap();
        assert_eq!(line.code, ReplyCode::START_DATA);
        assert!(line.last);
        assert_eq!(line.text, "");
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("25").is_err());
        assert!(parse_line("ABC OK").is_err());
        assert!(parse_line("250_OK").is_err());
        assert!(parse_line("").is_err());
    }

    #[test]
    fn test_parse_single_line_reply() {
        let lines = vec!["250 OK".to_string()];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_parse_multi_line_reply() {
        let lines = vec![
            "250-smtp.example.com".to_string(),
            "250-AUTH LOGIN PLAIN".to_string(),
            "250 8BITMIME".to_string(),
        ];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(
            reply.message,
            vec!["smtp.example.com", "AUTH LOGIN PLAIN", "8BITMIME"]
        );
    }

    #[test]
    fn test_parse_greeting() {
        let lines = vec!["220 smtp.example.com ESMTP ready".to_string()];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code, ReplyCode::SERVICE_READY);
        assert_eq!(reply.message, vec!["smtp.example.com ESMTP ready"]);
    }

    #[test]
    fn test_parse_error_empty() {
        assert!(parse_reply(&[]).is_err());
    }
}
