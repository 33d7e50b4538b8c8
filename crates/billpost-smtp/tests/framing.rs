//! Property tests for reply framing.
//!
//! However a byte stream is cut into chunks, the reply buffer must yield the
//! same lines as it does for the unfragmented stream.

use billpost_smtp::ReplyBuffer;
use billpost_smtp::parser::parse_line;
use proptest::prelude::*;

fn collect(chunks: &[&[u8]]) -> (Vec<String>, usize) {
    let mut buffer = ReplyBuffer::new();
    let mut lines = Vec::new();
    for chunk in chunks {
        buffer.extend(chunk);
        while let Some(line) = buffer.next_line().unwrap() {
            lines.push(line);
        }
    }
    (lines, buffer.pending())
}

/// Splits `data` at the given (unsorted, possibly duplicate) offsets.
fn split_at_points<'a>(data: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p % (data.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(&data[start..cut]);
        start = cut;
    }
    chunks.push(&data[start..]);
    chunks
}

fn reply_line() -> impl Strategy<Value = String> {
    (200u16..600, prop::bool::ANY, "[ -~]{0,40}").prop_map(|(code, last, text)| {
        let sep = if last { ' ' } else { '-' };
        format!("{code}{sep}{text}")
    })
}

proptest! {
    #[test]
    fn framing_is_invariant_under_chunking(
        lines in prop::collection::vec(reply_line(), 1..12),
        tail in "[ -~]{0,10}",
        points in prop::collection::vec(any::<usize>(), 0..24),
    ) {
        let mut stream = String::new();
        for line in &lines {
            stream.push_str(line);
            stream.push_str("\r\n");
        }
        stream.push_str(&tail);
        let bytes = stream.as_bytes();

        let (whole, whole_pending) = collect(&[bytes]);
        let chunks = split_at_points(bytes, &points);
        let (pieces, pieces_pending) = collect(&chunks);

        prop_assert_eq!(&whole, &lines);
        prop_assert_eq!(&pieces, &whole);
        prop_assert_eq!(whole_pending, tail.len());
        prop_assert_eq!(pieces_pending, whole_pending);
    }

    #[test]
    fn byte_at_a_time_matches_whole(lines in prop::collection::vec(reply_line(), 1..8)) {
        let stream: String = lines.iter().map(|l| format!("{l}\r\n")).collect();
        let bytes = stream.as_bytes();
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();

        let (whole, _) = collect(&[bytes]);
        let (pieces, pending) = collect(&singles);
        prop_assert_eq!(pieces, whole);
        prop_assert_eq!(pending, 0);
    }

    #[test]
    fn generated_lines_parse_with_their_code(line in reply_line()) {
        let parsed = parse_line(&line).unwrap();
        prop_assert_eq!(parsed.code.to_string(), line[..3].to_string());
        prop_assert_eq!(parsed.last, line.as_bytes()[3] == b' ');
    }
}
