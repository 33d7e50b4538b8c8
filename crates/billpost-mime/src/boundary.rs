//! Multipart boundary tokens.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::error::{Error, Result};

/// Attempts before giving up on finding a collision-free boundary.
pub(crate) const MAX_ATTEMPTS: usize = 8;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a boundary token from the clock and a process-wide counter.
///
/// Two calls never return the same token within a process. The `=_` prefix
/// cannot occur in Quoted-Printable or Base64 output.
#[must_use]
pub fn generate_boundary() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("=_billpost_{nanos:x}_{seq:x}")
}

/// Picks a boundary that occurs in none of `contents`.
pub(crate) fn choose_boundary(contents: &[&str]) -> Result<String> {
    choose_with(contents, generate_boundary)
}

fn choose_with(contents: &[&str], mut next: impl FnMut() -> String) -> Result<String> {
    for _ in 0..MAX_ATTEMPTS {
        let boundary = next();
        if contents.iter().all(|content| !content.contains(&boundary)) {
            return Ok(boundary);
        }
        tracing::debug!(%boundary, "boundary collides with body content, regenerating");
    }
    Err(Error::BoundaryExhausted(MAX_ATTEMPTS))
}
