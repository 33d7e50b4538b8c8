//! Protocol state of a submission session.
//!
//! The dialogue is strictly linear, RFC 5321 section 3 with `AUTH LOGIN`
//! spliced in after the greeting exchange. The only branch is failure.

use std::fmt;

use crate::types::ReplyCode;

/// State of an SMTP session: which reply is currently awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Waiting for the unsolicited 220 banner.
    #[default]
    AwaitGreeting,
    /// `EHLO` sent, waiting for 250.
    AwaitEhlo,
    /// `AUTH LOGIN` sent, waiting for the username prompt (334).
    AwaitAuthUsernamePrompt,
    /// Username sent, waiting for the password prompt (334).
    AwaitAuthPasswordPrompt,
    /// Password sent, waiting for 235.
    AwaitAuthResult,
    /// `MAIL FROM` sent, waiting for 250.
    AwaitMailOk,
    /// `RCPT TO` sent, waiting for 250 or 251.
    AwaitRcptOk,
    /// `DATA` sent, waiting for 354.
    AwaitDataReady,
    /// Message and terminator sent, waiting for 250.
    AwaitDataAccepted,
    /// `QUIT` sent, waiting for 221.
    AwaitQuitOk,
    /// Transport released; nothing more can be sent.
    Closed,
}

const GREETING: &[ReplyCode] = &[ReplyCode::SERVICE_READY];
const OK: &[ReplyCode] = &[ReplyCode::OK];
const OK_OR_FORWARD: &[ReplyCode] = &[ReplyCode::OK, ReplyCode::FORWARD];
const AUTH_PROMPT: &[ReplyCode] = &[ReplyCode::AUTH_CONTINUE];
const AUTH_RESULT: &[ReplyCode] = &[ReplyCode::AUTH_SUCCEEDED];
const DATA_READY: &[ReplyCode] = &[ReplyCode::START_DATA];
const QUIT_OK: &[ReplyCode] = &[ReplyCode::CLOSING];

impl SessionState {
    /// Reply codes that satisfy the expectation of this state.
    #[must_use]
    pub const fn expected(self) -> &'static [ReplyCode] {
        match self {
            Self::AwaitGreeting => GREETING,
            Self::AwaitEhlo | Self::AwaitMailOk | Self::AwaitDataAccepted => OK,
            Self::AwaitAuthUsernamePrompt | Self::AwaitAuthPasswordPrompt => AUTH_PROMPT,
            Self::AwaitAuthResult => AUTH_RESULT,
            Self::AwaitRcptOk => OK_OR_FORWARD,
            Self::AwaitDataReady => DATA_READY,
            Self::AwaitQuitOk => QUIT_OK,
            Self::Closed => &[],
        }
    }

    /// Returns `true` once the transport has been released.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AwaitGreeting => "awaiting greeting",
            Self::AwaitEhlo => "awaiting EHLO reply",
            Self::AwaitAuthUsernamePrompt => "awaiting AUTH username prompt",
            Self::AwaitAuthPasswordPrompt => "awaiting AUTH password prompt",
            Self::AwaitAuthResult => "awaiting AUTH result",
            Self::AwaitMailOk => "awaiting MAIL FROM reply",
            Self::AwaitRcptOk => "awaiting RCPT TO reply",
            Self::AwaitDataReady => "awaiting DATA go-ahead",
            Self::AwaitDataAccepted => "awaiting message acceptance",
            Self::AwaitQuitOk => "awaiting QUIT reply",
            Self::Closed => "closed",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_greeting() {
        assert_eq!(SessionState::default(), SessionState::AwaitGreeting);
        assert_eq!(
            SessionState::default().expected(),
            &[ReplyCode::SERVICE_READY]
        );
    }

    #[test]
    fn test_expected_codes() {
        assert_eq!(
            SessionState::AwaitRcptOk.expected(),
            &[ReplyCode::OK, ReplyCode::FORWARD]
        );
        assert_eq!(
            SessionState::AwaitAuthResult.expected(),
            &[ReplyCode::AUTH_SUCCEEDED]
        );
        assert_eq!(
            SessionState::AwaitDataAccepted.expected(),
            &[ReplyCode::OK]
        );
        assert!(SessionState::Closed.expected().is_empty());
        assert!(SessionState::Closed.is_closed());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::AwaitRcptOk.to_string(), "awaiting RCPT TO reply");
    }
}
