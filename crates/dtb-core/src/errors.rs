use std::fmt;

/// Why a bounded call stopped before it completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The step budget elapsed.
    TimedOut,
    /// The owning cancellation token fired (e.g. bot shutdown).
    Cancelled,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::TimedOut => f.write_str("timed out"),
            CancelReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Core error type.
///
/// Adapter crates map their specific errors (reqwest, teloxide) into this type so
/// the handlers can log the detailed cause and reply with a single generic message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("authentication failed (code {code}): {message}")]
    Auth { code: i64, message: String },

    #[error("not authenticated: log in first")]
    NotAuthenticated,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error (code {code}): {message}")]
    Provider { code: i64, message: String },

    #[error("instance {instance_id} not found in the hosting account")]
    ConfigInconsistency { instance_id: String },

    #[error("failed to parse bandwidth date {date:?}: {reason}")]
    DateParse { date: String, reason: String },

    #[error("{op} {reason}")]
    Cancelled {
        op: &'static str,
        reason: CancelReason,
    },

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True for errors caused by the caller's budget or token rather than the remote side.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
