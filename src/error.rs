//! Error types for AGI sessions and routing

use thiserror::Error;

/// Result alias used throughout the crate.
pub type AgiResult<T> = Result<T, AgiError>;

/// Errors surfaced by AGI sessions, command serialization, and routing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgiError {
    /// TCP I/O error on the call's socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport reached EOF while a line was expected
    #[error("connection closed")]
    ConnectionClosed,

    /// Wire traffic violated the protocol (oversized line, embedded newline, ...)
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// A reply line had no parsable numeric code (strict decode mode only)
    #[error("unparsable reply line: {line:?}")]
    ReplyDecode { line: String },

    /// The `hangup` sentinel arrived; the call is over
    #[error("channel hung up")]
    Hangup,

    /// A command was issued while another is still awaiting its reply
    #[error("a command is already awaiting its reply")]
    CommandPending,

    /// A command was issued after the session terminated
    #[error("session is terminated")]
    SessionTerminated,

    /// No handler matched the requested script and no default is configured
    #[error("no handler for script {script:?} and no default configured")]
    NoScript { script: Option<String> },

    /// A script handler failed or panicked
    #[error("script failed: {message}")]
    Script { message: String },
}

impl AgiError {
    /// Shorthand for [`AgiError::Protocol`].
    pub fn protocol_error(message: impl Into<String>) -> Self {
        AgiError::Protocol {
            message: message.into(),
        }
    }

    /// Shorthand for [`AgiError::Script`], for handler-authored failures.
    pub fn script(message: impl Into<String>) -> Self {
        AgiError::Script {
            message: message.into(),
        }
    }
}
