//! Error types for the Redis Wire library

use std::fmt;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, RedisWireError>;

/// Main error type for the Redis Wire library
#[derive(Error, Debug)]
pub enum RedisWireError {
    /// Connection establishment failures
    #[error("Connection error: {0}")]
    Connection(String),

    /// IO errors from the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended, or a header line was too short, while a token was
    /// still expected
    #[error("Truncated reply: {0}")]
    Truncated(String),

    /// A header line began with a byte that is not a RESP type marker
    #[error("Invalid type marker: 0x{marker:02x}")]
    InvalidMarker {
        /// The offending first byte of the header line
        marker: u8,
    },

    /// A blob body was not terminated by CRLF at its declared length
    #[error("Blob length mismatch: no CRLF after {declared} declared bytes")]
    LengthMismatch {
        /// The length announced in the blob header
        declared: usize,
    },

    /// A reply nested deeper than the parser's frame stack allows
    #[error("Reply nesting exceeds {max} levels")]
    DepthExceeded {
        /// The maximum supported nesting depth
        max: usize,
    },

    /// The supplied sink cannot absorb a token kind the reply contained
    #[error("Sink cannot absorb {callback}")]
    SinkMismatch {
        /// Name of the unsupported callback
        callback: &'static str,
    },

    /// A well-formed server error reply, surfaced by operations that
    /// require a successful reply to make progress
    #[error("Server error reply: {0}")]
    ErrorReply(String),

    /// Malformed numeric fields, counts, or token bodies
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// UTF-8 conversion errors
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Integer parsing errors
    #[error("Integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Resource exhaustion errors
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RedisWireError {
    /// Create a connection error
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a truncated-reply error
    pub fn truncated(message: impl Into<String>) -> Self {
        Self::Truncated(message.into())
    }

    /// Create an invalid-marker error
    pub fn invalid_marker(marker: u8) -> Self {
        Self::InvalidMarker { marker }
    }

    /// Create a blob length mismatch error
    pub fn length_mismatch(declared: usize) -> Self {
        Self::LengthMismatch { declared }
    }

    /// Create a depth-exceeded error
    pub fn depth_exceeded(max: usize) -> Self {
        Self::DepthExceeded { max }
    }

    /// Create a sink mismatch error
    pub fn sink_mismatch(callback: &'static str) -> Self {
        Self::SinkMismatch { callback }
    }

    /// Create a server error-reply error
    pub fn error_reply(message: impl Into<String>) -> Self {
        Self::ErrorReply(message.into())
    }

    /// Create an invalid format error
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }

    /// Create a timeout error
    pub fn timeout_error(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a resource exhausted error
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::ResourceExhausted(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check whether the connection must be discarded after this error.
    ///
    /// Framing errors lose the reply boundary, so the stream can no longer
    /// be trusted; a sink mismatch consumes the full reply and leaves the
    /// connection usable, and a server error reply is an ordinary outcome.
    pub fn closes_connection(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Io(_) => true,
            Self::Truncated(_) => true,
            Self::InvalidMarker { .. } => true,
            Self::LengthMismatch { .. } => true,
            Self::DepthExceeded { .. } => true,
            Self::InvalidFormat(_) => true,
            Self::Utf8(_) => true,
            Self::ParseInt(_) => true,
            Self::Timeout(_) => true,
            Self::ResourceExhausted(_) => true,
            Self::SinkMismatch { .. } => false,
            Self::ErrorReply(_) => false,
            Self::Config(_) => false,
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Io(_) => true,
            Self::Timeout(_) => true,
            Self::ErrorReply(_) => true,
            Self::SinkMismatch { .. } => true,
            Self::Truncated(_) => false,
            Self::InvalidMarker { .. } => false,
            Self::LengthMismatch { .. } => false,
            Self::DepthExceeded { .. } => false,
            Self::InvalidFormat(_) => false,
            Self::Utf8(_) => false,
            Self::ParseInt(_) => false,
            Self::ResourceExhausted(_) => false,
            Self::Config(_) => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) | Self::Timeout(_) => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Io,
            Self::Truncated(_)
            | Self::InvalidMarker { .. }
            | Self::LengthMismatch { .. }
            | Self::DepthExceeded { .. }
            | Self::InvalidFormat(_) => ErrorCategory::Protocol,
            Self::SinkMismatch { .. } => ErrorCategory::Sink,
            Self::ErrorReply(_) => ErrorCategory::Server,
            Self::Utf8(_) | Self::ParseInt(_) => ErrorCategory::Parse,
            Self::ResourceExhausted(_) => ErrorCategory::Resource,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network error
    Network,
    /// I/O error
    Io,
    /// Protocol framing error
    Protocol,
    /// Sink/reply shape disagreement
    Sink,
    /// Well-formed server error reply
    Server,
    /// Value parsing error
    Parse,
    /// Resource error
    Resource,
    /// Configuration error
    Config,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Io => write!(f, "io"),
            Self::Protocol => write!(f, "protocol"),
            Self::Sink => write!(f, "sink"),
            Self::Server => write!(f, "server"),
            Self::Parse => write!(f, "parse"),
            Self::Resource => write!(f, "resource"),
            Self::Config => write!(f, "config"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RedisWireError::invalid_marker(b'@');
        assert!(matches!(err, RedisWireError::InvalidMarker { marker: b'@' }));

        let err = RedisWireError::length_mismatch(26);
        assert!(matches!(err, RedisWireError::LengthMismatch { declared: 26 }));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            RedisWireError::truncated("eof").category(),
            ErrorCategory::Protocol
        );
        assert_eq!(
            RedisWireError::sink_mismatch("on_number").category(),
            ErrorCategory::Sink
        );
        assert_eq!(
            RedisWireError::error_reply("ERR test").category(),
            ErrorCategory::Server
        );
    }

    #[test]
    fn test_connection_fatality() {
        assert!(RedisWireError::invalid_marker(b'@').closes_connection());
        assert!(RedisWireError::truncated("eof").closes_connection());
        assert!(!RedisWireError::sink_mismatch("on_bool").closes_connection());
        assert!(!RedisWireError::error_reply("ERR test").closes_connection());
    }

    #[test]
    fn test_recoverable() {
        assert!(RedisWireError::connection_error("refused").is_recoverable());
        assert!(!RedisWireError::depth_exceeded(5).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = RedisWireError::invalid_marker(0x40);
        assert_eq!(err.to_string(), "Invalid type marker: 0x40");
        assert_eq!(ErrorCategory::Protocol.to_string(), "protocol");
    }
}
