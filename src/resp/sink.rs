//! The typed callback surface consumed by the reply parser
//!
//! A sink absorbs the tokens of exactly one reply. The parser calls an
//! aggregate selector when it opens an array, push, set, map or attribute
//! frame, and a leaf callback for every scalar token. Sinks that do not
//! recognise a token kind fail the parse with a sink-mismatch error; error
//! replies and null replies are never treated as parse failures and are
//! recorded in the sink's [`ReplyStatus`] instead.

use crate::error::{RedisWireError, Result};

/// Which kind of error reply was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A `-` simple error line
    Simple,
    /// A `!` blob error
    Blob,
}

/// A well-formed server error reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyError {
    /// Whether the error arrived as a simple or a blob error
    pub kind: ErrorKind,
    /// The error message body
    pub message: String,
}

/// Per-reply outcome shared by every sink
///
/// Server error replies and null replies are ordinary protocol outcomes:
/// the parse completes successfully and the caller inspects the status
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyStatus {
    error: Option<ReplyError>,
    null: bool,
}

impl ReplyStatus {
    /// Record an error reply
    pub fn record_error(&mut self, kind: ErrorKind, message: &[u8]) {
        self.error = Some(ReplyError {
            kind,
            message: String::from_utf8_lossy(message).into_owned(),
        });
    }

    /// Record a null reply
    pub fn record_null(&mut self) {
        self.null = true;
    }

    /// Check whether an error reply was received
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error reply, if one was received
    pub fn error(&self) -> Option<&ReplyError> {
        self.error.as_ref()
    }

    /// The error message, if an error reply was received
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Check whether a null reply was received
    pub fn is_null(&self) -> bool {
        self.null
    }
}

/// A single-use consumer of one reply's tokens
///
/// Every callback defaults to failing with
/// [`RedisWireError::SinkMismatch`], so a concrete sink only implements
/// the token kinds it can absorb. The three status-bearing callbacks
/// ([`on_simple_error`](Self::on_simple_error),
/// [`on_blob_error`](Self::on_blob_error), [`on_null`](Self::on_null))
/// default to recording into the sink's status and succeeding.
///
/// Aggregate selectors receive the child count declared on the wire; for
/// maps and attributes a declared count of `n` means `2n` child tokens
/// will follow in key/value order.
pub trait ResponseSink {
    /// Read access to the reply status
    fn status(&self) -> &ReplyStatus;

    /// Mutable access to the reply status
    fn status_mut(&mut self) -> &mut ReplyStatus;

    /// An array of `n` children was opened
    fn select_array(&mut self, _n: usize) -> Result<()> {
        Err(RedisWireError::sink_mismatch("select_array"))
    }

    /// A push message of `n` children was opened
    fn select_push(&mut self, _n: usize) -> Result<()> {
        Err(RedisWireError::sink_mismatch("select_push"))
    }

    /// A set of `n` children was opened
    fn select_set(&mut self, _n: usize) -> Result<()> {
        Err(RedisWireError::sink_mismatch("select_set"))
    }

    /// A map of `n` entries (`2n` child tokens) was opened
    fn select_map(&mut self, _n: usize) -> Result<()> {
        Err(RedisWireError::sink_mismatch("select_map"))
    }

    /// An attribute of `n` entries (`2n` child tokens) was opened
    fn select_attribute(&mut self, _n: usize) -> Result<()> {
        Err(RedisWireError::sink_mismatch("select_attribute"))
    }

    /// A simple string line
    fn on_simple_string(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_simple_string"))
    }

    /// A number token, already parsed as a signed 64-bit integer
    fn on_number(&mut self, _n: i64) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_number"))
    }

    /// A double token in its textual form (`inf`, `-inf` and `nan`
    /// included)
    fn on_double(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_double"))
    }

    /// A boolean token body (`t` or `f` on the wire)
    fn on_bool(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_bool"))
    }

    /// A big-number token in its textual form
    fn on_big_number(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_big_number"))
    }

    /// A blob string body
    fn on_blob_string(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_blob_string"))
    }

    /// A verbatim string body, including its three-letter format prefix
    fn on_verbatim_string(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_verbatim_string"))
    }

    /// One part of a streamed string
    fn on_streamed_string_part(&mut self, _s: &[u8]) -> Result<()> {
        Err(RedisWireError::sink_mismatch("on_streamed_string_part"))
    }

    /// A simple error line; recorded as reply status
    fn on_simple_error(&mut self, s: &[u8]) -> Result<()> {
        self.status_mut().record_error(ErrorKind::Simple, s);
        Ok(())
    }

    /// A blob error body; recorded as reply status
    fn on_blob_error(&mut self, s: &[u8]) -> Result<()> {
        self.status_mut().record_error(ErrorKind::Blob, s);
        Ok(())
    }

    /// A null reply; recorded as reply status
    fn on_null(&mut self) -> Result<()> {
        self.status_mut().record_null();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareSink {
        status: ReplyStatus,
    }

    impl ResponseSink for BareSink {
        fn status(&self) -> &ReplyStatus {
            &self.status
        }

        fn status_mut(&mut self) -> &mut ReplyStatus {
            &mut self.status
        }
    }

    #[test]
    fn test_defaults_mismatch() {
        let mut sink = BareSink {
            status: ReplyStatus::default(),
        };
        assert!(matches!(
            sink.on_number(1),
            Err(RedisWireError::SinkMismatch {
                callback: "on_number"
            })
        ));
        assert!(matches!(
            sink.select_map(2),
            Err(RedisWireError::SinkMismatch {
                callback: "select_map"
            })
        ));
    }

    #[test]
    fn test_status_recording() {
        let mut sink = BareSink {
            status: ReplyStatus::default(),
        };
        sink.on_simple_error(b"ERR unknown command").unwrap();
        assert!(sink.status().is_error());
        assert_eq!(
            sink.status().error_message(),
            Some("ERR unknown command")
        );
        assert_eq!(sink.status().error().unwrap().kind, ErrorKind::Simple);

        sink.on_null().unwrap();
        assert!(sink.status().is_null());
    }
}
