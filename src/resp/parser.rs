//! Incremental RESP reply parser
//!
//! The parser walks one framed reply token by token, dispatching into a
//! caller-supplied [`ResponseSink`]. Bytes are accumulated in a read
//! buffer owned by the caller; whatever a token leaves behind stays in
//! the buffer for the next parse, which is how pipelined replies are read
//! back-to-back over one connection.
//!
//! Header lines are consumed up to their `\r\n`. Blob bodies are consumed
//! as exactly `length + 2` bytes once their length is known, so payloads
//! containing `\r\n` (including the two-byte separator itself) parse
//! byte-for-byte, and a body that is not terminated where its header
//! promised fails with a length-mismatch error.
//!
//! Suspension points are exactly the transport reads. Cancelling the
//! returned future (dropping it, or racing it against a timer) abandons
//! the parse at such a point: bytes already consumed are gone and an
//! incomplete token may remain in the buffer, so the connection should be
//! discarded afterwards.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::{MAX_REPLY_DEPTH, MAX_REPLY_SIZE};
use crate::error::{RedisWireError, Result};
use crate::resp::sink::ResponseSink;
use crate::resp::sinks::IgnoreSink;
use crate::utils::parse_redis_int;

/// Which kind of blob body the next bytes must supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Blob,
    BlobError,
    Verbatim,
    StreamedPart,
}

#[derive(Debug, Clone, Copy)]
struct PendingBlob {
    kind: PendingKind,
    declared: usize,
}

/// Parse state for a single reply
///
/// `remaining` is a fixed stack of open aggregate frames holding the
/// child count still owed at each depth. Index 0 is a sentinel that
/// starts at 2 and must never be 1: the one top-level reply decrements
/// it exactly once, so 1 is the completion signal. Closing attribute
/// frames skips the parent decrement because an attribute only decorates
/// the reply that follows it.
#[derive(Debug)]
struct ReplyState {
    remaining: [i64; MAX_REPLY_DEPTH + 1],
    depth: usize,
    pending: Option<PendingBlob>,
    streaming: bool,
    attr_depth: Option<usize>,
}

impl ReplyState {
    fn new() -> Self {
        let mut remaining = [1; MAX_REPLY_DEPTH + 1];
        remaining[0] = 2;
        Self {
            remaining,
            depth: 0,
            pending: None,
            streaming: false,
            attr_depth: None,
        }
    }

    fn is_complete(&self) -> bool {
        self.remaining[0] == 1
    }

    /// Close every frame that has no children left, propagating the
    /// completion to the parent
    fn collapse(&mut self) {
        while self.depth > 0 && self.remaining[self.depth] <= 0 {
            if self.attr_depth == Some(self.depth) {
                // An attribute is not a reply of its own.
                self.attr_depth = None;
                self.depth -= 1;
            } else {
                self.depth -= 1;
                self.remaining[self.depth] -= 1;
            }
        }
    }

    /// Consume one token from `buf` if it is complete
    ///
    /// Returns `Ok(false)` when more bytes are needed.
    fn step<'a>(
        &mut self,
        buf: &mut BytesMut,
        sink: &'a mut dyn ResponseSink,
        attr_sink: &'a mut dyn ResponseSink,
    ) -> Result<bool> {
        // A declared blob body comes first; it is length-framed, never
        // delimiter-scanned.
        if let Some(pending) = self.pending {
            let need = pending.declared + 2;
            if buf.len() < need {
                return Ok(false);
            }
            let body = buf.split_to(need);
            if &body[pending.declared..] != b"\r\n" {
                return Err(RedisWireError::length_mismatch(pending.declared));
            }
            let data = &body[..pending.declared];
            let target = if self.attr_depth.is_some() {
                &mut *attr_sink
            } else {
                &mut *sink
            };
            match pending.kind {
                PendingKind::Blob => target.on_blob_string(data)?,
                PendingKind::BlobError => target.on_blob_error(data)?,
                PendingKind::Verbatim => target.on_verbatim_string(data)?,
                PendingKind::StreamedPart => target.on_streamed_string_part(data)?,
            }
            self.pending = None;
            if pending.kind != PendingKind::StreamedPart {
                // Streamed parts leave the leaf open until the zero-length
                // terminator.
                self.remaining[self.depth] -= 1;
                self.collapse();
            }
            return Ok(true);
        }

        let Some(pos) = find_crlf(buf) else {
            return Ok(false);
        };
        let line = buf.split_to(pos + 2);
        if line.len() < 3 {
            return Err(RedisWireError::truncated(
                "header line shorter than a marker and CRLF",
            ));
        }
        let marker = line[0];
        let body = &line[1..line.len() - 2];

        // Inside a streamed string only `;<len>` part headers are legal.
        if self.streaming {
            if marker != b';' {
                return Err(RedisWireError::invalid_marker(marker));
            }
            let len = parse_redis_int(body)?;
            if len < 0 {
                return Err(RedisWireError::invalid_format(format!(
                    "negative streamed part length {}",
                    len
                )));
            }
            if len == 0 {
                self.streaming = false;
                self.remaining[self.depth] -= 1;
                self.collapse();
            } else {
                self.pending = Some(PendingBlob {
                    kind: PendingKind::StreamedPart,
                    declared: len as usize,
                });
            }
            return Ok(true);
        }

        match marker {
            b'+' | b'-' | b':' | b',' | b'#' | b'(' | b'_' => {
                let target = if self.attr_depth.is_some() {
                    &mut *attr_sink
                } else {
                    &mut *sink
                };
                match marker {
                    b'+' => target.on_simple_string(body)?,
                    b'-' => target.on_simple_error(body)?,
                    b':' => target.on_number(parse_redis_int(body)?)?,
                    b',' => target.on_double(body)?,
                    b'#' => target.on_bool(body)?,
                    b'(' => target.on_big_number(body)?,
                    _ => target.on_null()?,
                }
                self.remaining[self.depth] -= 1;
                self.collapse();
            }
            b'$' | b'!' | b'=' => {
                if marker == b'$' && body == b"?" {
                    self.streaming = true;
                } else if marker == b'$' && body == b"-1" {
                    let target = if self.attr_depth.is_some() {
                        &mut *attr_sink
                    } else {
                        &mut *sink
                    };
                    target.on_null()?;
                    self.remaining[self.depth] -= 1;
                    self.collapse();
                } else {
                    let len = parse_redis_int(body)?;
                    if len < 0 {
                        return Err(RedisWireError::invalid_format(format!(
                            "negative blob length {}",
                            len
                        )));
                    }
                    let kind = match marker {
                        b'$' => PendingKind::Blob,
                        b'!' => PendingKind::BlobError,
                        _ => PendingKind::Verbatim,
                    };
                    self.pending = Some(PendingBlob {
                        kind,
                        declared: len as usize,
                    });
                }
            }
            b'*' | b'~' | b'>' | b'%' | b'|' => {
                if marker == b'*' && body == b"-1" {
                    let target = if self.attr_depth.is_some() {
                        &mut *attr_sink
                    } else {
                        &mut *sink
                    };
                    target.on_null()?;
                    self.remaining[self.depth] -= 1;
                    self.collapse();
                } else {
                    let count = parse_redis_int(body)?;
                    if count < 0 {
                        return Err(RedisWireError::invalid_format(format!(
                            "negative aggregate count {}",
                            count
                        )));
                    }
                    if self.depth == MAX_REPLY_DEPTH {
                        return Err(RedisWireError::depth_exceeded(MAX_REPLY_DEPTH));
                    }
                    // A declared map or attribute size of n owes 2n child
                    // tokens in key/value order.
                    let children = if marker == b'%' || marker == b'|' {
                        count.checked_mul(2).ok_or_else(|| {
                            RedisWireError::invalid_format(format!(
                                "aggregate count {} overflows",
                                count
                            ))
                        })?
                    } else {
                        count
                    };
                    self.depth += 1;
                    self.remaining[self.depth] = children;
                    if marker == b'|' && self.attr_depth.is_none() {
                        self.attr_depth = Some(self.depth);
                    }
                    let n = count as usize;
                    let target = if self.attr_depth.is_some() {
                        &mut *attr_sink
                    } else {
                        &mut *sink
                    };
                    match marker {
                        b'*' => target.select_array(n)?,
                        b'~' => target.select_set(n)?,
                        b'>' => target.select_push(n)?,
                        b'%' => target.select_map(n)?,
                        _ => target.select_attribute(n)?,
                    }
                    // A zero-count aggregate is already closed.
                    self.collapse();
                }
            }
            other => return Err(RedisWireError::invalid_marker(other)),
        }
        Ok(true)
    }
}

fn find_crlf(buf: &BytesMut) -> Option<usize> {
    buf.windows(2).position(|window| window == b"\r\n")
}

/// Read one reply from the stream into `sink`
///
/// Bytes already present in `buf` are consumed first; bytes beyond the
/// reply are left in `buf` for the next call, so pipelined replies are
/// read by calling this once per expected reply with the same buffer.
/// Attribute frames, when the server sends any, are discarded.
///
/// Completion carries a single error value; server error replies and
/// null replies complete `Ok` and are recorded on the sink's status.
pub async fn read_reply<R, S>(reader: &mut R, buf: &mut BytesMut, sink: &mut S) -> Result<()>
where
    R: AsyncRead + Unpin,
    S: ResponseSink,
{
    let mut attr_sink = IgnoreSink::default();
    read_reply_with_attributes(reader, buf, sink, &mut attr_sink).await
}

/// Read one reply, routing attribute frames to a side-channel sink
///
/// The attribute that may precede a reply is delivered to `attr_sink`
/// while the reply itself is delivered to `sink`; the attribute does not
/// count as the reply.
pub async fn read_reply_with_attributes<R, S, A>(
    reader: &mut R,
    buf: &mut BytesMut,
    sink: &mut S,
    attr_sink: &mut A,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    S: ResponseSink,
    A: ResponseSink,
{
    let mut state = ReplyState::new();

    loop {
        while !state.is_complete() && state.step(buf, sink, attr_sink)? {}
        if state.is_complete() {
            return Ok(());
        }

        if buf.len() > MAX_REPLY_SIZE {
            return Err(RedisWireError::resource_exhausted(
                "reply exceeds maximum buffered size",
            ));
        }

        let mut temp_buf = [0u8; 8192];
        let bytes_read = reader.read(&mut temp_buf).await?;
        if bytes_read == 0 {
            return Err(RedisWireError::truncated("unexpected end of stream"));
        }
        buf.extend_from_slice(&temp_buf[..bytes_read]);
    }
}

/// Blocking equivalent of [`read_reply`]
pub fn read_reply_sync<R, S>(reader: &mut R, buf: &mut BytesMut, sink: &mut S) -> Result<()>
where
    R: std::io::Read,
    S: ResponseSink,
{
    let mut state = ReplyState::new();
    let mut attr_sink = IgnoreSink::default();

    loop {
        while !state.is_complete() && state.step(buf, sink, &mut attr_sink)? {}
        if state.is_complete() {
            return Ok(());
        }

        if buf.len() > MAX_REPLY_SIZE {
            return Err(RedisWireError::resource_exhausted(
                "reply exceeds maximum buffered size",
            ));
        }

        let mut temp_buf = [0u8; 8192];
        let bytes_read = reader.read(&mut temp_buf)?;
        if bytes_read == 0 {
            return Err(RedisWireError::truncated("unexpected end of stream"));
        }
        buf.extend_from_slice(&temp_buf[..bytes_read]);
    }
}
