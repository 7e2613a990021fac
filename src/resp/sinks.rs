//! Ready-made sinks for the common reply shapes
//!
//! Scalar sinks hold `Option<T>` results so a null reply is
//! distinguishable from an absent one; container sinks start empty.
//! Element conversion goes through [`FromWire`], so the same container
//! sink works for strings, integers, doubles or raw bytes.

use std::collections::BTreeSet;

use bytes::Bytes;

use crate::error::{RedisWireError, Result};
use crate::resp::sink::{ReplyStatus, ResponseSink};
use crate::utils::{parse_redis_float, parse_redis_int};

/// Conversion from the raw bytes of a wire token into an element type
pub trait FromWire: Sized {
    /// Convert a token body into `Self`
    fn from_wire(raw: &[u8]) -> Result<Self>;
}

impl FromWire for String {
    fn from_wire(raw: &[u8]) -> Result<Self> {
        Ok(std::str::from_utf8(raw)?.to_owned())
    }
}

impl FromWire for i64 {
    fn from_wire(raw: &[u8]) -> Result<Self> {
        parse_redis_int(raw)
    }
}

impl FromWire for f64 {
    fn from_wire(raw: &[u8]) -> Result<Self> {
        parse_redis_float(raw)
    }
}

impl FromWire for Bytes {
    fn from_wire(raw: &[u8]) -> Result<Self> {
        Ok(Bytes::copy_from_slice(raw))
    }
}

impl FromWire for Vec<u8> {
    fn from_wire(raw: &[u8]) -> Result<Self> {
        Ok(raw.to_vec())
    }
}

/// Accepts every token and discards it
///
/// Used to skip replies whose content is uninteresting, such as `HELLO`
/// handshakes or bookkeeping commands in a pipeline. Error and null
/// replies are still recorded on the status.
#[derive(Debug, Default)]
pub struct IgnoreSink {
    status: ReplyStatus,
}

impl ResponseSink for IgnoreSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn select_array(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_push(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_set(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_map(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_attribute(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn on_simple_string(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_number(&mut self, _n: i64) -> Result<()> {
        Ok(())
    }

    fn on_double(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_bool(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_big_number(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_blob_string(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_verbatim_string(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_streamed_string_part(&mut self, _s: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// A signed 64-bit integer reply
#[derive(Debug, Default)]
pub struct NumberSink {
    /// The parsed integer, if one arrived
    pub result: Option<i64>,
    status: ReplyStatus,
}

impl ResponseSink for NumberSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_number(&mut self, n: i64) -> Result<()> {
        self.result = Some(n);
        Ok(())
    }
}

/// A boolean reply
#[derive(Debug, Default)]
pub struct BoolSink {
    /// The boolean, if one arrived
    pub result: Option<bool>,
    status: ReplyStatus,
}

impl ResponseSink for BoolSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_bool(&mut self, s: &[u8]) -> Result<()> {
        match s {
            b"t" => self.result = Some(true),
            b"f" => self.result = Some(false),
            other => {
                return Err(RedisWireError::invalid_format(format!(
                    "boolean body must be 't' or 'f', got {}",
                    crate::utils::escape_bytes(other)
                )))
            }
        }
        Ok(())
    }
}

/// A double reply kept in its textual form
///
/// Converting to IEEE is left to the caller (via
/// [`parse_redis_float`]) because of `inf`/`nan` representation
/// differences.
#[derive(Debug, Default)]
pub struct DoubleSink {
    /// The textual double, if one arrived
    pub result: Option<String>,
    status: ReplyStatus,
}

impl ResponseSink for DoubleSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_double(&mut self, s: &[u8]) -> Result<()> {
        self.result = Some(std::str::from_utf8(s)?.to_owned());
        Ok(())
    }
}

/// A big-number reply kept as its decimal digits
#[derive(Debug, Default)]
pub struct BigNumberSink {
    /// The digits, if a big number arrived
    pub result: Option<String>,
    status: ReplyStatus,
}

impl ResponseSink for BigNumberSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_big_number(&mut self, s: &[u8]) -> Result<()> {
        self.result = Some(std::str::from_utf8(s)?.to_owned());
        Ok(())
    }
}

/// A simple string reply
#[derive(Debug, Default)]
pub struct SimpleStringSink {
    /// The string, if one arrived
    pub result: Option<String>,
    status: ReplyStatus,
}

impl ResponseSink for SimpleStringSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_simple_string(&mut self, s: &[u8]) -> Result<()> {
        self.result = Some(std::str::from_utf8(s)?.to_owned());
        Ok(())
    }
}

/// A blob string reply, binary safe
#[derive(Debug, Default)]
pub struct BlobStringSink {
    /// The blob body, if one arrived
    pub result: Option<Bytes>,
    status: ReplyStatus,
}

impl ResponseSink for BlobStringSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_blob_string(&mut self, s: &[u8]) -> Result<()> {
        self.result = Some(Bytes::copy_from_slice(s));
        Ok(())
    }
}

/// A verbatim string reply, format prefix included
#[derive(Debug, Default)]
pub struct VerbatimStringSink {
    /// The verbatim body, if one arrived
    pub result: Option<String>,
    status: ReplyStatus,
}

impl ResponseSink for VerbatimStringSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_verbatim_string(&mut self, s: &[u8]) -> Result<()> {
        self.result = Some(std::str::from_utf8(s)?.to_owned());
        Ok(())
    }
}

/// A string reply in any of the three string forms
///
/// Accepts simple, blob and verbatim strings; useful when the reply form
/// depends on the server version or command.
#[derive(Debug, Default)]
pub struct StringSink {
    /// The string, if one arrived
    pub result: Option<String>,
    status: ReplyStatus,
}

impl StringSink {
    fn store(&mut self, s: &[u8]) -> Result<()> {
        self.result = Some(std::str::from_utf8(s)?.to_owned());
        Ok(())
    }
}

impl ResponseSink for StringSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_simple_string(&mut self, s: &[u8]) -> Result<()> {
        self.store(s)
    }

    fn on_blob_string(&mut self, s: &[u8]) -> Result<()> {
        self.store(s)
    }

    fn on_verbatim_string(&mut self, s: &[u8]) -> Result<()> {
        self.store(s)
    }
}

/// A streamed string reply, parts concatenated in arrival order
#[derive(Debug, Default)]
pub struct StreamedStringSink {
    /// The reassembled body
    pub result: Vec<u8>,
    status: ReplyStatus,
}

impl ResponseSink for StreamedStringSink {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn on_streamed_string_part(&mut self, s: &[u8]) -> Result<()> {
        self.result.extend_from_slice(s);
        Ok(())
    }
}

/// An array reply of homogeneous scalar elements
#[derive(Debug)]
pub struct ListSink<T> {
    /// Elements in arrival order
    pub result: Vec<T>,
    status: ReplyStatus,
}

impl<T> Default for ListSink<T> {
    fn default() -> Self {
        Self {
            result: Vec::new(),
            status: ReplyStatus::default(),
        }
    }
}

impl<T: FromWire> ResponseSink for ListSink<T> {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn select_array(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn on_simple_string(&mut self, s: &[u8]) -> Result<()> {
        self.result.push(T::from_wire(s)?);
        Ok(())
    }

    fn on_blob_string(&mut self, s: &[u8]) -> Result<()> {
        self.result.push(T::from_wire(s)?);
        Ok(())
    }

    fn on_number(&mut self, n: i64) -> Result<()> {
        self.result.push(T::from_wire(n.to_string().as_bytes())?);
        Ok(())
    }
}

/// A set reply collected into an ordered unique-key container
///
/// Accepts both the RESP3 set form and the RESP2 array form servers use
/// for set-valued commands.
#[derive(Debug)]
pub struct SetSink<T: Ord> {
    /// Unique elements
    pub result: BTreeSet<T>,
    status: ReplyStatus,
}

impl<T: Ord> Default for SetSink<T> {
    fn default() -> Self {
        Self {
            result: BTreeSet::new(),
            status: ReplyStatus::default(),
        }
    }
}

impl<T: FromWire + Ord> ResponseSink for SetSink<T> {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn select_set(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_array(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn on_simple_string(&mut self, s: &[u8]) -> Result<()> {
        self.result.insert(T::from_wire(s)?);
        Ok(())
    }

    fn on_blob_string(&mut self, s: &[u8]) -> Result<()> {
        self.result.insert(T::from_wire(s)?);
        Ok(())
    }
}

/// A flattening sink accepting every reply shape
///
/// Aggregates of any kind are walked and every scalar leaf lands in
/// `result` in arrival order, so a map arrives as key₀, val₀, key₁,
/// val₁, … and a nested reply arrives depth-first. Null leaves set the
/// status flag and contribute no element.
#[derive(Debug)]
pub struct ArraySink<T> {
    /// Flattened scalar leaves in arrival order
    pub result: Vec<T>,
    status: ReplyStatus,
}

impl<T> Default for ArraySink<T> {
    fn default() -> Self {
        Self {
            result: Vec::new(),
            status: ReplyStatus::default(),
        }
    }
}

impl<T: FromWire> ArraySink<T> {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, raw: &[u8]) -> Result<()> {
        self.result.push(T::from_wire(raw)?);
        Ok(())
    }
}

impl<T: FromWire> ResponseSink for ArraySink<T> {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut ReplyStatus {
        &mut self.status
    }

    fn select_array(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_push(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_set(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_map(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn select_attribute(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    fn on_simple_string(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }

    fn on_number(&mut self, n: i64) -> Result<()> {
        self.add(n.to_string().as_bytes())
    }

    fn on_double(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }

    fn on_bool(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }

    fn on_big_number(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }

    fn on_blob_string(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }

    fn on_verbatim_string(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }

    fn on_streamed_string_part(&mut self, s: &[u8]) -> Result<()> {
        self.add(s)
    }
}

/// A map reply flattened into key/value order
pub type FlatMapSink<T> = ArraySink<T>;

/// A set reply flattened into arrival order
pub type FlatSetSink<T> = ArraySink<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire() {
        assert_eq!(String::from_wire(b"hello").unwrap(), "hello");
        assert_eq!(i64::from_wire(b"-42").unwrap(), -42);
        assert_eq!(f64::from_wire(b"inf").unwrap(), f64::INFINITY);
        assert_eq!(Bytes::from_wire(b"ab").unwrap(), Bytes::from_static(b"ab"));
        assert!(i64::from_wire(b"nope").is_err());
    }

    #[test]
    fn test_number_sink() {
        let mut sink = NumberSink::default();
        sink.on_number(1111111).unwrap();
        assert_eq!(sink.result, Some(1111111));
        assert!(sink.on_simple_string(b"OK").is_err());
    }

    #[test]
    fn test_bool_sink_validates_body() {
        let mut sink = BoolSink::default();
        sink.on_bool(b"t").unwrap();
        assert_eq!(sink.result, Some(true));
        sink.on_bool(b"f").unwrap();
        assert_eq!(sink.result, Some(false));
        assert!(sink.on_bool(b"x").is_err());
    }

    #[test]
    fn test_string_sink_accepts_all_forms() {
        let mut sink = StringSink::default();
        sink.on_simple_string(b"OK").unwrap();
        assert_eq!(sink.result.as_deref(), Some("OK"));
        sink.on_blob_string(b"blob").unwrap();
        assert_eq!(sink.result.as_deref(), Some("blob"));
        sink.on_verbatim_string(b"txt:x").unwrap();
        assert_eq!(sink.result.as_deref(), Some("txt:x"));
    }

    #[test]
    fn test_ignore_sink_records_status() {
        let mut sink = IgnoreSink::default();
        sink.on_blob_string(b"discarded").unwrap();
        sink.on_blob_error(b"WRONGTYPE").unwrap();
        assert_eq!(sink.status().error_message(), Some("WRONGTYPE"));
    }

    #[test]
    fn test_list_sink_parses_elements() {
        let mut sink: ListSink<i64> = ListSink::default();
        sink.select_array(2).unwrap();
        sink.on_blob_string(b"1").unwrap();
        sink.on_blob_string(b"2").unwrap();
        assert_eq!(sink.result, vec![1, 2]);
        assert!(sink.select_map(1).is_err());
    }

    #[test]
    fn test_set_sink_dedups() {
        let mut sink: SetSink<String> = SetSink::default();
        sink.select_set(3).unwrap();
        sink.on_simple_string(b"a").unwrap();
        sink.on_simple_string(b"b").unwrap();
        sink.on_simple_string(b"a").unwrap();
        assert_eq!(sink.result.len(), 2);
    }

    #[test]
    fn test_array_sink_flattens() {
        let mut sink: ArraySink<String> = ArraySink::new();
        sink.select_map(2).unwrap();
        sink.on_blob_string(b"proto").unwrap();
        sink.on_number(3).unwrap();
        sink.on_bool(b"t").unwrap();
        sink.on_double(b"0.25").unwrap();
        assert_eq!(sink.result, vec!["proto", "3", "t", "0.25"]);
    }

    #[test]
    fn test_streamed_string_sink() {
        let mut sink = StreamedStringSink::default();
        sink.on_streamed_string_part(b"Hell").unwrap();
        sink.on_streamed_string_part(b"o wor").unwrap();
        sink.on_streamed_string_part(b"d").unwrap();
        assert_eq!(sink.result, b"Hello word");
    }
}
