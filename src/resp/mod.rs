//! Reply parsing and the response sink surface
//!
//! A reply is a tree: scalar leaves (strings, numbers, doubles,
//! booleans, big numbers, nulls) under aggregate nodes (arrays, pushes,
//! sets, maps, attributes). The parser in [`parser`] walks that tree
//! incrementally off the transport and dispatches each token into a
//! [`ResponseSink`]; the sinks in [`sinks`] cover the common reply
//! shapes, and custom sinks implement the trait directly.

pub mod parser;
pub mod sink;
pub mod sinks;

pub use parser::{read_reply, read_reply_sync, read_reply_with_attributes};
pub use sink::{ErrorKind, ReplyError, ReplyStatus, ResponseSink};
pub use sinks::{
    ArraySink, BigNumberSink, BlobStringSink, BoolSink, DoubleSink, FlatMapSink, FlatSetSink,
    FromWire, IgnoreSink, ListSink, NumberSink, SetSink, SimpleStringSink, StreamedStringSink,
    StringSink, VerbatimStringSink,
};
