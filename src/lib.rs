//! Redis Wire - A Rust library for composing Redis command pipelines and
//! parsing RESP2/RESP3 replies
//!
//! This library implements the client side of the Redis serialisation
//! protocol (RESP) on top of any asynchronous byte stream:
//! - **Request pipelines**: Serialise one or more commands into a single
//!   outbound payload
//! - **Incremental reply parsing**: Decode framed replies, including nested
//!   aggregates and streamed strings, into caller-supplied typed sinks
//! - **Sentinel discovery**: Ask a group of sentinels for the current
//!   address of a named primary
//!
//! # Features
//!
//! - **Async/await support**: Parsing and writing suspend at transport
//!   boundaries using Tokio; blocking equivalents are provided as well
//! - **Binary safe**: Blob payloads may contain `\r\n`; framing is
//!   length-prefixed, never delimiter-scanned
//! - **Typed results**: Replies land in reusable sink types (integers,
//!   strings, lists, sets, flat maps) or in custom [`resp::ResponseSink`]
//!   implementations
//! - **Bounded state**: Reply nesting is capped, and a single reply cannot
//!   buffer more than [`config::MAX_REPLY_SIZE`] bytes
//!
//! # Quick Start
//!
//! ## Pipelining commands
//!
//! ```rust,no_run
//! use bytes::BytesMut;
//! use redis_wire_rs::error::Result;
//! use redis_wire_rs::request::Pipeline;
//! use redis_wire_rs::resp::{read_reply, NumberSink, SimpleStringSink};
//! use tokio::net::TcpStream;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut stream = TcpStream::connect("127.0.0.1:6379").await?;
//!
//!     let mut pipeline = Pipeline::new();
//!     pipeline.set("counter", "41");
//!     pipeline.incr("counter");
//!     pipeline.write_to(&mut stream).await?;
//!
//!     let mut buffer = BytesMut::new();
//!
//!     let mut set_reply = SimpleStringSink::default();
//!     read_reply(&mut stream, &mut buffer, &mut set_reply).await?;
//!
//!     let mut incr_reply = NumberSink::default();
//!     read_reply(&mut stream, &mut buffer, &mut incr_reply).await?;
//!     println!("counter = {:?}", incr_reply.result);
//!     Ok(())
//! }
//! ```
//!
//! ## Discovering a primary through sentinels
//!
//! ```rust,no_run
//! use redis_wire_rs::error::Result;
//! use redis_wire_rs::sentinel::{discover_master, SentinelConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SentinelConfig::default();
//!     let master = discover_master(&config).await?;
//!     println!("primary {} at {}:{}", master.name, master.host, master.port);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`error`]: Error handling and result types
//! - [`utils`]: Conversion helpers shared by the codec
//! - [`request`]: Request pipeline assembly and write helpers
//! - [`resp`]: Reply parsing and the response sink surface
//! - [`sentinel`]: Primary discovery through sentinels
//!
//! One connection supports one in-flight parse at a time; pipelined replies
//! are read back-to-back through a shared read buffer owned by the caller.

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

// Re-export commonly used types and traits
pub use error::{RedisWireError, Result};
pub use request::Pipeline;
pub use sentinel::MasterInstance;

// Public modules
pub mod error;
pub mod request;
pub mod resp;
pub mod sentinel;
pub mod utils;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get library version information
pub fn version() -> &'static str {
    VERSION
}

/// Get library name
pub fn name() -> &'static str {
    NAME
}

/// Get library description
pub fn description() -> &'static str {
    DESCRIPTION
}

/// Library configuration constants
pub mod config {
    /// Default buffer size for I/O operations
    pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024; // 64KB

    /// Maximum number of bytes a single reply may occupy in the read buffer
    pub const MAX_REPLY_SIZE: usize = 64 * 1024 * 1024; // 64MB

    /// Maximum reply nesting depth above the top level
    pub const MAX_REPLY_DEPTH: usize = 5;

    /// Default connection timeout
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Default read timeout
    pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

    /// Default write timeout
    pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits

    pub use crate::error::{RedisWireError, Result};
    pub use crate::request::{Pipeline, ToArg};
    pub use crate::resp::{
        read_reply, read_reply_sync, ArraySink, BlobStringSink, BoolSink, DoubleSink,
        FlatMapSink, IgnoreSink, ListSink, NumberSink, ReplyStatus, ResponseSink, SetSink,
        SimpleStringSink, StreamedStringSink, StringSink,
    };
    pub use crate::sentinel::{discover_master, MasterInstance, SentinelConfig};
    pub use crate::utils::{parse_redis_float, parse_redis_int};
}

/// Initialize the library with default logging
pub fn init() {
    tracing_subscriber::fmt::init();
}

/// Initialize the library with custom tracing subscriber
pub fn init_with_subscriber<S>(subscriber: S)
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!version().is_empty());
        assert!(!name().is_empty());
        assert!(!description().is_empty());
    }

    #[test]
    fn test_config_constants() {
        assert!(config::DEFAULT_BUFFER_SIZE > 0);
        assert!(config::MAX_REPLY_SIZE > config::DEFAULT_BUFFER_SIZE);
        assert!(config::MAX_REPLY_DEPTH > 0);
    }
}
