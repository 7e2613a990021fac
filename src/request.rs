//! Request pipeline assembly
//!
//! Commands are serialised into the RESP bulk-array form: `*<n>\r\n`
//! followed by `n` bulk items of the form `$<len>\r\n<bytes>\r\n`. A
//! [`Pipeline`] concatenates any number of such arrays into one payload
//! that is written to the server in a single pass; replies come back in
//! command order and are read one at a time with
//! [`read_reply`](crate::resp::read_reply).

use bytes::{BufMut, Bytes, BytesMut};
use std::borrow::Cow;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// A value serialisable as a single RESP bulk item.
///
/// Implemented for string and byte-slice types (borrowed as-is) and for
/// the integer types (serialised as decimal text). Lengths are always
/// computed from the resulting byte slice, never from any display width.
pub trait ToArg {
    /// Raw bytes of the argument as they appear on the wire
    fn to_arg(&self) -> Cow<'_, [u8]>;
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Cow<'_, [u8]> {
        (**self).to_arg()
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_ref())
    }
}

macro_rules! impl_to_arg_for_int {
    ($($t:ty),*) => {
        $(impl ToArg for $t {
            fn to_arg(&self) -> Cow<'_, [u8]> {
                Cow::Owned(self.to_string().into_bytes())
            }
        })*
    };
}

impl_to_arg_for_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

/// An outbound request payload
///
/// Each command method appends one self-contained RESP array; commands
/// concatenate without separator. The payload is owned by the pipeline
/// and borrowed immutably while being written.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    payload: BytesMut,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialised payload accumulated so far
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of payload bytes accumulated so far
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check whether no command has been appended yet
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Drop all accumulated commands, keeping the allocation
    pub fn clear(&mut self) {
        self.payload.clear();
    }

    fn push_header(&mut self, n: usize) {
        self.payload.put_u8(b'*');
        self.payload.extend_from_slice(n.to_string().as_bytes());
        self.payload.extend_from_slice(b"\r\n");
    }

    fn push_bulk(&mut self, item: &[u8]) {
        self.payload.put_u8(b'$');
        self.payload
            .extend_from_slice(item.len().to_string().as_bytes());
        self.payload.extend_from_slice(b"\r\n");
        self.payload.extend_from_slice(item);
        self.payload.extend_from_slice(b"\r\n");
    }

    /// Append an arbitrary command from its argument list
    ///
    /// The first item is the command name. This is the escape hatch for
    /// commands without a dedicated method.
    pub fn command<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let args: Vec<_> = args.into_iter().collect();
        self.push_header(args.len());
        for arg in &args {
            self.push_bulk(&arg.to_arg());
        }
    }

    /// Append `HELLO <version>`
    pub fn hello(&mut self, version: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"HELLO");
        self.push_bulk(&version.to_arg());
    }

    /// Append `QUIT`
    pub fn quit(&mut self) {
        self.push_header(1);
        self.push_bulk(b"QUIT");
    }

    /// Append `PING`
    pub fn ping(&mut self) {
        self.push_header(1);
        self.push_bulk(b"PING");
    }

    /// Append `AUTH <password>`
    pub fn auth(&mut self, password: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"AUTH");
        self.push_bulk(&password.to_arg());
    }

    /// Append `MULTI`
    pub fn multi(&mut self) {
        self.push_header(1);
        self.push_bulk(b"MULTI");
    }

    /// Append `EXEC`
    pub fn exec(&mut self) {
        self.push_header(1);
        self.push_bulk(b"EXEC");
    }

    /// Append `FLUSHALL`
    pub fn flushall(&mut self) {
        self.push_header(1);
        self.push_bulk(b"FLUSHALL");
    }

    /// Append `BGSAVE`
    pub fn bgsave(&mut self) {
        self.push_header(1);
        self.push_bulk(b"BGSAVE");
    }

    /// Append `BGREWRITEAOF`
    pub fn bgrewriteaof(&mut self) {
        self.push_header(1);
        self.push_bulk(b"BGREWRITEAOF");
    }

    /// Append `ROLE`
    pub fn role(&mut self) {
        self.push_header(1);
        self.push_bulk(b"ROLE");
    }

    /// Append `INCR <key>`
    pub fn incr(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"INCR");
        self.push_bulk(&key.to_arg());
    }

    /// Append `GET <key>`
    pub fn get(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"GET");
        self.push_bulk(&key.to_arg());
    }

    /// Append `SET <key> <value>`
    pub fn set(&mut self, key: impl ToArg, value: impl ToArg) {
        self.push_header(3);
        self.push_bulk(b"SET");
        self.push_bulk(&key.to_arg());
        self.push_bulk(&value.to_arg());
    }

    /// Append `APPEND <key> <value>`
    pub fn append(&mut self, key: impl ToArg, value: impl ToArg) {
        self.push_header(3);
        self.push_bulk(b"APPEND");
        self.push_bulk(&key.to_arg());
        self.push_bulk(&value.to_arg());
    }

    /// Append `DEL <key>`
    pub fn del(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"DEL");
        self.push_bulk(&key.to_arg());
    }

    /// Append `BITCOUNT <key> <start> <end>`
    pub fn bitcount(&mut self, key: impl ToArg, start: i64, end: i64) {
        self.push_header(4);
        self.push_bulk(b"BITCOUNT");
        self.push_bulk(&key.to_arg());
        self.push_bulk(start.to_string().as_bytes());
        self.push_bulk(end.to_string().as_bytes());
    }

    /// Append `LPUSH <key> <value>...`
    pub fn lpush<K, I>(&mut self, key: K, values: I)
    where
        K: ToArg,
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.push_values(b"LPUSH", key, values);
    }

    /// Append `RPUSH <key> <value>...`
    pub fn rpush<K, I>(&mut self, key: K, values: I)
    where
        K: ToArg,
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.push_values(b"RPUSH", key, values);
    }

    fn push_values<K, I>(&mut self, name: &[u8], key: K, values: I)
    where
        K: ToArg,
        I: IntoIterator,
        I::Item: ToArg,
    {
        let values: Vec<_> = values.into_iter().collect();
        self.push_header(2 + values.len());
        self.push_bulk(name);
        self.push_bulk(&key.to_arg());
        for value in &values {
            self.push_bulk(&value.to_arg());
        }
    }

    /// Append `LPOP <key>`
    pub fn lpop(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"LPOP");
        self.push_bulk(&key.to_arg());
    }

    /// Append `LLEN <key>`
    pub fn llen(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"LLEN");
        self.push_bulk(&key.to_arg());
    }

    /// Append `LRANGE <key> <start> <stop>`
    pub fn lrange(&mut self, key: impl ToArg, start: i64, stop: i64) {
        self.push_header(4);
        self.push_bulk(b"LRANGE");
        self.push_bulk(&key.to_arg());
        self.push_bulk(start.to_string().as_bytes());
        self.push_bulk(stop.to_string().as_bytes());
    }

    /// Append `LTRIM <key> <start> <stop>`
    pub fn ltrim(&mut self, key: impl ToArg, start: i64, stop: i64) {
        self.push_header(4);
        self.push_bulk(b"LTRIM");
        self.push_bulk(&key.to_arg());
        self.push_bulk(start.to_string().as_bytes());
        self.push_bulk(stop.to_string().as_bytes());
    }

    /// Append `EXPIRE <key> <seconds>`
    pub fn expire(&mut self, key: impl ToArg, seconds: i64) {
        self.push_header(3);
        self.push_bulk(b"EXPIRE");
        self.push_bulk(&key.to_arg());
        self.push_bulk(seconds.to_string().as_bytes());
    }

    /// Append `HSET <key> <field> <value>...`
    ///
    /// Field/value pairs are emitted in the order they arrive.
    pub fn hset<K, F, V, I>(&mut self, key: K, fields: I)
    where
        K: ToArg,
        F: ToArg,
        V: ToArg,
        I: IntoIterator<Item = (F, V)>,
    {
        let fields: Vec<_> = fields.into_iter().collect();
        self.push_header(2 + 2 * fields.len());
        self.push_bulk(b"HSET");
        self.push_bulk(&key.to_arg());
        for (field, value) in &fields {
            self.push_bulk(&field.to_arg());
            self.push_bulk(&value.to_arg());
        }
    }

    /// Append `HGET <key> <field>`
    pub fn hget(&mut self, key: impl ToArg, field: impl ToArg) {
        self.push_header(3);
        self.push_bulk(b"HGET");
        self.push_bulk(&key.to_arg());
        self.push_bulk(&field.to_arg());
    }

    /// Append `HMGET <key> <field>...`
    pub fn hmget<K, I>(&mut self, key: K, fields: I)
    where
        K: ToArg,
        I: IntoIterator,
        I::Item: ToArg,
    {
        let fields: Vec<_> = fields.into_iter().collect();
        self.push_header(2 + fields.len());
        self.push_bulk(b"HMGET");
        self.push_bulk(&key.to_arg());
        for field in &fields {
            self.push_bulk(&field.to_arg());
        }
    }

    /// Append `HKEYS <key>`
    pub fn hkeys(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"HKEYS");
        self.push_bulk(&key.to_arg());
    }

    /// Append `HVALS <key>`
    pub fn hvals(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"HVALS");
        self.push_bulk(&key.to_arg());
    }

    /// Append `HLEN <key>`
    pub fn hlen(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"HLEN");
        self.push_bulk(&key.to_arg());
    }

    /// Append `HGETALL <key>`
    pub fn hgetall(&mut self, key: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"HGETALL");
        self.push_bulk(&key.to_arg());
    }

    /// Append `HINCRBY <key> <field> <increment>`
    pub fn hincrby(&mut self, key: impl ToArg, field: impl ToArg, increment: i64) {
        self.push_header(4);
        self.push_bulk(b"HINCRBY");
        self.push_bulk(&key.to_arg());
        self.push_bulk(&field.to_arg());
        self.push_bulk(increment.to_string().as_bytes());
    }

    /// Append `ZADD <key> <score> <member>`
    pub fn zadd(&mut self, key: impl ToArg, score: i64, member: impl ToArg) {
        self.push_header(4);
        self.push_bulk(b"ZADD");
        self.push_bulk(&key.to_arg());
        self.push_bulk(score.to_string().as_bytes());
        self.push_bulk(&member.to_arg());
    }

    /// Append `ZADD <key> <score> <member>...` from score/member pairs
    ///
    /// Pairs are emitted in the order they arrive.
    pub fn zadd_multi<K, M, I>(&mut self, key: K, members: I)
    where
        K: ToArg,
        M: ToArg,
        I: IntoIterator<Item = (i64, M)>,
    {
        let members: Vec<_> = members.into_iter().collect();
        self.push_header(2 + 2 * members.len());
        self.push_bulk(b"ZADD");
        self.push_bulk(&key.to_arg());
        for (score, member) in &members {
            self.push_bulk(score.to_string().as_bytes());
            self.push_bulk(&member.to_arg());
        }
    }

    /// Append `ZRANGE <key> <start> <stop>`
    pub fn zrange(&mut self, key: impl ToArg, start: i64, stop: i64) {
        self.push_header(4);
        self.push_bulk(b"ZRANGE");
        self.push_bulk(&key.to_arg());
        self.push_bulk(start.to_string().as_bytes());
        self.push_bulk(stop.to_string().as_bytes());
    }

    /// Append `ZRANGEBYSCORE <key> <min> <max>`
    ///
    /// `None` for `max` means "no upper bound" and serialises as `inf`;
    /// any literal score, including `-1`, is passed through unchanged.
    pub fn zrangebyscore(&mut self, key: impl ToArg, min: i64, max: Option<i64>) {
        self.push_header(4);
        self.push_bulk(b"ZRANGEBYSCORE");
        self.push_bulk(&key.to_arg());
        self.push_bulk(min.to_string().as_bytes());
        match max {
            Some(max) => self.push_bulk(max.to_string().as_bytes()),
            None => self.push_bulk(b"inf"),
        }
    }

    /// Append `ZREMRANGEBYSCORE <key> <score> <score>`
    ///
    /// Removes exactly the members whose score equals `score`.
    pub fn zremrangebyscore(&mut self, key: impl ToArg, score: i64) {
        let score = score.to_string();
        self.push_header(4);
        self.push_bulk(b"ZREMRANGEBYSCORE");
        self.push_bulk(&key.to_arg());
        self.push_bulk(score.as_bytes());
        self.push_bulk(score.as_bytes());
    }

    /// Append `SUBSCRIBE <channel>`
    pub fn subscribe(&mut self, channel: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"SUBSCRIBE");
        self.push_bulk(&channel.to_arg());
    }

    /// Append `UNSUBSCRIBE <channel>`
    pub fn unsubscribe(&mut self, channel: impl ToArg) {
        self.push_header(2);
        self.push_bulk(b"UNSUBSCRIBE");
        self.push_bulk(&channel.to_arg());
    }

    /// Append `PSUBSCRIBE <pattern>...`
    pub fn psubscribe<I>(&mut self, patterns: I)
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let patterns: Vec<_> = patterns.into_iter().collect();
        self.push_header(1 + patterns.len());
        self.push_bulk(b"PSUBSCRIBE");
        for pattern in &patterns {
            self.push_bulk(&pattern.to_arg());
        }
    }

    /// Append `PUBLISH <channel> <message>`
    pub fn publish(&mut self, channel: impl ToArg, message: impl ToArg) {
        self.push_header(3);
        self.push_bulk(b"PUBLISH");
        self.push_bulk(&channel.to_arg());
        self.push_bulk(&message.to_arg());
    }

    /// Append `SENTINEL <subcommand> <name>`
    pub fn sentinel(&mut self, subcommand: impl ToArg, name: impl ToArg) {
        self.push_header(3);
        self.push_bulk(b"SENTINEL");
        self.push_bulk(&subcommand.to_arg());
        self.push_bulk(&name.to_arg());
    }

    /// Write the payload to an async stream and flush it
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        tracing::debug!("Sending pipeline of {} bytes", self.payload.len());
        writer.write_all(&self.payload).await?;
        writer.flush().await?;
        Ok(self.payload.len())
    }

    /// Write the payload to a blocking stream and flush it
    pub fn write_to_sync<W>(&self, writer: &mut W) -> Result<usize>
    where
        W: Write,
    {
        tracing::debug!("Sending pipeline of {} bytes", self.payload.len());
        writer.write_all(&self.payload)?;
        writer.flush()?;
        Ok(self.payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_arg_commands() {
        let mut p = Pipeline::new();
        p.ping();
        assert_eq!(p.payload(), b"*1\r\n$4\r\nPING\r\n");

        p.clear();
        p.bgrewriteaof();
        assert_eq!(p.payload(), b"*1\r\n$12\r\nBGREWRITEAOF\r\n");
    }

    #[test]
    fn test_key_commands() {
        let mut p = Pipeline::new();
        p.get("mykey");
        assert_eq!(p.payload(), b"*2\r\n$3\r\nGET\r\n$5\r\nmykey\r\n");

        p.clear();
        p.auth("secret");
        assert_eq!(p.payload(), b"*2\r\n$4\r\nAUTH\r\n$6\r\nsecret\r\n");

        p.clear();
        p.set("s", "v1");
        assert_eq!(p.payload(), b"*3\r\n$3\r\nSET\r\n$1\r\ns\r\n$2\r\nv1\r\n");
    }

    #[test]
    fn test_empty_key() {
        let mut p = Pipeline::new();
        p.get("");
        assert_eq!(p.payload(), b"*2\r\n$3\r\nGET\r\n$0\r\n\r\n");
    }

    #[test]
    fn test_binary_value_length() {
        // Lengths are byte counts of the payload, unaffected by embedded
        // separators.
        let mut p = Pipeline::new();
        p.set("k", &b"a\r\nb"[..]);
        assert_eq!(p.payload(), b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$4\r\na\r\nb\r\n");
    }

    #[test]
    fn test_repeated_section_arity() {
        let mut p = Pipeline::new();
        p.rpush("a", [1, 2, 3]);
        assert_eq!(
            p.payload(),
            b"*5\r\n$5\r\nRPUSH\r\n$1\r\na\r\n$1\r\n1\r\n$1\r\n2\r\n$1\r\n3\r\n"
        );

        p.clear();
        p.hset("h", [("f1", "v1"), ("f2", "v2")]);
        assert_eq!(
            p.payload(),
            b"*6\r\n$4\r\nHSET\r\n$1\r\nh\r\n$2\r\nf1\r\n$2\r\nv1\r\n$2\r\nf2\r\n$2\r\nv2\r\n"
        );

        p.clear();
        p.zadd_multi("z", [(1, "one"), (2, "two")]);
        assert_eq!(
            p.payload(),
            b"*6\r\n$4\r\nZADD\r\n$1\r\nz\r\n$1\r\n1\r\n$3\r\none\r\n$1\r\n2\r\n$3\r\ntwo\r\n"
        );
    }

    #[test]
    fn test_range_commands() {
        let mut p = Pipeline::new();
        p.lrange("a", 2, -2);
        assert_eq!(
            p.payload(),
            b"*4\r\n$6\r\nLRANGE\r\n$1\r\na\r\n$1\r\n2\r\n$2\r\n-2\r\n"
        );

        p.clear();
        p.zremrangebyscore("z", 7);
        assert_eq!(
            p.payload(),
            b"*4\r\n$16\r\nZREMRANGEBYSCORE\r\n$1\r\nz\r\n$1\r\n7\r\n$1\r\n7\r\n"
        );
    }

    #[test]
    fn test_zrangebyscore_bounds() {
        let mut p = Pipeline::new();
        p.zrangebyscore("z", 0, None);
        assert_eq!(
            p.payload(),
            b"*4\r\n$13\r\nZRANGEBYSCORE\r\n$1\r\nz\r\n$1\r\n0\r\n$3\r\ninf\r\n"
        );

        // A literal -1 is a score, not an unbounded marker.
        p.clear();
        p.zrangebyscore("z", -5, Some(-1));
        assert_eq!(
            p.payload(),
            b"*4\r\n$13\r\nZRANGEBYSCORE\r\n$1\r\nz\r\n$2\r\n-5\r\n$2\r\n-1\r\n"
        );
    }

    #[test]
    fn test_hkeys_has_no_trailing_bulk() {
        let mut p = Pipeline::new();
        p.hkeys("h");
        assert_eq!(p.payload(), b"*2\r\n$5\r\nHKEYS\r\n$1\r\nh\r\n");
    }

    #[test]
    fn test_sentinel_command() {
        let mut p = Pipeline::new();
        p.sentinel("get-master-addr-by-name", "mymaster");
        assert_eq!(
            p.payload(),
            b"*3\r\n$8\r\nSENTINEL\r\n$23\r\nget-master-addr-by-name\r\n$8\r\nmymaster\r\n"
        );
    }

    #[test]
    fn test_custom_command() {
        let mut p = Pipeline::new();
        p.command(["CONFIG", "GET", "maxmemory"]);
        assert_eq!(
            p.payload(),
            b"*3\r\n$6\r\nCONFIG\r\n$3\r\nGET\r\n$9\r\nmaxmemory\r\n"
        );
    }

    #[test]
    fn test_append_is_positional() {
        // Appending C1 then C2 equals C1's bytes followed by C2's bytes no
        // matter what was appended before.
        let mut ab = Pipeline::new();
        ab.ping();
        ab.quit();

        let mut a = Pipeline::new();
        a.ping();
        let mut b = Pipeline::new();
        b.quit();

        let mut joined = a.payload().to_vec();
        joined.extend_from_slice(b.payload());
        assert_eq!(ab.payload(), joined.as_slice());
    }

    #[tokio::test]
    async fn test_write_to() {
        let mut p = Pipeline::new();
        p.ping();
        p.quit();

        let mut out = Vec::new();
        let n = p.write_to(&mut out).await.unwrap();
        assert_eq!(n, p.len());
        assert_eq!(out, b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nQUIT\r\n");
    }

    #[test]
    fn test_write_to_sync() {
        let mut p = Pipeline::new();
        p.ping();

        let mut out = Vec::new();
        p.write_to_sync(&mut out).unwrap();
        assert_eq!(out, b"*1\r\n$4\r\nPING\r\n");
    }
}
