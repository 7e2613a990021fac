//! Example: pipelined list commands against a live server
//!
//! Connects to a Redis-compatible server, writes one payload holding a
//! whole session of commands, then reads the replies back in order with
//! a typed sink for each.
//!
//! Usage: `cargo run --example pipeline [addr]` (default 127.0.0.1:6379)

use bytes::BytesMut;
use redis_wire_rs::error::Result;
use redis_wire_rs::request::Pipeline;
use redis_wire_rs::resp::{
    read_reply, BlobStringSink, IgnoreSink, ListSink, NumberSink, SimpleStringSink,
};
use std::env;
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<()> {
    redis_wire_rs::init();

    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:6379".to_string());
    let mut stream = TcpStream::connect(&addr).await?;
    println!("Connected to {}", addr);

    let mut pipeline = Pipeline::new();
    pipeline.hello("3");
    pipeline.flushall();
    pipeline.rpush("a", [1, 2, 3, 4, 5, 6]);
    pipeline.lrange("a", 0, -1);
    pipeline.lrange("a", 2, -2);
    pipeline.ltrim("a", 2, -2);
    pipeline.lpop("a");
    pipeline.quit();
    pipeline.write_to(&mut stream).await?;

    let mut buffer = BytesMut::new();

    {
        // hello
        let mut reply = IgnoreSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
    }

    {
        // flushall
        let mut reply = SimpleStringSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("flushall: {:?}", reply.result);
    }

    {
        // rpush
        let mut reply = NumberSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("rpush:    {:?}", reply.result);
    }

    {
        // lrange a 0 -1
        let mut reply: ListSink<i64> = ListSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("lrange:   {:?}", reply.result);
    }

    {
        // lrange a 2 -2
        let mut reply: ListSink<i64> = ListSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("lrange:   {:?}", reply.result);
    }

    {
        // ltrim
        let mut reply = SimpleStringSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("ltrim:    {:?}", reply.result);
    }

    {
        // lpop replies with a blob string
        let mut reply = BlobStringSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("lpop:     {:?}", reply.result);
    }

    {
        // quit
        let mut reply = SimpleStringSink::default();
        read_reply(&mut stream, &mut buffer, &mut reply).await?;
        println!("quit:     {:?}", reply.result);
    }

    Ok(())
}
