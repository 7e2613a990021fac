//! Example: discover a primary through a sentinel
//!
//! Usage: `cargo run --example sentinel [host] [port] [master-name]`
//! (defaults: 127.0.0.1 26379 mymaster)

use redis_wire_rs::error::Result;
use redis_wire_rs::sentinel::{discover_master, SentinelConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    redis_wire_rs::init();

    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.next().unwrap_or_else(|| "26379".to_string());
    let master_name = args.next().unwrap_or_else(|| "mymaster".to_string());

    let config = SentinelConfig {
        sentinels: vec![host, port],
        master_name,
        ..Default::default()
    };

    let master = discover_master(&config).await?;
    println!(
        "primary '{}' is at {}:{}",
        master.name, master.host, master.port
    );

    Ok(())
}
