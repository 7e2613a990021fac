//! Primary discovery through sentinels
//!
//! Sentinels monitor a replication group and report the current address
//! of its primary. Discovery runs in three phases: connect to the first
//! reachable sentinel of a candidate list, write a
//! `SENTINEL get-master-addr-by-name` command, and parse the two-element
//! address reply into a [`MasterInstance`].

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config;
use crate::error::{RedisWireError, Result};
use crate::request::Pipeline;
use crate::resp::sink::ResponseSink;
use crate::resp::{read_reply, ArraySink};

/// Sentinel discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Sentinel endpoints as a flat list: host, port, host, port, …
    pub sentinels: Vec<String>,
    /// Name of the monitored primary
    pub master_name: String,
    /// Connection timeout per candidate sentinel
    pub connect_timeout: Duration,
    /// Read timeout for the address reply
    pub read_timeout: Duration,
    /// Write timeout for the command
    pub write_timeout: Duration,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            sentinels: vec!["127.0.0.1".to_string(), "26379".to_string()],
            master_name: "mymaster".to_string(),
            connect_timeout: Duration::from_secs(config::DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(config::DEFAULT_READ_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(config::DEFAULT_WRITE_TIMEOUT_SECS),
        }
    }
}

/// A discovered primary instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterInstance {
    /// Host of the primary
    pub host: String,
    /// Port of the primary, as reported by the sentinel
    pub port: String,
    /// Name of the replication group
    pub name: String,
}

/// Discover the current primary of a named replication group
///
/// Candidate sentinels are tried in list order; the first one that
/// accepts a connection answers the query. When every candidate fails,
/// the last transport error is returned. A short or null reply (an
/// unknown master name) completes successfully with an empty host and
/// port; a server error reply surfaces as
/// [`RedisWireError::ErrorReply`].
pub async fn discover_master(sentinel_config: &SentinelConfig) -> Result<MasterInstance> {
    let n = sentinel_config.sentinels.len();
    if n == 0 || n % 2 != 0 {
        return Err(RedisWireError::config_error(
            "sentinel list must hold host/port pairs",
        ));
    }

    let mut stream = connect_any(sentinel_config).await?;
    query_master(&mut stream, sentinel_config).await
}

/// Try each candidate sentinel in order, returning the first connection
async fn connect_any(sentinel_config: &SentinelConfig) -> Result<TcpStream> {
    let mut last_err =
        RedisWireError::connection_error("no sentinel candidates were attempted");

    for (index, pair) in sentinel_config.sentinels.chunks(2).enumerate() {
        let addr = format!("{}:{}", pair[0], pair[1]);
        tracing::debug!("Trying sentinel {} at {}", index, addr);

        match timeout(sentinel_config.connect_timeout, TcpStream::connect(&addr)).await {
            Err(_) => {
                last_err = RedisWireError::timeout_error(format!(
                    "connect to sentinel {} timed out",
                    addr
                ));
            }
            Ok(Err(e)) => {
                last_err = RedisWireError::connection_error(format!(
                    "failed to connect to sentinel {}: {}",
                    addr, e
                ));
            }
            Ok(Ok(stream)) => {
                stream.set_nodelay(true).map_err(|e| {
                    RedisWireError::connection_error(format!("Failed to set nodelay: {}", e))
                })?;
                // The sentinel client guide recommends promoting the
                // responding sentinel to the head of the list for the
                // next discovery.
                tracing::debug!("Sentinel {} at {} responded", index, addr);
                return Ok(stream);
            }
        }
    }

    Err(last_err)
}

/// Ask an already-connected sentinel for the primary's address
pub async fn query_master<S>(
    stream: &mut S,
    sentinel_config: &SentinelConfig,
) -> Result<MasterInstance>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut pipeline = Pipeline::new();
    pipeline.sentinel("get-master-addr-by-name", &sentinel_config.master_name);

    timeout(sentinel_config.write_timeout, pipeline.write_to(stream))
        .await
        .map_err(|_| RedisWireError::timeout_error("sentinel command write timed out"))??;

    let mut buf = BytesMut::new();
    let mut sink: ArraySink<String> = ArraySink::new();
    timeout(
        sentinel_config.read_timeout,
        read_reply(stream, &mut buf, &mut sink),
    )
    .await
    .map_err(|_| RedisWireError::timeout_error("sentinel reply timed out"))??;

    if let Some(message) = sink.status().error_message() {
        return Err(RedisWireError::error_reply(message.to_string()));
    }

    let mut items = sink.result.into_iter();
    match (items.next(), items.next()) {
        (Some(host), Some(port)) => {
            tracing::debug!(
                "Sentinel reports primary '{}' at {}:{}",
                sentinel_config.master_name,
                host,
                port
            );
            Ok(MasterInstance {
                host,
                port,
                name: sentinel_config.master_name.clone(),
            })
        }
        _ => {
            // A short or null reply means the sentinel knows no address
            // for this name; the instance stays unpopulated.
            tracing::warn!(
                "Sentinel has no address for master '{}'",
                sentinel_config.master_name
            );
            Ok(MasterInstance {
                name: sentinel_config.master_name.clone(),
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_rejects_odd_sentinel_list() {
        let config = SentinelConfig {
            sentinels: vec!["127.0.0.1".to_string()],
            ..Default::default()
        };
        let err = discover_master(&config).await.unwrap_err();
        assert!(matches!(err, RedisWireError::Config(_)));
    }

    #[tokio::test]
    async fn test_rejects_empty_sentinel_list() {
        let config = SentinelConfig {
            sentinels: Vec::new(),
            ..Default::default()
        };
        let err = discover_master(&config).await.unwrap_err();
        assert!(matches!(err, RedisWireError::Config(_)));
    }

    #[tokio::test]
    async fn test_query_master_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let config = SentinelConfig::default();

        let server_task = tokio::spawn(async move {
            let mut request = vec![0u8; 256];
            let n = server.read(&mut request).await.unwrap();
            assert_eq!(
                &request[..n],
                &b"*3\r\n$8\r\nSENTINEL\r\n$23\r\nget-master-addr-by-name\r\n$8\r\nmymaster\r\n"[..]
            );
            server
                .write_all(b"*2\r\n$9\r\n127.0.0.1\r\n$4\r\n6379\r\n")
                .await
                .unwrap();
        });

        let master = query_master(&mut client, &config).await.unwrap();
        assert_eq!(
            master,
            MasterInstance {
                host: "127.0.0.1".to_string(),
                port: "6379".to_string(),
                name: "mymaster".to_string(),
            }
        );
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_master_error_reply() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let config = SentinelConfig::default();

        let server_task = tokio::spawn(async move {
            let mut request = vec![0u8; 256];
            let _ = server.read(&mut request).await.unwrap();
            server.write_all(b"-ERR unknown command\r\n").await.unwrap();
        });

        let err = query_master(&mut client, &config).await.unwrap_err();
        assert!(matches!(err, RedisWireError::ErrorReply(_)));
        server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_master_unknown_name() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let config = SentinelConfig {
            master_name: "nosuch".to_string(),
            ..Default::default()
        };

        let server_task = tokio::spawn(async move {
            let mut request = vec![0u8; 256];
            let _ = server.read(&mut request).await.unwrap();
            server.write_all(b"*-1\r\n").await.unwrap();
        });

        // A null reply completes successfully with an unpopulated
        // instance; the connection stays usable.
        let master = query_master(&mut client, &config).await.unwrap();
        assert_eq!(
            master,
            MasterInstance {
                host: String::new(),
                port: String::new(),
                name: "nosuch".to_string(),
            }
        );
        server_task.await.unwrap();
    }
}
