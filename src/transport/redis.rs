//! Redis transport
//!
//! Talks to a Redis server through a [`ConnectionManager`], which multiplexes
//! one connection between all callers and reconnects on failure. The
//! connection is opened lazily on the first command.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{check_ttl, ttl_millis, Command, Reply, Transport};
use crate::config::TransportOptions;
use crate::error::{CacheError, TransportError};

// == Redis Transport ==
/// Transport executing commands on a Redis server.
pub struct RedisTransport {
    client: Client,
    options: TransportOptions,
    connection: OnceCell<ConnectionManager>,
    closed: AtomicBool,
}

impl RedisTransport {
    /// Creates a transport for `options.address`. No connection is made until
    /// the first command runs.
    pub fn open(options: &TransportOptions) -> Result<Self, CacheError> {
        let client = options.connection_info().and_then(Client::open).map_err(|e| {
            CacheError::Config(format!(
                "invalid redis address '{}': {}",
                options.address, e
            ))
        })?;

        Ok(Self {
            client,
            options: options.clone(),
            connection: OnceCell::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the shared connection, establishing it on first use.
    async fn connection(&self) -> Result<ConnectionManager, TransportError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_connection_timeout(self.options.connect_timeout)
                    .set_response_timeout(self.options.response_timeout);
                let manager =
                    ConnectionManager::new_with_config(self.client.clone(), config).await?;
                info!(address = %self.options.address, db = self.options.db, "Connected to redis");
                Ok::<_, TransportError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    fn build(command: &Command) -> redis::Cmd {
        match command {
            Command::Get { key } => {
                let mut cmd = redis::cmd("GET");
                cmd.arg(key);
                cmd
            }
            Command::Set { key, value, ttl } => {
                let mut cmd = redis::cmd("SET");
                cmd.arg(key).arg(value.as_slice());
                if let Some(ttl) = ttl {
                    cmd.arg("PX").arg(ttl_millis(*ttl));
                }
                cmd
            }
            Command::Del { key } => {
                let mut cmd = redis::cmd("DEL");
                cmd.arg(key);
                cmd
            }
            Command::FlushDb => redis::cmd("FLUSHDB"),
            Command::Ping => redis::cmd("PING"),
            Command::Ttl { key } => {
                let mut cmd = redis::cmd("TTL");
                cmd.arg(key);
                cmd
            }
        }
    }

    fn reply(command: &Command, value: Value) -> Result<Reply, TransportError> {
        match value {
            Value::Nil => Ok(Reply::Nil),
            Value::BulkString(bytes) => Ok(Reply::Bytes(bytes)),
            Value::Int(i) => Ok(Reply::Int(i)),
            Value::SimpleString(s) => Ok(Reply::Status(s)),
            Value::Okay => Ok(Reply::Status("OK".to_string())),
            other => Err(TransportError::UnexpectedReply {
                command: command.name(),
                reply: format!("{:?}", other),
            }),
        }
    }
}

#[async_trait]
impl Transport for RedisTransport {
    fn address(&self) -> &str {
        &self.options.address
    }

    async fn execute(&self, command: Command) -> Result<Reply, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if let Command::Set { ttl, .. } = &command {
            check_ttl(*ttl)?;
        }
        let mut conn = self.connection().await?;
        let value: Value = Self::build(&command).query_async(&mut conn).await?;
        Self::reply(&command, value)
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(address = %self.options.address, "Redis transport closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTransport")
            .field("address", &self.options.address)
            .field("db", &self.options.db)
            .field("connected", &self.connection.initialized())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_open_is_lazy() {
        let transport = RedisTransport::open(&TransportOptions::new("localhost:6379")).unwrap();
        assert_eq!(transport.address(), "localhost:6379");
        assert!(!transport.connection.initialized());
    }

    #[test]
    fn test_set_with_ttl_uses_milliseconds() {
        let cmd = RedisTransport::build(&Command::Set {
            key: "k".into(),
            value: b"v".to_vec(),
            ttl: Some(Duration::from_secs(10)),
        });
        let packed = String::from_utf8(cmd.get_packed_command()).unwrap();
        assert!(packed.starts_with("*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n"));
        assert!(packed.ends_with("$2\r\nPX\r\n$5\r\n10000\r\n"));
    }

    #[test]
    fn test_reply_mapping() {
        let get = Command::Get { key: "k".into() };
        assert_eq!(RedisTransport::reply(&get, Value::Nil).unwrap(), Reply::Nil);
        assert_eq!(
            RedisTransport::reply(&get, Value::BulkString(b"v".to_vec())).unwrap(),
            Reply::Bytes(b"v".to_vec())
        );
        assert_eq!(
            RedisTransport::reply(&Command::Ping, Value::SimpleString("PONG".into())).unwrap(),
            Reply::Status("PONG".into())
        );
        assert!(RedisTransport::reply(&get, Value::Array(vec![])).is_err());
    }

    #[tokio::test]
    async fn test_oversized_ttl_rejected_before_connecting() {
        let transport = RedisTransport::open(&TransportOptions::new("127.0.0.1:1")).unwrap();
        let result = transport
            .execute(Command::Set {
                key: "k".into(),
                value: b"v".to_vec(),
                ttl: Some(Duration::MAX),
            })
            .await;
        assert!(matches!(result, Err(TransportError::InvalidTtl(_))));
        assert!(!transport.connection.initialized());
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_commands() {
        let transport = RedisTransport::open(&TransportOptions::new("localhost:6379")).unwrap();
        transport.close().await.unwrap();
        let result = transport.execute(Command::Ping).await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }
}
