//! Redis-backed broker.
//!
//! Uses `redis::aio::ConnectionManager`: one multiplexed connection, cloned
//! per call, reconnecting on its own. No retries happen here.

use super::{Broker, result_key};
use crate::config::BrokerConfig;
use crate::error::{Error, Result};
use crate::model::TaskId;
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use redis::IntoConnectionInfo;
use redis::aio::ConnectionManager;
use secrecy::ExposeSecret;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Deadline for connecting and answering the startup PING.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct RedisBroker {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker")
            .field("conn", &"ConnectionManager")
            .finish()
    }
}

impl RedisBroker {
    /// Connect and probe. Fails unless both finish within one
    /// [`PROBE_TIMEOUT`].
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        let info = connection_info(config)?;
        let client = redis::Client::open(info)?;

        let broker = tokio::time::timeout(PROBE_TIMEOUT, async {
            let broker = Self {
                conn: ConnectionManager::new(client).await?,
            };
            broker.probe().await?;
            Ok::<_, Error>(broker)
        })
        .await
        .map_err(|_| Error::unreachable("timed out connecting to redis"))??;

        info!(addr = %config.addr, db = config.db, "connected to task broker");
        Ok(broker)
    }
}

/// Accept either `host:port` or a full `redis://` URL, then overlay the
/// configured db index and password.
fn connection_info(config: &BrokerConfig) -> Result<redis::ConnectionInfo> {
    let url = if config.addr.contains("://") {
        config.addr.clone()
    } else {
        format!("redis://{}", config.addr)
    };
    let mut info = url.as_str().into_connection_info()?;
    info.redis.db = config.db;
    if let Some(ref password) = config.password {
        info.redis.password = Some(password.expose_secret().to_string());
    }
    Ok(info)
}

fn record(operation: &'static str, outcome: &'static str, started: Instant) {
    metrics::broker_operations().add(
        1,
        &[
            KeyValue::new("operation", operation),
            KeyValue::new("result", outcome),
        ],
    );
    metrics::broker_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", operation)],
    );
}

fn observe<T>(operation: &'static str, started: Instant, res: redis::RedisResult<T>) -> Result<T> {
    match res {
        Ok(v) => {
            record(operation, "ok", started);
            Ok(v)
        }
        Err(e) => {
            record(operation, "error", started);
            Err(e.into())
        }
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn probe(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let started = Instant::now();
        let pong: String = observe(
            "probe",
            started,
            redis::cmd("PING").query_async(&mut conn).await,
        )?;
        if pong != "PONG" {
            return Err(Error::unreachable(format!("unexpected PING reply: {pong}")));
        }
        Ok(())
    }

    async fn enqueue(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        let mut conn = self.conn.clone();
        let started = Instant::now();
        let len: i64 = observe(
            "enqueue",
            started,
            redis::cmd("LPUSH")
                .arg(queue)
                .arg(payload)
                .query_async(&mut conn)
                .await,
        )?;
        debug!(queue, len, "LPUSH");
        Ok(())
    }

    async fn read_result(&self, task_id: &TaskId) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let started = Instant::now();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(result_key(task_id))
            .query_async(&mut conn)
            .await
            .inspect_err(|_| record("read", "error", started))?;
        record(
            "read",
            if value.is_some() { "ok" } else { "miss" },
            started,
        );
        Ok(value)
    }

    async fn delete_result(&self, task_id: &TaskId) -> Result<()> {
        let mut conn = self.conn.clone();
        let started = Instant::now();
        let removed: i64 = observe(
            "delete",
            started,
            redis::cmd("DEL")
                .arg(result_key(task_id))
                .query_async(&mut conn)
                .await,
        )?;
        debug!(task_id = %task_id, removed, "DEL");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(addr: &str) -> BrokerConfig {
        BrokerConfig {
            addr: addr.to_string(),
            password: None,
            db: 0,
            queue: "celery".to_string(),
            result_ttl: Duration::from_secs(3600),
        }
    }

    #[test]
    fn bare_address_gets_redis_scheme() {
        let info = connection_info(&config("localhost:6380")).unwrap();
        assert_eq!(
            info.addr,
            redis::ConnectionAddr::Tcp("localhost".to_string(), 6380)
        );
    }

    #[test]
    fn db_and_password_overlay_the_url() {
        let mut cfg = config("redis://cache.internal:6379/0");
        cfg.db = 3;
        cfg.password = Some(SecretString::from("hunter2"));
        let info = connection_info(&cfg).unwrap();
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn silent_server_fails_within_one_probe_timeout() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let started = Instant::now();
        let err = RedisBroker::connect(&config(&addr.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)), "{err}");
        assert!(started.elapsed() < PROBE_TIMEOUT + Duration::from_secs(1));
    }
}
