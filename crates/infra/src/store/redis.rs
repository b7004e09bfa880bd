//! Redis-backed inventory store.
//!
//! Maps the store boundary onto plain Redis commands:
//! - counters and documents: `GET` / `INCRBY` / `DECRBY` / `SET`
//! - sets: `SADD` / `SREM` / `SMEMBERS` / `SISMEMBER` / `SINTER` / `SDIFFSTORE`
//! - optimistic transactions: `WATCH` + `MULTI` … `EXEC` (a nil `EXEC` reply
//!   means a watched key changed and nothing was applied)
//!
//! Connections come from an r2d2 pool. Each checkout is a dedicated socket,
//! so a `WATCH` stays bound to the connection that later runs `EXEC`.

use redis::Commands;
use tracing::instrument;

use super::r#trait::{CommitOutcome, InventoryStore, StoreConnection, StoreError, WriteBatch, WriteOp};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

/// Most pooled connections kept open at once.
pub const MAX_POOLED_CONNECTIONS: u32 = 80;

#[derive(Debug, Clone)]
pub struct RedisInventoryStore {
    pool: r2d2::Pool<redis::Client>,
}

impl RedisInventoryStore {
    /// Create a store handle.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // Sockets are opened lazily on first checkout.
        let pool = r2d2::Pool::builder()
            .max_size(MAX_POOLED_CONNECTIONS)
            .build_unchecked(client);

        Ok(Self { pool })
    }
}

impl InventoryStore for RedisInventoryStore {
    type Connection = RedisConnection;

    fn connection(&self) -> Result<Self::Connection, StoreError> {
        let conn = self
            .pool
            .get()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(RedisConnection { conn })
    }
}

/// A pooled connection; dropping it returns the socket to the pool.
pub struct RedisConnection {
    conn: r2d2::PooledConnection<redis::Client>,
}

impl StoreConnection for RedisConnection {
    fn get_int(&mut self, key: &str) -> Result<Option<i64>, StoreError> {
        let raw: Option<String> = self.conn.get(key)?;
        raw.map(|value| {
            value
                .parse::<i64>()
                .map_err(|e| StoreError::corrupt(key, e.to_string()))
        })
        .transpose()
    }

    fn get_string(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.conn.get(key)?)
    }

    fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.conn.exists(key)?)
    }

    fn members(&mut self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.conn.smembers(key)?)
    }

    fn is_member(&mut self, key: &str, member: &str) -> Result<bool, StoreError> {
        Ok(self.conn.sismember(key, member)?)
    }

    fn intersect(&mut self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.conn.sinter(keys)?)
    }

    fn watch(&mut self, keys: &[String]) -> Result<(), StoreError> {
        redis::cmd("WATCH").arg(keys).query::<()>(&mut *self.conn)?;
        Ok(())
    }

    fn unwatch(&mut self) -> Result<(), StoreError> {
        redis::cmd("UNWATCH").query::<()>(&mut *self.conn)?;
        Ok(())
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()), err)]
    fn commit(&mut self, batch: WriteBatch) -> Result<CommitOutcome, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in batch.into_ops() {
            match op {
                WriteOp::Set { key, value } => {
                    pipe.cmd("SET").arg(key).arg(value).ignore();
                }
                WriteOp::IncrBy { key, by } => {
                    pipe.cmd("INCRBY").arg(key).arg(by).ignore();
                }
                WriteOp::DecrBy { key, by } => {
                    pipe.cmd("DECRBY").arg(key).arg(by).ignore();
                }
                WriteOp::SetAdd { key, member } => {
                    pipe.cmd("SADD").arg(key).arg(member).ignore();
                }
                WriteOp::SetRemove { key, member } => {
                    pipe.cmd("SREM").arg(key).arg(member).ignore();
                }
                WriteOp::DiffStore { dest, left, right } => {
                    pipe.cmd("SDIFFSTORE").arg(dest).arg(left).arg(right).ignore();
                }
            }
        }

        // `EXEC` answers nil when a watched key was touched.
        let reply: Option<()> = pipe.query(&mut *self.conn)?;
        Ok(match reply {
            Some(()) => CommitOutcome::Committed,
            None => CommitOutcome::Conflict,
        })
    }
}
