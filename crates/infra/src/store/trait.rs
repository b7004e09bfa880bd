use std::sync::Arc;

use thiserror::Error;

/// A single write queued in a `WriteBatch`.
///
/// The variants mirror the key-value commands the purchase engine needs:
/// string/counter writes, set membership, and a stored set difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Overwrite a string value.
    Set { key: String, value: String },
    /// Add to an integer counter (a missing counter starts at 0).
    IncrBy { key: String, by: i64 },
    /// Subtract from an integer counter (a missing counter starts at 0).
    DecrBy { key: String, by: i64 },
    /// Add a member to a set.
    SetAdd { key: String, member: String },
    /// Remove a member from a set.
    SetRemove { key: String, member: String },
    /// Store `left \ right` under `dest`, replacing whatever was there.
    DiffStore {
        dest: String,
        left: String,
        right: String,
    },
}

/// Ordered batch of writes applied all-or-nothing by `StoreConnection::commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn incr_by(&mut self, key: impl Into<String>, by: i64) -> &mut Self {
        self.push(WriteOp::IncrBy { key: key.into(), by })
    }

    pub fn decr_by(&mut self, key: impl Into<String>, by: i64) -> &mut Self {
        self.push(WriteOp::DecrBy { key: key.into(), by })
    }

    pub fn set_add(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(WriteOp::SetAdd {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn set_remove(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(WriteOp::SetRemove {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn diff_store(
        &mut self,
        dest: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push(WriteOp::DiffStore {
            dest: dest.into(),
            left: left.into(),
            right: right.into(),
        })
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of a conditional commit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every write in the batch was applied.
    Committed,
    /// A watched key changed since it was watched; nothing was applied.
    Conflict,
}

/// Inventory store operation error.
///
/// These are **infrastructure errors** (connectivity, command failures, values
/// of the wrong shape) as opposed to business rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store command error: {0}")]
    Command(String),

    /// A stored value could not be interpreted (e.g. a non-integer counter).
    #[error("corrupt value at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::Corrupt { .. })
    }
}

/// One logical connection to the inventory store.
///
/// Watches are connection-scoped: `watch` registers interest in keys, and the
/// next `commit` on the same connection applies its batch only if none of
/// those keys were written in between. Every commit releases the watch, as
/// does `unwatch`. A commit without a preceding watch always applies.
///
/// Set enumeration order (`members`, `intersect`) is unspecified.
pub trait StoreConnection {
    fn get_int(&mut self, key: &str) -> Result<Option<i64>, StoreError>;

    fn get_string(&mut self, key: &str) -> Result<Option<String>, StoreError>;

    fn exists(&mut self, key: &str) -> Result<bool, StoreError>;

    fn members(&mut self, key: &str) -> Result<Vec<String>, StoreError>;

    fn is_member(&mut self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Members present in every one of `keys` (missing keys are empty sets).
    fn intersect(&mut self, keys: &[String]) -> Result<Vec<String>, StoreError>;

    fn watch(&mut self, keys: &[String]) -> Result<(), StoreError>;

    fn unwatch(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self, batch: WriteBatch) -> Result<CommitOutcome, StoreError>;
}

/// Shared handle to the inventory store.
///
/// Implementations are cheap to share across request tasks; each task takes
/// its own connection.
pub trait InventoryStore: Send + Sync {
    type Connection: StoreConnection;

    fn connection(&self) -> Result<Self::Connection, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore,
{
    type Connection = S::Connection;

    fn connection(&self) -> Result<Self::Connection, StoreError> {
        (**self).connection()
    }
}
