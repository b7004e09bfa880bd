use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use piestand_core::ExpectedVersion;

use super::r#trait::{CommitOutcome, InventoryStore, StoreConnection, StoreError, WriteBatch, WriteOp};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Text(String),
    Set(HashSet<String>),
}

/// Key space plus a write version per key.
///
/// Versions survive deletion so that a key removed and re-created between a
/// watch and a commit still counts as changed.
#[derive(Debug, Default)]
struct KeySpace {
    values: HashMap<String, Value>,
    versions: HashMap<String, u64>,
}

impl KeySpace {
    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Behaves like a single key-value server: commands
/// execute one at a time, empty sets disappear, and watched keys are checked
/// by write version at commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    keys: Arc<RwLock<KeySpace>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    type Connection = InMemoryConnection;

    fn connection(&self) -> Result<Self::Connection, StoreError> {
        Ok(InMemoryConnection {
            keys: Arc::clone(&self.keys),
            watched: Vec::new(),
        })
    }
}

/// Connection to an `InMemoryInventoryStore`; owns its own watch list.
#[derive(Debug)]
pub struct InMemoryConnection {
    keys: Arc<RwLock<KeySpace>>,
    watched: Vec<(String, ExpectedVersion)>,
}

fn poisoned() -> StoreError {
    StoreError::Connection("lock poisoned".to_string())
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::Command(format!("WRONGTYPE operation against '{key}'"))
}

impl InMemoryConnection {
    fn read<T>(&self, f: impl FnOnce(&KeySpace) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let keys = self.keys.read().map_err(|_| poisoned())?;
        f(&keys)
    }

    fn read_set(space: &KeySpace, key: &str) -> Result<Option<HashSet<String>>, StoreError> {
        match space.values.get(key) {
            None => Ok(None),
            Some(Value::Set(set)) => Ok(Some(set.clone())),
            Some(Value::Text(_)) => Err(wrong_type(key)),
        }
    }
}

impl StoreConnection for InMemoryConnection {
    fn get_int(&mut self, key: &str) -> Result<Option<i64>, StoreError> {
        self.read(|space| match space.values.get(key) {
            None => Ok(None),
            Some(Value::Text(raw)) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|e| StoreError::corrupt(key, e.to_string())),
            Some(Value::Set(_)) => Err(wrong_type(key)),
        })
    }

    fn get_string(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(|space| match space.values.get(key) {
            None => Ok(None),
            Some(Value::Text(raw)) => Ok(Some(raw.clone())),
            Some(Value::Set(_)) => Err(wrong_type(key)),
        })
    }

    fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        self.read(|space| Ok(space.values.contains_key(key)))
    }

    fn members(&mut self, key: &str) -> Result<Vec<String>, StoreError> {
        self.read(|space| {
            Ok(Self::read_set(space, key)?
                .map(|set| set.into_iter().collect())
                .unwrap_or_default())
        })
    }

    fn is_member(&mut self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.read(|space| match space.values.get(key) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(Value::Text(_)) => Err(wrong_type(key)),
        })
    }

    fn intersect(&mut self, keys: &[String]) -> Result<Vec<String>, StoreError> {
        self.read(|space| {
            let Some((first, rest)) = keys.split_first() else {
                return Ok(vec![]);
            };

            let mut candidates = Self::read_set(space, first)?.unwrap_or_default();
            for key in rest {
                let other = Self::read_set(space, key)?.unwrap_or_default();
                candidates.retain(|member| other.contains(member));
            }
            Ok(candidates.into_iter().collect())
        })
    }

    fn watch(&mut self, keys: &[String]) -> Result<(), StoreError> {
        let space = self.keys.read().map_err(|_| poisoned())?;
        for key in keys {
            self.watched
                .push((key.clone(), ExpectedVersion::Exact(space.version(key))));
        }
        Ok(())
    }

    fn unwatch(&mut self) -> Result<(), StoreError> {
        self.watched.clear();
        Ok(())
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<CommitOutcome, StoreError> {
        let watched = std::mem::take(&mut self.watched);
        let mut space = self.keys.write().map_err(|_| poisoned())?;

        for (key, expected) in &watched {
            if !expected.matches(space.version(key)) {
                return Ok(CommitOutcome::Conflict);
            }
        }

        let staged = stage(&space, batch.into_ops())?;
        for (key, value) in staged {
            *space.versions.entry(key.clone()).or_insert(0) += 1;
            match value {
                Some(value) => {
                    space.values.insert(key, value);
                }
                None => {
                    space.values.remove(&key);
                }
            }
        }

        Ok(CommitOutcome::Committed)
    }
}

/// Compute the post-batch value of every touched key without mutating the
/// key space, so a failing op leaves nothing half-applied.
fn stage(space: &KeySpace, ops: Vec<WriteOp>) -> Result<HashMap<String, Option<Value>>, StoreError> {
    let mut staged: HashMap<String, Option<Value>> = HashMap::new();

    for op in ops {
        match op {
            WriteOp::Set { key, value } => {
                staged.insert(key, Some(Value::Text(value)));
            }
            WriteOp::IncrBy { key, by } => {
                let next = staged_int(space, &staged, &key)?
                    .checked_add(by)
                    .ok_or_else(|| StoreError::Command(format!("increment overflow at '{key}'")))?;
                staged.insert(key, Some(Value::Text(next.to_string())));
            }
            WriteOp::DecrBy { key, by } => {
                let next = staged_int(space, &staged, &key)?
                    .checked_sub(by)
                    .ok_or_else(|| StoreError::Command(format!("decrement overflow at '{key}'")))?;
                staged.insert(key, Some(Value::Text(next.to_string())));
            }
            WriteOp::SetAdd { key, member } => {
                let mut set = staged_set(space, &staged, &key)?;
                set.insert(member);
                staged.insert(key, Some(Value::Set(set)));
            }
            WriteOp::SetRemove { key, member } => {
                let mut set = staged_set(space, &staged, &key)?;
                set.remove(&member);
                let value = (!set.is_empty()).then_some(Value::Set(set));
                staged.insert(key, value);
            }
            WriteOp::DiffStore { dest, left, right } => {
                let left = staged_set(space, &staged, &left)?;
                let right = staged_set(space, &staged, &right)?;
                let diff: HashSet<String> = left.difference(&right).cloned().collect();
                let value = (!diff.is_empty()).then_some(Value::Set(diff));
                staged.insert(dest, value);
            }
        }
    }

    Ok(staged)
}

fn staged_value<'a>(
    space: &'a KeySpace,
    staged: &'a HashMap<String, Option<Value>>,
    key: &str,
) -> Option<&'a Value> {
    match staged.get(key) {
        Some(value) => value.as_ref(),
        None => space.values.get(key),
    }
}

fn staged_int(
    space: &KeySpace,
    staged: &HashMap<String, Option<Value>>,
    key: &str,
) -> Result<i64, StoreError> {
    match staged_value(space, staged, key) {
        None => Ok(0),
        Some(Value::Text(raw)) => raw
            .parse::<i64>()
            .map_err(|_| StoreError::Command(format!("value at '{key}' is not an integer"))),
        Some(Value::Set(_)) => Err(wrong_type(key)),
    }
}

fn staged_set(
    space: &KeySpace,
    staged: &HashMap<String, Option<Value>>,
    key: &str,
) -> Result<HashSet<String>, StoreError> {
    match staged_value(space, staged, key) {
        None => Ok(HashSet::new()),
        Some(Value::Set(set)) => Ok(set.clone()),
        Some(Value::Text(_)) => Err(wrong_type(key)),
    }
}
