//! In-process document store.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{DocumentPath, DocumentStore, StoreError};

/// A JSON tree held in memory.
///
/// Used by the CLI demo and by tests. Failures can be injected to exercise
/// the sync error paths.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    root: RwLock<Value>,
    failing_writes: AtomicU32,
    failing_reads: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            ..Self::default()
        }
    }

    /// Make the next `count` writes fail with `StoreError::Unavailable`.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make every read fail until switched off again.
    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of writes that reached the tree.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// A copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    fn take_write_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("read {path} refused")));
        }

        let root = self.root.read().await;
        let found = path
            .segments()
            .iter()
            .try_fold(&*root, |node, segment| node.get(segment.as_str()));
        Ok(found.filter(|v| !v.is_null()).cloned())
    }

    async fn set(&self, path: &DocumentPath, value: Value) -> Result<(), StoreError> {
        if self.take_write_failure() {
            return Err(StoreError::Unavailable(format!("write {path} refused")));
        }

        let Some((last, parents)) = path.segments().split_last() else {
            return Err(StoreError::UnsupportedPath(path.clone()));
        };

        let mut root = self.root.write().await;
        let mut node = &mut *root;
        for segment in parents {
            let map = as_object(node).ok_or_else(|| StoreError::UnsupportedPath(path.clone()))?;
            node = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let map = as_object(node).ok_or_else(|| StoreError::UnsupportedPath(path.clone()))?;
        if value.is_null() {
            map.remove(last);
        } else {
            map.insert(last.clone(), value);
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Turn `node` into an object if it holds anything else.
fn as_object(node: &mut Value) -> Option<&mut Map<String, Value>> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
}
