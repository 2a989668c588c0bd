//! In-process store.
//!
//! Behaves like the hosted store for everything this crate relies on: merge
//! updates, `null` deletes, empty nodes read back as absent, and subscribers at
//! ancestor or descendant paths are told about every change. Failures can be
//! injected per subtree.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::debug;

use super::{RemoteStore, StoreError, StorePath, Subscription};

/// Kind of a recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Whole-value replacement.
    Set,
    /// Merge update.
    Update,
}

/// A successful write, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    /// Write kind.
    pub kind: WriteKind,
    /// Target path.
    pub path: StorePath,
}

/// JSON tree held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
    failing_writes: Vec<StorePath>,
    offline: bool,
    log: Vec<WriteRecord>,
}

#[derive(Debug)]
struct Watcher {
    path: StorePath,
    sender: watch::Sender<Option<Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `root`.
    #[must_use]
    pub fn with_data(root: Value) -> Self {
        let store = Self::new();
        store.lock().root = root;
        store
    }

    /// Write `value` at `path` without failure injection or logging.
    pub fn seed(&self, path: impl Into<StorePath>, value: Value) {
        let path = path.into();
        let mut inner = self.lock();

        put(&mut inner.root, &path, value);
        inner.notify(&path);
    }

    /// The value currently stored at `path`.
    #[must_use]
    pub fn snapshot(&self, path: impl Into<StorePath>) -> Option<Value> {
        get(&self.lock().root, &path.into())
    }

    /// Make every write at or below `path` fail as if the store were unreachable.
    pub fn fail_writes_under(&self, path: impl Into<StorePath>) {
        self.lock().failing_writes.push(path.into());
    }

    /// Clear all injected write failures.
    pub fn clear_failures(&self) {
        self.lock().failing_writes.clear();
    }

    /// Make every operation fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Successful writes so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().log.clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.watchers.retain(|watcher| !watcher.sender.is_closed());
        inner.watchers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::unavailable("memory store is offline"));
        }

        Ok(())
    }

    fn check_writable(&self, path: &StorePath) -> Result<(), StoreError> {
        self.check_online()?;

        if self
            .failing_writes
            .iter()
            .any(|failing| failing.contains(path))
        {
            return Err(StoreError::unavailable(format!(
                "injected write failure at `{path}`"
            )));
        }

        Ok(())
    }

    fn notify(&mut self, changed: &StorePath) {
        let root = &self.root;

        self.watchers.retain(|watcher| !watcher.sender.is_closed());

        for watcher in self.watchers.iter().filter(|w| w.path.overlaps(changed)) {
            let current = get(root, &watcher.path);

            watcher.sender.send_if_modified(|seen| {
                if *seen == current {
                    false
                } else {
                    *seen = current;
                    true
                }
            });
        }
    }

    fn record(&mut self, kind: WriteKind, path: &StorePath) {
        self.log.push(WriteRecord {
            kind,
            path: path.clone(),
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let inner = self.lock();
        inner.check_online()?;

        Ok(get(&inner.root, path))
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_writable(path)?;

        put(&mut inner.root, path, value);
        inner.record(WriteKind::Set, path);
        inner.notify(path);

        debug!(%path, "memory store set");

        Ok(())
    }

    async fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_writable(path)?;

        for (key, value) in fields {
            put(&mut inner.root, &path.child(key), value);
        }

        inner.record(WriteKind::Update, path);
        inner.notify(path);

        debug!(%path, "memory store update");

        Ok(())
    }

    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        let mut inner = self.lock();
        inner.check_online()?;

        let (sender, receiver) = watch::channel(get(&inner.root, path));

        inner.watchers.push(Watcher {
            path: path.clone(),
            sender,
        });

        Ok(Subscription::new(path.clone(), receiver))
    }
}

fn get(root: &Value, path: &StorePath) -> Option<Value> {
    let mut node = root;

    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }

    match node {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.clone()),
    }
}

fn put(root: &mut Value, path: &StorePath, value: Value) {
    let segments: Vec<&str> = path.segments().collect();

    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;

    for segment in parents {
        if !node.is_object() {
            if value.is_null() {
                return;
            }
            *node = Value::Object(Map::new());
        }

        let Value::Object(map) = node else {
            return;
        };

        node = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    if let Value::Object(map) = node {
        if value.is_null() {
            map.remove(*last);
        } else {
            map.insert((*last).to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::fields;

    #[tokio::test]
    async fn update_merges_children() -> TestResult {
        let store = MemoryStore::with_data(json!({
            "sessions": { "ABC123": { "status": "active", "machineId": "VEND001" } }
        }));
        let path = StorePath::session("ABC123");

        store
            .update(&path, fields! { "status" => "paid", "paidAt" => 10 })
            .await?;

        assert_eq!(
            store.read(&path).await?,
            Some(json!({ "status": "paid", "machineId": "VEND001", "paidAt": 10 }))
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_replaces_and_null_deletes() -> TestResult {
        let store = MemoryStore::new();
        let path = StorePath::new("a/b");

        store.set(&path, json!({ "x": 1, "y": 2 })).await?;
        store.set(&path, json!({ "x": 3 })).await?;
        assert_eq!(store.read(&path).await?, Some(json!({ "x": 3 })));

        store.set(&path, Value::Null).await?;
        assert_eq!(store.read(&path).await?, None);
        assert_eq!(store.read(&StorePath::new("a")).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn missing_paths_read_as_none() -> TestResult {
        let store = MemoryStore::with_data(json!({ "a": 1 }));

        assert_eq!(store.read(&StorePath::new("a/b/c")).await?, None);
        assert_eq!(store.read(&StorePath::new("nope")).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn subscribers_see_descendant_writes() -> TestResult {
        let store = MemoryStore::new();
        let inventory = StorePath::inventory("VEND001");

        let mut subscription = store.subscribe(&inventory).await?;
        assert_eq!(subscription.next().await, Some(None));

        store
            .update(
                &StorePath::product("VEND001", "p1"),
                fields! { "stock" => 2 },
            )
            .await?;

        assert_eq!(
            subscription.next().await,
            Some(Some(json!({ "p1": { "stock": 2 } })))
        );

        Ok(())
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_pruned() -> TestResult {
        let store = MemoryStore::new();
        let subscription = store.subscribe(&StorePath::new("a")).await?;

        assert_eq!(store.subscriber_count(), 1);

        subscription.unsubscribe();

        assert_eq!(store.subscriber_count(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn injected_failures_only_hit_the_subtree() -> TestResult {
        let store = MemoryStore::new();
        store.fail_writes_under("machines");

        let failed = store
            .set(&StorePath::product("VEND001", "p1"), json!({ "stock": 1 }))
            .await;
        assert!(matches!(failed, Err(StoreError::Unavailable(_))));

        store.set(&StorePath::session("ABC123"), json!({})).await?;
        assert_eq!(store.writes().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn offline_store_rejects_reads() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let result = store.read(&StorePath::sessions()).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
