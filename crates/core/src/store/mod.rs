//! Remote store seam.
//!
//! Everything the crate persists goes through [`RemoteStore`]: point reads,
//! whole-value writes, merge writes and change subscriptions over a
//! hierarchical JSON tree. There are no cross-path transactions; each path is
//! last-writer-wins.

use std::{error::Error as StdError, fmt};

use async_trait::async_trait;
use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

mod memory;
mod path;
mod subscription;

pub use memory::{MemoryStore, WriteKind, WriteRecord};
pub use path::StorePath;
pub use subscription::Subscription;

/// Errors raised by a remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("remote store unavailable")]
    Unavailable(#[source] Box<dyn StdError + Send + Sync>),

    /// The store answered but refused the operation.
    #[error("remote store rejected {operation} at `{path}`: {reason}")]
    Rejected {
        /// Operation name (`read`, `set`, `update`, `subscribe`).
        operation: &'static str,
        /// Target path.
        path: StorePath,
        /// Remote explanation.
        reason: String,
    },

    /// Data at a path did not have the expected shape.
    #[error("malformed data at `{path}`")]
    Decode {
        /// Path that was read.
        path: StorePath,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Build an [`StoreError::Unavailable`] from a plain message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into().into())
    }
}

/// Hierarchical key-path store shared by every shopper and machine.
#[automock]
#[async_trait]
pub trait RemoteStore: Send + Sync + fmt::Debug {
    /// Read the value at `path`; `None` when nothing is stored there.
    async fn read(&self, path: &StorePath) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `path`.
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the value at `path`, keeping children not named.
    async fn update(&self, path: &StorePath, fields: Map<String, Value>)
    -> Result<(), StoreError>;

    /// Subscribe to the full value at `path`.
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError>;
}

/// Read and decode a record.
///
/// # Errors
///
/// Returns a store error when the read fails or the data cannot be decoded.
pub async fn read_record<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    path: &StorePath,
) -> Result<Option<T>, StoreError> {
    store
        .read(path)
        .await?
        .map(|value| decode(path, value))
        .transpose()
}

/// Decode a raw value read from `path`.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] when the value has the wrong shape.
pub fn decode<T: DeserializeOwned>(path: &StorePath, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Decode {
        path: path.clone(),
        source,
    })
}

/// Encode a record for writing to `path`.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] when the record cannot be represented as JSON.
pub fn encode<T: Serialize>(path: &StorePath, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|source| StoreError::Decode {
        path: path.clone(),
        source,
    })
}

/// Build a merge-update field map.
#[macro_export]
macro_rules! fields {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut fields = ::serde_json::Map::new();
        $(fields.insert(::std::string::String::from($key), ::serde_json::json!($value));)*
        fields
    }};
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[tokio::test]
    async fn read_record_decodes_present_values() -> TestResult {
        let mut store = MockRemoteStore::new();

        store
            .expect_read()
            .once()
            .withf(|path| path.as_str() == "things/a")
            .return_once(|_| Ok(Some(json!({ "name": "a" }))));

        let record: Option<Named> = read_record(&store, &StorePath::new("things/a")).await?;

        assert_eq!(record, Some(Named { name: "a".into() }));

        Ok(())
    }

    #[tokio::test]
    async fn read_record_reports_malformed_values() {
        let mut store = MockRemoteStore::new();

        store
            .expect_read()
            .return_once(|_| Ok(Some(json!({ "name": 7 }))));

        let result = read_record::<Named>(&store, &StorePath::new("things/a")).await;

        assert!(
            matches!(result, Err(StoreError::Decode { .. })),
            "expected Decode, got {result:?}"
        );
    }

    #[test]
    fn fields_macro_builds_maps() {
        let map = fields! { "status" => "used", "usedCount" => 1 };

        assert_eq!(Value::Object(map), json!({ "status": "used", "usedCount": 1 }));
    }
}
