//! Firebase Realtime Database REST client.
//!
//! Every store path maps to `{base}/{path}.json`. Reads are `GET`, whole-value
//! writes `PUT` and merge writes `PATCH`. The REST API has no push channel the
//! client can hold cheaply, so subscriptions poll the path and publish only
//! when the value changes.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::{
    sync::watch,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};
use vendpass::store::{RemoteStore, StoreError, StorePath, Subscription};

use crate::config::DatabaseSecret;

/// Default delay between two polls of a subscribed path.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Errors raised while talking to the Realtime Database.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Transport failure or an unreadable body.
    #[error("realtime database request failed")]
    Http(#[from] reqwest::Error),

    /// The database answered with a non-2xx status.
    #[error("realtime database answered {status}: {message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Error message from the body, or the raw body.
        message: String,
    },
}

impl FirebaseError {
    /// Convert into the store seam's error for `operation` at `path`.
    ///
    /// Client-side refusals (rules, bad requests) are rejections; transport
    /// failures and server errors mean the store is unavailable.
    fn into_store_error(self, operation: &'static str, path: &StorePath) -> StoreError {
        match self {
            Self::Status { status, message } if status.is_client_error() => StoreError::Rejected {
                operation,
                path: path.clone(),
                reason: format!("{status}: {message}"),
            },
            other => StoreError::Unavailable(Box::new(other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Realtime Database client implementing [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct RealtimeDatabase {
    base: String,
    secret: Option<Arc<DatabaseSecret>>,
    poll_interval: Duration,
    http: Client,
}

impl RealtimeDatabase {
    /// Create a client for the database at `base`, e.g.
    /// `https://my-project-default-rtdb.firebaseio.com`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            secret: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http: Client::new(),
        }
    }

    /// Authenticate every request with `secret` (database secret or ID token).
    #[must_use]
    pub fn with_secret(mut self, secret: DatabaseSecret) -> Self {
        self.secret = Some(Arc::new(secret));
        self
    }

    /// Poll subscribed paths every `interval`.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// REST endpoint of `path`.
    #[must_use]
    pub fn url(&self, path: &StorePath) -> String {
        format!("{}/{}.json", self.base, path.as_str())
    }

    fn request(&self, method: Method, path: &StorePath) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));

        match &self.secret {
            Some(secret) => request.query(&[("auth", secret.expose())]),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response, FirebaseError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        Err(FirebaseError::Status {
            status,
            message: error_message(&body),
        })
    }

    async fn get(&self, path: &StorePath) -> Result<Option<Value>, FirebaseError> {
        let response = Self::send(self.request(Method::GET, path)).await?;
        let value: Value = response.json().await?;

        Ok(present(value))
    }

    async fn poll(self, path: StorePath, sender: watch::Sender<Option<Value>>) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                () = sender.closed() => break,
                _ = interval.tick() => {}
            }

            match self.get(&path).await {
                Ok(current) => {
                    let changed = sender.send_if_modified(|seen| {
                        if *seen == current {
                            return false;
                        }

                        *seen = current;
                        true
                    });

                    if changed {
                        debug!(%path, "subscribed value changed");
                    }
                }
                Err(error) => warn!(%path, error = %error, "subscription poll failed"),
            }
        }

        debug!(%path, "subscription closed");
    }
}

#[async_trait]
impl RemoteStore for RealtimeDatabase {
    async fn read(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        self.get(path)
            .await
            .map_err(|error| error.into_store_error("read", path))
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        Self::send(self.request(Method::PUT, path).json(&value))
            .await
            .map_err(|error| error.into_store_error("set", path))?;

        Ok(())
    }

    async fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        Self::send(self.request(Method::PATCH, path).json(&fields))
            .await
            .map_err(|error| error.into_store_error("update", path))?;

        Ok(())
    }

    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        let initial = self
            .get(path)
            .await
            .map_err(|error| error.into_store_error("subscribe", path))?;

        let (sender, receiver) = watch::channel(initial);

        tokio::spawn(self.clone().poll(path.clone(), sender));

        debug!(%path, interval = ?self.poll_interval, "subscription opened");

        Ok(Subscription::new(path.clone(), receiver))
    }
}

/// Nulls mean "nothing stored"; empty objects never come back from the API
/// but are treated the same way.
fn present(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(ref map) if map.is_empty() => None,
        other => Some(other),
    }
}

/// Error bodies look like `{"error": "Permission denied"}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| body.trim().to_string(), |parsed| parsed.error)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn urls_end_in_json() {
        let database = RealtimeDatabase::new("https://vend.firebaseio.com/");

        assert_eq!(
            database.url(&StorePath::new("machines/VEND001/inventory")),
            "https://vend.firebaseio.com/machines/VEND001/inventory.json"
        );
        assert_eq!(
            database.url(&StorePath::root()),
            "https://vend.firebaseio.com/.json"
        );
    }

    #[test]
    fn the_secret_is_sent_as_auth() -> TestResult {
        let database = RealtimeDatabase::new("https://vend.firebaseio.com")
            .with_secret(DatabaseSecret::from("s3cret".to_string()));

        let request = database
            .request(Method::GET, &StorePath::new("sessions/ABC123"))
            .build()?;

        assert_eq!(request.url().query(), Some("auth=s3cret"));

        Ok(())
    }

    #[test]
    fn error_bodies_are_unwrapped() {
        assert_eq!(
            error_message(r#"{ "error": "Permission denied" }"#),
            "Permission denied"
        );
        assert_eq!(error_message(" upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn client_errors_are_rejections() {
        let path = StorePath::new("coupons/X");

        let rejected = FirebaseError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "Permission denied".to_string(),
        }
        .into_store_error("read", &path);

        assert!(
            matches!(rejected, StoreError::Rejected { operation: "read", .. }),
            "expected Rejected, got {rejected:?}"
        );

        let unavailable = FirebaseError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: String::new(),
        }
        .into_store_error("read", &path);

        assert!(
            matches!(unavailable, StoreError::Unavailable(_)),
            "expected Unavailable, got {unavailable:?}"
        );
    }

    #[test]
    fn nulls_and_empty_objects_are_absent() {
        assert_eq!(present(Value::Null), None);
        assert_eq!(present(json!({})), None);
        assert_eq!(present(json!({ "stock": 0 })), Some(json!({ "stock": 0 })));
        assert_eq!(present(json!(0)), Some(json!(0)));
    }
}
