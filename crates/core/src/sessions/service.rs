//! Sessions service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    codes::random_segment,
    fields,
    ids::TransactionId,
    sessions::{
        errors::SessionError,
        models::{
            CancelOutcome, CompletionOutcome, NewSession, SESSION_CODE_LEN, SessionCode,
            SessionGrant, SessionRecord, SessionReuse, SessionStatus,
        },
    },
    store::{RemoteStore, StorePath, decode, encode, read_record},
};

/// Attempts made to find an unused code before giving up.
pub const MAX_ISSUE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct StoreSessionsService {
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
}

impl StoreSessionsService {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn record(&self, code: &SessionCode) -> Result<Option<SessionRecord>, SessionError> {
        Ok(read_record(self.store.as_ref(), &StorePath::session(code)).await?)
    }

    fn fresh_code() -> Result<SessionCode, SessionError> {
        random_segment(&mut rand::thread_rng(), SESSION_CODE_LEN).parse()
    }
}

#[async_trait]
impl SessionsService for StoreSessionsService {
    async fn validate(&self, code: &str) -> Result<SessionGrant, SessionError> {
        let code: SessionCode = code.parse()?;
        let record = self.record(&code).await?.ok_or(SessionError::NotFound)?;
        let now = self.clock.now();

        if record.is_expired(now) {
            return Err(SessionError::Expired);
        }

        if record.status != SessionStatus::Active {
            return Err(SessionError::AlreadyConsumed);
        }

        self.store
            .update(
                &StorePath::session(&code),
                fields! { "isLoggedIn" => true, "loggedInAt" => now.as_second() },
            )
            .await?;

        info!(%code, machine = %record.machine_id, "session validated");

        Ok(SessionGrant {
            expires_at: record.expires_at(),
            machine_id: record.machine_id,
            code,
        })
    }

    async fn cancel(&self, code: &SessionCode) -> Result<CancelOutcome, SessionError> {
        let Some(record) = self.record(code).await? else {
            debug!(%code, "cancel requested for unknown session");
            return Ok(CancelOutcome::NotFound);
        };

        if record.status != SessionStatus::Active {
            return Ok(CancelOutcome::AlreadyTerminal(record.status));
        }

        let now = self.clock.now();

        self.store
            .update(
                &StorePath::session(code),
                fields! {
                    "status" => SessionStatus::Cancelled.as_str(),
                    "cancelledAt" => now.as_second(),
                },
            )
            .await?;

        info!(%code, "session cancelled");

        Ok(CancelOutcome::Cancelled)
    }

    async fn complete(
        &self,
        code: &SessionCode,
        transaction_id: &TransactionId,
    ) -> Result<CompletionOutcome, SessionError> {
        let record = self.record(code).await?.ok_or(SessionError::NotFound)?;
        let now = self.clock.now().as_second();
        let path = StorePath::session(code);

        let outcome = match record.reuse() {
            SessionReuse::SingleUse => {
                self.store
                    .update(
                        &path,
                        fields! {
                            "status" => SessionStatus::Paid.as_str(),
                            "paidAt" => now,
                            "lastTransactionId" => transaction_id.as_str(),
                        },
                    )
                    .await?;

                CompletionOutcome::Paid
            }
            SessionReuse::Reusable => {
                let usage_count = record.usage_count.unwrap_or(0).saturating_add(1);

                self.store
                    .update(
                        &path,
                        fields! {
                            "status" => SessionStatus::Active.as_str(),
                            "usageCount" => usage_count,
                            "lastUsedAt" => now,
                            "lastTransactionId" => transaction_id.as_str(),
                        },
                    )
                    .await?;

                CompletionOutcome::Reactivated { usage_count }
            }
        };

        info!(%code, transaction = %transaction_id, ?outcome, "session completed");

        Ok(outcome)
    }

    async fn issue(&self, new: NewSession) -> Result<SessionRecord, SessionError> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let code = Self::fresh_code()?;

            if self.record(&code).await?.is_some() {
                debug!(%code, "generated code already taken");
                continue;
            }

            let created_at = self.clock.now().as_second();
            let path = StorePath::session(&code);

            let record = SessionRecord {
                code: Some(code.clone()),
                machine_id: new.machine_id,
                status: SessionStatus::Active,
                created_at,
                expires_at: created_at.saturating_add(new.ttl.as_secs()),
                last_transaction_id: None,
                usage_count: new.reusable.then_some(0),
                is_logged_in: false,
            };

            self.store.set(&path, encode(&path, &record)?).await?;

            info!(
                %code,
                machine = %record.machine_id,
                expires_at = record.expires_at,
                "session issued"
            );

            return Ok(record);
        }

        Err(SessionError::NoFreeCode {
            attempts: MAX_ISSUE_ATTEMPTS,
        })
    }

    async fn active_sessions(&self) -> Result<Vec<SessionRecord>, SessionError> {
        let path = StorePath::sessions();
        let now = self.clock.now();

        let Some(Value::Object(children)) = self.store.read(&path).await? else {
            return Ok(Vec::new());
        };

        let mut sessions: Vec<SessionRecord> = children
            .into_iter()
            .filter_map(|(key, value)| {
                let child = path.child(&key);

                match decode::<SessionRecord>(&child, value) {
                    Ok(mut record) => {
                        if record.code.is_none() {
                            record.code = key.parse().ok();
                        }
                        Some(record)
                    }
                    Err(error) => {
                        debug!(path = %child, %error, "skipping malformed session");
                        None
                    }
                }
            })
            .filter(|record| record.is_usable(now))
            .collect();

        sessions.sort_by_key(|record| record.expires_at);

        Ok(sessions)
    }
}

#[automock]
#[async_trait]
pub trait SessionsService: Send + Sync + fmt::Debug {
    /// Check a typed pickup code and mark the session logged in.
    async fn validate(&self, code: &str) -> Result<SessionGrant, SessionError>;

    /// Cancel an active session. Missing or already closed sessions are left alone.
    async fn cancel(&self, code: &SessionCode) -> Result<CancelOutcome, SessionError>;

    /// Close a session after a successful payment.
    async fn complete(
        &self,
        code: &SessionCode,
        transaction_id: &TransactionId,
    ) -> Result<CompletionOutcome, SessionError>;

    /// Generate and store a fresh active session.
    async fn issue(&self, new: NewSession) -> Result<SessionRecord, SessionError>;

    /// All sessions that could be validated right now, soonest deadline first.
    async fn active_sessions(&self) -> Result<Vec<SessionRecord>, SessionError>;
}
