//! Configuration
//!
//! Settings come from CLI flags with environment fallbacks; a `.env` file in
//! the working directory is loaded first when present.

use std::{fmt, time::Duration};

use clap::Args;
use jiff::tz::TimeZone;
use thiserror::Error;
use zeroize::Zeroize;

use crate::{firebase::RealtimeDatabase, mailer::HttpReceiptMailer};

/// Errors raised while turning settings into clients.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The database URL is not an `http(s)` URL.
    #[error("invalid database url `{0}`")]
    InvalidDatabaseUrl(String),

    /// The poll interval must be positive.
    #[error("store poll interval must be at least 1ms")]
    ZeroPollInterval,

    /// Sending receipts needs a mailer endpoint.
    #[error("no receipt mailer configured (set RECEIPT_MAILER_URL)")]
    MissingMailerUrl,

    /// The configured time zone is unknown.
    #[error("unknown time zone `{name}`")]
    UnknownTimeZone {
        /// Configured IANA name.
        name: String,
        /// Lookup failure.
        #[source]
        source: jiff::Error,
    },
}

/// A Realtime Database secret or ID token.
///
/// Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct DatabaseSecret(String);

impl DatabaseSecret {
    /// The raw secret, for the `auth` query parameter.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for DatabaseSecret {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl fmt::Debug for DatabaseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DatabaseSecret(**redacted**)")
    }
}

impl Drop for DatabaseSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Remote store settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Firebase Realtime Database URL
    #[arg(long, env = "FIREBASE_DATABASE_URL")]
    pub database_url: String,

    /// Database secret or ID token sent as `auth`
    #[arg(long, env = "FIREBASE_DATABASE_SECRET", hide_env_values = true)]
    pub database_secret: Option<DatabaseSecret>,

    /// Delay between polls of watched paths, in milliseconds
    #[arg(long, env = "STORE_POLL_INTERVAL_MS", default_value_t = 1_000)]
    pub poll_interval_ms: u64,
}

impl StoreConfig {
    /// Build the database client.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a malformed URL or a zero poll interval.
    pub fn connect(&self) -> Result<RealtimeDatabase, ConfigError> {
        let url = self.database_url.trim();

        let valid = ["https://", "http://"]
            .iter()
            .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()));

        if !valid {
            return Err(ConfigError::InvalidDatabaseUrl(url.to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        let database = RealtimeDatabase::new(url)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms));

        Ok(match &self.database_secret {
            Some(secret) => database.with_secret(secret.clone()),
            None => database,
        })
    }
}

/// Receipt e-mail settings.
#[derive(Debug, Args)]
pub struct MailerConfig {
    /// Endpoint receiving receipt e-mails as JSON
    #[arg(long, env = "RECEIPT_MAILER_URL")]
    pub receipt_mailer_url: Option<String>,
}

impl MailerConfig {
    /// Build the receipt mailer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingMailerUrl`] when no endpoint is set.
    pub fn mailer(&self) -> Result<HttpReceiptMailer, ConfigError> {
        self.receipt_mailer_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(HttpReceiptMailer::new)
            .ok_or(ConfigError::MissingMailerUrl)
    }
}

/// Reporting settings.
#[derive(Debug, Args)]
pub struct ReportConfig {
    /// IANA time zone used to decide what "today" means (system zone when unset)
    #[arg(long = "tz", env = "VENDPASS_TZ")]
    pub time_zone: Option<String>,
}

impl ReportConfig {
    /// The configured time zone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTimeZone`] when the name is not in the
    /// time zone database.
    pub fn time_zone(&self) -> Result<TimeZone, ConfigError> {
        match self.time_zone.as_deref() {
            None => Ok(TimeZone::system()),
            Some(name) => TimeZone::get(name).map_err(|source| ConfigError::UnknownTimeZone {
                name: name.to_string(),
                source,
            }),
        }
    }
}
