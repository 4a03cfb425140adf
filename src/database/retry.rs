use futures::future::BoxFuture;
use std::time::Duration;
use tracing::warn;

use crate::config;

/// SQLSTATE codes worth retrying besides the whole connection-exception class (08xxx)
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "57P01", "53300"];

/// Retry settings for a unit of work that runs inside its own transaction
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config() -> Self {
        let db = &config::config().database;
        Self {
            max_retries: db.retry_max_attempts,
            base_delay: Duration::from_millis(db.retry_base_delay_ms),
            max_delay: Duration::from_millis(db.retry_max_delay_ms),
        }
    }

    /// Exponential backoff, doubling per attempt and capped at max_delay
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(5);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Whether a driver error is a transient connectivity or concurrency fault
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => code.starts_with("08") || TRANSIENT_SQLSTATES.contains(&&*code),
            None => false,
        },
        _ => false,
    }
}

/// Failure of one unit of work.
///
/// A failed commit leaves the outcome unknown, so only `Work` failures are
/// candidates for a retry.
#[derive(Debug)]
pub enum UnitError {
    Work(sqlx::Error),
    Commit(sqlx::Error),
}

impl UnitError {
    pub fn into_inner(self) -> sqlx::Error {
        match self {
            UnitError::Work(err) | UnitError::Commit(err) => err,
        }
    }
}

impl From<sqlx::Error> for UnitError {
    fn from(err: sqlx::Error) -> Self {
        UnitError::Work(err)
    }
}

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// the retry budget is spent. Each call must start a fresh transaction.
pub async fn execute<'a, T, F>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> BoxFuture<'a, Result<T, UnitError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(UnitError::Work(err)) if attempt < policy.max_retries && is_transient(&err) => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                warn!(
                    "Transient database failure in {} (attempt {}/{}), retrying in {:?}: {}",
                    label, attempt, policy.max_retries, delay, err
                );
                tokio::time::sleep(delay).await;
            }
            Err(UnitError::Commit(err)) => {
                warn!("Commit failed in {}, outcome unknown, not retrying: {}", label, err);
                return Err(err);
            }
            Err(err) => return Err(err.into_inner()),
        }
    }
}
