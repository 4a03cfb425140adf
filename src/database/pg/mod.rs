//! PostgreSQL implementations of the store traits

mod catalog;
mod directory;
mod responses;

use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::retry::RetryPolicy;

/// Store backed by the shared connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::from_config(),
        }
    }
}

/// ILIKE pattern matching `term` anywhere, with wildcards in the term escaped
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map a unique violation to a conflict, leaving other errors untouched
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> DatabaseError {
    let err = DatabaseError::from(err);
    if err.is_unique_violation() {
        DatabaseError::Conflict(message.into())
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ana"), "%ana%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn non_unique_errors_pass_through() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "taken");
        assert!(matches!(err, DatabaseError::Sqlx(sqlx::Error::RowNotFound)));
    }
}
