//! # Error Handling
//!
//! This module provides the error taxonomy for the termsync service: data
//! access errors raised by repositories and the run-level failure classes of
//! the synchronization engine. A missing subscription is deliberately not an
//! error (the run reports "not configured"), and a single malformed record is
//! recorded as an error-state item rather than raised here.

use thiserror::Error;

/// Returns true when the database error is a unique constraint violation.
///
/// Used to translate upsert races and the single-active-run guard into
/// domain outcomes instead of opaque database failures.
pub fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        if code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str) {
            return true;
        }
    }

    false
}

/// Errors raised by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {source}")]
    Database {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
}

impl RepositoryError {
    /// Wrap a database error, logging it for diagnosis.
    pub fn database_error(source: sea_orm::DbErr) -> Self {
        tracing::error!(error = %source, "Repository database error");
        Self::Database { source }
    }
}

/// Run-level failure classes of the synchronization engine.
///
/// Every variant aborts the run and leaves the checkpoint untouched; the
/// invoking scheduler decides whether to alert or simply retry on the next
/// trigger.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another run currently holds the in-progress slot.
    #[error("a synchronization run is already in progress")]
    AlreadyInProgress,

    /// The remote source could not be reached or timed out.
    #[error("transport failure contacting remote source: {message}")]
    Transport { message: String },

    /// The payload arrived but could not be unpacked or decoded at all.
    #[error("protocol failure decoding remote payload: {message}")]
    Protocol { message: String },

    /// The run ledger itself could not be written; progress cannot be
    /// audited, so the run fails entirely.
    #[error("ledger failure: {0}")]
    Ledger(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_is_not_a_unique_violation() {
        let err = sea_orm::DbErr::RecordNotFound("run".to_string());
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn sync_error_messages_name_the_failure_class() {
        let transport = SyncError::Transport {
            message: "connection refused".to_string(),
        };
        assert!(transport.to_string().contains("transport failure"));

        let protocol = SyncError::Protocol {
            message: "not a zip archive".to_string(),
        };
        assert!(protocol.to_string().contains("protocol failure"));

        let ledger = SyncError::Ledger(RepositoryError::NotFound { entity: "sync run" });
        assert!(ledger.to_string().contains("ledger failure"));
    }
}
