use contracts::domain::common::{Identifier, ValidationError};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

/// Primary SQLite result codes; extended codes keep them in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Failure of a traceability store operation.
///
/// Identifier format errors never show up here: ids reach the store already
/// parsed, so a malformed id is the boundary's problem.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} '{id}' not found")]
    NotFound {
        entity: &'static str,
        id: Identifier,
    },

    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

impl StoreError {
    pub fn batch_not_found(id: Identifier) -> Self {
        StoreError::NotFound { entity: "batch", id }
    }

    /// Whether the underlying fault is worth retrying by the caller:
    /// connection pool exhaustion or SQLite lock contention.
    /// The store itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Storage(DbErr::ConnectionAcquire(..)) => true,
            StoreError::Storage(err) => sqlite_code(err)
                .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)),
            _ => false,
        }
    }
}

/// Extended SQLite result code of a failed statement, when the driver reported one.
pub(crate) fn sqlite_code(err: &DbErr) -> Option<i32> {
    let (DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime)) = err else {
        return None;
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => db_err.code()?.parse().ok(),
        _ => None,
    }
}

/// Insert referencing a row that does not exist (SQLITE_CONSTRAINT_FOREIGNKEY).
pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

/// Row that cannot be mapped back into a domain value.
pub(crate) fn corrupt_row(table: &str, id: &str, reason: impl std::fmt::Display) -> DbErr {
    DbErr::Custom(format!("corrupt row in {table} (id '{id}'): {reason}"))
}
