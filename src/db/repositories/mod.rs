//! Persistence adapters for todos and tags.
//!
//! The use-case layer only sees the [`TodoRepository`] and [`TagRepository`]
//! traits. Two stores implement both: [`PostgresStore`] backed by SeaORM and
//! [`MemoryStore`] which keeps everything behind a single lock. A store that
//! implements both traits keeps todos, tags and their associations consistent
//! with each other.

use async_trait::async_trait;
use sea_orm::{DbErr, RuntimeErr, TransactionError};

use crate::db::models::{NewTodo, Tag, Todo};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(what) => RepositoryError::NotFound(what),
            other => RepositoryError::Database(other),
        }
    }
}

impl From<TransactionError<DbErr>> for RepositoryError {
    fn from(err: TransactionError<DbErr>) -> Self {
        match err {
            TransactionError::Connection(e) => e.into(),
            TransactionError::Transaction(e) => e.into(),
        }
    }
}

/// Reports whether a SeaORM error wraps a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_error_value))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_error_value)) => {
            if let sqlx::Error::Database(database_error) = sqlx_error_value {
                return database_error.is_unique_violation();
            }
            false
        }
        _ => false,
    }
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Persists a todo and one association per distinct tag in `todo.tags`.
    async fn create(&self, todo: NewTodo) -> Result<Todo, RepositoryError>;

    async fn find_by_id(&self, id: i32) -> Result<Todo, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Todo>, RepositoryError>;

    /// Saves title and completion state and replaces the whole tag set with
    /// `todo.tags`. An empty list clears every association.
    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError>;

    async fn delete(&self, id: i32) -> Result<(), RepositoryError>;

    /// Removes the association row only. Missing associations are not an error.
    async fn remove_tag(&self, todo_id: i32, tag_id: i32) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<Tag, RepositoryError>;

    async fn find_by_id(&self, id: i32) -> Result<Tag, RepositoryError>;

    /// Exact name match. Absence is reported as [`RepositoryError::NotFound`].
    async fn find_by_name(&self, name: &str) -> Result<Tag, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Tag>, RepositoryError>;

    async fn update(&self, tag: Tag) -> Result<Tag, RepositoryError>;

    async fn delete(&self, id: i32) -> Result<(), RepositoryError>;
}
