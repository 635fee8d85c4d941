use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("question is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("user {user_id} already added {limit} questions")]
    QuotaExceeded { user_id: i64, limit: i64 },
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}
