use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Redb(#[from] redb::Error),

    #[error("database open error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("database storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("database transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("database table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("database commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to extract text from {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("no text could be extracted from {0}")]
    EmptyDocument(PathBuf),

    #[error("model server unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("model request failed: {0}")]
    Request(String),

    #[error("malformed model server response: {0}")]
    Response(String),

    #[error("the index is empty; run `docmind index <DIR>` first")]
    EmptyIndex,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),
}
