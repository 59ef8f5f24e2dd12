//! Typed errors for the task store and the reconciliation engine.
//!
//! Command handlers wrap these in `anyhow::Error`; the engine itself keeps
//! them typed so callers can tell a missing task from a broken store.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(i32),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt task row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Outcomes that abort a reconciliation run before any store write.
///
/// An unreadable or non UTF-8 agenda file is one. The other is a store that
/// cannot load its snapshot: matching needs every live task, so the run
/// stops with [`ReconcileError::Store`] rather than producing a partial
/// report. Errors while applying a single task never end up here; they are
/// reported per task in the report's `failed` list.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("cannot read agenda file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("agenda file {path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    /// The task snapshot could not be loaded. Nothing was written.
    #[error("cannot load tasks: {0}")]
    Store(#[from] StoreError),
}
