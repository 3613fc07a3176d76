//! Error types for pdu
//!
//! Lookup and listing failures are recoverable: the worker that hits one
//! logs it, bumps the error tally and keeps walking. Everything else stops
//! the pool and comes back out of [`DiskUsage::run`](crate::DiskUsage::run).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuError {
    /// Metadata query for a path failed
    #[error("cannot access '{}': {source}", path.display())]
    Lookup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory could not be opened or read
    #[error("cannot read directory '{}': {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS refused to create a worker thread
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("worker {id} panicked")]
    WorkerPanicked { id: usize },

    /// Writing a result line failed
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error("no root paths given")]
    NoRoots,

    #[error("worker count must be at least 1")]
    InvalidWorkers,
}

impl DuError {
    /// Whether the traversal can carry on past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DuError::Lookup { .. } | DuError::ReadDir { .. })
    }
}

pub type Result<T> = std::result::Result<T, DuError>;
