use std::io::Write;
use std::path::PathBuf;
use std::thread;

use indicatif::ProgressBar;
use log::{debug, error, info};

use crate::error::{DuError, Result};
use crate::oracle::Filesystem;
use crate::stack::PathStack;
use crate::state::{Shared, State};
use crate::worker::Worker;

#[derive(Debug, Clone)]
pub struct DuOptions {
    /// Number of worker threads in the pool.
    pub workers: usize,
    /// Print sizes with binary prefixes instead of raw KiB blocks.
    pub human_readable: bool,
    /// Glob patterns matched against entry names; matches are skipped.
    pub exclude: Vec<String>,
}

impl Default for DuOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            human_readable: false,
            exclude: Vec::new(),
        }
    }
}

/// Total for one root, in 1 KiB blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootUsage {
    pub path: PathBuf,
    pub blocks: u64,
}

#[derive(Debug, Default)]
pub struct Summary {
    /// Per-root totals, in the order they were reported.
    pub roots: Vec<RootUsage>,
    /// Lookup and listing failures that were skipped over.
    pub errors: u64,
}

impl Summary {
    pub fn errors_total(&self) -> u64 {
        self.errors
    }

    /// Process exit status: zero only when nothing went wrong.
    pub fn exit_code(&self) -> i32 {
        self.errors.min(255) as i32
    }
}

/// A disk usage run over one or more roots.
///
/// Roots are measured one at a time and reported last-pushed first.
pub struct DiskUsage {
    options: DuOptions,
    roots: PathStack,
    progress: ProgressBar,
}

impl DiskUsage {
    pub fn new(options: DuOptions) -> DiskUsage {
        DiskUsage {
            options,
            roots: PathStack::new(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Start from a batch of roots; the last one is measured first.
    pub fn with_roots<I>(options: DuOptions, roots: I) -> DiskUsage
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        DiskUsage {
            options,
            roots: roots.into_iter().map(Into::into).collect(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Advanced once per directory listed.
    pub fn progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Measure every root, writing one line per root to `out` as it
    /// completes.
    pub fn run<F, W>(self, fs: &F, out: W) -> Result<Summary>
    where
        F: Filesystem,
        W: Write + Send,
    {
        let workers = self.options.workers;
        if workers == 0 {
            return Err(DuError::InvalidWorkers);
        }
        let first = self.roots.peek_owned().ok_or(DuError::NoRoots)?;
        info!(
            "Measuring {} root(s) with {} worker(s)",
            self.roots.len(),
            workers
        );

        let mut pending = PathStack::new();
        pending.push(first);
        let shared = Shared::new(
            State::new(pending, self.roots, out, self.options.human_readable),
            workers,
        );

        let outcome = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            let mut outcome = Ok(());
            for id in 0..workers {
                let worker = Worker::new(id, &shared, fs, &self.options.exclude, &self.progress);
                let spawned = thread::Builder::new()
                    .name(format!("pdu-worker-{id}"))
                    .spawn_scoped(scope, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        error!("Could not spawn worker {}: {}", id, err);
                        shared.halt();
                        outcome = Err(DuError::Spawn(err));
                        break;
                    }
                }
            }

            for (id, handle) in handles.into_iter().enumerate() {
                let joined = handle
                    .join()
                    .unwrap_or(Err(DuError::WorkerPanicked { id }));
                if let Err(err) = joined {
                    debug!("Worker {} failed: {}", id, err);
                    if outcome.is_ok() {
                        outcome = Err(err);
                    }
                }
            }
            outcome
        });
        self.progress.finish_and_clear();
        outcome?;

        let state = shared.into_state();
        Ok(Summary {
            roots: state.finished,
            errors: state.errors,
        })
    }
}
