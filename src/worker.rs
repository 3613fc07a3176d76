//! Worker thread logic for parallel disk usage
//!
//! Each worker:
//! - Pops a directory from the shared pending stack
//! - Drops the lock, then lists the directory and sums its plain entries
//! - Pushes subdirectories back onto the pending stack for any worker
//! - Folds the directory's own contribution into the running total
//!
//! When the stack runs dry a worker goes to sleep. The last one to fall
//! asleep has proven the current root quiescent, reports it and either
//! seeds the next root or wakes everybody up to exit.

use std::ffi::OsStr;
use std::io::Write;
use std::path::PathBuf;
use std::sync::MutexGuard;

use glob_match::glob_match;
use indicatif::ProgressBar;
use log::{debug, error, trace};

use crate::error::{DuError, Result};
use crate::oracle::Filesystem;
use crate::state::{Shared, State};

pub(crate) struct Worker<'a, F, W> {
    id: usize,
    shared: &'a Shared<W>,
    fs: &'a F,
    exclude: &'a [String],
    progress: &'a ProgressBar,
}

impl<'a, F: Filesystem, W: Write> Worker<'a, F, W> {
    pub fn new(
        id: usize,
        shared: &'a Shared<W>,
        fs: &'a F,
        exclude: &'a [String],
        progress: &'a ProgressBar,
    ) -> Self {
        Self {
            id,
            shared,
            fs,
            exclude,
            progress,
        }
    }

    /// Work until every root has been reported or the pool is halted.
    pub fn run(&self) -> Result<()> {
        let _halt_on_panic = HaltOnPanic(self.shared);
        let workers = self.shared.workers();
        debug!("Worker {} starting", self.id);

        let mut state = self.shared.lock();
        loop {
            if state.halted {
                debug!("Worker {} halted", self.id);
                return Ok(());
            }

            if let Some(path) = state.pending.pop() {
                let blocks = self.expand(state, path)?;
                state = self.shared.lock();
                state.total += blocks;
                continue;
            }

            state.sleeping += 1;
            if state.sleeping == workers {
                // Everyone is asleep and nothing is pending: the root is done.
                if let Err(err) = state.finalize_root() {
                    drop(state);
                    return self.report(DuError::Output(err));
                }
                match state.roots.peek_owned() {
                    Some(next) => {
                        state.pending.push(next);
                        if workers == 1 {
                            state.sleeping -= 1;
                            continue;
                        }
                        self.shared.wake_one();
                    }
                    None => {
                        self.shared.wake_all();
                        debug!("Worker {} finished last root", self.id);
                        return Ok(());
                    }
                }
            }

            loop {
                state = self.shared.wait(state);
                if state.halted {
                    return Ok(());
                }
                if !state.pending.is_empty() {
                    state.sleeping -= 1;
                    break;
                }
                if state.sleeping == workers {
                    debug!("Worker {} exiting", self.id);
                    return Ok(());
                }
            }
        }
    }

    /// Blocks owned by `path` itself plus its non-directory entries.
    ///
    /// Entered with the lock held and returns with it released; the guard is
    /// consumed so no I/O below can happen under the lock. Subdirectories are
    /// pushed for later expansion and are not part of the returned count.
    /// Fails only on errors that halt the pool.
    fn expand(&self, held: MutexGuard<'_, State<W>>, path: PathBuf) -> Result<u64> {
        drop(held);
        trace!("Worker {} expanding {}", self.id, path.display());

        let info = match self.fs.query(&path) {
            Ok(info) => info,
            Err(source) => {
                self.report(DuError::Lookup { path, source })?;
                return Ok(0);
            }
        };
        if !info.is_dir {
            return Ok(info.blocks);
        }

        let entries = match self.fs.list(&path) {
            Ok(entries) => entries,
            Err(source) => {
                self.report(DuError::ReadDir { path, source })?;
                return Ok(info.blocks);
            }
        };
        self.progress.inc(1);

        let mut blocks = info.blocks;
        for name in entries {
            let name = match name {
                Ok(name) => name,
                Err(source) => {
                    self.report(DuError::ReadDir {
                        path: path.clone(),
                        source,
                    })?;
                    break;
                }
            };
            if self.is_excluded(&name) {
                trace!("Skipping excluded {}", path.join(&name).display());
                continue;
            }

            let child = path.join(&name);
            match self.fs.query(&child) {
                Ok(child_info) if child_info.is_dir => self.shared.push_pending(child),
                Ok(child_info) => blocks += child_info.blocks,
                Err(source) => self.report(DuError::Lookup {
                    path: child,
                    source,
                })?,
            }
        }
        Ok(blocks)
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let name = name.to_string_lossy();
        self.exclude
            .iter()
            .any(|pattern| glob_match(pattern, &name))
    }

    /// Tally a recoverable failure and carry on, or halt the pool and hand
    /// the error back. Must be called without the lock held.
    fn report(&self, err: DuError) -> Result<()> {
        error!("{}", err);
        if err.is_recoverable() {
            self.shared.record_error();
            Ok(())
        } else {
            self.shared.halt();
            Err(err)
        }
    }
}

/// Halts the pool if the owning worker unwinds, so nobody waits forever for
/// it to fall asleep.
struct HaltOnPanic<'a, W: Write>(&'a Shared<W>);

impl<W: Write> Drop for HaltOnPanic<'_, W> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LocalFilesystem;
    use crate::stack::PathStack;
    use std::io;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn report_tallies_recoverable_and_halts_on_fatal() {
        let shared = Shared::new(
            State::new(PathStack::new(), PathStack::new(), io::sink(), false),
            2,
        );
        let progress = ProgressBar::hidden();
        let worker = Worker::new(0, &shared, &LocalFilesystem, &[], &progress);

        let lookup = DuError::Lookup {
            path: PathBuf::from("gone"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(worker.report(lookup).is_ok());
        assert!(!shared.lock().halted);

        let output = DuError::Output(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(matches!(worker.report(output), Err(DuError::Output(_))));

        let state = shared.into_state();
        assert_eq!(state.errors, 1);
        assert!(state.halted);
    }

    #[test]
    fn halt_releases_workers_of_a_partial_pool() -> io::Result<()> {
        let tmp_dir = TempDir::new()?;
        let root = tmp_dir.path().to_path_buf();
        let roots: PathStack = [root.clone()].into_iter().collect();
        let mut pending = PathStack::new();
        pending.push(root);

        // Sized for three workers, but only two ever start
        let shared = Shared::new(State::new(pending, roots, io::sink(), false), 3);
        let progress = ProgressBar::hidden();
        let outcomes = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|id| {
                    let worker = Worker::new(id, &shared, &LocalFilesystem, &[], &progress);
                    scope.spawn(move || worker.run())
                })
                .collect();
            while shared.lock().sleeping < 2 {
                thread::yield_now();
            }
            shared.halt();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert!(outcomes.iter().all(|outcome| outcome.is_ok()));
        let state = shared.into_state();
        assert!(state.finished.is_empty());
        assert_eq!(state.roots.len(), 1);
        Ok(())
    }
}
