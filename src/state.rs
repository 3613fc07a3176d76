//! State shared by every worker in the pool
//!
//! One mutex guards all of it: both queues, the running total, the sleep
//! count, the error tally and the output sink. The condition variable is
//! signalled once per newly pushed directory and broadcast when the pool
//! is done or halted.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use log::info;

use crate::engine::RootUsage;
use crate::format::UsageLine;
use crate::stack::PathStack;

pub(crate) struct State<W> {
    /// Directories discovered but not yet expanded.
    pub pending: PathStack,
    /// Roots not yet reported; the top one is being measured.
    pub roots: PathStack,
    /// Blocks counted so far for the current root.
    pub total: u64,
    /// Workers parked on the condition variable (or about to be).
    pub sleeping: usize,
    pub errors: u64,
    /// Set on a fatal error; every worker returns as soon as it sees it.
    pub halted: bool,
    pub finished: Vec<RootUsage>,
    out: W,
    human_readable: bool,
}

impl<W: Write> State<W> {
    pub fn new(pending: PathStack, roots: PathStack, out: W, human_readable: bool) -> Self {
        Self {
            pending,
            roots,
            total: 0,
            sleeping: 0,
            errors: 0,
            halted: false,
            finished: Vec::new(),
            out,
            human_readable,
        }
    }

    /// Report the running total against the current root and start over.
    ///
    /// Only valid at quiescence: nothing pending and every worker asleep.
    pub fn finalize_root(&mut self) -> io::Result<()> {
        let Some(path) = self.roots.pop() else {
            return Ok(());
        };
        let blocks = std::mem::take(&mut self.total);
        let line = UsageLine {
            blocks,
            path: &path,
            human_readable: self.human_readable,
        };
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        info!("Finished {} ({} blocks)", path.display(), blocks);
        self.finished.push(RootUsage { path, blocks });
        Ok(())
    }
}

pub(crate) struct Shared<W> {
    state: Mutex<State<W>>,
    wake: Condvar,
    workers: usize,
}

impl<W: Write> Shared<W> {
    pub fn new(state: State<W>, workers: usize) -> Self {
        Self {
            state: Mutex::new(state),
            wake: Condvar::new(),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// A panicking worker halts the pool before anyone else can observe
    /// the poisoned lock, so the state behind it is still consistent.
    pub fn lock(&self) -> MutexGuard<'_, State<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park until signalled, releasing the lock meanwhile.
    pub fn wait<'a>(&self, guard: MutexGuard<'a, State<W>>) -> MutexGuard<'a, State<W>> {
        self.wake
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wake_one(&self) {
        self.wake.notify_one();
    }

    pub fn wake_all(&self) {
        self.wake.notify_all();
    }

    /// Hand a freshly discovered directory to whichever worker gets to it.
    pub fn push_pending(&self, path: PathBuf) {
        let mut state = self.lock();
        state.pending.push(path);
        self.wake.notify_one();
    }

    pub fn record_error(&self) {
        self.lock().errors += 1;
    }

    pub fn halt(&self) {
        let mut state = self.lock();
        state.halted = true;
        self.wake.notify_all();
    }

    pub fn into_state(self) -> State<W> {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
