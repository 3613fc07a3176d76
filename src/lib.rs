#![forbid(unsafe_code, rust_2018_idioms)]

mod engine;
pub use crate::engine::{DiskUsage, DuOptions, RootUsage, Summary};

mod error;
pub use crate::error::{DuError, Result};

mod format;
pub use format::*;

mod oracle;
pub use oracle::*;

mod stack;
pub use stack::PathStack;

mod state;
mod worker;
