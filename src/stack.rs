use std::path::{Path, PathBuf};

/// LIFO of owned paths.
///
/// Backs both the pending-directory queue and the root queue. Entries are
/// moved in and moved out; nothing is shared between stacks.
///
/// # Examples
/// ```rust
/// # use pdu::PathStack;
/// let mut stack = PathStack::new();
/// stack.push("a".into());
/// stack.push("b".into());
/// assert_eq!(stack.peek().unwrap().to_str(), Some("b"));
/// assert_eq!(stack.pop().unwrap().to_str(), Some("b"));
/// assert_eq!(stack.pop().unwrap().to_str(), Some("a"));
/// assert!(stack.pop().is_none());
/// ```
#[derive(Debug, Default)]
pub struct PathStack {
    entries: Vec<PathBuf>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf) {
        self.entries.push(path);
    }

    pub fn pop(&mut self) -> Option<PathBuf> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&Path> {
        self.entries.last().map(PathBuf::as_path)
    }

    /// Duplicate of the top entry, leaving the stack untouched.
    pub fn peek_owned(&self) -> Option<PathBuf> {
        self.peek().map(|top| {
            let mut copy = PathBuf::with_capacity(top.as_os_str().len());
            copy.push(top);
            copy
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<PathBuf> for PathStack {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
