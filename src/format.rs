use std::fmt;
use std::path::Path;

use number_prefix::NumberPrefix;

/// Formats a byte count for human readability using binary prefixes
///
/// # Examples
/// ```rust
/// # use pdu::BinarySize;
/// assert_eq!("0",     format!("{}", BinarySize(0)));
/// assert_eq!("512",   format!("{}", BinarySize(512)));
/// assert_eq!("1.0Ki", format!("{}", BinarySize(1_024)));
/// assert_eq!("1.5Ki", format!("{}", BinarySize(1_536)));
/// assert_eq!("3.0Mi", format!("{}", BinarySize(3 * 1_024 * 1_024)));
/// ```
#[derive(Debug)]
pub struct BinarySize(pub u64);

impl fmt::Display for BinarySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NumberPrefix::binary(self.0 as f64) {
            NumberPrefix::Standalone(number) => write!(f, "{number:.0}"),
            NumberPrefix::Prefixed(prefix, number) => write!(f, "{number:.1}{prefix}"),
        }
    }
}

/// One `<size><TAB><path>` result line, without the trailing newline
///
/// # Examples
/// ```rust
/// # use pdu::UsageLine;
/// # use std::path::Path;
/// let line = UsageLine { blocks: 12, path: Path::new("src"), human_readable: false };
/// assert_eq!("12\tsrc", line.to_string());
/// let line = UsageLine { blocks: 12, path: Path::new("src"), human_readable: true };
/// assert_eq!("12.0Ki\tsrc", line.to_string());
/// ```
#[derive(Debug)]
pub struct UsageLine<'a> {
    pub blocks: u64,
    pub path: &'a Path,
    pub human_readable: bool,
}

impl fmt::Display for UsageLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.human_readable {
            write!(f, "{}\t{}", BinarySize(self.blocks * 1024), self.path.display())
        } else {
            write!(f, "{}\t{}", self.blocks, self.path.display())
        }
    }
}
