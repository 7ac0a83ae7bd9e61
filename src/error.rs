use thiserror::Error;

/// Failure modes for the trie family in this crate.
///
/// Every fallible operation raises one of these two kinds, per the
/// argument/state split: an `Argument` error is raised before any
/// mutation happens and leaves the structure untouched; a `State` error
/// means the operation has no meaningful result for the trie's current
/// contents (querying an empty trie, removing a key that isn't there).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TrieError {
    /// A supplied key, width, or byte string failed canonicalization.
    #[error("{0}")]
    Argument(String),

    /// The operation is not meaningful for the trie's current state.
    #[error("{0}")]
    State(String),
}

impl TrieError {
    pub(crate) fn out_of_range(value: u64, width: usize) -> Self {
        TrieError::Argument(format!(
            "value {value} is out of range for a {width}-bit universe"
        ))
    }

    pub(crate) fn bad_width(width: usize) -> Self {
        TrieError::Argument(format!(
            "universe width must be in 1..=64, got {width}"
        ))
    }

    pub(crate) fn overlong_bytes(len: usize, width: usize) -> Self {
        TrieError::Argument(format!(
            "byte string of length {len} exceeds ceil({width}/8) bytes for a {width}-bit universe"
        ))
    }

    pub(crate) fn empty() -> Self {
        TrieError::State("the trie is empty".to_string())
    }

    pub(crate) fn absent(value: u64) -> Self {
        TrieError::State(format!("key {value} is not present"))
    }
}

pub type Result<T> = std::result::Result<T, TrieError>;
