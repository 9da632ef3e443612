use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by `GrowableBuffer` and its raw block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("capacity overflow: cannot lay out {requested} elements")]
    CapacityOverflow { requested: usize },
}

/// Misuse of a named `SharedHandle` slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle '{name}' was never given a value")]
    Empty { name: String },

    #[error("handle '{name}' was already released")]
    AlreadyReleased { name: String },
}

impl HandleError {
    pub fn empty(name: impl Into<String>) -> Self {
        Self::Empty { name: name.into() }
    }

    pub fn already_released(name: impl Into<String>) -> Self {
        Self::AlreadyReleased { name: name.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
