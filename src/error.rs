//! Error types for buffer access.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot move {distance} bytes from offset {position}")]
    OutOfBounds { position: usize, distance: isize },

    #[error("pattern not found before the end of the buffer")]
    PatternNotFound,

    #[error("could not grow output buffer: {0}")]
    Alloc(#[from] TryReserveError),
}

impl Error {
    /// True if a read, skip or seek ran past either end of the buffer.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
