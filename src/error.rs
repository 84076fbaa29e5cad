use thiserror::Error;

/// Errors reported by the legacy interface and the word stream.
#[derive(Debug, Error)]
pub enum Error {
    /// A 25 word save vector that no generator could have produced.
    #[error("invalid save vector: {reason}")]
    InvalidSaveVector { reason: String },

    /// The sink accepted fewer bytes than a block holds.
    #[error("short write: {written} of {expected} bytes written, {total} bytes in total")]
    ShortWrite { written: usize, expected: usize, total: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
