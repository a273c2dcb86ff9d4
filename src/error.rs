//! Error types for container extraction.
//!
//! Only failures that abort a whole archive surface here. Everything else
//! (bad chunks, unparseable text, unreadable entries) degrades in place and
//! is reported through the output records instead.

use thiserror::Error;

/// A Result alias over [`ExtractError`] to minimize repetition.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Failure opening or enumerating a container.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The container could not be opened or an entry header was unreadable.
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),

    /// An I/O failure outside any single entry's data stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
