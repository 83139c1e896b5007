use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

//===========================================================================//

/// The error type for the ICO build pipeline.  Every failure is fatal to the
/// whole operation; there is no partial-success mode, and a partially
/// written output file must not be treated as valid.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The source image file could not be opened or read.
    #[error("failed to open {path}: {source}")]
    OpenFailed {
        /// Path of the source image.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source image data could not be decoded.
    #[error("failed to decode {path}: {reason}")]
    DecodeFailed {
        /// Path of the source image.
        path: PathBuf,
        /// What the decoder rejected.
        reason: String,
    },

    /// Resampling or encoding failed for one target size.
    #[error("failed to encode {size}x{size} rendition: {reason}")]
    EncodingFailed {
        /// The target size that failed.
        size: u32,
        /// What the resampler or encoder rejected.
        reason: String,
    },

    /// The output sink rejected a write.
    #[error("failed to write ICO data: {0}")]
    WriteFailed(#[from] io::Error),

    /// More renditions were requested than the 16-bit directory count can
    /// hold.
    #[error("too many icon entries (was {0}, but max is 65535)")]
    TooManyEntries(usize),
}

//===========================================================================//
