use std::io;

use thiserror::Error;

/// Failures while reading or writing a TIFF container.
#[derive(Debug, Error)]
pub enum TiffError {
    /// The container structure is not a valid TIFF.
    #[error("not a valid TIFF: {0}")]
    Malformed(&'static str),

    /// A directory entry declares a field type outside the known set.
    #[error("unsupported field type {0}")]
    UnsupportedType(u16),

    /// A read reached past the end of the buffered file.
    #[error("read of {len} bytes at offset {offset} exceeds buffer of {size} bytes")]
    OutOfRange { offset: usize, len: usize, size: usize },

    /// The caller's stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The image decoder rejected the re-serialized stream.
    #[error("image error: {0}")]
    Image(#[from] ::image::ImageError),
}

impl TiffError {
    pub(crate) fn out_of_range(offset: usize, len: usize, size: usize) -> Self {
        Self::OutOfRange { offset, len, size }
    }
}
