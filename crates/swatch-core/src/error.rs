use std::io;

/// Errors raised while reading, writing or manipulating palettes.
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    /// Malformed header, signature, count or numeric field.
    #[error("invalid palette data: {0}")]
    InvalidData(String),

    /// Adobe swatch stored in a color space that cannot be converted to RGB.
    #[error("color space {0} is not supported")]
    UnsupportedColorSpace(u16),

    /// The codec cannot perform the requested operation (e.g. writing a read-only format).
    #[error("{codec} does not support {operation}")]
    UnsupportedOperation {
        codec: &'static str,
        operation: &'static str,
    },

    /// No codec is able to write the requested destination.
    #[error("no palette codec can write '{0}'")]
    UnsupportedFormat(String),

    /// No codec recognised the source, or a lookup missed.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("index {index} is out of range for a collection of {len} colors")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PaletteError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PaletteError::InvalidData(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PaletteError>;
