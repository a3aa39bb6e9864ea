/// Errors from PNG decode sessions.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PngReadError {
    #[error("invalid stream: {0}")]
    InvalidStream(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("truncated source: requested {requested} bytes, got {received}")]
    TruncatedSource { requested: usize, received: usize },

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("decode failure: {0}")]
    DecodeFailure(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: crate::PixelLayout,
        actual: Option<crate::PixelLayout>,
    },
}
