use thiserror::Error;

/// Validation errors exposed by `audiograb-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("video id cannot be empty")]
    EmptyVideoId,
    #[error("video id length {len} exceeds max {max}")]
    VideoIdTooLong { len: usize, max: usize },
    #[error("video id contains invalid character '{ch}' at index {index}")]
    VideoIdInvalidChar { ch: char, index: usize },

    #[error("invalid source '{value}', expected one of innertube, direct, converter, ytdlp")]
    InvalidSource { value: String },
}
