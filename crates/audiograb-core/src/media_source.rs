//! Media source trait and request/response types.
//!
//! This module defines the adapter contract (`MediaSource`) that every
//! acquisition strategy implements, along with the request and payload types
//! shared across the pipeline. The trait uses boxed futures so adapters stay
//! object-safe behind `Arc<dyn MediaSource>`.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::{ProviderId, VideoId};

/// Boxed future returned by adapter attempts.
pub type SourceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AudioPayload, SourceError>> + Send + 'a>>;

/// One acquisition request, created at the boundary and immutable for its
/// duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub video_id: VideoId,
    /// Correlation id carried through every log line for this request.
    pub request_id: String,
}

impl FetchRequest {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// Raw audio bytes plus the media type the producing source declared.
///
/// The declared type is passed through untouched; for some sources it is a
/// known-unverified guess rather than an inspected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension suggested for download filenames, derived from the
    /// declared media type.
    pub fn preferred_extension(&self) -> &'static str {
        let essence = self
            .media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
            "audio/webm" => "webm",
            "audio/ogg" | "audio/opus" => "opus",
            // audio/mpeg and anything unrecognized
            _ => "mp3",
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    Timeout,
    SpawnFailed,
    NonZeroExit,
    EmptyPayload,
    InvalidRequest,
    Internal,
}

/// Structured source error recovered per stage by the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: format!("attempt exceeded the {}s time limit", limit.as_secs()),
            retryable: true,
        }
    }

    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::SpawnFailed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn non_zero_exit(code: Option<i32>, stderr: &str) -> Self {
        let code = code.map_or_else(|| String::from("signal"), |code| code.to_string());
        let detail = stderr.trim();
        let message = if detail.is_empty() {
            format!("process exited with code {code}")
        } else {
            format!("process exited with code {code}: {detail}")
        };
        Self {
            kind: SourceErrorKind::NonZeroExit,
            message,
            retryable: true,
        }
    }

    pub fn empty_payload() -> Self {
        Self {
            kind: SourceErrorKind::EmptyPayload,
            message: String::from("source produced an empty payload"),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::SpawnFailed => "source.spawn_failed",
            SourceErrorKind::NonZeroExit => "source.non_zero_exit",
            SourceErrorKind::EmptyPayload => "source.empty_payload",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source adapter contract.
///
/// Each implementation is one independent acquisition strategy. Adapters are
/// interchangeable from the chain's point of view: given an identifier they
/// either produce a payload or fail with a [`SourceError`]. Any adapter-local
/// resource (HTTP connection, child process) must be scoped so it is released
/// on every exit path, including when the returned future is dropped.
pub trait MediaSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Attempts to acquire audio for the request.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the collaborator is unreachable, rejects
    /// the identifier, exhausts its local rate budget, or produces unusable
    /// output.
    fn fetch<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_gets_a_correlation_id() {
        let id = VideoId::parse("dQw4w9WgXcQ").expect("valid id");
        let req = FetchRequest::new(id);
        assert!(!req.request_id.is_empty());
    }

    #[test]
    fn extension_follows_declared_media_type() {
        let cases = [
            ("audio/mpeg", "mp3"),
            ("audio/mp4; codecs=\"mp4a.40.2\"", "m4a"),
            ("audio/webm; codecs=\"opus\"", "webm"),
            ("audio/opus", "opus"),
            ("application/octet-stream", "mp3"),
        ];
        for (media_type, expected) in cases {
            let payload = AudioPayload::new(vec![1], media_type);
            assert_eq!(payload.preferred_extension(), expected, "{media_type}");
        }
    }

    #[test]
    fn non_zero_exit_includes_stderr_detail() {
        let error = SourceError::non_zero_exit(Some(1), "ERROR: unavailable\n");
        assert_eq!(error.kind(), SourceErrorKind::NonZeroExit);
        assert!(error.message().contains("code 1"));
        assert!(error.message().contains("ERROR: unavailable"));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SourceError::empty_payload().code(), "source.empty_payload");
        assert_eq!(
            SourceError::timeout(Duration::from_secs(90)).code(),
            "source.timeout"
        );
    }
}
