use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Maximum accepted identifier length. Published ids are 11 characters, but
/// the boundary accepts anything in the id alphabet up to this cap.
pub const MAX_VIDEO_ID_LEN: usize = 64;

/// Validated media identifier.
///
/// The alphabet is restricted to `[A-Za-z0-9_-]`, which keeps derived
/// filenames and watch URLs free of characters that would need escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyVideoId);
        }
        if value.len() > MAX_VIDEO_ID_LEN {
            return Err(ValidationError::VideoIdTooLong {
                len: value.len(),
                max: MAX_VIDEO_ID_LEN,
            });
        }

        for (index, ch) in value.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() && ch != '_' && ch != '-' {
                return Err(ValidationError::VideoIdInvalidChar { ch, index });
            }
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL handed to sources that take a URL instead of a
    /// bare id.
    pub fn watch_url(&self) -> String {
        format!(
            "https://www.youtube.com/watch?v={}",
            urlencoding::encode(&self.0)
        )
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
