//! Second source: direct-protocol fetch with iOS client constants.
//!
//! Independent of the primary adapter on purpose: different client identity,
//! different format preference (smallest stream that is still audio), and the
//! media type is taken from the download response itself rather than from the
//! format listing.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::media_source::{AudioPayload, FetchRequest, MediaSource, SourceError, SourceFuture};
use crate::{FetchConfig, ProviderId};

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";
const IOS_CLIENT_VERSION: &str = "19.09.3";
const IOS_DEVICE_MODEL: &str = "iPhone14,3";
const FALLBACK_MEDIA_TYPE: &str = "audio/mpeg";

pub struct DirectAdapter {
    client: OnceLock<reqwest::Client>,
}

impl DirectAdapter {
    pub fn new(_config: &FetchConfig) -> Self {
        Self {
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(reqwest::Client::new)
    }
}

impl MediaSource for DirectAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Direct
    }

    fn fetch<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a> {
        Box::pin(async move {
            let body = serde_json::json!({
                "videoId": req.video_id.as_str(),
                "context": {
                    "client": {
                        "clientName": "IOS",
                        "clientVersion": IOS_CLIENT_VERSION,
                        "deviceModel": IOS_DEVICE_MODEL,
                        "hl": "en",
                    }
                }
            });

            let response = self
                .client()
                .post(PLAYER_ENDPOINT)
                .json(&body)
                .send()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            if !response.status().is_success() {
                return Err(SourceError::unavailable(format!(
                    "player endpoint returned status {}",
                    response.status()
                )));
            }

            let listing: StreamListing = response
                .json()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            let url = smallest_audio_stream(&listing)
                .ok_or_else(|| SourceError::unavailable("no downloadable audio stream"))?;

            let download = self
                .client()
                .get(url)
                .send()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            if !download.status().is_success() {
                return Err(SourceError::unavailable(format!(
                    "stream download returned status {}",
                    download.status()
                )));
            }

            let media_type = declared_content_type(&download);
            log::debug!(
                "[{}] direct stream resolved, content type {media_type}",
                req.request_id
            );

            let bytes = download
                .bytes()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            Ok(AudioPayload::new(bytes.to_vec(), media_type))
        })
    }
}

fn smallest_audio_stream(listing: &StreamListing) -> Option<&str> {
    listing
        .streaming_data
        .as_ref()?
        .adaptive_formats
        .iter()
        .filter(|format| {
            format
                .mime_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("audio/"))
        })
        .min_by_key(|format| format.content_length.unwrap_or(u64::MAX))
        .and_then(|format| format.url.as_deref())
}

fn declared_content_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| String::from(FALLBACK_MEDIA_TYPE))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamListing {
    streaming_data: Option<DirectStreamingData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectStreamingData {
    #[serde(default)]
    adaptive_formats: Vec<DirectFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectFormat {
    url: Option<String>,
    mime_type: Option<String>,
    #[serde(default, deserialize_with = "numeric_string")]
    content_length: Option<u64>,
}

// The listing reports contentLength as a decimal string.
fn numeric_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}
