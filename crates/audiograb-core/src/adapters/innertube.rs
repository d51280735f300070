//! Primary source: the innertube player API with Android client constants.
//!
//! This is the library-style strategy the chain tries first. It resolves the
//! best available audio format for the identifier and downloads it directly,
//! declaring the format's own mime type. A local rate budget keeps this
//! source from monopolizing the collaborator; exhausting the budget fails the
//! stage and lets the chain move on.

use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::media_source::{AudioPayload, FetchRequest, MediaSource, SourceError, SourceFuture};
use crate::throttling::{BackoffPolicy, SourceBudget};
use crate::{FetchConfig, ProviderId};

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";
const ANDROID_CLIENT_VERSION: &str = "19.09.37";
const ANDROID_USER_AGENT: &str =
    "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip";

pub struct InnertubeAdapter {
    client: OnceLock<reqwest::Client>,
    budget: SourceBudget,
}

impl InnertubeAdapter {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            client: OnceLock::new(),
            budget: SourceBudget::new(
                Duration::from_secs(1),
                config.innertube_quota,
                BackoffPolicy::default(),
            ),
        }
    }

    // Built on first use so an untried stage pays no client setup cost.
    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(|| {
            reqwest::Client::builder()
                .user_agent(ANDROID_USER_AGENT)
                .build()
                .expect("client builder uses only static settings")
        })
    }
}

impl MediaSource for InnertubeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Innertube
    }

    fn fetch<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a> {
        Box::pin(async move {
            if let Err(delay) = self.budget.acquire() {
                return Err(SourceError::rate_limited(format!(
                    "primary source budget exhausted, retry in {}s",
                    delay.as_secs().max(1)
                )));
            }

            let body = serde_json::json!({
                "videoId": req.video_id.as_str(),
                "context": {
                    "client": {
                        "clientName": "ANDROID",
                        "clientVersion": ANDROID_CLIENT_VERSION,
                        "androidSdkVersion": 30,
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
                .map_err(transport_error)?;
            if !response.status().is_success() {
                return Err(SourceError::unavailable(format!(
                    "player endpoint returned status {}",
                    response.status()
                )));
            }

            let player: PlayerResponse = response.json().await.map_err(transport_error)?;
            if let Some(status) = &player.playability_status {
                if status.status.as_deref() != Some("OK") {
                    let reason = status
                        .reason
                        .clone()
                        .unwrap_or_else(|| String::from("no reason given"));
                    return Err(SourceError::unavailable(format!(
                        "video is not playable: {reason}"
                    )));
                }
            }

            let format = best_audio_format(&player)
                .ok_or_else(|| SourceError::unavailable("no audio format offered"))?;
            let url = format
                .url
                .as_deref()
                .ok_or_else(|| SourceError::unavailable("audio format carries no direct url"))?;
            let media_type = essence(format.mime_type.as_deref());

            log::debug!(
                "[{}] innertube selected itag {:?} ({media_type})",
                req.request_id,
                format.itag,
            );

            let download = self
                .client()
                .get(url)
                .send()
                .await
                .map_err(transport_error)?;
            if !download.status().is_success() {
                return Err(SourceError::unavailable(format!(
                    "audio download returned status {}",
                    download.status()
                )));
            }

            let bytes = download.bytes().await.map_err(transport_error)?;
            Ok(AudioPayload::new(bytes.to_vec(), media_type))
        })
    }
}

fn best_audio_format(player: &PlayerResponse) -> Option<&AdaptiveFormat> {
    player
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
        .max_by_key(|format| format.bitrate.unwrap_or(0))
}

fn essence(mime_type: Option<&str>) -> String {
    mime_type
        .and_then(|mime| mime.split(';').next())
        .map(|mime| mime.trim().to_owned())
        .filter(|mime| !mime.is_empty())
        .unwrap_or_else(|| String::from("audio/mpeg"))
}

fn transport_error(error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::unavailable(format!("request timed out: {error}"))
    } else {
        SourceError::unavailable(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingData {
    #[serde(default)]
    adaptive_formats: Vec<AdaptiveFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdaptiveFormat {
    itag: Option<u32>,
    url: Option<String>,
    mime_type: Option<String>,
    bitrate: Option<u64>,
}
