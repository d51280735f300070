//! Third source: a hosted conversion API.
//!
//! The collaborator takes a watch URL and answers with a short-lived download
//! URL for the extracted audio. The endpoint is configurable; the declared
//! media type is a hardcoded `audio/mpeg` guess, matching what the service
//! advertises but never verified against the actual bytes.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::media_source::{AudioPayload, FetchRequest, MediaSource, SourceError, SourceFuture};
use crate::{FetchConfig, ProviderId};

const DECLARED_MEDIA_TYPE: &str = "audio/mpeg";

pub struct ConverterAdapter {
    client: OnceLock<reqwest::Client>,
    endpoint: String,
}

impl ConverterAdapter {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            client: OnceLock::new(),
            endpoint: config.converter_url.clone(),
        }
    }

    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(reqwest::Client::new)
    }
}

impl MediaSource for ConverterAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Converter
    }

    fn fetch<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a> {
        Box::pin(async move {
            let body = serde_json::json!({
                "url": req.video_id.watch_url(),
                "isAudioOnly": true,
                "aFormat": "mp3",
            });

            let response = self
                .client()
                .post(&self.endpoint)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            if !response.status().is_success() {
                return Err(SourceError::unavailable(format!(
                    "converter returned status {}",
                    response.status()
                )));
            }

            let ticket: ConvertResponse = response
                .json()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            let url = ticket.download_url().map_err(SourceError::unavailable)?;

            log::debug!("[{}] converter issued a download url", req.request_id);

            let download = self
                .client()
                .get(url)
                .send()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            if !download.status().is_success() {
                return Err(SourceError::unavailable(format!(
                    "converted download returned status {}",
                    download.status()
                )));
            }

            let bytes = download
                .bytes()
                .await
                .map_err(|error| SourceError::unavailable(error.to_string()))?;
            Ok(AudioPayload::new(bytes.to_vec(), DECLARED_MEDIA_TYPE))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    status: Option<String>,
    url: Option<String>,
    text: Option<String>,
}

impl ConvertResponse {
    fn download_url(&self) -> Result<&str, String> {
        let usable = matches!(
            self.status.as_deref(),
            Some("stream") | Some("redirect") | Some("success")
        );
        if !usable {
            return Err(self
                .text
                .clone()
                .unwrap_or_else(|| String::from("converter rejected the request")));
        }
        self.url
            .as_deref()
            .ok_or_else(|| String::from("converter response carries no download url"))
    }
}
