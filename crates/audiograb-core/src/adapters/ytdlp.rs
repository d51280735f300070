//! Last-resort source: the yt-dlp executable.
//!
//! The child writes the audio stream to stdout and diagnostics to stderr.
//! Success requires a zero exit status and non-empty stdout. The handle is
//! spawned with `kill_on_drop` so an abandoned attempt (caller disconnect,
//! stage timeout) reaps the process instead of leaking it.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::media_source::{AudioPayload, FetchRequest, MediaSource, SourceError, SourceFuture};
use crate::{FetchConfig, ProviderId};

const DECLARED_MEDIA_TYPE: &str = "audio/mpeg";

pub struct YtdlpAdapter {
    binary: PathBuf,
}

impl YtdlpAdapter {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            binary: config.ytdlp_path.clone(),
        }
    }
}

impl MediaSource for YtdlpAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Ytdlp
    }

    fn fetch<'a>(&'a self, req: &'a FetchRequest) -> SourceFuture<'a> {
        Box::pin(async move {
            let url = req.video_id.watch_url();
            log::info!(
                "[{}] spawning {} --format bestaudio --output - {url}",
                req.request_id,
                self.binary.display(),
            );

            let child = Command::new(&self.binary)
                .args(["--format", "bestaudio", "--output", "-"])
                .arg(&url)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|error| {
                    SourceError::spawn_failed(format!(
                        "failed to start {}: {error}",
                        self.binary.display()
                    ))
                })?;

            let output = child
                .wait_with_output()
                .await
                .map_err(|error| SourceError::internal(error.to_string()))?;

            let stderr = String::from_utf8_lossy(&output.stderr);
            if !output.status.success() {
                return Err(SourceError::non_zero_exit(output.status.code(), &stderr));
            }
            if output.stdout.is_empty() {
                // Zero exit with nothing on stdout still means no audio.
                return Err(SourceError::empty_payload());
            }

            log::debug!(
                "[{}] yt-dlp produced {} bytes",
                req.request_id,
                output.stdout.len()
            );
            Ok(AudioPayload::new(output.stdout, DECLARED_MEDIA_TYPE))
        })
    }
}
