//! Runtime configuration with environment overrides.

use std::path::PathBuf;
use std::time::Duration;

/// Fixed configuration for the acquisition pipeline and its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Ceiling for concurrent acquisition operations per process.
    pub max_concurrent: usize,
    /// Time limit applied to each source attempt.
    pub source_timeout: Duration,
    /// Path to the yt-dlp executable used by the subprocess source.
    pub ytdlp_path: PathBuf,
    /// Third-party converter API endpoint.
    pub converter_url: String,
    /// Retry interval advertised on capacity rejection.
    pub retry_after: Duration,
    /// Cache lifetime advertised on successful responses.
    pub cache_max_age: Duration,
    /// Per-second request budget for the primary (innertube) source.
    pub innertube_quota: u32,
    /// Listen address for the HTTP boundary.
    pub bind_addr: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            source_timeout: Duration::from_secs(90),
            ytdlp_path: PathBuf::from("/usr/local/bin/yt-dlp"),
            converter_url: String::from("https://co.wuk.sh/api/json"),
            retry_after: Duration::from_secs(10),
            cache_max_age: Duration::from_secs(86_400),
            innertube_quota: 2,
            bind_addr: String::from("0.0.0.0:3000"),
        }
    }
}

impl FetchConfig {
    /// Builds a config from the process environment, falling back to
    /// defaults for absent or malformed values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent: env_parsed("AUDIOGRAB_MAX_CONCURRENT", defaults.max_concurrent),
            source_timeout: Duration::from_secs(env_parsed(
                "AUDIOGRAB_SOURCE_TIMEOUT_SECS",
                defaults.source_timeout.as_secs(),
            )),
            ytdlp_path: std::env::var_os("YT_DLP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ytdlp_path),
            converter_url: env_string("CONVERTER_API_URL", defaults.converter_url),
            retry_after: defaults.retry_after,
            cache_max_age: defaults.cache_max_age,
            innertube_quota: env_parsed("AUDIOGRAB_INNERTUBE_QUOTA", defaults.innertube_quota),
            bind_addr: env_string("AUDIOGRAB_BIND_ADDR", defaults.bind_addr),
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

fn env_parsed<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring malformed {key}='{value}', using default");
            default
        }),
        Err(_) => default,
    }
}
