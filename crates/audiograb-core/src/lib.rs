//! Core contracts for audiograb.
//!
//! This crate contains:
//! - Validated identifiers and source ids
//! - The media source adapter contract and its adapters
//! - The ordered fallback chain
//! - The process-wide concurrency gate
//! - Runtime configuration

pub mod adapters;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod gate;
pub mod media_source;
pub mod source;
pub mod throttling;

pub use adapters::{ConverterAdapter, DirectAdapter, InnertubeAdapter, YtdlpAdapter};
pub use chain::{FallbackChain, FetchFailure, FetchOutcome, FetchSuccess, ProviderFailure};
pub use config::FetchConfig;
pub use domain::VideoId;
pub use error::ValidationError;
pub use gate::{ConcurrencyGate, GatePermit};
pub use media_source::{
    AudioPayload, FetchRequest, MediaSource, SourceError, SourceErrorKind, SourceFuture,
};
pub use source::ProviderId;
pub use throttling::{BackoffPolicy, SourceBudget};
