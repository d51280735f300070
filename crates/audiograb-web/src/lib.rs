//! HTTP boundary for audiograb.
//!
//! One endpoint does the real work: `GET /api/transcode?videoId=<id>`
//! validates the identifier, asks the gate for admission, runs the fallback
//! chain, and maps the outcome to a binary or structured-JSON response.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, AppState};
