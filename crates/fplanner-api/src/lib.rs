// FPL REST API access: HTTP client with response cache and relay fallback,
// behind the `FplSource` trait.

pub mod cache;
pub mod client;
pub mod error;
pub mod source;

pub use client::FplClient;
pub use error::ApiError;
pub use source::{FplSource, LeagueKind};
