//! Stock quote and company logo lookup for a fixed list of companies.
//!
//! - `catalog` — the ordered company list a selection indexes into.
//! - `fetcher` — quote and logo requests against the provider REST API.
//! - `session` — selection changes, per-fetch cancellation and retry.
//! - `http` — the transport seam the fetcher talks through.
//! - `config` — `config.toml` / `.env` loading.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod schema;
pub mod session;

pub use catalog::{Catalog, Company};
pub use error::{FetchError, SessionError};
pub use fetcher::QuoteFetcher;
pub use schema::{Quote, Trend};
pub use session::{SelectionListener, Session};
