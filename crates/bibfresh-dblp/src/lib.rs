//! Online DBLP lookup client.
//!
//! Searches dblp.org by publication title, takes the top hit, and fetches its
//! canonical BibTeX record. Requests are spaced by a mandatory courtesy delay
//! and retried under a bounded backoff schedule on rate limiting.

mod backoff;
mod client;

pub use backoff::{Backoff, COURTESY_DELAY, MAX_ATTEMPTS, TRANSIENT_DELAY};
pub use client::{DEFAULT_BASE_URL, DblpClient};

use thiserror::Error;

/// A single failed lookup attempt. Never escapes [`DblpClient::lookup`]:
/// every variant is retried and ultimately degrades to "no result".
#[derive(Error, Debug)]
pub enum DblpError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited (429)")]
    RateLimited,
    #[error("search returned HTTP {0}")]
    SearchStatus(reqwest::StatusCode),
    #[error("record parse error: {0}")]
    Record(#[from] bibfresh_bib::BibError),
}
