//! HTTP client for the DBLP search and record endpoints.

use std::future::Future;
use std::time::Duration;

use bibfresh_bib::Entry;

use crate::DblpError;
use crate::backoff::{Backoff, COURTESY_DELAY, TRANSIENT_DELAY};

pub const DEFAULT_BASE_URL: &str = "https://dblp.org";

const USER_AGENT: &str = concat!("bibfresh/", env!("CARGO_PKG_VERSION"));

pub struct DblpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    backoff: Backoff,
    courtesy_delay: Duration,
}

impl DblpClient {
    pub fn new(timeout: Duration) -> Result<Self, DblpError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
            backoff: Backoff::default(),
            courtesy_delay: COURTESY_DELAY,
        })
    }

    /// Point the client at a different host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the courtesy delay (tests).
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    /// Look up the canonical DBLP record for `title`.
    ///
    /// Returns the complete record of the first search hit, or `None` when
    /// DBLP has no match. Failures never escape: a 429 backs off on the
    /// `2^attempt + 1` schedule, any other failure is logged and retried
    /// after a fixed pause, and exhausting the attempt bound degrades to
    /// `None` so one bad title cannot abort a run.
    pub async fn lookup(&self, title: &str) -> Option<Entry> {
        with_retry(self.backoff, title, || self.try_lookup(title)).await
    }

    async fn try_lookup(&self, title: &str) -> Result<Option<Entry>, DblpError> {
        let Some(key) = self.search(title).await? else {
            return Ok(None);
        };
        self.fetch_record(&key).await
    }

    /// Search the publication API and return the top hit's DBLP key.
    async fn search(&self, title: &str) -> Result<Option<String>, DblpError> {
        self.pause().await;
        let url = format!(
            "{}/search/publ/api?q={}&format=json",
            self.base_url,
            urlencoding::encode(title)
        );
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(DblpError::RateLimited);
        }
        if !status.is_success() {
            return Err(DblpError::SearchStatus(status));
        }

        let data: serde_json::Value = resp.json().await?;
        Ok(first_hit_key(&data))
    }

    /// Fetch and parse the BibTeX record for a DBLP key.
    async fn fetch_record(&self, key: &str) -> Result<Option<Entry>, DblpError> {
        self.pause().await;
        let url = format!("{}/rec/{}.bib", self.base_url, key);
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(key, status = %status, "DBLP record fetch failed");
            return Ok(None);
        }

        let body = resp.text().await?;
        let entries = bibfresh_bib::parse_str(&body)?;
        // DBLP serves one record per key; take the first defensively.
        Ok(entries.into_iter().next())
    }

    /// Courtesy pause before every request to dblp.org, unconditional.
    async fn pause(&self) {
        tokio::time::sleep(self.courtesy_delay).await;
    }
}

/// Run one lookup under the bounded retry schedule.
///
/// `Ok` returns immediately, found or not. 429s wait the exponential delay,
/// any other failure waits [`TRANSIENT_DELAY`]; both count against the
/// attempt bound, and exhausting it degrades to `None`.
pub(crate) async fn with_retry<F, Fut>(backoff: Backoff, title: &str, mut op: F) -> Option<Entry>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<Entry>, DblpError>>,
{
    for attempt in 0..backoff.max_attempts {
        match op().await {
            Ok(found) => return found,
            Err(DblpError::RateLimited) => {
                let wait = backoff.delay(attempt);
                tracing::warn!(
                    title,
                    attempt,
                    wait_secs = wait.as_secs(),
                    "DBLP rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
            }
            Err(error) => {
                tracing::warn!(title, attempt, error = %error, "DBLP lookup failed");
                tokio::time::sleep(TRANSIENT_DELAY).await;
            }
        }
    }
    tracing::warn!(
        title,
        attempts = backoff.max_attempts,
        "giving up on DBLP lookup"
    );
    None
}

/// Extract the first hit's key from a search API response
/// (`result.hits.hit[0].info.key`).
fn first_hit_key(data: &serde_json::Value) -> Option<String> {
    data["result"]["hits"]["hit"]
        .as_array()
        .and_then(|hits| hits.first())
        .and_then(|hit| hit["info"]["key"].as_str())
        .map(String::from)
}
