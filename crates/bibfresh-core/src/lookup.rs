//! Lookup backend seam between the driver and the DBLP client.

use std::future::Future;
use std::pin::Pin;

use bibfresh_bib::Entry;
use bibfresh_dblp::DblpClient;

/// A remote bibliographic database searchable by title.
///
/// `lookup` returns the canonical record for the title, or `None` when the
/// database has no match or the query degraded after retries. Implementations
/// must not fail the caller.
pub trait LookupBackend: Send + Sync {
    /// The canonical name of this database (e.g., "DBLP").
    fn name(&self) -> &str;

    fn lookup<'a>(
        &'a self,
        title: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<Entry>> + Send + 'a>>;
}

impl LookupBackend for DblpClient {
    fn name(&self) -> &str {
        "DBLP"
    }

    fn lookup<'a>(
        &'a self,
        title: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<Entry>> + Send + 'a>> {
        Box::pin(DblpClient::lookup(self, title))
    }
}
