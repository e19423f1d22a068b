//! Sequential reconciliation driver.

use std::path::PathBuf;

use bibfresh_bib::{self as bib, BibError, Entry};
use thiserror::Error;

use crate::lookup::LookupBackend;
use crate::reconcile::reconcile;
use crate::report::{RunReport, RunSummary};
use crate::ProgressEvent;

/// Paths for one reconciliation run, built by the caller. No process-wide
/// globals.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub bib_file: PathBuf,
    pub output_file: PathBuf,
}

/// Fatal run failures. Per-entry lookup misses are not errors; they surface
/// in the report instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to read {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: BibError,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: BibError,
    },
}

/// Load, reconcile entry-by-entry, save, and emit the audit report.
///
/// Entries are processed strictly one at a time in input order; the lookup
/// client's courtesy delay between requests is the global rate limiter, so
/// there is never more than one lookup in flight.
pub async fn run(
    config: &RunConfig,
    backend: &dyn LookupBackend,
    progress: impl Fn(ProgressEvent),
) -> Result<RunSummary, RunError> {
    let entries = bib::load(&config.bib_file).map_err(|source| RunError::Load {
        path: config.bib_file.clone(),
        source,
    })?;
    let total = entries.len();
    tracing::info!(
        path = %config.bib_file.display(),
        entries = total,
        backend = backend.name(),
        "starting reconciliation"
    );

    let mut report = RunReport::default();
    let mut updated: Vec<Entry> = Vec::with_capacity(total);

    for (index, entry) in entries.iter().enumerate() {
        progress(ProgressEvent::Checking {
            index,
            total,
            key: entry.key.clone(),
        });

        let candidate = match entry.title() {
            Some(title) => backend.lookup(title).await,
            None => None,
        };

        let outcome = reconcile(entry, candidate);
        progress(ProgressEvent::Result {
            index,
            total,
            key: entry.key.clone(),
            classification: outcome.classification,
        });
        report.record(entry.key.clone(), outcome.classification, outcome.diff);
        updated.push(outcome.entry);
    }

    bib::save(&config.output_file, &updated).map_err(|source| RunError::Save {
        path: config.output_file.clone(),
        source,
    })?;
    report.emit();

    Ok(report.summary())
}
