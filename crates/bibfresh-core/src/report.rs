//! Per-run audit accumulator.

use crate::reconcile::DiffRecord;
use crate::Classification;

/// Ordered entry keys per classification, plus the diff payloads of changed
/// entries. Write-only from the reconciler's perspective: nothing here feeds
/// back into entry transformation.
#[derive(Debug, Default)]
pub struct RunReport {
    changed: Vec<String>,
    unchanged: Vec<String>,
    no_title: Vec<String>,
    not_found: Vec<String>,
    diffs: Vec<(String, DiffRecord)>,
}

/// Counts for the console summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub no_title: usize,
    pub not_found: usize,
}

impl RunReport {
    pub fn record(&mut self, key: String, classification: Classification, diff: Option<DiffRecord>) {
        if let Some(diff) = diff {
            self.diffs.push((key.clone(), diff));
        }
        match classification {
            Classification::Changed => self.changed.push(key),
            Classification::Unchanged => self.unchanged.push(key),
            Classification::NoTitle => self.no_title.push(key),
            Classification::NotFound => self.not_found.push(key),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.changed.len()
                + self.unchanged.len()
                + self.no_title.len()
                + self.not_found.len(),
            changed: self.changed.len(),
            unchanged: self.unchanged.len(),
            no_title: self.no_title.len(),
            not_found: self.not_found.len(),
        }
    }

    /// Write the summary block and the per-entry audit trail to the log.
    pub fn emit(&self) {
        tracing::info!("=== BibTeX update summary ===");
        tracing::info!("changed ({}): {:?}", self.changed.len(), self.changed);
        tracing::info!("unchanged ({}): {:?}", self.unchanged.len(), self.unchanged);
        tracing::info!("no title ({}): {:?}", self.no_title.len(), self.no_title);
        tracing::info!(
            "not found on DBLP ({}): {:?}",
            self.not_found.len(),
            self.not_found
        );
        tracing::info!("=============================");

        for key in &self.changed {
            tracing::info!("{key} has been changed (details in the output file)");
        }
        for (key, diff) in &self.diffs {
            for (field, change) in diff {
                tracing::debug!(
                    "{key}.{field}: {:?} -> {:?}",
                    change.old.as_deref().unwrap_or(""),
                    change.new
                );
            }
        }
        for key in &self.unchanged {
            tracing::info!("{key} matches DBLP");
        }
        for key in &self.no_title {
            tracing::warn!("{key} has no title and was skipped");
        }
        for key in &self.not_found {
            tracing::warn!("{key} not found on DBLP");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::FieldChange;

    #[test]
    fn summary_counts_every_bucket() {
        let mut report = RunReport::default();
        report.record("a".into(), Classification::Changed, Some(DiffRecord::new()));
        report.record("b".into(), Classification::Unchanged, None);
        report.record("c".into(), Classification::Unchanged, None);
        report.record("d".into(), Classification::NoTitle, None);
        report.record("e".into(), Classification::NotFound, None);

        let summary = report.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.no_title, 1);
        assert_eq!(summary.not_found, 1);
    }

    #[test]
    fn diff_payloads_are_kept_per_key() {
        let mut diff = DiffRecord::new();
        diff.insert(
            "author".into(),
            FieldChange {
                old: Some("X".into()),
                new: "Y".into(),
            },
        );
        let mut report = RunReport::default();
        report.record("a1".into(), Classification::Changed, Some(diff));

        assert_eq!(report.diffs.len(), 1);
        assert_eq!(report.diffs[0].0, "a1");
        assert_eq!(report.diffs[0].1["author"].new, "Y");
    }
}
