//! Field whitelisting, diffing, and the keep-or-replace decision.

use std::collections::BTreeMap;

use bibfresh_bib::Entry;

use crate::Classification;

/// Fields taken from a DBLP record when an entry is replaced. The citation
/// key and entry type are carried structurally, outside the field map.
pub const WHITELIST: [&str; 5] = ["author", "booktitle", "doi", "title", "year"];

/// A single field-level difference between local and remote values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Local value, if the field existed locally.
    pub old: Option<String>,
    /// Canonical DBLP value.
    pub new: String,
}

/// Changed field name -> old/new pair. Reporting only, never persisted.
pub type DiffRecord = BTreeMap<String, FieldChange>;

/// Outcome of reconciling one local entry.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub entry: Entry,
    pub classification: Classification,
    pub diff: Option<DiffRecord>,
}

/// Strip the surrounding brace/space wrapping BibTeX tools disagree on.
///
/// Shallow on purpose: nested braces, LaTeX escapes, and case are compared
/// verbatim.
fn clean_value(value: &str) -> &str {
    value.trim_matches(['{', '}', ' '])
}

/// Restrict an entry's field map to the whitelist.
pub fn apply_whitelist(entry: &Entry) -> Entry {
    let fields = entry
        .fields
        .iter()
        .filter(|(name, _)| WHITELIST.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Entry {
        key: entry.key.clone(),
        entry_type: entry.entry_type.clone(),
        fields,
    }
}

/// Diff `local` against `remote` over the fields present in `remote`.
///
/// Values that agree after [`clean_value`] are not differences; keys and
/// entry types are never compared (DBLP's always differ from local ones).
pub fn compare_entries(local: &Entry, remote: &Entry) -> DiffRecord {
    let mut diff = DiffRecord::new();
    for (name, new_value) in &remote.fields {
        let old_value = local.get(name);
        if clean_value(old_value.unwrap_or("")) != clean_value(new_value) {
            diff.insert(
                name.clone(),
                FieldChange {
                    old: old_value.map(String::from),
                    new: new_value.clone(),
                },
            );
        }
    }
    diff
}

/// Decide what to emit for one local entry given an optional DBLP candidate.
///
/// The local citation key always survives; non-whitelisted local fields
/// survive only when the entry is kept.
pub fn reconcile(local: &Entry, candidate: Option<Entry>) -> Reconciled {
    if local.title().is_none() {
        return Reconciled {
            entry: local.clone(),
            classification: Classification::NoTitle,
            diff: None,
        };
    }

    let Some(remote) = candidate else {
        return Reconciled {
            entry: local.clone(),
            classification: Classification::NotFound,
            diff: None,
        };
    };

    let mut filtered = apply_whitelist(&remote);
    let diff = compare_entries(local, &filtered);
    filtered.key = local.key.clone();

    if diff.is_empty() {
        // Emit the original, not the whitelisted copy, so local-only fields
        // are not silently dropped when nothing of substance changed.
        Reconciled {
            entry: local.clone(),
            classification: Classification::Unchanged,
            diff: None,
        }
    } else {
        Reconciled {
            entry: filtered,
            classification: Classification::Changed,
            diff: Some(diff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, fields: &[(&str, &str)]) -> Entry {
        let mut e = Entry::new(key, "article");
        for (name, value) in fields {
            e.set(*name, *value);
        }
        e
    }

    // ── clean_value / compare_entries ──────────────────────────────────

    #[test]
    fn braces_and_whitespace_are_not_differences() {
        let local = entry("a1", &[("author", "{Jane Doe}")]);
        let remote = entry("dblp/a1", &[("author", " Jane Doe ")]);
        assert!(compare_entries(&local, &remote).is_empty());
    }

    #[test]
    fn nested_content_is_compared_verbatim() {
        // Only the outermost wrapping is stripped.
        let local = entry("a1", &[("title", "{The {BERT} Model}")]);
        let remote = entry("dblp/a1", &[("title", "The BERT Model")]);
        assert!(!compare_entries(&local, &remote).is_empty());
    }

    #[test]
    fn diff_reports_old_and_new_values() {
        let local = entry("a1", &[("author", "X"), ("title", "Foo Bar")]);
        let remote = entry("dblp/a1", &[("author", "Y"), ("title", "Foo Bar")]);
        let diff = compare_entries(&local, &remote);
        assert_eq!(diff.len(), 1);
        let change = &diff["author"];
        assert_eq!(change.old.as_deref(), Some("X"));
        assert_eq!(change.new, "Y");
    }

    #[test]
    fn field_missing_locally_is_a_difference() {
        let local = entry("a1", &[("title", "Foo Bar")]);
        let remote = entry("dblp/a1", &[("title", "Foo Bar"), ("year", "2020")]);
        let diff = compare_entries(&local, &remote);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff["year"].old, None);
        assert_eq!(diff["year"].new, "2020");
    }

    #[test]
    fn fields_only_in_local_are_ignored_by_the_diff() {
        let local = entry("a1", &[("title", "Foo Bar"), ("note", "my note")]);
        let remote = entry("dblp/a1", &[("title", "Foo Bar")]);
        assert!(compare_entries(&local, &remote).is_empty());
    }

    // ── apply_whitelist ────────────────────────────────────────────────

    #[test]
    fn whitelist_drops_extra_remote_fields() {
        let remote = entry(
            "dblp/a1",
            &[
                ("author", "Y"),
                ("title", "Foo Bar"),
                ("timestamp", "2024-01-01"),
                ("biburl", "https://dblp.org/rec/a1.bib"),
            ],
        );
        let filtered = apply_whitelist(&remote);
        let names: Vec<&str> = filtered.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["author", "title"]);
    }

    // ── reconcile ──────────────────────────────────────────────────────

    #[test]
    fn changed_entry_takes_whitelisted_remote_fields_and_local_key() {
        let local = entry("a1", &[("title", "Foo Bar"), ("author", "X")]);
        let remote = entry(
            "dblp/a1",
            &[("title", "Foo Bar"), ("author", "Y"), ("year", "2020")],
        );

        let outcome = reconcile(&local, Some(remote));
        assert_eq!(outcome.classification, Classification::Changed);
        assert_eq!(outcome.entry.key, "a1");
        assert_eq!(outcome.entry.get("author"), Some("Y"));
        assert_eq!(outcome.entry.get("year"), Some("2020"));
        assert_eq!(outcome.entry.get("title"), Some("Foo Bar"));

        let diff = outcome.diff.unwrap();
        assert!(diff.contains_key("author"));
        assert!(diff.contains_key("year"));
        assert!(!diff.contains_key("title"));
    }

    #[test]
    fn changed_entry_contains_only_whitelisted_fields() {
        let local = entry("a1", &[("title", "Foo Bar"), ("note", "local note")]);
        let mut remote = entry("dblp/a1", &[("title", "Foo Bar"), ("author", "Y")]);
        remote.set("timestamp", "2024-01-01");

        let outcome = reconcile(&local, Some(remote));
        assert_eq!(outcome.classification, Classification::Changed);
        for name in outcome.entry.fields.keys() {
            assert!(
                WHITELIST.contains(&name.as_str()),
                "unexpected field {name}"
            );
        }
    }

    #[test]
    fn unchanged_entry_keeps_local_only_fields() {
        let local = entry(
            "a1",
            &[("title", "{Foo Bar}"), ("author", "Y"), ("note", "keep me")],
        );
        let remote = entry("dblp/a1", &[("title", "Foo Bar"), ("author", " Y ")]);

        let outcome = reconcile(&local, Some(remote));
        assert_eq!(outcome.classification, Classification::Unchanged);
        assert_eq!(outcome.entry, local);
        assert_eq!(outcome.entry.get("note"), Some("keep me"));
        assert!(outcome.diff.is_none());
    }

    #[test]
    fn unchanged_is_idempotent() {
        let local = entry("a1", &[("title", "Foo Bar"), ("author", "Y")]);
        let remote = entry("dblp/a1", &[("title", "Foo Bar"), ("author", "Y")]);

        let first = reconcile(&local, Some(remote.clone()));
        assert_eq!(first.classification, Classification::Unchanged);
        let second = reconcile(&first.entry, Some(remote));
        assert_eq!(second.classification, Classification::Unchanged);
        assert_eq!(second.entry, first.entry);
    }

    #[test]
    fn missing_title_skips_lookup_outcomes() {
        let local = entry("a1", &[("author", "X")]);
        let outcome = reconcile(&local, None);
        assert_eq!(outcome.classification, Classification::NoTitle);
        assert_eq!(outcome.entry, local);
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let local = entry("a1", &[("title", "  ")]);
        let outcome = reconcile(&local, None);
        assert_eq!(outcome.classification, Classification::NoTitle);
    }

    #[test]
    fn no_candidate_keeps_entry_verbatim() {
        let local = entry("a1", &[("title", "Foo Bar"), ("note", "n")]);
        let outcome = reconcile(&local, None);
        assert_eq!(outcome.classification, Classification::NotFound);
        assert_eq!(outcome.entry, local);
    }

    #[test]
    fn remote_entry_type_replaces_local_on_change() {
        let local = entry("a1", &[("title", "Foo Bar")]);
        let mut remote = Entry::new("dblp/a1", "inproceedings");
        remote.set("title", "Foo Bar");
        remote.set("booktitle", "ASE");

        let outcome = reconcile(&local, Some(remote));
        assert_eq!(outcome.classification, Classification::Changed);
        assert_eq!(outcome.entry.entry_type, "inproceedings");
        assert_eq!(outcome.entry.key, "a1");
    }
}
