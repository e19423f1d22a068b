//! BibTeX bibliography parsing and serialization.
//!
//! Wraps the `biblatex` crate with a per-entry fallback parse for real-world
//! .bib files containing minor syntax errors, and a writer whose output
//! round-trips through the parser.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BibError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no BibTeX entries found")]
    NoEntries,
}

/// One bibliographic record: citation key, entry type, and field map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Stable local citation key. Never rewritten by reconciliation.
    pub key: String,
    /// Record kind (`article`, `inproceedings`, ...), lowercased.
    pub entry_type: String,
    /// Field name (lowercased) to value, LaTeX chunks flattened to text.
    pub fields: BTreeMap<String, String>,
}

impl Entry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// The entry's title, if present and non-blank.
    pub fn title(&self) -> Option<&str> {
        self.get("title").filter(|t| !t.trim().is_empty())
    }
}

/// Parse the .bib file at `path`, preserving source order.
pub fn load(path: &Path) -> Result<Vec<Entry>, BibError> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse .bib content from a string.
pub fn parse_str(content: &str) -> Result<Vec<Entry>, BibError> {
    // Try parsing the whole file first (fast path)
    match biblatex::Bibliography::parse(content) {
        Ok(bibliography) => {
            let entries: Vec<Entry> = bibliography.iter().map(convert_entry).collect();
            if entries.is_empty() {
                return Err(BibError::NoEntries);
            }
            Ok(entries)
        }
        Err(_) => {
            // Fallback: split by @ entries and parse each individually.
            // Real .bib files often have minor syntax errors (extra braces,
            // non-standard entry types, raw text separators) that fail the
            // whole-file parse. Splitting recovers whatever we can.
            parse_entries_individually(content)
        }
    }
}

/// Split .bib content into individual entry strings and parse each one.
fn parse_entries_individually(content: &str) -> Result<Vec<Entry>, BibError> {
    static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^@[a-zA-Z]").unwrap());

    let positions: Vec<usize> = ENTRY_RE.find_iter(content).map(|m| m.start()).collect();
    if positions.is_empty() {
        return Err(BibError::NoEntries);
    }

    let mut entries = Vec::new();
    for i in 0..positions.len() {
        let start = positions[i];
        let end = if i + 1 < positions.len() {
            positions[i + 1]
        } else {
            content.len()
        };
        if let Ok(bib) = biblatex::Bibliography::parse(&content[start..end]) {
            entries.extend(bib.iter().map(convert_entry));
        }
    }

    if entries.is_empty() {
        return Err(BibError::NoEntries);
    }
    Ok(entries)
}

/// Flatten a parsed biblatex entry into the plain string->string model.
fn convert_entry(entry: &biblatex::Entry) -> Entry {
    let fields = entry
        .fields
        .iter()
        .map(|(name, value)| (name.to_lowercase(), chunks_to_string(value)))
        .collect();
    Entry {
        key: entry.key.clone(),
        entry_type: entry.entry_type.to_string(),
        fields,
    }
}

/// Convert biblatex chunks to a plain string.
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.as_str(),
            biblatex::Chunk::Verbatim(s) => s.as_str(),
            biblatex::Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Serialize `entries` to .bib text at `path`, overwriting any existing file.
pub fn save(path: &Path, entries: &[Entry]) -> Result<(), BibError> {
    std::fs::write(path, to_bib_string(entries))?;
    Ok(())
}

/// Render entries as .bib text, one `@type{key, ...}` block per entry.
pub fn to_bib_string(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = write!(out, "@{}{{{}", entry.entry_type, entry.key);
        for (name, value) in &entry.fields {
            let _ = write!(out, ",\n  {} = {{{}}}", name, value);
        }
        out.push_str("\n}\n\n");
    }
    out
}
