use std::io::Write;
use std::path::Path;

use bibfresh_core::{Entry, RunSummary};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the one-line completion summary.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &RunSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "Reconciled {} entries: {} changed, {} unchanged, {} not found, {} without titles",
            summary.total,
            summary.changed.green(),
            summary.unchanged.dimmed(),
            summary.not_found.red(),
            summary.no_title.yellow()
        )?;
    } else {
        writeln!(
            w,
            "Reconciled {} entries: {} changed, {} unchanged, {} not found, {} without titles",
            summary.total, summary.changed, summary.unchanged, summary.not_found, summary.no_title
        )?;
    }
    Ok(())
}

/// Print the parsed entries for `--dry-run`.
pub fn print_dry_run(
    w: &mut dyn Write,
    bib_file: &Path,
    entries: &[Entry],
    color: ColorMode,
) -> std::io::Result<()> {
    let name = bib_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| bib_file.display().to_string());

    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} entries)\n",
            "DRY RUN:".bold().cyan(),
            name.bold(),
            entries.len()
        )?;
    } else {
        writeln!(w, "DRY RUN: {} ({} entries)\n", name, entries.len())?;
    }

    for (i, entry) in entries.iter().enumerate() {
        if color.enabled() {
            writeln!(w, "{}", format!("[{}]", i + 1).bold().yellow())?;
        } else {
            writeln!(w, "[{}]", i + 1)?;
        }
        writeln!(w, "  Key:     {}", entry.key)?;
        writeln!(w, "  Type:    {}", entry.entry_type)?;
        writeln!(w, "  Title:   {}", entry.title().unwrap_or("(none)"))?;
        if let Some(author) = entry.get("author") {
            writeln!(w, "  Authors: {}", author)?;
        }
        writeln!(w)?;
    }

    writeln!(w, "Total: {} entries", entries.len())?;
    Ok(())
}
