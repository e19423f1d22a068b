use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Refresh BibTeX entries with canonical metadata from DBLP
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the input BibTeX file
    #[arg(long, default_value = "old.bib")]
    bib_file: PathBuf,

    /// Path to save the updated BibTeX file
    #[arg(long, default_value = "output.bib")]
    output_file: PathBuf,

    /// Path for the audit log
    #[arg(long, default_value = "log.txt")]
    log_file: PathBuf,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Parse and list entries without querying DBLP
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let color = ColorMode(!cli.no_color);

    if cli.dry_run {
        return dry_run(&cli.bib_file, color);
    }

    init_logging(&cli.log_file)?;

    // Resolve configuration: env vars > defaults (paths come from flags)
    let timeout_secs: u64 = std::env::var("DBLP_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let client = bibfresh_dblp::DblpClient::new(Duration::from_secs(timeout_secs))?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}")
            .expect("static template is valid")
            .progress_chars("=> "),
    );

    let progress = {
        let bar = bar.clone();
        move |event: bibfresh_core::ProgressEvent| match event {
            bibfresh_core::ProgressEvent::Checking { total, key, .. } => {
                if bar.length() == Some(0) {
                    bar.set_length(total as u64);
                }
                bar.set_message(key);
            }
            bibfresh_core::ProgressEvent::Result { .. } => bar.inc(1),
        }
    };

    let config = bibfresh_core::RunConfig {
        bib_file: cli.bib_file.clone(),
        output_file: cli.output_file.clone(),
    };

    let summary = bibfresh_core::run(&config, &client, progress).await?;
    bar.finish_and_clear();

    let mut stdout = std::io::stdout();
    output::print_summary(&mut stdout, &summary, color)?;
    writeln!(
        stdout,
        "Updated BibTeX saved to {}",
        cli.output_file.display()
    )?;
    writeln!(stdout, "Differences logged to {}", cli.log_file.display())?;

    Ok(())
}

/// Route tracing output to the append-mode audit log: timestamped, leveled,
/// no ANSI escapes.
fn init_logging(log_file: &PathBuf) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| anyhow::anyhow!("cannot open log file {}: {}", log_file.display(), e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(())
}

/// List the parsed entries without any network traffic.
fn dry_run(bib_file: &PathBuf, color: ColorMode) -> anyhow::Result<()> {
    let entries = bibfresh_bib::load(bib_file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", bib_file.display(), e))?;

    let mut stdout = std::io::stdout();
    output::print_dry_run(&mut stdout, bib_file, &entries, color)?;
    Ok(())
}
