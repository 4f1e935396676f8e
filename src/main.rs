// chartconv - Batch converter command line
// Loads saved options, applies flags and runs one conversion batch

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chart_converter::config::{default_options_path, ConvertOptions};
use chart_converter::convert::{BatchControl, BatchConverter, BatchSummary, CancelToken};

/// Command-line arguments for chartconv
#[derive(Parser, Debug)]
#[command(name = "chartconv")]
#[command(about = "Converts rhythm-game charts into normalized song folders")]
#[command(version)]
struct Args {
    /// Folder converted songs are written to
    #[arg(short, long, env = "CHARTCONV_OUTPUT")]
    output: Option<PathBuf>,

    /// Rock Band song folder to search (repeatable)
    #[arg(short, long = "rock-band")]
    rock_band: Vec<PathBuf>,

    /// Container file to convert (repeatable)
    #[arg(short, long)]
    psarc: Vec<PathBuf>,

    /// Folder to search for container files (repeatable)
    #[arg(long = "psarc-folder")]
    psarc_folder: Vec<PathBuf>,

    #[arg(long)]
    no_psarc: bool,

    #[arg(long)]
    no_rock_band: bool,

    /// Point Rock Band parts at the source audio instead of copying it
    #[arg(long)]
    no_copy_audio: bool,

    /// Replace song.ogg files that already exist
    #[arg(long)]
    overwrite_audio: bool,

    /// Leave already converted container songs untouched
    #[arg(long)]
    keep_existing: bool,

    /// Options file to load (defaults to the user config directory)
    #[arg(long, env = "CHARTCONV_OPTIONS")]
    options: Option<PathBuf>,

    /// Write the resulting options back to the options file
    #[arg(long)]
    save_options: bool,
}

impl Args {
    fn apply(&self, options: &mut ConvertOptions) {
        if let Some(output) = &self.output {
            options.song_output_path = output.clone();
        }

        extend_unique(&mut options.rock_band_folders, &self.rock_band);
        extend_unique(&mut options.psarc_files, &self.psarc);
        extend_unique(&mut options.psarc_folders, &self.psarc_folder);

        if self.no_psarc {
            options.convert_psarc = false;
        }
        if self.no_rock_band {
            options.convert_rock_band = false;
        }
        if self.no_copy_audio {
            options.copy_rock_band_audio = false;
        }
        if self.overwrite_audio {
            options.overwrite_audio = true;
        }
        if self.keep_existing {
            options.overwrite_data = false;
        }
    }
}

fn extend_unique(paths: &mut Vec<PathBuf>, extra: &[PathBuf]) {
    for path in extra {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    }
}

fn log_summary(summary: &BatchSummary) {
    log::info!(
        "{} converted, {} skipped, {} failed",
        summary.converted,
        summary.skipped,
        summary.failed
    );
    if summary.aborted {
        log::warn!("Batch was stopped before every source was converted");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chart_converter=info,chartconv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let options_path = match &args.options {
        Some(path) => path.clone(),
        None => default_options_path().context("Failed to locate the options file")?,
    };
    let mut options = ConvertOptions::load_or_default(&options_path);
    args.apply(&mut options);

    if args.save_options {
        options
            .save(&options_path)
            .with_context(|| format!("Failed to save options to {}", options_path.display()))?;
        log::info!("Saved options to {}", options_path.display());
    }

    if !options.has_sources() {
        log::warn!("Nothing to convert: no enabled source folders or files");
        return Ok(());
    }
    if options.song_output_path.as_os_str().is_empty() {
        bail!("No output folder configured, pass --output");
    }

    let token = CancelToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            log::info!("Received Ctrl+C, stopping after the current song");
            signal_token.cancel();
        }
    });

    let converter = BatchConverter::new(options);
    let summary = tokio::task::spawn_blocking(move || {
        let mut control = BatchControl::new(token);
        converter.run(&mut control)
    })
    .await
    .context("Conversion task failed")?;

    log_summary(&summary);
    Ok(())
}
