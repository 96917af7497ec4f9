use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use realign_rs::{
    ingest_diarization, ingest_free_text, ingest_timed_words, render_free_text, AlignmentConfig,
    Diarization, ReconcilerBuilder, TimedWordFormat,
};

#[path = "realign/json_output_formatter.rs"]
mod json_output_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReferenceFormat {
    /// Flat word list from a forced aligner.
    Mfa,
    /// Segmented recognizer output with per-word timing.
    Asr,
}

impl ReferenceFormat {
    fn timed_word_format(self) -> TimedWordFormat {
        match self {
            Self::Mfa => TimedWordFormat::Mfa,
            Self::Asr => TimedWordFormat::Asr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "realign")]
#[command(about = "Recover word timings and speakers for a hand-edited transcript")]
struct Args {
    /// Edited transcript as plain text; inline timestamps and speaker tags are read.
    #[arg(long, env = "REALIGN_EDITED")]
    edited: PathBuf,
    /// Timed words from an alignment or recognition tool (JSON).
    #[arg(long, env = "REALIGN_REFERENCE")]
    reference: Option<PathBuf>,
    #[arg(
        long,
        env = "REALIGN_REFERENCE_FORMAT",
        value_enum,
        default_value_t = ReferenceFormat::Mfa
    )]
    reference_format: ReferenceFormat,
    /// Speaker turns (JSON).
    #[arg(long, env = "REALIGN_DIARIZATION")]
    diarization: Option<PathBuf>,
    #[arg(long, env = "REALIGN_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "REALIGN_LOOKAHEAD_WINDOW")]
    lookahead_window: Option<usize>,
    /// Insert empty separator words between speaker turns.
    #[arg(long, env = "REALIGN_SEPARATORS", default_value_t = false)]
    separators: bool,
    #[arg(
        long,
        env = "REALIGN_OUTPUT_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
    /// Defaults to stdout.
    #[arg(long, env = "REALIGN_OUT")]
    out: Option<PathBuf>,
    /// Where to write the JSON quality report.
    #[arg(long, env = "REALIGN_REPORT")]
    report: Option<PathBuf>,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "realign_rs=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AlignmentConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => AlignmentConfig::default(),
    };
    if let Some(window) = args.lookahead_window {
        config.lookahead_window = window;
    }
    if args.separators {
        config.insert_turn_separators = true;
    }
    let reconciler = ReconcilerBuilder::new(config)
        .build()
        .map_err(|err| format!("Invalid configuration: {err}"))?;

    let text = read_input(&args.edited, "edited transcript")?;
    let (edited, _) = ingest_free_text(&text);

    let reference = match &args.reference {
        Some(path) => {
            let source = read_input(path, "reference")?;
            ingest_timed_words(&source, args.reference_format.timed_word_format())
                .map_err(|err| format!("Failed to import reference '{}': {err}", path.display()))?
        }
        None => Vec::new(),
    };

    let diarization = match &args.diarization {
        Some(path) => {
            let source = read_input(path, "diarization")?;
            let decoded = ingest_diarization(&source).map_err(|err| {
                format!("Failed to import diarization '{}': {err}", path.display())
            })?;
            Some(Diarization::from(decoded))
        }
        None => None,
    };

    let result = reconciler.reconcile(&edited, &reference, diarization.as_ref());
    for note in &result.report.notes {
        tracing::warn!(note = note.as_str(), "realign: quality signal");
    }

    let rendered = match args.output_format {
        OutputFormat::Json => json_output_formatter::render_words(&result.words)?,
        OutputFormat::Text => render_free_text(&result.words),
    };
    match &args.out {
        Some(path) => write_output(path, &rendered)?,
        None => println!("{rendered}"),
    }

    if let Some(path) = &args.report {
        json_output_formatter::write_report(path, &result.report)?;
    }
    Ok(())
}

fn read_input(path: &Path, what: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read {what} '{}': {err}", path.display()))
}

fn write_output(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    fs::write(path, format!("{contents}\n"))
        .map_err(|err| format!("Failed to write output '{}': {err}", path.display()))
}
