// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wandelwerk: local, offline file-format converter.
//
// Entry point. Initialises logging, loads configuration, and drives one
// conversion session per invocation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wandelwerk_app::{AppServices, ArtifactInfo, ConversionObserver};
use wandelwerk_core::classify::{self, REGISTRY};
use wandelwerk_core::error::WandelwerkError;
use wandelwerk_core::human_errors::humanize_error;
use wandelwerk_core::{ConversionTarget, FailureKind, SourceFile};

/// Convert images, Word documents and audio files locally.
#[derive(Parser, Debug)]
#[command(name = "wandelwerk", version, arg_required_else_help = true)]
struct Cli {
    /// Configuration file (defaults to config.json in the data directory).
    #[arg(long, global = true, env = "WANDELWERK_CONFIG")]
    config: Option<PathBuf>,

    /// Show debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a file's family and the formats it can be converted to.
    Targets {
        file: PathBuf,

        /// Declared media type (guessed from the extension when omitted).
        #[arg(long)]
        mime: Option<String>,
    },

    /// Convert a file and save the result.
    Convert {
        file: PathBuf,

        /// Output format: png, jpeg (jpg), webp, gif, pdf, mp3, wav, ogg.
        #[arg(short, long)]
        to: ConversionTarget,

        /// Declared media type (guessed from the extension when omitted).
        #[arg(long)]
        mime: Option<String>,

        /// Directory the converted file is written to.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// List every supported input type and its output formats.
    Formats {
        /// Print the registry as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Prints orchestrator events for a terminal user.
struct ConsoleObserver;

impl ConversionObserver for ConsoleObserver {
    fn on_progress(&self, message: &str) {
        eprintln!("{message}");
    }

    fn on_artifact_ready(&self, artifact: &ArtifactInfo) {
        eprintln!(
            "Ready: {} ({}, {} bytes)",
            artifact.suggested_name, artifact.mime_type, artifact.size
        );
    }

    // The returned error carries the same message; main prints it once.
    fn on_failure(&self, kind: FailureKind, message: &str) {
        tracing::debug!(?kind, message, "failure reported");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!("Wandelwerk starting");

    match cli.command {
        Command::Formats { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(REGISTRY)?);
            } else {
                print_formats();
            }
            Ok(())
        }
        Command::Targets { file, mime } => {
            let source = read_source(&file, mime)?;
            let classification = classify::classify(&source);
            println!("{}: {}", source.name(), classification.family);
            if classification.is_supported() {
                for target in &classification.targets {
                    println!("  {target}");
                }
            } else {
                println!("  (no conversions available)");
            }
            Ok(())
        }
        Command::Convert {
            file,
            to,
            mime,
            out_dir,
        } => {
            let services = AppServices::init(cli.config.as_deref())
                .map_err(human)
                .context("could not load configuration")?;
            let session = services.session(Arc::new(ConsoleObserver));

            let source = read_source(&file, mime)?;
            session.on_file_selected(source).map_err(human)?;
            session.on_target_selected(to).await.map_err(human)?;
            let path = session.download(&out_dir).map_err(human)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Load a file from disk. The declared type is the `--mime` value, or a
/// guess from a registered extension.
fn read_source(path: &Path, mime: Option<String>) -> Result<SourceFile> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut source = SourceFile::new(name, bytes);
    let declared = mime.or_else(|| {
        source
            .extension()
            .and_then(|ext| classify::guess_media_type(&ext))
            .map(str::to_string)
    });
    if let Some(declared) = declared {
        source = source.with_declared_type(declared);
    }
    Ok(source)
}

fn print_formats() {
    for entry in REGISTRY {
        let targets: Vec<String> = entry.targets.iter().map(|t| t.to_string()).collect();
        println!(
            "{:<72} {:<9} -> {}",
            entry.media_type,
            entry.family.label(),
            targets.join(", ")
        );
    }
    println!("(.docx files are recognised by extension when no type is declared)");
}

/// Turn a conversion error into the plain-English message the user sees.
fn human(err: WandelwerkError) -> anyhow::Error {
    let friendly = humanize_error(&err);
    tracing::debug!(error = %err, "conversion error");
    anyhow::anyhow!("{}\n{}", friendly.message, friendly.suggestion)
}
