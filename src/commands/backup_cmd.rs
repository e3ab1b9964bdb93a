use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use super::OutputFormat;
use crate::backup::{
    BackupError, BackupService, CollectionCounts, ImportOptions, OperationResult,
};
use crate::config::Config;
use crate::store::DocumentStore;

#[derive(Args)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub command: BackupSubcommand,
}

#[derive(Subcommand)]
pub enum BackupSubcommand {
    /// Export students, invoices, attendance and settings to a backup file
    Export {
        /// Directory to write the backup to (defaults to backup_dir)
        #[arg(long, value_name = "DIR", conflicts_with = "stdout")]
        out: Option<PathBuf>,

        /// Print the backup to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Import a backup file, merging into existing records
    Import {
        /// Backup file to import
        file: PathBuf,

        /// Replace existing records instead of merging into them
        #[arg(long)]
        overwrite: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate a backup file and show what it contains
    Inspect {
        /// Backup file to inspect
        file: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete every record in every managed collection
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// What `backup export` reports once the artifact is delivered.
#[derive(Serialize)]
struct ExportSummary {
    path: Option<PathBuf>,
    filename: String,
    counts: CollectionCounts,
    has_settings: bool,
}

impl BackupCommand {
    pub async fn run<S: DocumentStore>(
        &self,
        service: &BackupService<S>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            BackupSubcommand::Export {
                out,
                stdout,
                format,
            } => {
                let dir = out.clone().unwrap_or_else(|| config.backup_dir.value.clone());
                let result = export(service, &dir, *stdout).await;

                if *stdout {
                    // The artifact already went to stdout; keep it parseable.
                    return report_to_stderr(format, result);
                }

                report(format, result, |summary| {
                    if let Some(path) = &summary.path {
                        println!("Backup written to {}", path.display());
                    }
                    println!("Exported {}", describe(&summary.counts));
                    if !summary.has_settings {
                        println!("No business settings were included.");
                    }
                })
            }

            BackupSubcommand::Import {
                file,
                overwrite,
                format,
            } => {
                let options = ImportOptions {
                    overwrite: *overwrite,
                };
                let result = match read_artifact(file).await {
                    Ok(artifact) => service.import(&artifact, options).await,
                    Err(e) => Err(e),
                };

                report(format, result, |report| {
                    println!(
                        "Imported {} from backup of {}",
                        describe(&report.counts),
                        report.export_date
                    );
                    if report.settings_restored {
                        println!("Business settings restored.");
                    }
                })
            }

            BackupSubcommand::Inspect { file, format } => {
                let result = match read_artifact(file).await {
                    Ok(artifact) => service.inspect(&artifact),
                    Err(e) => Err(e),
                };

                report(format, result, |summary| {
                    println!("Backup: {}", file.display());
                    println!("  exported: {}", summary.export_date);
                    println!("  version:  {}", summary.version);
                    println!("  contains: {}", describe(&summary.counts));
                    println!(
                        "  settings: {}",
                        if summary.has_settings { "yes" } else { "no" }
                    );
                })
            }

            BackupSubcommand::Clear { force, format } => {
                // Confirm deletion unless --force is used
                // Confirm deletion unless --force is used; stdout stays clean
                if !force && !confirm_clear(io::stdin().lock(), io::stderr())? {
                    eprintln!("Clear cancelled.");
                    return Ok(());
                }

                let result = service.clear().await;
                report(format, result, |report| {
                    println!(
                        "Deleted {} and {} settings record(s)",
                        describe(&report.counts),
                        report.settings
                    );
                })
            }
        }
    }
}

async fn export<S: DocumentStore>(
    service: &BackupService<S>,
    dir: &Path,
    to_stdout: bool,
) -> Result<ExportSummary, BackupError> {
    let outcome = service.export().await?;

    let path = if to_stdout {
        println!("{}", outcome.artifact.contents);
        None
    } else {
        Some(outcome.artifact.write_to(dir).await?)
    };

    Ok(ExportSummary {
        path,
        filename: outcome.artifact.filename,
        counts: outcome.counts,
        has_settings: outcome.has_settings,
    })
}

fn confirm_clear(mut input: impl BufRead, mut prompt: impl Write) -> io::Result<bool> {
    write!(
        prompt,
        "Delete ALL students, invoices, attendance and settings? [y/N] "
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

async fn read_artifact(path: &Path) -> Result<String, BackupError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BackupError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Prints a result either as a structured JSON envelope or as text.
fn report<T: Serialize>(
    format: &OutputFormat,
    result: Result<T, BackupError>,
    text: impl FnOnce(&T),
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            let envelope: OperationResult<T> = result.into();
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            match envelope.error {
                Some(error) => Err(error.message.into()),
                None => Ok(()),
            }
        }
        OutputFormat::Text => {
            let value = result?;
            text(&value);
            Ok(())
        }
    }
}

/// Like [`report`], for when stdout already carries the artifact.
fn report_to_stderr(
    format: &OutputFormat,
    result: Result<ExportSummary, BackupError>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            let envelope: OperationResult<ExportSummary> = result.into();
            eprintln!("{}", serde_json::to_string_pretty(&envelope)?);
            match envelope.error {
                Some(error) => Err(error.message.into()),
                None => Ok(()),
            }
        }
        OutputFormat::Text => {
            let summary = result?;
            eprintln!("Exported {}", describe(&summary.counts));
            Ok(())
        }
    }
}

fn describe(counts: &CollectionCounts) -> String {
    format!(
        "{} student(s), {} invoice(s), {} attendance record(s)",
        counts.students, counts.invoices, counts.attendance
    )
}
