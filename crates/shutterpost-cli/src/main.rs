//! Shutterpost CLI: upload photos to a hosted photo service, skipping files
//! that are already there.
//!
//! Configuration comes from the environment (or `.env`): see
//! `ShutterpostConfig::from_env`. Results are printed as one JSON object per
//! line on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use shutterpost_cli::{build_pipeline, file_report, init_tracing, open_cache, print_json};
use shutterpost_core::{FileFingerprint, ShutterpostConfig, UploadRequest};
use shutterpost_processing::hasher;

#[derive(Parser)]
#[command(name = "shutterpost", about = "Duplicate-aware photo uploader", version)]
struct Cli {
    /// Remote service to use (overrides SHUTTERPOST_SERVICE)
    #[arg(long, global = true)]
    service: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files that are not on the service yet
    Upload {
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Tag to add (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Hide the uploaded photos
        #[arg(long)]
        private: bool,
        /// Upload even if the file is already known
        #[arg(long)]
        force: bool,
        /// Uploads in flight at once (overrides SHUTTERPOST_BATCH_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Report whether files were already uploaded, without uploading
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print file fingerprints
    Fingerprint {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Inspect or edit the local upload cache
    Cache {
        #[command(subcommand)]
        sub: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show the cached record for a file
    Show { file: PathBuf },
    /// Find the record for a remote id
    FindRemote { service: String, remote_id: String },
    /// List records with this filename, newest first
    FindName { filename: String },
    /// Remove the record for a fingerprint
    Forget { fingerprint: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ShutterpostConfig::from_env().context("Failed to load configuration")?;
    if let Some(service) = cli.service {
        config.service = service.trim().to_lowercase();
    }

    let mut failed = false;

    match cli.command {
        Commands::Upload {
            files,
            title,
            description,
            tags,
            private,
            force,
            concurrency,
        } => {
            config.validate().context("Invalid configuration")?;
            let cache = open_cache(&config).await?;
            let pipeline = build_pipeline(&config, &cache).await?;
            let request = UploadRequest {
                title,
                description,
                tags,
                is_private: private,
                force_upload: force,
            };
            let concurrency = concurrency.unwrap_or(config.batch_concurrency);

            let results = pipeline
                .ensure_uploaded_batch(&files, &request, concurrency)
                .await;
            for (path, result) in &results {
                if let Ok(outcome) = result {
                    for warning in &outcome.warnings {
                        tracing::warn!(path = %path.display(), step = %warning.step, error = %warning.error, "Uploaded with warning");
                    }
                }
                failed |= result.is_err();
                print_json(&file_report(path, result))?;
            }
            cache.close().await;
        }
        Commands::Check { files } => {
            config.validate().context("Invalid configuration")?;
            let cache = open_cache(&config).await?;
            let pipeline = build_pipeline(&config, &cache).await?;
            for path in &files {
                let result = pipeline.checker().check(path).await;
                failed |= result.is_err();
                print_json(&file_report(path, &result))?;
            }
            cache.close().await;
        }
        Commands::Fingerprint { files } => {
            for path in &files {
                let result = hasher::fingerprint(path).await;
                failed |= result.is_err();
                print_json(&file_report(path, &result))?;
            }
        }
        Commands::Cache { sub } => {
            let cache = open_cache(&config).await?;
            match sub {
                CacheCommands::Show { file } => {
                    let fingerprint = hasher::fingerprint(&file)
                        .await
                        .with_context(|| format!("Failed to fingerprint {}", file.display()))?;
                    print_json(&cache.lookup(&fingerprint).await?)?;
                }
                CacheCommands::FindRemote { service, remote_id } => {
                    print_json(&cache.find_by_remote_id(&service, &remote_id).await?)?;
                }
                CacheCommands::FindName { filename } => {
                    print_json(&cache.find_by_filename(&filename).await?)?;
                }
                CacheCommands::Forget { fingerprint } => {
                    let fingerprint: FileFingerprint = fingerprint
                        .parse()
                        .map_err(|e| anyhow::anyhow!("Invalid fingerprint: {}", e))?;
                    let removed = cache.forget(&fingerprint).await?;
                    print_json(&serde_json::json!({
                        "fingerprint": fingerprint,
                        "removed": removed,
                    }))?;
                }
            }
            cache.close().await;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
