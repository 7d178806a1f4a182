//! Sitebook RS command line
//!
//! Drives one Project Manager working copy, mirrored to a local file, against a
//! directory-backed project store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sb_attachments::{LocalStorage, PhotoUpload, PhotoUploader, UploadConfig};
use sb_core::config::{AppConfig, LoggingConfig};
use sb_core::traits::SystemClock;
use sb_models::{ProjectVersion, YesterdayProgressReport};
use sb_services::{
    LoadProjectService, LocalBackend, ProgressPhotoService, ServiceResult, SubmitDailyReportService,
};
use sb_store::{FileMirror, Mirror, NullMirror, ProjectWorkflowStore};

#[derive(Parser, Debug)]
#[command(name = "sitebook")]
#[command(about = "Daily progress workflow for construction projects", long_about = None)]
struct Cli {
    /// Working-copy mirror file (overrides SITEBOOK_MIRROR_PATH)
    #[arg(long, global = true)]
    mirror: Option<PathBuf>,

    /// Project directory (overrides SITEBOOK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a project from the project directory into the working copy
    Load { project_id: String },
    /// Replace the working copy with a project document read from a file
    Import { file: PathBuf },
    /// Print the working copy
    Show {
        /// Print the progress summary instead of the full document
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Enter the day's delta for a sub-item
    Progress {
        sheet1: usize,
        sheet2: usize,
        #[arg(long, default_value_t = 0.0)]
        supplied: f64,
        #[arg(long, default_value_t = 0.0)]
        installed: f64,
    },
    /// Attach progress photos to a work item
    Photos {
        sheet1: usize,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Resolve a pending blockage
    Resolve { sheet1: usize, blockage: usize },
    /// Fold every pending daily delta into the totals
    Rollup,
    /// Check the working copy against the submission rules
    Validate,
    /// Submit the daily report
    Submit,
    /// Clear the working copy and its mirror
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("invalid SITEBOOK_* configuration")?;
    if let Some(path) = &cli.mirror {
        config.store.mirror_path = path.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.backend.data_dir = dir.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    init_tracing(&config.logging);

    run(cli.command, config).await
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let json_layer = logging
        .json
        .then(|| fmt::layer().json().with_target(true).with_writer(std::io::stderr));
    let text_layer = (!logging.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    let mirror: Arc<dyn Mirror> = if config.store.mirror_enabled {
        Arc::new(FileMirror::new(&config.store.mirror_path))
    } else {
        Arc::new(NullMirror)
    };
    let mut store = ProjectWorkflowStore::rehydrate(mirror, Arc::new(SystemClock));
    let backend = Arc::new(LocalBackend::from_config(&config.backend));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mirror = %config.store.mirror_path.display(),
        data_dir = %config.backend.data_dir.display(),
        "Sitebook started"
    );

    match command {
        Command::Load { project_id } => {
            let result = LoadProjectService::new(backend).call(&mut store, &project_id).await;
            print_json(&finish(result)?)
        }
        Command::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let project: ProjectVersion = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a project document", file.display()))?;
            store.set_project(project);
            print_json(store.project())
        }
        Command::Show { summary } => {
            if summary {
                print_json(&store.summary())
            } else {
                print_json(store.project())
            }
        }
        Command::Progress {
            sheet1,
            sheet2,
            supplied,
            installed,
        } => {
            let report = YesterdayProgressReport::new(supplied, installed);
            if !store.set_yesterday_progress_report_of_sub_item(sheet1, sheet2, report) {
                bail!("sheet1[{}].sheet2[{}] does not exist", sheet1, sheet2);
            }
            print_json(&store.sheet2_item(sheet1, sheet2))
        }
        Command::Photos {
            sheet1,
            description,
            files,
        } => {
            let storage = Arc::new(LocalStorage::new(
                &config.storage.local_path,
                config.storage.public_base_url.clone(),
            ));
            let uploader = Arc::new(PhotoUploader::new(storage, UploadConfig::from(&config.storage)));

            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                uploads.push(PhotoUpload::new(file_name, data));
            }

            let result = ProgressPhotoService::new(uploader)
                .attach(&mut store, sheet1, uploads, &description)
                .await;
            print_json(&finish(result)?)
        }
        Command::Resolve { sheet1, blockage } => {
            if !store.set_blockage_resolved(sheet1, blockage) {
                bail!("sheet1[{}].blockages[{}] is missing or not pending", sheet1, blockage);
            }
            print_json(&store.sheet1_blockages(sheet1).get(blockage))
        }
        Command::Rollup => {
            let report = store.update_supply_and_installations_from_yesterday_progress_report();
            print_json(&report)
        }
        Command::Validate => {
            let result = SubmitDailyReportService::new(backend).validate(&store);
            finish(result)?;
            println!("Working copy is ready to submit");
            Ok(())
        }
        Command::Submit => {
            let result = SubmitDailyReportService::new(backend).call(&mut store).await;
            print_json(&finish(result)?)
        }
        Command::Reset => {
            store.reset_project();
            println!("Working copy cleared");
            Ok(())
        }
    }
}

/// Turn a failed service call into an error listing every message
fn finish<T>(result: ServiceResult<T>) -> Result<T> {
    let retryable = result.is_retryable();
    let message = result.message().map(str::to_string);
    match result.into_result() {
        Ok(value) => Ok(value),
        Err(errors) => {
            let mut text = message.unwrap_or_else(|| "Operation failed".to_string());
            for line in errors.full_messages() {
                text.push_str("\n  - ");
                text.push_str(&line);
            }
            if retryable {
                text.push_str("\nNothing was changed; the command can be retried.");
            }
            bail!(text)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_progress() {
        let cli = Cli::try_parse_from([
            "sitebook",
            "--mirror",
            "/tmp/wc.json",
            "progress",
            "0",
            "2",
            "--supplied",
            "12.5",
        ])
        .unwrap();

        assert_eq!(cli.mirror, Some(PathBuf::from("/tmp/wc.json")));
        match cli.command {
            Command::Progress {
                sheet1,
                sheet2,
                supplied,
                installed,
            } => {
                assert_eq!((sheet1, sheet2), (0, 2));
                assert_eq!(supplied, 12.5);
                assert_eq!(installed, 0.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_finish_lists_every_error() {
        let mut errors = sb_core::error::ValidationErrors::new();
        errors.add("name", "can't be blank");
        errors.add("sheet1[0].totalSupplied", "must not exceed totalQuantity");

        let err = finish::<()>(ServiceResult::failure(errors)).unwrap_err().to_string();
        assert!(err.contains("name can't be blank"));
        assert!(err.contains("sheet1[0].totalSupplied must not exceed totalQuantity"));
    }
}
