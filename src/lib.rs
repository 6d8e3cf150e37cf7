pub mod contracts;
pub mod errors;
pub mod expr;
pub mod filter;
pub mod models;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod verification;

pub use crate::errors::{AppError, AppResult};
pub use crate::expr::Expression;
pub use crate::filter::{FilterEngine, FilterOutcome};
pub use crate::models::{
    AppSettings, FilterNotice, FilterRequest, FilterStage, FilteredResult, Task, TaskDraft, TaskId,
    VerificationResult,
};
pub use crate::scheduler::{run_filter_query, SchedulerService};
pub use crate::store::{SharedTaskStore, TaskDataService, TaskSnapshot, TaskStore};
pub use crate::verification::VerificationEngine;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Installs JSON logging into `log_dir/scheduler.log` (rotated daily).
/// `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(log_dir: &Path, default_filter: &str) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "scheduler.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

/// Loads settings, starts logging when a log directory is configured, and
/// opens the task file.
pub fn bootstrap(settings_path: &Path) -> AppResult<SchedulerService> {
    let settings = settings::load_settings(settings_path)?;
    if let Some(log_dir) = settings.log_dir.as_deref() {
        init_tracing(Path::new(log_dir), &settings.log_filter)?;
    }
    let service = SchedulerService::open(settings)?;
    tracing::info!(settings = %settings_path.display(), "scheduler ready");
    Ok(service)
}
