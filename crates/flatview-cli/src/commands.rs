//! Subcommand implementations.

use anyhow::{Context, Result};
use flatview_core::{MigrationSummary, load_source, run_migration, run_verification};
use flatview_model::MigrationConfig;
use flatview_pipeline::build_flattening_pipeline;
use flatview_store::{DocumentStore, connect};
use flatview_verify::IntegrityReport;
use tracing::{info, warn};

use crate::cli::{ConfigArgs, MigrateArgs, VerifyArgs};
use crate::diff::write_diff_csv;

/// Load and validate the config, applying the `--store` override.
pub fn load_config(args: &ConfigArgs) -> Result<MigrationConfig> {
    let mut config = MigrationConfig::load(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    if let Some(uri) = &args.store {
        config.store.uri.clone_from(uri);
    }
    config.validate().context("validate config")?;
    Ok(config)
}

fn open_store(config: &MigrationConfig) -> Result<Box<dyn DocumentStore>> {
    let uri = config.store.uri.as_str();
    if uri == "memory://" {
        warn!("memory:// store is discarded when the process exits");
    }
    connect(uri).with_context(|| format!("connect to store {uri}"))
}

pub fn run_migrate(args: &MigrateArgs) -> Result<MigrationSummary> {
    let mut config = load_config(&args.config)?;
    config.overwrite_view |= args.overwrite_view;

    let table = load_source(&config)
        .with_context(|| format!("load source {}", config.source.display()))?;
    info!(
        rows = table.height(),
        columns = table.width(),
        source = %config.source.display(),
        "Loaded source table"
    );
    let mut store = open_store(&config)?;
    run_migration(store.as_mut(), &table, &config).context("run migration")
}

pub fn run_verify(args: &VerifyArgs) -> Result<IntegrityReport> {
    let config = load_config(&args.config)?;
    let table = load_source(&config)
        .with_context(|| format!("load source {}", config.source.display()))?;
    let store = open_store(&config)?;
    let report = run_verification(store.as_ref(), &table, &config).context("verify flatten view")?;

    if !report.is_clean() {
        warn!(
            type_differences = report.type_report.differences.len(),
            cell_differences = report.value_report.cell_difference_count,
            "Flatten view does not match the source"
        );
    }
    if let Some(path) = &args.diff_out {
        let lines = write_diff_csv(path, &report)?;
        info!(path = %path.display(), lines, "Wrote difference file");
    }
    Ok(report)
}

/// The flattening pipeline as pretty JSON.
pub fn run_pipeline(args: &ConfigArgs) -> Result<String> {
    let config = load_config(args)?;
    Ok(build_flattening_pipeline(&config.operations()).to_json_pretty())
}
