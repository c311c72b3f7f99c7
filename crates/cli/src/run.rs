// ============================================================================
// regcheck run
// ============================================================================

use std::path::PathBuf;

use regcheck_engine::WorkbookStore;
use regcheck_io::XlsxHandle;
use regcheck_recon::{Dispatcher, ReconError, RunOptions, RunSummary};

use crate::registry;
use crate::settings::{self, Overrides};
use crate::CliError;

pub struct RunArgs {
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    pub registries: Vec<String>,
    pub overrides: Overrides,
    pub json: bool,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = settings::load(args.config.as_deref(), args.overrides)?;
    let registries = registry::build_selected(&args.registries, &config)?;

    let mut handle = XlsxHandle::open(&args.file).map_err(|e| CliError::io(e.to_string()))?;

    let options = RunOptions::from_config(&config, chrono::Local::now().naive_local());
    let dispatcher = Dispatcher::new(registries, config);

    let plan = dispatcher.plan(&handle.workbook().sheet_names());
    if plan.is_empty() {
        tracing::warn!(path = %args.file.display(), "no sheet matches any selected registry");
    }
    for assignment in &plan {
        tracing::info!(
            sheet = %assignment.sheet_name,
            registry = %assignment.registry,
            layout = assignment.config_key.as_deref().unwrap_or("-"),
            "planned"
        );
    }

    let summary = dispatcher
        .run_workbook(&mut handle, &options)
        .map_err(|e| match e {
            ReconError::Store(e) => CliError::io(e.to_string()),
            other => CliError::general(other.to_string()),
        })?;
    handle.close();

    if args.json {
        let out = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::io(format!("cannot serialize summary: {e}")))?;
        println!("{out}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for sheet in &summary.sheets {
        eprintln!(
            "{} [{}]: {} checked, {} skipped ({} found, {} expired, {} missing, {} failed, {} blank, {} no column)",
            sheet.sheet,
            sheet.registry,
            sheet.processed(),
            sheet.skipped,
            sheet.found,
            sheet.expired,
            sheet.not_found,
            sheet.errors,
            sheet.blank_identifier,
            sheet.missing_column,
        );
    }
    for name in &summary.unconfigured {
        eprintln!("{name}: skipped, no sheets_config entry");
    }
    eprintln!(
        "{} rows checked, {} skipped, {} checkpoint saves",
        summary.processed, summary.skipped, summary.checkpoints
    );
}
