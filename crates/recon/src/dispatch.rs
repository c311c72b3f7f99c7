//! Route workbook sheets to registries and run a whole workbook.

use chrono::NaiveDateTime;
use regcheck_engine::WorkbookStore;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::CheckConfig;
use crate::driver::{reconcile_sheet, Checkpointer, ReconcileOptions, SheetSummary};
use crate::error::ReconError;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub skip_days: u32,
    pub numrec_before_save: usize,
    pub now: NaiveDateTime,
}

impl RunOptions {
    pub fn from_config(config: &CheckConfig, now: NaiveDateTime) -> Self {
        Self {
            skip_days: config.skip_days,
            numrec_before_save: config.numrec_before_save,
            now,
        }
    }

    fn reconcile(&self) -> ReconcileOptions {
        ReconcileOptions {
            skip_days: self.skip_days,
            now: self.now,
        }
    }
}

/// One sheet routed to a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub sheet_index: usize,
    pub sheet_name: String,
    pub registry: String,
    /// `sheets_config` key providing the layout; `None` when the sheet has
    /// no layout and will be skipped.
    pub config_key: Option<String>,
    #[serde(skip)]
    registry_index: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub sheets: Vec<SheetSummary>,
    /// Sheets owned by a registry but lacking a `sheets_config` entry.
    pub unconfigured: Vec<String>,
    /// Sheets no registry claimed.
    pub unmatched: Vec<String>,
    pub processed: usize,
    pub skipped: usize,
    pub checkpoints: usize,
}

struct Route {
    keywords: Vec<String>,
    registry: usize,
}

/// Owns the registries and the sheet routing table for a run.
pub struct Dispatcher {
    registries: Vec<Box<dyn Registry>>,
    routes: Vec<Route>,
    config: CheckConfig,
}

impl Dispatcher {
    pub fn new(registries: Vec<Box<dyn Registry>>, config: CheckConfig) -> Self {
        let routes = registries
            .iter()
            .enumerate()
            .map(|(registry, r)| Route {
                keywords: r.keywords().iter().map(|k| k.to_lowercase()).collect(),
                registry,
            })
            .collect();
        Self {
            registries,
            routes,
            config,
        }
    }

    /// Registries whose keywords all appear in the sheet name, in
    /// registration order.
    pub fn registries_for(&self, sheet_name: &str) -> Vec<&dyn Registry> {
        self.routes_for(sheet_name)
            .map(|index| self.registries[index].as_ref())
            .collect()
    }

    fn routes_for<'a>(&'a self, sheet_name: &str) -> impl Iterator<Item = usize> + 'a {
        let name = sheet_name.to_lowercase();
        self.routes
            .iter()
            .filter(move |route| route.keywords.iter().all(|k| name.contains(k.as_str())))
            .map(|route| route.registry)
    }

    /// Assign sheets to registries in workbook order, then registry order
    /// within a sheet. A sheet several keyword sets claim gets one pass per
    /// registry; sheets no registry claims are left out.
    pub fn plan<S: AsRef<str>>(&self, sheet_names: &[S]) -> Vec<Assignment> {
        let mut plan = Vec::new();
        for (sheet_index, name) in sheet_names.iter().enumerate() {
            let name = name.as_ref();
            let config_key = self
                .config
                .sheet_config_for(name)
                .map(|(key, _)| key.to_string());
            for registry_index in self.routes_for(name) {
                plan.push(Assignment {
                    sheet_index,
                    sheet_name: name.to_string(),
                    registry: self.registries[registry_index].name().to_string(),
                    config_key: config_key.clone(),
                    registry_index,
                });
            }
        }
        plan
    }

    /// Reconcile every routed sheet of the workbook in `store`.
    ///
    /// Saves at checkpoints, after each sheet and once more at the end. On
    /// failure a last save is attempted before the error is returned.
    pub fn run_workbook<S: WorkbookStore + ?Sized>(
        &self,
        store: &mut S,
        options: &RunOptions,
    ) -> Result<RunSummary, ReconError> {
        let names: Vec<String> = store
            .workbook()
            .sheet_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let plan = self.plan(&names);

        let mut summary = RunSummary::default();
        for name in &names {
            if self.routes_for(name).next().is_none() {
                debug!(sheet = %name, "no registry for sheet");
                summary.unmatched.push(name.clone());
            }
        }

        let mut checkpointer = Checkpointer::new(options.numrec_before_save);
        let result = self.run_plan(store, &plan, options, &mut checkpointer, &mut summary);

        match result {
            Ok(()) => {
                store.save()?;
                info!(
                    sheets = summary.sheets.len(),
                    processed = summary.processed,
                    skipped = summary.skipped,
                    "run complete"
                );
                Ok(summary)
            }
            Err(e) => {
                if let Err(save_err) = store.save() {
                    error!(error = %save_err, "final save after failure also failed");
                }
                Err(e)
            }
        }
    }

    fn run_plan<S: WorkbookStore + ?Sized>(
        &self,
        store: &mut S,
        plan: &[Assignment],
        options: &RunOptions,
        checkpointer: &mut Checkpointer,
        summary: &mut RunSummary,
    ) -> Result<(), ReconError> {
        let reconcile = options.reconcile();
        for assignment in plan {
            let Some((key, sheet_config)) = self.config.sheet_config_for(&assignment.sheet_name)
            else {
                warn!(
                    sheet = %assignment.sheet_name,
                    registry = %assignment.registry,
                    "no sheets_config entry for sheet, skipping"
                );
                if !summary.unconfigured.contains(&assignment.sheet_name) {
                    summary.unconfigured.push(assignment.sheet_name.clone());
                }
                continue;
            };

            let registry = self.registries[assignment.registry_index].as_ref();
            info!(
                sheet = %assignment.sheet_name,
                registry = registry.name(),
                layout = key,
                "checking sheet"
            );
            let sheet = reconcile_sheet(
                store,
                assignment.sheet_index,
                registry,
                sheet_config,
                &reconcile,
                checkpointer,
            )?;
            store.save()?;

            summary.processed += sheet.processed();
            summary.skipped += sheet.skipped;
            summary.checkpoints += sheet.checkpoints;
            summary.sheets.push(sheet);
        }
        Ok(())
    }
}
