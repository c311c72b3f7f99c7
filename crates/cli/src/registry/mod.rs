//! Register adapters and the table that builds them by name.

pub mod boards;
pub mod common;
pub mod pool_safety;
pub mod qbcc;
pub mod search_page;
pub mod surveyors;

use regcheck_recon::{CheckConfig, Registry};

use crate::CliError;
use boards::{Board, BoardRegistry, ARCHITECTS_BASE, ENGINEERS_BASE};
use common::{Endpoint, FetchError};
use pool_safety::{PoolSafetyRegistry, POOL_SAFETY_BASE};
use qbcc::{QbccKind, QbccRegistry, QBCC_BASE};
use surveyors::{SurveyorsRegistry, SURVEYORS_BASE};

/// Every adapter, in routing order. A sheet name that satisfies several
/// keyword sets is checked by each of those adapters in this order.
pub const REGISTRY_NAMES: &[&str] = &[
    "pool-safety",
    "qbcc-individual",
    "qbcc-company",
    "qbcc-certifier",
    "surveyors",
    "architects",
    "engineers",
];

/// Build one adapter, applying `[registries.<name>]` overrides.
pub fn build(name: &str, config: &CheckConfig) -> Result<Box<dyn Registry>, CliError> {
    let endpoint = |default_base: &str| Endpoint::resolve(default_base, config.registries.get(name));

    let built: Result<Box<dyn Registry>, FetchError> = match name {
        "pool-safety" => PoolSafetyRegistry::new(endpoint(POOL_SAFETY_BASE)).map(boxed),
        "qbcc-individual" => QbccRegistry::new(QbccKind::Individual, endpoint(QBCC_BASE)).map(boxed),
        "qbcc-company" => QbccRegistry::new(QbccKind::Company, endpoint(QBCC_BASE)).map(boxed),
        "qbcc-certifier" => QbccRegistry::new(QbccKind::Certifier, endpoint(QBCC_BASE)).map(boxed),
        "surveyors" => SurveyorsRegistry::new(endpoint(SURVEYORS_BASE)).map(boxed),
        "architects" => BoardRegistry::new(Board::Architects, endpoint(ARCHITECTS_BASE)).map(boxed),
        "engineers" => BoardRegistry::new(Board::Engineers, endpoint(ENGINEERS_BASE)).map(boxed),
        other => {
            return Err(CliError::args(format!("unknown registry {other:?}"))
                .with_hint(format!("available: {}", REGISTRY_NAMES.join(", "))))
        }
    };

    built.map_err(|e| CliError::general(format!("{name}: {e}")))
}

/// Build the selected adapters in routing order; an empty selection means
/// all of them. Duplicates collapse.
pub fn build_selected(
    selected: &[String],
    config: &CheckConfig,
) -> Result<Vec<Box<dyn Registry>>, CliError> {
    for name in selected {
        if !REGISTRY_NAMES.contains(&name.as_str()) {
            return Err(CliError::args(format!("unknown registry {name:?}"))
                .with_hint(format!("available: {}", REGISTRY_NAMES.join(", "))));
        }
    }
    REGISTRY_NAMES
        .iter()
        .filter(|name| selected.is_empty() || selected.iter().any(|s| s == *name))
        .map(|name| build(name, config))
        .collect()
}

fn boxed<R: Registry + 'static>(registry: R) -> Box<dyn Registry> {
    Box::new(registry)
}
