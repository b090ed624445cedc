pub mod batch;
pub mod metrics;
pub mod optimization;
pub mod path;
pub mod scenario;
pub mod sensitivity;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::business_case::BusinessCase;
use crate::calculation::calculate_with_config;
use crate::config::EngineConfig;
use crate::error::SkuFinanceError;
use crate::SkuFinanceResult;

pub use batch::{run_batch, BatchOptions, CancellationToken};
pub use metrics::{extract_metrics, MetricValues, ObjectiveMetric};
pub use optimization::{
    optimize, GridAxis, OptimizationInput, OptimizationMethod, OptimizationResult,
    OptimizationTrial,
};
pub use path::{FinanceField, ParameterPath, SkuField};
pub use scenario::{run_scenarios, ScenarioDefinition, ScenarioReport, ScenarioResult};
pub use sensitivity::{
    run_sensitivity, run_two_way_grid, tornado, SensitivityRecord, SensitivityReport,
    SensitivitySpec, SweepAxis, TornadoBar, TwoWayGrid, TwoWayGridInput,
};

/// A failed run inside a batch. Siblings still complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    /// Sensitivity variable or scenario id the failure belongs to
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Decimal>,
    pub kind: String,
    pub message: String,
}

impl RunError {
    pub fn new(id: impl Into<String>, delta: Option<Decimal>, err: &SkuFinanceError) -> Self {
        Self {
            id: id.into(),
            delta,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Metrics of the unmodified case.
pub fn run_baseline(
    case: &BusinessCase,
    metrics: &[ObjectiveMetric],
    config: &EngineConfig,
) -> SkuFinanceResult<MetricValues> {
    let out = calculate_with_config(case, config)?;
    Ok(extract_metrics(&out, metrics))
}

/// The recompute-and-extract primitive every batch is built on: clone the
/// case, write each override, run the pipeline, read the metrics.
pub fn evaluate_with_overrides(
    case: &BusinessCase,
    overrides: &[(ParameterPath, Decimal)],
    metrics: &[ObjectiveMetric],
    config: &EngineConfig,
) -> SkuFinanceResult<MetricValues> {
    let mut perturbed = case.clone();
    for (path, value) in overrides {
        path.set(&mut perturbed, config, *value)?;
    }
    debug!(case_id = %case.id, overrides = overrides.len(), "evaluating perturbed case");
    run_baseline(&perturbed, metrics, config)
}

/// Parse every metric name, failing on the first unknown one.
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> SkuFinanceResult<Vec<ObjectiveMetric>> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

fn require_metrics(metrics: &[ObjectiveMetric]) -> SkuFinanceResult<()> {
    if metrics.is_empty() {
        return Err(SkuFinanceError::InsufficientData(
            "At least one objective metric required".into(),
        ));
    }
    Ok(())
}
