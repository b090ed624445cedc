use serde::Deserialize;
use serde_json::{json, Value};

use sku_finance_core::business_case::BusinessCase;
use sku_finance_core::scenarios::{
    optimize, run_scenarios, run_sensitivity, run_two_way_grid, tornado, MetricValues,
    ObjectiveMetric, OptimizationInput, ScenarioDefinition, SensitivitySpec, TwoWayGridInput,
};
use sku_finance_core::EngineConfig;

use super::{metrics_or_all, BatchArgs};
use crate::input;

#[derive(Deserialize)]
struct SensitivityRequest {
    case: BusinessCase,
    specs: Vec<SensitivitySpec>,
    #[serde(default)]
    metrics: Vec<String>,
    /// Precomputed baseline; skips the baseline run
    #[serde(default)]
    baseline: Option<MetricValues>,
    /// Metric to rank a tornado chart by
    #[serde(default)]
    tornado: Option<ObjectiveMetric>,
}

#[derive(Deserialize)]
struct ScenariosRequest {
    case: BusinessCase,
    scenarios: Vec<ScenarioDefinition>,
    #[serde(default)]
    metrics: Vec<String>,
}

#[derive(Deserialize)]
struct GridRequest {
    case: BusinessCase,
    #[serde(flatten)]
    grid: TwoWayGridInput,
}

#[derive(Deserialize)]
struct OptimizeRequest {
    case: BusinessCase,
    #[serde(flatten)]
    optimization: OptimizationInput,
}

pub fn run_sensitivity_batch(
    args: BatchArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SensitivityRequest = input::read_request(args.input.as_deref(), "sensitivity")?;
    let metrics = metrics_or_all(&request.metrics)?;
    let report = run_sensitivity(
        &request.case,
        &request.specs,
        &metrics,
        request.baseline,
        config,
        &args.options(config),
    )?;
    match request.tornado {
        Some(metric) => {
            let bars = tornado(&report, metric);
            Ok(json!({ "result": report, "tornado": bars }))
        }
        None => Ok(json!({ "result": report })),
    }
}

pub fn run_scenario_batch(
    args: BatchArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ScenariosRequest = input::read_request(args.input.as_deref(), "scenarios")?;
    let metrics = metrics_or_all(&request.metrics)?;
    let report = run_scenarios(
        &request.case,
        &request.scenarios,
        &metrics,
        config,
        &args.options(config),
    )?;
    Ok(json!({ "result": report }))
}

pub fn run_grid(args: BatchArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let request: GridRequest = input::read_request(args.input.as_deref(), "grid")?;
    let grid = run_two_way_grid(&request.case, &request.grid, config, &args.options(config))?;
    Ok(json!({ "result": grid }))
}

pub fn run_optimize(
    args: BatchArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: OptimizeRequest = input::read_request(args.input.as_deref(), "optimize")?;
    let result = optimize(
        &request.case,
        &request.optimization,
        config,
        &args.options(config),
    )?;
    Ok(json!({ "result": result }))
}
