use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use sku_finance_core::business_case::BusinessCase;
use sku_finance_core::monte_carlo::{self, SimulationInput};
use sku_finance_core::scenarios::{
    self, parse_metrics, tornado, BatchOptions, MetricValues, ObjectiveMetric, OptimizationInput,
    ScenarioDefinition, SensitivitySpec, TwoWayGridInput,
};
use sku_finance_core::EngineConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(json: &str) -> NapiResult<T> {
    serde_json::from_str(json).map_err(to_napi_error)
}

/// Engine configuration from an optional JSON document.
fn engine_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config = match config_json {
        Some(json) => parse::<EngineConfig>(&json)?,
        None => EngineConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

fn metrics_or_all(names: &[String]) -> NapiResult<Vec<ObjectiveMetric>> {
    if names.is_empty() {
        return Ok(ObjectiveMetric::ALL.to_vec());
    }
    parse_metrics(names).map_err(to_napi_error)
}

fn to_json<T: serde::Serialize>(value: &T) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct BaselineRequest {
    case: BusinessCase,
    #[serde(default)]
    metrics: Vec<String>,
}

#[derive(Deserialize)]
struct SensitivityRequest {
    case: BusinessCase,
    specs: Vec<SensitivitySpec>,
    #[serde(default)]
    metrics: Vec<String>,
    #[serde(default)]
    baseline: Option<MetricValues>,
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

#[derive(Deserialize)]
struct SimulateRequest {
    case: BusinessCase,
    #[serde(flatten)]
    simulation: SimulationInput,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Bare projection of a business case, for callers that read `by_sku[i].prices`.
#[napi]
pub fn calculate(case_json: String, config_json: Option<String>) -> NapiResult<String> {
    let case: BusinessCase = parse(&case_json)?;
    let config = engine_config(config_json)?;
    let output = sku_finance_core::calculate_with_config(&case, &config).map_err(to_napi_error)?;
    to_json(&output)
}

/// Full projection wrapped in the computation envelope.
#[napi]
pub fn calculate_case(case_json: String, config_json: Option<String>) -> NapiResult<String> {
    let case: BusinessCase = parse(&case_json)?;
    let config = engine_config(config_json)?;
    let output = sku_finance_core::calculate_case(&case, &config).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn run_baseline(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: BaselineRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let metrics = metrics_or_all(&request.metrics)?;
    let values = scenarios::run_baseline(&request.case, &metrics, &config).map_err(to_napi_error)?;
    to_json(&values)
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[napi]
pub fn run_sensitivity(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: SensitivityRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let metrics = metrics_or_all(&request.metrics)?;
    let report = scenarios::run_sensitivity(
        &request.case,
        &request.specs,
        &metrics,
        request.baseline,
        &config,
        &BatchOptions::from_config(&config),
    )
    .map_err(to_napi_error)?;
    let bars = request.tornado.map(|metric| tornado(&report, metric));
    to_json(&serde_json::json!({ "result": report, "tornado": bars }))
}

#[napi]
pub fn run_scenarios(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: ScenariosRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let metrics = metrics_or_all(&request.metrics)?;
    let report = scenarios::run_scenarios(
        &request.case,
        &request.scenarios,
        &metrics,
        &config,
        &BatchOptions::from_config(&config),
    )
    .map_err(to_napi_error)?;
    to_json(&report)
}

#[napi]
pub fn run_two_way_grid(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: GridRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let grid = scenarios::run_two_way_grid(
        &request.case,
        &request.grid,
        &config,
        &BatchOptions::from_config(&config),
    )
    .map_err(to_napi_error)?;
    to_json(&grid)
}

#[napi]
pub fn optimize(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: OptimizeRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let result = scenarios::optimize(
        &request.case,
        &request.optimization,
        &config,
        &BatchOptions::from_config(&config),
    )
    .map_err(to_napi_error)?;
    to_json(&result)
}

// ---------------------------------------------------------------------------
// Monte Carlo
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: SimulateRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let output = monte_carlo::simulate(
        &request.case,
        &request.simulation,
        &config,
        &BatchOptions::from_config(&config),
    )
    .map_err(to_napi_error)?;
    to_json(&output)
}
