use serde::Deserialize;
use serde_json::{json, Value};

use sku_finance_core::business_case::BusinessCase;
use sku_finance_core::scenarios::run_baseline;
use sku_finance_core::{calculate_case, EngineConfig};

use super::{metrics_or_all, InputArgs};
use crate::input;

#[derive(Deserialize)]
struct BaselineRequest {
    case: BusinessCase,
    #[serde(default)]
    metrics: Vec<String>,
}

pub fn run_calculate(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let case: BusinessCase = input::read_request(args.input.as_deref(), "calculate")?;
    let result = calculate_case(&case, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_baseline_metrics(
    args: InputArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: BaselineRequest = input::read_request(args.input.as_deref(), "baseline")?;
    let metrics = metrics_or_all(&request.metrics)?;
    let values = run_baseline(&request.case, &metrics, config)?;
    Ok(json!({ "result": values }))
}
