use serde::Deserialize;
use serde_json::Value;

use sku_finance_core::business_case::BusinessCase;
use sku_finance_core::monte_carlo::{simulate, SimulationInput};
use sku_finance_core::EngineConfig;

use super::BatchArgs;
use crate::input;

#[derive(Deserialize)]
struct SimulateRequest {
    case: BusinessCase,
    #[serde(flatten)]
    simulation: SimulationInput,
}

pub fn run_simulation(
    args: BatchArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SimulateRequest = input::read_request(args.input.as_deref(), "simulate")?;
    let result = simulate(
        &request.case,
        &request.simulation,
        config,
        &args.options(config),
    )?;
    Ok(serde_json::to_value(result)?)
}
