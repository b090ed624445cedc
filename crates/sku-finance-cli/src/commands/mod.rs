pub mod analysis;
pub mod calculate;
pub mod simulate;

use clap::Args;
use sku_finance_core::scenarios::{parse_metrics, BatchOptions, ObjectiveMetric};
use sku_finance_core::EngineConfig;

/// Request document for single-run commands
#[derive(Args)]
pub struct InputArgs {
    /// Path to a JSON or YAML request file (stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Request document plus batch limits
#[derive(Args)]
pub struct BatchArgs {
    /// Path to a JSON or YAML request file (stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Worker threads for the batch (defaults to the config, then all cores)
    #[arg(long)]
    pub max_parallelism: Option<usize>,

    /// Largest batch accepted (defaults to the config's max_batch_runs)
    #[arg(long)]
    pub max_runs: Option<usize>,
}

impl BatchArgs {
    pub fn options(&self, config: &EngineConfig) -> BatchOptions {
        BatchOptions {
            max_parallelism: self.max_parallelism.or(config.max_parallelism),
            max_runs: self.max_runs.or(Some(config.max_batch_runs)),
            cancel: None,
        }
    }
}

/// Named metrics, or every metric when none are given.
pub fn metrics_or_all(names: &[String]) -> Result<Vec<ObjectiveMetric>, Box<dyn std::error::Error>> {
    if names.is_empty() {
        return Ok(ObjectiveMetric::ALL.to_vec());
    }
    Ok(parse_metrics(names)?)
}
