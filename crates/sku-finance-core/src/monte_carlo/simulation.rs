use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{LogNormal, Normal, Triangular, Uniform};
use std::time::Instant;
use tracing::warn;

use crate::business_case::BusinessCase;
use crate::config::EngineConfig;
use crate::error::SkuFinanceError;
use crate::scenarios::{
    evaluate_with_overrides, run_baseline, run_batch, BatchOptions, MetricValues,
    ObjectiveMetric, ParameterPath,
};
use crate::types::{with_metadata_precision, ComputationOutput};
use crate::SkuFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Probability distribution for one simulated input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McDistribution {
    Normal { mean: f64, std_dev: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
}

/// How a draw is applied to the parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMode {
    /// The draw replaces the value
    #[default]
    Absolute,
    /// The draw scales the case's own value
    Multiplier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationVariable {
    pub path: String,
    pub distribution: McDistribution,
    #[serde(default)]
    pub mode: SampleMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub variables: Vec<SimulationVariable>,
    pub metrics: Vec<ObjectiveMetric>,
    /// Number of simulation paths (minimum 100).
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Fixed seed makes the whole run reproducible.
    pub seed: Option<u64>,
}

fn default_num_simulations() -> u32 {
    1_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McPercentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: McPercentiles,
    pub probability_positive: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDistribution {
    pub metric: ObjectiveMetric,
    pub defined_runs: usize,
    /// Runs where the metric had no value (failed run, IRR without sign change, ...)
    pub undefined_runs: usize,
    /// Absent when no run produced a value
    pub statistics: Option<MetricStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub num_simulations: u32,
    pub baseline: MetricValues,
    pub metrics: Vec<MetricDistribution>,
    pub failed_runs: usize,
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

fn invalid_distribution(index: usize, what: &str, e: impl std::fmt::Display) -> SkuFinanceError {
    SkuFinanceError::InvalidInput {
        field: format!("variables[{index}].distribution"),
        reason: format!("Invalid {what} parameters: {e}"),
    }
}

/// Sampler bound to validated distribution parameters.
enum Sampler {
    Normal(Normal),
    LogNormal(LogNormal),
    Triangular(Triangular),
    Uniform(Uniform),
}

impl Sampler {
    fn new(index: usize, dist: &McDistribution) -> SkuFinanceResult<Self> {
        Ok(match dist {
            McDistribution::Normal { mean, std_dev } => Sampler::Normal(
                Normal::new(*mean, *std_dev).map_err(|e| invalid_distribution(index, "Normal", e))?,
            ),
            McDistribution::LogNormal { mu, sigma } => Sampler::LogNormal(
                LogNormal::new(*mu, *sigma)
                    .map_err(|e| invalid_distribution(index, "LogNormal", e))?,
            ),
            McDistribution::Triangular { min, mode, max } => Sampler::Triangular(
                Triangular::new(*min, *max, *mode)
                    .map_err(|e| invalid_distribution(index, "Triangular", e))?,
            ),
            McDistribution::Uniform { min, max } => Sampler::Uniform(
                Uniform::new(*min, *max).map_err(|e| invalid_distribution(index, "Uniform", e))?,
            ),
        })
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Sampler::Normal(d) => rng.sample(d),
            Sampler::LogNormal(d) => rng.sample(d),
            Sampler::Triangular(d) => rng.sample(d),
            Sampler::Uniform(d) => rng.sample(d),
        }
    }
}

struct BoundVariable {
    path: ParameterPath,
    sampler: Sampler,
    mode: SampleMode,
    /// The case's own value, used by `Multiplier`
    base: Decimal,
}

fn bind_variables(
    case: &BusinessCase,
    variables: &[SimulationVariable],
    config: &EngineConfig,
) -> SkuFinanceResult<Vec<BoundVariable>> {
    variables
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let path: ParameterPath = v.path.parse()?;
            let base = path.get(case, config)?;
            Ok(BoundVariable {
                path,
                sampler: Sampler::new(i, &v.distribution)?,
                mode: v.mode,
                base,
            })
        })
        .collect()
}

/// Draw every run's overrides up front, sequentially, so a seed fixes the
/// whole batch regardless of how it is scheduled.
fn draw_overrides(
    bound: &[BoundVariable],
    runs: usize,
    rng: &mut StdRng,
) -> SkuFinanceResult<Vec<Vec<(ParameterPath, Decimal)>>> {
    (0..runs)
        .map(|_| {
            bound
                .iter()
                .map(|v| {
                    let draw = v.sampler.sample(rng);
                    let draw = Decimal::from_f64(draw).ok_or_else(|| SkuFinanceError::Overflow {
                        context: format!("sample {draw} for {}", v.path),
                    })?;
                    let value = match v.mode {
                        SampleMode::Absolute => draw,
                        SampleMode::Multiplier => v.base * draw,
                    };
                    Ok((v.path, value))
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Percentile of a **sorted** slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn compute_statistics(values: &mut [f64]) -> Option<MetricStatistics> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(MetricStatistics {
        mean,
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[values.len() - 1],
        percentiles: McPercentiles {
            p5: percentile_sorted(values, 5.0),
            p10: percentile_sorted(values, 10.0),
            p25: percentile_sorted(values, 25.0),
            p50: percentile_sorted(values, 50.0),
            p75: percentile_sorted(values, 75.0),
            p90: percentile_sorted(values, 90.0),
            p95: percentile_sorted(values, 95.0),
        },
        probability_positive: values.iter().filter(|v| **v > 0.0).count() as f64 / n,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sample uncertain inputs and report the distribution of each metric.
///
/// Every path is resolved and every distribution validated before the first
/// draw. Runs that fail in the pipeline count as undefined for every metric.
pub fn simulate(
    case: &BusinessCase,
    input: &SimulationInput,
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.num_simulations < 100 {
        return Err(SkuFinanceError::InvalidInput {
            field: "num_simulations".into(),
            reason: "Must be at least 100".into(),
        });
    }
    if input.variables.is_empty() {
        return Err(SkuFinanceError::InsufficientData(
            "At least one variable is required".into(),
        ));
    }
    if input.metrics.is_empty() {
        return Err(SkuFinanceError::InsufficientData(
            "At least one objective metric required".into(),
        ));
    }

    let bound = bind_variables(case, &input.variables, config)?;
    let baseline = run_baseline(case, &input.metrics, config)?;

    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => {
            warnings.push("No seed given; results are not reproducible".into());
            StdRng::from_entropy()
        }
    };

    let n = input.num_simulations as usize;
    let draws = draw_overrides(&bound, n, &mut rng)?;
    let runs = run_batch("monte_carlo", &draws, options, config, |overrides| {
        evaluate_with_overrides(case, overrides, &input.metrics, config)
    })?;

    let failed_runs = runs.iter().filter(|r| r.is_err()).count();
    if failed_runs > 0 {
        warn!(failed_runs, "simulation runs failed");
        warnings.push(format!("{failed_runs} of {n} runs failed in the pipeline"));
    }

    let metrics = input
        .metrics
        .iter()
        .map(|metric| {
            let mut values: Vec<f64> = runs
                .iter()
                .filter_map(|r| r.as_ref().ok())
                .filter_map(|m| m.get(metric).copied().flatten())
                .filter_map(|d| d.to_f64())
                .collect();
            MetricDistribution {
                metric: *metric,
                defined_runs: values.len(),
                undefined_runs: n - values.len(),
                statistics: compute_statistics(&mut values),
            }
        })
        .collect();

    let output = SimulationOutput {
        num_simulations: input.num_simulations,
        baseline,
        metrics,
        failed_runs,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_precision(
        "Monte Carlo simulation over business-case inputs",
        &serde_json::json!({
            "case_id": case.id,
            "num_simulations": input.num_simulations,
            "seed": input.seed,
            "variables": input.variables.iter().map(|v| &v.path).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        "ieee754_f64",
        output,
    ))
}
