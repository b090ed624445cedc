//! Goal seeking: find input values that drive one metric to a target.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::business_case::BusinessCase;
use crate::config::EngineConfig;
use crate::error::{catch_abort, SkuFinanceError};
use crate::SkuFinanceResult;

use super::batch::{run_batch, BatchOptions};
use super::metrics::{MetricValues, ObjectiveMetric};
use super::path::ParameterPath;
use super::evaluate_with_overrides;

fn default_tolerance() -> Decimal {
    dec!(0.0001)
}

fn default_max_iterations() -> u32 {
    50
}

/// One search axis: a path and the explicit values to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridAxis {
    pub path: String,
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OptimizationMethod {
    /// Cartesian product of every axis, evaluated as one batch
    GridSearch { axes: Vec<GridAxis> },
    /// Interval halving on one path; the metric must be monotone in it
    Bisection {
        path: String,
        lower: Decimal,
        upper: Decimal,
        #[serde(default = "default_max_iterations")]
        max_iterations: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationInput {
    pub metric: ObjectiveMetric,
    pub target: Decimal,
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    #[serde(flatten)]
    pub method: OptimizationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTrial {
    pub values: BTreeMap<String, Decimal>,
    pub metric_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub metric: ObjectiveMetric,
    pub target: Decimal,
    /// Inputs of the closest trial; empty when no trial produced a value
    pub best_values: BTreeMap<String, Decimal>,
    pub achieved: Option<Decimal>,
    /// |achieved − target|
    pub gap: Option<Decimal>,
    pub evaluations: usize,
    pub converged: bool,
    pub trials: Vec<OptimizationTrial>,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn resolve_path(case: &BusinessCase, raw: &str) -> SkuFinanceResult<ParameterPath> {
    let path: ParameterPath = raw.parse()?;
    path.check(case)?;
    Ok(path)
}

fn trial(
    overrides: &[(ParameterPath, Decimal)],
    metric: ObjectiveMetric,
    outcome: SkuFinanceResult<MetricValues>,
) -> OptimizationTrial {
    let values = overrides
        .iter()
        .map(|(p, v)| (p.to_string(), *v))
        .collect();
    match outcome {
        Ok(m) => OptimizationTrial {
            values,
            metric_value: m.get(&metric).copied().flatten(),
            error: None,
        },
        Err(e) => OptimizationTrial {
            values,
            metric_value: None,
            error: Some(e.to_string()),
        },
    }
}

fn evaluate(
    case: &BusinessCase,
    overrides: &[(ParameterPath, Decimal)],
    metric: ObjectiveMetric,
    config: &EngineConfig,
) -> OptimizationTrial {
    let outcome = catch_abort("bisection", || {
        evaluate_with_overrides(case, overrides, &[metric], config)
    });
    trial(overrides, metric, outcome)
}

fn gap_of(trial: &OptimizationTrial, target: Decimal) -> Option<Decimal> {
    trial.metric_value.map(|v| (v - target).abs())
}

fn summarise(input: &OptimizationInput, trials: Vec<OptimizationTrial>) -> OptimizationResult {
    let best = trials
        .iter()
        .filter_map(|t| gap_of(t, input.target).map(|g| (g, t)))
        .fold(None::<(Decimal, &OptimizationTrial)>, |acc, (g, t)| match acc {
            Some((best_gap, _)) if best_gap <= g => acc,
            _ => Some((g, t)),
        });

    let (best_values, achieved, gap) = match best {
        Some((g, t)) => (t.values.clone(), t.metric_value, Some(g)),
        None => (BTreeMap::new(), None, None),
    };

    OptimizationResult {
        metric: input.metric,
        target: input.target,
        best_values,
        achieved,
        gap,
        evaluations: trials.len(),
        converged: gap.is_some_and(|g| g <= input.tolerance),
        trials,
    }
}

// ---------------------------------------------------------------------------
// Grid search
// ---------------------------------------------------------------------------

fn cartesian(axes: &[(ParameterPath, Vec<Decimal>)]) -> Vec<Vec<(ParameterPath, Decimal)>> {
    axes.iter().fold(vec![Vec::new()], |combos, (path, values)| {
        combos
            .iter()
            .flat_map(|prefix| {
                values.iter().map(move |v| {
                    let mut next = prefix.clone();
                    next.push((*path, *v));
                    next
                })
            })
            .collect()
    })
}

fn grid_search(
    case: &BusinessCase,
    input: &OptimizationInput,
    axes: &[GridAxis],
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<OptimizationResult> {
    if axes.is_empty() {
        return Err(SkuFinanceError::InsufficientData(
            "Grid search needs at least one axis".into(),
        ));
    }
    let mut resolved = Vec::with_capacity(axes.len());
    for axis in axes {
        if axis.values.is_empty() {
            return Err(SkuFinanceError::InsufficientData(format!(
                "Grid axis '{}' has no values",
                axis.path
            )));
        }
        resolved.push((resolve_path(case, &axis.path)?, axis.values.clone()));
    }

    let combos = cartesian(&resolved);
    let outcomes = run_batch("grid_search", &combos, options, config, |overrides| {
        evaluate_with_overrides(case, overrides, &[input.metric], config)
    })?;
    let trials = combos
        .iter()
        .zip(outcomes)
        .map(|(overrides, outcome)| trial(overrides, input.metric, outcome))
        .collect();
    Ok(summarise(input, trials))
}

// ---------------------------------------------------------------------------
// Bisection
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn bisection(
    case: &BusinessCase,
    input: &OptimizationInput,
    raw_path: &str,
    lower: Decimal,
    upper: Decimal,
    max_iterations: u32,
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<OptimizationResult> {
    let path = resolve_path(case, raw_path)?;
    if lower >= upper {
        return Err(SkuFinanceError::InvalidInput {
            field: "method.lower".into(),
            reason: format!("lower ({lower}) must be below upper ({upper})"),
        });
    }
    let budget = options.max_runs.unwrap_or(config.max_batch_runs);
    let needed = max_iterations as usize + 2;
    if needed > budget {
        return Err(SkuFinanceError::InvalidInput {
            field: "max_runs".into(),
            reason: format!("bisection needs up to {needed} runs, budget is {budget}"),
        });
    }

    let target = input.target;
    let mut trials = Vec::new();
    let sample = |x: Decimal, trials: &mut Vec<OptimizationTrial>| -> SkuFinanceResult<Decimal> {
        if options.is_cancelled() {
            return Err(SkuFinanceError::Cancelled);
        }
        let trial = evaluate(case, &[(path, x)], input.metric, config);
        let value = trial.metric_value;
        let error = trial.error.clone();
        trials.push(trial);
        match value {
            Some(v) => Ok(v - target),
            None => Err(SkuFinanceError::InvalidInput {
                field: "method.path".into(),
                reason: format!(
                    "{} undefined at {path} = {x}{}",
                    input.metric,
                    error.map(|e| format!(" ({e})")).unwrap_or_default()
                ),
            }),
        }
    };

    let mut lo = lower;
    let mut hi = upper;
    let mut g_lo = sample(lo, &mut trials)?;
    let g_hi = sample(hi, &mut trials)?;

    if g_lo.abs() > input.tolerance
        && g_hi.abs() > input.tolerance
        && g_lo.is_sign_positive() == g_hi.is_sign_positive()
    {
        return Err(SkuFinanceError::InvalidInput {
            field: "target".into(),
            reason: format!(
                "{} does not cross {target} between {lower} and {upper}",
                input.metric
            ),
        });
    }

    if g_lo.abs() > input.tolerance && g_hi.abs() > input.tolerance {
        for iteration in 0..max_iterations {
            let mid = (lo + hi) / dec!(2);
            let g_mid = sample(mid, &mut trials)?;
            debug!(iteration, %mid, gap = %g_mid, "bisection step");
            if g_mid.abs() <= input.tolerance {
                break;
            }
            if g_mid.is_sign_positive() == g_lo.is_sign_positive() {
                lo = mid;
                g_lo = g_mid;
            } else {
                hi = mid;
            }
        }
    }

    let result = summarise(input, trials);
    info!(
        path = %path,
        evaluations = result.evaluations,
        converged = result.converged,
        "bisection finished"
    );
    Ok(result)
}

/// Search for the input values whose `metric` lands closest to `target`.
pub fn optimize(
    case: &BusinessCase,
    input: &OptimizationInput,
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<OptimizationResult> {
    if input.tolerance < Decimal::ZERO {
        return Err(SkuFinanceError::InvalidInput {
            field: "tolerance".into(),
            reason: "Tolerance cannot be negative".into(),
        });
    }
    match &input.method {
        OptimizationMethod::GridSearch { axes } => grid_search(case, input, axes, config, options),
        OptimizationMethod::Bisection {
            path,
            lower,
            upper,
            max_iterations,
        } => bisection(
            case,
            input,
            path,
            *lower,
            *upper,
            *max_iterations,
            config,
            options,
        ),
    }
}
