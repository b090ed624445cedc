use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::business_case::BusinessCase;
use crate::config::EngineConfig;
use crate::error::SkuFinanceError;
use crate::SkuFinanceResult;

use super::batch::{run_batch, BatchOptions};
use super::metrics::{undefined_metrics, MetricValues, ObjectiveMetric};
use super::path::ParameterPath;
use super::{evaluate_with_overrides, require_metrics, run_baseline, RunError};

// ---------------------------------------------------------------------------
// One-way sensitivity
// ---------------------------------------------------------------------------

/// One input to perturb and the deltas to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivitySpec {
    #[serde(alias = "variable_id")]
    pub id: String,
    pub path: String,
    pub deltas: Vec<Decimal>,
    /// `true`: `v × (1 + δ)`; `false`: `v + δ`
    #[serde(default)]
    pub percent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRecord {
    pub variable_id: String,
    pub path: String,
    pub delta: Decimal,
    /// Value the case held for the run (counts rounded); absent when the
    /// path did not resolve or the perturbation overflowed
    pub applied_value: Option<Decimal>,
    pub metrics: MetricValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub baseline: MetricValues,
    /// One record per (variable, delta), in input order
    pub results: Vec<SensitivityRecord>,
    pub errors: Vec<RunError>,
}

struct Job<'a> {
    spec: &'a SensitivitySpec,
    delta: Decimal,
    resolved: Result<ParameterPath, &'a SkuFinanceError>,
    /// Value the path holds once perturbed; `None` when unresolved
    applied: Option<SkuFinanceResult<Decimal>>,
}

fn perturb(current: Decimal, delta: Decimal, percent: bool) -> SkuFinanceResult<Decimal> {
    let next = if percent {
        Decimal::ONE
            .checked_add(delta)
            .and_then(|factor| current.checked_mul(factor))
    } else {
        current.checked_add(delta)
    };
    next.ok_or_else(|| SkuFinanceError::Overflow {
        context: format!("perturbing {current} by {delta}"),
    })
}

/// Re-run the case once per (variable, delta).
///
/// A variable whose path does not parse or resolve still yields one record per
/// delta. Those records carry the baseline metrics and an `error` tag, and
/// the failure is listed once in `errors`. A perturbed case that fails in
/// the pipeline yields undefined metrics and its own `errors` entry.
pub fn run_sensitivity(
    case: &BusinessCase,
    specs: &[SensitivitySpec],
    metrics: &[ObjectiveMetric],
    baseline_override: Option<MetricValues>,
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<SensitivityReport> {
    require_metrics(metrics)?;
    let baseline = match baseline_override {
        Some(b) => b,
        None => run_baseline(case, metrics, config)?,
    };

    let resolutions: Vec<SkuFinanceResult<(ParameterPath, Decimal)>> = specs
        .iter()
        .map(|spec| {
            let path: ParameterPath = spec.path.parse()?;
            let current = path.get(case, config)?;
            Ok((path, current))
        })
        .collect();

    let mut errors = Vec::new();
    for (spec, resolution) in specs.iter().zip(resolutions.iter()) {
        if let Err(e) = resolution {
            warn!(spec = %spec.id, path = %spec.path, error = %e, "sensitivity path unresolved");
            errors.push(RunError::new(&spec.id, None, e));
        }
    }

    let jobs: Vec<Job> = specs
        .iter()
        .zip(resolutions.iter())
        .flat_map(|(spec, resolution)| {
            spec.deltas.iter().map(move |delta| Job {
                spec,
                delta: *delta,
                resolved: resolution.as_ref().map(|(p, _)| *p),
                applied: resolution.as_ref().ok().map(|(path, current)| {
                    perturb(*current, *delta, spec.percent)
                        .and_then(|v| path.written_value(case, config, v))
                }),
            })
        })
        .collect();

    let outcomes = run_batch("sensitivity", &jobs, options, config, |job| {
        match (&job.resolved, &job.applied) {
            (Ok(path), Some(Ok(value))) => {
                evaluate_with_overrides(case, &[(*path, *value)], metrics, config)
            }
            (Ok(_), Some(Err(e))) => Err(e.clone()),
            _ => Ok(baseline.clone()),
        }
    })?;

    let mut results = Vec::with_capacity(jobs.len());
    for (job, outcome) in jobs.iter().zip(outcomes) {
        let (metrics_out, error) = match (job.resolved, outcome) {
            (Err(e), _) => (baseline.clone(), Some(e.to_string())),
            (Ok(_), Ok(values)) => (values, None),
            (Ok(_), Err(e)) => {
                warn!(spec = %job.spec.id, delta = %job.delta, error = %e, "sensitivity run failed");
                errors.push(RunError::new(&job.spec.id, Some(job.delta), &e));
                (undefined_metrics(metrics), Some(e.to_string()))
            }
        };
        results.push(SensitivityRecord {
            variable_id: job.spec.id.clone(),
            path: job.spec.path.clone(),
            delta: job.delta,
            applied_value: job.applied.as_ref().and_then(|a| a.as_ref().ok()).copied(),
            metrics: metrics_out,
            error,
        });
    }

    Ok(SensitivityReport {
        baseline,
        results,
        errors,
    })
}

// ---------------------------------------------------------------------------
// Tornado
// ---------------------------------------------------------------------------

/// Swing of one metric across a variable's smallest and largest delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoBar {
    pub variable_id: String,
    pub path: String,
    pub low_delta: Decimal,
    pub high_delta: Decimal,
    pub low_value: Decimal,
    pub high_value: Decimal,
    pub swing: Decimal,
}

/// Rank specs by how far `metric` moves between their extreme deltas.
/// Specs without at least one defined, error-free record are skipped.
pub fn tornado(report: &SensitivityReport, metric: ObjectiveMetric) -> Vec<TornadoBar> {
    let mut order: Vec<&str> = Vec::new();
    for r in &report.results {
        if !order.contains(&r.variable_id.as_str()) {
            order.push(&r.variable_id);
        }
    }

    let mut bars: Vec<TornadoBar> = order
        .into_iter()
        .filter_map(|id| {
            let points: Vec<(Decimal, Decimal, &str)> = report
                .results
                .iter()
                .filter(|r| r.variable_id == id && r.error.is_none())
                .filter_map(|r| {
                    r.metrics
                        .get(&metric)
                        .copied()
                        .flatten()
                        .map(|v| (r.delta, v, r.path.as_str()))
                })
                .collect();
            let low = points.iter().min_by_key(|p| p.0)?;
            let high = points.iter().max_by_key(|p| p.0)?;
            Some(TornadoBar {
                variable_id: id.to_string(),
                path: low.2.to_string(),
                low_delta: low.0,
                high_delta: high.0,
                low_value: low.1,
                high_value: high.1,
                swing: (high.1 - low.1).abs(),
            })
        })
        .collect();

    bars.sort_by(|a, b| b.swing.cmp(&a.swing));
    bars
}

// ---------------------------------------------------------------------------
// Two-way grid
// ---------------------------------------------------------------------------

/// Absolute values to sweep for one input, from `min` to `max` by `step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepAxis {
    pub path: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoWayGridInput {
    pub x: SweepAxis,
    pub y: SweepAxis,
    pub metric: ObjectiveMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayGrid {
    pub x_path: String,
    pub y_path: String,
    pub x_values: Vec<Decimal>,
    pub y_values: Vec<Decimal>,
    pub metric: ObjectiveMetric,
    /// `matrix[i][j]` is the metric at `x = x_values[i]`, `y = y_values[j]`
    pub matrix: Vec<Vec<Option<Decimal>>>,
    pub base_case_value: Option<Decimal>,
    /// Cell nearest the midpoint of both ranges (row, col)
    pub base_case_position: (usize, usize),
    pub errors: Vec<RunError>,
}

/// Sweep values from min to max with step; max is always included.
pub fn generate_sweep_values(axis: &SweepAxis) -> SkuFinanceResult<Vec<Decimal>> {
    if axis.step <= Decimal::ZERO {
        return Err(SkuFinanceError::InvalidInput {
            field: format!("axis:{}", axis.path),
            reason: "Step must be positive".into(),
        });
    }
    if axis.min > axis.max {
        return Err(SkuFinanceError::InvalidInput {
            field: format!("axis:{}", axis.path),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = axis.min;
    while current <= axis.max {
        values.push(current);
        current += axis.step;
    }
    if let Some(&last) = values.last() {
        if last < axis.max {
            values.push(axis.max);
        }
    }

    Ok(values)
}

/// Index of the value closest to `target`.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate `metric` over the Cartesian product of two swept inputs.
/// Both paths must resolve; a failing cell is left undefined and reported.
pub fn run_two_way_grid(
    case: &BusinessCase,
    input: &TwoWayGridInput,
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<TwoWayGrid> {
    let x_path: ParameterPath = input.x.path.parse()?;
    let y_path: ParameterPath = input.y.path.parse()?;
    x_path.check(case)?;
    y_path.check(case)?;

    let x_values = generate_sweep_values(&input.x)?;
    let y_values = generate_sweep_values(&input.y)?;
    let cells: Vec<(Decimal, Decimal)> = x_values
        .iter()
        .flat_map(|x| y_values.iter().map(move |y| (*x, *y)))
        .collect();

    let metrics = [input.metric];
    let outcomes = run_batch("two_way_grid", &cells, options, config, |(x, y)| {
        evaluate_with_overrides(case, &[(x_path, *x), (y_path, *y)], &metrics, config)
    })?;

    let mut errors = Vec::new();
    let mut flat = Vec::with_capacity(cells.len());
    for ((x, y), outcome) in cells.iter().zip(outcomes) {
        match outcome {
            Ok(values) => flat.push(values.get(&input.metric).copied().flatten()),
            Err(e) => {
                errors.push(RunError::new(format!("({x}, {y})"), None, &e));
                flat.push(None);
            }
        }
    }
    let matrix: Vec<Vec<Option<Decimal>>> = flat
        .chunks(y_values.len().max(1))
        .map(|row| row.to_vec())
        .collect();

    let mid_x = (input.x.min + input.x.max) / dec!(2);
    let mid_y = (input.y.min + input.y.max) / dec!(2);
    let base_row = closest_index(&x_values, mid_x);
    let base_col = closest_index(&y_values, mid_y);
    let base_case_value = matrix
        .get(base_row)
        .and_then(|row| row.get(base_col))
        .copied()
        .flatten();

    Ok(TwoWayGrid {
        x_path: x_path.to_string(),
        y_path: y_path.to_string(),
        x_values,
        y_values,
        metric: input.metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
        errors,
    })
}
