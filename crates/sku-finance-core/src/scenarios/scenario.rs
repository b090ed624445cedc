use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::business_case::BusinessCase;
use crate::config::EngineConfig;
use crate::error::SkuFinanceError;
use crate::types::Rate;
use crate::SkuFinanceResult;

use super::batch::{run_batch, BatchOptions};
use super::metrics::{undefined_metrics, MetricValues, ObjectiveMetric};
use super::path::ParameterPath;
use super::{evaluate_with_overrides, require_metrics, run_baseline, RunError};

const PROBABILITY_TOLERANCE: Decimal = dec!(0.001);

/// A named set of absolute overrides keyed by parameter path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub overrides: BTreeMap<String, Decimal>,
    /// Weight in the probability-weighted summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: String,
    pub name: String,
    pub metrics: MetricValues,
    /// Metric minus baseline; undefined when either side is
    pub deviations: MetricValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub baseline: MetricValues,
    pub results: Vec<ScenarioResult>,
    pub errors: Vec<RunError>,
    /// Σ probability × metric, present when every scenario has a probability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_weighted: Option<MetricValues>,
}

fn deviations(metrics: &MetricValues, baseline: &MetricValues) -> MetricValues {
    metrics
        .iter()
        .map(|(m, v)| {
            let base = baseline.get(m).copied().flatten();
            (*m, v.zip(base).map(|(v, b)| v - b))
        })
        .collect()
}

fn resolve_overrides(
    case: &BusinessCase,
    overrides: &BTreeMap<String, Decimal>,
) -> SkuFinanceResult<Vec<(ParameterPath, Decimal)>> {
    overrides
        .iter()
        .map(|(raw, value)| {
            let path: ParameterPath = raw.parse()?;
            path.check(case)?;
            Ok((path, *value))
        })
        .collect()
}

fn validate_probabilities(scenarios: &[ScenarioDefinition]) -> SkuFinanceResult<bool> {
    let given = scenarios.iter().filter(|s| s.probability.is_some()).count();
    if given == 0 {
        return Ok(false);
    }
    if given != scenarios.len() {
        return Err(SkuFinanceError::InvalidInput {
            field: "scenarios.probability".into(),
            reason: "Either every scenario or none carries a probability".into(),
        });
    }
    for s in scenarios {
        let p = s.probability.unwrap_or(Decimal::ZERO);
        if p < Decimal::ZERO || p > Decimal::ONE {
            return Err(SkuFinanceError::InvalidInput {
                field: format!("scenario:{} probability", s.id),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }
    let total: Decimal = scenarios.iter().filter_map(|s| s.probability).sum();
    if (total - Decimal::ONE).abs() > PROBABILITY_TOLERANCE {
        return Err(SkuFinanceError::InvalidInput {
            field: "scenarios.probability".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total})"),
        });
    }
    Ok(true)
}

fn weighted_metrics(
    scenarios: &[ScenarioDefinition],
    results: &[ScenarioResult],
    metrics: &[ObjectiveMetric],
) -> MetricValues {
    metrics
        .iter()
        .map(|m| {
            let weighted = scenarios.iter().zip(results.iter()).try_fold(
                Decimal::ZERO,
                |acc, (s, r)| {
                    let v = r.metrics.get(m).copied().flatten()?;
                    Some(acc + s.probability.unwrap_or(Decimal::ZERO) * v)
                },
            );
            (*m, weighted)
        })
        .collect()
}

/// Evaluate each scenario's absolute overrides against the baseline.
///
/// A scenario with an override path that does not resolve is not run: its
/// metrics equal the baseline and it carries an `error` tag. A scenario that
/// fails in the pipeline yields undefined metrics. Both are listed in
/// `errors` and never abort the other scenarios.
pub fn run_scenarios(
    case: &BusinessCase,
    scenarios: &[ScenarioDefinition],
    metrics: &[ObjectiveMetric],
    config: &EngineConfig,
    options: &BatchOptions,
) -> SkuFinanceResult<ScenarioReport> {
    require_metrics(metrics)?;
    if scenarios.is_empty() {
        return Err(SkuFinanceError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }
    let weighted = validate_probabilities(scenarios)?;
    let baseline = run_baseline(case, metrics, config)?;

    let resolved: Vec<SkuFinanceResult<Vec<(ParameterPath, Decimal)>>> = scenarios
        .iter()
        .map(|s| resolve_overrides(case, &s.overrides))
        .collect();

    let outcomes = run_batch("scenarios", &resolved, options, config, |r| match r {
        Ok(overrides) => evaluate_with_overrides(case, overrides, metrics, config),
        Err(_) => Ok(baseline.clone()),
    })?;

    let mut errors = Vec::new();
    let mut results = Vec::with_capacity(scenarios.len());
    for ((scenario, resolution), outcome) in scenarios.iter().zip(&resolved).zip(outcomes) {
        let (values, error) = match (resolution, outcome) {
            (Err(e), _) => {
                warn!(scenario = %scenario.id, error = %e, "scenario override unresolved");
                errors.push(RunError::new(&scenario.id, None, e));
                (baseline.clone(), Some(e.to_string()))
            }
            (Ok(_), Ok(values)) => (values, None),
            (Ok(_), Err(e)) => {
                warn!(scenario = %scenario.id, error = %e, "scenario run failed");
                errors.push(RunError::new(&scenario.id, None, &e));
                (undefined_metrics(metrics), Some(e.to_string()))
            }
        };
        results.push(ScenarioResult {
            scenario_id: scenario.id.clone(),
            name: scenario.name.clone(),
            deviations: deviations(&values, &baseline),
            metrics: values,
            error,
        });
    }

    let probability_weighted =
        weighted.then(|| weighted_metrics(scenarios, &results, metrics));

    Ok(ScenarioReport {
        baseline,
        results,
        errors,
        probability_weighted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business_case::fixtures::sample_case;

    fn scenario(id: &str, overrides: &[(&str, Decimal)], probability: Option<Decimal>) -> ScenarioDefinition {
        ScenarioDefinition {
            id: id.into(),
            name: id.to_uppercase(),
            overrides: overrides.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            probability,
        }
    }

    fn run(scenarios: &[ScenarioDefinition]) -> SkuFinanceResult<ScenarioReport> {
        let config = EngineConfig::default();
        run_scenarios(
            &sample_case(),
            scenarios,
            &[ObjectiveMetric::Year1Revenue, ObjectiveMetric::Npv],
            &config,
            &BatchOptions::from_config(&config),
        )
    }

    #[test]
    fn test_empty_overrides_match_baseline() {
        let report = run(&[scenario("base", &[], None)]).unwrap();
        assert_eq!(report.results[0].metrics, report.baseline);
        assert!(report.results[0]
            .deviations
            .values()
            .all(|d| *d == Some(Decimal::ZERO)));
        assert!(report.probability_weighted.is_none());
    }

    #[test]
    fn test_deviation_against_baseline() {
        let report = run(&[scenario(
            "dear_resin",
            &[("skus.0.costing.resin_rs_per_kg", dec!(100))],
            None,
        )])
        .unwrap();
        let dev = report.results[0].deviations[&ObjectiveMetric::Year1Revenue].unwrap();
        assert!(dev > Decimal::ZERO);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_unresolved_override_keeps_baseline() {
        let report = run(&[
            scenario("bad", &[("skus.4.costing.resin_rs_per_kg", dec!(90))], None),
            scenario("ok", &[("finance.tax_rate", dec!(0.3))], None),
        ])
        .unwrap();
        assert_eq!(report.results[0].metrics, report.baseline);
        assert!(report.results[0].error.is_some());
        assert!(report.results[1].error.is_none());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id, "bad");
    }

    #[test]
    fn test_pipeline_failure_is_undefined() {
        let report = run(&[scenario(
            "broken",
            &[("skus.0.npd.cycle_time_seconds", dec!(-5))],
            None,
        )])
        .unwrap();
        assert!(report.results[0].metrics.values().all(|v| v.is_none()));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_probability_weighted_summary() {
        let report = run(&[
            scenario("low", &[("finance.tax_rate", dec!(0.3))], Some(dec!(0.5))),
            scenario("high", &[("finance.tax_rate", dec!(0.2))], Some(dec!(0.5))),
        ])
        .unwrap();
        let weighted = report.probability_weighted.unwrap();
        let low = report.results[0].metrics[&ObjectiveMetric::Npv].unwrap();
        let high = report.results[1].metrics[&ObjectiveMetric::Npv].unwrap();
        assert_eq!(
            weighted[&ObjectiveMetric::Npv],
            Some((low + high) * dec!(0.5))
        );
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let err = run(&[
            scenario("a", &[], Some(dec!(0.5))),
            scenario("b", &[], Some(dec!(0.3))),
        ])
        .unwrap_err();
        assert!(matches!(err, SkuFinanceError::InvalidInput { .. }));

        let err = run(&[scenario("a", &[], Some(dec!(1))), scenario("b", &[], None)]).unwrap_err();
        assert!(matches!(err, SkuFinanceError::InvalidInput { .. }));
    }
}
