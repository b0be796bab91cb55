//! Naive anomaly detection over one numeric column

use crate::analyzer::stats::{iqr_fences, mean, parse_number, quantile, sorted, std_dev};
use crate::{EvaluationError, TabularDataset};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Below this many numeric values no anomaly is reported
const MIN_SAMPLES: usize = 3;

/// Detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyMethod {
    /// Distance from the mean in standard deviations
    #[default]
    ZScore,
    /// Outside Tukey fences
    Iqr,
    /// Outside the p-th / (100-p)-th percentiles
    Percentile,
}

impl AnomalyMethod {
    pub fn default_threshold(self) -> f64 {
        match self {
            AnomalyMethod::ZScore => 3.0,
            AnomalyMethod::Iqr => 1.5,
            AnomalyMethod::Percentile => 5.0,
        }
    }
}

impl std::fmt::Display for AnomalyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyMethod::ZScore => write!(f, "zscore"),
            AnomalyMethod::Iqr => write!(f, "iqr"),
            AnomalyMethod::Percentile => write!(f, "percentile"),
        }
    }
}

impl FromStr for AnomalyMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zscore" | "z-score" => Ok(AnomalyMethod::ZScore),
            "iqr" => Ok(AnomalyMethod::Iqr),
            "percentile" => Ok(AnomalyMethod::Percentile),
            other => Err(format!(
                "unknown method '{}' (expected zscore, iqr or percentile)",
                other
            )),
        }
    }
}

/// One flagged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    /// Zero-based row index in the dataset
    pub row_index: usize,
    pub value: f64,
    /// Method-specific deviation: |z| for zscore, distance outside the
    /// bound for iqr and percentile
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub column: String,
    pub method: AnomalyMethod,
    pub threshold: f64,
    pub anomalies: Vec<Anomaly>,
    /// Number of numeric values considered
    pub sample_size: usize,
}

/// Flags outliers in a single numeric column
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    method: AnomalyMethod,
    threshold: f64,
}

impl AnomalyDetector {
    pub fn new(method: AnomalyMethod) -> Self {
        Self {
            method,
            threshold: method.default_threshold(),
        }
    }

    /// Override the method's default threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn method(&self) -> AnomalyMethod {
        self.method
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Detect anomalies in `column`. Non-numeric cells are skipped.
    pub fn detect(
        &self,
        dataset: &TabularDataset,
        column: &str,
    ) -> Result<AnomalyReport, EvaluationError> {
        if !dataset.has_column(column) {
            return Err(EvaluationError::UnknownColumn(column.to_string()));
        }

        let samples: Vec<(usize, f64)> = dataset
            .column(column)
            .enumerate()
            .filter_map(|(i, raw)| parse_number(raw).map(|v| (i, v)))
            .collect();

        let anomalies = if samples.len() < MIN_SAMPLES {
            tracing::debug!(column, samples = samples.len(), "too few numeric values");
            Vec::new()
        } else {
            self.flag(&samples)
        };

        tracing::info!(
            column,
            method = %self.method,
            anomalies = anomalies.len(),
            "anomaly detection complete"
        );
        Ok(AnomalyReport {
            column: column.to_string(),
            method: self.method,
            threshold: self.threshold,
            anomalies,
            sample_size: samples.len(),
        })
    }

    fn flag(&self, samples: &[(usize, f64)]) -> Vec<Anomaly> {
        let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let scorer: Box<dyn Fn(f64) -> Option<f64>> = match self.method {
            AnomalyMethod::ZScore => {
                let (Some(m), Some(sd)) = (mean(&values), std_dev(&values)) else {
                    return Vec::new();
                };
                if sd == 0.0 {
                    return Vec::new();
                }
                let threshold = self.threshold;
                Box::new(move |v| {
                    let z = (v - m).abs() / sd;
                    (z > threshold).then_some(z)
                })
            }
            AnomalyMethod::Iqr => {
                let Some((low, high)) = iqr_fences(&sorted(&values), self.threshold) else {
                    return Vec::new();
                };
                Box::new(move |v| outside(v, low, high))
            }
            AnomalyMethod::Percentile => {
                let ordered = sorted(&values);
                let p = self.threshold.clamp(0.0, 50.0) / 100.0;
                let (Some(low), Some(high)) = (quantile(&ordered, p), quantile(&ordered, 1.0 - p))
                else {
                    return Vec::new();
                };
                Box::new(move |v| outside(v, low, high))
            }
        };

        samples
            .iter()
            .filter_map(|&(row_index, value)| {
                scorer(value).map(|score| Anomaly {
                    row_index,
                    value,
                    score: crate::round1(score),
                })
            })
            .collect()
    }
}

/// Distance outside `[low, high]`, or `None` when inside
fn outside(value: f64, low: f64, high: f64) -> Option<f64> {
    if value < low {
        Some(low - value)
    } else if value > high {
        Some(value - high)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn numbers(values: &[&str]) -> TabularDataset {
        let rows = values
            .iter()
            .map(|v| HashMap::from([("amount".to_string(), v.to_string())]))
            .collect();
        TabularDataset::new(vec!["amount".to_string()], rows).unwrap()
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let ds = numbers(&["1", "2", "3"]);
        let err = AnomalyDetector::new(AnomalyMethod::ZScore)
            .detect(&ds, "price")
            .unwrap_err();
        assert!(matches!(err, EvaluationError::UnknownColumn(c) if c == "price"));
    }

    #[test]
    fn test_too_few_values_is_empty() {
        let ds = numbers(&["1", "abc", "1000"]);
        let report = AnomalyDetector::new(AnomalyMethod::Iqr)
            .detect(&ds, "amount")
            .unwrap();
        assert_eq!(report.sample_size, 2);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_zscore_flags_far_value() {
        let mut values = vec!["10"; 20];
        values.push("11");
        values.push("500");
        let ds = numbers(&values);
        let report = AnomalyDetector::new(AnomalyMethod::ZScore)
            .detect(&ds, "amount")
            .unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].row_index, 21);
        assert_eq!(report.anomalies[0].value, 500.0);
        assert!(report.anomalies[0].score > 3.0);
        assert_eq!(report.threshold, 3.0);
    }

    #[test]
    fn test_zscore_constant_column_has_no_anomalies() {
        let ds = numbers(&["5", "5", "5", "5"]);
        let report = AnomalyDetector::new(AnomalyMethod::ZScore)
            .detect(&ds, "amount")
            .unwrap();
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_iqr_skips_non_numeric_and_keeps_row_index() {
        let ds = numbers(&["1", "2", "n/a", "3", "4", "5", "100"]);
        let report = AnomalyDetector::new(AnomalyMethod::Iqr)
            .detect(&ds, "amount")
            .unwrap();
        assert_eq!(report.sample_size, 6);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].row_index, 6);
    }

    #[test]
    fn test_percentile_flags_both_tails() {
        let values: Vec<String> = (1..=100).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let ds = numbers(&refs);
        let report = AnomalyDetector::new(AnomalyMethod::Percentile)
            .with_threshold(5.0)
            .detect(&ds, "amount")
            .unwrap();
        // 5th percentile = 5.95, 95th = 95.05
        let flagged: Vec<f64> = report.anomalies.iter().map(|a| a.value).collect();
        assert_eq!(flagged, vec![1.0, 2.0, 3.0, 4.0, 5.0, 96.0, 97.0, 98.0, 99.0, 100.0]);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("zscore".parse::<AnomalyMethod>(), Ok(AnomalyMethod::ZScore));
        assert_eq!("IQR".parse::<AnomalyMethod>(), Ok(AnomalyMethod::Iqr));
        assert!("mad".parse::<AnomalyMethod>().is_err());
        assert_eq!(AnomalyMethod::Percentile.to_string(), "percentile");
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let ds = numbers(&["1", "2", "3", "4", "5", "100"]);
        let report = AnomalyDetector::new(AnomalyMethod::Iqr)
            .detect(&ds, "amount")
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["method"], "iqr");
        assert_eq!(json["sampleSize"], 6);
        assert_eq!(json["anomalies"][0]["rowIndex"], 5);
    }
}
