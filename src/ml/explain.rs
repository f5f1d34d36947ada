use crate::error::{AppError, Result};
use crate::ml::engine::PredictionEngine;
use crate::models::{rank_by_magnitude, FeatureImportance, FeatureRecord};
use ndarray::Axis;
use std::sync::Arc;
use tracing::debug;

/// Default cap on the attribution sample size, bounding computation cost
pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

/// Result of the attribution strategy over a sampled batch
#[derive(Debug, Clone)]
pub struct ShapSummary {
    /// Number of records actually attributed after applying the sample limit
    pub n_samples: usize,

    /// Mean absolute attribution per expanded feature, ranked descending
    pub table: Vec<FeatureImportance>,
}

/// Global feature-importance, two interchangeable strategies over the same
/// expanded feature space.
///
/// The coefficient strategy reads the linear weights directly and is O(1) in
/// batch size. The attribution strategy computes exact per-sample SHAP values
/// for the linear decision function: with background mean `m` over the
/// sample, `phi[i][j] = w[j] * (x[i][j] - m[j])`, reduced to mean absolute
/// attribution per feature. Both rank descending by magnitude, so the two
/// tables cover the identical feature-name set and are directly comparable.
pub struct Explainer {
    engine: Arc<PredictionEngine>,
}

impl Explainer {
    pub fn new(engine: Arc<PredictionEngine>) -> Self {
        Self { engine }
    }

    /// Coefficient strategy: signed linear weight per expanded feature
    pub fn coefficients(&self) -> Vec<FeatureImportance> {
        let table = self
            .engine
            .pipeline()
            .feature_names()
            .iter()
            .zip(self.engine.weights().iter())
            .map(|(feature, &weight)| FeatureImportance {
                feature: feature.clone(),
                weight,
            })
            .collect();

        rank_by_magnitude(table)
    }

    /// Attribution strategy: mean absolute SHAP value per expanded feature,
    /// computed over at most `limit` records of the batch.
    pub fn shap_summary(&self, records: &[FeatureRecord], limit: usize) -> Result<ShapSummary> {
        if records.is_empty() {
            return Err(AppError::Explainability(
                "Cannot compute attributions for an empty batch".to_string(),
            ));
        }
        if limit == 0 {
            return Err(AppError::Explainability(
                "Sample limit must be at least 1".to_string(),
            ));
        }

        let sample = &records[..records.len().min(limit)];
        let matrix = self.engine.pipeline().transform(sample)?;

        debug!(
            n_samples = sample.len(),
            n_features = matrix.ncols(),
            "Computing SHAP summary"
        );

        // Background is the sample mean in the transformed space; for a
        // linear model the interventional SHAP value is then exactly
        // w_j * (x_ij - mean_j).
        let background = matrix
            .mean_axis(Axis(0))
            .ok_or_else(|| AppError::Explainability("Empty design matrix".to_string()))?;

        let centered = &matrix - &background;
        let attributions = &centered * self.engine.weights();
        let mean_abs = attributions.mapv(f64::abs).mean_axis(Axis(0)).ok_or_else(|| {
            AppError::Explainability("Failed to reduce attributions".to_string())
        })?;

        let table = self
            .engine
            .pipeline()
            .feature_names()
            .iter()
            .zip(mean_abs.iter())
            .map(|(feature, &weight)| FeatureImportance {
                feature: feature.clone(),
                weight,
            })
            .collect();

        Ok(ShapSummary {
            n_samples: sample.len(),
            table: rank_by_magnitude(table),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRecord;
    use crate::testutil::{tiny_engine, tiny_record};
    use std::collections::HashSet;

    fn varied_batch() -> Vec<FeatureRecord> {
        vec![
            tiny_record(),
            FeatureRecord {
                age: 23,
                balance: -120.0,
                job: "student".to_string(),
                ..tiny_record()
            },
            FeatureRecord {
                age: 58,
                balance: 8000.0,
                job: "retired".to_string(),
                poutcome: "success".to_string(),
                ..tiny_record()
            },
        ]
    }

    #[test]
    fn test_coefficients_cover_full_feature_space() {
        let explainer = Explainer::new(std::sync::Arc::new(tiny_engine()));
        let table = explainer.coefficients();
        assert_eq!(table.len(), explainer.engine.pipeline().n_features());

        // Descending by magnitude
        for pair in table.windows(2) {
            assert!(pair[0].weight.abs() >= pair[1].weight.abs());
        }
    }

    #[test]
    fn test_both_strategies_share_feature_name_set() {
        let explainer = Explainer::new(std::sync::Arc::new(tiny_engine()));

        let coef_names: HashSet<String> = explainer
            .coefficients()
            .into_iter()
            .map(|r| r.feature)
            .collect();
        let shap_names: HashSet<String> = explainer
            .shap_summary(&varied_batch(), DEFAULT_SAMPLE_LIMIT)
            .unwrap()
            .table
            .into_iter()
            .map(|r| r.feature)
            .collect();

        assert_eq!(coef_names, shap_names);
    }

    #[test]
    fn test_attributions_non_negative_and_ranked() {
        let explainer = Explainer::new(std::sync::Arc::new(tiny_engine()));
        let summary = explainer
            .shap_summary(&varied_batch(), DEFAULT_SAMPLE_LIMIT)
            .unwrap();

        assert_eq!(summary.n_samples, 3);
        for pair in summary.table.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
        assert!(summary.table.iter().all(|r| r.weight >= 0.0));
    }

    #[test]
    fn test_sample_limit_caps_batch() {
        let explainer = Explainer::new(std::sync::Arc::new(tiny_engine()));
        let summary = explainer.shap_summary(&varied_batch(), 2).unwrap();
        assert_eq!(summary.n_samples, 2);
    }

    #[test]
    fn test_empty_batch_is_an_explainability_error() {
        let explainer = Explainer::new(std::sync::Arc::new(tiny_engine()));
        let err = explainer
            .shap_summary(&[], DEFAULT_SAMPLE_LIMIT)
            .unwrap_err();
        assert_eq!(err.error_code(), "EXPLAINABILITY_ERROR");
    }

    #[test]
    fn test_identical_records_attribute_to_zero() {
        let explainer = Explainer::new(std::sync::Arc::new(tiny_engine()));
        let batch = vec![tiny_record(), tiny_record(), tiny_record()];

        let summary = explainer.shap_summary(&batch, DEFAULT_SAMPLE_LIMIT).unwrap();
        // All rows equal the background, so every attribution is zero
        assert!(summary.table.iter().all(|r| r.weight.abs() < 1e-12));
    }
}
