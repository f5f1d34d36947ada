use serde::{Deserialize, Serialize};

/// Per-record model output: class label and subscription probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Binary class label (1 = predicted subscriber)
    pub label: u8,

    /// Subscription probability in [0, 1]
    pub probability: f64,
}

/// One row of a global feature-importance table.
///
/// `weight` is a signed coefficient for the coefficient strategy, or a
/// non-negative mean absolute attribution for the attribution strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub weight: f64,
}

/// Sort an importance table descending by magnitude, largest effect first.
pub fn rank_by_magnitude(mut table: Vec<FeatureImportance>) -> Vec<FeatureImportance> {
    table.sort_by(|a, b| {
        b.weight
            .abs()
            .partial_cmp(&a.weight.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    table
}

/// Ranking-quality metrics over a labeled batch.
///
/// The threshold/precision/recall sequences are a fixed-length preview of the
/// full precision-recall sweep: the first `PREVIEW_LEN` entries in threshold
/// order, not a sampling of the whole curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub thresholds: Vec<f64>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
}

impl EvaluationReport {
    /// Preview cap on the threshold/precision/recall sequences
    pub const PREVIEW_LEN: usize = 20;
}
