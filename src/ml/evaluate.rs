use crate::error::{AppError, Result};
use crate::ml::engine::{PredictionEngine, Scorer};
use crate::models::{EvaluationReport, FeatureRecord};
use std::sync::Arc;
use tracing::debug;

/// Ranking-quality metrics over a labeled batch.
///
/// Scores come from the prediction engine; ROC AUC is the tie-aware
/// Mann-Whitney statistic and PR AUC integrates precision over recall with
/// the trapezoid rule, swept over all distinct score thresholds.
pub struct Evaluator {
    engine: Arc<PredictionEngine>,
}

impl Evaluator {
    pub fn new(engine: Arc<PredictionEngine>) -> Self {
        Self { engine }
    }

    /// Evaluate a labeled batch; `labels` runs parallel to `records`.
    pub fn evaluate(&self, records: &[FeatureRecord], labels: &[u8]) -> Result<EvaluationReport> {
        if records.len() != labels.len() {
            return Err(AppError::Internal(format!(
                "Label count {} does not match record count {}",
                labels.len(),
                records.len()
            )));
        }

        let results = self.engine.score_batch(records)?;
        let scores: Vec<f64> = results.iter().map(|r| r.probability).collect();

        let roc_auc = roc_auc(labels, &scores)?;
        let (thresholds, precision, recall) = precision_recall_curve(labels, &scores)?;
        let pr_auc = trapezoid_auc(&recall, &precision);

        debug!(
            n_samples = records.len(),
            n_positive = labels.iter().filter(|&&y| y == 1).count(),
            roc_auc,
            pr_auc,
            "Evaluation complete"
        );

        let cap = EvaluationReport::PREVIEW_LEN;
        Ok(EvaluationReport {
            roc_auc,
            pr_auc,
            thresholds: truncate(thresholds, cap),
            precision: truncate(precision, cap),
            recall: truncate(recall, cap),
        })
    }
}

fn truncate(mut values: Vec<f64>, cap: usize) -> Vec<f64> {
    values.truncate(cap);
    values
}

fn check_labels(labels: &[u8]) -> Result<(usize, usize)> {
    let positives = labels.iter().filter(|&&y| y == 1).count();
    let negatives = labels.len() - positives;

    if positives == 0 || negatives == 0 {
        return Err(AppError::MissingLabel(format!(
            "Label column 'y' must contain both classes (got {positives} positive, {negatives} negative)"
        )));
    }
    Ok((positives, negatives))
}

/// Tie-aware ROC AUC: the probability that a random positive scores above a
/// random negative, computed from midranks (Mann-Whitney U).
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Result<f64> {
    let (positives, negatives) = check_labels(labels)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Midranks over tied scores
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = midrank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = labels
        .iter()
        .zip(ranks.iter())
        .filter(|(&y, _)| y == 1)
        .map(|(_, &rank)| rank)
        .sum();

    let p = positives as f64;
    let n = negatives as f64;
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Precision-recall sweep over all distinct score thresholds, ascending, with
/// the conventional terminal `(precision=1, recall=0)` point appended.
///
/// At threshold `t` a record is predicted positive when its score is `>= t`,
/// so the first threshold (the minimum score) has recall 1.
pub fn precision_recall_curve(
    labels: &[u8],
    scores: &[f64],
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let (positives, _) = check_labels(labels)?;

    let mut thresholds: Vec<f64> = scores.to_vec();
    thresholds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    thresholds.dedup();

    let mut precision = Vec::with_capacity(thresholds.len() + 1);
    let mut recall = Vec::with_capacity(thresholds.len() + 1);

    for &threshold in &thresholds {
        let mut tp = 0usize;
        let mut fp = 0usize;
        for (&y, &score) in labels.iter().zip(scores.iter()) {
            if score >= threshold {
                if y == 1 {
                    tp += 1;
                } else {
                    fp += 1;
                }
            }
        }
        precision.push(tp as f64 / (tp + fp) as f64);
        recall.push(tp as f64 / positives as f64);
    }

    precision.push(1.0);
    recall.push(0.0);

    Ok((thresholds, precision, recall))
}

/// Trapezoidal area under `ys` over `xs`; direction-agnostic, like the
/// reference implementation's `auc(recall, precision)`.
pub fn trapezoid_auc(xs: &[f64], ys: &[f64]) -> f64 {
    let area: f64 = xs
        .windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum();
    area.abs()
}
