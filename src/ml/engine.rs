use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::ml::pipeline::FeaturePipeline;
use crate::models::{FeatureRecord, PredictionResult};
use ndarray::Array1;

/// Classification threshold on the subscription probability
const DECISION_THRESHOLD: f64 = 0.5;

/// Anything that can score a batch of feature records.
///
/// The call-queue simulator depends on this seam rather than on the concrete
/// engine so a failing scorer can be injected in tests.
pub trait Scorer: Send + Sync {
    fn score_batch(&self, records: &[FeatureRecord]) -> Result<Vec<PredictionResult>>;
}

/// Wraps the pre-fitted pipeline: preprocessing plus the linear decision
/// function. Side-effect-free; safe for unlimited read concurrency.
pub struct PredictionEngine {
    pipeline: FeaturePipeline,
    weights: Array1<f64>,
    intercept: f64,
}

impl PredictionEngine {
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        let weights = artifact.coefficient_vector();
        let intercept = artifact.intercept;
        let pipeline = FeaturePipeline::new(artifact)?;

        Ok(Self {
            pipeline,
            weights,
            intercept,
        })
    }

    /// The preprocessing front-end, shared with the explainability engine
    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Linear weights over the expanded feature space
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Subscription probabilities for an already-transformed design matrix
    pub(crate) fn probabilities(&self, matrix: &ndarray::Array2<f64>) -> Array1<f64> {
        let logits = matrix.dot(&self.weights) + self.intercept;
        logits.mapv(sigmoid)
    }
}

impl Scorer for PredictionEngine {
    /// Score a non-empty batch, one result per input in the same order
    fn score_batch(&self, records: &[FeatureRecord]) -> Result<Vec<PredictionResult>> {
        if records.is_empty() {
            return Err(AppError::Validation(
                "Prediction batch must not be empty".to_string(),
            ));
        }

        let matrix = self.pipeline.transform(records)?;
        let probabilities = self.probabilities(&matrix);

        Ok(probabilities
            .iter()
            .map(|&probability| PredictionResult {
                label: u8::from(probability >= DECISION_THRESHOLD),
                probability,
            })
            .collect())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
