//! Shared fixtures for module tests.

use crate::error::{AppError, Result};
use crate::ml::{CategoricalColumn, ModelArtifact, NumericColumn, PredictionEngine, Scorer};
use crate::models::{FeatureRecord, PredictionResult, YesNoUnknown};
use crate::records::source::RawRecord;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A compact but schema-complete pipeline artifact
pub fn tiny_artifact() -> ModelArtifact {
    ModelArtifact {
        version: "test".to_string(),
        numeric: vec![
            NumericColumn {
                name: "age".to_string(),
                mean: 41.0,
                std: 10.0,
            },
            NumericColumn {
                name: "balance".to_string(),
                mean: 1360.0,
                std: 3000.0,
            },
            NumericColumn {
                name: "day".to_string(),
                mean: 15.8,
                std: 8.3,
            },
            NumericColumn {
                name: "campaign".to_string(),
                mean: 2.8,
                std: 3.1,
            },
        ],
        categorical: vec![
            CategoricalColumn {
                name: "job".to_string(),
                categories: vec![
                    "management".to_string(),
                    "student".to_string(),
                    "retired".to_string(),
                ],
            },
            CategoricalColumn {
                name: "education".to_string(),
                categories: vec!["secondary".to_string(), "tertiary".to_string()],
            },
            CategoricalColumn {
                name: "default".to_string(),
                categories: vec!["no".to_string(), "yes".to_string(), "unknown".to_string()],
            },
            CategoricalColumn {
                name: "housing".to_string(),
                categories: vec!["no".to_string(), "yes".to_string(), "unknown".to_string()],
            },
            CategoricalColumn {
                name: "loan".to_string(),
                categories: vec!["no".to_string(), "yes".to_string(), "unknown".to_string()],
            },
            CategoricalColumn {
                name: "months_since_previous_contact".to_string(),
                categories: vec!["never_contacted".to_string(), "3-6_months".to_string()],
            },
            CategoricalColumn {
                name: "n_previous_contacts".to_string(),
                categories: vec!["0".to_string(), "1-2".to_string()],
            },
            CategoricalColumn {
                name: "poutcome".to_string(),
                categories: vec![
                    "unknown".to_string(),
                    "failure".to_string(),
                    "success".to_string(),
                ],
            },
        ],
        passthrough: vec![
            "had_contact".to_string(),
            "is_single".to_string(),
            "uknown_contact".to_string(),
        ],
        coefficients: vec![
            0.10, 0.25, -0.05, -0.30, // numerics
            0.15, 0.45, 0.35, // job
            -0.10, 0.20, // education
            0.05, -0.40, -0.02, // default
            0.30, -0.35, -0.01, // housing
            0.12, -0.28, -0.03, // loan
            -0.15, 0.22, // months_since_previous_contact
            -0.08, 0.18, // n_previous_contacts
            -0.20, -0.45, 1.10, // poutcome
            0.25, 0.08, -0.12, // passthrough booleans
        ],
        intercept: -1.2,
    }
}

pub fn tiny_engine() -> PredictionEngine {
    PredictionEngine::new(tiny_artifact()).expect("tiny artifact must build an engine")
}

pub fn tiny_record() -> FeatureRecord {
    FeatureRecord {
        age: 41,
        balance: 1250.0,
        day: 5,
        campaign: 2,
        job: "management".to_string(),
        education: "tertiary".to_string(),
        default_status: YesNoUnknown::No,
        housing: YesNoUnknown::Yes,
        loan: YesNoUnknown::No,
        months_since_previous_contact: "never_contacted".to_string(),
        n_previous_contacts: "0".to_string(),
        poutcome: "unknown".to_string(),
        had_contact: true,
        is_single: false,
        uknown_contact: false,
    }
}

/// A raw store record matching `tiny_record`, as serde_json map
pub fn raw_record() -> RawRecord {
    match serde_json::to_value(tiny_record()).expect("record serializes") {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("FeatureRecord serializes to an object"),
    }
}

/// Scorer double with scripted probabilities or scripted failure
pub struct FixedScorer {
    probabilities: Vec<f64>,
    cursor: AtomicUsize,
    fail: bool,
}

impl FixedScorer {
    pub fn with_probability(probability: f64) -> Self {
        Self {
            probabilities: vec![probability],
            cursor: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Scores successive single-record batches with successive probabilities;
    /// multi-record batches reuse the current probability for every record.
    pub fn with_sequence(probabilities: Vec<f64>) -> Self {
        Self {
            probabilities,
            cursor: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            probabilities: Vec::new(),
            cursor: AtomicUsize::new(0),
            fail: true,
        }
    }
}

impl Scorer for FixedScorer {
    fn score_batch(&self, records: &[FeatureRecord]) -> Result<Vec<PredictionResult>> {
        if self.fail {
            return Err(AppError::UpstreamFetch("scorer unavailable".to_string()));
        }

        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        let probability = self.probabilities[idx.min(self.probabilities.len() - 1)];
        Ok(records
            .iter()
            .map(|_| PredictionResult {
                label: u8::from(probability >= 0.5),
                probability,
            })
            .collect())
    }
}
