use crate::error::{AppError, Result};
use crate::models::FeatureRecord;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A standard-scaled numeric input column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

/// A one-hot encoded categorical input column with its fitted vocabulary.
///
/// Categories outside the vocabulary encode to all-zeros, matching the
/// `handle_unknown="ignore"` behavior the pipeline was exported with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// The pre-trained logistic regression pipeline, exported to JSON.
///
/// Loaded once at process start and treated as immutable for the process
/// lifetime. The expanded feature space is the concatenation of numeric,
/// one-hot categorical and passthrough boolean columns, in that order, with
/// one coefficient per expanded feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact/version tag, informational only
    #[serde(default)]
    pub version: String,

    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    pub passthrough: Vec<String>,

    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ModelArtifact {
    /// Load and validate an artifact from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!(
                "Failed to read model artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!(
                "Failed to parse model artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        artifact.validate()?;
        Ok(artifact)
    }

    /// Validate internal consistency against the feature contract
    pub fn validate(&self) -> Result<()> {
        for column in &self.numeric {
            if !FeatureRecord::FIELD_NAMES.contains(&column.name.as_str()) {
                return Err(AppError::Configuration(format!(
                    "Artifact references unknown numeric column '{}'",
                    column.name
                )));
            }
            if column.std <= 0.0 || !column.std.is_finite() {
                return Err(AppError::Configuration(format!(
                    "Numeric column '{}' has non-positive std {}",
                    column.name, column.std
                )));
            }
        }

        for column in &self.categorical {
            if !FeatureRecord::FIELD_NAMES.contains(&column.name.as_str()) {
                return Err(AppError::Configuration(format!(
                    "Artifact references unknown categorical column '{}'",
                    column.name
                )));
            }
            if column.categories.is_empty() {
                return Err(AppError::Configuration(format!(
                    "Categorical column '{}' has an empty vocabulary",
                    column.name
                )));
            }
        }

        for name in &self.passthrough {
            if !FeatureRecord::FIELD_NAMES.contains(&name.as_str()) {
                return Err(AppError::Configuration(format!(
                    "Artifact references unknown passthrough column '{name}'"
                )));
            }
        }

        let n_features = self.n_features();
        if self.coefficients.len() != n_features {
            return Err(AppError::Configuration(format!(
                "Coefficient length {} does not match expanded feature space width {}",
                self.coefficients.len(),
                n_features
            )));
        }

        Ok(())
    }

    /// Width of the expanded (post-preprocessing) feature space
    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
            + self.passthrough.len()
    }

    /// Coefficients as an ndarray vector
    pub fn coefficient_vector(&self) -> Array1<f64> {
        Array1::from_vec(self.coefficients.clone())
    }
}
