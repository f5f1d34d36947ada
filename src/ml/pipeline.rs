use crate::error::{AppError, Result};
use crate::ml::artifact::ModelArtifact;
use crate::models::{FeatureRecord, YesNoUnknown};
use ndarray::Array2;

/// Preprocessing front-end of the exported pipeline.
///
/// Transforms a batch of `FeatureRecord` into the dense design matrix the
/// classifier was fitted on: standard-scaled numerics, then one-hot
/// categoricals, then 0/1 passthrough booleans. Expanded feature names follow
/// the scikit-learn `get_feature_names_out` convention (`num__age`,
/// `cat__job_management`, `bool__had_contact`) so importance tables from the
/// coefficient and attribution strategies line up.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    artifact: ModelArtifact,
    feature_names: Vec<String>,
}

impl FeaturePipeline {
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;

        let mut feature_names = Vec::with_capacity(artifact.n_features());
        for column in &artifact.numeric {
            feature_names.push(format!("num__{}", column.name));
        }
        for column in &artifact.categorical {
            for category in &column.categories {
                feature_names.push(format!("cat__{}_{}", column.name, category));
            }
        }
        for name in &artifact.passthrough {
            feature_names.push(format!("bool__{name}"));
        }

        Ok(Self {
            artifact,
            feature_names,
        })
    }

    /// Names of the expanded feature space, in matrix column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Width of the expanded feature space
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Transform a batch into the expanded design matrix, rows in input order
    pub fn transform(&self, records: &[FeatureRecord]) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((records.len(), self.n_features()));

        for (row, record) in records.iter().enumerate() {
            let mut offset = 0;

            for column in &self.artifact.numeric {
                let raw = numeric_value(record, &column.name)?;
                matrix[[row, offset]] = (raw - column.mean) / column.std;
                offset += 1;
            }

            for column in &self.artifact.categorical {
                let value = categorical_value(record, &column.name)?;
                // Unknown categories stay all-zeros (handle_unknown="ignore")
                if let Some(idx) = column.categories.iter().position(|c| *c == value) {
                    matrix[[row, offset + idx]] = 1.0;
                }
                offset += column.categories.len();
            }

            for name in &self.artifact.passthrough {
                if boolean_value(record, name)? {
                    matrix[[row, offset]] = 1.0;
                }
                offset += 1;
            }
        }

        Ok(matrix)
    }
}

fn numeric_value(record: &FeatureRecord, name: &str) -> Result<f64> {
    match name {
        "age" => Ok(record.age as f64),
        "balance" => Ok(record.balance),
        "day" => Ok(f64::from(record.day)),
        "campaign" => Ok(record.campaign as f64),
        other => Err(AppError::Internal(format!(
            "'{other}' is not a numeric feature column"
        ))),
    }
}

fn categorical_value(record: &FeatureRecord, name: &str) -> Result<String> {
    match name {
        "job" => Ok(record.job.clone()),
        "education" => Ok(record.education.clone()),
        "default" => Ok(yes_no_unknown_str(record.default_status).to_string()),
        "housing" => Ok(yes_no_unknown_str(record.housing).to_string()),
        "loan" => Ok(yes_no_unknown_str(record.loan).to_string()),
        "months_since_previous_contact" => Ok(record.months_since_previous_contact.clone()),
        "n_previous_contacts" => Ok(record.n_previous_contacts.clone()),
        "poutcome" => Ok(record.poutcome.clone()),
        other => Err(AppError::Internal(format!(
            "'{other}' is not a categorical feature column"
        ))),
    }
}

fn boolean_value(record: &FeatureRecord, name: &str) -> Result<bool> {
    match name {
        "had_contact" => Ok(record.had_contact),
        "is_single" => Ok(record.is_single),
        "uknown_contact" => Ok(record.uknown_contact),
        other => Err(AppError::Internal(format!(
            "'{other}' is not a boolean feature column"
        ))),
    }
}

fn yes_no_unknown_str(value: YesNoUnknown) -> &'static str {
    match value {
        YesNoUnknown::Yes => "yes",
        YesNoUnknown::No => "no",
        YesNoUnknown::Unknown => "unknown",
    }
}
