use crate::error::{AppError, Result};
use crate::models::{FeatureRecord, YesNoUnknown};
use crate::records::source::RawRecord;
use serde_json::Value;

/// Coerce a batch of raw store records into typed feature records.
///
/// Eager validation at the adapter boundary: untyped maps never flow past
/// this point. The first malformed record fails the whole batch with an error
/// naming its position and field.
pub fn coerce_batch(raw: &[RawRecord]) -> Result<Vec<FeatureRecord>> {
    raw.iter()
        .enumerate()
        .map(|(position, record)| coerce_record(record, position))
        .collect()
}

/// Coerce one raw record, rejecting missing fields and type violations.
///
/// Extra keys the store adds (`Id`, `y`, bookkeeping columns) are ignored;
/// no required field is ever silently defaulted.
pub fn coerce_record(raw: &RawRecord, position: usize) -> Result<FeatureRecord> {
    Ok(FeatureRecord {
        age: integer_field(raw, position, "age")?,
        balance: float_field(raw, position, "balance")?,
        day: day_field(raw, position)?,
        campaign: integer_field(raw, position, "campaign")?,
        job: string_field(raw, position, "job")?,
        education: string_field(raw, position, "education")?,
        default_status: enum_field(raw, position, "default")?,
        housing: enum_field(raw, position, "housing")?,
        loan: enum_field(raw, position, "loan")?,
        months_since_previous_contact: string_field(raw, position, "months_since_previous_contact")?,
        n_previous_contacts: string_field(raw, position, "n_previous_contacts")?,
        poutcome: string_field(raw, position, "poutcome")?,
        had_contact: boolean_field(raw, position, "had_contact")?,
        is_single: boolean_field(raw, position, "is_single")?,
        uknown_contact: boolean_field(raw, position, "uknown_contact")?,
    })
}

/// Extract the ground-truth label `y` from every record of a raw batch.
///
/// Accepts booleans and 0/1 integers. Any record without a label fails the
/// batch with a missing-label error; this is reported, never silently skipped.
pub fn extract_labels(raw: &[RawRecord]) -> Result<Vec<u8>> {
    raw.iter()
        .enumerate()
        .map(|(position, record)| {
            let value = record.get("y").ok_or_else(|| {
                AppError::MissingLabel("No target column 'y' found in dataset.".to_string())
            })?;
            match value {
                Value::Bool(b) => Ok(u8::from(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(0),
                    Some(1) => Ok(1),
                    _ => Err(AppError::MissingLabel(format!(
                        "Label at record {position} is not binary: {n}"
                    ))),
                },
                other => Err(AppError::MissingLabel(format!(
                    "Label at record {position} has unsupported type: {other}"
                ))),
            }
        })
        .collect()
}

fn field<'a>(raw: &'a RawRecord, position: usize, name: &str) -> Result<&'a Value> {
    raw.get(name).ok_or_else(|| AppError::ModelInput {
        position,
        field: name.to_string(),
        message: "required field is missing".to_string(),
    })
}

fn type_error(position: usize, name: &str, expected: &str, got: &Value) -> AppError {
    AppError::ModelInput {
        position,
        field: name.to_string(),
        message: format!("expected {expected}, got {got}"),
    }
}

fn integer_field(raw: &RawRecord, position: usize, name: &str) -> Result<i64> {
    let value = field(raw, position, name)?;
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                // The store serializes some integers as floats
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Ok(f as i64),
                    _ => Err(type_error(position, name, "an integer", value)),
                }
            }
        }
        _ => Err(type_error(position, name, "an integer", value)),
    }
}

fn float_field(raw: &RawRecord, position: usize, name: &str) -> Result<f64> {
    let value = field(raw, position, name)?;
    value
        .as_f64()
        .ok_or_else(|| type_error(position, name, "a number", value))
}

fn day_field(raw: &RawRecord, position: usize) -> Result<u32> {
    let day = integer_field(raw, position, "day")?;
    u32::try_from(day)
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| AppError::ModelInput {
            position,
            field: "day".to_string(),
            message: format!("day of month out of range: {day}"),
        })
}

fn string_field(raw: &RawRecord, position: usize, name: &str) -> Result<String> {
    let value = field(raw, position, name)?;
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| type_error(position, name, "a string", value))
}

fn enum_field(raw: &RawRecord, position: usize, name: &str) -> Result<YesNoUnknown> {
    let value = string_field(raw, position, name)?;
    value.parse().map_err(|_| AppError::ModelInput {
        position,
        field: name.to_string(),
        message: format!("expected one of yes|no|unknown, got '{value}'"),
    })
}

fn boolean_field(raw: &RawRecord, position: usize, name: &str) -> Result<bool> {
    let value = field(raw, position, name)?;
    match value {
        Value::Bool(b) => Ok(*b),
        // 0/1 integers are accepted; the store is not consistent about booleans
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(type_error(position, name, "a boolean", value)),
        },
        _ => Err(type_error(position, name, "a boolean", value)),
    }
}
