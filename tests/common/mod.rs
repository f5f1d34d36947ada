//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use marketing_predictor::api::{build_router, AppState};
use marketing_predictor::config::QueueSettings;
use marketing_predictor::error::{AppError, Result};
use marketing_predictor::ml::{ModelArtifact, PredictionEngine};
use marketing_predictor::records::{RawRecord, RecordFetcher};
use serde_json::json;
use std::sync::Arc;

/// The artifact shipped with the repo; integration tests exercise the same
/// pipeline the server loads at startup.
pub fn demo_artifact() -> ModelArtifact {
    serde_json::from_str(include_str!("../../data/model_1mvp.json"))
        .expect("bundled artifact parses")
}

pub fn demo_engine() -> Arc<PredictionEngine> {
    Arc::new(PredictionEngine::new(demo_artifact()).expect("bundled artifact builds an engine"))
}

/// A raw store-shaped record; callers override fields as needed
pub fn sample_raw(age: i64, balance: f64, job: &str) -> RawRecord {
    let value = json!({
        "age": age,
        "balance": balance,
        "day": 12,
        "campaign": 2,
        "job": job,
        "education": "secondary",
        "default": "no",
        "housing": "yes",
        "loan": "no",
        "months_since_previous_contact": "never_contacted",
        "n_previous_contacts": "0",
        "poutcome": "unknown",
        "had_contact": true,
        "is_single": false,
        "uknown_contact": false,
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Record fetcher backed by a fixed in-memory batch
pub struct StaticFetcher {
    records: Vec<RawRecord>,
}

impl StaticFetcher {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn with_default_batch() -> Self {
        Self::new(vec![
            sample_raw(32, 450.0, "technician"),
            sample_raw(58, 6200.0, "retired"),
            sample_raw(24, -120.0, "student"),
            sample_raw(41, 1800.0, "management"),
            sample_raw(37, 950.0, "services"),
        ])
    }
}

#[async_trait]
impl RecordFetcher for StaticFetcher {
    async fn fetch_raw(&self, limit: usize) -> Result<Vec<RawRecord>> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

/// Record fetcher that always fails, for degraded-path tests
pub struct FailingFetcher;

#[async_trait]
impl RecordFetcher for FailingFetcher {
    async fn fetch_raw(&self, _limit: usize) -> Result<Vec<RawRecord>> {
        Err(AppError::UpstreamFetch("record store unreachable".to_string()))
    }
}

pub fn test_settings() -> QueueSettings {
    QueueSettings {
        default_queue_size: 4,
        max_queue_size: 50,
        default_bonus_unit: 10.0,
    }
}

pub fn test_state(records: Arc<dyn RecordFetcher>) -> AppState {
    AppState::new(demo_engine(), records, test_settings(), 100)
}

pub fn test_router(records: Arc<dyn RecordFetcher>) -> Router {
    build_router(test_state(records))
}
