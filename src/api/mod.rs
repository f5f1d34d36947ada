pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::callcenter::QueueSession;
use crate::config::QueueSettings;
use crate::ml::PredictionEngine;
use crate::records::RecordFetcher;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Pre-fitted pipeline, loaded once and immutable for the process lifetime
    pub engine: Arc<PredictionEngine>,

    /// External record store adapter
    pub records: Arc<dyn RecordFetcher>,

    /// The operator's queue session; one in-flight transition at a time
    pub queue: Arc<Mutex<Option<QueueSession>>>,

    /// Queue defaults and bounds
    pub queue_settings: QueueSettings,

    /// Fetch limit when a caller does not supply a batch
    pub default_fetch_limit: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<PredictionEngine>,
        records: Arc<dyn RecordFetcher>,
        queue_settings: QueueSettings,
        default_fetch_limit: usize,
    ) -> Self {
        Self {
            engine,
            records,
            queue: Arc::new(Mutex::new(None)),
            queue_settings,
            default_fetch_limit,
        }
    }
}
