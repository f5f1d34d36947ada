use crate::api::AppState;
use crate::callcenter::{CallOutcome, QueueConfig, QueueSession, QueueState, SubmitReceipt};
use crate::error::{AppError, Result};
use crate::ml::{Evaluator, Explainer, DEFAULT_SAMPLE_LIMIT};
use crate::models::{EvaluationReport, FeatureRecord};
use crate::records::{coerce_batch, extract_labels, RawRecord};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Batch of raw records as supplied by a caller; validated in-handler so that
/// malformed records produce the always-200 error body instead of a transport
/// rejection.
#[derive(Debug, Deserialize)]
pub struct RawBatch {
    pub data: Vec<RawRecord>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SampleQuery {
    /// Cap on records fetched/attributed; bounds computation cost
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// Flatten a typed result into the legacy always-200 `{error, trace}` shape.
///
/// Compatibility contract with existing dashboard clients: errors ride in the
/// body with a success status, so callers must inspect the body. The missing
/// label case carries only `error`, matching the original wire shape.
fn legacy<T: Serialize>(result: Result<T>) -> Json<Value> {
    let result = result.and_then(|v| serde_json::to_value(v).map_err(AppError::from));
    match result {
        Ok(value) => Json(value),
        Err(err @ AppError::MissingLabel(_)) => {
            tracing::warn!(error = %err, "Legacy endpoint missing-label error");
            Json(json!({ "error": err.to_string() }))
        }
        Err(err) => {
            tracing::warn!(
                error_code = err.error_code(),
                error = %err,
                "Legacy endpoint error"
            );
            Json(json!({
                "error": err.to_string(),
                "trace": format!("{}: {:?}", err.error_code(), err),
            }))
        }
    }
}

/// Current day of month, substituted for the stored contact day on active calls
fn today_day() -> u32 {
    chrono::Local::now().day()
}

// ============================================================================
// Prediction
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f64>,
}

/// Score a caller-supplied batch; parallel arrays in input order
pub async fn predict(State(state): State<AppState>, Json(batch): Json<RawBatch>) -> Json<Value> {
    legacy(run_predict(&state, batch))
}

fn run_predict(state: &AppState, batch: RawBatch) -> Result<PredictResponse> {
    use crate::ml::Scorer;

    let records = coerce_batch(&batch.data)?;
    let results = state.engine.score_batch(&records)?;

    tracing::info!(n_records = records.len(), "Prediction batch scored");

    Ok(PredictResponse {
        predictions: results.iter().map(|r| r.label).collect(),
        probabilities: results.iter().map(|r| r.probability).collect(),
    })
}

// ============================================================================
// Explainability
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ShapRow {
    pub feature: String,
    pub mean_abs_shap: f64,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub n_samples: usize,
    pub shap_summary: Vec<ShapRow>,
}

/// SHAP summary from the provided batch, or from store records when no body
/// is supplied
pub async fn explain(
    State(state): State<AppState>,
    Query(query): Query<SampleQuery>,
    body: Option<Json<RawBatch>>,
) -> Json<Value> {
    legacy(run_explain(&state, query, body.map(|Json(b)| b)).await)
}

async fn run_explain(
    state: &AppState,
    query: SampleQuery,
    body: Option<RawBatch>,
) -> Result<ExplainResponse> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_SAMPLE_LIMIT);

    let records = resolve_batch(state, body, limit).await?;
    if records.is_empty() {
        return Err(AppError::Explainability(
            "No feature records left after dropping identifier/label columns".to_string(),
        ));
    }

    let summary = Explainer::new(state.engine.clone()).shap_summary(&records, limit)?;

    Ok(ExplainResponse {
        n_samples: summary.n_samples,
        shap_summary: summary
            .table
            .into_iter()
            .map(|row| ShapRow {
                feature: row.feature,
                mean_abs_shap: row.weight,
            })
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct CoefficientRow {
    pub feature: String,
    pub coefficient: f64,
}

#[derive(Debug, Serialize)]
pub struct CoefficientsResponse {
    pub coefficients: Vec<CoefficientRow>,
}

/// Linear weights over the expanded feature space, largest magnitude first
pub async fn coefficients(State(state): State<AppState>) -> Json<Value> {
    let table = Explainer::new(state.engine.clone()).coefficients();
    legacy(Ok(CoefficientsResponse {
        coefficients: table
            .into_iter()
            .map(|row| CoefficientRow {
                feature: row.feature,
                coefficient: row.weight,
            })
            .collect(),
    }))
}

// ============================================================================
// Evaluation
// ============================================================================

/// ROC/PR metrics from a labeled batch (label column `y`), or from store
/// records when no body is supplied
pub async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<SampleQuery>,
    body: Option<Json<RawBatch>>,
) -> Json<Value> {
    legacy(run_metrics(&state, query, body.map(|Json(b)| b)).await)
}

async fn run_metrics(
    state: &AppState,
    query: SampleQuery,
    body: Option<RawBatch>,
) -> Result<EvaluationReport> {
    query.validate()?;
    let limit = query.limit.unwrap_or(state.default_fetch_limit);

    let raw = match body {
        Some(batch) => batch.data,
        None => state.records.fetch_raw(limit).await?,
    };

    let labels = extract_labels(&raw)?;
    let records = coerce_batch(&raw)?;

    Evaluator::new(state.engine.clone()).evaluate(&records, &labels)
}

async fn resolve_batch(
    state: &AppState,
    body: Option<RawBatch>,
    limit: usize,
) -> Result<Vec<FeatureRecord>> {
    let raw = match body {
        Some(batch) => {
            tracing::debug!(n_records = batch.data.len(), "Using client batch");
            batch.data
        }
        None => {
            tracing::debug!(limit, "No client batch; fetching from record store");
            state.records.fetch_raw(limit).await?
        }
    };
    coerce_batch(&raw)
}

// ============================================================================
// Call queue
// ============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResetQueueRequest {
    #[validate(range(min = 1))]
    pub queue_size: Option<usize>,

    #[validate(range(min = 1.0))]
    pub bonus_unit: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub outcome: CallOutcome,
}

#[derive(Debug, Serialize)]
pub struct QueuePreview {
    pub position: usize,
    pub job: String,
    pub age: i64,
    pub education: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveCallView {
    /// The customer record with the contact day rebased onto today
    pub customer: FeatureRecord,
    pub probability: Option<f64>,
    pub current_call_bonus: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct QueueView {
    pub session_id: Uuid,
    pub state: QueueState,
    pub remaining: usize,
    pub total_bonus: f64,
    pub bonus_unit: f64,
    pub queue: Vec<QueuePreview>,
    pub active_call: Option<ActiveCallView>,
    /// Advisory; `null` when the scoring pass is unavailable
    pub max_potential_bonus: Option<f64>,
}

/// Discard any previous session, fetch a fresh shuffled queue, zero the bonus
pub async fn queue_reset(
    State(state): State<AppState>,
    body: Option<Json<ResetQueueRequest>>,
) -> Result<Json<QueueView>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    request.validate()?;

    let session = new_session(&state, &request).await?;
    let view = build_view(&state, &session);

    let mut guard = state.queue.lock().await;
    *guard = Some(session);

    Ok(Json(view))
}

/// Current queue state; lazily creates a session with default settings on
/// first access
pub async fn queue_view(State(state): State<AppState>) -> Result<Json<QueueView>> {
    let mut guard = state.queue.lock().await;
    if guard.is_none() {
        let session = new_session(&state, &ResetQueueRequest::default()).await?;
        *guard = Some(session);
    }

    // Session is always present here
    let session = guard
        .as_ref()
        .ok_or_else(|| AppError::Internal("Queue session vanished under lock".to_string()))?;
    Ok(Json(build_view(&state, session)))
}

/// Resolve the active call; pops exactly one record regardless of outcome
pub async fn queue_submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitReceipt>> {
    let mut guard = state.queue.lock().await;
    let session = guard.as_mut().ok_or_else(|| {
        AppError::InvalidStateTransition(
            "No queue session; reset the queue before submitting".to_string(),
        )
    })?;

    let receipt = session.submit(request.outcome, state.engine.as_ref(), today_day())?;
    Ok(Json(receipt))
}

async fn new_session(state: &AppState, request: &ResetQueueRequest) -> Result<QueueSession> {
    let settings = &state.queue_settings;
    let queue_size = request
        .queue_size
        .unwrap_or(settings.default_queue_size)
        .clamp(1, settings.max_queue_size);
    let bonus_unit = request.bonus_unit.unwrap_or(settings.default_bonus_unit);

    let raw = state.records.fetch_raw(queue_size).await?;
    let records = coerce_batch(&raw)?;

    Ok(QueueSession::new(
        records,
        QueueConfig {
            queue_size,
            bonus_unit,
        },
    ))
}

fn build_view(state: &AppState, session: &QueueSession) -> QueueView {
    let today = today_day();

    let active_call = session.active_call().map(|record| {
        let probability = session
            .score_active_call(state.engine.as_ref(), today)
            .map(|r| r.probability)
            .ok();
        ActiveCallView {
            customer: record.with_contact_day(today),
            current_call_bonus: probability.map(|p| (1.0 - p) * session.config().bonus_unit),
            probability,
        }
    });

    QueueView {
        session_id: session.id(),
        state: session.state(),
        remaining: session.remaining(),
        total_bonus: session.total_bonus(),
        bonus_unit: session.config().bonus_unit,
        queue: session
            .iter()
            .enumerate()
            .map(|(i, record)| QueuePreview {
                position: i + 1,
                job: record.job.clone(),
                age: record.age,
                education: record.education.clone(),
            })
            .collect(),
        active_call,
        max_potential_bonus: session.max_potential_bonus(state.engine.as_ref()),
    }
}
