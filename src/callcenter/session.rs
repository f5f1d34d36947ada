use crate::error::{AppError, Result};
use crate::ml::Scorer;
use crate::models::{FeatureRecord, PredictionResult};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use strum::{Display, EnumString};
use tracing::{info, warn};
use uuid::Uuid;

/// Queue session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueState {
    /// Front-of-queue record is being handled
    ActiveCall,
    /// No records left; only a reset is valid from here
    Empty,
}

/// How the operator resolved the active call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallOutcome {
    Converted,
    NotConverted,
}

/// Per-session queue settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueConfig {
    pub queue_size: usize,
    pub bonus_unit: f64,
}

/// Result of one `submit` transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub outcome: CallOutcome,

    /// Scored probability for the handled call; `None` when scoring failed
    /// (the call is still popped, but no bonus is credited)
    pub probability: Option<f64>,

    pub bonus_awarded: f64,
    pub total_bonus: f64,
    pub remaining: usize,
    pub state: QueueState,
}

/// Session-scoped call-queue state machine.
///
/// One operator works through a shuffled queue of customers; each `submit`
/// pops exactly one record, and a converted outcome credits
/// `(1 - probability) * bonus_unit` — lower-probability conversions are worth
/// more, which is the incentive the simulation is built around. The bonus
/// total only ever grows, and only on converted submits. Never persisted; the
/// session disappears with the process.
#[derive(Debug, Clone)]
pub struct QueueSession {
    id: Uuid,
    queue: VecDeque<FeatureRecord>,
    total_bonus: f64,
    config: QueueConfig,
}

impl QueueSession {
    /// Create a session from fetched records, shuffled into random order
    pub fn new(records: Vec<FeatureRecord>, config: QueueConfig) -> Self {
        Self::with_rng(records, config, &mut rand::thread_rng())
    }

    /// Create a session with a caller-supplied RNG (seedable in tests)
    pub fn with_rng<R: Rng>(
        mut records: Vec<FeatureRecord>,
        config: QueueConfig,
        rng: &mut R,
    ) -> Self {
        records.shuffle(rng);
        let session = Self {
            id: Uuid::new_v4(),
            queue: records.into(),
            total_bonus: 0.0,
            config,
        };

        info!(
            session_id = %session.id,
            queue_len = session.queue.len(),
            bonus_unit = config.bonus_unit,
            "Queue session created"
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> QueueState {
        if self.queue.is_empty() {
            QueueState::Empty
        } else {
            QueueState::ActiveCall
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn total_bonus(&self) -> f64 {
        self.total_bonus
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    /// The record currently being handled, if any
    pub fn active_call(&self) -> Option<&FeatureRecord> {
        self.queue.front()
    }

    /// Records behind the active call, front first
    pub fn iter(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.queue.iter()
    }

    /// Score the active call as if the contact were happening today:
    /// the stored contact day is rebased onto `today_day` before scoring.
    pub fn score_active_call(
        &self,
        scorer: &dyn Scorer,
        today_day: u32,
    ) -> Result<PredictionResult> {
        let record = self.active_call().ok_or_else(|| {
            AppError::InvalidStateTransition(
                "No active call: the queue is empty; reset it first".to_string(),
            )
        })?;

        let rebased = record.with_contact_day(today_day);
        let mut results = scorer.score_batch(std::slice::from_ref(&rebased))?;
        results.pop().ok_or_else(|| {
            AppError::Internal("Scorer returned no result for a one-record batch".to_string())
        })
    }

    /// Resolve the active call and advance the queue.
    ///
    /// The queue shrinks by exactly one regardless of outcome. A converted
    /// outcome credits `(1 - probability) * bonus_unit`; if scoring fails the
    /// call still advances but nothing is credited.
    pub fn submit(
        &mut self,
        outcome: CallOutcome,
        scorer: &dyn Scorer,
        today_day: u32,
    ) -> Result<SubmitReceipt> {
        if self.queue.is_empty() {
            return Err(AppError::InvalidStateTransition(
                "Cannot submit: the queue is empty; reset it first".to_string(),
            ));
        }

        let probability = match self.score_active_call(scorer, today_day) {
            Ok(result) => Some(result.probability),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Scoring failed; advancing without bonus");
                None
            }
        };

        let bonus_awarded = match (outcome, probability) {
            (CallOutcome::Converted, Some(p)) => (1.0 - p) * self.config.bonus_unit,
            _ => 0.0,
        };
        self.total_bonus += bonus_awarded;
        self.queue.pop_front();

        info!(
            session_id = %self.id,
            outcome = %outcome,
            bonus_awarded,
            total_bonus = self.total_bonus,
            remaining = self.queue.len(),
            "Call submitted"
        );

        Ok(SubmitReceipt {
            outcome,
            probability,
            bonus_awarded,
            total_bonus: self.total_bonus,
            remaining: self.queue.len(),
            state: self.state(),
        })
    }

    /// Advisory upper bound on earnings from the remaining queue: batch-score
    /// it (stored contact days, no rebasing) and sum `(1 - p) * bonus_unit`.
    ///
    /// Display data only — a scoring failure degrades to `None` and must
    /// never block queue advancement.
    pub fn max_potential_bonus(&self, scorer: &dyn Scorer) -> Option<f64> {
        if self.queue.is_empty() {
            return Some(0.0);
        }

        let records: Vec<FeatureRecord> = self.queue.iter().cloned().collect();
        match scorer.score_batch(&records) {
            Ok(results) => Some(
                results
                    .iter()
                    .map(|r| (1.0 - r.probability) * self.config.bonus_unit)
                    .sum(),
            ),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Max potential bonus unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{tiny_engine, tiny_record, FixedScorer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session_of(n: usize, bonus_unit: f64) -> QueueSession {
        let records = (0..n)
            .map(|i| FeatureRecord {
                age: 25 + i as i64,
                ..tiny_record()
            })
            .collect();
        let config = QueueConfig {
            queue_size: n,
            bonus_unit,
        };
        QueueSession::with_rng(records, config, &mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_new_session_state() {
        let session = session_of(3, 10.0);
        assert_eq!(session.state(), QueueState::ActiveCall);
        assert_eq!(session.remaining(), 3);
        assert_eq!(session.total_bonus(), 0.0);

        let empty = session_of(0, 10.0);
        assert_eq!(empty.state(), QueueState::Empty);
    }

    #[test]
    fn test_k_submits_drain_the_queue() {
        let mut session = session_of(4, 10.0);
        let scorer = FixedScorer::with_probability(0.5);

        for step in 0..4 {
            let receipt = session
                .submit(CallOutcome::NotConverted, &scorer, 15)
                .unwrap();
            assert_eq!(receipt.remaining, 3 - step);
        }
        assert_eq!(session.state(), QueueState::Empty);
        assert_eq!(session.total_bonus(), 0.0);
    }

    #[test]
    fn test_bonus_formula_worked_example() {
        // queue = [p=0.2, p=0.7], unit = 10, outcomes = [converted, not]
        // => final bonus = (1 - 0.2) * 10 = 8.0
        let mut session = session_of(2, 10.0);
        let scorer = FixedScorer::with_sequence(vec![0.2, 0.7]);

        let first = session.submit(CallOutcome::Converted, &scorer, 15).unwrap();
        assert!((first.bonus_awarded - 8.0).abs() < 1e-12);

        let second = session
            .submit(CallOutcome::NotConverted, &scorer, 15)
            .unwrap();
        assert_eq!(second.bonus_awarded, 0.0);

        assert!((session.total_bonus() - 8.0).abs() < 1e-12);
        assert_eq!(session.state(), QueueState::Empty);
    }

    #[test]
    fn test_bonus_is_monotonically_non_decreasing() {
        let mut session = session_of(5, 10.0);
        let scorer = FixedScorer::with_probability(0.4);
        let outcomes = [
            CallOutcome::Converted,
            CallOutcome::NotConverted,
            CallOutcome::Converted,
            CallOutcome::NotConverted,
            CallOutcome::Converted,
        ];

        let mut last = 0.0;
        for outcome in outcomes {
            let receipt = session.submit(outcome, &scorer, 15).unwrap();
            assert!(receipt.total_bonus >= last);
            last = receipt.total_bonus;
        }
        assert!((last - 3.0 * 0.6 * 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_submit_on_empty_queue_is_invalid_transition() {
        let mut session = session_of(0, 10.0);
        let scorer = FixedScorer::with_probability(0.5);

        let err = session
            .submit(CallOutcome::Converted, &scorer, 15)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE_TRANSITION");
    }

    #[test]
    fn test_scoring_failure_advances_without_bonus() {
        let mut session = session_of(2, 10.0);
        let scorer = FixedScorer::failing();

        let receipt = session.submit(CallOutcome::Converted, &scorer, 15).unwrap();
        assert_eq!(receipt.probability, None);
        assert_eq!(receipt.bonus_awarded, 0.0);
        assert_eq!(receipt.remaining, 1);
        assert_eq!(session.total_bonus(), 0.0);
    }

    #[test]
    fn test_max_potential_bonus_degrades_to_unavailable() {
        let session = session_of(3, 10.0);

        let failing = FixedScorer::failing();
        assert_eq!(session.max_potential_bonus(&failing), None);

        let fixed = FixedScorer::with_probability(0.25);
        let bonus = session.max_potential_bonus(&fixed).unwrap();
        assert!((bonus - 3.0 * 0.75 * 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_potential_bonus_of_empty_queue_is_zero() {
        let session = session_of(0, 10.0);
        let scorer = FixedScorer::with_probability(0.5);
        assert_eq!(session.max_potential_bonus(&scorer), Some(0.0));
    }

    #[test]
    fn test_active_call_scored_with_today_day_override() {
        let session = session_of(1, 10.0);
        let engine = tiny_engine();

        let stored_day = session.active_call().unwrap().day;
        assert_ne!(stored_day, 28);

        // Engine output must match scoring the rebased record directly
        let direct = engine
            .score_batch(&[session.active_call().unwrap().with_contact_day(28)])
            .unwrap()[0];
        let scored = session.score_active_call(&engine, 28).unwrap();
        assert_eq!(scored.probability, direct.probability);
    }

    #[test]
    fn test_shuffle_is_deterministic_under_seed() {
        let a = session_of(6, 10.0);
        let b = session_of(6, 10.0);
        let ages_a: Vec<i64> = a.iter().map(|r| r.age).collect();
        let ages_b: Vec<i64> = b.iter().map(|r| r.age).collect();
        assert_eq!(ages_a, ages_b);
    }
}
