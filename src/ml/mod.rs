pub mod artifact;
pub mod engine;
pub mod evaluate;
pub mod explain;
pub mod pipeline;

pub use artifact::{CategoricalColumn, ModelArtifact, NumericColumn};
pub use engine::{PredictionEngine, Scorer};
pub use evaluate::Evaluator;
pub use explain::{Explainer, ShapSummary, DEFAULT_SAMPLE_LIMIT};
pub use pipeline::FeaturePipeline;
