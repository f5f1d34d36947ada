pub mod session;

pub use session::{CallOutcome, QueueConfig, QueueSession, QueueState, SubmitReceipt};
