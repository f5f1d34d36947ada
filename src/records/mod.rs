pub mod source;
pub mod validate;

pub use source::{NocoDbSource, RawRecord, RecordFetcher};
pub use validate::{coerce_batch, coerce_record, extract_labels};
