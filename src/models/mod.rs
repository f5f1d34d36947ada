pub mod feature;
pub mod report;

pub use feature::*;
pub use report::*;
