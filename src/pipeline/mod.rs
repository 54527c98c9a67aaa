// Data processing pipeline: per-participant normalization, demographics, and merge

pub mod processing;

pub use processing::{demographics, merge, normalize, session_date};
