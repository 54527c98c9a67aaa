pub mod config;
pub mod constants;
pub mod error;
pub mod table;
pub mod types;

pub mod observability;
pub mod pipeline;

// Use cases and the ports they depend on, plus the adapters behind them
pub mod app;
pub mod infra;

pub use error::{PipelineError, Result};
