// Fieldwatch Application Layer

pub mod commands;
pub mod error;
pub mod metrics;
pub mod queries;
pub mod run_cache;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AppError;
pub use metrics::Metrics;
pub use run_cache::RunCache;
pub use state::AppState;
