use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("run in progress for dataset {0}")]
    RunInProgress(String),
    #[error("persistence failed: {0:#}")]
    Persistence(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
