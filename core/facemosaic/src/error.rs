use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceMosaicError {
    #[error("failed to initialize face detector: {0}")]
    DetectorInit(String),

    #[error("size budget must be > 0")]
    InvalidBudget,

    #[error("failed to present frame: {0}")]
    Present(String),
}
