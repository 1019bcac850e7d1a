use thiserror::Error;

use shower_core::ValidationError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend unreachable. Nothing was kept locally; the caller decides
    /// whether to retry.
    #[error("store unavailable")]
    Transient(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submitting while the gate is shut is a caller bug; it is refused,
    /// never queued.
    #[error("guessing is closed")]
    Closed,

    #[error("could not save your guess, please try again")]
    Transient(#[source] anyhow::Error),
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(v) => Self::Validation(v),
            StoreError::Transient(e) => Self::Transient(e),
        }
    }
}
