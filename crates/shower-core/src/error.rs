use thiserror::Error;

/// Input rejected before anything reaches a store or a delivery sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter your name")]
    EmptyName,

    #[error("please pick one of the listed choices")]
    MissingChoice,

    #[error("please write a message")]
    EmptyMessage,

    #[error("please enter a valid email address")]
    InvalidEmail,

    #[error("at most {max} additional guests")]
    TooManyGuests { max: u32 },
}
