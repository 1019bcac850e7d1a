//! Pure logic behind the reveal party: the clock, the vote tally, the
//! countdown/reveal state machine and input validation.
//!
//! Nothing in here performs I/O. Storage and delivery live in `shower-live`.

pub mod clock;
pub mod error;
pub mod reveal;
pub mod tally;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ValidationError;
pub use reveal::{LateSubmissions, RevealConfig, RevealMachine, Transition};
