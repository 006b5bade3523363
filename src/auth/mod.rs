//! Authentication guards
//!
//! - `lockout`: per-identifier failed-attempt counting and timed lockouts
//! - `policy`: password strength rules

pub mod lockout;
pub mod policy;

pub use lockout::{
    AttemptStore, Clock, FailureOutcome, InMemoryAttemptStore, LockoutPolicy, LockoutStatus,
    LoginGuard, SystemClock,
};
pub use policy::{validate_new_password, validate_password};
