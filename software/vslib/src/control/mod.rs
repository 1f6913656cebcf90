//! Feedback controllers and their actuation limits.

mod limit;
mod pid;
mod rst;

pub use limit::RangeLimiter;
pub use pid::{PID_LENGTH, PidGains, PidRst, prewarp};
pub use rst::{RstCoefficients, RstController};
