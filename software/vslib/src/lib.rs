//! Numerical core of a power converter control library.
//!
//! Periodic lookup-table interpolation, RST controllers with Jury's stability
//! test, PID gains mapped onto RST coefficients, and reference frame transforms,
//! wrapped as calcs for a cyclic executive.

pub mod calc;
pub mod context;
pub mod control;
pub mod logging;
pub mod math;
pub mod transform;
pub mod warning;

pub use calc::{Calc, PROTOTYPES};
pub use context::ControllerCtx;
pub use control::{PidGains, PidRst, RangeLimiter, RstCoefficients, RstController};
pub use math::{PeriodicLookupTable, SinCosTable, jurys_stability_test};
pub use warning::Warning;
