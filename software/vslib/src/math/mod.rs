//! Numerical building blocks evaluated on every control cycle.

mod jury;
mod periodic_lookup_table;
mod polynomial;
mod sin_cos_table;

pub use jury::jurys_stability_test;
pub use periodic_lookup_table::PeriodicLookupTable;
pub use polynomial::{polyval, reversed};
pub use sin_cos_table::SinCosTable;
