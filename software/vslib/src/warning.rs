//! Human-readable validation messages surfaced to configuration clients.

use serde::{Deserialize, Serialize};

/// A recoverable configuration problem, such as a zero leading coefficient
/// or a polynomial failing Jury's stability test.
///
/// Warnings are returned as values and never thrown; the first failing check wins.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable description of the problem
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Warning> for String {
    fn from(warning: Warning) -> Self {
        warning.message
    }
}
