//! Information about the current run that may be used by the calcs.

use std::default::Default;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

/// Run context shared by each calc during `init`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[non_exhaustive]
pub struct ControllerCtx {
    /// Control cycle period in nanoseconds, used as the controllers' sampling period
    pub dt_ns: u32,

    /// A name for this run, which will be used as the name of the log file
    /// and must be compatible with that use.
    pub op_name: String,

    /// A directory to place outputs.
    pub op_dir: PathBuf,
}

impl ControllerCtx {
    pub fn new(dt_ns: u32) -> Self {
        Self {
            dt_ns,
            ..Default::default()
        }
    }

    /// Cycle period in seconds
    pub fn dt_s(&self) -> f64 {
        self.dt_ns as f64 / 1e9
    }
}

impl Default for ControllerCtx {
    fn default() -> Self {
        // Use current time with seconds as op name and use working directory as op dir,
        // replacing characters in the name that would be invalid on Windows.
        let op_name = DateTime::<Utc>::from(SystemTime::now())
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            .replace(":", "");
        Self {
            dt_ns: 0,
            op_name,
            op_dir: std::fs::canonicalize("./").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_is_a_timestamp() {
        let ctx = ControllerCtx::default();
        assert!(ctx.op_name.ends_with('Z'), "{}", ctx.op_name);
        assert!(!ctx.op_name.contains(':'), "{}", ctx.op_name);
        assert_eq!(ctx.dt_ns, 0);
    }

    #[test]
    fn cycle_period_in_seconds() {
        let ctx = ControllerCtx::new(100_000);
        assert_eq!(ctx.dt_s(), 1e-4);
    }
}
