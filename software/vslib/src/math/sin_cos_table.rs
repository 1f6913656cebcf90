//! Sine and cosine from a single tabulated period.

use core::f64::consts::{FRAC_PI_2, TAU};

use super::PeriodicLookupTable;

/// Table resolution used by [SinCosTable::default]
pub const DEFAULT_POINTS: usize = 4096;

/// Sine and cosine evaluated by periodic linear interpolation over
/// one period of `sin` sampled at equally spaced angles on `[0, 2π]`.
#[derive(Clone, Debug)]
pub struct SinCosTable {
    table: PeriodicLookupTable,
}

impl SinCosTable {
    /// Tabulate one period with `points` samples (at least 2).
    pub fn new(points: usize) -> Self {
        let points = points.max(2);
        let step = TAU / (points - 1) as f64;
        let mut data: Vec<(f64, f64)> = (0..points)
            .map(|i| {
                let x = i as f64 * step;
                (x, x.sin())
            })
            .collect();

        // Pin the period ends so that folding is exact
        data[0] = (0.0, 0.0);
        data[points - 1] = (TAU, 0.0);

        // Samples are finite and strictly increasing by construction
        let table = match PeriodicLookupTable::new(data, true) {
            Ok(table) => table,
            Err(err) => unreachable!("Sine table construction failed: {err}"),
        };

        Self { table }
    }

    /// Sine of `angle` in radians, any range
    #[inline]
    pub fn sin(&mut self, angle: f64) -> f64 {
        self.table.interpolate(angle, false)
    }

    /// Cosine of `angle` in radians, any range
    #[inline]
    pub fn cos(&mut self, angle: f64) -> f64 {
        self.table.interpolate(angle + FRAC_PI_2, false)
    }

    /// Both at once, as `(sin, cos)`
    #[inline]
    pub fn sin_cos(&mut self, angle: f64) -> (f64, f64) {
        (self.sin(angle), self.cos(angle))
    }

    pub fn table(&self) -> &PeriodicLookupTable {
        &self.table
    }
}

impl Default for SinCosTable {
    fn default() -> Self {
        Self::new(DEFAULT_POINTS)
    }
}
