//! Sine wave generator backed by a periodic lookup table

use core::f64::consts::TAU;

use super::*;
use crate::math::SinCosTable;
use crate::{calc_config, calc_input_names, calc_output_names};

/// Sin wave between `low` and `high` with a period of `period_s` and phase offset of `offset_s`
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Sin {
    // User inputs
    period_s: f64,
    offset_s: f64,
    low: f64,
    high: f64,

    // Values provided by calc orchestrator during init
    #[serde(skip)]
    output_index: usize,

    #[serde(skip)]
    rad_per_cycle: f64,

    #[serde(skip)]
    angle_rad: f64,

    #[serde(skip)]
    scale: f64,

    #[serde(skip)]
    table: SinCosTable,
}

impl Sin {
    pub fn new(period_s: f64, offset_s: f64, low: f64, high: f64) -> Self {
        Self {
            period_s,
            offset_s,
            low,
            high,

            // These will be set during init.
            output_index: usize::MAX,
            rad_per_cycle: 0.0,
            angle_rad: 0.0,
            scale: 0.0,
            table: SinCosTable::default(),
        }
    }
}

#[typetag::serde]
impl Calc for Sin {
    /// Reset the phase and register calc tape indices
    fn init(
        &mut self,
        ctx: ControllerCtx,
        input_indices: Vec<usize>,
        output_range: Range<usize>,
    ) -> Result<(), String> {
        check_indices(self, &input_indices, &output_range)?;
        let dt_s = sampling_period(&ctx)?;
        if !(self.period_s.is_finite() && self.period_s > 0.0) {
            warn!("Rejected sine period {}", self.period_s);
            return Err(format!("period_s must be positive, got {}", self.period_s));
        }

        // Apply offset once to save cycles
        self.angle_rad = (self.offset_s / self.period_s * TAU).rem_euclid(TAU);
        self.rad_per_cycle = dt_s * TAU / self.period_s;
        if self.high < self.low {
            core::mem::swap(&mut self.high, &mut self.low);
        }
        self.scale = (self.high - self.low) / 2.0;
        self.output_index = output_range.start;
        Ok(())
    }

    fn terminate(&mut self) {
        self.output_index = usize::MAX;
        self.rad_per_cycle = 0.0;
        self.angle_rad = 0.0;
        self.scale = 0.0;
    }

    /// Run calcs for a cycle
    fn eval(&mut self, tape: &mut [f64]) {
        self.angle_rad += self.rad_per_cycle;
        if self.angle_rad >= TAU {
            self.angle_rad -= TAU;
        }
        let y = (self.table.sin(self.angle_rad) + 1.0) * self.scale + self.low;

        tape[self.output_index] = y;
    }

    fn get_input_map(&self) -> BTreeMap<CalcInputName, FieldName> {
        BTreeMap::new()
    }

    fn update_input_map(&mut self, field: &str, _source: &str) -> Result<(), String> {
        Err(format!("Unrecognized field {field}"))
    }

    calc_config!(period_s, offset_s, low, high);
    calc_input_names!();
    calc_output_names!(y);
}
