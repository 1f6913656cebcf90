//! A second order RST controller with directly specified coefficients

use super::*;
use crate::control::{PID_LENGTH, RstCoefficients, RstController};
use crate::{calc_config, calc_input_names, calc_output_names};

/// Second order RST controller.
///
/// `r`, `s` and `t` multiply increasing powers of the backward shift,
/// so `s0` scales the newest actuation. The coefficients are checked with
/// Jury's test during `init`.
#[derive(Serialize, Deserialize, Debug)]
pub struct Rst {
    // User inputs
    reference_name: String,
    measurement_name: String,
    r0: f64,
    r1: f64,
    r2: f64,
    s0: f64,
    s1: f64,
    s2: f64,
    t0: f64,
    t1: f64,
    t2: f64,
    min: f64,
    max: f64,

    // Values provided by calc orchestrator during init
    #[serde(skip)]
    input_indices: Vec<usize>,

    #[serde(skip)]
    output_index: usize,

    // Internal state
    #[serde(skip)]
    controller: RstController<PID_LENGTH>,
}

impl Default for Rst {
    /// Zero coefficients and no actuation limits
    fn default() -> Self {
        Self::new(
            String::new(),
            String::new(),
            RstCoefficients::default(),
            f64::MIN,
            f64::MAX,
        )
    }
}

impl Rst {
    pub fn new(
        reference_name: String,
        measurement_name: String,
        coefficients: RstCoefficients<PID_LENGTH>,
        min: f64,
        max: f64,
    ) -> Self {
        let RstCoefficients {
            r: [r0, r1, r2],
            s: [s0, s1, s2],
            t: [t0, t1, t2],
        } = coefficients;

        Self {
            reference_name,
            measurement_name,
            r0,
            r1,
            r2,
            s0,
            s1,
            s2,
            t0,
            t1,
            t2,
            min,
            max,

            input_indices: vec![],
            output_index: usize::MAX,
            controller: RstController::default(),
        }
    }

    fn coefficients(&self) -> RstCoefficients<PID_LENGTH> {
        RstCoefficients {
            r: [self.r0, self.r1, self.r2],
            s: [self.s0, self.s1, self.s2],
            t: [self.t0, self.t1, self.t2],
        }
    }

    pub fn controller(&self) -> &RstController<PID_LENGTH> {
        &self.controller
    }
}

#[typetag::serde]
impl Calc for Rst {
    /// Verify coefficients and register calc tape indices
    fn init(
        &mut self,
        _: ControllerCtx,
        input_indices: Vec<usize>,
        output_range: Range<usize>,
    ) -> Result<(), String> {
        check_indices(self, &input_indices, &output_range)?;

        let mut controller = RstController::new(actuation_limits(self.min, self.max)?);
        let coefficients = self.coefficients();
        if let Err(warning) = controller.set_coefficients(&coefficients) {
            warn!("Rejected RST coefficients {coefficients:?}: {warning}");
            return Err(warning.into());
        }
        info!("RST controller initialized with {coefficients:?}");

        self.controller = controller;
        self.input_indices = input_indices;
        self.output_index = output_range.start;
        Ok(())
    }

    fn terminate(&mut self) {
        self.controller.reset();
        self.input_indices.clear();
        self.output_index = usize::MAX;
    }

    /// Run calcs for a cycle
    fn eval(&mut self, tape: &mut [f64]) {
        let reference = tape[self.input_indices[0]];
        let measurement = tape[self.input_indices[1]];
        tape[self.output_index] = self.controller.control(reference, measurement);
    }

    fn get_input_map(&self) -> BTreeMap<CalcInputName, FieldName> {
        BTreeMap::from([
            ("reference".to_owned(), self.reference_name.clone()),
            ("measurement".to_owned(), self.measurement_name.clone()),
        ])
    }

    fn update_input_map(&mut self, field: &str, source: &str) -> Result<(), String> {
        match field {
            "reference" => self.reference_name = source.to_owned(),
            "measurement" => self.measurement_name = source.to_owned(),
            _ => return Err(format!("Unrecognized field {field}")),
        }

        Ok(())
    }

    calc_config!(r0, r1, r2, s0, s1, s2, t0, t1, t2, min, max);
    calc_input_names!(reference, measurement);
    calc_output_names!(actuation);
}
