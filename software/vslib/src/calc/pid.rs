//! A two-degrees-of-freedom PID controller with back-calculation anti-windup

use super::*;
use crate::control::{PidGains, PidRst};
use crate::{calc_config, calc_input_names, calc_output_names};

/// PID controller evaluated as a second order RST controller.
///
/// The sampling period is the controller's cycle period. Actuation is
/// clamped to `[min, max]`, and clamping back-calculates the reference
/// history so that the integral does not wind up.
#[derive(Serialize, Deserialize, Debug)]
pub struct Pid {
    // User inputs
    reference_name: String,
    measurement_name: String,
    kp: f64,
    ki: f64,
    kd: f64,
    kff: f64,
    b: f64,
    c: f64,
    n: f64,
    f0: f64,
    min: f64,
    max: f64,

    // Values provided by calc orchestrator during init
    #[serde(skip)]
    input_indices: Vec<usize>,

    #[serde(skip)]
    output_index: usize,

    // Internal state
    #[serde(skip)]
    controller: PidRst,
}

impl Default for Pid {
    fn default() -> Self {
        Self::new(
            String::new(),
            String::new(),
            PidGains::default(),
            f64::MIN,
            f64::MAX,
        )
    }
}

impl Pid {
    /// `gains.ts` is ignored; the sampling period comes from the cycle period at `init`.
    pub fn new(
        reference_name: String,
        measurement_name: String,
        gains: PidGains,
        min: f64,
        max: f64,
    ) -> Self {
        let PidGains {
            kp,
            ki,
            kd,
            kff,
            b,
            c,
            n,
            f0,
            ..
        } = gains;

        Self {
            reference_name,
            measurement_name,
            kp,
            ki,
            kd,
            kff,
            b,
            c,
            n,
            f0,
            min,
            max,

            // These will be set during init.
            // Use default indices that will cause an error on the first call if not initialized properly
            input_indices: vec![],
            output_index: usize::MAX,
            controller: PidRst::default(),
        }
    }

    fn gains(&self, ts: f64) -> PidGains {
        PidGains {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            kff: self.kff,
            b: self.b,
            c: self.c,
            n: self.n,
            ts,
            f0: self.f0,
        }
    }

    pub fn controller(&self) -> &PidRst {
        &self.controller
    }
}

#[typetag::serde]
impl Calc for Pid {
    /// Derive and verify RST coefficients, and register calc tape indices
    fn init(
        &mut self,
        ctx: ControllerCtx,
        input_indices: Vec<usize>,
        output_range: Range<usize>,
    ) -> Result<(), String> {
        check_indices(self, &input_indices, &output_range)?;
        let ts = sampling_period(&ctx)?;
        let gains = self.gains(ts);

        let mut controller = PidRst::new(actuation_limits(self.min, self.max)?);
        if let Err(warning) = controller.verify_parameters(&gains) {
            warn!("Rejected PID gains {gains:?}: {warning}");
            return Err(warning.into());
        }
        info!(
            "PID initialized with T = {ts:e} s, {} form, r = {:?}, s = {:?}, t = {:?}",
            if controller.is_one_dof() {
                "one-degree-of-freedom"
            } else {
                "general"
            },
            controller.rst().r(),
            controller.rst().s(),
            controller.rst().t()
        );

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

    /// Map from input field names to the tape signal that the input should draw from
    fn get_input_map(&self) -> BTreeMap<CalcInputName, FieldName> {
        let mut map = BTreeMap::new();
        map.insert("reference".to_owned(), self.reference_name.clone());
        map.insert("measurement".to_owned(), self.measurement_name.clone());
        map
    }

    /// Change a value in the input map
    fn update_input_map(&mut self, field: &str, source: &str) -> Result<(), String> {
        match field {
            "reference" => self.reference_name = source.to_owned(),
            "measurement" => self.measurement_name = source.to_owned(),
            _ => return Err(format!("Unrecognized field {field}")),
        }

        Ok(())
    }

    calc_config!(kp, ki, kd, kff, b, c, n, f0, min, max);
    calc_input_names!(reference, measurement);
    calc_output_names!(actuation);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pi(min: f64, max: f64) -> Pid {
        let gains = PidGains {
            kp: 0.5,
            ki: 20.0,
            f0: 1e-9,
            ..Default::default()
        };
        Pid::new("r".to_owned(), "y".to_owned(), gains, min, max)
    }

    #[test]
    fn tracks_reference_on_tape() {
        let mut calc = pi(-5.0, 5.0);
        calc.init(ControllerCtx::new(100_000), vec![0, 1], 2..3).unwrap();
        assert!(calc.controller().is_one_dof());

        let mut tape = [1.0, 0.0, 0.0];
        for _ in 0..20_000 {
            calc.eval(&mut tape);
            // First order plant with unit DC gain
            tape[1] = 0.99 * tape[1] + 0.01 * tape[2];
        }
        assert!((tape[1] - 1.0).abs() < 1e-3, "y = {}", tape[1]);
    }

    #[test]
    fn clamps_actuation() {
        let mut calc = pi(-0.1, 0.1);
        calc.init(ControllerCtx::new(100_000), vec![0, 1], 2..3).unwrap();

        let mut tape = [100.0, 0.0, 0.0];
        for _ in 0..100 {
            calc.eval(&mut tape);
            assert!(tape[2].abs() <= 0.1, "u = {}", tape[2]);
        }
        assert_eq!(tape[2], 0.1);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let ctx = ControllerCtx::new(100_000);

        // No pre-warping frequency
        let mut calc = Pid::default();
        let err = calc.init(ctx.clone(), vec![0, 1], 2..3).unwrap_err();
        assert!(err.contains("Pre-warping"), "{err}");

        // No gains
        let gains = PidGains {
            f0: 1e-9,
            ..Default::default()
        };
        let mut calc = Pid::new(String::new(), String::new(), gains, -1.0, 1.0);
        let err = calc.init(ctx.clone(), vec![0, 1], 2..3).unwrap_err();
        assert!(err.contains("First r"), "{err}");

        // Zero cycle period
        let mut calc = pi(-1.0, 1.0);
        assert!(calc.init(ControllerCtx::new(0), vec![0, 1], 2..3).is_err());

        // Wrong wiring
        assert!(calc.init(ctx.clone(), vec![0], 2..3).is_err());
        assert!(calc.init(ctx.clone(), vec![0, 1], 2..4).is_err());

        // Inverted limits
        let mut calc = pi(1.0, -1.0);
        assert!(calc.init(ctx, vec![0, 1], 2..3).is_err());
    }

    #[test]
    fn terminate_clears_history() {
        let mut calc = pi(-5.0, 5.0);
        calc.init(ControllerCtx::new(100_000), vec![0, 1], 2..3).unwrap();
        let mut tape = [1.0, 0.0, 0.0];
        for _ in 0..10 {
            calc.eval(&mut tape);
        }
        assert!(calc.controller().is_ready());

        calc.terminate();
        assert!(!calc.controller().is_ready());
        assert_eq!(calc.output_index, usize::MAX);
    }

    #[test]
    fn input_map_updates() {
        let mut calc = Pid::default();
        calc.update_input_map("reference", "setpoint.v").unwrap();
        calc.update_input_map("measurement", "sensor.v").unwrap();
        assert!(calc.update_input_map("error", "x").is_err());

        let map = calc.get_input_map();
        assert_eq!(map["reference"], "setpoint.v");
        assert_eq!(map["measurement"], "sensor.v");
    }
}
