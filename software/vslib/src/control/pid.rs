//! PID controller implemented on top of a second order RST controller.
//!
//! The continuous-time two-degrees-of-freedom law
//!
//! `u = kp (b ref - y) + ki/s (ref - y) + kd N s/(s + N) (c ref - y) + kff ref`
//!
//! is discretized with the pre-warped bilinear substitution
//! `s = a (1 - z^-1)/(1 + z^-1)`, `a = 2π f0 / tan(π f0 T)`,
//! which maps the frequency `f0` exactly. As `f0` goes to zero this is
//! the plain Tustin transform with `a = 2/T`.

use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{RangeLimiter, RstCoefficients, RstController};
use crate::warning::Warning;

/// Number of RST coefficients for a PID, which is a second order controller
pub const PID_LENGTH: usize = 3;

/// Tuning parameters of a PID controller.
///
/// The defaults have no gain and no sampling period, so they must be
/// filled in before they pass verification.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PidGains {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Feed-forward gain on the reference
    pub kff: f64,
    /// Reference weight of the proportional term
    pub b: f64,
    /// Reference weight of the derivative term
    pub c: f64,
    /// Derivative filter coefficient, rad/s
    pub n: f64,
    /// Sampling period, seconds
    pub ts: f64,
    /// Pre-warping frequency, Hz
    pub f0: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            kff: 0.0,
            b: 1.0,
            c: 1.0,
            n: 1.0,
            ts: 0.0,
            f0: 0.0,
        }
    }
}

/// Pre-warped bilinear-transform constant `2π f0 / tan(π f0 T)`
#[inline]
pub fn prewarp(f0: f64, ts: f64) -> f64 {
    2.0 * PI * f0 / (PI * f0 * ts).tan()
}

/// A PID controller whose gains are translated into RST coefficients.
#[derive(Clone, Debug, Default)]
pub struct PidRst {
    rst: RstController<PID_LENGTH>,
    gains: PidGains,
    one_dof: bool,
}

impl PidRst {
    pub fn new(actuation_limits: RangeLimiter) -> Self {
        Self {
            rst: RstController::new(actuation_limits),
            ..Default::default()
        }
    }

    /// Translate PID gains into RST coefficients without validating them.
    ///
    /// Returns the coefficients and whether one of the one-degree-of-freedom
    /// reductions (pure I, or PI with `b == 1` and no feed-forward) was used.
    /// Fails only if the pre-warping constant is zero or NaN.
    pub fn compute_coefficients(
        gains: &PidGains,
    ) -> Result<(RstCoefficients<PID_LENGTH>, bool), Warning> {
        let PidGains {
            kp,
            ki,
            kd,
            kff,
            b,
            c,
            n,
            ts,
            f0,
        } = *gains;

        let a = prewarp(f0, ts);
        if a == 0.0 || a.is_nan() {
            return Err(Warning::new(format!(
                "Pre-warping constant 2*pi*f0/tan(pi*f0*T) is {a} for f0 = {f0}, T = {ts}"
            )));
        }
        let a2 = a * a;

        let mut coefficients = RstCoefficients::default();
        let mut one_dof = false;

        if kd == 0.0 {
            if kp != 0.0 && kff == 0.0 && b == 1.0 {
                // PI: kp ki (1 ± kp a / ki) / a^2, expanded so that ki == 0 stays finite
                one_dof = true;
                let integral = kp * ki / a2;
                let proportional = kp * kp / a;
                coefficients.r = [integral + proportional, integral - proportional, 0.0];
                coefficients.s = [kp / a, -kp / a, 0.0];
                coefficients.t = coefficients.r;
            } else if kp == 0.0 {
                // I, with feed-forward
                one_dof = true;
                coefficients.r = [ki / a, ki / a, 0.0];
                coefficients.s = [1.0, -1.0, 0.0];
                coefficients.t = [ki / a + kff, ki / a - kff, 0.0];
            }
        }

        if !one_dof && (kp != 0.0 || kd != 0.0) {
            // Without derivative action the filter only adds a cancelling pole-zero pair
            let n = if kd == 0.0 { 1.0 } else { n };

            // (1 - z^-1)(a + N + (N - a) z^-1)
            let differentiated = [a + n, -2.0 * a, a - n];
            // (1 + z^-1)(a + N + (N - a) z^-1)
            let integrated = [a + n, 2.0 * n, n - a];
            // (1 - z^-1)^2
            let derivative = [1.0, -2.0, 1.0];

            for i in 0..PID_LENGTH {
                coefficients.r[i] =
                    kp * a * differentiated[i] + ki * integrated[i] + kd * n * a2 * derivative[i];
                coefficients.s[i] = a * differentiated[i];
                coefficients.t[i] = (kp * b + kff) * a * differentiated[i]
                    + ki * integrated[i]
                    + kd * c * n * a2 * derivative[i];
            }
        }

        Ok((coefficients, one_dof))
    }

    /// Derive RST coefficients from `gains`, validate them, and commit them
    /// to the controller. Nothing is committed on failure.
    ///
    /// Histories are kept so that gains can be changed between ticks.
    pub fn verify_parameters(&mut self, gains: &PidGains) -> Result<(), Warning> {
        let (coefficients, one_dof) = Self::compute_coefficients(gains)?;
        self.rst.set_coefficients(&coefficients)?;
        self.gains = *gains;
        self.one_dof = one_dof;
        Ok(())
    }

    /// Run one control step. Returns 0.0 until enough history is recorded.
    #[inline]
    pub fn control(&mut self, reference: f64, measurement: f64) -> f64 {
        self.rst.control(reference, measurement)
    }

    /// Overwrite the latest actuation with the value actually applied downstream
    pub fn update_reference(&mut self, updated_actuation: f64) {
        self.rst.update_reference(updated_actuation);
    }

    pub fn reset(&mut self) {
        self.rst.reset();
    }

    pub fn set_actuation_limits(&mut self, actuation_limits: RangeLimiter) {
        self.rst.set_actuation_limits(actuation_limits);
    }

    pub fn is_ready(&self) -> bool {
        self.rst.is_ready()
    }

    /// Whether the committed coefficients came from a one-degree-of-freedom reduction
    pub fn is_one_dof(&self) -> bool {
        self.one_dof
    }

    /// Last gains that passed verification
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn rst(&self) -> &RstController<PID_LENGTH> {
        &self.rst
    }
}
