//! Two-degrees-of-freedom discrete-time RST controller.
//!
//! One control step solves
//!
//! `s[0] u[k] = t[0] ref[k] - r[0] y[k] + sum_{i=1..n} (t[i] ref[k-i] - r[i] y[k-i] - s[i] u[k-i])`
//!
//! for the actuation `u[k]`, where `ref` is the reference, `y` the measurement,
//! and `n = N - 1` the controller order. Histories are kept in fixed-size
//! circular buffers sharing a single head index, so a step never allocates.

use super::RangeLimiter;
use crate::math::jurys_stability_test;
use crate::warning::Warning;

/// The three coefficient vectors of an RST controller of order `N - 1`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RstCoefficients<const N: usize> {
    /// Measurement (feedback) coefficients
    pub r: [f64; N],
    /// Actuation (denominator) coefficients
    pub s: [f64; N],
    /// Reference (feed-forward) coefficients
    pub t: [f64; N],
}

impl<const N: usize> Default for RstCoefficients<N> {
    fn default() -> Self {
        Self {
            r: [0.0; N],
            s: [0.0; N],
            t: [0.0; N],
        }
    }
}

impl<const N: usize> RstCoefficients<N> {
    /// Validate the coefficients before they are committed to a controller.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// leading coefficients of `r`, `s`, `t`, then Jury's test on `s` and on `t`.
    /// `r` only shapes the feedback numerator, so its roots are not checked.
    pub fn validate(&self) -> Result<(), Warning> {
        for (label, coefficients) in [("r", &self.r), ("s", &self.s), ("t", &self.t)] {
            match coefficients.first() {
                Some(&c) if c != 0.0 => {}
                _ => {
                    return Err(Warning::new(format!(
                        "First {label} coefficient is zero, the controller is ill-defined"
                    )));
                }
            }
        }
        if self.r.iter().any(|c| !c.is_finite()) {
            return Err(Warning::new(format!(
                "r coefficients must be finite: {:?}",
                self.r
            )));
        }

        jurys_stability_test(&self.s, "s")?;
        jurys_stability_test(&self.t, "t")?;

        Ok(())
    }
}

/// RST controller with `N = order + 1` coefficients per polynomial.
#[derive(Clone, Debug)]
pub struct RstController<const N: usize> {
    r: [f64; N],
    s: [f64; N],
    t: [f64; N],

    measurements: [f64; N],
    references: [f64; N],
    actuations: [f64; N],

    /// Slot for the next sample, shared by all three histories
    head: usize,

    /// Samples recorded since reset, saturating at `N`
    samples: usize,

    actuation_limits: RangeLimiter,
}

impl<const N: usize> Default for RstController<N> {
    fn default() -> Self {
        Self {
            r: [0.0; N],
            s: [0.0; N],
            t: [0.0; N],
            measurements: [0.0; N],
            references: [0.0; N],
            actuations: [0.0; N],
            head: 0,
            samples: 0,
            actuation_limits: RangeLimiter::default(),
        }
    }
}

impl<const N: usize> RstController<N> {
    /// Controller order
    pub const ORDER: usize = N - 1;

    pub fn new(actuation_limits: RangeLimiter) -> Self {
        Self {
            actuation_limits,
            ..Default::default()
        }
    }

    /// Validate and commit all three coefficient vectors.
    /// Nothing is committed if any check fails.
    pub fn set_coefficients(&mut self, coefficients: &RstCoefficients<N>) -> Result<(), Warning> {
        coefficients.validate()?;
        self.set_r(coefficients.r);
        self.set_s(coefficients.s);
        self.set_t(coefficients.t);
        Ok(())
    }

    /// Commit `r` without validation
    pub fn set_r(&mut self, r: [f64; N]) {
        self.r = r;
    }

    /// Commit `s` without validation
    pub fn set_s(&mut self, s: [f64; N]) {
        self.s = s;
    }

    /// Commit `t` without validation
    pub fn set_t(&mut self, t: [f64; N]) {
        self.t = t;
    }

    pub fn set_actuation_limits(&mut self, actuation_limits: RangeLimiter) {
        self.actuation_limits = actuation_limits;
    }

    /// Jury's stability test on a candidate `s` or `t` polynomial
    pub fn jurys_stability_test(&self, coefficients: &[f64; N], label: &str) -> Result<(), Warning> {
        jurys_stability_test(coefficients, label)
    }

    /// Record the latest reference and measurement and advance the head.
    #[inline]
    pub fn update_input_histories(&mut self, reference: f64, measurement: f64) {
        self.measurements[self.head] = measurement;
        self.references[self.head] = reference;

        self.head += 1;
        if self.head >= N {
            self.head -= N;
        }
        if self.samples < N {
            self.samples += 1;
        }
    }

    /// Whether every history slot has been filled since construction or reset
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.samples >= N
    }

    /// Run one control step and return the (limited) actuation.
    ///
    /// Until [Self::is_ready], the inputs are only recorded and the actuation is 0.0.
    /// When the actuation limits clip the result, the reference history is
    /// back-calculated so that the next step continues from the applied value.
    ///
    /// Must be called exactly once per sample period.
    pub fn control(&mut self, reference: f64, measurement: f64) -> f64 {
        self.update_input_histories(reference, measurement);
        let latest = self.latest();

        if !self.is_ready() {
            self.actuations[latest] = 0.0;
            return 0.0;
        }

        let mut actuation = self.t[0] * reference - self.r[0] * measurement;
        for i in 1..N {
            let j = Self::back(latest, i);
            actuation += self.t[i] * self.references[j]
                - self.r[i] * self.measurements[j]
                - self.s[i] * self.actuations[j];
        }
        actuation /= self.s[0];
        self.actuations[latest] = actuation;

        let limited = self.actuation_limits.limit(actuation);
        if limited != actuation {
            self.update_reference(limited);
        }

        limited
    }

    /// Replace the latest actuation with the value actually applied and
    /// back-calculate the latest reference consistent with it.
    pub fn update_reference(&mut self, updated_actuation: f64) {
        let latest = self.latest();
        self.actuations[latest] = updated_actuation;

        let mut reference = self.s[0] * updated_actuation + self.r[0] * self.measurements[latest];
        for i in 1..N {
            let j = Self::back(latest, i);
            reference -= self.t[i] * self.references[j]
                - self.r[i] * self.measurements[j]
                - self.s[i] * self.actuations[j];
        }
        self.references[latest] = reference / self.t[0];
    }

    /// Clear histories. Coefficients and limits are kept.
    pub fn reset(&mut self) {
        self.measurements = [0.0; N];
        self.references = [0.0; N];
        self.actuations = [0.0; N];
        self.head = 0;
        self.samples = 0;
    }

    pub fn r(&self) -> &[f64; N] {
        &self.r
    }

    pub fn s(&self) -> &[f64; N] {
        &self.s
    }

    pub fn t(&self) -> &[f64; N] {
        &self.t
    }

    pub fn measurements(&self) -> &[f64; N] {
        &self.measurements
    }

    pub fn references(&self) -> &[f64; N] {
        &self.references
    }

    pub fn actuations(&self) -> &[f64; N] {
        &self.actuations
    }

    /// Index of the slot that the next sample will be written to
    pub fn head(&self) -> usize {
        self.head
    }

    pub fn actuation_limits(&self) -> &RangeLimiter {
        &self.actuation_limits
    }

    /// Slot holding the most recent sample
    #[inline]
    fn latest(&self) -> usize {
        Self::back(self.head, 1)
    }

    /// Step `offset < N` slots back from `index` in the circular buffers
    #[inline(always)]
    fn back(index: usize, offset: usize) -> usize {
        if index >= offset {
            index - offset
        } else {
            index + N - offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A second order controller with s = (z - 0.5)(z - 0.2) and a stable t
    fn coefficients() -> RstCoefficients<3> {
        RstCoefficients {
            r: [2.0, 0.4, -0.6],
            s: [1.0, -0.7, 0.1],
            t: [1.5, 0.5, -0.2],
        }
    }

    fn controller(limits: RangeLimiter) -> RstController<3> {
        let mut rst = RstController::new(limits);
        rst.set_coefficients(&coefficients()).unwrap();
        rst
    }

    /// Evaluate the control law directly from the controller's stored histories
    /// for the most recent sample.
    fn recurrence_residual(rst: &RstController<3>) -> f64 {
        let latest = RstController::<3>::back(rst.head(), 1);
        let (r, s, t) = (rst.r(), rst.s(), rst.t());
        let mut residual = 0.0;
        for i in 0..3 {
            let j = RstController::<3>::back(latest, i);
            residual += s[i] * rst.actuations()[j] - t[i] * rst.references()[j]
                + r[i] * rst.measurements()[j];
        }
        residual
    }

    #[test]
    fn warm_up_returns_zero_for_order_samples() {
        let mut rst = controller(RangeLimiter::default());
        assert_eq!(RstController::<3>::ORDER, 2);

        assert!(!rst.is_ready());
        assert_eq!(rst.control(1.0, 0.5), 0.0);
        assert!(!rst.is_ready());
        assert_eq!(rst.control(1.0, 0.25), 0.0);
        assert!(!rst.is_ready());

        // t . ref - r . y - s[1..] . u, divided by s[0]
        let expected = (1.5 * 1.0 + 0.5 * 1.0 - 0.2 * 1.0) - (2.0 * 0.125 + 0.4 * 0.25 - 0.6 * 0.5);
        let u = rst.control(1.0, 0.125);
        assert!(rst.is_ready());
        assert!(u != 0.0);
        assert!((u - expected).abs() < 1e-12, "{u} != {expected}");
    }

    #[test]
    fn ready_only_after_every_slot_is_filled() {
        let mut rst = RstController::<3>::default();
        rst.update_input_histories(1.0, 1.0);
        rst.update_input_histories(1.0, 1.0);
        assert!(!rst.is_ready());

        rst.update_input_histories(1.0, 1.0);
        assert!(rst.is_ready());

        // Stays ready once the buffers have wrapped
        for _ in 0..4 {
            rst.update_input_histories(1.0, 1.0);
            assert!(rst.is_ready());
        }
    }

    #[test]
    fn prefilled_histories_skip_warm_up() {
        let mut rst = controller(RangeLimiter::default());
        for _ in 0..2 {
            rst.update_input_histories(1.0, 0.0);
        }

        // The third sample fills the last slot, so the law is evaluated at once
        let u = rst.control(1.0, 0.0);
        assert!((u - 1.8).abs() < 1e-12, "{u}");
    }

    #[test]
    fn follows_recurrence() {
        let mut rst = controller(RangeLimiter::default());
        let mut u_hist = [0.0; 3];
        let mut ref_hist = [0.0; 3];
        let mut y_hist = [0.0; 3];
        let coefficients = coefficients();

        for k in 0..50 {
            let reference = (k as f64 * 0.3).sin();
            let measurement = 0.2 * (k as f64 * 0.7).cos();
            ref_hist = [reference, ref_hist[0], ref_hist[1]];
            y_hist = [measurement, y_hist[0], y_hist[1]];

            let u = rst.control(reference, measurement);
            let expected = if k < 2 {
                0.0
            } else {
                let mut acc = coefficients.t[0] * reference - coefficients.r[0] * measurement;
                for i in 1..3 {
                    acc += coefficients.t[i] * ref_hist[i]
                        - coefficients.r[i] * y_hist[i]
                        - coefficients.s[i] * u_hist[i - 1];
                }
                acc / coefficients.s[0]
            };
            u_hist = [expected, u_hist[0], u_hist[1]];

            assert!((u - expected).abs() < 1e-9, "k = {k}: {u} != {expected}");
            if k >= 2 {
                assert!(recurrence_residual(&rst).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn head_wraps_around() {
        let mut rst = controller(RangeLimiter::default());
        let heads: Vec<usize> = (0..7)
            .map(|_| {
                rst.update_input_histories(0.0, 0.0);
                rst.head()
            })
            .collect();
        assert_eq!(heads, vec![1, 2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn clipping_back_calculates_reference() {
        let limits = RangeLimiter::new(-0.5, 0.5).unwrap();
        let mut rst = controller(limits);

        rst.control(0.0, 0.0);
        rst.control(0.0, 0.0);

        // Large reference step saturates the output
        let u = rst.control(10.0, 0.0);
        assert_eq!(u, 0.5);

        let latest = RstController::<3>::back(rst.head(), 1);
        assert_eq!(rst.actuations()[latest], 0.5);
        assert!(rst.references()[latest] < 10.0);

        // Histories are consistent with the applied, not the computed, actuation
        assert!(recurrence_residual(&rst).abs() < 1e-12);

        // The next step continues from the clipped history
        for _ in 0..20 {
            let u = rst.control(10.0, 0.1);
            assert!((-0.5..=0.5).contains(&u));
            assert!(recurrence_residual(&rst).abs() < 1e-12);
        }
    }

    #[test]
    fn update_reference_without_clipping_is_identity() {
        let mut rst = controller(RangeLimiter::default());
        for k in 0..5 {
            rst.control(k as f64, 0.1 * k as f64);
        }
        let latest = RstController::<3>::back(rst.head(), 1);
        let reference = rst.references()[latest];
        let actuation = rst.actuations()[latest];

        rst.update_reference(actuation);
        assert!((rst.references()[latest] - reference).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_histories_only() {
        let mut rst = controller(RangeLimiter::default());
        for k in 0..5 {
            rst.control(1.0, k as f64);
        }
        rst.reset();

        assert_eq!(rst.head(), 0);
        assert!(!rst.is_ready());
        assert_eq!(rst.measurements(), &[0.0; 3]);
        assert_eq!(rst.references(), &[0.0; 3]);
        assert_eq!(rst.actuations(), &[0.0; 3]);
        assert_eq!(rst.r(), &coefficients().r);
        assert_eq!(rst.s(), &coefficients().s);
        assert_eq!(rst.t(), &coefficients().t);
        assert_eq!(rst.control(1.0, 0.0), 0.0);
    }

    #[test]
    fn rejects_invalid_coefficients_without_committing() {
        let mut rst = controller(RangeLimiter::default());

        let mut bad = coefficients();
        bad.t[0] = 0.0;
        let warning = rst.set_coefficients(&bad).unwrap_err();
        assert!(warning.message().contains("First t"), "{warning}");

        let mut bad = coefficients();
        bad.s = [1.0, -1.7, 0.3];
        let warning = rst.set_coefficients(&bad).unwrap_err();
        assert!(warning.message().contains("s polynomial"), "{warning}");

        assert_eq!(rst.s(), &coefficients().s);
        assert_eq!(rst.t(), &coefficients().t);
    }

    #[test]
    fn leading_coefficient_checks_come_before_stability() {
        let bad = RstCoefficients {
            r: [0.0, 1.0, 0.0],
            s: [1.0, -1.7, 0.3],
            t: [1.0, 0.0, 0.0],
        };
        let warning = bad.validate().unwrap_err();
        assert!(warning.message().contains("First r"), "{warning}");
    }

    #[test]
    fn first_order_controller() {
        // Pure integrator: u[k] = u[k-1] + 0.1 (ref[k] - y[k])
        let mut rst = RstController::<2>::default();
        rst.set_coefficients(&RstCoefficients {
            r: [0.1, 0.0],
            s: [1.0, -1.0],
            t: [0.1, 0.0],
        })
        .unwrap();

        assert_eq!(rst.control(1.0, 0.0), 0.0);
        let u1 = rst.control(1.0, 0.0);
        let u2 = rst.control(1.0, 0.0);
        assert!((u1 - 0.1).abs() < 1e-15);
        assert!((u2 - 0.2).abs() < 1e-15);
    }
}
