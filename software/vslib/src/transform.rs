//! Clarke and Park transformations (along with their inverses).
//!
//! Amplitude-invariant convention: a balanced set of phase quantities with
//! amplitude `A` maps to `d = A` when the rotating frame is aligned with
//! phase a, i.e. the d axis coincides with phase a at `theta = 0`.

use core::f64::consts::FRAC_PI_3;

use serde::{Deserialize, Serialize};

use crate::math::SinCosTable;

const SQRT_3: f64 = 1.732_050_807_568_877_2;
const FRAC_1_SQRT_3: f64 = 0.577_350_269_189_625_8;

/// Three-phase stationary frame
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Abc {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Two-phase stationary orthogonal frame with the zero-sequence component
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct AlphaBetaZero {
    pub alpha: f64,
    pub beta: f64,
    pub zero: f64,
}

/// Rotating frame with the zero-sequence component
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Dq0 {
    pub d: f64,
    pub q: f64,
    pub zero: f64,
}

/// Clarke transform
#[inline]
pub fn clarke(abc: Abc) -> AlphaBetaZero {
    let Abc { a, b, c } = abc;
    AlphaBetaZero {
        alpha: (2.0 * a - b - c) / 3.0,
        beta: (b - c) * FRAC_1_SQRT_3,
        zero: (a + b + c) / 3.0,
    }
}

/// Inverse Clarke transform
#[inline]
pub fn inverse_clarke(ab0: AlphaBetaZero) -> Abc {
    let AlphaBetaZero { alpha, beta, zero } = ab0;
    let half_sqrt_3_beta = 0.5 * SQRT_3 * beta;
    Abc {
        a: alpha + zero,
        b: -0.5 * alpha + half_sqrt_3_beta + zero,
        c: -0.5 * alpha - half_sqrt_3_beta + zero,
    }
}

/// Park transform. The zero-sequence component passes through.
#[inline]
pub fn park(cos_angle: f64, sin_angle: f64, ab0: AlphaBetaZero) -> Dq0 {
    Dq0 {
        d: cos_angle * ab0.alpha + sin_angle * ab0.beta,
        q: cos_angle * ab0.beta - sin_angle * ab0.alpha,
        zero: ab0.zero,
    }
}

/// Inverse Park transform
#[inline]
pub fn inverse_park(cos_angle: f64, sin_angle: f64, dq0: Dq0) -> AlphaBetaZero {
    AlphaBetaZero {
        alpha: cos_angle * dq0.d - sin_angle * dq0.q,
        beta: sin_angle * dq0.d + cos_angle * dq0.q,
        zero: dq0.zero,
    }
}

/// abc to dq0, with the angle's sine and cosine taken from a lookup table.
#[derive(Clone, Debug, Default)]
pub struct AbcToDq0Transform {
    trig: SinCosTable,
}

impl AbcToDq0Transform {
    pub fn new(trig: SinCosTable) -> Self {
        Self { trig }
    }

    /// Transform `abc` into the frame rotated by `theta` radians.
    ///
    /// `offset` shifts the d axis away from phase a.
    pub fn transform(&mut self, abc: Abc, theta: f64, offset: f64) -> Dq0 {
        let (sin_angle, cos_angle) = self.trig.sin_cos(theta + offset);
        park(cos_angle, sin_angle, clarke(abc))
    }
}

/// dq0 to abc, with the angle's sine and cosine taken from a lookup table.
#[derive(Clone, Debug, Default)]
pub struct Dq0ToAbcTransform {
    trig: SinCosTable,
}

impl Dq0ToAbcTransform {
    pub fn new(trig: SinCosTable) -> Self {
        Self { trig }
    }

    pub fn transform(&mut self, dq0: Dq0, theta: f64, offset: f64) -> Abc {
        let (sin_angle, cos_angle) = self.trig.sin_cos(theta + offset);
        inverse_clarke(inverse_park(cos_angle, sin_angle, dq0))
    }
}

/// Balanced phase set `A cos(theta - k 2π/3)`
pub fn balanced(amplitude: f64, theta: f64) -> Abc {
    Abc {
        a: amplitude * theta.cos(),
        b: amplitude * (theta - 2.0 * FRAC_PI_3).cos(),
        c: amplitude * (theta + 2.0 * FRAC_PI_3).cos(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-5;

    #[track_caller]
    fn assert_abc_close(x: Abc, y: Abc, tol: f64) {
        assert!(
            (x.a - y.a).abs() < tol && (x.b - y.b).abs() < tol && (x.c - y.c).abs() < tol,
            "{x:?} != {y:?}"
        );
    }

    #[test]
    fn clarke_round_trip() {
        for (a, b, c) in [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (-0.5, -0.5, 1.0),
            (13.0, 21.0, -4.0),
            (2.0, 2.0, 2.0),
        ] {
            let abc = Abc { a, b, c };
            assert_abc_close(inverse_clarke(clarke(abc)), abc, 1e-12);
        }
    }

    #[test]
    fn common_mode_is_zero_sequence() {
        let ab0 = clarke(Abc {
            a: 2.0,
            b: 2.0,
            c: 2.0,
        });
        assert!(ab0.alpha.abs() < 1e-12);
        assert!(ab0.beta.abs() < 1e-12);
        assert!((ab0.zero - 2.0).abs() < 1e-12);
    }

    #[test]
    fn park_round_trip() {
        let (sin_angle, cos_angle) = 0.82_f64.sin_cos();
        let input = AlphaBetaZero {
            alpha: 2.0,
            beta: 3.0,
            zero: 0.5,
        };
        let result = inverse_park(cos_angle, sin_angle, park(cos_angle, sin_angle, input));
        assert!((result.alpha - input.alpha).abs() < 1e-12);
        assert!((result.beta - input.beta).abs() < 1e-12);
        assert_eq!(result.zero, input.zero);
    }

    #[test]
    fn aligned_balanced_set_is_pure_d() {
        let mut transform = AbcToDq0Transform::default();
        for i in 0..100 {
            let theta = -10.0 + 0.37 * i as f64;
            let dq0 = transform.transform(balanced(1.5, theta), theta, 0.0);
            assert!((dq0.d - 1.5).abs() < TOL, "d = {} at {theta}", dq0.d);
            assert!(dq0.q.abs() < TOL, "q = {} at {theta}", dq0.q);
            assert!(dq0.zero.abs() < TOL);
        }
    }

    #[test]
    fn lagging_set_lands_on_negative_q() {
        let mut transform = AbcToDq0Transform::default();
        let theta = 1.1;
        let dq0 = transform.transform(balanced(1.0, theta - FRAC_PI_3 * 1.5), theta, 0.0);
        assert!(dq0.d.abs() < TOL, "d = {}", dq0.d);
        assert!((dq0.q + 1.0).abs() < TOL, "q = {}", dq0.q);
    }

    #[test]
    fn dq0_round_trip_through_tables() {
        let mut forward = AbcToDq0Transform::default();
        let mut backward = Dq0ToAbcTransform::default();
        let abc = Abc {
            a: 0.3,
            b: -1.2,
            c: 0.7,
        };
        for theta in [0.0, 0.5, 2.0, -3.0, 40.0] {
            let dq0 = forward.transform(abc, theta, 0.25);
            assert_abc_close(backward.transform(dq0, theta, 0.25), abc, 1e-4);
        }
    }
}
