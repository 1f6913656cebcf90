//! Polynomial evaluation helpers shared by the stability checks.

/// Evaluate a polynomial with coeffs ordered by increasing order (c[0] + [c1]*x + ...)
#[inline]
pub fn polyval(x: f64, c: &[f64]) -> f64 {
    // Horner's method, starting from the highest order coefficient
    c.iter().rev().fold(0.0, |acc, &coef| x.mul_add(acc, coef))
}

/// Copy of `c` in reversed order, turning descending-power coefficients
/// into increasing-order ones for [polyval].
#[inline]
pub fn reversed<const N: usize>(c: &[f64; N]) -> [f64; N] {
    let mut out = *c;
    out.reverse();
    out
}
