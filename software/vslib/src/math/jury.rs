//! Jury's stability criterion for discrete-time polynomials.

use super::{polyval, reversed};
use crate::warning::Warning;

/// Relative slack on the criterion's inequalities. Roots on the unit circle
/// (the integrator at z = 1, the bilinear-transform zero at z = -1) pass.
const MARGIN: f64 = 1e-9;

/// Check that all roots of a polynomial lie inside, or on, the unit circle.
///
/// `coefficients` are in descending powers of z, which is the same order
/// as the RST coefficient vectors (`c[i]` multiplies `z^-i`):
///
/// `P(z) = c[0] z^n + c[1] z^(n-1) + ... + c[n]`
///
/// `label` names the polynomial in the returned warning.
pub fn jurys_stability_test<const N: usize>(
    coefficients: &[f64; N],
    label: &str,
) -> Result<(), Warning> {
    let Some(n) = N.checked_sub(1) else {
        return Err(Warning::new(format!("{label} polynomial is empty")));
    };
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(Warning::new(format!(
            "{label} polynomial has non-finite coefficients: {coefficients:?}"
        )));
    }
    if coefficients[0] == 0.0 {
        return Err(Warning::new(format!(
            "{label} polynomial has a zero leading coefficient"
        )));
    }

    if n == 0 {
        return Ok(());
    }

    // Increasing order with a positive leading coefficient
    let sign = coefficients[0].signum();
    let mut row = reversed(coefficients);
    row.iter_mut().for_each(|c| *c *= sign);
    let tolerance = MARGIN * row.iter().map(|c| c.abs()).sum::<f64>();

    let p_one = polyval(1.0, &row);
    if p_one < -tolerance {
        return Err(Warning::new(format!(
            "{label} polynomial fails Jury's stability test: P(1) = {p_one:e} is negative"
        )));
    }

    let p_minus_one = if n % 2 == 0 {
        polyval(-1.0, &row)
    } else {
        -polyval(-1.0, &row)
    };
    if p_minus_one < -tolerance {
        return Err(Warning::new(format!(
            "{label} polynomial fails Jury's stability test: (-1)^{n} P(-1) = {p_minus_one:e} is negative"
        )));
    }

    if row[0].abs() > row[n] + tolerance {
        return Err(Warning::new(format!(
            "{label} polynomial fails Jury's stability test: |{label}[{n}]| = {} exceeds |{label}[0]| = {}",
            row[0].abs(),
            row[n]
        )));
    }

    // Jury table: each row shrinks by one until three elements remain
    let mut len = N;
    let mut step = 1;
    while len > 3 {
        let (first, last) = (row[0], row[len - 1]);
        let mut next = [0.0; N];
        for k in 0..len - 1 {
            next[k] = first * row[k] - last * row[len - 1 - k];
        }
        len -= 1;

        let row_tolerance = MARGIN * next[..len].iter().map(|c| c.abs()).sum::<f64>();
        if next[0].abs() + row_tolerance < next[len - 1].abs() {
            return Err(Warning::new(format!(
                "{label} polynomial fails Jury's stability test at table row {step}: |{}| < |{}|",
                next[0],
                next[len - 1]
            )));
        }

        row = next;
        step += 1;
    }

    Ok(())
}
