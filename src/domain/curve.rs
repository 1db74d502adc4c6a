//! Fair-value curve model.
//!
//! Fits a low-degree polynomial relating one asset's periodic return to the
//! other's by ordinary least squares on the 2x2 normal equations:
//!   degree 1: y = a*x + b
//!   degree 2: y = a*x^2 + b*x
//! The fit runs once per backtest on historical paired returns and is
//! immutable afterwards.

use super::error::PairtraderError;

pub const MIN_FIT_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Linear,
    Quadratic,
}

impl Degree {
    pub fn from_int(value: i64) -> Option<Degree> {
        match value {
            1 => Some(Degree::Linear),
            2 => Some(Degree::Quadratic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit {
    pub degree: Degree,
    pub a: f64,
    pub b: f64,
}

impl CurveFit {
    /// Least-squares fit of paired samples.
    ///
    /// Pairs are sorted by the independent variable before fitting, matching
    /// the upstream data preparation; the fit itself is order-independent.
    pub fn fit(x: &[f64], y: &[f64], degree: Degree) -> Result<CurveFit, PairtraderError> {
        let have = x.len().min(y.len());
        if x.len() != y.len() || have < MIN_FIT_SAMPLES {
            return Err(PairtraderError::InsufficientData {
                have,
                need: MIN_FIT_SAMPLES,
            });
        }

        let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
        pairs.sort_by(|p, q| p.0.total_cmp(&q.0));

        let (a, b) = match degree {
            Degree::Linear => solve_linear(&pairs)?,
            Degree::Quadratic => solve_quadratic(&pairs)?,
        };

        Ok(CurveFit { degree, a, b })
    }

    pub fn predict(&self, x: f64) -> f64 {
        match self.degree {
            Degree::Linear => self.a * x + self.b,
            Degree::Quadratic => self.a * x * x + self.b * x,
        }
    }
}

/// Normal equations for y = a*x + b:
///   a*sum(x^2) + b*sum(x) = sum(x*y)
///   a*sum(x)   + b*n      = sum(y)
fn solve_linear(pairs: &[(f64, f64)]) -> Result<(f64, f64), PairtraderError> {
    let n = pairs.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_xy = 0.0;
    for &(x, y) in pairs {
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }
    solve_2x2(sum_xx, sum_x, sum_x, n, sum_xy, sum_y)
}

/// Normal equations for y = a*x^2 + b*x (no constant term):
///   a*sum(x^4) + b*sum(x^3) = sum(x^2*y)
///   a*sum(x^3) + b*sum(x^2) = sum(x*y)
fn solve_quadratic(pairs: &[(f64, f64)]) -> Result<(f64, f64), PairtraderError> {
    let mut sum_x2 = 0.0;
    let mut sum_x3 = 0.0;
    let mut sum_x4 = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2y = 0.0;
    for &(x, y) in pairs {
        let x2 = x * x;
        sum_x2 += x2;
        sum_x3 += x2 * x;
        sum_x4 += x2 * x2;
        sum_xy += x * y;
        sum_x2y += x2 * y;
    }
    solve_2x2(sum_x4, sum_x3, sum_x3, sum_x2, sum_x2y, sum_xy)
}

/// Cramer's rule on [[m11, m12], [m21, m22]] * [a, b] = [r1, r2].
fn solve_2x2(
    m11: f64,
    m12: f64,
    m21: f64,
    m22: f64,
    r1: f64,
    r2: f64,
) -> Result<(f64, f64), PairtraderError> {
    let det = m11 * m22 - m12 * m21;
    let scale = m11.abs().max(m22.abs()).max(1.0);
    if det.abs() <= f64::EPSILON * scale {
        return Err(PairtraderError::SingularFit);
    }
    let a = (r1 * m22 - m12 * r2) / det;
    let b = (m11 * r2 - r1 * m21) / det;
    Ok((a, b))
}
