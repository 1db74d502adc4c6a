//! Return compounding and resampling across time horizons.
//!
//! resample(r, n, m) = (1 + r)^(n/m) - 1
//! converts a return observed over m periods into the equivalent return
//! over n periods. Annualization uses 250 trading days.

use super::error::PairtraderError;

pub const TRADING_DAYS_PER_YEAR: f64 = 250.0;

/// Convert a return observed over `m` periods into the equivalent return
/// over `n` periods.
///
/// Fails when `returns <= -1` and `n/m` is not an integer: the real-valued
/// power is undefined there and must not silently produce NaN.
pub fn resample(returns: f64, n: f64, m: f64) -> Result<f64, PairtraderError> {
    let exponent = n / m;
    if returns <= -1.0 && exponent.fract() != 0.0 {
        return Err(PairtraderError::Domain { returns, n, m });
    }
    Ok((1.0 + returns).powf(exponent) - 1.0)
}

/// Annualize a total return observed over `days` trading days.
pub fn annualize(total: f64, days: usize) -> Result<f64, PairtraderError> {
    resample(total, TRADING_DAYS_PER_YEAR, days as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn identity_horizon() {
        let r = resample(0.05, 1.0, 1.0).unwrap();
        assert_relative_eq!(r, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn daily_to_weekly() {
        // (1.01)^5 - 1
        let r = resample(0.01, 5.0, 1.0).unwrap();
        assert_relative_eq!(r, 1.01_f64.powi(5) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn weekly_to_daily() {
        let weekly = 1.01_f64.powi(5) - 1.0;
        let r = resample(weekly, 1.0, 5.0).unwrap();
        assert_relative_eq!(r, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn annualize_flat_run() {
        let r = annualize(0.0, 100).unwrap();
        assert_relative_eq!(r, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn annualize_compounds_up_short_runs() {
        // 10% over 125 days annualizes to (1.1)^2 - 1
        let r = annualize(0.10, 125).unwrap();
        assert_relative_eq!(r, 1.1_f64.powi(2) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn total_loss_with_integer_horizon_is_defined() {
        let r = resample(-1.0, 2.0, 1.0).unwrap();
        assert_relative_eq!(r, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn sub_unity_base_with_fractional_exponent_is_domain_error() {
        let err = resample(-1.5, 1.0, 5.0).unwrap_err();
        assert!(matches!(err, PairtraderError::Domain { .. }));
    }

    proptest! {
        #[test]
        fn round_trip(r in -0.5f64..2.0, n in 1u32..10, m in 1u32..10) {
            let forward = resample(r, n as f64, m as f64).unwrap();
            let back = resample(forward, m as f64, n as f64).unwrap();
            prop_assert!((back - r).abs() < 1e-9);
        }
    }
}
