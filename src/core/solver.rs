use log::debug;
use serde::Serialize;

use super::engine::{ensure_amount, ensure_finite, ensure_rate};
use super::error::EngineError;

/// Bisection steps; fixed so results are reproducible bit for bit.
pub const SOLVER_ITERATIONS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalSolution {
    pub sustainable_withdrawal: f64,
    /// Unclamped balance left after `years` at the solved withdrawal.
    pub ending_balance: f64,
}

/// Largest constant withdrawal in `[0, principal]` that keeps the unclamped
/// balance positive through `years` years.
pub fn solve_sustainable_withdrawal(
    principal: f64,
    rate: f64,
    years: u32,
) -> Result<f64, EngineError> {
    ensure_amount("principal", principal)?;
    ensure_rate("rate", rate)?;
    if years == 0 {
        return Err(EngineError::InvalidArgument {
            name: "years",
            reason: "must be > 0",
        });
    }

    let mut lo = 0.0;
    let mut hi = principal;
    for _ in 0..SOLVER_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        if survives(principal, mid, rate, years) {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    debug!("sustainable withdrawal: principal={principal} rate={rate} years={years} -> {lo}");
    Ok(lo)
}

pub fn solve_withdrawal_plan(
    principal: f64,
    rate: f64,
    years: u32,
) -> Result<WithdrawalSolution, EngineError> {
    let sustainable_withdrawal = solve_sustainable_withdrawal(principal, rate, years)?;
    let ending_balance = unclamped_ending_balance(principal, sustainable_withdrawal, rate, years);
    ensure_finite(ending_balance, years as usize)?;
    Ok(WithdrawalSolution {
        sustainable_withdrawal,
        ending_balance,
    })
}

/// Runs the withdrawal recurrence without flooring at zero.
pub fn unclamped_ending_balance(principal: f64, withdrawal: f64, rate: f64, years: u32) -> f64 {
    let mut balance = principal;
    for _ in 0..years {
        balance = balance * (1.0 + rate) - withdrawal;
    }
    balance
}

fn survives(principal: f64, withdrawal: f64, rate: f64, years: u32) -> bool {
    let mut balance = principal;
    for _ in 0..years {
        balance = balance * (1.0 + rate) - withdrawal;
        if balance < 0.0 {
            break;
        }
    }
    balance > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn solved_withdrawal_exhausts_balance_at_horizon() {
        let withdrawal = solve_sustainable_withdrawal(1_000.0, 0.05, 10).expect("must solve");
        assert_close(unclamped_ending_balance(1_000.0, withdrawal, 0.05, 10), 0.0, 1e-6);

        let annuity = 1_000.0 * 0.05 / (1.0 - 1.05_f64.powi(-10));
        assert_close(withdrawal, annuity, 1e-6);
    }

    #[test]
    fn zero_rate_splits_balance_evenly() {
        let withdrawal = solve_sustainable_withdrawal(1_200.0, 0.0, 12).expect("must solve");
        assert_close(withdrawal, 100.0, 1e-9);
    }

    #[test]
    fn empty_balance_supports_no_withdrawal() {
        let withdrawal = solve_sustainable_withdrawal(0.0, 0.05, 30).expect("must solve");
        assert_eq!(withdrawal, 0.0);
    }

    #[test]
    fn single_year_with_growth_saturates_at_principal() {
        let withdrawal = solve_sustainable_withdrawal(500.0, 0.04, 1).expect("must solve");
        assert_close(withdrawal, 500.0, 1e-9);
        assert!(withdrawal <= 500.0);
    }

    #[test]
    fn zero_year_horizon_is_rejected() {
        let err = solve_sustainable_withdrawal(1_000.0, 0.05, 0).expect_err("no horizon");
        assert_eq!(
            err,
            EngineError::InvalidArgument {
                name: "years",
                reason: "must be > 0"
            }
        );
    }

    #[test]
    fn solver_is_deterministic() {
        let a = solve_sustainable_withdrawal(987_654.32, 0.037, 27).expect("must solve");
        let b = solve_sustainable_withdrawal(987_654.32, 0.037, 27).expect("must solve");
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn withdrawal_plan_reports_residual_balance() {
        let plan = solve_withdrawal_plan(250_000.0, 0.04, 25).expect("must solve");
        assert!(plan.sustainable_withdrawal > 0.0);
        assert_close(plan.ending_balance, 0.0, 1e-6);
    }

    #[test]
    fn withdrawal_plan_rejects_overflowing_residual() {
        // tripling each year outgrows any withdrawal up to the principal
        let err = solve_withdrawal_plan(1_000.0, 2.0, 2_000).expect_err("residual overflows");
        assert_eq!(err, EngineError::NonFiniteBalance { year: 2_000 });
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_longer_retirement_never_raises_withdrawal(
            principal in 1u32..5_000_000,
            rate_bp in 0i32..1_500,
            years in 1u32..60
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let shorter = solve_sustainable_withdrawal(principal, rate, years).unwrap();
            let longer = solve_sustainable_withdrawal(principal, rate, years + 1).unwrap();
            prop_assert!(longer <= shorter + 1e-9 * principal);
        }

        #[test]
        fn prop_solved_withdrawal_stays_within_principal(
            principal in 0u32..5_000_000,
            rate_bp in -2_000i32..2_000,
            years in 1u32..80
        ) {
            let principal = principal as f64;
            let withdrawal = solve_sustainable_withdrawal(principal, rate_bp as f64 / 10_000.0, years).unwrap();
            prop_assert!(withdrawal >= 0.0);
            prop_assert!(withdrawal <= principal);
        }
    }
}
