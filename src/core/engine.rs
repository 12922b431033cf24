use log::{debug, warn};

use super::error::EngineError;
use super::types::{AccumulationResult, DepletionLimits, DepletionResult};

pub fn run_fixed_accumulation(
    principal: f64,
    rate: f64,
    years: u32,
    contribution: f64,
) -> Result<AccumulationResult, EngineError> {
    ensure_amount("principal", principal)?;
    ensure_rate("rate", rate)?;
    ensure_amount("contribution", contribution)?;

    let result = accumulate(principal, (0..years).map(|_| rate), contribution)?;
    debug!(
        "fixed accumulation: principal={principal} rate={rate} years={years} contribution={contribution} -> {}",
        result.final_balance
    );
    Ok(result)
}

/// Same recurrence as [`run_fixed_accumulation`], one rate per year; the
/// year count is the length of `rates`.
pub fn run_variable_accumulation(
    principal: f64,
    rates: &[f64],
    contribution: f64,
) -> Result<AccumulationResult, EngineError> {
    ensure_amount("principal", principal)?;
    for &rate in rates {
        ensure_rate("rates", rate)?;
    }
    ensure_amount("contribution", contribution)?;

    let result = accumulate(principal, rates.iter().copied(), contribution)?;
    debug!(
        "variable accumulation: principal={principal} years={} contribution={contribution} -> {}",
        rates.len(),
        result.final_balance
    );
    Ok(result)
}

pub fn run_depletion(
    principal: f64,
    withdrawal: f64,
    rate: f64,
    years: Option<u32>,
) -> Result<DepletionResult, EngineError> {
    run_depletion_with_limits(principal, withdrawal, rate, years, DepletionLimits::default())
}

/// With `years` set, runs exactly that many clamped years and keeps appending
/// zeros once the balance is gone. Without it, runs while the balance is
/// positive, up to `limits.max_years`.
pub fn run_depletion_with_limits(
    principal: f64,
    withdrawal: f64,
    rate: f64,
    years: Option<u32>,
    limits: DepletionLimits,
) -> Result<DepletionResult, EngineError> {
    ensure_amount("principal", principal)?;
    ensure_amount("withdrawal", withdrawal)?;
    ensure_rate("rate", rate)?;

    let mut balance = principal;
    let trajectory = match years {
        Some(years) => {
            let mut trajectory = Vec::with_capacity(years as usize);
            for _ in 0..years {
                balance = depletion_step(balance, withdrawal, rate);
                trajectory.push(balance);
                ensure_finite(balance, trajectory.len())?;
            }
            trajectory
        }
        None => {
            let mut trajectory = Vec::new();
            while balance > 0.0 {
                if trajectory.len() >= limits.max_years as usize {
                    warn!(
                        "depletion did not finish within {} years (principal={principal} withdrawal={withdrawal} rate={rate})",
                        limits.max_years
                    );
                    return Err(EngineError::MaxIterationsExceeded {
                        limit: limits.max_years,
                    });
                }
                balance = depletion_step(balance, withdrawal, rate);
                trajectory.push(balance);
                ensure_finite(balance, trajectory.len())?;
            }
            trajectory
        }
    };

    let years_run = trajectory.len() as u32;
    debug!(
        "depletion: principal={principal} withdrawal={withdrawal} rate={rate} requested={years:?} -> {years_run} years"
    );
    Ok(DepletionResult {
        years: years_run,
        trajectory,
    })
}

fn accumulate(
    principal: f64,
    rates: impl Iterator<Item = f64>,
    contribution: f64,
) -> Result<AccumulationResult, EngineError> {
    let mut balance = principal;
    let mut trajectory = Vec::with_capacity(rates.size_hint().0);
    for rate in rates {
        balance = balance * (1.0 + rate) + contribution;
        trajectory.push(balance);
        ensure_finite(balance, trajectory.len())?;
    }
    Ok(AccumulationResult {
        final_balance: balance,
        trajectory,
    })
}

fn depletion_step(balance: f64, withdrawal: f64, rate: f64) -> f64 {
    (balance * (1.0 + rate) - withdrawal).max(0.0)
}

pub(super) fn ensure_finite(balance: f64, year: usize) -> Result<(), EngineError> {
    if balance.is_finite() {
        return Ok(());
    }
    let year = u32::try_from(year).unwrap_or(u32::MAX);
    warn!("balance overflowed in year {year}");
    Err(EngineError::NonFiniteBalance { year })
}

pub(super) fn ensure_amount(name: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::InvalidArgument {
            name,
            reason: "must be finite",
        });
    }
    if value < 0.0 {
        return Err(EngineError::InvalidArgument {
            name,
            reason: "must be >= 0",
        });
    }
    Ok(())
}

pub(super) fn ensure_rate(name: &'static str, rate: f64) -> Result<(), EngineError> {
    if !rate.is_finite() {
        return Err(EngineError::InvalidArgument {
            name,
            reason: "must be finite",
        });
    }
    if rate < -1.0 {
        return Err(EngineError::InvalidArgument {
            name,
            reason: "must be >= -1",
        });
    }
    Ok(())
}
