mod engine;
mod error;
mod solver;
mod types;

pub use engine::{
    run_depletion, run_depletion_with_limits, run_fixed_accumulation, run_variable_accumulation,
};
pub use error::EngineError;
pub use solver::{
    SOLVER_ITERATIONS, WithdrawalSolution, solve_sustainable_withdrawal, solve_withdrawal_plan,
    unclamped_ending_balance,
};
pub use types::{AccumulationResult, DEFAULT_MAX_DEPLETION_YEARS, DepletionLimits, DepletionResult};
