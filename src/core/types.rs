use serde::Serialize;

pub const DEFAULT_MAX_DEPLETION_YEARS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationResult {
    pub final_balance: f64,
    pub trajectory: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionResult {
    pub years: u32,
    pub trajectory: Vec<f64>,
}

impl DepletionResult {
    pub fn ending_balance(&self) -> Option<f64> {
        self.trajectory.last().copied()
    }
}

/// Guard for run-to-depletion mode, which otherwise never stops when growth
/// covers the withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepletionLimits {
    pub max_years: u32,
}

impl Default for DepletionLimits {
    fn default() -> Self {
        Self {
            max_years: DEFAULT_MAX_DEPLETION_YEARS,
        }
    }
}
