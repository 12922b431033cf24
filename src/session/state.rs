use crate::core::{AccumulationResult, DepletionResult};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DepletionView {
    Custom,
    Optimal,
}

impl DepletionView {
    pub fn title(self) -> &'static str {
        match self {
            DepletionView::Custom => "Custom Withdrawal Depletion",
            DepletionView::Optimal => "Optimal Withdrawal Depletion",
        }
    }
}

/// Histories kept between menu selections. Owned by the interactive loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    accumulation: Vec<f64>,
    custom_depletion: Option<Vec<f64>>,
    optimal_depletion: Option<Vec<f64>>,
}

impl SessionState {
    pub fn accumulation(&self) -> &[f64] {
        &self.accumulation
    }

    /// Balance at retirement: the last year of the latest accumulation run.
    pub fn retirement_balance(&self) -> Option<f64> {
        self.accumulation.last().copied()
    }

    pub fn record_accumulation(&mut self, result: AccumulationResult) {
        self.accumulation = result.trajectory;
    }

    pub fn record_depletion(&mut self, view: DepletionView, result: DepletionResult) {
        let slot = match view {
            DepletionView::Custom => &mut self.custom_depletion,
            DepletionView::Optimal => &mut self.optimal_depletion,
        };
        *slot = Some(result.trajectory);
    }

    pub fn depletion(&self, view: DepletionView) -> Option<&[f64]> {
        match view {
            DepletionView::Custom => self.custom_depletion.as_deref(),
            DepletionView::Optimal => self.optimal_depletion.as_deref(),
        }
    }

    pub fn available_views(&self) -> Vec<DepletionView> {
        [DepletionView::Custom, DepletionView::Optimal]
            .into_iter()
            .filter(|&view| self.depletion(view).is_some())
            .collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
