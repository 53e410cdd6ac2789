// Local weight-sum check for siblings under one parent

use serde::Serialize;

/// Weights are compared to their expected total within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightCheck {
    pub total: f64,
    pub expected: f64,
}

impl WeightCheck {
    pub fn is_valid(&self) -> bool {
        (self.total - self.expected).abs() <= WEIGHT_TOLERANCE
    }

    /// Positive when weights are missing, negative when over-allocated.
    pub fn remaining(&self) -> f64 {
        self.expected - self.total
    }
}

pub fn check_sum<I>(weights: I, expected: f64) -> WeightCheck
where
    I: IntoIterator<Item = f64>,
{
    WeightCheck {
        total: weights.into_iter().sum(),
        expected,
    }
}
