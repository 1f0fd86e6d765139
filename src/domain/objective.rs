// Built-in objective function
//
// Only the sum of squares is optimizable. Requests carry no objective
// expression, so there is nothing else to evaluate.

use super::value_objects::OptimizationType;

/// The sum of squares `∑ xᵢ²`, oriented for a minimizing backend
#[derive(Debug, Clone, Copy)]
pub struct Objective {
    sense: OptimizationType,
}

impl Objective {
    pub fn sum_of_squares(sense: OptimizationType) -> Self {
        Self { sense }
    }

    pub fn sense(&self) -> OptimizationType {
        self.sense
    }

    /// Value handed to the backend. Maximization minimizes the negation.
    pub fn minimized(&self, x: &[f64]) -> f64 {
        let value = x.iter().map(|xi| xi * xi).sum::<f64>();
        match self.sense {
            OptimizationType::Minimize => value,
            OptimizationType::Maximize => -value,
        }
    }

    /// Map a backend-minimized value back to the objective's own sign
    pub fn restore(&self, minimized: f64) -> f64 {
        match self.sense {
            OptimizationType::Minimize => minimized,
            OptimizationType::Maximize => -minimized,
        }
    }
}
