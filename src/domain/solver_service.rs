// Domain service interface for minimizing an objective
// Every backend implements the same calling convention

use serde_json::Value;

use super::models::{BackendResult, SolverOptions, VariableBounds};

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Objective as seen by a backend: a scalar function to minimize
pub type ObjectiveFn<'a> = &'a (dyn Fn(&[f64]) -> f64 + Sync);

/// Uniform `minimize` contract shared by every optimization backend
///
/// Constraints and options arrive exactly as the client sent them. Each
/// backend decides what it understands and rejects the rest.
pub trait SolverService: Send + Sync {
    /// Minimize `objective` starting from `x0`
    fn minimize(
        &self,
        objective: ObjectiveFn<'_>,
        x0: &[f64],
        bounds: Option<&VariableBounds>,
        constraints: &[Value],
        options: &SolverOptions,
    ) -> Result<BackendResult>;

    /// Check that the starting point and bounds describe the same problem
    fn validate(&self, x0: &[f64], bounds: Option<&VariableBounds>) -> Result<()> {
        if x0.is_empty() {
            return Err(SolverError::InvalidProblem(
                "Initial guess must have at least one value".to_string(),
            ));
        }

        if let Some(bounds) = bounds {
            if bounds.dimension() != x0.len() {
                return Err(SolverError::InvalidProblem(format!(
                    "Bounds cover {} variables but initial guess has {}",
                    bounds.dimension(),
                    x0.len()
                )));
            }
        }

        Ok(())
    }

    /// Label reported as the `method` that ran
    fn name(&self) -> &str;
}
