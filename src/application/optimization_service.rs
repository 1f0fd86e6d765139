// Application service: runs one optimization request end to end
//
// Received → Validating → (Unavailable) → Converting → Solving → Normalizing

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::domain::{
    models::{BackendResult, OptimizationProblem, Solution},
    objective::Objective,
    solver_service::{Result, SolverError, SolverService},
};
use crate::solver::SolverCapability;

/// A normalized solution and the backend that produced it
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub solution: Solution,
    pub method: String,
}

pub struct OptimizationService {
    capability: SolverCapability,
    workers: Arc<Semaphore>,
}

impl OptimizationService {
    /// `max_concurrent_solves` bounds how many solves occupy blocking threads at once
    pub fn new(capability: SolverCapability, max_concurrent_solves: usize) -> Self {
        Self {
            capability,
            workers: Arc::new(Semaphore::new(max_concurrent_solves.max(1))),
        }
    }

    pub fn capability(&self) -> &SolverCapability {
        &self.capability
    }

    /// Solve `problem` on a blocking worker.
    ///
    /// Refuses with [`SolverError::SolverNotAvailable`] before touching the
    /// problem when the preferred engine is missing.
    pub async fn solve(&self, problem: OptimizationProblem) -> Result<SolveOutcome> {
        let Some(solver) = self.capability.solver().cloned() else {
            return Err(SolverError::SolverNotAvailable(
                self.capability.engine().to_string(),
            ));
        };

        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| {
                SolverError::ExecutionFailed("solver worker pool is closed".to_string())
            })?;

        let method = solver.name().to_string();
        let solution = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_solve(solver.as_ref(), &problem)
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                SolverError::ExecutionFailed("solver panicked".to_string())
            } else {
                SolverError::ExecutionFailed(e.to_string())
            }
        })??;

        Ok(SolveOutcome { solution, method })
    }
}

/// Convert, solve and normalize; runs on the worker thread
fn run_solve(solver: &dyn SolverService, problem: &OptimizationProblem) -> Result<Solution> {
    let bounds = problem.variable_bounds()?;
    let objective = Objective::sum_of_squares(problem.objective_type);
    let minimized = |x: &[f64]| objective.minimized(x);

    let result = solver.minimize(
        &minimized,
        &problem.initial_guess,
        bounds.as_ref(),
        &problem.constraints,
        &problem.options,
    )?;

    Ok(Solution::normalize(BackendResult {
        fun: result.fun.map(|value| objective.restore(value)),
        ..result
    }))
}
