// Nelder-Mead Solver Adapter
// General-purpose fallback built on argmin's simplex method
// Bounds are enforced by projection, constraints by a quadratic penalty
//
// Selecting this backend leaves the engine unavailable, so HTTP solves are
// refused rather than served by it. It is reported in status and usable
// directly through `SolverService`.

use crate::domain::{
    models::{BackendResult, LinearConstraint, SolverOptions, VariableBounds},
    solver_service::{ObjectiveFn, Result, SolverError, SolverService},
};
use argmin::core::{
    CostFunction, Error as ArgminError, Executor, State, TerminationReason, TerminationStatus,
};
use argmin::solver::neldermead::NelderMead;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

const DEFAULT_PENALTY: f64 = 1e6;
const DEFAULT_SD_TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS_PER_VARIABLE: u64 = 200;
const FEASIBILITY_TOLERANCE: f64 = 1e-6;
/// A restart that moves the best point less than this (relative) ends the search
const RESTART_TOLERANCE: f64 = 1e-8;
const MAX_RESTARTS: usize = 10;

/// Relative and absolute steps used to build the starting simplex
const NONZERO_STEP: f64 = 0.1;
const ZERO_STEP: f64 = 0.00025;

pub struct NelderMeadSolver;

impl NelderMeadSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NelderMeadSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Objective seen by the simplex: evaluated at the projection onto the box,
/// plus a penalty for leaving the box or violating a constraint
#[derive(Clone, Copy)]
struct PenalizedCost<'a> {
    objective: ObjectiveFn<'a>,
    bounds: Option<&'a VariableBounds>,
    constraints: &'a [LinearConstraint],
    penalty: f64,
    evaluations: &'a AtomicU64,
}

impl PenalizedCost<'_> {
    fn project(&self, x: &[f64]) -> Vec<f64> {
        match self.bounds {
            Some(bounds) => bounds.clamp(x),
            None => x.to_vec(),
        }
    }

    fn constraint_violation(&self, x: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.violation(x).powi(2))
            .sum()
    }
}

impl CostFunction for PenalizedCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let point = self.project(p);
        let outside: f64 = p.iter().zip(&point).map(|(a, b)| (a - b).powi(2)).sum();
        let violation = self.constraint_violation(&point);

        Ok((self.objective)(&point) + self.penalty * (outside + violation))
    }
}

fn initial_simplex(x0: &[f64], bounds: Option<&VariableBounds>) -> Vec<Vec<f64>> {
    let start = match bounds {
        Some(bounds) => bounds.clamp(x0),
        None => x0.to_vec(),
    };

    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.clone());
    for i in 0..start.len() {
        let mut vertex = start.clone();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + NONZERO_STEP)
        } else {
            ZERO_STEP
        };
        simplex.push(vertex);
    }
    simplex
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(ai, bi)| (ai - bi).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn norm(x: &[f64]) -> f64 {
    x.iter().map(|xi| xi * xi).sum::<f64>().sqrt()
}

impl SolverService for NelderMeadSolver {
    fn minimize(
        &self,
        objective: ObjectiveFn<'_>,
        x0: &[f64],
        bounds: Option<&VariableBounds>,
        constraints: &[Value],
        options: &SolverOptions,
    ) -> Result<BackendResult> {
        // Validate first
        self.validate(x0, bounds)?;

        let num_vars = x0.len();
        let linear = LinearConstraint::decode_all(constraints, num_vars)?;

        let max_iters = options
            .positive_integer(&["maxiter", "maxfev"])?
            .map(|n| n as u64)
            .unwrap_or(MAX_ITERATIONS_PER_VARIABLE * num_vars as u64);
        let sd_tolerance = options.positive_real("tol")?.unwrap_or(DEFAULT_SD_TOLERANCE);
        let penalty = options.positive_real("penalty")?.unwrap_or(DEFAULT_PENALTY);

        let evaluations = AtomicU64::new(0);
        let cost = PenalizedCost {
            objective,
            bounds,
            constraints: &linear,
            penalty,
            evaluations: &evaluations,
        };

        // Equal costs at distinct vertices satisfy the spread test while the
        // simplex is still wide, so restart from the best point until it settles
        let start_time = Instant::now();
        let mut best = cost.project(x0);
        let mut iterations = 0u64;
        let mut settled = false;
        let mut status = String::from("NotTerminated");

        for _ in 0..=MAX_RESTARTS {
            let budget = max_iters.saturating_sub(iterations);
            if budget == 0 {
                break;
            }

            let solver = NelderMead::new(initial_simplex(&best, bounds))
                .with_sd_tolerance(sd_tolerance)
                .map_err(|e| SolverError::InvalidProblem(e.to_string()))?;
            let opt_result = Executor::new(cost, solver)
                .configure(|state| state.max_iters(budget))
                .run()
                .map_err(|e| SolverError::ExecutionFailed(e.to_string()))?;

            iterations += opt_result.state.get_iter();
            let termination = opt_result.state.get_termination_status();
            let converged = matches!(
                termination,
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            );
            status = format!("{:?}", termination);

            let Some(candidate) = opt_result.state.best_param.as_ref() else {
                settled = converged;
                break;
            };
            let candidate = cost.project(candidate);
            let moved = distance(&best, &candidate);
            let scale = 1.0 + norm(&candidate);
            best = candidate;

            if !converged || moved <= RESTART_TOLERANCE * scale {
                settled = converged;
                break;
            }
        }

        debug!(
            iterations,
            evaluations = evaluations.load(Ordering::Relaxed),
            elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            settled,
            "Nelder-Mead finished with {}",
            status
        );

        let violation: f64 = linear.iter().map(|c| c.violation(&best)).sum();
        let feasible = violation <= FEASIBILITY_TOLERANCE;

        let message = if feasible {
            status
        } else {
            format!("{} (constraints violated by {:e})", status, violation)
        };

        Ok(BackendResult {
            fun: Some(objective(&best)),
            x: Some(best),
            success: Some(settled && feasible),
            message: Some(message),
            nit: Some(iterations),
            nfev: Some(evaluations.load(Ordering::Relaxed)),
        })
    }

    fn name(&self) -> &str {
        "Nelder-Mead (fallback)"
    }
}
