// COBYLA Solver Adapter
// Implements the SolverService interface for the cobyla crate
// Translates bounds and linear constraints into COBYLA's `g(x) >= 0` form

use crate::domain::{
    models::{BackendResult, Inequality, LinearConstraint, SolverOptions, VariableBounds},
    solver_service::{ObjectiveFn, Result, SolverError, SolverService},
};
use cobyla::{minimize, FailStatus, Func, RhoBeg, StopTols, SuccessStatus};
use serde_json::Value;
use std::cell::Cell;
use std::time::Instant;
use tracing::debug;

const DEFAULT_MAX_EVALUATIONS: usize = 2000;
const DEFAULT_RHOBEG: f64 = 0.5;
const DEFAULT_TOLERANCE: f64 = 1e-10;
/// Half-width of the search box around `x0` for a variable without bounds
const FREE_HALF_WIDTH: f64 = 1e6;

pub struct CobylaSolver;

impl CobylaSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CobylaSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CobylaSolver {
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

        let max_evaluations = options
            .positive_integer(&["maxfev", "maxiter"])?
            .unwrap_or(DEFAULT_MAX_EVALUATIONS);
        let rhobeg = options.positive_real("rhobeg")?.unwrap_or(DEFAULT_RHOBEG);
        // Zero tolerances only ever stop on roundoff, so always set them
        let tol = options.positive_real("tol")?.unwrap_or(DEFAULT_TOLERANCE);
        let stop_tol = StopTols {
            ftol_rel: tol,
            xtol_rel: tol,
            ..StopTols::default()
        };

        let box_bounds = search_box(x0, bounds);

        let inequalities: Vec<Inequality> = linear
            .iter()
            .flat_map(LinearConstraint::inequalities)
            .collect();
        let cons_fns: Vec<_> = inequalities
            .iter()
            .map(|ineq| move |x: &[f64], _: &mut ()| ineq.value(x))
            .collect();
        let cons: Vec<&dyn Func<()>> = cons_fns.iter().map(|c| c as &dyn Func<()>).collect();

        let evaluations = Cell::new(0u64);
        let func = |x: &[f64], _: &mut ()| {
            evaluations.set(evaluations.get() + 1);
            objective(x)
        };

        let start_time = Instant::now();
        let outcome = minimize(
            func,
            x0,
            &box_bounds,
            &cons,
            (),
            max_evaluations,
            RhoBeg::All(rhobeg),
            Some(stop_tol),
        );
        debug!(
            evaluations = evaluations.get(),
            constraints = inequalities.len(),
            elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "COBYLA finished"
        );

        let nfev = evaluations.get();
        // Bounds enter COBYLA as constraints, so snap the iterate back into the box
        let finish = |x: Vec<f64>, fun: f64| match bounds {
            Some(bounds) if !bounds.contains(&x) => {
                let clamped = bounds.clamp(&x);
                let value = objective(&clamped);
                (clamped, value)
            }
            _ => (x, fun),
        };

        match outcome {
            Ok((status, x, fun)) => {
                let (x, fun) = finish(x, fun);
                Ok(BackendResult {
                    x: Some(x),
                    fun: Some(fun),
                    success: Some(converged(&status)),
                    message: Some(format!("{:?}", status)),
                    nit: None,
                    nfev: Some(nfev),
                })
            }
            // Rounding errors stop the run but the last iterate is still usable
            Err((status @ FailStatus::RoundoffLimited, x, fun)) => {
                let (x, fun) = finish(x, fun);
                Ok(BackendResult {
                    x: Some(x),
                    fun: Some(fun),
                    success: Some(false),
                    message: Some(format!("{:?}", status)),
                    nit: None,
                    nfev: Some(nfev),
                })
            }
            Err((status, _, _)) => Err(SolverError::ExecutionFailed(format!(
                "COBYLA stopped with status {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "COBYLA"
    }
}

/// One finite `(lower, upper)` pair per variable.
///
/// COBYLA never returns when infinite bounds meet linear constraints, so a
/// free variable is confined to a wide box centred on its starting value.
fn search_box(x0: &[f64], bounds: Option<&VariableBounds>) -> Vec<(f64, f64)> {
    let free = |xi: f64| (xi - FREE_HALF_WIDTH, xi + FREE_HALF_WIDTH);
    match bounds {
        Some(bounds) => bounds
            .pairs()
            .into_iter()
            .zip(x0)
            .map(|((lo, hi), &xi)| {
                let (free_lo, free_hi) = free(xi);
                (
                    if lo.is_finite() { lo } else { free_lo.min(hi) },
                    if hi.is_finite() { hi } else { free_hi.max(lo) },
                )
            })
            .collect(),
        None => x0.iter().map(|&xi| free(xi)).collect(),
    }
}

fn converged(status: &SuccessStatus) -> bool {
    !matches!(
        status,
        SuccessStatus::MaxEvalReached | SuccessStatus::MaxTimeReached
    )
}
