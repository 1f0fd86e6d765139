use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::ApiError;
use super::extract::ApiJson;
use super::mappers::{
    self, EngineStatus, HealthReport, LegacyOptimizationReport, SolveRequest, SolveResponse,
};
use super::optimization_service::OptimizationService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    service: Arc<OptimizationService>,
}

impl AppState {
    pub fn new(service: OptimizationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> &OptimizationService {
        &self.service
    }
}

/// Routes of the optimization API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ai/optimization", get(legacy_optimization))
        .route("/ai/optimization/solve", post(solve_optimization))
        .route("/ai/optimization/status", get(optimization_status))
        .with_state(state)
}

async fn solve_optimization(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SolveRequest>,
) -> Result<Json<SolveResponse>, ApiError> {
    let problem = mappers::request_to_domain_problem(request)?;

    info!(
        objective = %problem.objective_type,
        variables = problem.num_variables(),
        bounded = problem.bounds.is_some(),
        constraints = problem.constraints.len(),
        "📊 Solving optimization problem"
    );

    let outcome = state.service().solve(problem).await.map_err(|e| {
        warn!(error = %e, "Optimization request failed");
        ApiError::from(e)
    })?;

    info!(
        method = %outcome.method,
        success = outcome.solution.success,
        iterations = outcome.solution.iterations,
        evaluations = outcome.solution.function_evaluations,
        "✓ {}",
        outcome.solution.message
    );

    Ok(Json(mappers::outcome_to_response(outcome)))
}

async fn optimization_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(mappers::capability_to_status(state.service().capability()))
}

async fn legacy_optimization(State(state): State<AppState>) -> Json<LegacyOptimizationReport> {
    Json(mappers::legacy_report(state.service().capability()))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(mappers::health_report(state.service().capability()))
}
