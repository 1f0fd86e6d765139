// Mappers: Convert between HTTP JSON bodies and domain models
// Wire names live here so the domain stays free of them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::ApiError;
use super::optimization_service::SolveOutcome;
use crate::domain::{
    models::{OptimizationProblem, Solution, SolverOptions},
    value_objects::OptimizationType,
};
use crate::solver::SolverCapability;

/// Body of `POST /ai/optimization/solve`
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub objective_type: OptimizationType,
    pub initial_guess: Vec<f64>,
    #[serde(default)]
    pub bounds: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub constraints: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct OptimizationResultBody {
    pub optimal_point: Option<Vec<f64>>,
    pub optimal_value: Option<f64>,
    pub success: bool,
    pub message: String,
    pub iterations: Option<u64>,
    pub function_evaluations: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SolveResponse {
    pub status: &'static str,
    pub result: OptimizationResultBody,
    pub method: String,
    pub timestamp: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EngineStatus {
    pub cobyqa_available: bool,
    pub engine: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    pub action: &'static str,
    pub impact: &'static str,
    pub priority: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LegacyOptimizationReport {
    pub optimizations: Vec<Recommendation>,
    pub overall_score: u32,
    pub optimization_engine: String,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: f64,
    pub engine: String,
}

/// Convert a request body to a domain problem, rejecting an empty guess
pub fn request_to_domain_problem(
    request: SolveRequest,
) -> std::result::Result<OptimizationProblem, ApiError> {
    if request.initial_guess.is_empty() {
        return Err(ApiError::validation(
            "initial_guess must contain at least one value",
        ));
    }

    let constraints = request
        .constraints
        .unwrap_or_default()
        .into_iter()
        .map(Value::Object)
        .collect();
    let options = SolverOptions::new(request.options.unwrap_or_default());

    let mut problem = OptimizationProblem::new(request.objective_type, request.initial_guess)
        .with_constraints(constraints)
        .with_options(options);
    problem.bounds = request.bounds;

    Ok(problem)
}

pub fn domain_to_result_body(solution: Solution) -> OptimizationResultBody {
    OptimizationResultBody {
        optimal_point: solution.optimal_point,
        optimal_value: solution.optimal_value,
        success: solution.success,
        message: solution.message,
        iterations: solution.iterations,
        function_evaluations: solution.function_evaluations,
    }
}

pub fn outcome_to_response(outcome: SolveOutcome) -> SolveResponse {
    SolveResponse {
        status: "success",
        result: domain_to_result_body(outcome.solution),
        method: outcome.method,
        timestamp: unix_timestamp(),
    }
}

pub fn capability_to_status(capability: &SolverCapability) -> EngineStatus {
    EngineStatus {
        cobyqa_available: capability.is_available(),
        engine: capability.engine().to_string(),
        status: if capability.is_available() {
            "ready"
        } else {
            "limited"
        },
    }
}

pub fn legacy_report(capability: &SolverCapability) -> LegacyOptimizationReport {
    LegacyOptimizationReport {
        optimizations: vec![
            Recommendation {
                action: "Optimize database queries",
                impact: "15%",
                priority: "high",
            },
            Recommendation {
                action: "Enable caching",
                impact: "20%",
                priority: "medium",
            },
        ],
        overall_score: 89,
        optimization_engine: capability.engine().to_string(),
    }
}

pub fn health_report(capability: &SolverCapability) -> HealthReport {
    HealthReport {
        status: "healthy",
        timestamp: unix_timestamp(),
        engine: capability.engine().to_string(),
    }
}

/// Seconds since the Unix epoch
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> SolveRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn defaults_optional_fields() {
        let problem = request_to_domain_problem(parse(json!({
            "objective_type": "minimize",
            "initial_guess": [1.0, 1.0]
        })))
        .unwrap();

        assert_eq!(problem.num_variables(), 2);
        assert!(problem.bounds.is_none());
        assert!(problem.constraints.is_empty());
        assert!(problem.options.is_empty());
    }

    #[test]
    fn null_optionals_mean_absent() {
        let problem = request_to_domain_problem(parse(json!({
            "objective_type": "maximize",
            "initial_guess": [1.0],
            "bounds": null,
            "constraints": null,
            "options": null
        })))
        .unwrap();

        assert_eq!(problem.objective_type, OptimizationType::Maximize);
        assert!(problem.bounds.is_none());
        assert!(problem.constraints.is_empty());
    }

    #[test]
    fn forwards_constraints_and_options_verbatim() {
        let problem = request_to_domain_problem(parse(json!({
            "objective_type": "minimize",
            "initial_guess": [1.0],
            "bounds": [[0.0, 10.0], [0.0, 10.0]],
            "constraints": [{"type": "anything", "extra": [1, 2]}],
            "options": {"maxiter": 10, "unknown": true}
        })))
        .unwrap();

        // Bounds are not checked here; the mismatch is found at solve time
        assert_eq!(problem.bounds.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            problem.constraints,
            vec![json!({"type": "anything", "extra": [1, 2]})]
        );
        assert_eq!(problem.options.as_map().get("unknown"), Some(&json!(true)));
    }

    #[test]
    fn rejects_empty_initial_guess() {
        let err = request_to_domain_problem(parse(json!({
            "objective_type": "minimize",
            "initial_guess": []
        })))
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn rejects_non_object_constraints() {
        let parsed = serde_json::from_value::<SolveRequest>(json!({
            "objective_type": "minimize",
            "initial_guess": [1.0],
            "constraints": [1, 2]
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn result_body_serializes_missing_fields_as_null() {
        let body = domain_to_result_body(Solution::normalize(Default::default()));
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "optimal_point": null,
                "optimal_value": null,
                "success": false,
                "message": "Optimization completed",
                "iterations": null,
                "function_evaluations": null
            })
        );
    }

    #[test]
    fn status_reflects_capability() {
        assert_eq!(
            capability_to_status(&SolverCapability::none()),
            EngineStatus {
                cobyqa_available: false,
                engine: "none".to_string(),
                status: "limited",
            }
        );
    }
}
