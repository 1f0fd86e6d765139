// Domain layer: Business logic and rules
pub mod domain;

// Application layer: Use cases, HTTP handlers and wire mapping
pub mod application;

// Infrastructure layer: External concerns (configuration, logging, server)
pub mod infrastructure;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    BackendResult, ConstraintType, LinearConstraint, Objective, ObjectiveFn, OptimizationProblem,
    OptimizationType, Solution, SolverBackend, SolverError, SolverOptions, SolverService,
    VariableBounds,
};

pub use application::{router, ApiError, AppState, OptimizationService, SolveOutcome};

pub use infrastructure::{init_tracing, start_server, ConfigError, ServerConfig};

pub use solver::{SolverCapability, SolverFactory};

#[cfg(feature = "cobyla")]
pub use solver::CobylaSolver;

#[cfg(feature = "argmin")]
pub use solver::NelderMeadSolver;
