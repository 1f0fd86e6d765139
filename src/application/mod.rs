// Application layer: Use cases, HTTP handlers and wire mapping

pub mod error;
pub mod extract;
pub mod http_service;
pub mod mappers;
pub mod optimization_service;

pub use error::ApiError;
pub use http_service::{router, AppState};
pub use optimization_service::{OptimizationService, SolveOutcome};
