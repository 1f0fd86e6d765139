// Domain module: Business logic and models

pub mod models;
pub mod objective;
pub mod solver_service;
pub mod value_objects;

pub use models::*;
pub use objective::*;
pub use solver_service::*;
pub use value_objects::*;
