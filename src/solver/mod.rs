// Solver adapters module

#[cfg(feature = "cobyla")]
pub mod cobyla_solver;
pub mod factory;
#[cfg(feature = "argmin")]
pub mod nelder_mead_solver;

#[cfg(feature = "cobyla")]
pub use cobyla_solver::CobylaSolver;
pub use factory::{SolverCapability, SolverFactory};
#[cfg(feature = "argmin")]
pub use nelder_mead_solver::NelderMeadSolver;
