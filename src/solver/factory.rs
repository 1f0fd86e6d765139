use crate::domain::{solver_service::SolverService, value_objects::SolverBackend};
use std::sync::Arc;

#[cfg(feature = "cobyla")]
use crate::solver::CobylaSolver;
#[cfg(feature = "argmin")]
use crate::solver::NelderMeadSolver;

/// Engine chosen at startup, read-only for the life of the process
#[derive(Clone)]
pub struct SolverCapability {
    backend: Option<Arc<dyn SolverService>>,
    available: bool,
}

impl SolverCapability {
    /// The preferred engine loaded; solves may run
    pub fn preferred(backend: Arc<dyn SolverService>) -> Self {
        Self {
            backend: Some(backend),
            available: true,
        }
    }

    /// Only the fallback loaded; solves are refused
    pub fn fallback(backend: Arc<dyn SolverService>) -> Self {
        Self {
            backend: Some(backend),
            available: false,
        }
    }

    /// No engine at all
    pub fn none() -> Self {
        Self {
            backend: None,
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// The backend behind the capability, only when it may be used
    pub fn solver(&self) -> Option<&Arc<dyn SolverService>> {
        self.backend.as_ref().filter(|_| self.available)
    }

    /// Label of whichever engine is loaded
    pub fn engine(&self) -> &str {
        self.backend.as_ref().map_or("none", |backend| backend.name())
    }
}

impl std::fmt::Debug for SolverCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverCapability")
            .field("engine", &self.engine())
            .field("available", &self.available)
            .finish()
    }
}

/// Factory for creating solver instances based on the compiled-in backends
pub struct SolverFactory;

impl SolverFactory {
    /// Pick the preferred backend if it is compiled in, else the fallback
    pub fn detect() -> SolverCapability {
        let capability = [SolverBackend::Cobyla, SolverBackend::NelderMead]
            .into_iter()
            .find_map(|backend| {
                Self::create_from_backend(backend).map(|solver| {
                    if backend.is_preferred() {
                        SolverCapability::preferred(solver)
                    } else {
                        SolverCapability::fallback(solver)
                    }
                })
            })
            .unwrap_or_else(SolverCapability::none);

        if capability.is_available() {
            tracing::info!(engine = capability.engine(), "Optimization engine loaded");
        } else {
            tracing::warn!(
                engine = capability.engine(),
                "Preferred optimization engine missing; solves are disabled"
            );
        }

        capability
    }

    /// Create a solver for a specific backend, if it was compiled in
    pub fn create_from_backend(backend: SolverBackend) -> Option<Arc<dyn SolverService>> {
        match backend {
            #[cfg(feature = "cobyla")]
            SolverBackend::Cobyla => Some(Arc::new(CobylaSolver::new())),
            #[cfg(feature = "argmin")]
            SolverBackend::NelderMead => Some(Arc::new(NelderMeadSolver::new())),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_is_stable_across_reads() {
        let capability = SolverFactory::detect();
        let first = capability.is_available();
        for _ in 0..100 {
            assert_eq!(capability.is_available(), first);
        }
        assert_eq!(capability.clone().is_available(), first);
    }

    #[cfg(feature = "cobyla")]
    #[test]
    fn prefers_cobyla_when_compiled_in() {
        let capability = SolverFactory::detect();
        assert!(capability.is_available());
        assert_eq!(capability.engine(), "COBYLA");
        assert!(capability.solver().is_some());
    }

    #[cfg(all(feature = "argmin", not(feature = "cobyla")))]
    #[test]
    fn degrades_to_fallback_without_cobyla() {
        let capability = SolverFactory::detect();
        assert!(!capability.is_available());
        assert_eq!(capability.engine(), "Nelder-Mead (fallback)");
        assert!(capability.solver().is_none());
    }

    #[test]
    fn empty_capability_reports_no_engine() {
        let capability = SolverCapability::none();
        assert!(!capability.is_available());
        assert_eq!(capability.engine(), "none");
        assert!(capability.solver().is_none());
    }

    #[cfg(feature = "argmin")]
    #[test]
    fn fallback_capability_withholds_solver() {
        let capability =
            SolverCapability::fallback(Arc::new(NelderMeadSolver::new()) as Arc<dyn SolverService>);
        assert!(!capability.is_available());
        assert!(capability.solver().is_none());
        assert_eq!(capability.engine(), "Nelder-Mead (fallback)");
    }
}
