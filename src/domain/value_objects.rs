// Domain value objects representing core business concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

impl fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationType::Minimize => write!(f, "minimize"),
            OptimizationType::Maximize => write!(f, "maximize"),
        }
    }
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    #[serde(rename = "le")]
    LessThanOrEqual,
    /// Equal (=)
    #[serde(rename = "eq")]
    Equal,
    /// Greater than or equal (≥)
    #[serde(rename = "ge", alias = "ineq")]
    GreaterThanOrEqual,
}

/// Solver backend compiled into this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    /// Derivative-free constrained optimization by linear approximation
    Cobyla,
    /// Bounded, penalized Nelder-Mead simplex
    NelderMead,
}

impl SolverBackend {
    /// Whether this backend is the preferred engine
    pub fn is_preferred(&self) -> bool {
        matches!(self, SolverBackend::Cobyla)
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Cobyla => write!(f, "COBYLA"),
            SolverBackend::NelderMead => write!(f, "Nelder-Mead (fallback)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("\"minimize\"", OptimizationType::Minimize)]
    #[test_case("\"maximize\"", OptimizationType::Maximize)]
    fn parses_objective_sense(raw: &str, expected: OptimizationType) {
        let parsed: OptimizationType = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_objective_sense() {
        assert!(serde_json::from_str::<OptimizationType>("\"optimize\"").is_err());
    }

    #[test_case("\"eq\"", ConstraintType::Equal)]
    #[test_case("\"ineq\"", ConstraintType::GreaterThanOrEqual)]
    #[test_case("\"ge\"", ConstraintType::GreaterThanOrEqual)]
    #[test_case("\"le\"", ConstraintType::LessThanOrEqual)]
    fn parses_constraint_type(raw: &str, expected: ConstraintType) {
        let parsed: ConstraintType = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn only_cobyla_is_preferred() {
        assert!(SolverBackend::Cobyla.is_preferred());
        assert!(!SolverBackend::NelderMead.is_preferred());
        assert_eq!(SolverBackend::NelderMead.to_string(), "Nelder-Mead (fallback)");
    }
}
