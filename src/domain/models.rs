use serde::Deserialize;
use serde_json::{Map, Value};

use super::solver_service::{Result, SolverError};
use super::value_objects::{ConstraintType, OptimizationType};

/// Per-dimension box limits on the decision vector, aligned by index
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl VariableBounds {
    /// Convert `[lower, upper]` pairs into aligned lower and upper vectors.
    ///
    /// Rejects a pair count that differs from `dimension`, pairs that do not
    /// hold exactly two values, and pairs with `lower > upper`.
    pub fn from_pairs(pairs: &[Vec<f64>], dimension: usize) -> Result<Self> {
        if pairs.len() != dimension {
            return Err(SolverError::InvalidProblem(format!(
                "Expected {} bound pairs (one per variable) but got {}",
                dimension,
                pairs.len()
            )));
        }

        let mut lower = Vec::with_capacity(dimension);
        let mut upper = Vec::with_capacity(dimension);

        for (i, pair) in pairs.iter().enumerate() {
            let &[lo, hi] = pair.as_slice() else {
                return Err(SolverError::InvalidProblem(format!(
                    "Bound {} must be a [lower, upper] pair but has {} values",
                    i,
                    pair.len()
                )));
            };
            if lo > hi {
                return Err(SolverError::InvalidProblem(format!(
                    "Bound {} has lower bound ({}) > upper bound ({})",
                    i, lo, hi
                )));
            }
            lower.push(lo);
            upper.push(hi);
        }

        Ok(Self { lower, upper })
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Bounds as `(lower, upper)` tuples
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.lower
            .iter()
            .copied()
            .zip(self.upper.iter().copied())
            .collect()
    }

    /// Project a point onto the box
    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.pairs())
            .map(|(&xi, (lo, hi))| xi.clamp(lo, hi))
            .collect()
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dimension()
            && x
                .iter()
                .zip(self.pairs())
                .all(|(&xi, (lo, hi))| lo <= xi && xi <= hi)
    }
}

/// A single `g(x) >= 0` restriction derived from a linear constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    coefficients: Vec<f64>,
    bound: f64,
    sign: f64,
}

impl Inequality {
    pub fn value(&self, x: &[f64]) -> f64 {
        self.sign * (dot(&self.coefficients, x) - self.bound)
    }
}

/// Linear constraint on variables, decoded from an opaque descriptor
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearConstraint {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub bound: f64,
}

impl LinearConstraint {
    pub fn new(constraint_type: ConstraintType, coefficients: Vec<f64>, bound: f64) -> Self {
        Self {
            constraint_type,
            coefficients,
            bound,
        }
    }

    /// Decode the descriptor at `index` for a problem with `dimension` variables
    pub fn from_descriptor(index: usize, descriptor: &Value, dimension: usize) -> Result<Self> {
        let constraint: Self = serde_json::from_value(descriptor.clone()).map_err(|e| {
            SolverError::InvalidProblem(format!(
                "Constraint {} is not a supported linear constraint descriptor: {}",
                index, e
            ))
        })?;

        if constraint.coefficients.len() != dimension {
            return Err(SolverError::InvalidProblem(format!(
                "Constraint {} has {} coefficients but problem has {} variables",
                index,
                constraint.coefficients.len(),
                dimension
            )));
        }

        Ok(constraint)
    }

    /// Decode every descriptor, failing on the first unsupported one
    pub fn decode_all(descriptors: &[Value], dimension: usize) -> Result<Vec<Self>> {
        descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| Self::from_descriptor(i, d, dimension))
            .collect()
    }

    /// Equivalent `g(x) >= 0` restrictions (two for an equality)
    pub fn inequalities(&self) -> Vec<Inequality> {
        let side = |sign: f64| Inequality {
            coefficients: self.coefficients.clone(),
            bound: self.bound,
            sign,
        };
        match self.constraint_type {
            ConstraintType::GreaterThanOrEqual => vec![side(1.0)],
            ConstraintType::LessThanOrEqual => vec![side(-1.0)],
            ConstraintType::Equal => vec![side(1.0), side(-1.0)],
        }
    }

    /// Non-negative amount by which `x` violates this constraint
    pub fn violation(&self, x: &[f64]) -> f64 {
        let residual = dot(&self.coefficients, x) - self.bound;
        match self.constraint_type {
            ConstraintType::GreaterThanOrEqual => (-residual).max(0.0),
            ConstraintType::LessThanOrEqual => residual.max(0.0),
            ConstraintType::Equal => residual.abs(),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(ai, bi)| ai * bi).sum()
}

/// Backend-specific tuning keys, passed through without validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions(Map<String, Value>);

impl SolverOptions {
    pub fn new(options: Map<String, Value>) -> Self {
        Self(options)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// First of `keys` that is present, read as a positive integer
    pub fn positive_integer(&self, keys: &[&str]) -> Result<Option<usize>> {
        let Some((key, value)) = self.first_present(keys) else {
            return Ok(None);
        };
        match value.as_u64() {
            Some(n) if n > 0 => Ok(Some(n as usize)),
            _ => Err(SolverError::InvalidProblem(format!(
                "Option '{}' must be a positive integer, got {}",
                key, value
            ))),
        }
    }

    /// `key` read as a positive real number
    pub fn positive_real(&self, key: &str) -> Result<Option<f64>> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };
        match value.as_f64() {
            Some(v) if v > 0.0 => Ok(Some(v)),
            _ => Err(SolverError::InvalidProblem(format!(
                "Option '{}' must be a positive number, got {}",
                key, value
            ))),
        }
    }

    fn first_present<'a>(&'a self, keys: &[&'a str]) -> Option<(&'a str, &'a Value)> {
        keys.iter()
            .find_map(|&key| self.0.get(key).map(|value| (key, value)))
    }
}

/// Complete optimization problem as posed by a client
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub objective_type: OptimizationType,
    pub initial_guess: Vec<f64>,
    pub bounds: Option<Vec<Vec<f64>>>,
    pub constraints: Vec<Value>,
    pub options: SolverOptions,
}

impl OptimizationProblem {
    pub fn new(objective_type: OptimizationType, initial_guess: Vec<f64>) -> Self {
        Self {
            objective_type,
            initial_guess,
            bounds: None,
            constraints: Vec::new(),
            options: SolverOptions::default(),
        }
    }

    pub fn with_bounds(mut self, bounds: Vec<Vec<f64>>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Value>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.initial_guess.len()
    }

    /// Converted bounds, or `None` when the problem is unbounded
    pub fn variable_bounds(&self) -> Result<Option<VariableBounds>> {
        self.bounds
            .as_deref()
            .map(|pairs| VariableBounds::from_pairs(pairs, self.num_variables()))
            .transpose()
    }
}

/// What a backend reports; each backend fills in only what it knows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendResult {
    pub x: Option<Vec<f64>>,
    pub fun: Option<f64>,
    pub success: Option<bool>,
    pub message: Option<String>,
    pub nit: Option<u64>,
    pub nfev: Option<u64>,
}

/// Normalized solution returned to clients
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub optimal_point: Option<Vec<f64>>,
    pub optimal_value: Option<f64>,
    pub success: bool,
    pub message: String,
    pub iterations: Option<u64>,
    pub function_evaluations: Option<u64>,
}

impl Solution {
    /// Map a backend result onto the public schema.
    ///
    /// Missing fields stay missing. `success` is false and `message` is a
    /// generic completion note only when the backend says nothing at all.
    pub fn normalize(result: BackendResult) -> Self {
        Self {
            optimal_point: result.x,
            optimal_value: result.fun,
            success: result.success.unwrap_or(false),
            message: result
                .message
                .unwrap_or_else(|| "Optimization completed".to_string()),
            iterations: result.nit,
            function_evaluations: result.nfev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_bound_pairs_by_dimension() {
        let bounds = VariableBounds::from_pairs(&[vec![0.0, 10.0], vec![-1.0, 1.0]], 2).unwrap();
        assert_eq!(bounds.lower, vec![0.0, -1.0]);
        assert_eq!(bounds.upper, vec![10.0, 1.0]);
        assert_eq!(bounds.pairs(), vec![(0.0, 10.0), (-1.0, 1.0)]);
    }

    #[test]
    fn rejects_bound_count_mismatch() {
        let err = VariableBounds::from_pairs(&[vec![0.0, 10.0]], 2).unwrap_err();
        assert!(err.to_string().contains("Expected 2 bound pairs"));
    }

    #[test]
    fn rejects_inverted_and_malformed_pairs() {
        let inverted = VariableBounds::from_pairs(&[vec![5.0, 1.0]], 1).unwrap_err();
        assert!(inverted.to_string().contains("lower bound (5) > upper bound (1)"));

        let short = VariableBounds::from_pairs(&[vec![5.0]], 1).unwrap_err();
        assert!(short.to_string().contains("has 1 values"));
    }

    #[test]
    fn clamps_into_box() {
        let bounds = VariableBounds::from_pairs(&[vec![1.0, 2.0], vec![-1.0, 0.0]], 2).unwrap();
        assert_eq!(bounds.clamp(&[0.0, 3.0]), vec![1.0, 0.0]);
        assert!(bounds.contains(&[1.5, -0.5]));
        assert!(!bounds.contains(&[2.5, -0.5]));
    }

    #[test]
    fn decodes_linear_constraints() {
        let descriptors = vec![
            json!({"type": "ineq", "coefficients": [1.0, 1.0], "bound": 1.0}),
            json!({"type": "eq", "coefficients": [1.0, -1.0]}),
        ];
        let constraints = LinearConstraint::decode_all(&descriptors, 2).unwrap();
        assert_eq!(
            constraints[0],
            LinearConstraint::new(ConstraintType::GreaterThanOrEqual, vec![1.0, 1.0], 1.0)
        );
        assert_eq!(constraints[1].bound, 0.0);
        assert_eq!(constraints[1].inequalities().len(), 2);
    }

    #[test]
    fn rejects_opaque_constraint_shapes() {
        let err = LinearConstraint::decode_all(&[json!({"fun": "x[0] - 1"})], 1).unwrap_err();
        assert!(err.to_string().contains("Constraint 0"));

        let err = LinearConstraint::decode_all(
            &[json!({"type": "le", "coefficients": [1.0], "bound": 1.0})],
            2,
        )
        .unwrap_err();
        assert!(err.to_string().contains("has 1 coefficients but problem has 2"));
    }

    #[test]
    fn measures_constraint_violation() {
        let ge = LinearConstraint::new(ConstraintType::GreaterThanOrEqual, vec![1.0], 2.0);
        assert_eq!(ge.violation(&[1.5]), 0.5);
        assert_eq!(ge.violation(&[3.0]), 0.0);
        assert_eq!(ge.inequalities()[0].value(&[3.0]), 1.0);

        let le = LinearConstraint::new(ConstraintType::LessThanOrEqual, vec![1.0], 2.0);
        assert_eq!(le.violation(&[3.0]), 1.0);
        assert_eq!(le.inequalities()[0].value(&[3.0]), -1.0);

        let eq = LinearConstraint::new(ConstraintType::Equal, vec![2.0], 2.0);
        assert_eq!(eq.violation(&[0.0]), 2.0);
    }

    #[test]
    fn reads_typed_options() {
        let options = match json!({"maxiter": 50, "tol": 1e-6, "bogus": "ignored"}) {
            Value::Object(map) => SolverOptions::new(map),
            _ => unreachable!(),
        };
        assert_eq!(options.positive_integer(&["maxfev", "maxiter"]).unwrap(), Some(50));
        assert_eq!(options.positive_real("tol").unwrap(), Some(1e-6));
        assert_eq!(options.positive_real("rhobeg").unwrap(), None);
    }

    #[test]
    fn rejects_mistyped_options() {
        let options = match json!({"maxiter": "many", "tol": -1.0}) {
            Value::Object(map) => SolverOptions::new(map),
            _ => unreachable!(),
        };
        assert!(options.positive_integer(&["maxiter"]).is_err());
        assert!(options.positive_real("tol").is_err());
    }

    #[test]
    fn normalization_keeps_missing_fields_missing() {
        let solution = Solution::normalize(BackendResult::default());
        assert_eq!(solution.optimal_point, None);
        assert_eq!(solution.optimal_value, None);
        assert!(!solution.success);
        assert_eq!(solution.message, "Optimization completed");
        assert_eq!(solution.iterations, None);
        assert_eq!(solution.function_evaluations, None);
    }

    #[test]
    fn normalization_preserves_reported_failure() {
        let solution = Solution::normalize(BackendResult {
            x: Some(vec![1.0]),
            fun: Some(1.0),
            success: Some(false),
            message: Some("MaxEvalReached".to_string()),
            nit: None,
            nfev: Some(10),
        });
        assert!(!solution.success);
        assert_eq!(solution.message, "MaxEvalReached");
        assert_eq!(solution.function_evaluations, Some(10));
        assert_eq!(solution.iterations, None);
    }
}
