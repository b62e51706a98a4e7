//! Boolean CP model.
//!
//! A model is a set of 0/1 decision variables and linear cardinality
//! constraints over them (`Σ vars == k` or `Σ vars ≤ k`). This is the
//! whole vocabulary the timetabling formulation needs.

use serde::{Deserialize, Serialize};

/// Index of a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoolVar(pub usize);

impl BoolVar {
    /// Position in the model's variable list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Comparison of a cardinality constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly `k` variables are true.
    Exactly(u32),
    /// At most `k` variables are true.
    AtMost(u32),
}

impl Cardinality {
    /// Upper bound on the number of true variables.
    #[inline]
    pub fn upper(self) -> u32 {
        match self {
            Self::Exactly(k) | Self::AtMost(k) => k,
        }
    }

    /// Lower bound on the number of true variables.
    #[inline]
    pub fn lower(self) -> u32 {
        match self {
            Self::Exactly(k) => k,
            Self::AtMost(_) => 0,
        }
    }
}

/// `Σ vars (== | ≤) k`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Constraint name, for diagnostics.
    pub name: String,
    /// Variables summed.
    pub vars: Vec<BoolVar>,
    /// Bound.
    pub cardinality: Cardinality,
}

impl LinearConstraint {
    /// Whether `values` satisfies this constraint.
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        let ones = self
            .vars
            .iter()
            .filter(|v| values.get(v.index()).copied().unwrap_or(false))
            .count() as u32;
        ones >= self.cardinality.lower() && ones <= self.cardinality.upper()
    }
}

/// A boolean CP model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    var_names: Vec<String>,
    constraints: Vec<LinearConstraint>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_names: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Adds a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.var_names.push(name.into());
        BoolVar(self.var_names.len() - 1)
    }

    /// Adds `Σ vars == k`.
    pub fn add_exactly(&mut self, name: impl Into<String>, vars: Vec<BoolVar>, k: u32) {
        self.add_constraint(name, vars, Cardinality::Exactly(k));
    }

    /// Adds `Σ vars ≤ k`.
    pub fn add_at_most(&mut self, name: impl Into<String>, vars: Vec<BoolVar>, k: u32) {
        self.add_constraint(name, vars, Cardinality::AtMost(k));
    }

    fn add_constraint(&mut self, name: impl Into<String>, vars: Vec<BoolVar>, cardinality: Cardinality) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            vars,
            cardinality,
        });
    }

    /// Name of a variable.
    pub fn var_name(&self, var: BoolVar) -> Option<&str> {
        self.var_names.get(var.index()).map(String::as_str)
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// First constraint term naming a variable the model does not declare.
    pub fn find_undeclared(&self) -> Option<(&LinearConstraint, BoolVar)> {
        self.constraints.iter().find_map(|c| {
            c.vars
                .iter()
                .find(|v| v.index() >= self.var_count())
                .map(|&v| (c, v))
        })
    }

    /// Whether a full assignment satisfies every constraint.
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        values.len() == self.var_count() && self.constraints.iter().all(|c| c.is_satisfied_by(values))
    }
}
