//! CP solver contract and the bounded backtracking backend.
//!
//! The default backend is [`GoodLpSolver`](super::GoodLpSolver);
//! [`BacktrackingSolver`] is a dependency-free alternative whose node
//! count and deadline are checked inside the search.
//!
//! # Algorithm
//!
//! [`BacktrackingSolver`] is a complete depth-first search over the
//! boolean variables:
//!
//! 1. Pick the unsatisfied `Exactly` constraint with the fewest free
//!    variables (fail-first), and branch on its first free variable:
//!    `true` first, then `false` on backtrack.
//! 2. After every decision, propagate cardinality bounds to a fixpoint:
//!    - a constraint at its upper bound forces its free variables `false`;
//!    - a constraint that needs all its free variables forces them `true`;
//!    - a constraint over its upper bound, or unable to reach its lower
//!      bound, is a conflict.
//! 3. Undo through a trail on backtrack.
//! 4. When every `Exactly` constraint holds, the remaining free variables
//!    are set `false`; `AtMost` constraints stay satisfied.
//!
//! The search is deterministic: same model, same solution. The deadline
//! is checked once per node.
//!
//! # Reference
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming", Ch. 4
//! - Haralick & Elliott (1980), "Increasing tree search efficiency for
//!   constraint satisfaction problems"

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use super::model::{BoolVar, Cardinality, CpModel};

/// Default wall-clock budget for one solve.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

/// Search limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget.
    pub time_limit: Duration,
    /// Optional cap on explored search nodes. Hitting it counts as a timeout.
    pub node_limit: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            node_limit: None,
        }
    }
}

impl SolverConfig {
    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the node cap.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }
}

/// Classified outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A solution was found and proven optimal (trivially so without an
    /// objective).
    Optimal,
    /// A solution was found without an optimality proof.
    Feasible,
    /// No solution exists.
    Infeasible,
    /// The budget ran out before a solution or a proof.
    TimeoutNoSolution,
}

impl SolveStatus {
    /// Whether the solution values are usable.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

/// Result of a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpSolution {
    /// Outcome.
    pub status: SolveStatus,
    /// One value per variable; empty unless `status.has_solution()`.
    pub values: Vec<bool>,
    /// Search nodes explored.
    pub nodes: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl CpSolution {
    /// A solution-less outcome.
    pub fn without_solution(status: SolveStatus, nodes: u64, elapsed: Duration) -> Self {
        Self {
            status,
            values: Vec::new(),
            nodes,
            elapsed,
        }
    }

    /// Whether a solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }

    /// Value of a variable in the solution.
    pub fn value(&self, var: BoolVar) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    /// Variables set to `true`, ascending.
    pub fn true_vars(&self) -> impl Iterator<Item = BoolVar> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(|(i, _)| BoolVar(i))
    }
}

/// Backend failures. Predictable outcomes (infeasible, timeout) are not
/// errors; they are [`SolveStatus`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The model references variables it does not declare.
    #[error("invalid model: {0}")]
    InvalidModel(String),
    /// The backend could not run.
    #[error("solver backend unavailable: {0}")]
    Unavailable(String),
    /// The backend ran and failed.
    #[error("solver backend failed: {0}")]
    Backend(String),
}

/// An exact CP backend: one blocking call bounded by the config.
pub trait CpSolver {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Solves the model.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, SolverError>;
}

/// Deterministic depth-first search with cardinality propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingSolver;

impl BacktrackingSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BacktrackingSolver {
    fn name(&self) -> &'static str {
        "backtracking"
    }

    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, SolverError> {
        let mut search = Search::new(model)?;
        let solution = search.run(config);
        debug!(
            solver = self.name(),
            vars = model.var_count(),
            constraints = model.constraint_count(),
            nodes = solution.nodes,
            status = ?solution.status,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "Search finished"
        );
        Ok(solution)
    }
}

struct ConstraintState {
    vars: Vec<usize>,
    lower: u32,
    upper: u32,
    is_exact: bool,
    ones: u32,
    free: u32,
}

struct Decision {
    trail_mark: usize,
    var: usize,
    negated: bool,
}

struct Search {
    values: Vec<Option<bool>>,
    var_constraints: Vec<Vec<usize>>,
    constraints: Vec<ConstraintState>,
    trail: Vec<usize>,
    nodes: u64,
}

impl Search {
    fn new(model: &CpModel) -> Result<Self, SolverError> {
        if let Some((c, var)) = model.find_undeclared() {
            return Err(SolverError::InvalidModel(format!(
                "constraint '{}' references undeclared variable {}",
                c.name,
                var.index()
            )));
        }

        let n = model.var_count();
        let mut var_constraints = vec![Vec::new(); n];
        let mut constraints = Vec::with_capacity(model.constraint_count());

        for (ci, c) in model.constraints().iter().enumerate() {
            let vars: Vec<usize> = c.vars.iter().map(|v| v.index()).collect();
            for &v in &vars {
                var_constraints[v].push(ci);
            }
            constraints.push(ConstraintState {
                free: vars.len() as u32,
                vars,
                lower: c.cardinality.lower(),
                upper: c.cardinality.upper(),
                is_exact: matches!(c.cardinality, Cardinality::Exactly(_)),
                ones: 0,
            });
        }

        Ok(Self {
            values: vec![None; n],
            var_constraints,
            constraints,
            trail: Vec::new(),
            nodes: 0,
        })
    }

    fn run(&mut self, config: &SolverConfig) -> CpSolution {
        let start = Instant::now();
        let deadline = start + config.time_limit;
        let mut decisions: Vec<Decision> = Vec::new();

        // Root propagation: empty constraints and trivially forced ones.
        let roots: Vec<usize> = (0..self.constraints.len()).collect();
        if !self.propagate_from(roots) {
            return CpSolution::without_solution(SolveStatus::Infeasible, 0, start.elapsed());
        }

        loop {
            self.nodes += 1;
            if Instant::now() >= deadline || config.node_limit.is_some_and(|l| self.nodes > l) {
                return CpSolution::without_solution(
                    SolveStatus::TimeoutNoSolution,
                    self.nodes,
                    start.elapsed(),
                );
            }

            let Some(var) = self.pick_branch_var() else {
                let values = self.values.iter().map(|v| v.unwrap_or(false)).collect();
                return CpSolution {
                    status: SolveStatus::Optimal,
                    values,
                    nodes: self.nodes,
                    elapsed: start.elapsed(),
                };
            };

            decisions.push(Decision {
                trail_mark: self.trail.len(),
                var,
                negated: false,
            });
            if self.assign_and_propagate(var, true) {
                continue;
            }

            // Backtrack to the most recent decision that still has its
            // `false` branch open.
            loop {
                let Some(decision) = decisions.pop() else {
                    return CpSolution::without_solution(
                        SolveStatus::Infeasible,
                        self.nodes,
                        start.elapsed(),
                    );
                };
                self.undo_to(decision.trail_mark);
                if decision.negated {
                    continue;
                }
                decisions.push(Decision {
                    trail_mark: decision.trail_mark,
                    var: decision.var,
                    negated: true,
                });
                if self.assign_and_propagate(decision.var, false) {
                    break;
                }
            }
        }
    }

    /// First free variable of the open `Exactly` constraint with the
    /// fewest free variables. `None` once every `Exactly` holds.
    fn pick_branch_var(&self) -> Option<usize> {
        let best = self
            .constraints
            .iter()
            .filter(|c| c.is_exact && c.ones < c.lower && c.free > 0)
            .min_by_key(|c| c.free)?;
        best.vars.iter().copied().find(|&v| self.values[v].is_none())
    }

    fn assign_and_propagate(&mut self, var: usize, value: bool) -> bool {
        let mut queue = VecDeque::new();
        if !self.assign(var, value, &mut queue) {
            return false;
        }
        self.drain(queue)
    }

    fn propagate_from(&mut self, constraints: Vec<usize>) -> bool {
        self.drain(constraints.into_iter().collect())
    }

    fn drain(&mut self, mut queue: VecDeque<usize>) -> bool {
        while let Some(ci) = queue.pop_front() {
            let c = &self.constraints[ci];
            if c.ones > c.upper || c.ones + c.free < c.lower {
                return false;
            }
            if c.free == 0 {
                continue;
            }
            let forced = if c.ones == c.upper {
                false
            } else if c.ones + c.free == c.lower {
                true
            } else {
                continue;
            };
            let free_vars: Vec<usize> = c
                .vars
                .iter()
                .copied()
                .filter(|&v| self.values[v].is_none())
                .collect();
            for v in free_vars {
                if !self.assign(v, forced, &mut queue) {
                    return false;
                }
            }
        }
        true
    }

    fn assign(&mut self, var: usize, value: bool, queue: &mut VecDeque<usize>) -> bool {
        match self.values[var] {
            Some(current) => return current == value,
            None => self.values[var] = Some(value),
        }
        self.trail.push(var);
        // Counts of every constraint must move together so that undo stays
        // symmetric, even when one of them is already violated.
        let mut consistent = true;
        for &ci in &self.var_constraints[var] {
            let c = &mut self.constraints[ci];
            c.free -= 1;
            if value {
                c.ones += 1;
            }
            if c.ones > c.upper || c.ones + c.free < c.lower {
                consistent = false;
            }
            queue.push_back(ci);
        }
        consistent
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(var) = self.trail.pop() else { break };
            let value = self.values[var].take().unwrap_or(false);
            for &ci in &self.var_constraints[var] {
                let c = &mut self.constraints[ci];
                c.free += 1;
                if value {
                    c.ones -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(model: &CpModel) -> CpSolution {
        BacktrackingSolver::new()
            .solve(model, &SolverConfig::default())
            .unwrap()
    }

    #[test]
    fn test_trivial_model() {
        let model = CpModel::new("empty");
        let sol = solve(&model);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert!(sol.values.is_empty());
    }

    #[test]
    fn test_exactly_and_at_most() {
        let mut m = CpModel::new("small");
        let vars: Vec<_> = (0..4).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("two_of_four", vars.clone(), 2);
        m.add_at_most("not_first_pair", vec![vars[0], vars[1]], 1);
        m.add_at_most("not_last_pair", vec![vars[2], vars[3]], 1);

        let sol = solve(&m);
        assert!(sol.is_solution_found());
        assert!(m.is_satisfied_by(&sol.values));
        assert_eq!(sol.true_vars().count(), 2);
    }

    #[test]
    fn test_pigeonhole_is_infeasible() {
        // Three pigeons, two holes.
        let mut m = CpModel::new("pigeonhole");
        let mut x = vec![vec![BoolVar(0); 2]; 3];
        for (p, row) in x.iter_mut().enumerate() {
            for (h, cell) in row.iter_mut().enumerate() {
                *cell = m.new_bool_var(format!("p{p}h{h}"));
            }
        }
        for (p, row) in x.iter().enumerate() {
            m.add_exactly(format!("pigeon_{p}"), row.clone(), 1);
        }
        for h in 0..2 {
            m.add_at_most(format!("hole_{h}"), x.iter().map(|r| r[h]).collect(), 1);
        }

        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert!(sol.values.is_empty());
    }

    #[test]
    fn test_empty_exactly_is_infeasible_at_root() {
        let mut m = CpModel::new("root");
        m.add_exactly("needs_one", vec![], 1);
        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert_eq!(sol.nodes, 0);
    }

    #[test]
    fn test_propagation_forces_values() {
        // c forces x1 and x2; a and b then force x0 off.
        let mut m = CpModel::new("forced");
        let x: Vec<_> = (0..3).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("a", vec![x[0], x[1]], 1);
        m.add_exactly("b", vec![x[0], x[2]], 1);
        m.add_exactly("c", vec![x[1], x[2]], 2);

        let sol = solve(&m);
        assert!(sol.is_solution_found());
        assert_eq!(sol.values, vec![false, true, true]);
    }

    #[test]
    fn test_first_branch_fails_then_recovers() {
        // Branching x0 = true empties b through c and d; the search must
        // undo it and take x1.
        let mut m = CpModel::new("backtrack");
        let x: Vec<_> = (0..4).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("a", vec![x[0], x[1]], 1);
        m.add_exactly("b", vec![x[2], x[3]], 1);
        m.add_at_most("c", vec![x[0], x[2]], 1);
        m.add_at_most("d", vec![x[0], x[3]], 1);

        let sol = solve(&m);
        assert!(sol.is_solution_found());
        assert!(m.is_satisfied_by(&sol.values));
        assert_eq!(sol.values, vec![false, true, true, false]);
        assert!(sol.nodes >= 2);
    }

    #[test]
    fn test_deterministic() {
        let mut m = CpModel::new("det");
        let x: Vec<_> = (0..6).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("three", x.clone(), 3);
        m.add_at_most("left", x[..3].to_vec(), 2);

        let a = solve(&m);
        let b = solve(&m);
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn test_zero_time_limit_times_out() {
        let mut m = CpModel::new("timeout");
        let x: Vec<_> = (0..3).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("one", x, 1);

        let config = SolverConfig::default().with_time_limit(Duration::ZERO);
        let sol = BacktrackingSolver::new().solve(&m, &config).unwrap();
        assert_eq!(sol.status, SolveStatus::TimeoutNoSolution);
        assert!(!sol.is_solution_found());
    }

    #[test]
    fn test_node_limit_times_out() {
        let mut m = CpModel::new("nodes");
        let x: Vec<_> = (0..3).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("one", x, 1);

        let config = SolverConfig::default().with_node_limit(0);
        let sol = BacktrackingSolver::new().solve(&m, &config).unwrap();
        assert_eq!(sol.status, SolveStatus::TimeoutNoSolution);
    }

    #[test]
    fn test_invalid_model_is_an_error() {
        let mut m = CpModel::new("bad");
        m.add_at_most("ghost", vec![BoolVar(3)], 1);
        let err = BacktrackingSolver::new()
            .solve(&m, &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidModel(_)));
    }
}
