//! Integer-programming backend on `good_lp`.
//!
//! Every [`BoolVar`](super::BoolVar) becomes a binary column and every
//! cardinality constraint a row: `Σ x == k` for `Exactly`, `Σ x ≤ k` for
//! `AtMost`. The objective minimises the number of true variables; in a
//! timetable model the quota rows fix that number, so any integer point
//! the solver returns is optimal.
//!
//! The MILP runs on a worker thread. [`GoodLpSolver::solve`] waits for it
//! at most `time_limit` and reports `TimeoutNoSolution` past that; the
//! worker then finishes in the background and its answer is dropped.
//! `node_limit` does not apply to this backend.
//!
//! # Reference
//! - Wolsey (1998), "Integer Programming"
//! - Schaerf (1999), "A Survey of Automated Timetabling", §3 (IP models)

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use tracing::debug;

use super::model::{Cardinality, CpModel};
use super::solver::{CpSolution, CpSolver, SolveStatus, SolverConfig, SolverError};

/// Exact backend that hands the model to `good_lp`'s default MILP solver.
///
/// # Example
/// ```
/// use u_timetable::cp::{CpModel, CpSolver, GoodLpSolver, SolveStatus, SolverConfig};
///
/// let mut model = CpModel::new("pick");
/// let vars: Vec<_> = (0..3).map(|i| model.new_bool_var(format!("x{i}"))).collect();
/// model.add_exactly("two", vars.clone(), 2);
/// model.add_at_most("edge", vec![vars[0], vars[1]], 1);
///
/// let solution = GoodLpSolver::new().solve(&model, &SolverConfig::default()).unwrap();
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert!(model.is_satisfied_by(&solution.values));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for GoodLpSolver {
    fn name(&self) -> &'static str {
        "good_lp"
    }

    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, SolverError> {
        let start = Instant::now();
        if let Some((c, var)) = model.find_undeclared() {
            return Err(SolverError::InvalidModel(format!(
                "constraint '{}' references undeclared variable {}",
                c.name,
                var.index()
            )));
        }
        if config.time_limit.is_zero() {
            return Ok(CpSolution::without_solution(
                SolveStatus::TimeoutNoSolution,
                0,
                start.elapsed(),
            ));
        }
        if model.var_count() == 0 {
            let status = if model.is_satisfied_by(&[]) {
                SolveStatus::Optimal
            } else {
                SolveStatus::Infeasible
            };
            return Ok(CpSolution::without_solution(status, 0, start.elapsed()));
        }

        let owned = model.clone();
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("good_lp".into())
            .spawn(move || {
                // The receiver is gone after a timeout.
                let _ = tx.send(solve_milp(&owned));
            })
            .map_err(|e| SolverError::Unavailable(e.to_string()))?;

        let solution = match rx.recv_timeout(config.time_limit) {
            Ok(Ok(values)) => CpSolution {
                status: SolveStatus::Optimal,
                values,
                nodes: 0,
                elapsed: start.elapsed(),
            },
            Ok(Err(ResolutionError::Infeasible)) => {
                CpSolution::without_solution(SolveStatus::Infeasible, 0, start.elapsed())
            }
            Ok(Err(err)) => return Err(SolverError::Backend(err.to_string())),
            Err(RecvTimeoutError::Timeout) => {
                CpSolution::without_solution(SolveStatus::TimeoutNoSolution, 0, start.elapsed())
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SolverError::Backend(
                    "solver thread stopped without an answer".into(),
                ))
            }
        };

        debug!(
            solver = self.name(),
            vars = model.var_count(),
            constraints = model.constraint_count(),
            status = ?solution.status,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "MILP finished"
        );
        Ok(solution)
    }
}

/// Builds and solves the MILP. Variable references must be checked first.
fn solve_milp(model: &CpModel) -> Result<Vec<bool>, ResolutionError> {
    let mut problem = ProblemVariables::new();
    let columns: Vec<Variable> = (0..model.var_count())
        .map(|_| problem.add(variable().binary()))
        .collect();

    let objective: Expression = columns.iter().copied().sum();
    let mut milp = problem.minimise(objective).using(default_solver);
    for c in model.constraints() {
        let row: Expression = c.vars.iter().map(|v| columns[v.index()]).sum();
        let bound = f64::from(c.cardinality.upper());
        match c.cardinality {
            Cardinality::Exactly(_) => milp.add_constraint(constraint!(row == bound)),
            Cardinality::AtMost(_) => milp.add_constraint(constraint!(row <= bound)),
        };
    }

    let solution = milp.solve()?;
    Ok(columns.iter().map(|&x| solution.value(x) > 0.5).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BacktrackingSolver, BoolVar, TimetableCpBuilder};
    use crate::models::{Catalog, ClassGroup, Room, SlotGrid, Subject, Teacher};
    use std::time::Duration;

    fn solve(model: &CpModel) -> CpSolution {
        GoodLpSolver::new()
            .solve(model, &SolverConfig::default())
            .unwrap()
    }

    #[test]
    fn test_empty_model() {
        let sol = solve(&CpModel::new("empty"));
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert!(sol.values.is_empty());
    }

    #[test]
    fn test_empty_exactly_is_infeasible() {
        let mut m = CpModel::new("root");
        m.add_exactly("needs_one", vec![], 1);
        assert_eq!(solve(&m).status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_exactly_and_at_most() {
        let mut m = CpModel::new("small");
        let x: Vec<_> = (0..4).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("two_of_four", x.clone(), 2);
        m.add_at_most("not_first_pair", vec![x[0], x[1]], 1);
        m.add_at_most("not_last_pair", vec![x[2], x[3]], 1);

        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert!(m.is_satisfied_by(&sol.values));
        assert_eq!(sol.true_vars().count(), 2);
    }

    #[test]
    fn test_pigeonhole_is_infeasible() {
        let mut m = CpModel::new("pigeonhole");
        let x: Vec<Vec<BoolVar>> = (0..3)
            .map(|p| (0..2).map(|h| m.new_bool_var(format!("p{p}h{h}"))).collect())
            .collect();
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
    fn test_zero_time_limit_times_out() {
        let mut m = CpModel::new("timeout");
        let x: Vec<_> = (0..3).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.add_exactly("one", x, 1);

        let config = SolverConfig::default().with_time_limit(Duration::ZERO);
        let sol = GoodLpSolver::new().solve(&m, &config).unwrap();
        assert_eq!(sol.status, SolveStatus::TimeoutNoSolution);
    }

    #[test]
    fn test_invalid_model_is_an_error() {
        let mut m = CpModel::new("bad");
        m.new_bool_var("a");
        m.add_at_most("ghost", vec![BoolVar(3)], 1);
        let err = GoodLpSolver::new()
            .solve(&m, &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidModel(_)));
    }

    fn two_by_two_catalog() -> Catalog {
        Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_class_group(ClassGroup::new("6B", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math"))
            .with_teacher(Teacher::new("Costa").with_subject("History"))
            .with_subject(Subject::new("Math", 2).for_group("6"))
            .with_subject(Subject::new("History", 2).for_group("6"))
            .with_room(Room::new("R1"))
            .with_room(Room::new("R2"))
    }

    #[test]
    fn test_timetable_model_solves() {
        let catalog = two_by_two_catalog();
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        let (schedule, solution) = model
            .solve(&GoodLpSolver::new(), &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(model.model().is_satisfied_by(&solution.values));
        assert_eq!(schedule.len(), 8);
        assert!(schedule.conflicts().is_empty());
    }

    #[test]
    fn test_teacher_pigeonhole_is_proven_not_timed_out() {
        // 6 groups × 5 subjects × 5 lessons with one teacher per subject:
        // 30 lessons per teacher, 25 slots.
        let mut catalog = Catalog::new();
        for g in 0..6 {
            catalog = catalog
                .with_class_group(ClassGroup::new(format!("G{g}"), "all"))
                .with_room(Room::new(format!("R{g}")));
        }
        for s in 0..5 {
            catalog = catalog
                .with_subject(Subject::new(format!("S{s}"), 5).for_group("all"))
                .with_teacher(Teacher::new(format!("T{s}")).with_subject(format!("S{s}")));
        }
        let grid = SlotGrid::lower_secondary();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        let config = SolverConfig::default().with_time_limit(Duration::from_secs(120));

        let lp = GoodLpSolver::new().solve(model.model(), &config).unwrap();
        assert_eq!(lp.status, SolveStatus::Infeasible);

        // The DFS backend cannot prove this one within a small budget.
        let dfs = BacktrackingSolver::new()
            .solve(model.model(), &SolverConfig::default().with_node_limit(10_000))
            .unwrap();
        assert_eq!(dfs.status, SolveStatus::TimeoutNoSolution);
    }
}
