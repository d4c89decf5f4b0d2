// Solver port and the bundled MILP backend.
//
// The rest of the crate only sees the `Solver` trait: a model goes in, the
// ids of the variants set to 1 come out. `MilpSolver` translates the model
// for the pure-Rust `microlp` branch-and-bound solver via `good_lp`.

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{LinearConstraint, LinearModel, Sense};
use crate::variants::VariantId;

/// How far a binary value may sit from 0 or 1 and still be read as one.
const INTEGRALITY_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolveError {
    #[error("no selection satisfies every constraint")]
    Infeasible,

    #[error("{0}")]
    Backend(String),
}

/// An optimizer for 0/1 squad models.
pub trait Solver {
    /// Return the ids of the variants chosen by an optimal (or, within
    /// `tolerance` relative gap, near-optimal) selection.
    fn solve(&self, model: &LinearModel, tolerance: f64) -> Result<Vec<VariantId>, SolveError>;
}

// ---------------------------------------------------------------------------
// MilpSolver
// ---------------------------------------------------------------------------

/// Exact solver backed by `microlp`.
///
/// `microlp` runs branch and bound to proven optimality, so every
/// non-negative tolerance is met; the value is only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        MilpSolver
    }
}

/// Sum of `coef * x` over a constraint's or objective's terms.
fn linear_expression(terms: &[(VariantId, f64)], vars: &[Variable]) -> Expression {
    terms.iter().map(|(id, coef)| *coef * vars[id.0]).sum()
}

/// A constraint without terms is a constant comparison. Decide it up front
/// instead of handing the backend an empty row.
fn constant_holds(c: &LinearConstraint) -> bool {
    c.holds(0.0)
}

impl Solver for MilpSolver {
    fn solve(&self, model: &LinearModel, tolerance: f64) -> Result<Vec<VariantId>, SolveError> {
        info!(
            "Solving {} binary variables, {} constraints (tolerance {tolerance})",
            model.variable_count(),
            model.constraints().len()
        );

        if let Some(c) = model
            .constraints()
            .iter()
            .find(|c| c.terms.is_empty() && !constant_holds(c))
        {
            debug!("constraint {} has no terms and cannot hold", c.name);
            return Err(SolveError::Infeasible);
        }

        if let Some((id, _)) = model
            .objective()
            .iter()
            .chain(model.constraints().iter().flat_map(|c| c.terms.iter()))
            .find(|(id, _)| id.0 >= model.variable_count())
        {
            return Err(SolveError::Backend(format!("model references unknown variant {id}")));
        }

        let mut problem_vars = ProblemVariables::new();
        let vars: Vec<Variable> = (0..model.variable_count())
            .map(|_| problem_vars.add(variable().binary()))
            .collect();

        let objective = linear_expression(model.objective(), &vars);
        let mut problem = problem_vars.maximise(objective).using(microlp);

        for c in model.constraints().iter().filter(|c| !c.terms.is_empty()) {
            let lhs = linear_expression(&c.terms, &vars);
            problem = problem.with(match c.sense {
                Sense::Le => constraint::leq(lhs, c.rhs),
                Sense::Ge => constraint::geq(lhs, c.rhs),
                Sense::Eq => constraint::eq(lhs, c.rhs),
            });
        }

        let solution = problem.solve().map_err(|e| match e {
            ResolutionError::Infeasible => SolveError::Infeasible,
            other => SolveError::Backend(format!("microlp: {other}")),
        })?;

        let mut selected = Vec::new();
        for (i, var) in vars.iter().enumerate() {
            let value = solution.value(*var);
            if (value - 1.0).abs() <= INTEGRALITY_TOLERANCE {
                selected.push(VariantId(i));
            } else if value.abs() > INTEGRALITY_TOLERANCE {
                return Err(SolveError::Backend(format!(
                    "variant {} has non-binary value {value}",
                    VariantId(i)
                )));
            }
        }

        debug!("solver selected {} variants", selected.len());
        Ok(selected)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{self, SquadRules};
    use crate::player::{PlayerRecord, Position};
    use crate::variants::{self, Role, VariantOptions, VariantPool};

    fn options() -> VariantOptions<'static> {
        VariantOptions {
            bench_fraction: 0.1,
            score_field: "total_points",
            adjustment_threshold: 1.0,
        }
    }

    /// Two keepers and two forwards of very different quality.
    fn small_pool() -> VariantPool {
        let players = vec![
            PlayerRecord::new("G", "One", "AAA", Position::Keeper, 5.0)
                .with_stat("total_points", 100.0),
            PlayerRecord::new("G", "Two", "BBB", Position::Keeper, 4.0)
                .with_stat("total_points", 60.0),
            PlayerRecord::new("F", "Good", "CCC", Position::Forward, 8.0)
                .with_stat("total_points", 150.0),
            PlayerRecord::new("F", "Poor", "DDD", Position::Forward, 7.0)
                .with_stat("total_points", 40.0),
        ];
        variants::generate(&players, &options(), &[])
    }

    /// One keeper starter + one keeper sub + one forward starter, captain
    /// among starters.
    fn tiny_rules() -> SquadRules {
        SquadRules {
            keeper: model::PositionQuota::new(1, 1, 2),
            defender: model::PositionQuota::new(0, 0, 0),
            midfielder: model::PositionQuota::new(0, 0, 0),
            forward: model::PositionQuota::new(1, 1, 1),
            subs: 1,
        }
    }

    #[test]
    fn solves_tiny_model_to_optimality() {
        let pool = small_pool();
        let model = model::formulate(&pool, &tiny_rules(), 100.0);
        let selected = MilpSolver::new().solve(&model, 1e-6).unwrap();

        assert_eq!(selected.len(), 3);
        assert!(model.evaluate(&selected).is_empty());

        // Best: keeper One starts, Two on the bench, Good starts as captain.
        // 100 + 6 + 300 = 406.
        assert!((model.objective_value(&selected) - 406.0).abs() < 1e-6);
        let captain = selected
            .iter()
            .map(|id| pool.get(*id).unwrap())
            .find(|v| v.is_captain)
            .unwrap();
        assert_eq!(captain.role, Role::Starter);
        assert_eq!(pool.player(captain.player_id).unwrap().last_name, "Good");
    }

    #[test]
    fn budget_changes_the_choice() {
        let pool = small_pool();
        // 5 + 4 + 8 = 17 is too much; 5 + 4 + 7 = 16 fits.
        let model = model::formulate(&pool, &tiny_rules(), 16.5);
        let selected = MilpSolver::new().solve(&model, 1e-6).unwrap();
        let names: Vec<&str> = selected
            .iter()
            .map(|id| pool.player(pool.get(*id).unwrap().player_id).unwrap().last_name.as_str())
            .collect();
        assert!(names.contains(&"Poor"));
        assert!(!names.contains(&"Good"));
    }

    #[test]
    fn impossible_budget_is_infeasible() {
        let pool = small_pool();
        let model = model::formulate(&pool, &tiny_rules(), 10.0);
        assert_eq!(MilpSolver::new().solve(&model, 1e-6), Err(SolveError::Infeasible));
    }

    #[test]
    fn empty_pool_is_infeasible() {
        let model = model::formulate(&VariantPool::default(), &SquadRules::default(), 100.0);
        assert_eq!(MilpSolver::new().solve(&model, 1e-6), Err(SolveError::Infeasible));
    }
}
