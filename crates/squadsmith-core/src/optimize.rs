// End-to-end roster optimization: variants -> model -> solver -> roster.

use serde::Serialize;
use tracing::info;

use crate::adjustments::AdjustmentEntry;
use crate::config::OptimizerConfig;
use crate::error::SquadError;
use crate::model::{self, SquadRules};
use crate::player::PlayerRecord;
use crate::roster::{self, Roster};
use crate::solver::Solver;
use crate::variants::{self, VariantOptions};

/// A solved roster together with the objective value it achieves.
#[derive(Debug, Clone, Serialize)]
pub struct Optimized {
    pub roster: Roster,
    pub objective: f64,
}

/// Pick the highest-scoring legal squad from `players`.
///
/// Solver errors propagate before decoding, so an infeasible model never
/// produces a partial roster.
pub fn optimize(
    players: &[PlayerRecord],
    adjustments: &[AdjustmentEntry],
    config: &OptimizerConfig,
    rules: &SquadRules,
    solver: &dyn Solver,
) -> Result<Optimized, SquadError> {
    let options = VariantOptions {
        bench_fraction: config.bench_fraction,
        score_field: &config.score_field,
        adjustment_threshold: config.adjustment_threshold,
    };
    let pool = variants::generate(players, &options, adjustments);
    if pool.is_empty() {
        return Err(SquadError::InputData(format!(
            "no player has a '{}' value",
            config.score_field
        )));
    }

    let model = model::formulate(&pool, rules, config.budget);
    let selected = solver.solve(&model, config.tolerance)?;
    let objective = model.objective_value(&selected);
    let roster = roster::decode(&selected, &pool, &model, config.budget)?;

    let captain = roster
        .captain()
        .map(|c| format!("{} ({})", c.last_name, c.club))
        .unwrap_or_default();
    info!(
        formation = %roster.formation(),
        captain = %captain,
        objective,
        total_cost = roster.total_cost(),
        slack = roster.slack(),
        "Optimized roster"
    );

    Ok(Optimized { roster, objective })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearModel;
    use crate::player::Position;
    use crate::solver::SolveError;
    use crate::variants::VariantId;
    use std::cell::Cell;

    /// Solver stub returning a canned answer and counting calls.
    struct StubSolver {
        answer: Result<Vec<VariantId>, SolveError>,
        calls: Cell<usize>,
    }

    impl Solver for StubSolver {
        fn solve(
            &self,
            _model: &LinearModel,
            _tolerance: f64,
        ) -> Result<Vec<VariantId>, SolveError> {
            self.calls.set(self.calls.get() + 1);
            self.answer.clone()
        }
    }

    fn stub(answer: Result<Vec<VariantId>, SolveError>) -> StubSolver {
        StubSolver {
            answer,
            calls: Cell::new(0),
        }
    }

    fn run(players: &[PlayerRecord], solver: &StubSolver) -> Result<Optimized, SquadError> {
        let config = OptimizerConfig::default();
        optimize(players, &[], &config, &SquadRules::default(), solver)
    }

    fn players() -> Vec<PlayerRecord> {
        vec![PlayerRecord::new("G", "One", "AAA", Position::Keeper, 5.0)
            .with_stat("total_points", 100.0)]
    }

    #[test]
    fn infeasible_solver_verdict_becomes_infeasible_model() {
        let solver = stub(Err(SolveError::Infeasible));
        let err = run(&players(), &solver).unwrap_err();
        assert!(matches!(err, SquadError::InfeasibleModel(_)));
        assert_eq!(solver.calls.get(), 1);
    }

    #[test]
    fn backend_failure_becomes_solver_error() {
        let solver = stub(Err(SolveError::Backend("timed out".into())));
        match run(&players(), &solver).unwrap_err() {
            SquadError::Solver(msg) => assert_eq!(msg, "timed out"),
            other => panic!("expected Solver, got: {other}"),
        }
    }

    #[test]
    fn short_selection_is_malformed() {
        let solver = stub(Ok(vec![VariantId(0)]));
        assert!(matches!(run(&players(), &solver), Err(SquadError::MalformedSolution(_))));
    }

    #[test]
    fn pool_without_scores_is_input_error_and_skips_solver() {
        let solver = stub(Ok(vec![]));
        let unscored = vec![PlayerRecord::new("G", "One", "AAA", Position::Keeper, 5.0)];
        assert!(matches!(run(&unscored, &solver), Err(SquadError::InputData(_))));
        assert_eq!(solver.calls.get(), 0);
    }
}
