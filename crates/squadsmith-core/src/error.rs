// Error kinds shared by the optimization pipeline and the similarity engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::solver::SolveError;
use crate::table::TableError;

#[derive(Debug, Error)]
pub enum SquadError {
    /// Malformed adjustments file, unparseable roster or player file, bad
    /// rarity values. Aborts the current operation only.
    #[error("input data error: {0}")]
    InputData(String),

    /// The constraint set cannot be jointly satisfied (e.g. budget too low
    /// for the minimum quotas).
    #[error("no roster satisfies the constraints: {0}")]
    InfeasibleModel(String),

    /// The solver returned a selection that is inconsistent with the model.
    /// Indicates a modeling bug; never silently corrected.
    #[error("malformed solution: {0}")]
    MalformedSolution(String),

    /// A roster with zero matched weight; similarity is undefined.
    #[error("similarity undefined: {0}")]
    DegenerateSimilarity(String),

    /// The solving backend failed or gave up without a verdict.
    #[error("solver failure: {0}")]
    Solver(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SquadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SquadError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<SolveError> for SquadError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::Infeasible => {
                SquadError::InfeasibleModel("the solver reported the model infeasible".into())
            }
            SolveError::Backend(message) => SquadError::Solver(message),
        }
    }
}

impl From<TableError> for SquadError {
    fn from(err: TableError) -> Self {
        SquadError::InputData(err.to_string())
    }
}
