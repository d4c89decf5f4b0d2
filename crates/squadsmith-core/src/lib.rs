// Library root: fantasy squad selection and roster comparison.
//
// Pipeline: players (+ injury adjustments) -> variants -> linear model ->
// solver -> roster. Separately, `similarity` compares two saved rosters.

pub mod adjustments;
pub mod config;
pub mod error;
pub mod matching;
pub mod model;
pub mod optimize;
pub mod player;
pub mod roster;
pub mod similarity;
pub mod solver;
pub mod table;
pub mod variants;

pub use error::SquadError;
