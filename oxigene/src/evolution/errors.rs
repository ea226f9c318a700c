use super::EvolutionState;
use crate::genomics::{ConfigError, GeneMapError};
use crate::populations::PopulationError;

use thiserror::Error;

use std::error::Error;

/// The error type returned by fitness evaluation.
pub type EvaluationError = Box<dyn Error + Send + Sync>;

/// A failure that aborts an evolutionary run.
#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error("operator broke a genome invariant: {0}")]
    Invariant(#[from] GeneMapError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("population evaluation failed: {0}")]
    Evaluation(#[source] EvaluationError),
    #[error("no child produced after {attempts} consecutive attempts")]
    ReproductionStalled { attempts: usize },
    #[error("cannot reproduce from an empty population")]
    EmptyPopulation,
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: EvolutionState,
    },
}
