//! Operators derive child genomes from one parent (mutation)
//! or two (crossover). Parents are never modified: every
//! operator builds the child from copies of the parents' genes,
//! or fails with [`NoChildProduced`] if its input admits no
//! legal child.
mod add_link;
mod add_node;
mod adjust_attributes;
mod crossover;
mod remove_link;
mod selecter;

pub use add_link::AddLink;
pub use add_node::AddNode;
pub use adjust_attributes::AdjustAttributes;
pub use crossover::StandardCrossover;
pub use remove_link::RemoveLink;
pub use selecter::{OperatorSelecter, Selection};

use crate::genomics::{GeneMapError, GeneticsFactory, Genome};
use crate::{GenomeId, History};

use rand::RngCore;
use thiserror::Error;

use std::fmt;

/// Why an operator could not derive a child from its input.
/// Recoverable: reproduction retries with another operator
/// or other parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoChildProduced {
    #[error("no node can be the target of a new link")]
    NoEligibleTargets,
    #[error("every eligible node pair is already connected")]
    FullyConnected,
    #[error("the parent genome has no links")]
    NoLinks,
    #[error("no field value was changed")]
    NothingAdjusted,
}

/// Failure of a mutation or crossover operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    #[error(transparent)]
    NoChildProduced(#[from] NoChildProduced),
    /// The operator produced a structurally invalid genome.
    /// This is a defect and should abort the run.
    #[error("operator broke a genome invariant: {0}")]
    Invariant(#[from] GeneMapError),
}

/// An operator deriving a child genome from a single parent.
///
/// Operators are stored as trait objects by the
/// reproduction strategy, so the random source is
/// passed as `dyn RngCore`.
pub trait MutationOperator<I = History>: fmt::Debug {
    /// Short name recorded on every child the operator produces.
    fn label(&self) -> &str;

    /// Derives a child with id `child_id` from `parent`.
    ///
    /// # Errors
    /// Returns [`OperatorError::NoChildProduced`] if no legal
    /// mutation of `parent` exists.
    fn mutate(
        &self,
        child_id: GenomeId,
        parent: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError>;
}

/// An operator deriving a child genome from two parents.
pub trait CrossoverOperator<I = History>: fmt::Debug {
    /// Short name recorded on every child the operator produces.
    fn label(&self) -> &str;

    /// Derives a child with id `child_id` by recombining
    /// `first` and `second`.
    fn crossover(
        &self,
        child_id: GenomeId,
        first: &Genome,
        second: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::genomics::{
        FieldRange, FieldSpec, GeneticConfig, GeneticsFactory, Genome, NodeKind, WEIGHT,
    };
    use crate::History;

    use rand::rngs::StdRng;

    use std::num::NonZeroUsize;

    /// A factory for genomes with one bias, two inputs and one output,
    /// fully connected, with random weights in [-1, 1].
    pub(crate) fn xor_factory() -> GeneticsFactory {
        let mut config = GeneticConfig {
            population_size: NonZeroUsize::new(6).unwrap(),
            bias_count: 1,
            input_count: 2,
            output_count: NonZeroUsize::new(1).unwrap(),
            initial_connection_probability: 1.0,
            ..GeneticConfig::zero()
        };
        config.link_fields.insert(
            WEIGHT,
            FieldSpec::Float {
                initial: FieldRange::new(-1.0, 1.0),
                lifetime: FieldRange::new(-4.0, 4.0),
                mutation_power: 0.5,
            },
        );
        GeneticsFactory::new(config, History::new()).unwrap()
    }

    pub(crate) fn hidden_count(genome: &Genome) -> usize {
        genome.data().nodes_of_kind(NodeKind::Hidden).count()
    }

    pub(crate) fn seeded(seed: u64) -> StdRng {
        rand::SeedableRng::seed_from_u64(seed)
    }
}
