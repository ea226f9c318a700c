use crate::attributes::AttributeKey;
use crate::genomics::GeneMapError;
use crate::{GenomeId, SpeciesId};

use thiserror::Error;

/// An invalid population operation, or a
/// broken population invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopulationError {
    #[error("genome stored under id {key} reports id {actual}")]
    IdMismatch { key: GenomeId, actual: GenomeId },
    #[error("cached {attribute} extreme refers to genome {genome}, which is not a member")]
    StaleExtreme {
        attribute: AttributeKey,
        genome: GenomeId,
    },
    #[error("no genome with id {0} in population")]
    UnknownGenome(GenomeId),
    #[error("genome with id {0} is already in population")]
    DuplicateGenome(GenomeId),
    #[error("no species with id {0} in population")]
    UnknownSpecies(SpeciesId),
    #[error("genome {genome} and species {species} disagree on membership")]
    MembershipMismatch {
        genome: GenomeId,
        species: SpeciesId,
    },
    #[error("genome {genome} is malformed: {error}")]
    Genome {
        genome: GenomeId,
        #[source]
        error: GeneMapError,
    },
}
