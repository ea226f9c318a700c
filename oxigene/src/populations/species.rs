use crate::{GenomeId, SpeciesId};

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;

/// Species are groups of genomes similar enough to
/// compete mostly among themselves.
///
/// Membership is owned by the [`Population`], which keeps
/// it in sync with each genome's species id. The sizes and
/// progress counters are maintained by a [`Speciation`] strategy.
///
/// [`Population`]: super::Population
/// [`Speciation`]: super::Speciation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesId,
    pub(super) members: BTreeSet<GenomeId>,
    target_size: usize,
    elite_size: usize,
    best_fitness: f64,
    stagnation: usize,
}

impl Species {
    pub(super) fn new(id: SpeciesId) -> Species {
        Species {
            id,
            members: BTreeSet::new(),
            target_size: 0,
            elite_size: 0,
            best_fitness: f64::NEG_INFINITY,
            stagnation: 0,
        }
    }

    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Member genome ids, in increasing order.
    pub fn members(&self) -> impl Iterator<Item = GenomeId> + '_ {
        self.members.iter().copied()
    }

    pub fn contains(&self, genome: GenomeId) -> bool {
        self.members.contains(&genome)
    }

    /// The member used to decide whether other genomes
    /// belong to the species (its oldest member).
    pub fn representative(&self) -> Option<GenomeId> {
        self.members.iter().next().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of genomes the species should hold next generation.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn set_target_size(&mut self, size: usize) {
        self.target_size = size;
    }

    /// Number of top members exempt from replacement.
    pub fn elite_size(&self) -> usize {
        self.elite_size
    }

    pub fn set_elite_size(&mut self, size: usize) {
        self.elite_size = size;
    }

    /// Highest member fitness ever recorded.
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Generations since the species last improved.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Records the current best fitness of the species' members,
    /// resetting or increasing stagnation. Returns `true` if the
    /// species improved.
    ///
    /// # Examples
    /// ```
    /// use oxigene::populations::Population;
    ///
    /// let mut population = Population::new(0);
    /// let id = population.new_species();
    /// let species = population.species_mut(id).unwrap();
    ///
    /// assert!(species.record_progress(1.0));
    /// assert!(!species.record_progress(0.5));
    /// assert_eq!(species.time_stagnated(), 1);
    /// assert_eq!(species.best_fitness(), 1.0);
    /// ```
    pub fn record_progress(&mut self, best_fitness: f64) -> bool {
        if best_fitness > self.best_fitness {
            self.best_fitness = best_fitness;
            self.stagnation = 0;
            true
        } else {
            self.stagnation += 1;
            false
        }
    }
}
