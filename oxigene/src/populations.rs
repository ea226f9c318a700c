//! A Population is a collection of genomes, ordered by id,
//! with running statistics over their numeric attributes.
//! Genomes are grouped into species, which a [`Speciation`]
//! strategy maintains between generations.
mod config;
mod errors;
pub mod logging;
mod speciation;
mod species;
mod stats;

pub use config::PopulationConfig;
pub use errors::PopulationError;
pub use speciation::{compatibility_distance, Speciation, ThresholdSpeciation};
pub use species::Species;
pub use stats::{AttributeStats, Record, Records};

use crate::attributes::{AttributeKey, Attributes};
use crate::genomics::Genome;
use crate::{GenomeId, PopulationId, SpeciesId};

use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};

/// A population of genomes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Population {
    id: PopulationId,
    age: usize,
    genomes: BTreeMap<GenomeId, Genome>,
    stats: BTreeMap<AttributeKey, AttributeStats>,
    records: BTreeMap<AttributeKey, Records>,
    species: BTreeMap<SpeciesId, Species>,
    next_species_id: SpeciesId,
    dead_species: BTreeSet<SpeciesId>,
    attributes: Attributes,
}

impl Population {
    /// Creates an empty population.
    pub fn new(id: PopulationId) -> Population {
        Population {
            id,
            ..Population::default()
        }
    }

    /// Creates a population from genomes with distinct ids.
    pub(crate) fn from_genomes(id: PopulationId, genomes: Vec<Genome>) -> Population {
        Population {
            id,
            genomes: genomes.into_iter().map(|g| (g.id(), g)).collect(),
            ..Population::default()
        }
    }

    pub fn id(&self) -> PopulationId {
        self.id
    }

    /// Number of generations the population has lived through.
    pub fn age(&self) -> usize {
        self.age
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    pub fn genome(&self, id: GenomeId) -> Option<&Genome> {
        self.genomes.get(&id)
    }

    /// Gives access to a member's evolutionary attributes.
    pub fn genome_mut(&mut self, id: GenomeId) -> Option<&mut Genome> {
        self.genomes.get_mut(&id)
    }

    /// Iterates over members in increasing id order.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.values()
    }

    pub fn genomes_mut(&mut self) -> impl Iterator<Item = &mut Genome> {
        self.genomes.values_mut()
    }

    pub fn genome_ids(&self) -> impl Iterator<Item = GenomeId> + '_ {
        self.genomes.keys().copied()
    }

    /// The smallest id greater than every member's id.
    pub fn next_genome_id(&self) -> GenomeId {
        self.genomes.keys().next_back().map_or(0, |id| id + 1)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Adds a genome to the population. The genome
    /// starts out without a species.
    ///
    /// # Errors
    /// Returns an error if a member already has the same id.
    pub fn add_genome(&mut self, mut genome: Genome) -> Result<(), PopulationError> {
        if self.genomes.contains_key(&genome.id()) {
            return Err(PopulationError::DuplicateGenome(genome.id()));
        }
        genome.set_species(None);
        self.genomes.insert(genome.id(), genome);
        Ok(())
    }

    /// Removes a genome, and its species membership.
    ///
    /// # Errors
    /// Returns an error if no member has the id.
    pub fn remove_genome(&mut self, id: GenomeId) -> Result<Genome, PopulationError> {
        let genome = self
            .genomes
            .remove(&id)
            .ok_or(PopulationError::UnknownGenome(id))?;
        if let Some(species) = genome.species().and_then(|s| self.species.get_mut(&s)) {
            species.members.remove(&id);
        }
        Ok(genome)
    }

    /// Removes every genome marked for death, returning them.
    pub fn remove_dead_genomes(&mut self) -> Vec<Genome> {
        let dead: Vec<GenomeId> = self
            .genomes
            .values()
            .filter(|g| g.is_marked_for_death())
            .map(Genome::id)
            .collect();
        dead.into_iter()
            .filter_map(|id| self.remove_genome(id).ok())
            .collect()
    }

    /// Ages the population and every member by one generation.
    pub fn increment_age(&mut self) {
        self.age += 1;
        for genome in self.genomes.values_mut() {
            genome.increment_age();
        }
    }

    /// Recomputes the statistics of every numeric attribute
    /// carried by any member, and updates the all-time records.
    ///
    /// # Examples
    /// ```
    /// use oxigene::attributes::AttributeKey;
    /// use oxigene::genomics::{GeneticConfig, GeneticsFactory};
    /// use oxigene::History;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     population_size: NonZeroUsize::new(3).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut factory = GeneticsFactory::new(config, History::new()).unwrap();
    /// let mut population = factory.create_population(0, &mut rand::thread_rng());
    /// for (fitness, genome) in population.genomes_mut().enumerate() {
    ///     genome.set_fitness(fitness as f64);
    /// }
    /// population.refresh_stats();
    ///
    /// assert_eq!(population.highest(&AttributeKey::Fitness).unwrap().id(), 2);
    /// assert_eq!(population.lowest(&AttributeKey::Fitness).unwrap().id(), 0);
    /// assert_eq!(population.average(&AttributeKey::Fitness), Some(1.0));
    /// ```
    pub fn refresh_stats(&mut self) {
        let mut values: BTreeMap<AttributeKey, Vec<(GenomeId, f64)>> = BTreeMap::new();
        for genome in self.genomes.values() {
            for (key, value) in genome.numeric_attributes() {
                values.entry(key).or_default().push((genome.id(), value));
            }
        }

        self.stats.clear();
        for (key, values) in values {
            let stats = match AttributeStats::from_values(values) {
                Some(stats) => stats,
                None => continue,
            };
            let record = |id: GenomeId, value: f64| {
                self.genomes.get(&id).map(|genome| Record {
                    value,
                    genome: genome.clone(),
                })
            };
            if let (Some(highest), Some(lowest)) = (
                record(stats.highest, stats.highest_value),
                record(stats.lowest, stats.lowest_value),
            ) {
                match self.records.get_mut(&key) {
                    Some(records) => records.update(highest, lowest),
                    None => {
                        self.records.insert(key.clone(), Records::new(highest, lowest));
                    }
                }
            }
            self.stats.insert(key, stats);
        }
    }

    /// Statistics of the attribute as of the last refresh.
    pub fn stats(&self, key: &AttributeKey) -> Option<&AttributeStats> {
        self.stats.get(key)
    }

    /// Every attribute with statistics as of the last refresh.
    pub fn tracked_attributes(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeStats)> {
        self.stats.iter()
    }

    /// The member with the highest value of the attribute, as of
    /// the last refresh. `None` if it has since been removed.
    pub fn highest(&self, key: &AttributeKey) -> Option<&Genome> {
        self.stats.get(key).and_then(|s| self.genomes.get(&s.highest))
    }

    /// The member with the lowest value of the attribute, as of
    /// the last refresh. `None` if it has since been removed.
    pub fn lowest(&self, key: &AttributeKey) -> Option<&Genome> {
        self.stats.get(key).and_then(|s| self.genomes.get(&s.lowest))
    }

    pub fn average(&self, key: &AttributeKey) -> Option<f64> {
        self.stats.get(key).map(|s| s.average)
    }

    /// The genome with the highest value the attribute ever took.
    pub fn highest_ever(&self, key: &AttributeKey) -> Option<&Record> {
        self.records.get(key).map(|r| &r.highest_ever)
    }

    /// The genome with the lowest value the attribute ever took.
    pub fn lowest_ever(&self, key: &AttributeKey) -> Option<&Record> {
        self.records.get(key).map(|r| &r.lowest_ever)
    }

    /// The fittest member, as of the last refresh.
    pub fn champion(&self) -> Option<&Genome> {
        self.highest(&AttributeKey::Fitness)
    }

    /// Allocates a new, empty species and returns its id.
    pub fn new_species(&mut self) -> SpeciesId {
        let id = self.next_species_id;
        self.next_species_id += 1;
        self.species.insert(id, Species::new(id));
        log::debug!("population {}: created species {}", self.id, id);
        id
    }

    /// Moves a member into a species, out of any previous one.
    ///
    /// # Errors
    /// Returns an error if either the genome or the species is unknown.
    pub fn add_to_species(
        &mut self,
        genome: GenomeId,
        species: SpeciesId,
    ) -> Result<(), PopulationError> {
        if !self.species.contains_key(&species) {
            return Err(PopulationError::UnknownSpecies(species));
        }
        let member = self
            .genomes
            .get_mut(&genome)
            .ok_or(PopulationError::UnknownGenome(genome))?;
        if let Some(previous) = member.species().and_then(|s| self.species.get_mut(&s)) {
            previous.members.remove(&genome);
        }
        member.set_species(Some(species));
        if let Some(target) = self.species.get_mut(&species) {
            target.members.insert(genome);
        }
        Ok(())
    }

    pub fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    pub fn species_mut(&mut self, id: SpeciesId) -> Option<&mut Species> {
        self.species.get_mut(&id)
    }

    /// Iterates over species in increasing id order.
    pub fn all_species(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Removes a species along with all of its members.
    ///
    /// # Errors
    /// Returns an error if the species is unknown.
    pub fn remove_species(&mut self, id: SpeciesId) -> Result<Vec<Genome>, PopulationError> {
        let species = self
            .species
            .remove(&id)
            .ok_or(PopulationError::UnknownSpecies(id))?;
        self.dead_species.remove(&id);
        log::debug!(
            "population {}: removed species {} with {} members",
            self.id,
            id,
            species.len()
        );
        Ok(species
            .members
            .iter()
            .filter_map(|genome| self.genomes.remove(genome))
            .collect())
    }

    /// Flags a species for removal at the next purge.
    ///
    /// # Errors
    /// Returns an error if the species is unknown.
    pub fn mark_species_dead(&mut self, id: SpeciesId) -> Result<(), PopulationError> {
        if !self.species.contains_key(&id) {
            return Err(PopulationError::UnknownSpecies(id));
        }
        self.dead_species.insert(id);
        Ok(())
    }

    pub fn is_species_marked_dead(&self, id: SpeciesId) -> bool {
        self.dead_species.contains(&id)
    }

    /// Removes every species marked for removal, with their
    /// members. Returns the removed genomes.
    pub fn remove_dead_species(&mut self) -> Vec<Genome> {
        let dead = std::mem::take(&mut self.dead_species);
        dead.into_iter()
            .filter_map(|id| self.remove_species(id).ok())
            .flatten()
            .collect()
    }

    /// Checks that members are stored under their own ids, that
    /// cached extremes are current members, that species membership
    /// agrees with each genome's species id, and that every genome
    /// is structurally sound.
    pub fn validate(&self) -> Result<(), PopulationError> {
        for (key, genome) in &self.genomes {
            if *key != genome.id() {
                return Err(PopulationError::IdMismatch {
                    key: *key,
                    actual: genome.id(),
                });
            }
            genome.validate().map_err(|error| PopulationError::Genome {
                genome: *key,
                error,
            })?;
            if let Some(species) = genome.species() {
                let member = self
                    .species
                    .get(&species)
                    .map_or(false, |s| s.contains(*key));
                if !member {
                    return Err(PopulationError::MembershipMismatch {
                        genome: *key,
                        species,
                    });
                }
            }
        }
        for (key, stats) in &self.stats {
            for genome in [stats.highest, stats.lowest] {
                if !self.genomes.contains_key(&genome) {
                    return Err(PopulationError::StaleExtreme {
                        attribute: key.clone(),
                        genome,
                    });
                }
            }
        }
        for species in self.species.values() {
            for genome in species.members() {
                let agrees = self
                    .genomes
                    .get(&genome)
                    .map_or(false, |g| g.species() == Some(species.id()));
                if !agrees {
                    return Err(PopulationError::MembershipMismatch {
                        genome,
                        species: species.id(),
                    });
                }
            }
        }
        Ok(())
    }
}
