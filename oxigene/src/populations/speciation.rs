use super::{Population, PopulationConfig, PopulationError};
use crate::genomics::{ConfigError, GeneMap};
use crate::SpeciesId;

use std::cmp::Ordering;
use std::num::NonZeroUsize;

/// Compatibility distance between two genomes:
/// `excess · E + disjoint · D + weight · W`, where E and D
/// count the excess and disjoint links (by innovation), and
/// W is the mean absolute weight difference of matching links.
///
/// # Examples
/// ```
/// use oxigene::genomics::{GeneticConfig, GeneticsFactory};
/// use oxigene::populations::compatibility_distance;
/// use oxigene::{History, PopulationConfig};
///
/// let config = PopulationConfig {
///     excess_coefficient: 1.0,
///     disjoint_coefficient: 1.0,
///     weight_coefficient: 0.4,
///     ..PopulationConfig::zero()
/// };
/// let mut factory = GeneticsFactory::new(GeneticConfig::zero(), History::new()).unwrap();
/// let genome = factory.create_genome(0, &mut rand::thread_rng());
///
/// assert_eq!(compatibility_distance(genome.data(), genome.data(), &config), 0.0);
/// ```
pub fn compatibility_distance(first: &GeneMap, second: &GeneMap, config: &PopulationConfig) -> f64 {
    let a = first.links_by_innovation();
    let b = second.links_by_innovation();
    let (mut i, mut j) = (0, 0);
    let (mut disjoint, mut matching, mut weight_diff) = (0usize, 0usize, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].innovation().cmp(&b[j].innovation()) {
            Ordering::Less => {
                disjoint += 1;
                i += 1;
            }
            Ordering::Greater => {
                disjoint += 1;
                j += 1;
            }
            Ordering::Equal => {
                let (wa, wb) = (a[i].weight().unwrap_or(0.0), b[j].weight().unwrap_or(0.0));
                weight_diff += (wa - wb).abs();
                matching += 1;
                i += 1;
                j += 1;
            }
        }
    }
    let excess = (a.len() - i) + (b.len() - j);
    let mean_weight_diff = if matching > 0 {
        weight_diff / matching as f64
    } else {
        0.0
    };
    config.excess_coefficient * excess as f64
        + config.disjoint_coefficient * disjoint as f64
        + config.weight_coefficient * mean_weight_diff
}

/// A strategy for grouping a population's genomes into species
/// and keeping per-species sizes up to date. Run once per
/// generation, after evaluation.
pub trait Speciation {
    /// Assigns unassigned genomes to species and
    /// updates species bookkeeping.
    fn speciate(&mut self, population: &mut Population) -> Result<(), PopulationError>;
}

/// Threshold-based speciation.
///
/// A genome joins the first species whose representative is
/// closer than the compatibility threshold, or founds a new
/// species. Species that are empty, or have not improved for
/// `species_dropoff_age` generations, are removed along with their
/// members; the champion's species is always kept. The threshold
/// is moved to keep the species count in the configured range.
#[derive(Clone, Debug)]
pub struct ThresholdSpeciation {
    config: PopulationConfig,
    population_size: NonZeroUsize,
    threshold: f64,
}

impl ThresholdSpeciation {
    /// Creates a strategy sharing out `population_size`
    /// genomes among species.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: PopulationConfig,
        population_size: NonZeroUsize,
    ) -> Result<ThresholdSpeciation, ConfigError> {
        config.validate()?;
        Ok(ThresholdSpeciation {
            threshold: config.compatibility_threshold,
            config,
            population_size,
        })
    }

    /// The current compatibility threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn assign_species(&self, population: &mut Population) -> Result<(), PopulationError> {
        let unassigned: Vec<_> = population
            .genomes()
            .filter(|g| g.species().is_none())
            .map(|g| g.id())
            .collect();
        for genome in unassigned {
            let data = match population.genome(genome) {
                Some(g) => g.data(),
                None => continue,
            };
            let compatible = population
                .all_species()
                .filter(|s| !population.is_species_marked_dead(s.id()))
                .find(|s| {
                    s.representative()
                        .and_then(|r| population.genome(r))
                        .map_or(false, |r| {
                            compatibility_distance(r.data(), data, &self.config) < self.threshold
                        })
                })
                .map(|s| s.id());
            let species = match compatible {
                Some(species) => species,
                None => population.new_species(),
            };
            population.add_to_species(genome, species)?;
        }
        Ok(())
    }

    fn retire_species(&self, population: &mut Population) -> Result<(), PopulationError> {
        let champion_species = population.champion().and_then(|c| c.species());
        let ids: Vec<SpeciesId> = population.all_species().map(|s| s.id()).collect();
        for id in ids {
            let best = population.species(id).and_then(|s| {
                s.members()
                    .filter_map(|m| population.genome(m))
                    .map(|g| g.fitness())
                    .reduce(f64::max)
            });
            let species = population
                .species_mut(id)
                .ok_or(PopulationError::UnknownSpecies(id))?;
            let stagnated = match best {
                Some(best) => {
                    species.record_progress(best);
                    self.config.species_dropoff_age > 0
                        && species.time_stagnated() >= self.config.species_dropoff_age
                }
                None => true,
            };
            if stagnated && Some(id) != champion_species {
                population.mark_species_dead(id)?;
            }
        }
        if !population.remove_dead_species().is_empty() {
            population.refresh_stats();
        }
        Ok(())
    }

    fn share_offspring(&self, population: &mut Population) {
        let mean_fitness: Vec<(SpeciesId, usize, f64)> = population
            .all_species()
            .map(|s| {
                let fitness: f64 = s
                    .members()
                    .filter_map(|m| population.genome(m))
                    .map(|g| g.fitness().max(0.0))
                    .sum();
                (s.id(), s.len(), fitness / s.len().max(1) as f64)
            })
            .collect();
        let total: f64 = mean_fitness.iter().map(|(_, _, f)| f).sum();
        let size = self.population_size.get() as f64;
        let shares: Vec<f64> = if total > 0.0 {
            mean_fitness.iter().map(|(_, _, f)| f / total * size).collect()
        } else {
            vec![size / mean_fitness.len().max(1) as f64; mean_fitness.len()]
        };
        for ((id, members, _), target) in mean_fitness.iter().zip(round_retain_sum(&shares)) {
            if let Some(species) = population.species_mut(*id) {
                species.set_target_size(target);
                species.set_elite_size((self.config.elite_proportion * *members as f64).floor() as usize);
            }
        }
    }

    fn adjust_threshold(&mut self, species_count: usize) {
        if self.config.target_species_max == 0 {
            return;
        }
        if species_count < self.config.target_species_min {
            self.threshold = (self.threshold - self.config.threshold_adjustment)
                .max(self.config.threshold_adjustment);
        } else if species_count > self.config.target_species_max {
            self.threshold += self.config.threshold_adjustment;
        }
    }
}

impl Speciation for ThresholdSpeciation {
    fn speciate(&mut self, population: &mut Population) -> Result<(), PopulationError> {
        self.assign_species(population)?;
        self.retire_species(population)?;
        self.share_offspring(population);
        self.adjust_threshold(population.species_count());
        log::debug!(
            "population {}: {} species, compatibility threshold {:.3}",
            population.id(),
            population.species_count(),
            self.threshold
        );
        Ok(())
    }
}

/// Rounds shares to integers that add up to the rounded total.
/// Leftover units go to the largest fractional parts, earlier
/// shares first on ties.
fn round_retain_sum(shares: &[f64]) -> Vec<usize> {
    let total = shares.iter().sum::<f64>().round() as usize;
    let mut rounded: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let assigned: usize = rounded.iter().sum();

    let fraction = |i: usize| shares[i] - shares[i].floor();
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| fraction(b).total_cmp(&fraction(a)).then(a.cmp(&b)));
    for &i in order.iter().take(total.saturating_sub(assigned)) {
        rounded[i] += 1;
    }
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Genome;
    use crate::operators::testing::{seeded, xor_factory};
    use crate::operators::{AddNode, MutationOperator};

    fn config() -> PopulationConfig {
        PopulationConfig {
            compatibility_threshold: 1.5,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
            species_dropoff_age: 3,
            elite_proportion: 0.5,
            ..PopulationConfig::zero()
        }
    }

    fn speciation() -> ThresholdSpeciation {
        ThresholdSpeciation::new(config(), NonZeroUsize::new(6).unwrap()).unwrap()
    }

    #[test]
    fn offspring_shares_keep_their_total() {
        assert_eq!(round_retain_sum(&[2.5, 1.25, 3.75, 0.5]), vec![3, 1, 4, 0]);
        assert_eq!(round_retain_sum(&[4.0, 0.0, 2.0]), vec![4, 0, 2]);
        let thirds = [1.0 / 3.0; 3];
        assert_eq!(round_retain_sum(&thirds), vec![1, 0, 0]);
        assert!(round_retain_sum(&[]).is_empty());
    }

    #[test]
    fn distance_counts_structural_differences() {
        let mut rng = seeded(5);
        let mut factory = xor_factory();
        let base = factory.create_genome(0, &mut rng);
        let split = AddNode.mutate(1, &base, &mut factory, &mut rng).unwrap();
        let config = PopulationConfig {
            weight_coefficient: 0.0,
            ..config()
        };
        // One link of the base is disjoint, the two new links are excess.
        assert_eq!(compatibility_distance(base.data(), split.data(), &config), 3.0);
        assert_eq!(compatibility_distance(split.data(), base.data(), &config), 3.0);
    }

    #[test]
    fn similar_genomes_share_a_species() {
        let mut rng = seeded(0);
        let mut population = xor_factory().create_population(0, &mut rng);
        population.refresh_stats();
        let mut speciation = speciation();
        speciation.speciate(&mut population).unwrap();

        // Identical structure, weights in [-1, 1]: distance at most 0.8.
        assert_eq!(population.species_count(), 1);
        assert!(population.genomes().all(|g| g.species() == Some(0)));
        let species = population.species(0).unwrap();
        assert_eq!(species.target_size(), 6);
        assert_eq!(species.elite_size(), 3);
        population.validate().unwrap();
    }

    #[test]
    fn distant_genomes_found_new_species() {
        let mut rng = seeded(0);
        let mut factory = xor_factory();
        let mut population = factory.create_population(0, &mut rng);
        let mut grown: Genome = population.genome(0).unwrap().clone();
        for id in 10..13 {
            grown = AddNode.mutate(id, &grown, &mut factory, &mut rng).unwrap();
        }
        population.add_genome(grown).unwrap();
        population.refresh_stats();
        speciation().speciate(&mut population).unwrap();

        assert_eq!(population.species_count(), 2);
        assert_eq!(population.genome(12).unwrap().species(), Some(1));
        population.validate().unwrap();
    }

    #[test]
    fn stagnant_species_are_removed_but_not_the_champions() {
        let mut rng = seeded(0);
        let mut factory = xor_factory();
        let mut population = factory.create_population(0, &mut rng);
        let mut grown: Genome = population.genome(0).unwrap().clone();
        for id in 10..13 {
            grown = AddNode.mutate(id, &grown, &mut factory, &mut rng).unwrap();
        }
        grown.set_fitness(5.0);
        population.add_genome(grown).unwrap();
        for genome in population.genomes_mut() {
            if genome.id() != 12 {
                genome.set_fitness(1.0);
            }
        }
        population.refresh_stats();

        let mut speciation = speciation();
        for _ in 0..4 {
            speciation.speciate(&mut population).unwrap();
        }
        // The large species never improved after its first
        // generation; the champion's species is protected.
        assert_eq!(population.species_count(), 1);
        assert_eq!(population.genome_ids().collect::<Vec<_>>(), vec![12]);
        population.validate().unwrap();
    }

    #[test]
    fn threshold_follows_species_count() {
        let config = PopulationConfig {
            target_species_min: 2,
            target_species_max: 4,
            threshold_adjustment: 0.25,
            ..config()
        };
        let mut speciation =
            ThresholdSpeciation::new(config, NonZeroUsize::new(6).unwrap()).unwrap();
        speciation.adjust_threshold(1);
        assert_eq!(speciation.threshold(), 1.25);
        speciation.adjust_threshold(5);
        assert_eq!(speciation.threshold(), 1.5);
        speciation.adjust_threshold(3);
        assert_eq!(speciation.threshold(), 1.5);
    }
}
