use crate::genomics::Genome;
use crate::populations::Population;
use crate::GenomeId;

use std::cmp::Ordering;
use std::fmt;

/// Decides which genomes are replaced each generation,
/// by marking them for death.
pub trait SurvivalFilter: fmt::Debug {
    fn mark(&self, population: &mut Population);
}

/// Every genome is replaced every generation.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenerationalReplacement;

impl SurvivalFilter for GenerationalReplacement {
    fn mark(&self, population: &mut Population) {
        for genome in population.genomes_mut() {
            genome.mark_for_death();
        }
    }
}

/// The `count` fittest genomes survive, the rest are replaced.
#[derive(Clone, Copy, Debug)]
pub struct Elitism {
    pub count: usize,
}

impl SurvivalFilter for Elitism {
    fn mark(&self, population: &mut Population) {
        let mut ranked: Vec<&Genome> = population.genomes().collect();
        ranked.sort_by(by_fitness);
        let elite: Vec<GenomeId> = ranked.iter().take(self.count).map(|g| g.id()).collect();
        mark_all_but(population, &elite);
    }
}

/// The top members of every species survive, up to
/// the species' elite size. Genomes without a species
/// are replaced.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeciesElitism;

impl SurvivalFilter for SpeciesElitism {
    fn mark(&self, population: &mut Population) {
        let elite: Vec<GenomeId> = population
            .all_species()
            .flat_map(|species| {
                let mut members: Vec<&Genome> = species
                    .members()
                    .filter_map(|m| population.genome(m))
                    .collect();
                members.sort_by(by_fitness);
                members.truncate(species.elite_size());
                members.into_iter().map(Genome::id)
            })
            .collect();
        mark_all_but(population, &elite);
    }
}

/// Decreasing fitness, ties by increasing id.
fn by_fitness(a: &&Genome, b: &&Genome) -> Ordering {
    b.fitness()
        .total_cmp(&a.fitness())
        .then(a.id().cmp(&b.id()))
}

fn mark_all_but(population: &mut Population, survivors: &[GenomeId]) {
    for genome in population.genomes_mut() {
        if survivors.contains(&genome.id()) {
            genome.spare();
        } else {
            genome.mark_for_death();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testing::{seeded, xor_factory};

    fn population() -> Population {
        let mut population = xor_factory().create_population(0, &mut seeded(1));
        for genome in population.genomes_mut() {
            let fitness = [3.0, 1.0, 5.0, 5.0, 0.0, 2.0][genome.id()];
            genome.set_fitness(fitness);
        }
        population
    }

    fn marked(population: &Population) -> Vec<GenomeId> {
        population
            .genomes()
            .filter(|g| g.is_marked_for_death())
            .map(Genome::id)
            .collect()
    }

    #[test]
    fn generational_replacement_marks_everyone() {
        let mut population = population();
        GenerationalReplacement.mark(&mut population);
        assert_eq!(marked(&population), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn elitism_spares_the_fittest() {
        let mut population = population();
        GenerationalReplacement.mark(&mut population);
        Elitism { count: 3 }.mark(&mut population);
        assert_eq!(marked(&population), vec![1, 4, 5]);
    }

    #[test]
    fn species_elitism_spares_species_elite() {
        let mut population = population();
        let a = population.new_species();
        let b = population.new_species();
        for id in [0, 1, 2] {
            population.add_to_species(id, a).unwrap();
        }
        for id in [3, 4] {
            population.add_to_species(id, b).unwrap();
        }
        population.species_mut(a).unwrap().set_elite_size(2);
        population.species_mut(b).unwrap().set_elite_size(1);

        SpeciesElitism.mark(&mut population);
        assert_eq!(marked(&population), vec![1, 4, 5]);
    }
}
