use super::Population;

use crate::attributes::AttributeKey;
use crate::genomics::Genome;
use crate::SpeciesId;

use std::collections::BTreeMap;
use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub genome_stats: Vec<(AttributeKey, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for (attribute, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {:?}", attribute, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if it is empty.
    ///
    /// # Examples
    /// ```
    /// use oxigene::populations::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5]).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl IntoIterator<Item = f64>) -> Option<Stats> {
        let mut data: Vec<f64> = data.into_iter().collect();
        if data.is_empty() {
            return None;
        }
        let mid = data.len() / 2;
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;
        let mut median = *data.select_nth_unstable_by(mid, f64::total_cmp).1;
        if data.len() % 2 == 0 {
            median = (median + *data.select_nth_unstable_by(mid - 1, f64::total_cmp).1) / 2.0;
        }
        Some(Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        })
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Species IDs, genomes and stagnation level.
    Species(Vec<(SpeciesId, Vec<Genome>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesId, Genome, usize)>),
    /// Only population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population, with statistics
    /// of every numeric attribute carried by its members.
    ///
    /// # Examples
    /// ```
    /// use oxigene::populations::Population;
    /// use oxigene::populations::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// let population = Population::new(0);
    ///
    /// // Do something with the population...
    /// // Then log a snapshot.
    /// logger.log(&population);
    /// assert_eq!(logger.iter().count(), 1);
    /// ```
    pub fn log(&mut self, population: &Population) {
        let mut values: BTreeMap<AttributeKey, Vec<f64>> = BTreeMap::new();
        for (key, value) in population.genomes().flat_map(Genome::numeric_attributes) {
            values.entry(key).or_default().push(value);
        }
        let genome_stats = values
            .into_iter()
            .filter_map(|(key, data)| Stats::from(data).map(|stats| (key, stats)))
            .collect();
        self.logs.push(Log {
            generation_number: population.age(),
            generation_sample: self.sample(population),
            species_count: population.species_count(),
            genome_stats,
        })
    }

    fn sample(&self, population: &Population) -> GenerationMemberRecord {
        match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                population
                    .all_species()
                    .map(|s| {
                        let members = s
                            .members()
                            .filter_map(|m| population.genome(m))
                            .cloned()
                            .collect();
                        (s.id(), members, s.time_stagnated())
                    })
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .all_species()
                    .filter_map(|s| {
                        s.members()
                            .filter_map(|m| population.genome(m))
                            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
                            .map(|champion| (s.id(), champion.clone(), s.time_stagnated()))
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match population.champion() {
                Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        }
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// use oxigene::populations::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testing::{seeded, xor_factory};

    #[test]
    fn even_length_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(Stats::from(Vec::new()), None);
    }

    #[test]
    fn snapshots_follow_reporting_level() {
        let mut population = xor_factory().create_population(0, &mut seeded(3));
        for genome in population.genomes_mut() {
            let fitness = genome.id() as f64;
            genome.set_fitness(fitness);
        }
        population.refresh_stats();
        let species = population.new_species();
        for id in [1, 4] {
            population.add_to_species(id, species).unwrap();
        }

        let mut champions = EvolutionLogger::new(ReportingLevel::SpeciesChampions);
        champions.log(&population);
        let log = champions.iter().next().unwrap();
        assert_eq!(log.species_count, 1);
        match &log.generation_sample {
            GenerationMemberRecord::SpeciesChampions(sample) => {
                assert_eq!(sample.len(), 1);
                assert_eq!(sample[0].1.id(), 4);
            }
            other => panic!("unexpected sample {:?}", other),
        }
        let fitness = log
            .genome_stats
            .iter()
            .find(|(key, _)| *key == AttributeKey::Fitness)
            .map(|(_, stats)| *stats)
            .unwrap();
        assert_eq!(fitness.maximum, 5.0);
        assert_eq!(fitness.median, 2.5);

        let mut champion = EvolutionLogger::new(ReportingLevel::PopulationChampion);
        champion.log(&population);
        assert!(matches!(
            champion.iter().next().unwrap().generation_sample,
            GenerationMemberRecord::PopulationChampion(ref g) if g.id() == 5
        ));
    }
}
