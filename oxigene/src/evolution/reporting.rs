use super::EvolutionStatus;
use crate::attributes::AttributeKey;
use crate::populations::logging::EvolutionLogger;
use crate::populations::Population;

/// Observes the population at the end of initialization
/// and of every epoch.
pub trait Reporter {
    fn report(&mut self, status: &EvolutionStatus, population: &Population);
}

/// Reports generation summaries through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, status: &EvolutionStatus, population: &Population) {
        let stats = population.stats(&AttributeKey::Fitness);
        log::info!(
            "generation {}: {} genomes, {} species, best fitness {:.4}, mean fitness {:.4}",
            status.generation,
            population.len(),
            population.species_count(),
            stats.map_or(f64::NAN, |s| s.highest_value),
            stats.map_or(f64::NAN, |s| s.average),
        );
    }
}

impl Reporter for EvolutionLogger {
    fn report(&mut self, _status: &EvolutionStatus, population: &Population) {
        self.log(population);
    }
}
