use super::EvolutionStatus;
use crate::populations::Population;

/// Decides when an evolutionary run stops.
///
/// A run stops as soon as either check is satisfied;
/// both default to `false`.
pub trait TerminationCondition {
    fn satisfied_by_strategy(&mut self, _status: &EvolutionStatus) -> bool {
        false
    }

    fn satisfied_by_population(&mut self, _population: &Population) -> bool {
        false
    }
}

/// Stops after a number of epochs.
#[derive(Clone, Copy, Debug)]
pub struct MaxGenerations(pub usize);

impl TerminationCondition for MaxGenerations {
    fn satisfied_by_strategy(&mut self, status: &EvolutionStatus) -> bool {
        status.generation >= self.0
    }
}

/// Stops once the champion reaches a fitness.
#[derive(Clone, Copy, Debug)]
pub struct FitnessTarget(pub f64);

impl TerminationCondition for FitnessTarget {
    fn satisfied_by_population(&mut self, population: &Population) -> bool {
        population
            .champion()
            .map_or(false, |champion| champion.fitness() >= self.0)
    }
}

/// Stops once a predicate over the population holds.
///
/// # Examples
/// ```
/// use oxigene::evolution::{PopulationPredicate, TerminationCondition};
/// use oxigene::populations::Population;
///
/// let mut empty = PopulationPredicate(|p: &Population| p.is_empty());
/// assert!(empty.satisfied_by_population(&Population::new(0)));
/// ```
pub struct PopulationPredicate<F>(pub F);

impl<F: FnMut(&Population) -> bool> TerminationCondition for PopulationPredicate<F> {
    fn satisfied_by_population(&mut self, population: &Population) -> bool {
        (self.0)(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::EvolutionState;
    use crate::operators::testing::{seeded, xor_factory};

    #[test]
    fn generation_limit() {
        let mut limit = MaxGenerations(3);
        let status = |generation| EvolutionStatus {
            generation,
            state: EvolutionState::Initialized,
        };
        assert!(!limit.satisfied_by_strategy(&status(2)));
        assert!(limit.satisfied_by_strategy(&status(3)));
        assert!(!limit.satisfied_by_population(&Population::new(0)));
    }

    #[test]
    fn fitness_target_uses_champion() {
        let mut population = xor_factory().create_population(0, &mut seeded(0));
        let mut target = FitnessTarget(2.0);
        assert!(!target.satisfied_by_population(&population));

        population.genome_mut(2).unwrap().set_fitness(2.5);
        population.refresh_stats();
        assert!(target.satisfied_by_population(&population));
    }
}
