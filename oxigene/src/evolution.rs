//! The generation loop.
//!
//! An [`EvolutionStrategy`] drives a [`Population`] through
//! repeated epochs: survival marking, reproduction, replacement,
//! evaluation and speciation. The pieces an experiment provides
//! (evaluation, termination, reporting) are traits defined here.
mod errors;
mod evaluation;
mod reporting;
mod reproduction;
mod survival;
mod termination;

pub use errors::{EvaluationError, EvolutionError};
pub use evaluation::{EvaluationStrategy, FitnessFunction, GenomeDecoder};
pub use reporting::{LogReporter, Reporter};
pub use reproduction::{Crossovers, Mutations, ReproductionStrategy, StandardReproduction};
pub use survival::{Elitism, GenerationalReplacement, SpeciesElitism, SurvivalFilter};
pub use termination::{FitnessTarget, MaxGenerations, PopulationPredicate, TerminationCondition};

use crate::genomics::GeneticsFactory;
use crate::populations::{Population, Speciation};
use crate::{History, InnovationService, PopulationId};

use rand::rngs::StdRng;
use rand::RngCore;

use std::fmt;

/// Lifecycle of an [`EvolutionStrategy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolutionState {
    Uninitialized,
    Initialized,
    Terminated,
}

impl fmt::Display for EvolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionState::Uninitialized => write!(f, "uninitialized"),
            EvolutionState::Initialized => write!(f, "initialized"),
            EvolutionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// The progress of a run, as seen by termination
/// conditions and reporters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvolutionStatus {
    /// Number of epochs completed.
    pub generation: usize,
    pub state: EvolutionState,
}

/// Drives a population through generations.
///
/// # Examples
/// ```
/// use oxigene::evolution::{
///     EvolutionStrategy, FitnessFunction, MaxGenerations, StandardReproduction,
/// };
/// use oxigene::genomics::{GeneticConfig, GeneticsFactory};
/// use oxigene::{History, PopulationConfig};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use std::num::NonZeroUsize;
///
/// let genetic_config = GeneticConfig {
///     population_size: NonZeroUsize::new(10).unwrap(),
///     input_count: 2,
///     initial_connection_probability: 1.0,
///     ..GeneticConfig::zero()
/// };
/// let population_config = PopulationConfig {
///     mutation_probability: 0.8,
///     ..PopulationConfig::zero()
/// };
/// let factory = GeneticsFactory::new(genetic_config, History::new()).unwrap();
/// let mut strategy = EvolutionStrategy::new(
///     factory,
///     FitnessFunction::new(|genome| genome.data().link_count() as f64),
///     StandardReproduction::standard(population_config).unwrap(),
///     StdRng::seed_from_u64(0),
/// )
/// .with_termination(MaxGenerations(5));
///
/// let mut population = strategy.create_population(0);
/// strategy.start(&mut population).unwrap();
/// assert_eq!(strategy.generation(), 5);
/// assert_eq!(population.len(), 10);
/// ```
pub struct EvolutionStrategy<I = History, R = StdRng> {
    factory: GeneticsFactory<I>,
    evaluator: Box<dyn EvaluationStrategy>,
    survival: Box<dyn SurvivalFilter>,
    reproduction: Box<dyn ReproductionStrategy<I>>,
    speciation: Option<Box<dyn Speciation>>,
    terminations: Vec<Box<dyn TerminationCondition>>,
    reporters: Vec<Box<dyn Reporter>>,
    rng: R,
    state: EvolutionState,
    generation: usize,
}

impl<I: InnovationService, R: RngCore> EvolutionStrategy<I, R> {
    /// Creates a strategy with generational replacement,
    /// no speciation, no termination conditions and no reporters.
    pub fn new(
        factory: GeneticsFactory<I>,
        evaluator: impl EvaluationStrategy + 'static,
        reproduction: impl ReproductionStrategy<I> + 'static,
        rng: R,
    ) -> EvolutionStrategy<I, R> {
        EvolutionStrategy {
            factory,
            evaluator: Box::new(evaluator),
            survival: Box::new(GenerationalReplacement),
            reproduction: Box::new(reproduction),
            speciation: None,
            terminations: vec![],
            reporters: vec![],
            rng,
            state: EvolutionState::Uninitialized,
            generation: 0,
        }
    }

    pub fn with_survival(mut self, survival: impl SurvivalFilter + 'static) -> Self {
        self.survival = Box::new(survival);
        self
    }

    pub fn with_speciation(mut self, speciation: impl Speciation + 'static) -> Self {
        self.speciation = Some(Box::new(speciation));
        self
    }

    pub fn with_termination(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.terminations.push(Box::new(condition));
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn factory(&self) -> &GeneticsFactory<I> {
        &self.factory
    }

    pub fn state(&self) -> EvolutionState {
        self.state
    }

    /// Number of epochs completed.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn status(&self) -> EvolutionStatus {
        EvolutionStatus {
            generation: self.generation,
            state: self.state,
        }
    }

    /// Creates a population of fresh genomes
    /// through the strategy's factory.
    pub fn create_population(&mut self, id: PopulationId) -> Population {
        self.factory.create_population(id, &mut self.rng)
    }

    /// Evaluates, speciates and validates the initial population.
    ///
    /// # Errors
    /// Fails if the strategy was already initialized, or if
    /// evaluation, speciation or validation fails.
    pub fn initialize(&mut self, population: &mut Population) -> Result<(), EvolutionError> {
        self.expect_state(EvolutionState::Uninitialized, "initialize")?;
        let result = self.settle(population);
        self.conclude(result, EvolutionState::Initialized, population)
    }

    /// Runs one generation: marks genomes for death, replaces
    /// them with children, then evaluates, speciates, validates
    /// and ages the population.
    ///
    /// # Errors
    /// Fails if the strategy is not initialized, or if any step
    /// fails; the strategy is then terminated.
    pub fn epoch(&mut self, population: &mut Population) -> Result<(), EvolutionError> {
        self.expect_state(EvolutionState::Initialized, "run an epoch")?;
        let result = self.replace_generation(population);
        if result.is_ok() {
            self.generation += 1;
        }
        self.conclude(result, EvolutionState::Initialized, population)
    }

    /// Initializes the strategy if needed, then runs epochs until
    /// a termination condition is satisfied.
    ///
    /// Without termination conditions, runs until an error occurs.
    pub fn start(&mut self, population: &mut Population) -> Result<(), EvolutionError> {
        if self.state == EvolutionState::Uninitialized {
            self.initialize(population)?;
        }
        if self.terminations.is_empty() {
            log::warn!("evolution started without termination conditions");
        }
        while !self.should_terminate(population) {
            self.epoch(population)?;
        }
        self.state = EvolutionState::Terminated;
        Ok(())
    }

    /// Returns `true` if any termination condition is satisfied.
    pub fn should_terminate(&mut self, population: &Population) -> bool {
        let status = self.status();
        self.terminations.iter_mut().any(|condition| {
            condition.satisfied_by_strategy(&status) || condition.satisfied_by_population(population)
        })
    }

    fn expect_state(
        &self,
        expected: EvolutionState,
        operation: &'static str,
    ) -> Result<(), EvolutionError> {
        if self.state != expected {
            return Err(EvolutionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn replace_generation(&mut self, population: &mut Population) -> Result<(), EvolutionError> {
        self.survival.mark(population);
        let children =
            self.reproduction
                .generate_children(population, &mut self.factory, &mut self.rng)?;
        population.remove_dead_genomes();
        for child in children {
            population.add_genome(child)?;
        }
        self.settle(population)?;
        population.increment_age();
        Ok(())
    }

    fn settle(&mut self, population: &mut Population) -> Result<(), EvolutionError> {
        self.evaluator
            .evaluate_population(population)
            .map_err(EvolutionError::Evaluation)?;
        population.refresh_stats();
        if let Some(speciation) = &mut self.speciation {
            speciation.speciate(population)?;
        }
        population.validate().map_err(|error| {
            log::error!("population {} is invalid: {}", population.id(), error);
            EvolutionError::from(error)
        })
    }

    /// Moves to `next` and reports on success,
    /// terminates on failure.
    fn conclude(
        &mut self,
        result: Result<(), EvolutionError>,
        next: EvolutionState,
        population: &Population,
    ) -> Result<(), EvolutionError> {
        match result {
            Ok(()) => {
                self.state = next;
                let status = self.status();
                for reporter in &mut self.reporters {
                    reporter.report(&status, population);
                }
                Ok(())
            }
            Err(error) => {
                self.state = EvolutionState::Terminated;
                Err(error)
            }
        }
    }
}
