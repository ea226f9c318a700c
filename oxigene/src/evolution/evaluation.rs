use super::EvaluationError;
use crate::genomics::Genome;
use crate::populations::Population;

/// Assigns fitness to the members of a population.
///
/// Implementations must set every member's fitness and count
/// the evaluation, typically through [`Genome::record_evaluation`].
/// They are free to run simulations in parallel, as long as the
/// results are written back before returning.
pub trait EvaluationStrategy {
    fn evaluate_population(&mut self, population: &mut Population) -> Result<(), EvaluationError>;
}

/// Sequential evaluation through a fitness function.
///
/// # Examples
/// ```
/// use oxigene::evolution::{EvaluationStrategy, FitnessFunction};
/// use oxigene::genomics::{GeneticConfig, GeneticsFactory};
/// use oxigene::History;
///
/// let mut factory = GeneticsFactory::new(GeneticConfig::zero(), History::new()).unwrap();
/// let mut population = factory.create_population(0, &mut rand::thread_rng());
///
/// let mut evaluator = FitnessFunction::new(|genome| genome.data().node_count() as f64);
/// evaluator.evaluate_population(&mut population).unwrap();
///
/// let genome = population.genome(0).unwrap();
/// assert_eq!(genome.fitness(), 1.0);
/// assert_eq!(genome.evaluations(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct FitnessFunction<F> {
    function: F,
}

impl<F: FnMut(&Genome) -> f64> FitnessFunction<F> {
    pub fn new(function: F) -> FitnessFunction<F> {
        FitnessFunction { function }
    }
}

impl<F: FnMut(&Genome) -> f64> EvaluationStrategy for FitnessFunction<F> {
    fn evaluate_population(&mut self, population: &mut Population) -> Result<(), EvaluationError> {
        for genome in population.genomes_mut() {
            let fitness = (self.function)(genome);
            genome.record_evaluation(fitness);
        }
        Ok(())
    }
}

/// Translates genomes into the phenotypes evaluated
/// by an experiment.
///
/// Decoding must be pure: the same genome always
/// decodes to the same phenotype.
pub trait GenomeDecoder {
    type Phenotype;

    fn decode(&self, genome: &Genome) -> Self::Phenotype;
}
