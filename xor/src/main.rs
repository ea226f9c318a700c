use oxigene::evolution::{
    EvaluationError, EvaluationStrategy, EvolutionError, EvolutionStrategy, FitnessTarget,
    GenomeDecoder, LogReporter, MaxGenerations, SpeciesElitism, StandardReproduction,
};
use oxigene::genomics::{FieldRange, FieldSpec, Genome, WEIGHT};
use oxigene::populations::ThresholdSpeciation;
use oxigene::{
    ConfigError, GeneticConfig, GeneticsFactory, GenomeId, History, Population, PopulationConfig,
};
use oxigene_nn::{FunctionApproximator, NetworkDecoder, Phenotype};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

const ERROR_MARGIN: f64 = 0.3;
const MAX_FITNESS: f64 = 16.0;

/// Experiment settings, optionally read from a RON file
/// given as the first command line argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct ExperimentConfig {
    genetics: GeneticConfig,
    population: PopulationConfig,
    /// Generation limit of the run.
    generations: usize,
    fitness_target: f64,
    /// Evaluation threads; 0 lets rayon decide.
    threads: usize,
}

impl Default for ExperimentConfig {
    fn default() -> ExperimentConfig {
        let mut genetics = GeneticConfig {
            population_size: NonZeroUsize::new(150).unwrap_or(NonZeroUsize::MIN),
            bias_count: 1,
            input_count: 2,
            output_count: NonZeroUsize::MIN,
            initial_connection_probability: 1.0,
            ..GeneticConfig::zero()
        };
        genetics.link_fields.insert(
            WEIGHT,
            FieldSpec::Float {
                initial: FieldRange::new(-1.0, 1.0),
                lifetime: FieldRange::new(-5.0, 5.0),
                mutation_power: 2.5,
            },
        );

        ExperimentConfig {
            genetics,
            population: PopulationConfig {
                mutation_probability: 0.65,
                max_reproduction_attempts: 1000,
                compatibility_threshold: 3.0,
                excess_coefficient: 1.0,
                disjoint_coefficient: 1.0,
                weight_coefficient: 0.4,
                species_dropoff_age: 15,
                elite_proportion: 0.2,
                target_species_min: 5,
                target_species_max: 15,
                threshold_adjustment: 0.1,
                interspecies_crossover_probability: 0.001,
            },
            generations: 100,
            fitness_target: MAX_FITNESS,
            threads: 0,
        }
    }
}

impl ExperimentConfig {
    fn load(path: &Path) -> Result<ExperimentConfig, XorError> {
        let text = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }
}

#[derive(Debug, Error)]
enum XorError {
    #[error("could not read the experiment configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed experiment configuration: {0}")]
    Ron(#[from] ron::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build the evaluation thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Evolution(#[from] EvolutionError),
}

/// Scores a network on the four XOR cases. Answers
/// within [`ERROR_MARGIN`] of the target count as exact.
fn evaluate_xor(phenotype: &Phenotype) -> f64 {
    let mut network = FunctionApproximator::<1>::new(phenotype);

    let values = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0; 4];
    for (i, (input, output)) in values.iter().enumerate() {
        errors[i] = (network.evaluate_at(input)[0] - output).abs();
        if errors[i] < ERROR_MARGIN {
            errors[i] = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f64>()).powf(2.0)
}

/// Evaluates genomes on a rayon pool.
///
/// Workers pull simulation jobs from a shared cursor and add each
/// result to the genome's fitness accumulator. The two are guarded
/// by separate locks, so finished runs never wait on dispatch.
struct ParallelEvaluation {
    pool: rayon::ThreadPool,
    runs_per_genome: usize,
    simulation: fn(&Phenotype) -> f64,
}

impl ParallelEvaluation {
    fn new(
        threads: usize,
        runs_per_genome: usize,
        simulation: fn(&Phenotype) -> f64,
    ) -> Result<ParallelEvaluation, XorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        Ok(ParallelEvaluation {
            pool,
            runs_per_genome: runs_per_genome.max(1),
            simulation,
        })
    }

    fn worker(
        &self,
        genomes: &[&Genome],
        cursor: &Mutex<usize>,
        accumulator: &Mutex<Vec<f64>>,
    ) -> Result<(), EvaluationError> {
        let jobs = genomes.len() * self.runs_per_genome;
        loop {
            let job = {
                let mut next = cursor.lock().map_err(|_| "work cursor lock poisoned")?;
                if *next >= jobs {
                    return Ok(());
                }
                *next += 1;
                *next - 1
            };
            let index = job / self.runs_per_genome;
            let phenotype = NetworkDecoder.decode(genomes[index]);
            let score = (self.simulation)(&phenotype);
            let mut totals = accumulator
                .lock()
                .map_err(|_| "fitness accumulator lock poisoned")?;
            totals[index] += score;
        }
    }
}

impl EvaluationStrategy for ParallelEvaluation {
    fn evaluate_population(&mut self, population: &mut Population) -> Result<(), EvaluationError> {
        let ids: Vec<GenomeId> = population.genome_ids().collect();
        let totals = {
            let genomes: Vec<&Genome> = population.genomes().collect();
            let cursor = Mutex::new(0);
            let accumulator = Mutex::new(vec![0.0; genomes.len()]);
            let workers = self.pool.current_num_threads().min(genomes.len()).max(1);
            let this = &*self;
            this.pool.install(|| {
                (0..workers)
                    .into_par_iter()
                    .try_for_each(|_| this.worker(&genomes, &cursor, &accumulator))
            })?;
            accumulator
                .into_inner()
                .map_err(|_| "fitness accumulator lock poisoned")?
        };

        for (id, total) in ids.into_iter().zip(totals) {
            if let Some(genome) = population.genome_mut(id) {
                genome.record_evaluation(total / self.runs_per_genome as f64);
            }
        }
        Ok(())
    }
}

fn run(config: ExperimentConfig) -> Result<(), XorError> {
    let factory = GeneticsFactory::new(config.genetics.clone(), History::new())?;
    let speciation =
        ThresholdSpeciation::new(config.population.clone(), config.genetics.population_size)?;
    let reproduction = StandardReproduction::standard(config.population.clone())?;
    let evaluation = ParallelEvaluation::new(config.threads, 1, evaluate_xor)?;

    let mut strategy = EvolutionStrategy::new(
        factory,
        evaluation,
        reproduction,
        StdRng::from_entropy(),
    )
    .with_survival(SpeciesElitism)
    .with_speciation(speciation)
    .with_termination(FitnessTarget(config.fitness_target))
    .with_termination(MaxGenerations(config.generations))
    .with_reporter(LogReporter);

    let mut population = strategy.create_population(0);
    strategy.start(&mut population)?;

    match population.champion() {
        Some(champion) if champion.fitness() >= config.fitness_target => println!(
            "Solved XOR in {} generations:\n{}",
            strategy.generation(),
            champion
        ),
        Some(champion) => println!(
            "No solution after {} generations, best fitness {}",
            strategy.generation(),
            champion.fitness()
        ),
        None => println!("Population died out"),
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ExperimentConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => ExperimentConfig::default(),
    };
    log::info!(
        "population of {}, at most {} generations",
        config.genetics.population_size,
        config.generations
    );

    if let Err(e) = run(config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use oxigene::evolution::FitnessFunction;

    #[test]
    fn default_config_is_valid() {
        let config = ExperimentConfig::default();
        config.genetics.validate().unwrap();
        config.population.validate().unwrap();
    }

    #[test]
    fn config_reads_back_from_ron() {
        let config = ExperimentConfig::default();
        let text = ron::to_string(&config).unwrap();
        assert_eq!(ron::from_str::<ExperimentConfig>(&text).unwrap(), config);
    }

    #[test]
    fn parallel_matches_sequential() {
        let config = ExperimentConfig::default();
        let mut factory = GeneticsFactory::new(config.genetics, History::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut parallel = factory.create_population(0, &mut rng);
        let mut sequential = parallel.clone();

        ParallelEvaluation::new(4, 3, evaluate_xor)
            .unwrap()
            .evaluate_population(&mut parallel)
            .unwrap();
        FitnessFunction::new(|genome: &Genome| evaluate_xor(&NetworkDecoder.decode(genome)))
            .evaluate_population(&mut sequential)
            .unwrap();

        for genome in sequential.genomes() {
            let evaluated = parallel.genome(genome.id()).unwrap();
            assert!((evaluated.fitness() - genome.fitness()).abs() < 1e-9);
            assert_eq!(evaluated.evaluations(), 1);
        }
    }

    #[test]
    fn fitness_is_bounded() {
        let config = ExperimentConfig::default();
        let mut factory = GeneticsFactory::new(config.genetics, History::new()).unwrap();
        let population = factory.create_population(0, &mut StdRng::seed_from_u64(9));
        for genome in population.genomes() {
            let fitness = evaluate_xor(&NetworkDecoder.decode(genome));
            assert!((0.0..=MAX_FITNESS).contains(&fitness));
        }
    }
}
