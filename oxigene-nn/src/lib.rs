//! # OxiGene-NN
//! Neural-network phenotypes for [`oxigene`] genomes.
//!
//! Provides a [`NetworkDecoder`], implementing `oxigene`'s
//! `GenomeDecoder` trait, which turns a genome into a [`Phenotype`]
//! (neurons and weighted connections), as well as two neural network
//! implementations which can be built from a phenotype:
//! - [`Network`]: best suited for real-time control tasks, with new inputs set for each activation, and multiple time-steps involved.
//! - [`FunctionApproximator`]: best suited for more instantaneous single-output-per-input function approximation tasks.
//!
//! [`Network`]: crate::networks::Network
//! [`FunctionApproximator`]: crate::networks::FunctionApproximator
//!
//! # Example usage: scoring genomes on XOR
//! ```
//! use oxigene::evolution::{EvaluationStrategy, FitnessFunction};
//! use oxigene::genomics::{FieldRange, FieldSpec, GeneticConfig, GeneticsFactory, Genome, WEIGHT};
//! use oxigene::History;
//! use oxigene_nn::networks::FunctionApproximator;
//! use std::num::NonZeroUsize;
//!
//! // Allowed error margin for neural net answers.
//! const ERROR_MARGIN: f64 = 0.3;
//!
//! fn evaluate_xor(genome: &Genome) -> f64 {
//!     let mut network = FunctionApproximator::<1>::from_genome(genome);
//!
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut errors = [0.0; 4];
//!     for (i, (input, output)) in values.iter().enumerate() {
//!         errors[i] = (network.evaluate_at(input)[0] - output).abs();
//!         if errors[i] < ERROR_MARGIN {
//!             errors[i] = 0.0;
//!         }
//!     }
//!
//!     (4.0 - errors.iter().sum::<f64>()).powf(2.0)
//! }
//!
//! let mut config = GeneticConfig {
//!     population_size: NonZeroUsize::new(20).unwrap(),
//!     bias_count: 1,
//!     input_count: 2,
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     initial_connection_probability: 1.0,
//!     ..GeneticConfig::zero()
//! };
//! config.link_fields.insert(
//!     WEIGHT,
//!     FieldSpec::Float {
//!         initial: FieldRange::new(-1.0, 1.0),
//!         lifetime: FieldRange::new(-5.0, 5.0),
//!         mutation_power: 2.5,
//!     },
//! );
//! let mut factory = GeneticsFactory::new(config, History::new()).unwrap();
//! let mut population = factory.create_population(0, &mut rand::thread_rng());
//!
//! FitnessFunction::new(evaluate_xor)
//!     .evaluate_population(&mut population)
//!     .unwrap();
//! assert!(population.genomes().all(|g| (0.0..=16.0).contains(&g.fitness())));
//! ```
pub mod decoder;
pub mod networks;

pub use decoder::{Connection, NetworkDecoder, Neuron, Phenotype};
pub use networks::{FunctionApproximator, Network};
