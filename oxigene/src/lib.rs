//! A NEAT-style genetic engine, following the 2002 paper:
//! <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes are graphs of node and link genes whose structure grows and
//! shrinks through mutation. Link genes carry historical [`Innovation`]
//! markers, so that genomes of different shapes can still be aligned
//! and recombined. Populations are split into species, and driven
//! through generations by an [`EvolutionStrategy`].
//!
//! The decoding of genomes into runnable neural networks is supplied
//! by the `oxigene-nn` crate.
//!
//! # Example usage: growing a network towards a target size
//! ```
//! use oxigene::evolution::{
//!     EvolutionStrategy, FitnessFunction, FitnessTarget, LogReporter, MaxGenerations,
//!     StandardReproduction,
//! };
//! use oxigene::genomics::{FieldRange, FieldSpec, GeneticConfig, GeneticsFactory, Genome, WEIGHT};
//! use oxigene::populations::ThresholdSpeciation;
//! use oxigene::{History, PopulationConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use std::num::NonZeroUsize;
//!
//! fn evaluate(genome: &Genome) -> f64 {
//!     let nodes = genome.data().node_count() as f64;
//!     1.0 / (1.0 + (8.0 - nodes).abs())
//! }
//!
//! let mut genetic_config = GeneticConfig {
//!     population_size: NonZeroUsize::new(30).unwrap(),
//!     bias_count: 1,
//!     input_count: 2,
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     initial_connection_probability: 1.0,
//!     ..GeneticConfig::zero()
//! };
//! genetic_config.link_fields.insert(
//!     WEIGHT,
//!     FieldSpec::Float {
//!         initial: FieldRange::new(-1.0, 1.0),
//!         lifetime: FieldRange::new(-5.0, 5.0),
//!         mutation_power: 0.5,
//!     },
//! );
//! let population_config = PopulationConfig {
//!     mutation_probability: 0.8,
//!     max_reproduction_attempts: 100,
//!     compatibility_threshold: 3.0,
//!     excess_coefficient: 1.0,
//!     disjoint_coefficient: 1.0,
//!     weight_coefficient: 0.4,
//!     species_dropoff_age: 15,
//!     elite_proportion: 0.2,
//!     target_species_min: 2,
//!     target_species_max: 6,
//!     threshold_adjustment: 0.1,
//!     interspecies_crossover_probability: 0.01,
//! };
//!
//! let factory = GeneticsFactory::new(genetic_config.clone(), History::new()).unwrap();
//! let speciation =
//!     ThresholdSpeciation::new(population_config.clone(), genetic_config.population_size).unwrap();
//! let mut strategy = EvolutionStrategy::new(
//!     factory,
//!     FitnessFunction::new(evaluate),
//!     StandardReproduction::standard(population_config).unwrap(),
//!     StdRng::seed_from_u64(42),
//! )
//! .with_speciation(speciation)
//! .with_termination(FitnessTarget(1.0))
//! .with_termination(MaxGenerations(50))
//! .with_reporter(LogReporter);
//!
//! let mut population = strategy.create_population(0);
//! strategy.start(&mut population).unwrap();
//! println!("champion: {}", population.champion().unwrap());
//! ```
pub mod attributes;
pub mod evolution;
pub mod genomics;
pub mod innovation;
pub mod operators;
pub mod populations;

/// Identifier of a node gene within a genome.
pub type NodeId = usize;
/// Identifier of a link gene within a genome.
pub type LinkId = usize;
/// Identifier of a genome within a population.
pub type GenomeId = usize;
pub type SpeciesId = usize;
pub type PopulationId = usize;

pub use evolution::{EvolutionError, EvolutionStrategy};
pub use genomics::{ConfigError, GeneMap, GeneticConfig, GeneticsFactory, Genome};
pub use innovation::{History, Innovation, InnovationCounter, InnovationService};
pub use populations::{Population, PopulationConfig};

#[cfg(test)]
mod tests {
    use crate::evolution::{GenerationalReplacement, ReproductionStrategy, StandardReproduction};
    use crate::evolution::SurvivalFilter;
    use crate::genomics::NodeKind;
    use crate::operators::testing::{seeded, xor_factory};
    use crate::operators::{AddNode, MutationOperator, RemoveLink};
    use crate::PopulationConfig;

    use std::collections::BTreeSet;

    #[test]
    fn grow_and_repair() {
        let mut rng = seeded(21);
        let mut factory = xor_factory();
        let genome = factory.create_genome(0, &mut rng);
        assert_eq!(genome.data().node_count(), 4);
        assert_eq!(genome.data().link_count(), 3);
        let output = genome.data().nodes_of_kind(NodeKind::Output).next().unwrap().id();
        for link in genome.data().links() {
            assert_eq!(link.target(), output);
        }

        let grown = AddNode.mutate(1, &genome, &mut factory, &mut rng).unwrap();
        assert_eq!(grown.data().node_count(), 5);
        assert_eq!(grown.data().link_count(), 4);
        let hidden = grown
            .data()
            .nodes_of_kind(NodeKind::Hidden)
            .next()
            .unwrap()
            .id();

        // Cut the hidden node's outgoing link: removing its incoming
        // link then leaves it isolated, and it is removed as well.
        let mut data = grown.data().clone();
        let outgoing: Vec<_> = data.outgoing(hidden).collect();
        for id in outgoing {
            data.remove_link(id).unwrap();
        }
        let mut cut = factory.create_genome_with(2, data);
        while cut.data().node_count() == 5 {
            cut = RemoveLink.mutate(3, &cut, &mut factory, &mut rng).unwrap();
        }
        assert_eq!(cut.data().node_count(), 4);
        assert!(!cut.data().contains_node(hidden));
        cut.validate().unwrap();
    }

    #[test]
    fn replacement_generation_has_fresh_ids() {
        let mut rng = seeded(8);
        let mut factory = xor_factory();
        let mut population = factory.create_population(0, &mut rng);
        let previous: BTreeSet<_> = population.genome_ids().collect();
        GenerationalReplacement.mark(&mut population);

        let config = PopulationConfig {
            mutation_probability: 0.5,
            ..PopulationConfig::zero()
        };
        let mut reproduction = StandardReproduction::standard(config).unwrap();
        let children = reproduction
            .generate_children(&population, &mut factory, &mut rng)
            .unwrap();
        assert_eq!(children.len(), previous.len());
        let ids: BTreeSet<_> = children.iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), children.len());
        assert!(ids.iter().all(|id| previous.iter().all(|p| id > p)));

        population.remove_dead_genomes();
        for child in children {
            population.add_genome(child).unwrap();
        }
        assert_eq!(population.genome_ids().collect::<BTreeSet<_>>(), ids);
        population.validate().unwrap();
    }
}
