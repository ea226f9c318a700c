use super::EvolutionError;
use crate::attributes::{OPERATOR, PARENTS};
use crate::genomics::{ConfigError, GeneticsFactory, Genome};
use crate::operators::{
    AddLink, AddNode, AdjustAttributes, CrossoverOperator, MutationOperator, OperatorError,
    OperatorSelecter, RemoveLink, StandardCrossover,
};
use crate::populations::{Population, PopulationConfig};
use crate::{GenomeId, History, InnovationService};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::IteratorRandom;
use rand::{Rng, RngCore};

/// Produces the children that replace a population's
/// genomes marked for death.
pub trait ReproductionStrategy<I = History> {
    /// Generates children with ids greater than every member's id.
    ///
    /// # Errors
    /// Fails if an operator breaks a genome invariant, or if no
    /// child can be produced.
    fn generate_children(
        &mut self,
        population: &Population,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Genome>, EvolutionError>;
}

/// A weighted pool of mutation operators.
pub type Mutations<I = History> = OperatorSelecter<Box<dyn MutationOperator<I>>>;
/// A weighted pool of crossover operators.
pub type Crossovers<I = History> = OperatorSelecter<Box<dyn CrossoverOperator<I>>>;

/// Fitness-proportional reproduction through weighted
/// pools of mutation and crossover operators.
///
/// Each child is produced by mutation (with the configured
/// probability) or crossover. Parents are drawn by roulette over
/// the fitness of every member; the crossover partner comes from
/// the first parent's species unless an interspecies draw succeeds.
/// When an operator cannot produce a child it is excluded and
/// another one tried; when none can, new parents are drawn.
///
/// Children record their parents' ids under [`PARENTS`]
/// and the operator's label under [`OPERATOR`].
#[derive(Debug)]
pub struct StandardReproduction<I = History> {
    config: PopulationConfig,
    mutations: Mutations<I>,
    crossovers: Crossovers<I>,
}

impl<I: InnovationService> StandardReproduction<I> {
    /// Creates a strategy using the given operator pools.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: PopulationConfig,
        mutations: Mutations<I>,
        crossovers: Crossovers<I>,
    ) -> Result<StandardReproduction<I>, ConfigError> {
        config.validate()?;
        if config.mutation_probability > 0.0 && mutations.total_weight() <= 0.0 {
            log::warn!("mutation is enabled but no mutation operator has a positive weight");
        }
        if config.mutation_probability < 1.0 && crossovers.total_weight() <= 0.0 {
            log::warn!("crossover is enabled but no crossover operator has a positive weight");
        }
        Ok(StandardReproduction {
            config,
            mutations,
            crossovers,
        })
    }

    /// Creates a strategy with every built-in operator:
    /// weight adjustment, link and node addition, link
    /// removal and standard crossover.
    ///
    /// # Examples
    /// ```
    /// use oxigene::evolution::StandardReproduction;
    /// use oxigene::{History, PopulationConfig};
    ///
    /// let config = PopulationConfig {
    ///     mutation_probability: 0.75,
    ///     ..PopulationConfig::zero()
    /// };
    /// let reproduction = StandardReproduction::<History>::standard(config).unwrap();
    /// assert_eq!(reproduction.mutations().len(), 4);
    /// ```
    pub fn standard(config: PopulationConfig) -> Result<StandardReproduction<I>, ConfigError> {
        let mut mutations: Mutations<I> = OperatorSelecter::new();
        mutations.insert(Box::new(AdjustAttributes::new(true, false, 0.8, 1.0)?), 0.8)?;
        mutations.insert(Box::new(AddLink), 0.1)?;
        mutations.insert(Box::new(AddNode), 0.05)?;
        mutations.insert(Box::new(RemoveLink), 0.05)?;
        let mut crossovers: Crossovers<I> = OperatorSelecter::new();
        crossovers.insert(Box::new(StandardCrossover), 1.0)?;
        StandardReproduction::new(config, mutations, crossovers)
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn mutations(&self) -> &Mutations<I> {
        &self.mutations
    }

    pub fn crossovers(&self) -> &Crossovers<I> {
        &self.crossovers
    }

    /// Tries the mutation operators on `parent` until one
    /// produces a child. Returns `None` if none could.
    ///
    /// # Errors
    /// Fails if an operator breaks a genome invariant.
    pub fn mutate(
        &self,
        child_id: GenomeId,
        parent: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Genome>, EvolutionError> {
        let mut selection = self.mutations.selection();
        while let Some((index, operator)) = selection.select(rng) {
            match operator.mutate(child_id, parent, factory, rng) {
                Ok(child) => return Ok(Some(tag(child, &[parent.id()], operator.label()))),
                Err(OperatorError::NoChildProduced(reason)) => {
                    log::trace!("{} failed on genome {}: {}", operator.label(), parent.id(), reason);
                    selection.reject(index);
                }
                Err(OperatorError::Invariant(error)) => return Err(error.into()),
            }
        }
        Ok(None)
    }

    /// Tries the crossover operators on `first` and `second`
    /// until one produces a child. Returns `None` if none could.
    ///
    /// # Errors
    /// Fails if an operator breaks a genome invariant.
    pub fn crossover(
        &self,
        child_id: GenomeId,
        first: &Genome,
        second: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Genome>, EvolutionError> {
        let mut selection = self.crossovers.selection();
        while let Some((index, operator)) = selection.select(rng) {
            match operator.crossover(child_id, first, second, factory, rng) {
                Ok(child) => {
                    return Ok(Some(tag(child, &[first.id(), second.id()], operator.label())))
                }
                Err(OperatorError::NoChildProduced(reason)) => {
                    log::trace!(
                        "{} failed on genomes {} and {}: {}",
                        operator.label(),
                        first.id(),
                        second.id(),
                        reason
                    );
                    selection.reject(index);
                }
                Err(OperatorError::Invariant(error)) => return Err(error.into()),
            }
        }
        Ok(None)
    }

    /// Picks a crossover partner for `first`: a random member
    /// of its species, or a roulette draw over the population.
    fn choose_partner<'a>(
        &self,
        first: &Genome,
        population: &'a Population,
        roulette: &Roulette<'a>,
        rng: &mut dyn RngCore,
    ) -> &'a Genome {
        let interspecies = rng.gen::<f64>() < self.config.interspecies_crossover_probability;
        if !interspecies {
            let partner = first
                .species()
                .and_then(|s| population.species(s))
                .and_then(|s| s.members().choose(rng))
                .and_then(|m| population.genome(m));
            if let Some(partner) = partner {
                return partner;
            }
        }
        roulette.spin(rng)
    }
}

impl<I: InnovationService> ReproductionStrategy<I> for StandardReproduction<I> {
    fn generate_children(
        &mut self,
        population: &Population,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Genome>, EvolutionError> {
        let marked = population
            .genomes()
            .filter(|g| g.is_marked_for_death())
            .count();
        // Purged species can leave the population short of its size.
        let shortfall = factory
            .config()
            .population_size
            .get()
            .saturating_sub(population.len());
        let count = marked + shortfall;
        if count == 0 {
            return Ok(vec![]);
        }
        let roulette = Roulette::new(population).ok_or(EvolutionError::EmptyPopulation)?;

        let mut next_id = population.next_genome_id();
        let mut children = Vec::with_capacity(count);
        let mut failures = 0;
        while children.len() < count {
            let first = roulette.spin(rng);
            let child = if rng.gen::<f64>() < self.config.mutation_probability {
                self.mutate(next_id, first, factory, rng)?
            } else {
                let second = self.choose_partner(first, population, &roulette, rng);
                self.crossover(next_id, first, second, factory, rng)?
            };
            match child {
                Some(child) => {
                    children.push(child);
                    next_id += 1;
                    failures = 0;
                }
                None => {
                    failures += 1;
                    let max = self.config.max_reproduction_attempts;
                    if max > 0 && failures >= max {
                        return Err(EvolutionError::ReproductionStalled { attempts: failures });
                    }
                }
            }
        }
        Ok(children)
    }
}

fn tag(mut child: Genome, parents: &[GenomeId], operator: &str) -> Genome {
    log::debug!("genome {} produced by {} from {:?}", child.id(), operator, parents);
    let attributes = child.attributes_mut();
    attributes.set(PARENTS, parents.to_vec());
    attributes.set(OPERATOR, operator);
    child
}

/// Fitness-proportional parent selection. Negative fitness
/// counts as zero; if no member has positive fitness,
/// members are drawn uniformly.
struct Roulette<'a> {
    genomes: Vec<&'a Genome>,
    weights: Option<WeightedIndex<f64>>,
}

impl<'a> Roulette<'a> {
    fn new(population: &'a Population) -> Option<Roulette<'a>> {
        let genomes: Vec<&Genome> = population.genomes().collect();
        if genomes.is_empty() {
            return None;
        }
        let weights = WeightedIndex::new(genomes.iter().map(|g| {
            let fitness = g.fitness();
            if fitness.is_finite() && fitness > 0.0 {
                fitness
            } else {
                0.0
            }
        }))
        .ok();
        if weights.is_none() {
            log::debug!(
                "population {}: no positive fitness, selecting parents uniformly",
                population.id()
            );
        }
        Some(Roulette { genomes, weights })
    }

    fn spin(&self, rng: &mut dyn RngCore) -> &'a Genome {
        let index = match &self.weights {
            Some(weights) => weights.sample(rng),
            None => rng.gen_range(0..self.genomes.len()),
        };
        self.genomes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeValue;
    use crate::evolution::{GenerationalReplacement, SurvivalFilter};
    use crate::genomics::NodeKind;
    use crate::operators::testing::{seeded, xor_factory};
    use crate::operators::NoChildProduced;

    use std::collections::BTreeSet;

    fn config() -> PopulationConfig {
        PopulationConfig {
            mutation_probability: 0.5,
            max_reproduction_attempts: 100,
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn replaces_every_marked_genome() {
        let mut rng = seeded(11);
        let mut factory = xor_factory();
        let mut population = factory.create_population(0, &mut rng);
        GenerationalReplacement.mark(&mut population);

        let mut reproduction = StandardReproduction::standard(config()).unwrap();
        let children = reproduction
            .generate_children(&population, &mut factory, &mut rng)
            .unwrap();

        assert_eq!(children.len(), population.len());
        let ids: BTreeSet<GenomeId> = children.iter().map(Genome::id).collect();
        assert_eq!(ids.len(), children.len());
        assert!(ids.iter().all(|id| *id > 5));
        for child in &children {
            child.validate().unwrap();
            assert!(child.attributes().get(OPERATOR).is_some());
            assert!(matches!(
                child.attributes().get(PARENTS),
                Some(AttributeValue::Genomes(parents)) if !parents.is_empty()
            ));
        }
    }

    #[test]
    fn unmarked_populations_need_no_children() {
        let mut rng = seeded(11);
        let mut factory = xor_factory();
        let population = factory.create_population(0, &mut rng);
        let mut reproduction = StandardReproduction::standard(config()).unwrap();
        let children = reproduction
            .generate_children(&population, &mut factory, &mut rng)
            .unwrap();
        assert!(children.is_empty());
    }

    #[test]
    fn fills_population_shortfall() {
        let mut rng = seeded(2);
        let mut factory = xor_factory();
        let mut population = factory.create_population(0, &mut rng);
        population.remove_genome(0).unwrap();
        population.remove_genome(1).unwrap();
        population.genome_mut(5).unwrap().mark_for_death();

        let mut reproduction = StandardReproduction::standard(config()).unwrap();
        let children = reproduction
            .generate_children(&population, &mut factory, &mut rng)
            .unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].id(), 6);
    }

    #[test]
    fn failing_operators_are_skipped() {
        let mut rng = seeded(4);
        let mut factory = xor_factory();
        // With a self loop on the output, the genome is fully
        // connected and only link removal applies.
        let mut data = factory.create_data(&mut rng);
        let output = data.nodes_of_kind(NodeKind::Output).next().unwrap().id();
        let link = factory.create_link_gene(data.next_link_id(), output, output, &mut rng);
        data.add_link(link).unwrap();
        let parent = factory.create_genome_with(0, data);
        assert_eq!(
            AddLink.mutate(1, &parent, &mut factory, &mut rng).unwrap_err(),
            OperatorError::NoChildProduced(NoChildProduced::FullyConnected)
        );

        let mut mutations: Mutations<History> = OperatorSelecter::new();
        mutations.insert(Box::new(AddLink), 1.0).unwrap();
        mutations.insert(Box::new(RemoveLink), 1.0).unwrap();
        let reproduction = StandardReproduction::new(
            PopulationConfig::zero(),
            mutations,
            OperatorSelecter::new(),
        )
        .unwrap();
        for _ in 0..10 {
            let child = reproduction
                .mutate(1, &parent, &mut factory, &mut rng)
                .unwrap()
                .unwrap();
            assert_eq!(child.data().link_count(), 3);
            assert_eq!(
                child.attributes().get(OPERATOR),
                Some(&AttributeValue::Text("remove-link".into()))
            );
            assert_eq!(
                child.attributes().get(PARENTS),
                Some(&AttributeValue::Genomes(vec![0]))
            );
        }
    }

    #[test]
    fn exhausted_pools_produce_nothing() {
        let mut rng = seeded(4);
        let mut factory = xor_factory();
        let data = factory.create_data(&mut rng);
        let mut stripped = data.clone();
        for id in data.link_ids() {
            stripped.remove_link(id).unwrap();
        }
        let parent = factory.create_genome_with(0, stripped);

        let mut mutations: Mutations<History> = OperatorSelecter::new();
        mutations.insert(Box::new(AddNode), 1.0).unwrap();
        mutations.insert(Box::new(RemoveLink), 1.0).unwrap();
        let reproduction = StandardReproduction::new(
            PopulationConfig::zero(),
            mutations,
            OperatorSelecter::new(),
        )
        .unwrap();
        assert!(reproduction
            .mutate(1, &parent, &mut factory, &mut rng)
            .unwrap()
            .is_none());
    }

    #[test]
    fn stalls_are_reported() {
        let mut rng = seeded(4);
        let mut factory = xor_factory();
        let mut population = factory.create_population(0, &mut rng);
        GenerationalReplacement.mark(&mut population);
        let config = PopulationConfig {
            mutation_probability: 1.0,
            max_reproduction_attempts: 5,
            ..PopulationConfig::zero()
        };
        let mut reproduction =
            StandardReproduction::new(config, OperatorSelecter::new(), OperatorSelecter::new())
                .unwrap();
        assert!(matches!(
            reproduction.generate_children(&population, &mut factory, &mut rng),
            Err(EvolutionError::ReproductionStalled { attempts: 5 })
        ));
    }
}
