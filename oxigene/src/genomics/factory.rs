use super::{ConfigError, GeneMap, GeneticConfig, Genome, LinkGene, NodeGene, NodeKind};
use crate::populations::Population;
use crate::{GenomeId, History, InnovationService, LinkId, NodeId, PopulationId};

use rand::Rng;

/// Builds genes, genomes and populations from a
/// [`GeneticConfig`], drawing link innovations from
/// an injected [`InnovationService`].
#[derive(Clone, Debug)]
pub struct GeneticsFactory<I = History> {
    config: GeneticConfig,
    innovations: I,
}

impl<I: InnovationService> GeneticsFactory<I> {
    /// Creates a new factory.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{GeneticConfig, GeneticsFactory};
    /// use oxigene::InnovationCounter;
    ///
    /// let bad = GeneticConfig {
    ///     initial_connection_probability: -1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(GeneticsFactory::new(bad, InnovationCounter::new()).is_err());
    /// ```
    pub fn new(config: GeneticConfig, innovations: I) -> Result<GeneticsFactory<I>, ConfigError> {
        config.validate()?;
        Ok(GeneticsFactory {
            config,
            innovations,
        })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn innovations(&self) -> &I {
        &self.innovations
    }

    /// Returns a node of the given kind with freshly
    /// initialized field values.
    pub fn create_node_gene<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        kind: NodeKind,
        rng: &mut R,
    ) -> NodeGene {
        NodeGene::new(id, kind, self.config.node_fields.initial_values(rng))
    }

    /// Returns a link with freshly initialized field values
    /// and the innovation registered for its endpoints.
    pub fn create_link_gene<R: Rng + ?Sized>(
        &mut self,
        id: LinkId,
        source: NodeId,
        target: NodeId,
        rng: &mut R,
    ) -> LinkGene {
        let innovation = self.innovations.link_innovation(source, target);
        LinkGene::new(
            id,
            source,
            target,
            innovation,
            self.config.link_fields.initial_values(rng),
        )
    }

    /// Returns the id of the hidden node that splits `link`
    /// in `data`, as issued by the innovation service.
    pub fn split_node_id(&mut self, link: &LinkGene, data: &GeneMap) -> NodeId {
        let first_hidden = self.config.interface_size();
        self.innovations
            .split_node(link.innovation(), first_hidden, &|id| data.contains_node(id))
    }

    /// Returns a copy of `node` under a new id.
    pub fn copy_node_gene(&self, id: NodeId, node: &NodeGene) -> NodeGene {
        node.with_id(id)
    }

    /// Returns a copy of `link` under a new id, keeping
    /// its endpoints, innovation and field values.
    pub fn copy_link_gene(&self, id: LinkId, link: &LinkGene) -> LinkGene {
        link.with_id(id)
    }

    /// Builds the genes of a new, unevolved genome.
    ///
    /// Bias, input and output nodes are created in that
    /// order with consecutive ids starting at 0. Then every
    /// bias or input node is linked to every output node
    /// with the configured initial connection probability.
    pub fn create_data<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GeneMap {
        let mut data = GeneMap::new();
        let kinds = std::iter::repeat(NodeKind::Bias)
            .take(self.config.bias_count)
            .chain(std::iter::repeat(NodeKind::Input).take(self.config.input_count))
            .chain(std::iter::repeat(NodeKind::Output).take(self.config.output_count.get()));
        for (id, kind) in kinds.enumerate() {
            data.insert_node_unchecked(self.create_node_gene(id, kind, rng));
        }

        let sources = self.config.bias_count + self.config.input_count;
        let outputs = sources..self.config.interface_size();
        for source in 0..sources {
            for target in outputs.clone() {
                if rng.gen::<f64>() < self.config.initial_connection_probability {
                    let link = self.create_link_gene(data.next_link_id(), source, target, rng);
                    data.insert_link_unchecked(link);
                }
            }
        }
        data
    }

    pub fn copy_data(&self, data: &GeneMap) -> GeneMap {
        data.clone()
    }

    /// Creates a genome with freshly built genes.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{GeneticConfig, GeneticsFactory};
    /// use oxigene::History;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     bias_count: 1,
    ///     input_count: 2,
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     initial_connection_probability: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut factory = GeneticsFactory::new(config, History::new()).unwrap();
    /// let genome = factory.create_genome(0, &mut rand::thread_rng());
    ///
    /// assert_eq!(genome.data().node_count(), 4);
    /// assert_eq!(genome.data().link_count(), 3);
    /// assert_eq!(genome.complexity(), 7.0);
    /// ```
    pub fn create_genome<R: Rng + ?Sized>(&mut self, id: GenomeId, rng: &mut R) -> Genome {
        let data = self.create_data(rng);
        Genome::new(id, data)
    }

    /// Wraps existing genes as a new genome.
    pub fn create_genome_with(&self, id: GenomeId, data: GeneMap) -> Genome {
        Genome::new(id, data)
    }

    /// Returns a new genome with a copy of `genome`'s genes.
    /// Evolutionary attributes start over.
    pub fn copy_genome(&self, id: GenomeId, genome: &Genome) -> Genome {
        Genome::new(id, self.copy_data(genome.data()))
    }

    /// Creates a population of `population_size` new
    /// genomes, with ids `0..population_size`.
    pub fn create_population<R: Rng + ?Sized>(
        &mut self,
        id: PopulationId,
        rng: &mut R,
    ) -> Population {
        let genomes = (0..self.config.population_size.get())
            .map(|genome_id| self.create_genome(genome_id, rng))
            .collect::<Vec<_>>();
        Population::from_genomes(id, genomes)
    }
}
