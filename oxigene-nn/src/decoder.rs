use oxigene::evolution::GenomeDecoder;
use oxigene::genomics::{Genome, NodeKind};
use oxigene::NodeId;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// A network neuron. Its index is its position in
/// [`Phenotype::neurons`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    pub index: usize,
    pub kind: NodeKind,
    /// Activation level before the first activation.
    pub activation: f64,
}

/// A weighted connection between neuron indices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// The network encoded by a genome.
///
/// Neurons are grouped as bias, input, output, then hidden
/// neurons, each group ordered by node id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    pub neurons: Vec<Neuron>,
    pub connections: Vec<Connection>,
}

impl Phenotype {
    /// Number of neurons of the given kind.
    pub fn count(&self, kind: NodeKind) -> usize {
        self.neurons.iter().filter(|n| n.kind == kind).count()
    }
}

/// Decodes genomes into [`Phenotype`]s.
///
/// Missing activation or weight fields decode as 0.
///
/// # Examples
/// ```
/// use oxigene::evolution::GenomeDecoder;
/// use oxigene::genomics::{GeneticConfig, GeneticsFactory, NodeKind};
/// use oxigene::History;
/// use oxigene_nn::NetworkDecoder;
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
/// let phenotype = NetworkDecoder.decode(&genome);
/// let kinds: Vec<_> = phenotype.neurons.iter().map(|n| n.kind).collect();
/// assert_eq!(kinds, [NodeKind::Bias, NodeKind::Input, NodeKind::Input, NodeKind::Output]);
/// assert!(phenotype.connections.iter().all(|c| c.target == 3));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkDecoder;

impl GenomeDecoder for NetworkDecoder {
    type Phenotype = Phenotype;

    fn decode(&self, genome: &Genome) -> Phenotype {
        let data = genome.data();
        let order = [
            NodeKind::Bias,
            NodeKind::Input,
            NodeKind::Output,
            NodeKind::Hidden,
        ];
        let neurons: Vec<Neuron> = order
            .iter()
            .flat_map(|kind| data.nodes_of_kind(*kind))
            .enumerate()
            .map(|(index, node)| Neuron {
                index,
                kind: node.kind(),
                activation: node.activation().unwrap_or(0.0),
            })
            .collect();
        let index_of: HashMap<NodeId, usize, RandomState> = order
            .iter()
            .flat_map(|kind| data.nodes_of_kind(*kind))
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();

        let connections = data
            .links()
            .filter_map(|link| {
                match (index_of.get(&link.source()), index_of.get(&link.target())) {
                    (Some(&source), Some(&target)) => Some(Connection {
                        source,
                        target,
                        weight: link.weight().unwrap_or(0.0),
                    }),
                    _ => {
                        log::warn!("genome {}: skipping dangling link {}", genome.id(), link);
                        None
                    }
                }
            })
            .collect();

        Phenotype {
            neurons,
            connections,
        }
    }
}
