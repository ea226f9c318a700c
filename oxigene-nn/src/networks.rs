//! A Network is the runnable form of a [`Phenotype`]:
//! neurons hold activation levels, and every activation
//! propagates them one step along the connections.
//!
//! The `Network` type is best suited for real-time control
//! tasks, with new inputs set for each activation and multiple
//! time-steps involved. For a more instantaneous input-result
//! use-case, [`FunctionApproximator`] is more appropiate.
mod function_approximator;

pub use function_approximator::FunctionApproximator;

use crate::decoder::{NetworkDecoder, Phenotype};

use oxigene::evolution::GenomeDecoder;
use oxigene::genomics::{Genome, NodeKind};

/// Activation level of bias neurons.
pub const BIAS_ACTIVATION: f64 = 1.0;

/// Steepened sigmoid, as used in the original NEAT experiments.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Link {
    target: usize,
    weight: f64,
}

/// An arbitrarily-structured neural network.
#[derive(Clone, Debug)]
pub struct Network {
    bias_count: usize,
    input_count: usize,
    output_count: usize,
    initial_levels: Box<[f64]>,
    input_sums: Box<[f64]>,
    activation_levels: Box<[f64]>,
    links: Box<[Box<[Link]>]>,
}

impl Network {
    /// Builds a network from a decoded phenotype.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::NodeKind;
    /// use oxigene_nn::{Connection, Network, Neuron, Phenotype};
    ///
    /// let phenotype = Phenotype {
    ///     neurons: vec![
    ///         Neuron { index: 0, kind: NodeKind::Input, activation: 0.0 },
    ///         Neuron { index: 1, kind: NodeKind::Output, activation: 0.0 },
    ///     ],
    ///     connections: vec![Connection { source: 0, target: 1, weight: 1.0 }],
    /// };
    /// let mut network = Network::new(&phenotype);
    /// network.set_inputs(&[0.0]);
    /// network.activate();
    /// assert_eq!(network.outputs(), vec![0.5]);
    /// ```
    pub fn new(phenotype: &Phenotype) -> Network {
        let neuron_count = phenotype.neurons.len();
        let initial_levels: Box<[f64]> = phenotype
            .neurons
            .iter()
            .map(|n| match n.kind {
                NodeKind::Bias => BIAS_ACTIVATION,
                _ => n.activation,
            })
            .collect();
        let mut links = vec![vec![]; neuron_count];
        for connection in &phenotype.connections {
            if connection.source < neuron_count && connection.target < neuron_count {
                links[connection.source].push(Link {
                    target: connection.target,
                    weight: connection.weight,
                });
            }
        }

        Network {
            bias_count: phenotype.count(NodeKind::Bias),
            input_count: phenotype.count(NodeKind::Input),
            output_count: phenotype.count(NodeKind::Output),
            input_sums: vec![0.0; neuron_count].into(),
            activation_levels: initial_levels.clone(),
            initial_levels,
            links: links.into_iter().map(|v| v.into()).collect(),
        }
    }

    /// Decodes a genome and builds its network.
    pub fn from_genome(genome: &Genome) -> Network {
        Network::new(&NetworkDecoder.decode(genome))
    }

    /// Number of bias and input neurons, which are never
    /// recomputed by activation.
    fn source_count(&self) -> usize {
        self.bias_count + self.input_count
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    pub fn neuron_count(&self) -> usize {
        self.activation_levels.len()
    }

    /// Fires all neurons, propagating all activations
    /// (including set inputs), and then computing
    /// new activation levels.
    pub fn activate(&mut self) {
        self.fire_neurons();
        self.compute_activations();
    }

    /// Propagates each neuron's signal through all its
    /// outgoing connections.
    fn fire_neurons(&mut self) {
        for (activation, outgoing) in self.activation_levels.iter().zip(self.links.iter()) {
            for link in outgoing.iter() {
                self.input_sums[link.target] += *activation * link.weight;
            }
        }
    }

    /// Computes each non-source neuron's activation
    /// level, based on input sum.
    fn compute_activations(&mut self) {
        let sources = self.source_count();
        for (input_sum, activation_level) in self.input_sums[sources..]
            .iter_mut()
            .zip(&mut self.activation_levels[sources..])
        {
            *activation_level = sigmoid(*input_sum);
            *input_sum = 0.0;
        }
    }

    /// Restores every neuron to its initial activation level.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::NodeKind;
    /// use oxigene_nn::{Connection, Network, Neuron, Phenotype};
    ///
    /// let phenotype = Phenotype {
    ///     neurons: vec![
    ///         Neuron { index: 0, kind: NodeKind::Bias, activation: 0.0 },
    ///         Neuron { index: 1, kind: NodeKind::Output, activation: 0.0 },
    ///     ],
    ///     connections: vec![Connection { source: 0, target: 1, weight: 1.0 }],
    /// };
    /// let mut network = Network::new(&phenotype);
    /// network.activate();
    /// assert_ne!(network.outputs()[0], 0.0);
    ///
    /// network.clear_state();
    /// assert_eq!(network.outputs()[0], 0.0);
    /// ```
    pub fn clear_state(&mut self) {
        self.activation_levels.copy_from_slice(&self.initial_levels);
        self.input_sums.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Sets the activation level of each input neuron
    /// to the corresponding value in the passed slice.
    ///
    /// # Panics
    /// This function panics if the length of the passed
    /// slice is not equal to the number of inputs in the network.
    pub fn set_inputs(&mut self, values: &[f64]) {
        let start = self.bias_count;
        self.activation_levels[start..start + self.input_count].copy_from_slice(values);
    }

    /// Returns the current output neuron activation levels
    /// as a vector.
    pub fn outputs(&self) -> Vec<f64> {
        let start = self.source_count();
        self.activation_levels[start..start + self.output_count].to_vec()
    }
}

impl From<&Phenotype> for Network {
    fn from(phenotype: &Phenotype) -> Network {
        Network::new(phenotype)
    }
}
