use super::Network;
use crate::decoder::{NetworkDecoder, Phenotype};

use oxigene::evolution::GenomeDecoder;
use oxigene::genomics::Genome;

/// A neural network best suited for function
/// approximation.
///
/// Every evaluation starts from a cleared network and
/// activates it as many times as the longest path from
/// a bias or input neuron to an output neuron.
///
/// # Generic parameters
/// `MAX_NODE_VISITS`: the maximum number of times a neuron
/// can be visited in a path through the network before
/// the network's activation freezes. Setting it to 0 will
/// effectively disable the entire network, 1 will dissallow
/// any cycles, 2 will allow single pass through the longest
/// cycle in the network, etc.
#[derive(Clone, Debug)]
pub struct FunctionApproximator<const MAX_NODE_VISITS: u8> {
    network: Network,
    depth: usize,
}

impl<const MAX_NODE_VISITS: u8> FunctionApproximator<MAX_NODE_VISITS> {
    /// Builds an approximator from a decoded phenotype.
    ///
    /// # Complexity
    /// This function has `O(d^(n × MAX_NODE_VISITS))` time complexity,
    /// and `O(n × MAX_NODE_VISITS)` space complexity,
    /// where `d` is the highest outgoing connection count of a neuron.
    pub fn new(phenotype: &Phenotype) -> FunctionApproximator<MAX_NODE_VISITS> {
        let network = Network::new(phenotype);
        let depth = (0..network.source_count())
            .map(|root| {
                Self::calculate_depth(&network, root, &mut vec![0; network.neuron_count()], 0)
            })
            .max()
            .unwrap_or(0);

        FunctionApproximator { network, depth }
    }

    /// Decodes a genome and builds its approximator.
    pub fn from_genome(genome: &Genome) -> FunctionApproximator<MAX_NODE_VISITS> {
        FunctionApproximator::new(&NetworkDecoder.decode(genome))
    }

    /// Number of activations per evaluation.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Calculates the length of the longest path
    /// from the `root` neuron that doesn't pass through
    /// any neuron more than `MAX_NODE_VISITS` times.
    fn calculate_depth(
        network: &Network,
        root: usize,
        visited: &mut [u8],
        current_depth: usize,
    ) -> usize {
        let mut max_depth = 0;

        for link in network.links[root].iter() {
            if visited[link.target] < MAX_NODE_VISITS {
                visited[link.target] += 1;
                max_depth = max_depth.max(Self::calculate_depth(
                    network,
                    link.target,
                    visited,
                    current_depth + 1,
                ));
                visited[link.target] -= 1;
            }
        }

        let outputs = network.source_count()..network.source_count() + network.output_count;
        if max_depth == 0 && outputs.contains(&root) {
            current_depth
        } else {
            max_depth
        }
    }

    /// Returns the approximated function's value
    /// at the point given by `inputs`.
    ///
    /// # Panics
    /// Panics if `inputs` does not have one value per input neuron.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::NodeKind;
    /// use oxigene_nn::networks::{sigmoid, FunctionApproximator};
    /// use oxigene_nn::{Connection, Neuron, Phenotype};
    ///
    /// // An input feeding an output through one hidden neuron.
    /// let neuron = |index, kind| Neuron { index, kind, activation: 0.0 };
    /// let phenotype = Phenotype {
    ///     neurons: vec![
    ///         neuron(0, NodeKind::Input),
    ///         neuron(1, NodeKind::Output),
    ///         neuron(2, NodeKind::Hidden),
    ///     ],
    ///     connections: vec![
    ///         Connection { source: 0, target: 2, weight: 1.0 },
    ///         Connection { source: 2, target: 1, weight: 1.0 },
    ///     ],
    /// };
    /// let mut network = FunctionApproximator::<1>::new(&phenotype);
    ///
    /// // The result is identical to double application of a sigmoid function.
    /// for input in -20..=20 {
    ///     let input = input as f64 / 10.0;
    ///     assert_eq!(network.evaluate_at(&[input])[0], sigmoid(sigmoid(input)));
    /// }
    /// ```
    pub fn evaluate_at(&mut self, inputs: &[f64]) -> Vec<f64> {
        self.network.clear_state();
        self.network.set_inputs(inputs);
        for _ in 0..self.depth {
            self.network.activate();
        }
        self.network.outputs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::sigmoid;
    use crate::networks::testing::{genome, link, node};

    use oxigene::genomics::NodeKind;

    fn test_genome() -> Genome {
        genome(
            vec![
                node(0, NodeKind::Input),
                node(1, NodeKind::Output),
                node(2, NodeKind::Hidden),
            ],
            vec![
                link(0, 0, 1, 0.0),
                link(1, 0, 2, 0.0),
                link(2, 1, 1, 0.0),
                link(3, 1, 2, 0.0),
                link(4, 2, 1, 0.0),
                link(5, 2, 2, 0.0),
            ],
        )
    }

    #[test]
    fn max_visits_0() {
        let network = FunctionApproximator::<0>::from_genome(&test_genome());
        assert_eq!(network.depth(), 0)
    }

    #[test]
    fn max_visits_1() {
        let network = FunctionApproximator::<1>::from_genome(&test_genome());
        assert_eq!(network.depth(), 2)
    }

    #[test]
    fn max_visits_2() {
        let network = FunctionApproximator::<2>::from_genome(&test_genome());
        assert_eq!(network.depth(), 4)
    }

    #[test]
    fn max_visits_3() {
        let network = FunctionApproximator::<3>::from_genome(&test_genome());
        assert_eq!(network.depth(), 6)
    }

    #[test]
    fn bias_counts_as_a_root() {
        let genome = genome(
            vec![
                node(0, NodeKind::Bias),
                node(1, NodeKind::Input),
                node(2, NodeKind::Output),
                node(3, NodeKind::Hidden),
            ],
            vec![link(0, 0, 3, 1.0), link(1, 3, 2, 1.0), link(2, 1, 2, 1.0)],
        );
        let mut network = FunctionApproximator::<1>::from_genome(&genome);
        assert_eq!(network.depth(), 2);
        let expected = sigmoid(sigmoid(1.0) + 0.5);
        assert_eq!(network.evaluate_at(&[0.5]), vec![expected]);
    }
}
