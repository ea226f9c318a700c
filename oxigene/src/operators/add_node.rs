use super::{MutationOperator, NoChildProduced, OperatorError};
use crate::genomics::{FieldSpec, FieldValue, GeneticsFactory, Genome, NodeKind, WEIGHT};
use crate::{GenomeId, InnovationService, LinkId};

use rand::seq::IteratorRandom;
use rand::RngCore;

/// Splits a randomly chosen link `A -> B` into `A -> C -> B`,
/// with `C` a new hidden node. The split link is removed.
///
/// The id of `C` comes from the factory's innovation service,
/// so genomes splitting the same link grow the same node.
///
/// If links carry a float weight, `A -> C` gets weight 1
/// (clamped to the weight's range) and `C -> B` keeps the
/// weight of the split link, so the network's behavior
/// changes as little as possible.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddNode;

impl<I: InnovationService> MutationOperator<I> for AddNode {
    fn label(&self) -> &str {
        "add-node"
    }

    fn mutate(
        &self,
        child_id: GenomeId,
        parent: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError> {
        let split: LinkId = parent
            .data()
            .link_ids()
            .choose(rng)
            .ok_or(NoChildProduced::NoLinks)?;

        let mut child = factory.copy_data(parent.data());
        let split = child.remove_link(split)?;
        let (source, target) = split.endpoints();

        let hidden = factory.split_node_id(&split, &child);
        let hidden = factory.create_node_gene(hidden, NodeKind::Hidden, rng);
        let hidden = child.add_node(hidden)?.id();

        let mut incoming = factory.create_link_gene(child.next_link_id(), source, hidden, rng);
        if let Some(FieldSpec::Float { lifetime, .. }) = factory.config().link_fields.get(WEIGHT) {
            incoming.set_field(WEIGHT, FieldValue::Float(lifetime.clamp(1.0)));
        }
        child.add_link(incoming)?;

        let mut outgoing = factory.create_link_gene(child.next_link_id(), hidden, target, rng);
        if let Some(weight) = split.fields().get(WEIGHT) {
            outgoing.set_field(WEIGHT, weight);
        }
        child.add_link(outgoing)?;

        Ok(factory.create_genome_with(child_id, child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneMap;
    use crate::operators::testing::{hidden_count, seeded, xor_factory};

    #[test]
    fn adds_one_node_and_one_net_link() {
        let mut rng = seeded(5);
        let mut factory = xor_factory();
        let parent = factory.create_genome(0, &mut rng);
        let child = AddNode.mutate(1, &parent, &mut factory, &mut rng).unwrap();

        assert_eq!(child.data().node_count(), parent.data().node_count() + 1);
        assert_eq!(child.data().link_count(), parent.data().link_count() + 1);
        assert_eq!(hidden_count(&child), 1);
        child.validate().unwrap();
    }

    #[test]
    fn split_link_is_replaced() {
        let mut rng = seeded(8);
        let mut factory = xor_factory();
        let parent = factory.create_genome(0, &mut rng);
        let child = AddNode.mutate(1, &parent, &mut factory, &mut rng).unwrap();
        let data = child.data();

        let hidden = data.nodes_of_kind(NodeKind::Hidden).next().unwrap().id();
        assert_eq!(hidden, 4);
        let incoming = data.link(data.incoming(hidden).next().unwrap()).unwrap();
        let outgoing = data.link(data.outgoing(hidden).next().unwrap()).unwrap();
        assert_eq!(outgoing.target(), 3);
        assert!(!data.is_connected(incoming.source(), 3));
        assert_eq!(incoming.weight(), Some(1.0));

        let split = parent
            .data()
            .link_between(incoming.source(), 3)
            .and_then(|id| parent.data().link(id))
            .unwrap();
        assert_eq!(outgoing.weight(), split.weight());
    }

    #[test]
    fn new_links_get_new_ids() {
        let mut rng = seeded(2);
        let mut factory = xor_factory();
        let parent = factory.create_genome(0, &mut rng);
        let child = AddNode.mutate(1, &parent, &mut factory, &mut rng).unwrap();
        let mut ids: Vec<_> = child.data().link_ids().collect();
        ids.sort_unstable();
        assert_eq!(ids.len(), 4);
        assert!(ids.ends_with(&[3, 4]));
    }

    #[test]
    fn hidden_nodes_are_identified_by_the_split_link() {
        let mut rng = seeded(17);
        let mut factory = xor_factory();
        let base = factory.create_genome(0, &mut rng);
        let split_of = |child: &Genome| {
            base.data()
                .link_ids()
                .find(|&id| !child.data().contains_link(id))
                .unwrap()
        };
        let hidden_of =
            |child: &Genome| child.data().nodes_of_kind(NodeKind::Hidden).next().unwrap().id();
        let innovations_of = |child: &Genome| {
            let data = child.data();
            let hidden = hidden_of(child);
            let incoming = data.link(data.incoming(hidden).next().unwrap()).unwrap();
            let outgoing = data.link(data.outgoing(hidden).next().unwrap()).unwrap();
            (incoming.innovation(), outgoing.innovation())
        };

        let first = AddNode.mutate(1, &base, &mut factory, &mut rng).unwrap();
        let (mut same, mut other) = (None, None);
        let mut id = 2;
        while same.is_none() || other.is_none() {
            let child = AddNode.mutate(id, &base, &mut factory, &mut rng).unwrap();
            id += 1;
            if split_of(&child) == split_of(&first) {
                same = same.or(Some(child));
            } else {
                other = other.or(Some(child));
            }
        }
        let (same, other) = (same.unwrap(), other.unwrap());

        assert_eq!(hidden_of(&same), hidden_of(&first));
        assert_eq!(innovations_of(&same), innovations_of(&first));

        assert_ne!(hidden_of(&other), hidden_of(&first));
        let (first_in, first_out) = innovations_of(&first);
        let (other_in, other_out) = innovations_of(&other);
        assert_ne!(other_in, first_in);
        assert_ne!(other_out, first_out);
    }

    #[test]
    fn fails_without_links() {
        let mut rng = seeded(0);
        let mut factory = xor_factory();
        let genome = factory.create_genome_with(0, GeneMap::new());
        assert_eq!(
            AddNode.mutate(1, &genome, &mut factory, &mut rng),
            Err(NoChildProduced::NoLinks.into())
        );
    }
}
