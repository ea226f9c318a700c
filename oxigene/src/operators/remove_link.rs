use super::{MutationOperator, NoChildProduced, OperatorError};
use crate::genomics::{GeneticsFactory, Genome, NodeKind};
use crate::{GenomeId, InnovationService};

use rand::seq::IteratorRandom;
use rand::RngCore;

/// Removes a randomly chosen link. Hidden endpoints
/// left without any link are removed as well.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoveLink;

impl<I: InnovationService> MutationOperator<I> for RemoveLink {
    fn label(&self) -> &str {
        "remove-link"
    }

    fn mutate(
        &self,
        child_id: GenomeId,
        parent: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError> {
        let removed = parent
            .data()
            .link_ids()
            .choose(rng)
            .ok_or(NoChildProduced::NoLinks)?;

        let mut child = factory.copy_data(parent.data());
        let (source, target) = child.remove_link(removed)?.endpoints();
        for endpoint in [source, target] {
            let orphaned = child
                .node(endpoint)
                .map_or(false, |n| n.kind() == NodeKind::Hidden)
                && child.is_isolated(endpoint);
            if orphaned {
                log::trace!("removing orphaned hidden node {}", endpoint);
                child.remove_node(endpoint)?;
            }
        }
        Ok(factory.create_genome_with(child_id, child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneMap;
    use crate::operators::testing::{hidden_count, seeded, xor_factory};
    use crate::operators::AddNode;

    #[test]
    fn removes_one_link() {
        let mut rng = seeded(1);
        let mut factory = xor_factory();
        let parent = factory.create_genome(0, &mut rng);
        let child = RemoveLink.mutate(1, &parent, &mut factory, &mut rng).unwrap();
        assert_eq!(child.data().link_count(), 2);
        // Interface nodes are never removed.
        assert_eq!(child.data().node_count(), 4);
        child.validate().unwrap();
    }

    #[test]
    fn never_leaves_orphaned_hidden_nodes() {
        let mut rng = seeded(21);
        let mut factory = xor_factory();
        let mut genome = factory.create_genome(0, &mut rng);
        for id in 1..6 {
            genome = AddNode.mutate(id, &genome, &mut factory, &mut rng).unwrap();
        }
        let mut id = 6;
        while genome.data().link_count() > 0 {
            let links = genome.data().link_count();
            genome = RemoveLink.mutate(id, &genome, &mut factory, &mut rng).unwrap();
            id += 1;

            let data = genome.data();
            assert_eq!(data.link_count(), links - 1);
            for node in data.nodes_of_kind(NodeKind::Hidden) {
                assert!(!data.is_isolated(node.id()), "orphan {}", node);
            }
            data.validate().unwrap();
        }
        assert_eq!(hidden_count(&genome), 0);
        assert_eq!(genome.data().node_count(), 4);
    }

    #[test]
    fn removing_last_link_of_hidden_node_removes_it() {
        let mut rng = seeded(9);
        let mut factory = xor_factory();
        let parent = factory.create_genome(0, &mut rng);
        let split = AddNode.mutate(1, &parent, &mut factory, &mut rng).unwrap();
        assert_eq!(split.data().node_count(), 5);
        assert_eq!(split.data().link_count(), 4);

        // Leave only the link into the inserted node.
        let inserted = split.data().incoming(4).next().unwrap();
        let mut data = factory.copy_data(split.data());
        let others: Vec<_> = data.link_ids().filter(|&l| l != inserted).collect();
        for link in others {
            data.remove_link(link).unwrap();
        }
        let single = factory.create_genome_with(2, data);

        let child = RemoveLink.mutate(3, &single, &mut factory, &mut rng).unwrap();
        assert_eq!(child.data().link_count(), 0);
        assert_eq!(child.data().node_count(), 4);
        assert!(!child.data().contains_node(4));
    }

    #[test]
    fn fails_without_links() {
        let mut rng = seeded(0);
        let mut factory = xor_factory();
        let genome = factory.create_genome_with(0, GeneMap::new());
        assert_eq!(
            RemoveLink.mutate(1, &genome, &mut factory, &mut rng),
            Err(NoChildProduced::NoLinks.into())
        );
    }
}
