use super::{MutationOperator, NoChildProduced, OperatorError};
use crate::genomics::{GeneticsFactory, Genome};
use crate::{GenomeId, InnovationService, NodeId};

use rand::seq::SliceRandom;
use rand::RngCore;

/// Connects a randomly chosen pair of unconnected nodes.
///
/// Sources may be any node; targets may be any output or
/// hidden node. Pairs are tried in random order until an
/// unconnected one is found.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddLink;

impl<I: InnovationService> MutationOperator<I> for AddLink {
    fn label(&self) -> &str {
        "add-link"
    }

    fn mutate(
        &self,
        child_id: GenomeId,
        parent: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError> {
        let data = parent.data();
        let mut targets: Vec<NodeId> = data
            .nodes()
            .filter(|n| n.kind().accepts_links())
            .map(|n| n.id())
            .collect();
        if targets.is_empty() {
            return Err(NoChildProduced::NoEligibleTargets.into());
        }

        let mut sources: Vec<NodeId> = data.node_ids().collect();
        sources.shuffle(rng);
        for source in sources {
            targets.shuffle(rng);
            let unconnected = targets
                .iter()
                .copied()
                .find(|&target| !data.is_connected(source, target));
            if let Some(target) = unconnected {
                let mut child = factory.copy_data(data);
                let link = factory.create_link_gene(child.next_link_id(), source, target, rng);
                child.add_link(link)?;
                return Ok(factory.create_genome_with(child_id, child));
            }
        }
        Err(NoChildProduced::FullyConnected.into())
    }
}
