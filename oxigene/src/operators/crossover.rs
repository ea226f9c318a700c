use super::{CrossoverOperator, OperatorError};
use crate::genomics::{GeneMap, GeneMapError, GeneticsFactory, Genome, LinkGene};
use crate::{GenomeId, InnovationService};

use rand::{Rng, RngCore};

use std::cmp::Ordering;

/// Innovation-aligned crossover.
///
/// The fitter parent (the first one on ties) is the "stronger"
/// parent. Both parents' links are walked in innovation order:
/// matching links are inherited from either parent at random,
/// the stronger parent's disjoint and excess links are always
/// inherited, and the weaker parent's never are. Endpoints come
/// from the same parent as the link; a node already present in
/// the child is replaced by the other parent's copy half of the
/// time. Finally every bias, input and output node of the stronger
/// parent is added if missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCrossover;

impl StandardCrossover {
    /// Copies `link` and its endpoints from `parent` into `child`.
    fn inherit(
        child: &mut GeneMap,
        link: &LinkGene,
        parent: &GeneMap,
        rng: &mut dyn RngCore,
    ) -> Result<(), GeneMapError> {
        let (source, target) = link.endpoints();
        for endpoint in [source, target] {
            let node = parent
                .node(endpoint)
                .ok_or(GeneMapError::AbsentNode(endpoint))?;
            if !child.contains_node(endpoint) {
                child.add_node(node.clone())?;
            } else if rng.gen_bool(0.5) {
                child.replace_node(node.clone())?;
            }
        }

        if let Some(existing) = child.link_between(source, target) {
            log::trace!(
                "skipping link {} already expressed by link {} in child",
                link,
                existing
            );
            return Ok(());
        }
        let link = if child.contains_link(link.id()) {
            link.with_id(child.next_link_id())
        } else {
            link.clone()
        };
        child.add_link(link)?;
        Ok(())
    }
}

impl<I: InnovationService> CrossoverOperator<I> for StandardCrossover {
    fn label(&self) -> &str {
        "crossover"
    }

    fn crossover(
        &self,
        child_id: GenomeId,
        first: &Genome,
        second: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError> {
        let (stronger, weaker) = if second.fitness() > first.fitness() {
            (second.data(), first.data())
        } else {
            (first.data(), second.data())
        };
        let strong_links = stronger.links_by_innovation();
        let weak_links = weaker.links_by_innovation();

        let mut child = GeneMap::new();
        let (mut s, mut w) = (0, 0);
        while s < strong_links.len() {
            let strong = strong_links[s];
            let weak = match weak_links.get(w) {
                Some(weak) => *weak,
                None => {
                    Self::inherit(&mut child, strong, stronger, rng)?;
                    s += 1;
                    continue;
                }
            };
            match strong.innovation().cmp(&weak.innovation()) {
                Ordering::Less => {
                    Self::inherit(&mut child, strong, stronger, rng)?;
                    s += 1;
                }
                Ordering::Greater => w += 1,
                Ordering::Equal => {
                    if rng.gen_bool(0.5) {
                        Self::inherit(&mut child, strong, stronger, rng)?;
                    } else {
                        Self::inherit(&mut child, weak, weaker, rng)?;
                    }
                    s += 1;
                    w += 1;
                }
            }
        }

        for node in stronger.nodes().filter(|n| n.kind().is_interface()) {
            if !child.contains_node(node.id()) {
                child.add_node(node.clone())?;
            }
        }
        child.validate()?;
        Ok(factory.create_genome_with(child_id, child))
    }
}
