use super::{MutationOperator, NoChildProduced, OperatorError};
use crate::genomics::{
    check_probability, ConfigError, FieldConfig, Fields, GeneMap, GeneticsFactory, Genome,
};
use crate::{GenomeId, InnovationService, LinkId, NodeId};

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GeneRef {
    Link(LinkId),
    Node(NodeId),
}

#[derive(Clone, Debug, PartialEq)]
enum Adjustment {
    /// Genes and fields are each selected with a probability.
    Sampled {
        gene_probability: f64,
        field_probability: f64,
    },
    /// One named field is adjusted on every eligible gene.
    Field(String),
}

/// Perturbs the field values of link and/or node genes.
///
/// Float fields receive gaussian noise and are clamped to their
/// configured lifetime range; boolean fields are negated. Integer
/// fields are left untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct AdjustAttributes {
    links: bool,
    nodes: bool,
    adjustment: Adjustment,
}

impl AdjustAttributes {
    /// Every eligible gene is selected with `gene_probability`, and
    /// every mutable field of a selected gene with `field_probability`.
    /// If no gene (or no field of a selected gene) is drawn, exactly
    /// one is picked at random instead.
    ///
    /// # Errors
    /// Returns an error if neither links nor nodes are eligible,
    /// or if either probability is outside [0, 1].
    ///
    /// # Examples
    /// ```
    /// use oxigene::operators::AdjustAttributes;
    ///
    /// assert!(AdjustAttributes::new(true, false, 0.8, 1.0).is_ok());
    /// assert!(AdjustAttributes::new(false, false, 0.8, 1.0).is_err());
    /// assert!(AdjustAttributes::new(true, true, 1.2, 1.0).is_err());
    /// ```
    pub fn new(
        links: bool,
        nodes: bool,
        gene_probability: f64,
        field_probability: f64,
    ) -> Result<AdjustAttributes, ConfigError> {
        if !links && !nodes {
            return Err(ConfigError::NothingEligible);
        }
        check_probability("gene_probability", gene_probability)?;
        check_probability("field_probability", field_probability)?;
        Ok(AdjustAttributes {
            links,
            nodes,
            adjustment: Adjustment::Sampled {
                gene_probability,
                field_probability,
            },
        })
    }

    /// Adjusts the field `name` on every eligible gene carrying it.
    ///
    /// # Errors
    /// Returns an error if neither links nor nodes are eligible.
    pub fn single_field(
        links: bool,
        nodes: bool,
        name: impl Into<String>,
    ) -> Result<AdjustAttributes, ConfigError> {
        if !links && !nodes {
            return Err(ConfigError::NothingEligible);
        }
        Ok(AdjustAttributes {
            links,
            nodes,
            adjustment: Adjustment::Field(name.into()),
        })
    }

    fn eligible_genes(&self, data: &GeneMap) -> Vec<GeneRef> {
        let links = data
            .link_ids()
            .filter(|_| self.links)
            .map(GeneRef::Link);
        let nodes = data
            .node_ids()
            .filter(|_| self.nodes)
            .map(GeneRef::Node);
        links.chain(nodes).collect()
    }
}

/// Gives mutable access to the fields of a gene, along
/// with the field configuration for its gene kind.
fn fields_of<'a>(
    data: &'a mut GeneMap,
    gene: GeneRef,
    node_fields: &'a FieldConfig,
    link_fields: &'a FieldConfig,
) -> Option<(&'a mut Fields, &'a FieldConfig)> {
    match gene {
        GeneRef::Link(id) => data.link_mut(id).map(|l| (l.fields_mut(), link_fields)),
        GeneRef::Node(id) => data.node_mut(id).map(|n| (n.fields_mut(), node_fields)),
    }
}

/// Names of the fields that mutation can perturb.
fn mutable_fields(fields: &Fields, config: &FieldConfig) -> Vec<String> {
    fields
        .iter()
        .filter(|(name, value)| config.get(name).map_or(false, |spec| spec.mutates(value)))
        .map(|(name, _)| name.to_owned())
        .collect()
}

/// Perturbs the named field, returning `true` if its value changed.
fn perturb(fields: &mut Fields, name: &str, config: &FieldConfig, rng: &mut dyn RngCore) -> bool {
    let (spec, current) = match (config.get(name), fields.get(name)) {
        (Some(spec), Some(current)) => (spec, current),
        _ => return false,
    };
    match spec.perturb(current, rng) {
        Some(adjusted) if adjusted != current => {
            fields.set(name, adjusted);
            true
        }
        _ => false,
    }
}

/// Keeps each candidate with probability `p`, or a single
/// random one if none was kept.
fn sample<T: Copy>(candidates: &[T], p: f64, rng: &mut dyn RngCore) -> Vec<T> {
    let mut chosen: Vec<T> = candidates
        .iter()
        .copied()
        .filter(|_| rng.gen::<f64>() < p)
        .collect();
    if chosen.is_empty() {
        chosen.extend(candidates.choose(rng).copied());
    }
    chosen
}

impl<I: InnovationService> MutationOperator<I> for AdjustAttributes {
    fn label(&self) -> &str {
        "adjust-attributes"
    }

    fn mutate(
        &self,
        child_id: GenomeId,
        parent: &Genome,
        factory: &mut GeneticsFactory<I>,
        rng: &mut dyn RngCore,
    ) -> Result<Genome, OperatorError> {
        let mut child = factory.copy_data(parent.data());
        let genes = self.eligible_genes(&child);
        let node_fields = &factory.config().node_fields;
        let link_fields = &factory.config().link_fields;

        let mut changed = false;
        match &self.adjustment {
            Adjustment::Sampled {
                gene_probability,
                field_probability,
            } => {
                for gene in sample(&genes, *gene_probability, rng) {
                    if let Some((fields, config)) =
                        fields_of(&mut child, gene, node_fields, link_fields)
                    {
                        let names = mutable_fields(fields, config);
                        let indices: Vec<usize> = (0..names.len()).collect();
                        for i in sample(&indices, *field_probability, rng) {
                            changed |= perturb(fields, &names[i], config, rng);
                        }
                    }
                }
            }
            Adjustment::Field(name) => {
                for &gene in &genes {
                    if let Some((fields, config)) =
                        fields_of(&mut child, gene, node_fields, link_fields)
                    {
                        changed |= perturb(fields, name, config, rng);
                    }
                }
            }
        }

        if !changed {
            return Err(NoChildProduced::NothingAdjusted.into());
        }
        Ok(factory.create_genome_with(child_id, child))
    }
}
