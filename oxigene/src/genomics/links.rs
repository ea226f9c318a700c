use super::{FieldValue, Fields, WEIGHT};
use crate::{Innovation, LinkId, NodeId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Links are the connective elements of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LinkGene {
    id: LinkId,
    source: NodeId,
    target: NodeId,
    innovation: Innovation,
    fields: Fields,
}

impl LinkGene {
    /// Returns a new link with the specified parameters.
    pub fn new(
        id: LinkId,
        source: NodeId,
        target: NodeId,
        innovation: Innovation,
        fields: Fields,
    ) -> LinkGene {
        LinkGene {
            id,
            source,
            target,
            innovation,
            fields,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Returns the id of the node the link starts at.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the id of the node the link ends at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Returns the link's weight, if it carries one.
    pub fn weight(&self) -> Option<f64> {
        self.fields.float(WEIGHT)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.set(name, value)
    }

    /// Returns a copy of this link under a different id,
    /// keeping endpoints, innovation and field values.
    pub(crate) fn with_id(&self, id: LinkId) -> LinkGene {
        LinkGene {
            id,
            fields: self.fields.clone(),
            ..*self
        }
    }
}

impl fmt::Display for LinkGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}[{}->{}; {}]",
            self.id, self.innovation, self.source, self.target, self.fields
        )
    }
}
