use super::{FieldValue, Fields, ACTIVATION};
use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NodeKind indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Constant-output nodes.
    Bias,
    /// Input nodes.
    Input,
    /// Output nodes.
    Output,
    /// Hidden nodes.
    Hidden,
}

impl NodeKind {
    /// Returns `true` for the kinds that make up a
    /// genome's fixed interface (bias, input, output).
    pub fn is_interface(self) -> bool {
        !matches!(self, NodeKind::Hidden)
    }

    /// Returns `true` if links may end at nodes of this kind.
    pub fn accepts_links(self) -> bool {
        matches!(self, NodeKind::Output | NodeKind::Hidden)
    }
}

/// Nodes are the structural elements of genomes
/// between which links are created.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    id: NodeId,
    kind: NodeKind,
    fields: Fields,
}

impl NodeGene {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{Fields, NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(5, NodeKind::Hidden, Fields::new());
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.activation(), None);
    /// ```
    pub fn new(id: NodeId, kind: NodeKind, fields: Fields) -> NodeGene {
        NodeGene { id, kind, fields }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Returns the node's initial activation value.
    pub fn activation(&self) -> Option<f64> {
        self.fields.float(ACTIVATION)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.set(name, value)
    }

    /// Returns a copy of this node under a different id.
    pub(crate) fn with_id(&self, id: NodeId) -> NodeGene {
        NodeGene {
            id,
            kind: self.kind,
            fields: self.fields.clone(),
        }
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{:?}; {}]", self.id, self.kind, self.fields)
    }
}
