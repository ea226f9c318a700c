use crate::{LinkId, NodeId};

use thiserror::Error;

/// A structural invariant of a [`GeneMap`] was, or would have been, broken.
///
/// [`GeneMap`]: crate::genomics::GeneMap
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneMapError {
    #[error("duplicate node insertion with id {0}")]
    DuplicateNodeId(NodeId),
    #[error("duplicate link insertion with id {0}")]
    DuplicateLinkId(LinkId),
    #[error("link {link} between nonexistant endpoint(s) {source_id} -> {target_id}")]
    NonexistantEndpoints {
        link: LinkId,
        source_id: NodeId,
        target_id: NodeId,
    },
    #[error("link {link} with endpoints {source_id} -> {target_id} shadows link {existing}")]
    DuplicateEndpoints {
        link: LinkId,
        existing: LinkId,
        source_id: NodeId,
        target_id: NodeId,
    },
    #[error("link {link} targets input or bias node {target_id}")]
    InputTarget { link: LinkId, target_id: NodeId },
    #[error("attempted removal of nonexistant node with id {0}")]
    AbsentNode(NodeId),
    #[error("attempted removal of nonexistant link with id {0}")]
    AbsentLink(LinkId),
    #[error("attempted removal of node {0} which still has incident links")]
    NodeHasLinks(NodeId),
    #[error("gene stored under id {key} reports id {actual}")]
    IdMismatch { key: usize, actual: usize },
    #[error("adjacency index out of sync for node {0}")]
    StaleIndex(NodeId),
}

/// A configuration value, or an operator's construction
/// arguments, can not be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("required float field `{0}` is missing")]
    MissingField(String),
    #[error("field `{0}` has inconsistent ranges")]
    InvalidField(String),
    #[error("adjustment must be eligible for links, nodes, or both")]
    NothingEligible,
    #[error("{0}")]
    Invalid(String),
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}
