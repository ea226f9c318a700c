//! Innovations are historical markers: two link genes in different
//! genomes carrying the same [`Innovation`] are treated as the same
//! structural gene when genomes are aligned for crossover.
//!
//! Hidden node ids are issued by the same service, so that a node id
//! designates the same node in every genome of a run.
//!
//! Innovations are issued by an [`InnovationService`], which is injected
//! into the [`GeneticsFactory`] instead of living in process-wide state,
//! so that runs are reproducible and independent of each other.
//!
//! [`GeneticsFactory`]: crate::genomics::GeneticsFactory
use crate::NodeId;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;

/// Identifier used to designate historically
/// identical link genes for the purposes of
/// genome alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Innovation(u64);

impl Innovation {
    /// Wraps a raw innovation number.
    ///
    /// # Examples
    /// ```
    /// use oxigene::Innovation;
    ///
    /// assert!(Innovation::new(3) < Innovation::new(4));
    /// assert_eq!(Innovation::new(7).value(), 7);
    /// ```
    pub const fn new(value: u64) -> Innovation {
        Innovation(value)
    }

    /// Returns the raw innovation number.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Innovation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A source of innovations for newly created link genes.
pub trait InnovationService {
    /// Returns the innovation for a link gene
    /// going from `source` to `target`.
    fn link_innovation(&mut self, source: NodeId, target: NodeId) -> Innovation;

    /// Returns the id of the hidden node inserted by splitting the
    /// link with innovation `split`.
    ///
    /// Hidden ids start at `first_hidden`. `in_use` reports the ids
    /// already taken in the genome being mutated; the returned id is
    /// never one of them.
    fn split_node(
        &mut self,
        split: Innovation,
        first_hidden: NodeId,
        in_use: &dyn Fn(NodeId) -> bool,
    ) -> NodeId;

    /// Returns the highest innovation issued so far, if any.
    fn latest(&self) -> Option<Innovation>;
}

/// Claims the first id from `next` on that is a hidden
/// id and is not taken in the genome.
fn claim_node_id(
    next: &mut NodeId,
    first_hidden: NodeId,
    in_use: &dyn Fn(NodeId) -> bool,
) -> NodeId {
    let mut id = (*next).max(first_hidden);
    while in_use(id) {
        id += 1;
    }
    *next = id + 1;
    id
}

/// Issues a fresh innovation on every request.
///
/// Two structurally identical links created by separate
/// mutations will never align under this service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InnovationCounter {
    next: u64,
    next_node: NodeId,
}

impl InnovationCounter {
    /// Returns a counter whose first innovation is `#0`.
    pub fn new() -> InnovationCounter {
        InnovationCounter::default()
    }
}

impl InnovationService for InnovationCounter {
    fn link_innovation(&mut self, _source: NodeId, _target: NodeId) -> Innovation {
        let innovation = Innovation(self.next);
        self.next += 1;
        innovation
    }

    fn split_node(
        &mut self,
        _split: Innovation,
        first_hidden: NodeId,
        in_use: &dyn Fn(NodeId) -> bool,
    ) -> NodeId {
        claim_node_id(&mut self.next_node, first_hidden, in_use)
    }

    fn latest(&self) -> Option<Innovation> {
        self.next.checked_sub(1).map(Innovation)
    }
}

/// A `History` keeps track of link innovations in a run,
/// so that identical connections are assigned the same
/// innovation no matter which genome produced them.
///
/// Connections are identified by their (source, target)
/// node ids. Hidden nodes are identified by the link they
/// split: splitting the same link in two genomes yields the
/// same node id, splitting different links never does.
/// A genome splitting a link again after re-growing it gets
/// a fresh node.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    next: u64,
    next_node: NodeId,
    by_endpoints: HashMap<(NodeId, NodeId), Innovation, RandomState>,
    by_split: HashMap<Innovation, NodeId, RandomState>,
}

impl History {
    /// Creates an empty history.
    ///
    /// # Examples
    /// ```
    /// use oxigene::{History, InnovationService};
    ///
    /// let mut history = History::new();
    /// let first = history.link_innovation(0, 3);
    /// let second = history.link_innovation(1, 3);
    ///
    /// // The same connection is always given the same innovation.
    /// assert_eq!(history.link_innovation(0, 3), first);
    /// assert!(first < second);
    /// ```
    pub fn new() -> History {
        History::default()
    }

    /// Returns the innovation previously recorded for
    /// the connection, without recording a new one.
    pub fn recorded(&self, source: NodeId, target: NodeId) -> Option<Innovation> {
        self.by_endpoints.get(&(source, target)).copied()
    }

    /// Returns the hidden node recorded for splits of the
    /// link with innovation `split`.
    pub fn recorded_split(&self, split: Innovation) -> Option<NodeId> {
        self.by_split.get(&split).copied()
    }

    /// Returns the number of distinct connections recorded.
    pub fn len(&self) -> usize {
        self.by_endpoints.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.by_endpoints.is_empty()
    }

    /// Iterates over every recorded connection in the format
    /// `((source, target), innovation)`. No ordering is guaranteed.
    pub fn iter(&self) -> impl Iterator<Item = (&(NodeId, NodeId), &Innovation)> {
        self.by_endpoints.iter()
    }
}

impl InnovationService for History {
    fn link_innovation(&mut self, source: NodeId, target: NodeId) -> Innovation {
        match self.by_endpoints.entry((source, target)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = Innovation(self.next);
                self.next += 1;
                *entry.insert(innovation)
            }
        }
    }

    fn split_node(
        &mut self,
        split: Innovation,
        first_hidden: NodeId,
        in_use: &dyn Fn(NodeId) -> bool,
    ) -> NodeId {
        match self.by_split.get(&split) {
            Some(&id) if !in_use(id) => id,
            Some(_) => claim_node_id(&mut self.next_node, first_hidden, in_use),
            None => {
                let id = claim_node_id(&mut self.next_node, first_hidden, in_use);
                self.by_split.insert(split, id);
                id
            }
        }
    }

    fn latest(&self) -> Option<Innovation> {
        self.next.checked_sub(1).map(Innovation)
    }
}
