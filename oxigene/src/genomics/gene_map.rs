use super::{GeneMapError, LinkGene, NodeGene, NodeKind};
use crate::{LinkId, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Incoming and outgoing link ids of a single node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Adjacency {
    incoming: BTreeSet<LinkId>,
    outgoing: BTreeSet<LinkId>,
}

impl Adjacency {
    fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// The node and link genes owned by one genome,
/// plus per-node adjacency indices and the next
/// free node and link ids.
///
/// Ids are scoped to the map: they are unique within
/// it, and are never reissued once used, even after
/// the corresponding gene has been removed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneMap {
    nodes: BTreeMap<NodeId, NodeGene>,
    links: BTreeMap<LinkId, LinkGene>,
    adjacency: HashMap<NodeId, Adjacency, RandomState>,
    next_node_id: NodeId,
    next_link_id: LinkId,
}

impl GeneMap {
    /// Returns an empty gene map.
    pub fn new() -> GeneMap {
        GeneMap::default()
    }

    /// Add a new node to the map.
    /// Returns a reference to the newly inserted node.
    ///
    /// # Errors
    /// Returns an error if a node with the same id
    /// already exists.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{Fields, GeneMap, NodeGene, NodeKind};
    ///
    /// let mut map = GeneMap::new();
    /// map.add_node(NodeGene::new(4, NodeKind::Hidden, Fields::new())).unwrap();
    ///
    /// assert_eq!(map.node_count(), 1);
    /// assert_eq!(map.next_node_id(), 5);
    /// assert!(map.add_node(NodeGene::new(4, NodeKind::Output, Fields::new())).is_err());
    /// ```
    pub fn add_node(&mut self, node: NodeGene) -> Result<&mut NodeGene, GeneMapError> {
        if self.nodes.contains_key(&node.id()) {
            return Err(GeneMapError::DuplicateNodeId(node.id()));
        }
        Ok(self.insert_node_unchecked(node))
    }

    /// Add a new node to the map, assuming
    /// its id is not already in use.
    pub(crate) fn insert_node_unchecked(&mut self, node: NodeGene) -> &mut NodeGene {
        let id = node.id();
        self.next_node_id = self.next_node_id.max(id + 1);
        self.adjacency.entry(id).or_default();
        self.nodes.entry(id).or_insert(node)
    }

    /// Replaces the fields of an existing node with those
    /// of `node`, keeping its links. Returns the replaced node.
    ///
    /// # Errors
    /// Returns an error if no node with the same id exists.
    pub fn replace_node(&mut self, node: NodeGene) -> Result<NodeGene, GeneMapError> {
        match self.nodes.get_mut(&node.id()) {
            Some(existing) => Ok(std::mem::replace(existing, node)),
            None => Err(GeneMapError::AbsentNode(node.id())),
        }
    }

    /// Removes a node from the map.
    ///
    /// # Errors
    /// Returns an error if the node doesn't exist, or if
    /// links still start or end at it; those have to be
    /// removed first.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeGene, GeneMapError> {
        if !self.nodes.contains_key(&id) {
            return Err(GeneMapError::AbsentNode(id));
        }
        if self.adjacency.get(&id).map_or(false, |a| !a.is_empty()) {
            return Err(GeneMapError::NodeHasLinks(id));
        }
        self.adjacency.remove(&id);
        self.nodes
            .remove(&id)
            .ok_or(GeneMapError::AbsentNode(id))
    }

    /// Add a new link to the map.
    /// Returns a reference to the newly inserted link.
    ///
    /// # Errors
    /// Returns an error if the link's id is already in use,
    /// either endpoint is missing, the target is an input or
    /// bias node, or another link already connects the same
    /// pair of nodes in the same direction.
    ///
    /// # Examples
    /// ```
    /// use oxigene::genomics::{Fields, GeneMap, LinkGene, NodeGene, NodeKind};
    /// use oxigene::Innovation;
    ///
    /// let mut map = GeneMap::new();
    /// map.add_node(NodeGene::new(0, NodeKind::Input, Fields::new())).unwrap();
    /// map.add_node(NodeGene::new(1, NodeKind::Output, Fields::new())).unwrap();
    ///
    /// map.add_link(LinkGene::new(0, 0, 1, Innovation::new(0), Fields::new())).unwrap();
    /// assert!(map.is_connected(0, 1));
    ///
    /// // Same endpoints, different id.
    /// assert!(map.add_link(LinkGene::new(1, 0, 1, Innovation::new(1), Fields::new())).is_err());
    /// // Links may not end at inputs.
    /// assert!(map.add_link(LinkGene::new(2, 1, 0, Innovation::new(2), Fields::new())).is_err());
    /// ```
    pub fn add_link(&mut self, link: LinkGene) -> Result<&mut LinkGene, GeneMapError> {
        self.check_link_viability(&link)?;
        Ok(self.insert_link_unchecked(link))
    }

    fn check_link_viability(&self, link: &LinkGene) -> Result<(), GeneMapError> {
        let (source, target) = link.endpoints();
        if self.links.contains_key(&link.id()) {
            return Err(GeneMapError::DuplicateLinkId(link.id()));
        }
        let target_kind = match (self.nodes.get(&source), self.nodes.get(&target)) {
            (Some(_), Some(target_node)) => target_node.kind(),
            _ => {
                return Err(GeneMapError::NonexistantEndpoints {
                    link: link.id(),
                    source_id: source,
                    target_id: target,
                })
            }
        };
        if !target_kind.accepts_links() {
            return Err(GeneMapError::InputTarget {
                link: link.id(),
                target_id: target,
            });
        }
        if let Some(existing) = self.link_between(source, target) {
            return Err(GeneMapError::DuplicateEndpoints {
                link: link.id(),
                existing,
                source_id: source,
                target_id: target,
            });
        }
        Ok(())
    }

    /// Add a new link to the map, assuming it
    /// passes all viability checks.
    pub(crate) fn insert_link_unchecked(&mut self, link: LinkGene) -> &mut LinkGene {
        let id = link.id();
        let (source, target) = link.endpoints();
        self.next_link_id = self.next_link_id.max(id + 1);
        self.adjacency.entry(source).or_default().outgoing.insert(id);
        self.adjacency.entry(target).or_default().incoming.insert(id);
        self.links.entry(id).or_insert(link)
    }

    /// Removes a link from the map.
    ///
    /// # Errors
    /// Returns an error if the link doesn't exist.
    pub fn remove_link(&mut self, id: LinkId) -> Result<LinkGene, GeneMapError> {
        let link = self.links.remove(&id).ok_or(GeneMapError::AbsentLink(id))?;
        if let Some(adjacency) = self.adjacency.get_mut(&link.source()) {
            adjacency.outgoing.remove(&id);
        }
        if let Some(adjacency) = self.adjacency.get_mut(&link.target()) {
            adjacency.incoming.remove(&id);
        }
        Ok(link)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns a node for field modification.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeGene> {
        self.nodes.get_mut(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkGene> {
        self.links.get(&id)
    }

    /// Returns a link for field modification.
    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut LinkGene> {
        self.links.get_mut(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_link(&self, id: LinkId) -> bool {
        self.links.contains_key(&id)
    }

    /// Iterates over all nodes in increasing id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Iterates over all links in increasing id order.
    pub fn links(&self) -> impl Iterator<Item = &LinkGene> {
        self.links.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.keys().copied()
    }

    /// Iterates over the nodes of the specified kind.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values().filter(move |n| n.kind() == kind)
    }

    /// Returns the links sorted by increasing innovation.
    pub fn links_by_innovation(&self) -> Vec<&LinkGene> {
        let mut links: Vec<&LinkGene> = self.links.values().collect();
        links.sort_by_key(|l| (l.innovation(), l.id()));
        links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Total number of genes (nodes and links).
    pub fn gene_count(&self) -> usize {
        self.nodes.len() + self.links.len()
    }

    /// Iterates over the ids of the links starting at `node`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|a| a.outgoing.iter().copied())
    }

    /// Iterates over the ids of the links ending at `node`.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|a| a.incoming.iter().copied())
    }

    /// Returns `true` if no link starts or ends at `node`.
    pub fn is_isolated(&self, node: NodeId) -> bool {
        self.adjacency.get(&node).map_or(true, Adjacency::is_empty)
    }

    /// Returns the id of the link going from `source` to `target`, if any.
    pub fn link_between(&self, source: NodeId, target: NodeId) -> Option<LinkId> {
        self.outgoing(source)
            .find(|id| self.links.get(id).map_or(false, |l| l.target() == target))
    }

    pub fn is_connected(&self, source: NodeId, target: NodeId) -> bool {
        self.link_between(source, target).is_some()
    }

    /// The next id that a new node may be given.
    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// The next id that a new link may be given.
    pub fn next_link_id(&self) -> LinkId {
        self.next_link_id
    }

    /// Checks every structural invariant of the map.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), GeneMapError> {
        for (key, node) in &self.nodes {
            if *key != node.id() {
                return Err(GeneMapError::IdMismatch {
                    key: *key,
                    actual: node.id(),
                });
            }
            if *key >= self.next_node_id || !self.adjacency.contains_key(key) {
                return Err(GeneMapError::StaleIndex(*key));
            }
        }
        let mut seen_endpoints = HashMap::<_, _, RandomState>::default();
        for (key, link) in &self.links {
            if *key != link.id() {
                return Err(GeneMapError::IdMismatch {
                    key: *key,
                    actual: link.id(),
                });
            }
            let (source, target) = link.endpoints();
            let target_kind = match (self.nodes.get(&source), self.nodes.get(&target)) {
                (Some(_), Some(node)) => node.kind(),
                _ => {
                    return Err(GeneMapError::NonexistantEndpoints {
                        link: *key,
                        source_id: source,
                        target_id: target,
                    })
                }
            };
            if !target_kind.accepts_links() {
                return Err(GeneMapError::InputTarget {
                    link: *key,
                    target_id: target,
                });
            }
            if let Some(existing) = seen_endpoints.insert((source, target), *key) {
                return Err(GeneMapError::DuplicateEndpoints {
                    link: *key,
                    existing,
                    source_id: source,
                    target_id: target,
                });
            }
            let indexed = self.adjacency[&source].outgoing.contains(key)
                && self.adjacency[&target].incoming.contains(key);
            if *key >= self.next_link_id || !indexed {
                return Err(GeneMapError::StaleIndex(source));
            }
        }
        for (node, adjacency) in &self.adjacency {
            let consistent = self.nodes.contains_key(node)
                && adjacency
                    .outgoing
                    .iter()
                    .all(|id| self.links.get(id).map_or(false, |l| l.source() == *node))
                && adjacency
                    .incoming
                    .iter()
                    .all(|id| self.links.get(id).map_or(false, |l| l.target() == *node));
            if !consistent {
                return Err(GeneMapError::StaleIndex(*node));
            }
        }
        Ok(())
    }
}

impl fmt::Display for GeneMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes.values().map(|n| n.to_string()).collect();
        let links: Vec<String> = self.links.values().map(|l| l.to_string()).collect();
        f.debug_struct("GeneMap")
            .field("Nodes", &nodes)
            .field("Links", &links)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Fields;
    use crate::Innovation;

    fn node(id: NodeId, kind: NodeKind) -> NodeGene {
        NodeGene::new(id, kind, Fields::new())
    }

    fn link(id: LinkId, source: NodeId, target: NodeId) -> LinkGene {
        LinkGene::new(id, source, target, Innovation::new(id as u64), Fields::new())
    }

    fn triangle() -> GeneMap {
        let mut map = GeneMap::new();
        map.add_node(node(0, NodeKind::Input)).unwrap();
        map.add_node(node(1, NodeKind::Output)).unwrap();
        map.add_node(node(2, NodeKind::Hidden)).unwrap();
        map.add_link(link(0, 0, 2)).unwrap();
        map.add_link(link(1, 2, 1)).unwrap();
        map.add_link(link(2, 0, 1)).unwrap();
        map
    }

    #[test]
    fn indices_follow_insertions() {
        let map = triangle();
        assert_eq!(map.outgoing(0).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(map.incoming(1).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(map.incoming(2).collect::<Vec<_>>(), vec![0]);
        assert_eq!(map.outgoing(7).count(), 0);
        assert_eq!(map.gene_count(), 6);
        assert_eq!(map.next_link_id(), 3);
        assert_eq!(map.next_node_id(), 3);
        map.validate().unwrap();
    }

    #[test]
    fn remove_link_updates_indices() {
        let mut map = triangle();
        let removed = map.remove_link(0).unwrap();
        assert_eq!(removed.endpoints(), (0, 2));
        assert_eq!(map.outgoing(0).collect::<Vec<_>>(), vec![2]);
        assert_eq!(map.incoming(2).count(), 0);
        assert!(!map.is_connected(0, 2));
        assert_eq!(map.remove_link(0), Err(GeneMapError::AbsentLink(0)));
        map.validate().unwrap();
    }

    #[test]
    fn ids_are_not_reissued() {
        let mut map = triangle();
        map.remove_link(2).unwrap();
        assert_eq!(map.next_link_id(), 3);
    }

    #[test]
    fn remove_node_requires_no_links() {
        let mut map = triangle();
        assert_eq!(map.remove_node(2), Err(GeneMapError::NodeHasLinks(2)));
        map.remove_link(0).unwrap();
        map.remove_link(1).unwrap();
        assert!(map.is_isolated(2));
        assert_eq!(map.remove_node(2).unwrap().id(), 2);
        assert_eq!(map.remove_node(2), Err(GeneMapError::AbsentNode(2)));
        map.validate().unwrap();
    }

    #[test]
    fn dangling_links_are_rejected() {
        let mut map = triangle();
        assert!(matches!(
            map.add_link(link(9, 0, 42)),
            Err(GeneMapError::NonexistantEndpoints { .. })
        ));
        assert_eq!(
            map.add_link(link(0, 2, 2)).unwrap_err(),
            GeneMapError::DuplicateLinkId(0)
        );
    }

    #[test]
    fn self_loops_on_hidden_nodes_are_allowed() {
        let mut map = triangle();
        map.add_link(link(3, 2, 2)).unwrap();
        assert_eq!(map.outgoing(2).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(map.incoming(2).collect::<Vec<_>>(), vec![0, 3]);
        map.remove_link(3).unwrap();
        map.validate().unwrap();
    }

    #[test]
    fn replace_node_keeps_links() {
        let mut map = triangle();
        let mut replacement = node(2, NodeKind::Hidden);
        replacement.set_field("activation", crate::genomics::FieldValue::Float(0.5));
        map.replace_node(replacement).unwrap();
        assert_eq!(map.node(2).unwrap().activation(), Some(0.5));
        assert_eq!(map.incoming(2).count(), 1);
        assert!(map.replace_node(node(11, NodeKind::Hidden)).is_err());
    }

    #[test]
    fn links_sorted_by_innovation() {
        let mut map = GeneMap::new();
        map.add_node(node(0, NodeKind::Bias)).unwrap();
        map.add_node(node(1, NodeKind::Output)).unwrap();
        map.add_node(node(2, NodeKind::Hidden)).unwrap();
        map.add_link(LinkGene::new(0, 0, 1, Innovation::new(9), Fields::new()))
            .unwrap();
        map.add_link(LinkGene::new(1, 0, 2, Innovation::new(3), Fields::new()))
            .unwrap();
        let order: Vec<_> = map.links_by_innovation().iter().map(|l| l.id()).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn serde_round_trip() {
        let map = triangle();
        let text = serde_json::to_string(&map).unwrap();
        let restored: GeneMap = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, map);
        restored.validate().unwrap();
    }
}
