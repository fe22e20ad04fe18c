//! Per-position identity contexts
//!
//! A tree of per-table counters mirroring the document's nesting path. Each
//! node stands for one structural position `(parent, table, depth)` and owns
//! the monotonically increasing sequence counter for occurrences of that
//! table at that position. Nodes are created lazily the first time the
//! traversal reaches a position and reused for every later occurrence there;
//! successive siblings only bump the counter.
//!
//! The tree is an arena addressed by index, not an object graph: node 0 is
//! the sentinel root with depth -1 whose parent field points at itself.

use crate::schema::TableId;
use std::collections::HashMap;

/// Index of a node within the arena
pub type NodeId = usize;

/// The sentinel root node, present in every chain
pub const ROOT: NodeId = 0;

/// Depth of the sentinel root; never matches a real element depth
pub const ROOT_DEPTH: i64 = -1;

#[derive(Debug)]
struct ChainNode {
    /// None only for the sentinel root
    table: Option<TableId>,
    depth: i64,
    sequence: u64,
    parent: NodeId,
    has_descendants: bool,
}

/// Arena of identity contexts
#[derive(Debug)]
pub struct IdentityChain {
    nodes: Vec<ChainNode>,
    index: HashMap<(NodeId, TableId, i64), NodeId>,
}

impl IdentityChain {
    /// Create a chain holding only the sentinel root
    pub fn new() -> Self {
        IdentityChain {
            nodes: vec![ChainNode {
                table: None,
                depth: ROOT_DEPTH,
                sequence: 0,
                parent: ROOT,
                has_descendants: false,
            }],
            index: HashMap::new(),
        }
    }

    /// The sentinel root
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Get the node for `(parent, table, depth)`, creating it on first
    /// reach. Creation marks the parent as having descendants.
    ///
    /// The lookup key is the full triple so that two structural positions
    /// sharing an element name never share a counter.
    pub fn child_of(&mut self, parent: NodeId, table: TableId, depth: i64) -> NodeId {
        debug_assert!(depth > self.nodes[parent].depth);

        if let Some(&existing) = self.index.get(&(parent, table, depth)) {
            return existing;
        }

        let id = self.nodes.len();
        self.nodes.push(ChainNode {
            table: Some(table),
            depth,
            sequence: 0,
            parent,
            has_descendants: false,
        });
        self.nodes[parent].has_descendants = true;
        self.index.insert((parent, table, depth), id);
        id
    }

    /// Bump the node's counter for one more sibling occurrence, returning
    /// the new sequence value. This fixes the self-id of the occurrence
    /// being entered; later column writes only materialize it.
    pub fn increment(&mut self, node: NodeId) -> u64 {
        self.nodes[node].sequence += 1;
        self.nodes[node].sequence
    }

    /// Walk parent links upward until the node's depth is `<= target_depth`
    pub fn ascend_to(&self, mut node: NodeId, target_depth: i64) -> NodeId {
        while self.nodes[node].depth > target_depth && node != ROOT {
            node = self.nodes[node].parent;
        }
        node
    }

    /// The table this node counts, or None for the sentinel root
    pub fn table(&self, node: NodeId) -> Option<TableId> {
        self.nodes[node].table
    }

    /// Document nesting depth of this node (-1 for the sentinel root)
    pub fn depth(&self, node: NodeId) -> i64 {
        self.nodes[node].depth
    }

    /// Current sequence counter value
    pub fn sequence(&self, node: NodeId) -> u64 {
        self.nodes[node].sequence
    }

    /// The enclosing context; the root is its own parent
    pub fn parent(&self, node: NodeId) -> NodeId {
        self.nodes[node].parent
    }

    /// True once any child context has been created under this node
    pub fn has_descendants(&self, node: NodeId) -> bool {
        self.nodes[node].has_descendants
    }
}

impl Default for IdentityChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_sentinel() {
        let chain = IdentityChain::new();
        assert_eq!(chain.depth(ROOT), -1);
        assert_eq!(chain.parent(ROOT), ROOT);
        assert_eq!(chain.table(ROOT), None);
        assert!(!chain.has_descendants(ROOT));
    }

    #[test]
    fn test_child_reuse_by_triple() {
        let mut chain = IdentityChain::new();
        let a = chain.child_of(ROOT, 0, 0);
        let a_again = chain.child_of(ROOT, 0, 0);
        assert_eq!(a, a_again);
        assert!(chain.has_descendants(ROOT));

        // Same table at a different position gets its own node
        let b = chain.child_of(a, 1, 1);
        let deeper = chain.child_of(b, 0, 2);
        assert_ne!(a, deeper);
    }

    #[test]
    fn test_increment_is_per_node() {
        let mut chain = IdentityChain::new();
        let a = chain.child_of(ROOT, 0, 0);
        let b = chain.child_of(a, 1, 1);

        assert_eq!(chain.increment(a), 1);
        assert_eq!(chain.increment(a), 2);
        assert_eq!(chain.increment(b), 1);
        assert_eq!(chain.sequence(a), 2);
    }

    #[test]
    fn test_ascend_to() {
        let mut chain = IdentityChain::new();
        let a = chain.child_of(ROOT, 0, 0);
        let b = chain.child_of(a, 1, 1);
        let c = chain.child_of(b, 2, 3);

        assert_eq!(chain.ascend_to(c, 1), b);
        assert_eq!(chain.ascend_to(c, 2), b);
        assert_eq!(chain.ascend_to(c, 0), a);
        assert_eq!(chain.ascend_to(c, -1), ROOT);
        assert_eq!(chain.ascend_to(b, 1), b);
    }
}
