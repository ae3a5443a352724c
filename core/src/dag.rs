//! Generic directed multigraph with attributed nodes and edges.
//!
//! [`Dag`] is the storage layer underneath the render-pass planner. Nodes and
//! edges live in arenas and are addressed by stable [`NodeId`] / [`EdgeId`]
//! handles, so removing a node never invalidates the handles of the others.
//! Several edges may connect the same pair of nodes (a pass can hand both a
//! color and a depth image to the same consumer).
//!
//! Acyclicity is not enforced on insertion. [`Dag::topological_order`]
//! validates it and reports the nodes left on a cycle.
//!
//! # Example
//!
//! ```
//! use passforge_core::dag::Dag;
//!
//! let mut dag: Dag<&str, u32> = Dag::new();
//! let shadow = dag.add_node("shadow");
//! let opaque = dag.add_node("opaque");
//! dag.add_edge(shadow, opaque, 0);
//!
//! assert_eq!(dag.topological_order().unwrap(), vec![shadow, opaque]);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::{Index, IndexMut};

/// Handle to a node in a [`Dag`].
///
/// `NodeId` is `Copy` and cheap to pass around. It is only valid within the
/// `Dag` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a handle from a raw arena index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw arena index of this node.
    pub const fn index(self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handle to an edge in a [`Dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Create a handle from a raw arena index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw arena index of this edge.
    pub const fn index(self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Traversal direction for reachability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow edges against their direction (towards producers).
    Upstream,
    /// Follow edges along their direction (towards consumers).
    Downstream,
}

/// A directed edge carrying an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    from: NodeId,
    to: NodeId,
    attr: E,
}

impl<E> Edge<E> {
    /// Node the edge starts at.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Node the edge points to.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Edge attribute.
    pub fn attr(&self) -> &E {
        &self.attr
    }

    /// Mutable edge attribute.
    pub fn attr_mut(&mut self) -> &mut E {
        &mut self.attr
    }
}

/// Errors reported by graph algorithms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DagError {
    /// The graph contains at least one cycle.
    ///
    /// `nodes` lists every node that could not be ordered, which is the set
    /// of nodes on a cycle plus everything downstream of one.
    #[error("graph contains a cycle through {} node(s)", .nodes.len())]
    CyclicDependency { nodes: Vec<NodeId> },
}

/// Bidirectional association between original nodes and their clones.
///
/// Produced by [`Dag::clone_nodes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneMap {
    forward: HashMap<NodeId, NodeId>,
    backward: HashMap<NodeId, NodeId>,
    edges: Vec<(EdgeId, EdgeId)>,
}

impl CloneMap {
    /// Clone created for `original`, if it was part of the cloned set.
    pub fn clone_of(&self, original: NodeId) -> Option<NodeId> {
        self.forward.get(&original).copied()
    }

    /// Node that `clone` was copied from.
    pub fn original_of(&self, clone: NodeId) -> Option<NodeId> {
        self.backward.get(&clone).copied()
    }

    /// Whether `node` is a clone produced by this mapping.
    pub fn is_clone(&self, node: NodeId) -> bool {
        self.backward.contains_key(&node)
    }

    /// `(original, clone)` node pairs ordered by original id.
    pub fn pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<_> = self.forward.iter().map(|(&o, &c)| (o, c)).collect();
        pairs.sort();
        pairs
    }

    /// `(original, clone)` edge pairs in creation order.
    pub fn edge_pairs(&self) -> &[(EdgeId, EdgeId)] {
        &self.edges
    }

    /// Number of cloned nodes.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether no node was cloned.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Directed multigraph with node attributes `N` and edge attributes `E`.
#[derive(Debug, Clone)]
pub struct Dag<N, E> {
    nodes: Vec<Option<N>>,
    edges: Vec<Option<Edge<E>>>,
    node_count: usize,
    edge_count: usize,
}

impl<N, E> Default for Dag<N, E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_count: 0,
            edge_count: 0,
        }
    }
}

impl<N, E> Dag<N, E> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Add a node and return its handle.
    pub fn add_node(&mut self, attr: N) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Some(attr));
        self.node_count += 1;
        id
    }

    /// Remove a node together with every edge touching it.
    ///
    /// Returns the node attribute, or `None` if the node did not exist.
    pub fn remove_node(&mut self, id: NodeId) -> Option<N> {
        let attr = self.nodes.get_mut(id.slot())?.take()?;
        self.node_count -= 1;

        for slot in self.edges.iter_mut() {
            if slot.as_ref().is_some_and(|e| e.from == id || e.to == id) {
                *slot = None;
                self.edge_count -= 1;
            }
        }

        Some(attr)
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Node attribute, or `None` for a removed or foreign handle.
    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(id.slot()).and_then(Option::as_ref)
    }

    /// Mutable node attribute.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Live node handles in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().map(|(id, _)| id)
    }

    /// Live nodes with their attributes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId::new(i as u32), n)))
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Add an edge from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is invalid or the edge is a self-loop.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, attr: E) -> EdgeId {
        assert!(self.contains(from), "Invalid edge source {from}");
        assert!(self.contains(to), "Invalid edge target {to}");
        assert!(from != to, "Node cannot depend on itself");

        let id = EdgeId::new(self.edges.len() as u32);
        self.edges.push(Some(Edge { from, to, attr }));
        self.edge_count += 1;
        id
    }

    /// Remove an edge and return its attribute.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<E> {
        let edge = self.edges.get_mut(id.slot())?.take()?;
        self.edge_count -= 1;
        Some(edge.attr)
    }

    /// Edge by handle.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge<E>> {
        self.edges.get(id.slot()).and_then(Option::as_ref)
    }

    /// Mutable edge by handle.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge<E>> {
        self.edges.get_mut(id.slot()).and_then(Option::as_mut)
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Live edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge<E>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId::new(i as u32), e)))
    }

    /// Mutable live edges in creation order.
    pub fn edges_mut(&mut self) -> impl Iterator<Item = (EdgeId, &mut Edge<E>)> + '_ {
        self.edges
            .iter_mut()
            .enumerate()
            .filter_map(|(i, e)| e.as_mut().map(|e| (EdgeId::new(i as u32), e)))
    }

    /// Edges pointing into `node`, in creation order.
    pub fn inputs(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &Edge<E>)> + '_ {
        self.edges().filter(move |(_, e)| e.to == node)
    }

    /// Edges leaving `node`, in creation order.
    pub fn outputs(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &Edge<E>)> + '_ {
        self.edges().filter(move |(_, e)| e.from == node)
    }

    /// Number of edges pointing into `node`.
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.inputs(node).count()
    }

    /// Number of edges leaving `node`.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outputs(node).count()
    }

    /// Point an existing edge at a different target node.
    ///
    /// # Panics
    ///
    /// Panics if the edge or the new target does not exist, or if the edge
    /// would become a self-loop.
    pub fn retarget_edge(&mut self, id: EdgeId, to: NodeId) {
        assert!(self.contains(to), "Invalid edge target {to}");
        let edge = self
            .edge_mut(id)
            .unwrap_or_else(|| panic!("Invalid edge handle {id:?}"));
        assert!(edge.from != to, "Node cannot depend on itself");
        edge.to = to;
    }

    /// Nodes without incoming edges.
    pub fn sources(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| self.in_degree(id) == 0)
            .collect()
    }

    /// Nodes without outgoing edges.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| self.out_degree(id) == 0)
            .collect()
    }

    // ------------------------------------------------------------------
    // Algorithms
    // ------------------------------------------------------------------

    /// Order all nodes so that every edge points forward.
    ///
    /// Uses Kahn's algorithm with a FIFO queue seeded in creation order, so
    /// the result is deterministic for a given construction sequence.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, DagError> {
        let n = self.nodes.len();

        // 1. Count incoming edges and collect successor lists
        // 2. Start from nodes without incoming edges
        // 3. Emit a node, releasing its successors as their count drops to zero
        // 4. Anything left over sits on or behind a cycle
        let mut in_degree = vec![0u32; n];
        let mut successors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for (_, edge) in self.edges() {
            in_degree[edge.to.slot()] += 1;
            successors[edge.from.slot()].push(edge.to);
        }

        let mut queue: VecDeque<NodeId> = self
            .node_ids()
            .filter(|id| in_degree[id.slot()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.node_count);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &next in &successors[id.slot()] {
                in_degree[next.slot()] -= 1;
                if in_degree[next.slot()] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != self.node_count {
            let nodes = self
                .node_ids()
                .filter(|id| in_degree[id.slot()] > 0)
                .collect();
            return Err(DagError::CyclicDependency { nodes });
        }

        Ok(order)
    }

    /// Every node reachable from `start` in the given direction.
    ///
    /// `start` itself is not included. Nodes are returned in breadth-first
    /// order.
    pub fn reachable(&self, start: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut result = Vec::new();

        while let Some(id) = queue.pop_front() {
            for next in self.neighbors(id, direction) {
                if visited.insert(next) {
                    result.push(next);
                    queue.push_back(next);
                }
            }
        }

        result
    }

    /// Whether `to` can be reached from `from` by following at least one edge.
    pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(id) = queue.pop_front() {
            for next in self.neighbors(id, Direction::Downstream) {
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        match direction {
            Direction::Upstream => self.inputs(id).map(|(_, e)| e.from).collect(),
            Direction::Downstream => self.outputs(id).map(|(_, e)| e.to).collect(),
        }
    }

    /// Clone a set of nodes and the edges feeding them.
    ///
    /// Every node in `nodes` is copied with `clone_node`. Edges are copied with
    /// `clone_edge` according to where they start:
    ///
    /// - both ends inside the set: the copy connects the two clones;
    /// - source outside the set: the copy keeps the original source and points
    ///   at the clone of the target.
    ///
    /// Edges leaving the set are not copied.
    pub fn clone_nodes<F, G>(
        &mut self,
        nodes: &[NodeId],
        mut clone_node: F,
        mut clone_edge: G,
    ) -> CloneMap
    where
        F: FnMut(NodeId, &N) -> N,
        G: FnMut(EdgeId, &Edge<E>) -> E,
    {
        let mut map = CloneMap::default();

        let copies: Vec<(NodeId, N)> = nodes
            .iter()
            .map(|&id| (id, clone_node(id, &self[id])))
            .collect();
        for (original, attr) in copies {
            let clone = self.add_node(attr);
            map.forward.insert(original, clone);
            map.backward.insert(clone, original);
        }

        let pending: Vec<(EdgeId, NodeId, NodeId, E)> = self
            .edges()
            .filter_map(|(id, edge)| {
                let to = map.clone_of(edge.to)?;
                let from = map.clone_of(edge.from).unwrap_or(edge.from);
                Some((id, from, to, clone_edge(id, edge)))
            })
            .collect();
        for (original, from, to, attr) in pending {
            let clone = self.add_edge(from, to, attr);
            map.edges.push((original, clone));
        }

        map
    }
}

impl<N, E> Index<NodeId> for Dag<N, E> {
    type Output = N;

    fn index(&self, id: NodeId) -> &N {
        self.node(id)
            .unwrap_or_else(|| panic!("Invalid node handle {id}"))
    }
}

impl<N, E> IndexMut<NodeId> for Dag<N, E> {
    fn index_mut(&mut self, id: NodeId) -> &mut N {
        self.node_mut(id)
            .unwrap_or_else(|| panic!("Invalid node handle {id}"))
    }
}
