/// Bounding box and region related types.
pub mod partition;

pub use partition::*;

use crate::{body::BodyId, vector::Vector};

/// Index of a [`Node`] in a [`Tree`].
pub type NodeID = u32;

/// Node of an orthtree. Empty nodes are not stored: they are the `None` child slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    /// Node with `2^N` child slots, starting at the given index of [`Tree::orthants`].
    Internal(u32),
    /// Node holding exactly one body.
    Leaf(BodyId),
}

impl Node {
    /// Returns the body held by a leaf.
    #[inline]
    pub const fn body(&self) -> Option<BodyId> {
        match self {
            Self::Leaf(id) => Some(*id),
            Self::Internal(_) => None,
        }
    }
}

/// Data stored alongside a [`Node`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell<const N: usize> {
    /// Region covered by the node.
    pub region: Region<N>,
    /// Total mass of the bodies in the node.
    pub mass: f64,
    /// Mass-weighted mean position of the bodies in the node.
    pub center_of_mass: Vector<N>,
}

impl<const N: usize> Cell<N> {
    /// Creates a new [`Cell`] holding a single point mass.
    #[inline]
    pub const fn point(region: Region<N>, position: Vector<N>, mass: f64) -> Self {
        Self {
            region,
            mass,
            center_of_mass: position,
        }
    }

    /// Adds a point mass to the aggregate.
    #[inline]
    pub fn absorb(&mut self, position: Vector<N>, mass: f64) {
        let total = self.mass + mass;
        self.center_of_mass = (self.center_of_mass * self.mass + position * mass) / total;
        self.mass = total;
    }
}

/// Arena backing an orthtree (the N-dimensional generalisation of quadtrees and octrees).
///
/// `nodes` and `data` are parallel: the `i`-th element of `data` describes the `i`-th node.
/// Child slots of internal nodes are stored in blocks of `2^N` in `orthants`.
#[derive(Clone, Debug)]
pub struct Tree<const N: usize> {
    /// Structure of the tree.
    pub nodes: Vec<Node>,
    /// Region and aggregate of every node.
    pub data: Vec<Cell<N>>,
    /// Child slots of the internal nodes.
    pub orthants: Vec<Option<NodeID>>,
}

impl<const N: usize> Tree<N> {
    /// Creates a new empty [`Tree`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            data: Vec::new(),
            orthants: Vec::new(),
        }
    }

    /// Creates a new empty [`Tree`] with room for at least `capacity` nodes.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            data: Vec::with_capacity(capacity),
            orthants: Vec::with_capacity(capacity),
        }
    }

    /// Removes every node, keeping the allocated storage.
    #[inline]
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.data.clear();
        self.orthants.clear();
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a leaf and returns its id.
    #[inline]
    pub fn push_leaf(&mut self, body: BodyId, cell: Cell<N>) -> NodeID {
        let id = self.nodes.len() as NodeID;
        self.nodes.push(Node::Leaf(body));
        self.data.push(cell);
        id
    }

    /// Appends a block of `2^N` empty child slots and returns the index of its first slot.
    #[inline]
    pub fn push_orthants(&mut self) -> u32 {
        let first = self.orthants.len() as u32;
        self.orthants
            .extend(std::iter::repeat(None).take(Region::<N>::ORTHANTS));
        first
    }

    /// Returns the child slots of a node, empty for leaves.
    #[inline]
    pub fn children(&self, node: NodeID) -> &[Option<NodeID>] {
        match self.nodes[node as usize] {
            Node::Internal(first) => {
                let first = first as usize;
                &self.orthants[first..first + Region::<N>::ORTHANTS]
            }
            Node::Leaf(_) => &[],
        }
    }
}

impl<const N: usize> Default for Tree<N> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
