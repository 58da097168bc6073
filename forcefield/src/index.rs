use crate::{
    body::{Body, BodyGraph, BodyId},
    config::Config,
    error::{Error, Result},
    force::Repulsion,
    random::Random,
    tree::{BoundingBox, Cell, Node, NodeID, Region, Tree},
    vector::Vector,
};

/// Attempts at separating two indistinguishable positions before merging them.
const JITTER_ATTEMPTS: usize = 3;

/// Per-axis distance under which two positions are indistinguishable.
const SAME_POSITION_EPSILON: f64 = 1e-8;

#[inline]
fn same_position<const N: usize>(lhs: &Vector<N>, rhs: &Vector<N>) -> bool {
    (0..N).all(|i| (lhs[i] - rhs[i]).abs() < SAME_POSITION_EPSILON)
}

/// Hierarchical spatial partition of bodies answering
/// [Barnes-Hut](https://en.wikipedia.org/wiki/Barnes%E2%80%93Hut_simulation) force queries.
///
/// The index is an orthtree (a quadtree in 2D, an octree in 3D, `2^N` children per node in
/// general) rebuilt from scratch by every call to [`build`](Self::build). Its nodes live in an
/// arena whose storage is kept from one build to the next.
///
/// # Example
///
/// ```
/// use forcefield::prelude::*;
///
/// let mut bodies = vec![Body::new([1.0, 0.0]), Body::new([2.0, 0.0])];
/// let mut random = forcefield::random::seeded(42);
///
/// let mut index = SpatialIndex::<2>::default();
/// index.build(&bodies, &mut random).unwrap();
/// index.accumulate_forces(&mut bodies, &mut random);
///
/// assert_eq!(bodies[0].force[0], -bodies[1].force[0]);
/// assert_eq!(bodies[0].force[1], 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct SpatialIndex<const N: usize> {
    /// Parameter ruling the accuracy and speed of the queries. If 0, queries are exact.
    pub theta: f64,
    /// Force law between a body and a body or a node.
    pub law: Repulsion,
    max_depth: usize,
    tree: Tree<N>,
    root: Option<NodeID>,
    snapshot: Vec<(Vector<N>, f64)>,
    owners: Vec<BodyId>,
    path: Vec<NodeID>,
    depth: usize,
    merged: usize,
}

impl<const N: usize> SpatialIndex<N> {
    /// Creates a new empty [`SpatialIndex`] from a configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate_for::<N>()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: &Config) -> Self {
        Self {
            theta: config.theta,
            law: Repulsion::from_config(config),
            max_depth: config.max_depth,
            tree: Tree::new(),
            root: None,
            snapshot: Vec::new(),
            owners: Vec::new(),
            path: Vec::new(),
            depth: 0,
            merged: 0,
        }
    }

    /// Rebuilds the index from the bodies of a graph.
    ///
    /// Bodies are identified by their rank in the iteration order of the graph. The random source
    /// is only used to separate bodies that share the same position.
    ///
    /// Fails without building anything if a body has a non-finite position or an invalid mass.
    pub fn build<G, R>(&mut self, graph: &G, random: &mut R) -> Result<()>
    where
        G: BodyGraph<N> + ?Sized,
        R: Random + ?Sized,
    {
        self.tree.clear();
        self.root = None;
        self.owners.clear();
        self.depth = 0;
        self.merged = 0;

        let mut snapshot = std::mem::take(&mut self.snapshot);
        snapshot.clear();
        snapshot.reserve(graph.node_count());

        let mut bbox = BoundingBox::default();
        let mut error = None;
        graph.for_each_body(|index, body: &Body<N>| {
            if error.is_some() {
                return;
            }

            if !body.position.is_finite() {
                error = Some(Error::InvalidPosition { index });
            } else if !body.has_valid_mass() {
                error = Some(Error::InvalidMass {
                    index,
                    mass: body.mass,
                });
            } else {
                bbox.extend(&body.position);
                snapshot.push((body.position, body.mass));
            }
        });

        if let Some(error) = error {
            snapshot.clear();
            self.snapshot = snapshot;
            return Err(error);
        }

        let region = Region::enclosing(&bbox);
        self.tree.nodes.reserve(2 * snapshot.len());
        self.owners.reserve(snapshot.len());
        for (id, (position, mass)) in snapshot.iter_mut().enumerate() {
            *position = self.insert(region, id, *position, *mass, random);
        }

        log::debug!(
            "built spatial index of {} bodies: {} nodes, depth {}",
            snapshot.len(),
            self.tree.len(),
            self.depth
        );
        if self.merged > 0 {
            log::warn!(
                "{} bodies could not be separated and were merged into existing leaves",
                self.merged
            );
        }

        self.snapshot = snapshot;
        Ok(())
    }

    /// Inserts a body and returns the position it was stored at, which differs from `position`
    /// when it had to be moved apart from a coincident body.
    fn insert<R>(
        &mut self,
        root_region: Region<N>,
        id: BodyId,
        mut position: Vector<N>,
        mass: f64,
        random: &mut R,
    ) -> Vector<N>
    where
        R: Random + ?Sized,
    {
        let Some(mut node) = self.root else {
            let cell = Cell::point(root_region, position, mass);
            self.root = Some(self.tree.push_leaf(id, cell));
            self.owners.push(id);
            return position;
        };

        // Ancestors absorb the body once its final position is known.
        let mut path = std::mem::take(&mut self.path);
        path.clear();

        let mut depth = 0;
        let owner = loop {
            let index = node as usize;

            match self.tree.nodes[index] {
                Node::Internal(first) => {
                    path.push(node);

                    let region = self.tree.data[index].region;
                    let orthant = region.orthant(&position);
                    let slot = first as usize + orthant;
                    depth += 1;

                    match self.tree.orthants[slot] {
                        Some(child) => node = child,
                        None => {
                            let cell = Cell::point(region.child(orthant), position, mass);
                            self.tree.orthants[slot] = Some(self.tree.push_leaf(id, cell));
                            self.depth = self.depth.max(depth);
                            break id;
                        }
                    }
                }
                Node::Leaf(occupant) => {
                    let cell = self.tree.data[index];

                    if depth >= self.max_depth || !Self::separate(&cell, &mut position, random) {
                        log::trace!("body {id} merged into the leaf of body {occupant}");
                        self.tree.data[index].absorb(position, mass);
                        self.merged += 1;
                        break occupant;
                    }

                    // The occupant moves down to its orthant and insertion resumes at this node,
                    // now internal.
                    let first = self.tree.push_orthants();
                    let orthant = cell.region.orthant(&cell.center_of_mass);
                    let child = Cell {
                        region: cell.region.child(orthant),
                        ..cell
                    };

                    self.tree.orthants[first as usize + orthant] =
                        Some(self.tree.push_leaf(occupant, child));
                    self.tree.nodes[index] = Node::Internal(first);
                    self.depth = self.depth.max(depth + 1);
                }
            }
        };

        for &ancestor in &path {
            self.tree.data[ancestor as usize].absorb(position, mass);
        }

        self.path = path;
        self.owners.push(owner);
        position
    }

    /// Moves `position` away from the content of a leaf if they are indistinguishable. Returns
    /// `false` if they still are after all attempts.
    fn separate<R>(cell: &Cell<N>, position: &mut Vector<N>, random: &mut R) -> bool
    where
        R: Random + ?Sized,
    {
        let origin = *position;

        for _ in 0..JITTER_ATTEMPTS {
            if !same_position(&cell.center_of_mass, position) {
                return true;
            }

            let offset = Vector::new(std::array::from_fn(|_| {
                (random.next_f64() - 0.5) * cell.region.half
            }));
            *position = cell.region.clamp(origin + offset);
        }

        !same_position(&cell.center_of_mass, position)
    }

    /// Returns the approximate force exerted on a body by all the bodies of the index.
    ///
    /// `id` is the identity of the body in the index, so that it does not interact with itself.
    /// Bodies that were not part of the build can be queried with any id greater than or equal to
    /// [`bodies`](Self::bodies).
    pub fn force_on<R>(&self, id: BodyId, body: &Body<N>, random: &mut R) -> Vector<N>
    where
        R: Random + ?Sized,
    {
        let mut force = Vector::ZERO;

        let Some(root) = self.root else {
            return force;
        };

        let owner = self.owners.get(id).copied();
        let depth = (usize::BITS - self.tree.len().leading_zeros()) as usize;
        let mut stack = Vec::with_capacity(Region::<N>::ORTHANTS * depth);
        stack.push(root);

        while let Some(node) = stack.pop() {
            let cell = &self.tree.data[node as usize];

            match self.tree.nodes[node as usize] {
                Node::Leaf(occupant) if Some(occupant) == owner => {
                    if let Some((center, mass)) = self.others_in_leaf(id, cell) {
                        force += self.law.between(body.position, body.mass, center, mass, random);
                    }
                }
                Node::Internal(_)
                    if cell.region.side()
                        >= self.theta * (body.position - cell.center_of_mass).length() =>
                {
                    stack.extend(self.tree.children(node).iter().flatten());
                }
                _ => {
                    force += self.law.between(
                        body.position,
                        body.mass,
                        cell.center_of_mass,
                        cell.mass,
                        random,
                    );
                }
            }
        }

        force
    }

    /// Returns the aggregate of the leaf holding body `id` without that body: the bodies merged
    /// with it, if any.
    fn others_in_leaf(&self, id: BodyId, cell: &Cell<N>) -> Option<(Vector<N>, f64)> {
        let (position, mass) = self.snapshot[id];
        let rest = cell.mass - mass;

        if rest <= cell.mass * 1e-12 {
            return None;
        }

        Some(((cell.center_of_mass * cell.mass - position * mass) / rest, rest))
    }

    /// Adds the force exerted on a body by all the bodies of the index to its accumulator.
    #[inline]
    pub fn update_body_force<R>(&self, id: BodyId, body: &mut Body<N>, random: &mut R)
    where
        R: Random + ?Sized,
    {
        body.force += self.force_on(id, body, random);
    }

    /// Adds to the accumulator of every body of a graph the force exerted on it.
    ///
    /// The graph should be the one the index was built from, iterated in the same order.
    pub fn accumulate_forces<G, R>(&self, graph: &mut G, random: &mut R)
    where
        G: BodyGraph<N> + ?Sized,
        R: Random + ?Sized,
    {
        graph.for_each_body_mut(|id, body| self.update_body_force(id, body, random));
    }

    /// Returns the root node, `None` if the index is empty.
    #[inline]
    pub const fn root(&self) -> Option<NodeID> {
        self.root
    }

    /// Returns a node of the index.
    #[inline]
    pub fn node(&self, node: NodeID) -> Node {
        self.tree.nodes[node as usize]
    }

    /// Returns the region and aggregate of a node.
    #[inline]
    pub fn cell(&self, node: NodeID) -> &Cell<N> {
        &self.tree.data[node as usize]
    }

    /// Returns the child slots of a node, indexed by orthant. Empty for leaves.
    #[inline]
    pub fn children(&self, node: NodeID) -> &[Option<NodeID>] {
        self.tree.children(node)
    }

    /// Returns the underlying arena.
    #[inline]
    pub const fn tree(&self) -> &Tree<N> {
        &self.tree
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the index holds no body.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of bodies of the last build.
    #[inline]
    pub fn bodies(&self) -> usize {
        self.snapshot.len()
    }

    /// Depth of the deepest node of the last build.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of bodies merged into an existing leaf during the last build, because the maximum
    /// depth was reached or because they could not be told apart from the occupant.
    ///
    /// Bodies sharing a leaf interact with each other through the aggregate of the leaf minus
    /// their own contribution.
    #[inline]
    pub const fn merged(&self) -> usize {
        self.merged
    }

    /// Maximum depth of the index.
    #[inline]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl<const N: usize> Default for SpatialIndex<N> {
    #[inline]
    fn default() -> Self {
        Self::from_config(&Config::new(N))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{force::Pairwise, random::seeded};
    use rand::prelude::*;

    fn random_bodies<const N: usize>(rng: &mut StdRng, count: usize) -> Vec<Body<N>> {
        (0..count)
            .map(|_| {
                Body::new([0.0; N].map(|_| rng.gen_range(-100.0..100.0)))
                    .with_mass(rng.gen_range(0.5..5.0))
            })
            .collect()
    }

    /// Checks the structural invariants of every node below `node`.
    fn check_node<const N: usize>(index: &SpatialIndex<N>, node: NodeID, bodies: &[Body<N>]) {
        let cell = index.cell(node);

        match index.node(node) {
            Node::Leaf(id) => {
                assert!(cell.region.contains(&cell.center_of_mass));
                assert!(cell.mass >= bodies[id].mass);
            }
            Node::Internal(_) => {
                let mut mass = 0.0;
                let mut weighted = Vector::ZERO;

                for (orthant, child) in index.children(node).iter().enumerate() {
                    let Some(child) = *child else { continue };
                    let child_cell = index.cell(child);

                    assert_eq!(child_cell.region, cell.region.child(orthant));
                    mass += child_cell.mass;
                    weighted += child_cell.center_of_mass * child_cell.mass;
                    check_node(index, child, bodies);
                }

                approx::assert_relative_eq!(cell.mass, mass, max_relative = 1e-9);
                for i in 0..N {
                    approx::assert_relative_eq!(
                        cell.center_of_mass[i],
                        weighted[i] / mass,
                        epsilon = 1e-9,
                        max_relative = 1e-9
                    );
                }
            }
        }
    }

    #[test]
    fn empty_graph_gives_no_force() {
        let mut index = SpatialIndex::<2>::default();
        index.build(&Vec::<Body<2>>::new(), &mut seeded(42)).unwrap();

        assert!(index.is_empty());
        assert_eq!(index.root(), None);
        assert_eq!(
            index.force_on(0, &Body::new([1.0, 1.0]), &mut seeded(42)),
            Vector::ZERO
        );
    }

    #[test]
    fn single_body_feels_nothing() {
        let mut bodies = vec![Body::<2>::default()];
        let clone = bodies.clone();
        let mut random = seeded(42);

        let mut index = SpatialIndex::<2>::default();
        index.build(&bodies, &mut random).unwrap();
        index.accumulate_forces(&mut bodies, &mut random);

        assert_eq!(bodies, clone);

        let root = index.root().unwrap();
        assert_eq!(index.node(root), Node::Leaf(0));
        assert_eq!(index.node(root).body(), Some(0));
        assert_eq!(index.cell(root).center_of_mass, bodies[0].position);
    }

    #[test]
    fn two_bodies_repel_each_other() {
        let mut bodies = vec![Body::new([1.0, 0.0]), Body::new([2.0, 0.0])];
        let mut random = seeded(42);

        let mut index = SpatialIndex::<2>::default();
        index.build(&bodies, &mut random).unwrap();
        index.accumulate_forces(&mut bodies, &mut random);

        let (a, b) = (bodies[0].force, bodies[1].force);
        assert_eq!(a[0] + b[0], 0.0);
        assert!(a[0] < 0.0);
        assert!(b[0] > 0.0);
        assert_eq!(a[1], 0.0);
        assert_eq!(b[1], 0.0);
    }

    #[test]
    fn two_bodies_at_the_same_location() {
        let compute = || {
            let mut bodies = vec![Body::<2>::default(), Body::default()];
            let mut random = seeded(42);

            let mut index = SpatialIndex::<2>::default();
            index.build(&bodies, &mut random).unwrap();
            index.accumulate_forces(&mut bodies, &mut random);
            (bodies, index.merged())
        };

        let (bodies, merged) = compute();
        assert_eq!(merged, 0);
        assert!(bodies.iter().all(|body| body.force.is_finite()));
        assert!(bodies.iter().all(|body| body.force.length() > 0.0));
        assert_eq!(compute().0, bodies);
    }

    #[test]
    fn it_does_not_get_stuck() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut bodies: Vec<Body<2>> = (0..60_000)
            .map(|_| Body::new([rng.gen::<f64>(), rng.gen::<f64>()]))
            .collect();
        let mut random = seeded(42);

        let mut index = SpatialIndex::<2>::default();
        index.build(&bodies, &mut random).unwrap();
        index.accumulate_forces(&mut bodies, &mut random);

        assert_eq!(index.bodies(), 60_000);
        assert!(index.depth() <= index.max_depth());
        assert!(bodies.iter().all(|body| body.force.is_finite()));
    }

    #[test]
    fn aggregates_are_consistent() {
        let bodies = random_bodies::<3>(&mut StdRng::seed_from_u64(1), 500);

        let mut index = SpatialIndex::<3>::default();
        index.build(&bodies, &mut seeded(42)).unwrap();

        let root = index.root().unwrap();
        let total: f64 = bodies.iter().map(|body| body.mass).sum();
        approx::assert_relative_eq!(index.cell(root).mass, total, max_relative = 1e-9);
        for body in &bodies {
            assert!(index.cell(root).region.contains(&body.position));
        }

        check_node(&index, root, &bodies);
    }

    #[test]
    fn coincident_bodies_keep_aggregates_consistent() {
        let mut bodies = vec![Body::<2>::default(); 3];
        bodies.extend(vec![Body::new([1.0, 1.0]).with_mass(2.0); 20]);
        bodies.extend(random_bodies::<2>(&mut StdRng::seed_from_u64(6), 50));

        let mut index = SpatialIndex::<2>::default();
        index.build(&bodies, &mut seeded(42)).unwrap();

        let root = index.root().unwrap();
        let total: f64 = bodies.iter().map(|body| body.mass).sum();
        approx::assert_relative_eq!(index.cell(root).mass, total, max_relative = 1e-9);

        check_node(&index, root, &bodies);
    }

    #[test]
    fn zero_theta_is_exact() {
        let bodies = random_bodies::<3>(&mut StdRng::seed_from_u64(2), 200);

        let mut exact = bodies.clone();
        Pairwise::new(Repulsion::default())
            .accumulate_forces(&mut exact, &mut seeded(0))
            .unwrap();

        let mut approximated = bodies.clone();
        let mut index = SpatialIndex {
            theta: 0.0,
            ..SpatialIndex::<3>::default()
        };
        index.build(&approximated, &mut seeded(0)).unwrap();
        index.accumulate_forces(&mut approximated, &mut seeded(0));

        for (exact, approximated) in exact.iter().zip(&approximated) {
            for i in 0..3 {
                approx::assert_relative_eq!(
                    exact.force[i],
                    approximated.force[i],
                    epsilon = 1e-12,
                    max_relative = 1e-9
                );
            }
        }
    }

    #[test]
    fn approximation_error_is_bounded() {
        let bodies = random_bodies::<2>(&mut StdRng::seed_from_u64(3), 1_000);

        let mut exact = bodies.clone();
        Pairwise::new(Repulsion::default())
            .accumulate_forces(&mut exact, &mut seeded(0))
            .unwrap();

        let mut approximated = bodies.clone();
        let mut index = SpatialIndex {
            theta: 0.5,
            ..SpatialIndex::<2>::default()
        };
        index.build(&approximated, &mut seeded(0)).unwrap();
        index.accumulate_forces(&mut approximated, &mut seeded(0));

        let mean_error = exact
            .iter()
            .zip(&approximated)
            .map(|(e, a)| (e.force - a.force).length() / e.force.length())
            .sum::<f64>()
            / bodies.len() as f64;

        assert!(mean_error < 0.05, "mean relative error {mean_error}");
    }

    #[test]
    fn depth_cap_merges_bodies() {
        let config = Config {
            max_depth: 1,
            ..Config::new(2)
        };
        let mut bodies = vec![Body::<2>::new([0.5, 0.5]); 10];
        let mut random = seeded(42);

        let mut index = SpatialIndex::<2>::new(&config).unwrap();
        index.build(&bodies, &mut random).unwrap();
        index.accumulate_forces(&mut bodies, &mut random);

        assert!(index.depth() <= 1);
        assert!(index.merged() >= 6);
        approx::assert_relative_eq!(index.cell(index.root().unwrap()).mass, 10.0);
        assert!(bodies.iter().all(|body| body.force.is_finite()));
    }

    #[test]
    fn merged_bodies_feel_each_other() {
        let config = Config {
            max_depth: 1,
            theta: 0.0,
            ..Config::new(2)
        };
        let bodies = vec![
            Body::new([0.0, 0.0]),
            Body::new([0.1, 0.1]),
            Body::new([10.0, 10.0]).with_mass(3.0),
        ];

        let mut exact = bodies.clone();
        Pairwise::new(Repulsion::from_config(&config))
            .accumulate_forces(&mut exact, &mut seeded(0))
            .unwrap();

        let mut approximated = bodies.clone();
        let mut index = SpatialIndex::<2>::new(&config).unwrap();
        index.build(&approximated, &mut seeded(0)).unwrap();
        index.accumulate_forces(&mut approximated, &mut seeded(0));

        assert_eq!(index.merged(), 1);
        for (exact, approximated) in exact.iter().zip(&approximated) {
            for i in 0..2 {
                approx::assert_relative_eq!(
                    exact.force[i],
                    approximated.force[i],
                    epsilon = 1e-12,
                    max_relative = 1e-9
                );
            }
        }
    }

    #[test]
    fn queries_accumulate() {
        let bodies = vec![Body::new([0.0]), Body::new([1.0])];
        let mut random = seeded(42);

        let mut index = SpatialIndex::<1>::default();
        index.build(&bodies, &mut random).unwrap();

        let mut body = bodies[0];
        index.update_body_force(0, &mut body, &mut random);
        let once = body.force;
        index.update_body_force(0, &mut body, &mut random);

        assert_eq!(body.force, once * 2.0);
        assert_eq!(once, index.force_on(0, &bodies[0], &mut random));
    }

    #[test]
    fn rebuild_reuses_storage() {
        let bodies = random_bodies::<2>(&mut StdRng::seed_from_u64(4), 100);
        let mut index = SpatialIndex::<2>::default();

        index.build(&bodies, &mut seeded(42)).unwrap();
        let (len, capacity) = (index.len(), index.tree().nodes.capacity());

        index.build(&bodies, &mut seeded(42)).unwrap();
        assert_eq!(index.len(), len);
        assert_eq!(index.tree().nodes.capacity(), capacity);
    }

    #[test]
    fn rejects_invalid_bodies() {
        let mut index = SpatialIndex::<2>::default();

        let bodies = vec![Body::new([0.0, 0.0]), Body::new([f64::NAN, 0.0])];
        assert_eq!(
            index.build(&bodies, &mut seeded(42)),
            Err(Error::InvalidPosition { index: 1 })
        );
        assert!(index.is_empty());

        let bodies = vec![Body::new([0.0, 0.0]).with_mass(-2.0)];
        assert_eq!(
            index.build(&bodies, &mut seeded(42)),
            Err(Error::InvalidMass {
                index: 0,
                mass: -2.0
            })
        );
    }

    #[test]
    fn rejects_dimension_mismatch() {
        assert_eq!(
            SpatialIndex::<3>::new(&Config::new(2)).err(),
            Some(Error::DimensionMismatch {
                expected: 3,
                found: 2
            })
        );
    }
}
