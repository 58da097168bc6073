use crate::vector::Vector;
use std::collections::{BTreeMap, HashMap};

/// Identity of a body inside a [`SpatialIndex`](crate::SpatialIndex): its position in the
/// iteration order of the graph the index was built from.
pub type BodyId = usize;

/// A point mass with a position, a velocity, an accumulated force and a mass.
///
/// The `force` field is an accumulator: force queries add to it and
/// [`Integrator::integrate`](crate::Integrator::integrate) consumes it and resets it to zero.
///
/// # Example
///
/// ```
/// use forcefield::prelude::*;
///
/// let body = Body::new([1.0, 2.0]).with_mass(3.0);
///
/// assert_eq!(body.position, Vector::new([1.0, 2.0]));
/// assert_eq!(body.velocity, Vector::ZERO);
/// assert_eq!(body.mass, 3.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Body<const N: usize> {
    pub position: Vector<N>,
    pub velocity: Vector<N>,
    pub force: Vector<N>,
    pub mass: f64,
}

impl<const N: usize> Body<N> {
    /// Creates a new [`Body`] at the given position, at rest, with a mass of `1`.
    #[inline]
    pub fn new(position: impl Into<Vector<N>>) -> Self {
        Self {
            position: position.into(),
            velocity: Vector::ZERO,
            force: Vector::ZERO,
            mass: 1.0,
        }
    }

    /// Returns this [`Body`] with its mass set to `mass`.
    #[inline]
    pub const fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Returns this [`Body`] with its velocity set to `velocity`.
    #[inline]
    pub fn with_velocity(mut self, velocity: impl Into<Vector<N>>) -> Self {
        self.velocity = velocity.into();
        self
    }

    /// Sets the accumulated force back to zero.
    #[inline]
    pub fn reset_force(&mut self) {
        self.force = Vector::ZERO;
    }

    /// Returns `true` if every component of the body is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.force.is_finite()
            && self.mass.is_finite()
    }

    /// Returns `true` if the mass can be used in force and integration computations.
    #[inline]
    pub(crate) fn has_valid_mass(&self) -> bool {
        self.mass.is_finite() && self.mass > 0.0
    }
}

impl<const N: usize> Default for Body<N> {
    #[inline]
    fn default() -> Self {
        Self::new(Vector::ZERO)
    }
}

/// Trait for graph nodes carrying a [`Body`].
///
/// You can derive this trait if your type has a field named `body`, or a field marked with the
/// `#[body]` attribute.
///
/// ```
/// use forcefield::prelude::*;
///
/// #[derive(HasBody)]
/// struct Node {
///     label: String,
///     #[body]
///     physics: Body<2>,
/// }
///
/// let node = Node { label: "a".into(), physics: Body::new([1.0, 0.0]) };
/// let body: &Body<2> = node.body();
/// assert_eq!(body.position[0], 1.0);
/// ```
pub trait HasBody<const N: usize> {
    /// Returns the attached body.
    fn body(&self) -> &Body<N>;

    /// Returns the attached body mutably.
    fn body_mut(&mut self) -> &mut Body<N>;
}

impl<const N: usize> HasBody<N> for Body<N> {
    #[inline]
    fn body(&self) -> &Body<N> {
        self
    }

    #[inline]
    fn body_mut(&mut self) -> &mut Body<N> {
        self
    }
}

impl<const N: usize, T: HasBody<N>> HasBody<N> for Box<T> {
    #[inline]
    fn body(&self) -> &Body<N> {
        (**self).body()
    }

    #[inline]
    fn body_mut(&mut self) -> &mut Body<N> {
        (**self).body_mut()
    }
}

/// Collection of graph nodes with attached bodies.
///
/// The iteration order must be the same for every call as long as the collection is not
/// modified: a [`SpatialIndex`](crate::SpatialIndex) identifies bodies by their rank in that
/// order.
pub trait BodyGraph<const N: usize> {
    /// Number of nodes, hence of bodies.
    fn node_count(&self) -> usize;

    /// Calls `f` with the rank and the body of every node.
    fn for_each_body<F>(&self, f: F)
    where
        F: FnMut(BodyId, &Body<N>);

    /// Calls `f` with the rank and the mutable body of every node.
    fn for_each_body_mut<F>(&mut self, f: F)
    where
        F: FnMut(BodyId, &mut Body<N>);
}

impl<const N: usize, T: HasBody<N>> BodyGraph<N> for [T] {
    #[inline]
    fn node_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn for_each_body<F>(&self, mut f: F)
    where
        F: FnMut(BodyId, &Body<N>),
    {
        self.iter().enumerate().for_each(|(id, node)| f(id, node.body()))
    }

    #[inline]
    fn for_each_body_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(BodyId, &mut Body<N>),
    {
        self.iter_mut()
            .enumerate()
            .for_each(|(id, node)| f(id, node.body_mut()))
    }
}

impl<const N: usize, T: HasBody<N>> BodyGraph<N> for Vec<T> {
    #[inline]
    fn node_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn for_each_body<F>(&self, f: F)
    where
        F: FnMut(BodyId, &Body<N>),
    {
        BodyGraph::<N>::for_each_body(self.as_slice(), f)
    }

    #[inline]
    fn for_each_body_mut<F>(&mut self, f: F)
    where
        F: FnMut(BodyId, &mut Body<N>),
    {
        BodyGraph::<N>::for_each_body_mut(self.as_mut_slice(), f)
    }
}

// Maps iterate their values, the key being the caller's node identifier.
impl<const N: usize, K, T> BodyGraph<N> for BTreeMap<K, T>
where
    T: HasBody<N>,
{
    #[inline]
    fn node_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn for_each_body<F>(&self, mut f: F)
    where
        F: FnMut(BodyId, &Body<N>),
    {
        self.values()
            .enumerate()
            .for_each(|(id, node)| f(id, node.body()))
    }

    #[inline]
    fn for_each_body_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(BodyId, &mut Body<N>),
    {
        self.values_mut()
            .enumerate()
            .for_each(|(id, node)| f(id, node.body_mut()))
    }
}

impl<const N: usize, K, T, S> BodyGraph<N> for HashMap<K, T, S>
where
    T: HasBody<N>,
{
    #[inline]
    fn node_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn for_each_body<F>(&self, mut f: F)
    where
        F: FnMut(BodyId, &Body<N>),
    {
        self.values()
            .enumerate()
            .for_each(|(id, node)| f(id, node.body()))
    }

    #[inline]
    fn for_each_body_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(BodyId, &mut Body<N>),
    {
        self.values_mut()
            .enumerate()
            .for_each(|(id, node)| f(id, node.body_mut()))
    }
}
