use crate::{
    body::{Body, BodyGraph},
    config::Config,
    error::{Error, Result},
    random::{self, Random},
    vector::Vector,
};

/// Repulsive inverse-square force law between two point masses.
///
/// The force on a body of mass `m1` at `p1` caused by a mass `m2` at `p2` has a magnitude of
/// `G * m1 * m2 / r²` and points from `p2` towards `p1`.
///
/// Distances are clamped to `softening` so that the result is always finite. Bodies at exactly
/// the same position are pushed apart along a random direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repulsion {
    /// Repulsion constant `G`.
    pub gravity: f64,
    /// Distance under which the interaction is clamped.
    pub softening: f64,
}

impl Repulsion {
    /// Creates a new [`Repulsion`] law.
    #[inline]
    pub const fn new(gravity: f64, softening: f64) -> Self {
        Self { gravity, softening }
    }

    /// Creates the [`Repulsion`] law described by a configuration.
    #[inline]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.gravity, config.softening)
    }

    /// Returns the force exerted on the mass at `position` by the mass at `source`.
    #[inline]
    pub fn between<const N: usize, R>(
        &self,
        position: Vector<N>,
        mass: f64,
        source: Vector<N>,
        source_mass: f64,
        random: &mut R,
    ) -> Vector<N>
    where
        R: Random + ?Sized,
    {
        let mut dir = position - source;
        let mut distance = dir.length();

        if distance == 0.0 {
            dir = random::unit_direction(random) * self.softening;
            distance = self.softening;
        } else if distance < self.softening {
            dir = dir * (self.softening / distance);
            distance = self.softening;
        }

        dir * (self.gravity * mass * source_mass / (distance * distance * distance))
    }
}

impl Default for Repulsion {
    #[inline]
    fn default() -> Self {
        Self::new(Config::GRAVITY, Config::SOFTENING)
    }
}

/// Exact O(n²) force computation.
///
/// Every pair of bodies interacts directly. This is the reference a
/// [`SpatialIndex`](crate::SpatialIndex) with `theta = 0` agrees with, and is faster than it for
/// small graphs.
#[derive(Clone, Debug, Default)]
pub struct Pairwise<const N: usize> {
    /// Force law between two bodies.
    pub law: Repulsion,
    snapshot: Vec<(Vector<N>, f64)>,
}

impl<const N: usize> Pairwise<N> {
    /// Creates a new [`Pairwise`] solver using the given force law.
    #[inline]
    pub const fn new(law: Repulsion) -> Self {
        Self {
            law,
            snapshot: Vec::new(),
        }
    }

    /// Adds to every body the force exerted on it by all the other bodies of the graph.
    pub fn accumulate_forces<G, R>(&mut self, graph: &mut G, random: &mut R) -> Result<()>
    where
        G: BodyGraph<N> + ?Sized,
        R: Random + ?Sized,
    {
        self.snapshot.clear();
        let mut error = None;
        graph.for_each_body(|index, body: &Body<N>| {
            if error.is_none() && !body.has_valid_mass() {
                error = Some(Error::InvalidMass {
                    index,
                    mass: body.mass,
                });
            }
            self.snapshot.push((body.position, body.mass));
        });

        if let Some(error) = error {
            return Err(error);
        }

        let (law, snapshot) = (&self.law, &self.snapshot);
        graph.for_each_body_mut(|id, body| {
            for (other, &(position, mass)) in snapshot.iter().enumerate() {
                if other != id {
                    body.force += law.between(body.position, body.mass, position, mass, random);
                }
            }
        });

        Ok(())
    }
}
