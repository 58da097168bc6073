use crate::vector::Vector;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

/// Source of uniform random numbers used to separate coincident bodies.
///
/// It is implemented for every [`RngCore`], so any generator of the `rand` ecosystem can be
/// passed where a [`Random`] is expected. The source is always an explicit parameter: a fixed
/// seed makes tree construction and force results deterministic.
pub trait Random {
    /// Returns the next uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> Random for R {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        self.gen()
    }
}

/// Returns the default deterministic generator for the given seed.
#[inline]
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generator that is only seeded when it is first used.
///
/// Random numbers are only needed when bodies coincide, so creating one stream per body is
/// nearly free with this type.
#[derive(Clone, Debug)]
pub struct Deferred {
    seed: u64,
    rng: Option<StdRng>,
}

impl Deferred {
    /// Creates a new [`Deferred`] generator for the given seed.
    #[inline]
    pub const fn new(seed: u64) -> Self {
        Self { seed, rng: None }
    }

    /// Creates the stream of the body with the given rank, derived from a shared seed.
    #[inline]
    pub fn for_body(seed: u64, id: usize) -> Self {
        // splitmix64 increment, keeps neighbouring ranks far apart in seed space
        Self::new(seed ^ (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl Random for Deferred {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        let seed = self.seed;
        self.rng.get_or_insert_with(|| seeded(seed)).gen()
    }
}

/// Returns a random direction of unit length.
pub fn unit_direction<const N: usize, R>(random: &mut R) -> Vector<N>
where
    R: Random + ?Sized,
{
    let direction = Vector::new(std::array::from_fn(|_| random.next_f64() - 0.5));
    let length = direction.length();

    if length > 0.0 {
        direction / length
    } else {
        let mut axis = Vector::ZERO;
        if N > 0 {
            axis[0] = 1.0;
        }
        axis
    }
}
