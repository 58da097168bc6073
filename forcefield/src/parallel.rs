use crate::{
    body::HasBody,
    error::Result,
    index::SpatialIndex,
    integrator::{self, Integrator},
    random::Deferred,
};
use rayon::prelude::*;

impl<const N: usize> SpatialIndex<N> {
    /// Adds to every body of a slice the force exerted on it, querying the index from the rayon
    /// thread pool.
    ///
    /// Each body draws its random numbers from its own stream derived from `seed` and its rank,
    /// so the result does not depend on scheduling.
    pub fn par_accumulate_forces<T>(&self, bodies: &mut [T], seed: u64)
    where
        T: HasBody<N> + Send,
    {
        bodies.par_iter_mut().enumerate().for_each(|(id, node)| {
            let mut random = Deferred::for_body(seed, id);
            self.update_body_force(id, node.body_mut(), &mut random);
        });
    }
}

impl<const N: usize> Integrator<N> {
    /// Advances every body of a slice from the rayon thread pool and returns the movement of the
    /// system.
    ///
    /// Nothing is mutated if the time step or the mass of a body is invalid.
    pub fn par_integrate<T>(&self, bodies: &mut [T], time_step: f64) -> Result<f64>
    where
        T: HasBody<N> + Send,
    {
        integrator::validate_time_step(time_step)?;
        integrator::validate_masses::<N, _>(&*bodies)?;

        Ok(bodies
            .par_iter_mut()
            .map(|node| self.advance(node.body_mut(), time_step))
            .sum::<f64>())
    }
}
