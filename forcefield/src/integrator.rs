use crate::{
    body::{Body, BodyGraph},
    config::Config,
    error::{Error, Result},
};

/// Semi-implicit Euler integrator.
///
/// Velocities are updated from the accumulated forces first, then positions from the new
/// velocities. Speeds are clamped to `max_speed` and forces are consumed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Integrator<const N: usize> {
    /// Maximum speed of a body.
    pub max_speed: f64,
}

impl<const N: usize> Integrator<N> {
    /// Creates a new [`Integrator`] from a configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate_for::<N>()?;

        Ok(Self {
            max_speed: config.max_speed,
        })
    }

    /// Advances every body of a graph by `time_step` and returns the movement of the system: the
    /// sum of the squared displacements of the bodies.
    ///
    /// Forces are reset after use: a force acting over several steps has to be added again
    /// before each call.
    ///
    /// Nothing is mutated if the time step or the mass of a body is invalid.
    pub fn integrate<G>(&self, graph: &mut G, time_step: f64) -> Result<f64>
    where
        G: BodyGraph<N> + ?Sized,
    {
        validate_time_step(time_step)?;
        validate_masses(&*graph)?;

        let mut movement = 0.0;
        graph.for_each_body_mut(|_, body| movement += self.advance(body, time_step));

        Ok(movement)
    }

    /// Advances a single body by `time_step`, resets its force and returns its squared
    /// displacement.
    ///
    /// The mass and time step are assumed valid.
    #[inline]
    pub fn advance(&self, body: &mut Body<N>, time_step: f64) -> f64 {
        body.velocity += body.force * (time_step / body.mass);

        body.velocity = body.velocity.clamp_length_max(self.max_speed);

        let displacement = body.velocity * time_step;
        body.position += displacement;
        body.reset_force();

        displacement.length_squared()
    }
}

impl<const N: usize> Default for Integrator<N> {
    #[inline]
    fn default() -> Self {
        Self {
            max_speed: Config::MAX_SPEED,
        }
    }
}

pub(crate) fn validate_time_step(time_step: f64) -> Result<()> {
    if time_step > 0.0 && time_step.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidTimeStep(time_step))
    }
}

pub(crate) fn validate_masses<const N: usize, G>(graph: &G) -> Result<()>
where
    G: BodyGraph<N> + ?Sized,
{
    let mut error = None;
    graph.for_each_body(|index, body: &Body<N>| {
        if error.is_none() && !body.has_valid_mass() {
            error = Some(Error::InvalidMass {
                index,
                mass: body.mass,
            });
        }
    });

    error.map_or(Ok(()), Err)
}
