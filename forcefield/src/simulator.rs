use crate::{
    body::BodyGraph,
    config::Config,
    error::Result,
    index::SpatialIndex,
    integrator::{self, Integrator},
    random::{self, Random},
};
use rand::rngs::StdRng;

/// Runs the simulation of a graph one tick at a time.
///
/// Every [`step`](Self::step) rebuilds the [`SpatialIndex`] from the current positions, adds the
/// repulsion forces to the bodies and advances them with the [`Integrator`].
///
/// # Example
///
/// ```
/// use forcefield::prelude::*;
///
/// let mut bodies: Vec<Body<2>> = (0..10)
///     .map(|i| Body::new([i as f64, (i * i) as f64 % 7.0]))
///     .collect();
///
/// let mut simulator = Simulator::<2>::new(Config::new(2))?;
/// for _ in 0..100 {
///     simulator.step(&mut bodies)?;
/// }
///
/// assert!(bodies.iter().all(|body| body.position.is_finite()));
/// # Ok::<(), forcefield::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Simulator<const N: usize, R = StdRng> {
    /// Spatial index rebuilt at every step.
    pub index: SpatialIndex<N>,
    /// Integrator advancing the bodies.
    pub integrator: Integrator<N>,
    /// Time step of a tick.
    pub time_step: f64,
    random: R,
}

impl<const N: usize> Simulator<N> {
    /// Creates a new [`Simulator`] using the default random source seeded with `config.seed`.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_random(config, random::seeded(config.seed))
    }
}

impl<const N: usize, R: Random> Simulator<N, R> {
    /// Creates a new [`Simulator`] using the given random source.
    pub fn with_random(config: Config, random: R) -> Result<Self> {
        Ok(Self {
            index: SpatialIndex::new(&config)?,
            integrator: Integrator::new(&config)?,
            time_step: config.time_step,
            random,
        })
    }

    /// Adds to every body of the graph the repulsion exerted on it by all the others.
    pub fn compute_forces<G>(&mut self, graph: &mut G) -> Result<()>
    where
        G: BodyGraph<N> + ?Sized,
    {
        self.index.build(&*graph, &mut self.random)?;
        self.index.accumulate_forces(graph, &mut self.random);
        Ok(())
    }

    /// Performs one tick and returns the movement of the system.
    pub fn step<G>(&mut self, graph: &mut G) -> Result<f64>
    where
        G: BodyGraph<N> + ?Sized,
    {
        integrator::validate_time_step(self.time_step)?;
        self.compute_forces(graph)?;

        let movement = self.integrator.integrate(graph, self.time_step)?;
        log::trace!(
            "step of {} bodies, movement {movement}",
            graph.node_count()
        );

        Ok(movement)
    }

    /// Returns the random source.
    #[inline]
    pub fn random(&mut self) -> &mut R {
        &mut self.random
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{body::Body, error::Error, force::Repulsion};
    use std::collections::HashMap;

    fn ring(count: usize) -> Vec<Body<2>> {
        (0..count)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / count as f64;
                Body::new([angle.cos(), angle.sin()])
            })
            .collect()
    }

    #[test]
    fn bodies_spread_out() {
        let mut bodies = ring(16);
        let mut simulator = Simulator::<2>::new(Config::new(2)).unwrap();

        let radius = |bodies: &[Body<2>]| {
            bodies
                .iter()
                .map(|body| body.position.length())
                .sum::<f64>()
                / bodies.len() as f64
        };

        let before = radius(&bodies);
        for _ in 0..20 {
            let movement = simulator.step(&mut bodies).unwrap();
            assert!(movement.is_finite() && movement > 0.0);
        }

        assert!(radius(&bodies) > before);
        assert!(bodies.iter().all(|body| body.force == Default::default()));
    }

    #[test]
    fn steps_are_deterministic() {
        let run = || {
            let mut bodies = vec![Body::<3>::default(); 8];
            let mut simulator = Simulator::<3>::new(Config::new(3)).unwrap();
            let movements: Vec<f64> = (0..5).map(|_| simulator.step(&mut bodies).unwrap()).collect();
            (bodies, movements)
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn compute_forces_matches_the_index() {
        let mut bodies = ring(5);
        let mut expected = bodies.clone();

        let mut simulator = Simulator::<2>::new(Config::new(2)).unwrap();
        simulator.compute_forces(&mut bodies).unwrap();

        let mut index = SpatialIndex::<2>::default();
        let mut random = random::seeded(Config::SEED);
        index.build(&expected, &mut random).unwrap();
        index.accumulate_forces(&mut expected, &mut random);

        assert_eq!(bodies, expected);
        assert_eq!(simulator.index.law, Repulsion::default());
    }

    #[test]
    fn works_on_maps() {
        let mut graph: HashMap<u32, Body<2>> =
            ring(6).into_iter().enumerate().map(|(i, body)| (i as u32, body)).collect();

        let mut simulator = Simulator::<2>::new(Config::new(2)).unwrap();
        assert!(simulator.step(&mut graph).unwrap() > 0.0);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert!(matches!(
            Simulator::<2>::new(Config::new(3)),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Simulator::<2>::new(Config {
                time_step: 0.0,
                ..Config::new(2)
            }),
            Err(Error::InvalidConfig {
                option: "time_step",
                ..
            })
        ));

        let mut simulator = Simulator::<2>::new(Config::new(2)).unwrap();
        simulator.time_step = -1.0;
        assert_eq!(
            simulator.step(&mut ring(3)),
            Err(Error::InvalidTimeStep(-1.0))
        );
    }
}
