#![warn(missing_docs)]
//! # Forcefield
//!
//! Forcefield is the physics kernel of force-directed graph layouts: it attaches point masses to
//! the nodes of a graph, pushes them apart with an inverse-square repulsion and advances them
//! over discrete time steps.
//!
//! ## Goals
//!
//! Laying out a graph means simulating the repulsion of every node against every other node, which
//! is quadratic in the number of nodes. Forcefield approximates it with the
//! [Barnes-Hut](https://en.wikipedia.org/wiki/Barnes%E2%80%93Hut_simulation) algorithm: bodies are
//! stored in an orthtree (a quadtree in 2D, an octree in 3D etc.) and distant groups of bodies
//! act as a single mass at their centre of mass. The `theta` parameter trades accuracy for speed.
//!
//! Springs between connected nodes, gravity towards a centre and the rendering of the layout are
//! left to the caller, who adds their own forces to the bodies before integrating them.
//!
//! ## Using Forcefield
//!
//! Each simulation tick has three phases:
//!
//! 1. [`SpatialIndex::build`] snapshots the positions and masses of the bodies into a tree.
//! 2. [`SpatialIndex::accumulate_forces`] adds the repulsion felt by each body to its `force`.
//! 3. [`Integrator::integrate`] turns forces into velocities and velocities into positions, clamps
//!    speeds, resets forces and returns the movement of the system.
//!
//! [`Simulator`] bundles these phases together with a deterministic random source.
//!
//! ```
//! use forcefield::prelude::*;
//!
//! let mut bodies = vec![
//!     Body::new([0.0, 0.0]),
//!     Body::new([1.0, 0.0]),
//!     Body::new([0.0, 1.0]).with_mass(2.0),
//! ];
//!
//! let config = Config::new(2);
//! let mut index = SpatialIndex::<2>::new(&config)?;
//! let integrator = Integrator::<2>::new(&config)?;
//! let mut random = forcefield::random::seeded(config.seed);
//!
//! for _ in 0..10 {
//!     index.build(&bodies, &mut random)?;
//!     index.accumulate_forces(&mut bodies, &mut random);
//!     let movement = integrator.integrate(&mut bodies, config.time_step)?;
//!     assert!(movement > 0.0);
//! }
//! # Ok::<(), forcefield::Error>(())
//! ```
//!
//! ### Graphs
//!
//! Any collection implementing [`BodyGraph`] can be simulated. It is implemented for slices,
//! vectors and maps of values implementing [`HasBody`], which can be derived:
//!
//! ```
//! use forcefield::prelude::*;
//! use std::collections::BTreeMap;
//!
//! #[derive(HasBody)]
//! struct Node {
//!     label: String,
//!     body: Body<3>,
//! }
//!
//! let mut graph = BTreeMap::new();
//! graph.insert(1, Node { label: "a".into(), body: Body::new([0.0, 0.0, 0.0]) });
//! graph.insert(2, Node { label: "b".into(), body: Body::new([0.0, 0.0, 0.0]) });
//!
//! let mut simulator = Simulator::<3>::new(Config::new(3))?;
//! simulator.step(&mut graph)?;
//!
//! assert_ne!(graph[&1].body.position, graph[&2].body.position);
//! # Ok::<(), forcefield::Error>(())
//! ```
//!
//! Bodies sharing the same position are separated with random numbers. Every function that needs
//! them takes a [`Random`] source, implemented for all `rand` generators, so results are
//! reproducible for a fixed seed.
//!
//! Enable the `parallel` feature to query the index and integrate bodies with
//! [rayon](https://github.com/rayon-rs/rayon), `glam` for conversions between [`Vector`] and
//! `glam` vectors and `serde` to load a [`Config`] from a file.

extern crate self as forcefield;

/// Point masses and the traits to attach them to the nodes of a graph.
pub mod body;
/// Options of the simulation.
pub mod config;
/// Error type.
pub mod error;
/// Force laws.
pub mod force;
/// Barnes-Hut spatial index.
pub mod index;
/// Numerical integration.
pub mod integrator;
/// Parallel force queries and integration.
#[cfg(feature = "parallel")]
pub mod parallel;
/// Sources of random numbers.
pub mod random;
/// Simulation loop.
pub mod simulator;
/// Tree and space partitioning implementation.
pub mod tree;
/// Fixed-size vectors.
pub mod vector;

pub use body::{Body, BodyGraph, BodyId, HasBody};
pub use config::Config;
pub use error::{Error, Result};
pub use force::{Pairwise, Repulsion};
pub use forcefield_derive::HasBody;
pub use index::SpatialIndex;
pub use integrator::Integrator;
pub use random::Random;
pub use simulator::Simulator;
pub use vector::Vector;

/// Most commonly used types, traits and derive macros.
pub mod prelude {
    pub use crate::{
        Body, BodyGraph, Config, Integrator, Pairwise, Random, Repulsion, SpatialIndex, Simulator,
        Vector,
    };

    // Trait and its derive macro.
    pub use crate::HasBody;
}
