use std::fmt;

/// Errors raised at the boundary of the index, the integrator and the simulator.
///
/// Degenerate geometry (coincident bodies, zero distances, excessive tree depth) is never an
/// error: it is resolved internally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// The configured number of dimensions differs from the one of the instance.
    DimensionMismatch {
        /// Dimensions of the instance.
        expected: usize,
        /// Dimensions found in the configuration.
        found: usize,
    },
    /// A configuration option is outside of its domain.
    InvalidConfig {
        /// Name of the option.
        option: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A body has a non-positive or non-finite mass.
    InvalidMass {
        /// Rank of the body in the graph.
        index: usize,
        /// Rejected mass.
        mass: f64,
    },
    /// A body has a non-finite position.
    InvalidPosition {
        /// Rank of the body in the graph.
        index: usize,
    },
    /// The time step is non-positive or non-finite.
    InvalidTimeStep(f64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "configuration is for {found} dimensions but the instance has {expected}"
            ),
            Self::InvalidConfig { option, value } => {
                write!(f, "invalid value {value} for option `{option}`")
            }
            Self::InvalidMass { index, mass } => {
                write!(f, "body {index} has invalid mass {mass}, expected a positive finite value")
            }
            Self::InvalidPosition { index } => write!(f, "body {index} has a non-finite position"),
            Self::InvalidTimeStep(time_step) => {
                write!(f, "invalid time step {time_step}, expected a positive finite value")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type of fallible operations of [`forcefield`](crate).
pub type Result<T> = std::result::Result<T, Error>;
