use crate::error::{Error, Result};

/// Options of the simulation.
///
/// Every option has a default, so a configuration can be written by overriding only the options
/// of interest:
///
/// ```
/// use forcefield::Config;
///
/// let config = Config {
///     theta: 0.5,
///     ..Config::new(3)
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Number of spatial dimensions. Must match the dimension of the instances built from it.
    pub dimensions: usize,
    /// Barnes-Hut accuracy threshold. A node is approximated by its centre of mass when
    /// `side / distance < theta`. `0` gives exact pairwise forces.
    pub theta: f64,
    /// Repulsion constant `G`. Positive values push bodies apart.
    pub gravity: f64,
    /// Distance under which interactions are clamped.
    pub softening: f64,
    /// Maximum speed of a body, in distance units per time unit.
    pub max_speed: f64,
    /// Maximum depth of the spatial index.
    pub max_depth: usize,
    /// Time step used by the [`Simulator`](crate::Simulator).
    pub time_step: f64,
    /// Seed of the default random source.
    pub seed: u64,
}

impl Config {
    /// Default `theta`.
    pub const THETA: f64 = 0.8;
    /// Default `gravity`.
    pub const GRAVITY: f64 = 1.2;
    /// Default `softening`.
    pub const SOFTENING: f64 = 0.01;
    /// Default `max_speed`.
    pub const MAX_SPEED: f64 = 1.0;
    /// Default `max_depth`.
    pub const MAX_DEPTH: usize = 64;
    /// Default `time_step`.
    pub const TIME_STEP: f64 = 0.5;
    /// Default `seed`.
    pub const SEED: u64 = 42;

    /// Creates a configuration with default options for the given number of dimensions.
    #[inline]
    pub const fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            theta: Self::THETA,
            gravity: Self::GRAVITY,
            softening: Self::SOFTENING,
            max_speed: Self::MAX_SPEED,
            max_depth: Self::MAX_DEPTH,
            time_step: Self::TIME_STEP,
            seed: Self::SEED,
        }
    }

    /// Checks that every option is in its domain.
    pub fn validate(&self) -> Result<()> {
        fn check(option: &'static str, value: f64, valid: bool) -> Result<()> {
            if valid && value.is_finite() {
                Ok(())
            } else {
                Err(Error::InvalidConfig { option, value })
            }
        }

        check("dimensions", self.dimensions as f64, self.dimensions > 0)?;
        check("theta", self.theta, self.theta >= 0.0)?;
        check("gravity", self.gravity, true)?;
        check("softening", self.softening, self.softening > 0.0)?;
        check("max_speed", self.max_speed, self.max_speed > 0.0)?;
        check("max_depth", self.max_depth as f64, self.max_depth > 0)?;
        check("time_step", self.time_step, self.time_step > 0.0)
    }

    /// Checks that every option is in its domain and that the configuration is for `N`
    /// dimensions.
    pub fn validate_for<const N: usize>(&self) -> Result<()> {
        if self.dimensions != N {
            return Err(Error::DimensionMismatch {
                expected: N,
                found: self.dimensions,
            });
        }

        self.validate()
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::new(2)
    }
}
