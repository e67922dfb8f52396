//! Construction parameters for a simulation.

use serde::{Deserialize, Serialize};

/// Width of a sandbox created without explicit dimensions.
pub const DEFAULT_WIDTH: u16 = 120;

/// Height of a sandbox created without explicit dimensions.
pub const DEFAULT_HEIGHT: u16 = 160;

/// Grid dimensions and random seed used to create a [`crate::Simulation`].
///
/// A missing seed selects an entropy-seeded random source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    width: u16,
    height: u16,
    seed: Option<u64>,
}

impl SimulationConfig {
    /// Creates a configuration with the provided dimensions and no seed.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            seed: None,
        }
    }

    /// Returns a copy of the configuration using `seed` for reproducible runs.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Seed for the random source, if fixed.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
