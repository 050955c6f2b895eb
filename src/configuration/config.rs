//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – global engine options (force model, integrator, theta)
//! - [`UniverseConfig`]   – spatial bounds and octree depth cap
//! - [`ParametersConfig`] – numerical parameters and physical constants
//! - [`BodyConfig`]       – initial state for each explicitly listed body
//! - [`GalaxyConfig`]     – seeded random galaxy generation, as an alternative
//!   to listing bodies
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! engine:
//!   force_model: "barnes-hut"  # or "direct"
//!   integrator: "verlet"
//!   theta: 0.5
//!
//! universe:
//!   galaxy_size: 2000.0        # bodies live in [0, galaxy_size]^3
//!   max_depth: 32              # octree subdivision cap
//!
//! parameters:
//!   t_end: 10.0                # total simulation time
//!   h0: 0.01                   # fixed step size
//!   seed: 42                   # deterministic seed
//!   eps2: 1.0e-4               # softening epsilon^2
//!   G: 1.0                     # gravitational constant
//!
//! # either an explicit body list ...
//! bodies:
//!   - x: [ 990.0, 1000.0, 1000.0 ]
//!     v: [ 0.0, 1.0, 0.0 ]
//!     m: 100.0
//!   - x: [ 1010.0, 1000.0, 1000.0 ]
//!     v: [ 0.0, -1.0, 0.0 ]
//!     m: 200.0
//!
//! # ... or a randomly generated galaxy:
//! # galaxy:
//! #   n: 1000
//! #   mass_min: 1.0
//! #   mass_max: 100.0
//! ```
//!
//! The engine then maps this configuration into its internal runtime scenario
//! representation, which may use different structs optimized for performance.

use serde::Deserialize;

/// Which integrator method used by the engine
#[derive(Deserialize, Debug, Clone)]
pub enum IntegratorConfig {
    #[serde(rename = "verlet")] // velocity Verlet, symplectic, fixed step size
    Verlet,
}

/// Which gravity evaluation the engine uses
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum ForceModelConfig {
    #[serde(rename = "direct")] // exact N^2 pairwise summation
    Direct,

    #[serde(rename = "barnes-hut")] // octree approximation gated by theta
    BarnesHut,
}

/// High-level engine configuration
/// Controls the structure of the simulation
#[derive(Deserialize, Debug)]
pub struct EngineConfig {
    pub force_model: ForceModelConfig, // direct summation or Barnes-Hut tree
    pub integrator: IntegratorConfig,  // time integrator advancing the system state
    pub theta: Option<f64>, // opening angle: prune a subtree and take its com instead of descending
}

/// Spatial bounds of the simulated universe
#[derive(Deserialize, Debug, Clone)]
pub struct UniverseConfig {
    pub galaxy_size: f64,        // side of the [0, galaxy_size]^3 bounding cube
    pub max_depth: Option<usize>, // octree subdivision cap (default 32)
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub t_end: f64, // time end
    pub h0: f64,    // time step size
    pub seed: u64,  // deterministic seed to make runs reproducible
    pub eps2: f64,  // softening - prevent singular forces at very small separations
    pub G: f64,     // gravitational constant
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug)]
pub struct BodyConfig {
    pub x: Vec<f64>, // initial position vector in simulation units
    pub v: Vec<f64>, // initial velocity vector in simulation units per time unit
    pub m: f64,      // mass of the body
}

/// Seeded random galaxy generation, used instead of an explicit body list
#[derive(Deserialize, Debug, Clone)]
pub struct GalaxyConfig {
    pub n: usize,              // number of bodies to scatter in the universe cube
    pub mass_min: Option<f64>, // lower mass bound (default 1.0)
    pub mass_max: Option<f64>, // upper mass bound (default 100.0)
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,         // engine-level configuration
    pub universe: UniverseConfig,     // spatial bounds and octree depth cap
    pub parameters: ParametersConfig, // global numerical and physical parameters
    pub bodies: Option<Vec<BodyConfig>>, // explicit initial bodies
    pub galaxy: Option<GalaxyConfig>,    // or a generated galaxy
}
