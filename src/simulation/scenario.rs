//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! (`Scenario`) containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`) and universe bounds (`Universe`)
//! - system state (`System` with bodies at t = 0), either from an explicit
//!   body list or a seeded random galaxy
//! - active force set (`AccelSet`)

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{BodyConfig, ForceModelConfig, GalaxyConfig, ScenarioConfig};
use crate::simulation::engine::Engine;
use crate::simulation::forces::{AccelSet, NewtonianGravity, NewtonianGravityBarnesHut};
use crate::simulation::params::{Parameters, Universe};
use crate::simulation::states::{Body, NVec3, System};

const DEFAULT_THETA: f64 = 0.7;
const DEFAULT_MAX_DEPTH: usize = 32;

/// A fully-initialized simulation scenario
///
/// This is the main "runtime bundle" constructed from a [`ScenarioConfig`]:
/// it contains the engine settings, parameters, universe bounds, current
/// system state, and the set of active force laws (accelerations). It is
/// consumed by the headless run loop and the benchmark harness.
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub universe: Universe,
    pub system: System,
    pub forces: AccelSet,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            t_end: p_cfg.t_end,
            h0: p_cfg.h0,
            seed: p_cfg.seed,
            eps2: p_cfg.eps2,
            G: p_cfg.G,
        };

        let universe = Universe {
            galaxy_size: cfg.universe.galaxy_size,
            max_depth: cfg.universe.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        };
        if universe.galaxy_size <= 0.0 {
            bail!("universe.galaxy_size must be positive, got {}", universe.galaxy_size);
        }

        // Bodies: explicit list or generated galaxy, never both
        let bodies = match (cfg.bodies, cfg.galaxy) {
            (Some(list), None) => explicit_bodies(&list)?,
            (None, Some(galaxy)) => random_galaxy(&galaxy, &universe, parameters.seed),
            (Some(_), Some(_)) => bail!("scenario defines both `bodies` and `galaxy`; pick one"),
            (None, None) => bail!("scenario defines neither `bodies` nor `galaxy`"),
        };

        // Initial system state: bodies at t = 0
        let system = System { bodies, t: 0.0 };

        // Engine (runtime) from EngineConfig
        let e_cfg = cfg.engine;
        let engine = Engine {
            force_model: e_cfg.force_model,
            integrator: e_cfg.integrator,
            theta: e_cfg.theta.unwrap_or(DEFAULT_THETA),
        };

        // Forces: construct an AccelSet and register the configured gravity
        let forces = match &engine.force_model {
            ForceModelConfig::BarnesHut => AccelSet::new().with(NewtonianGravityBarnesHut {
                G: parameters.G,
                eps2: parameters.eps2,
                theta: engine.theta,
                universe,
            }),
            ForceModelConfig::Direct => AccelSet::new().with(NewtonianGravity {
                G: parameters.G,
                eps2: parameters.eps2,
            }),
        };

        Ok(Self {
            engine,
            parameters,
            universe,
            system,
            forces,
        })
    }
}

/// Map `BodyConfig` entries to runtime bodies, checking vector arity
fn explicit_bodies(list: &[BodyConfig]) -> Result<Vec<Body>> {
    let mut bodies = Vec::with_capacity(list.len());
    for (i, bc) in list.iter().enumerate() {
        if bc.x.len() != 3 || bc.v.len() != 3 {
            bail!("body {i}: `x` and `v` must each have 3 components");
        }
        if bc.m <= 0.0 {
            bail!("body {i}: mass must be positive, got {}", bc.m);
        }
        bodies.push(Body {
            x: NVec3::new(bc.x[0], bc.x[1], bc.x[2]),
            v: NVec3::new(bc.v[0], bc.v[1], bc.v[2]),
            m: bc.m,
        });
    }
    Ok(bodies)
}

/// Scatter `n` bodies uniformly in the universe cube with random masses.
/// Deterministic for a given seed.
fn random_galaxy(galaxy: &GalaxyConfig, universe: &Universe, seed: u64) -> Vec<Body> {
    let mut rng = StdRng::seed_from_u64(seed);
    let size = universe.galaxy_size;
    let mass_min = galaxy.mass_min.unwrap_or(1.0);
    let mass_max = galaxy.mass_max.unwrap_or(100.0);

    (0..galaxy.n)
        .map(|_| Body {
            x: NVec3::new(
                rng.gen_range(0.0..size),
                rng.gen_range(0.0..size),
                rng.gen_range(0.0..size),
            ),
            v: NVec3::zeros(),
            m: rng.gen_range(mass_min..=mass_max),
        })
        .collect()
}
