//! High-level runtime engine settings and the headless run loop
//!
//! Selects force model, integrator, and the Barnes–Hut opening angle used
//! when running a `Scenario`, and drives the frame loop: every frame the
//! force set rebuilds its octree from current positions, forces are
//! evaluated, and the integrator advances the bodies.

use tracing::{debug, info};

use crate::configuration::config::{ForceModelConfig, IntegratorConfig};
use crate::simulation::error::TreeResult;
use crate::simulation::integrator::verlet_integrator;
use crate::simulation::scenario::Scenario;

#[derive(Debug, Clone)]
pub struct Engine {
    pub force_model: ForceModelConfig, // direct summation or Barnes-Hut tree
    pub integrator: IntegratorConfig,  // verlet
    pub theta: f64, // parameter to determine if use center of mass
}

/// Step the scenario from t = 0 to `t_end` without any visualization.
///
/// A build- or aggregation-time error from the force set aborts the run at
/// the offending frame and propagates up with the body/node context intact.
pub fn run_headless(scenario: &mut Scenario) -> TreeResult<()> {
    let steps = (scenario.parameters.t_end / scenario.parameters.h0).ceil() as u64;
    let log_every = (steps / 20).max(1);

    info!(
        bodies = scenario.system.bodies.len(),
        steps,
        theta = scenario.engine.theta,
        "starting headless run"
    );

    for step in 0..steps {
        match scenario.engine.integrator {
            IntegratorConfig::Verlet => {
                verlet_integrator(&mut scenario.system, &scenario.forces, &scenario.parameters)?;
            }
        }

        if step % log_every == 0 {
            debug!(step, t = scenario.system.t, "frame complete");
        }
    }

    info!(t = scenario.system.t, "run complete");
    Ok(())
}
