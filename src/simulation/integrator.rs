//! Fixed-step time integrator for the N-body system
//!
//! Provides the velocity-Verlet step driven by `AccelSet` and `Parameters`.
//! This is the driver side of the frame: the octree core only hands out
//! force vectors and never mutates body state; all position/velocity updates
//! happen here.

use super::forces::AccelSet;
use super::params::Parameters;
use super::states::{NVec3, System};

use crate::simulation::error::TreeResult;

/// Advance the system by one time step using velocity–Verlet.
/// Uses two force evaluations per step and updates positions, velocities,
/// and `sys.t` in-place with fixed step `dt = params.h0`.
/// Fails (leaving the frame half-stepped) only if a force term fails,
/// e.g. a body drifted outside the universe cube.
pub fn verlet_integrator(sys: &mut System, forces: &AccelSet, params: &Parameters) -> TreeResult<()> {
    let n = sys.bodies.len();
    if n == 0 { // no bodies, return
        return Ok(());
    }
    let dt = params.h0; // time step dt
    let half_dt = 0.5 * dt; // half step dt/2

    // a_n from x_n at time t_n
    let mut a_old = vec![NVec3::zeros(); n];
    forces.accumulate_accels(sys.t, &*sys, &mut a_old)?;

    // Kick: v_n+1/2 = v_n + (1/2 * dt) * a_n
    for (b, a) in sys.bodies.iter_mut().zip(a_old.iter()) {
        b.v += half_dt * *a;
    }

    // Drift: full-step position: x_n+1 = x_n + dt v_n+1/2
    for b in sys.bodies.iter_mut() {
        b.x += dt * b.v;
    }

    // advance time: t_n+1 = t_n + dt
    sys.t += dt;

    // a_n+1 from x_n+1 at time t_n+1
    let mut a_new = vec![NVec3::zeros(); n];
    forces.accumulate_accels(sys.t, &*sys, &mut a_new)?;

    // Second kick: v_n+1 = v_half + (dt/2) * a_n+1
    for (b, a) in sys.bodies.iter_mut().zip(a_new.iter()) {
        b.v += half_dt * *a;
    }

    Ok(())
}
