//! Timing harness comparing direct and Barnes-Hut gravity
//!
//! Builds deterministic body clouds of increasing size, evaluates one frame
//! of accelerations with each model, and prints per-model wall time plus the
//! average octree nodes visited per body. No RNG so runs are reproducible.

use std::time::Instant;

use crate::simulation::error::TreeResult;
use crate::simulation::forces::{Acceleration, NewtonianGravity, NewtonianGravityBarnesHut};
use crate::simulation::octree::Octree;
use crate::simulation::params::Universe;
use crate::simulation::states::{Body, NVec3, System};

/// Deterministic cloud of `n` unit-mass bodies inside the universe cube
fn body_cloud(n: usize, universe: &Universe) -> System {
    let center = universe.galaxy_size * 0.5;
    let spread = universe.galaxy_size * 0.45;

    let mut bodies = Vec::with_capacity(n);
    for i in 0..n {
        let i_f = i as f64;

        // deterministic positions, no rand needed
        let x = NVec3::new(
            center + (i_f * 0.37).sin() * spread,
            center + (i_f * 0.13).cos() * spread,
            center + (i_f * 0.07).sin() * spread,
        );

        bodies.push(Body {
            x,
            v: NVec3::zeros(),
            m: 1.0,
        });
    }

    System { bodies, t: 0.0 }
}

/// Time one frame of direct vs Barnes-Hut gravity across system sizes
pub fn bench_gravity() -> TreeResult<()> {
    // Different system sizes to test
    let ns = [200, 400, 800, 1600, 3200, 6400];

    let universe = Universe {
        galaxy_size: 2000.0,
        max_depth: 32,
    };
    let g = 0.1;
    let eps2 = 1e-4;
    let theta = 0.7;

    for n in ns {
        let sys = body_cloud(n, &universe);
        let mut out = vec![NVec3::zeros(); n];

        // Set up gravity models
        let direct = NewtonianGravity { G: g, eps2 };
        let bh = NewtonianGravityBarnesHut {
            G: g,
            eps2,
            theta,
            universe,
        };

        // Warm up
        direct.acceleration(0.0, &sys, &mut out)?;
        bh.acceleration(0.0, &sys, &mut out)?;

        // Time direct
        let t0 = Instant::now();
        direct.acceleration(0.0, &sys, &mut out)?;
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time barnes-hut
        let t1 = Instant::now();
        bh.acceleration(0.0, &sys, &mut out)?;
        let dt_bh = t1.elapsed().as_secs_f64();

        // Traversal stats: average nodes visited per body
        let mut tree = Octree::build(&sys, &universe)?;
        tree.aggregate()?;
        let visited: usize = tree
            .snapshots()
            .iter()
            .map(|s| tree.force_on_body_counted(s, g, eps2, theta).1.nodes_visited)
            .sum();
        let avg_visited = visited as f64 / n as f64;

        println!(
            "N = {n:5}, direct = {dt_direct:8.6} s, BH = {dt_bh:8.6} s, avg nodes visited = {avg_visited:8.1}"
        );
    }

    Ok(())
}
