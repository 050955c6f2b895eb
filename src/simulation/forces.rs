//! Force / acceleration contributors for the n-body engine
//!
//! Defines the acceleration trait and its two gravity implementations:
//! direct O(n²) Newtonian summation and the Barnes–Hut octree variant.
//! Contributors can fail (the octree build rejects out-of-bounds bodies),
//! which aborts the current frame.

use crate::simulation::error::TreeResult;
use crate::simulation::octree::Octree;
use crate::simulation::params::Universe;
use crate::simulation::states::{NVec3, System};

/// Collection of acceleration terms (gravity, drag, etc)
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System, out: &mut [NVec3]) -> TreeResult<()> {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(t, sys, out)?;
        }
        Ok(())
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for acceleration sources operating on [`System`]
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, t: f64, sys: &System, out: &mut [NVec3]) -> TreeResult<()>;
}

/// Newtonian gravity with softening (direct n² sum)
pub struct NewtonianGravity {
    pub G: f64,    // gravitational constant
    pub eps2: f64, // softening
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, sys: &System, out: &mut [NVec3]) -> TreeResult<()> {
        let n = sys.bodies.len();
        if n == 0 { // no bodies, return
            return Ok(());
        }

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &sys.bodies[i];
            let xi = bi.x; // position of body i
            let mi = bi.m; // mass of body i

            for j in (i + 1)..n {
                let bj = &sys.bodies[j];
                let xj = bj.x; // position of body j
                let mj = bj.m; // mass of body j

                // r points from i to j, so i feels a pull along +r,
                // j feels a pull along -r
                let r = xj - xi;
                let r2 = r.dot(&r);
                if r2 == 0.0 {
                    continue; // coincident positions contribute nothing
                }

                // Softened squared distance: d2 = |r|^2 + eps2
                let d2 = r2 + self.eps2;

                // 1 / |r_soft| and 1 / |r_soft|^3
                let inv_r = d2.sqrt().recip();
                let inv_r3 = inv_r * inv_r * inv_r;

                // coef = G / |r_soft|^3
                let coef = self.G * inv_r3;

                // Newton's law, equal and opposite:
                // a_i +=  G * m_j * r / |r_soft|^3
                // a_j += -G * m_i * r / |r_soft|^3
                out[i] += coef * mj * r;
                out[j] -= coef * mi * r;
            }
        }

        Ok(())
    }
}

// =========================================================================================
// Barnes-Hut implementation
// =========================================================================================

/// Newtonian gravity evaluated via a Barnes–Hut octree
/// Wraps [`Octree`] to get approximate O(N log N) accelerations controlled
/// by `theta` (opening angle) and `eps2` (softening). The tree is rebuilt
/// from scratch on every evaluation and discarded afterwards.
pub struct NewtonianGravityBarnesHut {
    pub G: f64,
    pub eps2: f64,
    pub theta: f64,
    pub universe: Universe,
}

impl Acceleration for NewtonianGravityBarnesHut {
    /// Compute accelerations using a Barnes–Hut tree built from `sys`
    fn acceleration(&self, _t: f64, sys: &System, out: &mut [NVec3]) -> TreeResult<()> {
        if sys.bodies.is_empty() {
            return Ok(());
        }

        let mut tree = Octree::build(sys, &self.universe)?;
        tree.aggregate()?;

        let forces = tree.compute_forces(self.theta, self.G, self.eps2);
        for (i, f) in forces.into_iter().enumerate() {
            // The tree hands back forces; the driver wants accelerations
            out[i] += f / sys.bodies[i].m;
        }

        Ok(())
    }
}
