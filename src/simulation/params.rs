//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - integration step size and end time,
//! - softening and gravitational constant (`eps2`, `G`),
//! - random seed for galaxy generation
//!
//! `Universe` holds the spatial bounds the octree is built over:
//! the side of the `[0, galaxy_size]^3` cube and the subdivision depth cap.

#[derive(Debug, Clone)]
pub struct Parameters {
    pub t_end: f64, // time end
    pub h0: f64, // step size
    pub seed: u64, // deterministic seed
    pub eps2: f64, // softening
    pub G: f64, // gravitational constant
}

#[derive(Debug, Clone, Copy)]
pub struct Universe {
    pub galaxy_size: f64, // side of the [0, galaxy_size]^3 bounding cube
    pub max_depth: usize, // subdivision cap before leaves become buckets
}
