//! Core state types for the N-body simulation.
//!
//! Defines the 3D body/system structs:
//! - `Body` / `System` using `NVec3`
//!
//! The system holds the list of bodies and the current simulation time `t`.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone)]
pub struct Body {
    pub x: NVec3, // 3d position
    pub v: NVec3, // 3d velocity
    pub m: f64, // mass
}

#[derive(Debug, Clone)]
pub struct System {
    pub bodies: Vec<Body>, // collection of bodies
    pub t: f64, // time
}
