pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{Body, System, NVec3};
pub use simulation::octree::{BodyRef, Cube, OctNode, Octree, TraversalStats};
pub use simulation::error::{TreeError, TreeResult};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity, NewtonianGravityBarnesHut};
pub use simulation::integrator::verlet_integrator;
pub use simulation::params::{Parameters, Universe};
pub use simulation::engine::{run_headless, Engine};
pub use simulation::scenario::Scenario;

pub use configuration::config::{
    BodyConfig, EngineConfig, ForceModelConfig, GalaxyConfig, IntegratorConfig, ParametersConfig,
    ScenarioConfig, UniverseConfig,
};

pub use benchmark::benchmark::bench_gravity;
