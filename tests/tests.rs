use gravtree::simulation::engine::run_headless;
use gravtree::simulation::error::TreeError;
use gravtree::simulation::forces::{AccelSet, NewtonianGravity};
use gravtree::simulation::integrator::verlet_integrator;
use gravtree::simulation::octree::{OctNode, Octree};
use gravtree::simulation::params::{Parameters, Universe};
use gravtree::simulation::scenario::Scenario;
use gravtree::simulation::states::{Body, NVec3, System};
use gravtree::ScenarioConfig;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Standard test universe: the original fixed [0, 2000]^3 galaxy cube
pub fn test_universe() -> Universe {
    Universe {
        galaxy_size: 2000.0,
        max_depth: 32,
    }
}

/// Build a simple 2-body System separated along x, centered in the cube
pub fn two_body_system(dist: f64, m1: f64, m2: f64) -> System {
    let c = 1000.0;
    let b1 = Body {
        x: [c - dist / 2.0, c, c].into(),
        v: [0.0, 0.0, 0.0].into(),
        m: m1,
    };
    let b2 = Body {
        x: [c + dist / 2.0, c, c].into(),
        v: [0.0, 0.0, 0.0].into(),
        m: m2,
    };
    System {
        bodies: vec![b1, b2],
        t: 0.0,
    }
}

/// Seeded random cloud of n bodies inside the test universe
pub fn random_cloud(n: usize, seed: u64) -> System {
    let mut rng = StdRng::seed_from_u64(seed);
    let bodies = (0..n)
        .map(|_| Body {
            x: NVec3::new(
                rng.gen_range(0.0..2000.0),
                rng.gen_range(0.0..2000.0),
                rng.gen_range(0.0..2000.0),
            ),
            v: NVec3::zeros(),
            m: rng.gen_range(1.0..100.0),
        })
        .collect();
    System { bodies, t: 0.0 }
}

/// Default physics parameters for tests
pub fn test_params() -> Parameters {
    Parameters {
        t_end: 1.0,
        h0: 0.001,
        seed: 42,
        eps2: 0.0,
        G: 0.1,
    }
}

/// Build a gravity term + AccelSet
pub fn gravity_set(p: &Parameters) -> AccelSet {
    AccelSet::new().with(NewtonianGravity {
        G: p.G,
        eps2: p.eps2,
    })
}

/// Sum of the snapshot masses stored in a subtree's leaves
fn subtree_mass(tree: &Octree, idx: usize) -> f64 {
    match &tree.nodes[idx] {
        OctNode::Leaf { entries } => entries.iter().map(|e| e.m).sum(),
        OctNode::Internal { children, .. } => children
            .iter()
            .flatten()
            .map(|c| subtree_mass(tree, *c))
            .sum(),
    }
}

// ==================================================================================
// Octree build tests
// ==================================================================================

#[test]
fn build_rejects_out_of_bounds_body() {
    let mut sys = random_cloud(3, 1);
    sys.bodies[0].x = NVec3::new(-1.0, -1.0, -1.0);

    let err = Octree::build(&sys, &test_universe()).unwrap_err();
    match err {
        TreeError::OutOfBoundsBody { body, x, y, z } => {
            assert_eq!(body, 0);
            assert_eq!((x, y, z), (-1.0, -1.0, -1.0));
        }
        other => panic!("expected OutOfBoundsBody, got {other:?}"),
    }
}

#[test]
fn build_is_deterministic() {
    let sys = random_cloud(500, 9);
    let u = test_universe();

    let t1 = Octree::build(&sys, &u).unwrap();
    let t2 = Octree::build(&sys, &u).unwrap();

    assert_eq!(t1.root, t2.root);
    assert_eq!(t1.nodes, t2.nodes, "same input order must give the same arena");
}

#[test]
fn coincident_bodies_share_a_bucket_leaf() {
    let c = 1000.0;
    let body = Body {
        x: NVec3::new(c, c, c),
        v: NVec3::zeros(),
        m: 5.0,
    };
    let sys = System {
        bodies: vec![body.clone(), body],
        t: 0.0,
    };
    let u = Universe {
        galaxy_size: 2000.0,
        max_depth: 8,
    };

    // Must terminate and put both snapshots in one leaf
    let mut tree = Octree::build(&sys, &u).unwrap();
    let bucket = tree.nodes.iter().find_map(|n| match n {
        OctNode::Leaf { entries } if entries.len() == 2 => Some(entries.clone()),
        _ => None,
    });
    assert!(bucket.is_some(), "coincident bodies should end up bucketed");

    // Aggregation sees both masses; mutual force is the zero-distance skip
    tree.aggregate().unwrap();
    let forces = tree.compute_forces(0.5, 1.0, 0.0);
    assert_eq!(forces.len(), 2);
    for f in &forces {
        assert_eq!(f.norm(), 0.0);
    }
}

#[test]
fn octant_geometry_round_trips() {
    let u = test_universe();
    let cube = gravtree::Cube::universe(&u);

    for idx in 0..8 {
        let sub = cube.octant(idx);
        // exact midpoint split on every axis
        assert_relative_eq!(sub.side(), cube.side() / 2.0);
        // the sub-cube's own center classifies back to the same octant
        assert_eq!(cube.octant_index(&sub.center()), idx);
    }
}

// ==================================================================================
// Aggregation tests
// ==================================================================================

#[test]
fn root_mass_equals_total_input_mass() {
    let sys = random_cloud(300, 3);
    let total: f64 = sys.bodies.iter().map(|b| b.m).sum();

    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();

    match &tree.nodes[tree.root] {
        OctNode::Internal { mass, .. } => {
            assert_relative_eq!(*mass, total, max_relative = 1e-12);
        }
        OctNode::Leaf { .. } => panic!("root must be internal"),
    }
}

#[test]
fn every_internal_mass_matches_its_subtree() {
    let sys = random_cloud(400, 4);
    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();

    for (idx, node) in tree.nodes.iter().enumerate() {
        if let OctNode::Internal { mass, .. } = node {
            assert_relative_eq!(*mass, subtree_mass(&tree, idx), max_relative = 1e-9);
        }
    }
}

#[test]
fn empty_tree_fails_aggregation_with_zero_mass() {
    let sys = System {
        bodies: Vec::new(),
        t: 0.0,
    };
    let mut tree = Octree::build(&sys, &test_universe()).unwrap();

    let err = tree.aggregate().unwrap_err();
    assert!(matches!(
        err,
        TreeError::ZeroMassAggregate { node: 0, depth: 0 }
    ));
}

// ==================================================================================
// Force evaluation tests
// ==================================================================================

#[test]
fn theta_zero_matches_direct_summation() {
    let sys = random_cloud(120, 12);
    let p = test_params();

    // Direct O(n^2) accelerations
    let forces = gravity_set(&p);
    let mut acc = vec![NVec3::zeros(); sys.bodies.len()];
    forces.accumulate_accels(sys.t, &sys, &mut acc).unwrap();

    // Tree with theta = 0 always refines down to exact leaves
    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();
    let tree_forces = tree.compute_forces(0.0, p.G, p.eps2);

    for (i, b) in sys.bodies.iter().enumerate() {
        let tree_acc = tree_forces[i] / b.m;
        let diff = (tree_acc - acc[i]).norm();
        let scale = acc[i].norm().max(1e-12);
        assert!(
            diff <= 1e-9 * scale,
            "body {i}: tree acc {tree_acc:?} != direct acc {:?}",
            acc[i]
        );
    }
}

#[test]
fn two_body_forces_are_equal_and_opposite() {
    let (m1, m2, dist) = (100.0, 200.0, 10.0);
    let p = test_params();
    let sys = two_body_system(dist, m1, m2);

    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();
    let forces = tree.compute_forces(0.0, p.G, 0.0);

    let expected = p.G * m1 * m2 / (dist * dist);
    assert_relative_eq!(forces[0].norm(), expected, max_relative = 1e-12);
    assert_relative_eq!(forces[1].norm(), expected, max_relative = 1e-12);

    // directed toward the other body along x, net force zero
    assert!(forces[0].x > 0.0);
    assert!(forces[1].x < 0.0);
    assert_relative_eq!((forces[0] + forces[1]).norm(), 0.0, epsilon = 1e-9);
}

#[test]
fn larger_theta_never_visits_more_nodes() {
    let sys = random_cloud(300, 30);
    let p = test_params();

    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();
    let snaps = tree.snapshots();

    let mut previous = usize::MAX;
    for theta in [0.0, 0.3, 0.5, 0.8, 1.2] {
        let visited: usize = snaps
            .iter()
            .map(|s| tree.force_on_body_counted(s, p.G, p.eps2, theta).1.nodes_visited)
            .sum();
        assert!(
            visited <= previous,
            "theta {theta}: visited {visited} > previous {previous}"
        );
        previous = visited;
    }
}

#[test]
fn thousand_random_bodies_get_finite_forces() {
    let sys = random_cloud(1000, 7);

    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();

    let forces = tree.compute_forces(0.7, 1.0, 1e-4);
    assert_eq!(forces.len(), 1000);
    for (i, f) in forces.iter().enumerate() {
        assert!(
            f.x.is_finite() && f.y.is_finite() && f.z.is_finite(),
            "body {i} got a non-finite force {f:?}"
        );
    }
}

// ==================================================================================
// Gravity model tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let sys = two_body_system(1.0, 2.0, 3.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc).unwrap();

    let net = acc[0] * sys.bodies[0].m + acc[1] * sys.bodies[1].m;

    assert!(net.norm() < 1e-12, "Net momentum not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let sys = two_body_system(2.0, 1.0, 1.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc).unwrap();

    let dx = sys.bodies[1].x - sys.bodies[0].x;

    // Should point in same direction as +dx (attraction)
    assert!(dx.norm() > 0.0);
    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
}

#[test]
fn gravity_inverse_square_law() {
    let sys_r = two_body_system(1.0, 1.0, 1.0);
    let sys_2r = two_body_system(2.0, 1.0, 1.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let mut acc_r = vec![NVec3::zeros(); 2];
    let mut acc_2r = vec![NVec3::zeros(); 2];

    forces.accumulate_accels(sys_r.t, &sys_r, &mut acc_r).unwrap();
    forces.accumulate_accels(sys_2r.t, &sys_2r, &mut acc_2r).unwrap();

    let ratio = acc_r[0].norm() / acc_2r[0].norm();

    assert!((ratio - 4.0).abs() < 1e-3, "Expected ~4x, got {}", ratio);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let mut p = test_params();
    p.eps2 = 0.1;

    let sys = two_body_system(1e-9, 1.0, 1.0);
    let forces = gravity_set(&p);

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc).unwrap();

    assert!(acc[0].norm() < 1e9, "Softening failed; acceleration too large");
}

#[test]
fn gravity_skips_coincident_bodies_without_softening() {
    let p = test_params(); // eps2 = 0
    let c = 1000.0;
    let body = Body {
        x: NVec3::new(c, c, c),
        v: NVec3::zeros(),
        m: 5.0,
    };
    let sys = System {
        bodies: vec![body.clone(), body],
        t: 0.0,
    };

    // Direct sum: the zero-distance pair is skipped, not divided by zero
    let forces = gravity_set(&p);
    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc).unwrap();
    for a in &acc {
        assert!(a.x.is_finite() && a.y.is_finite() && a.z.is_finite());
        assert_eq!(a.norm(), 0.0);
    }

    // and the tree evaluator agrees on the degenerate case
    let mut tree = Octree::build(&sys, &test_universe()).unwrap();
    tree.aggregate().unwrap();
    let tree_forces = tree.compute_forces(0.0, p.G, p.eps2);
    for f in &tree_forces {
        assert_eq!(f.norm(), 0.0);
    }
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn verlet_advances_time_and_pulls_bodies_together() {
    let mut sys = two_body_system(10.0, 50.0, 50.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let initial_sep = (sys.bodies[1].x - sys.bodies[0].x).norm();
    for _ in 0..100 {
        verlet_integrator(&mut sys, &forces, &p).unwrap();
    }

    assert_relative_eq!(sys.t, 100.0 * p.h0, max_relative = 1e-12);
    let sep = (sys.bodies[1].x - sys.bodies[0].x).norm();
    assert!(sep < initial_sep, "bodies at rest should fall toward each other");
}

// ==================================================================================
// Scenario / configuration tests
// ==================================================================================

const SCENARIO_YAML: &str = r#"
engine:
  force_model: "barnes-hut"
  integrator: "verlet"

universe:
  galaxy_size: 2000.0

parameters:
  t_end: 0.1
  h0: 0.01
  seed: 42
  eps2: 1.0e-4
  G: 1.0

galaxy:
  n: 50
"#;

#[test]
fn scenario_builds_from_yaml_with_defaults() {
    let cfg: ScenarioConfig = serde_yaml::from_str(SCENARIO_YAML).unwrap();
    let scenario = Scenario::build_scenario(cfg).unwrap();

    assert_eq!(scenario.system.bodies.len(), 50);
    assert_relative_eq!(scenario.engine.theta, 0.7); // default when omitted
    assert_eq!(scenario.universe.max_depth, 32); // default when omitted

    // generated bodies land inside the universe cube
    let cube = gravtree::Cube::universe(&scenario.universe);
    for b in &scenario.system.bodies {
        assert!(cube.contains(&b.x));
        assert!(b.m > 0.0);
    }
}

#[test]
fn scenario_rejects_bodies_and_galaxy_together() {
    let yaml = format!(
        "{SCENARIO_YAML}\nbodies:\n  - x: [1.0, 1.0, 1.0]\n    v: [0.0, 0.0, 0.0]\n    m: 1.0\n"
    );
    let cfg: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(Scenario::build_scenario(cfg).is_err());
}

#[test]
fn headless_run_completes_a_short_scenario() {
    let cfg: ScenarioConfig = serde_yaml::from_str(SCENARIO_YAML).unwrap();
    let mut scenario = Scenario::build_scenario(cfg).unwrap();

    run_headless(&mut scenario).unwrap();

    assert!(scenario.system.t >= scenario.parameters.t_end - scenario.parameters.h0);
    for b in &scenario.system.bodies {
        assert!(b.x.x.is_finite() && b.x.y.is_finite() && b.x.z.is_finite());
    }
}
