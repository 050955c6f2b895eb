//! # Barnes–Hut Octree (3D)
//!
//! This module implements the **3D Barnes–Hut octree** used to approximate
//! gravitational forces in an `N`-body system. It replaces the naive `O(N²)`
//! all-pairs force calculation with an approximate `O(N log N)` method while
//! preserving good accuracy for distant interactions.
//!
//! ## Core Concepts
//!
//! The key idea of Barnes–Hut is to treat a group of distant bodies as a
//! single pseudo-body located at their center of mass. For sufficiently
//! far clusters, evaluating one interaction is drastically cheaper than
//! computing many individual forces.
//!
//! - The universe cube `[0, galaxy_size]³` is recursively subdivided into
//!   8 regions (octants).
//! - Each region becomes a node of the octree.
//! - Leaf nodes hold one body snapshot (more only at the depth cap), internal
//!   nodes hold up to eight children plus aggregate mass and center of mass.
//!
//! The tree is a single-frame structure: built fresh from the current body
//! positions, aggregated once, queried read-only, then dropped. Nodes live in
//! an arena (`Vec<OctNode>`) addressed by index; there are no parent links
//! since every traversal here is top-down.
//!
//! Pipeline per frame: [`Octree::build`] → [`Octree::aggregate`] →
//! [`Octree::compute_forces`].

use rayon::prelude::*;
use tracing::debug;

use crate::simulation::error::{TreeError, TreeResult};
use crate::simulation::params::Universe;
use crate::simulation::states::{NVec3, System};

/// Axis-aligned cubic region of space, described by its min/max corners.
///
/// Octant indices use a 3-bit encoding matching `children[0..8]`:
///
/// - Bit 0 (value 1): X axis — 0 for west (x < center.x), 1 for east
/// - Bit 1 (value 2): Y axis — 0 for south (y < center.y), 1 for north
/// - Bit 2 (value 4): Z axis — 0 for bottom (z < center.z), 1 for top
///
/// so index 0 is bottom-south-west and index 7 is top-north-east.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub min: NVec3,
    pub max: NVec3,
}

impl Cube {
    /// The `[0, galaxy_size]³` universe cube the root node covers
    pub fn universe(universe: &Universe) -> Self {
        Self {
            min: NVec3::zeros(),
            max: NVec3::new(universe.galaxy_size, universe.galaxy_size, universe.galaxy_size),
        }
    }

    /// Midpoint of the cube on every axis
    pub fn center(&self) -> NVec3 {
        (self.min + self.max) * 0.5
    }

    /// Side length (all axes are equal by construction)
    pub fn side(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Inclusive containment test on all three axes
    pub fn contains(&self, p: &NVec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Octant index for a point inside this cube.
    ///
    /// Each axis contributes one bit by comparing against the cube's center;
    /// a coordinate exactly at the midpoint goes to the upper half.
    pub fn octant_index(&self, p: &NVec3) -> usize {
        let center = self.center();
        let mut idx = 0;

        if p.x >= center.x { idx |= 1; } // bit 0: east
        if p.y >= center.y { idx |= 2; } // bit 1: north
        if p.z >= center.z { idx |= 4; } // bit 2: top

        idx
    }

    /// Sub-cube covering the octant with the given 3-bit index.
    ///
    /// The cube is split at its center along each axis, which keeps every
    /// child an exact octant-subdivision of its parent.
    pub fn octant(&self, idx: usize) -> Cube {
        let center = self.center();

        let mut min = self.min;
        let mut max = self.max;

        // x: bit 0
        if (idx & 1) == 0 {
            max.x = center.x;
        } else {
            min.x = center.x;
        }

        // y: bit 1
        if (idx & 2) == 0 {
            max.y = center.y;
        } else {
            min.y = center.y;
        }

        // z: bit 2
        if (idx & 4) == 0 {
            max.z = center.z;
        } else {
            min.z = center.z;
        }

        Cube { min, max }
    }
}

/// Non-owning reference to a body plus a snapshot of its mass and position
/// taken at insertion time.
///
/// Aggregation and force evaluation read only these snapshots, never the live
/// body set, so the tree stays consistent even if the driver mutates bodies
/// after the build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRef {
    pub body: usize, // index into the externally-owned body set
    pub m: f64,      // mass snapshot
    pub x: NVec3,    // position snapshot
}

/// A single octree node.
///
/// - `Leaf` holds the snapshot(s) of the bodies stored here. A leaf normally
///   holds exactly one entry; it becomes a multi-entry bucket only when the
///   subdivision depth cap is hit (coincident or near-coincident bodies that
///   no amount of splitting can separate).
/// - `Internal` covers a cubic region and delegates storage to up to eight
///   children, one per octant. Its `mass`/`com` aggregates are valid only
///   after [`Octree::aggregate`] has run.
#[derive(Debug, Clone, PartialEq)]
pub enum OctNode {
    Leaf {
        entries: Vec<BodyRef>,
    },
    Internal {
        cube: Cube,
        children: [Option<usize>; 8], // indices into Octree::nodes
        mass: f64,
        com: NVec3,
    },
}

/// Counters gathered during a single force traversal
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalStats {
    pub nodes_visited: usize,
}

/// A complete 3D Barnes–Hut octree built over an N-body system.
///
/// Owns all of its nodes in a flat arena; leaves reference bodies by index
/// only. Rebuilt from scratch every frame.
#[derive(Debug)]
pub struct Octree {
    pub nodes: Vec<OctNode>,
    pub root: usize,
    pub n_bodies: usize,
}

impl Octree {
    /// Build the octree for the current state of the system.
    ///
    /// Every body is inserted into the fixed `[0, galaxy_size]³` root cube;
    /// a body outside that cube fails the build with
    /// [`TreeError::OutOfBoundsBody`] — positions are never silently clamped.
    ///
    /// Insertion descends by octant. An occupied leaf slot is promoted in
    /// place to an internal node covering that octant's sub-cube and the
    /// displaced snapshot is re-inserted, which may cascade while both bodies
    /// keep landing in the same sub-octant. At `universe.max_depth` the
    /// cascade stops and the leaf degrades to a multi-entry bucket, so
    /// coincident bodies can never recurse unboundedly.
    ///
    /// Aggregates are *not* computed here; call [`Octree::aggregate`] on the
    /// result before evaluating forces.
    pub fn build(sys: &System, universe: &Universe) -> TreeResult<Self> {
        let cube = Cube::universe(universe);

        let mut tree = Octree {
            nodes: vec![OctNode::Internal {
                cube,
                children: [None; 8],
                mass: 0.0,
                com: NVec3::zeros(),
            }],
            root: 0,
            n_bodies: sys.bodies.len(),
        };

        for (i, b) in sys.bodies.iter().enumerate() {
            if !cube.contains(&b.x) {
                return Err(TreeError::out_of_bounds(i, b.x));
            }
            let entry = BodyRef { body: i, m: b.m, x: b.x };
            tree.insert(tree.root, cube, 0, entry, universe.max_depth);
        }

        debug!(
            bodies = sys.bodies.len(),
            nodes = tree.nodes.len(),
            "octree built"
        );

        Ok(tree)
    }

    /// Compute mass and center-of-mass aggregates for every internal node.
    ///
    /// Strict post-order: children are aggregated before their parent. For a
    /// leaf the aggregate is derived from its cached snapshots; for an
    /// internal node it is the mass-weighted combination of its present
    /// children (absent slots are skipped). An internal node whose subtree
    /// sums to zero mass fails with [`TreeError::ZeroMassAggregate`] before
    /// the center-of-mass division can happen.
    pub fn aggregate(&mut self) -> TreeResult<()> {
        let root = self.root;
        self.aggregate_node(root, 0)?;
        Ok(())
    }

    /// Net gravitational force on one body, from its insertion snapshot.
    ///
    /// Traverses from the root applying the opening-angle test: an internal
    /// node with `side / dist < theta` (and not containing the target) is
    /// taken as a single pseudo-body at its aggregated center, otherwise its
    /// children are refined individually. Leaves are exact pairwise
    /// interactions; the target's own entry and zero-distance pairs are
    /// skipped.
    ///
    /// # Parameters
    /// - `target`: snapshot of the body the force acts on
    /// - `g`     : gravitational constant
    /// - `eps2`  : softening added to squared distance
    /// - `theta` : opening-angle threshold (0 = always refine, exact)
    ///
    /// # Returns
    /// The net force vector `F` on the target (not acceleration; the driver
    /// divides by mass).
    pub fn force_on_body(&self, target: &BodyRef, g: f64, eps2: f64, theta: f64) -> NVec3 {
        self.force_on_body_counted(target, g, eps2, theta).0
    }

    /// Same as [`Octree::force_on_body`], also reporting traversal counters
    pub fn force_on_body_counted(
        &self,
        target: &BodyRef,
        g: f64,
        eps2: f64,
        theta: f64,
    ) -> (NVec3, TraversalStats) {
        let mut force = NVec3::zeros();
        let mut stats = TraversalStats::default();
        self.traverse(self.root, target, g, eps2, theta, &mut force, &mut stats);
        (force, stats)
    }

    /// Net force vector for every body in the tree, indexed by body index.
    ///
    /// The tree is read-only once aggregated, so the per-body traversals are
    /// independent and run on rayon workers.
    pub fn compute_forces(&self, theta: f64, g: f64, eps2: f64) -> Vec<NVec3> {
        let snapshots = self.snapshots();

        let computed: Vec<(usize, NVec3)> = snapshots
            .par_iter()
            .map(|s| (s.body, self.force_on_body(s, g, eps2, theta)))
            .collect();

        let mut out = vec![NVec3::zeros(); self.n_bodies];
        for (body, f) in computed {
            out[body] = f;
        }
        out
    }

    /// All body snapshots held by the tree's leaves
    pub fn snapshots(&self) -> Vec<BodyRef> {
        let mut snaps = Vec::with_capacity(self.n_bodies);
        for node in &self.nodes {
            if let OctNode::Leaf { entries } = node {
                snaps.extend_from_slice(entries);
            }
        }
        snaps
    }

    // helpers ==============================================================================

    /// Insert one body snapshot into the subtree rooted at `node_idx`.
    ///
    /// `cube` and `depth` describe the region `node_idx` covers; they are
    /// threaded down the recursion because leaves do not store their bounds.
    ///
    /// - Leaf at the depth cap → push into the bucket.
    /// - Leaf below the cap → promote: replace the arena slot with an empty
    ///   internal node covering the same cube, then re-insert the displaced
    ///   snapshot(s) followed by the new one.
    /// - Internal → descend into the octant child, allocating an empty leaf
    ///   for the slot if needed.
    fn insert(&mut self, node_idx: usize, cube: Cube, depth: usize, entry: BodyRef, max_depth: usize) {
        match &mut self.nodes[node_idx] {
            OctNode::Leaf { entries } => {
                if depth >= max_depth {
                    // Cannot split further; keep coincident bodies together
                    entries.push(entry);
                    return;
                }

                // Promote this slot to an internal node and re-insert
                let displaced = std::mem::replace(
                    &mut self.nodes[node_idx],
                    OctNode::Internal {
                        cube,
                        children: [None; 8],
                        mass: 0.0,
                        com: NVec3::zeros(),
                    },
                );
                if let OctNode::Leaf { entries } = displaced {
                    for e in entries {
                        self.insert(node_idx, cube, depth, e, max_depth);
                    }
                }
                self.insert(node_idx, cube, depth, entry, max_depth);
            }
            OctNode::Internal { children, .. } => {
                let oct = cube.octant_index(&entry.x);
                let child_cube = cube.octant(oct);

                match children[oct] {
                    Some(child_idx) => {
                        self.insert(child_idx, child_cube, depth + 1, entry, max_depth);
                    }
                    None => {
                        let new_idx = self.nodes.len();
                        self.nodes.push(OctNode::Leaf { entries: vec![entry] });
                        // Re-borrow: the push above may have moved the arena
                        if let OctNode::Internal { children, .. } = &mut self.nodes[node_idx] {
                            children[oct] = Some(new_idx);
                        }
                    }
                }
            }
        }
    }

    /// Post-order aggregation for one subtree; returns `(mass, com)`.
    fn aggregate_node(&mut self, node_idx: usize, depth: usize) -> TreeResult<(f64, NVec3)> {
        // Snapshot the children array by value so no &mut is live while recursing
        let children = match &self.nodes[node_idx] {
            OctNode::Leaf { entries } => {
                let mut mass = 0.0;
                let mut com = NVec3::zeros();
                for e in entries {
                    mass += e.m;
                    com += e.x * e.m;
                }
                if mass > 0.0 {
                    com /= mass;
                }
                return Ok((mass, com));
            }
            OctNode::Internal { children, .. } => *children,
        };

        let mut mass = 0.0;
        let mut com = NVec3::zeros();

        for child_idx in children.iter().flatten() {
            let (cm, cc) = self.aggregate_node(*child_idx, depth + 1)?;
            mass += cm;
            com += cc * cm;
        }

        if mass <= 0.0 {
            return Err(TreeError::ZeroMassAggregate { node: node_idx, depth });
        }
        com /= mass;

        if let OctNode::Internal { mass: nm, com: nc, .. } = &mut self.nodes[node_idx] {
            *nm = mass;
            *nc = com;
        }

        Ok((mass, com))
    }

    /// Recursively accumulate the Barnes–Hut force from one subtree.
    ///
    /// - Leaf: exact pairwise Newtonian interaction per entry, skipping the
    ///   target's own entry and zero-distance pairs (coincident bucket
    ///   members).
    /// - Internal containing the target's position: always refine, so a body
    ///   never interacts with a pseudo-body that includes itself.
    /// - Other internal nodes: approximate as a single pseudo-body at the
    ///   aggregated center when `side / dist < theta`, otherwise refine.
    fn traverse(
        &self,
        node_idx: usize,
        target: &BodyRef,
        g: f64,
        eps2: f64,
        theta: f64,
        force: &mut NVec3,
        stats: &mut TraversalStats,
    ) {
        stats.nodes_visited += 1;

        match &self.nodes[node_idx] {
            OctNode::Leaf { entries } => {
                for e in entries {
                    if e.body == target.body {
                        continue; // no self-interaction
                    }

                    let r = e.x - target.x;
                    let r2 = r.norm_squared();
                    if r2 == 0.0 {
                        continue; // coincident positions contribute nothing
                    }

                    let d2 = r2 + eps2;
                    let inv_r = d2.sqrt().recip();
                    let inv_r3 = inv_r * inv_r * inv_r;

                    // F = G * m_target * m_e / d², directed from target toward e
                    *force += g * target.m * e.m * inv_r3 * r;
                }
            }
            OctNode::Internal { cube, children, mass, com } => {
                let r = *com - target.x;
                let dist = r.norm();

                let contains_target = cube.contains(&target.x);

                if !contains_target && dist > 0.0 && cube.side() / dist < theta {
                    // Far enough away: one pseudo-body at the aggregated center
                    let d2 = r.norm_squared() + eps2;
                    let inv_r = d2.sqrt().recip();
                    let inv_r3 = inv_r * inv_r * inv_r;

                    *force += g * target.m * *mass * inv_r3 * r;
                    return;
                }

                // Too close (or our own region): refine into children
                for child_idx in children.iter().flatten() {
                    self.traverse(*child_idx, target, g, eps2, theta, force, stats);
                }
            }
        }
    }
}
