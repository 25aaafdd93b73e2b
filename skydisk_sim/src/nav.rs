// Navigation graph for ring pathfinding.
//
// The nav graph is a set of `NavNode`s (rim points, each owned by exactly
// one disk) connected by `NavEdge`s (typed, weighted connections). It is
// built once from the disk registry by `build_nav_graph()` and is read-only
// afterwards; every ring's search shares it.
//
// Nodes only exist where two disks touch. For each adjacent pair (A, B) the
// builder places one node on A's rim facing B and one on B's rim facing A,
// joins them with a `Bridge` edge, then joins each new node to every node
// already on its own disk's rim with a `RimArc` edge. A disk with k
// neighbours therefore carries k rim nodes forming a complete subgraph.
//
// All storage uses `Vec` indexed by `NavNodeId`/`NavEdgeId` for O(1) lookup
// and deterministic iteration order. Positions are never used as keys.
//
// See also: `disk.rs` for the registry that feeds construction,
// `pathfinding.rs` for the bidirectional search over this graph, `sim.rs`
// which owns the `NavGraph` as transient state.
//
// **Critical constraint: determinism.** Disk pairs are scanned in registry
// order (i < j), so node and edge IDs are a pure function of the disk list
// and config.

use crate::config::GameConfig;
use crate::disk::{Disk, DiskRegistry};
use crate::types::{DiskId, NavEdgeId, NavNodeId, Vec3};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A node in the navigation graph: a point on one disk's rim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavNode {
    pub id: NavNodeId,
    pub position: Vec3,
    /// The disk whose rim this node sits on.
    pub disk: DiskId,
    /// Indices into `NavGraph.edges` for edges that originate from this node.
    pub edge_indices: SmallVec<[usize; 6]>,
}

/// The type of connection between two nav nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Sliding along one disk's rim between two of its nodes.
    RimArc,
    /// Crossing the gap between two touching disks.
    Bridge,
}

/// A directed edge. Every edge has a reverse twin with the same cost.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavEdge {
    pub id: NavEdgeId,
    pub from: NavNodeId,
    pub to: NavNodeId,
    pub kind: EdgeKind,
    /// Traversal cost. Rim arcs cost their arc length; bridges cost their
    /// length scaled by the mean inverse speed factor of the two disks.
    pub cost: f32,
}

/// The navigation graph container.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGraph {
    nodes: Vec<NavNode>,
    edges: Vec<NavEdge>,
    /// `rim_nodes[disk]` lists that disk's nodes in creation order.
    rim_nodes: Vec<Vec<NavNodeId>>,
}

impl NavGraph {
    /// An empty graph with one (empty) rim list per disk.
    pub(crate) fn with_disk_count(disk_count: usize) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            rim_nodes: vec![Vec::new(); disk_count],
        }
    }

    /// Add a node on `disk`'s rim. Returns its ID. The node is not yet
    /// listed in the disk's rim list; see `push_rim_node`.
    pub(crate) fn add_node(&mut self, position: Vec3, disk: DiskId) -> NavNodeId {
        let id = NavNodeId(self.nodes.len() as u32);
        self.nodes.push(NavNode {
            id,
            position,
            disk,
            edge_indices: SmallVec::new(),
        });
        id
    }

    /// Append an existing node to its disk's rim list.
    pub(crate) fn push_rim_node(&mut self, node: NavNodeId) {
        let disk = self.nodes[node.index()].disk.index();
        if self.rim_nodes.len() <= disk {
            self.rim_nodes.resize(disk + 1, Vec::new());
        }
        self.rim_nodes[disk].push(node);
    }

    /// Add a bidirectional edge between two nodes. Returns the edge ID of
    /// the forward (from -> to) edge.
    pub(crate) fn add_edge(
        &mut self,
        from: NavNodeId,
        to: NavNodeId,
        kind: EdgeKind,
        cost: f32,
    ) -> NavEdgeId {
        debug_assert!(from != to, "self-loop on {from}");
        debug_assert!(cost >= 0.0, "negative cost {cost} on {from} -> {to}");

        let forward_idx = self.edges.len();
        let forward_id = NavEdgeId(forward_idx as u32);
        self.edges.push(NavEdge {
            id: forward_id,
            from,
            to,
            kind,
            cost,
        });

        let reverse_idx = self.edges.len();
        self.edges.push(NavEdge {
            id: NavEdgeId(reverse_idx as u32),
            from: to,
            to: from,
            kind,
            cost,
        });

        self.nodes[from.index()].edge_indices.push(forward_idx);
        self.nodes[to.index()].edge_indices.push(reverse_idx);

        forward_id
    }

    /// Indices of all edges originating from a node.
    pub fn edge_indices(&self, node: NavNodeId) -> &[usize] {
        &self.nodes[node.index()].edge_indices
    }

    /// `(neighbor, cost)` for every edge leaving `node`, in insertion order.
    pub fn neighbors(&self, node: NavNodeId) -> impl Iterator<Item = (NavNodeId, f32)> + '_ {
        self.edge_indices(node).iter().map(|&idx| {
            let edge = &self.edges[idx];
            (edge.to, edge.cost)
        })
    }

    pub fn node(&self, id: NavNodeId) -> &NavNode {
        &self.nodes[id.index()]
    }

    pub fn edge(&self, idx: usize) -> &NavEdge {
        &self.edges[idx]
    }

    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[NavEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed edges (twice the number of connections).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes on `disk`'s rim, in creation order. Empty for isolated disks.
    pub fn rim_nodes(&self, disk: DiskId) -> &[NavNodeId] {
        self.rim_nodes
            .get(disk.index())
            .map_or(&[], |nodes| nodes.as_slice())
    }

    /// The directed edge `a -> b`, if the two nodes are linked.
    pub fn edge_between(&self, a: NavNodeId, b: NavNodeId) -> Option<&NavEdge> {
        self.edge_indices(a)
            .iter()
            .map(|&idx| &self.edges[idx])
            .find(|e| e.to == b)
    }

    /// The node horizontally nearest to `position`; lowest ID on ties.
    /// Returns `None` if the graph is empty.
    pub fn find_nearest_node(&self, position: Vec3) -> Option<NavNodeId> {
        self.nodes
            .iter()
            .min_by(|a, b| {
                a.position
                    .distance_xz(position)
                    .total_cmp(&b.position.distance_xz(position))
            })
            .map(|n| n.id)
    }

    /// All node IDs in ID order.
    pub fn node_ids(&self) -> impl Iterator<Item = NavNodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }
}

/// Radius of the circle rim nodes sit on. Never negative.
pub fn rim_radius(disk: &Disk, rim_offset: f32) -> f32 {
    (disk.radius - rim_offset).max(0.0)
}

/// The point on `disk`'s rim circle facing `other`'s center. Concentric
/// disks face +X.
pub fn tangent_point(disk: &Disk, other: &Disk, rim_offset: f32) -> Vec3 {
    let toward = (other.position - disk.position)
        .normalized()
        .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
    disk.position + toward * rim_radius(disk, rim_offset)
}

/// Arc length along `disk`'s rim circle between two of its rim points.
pub fn rim_arc_cost(disk: &Disk, a: Vec3, b: Vec3, rim_offset: f32) -> f32 {
    let angle = (a - disk.position).angle_to(b - disk.position);
    angle * rim_radius(disk, rim_offset)
}

/// Straight-line length between two tangent points, scaled by the mean of
/// the two disks' inverse speed factors (slow terrain costs more).
pub fn bridge_cost(a: &Disk, b: &Disk, a_pos: Vec3, b_pos: Vec3) -> f32 {
    let inverse_mean = (1.0 / a.speed_factor + 1.0 / b.speed_factor) / 2.0;
    a_pos.distance(b_pos) * inverse_mean
}

/// Build the navigation graph from the disk registry.
///
/// For every disk pair (i < j) closer than their radii plus
/// `config.adjacency_slack`:
/// 1. Place a tangent node on each disk facing the other.
/// 2. Join the two with a `Bridge` edge.
/// 3. Join each new node to every node already on its disk's rim with a
///    `RimArc` edge.
/// 4. Append each new node to its disk's rim list.
///
/// Isolated disks get no nodes.
pub fn build_nav_graph(registry: &DiskRegistry, config: &GameConfig) -> NavGraph {
    let mut graph = NavGraph::with_disk_count(registry.disk_count());
    let disks = registry.disks();
    let offset = config.rim_offset;

    for (i, a) in disks.iter().enumerate() {
        for b in &disks[i + 1..] {
            if !a.is_adjacent(b, config.adjacency_slack) {
                continue;
            }

            let a_pos = tangent_point(a, b, offset);
            let b_pos = tangent_point(b, a, offset);
            let node_a = graph.add_node(a_pos, a.id);
            let node_b = graph.add_node(b_pos, b.id);

            let cost = bridge_cost(a, b, a_pos, b_pos);
            graph.add_edge(node_a, node_b, EdgeKind::Bridge, cost);
            trace!("bridge {} <-> {} between {} and {}: cost {cost:.3}", node_a, node_b, a.id, b.id);

            link_to_rim(&mut graph, node_a, a, offset);
            link_to_rim(&mut graph, node_b, b, offset);
            graph.push_rim_node(node_a);
            graph.push_rim_node(node_b);
        }
    }

    let isolated = disks
        .iter()
        .filter(|d| graph.rim_nodes(d.id).is_empty())
        .count();
    debug!(
        "nav graph built: {} disks, {} nodes, {} directed edges, {} isolated disks",
        disks.len(),
        graph.node_count(),
        graph.edge_count(),
        isolated
    );

    graph
}

/// Join `node` to every node already on `disk`'s rim.
fn link_to_rim(graph: &mut NavGraph, node: NavNodeId, disk: &Disk, rim_offset: f32) {
    let node_pos = graph.node(node).position;
    // Cloned so the graph can be mutated while walking the old rim.
    let existing: SmallVec<[NavNodeId; 8]> = graph.rim_nodes(disk.id).iter().copied().collect();
    for other in existing {
        let other_pos = graph.node(other).position;
        let cost = rim_arc_cost(disk, node_pos, other_pos, rim_offset);
        graph.add_edge(node, other, EdgeKind::RimArc, cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::DiskSpec;

    fn build(specs: &[DiskSpec]) -> (DiskRegistry, NavGraph) {
        let config = GameConfig::default();
        let registry = DiskRegistry::new(specs, &config).unwrap();
        let graph = build_nav_graph(&registry, &config);
        (registry, graph)
    }

    /// A hub disk at the origin with three spokes (east, north, west).
    fn hub_world() -> Vec<DiskSpec> {
        vec![
            DiskSpec::new(0.0, 0.0, 10.0),
            DiskSpec::new(20.0, 0.0, 10.0),
            DiskSpec::new(0.0, -16.0, 6.0),
            DiskSpec::new(-25.0, 0.0, 15.0),
        ]
    }

    #[test]
    fn touching_pair_gets_one_tangent_node_each() {
        let (_, graph) = build(&[DiskSpec::new(0.0, 0.0, 10.0), DiskSpec::new(20.0, 0.0, 10.0)]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);

        let a = graph.node(NavNodeId(0));
        let b = graph.node(NavNodeId(1));
        assert_eq!(a.disk, DiskId(0));
        assert_eq!(b.disk, DiskId(1));
        assert!((a.position.x - 9.3).abs() < 1e-5);
        assert!((b.position.x - 10.7).abs() < 1e-5);

        let bridge = graph.edge_between(a.id, b.id).unwrap();
        assert_eq!(bridge.kind, EdgeKind::Bridge);
        // Both disks are Leafy (speed 0.5): 1.4 m at inverse speed 2.
        assert!((bridge.cost - 2.8).abs() < 1e-4);
    }

    #[test]
    fn bridge_cost_averages_inverse_speed_factors() {
        // RedRock (1.0) next to Icy (0.25): mean inverse = (1 + 4) / 2.
        let (_, graph) = build(&[DiskSpec::new(0.0, 0.0, 6.0), DiskSpec::new(21.0, 0.0, 15.0)]);
        let edge = graph.edge_between(NavNodeId(0), NavNodeId(1)).unwrap();
        let gap = graph
            .node(NavNodeId(0))
            .position
            .distance(graph.node(NavNodeId(1)).position);
        assert!((gap - 1.4).abs() < 1e-4);
        assert!((edge.cost - gap * 2.5).abs() < 1e-4);
    }

    #[test]
    fn separated_disks_get_no_nodes() {
        let (_, graph) = build(&[DiskSpec::new(0.0, 0.0, 10.0), DiskSpec::new(20.2, 0.0, 10.0)]);
        assert!(graph.is_empty());
        assert!(graph.rim_nodes(DiskId(0)).is_empty());
    }

    #[test]
    fn small_gap_within_slack_is_adjacent() {
        let (_, graph) = build(&[DiskSpec::new(0.0, 0.0, 10.0), DiskSpec::new(20.05, 0.0, 10.0)]);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn rim_arc_costs_match_trig_reference() {
        let (registry, graph) = build(&hub_world());
        let offset = GameConfig::default().rim_offset;
        let mut arcs = 0;
        for edge in graph.edges().iter().filter(|e| e.kind == EdgeKind::RimArc) {
            let from = graph.node(edge.from);
            let to = graph.node(edge.to);
            assert_eq!(from.disk, to.disk, "rim arc must stay on one disk");
            let disk = registry.disk(from.disk);
            let u = from.position - disk.position;
            let v = to.position - disk.position;
            let cos = (u.x * v.x + u.z * v.z) / (u.length() * v.length());
            let expected = (disk.radius - offset) * cos.clamp(-1.0, 1.0).acos();
            assert!(
                (edge.cost - expected).abs() < 1e-3,
                "arc {} -> {}: {} vs {}",
                edge.from,
                edge.to,
                edge.cost,
                expected
            );
            arcs += 1;
        }
        // Hub has 3 rim nodes: 3 connections, 6 directed arcs.
        assert_eq!(arcs, 6);
    }

    #[test]
    fn hub_quarter_turn_arc_length() {
        let (_, graph) = build(&hub_world());
        // Node 0: hub facing east. Node 2: hub facing north (-Z).
        let east = graph.rim_nodes(DiskId(0))[0];
        let north = graph.rim_nodes(DiskId(0))[1];
        let arc = graph.edge_between(east, north).unwrap();
        let expected = 9.3 * std::f32::consts::FRAC_PI_2;
        assert!((arc.cost - expected).abs() < 1e-3);
    }

    #[test]
    fn every_edge_has_an_equal_cost_twin() {
        let (_, graph) = build(&hub_world());
        for edge in graph.edges() {
            let twin = graph.edge_between(edge.to, edge.from).unwrap();
            assert_eq!(twin.cost, edge.cost);
            assert_eq!(twin.kind, edge.kind);
        }
    }

    #[test]
    fn no_self_loops_and_costs_non_negative() {
        let (_, graph) = build(&hub_world());
        for edge in graph.edges() {
            assert_ne!(edge.from, edge.to);
            assert!(edge.cost >= 0.0);
        }
    }

    #[test]
    fn rim_lists_agree_with_node_owners() {
        let (registry, graph) = build(&hub_world());
        let mut listed = 0;
        for disk in registry.disks() {
            for &n in graph.rim_nodes(disk.id) {
                assert_eq!(graph.node(n).disk, disk.id);
                listed += 1;
            }
        }
        assert_eq!(listed, graph.node_count());
        assert_eq!(graph.rim_nodes(DiskId(0)).len(), 3);
        assert_eq!(graph.rim_nodes(DiskId(1)).len(), 1);
    }

    #[test]
    fn rim_nodes_form_complete_subgraph() {
        let (_, graph) = build(&hub_world());
        let rim = graph.rim_nodes(DiskId(0));
        for &a in rim {
            for &b in rim {
                if a != b {
                    assert!(graph.edge_between(a, b).is_some(), "{a} not linked to {b}");
                }
            }
        }
    }

    #[test]
    fn isolated_disk_gets_no_rim_nodes() {
        let mut world = hub_world();
        world.push(DiskSpec::new(200.0, 200.0, 10.0));
        let (_, graph) = build(&world);
        assert!(graph.rim_nodes(DiskId(4)).is_empty());
        assert!(graph.nodes().iter().all(|n| n.disk != DiskId(4)));
    }

    #[test]
    fn building_twice_is_identical() {
        let world = hub_world();
        let (_, g1) = build(&world);
        let (_, g2) = build(&world);
        assert_eq!(g1.node_count(), g2.node_count());
        assert_eq!(g1.edge_count(), g2.edge_count());
        for (a, b) in g1.edges().iter().zip(g2.edges()) {
            assert_eq!((a.from, a.to, a.kind), (b.from, b.to, b.kind));
            assert_eq!(a.cost, b.cost);
        }
        for (a, b) in g1.nodes().iter().zip(g2.nodes()) {
            assert_eq!(a.edge_indices, b.edge_indices);
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn neighbors_reports_costs() {
        let (_, graph) = build(&hub_world());
        let east = graph.rim_nodes(DiskId(0))[0];
        let neighbors: Vec<_> = graph.neighbors(east).collect();
        // One bridge plus arcs to the two later hub nodes.
        assert_eq!(neighbors.len(), 3);
        for (n, cost) in neighbors {
            assert_eq!(graph.edge_between(east, n).unwrap().cost, cost);
        }
    }

    #[test]
    fn find_nearest_node_uses_xz_distance() {
        let (_, graph) = build(&hub_world());
        let near_east = graph
            .find_nearest_node(Vec3::new(12.0, 50.0, 0.0))
            .unwrap();
        assert_eq!(graph.node(near_east).disk, DiskId(1));
        assert!(NavGraph::default().find_nearest_node(Vec3::ZERO).is_none());
    }

    #[test]
    fn tiny_disk_rim_radius_clamps_to_center() {
        let config = GameConfig::default();
        let registry = DiskRegistry::new(
            &[DiskSpec::new(0.0, 0.0, 0.5), DiskSpec::new(1.0, 0.0, 0.5)],
            &config,
        )
        .unwrap();
        let disk = registry.disk(DiskId(0));
        assert_eq!(rim_radius(disk, config.rim_offset), 0.0);
        let p = tangent_point(disk, registry.disk(DiskId(1)), config.rim_offset);
        assert_eq!(p, disk.position);
    }
}
