// Rings: the agents that wander the disk world.
//
// A ring stands on a nav node, picks a random target node, asks the
// pathfinder for a route, and slides from waypoint to waypoint along it.
// When the route runs out it picks another target. Rings never stop
// wandering while the graph has nodes.
//
// Each tick (`Ring::update`):
// 1. If the ring stands on its waypoint, that waypoint becomes its current
//    node and the next waypoint is popped from the route. An empty route
//    triggers a replan: a new target drawn uniformly from all graph nodes,
//    a fresh route from the current node, the leading (current) node
//    dropped, and the first remaining node taken as the waypoint.
// 2. The ring moves straight toward the waypoint in XZ at
//    `ring_base_speed * speed factor of the closest disk`, landing exactly
//    on the waypoint instead of overshooting it. Spin grows with distance.
//
// An `Exhausted` search yields the route `[target]`, so the ring heads
// straight for an unreachable target across the gap.
//
// See also: `pathfinding.rs` for `find_route`, `sim.rs` which owns rings
// and drives them in ID order, `disk.rs` for the speed-factor lookup.
//
// **Critical constraint: determinism.** The only randomness is the target
// draw from the sim's `GameRng`, one draw per replan.

use crate::config::GameConfig;
use crate::disk::DiskRegistry;
use crate::event::SimEventKind;
use crate::nav::NavGraph;
use crate::pathfinding::{self, Route, SearchSnapshot};
use crate::types::{NavNodeId, RingId, Vec3};
use log::trace;
use serde::{Deserialize, Serialize};
use skydisk_prng::GameRng;

/// Read-only world context a ring needs for one update.
#[derive(Clone, Copy)]
pub struct RingWorld<'a> {
    pub graph: &'a NavGraph,
    pub registry: &'a DiskRegistry,
    pub config: &'a GameConfig,
}

/// A wandering ring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub id: RingId,
    pub position: Vec3,
    /// Cosmetic rotation in degrees, in [0, 360).
    pub spin: f32,
    /// The node the ring last stood on.
    pub current_node: NavNodeId,
    /// The node the ring is moving toward.
    pub waypoint: NavNodeId,
    /// Final node of the current route.
    pub target: NavNodeId,
    /// Waypoints after `waypoint`, front first.
    pub route: Route,
    /// Frontiers of the last search, kept only by the debug ring.
    pub snapshot: Option<SearchSnapshot>,
}

impl Ring {
    /// A ring standing on `node` with nowhere to go yet. Its first update
    /// picks a target.
    pub fn new(id: RingId, node: NavNodeId, graph: &NavGraph, spin: f32) -> Self {
        Self {
            id,
            position: graph.node(node).position,
            spin,
            current_node: node,
            waypoint: node,
            target: node,
            route: Route::new(),
            snapshot: None,
        }
    }

    /// Whether the ring stands on its waypoint.
    pub fn at_waypoint(&self, graph: &NavGraph) -> bool {
        self.position.same_xz(graph.node(self.waypoint).position)
    }

    /// Advance one tick. Emitted events are appended to `events`.
    pub fn update(
        &mut self,
        world: RingWorld<'_>,
        rng: &mut GameRng,
        record_snapshot: bool,
        events: &mut Vec<SimEventKind>,
    ) {
        if self.at_waypoint(world.graph) {
            self.current_node = self.waypoint;
            match self.route.pop_front() {
                Some(next) => self.waypoint = next,
                None => self.replan(world.graph, rng, record_snapshot, events),
            }
        }
        self.advance(world, events);
    }

    /// Pick a fresh target and route to it from the current node.
    fn replan(
        &mut self,
        graph: &NavGraph,
        rng: &mut GameRng,
        record_snapshot: bool,
        events: &mut Vec<SimEventKind>,
    ) {
        let Some(target) = rng.choose(graph.nodes()).map(|n| n.id) else {
            return;
        };

        let result = if record_snapshot {
            pathfinding::find_route_with_snapshot(graph, self.current_node, target)
        } else {
            pathfinding::find_route(graph, self.current_node, target)
        };
        trace!(
            "{} routes {} -> {}: {:?}, {} nodes, {} expansions",
            self.id,
            self.current_node,
            target,
            result.outcome,
            result.route.len(),
            result.expansions
        );
        events.push(SimEventKind::RouteComputed {
            ring_id: self.id,
            target,
            outcome: result.outcome,
            waypoints: result.route.len(),
        });

        self.target = target;
        self.route = result.route;
        self.snapshot = result.snapshot;
        if self.route.front() == Some(self.current_node) {
            self.route.pop_front();
        }
        self.waypoint = self.route.pop_front().unwrap_or(self.current_node);
    }

    /// Slide toward the waypoint.
    fn advance(&mut self, world: RingWorld<'_>, events: &mut Vec<SimEventKind>) {
        let goal = world.graph.node(self.waypoint).position;
        let remaining = self.position.distance_xz(goal);
        if remaining == 0.0 {
            return;
        }

        let speed_factor = world
            .registry
            .closest_disk(self.position)
            .map_or(1.0, |d| d.speed_factor);
        let reach = world.config.ring_base_speed * speed_factor * world.config.tick_seconds;

        let moved = if reach >= remaining {
            self.position = Vec3::new(goal.x, self.position.y, goal.z);
            events.push(SimEventKind::WaypointReached {
                ring_id: self.id,
                node: self.waypoint,
            });
            remaining
        } else {
            let dir = (goal - self.position).xz() * (1.0 / remaining);
            self.position += dir * reach;
            reach
        };

        self.spin = (self.spin + world.config.ring_spin_rate * moved).rem_euclid(360.0);
    }

    /// Waypoint followed by the rest of the route, for drawing.
    pub fn remaining_route(&self) -> impl Iterator<Item = NavNodeId> + '_ {
        std::iter::once(self.waypoint).chain(self.route.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::DiskSpec;
    use crate::nav::build_nav_graph;
    use crate::types::DiskId;

    struct Fixture {
        config: GameConfig,
        registry: DiskRegistry,
        graph: NavGraph,
    }

    impl Fixture {
        fn new(specs: &[DiskSpec]) -> Self {
            let config = GameConfig::default();
            let registry = DiskRegistry::new(specs, &config).unwrap();
            let graph = build_nav_graph(&registry, &config);
            Self {
                config,
                registry,
                graph,
            }
        }

        fn world(&self) -> RingWorld<'_> {
            RingWorld {
                graph: &self.graph,
                registry: &self.registry,
                config: &self.config,
            }
        }
    }

    /// Three grey-rock disks in a row, touching.
    fn chain() -> Fixture {
        Fixture::new(&[
            DiskSpec::new(0.0, 0.0, 30.0),
            DiskSpec::new(60.0, 0.0, 30.0),
            DiskSpec::new(120.0, 0.0, 30.0),
        ])
    }

    #[test]
    fn first_update_plans_a_route() {
        let fx = chain();
        let start = fx.graph.rim_nodes(DiskId(0))[0];
        let mut ring = Ring::new(RingId(0), start, &fx.graph, 0.0);
        let mut rng = GameRng::new(7);
        let mut events = Vec::new();

        ring.update(fx.world(), &mut rng, false, &mut events);

        assert!(matches!(
            events[0],
            SimEventKind::RouteComputed { ring_id: RingId(0), .. }
        ));
        assert_eq!(ring.current_node, start);
        assert!(ring.snapshot.is_none());
        // Every planned node is a real node, and the route never restarts
        // at the node the ring stands on.
        assert!(ring.remaining_route().all(|n| n.index() < fx.graph.node_count()));
        if ring.target != start {
            assert_ne!(ring.waypoint, start);
        }
    }

    #[test]
    fn movement_is_scaled_by_speed_and_clamped() {
        let fx = chain();
        let rim = fx.graph.rim_nodes(DiskId(1));
        let (from, to) = (rim[0], rim[1]);
        let mut ring = Ring::new(RingId(0), from, &fx.graph, 0.0);
        ring.waypoint = to;
        ring.target = to;

        let mut events = Vec::new();
        let before = ring.position;
        ring.advance(fx.world(), &mut events);
        let step = before.distance_xz(ring.position);
        // Grey rock: 2.5 m/s * 1.0 / 60.
        assert!((step - 2.5 / 60.0).abs() < 1e-5);
        assert!(events.is_empty());
        assert!((ring.spin - 75.0 * step).abs() < 1e-3);

        // Place the ring just short of the waypoint: it lands exactly.
        let goal = fx.graph.node(to).position;
        ring.position = Vec3::new(goal.x - 0.01, 0.0, goal.z);
        ring.advance(fx.world(), &mut events);
        assert!(ring.at_waypoint(&fx.graph));
        assert_eq!(
            events,
            vec![SimEventKind::WaypointReached {
                ring_id: RingId(0),
                node: to
            }]
        );
    }

    #[test]
    fn slow_disk_slows_the_ring() {
        // Icy pair: speed factor 0.25.
        let fx = Fixture::new(&[DiskSpec::new(0.0, 0.0, 15.0), DiskSpec::new(30.0, 0.0, 15.0)]);
        let node = fx.graph.rim_nodes(DiskId(0))[0];
        let other = fx.graph.rim_nodes(DiskId(1))[0];
        let mut ring = Ring::new(RingId(0), node, &fx.graph, 0.0);
        ring.waypoint = other;
        ring.position = Vec3::on_plane(0.0, 0.0);

        let mut events = Vec::new();
        ring.advance(fx.world(), &mut events);
        let step = ring.position.distance_xz(Vec3::ZERO);
        assert!((step - 2.5 * 0.25 / 60.0).abs() < 1e-5);
    }

    #[test]
    fn reaching_waypoint_pops_next() {
        let fx = chain();
        let rim = fx.graph.rim_nodes(DiskId(1));
        let mut ring = Ring::new(RingId(0), rim[0], &fx.graph, 0.0);
        ring.route = [rim[1]].into_iter().collect();

        let mut rng = GameRng::new(1);
        let mut events = Vec::new();
        ring.update(fx.world(), &mut rng, false, &mut events);

        assert_eq!(ring.current_node, rim[0]);
        assert_eq!(ring.waypoint, rim[1]);
        assert!(ring.route.is_empty());
        // No replan while the route had nodes left.
        assert!(events.is_empty());
    }

    #[test]
    fn unreachable_target_heads_straight_for_it() {
        let fx = Fixture::new(&[
            DiskSpec::new(0.0, 0.0, 10.0),
            DiskSpec::new(20.0, 0.0, 10.0),
            DiskSpec::new(200.0, 0.0, 10.0),
            DiskSpec::new(220.0, 0.0, 10.0),
        ]);
        let home = fx.graph.rim_nodes(DiskId(0))[0];
        let mut ring = Ring::new(RingId(0), home, &fx.graph, 0.0);

        // Draw until a target on the far island comes up.
        let mut rng = GameRng::new(3);
        let mut events = Vec::new();
        for _ in 0..64 {
            ring.current_node = home;
            ring.route.clear();
            events.clear();
            ring.replan(&fx.graph, &mut rng, false, &mut events);
            if fx.graph.node(ring.target).disk.index() >= 2 {
                break;
            }
        }
        assert!(fx.graph.node(ring.target).disk.index() >= 2);
        assert!(matches!(
            events[0],
            SimEventKind::RouteComputed {
                outcome: pathfinding::SearchOutcome::Exhausted,
                waypoints: 1,
                ..
            }
        ));
        assert_eq!(ring.waypoint, ring.target);
        assert!(ring.route.is_empty());
    }

    #[test]
    fn debug_ring_keeps_snapshot() {
        let fx = chain();
        let start = fx.graph.rim_nodes(DiskId(0))[0];
        let mut ring = Ring::new(RingId(0), start, &fx.graph, 0.0);
        let mut rng = GameRng::new(11);
        let mut events = Vec::new();
        ring.update(fx.world(), &mut rng, true, &mut events);
        let snap = ring.snapshot.as_ref().unwrap();
        assert!(!snap.closed[0].is_empty());
        assert!(!snap.closed[1].is_empty());
    }

    #[test]
    fn ring_without_nodes_stays_put() {
        let fx = Fixture::new(&[DiskSpec::new(0.0, 0.0, 10.0), DiskSpec::new(20.0, 0.0, 10.0)]);
        let start = fx.graph.rim_nodes(DiskId(0))[0];
        let mut ring = Ring::new(RingId(0), start, &fx.graph, 0.0);
        let empty = NavGraph::default();
        let mut rng = GameRng::new(5);
        let mut events = Vec::new();
        ring.replan(&empty, &mut rng, false, &mut events);
        assert!(events.is_empty());
        assert_eq!(ring.waypoint, start);
    }

    #[test]
    fn ring_keeps_wandering() {
        let fx = chain();
        let start = fx.graph.rim_nodes(DiskId(0))[0];
        let mut ring = Ring::new(RingId(0), start, &fx.graph, 0.0);
        let mut rng = GameRng::new(99);
        let mut events = Vec::new();
        // Five simulated minutes.
        for _ in 0..18_000 {
            ring.update(fx.world(), &mut rng, false, &mut events);
        }
        let routes = events
            .iter()
            .filter(|e| matches!(e, SimEventKind::RouteComputed { .. }))
            .count();
        let arrivals = events
            .iter()
            .filter(|e| matches!(e, SimEventKind::WaypointReached { .. }))
            .count();
        assert!(routes >= 2, "only {routes} routes planned");
        assert!(arrivals > 0);
        assert!(ring.spin >= 0.0 && ring.spin < 360.0);
    }
}
