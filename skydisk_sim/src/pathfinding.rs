// Bidirectional best-first search over the navigation graph.
//
// A `BidirectionalSearch` grows two frontiers at once: `Side::Forward`
// from the source node and `Side::Backward` from the target node. Each
// frontier keeps an open list (discovered, not yet expanded) ordered by
// `f = g + h` and a closed list (expanded) in expansion order. Each step
// expands the best open node of whichever side currently has the cheaper
// head. The search ends `Merged` as soon as some node is closed on both
// sides, or `Exhausted` when both open lists run dry.
//
// The heuristic `h` is the XZ distance from the node being expanded to the
// overall target position, shared by every neighbor of that node and used
// by both sides. It is not admissible for the backward side, so routes are
// good but not guaranteed shortest. `shortest_path_costs` is a plain
// Dijkstra kept alongside for measuring route quality.
//
// Routes are rebuilt from parent links: every closed entry remembers the
// node it was discovered from, so the route is the forward chain from the
// source to the meeting node followed by the backward chain from there to
// the target. Consecutive route nodes are always graph neighbors.
//
// See also: `nav.rs` for the graph, `ring.rs` which requests a route each
// time a ring reaches its target.
//
// **Critical constraint: determinism.** Open lists are sorted by `f`, then
// node x-coordinate, then node ID, all with `total_cmp`. The x tie-break is
// arbitrary (it depends on the world's axes) but stable. The hash map only
// answers membership questions and is never iterated.

use crate::nav::NavGraph;
use crate::types::{NavNodeId, Vec3};
use log::{debug, trace};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Ordered node IDs from source to target, consumed from the front as each
/// waypoint is reached.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    nodes: VecDeque<NavNodeId>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop_front(&mut self) -> Option<NavNodeId> {
        self.nodes.pop_front()
    }

    pub fn front(&self) -> Option<NavNodeId> {
        self.nodes.front().copied()
    }

    pub fn back(&self) -> Option<NavNodeId> {
        self.nodes.back().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = NavNodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<NavNodeId> {
        self.nodes.iter().copied().collect()
    }

    /// Sum of edge costs along the route, or `None` if two consecutive
    /// nodes are not linked.
    pub fn total_cost(&self, graph: &NavGraph) -> Option<f32> {
        let mut total = 0.0;
        for (a, b) in self.nodes.iter().zip(self.nodes.iter().skip(1)) {
            total += graph.edge_between(*a, *b)?.cost;
        }
        Some(total)
    }
}

impl FromIterator<NavNodeId> for Route {
    fn from_iter<I: IntoIterator<Item = NavNodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Search types
// ---------------------------------------------------------------------------

/// Which end of the search a frontier grows from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Grows from the source node.
    Forward,
    /// Grows from the target node.
    Backward,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Forward, Side::Backward];

    fn index(self) -> usize {
        match self {
            Side::Forward => 0,
            Side::Backward => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    /// Frontiers seeded, nothing expanded yet.
    Idle,
    Searching,
    /// Some node is closed on both sides; a route exists.
    Merged,
    /// Both open lists emptied without meeting.
    Exhausted,
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchState::Merged | SearchState::Exhausted)
    }
}

/// How a finished search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutcome {
    Merged,
    Exhausted,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    node: NavNodeId,
    g: f32,
    f: f32,
    parent: Option<NavNodeId>,
}

#[derive(Clone, Copy, Debug)]
struct ClosedEntry {
    node: NavNodeId,
    parent: Option<NavNodeId>,
}

/// One side of the search.
#[derive(Clone, Debug)]
struct Frontier {
    open: Vec<OpenEntry>,
    closed: Vec<ClosedEntry>,
    /// node -> index into `closed`.
    closed_index: FxHashMap<NavNodeId, usize>,
}

impl Frontier {
    /// Seed with `origin` in both lists.
    fn seeded(origin: NavNodeId, h: f32) -> Self {
        let mut closed_index = FxHashMap::default();
        closed_index.insert(origin, 0);
        Self {
            open: vec![OpenEntry {
                node: origin,
                g: 0.0,
                f: h,
                parent: None,
            }],
            closed: vec![ClosedEntry {
                node: origin,
                parent: None,
            }],
            closed_index,
        }
    }

    fn is_closed(&self, node: NavNodeId) -> bool {
        self.closed_index.contains_key(&node)
    }

    fn close(&mut self, node: NavNodeId, parent: Option<NavNodeId>) {
        if self.is_closed(node) {
            return;
        }
        self.closed_index.insert(node, self.closed.len());
        self.closed.push(ClosedEntry { node, parent });
    }

    fn sort_open(&mut self, graph: &NavGraph) {
        self.open.sort_by(|a, b| {
            a.f.total_cmp(&b.f)
                .then_with(|| {
                    let ax = graph.node(a.node).position.x;
                    let bx = graph.node(b.node).position.x;
                    ax.total_cmp(&bx)
                })
                .then_with(|| a.node.cmp(&b.node))
        });
    }

    /// Record a tentative path to `node`, keeping the cheaper of the stored
    /// and new `g`.
    fn offer(&mut self, node: NavNodeId, g: f32, f: f32, parent: NavNodeId) {
        match self.open.iter_mut().find(|e| e.node == node) {
            Some(entry) => {
                if entry.g > g {
                    entry.g = g;
                    entry.f = f;
                    entry.parent = Some(parent);
                }
            }
            None => self.open.push(OpenEntry {
                node,
                g,
                f,
                parent: Some(parent),
            }),
        }
    }

    /// Walk parent links from `node` back to this side's origin, starting
    /// with `node` itself.
    fn chain_from(&self, node: NavNodeId) -> Vec<NavNodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(&idx) = self.closed_index.get(&current) {
            match self.closed[idx].parent {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        chain
    }
}

/// Read-only view of both frontiers, for debug drawing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSnapshot {
    /// Open-list node IDs per side, in current list order.
    pub open: [Vec<NavNodeId>; 2],
    /// Closed-list node IDs per side, in expansion order.
    pub closed: [Vec<NavNodeId>; 2],
    pub meeting: Option<NavNodeId>,
}

impl SearchSnapshot {
    pub fn open(&self, side: Side) -> &[NavNodeId] {
        &self.open[side.index()]
    }

    pub fn closed(&self, side: Side) -> &[NavNodeId] {
        &self.closed[side.index()]
    }
}

/// A finished search.
#[derive(Clone, Debug)]
pub struct RouteResult {
    /// Source to target on `Merged`; just `[target]` on `Exhausted`.
    pub route: Route,
    pub outcome: SearchOutcome,
    /// Number of nodes popped from either open list.
    pub expansions: usize,
    /// Frontier contents at termination, when requested.
    pub snapshot: Option<SearchSnapshot>,
}

// ---------------------------------------------------------------------------
// BidirectionalSearch
// ---------------------------------------------------------------------------

/// An in-progress route search. Borrows the graph for its lifetime.
pub struct BidirectionalSearch<'g> {
    graph: &'g NavGraph,
    source: NavNodeId,
    target: NavNodeId,
    target_pos: Vec3,
    frontiers: [Frontier; 2],
    state: SearchState,
    meeting: Option<NavNodeId>,
    expansions: usize,
}

impl<'g> BidirectionalSearch<'g> {
    /// Seed a search from `source` to `target`. An endpoint that is not a
    /// node of `graph` leaves nothing to expand, so the search exhausts on
    /// its first step.
    pub fn new(graph: &'g NavGraph, source: NavNodeId, target: NavNodeId) -> Self {
        let in_graph = |n: NavNodeId| n.index() < graph.node_count();
        let valid = in_graph(source) && in_graph(target);

        let target_pos = if valid {
            graph.node(target).position
        } else {
            Vec3::ZERO
        };
        let mut frontiers = [
            Frontier::seeded(source, 0.0),
            Frontier::seeded(target, 0.0),
        ];
        if valid {
            frontiers[0].open[0].f = graph.node(source).position.distance_xz(target_pos);
        } else {
            for frontier in &mut frontiers {
                frontier.open.clear();
            }
        }

        Self {
            graph,
            source,
            target,
            target_pos,
            frontiers,
            state: SearchState::Idle,
            meeting: None,
            expansions: 0,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn source(&self) -> NavNodeId {
        self.source
    }

    pub fn target(&self) -> NavNodeId {
        self.target
    }

    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// The node closed on both sides, once merged.
    pub fn meeting_node(&self) -> Option<NavNodeId> {
        self.meeting
    }

    /// Advance by one expansion (or detect termination). Returns the state
    /// after the step; terminal states are sticky.
    pub fn step(&mut self) -> SearchState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.state = SearchState::Searching;

        for frontier in &mut self.frontiers {
            frontier.sort_open(self.graph);
        }

        if let Some(meeting) = self.find_meeting() {
            self.meeting = Some(meeting);
            self.state = SearchState::Merged;
            debug!(
                "route {} -> {} merged at {} after {} expansions",
                self.source, self.target, meeting, self.expansions
            );
            return self.state;
        }

        let side = match (
            self.frontiers[0].open.first(),
            self.frontiers[1].open.first(),
        ) {
            (None, None) => {
                self.state = SearchState::Exhausted;
                debug!(
                    "route {} -> {} exhausted after {} expansions",
                    self.source, self.target, self.expansions
                );
                return self.state;
            }
            (Some(_), None) => Side::Forward,
            (None, Some(_)) => Side::Backward,
            (Some(f), Some(b)) => {
                if b.f < f.f {
                    Side::Backward
                } else {
                    Side::Forward
                }
            }
        };

        self.expand(side);
        self.state
    }

    /// Step until merged or exhausted, then build the result.
    pub fn run(mut self) -> RouteResult {
        while !self.step().is_terminal() {}
        self.into_result(false)
    }

    /// Like `run`, but also captures the final frontiers.
    pub fn run_with_snapshot(mut self) -> RouteResult {
        while !self.step().is_terminal() {}
        self.into_result(true)
    }

    /// Current frontier contents.
    pub fn snapshot(&self) -> SearchSnapshot {
        let open: [Vec<NavNodeId>; 2] = self
            .frontiers
            .each_ref()
            .map(|f| f.open.iter().map(|e| e.node).collect());
        let closed: [Vec<NavNodeId>; 2] = self
            .frontiers
            .each_ref()
            .map(|f| f.closed.iter().map(|e| e.node).collect());
        SearchSnapshot {
            open,
            closed,
            meeting: self.meeting,
        }
    }

    /// The finished result, or `None` while the search is still running.
    pub fn result(&self, with_snapshot: bool) -> Option<RouteResult> {
        let (route, outcome) = match (self.state, self.meeting) {
            (SearchState::Merged, Some(meeting)) => (self.splice(meeting), SearchOutcome::Merged),
            (SearchState::Exhausted, _) => {
                (Route::from_iter([self.target]), SearchOutcome::Exhausted)
            }
            _ => return None,
        };
        Some(RouteResult {
            route,
            outcome,
            expansions: self.expansions,
            snapshot: with_snapshot.then(|| self.snapshot()),
        })
    }

    fn into_result(self, with_snapshot: bool) -> RouteResult {
        // Only called once terminal, where `result` is always `Some`.
        self.result(with_snapshot).unwrap_or_else(|| RouteResult {
            route: Route::from_iter([self.target]),
            outcome: SearchOutcome::Exhausted,
            expansions: self.expansions,
            snapshot: None,
        })
    }

    /// First forward-closed node that the backward side has also closed.
    fn find_meeting(&self) -> Option<NavNodeId> {
        let [forward, backward] = &self.frontiers;
        forward
            .closed
            .iter()
            .map(|e| e.node)
            .find(|&n| backward.is_closed(n))
    }

    fn expand(&mut self, side: Side) {
        let graph = self.graph;
        let frontier = &mut self.frontiers[side.index()];
        let current = frontier.open.remove(0);
        self.expansions += 1;

        let current_pos = graph.node(current.node).position;
        let h = self.target_pos.distance_xz(current_pos);
        trace!(
            "{side:?} expands {} (g {:.3}, f {:.3})",
            current.node, current.g, current.f
        );

        for (neighbor, cost) in graph.neighbors(current.node) {
            if frontier.is_closed(neighbor) {
                continue;
            }
            let g = current.g + cost;
            frontier.offer(neighbor, g, g + h, current.node);
        }

        frontier.close(current.node, current.parent);
    }

    fn splice(&self, meeting: NavNodeId) -> Route {
        let [forward, backward] = &self.frontiers;
        let mut head = forward.chain_from(meeting);
        head.reverse();
        let tail = backward.chain_from(meeting);
        head.into_iter().chain(tail.into_iter().skip(1)).collect()
    }
}

/// Search from `source` to `target` to completion.
pub fn find_route(graph: &NavGraph, source: NavNodeId, target: NavNodeId) -> RouteResult {
    BidirectionalSearch::new(graph, source, target).run()
}

/// `find_route`, also capturing the final frontiers for debug drawing.
pub fn find_route_with_snapshot(
    graph: &NavGraph,
    source: NavNodeId,
    target: NavNodeId,
) -> RouteResult {
    BidirectionalSearch::new(graph, source, target).run_with_snapshot()
}

// ---------------------------------------------------------------------------
// Reference search
// ---------------------------------------------------------------------------

/// Dijkstra heap entry (min-heap via reversed ordering).
struct CostEntry {
    node: NavNodeId,
    cost: f32,
}

impl PartialEq for CostEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal && self.node == other.node
    }
}

impl Eq for CostEntry {}

impl PartialOrd for CostEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CostEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: smallest cost is "greatest".
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Cheapest cost from `source` to every node; `f32::INFINITY` where
/// unreachable. Empty if `source` is not in the graph.
pub fn shortest_path_costs(graph: &NavGraph, source: NavNodeId) -> Vec<f32> {
    let n = graph.node_count();
    if source.index() >= n {
        return Vec::new();
    }
    let mut best = vec![f32::INFINITY; n];
    let mut done = vec![false; n];
    best[source.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(CostEntry {
        node: source,
        cost: 0.0,
    });

    while let Some(CostEntry { node, cost }) = heap.pop() {
        if done[node.index()] {
            continue;
        }
        done[node.index()] = true;
        for (neighbor, edge_cost) in graph.neighbors(node) {
            let next = cost + edge_cost;
            if next < best[neighbor.index()] {
                best[neighbor.index()] = next;
                heap.push(CostEntry {
                    node: neighbor,
                    cost: next,
                });
            }
        }
    }

    best
}
