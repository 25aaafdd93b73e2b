// Simulation events emitted as output.
//
// The sim reports what happened during a `step()` as a list of `SimEvent`s
// for a UI or log to consume: a ring appeared, a ring picked a new target
// and planned a route to it, a ring reached one of its waypoints. Events
// are output only; nothing in the sim reads them back.
//
// See also: `sim.rs` which collects these per step, `ring.rs` which
// produces the route and waypoint events.
//
// **Critical constraint: determinism.** Events are emitted in tick order
// and, within a tick, in ring-ID order.

use crate::pathfinding::SearchOutcome;
use crate::types::{DiskId, NavNodeId, RingId};
use serde::{Deserialize, Serialize};

/// An event emitted by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// A ring was placed on a rim node of `disk`.
    RingSpawned {
        ring_id: RingId,
        disk: DiskId,
        node: NavNodeId,
    },
    /// A ring picked `target` and searched for a route to it. `waypoints`
    /// is the route length including the node the ring stands on.
    RouteComputed {
        ring_id: RingId,
        target: NavNodeId,
        outcome: SearchOutcome,
        waypoints: usize,
    },
    /// A ring arrived on a waypoint.
    WaypointReached { ring_id: RingId, node: NavNodeId },
}
