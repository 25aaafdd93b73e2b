// Top-level simulation state and tick loop.
//
// `SimState` owns the whole world: the disk registry, the nav graph built
// from it, the rings wandering over it, the PRNG and the config. The sim
// advances in fixed ticks of `config.tick_seconds`; each tick updates every
// ring once, in `RingId` order. There is no command input: rings pick their
// own targets from the PRNG.
//
// Construction builds the nav graph and places one ring on the first rim
// node of every disk that has one (isolated disks get no ring). The
// resulting `RingSpawned` events are held until the first `step()`.
//
// ## Save/load
//
// `SimState` derives `Serialize`/`Deserialize`. The nav graph is
// `#[serde(skip)]` and is rebuilt from the registry and config by
// `rebuild_transient_state()`; `from_json()` does this automatically.
//
// See also: `ring.rs` for per-ring behavior, `nav.rs` for graph
// construction, `event.rs` for the emitted events, `config.rs` for
// `GameConfig`.
//
// **Critical constraint: determinism.** The sim is a pure function of
// `(seed, registry, config, ticks)`. All randomness comes from the one
// `GameRng`; rings live in a `BTreeMap` so update order is fixed.

use crate::config::GameConfig;
use crate::disk::DiskRegistry;
use crate::event::{SimEvent, SimEventKind};
use crate::nav::{self, NavGraph};
use crate::pathfinding::{self, RouteResult};
use crate::ring::{Ring, RingWorld};
use crate::types::{NavNodeId, RingId};
use log::info;
use serde::{Deserialize, Serialize};
use skydisk_prng::GameRng;
use std::collections::BTreeMap;

/// The entire simulated world.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimState {
    /// Ticks completed so far.
    pub tick: u64,

    pub rng: GameRng,

    /// Game configuration (immutable after initialization).
    pub config: GameConfig,

    /// The disks. The nav graph is derived from these.
    pub registry: DiskRegistry,

    /// All rings, keyed by ID. BTreeMap for deterministic iteration.
    pub rings: BTreeMap<RingId, Ring>,

    /// Events produced outside `step()` (spawns), delivered by the next
    /// `step()`.
    #[serde(default)]
    pending_events: Vec<SimEvent>,

    /// Rebuilt from `registry` and `config`, not serialized.
    #[serde(skip)]
    pub nav_graph: NavGraph,
}

/// The result of advancing the simulation.
pub struct StepResult {
    /// Events in the order they happened.
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Create a simulation over `registry` with default config.
    pub fn new(seed: u64, registry: DiskRegistry) -> Self {
        Self::with_config(seed, registry, GameConfig::default())
    }

    /// Create a simulation with an explicit config. `registry` should have
    /// been validated against the same config.
    pub fn with_config(seed: u64, registry: DiskRegistry, config: GameConfig) -> Self {
        let nav_graph = nav::build_nav_graph(&registry, &config);
        let mut state = Self {
            tick: 0,
            rng: GameRng::new(seed),
            config,
            registry,
            rings: BTreeMap::new(),
            pending_events: Vec::new(),
            nav_graph,
        };
        state.spawn_rings();
        info!(
            "sim seeded {seed}: {} disks, {} nav nodes, {} rings",
            state.registry.disk_count(),
            state.nav_graph.node_count(),
            state.rings.len()
        );
        state
    }

    /// One ring per disk with rim nodes, on that disk's first rim node.
    fn spawn_rings(&mut self) {
        for disk in self.registry.disks() {
            let Some(&node) = self.nav_graph.rim_nodes(disk.id).first() else {
                continue;
            };
            let id = RingId(self.rings.len() as u32);
            let spin = self.rng.range_f32(0.0, 360.0);
            self.rings
                .insert(id, Ring::new(id, node, &self.nav_graph, spin));
            self.pending_events.push(SimEvent {
                tick: self.tick,
                kind: SimEventKind::RingSpawned {
                    ring_id: id,
                    disk: disk.id,
                    node,
                },
            });
        }
    }

    /// Advance by `ticks` ticks.
    pub fn step(&mut self, ticks: u64) -> StepResult {
        let mut events = std::mem::take(&mut self.pending_events);
        let mut kinds = Vec::new();

        for _ in 0..ticks {
            self.tick += 1;
            let world = RingWorld {
                graph: &self.nav_graph,
                registry: &self.registry,
                config: &self.config,
            };
            for ring in self.rings.values_mut() {
                let record = self.config.debug_ring == Some(ring.id);
                ring.update(world, &mut self.rng, record, &mut kinds);
            }
            let tick = self.tick;
            events.extend(kinds.drain(..).map(|kind| SimEvent { tick, kind }));
        }

        StepResult { events }
    }

    pub fn ring(&self, id: RingId) -> Option<&Ring> {
        self.rings.get(&id)
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// The ring that records search snapshots, if it exists.
    pub fn debug_ring(&self) -> Option<&Ring> {
        self.config.debug_ring.and_then(|id| self.rings.get(&id))
    }

    /// Search the sim's nav graph, outside any ring.
    pub fn find_route(&self, source: NavNodeId, target: NavNodeId) -> RouteResult {
        pathfinding::find_route(&self.nav_graph, source, target)
    }

    /// Rebuild all transient (`#[serde(skip)]`) fields after
    /// deserialization.
    pub fn rebuild_transient_state(&mut self) {
        self.nav_graph = nav::build_nav_graph(&self.registry, &self.config);
    }

    /// Serialize the simulation state to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a simulation state from JSON and rebuild the nav graph.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: SimState = serde_json::from_str(json)?;
        state.rebuild_transient_state();
        Ok(state)
    }
}
