// Data-driven game configuration.
//
// All tunable simulation parameters live in `GameConfig`, loaded from JSON
// at startup and never mutated afterwards. The defaults reproduce the
// classic disk world: 60 ticks per second, a 0.1 m adjacency slack, rims
// inset 0.7 m (one ring radius) from the disk edge, rings sliding at
// 2.5 m/s on rock and slower on leaves, sand and ice.
//
// Per-disk-type data (ring speed factor) lives in `DiskTypeData` entries
// keyed by `DiskType` in the `disk_types` map — see `disk_type.rs`.
//
// See also: `sim.rs` which owns the `GameConfig` as part of `SimState`,
// `nav.rs` which reads `adjacency_slack` and `rim_offset`, `ring.rs` which
// reads the movement parameters.
//
// **Critical constraint: determinism.** Config values feed directly into
// edge costs and ring motion. Two sims agree only if their configs agree.

use crate::disk_type::{DiskType, DiskTypeData};
use crate::types::RingId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Length of one simulation tick in seconds.
    pub tick_seconds: f32,

    /// Two disks are adjacent when their center distance is below the sum
    /// of their radii plus this margin.
    pub adjacency_slack: f32,

    /// How far inside the disk edge rim nodes sit. Also shrinks the radius
    /// used for rim arc lengths.
    pub rim_offset: f32,

    /// Exclusive upper radius bounds for `RedRock`, `Leafy`, `Icy` and
    /// `Sandy`. Larger disks are `GreyRock`.
    pub disk_type_thresholds: [f32; 4],

    /// Per-type behavioral data. Every `DiskType` must have an entry.
    pub disk_types: BTreeMap<DiskType, DiskTypeData>,

    /// Ring speed in meters per second on a speed factor of 1.0.
    pub ring_base_speed: f32,

    /// Cosmetic ring spin in degrees per meter travelled.
    pub ring_spin_rate: f32,

    /// Ring whose search frontiers are recorded for debug drawing.
    #[serde(default)]
    pub debug_ring: Option<RingId>,
}

impl GameConfig {
    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Speed factor for a disk type, or `None` if the table lacks it.
    pub fn speed_factor(&self, disk_type: DiskType) -> Option<f32> {
        self.disk_types.get(&disk_type).map(|d| d.ring_speed_factor)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let factors = [
            (DiskType::RedRock, 1.0),
            (DiskType::Leafy, 0.5),
            (DiskType::Icy, 0.25),
            (DiskType::Sandy, 0.75),
            (DiskType::GreyRock, 1.0),
        ];
        let disk_types = factors
            .into_iter()
            .map(|(t, f)| (t, DiskTypeData { ring_speed_factor: f }))
            .collect();

        Self {
            tick_seconds: 1.0 / 60.0,
            adjacency_slack: 0.1,
            rim_offset: 0.7,
            disk_type_thresholds: [8.0, 12.0, 20.0, 30.0],
            disk_types,
            ring_base_speed: 2.5,
            ring_spin_rate: 75.0,
            debug_ring: Some(RingId(0)),
        }
    }
}
