// Disk registry — the world's traversable terrain.
//
// A `DiskRegistry` is the ordered list of circular platforms that make up
// the world. Each disk has a center on the XZ plane, a radius, a terrain
// type classified from that radius, and the resolved ring speed factor for
// that type. The registry validates everything at construction, so the nav
// builder and ring movement can assume positive radii and positive speed
// factors.
//
// Registry order is significant: `DiskId`s are indices into it, the nav
// builder scans pairs in this order, and the sim spawns rings in this
// order.
//
// See also: `world_file.rs` for loading a registry from the text format,
// `disk_type.rs` for the type table, `nav.rs` which builds the graph from
// the registry.

use crate::config::GameConfig;
use crate::disk_type::DiskType;
use crate::error::WorldError;
use crate::types::{DiskId, Vec3};
use serde::{Deserialize, Serialize};

/// Raw disk input before validation: where it is and how big.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub position: Vec3,
    pub radius: f32,
}

impl DiskSpec {
    pub fn new(x: f32, z: f32, radius: f32) -> Self {
        Self {
            position: Vec3::on_plane(x, z),
            radius,
        }
    }
}

/// A validated disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub id: DiskId,
    pub position: Vec3,
    pub radius: f32,
    pub disk_type: DiskType,
    /// Ring speed multiplier for this disk's type.
    pub speed_factor: f32,
}

impl Disk {
    /// Whether two disks touch or overlap, allowing `slack` meters of gap.
    pub fn is_adjacent(&self, other: &Disk, slack: f32) -> bool {
        self.position.distance(other.position) < self.radius + other.radius + slack
    }

    /// Horizontal distance from `position` to this disk's edge. Negative
    /// when inside the disk.
    pub fn distance_to_edge_xz(&self, position: Vec3) -> f32 {
        position.distance_xz(self.position) - self.radius
    }
}

/// Ordered, validated collection of disks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskRegistry {
    disks: Vec<Disk>,
    /// Distance from the origin to the outside of the outermost disk.
    world_radius: f32,
}

impl DiskRegistry {
    /// Validate and classify `specs`. The world radius is derived from the
    /// outermost disk edge.
    pub fn new(specs: &[DiskSpec], config: &GameConfig) -> Result<Self, WorldError> {
        let disks = classify(specs, config)?;
        let world_radius = disks
            .iter()
            .map(|d| d.position.distance_xz(Vec3::ZERO) + d.radius)
            .fold(0.0_f32, f32::max);
        Ok(Self {
            disks,
            world_radius,
        })
    }

    /// Like `new`, but with an explicit world radius (as stored in world
    /// files).
    pub fn with_world_radius(
        specs: &[DiskSpec],
        world_radius: f32,
        config: &GameConfig,
    ) -> Result<Self, WorldError> {
        if !world_radius.is_finite() || world_radius <= 0.0 {
            return Err(WorldError::NonPositiveWorldRadius(world_radius));
        }
        let disks = classify(specs, config)?;
        Ok(Self {
            disks,
            world_radius,
        })
    }

    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    pub fn disk(&self, id: DiskId) -> &Disk {
        &self.disks[id.index()]
    }

    pub fn disk_count(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }

    pub fn world_radius(&self) -> f32 {
        self.world_radius
    }

    pub fn speed_factor(&self, id: DiskId) -> f32 {
        self.disk(id).speed_factor
    }

    /// The disk whose edge is horizontally closest to `position` (the disk
    /// containing it, if any). Earlier disks win ties. `None` only for an
    /// empty registry.
    pub fn closest_disk(&self, position: Vec3) -> Option<&Disk> {
        let mut best: Option<(&Disk, f32)> = None;
        for disk in &self.disks {
            let d = disk.distance_to_edge_xz(position);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((disk, d));
            }
        }
        best.map(|(disk, _)| disk)
    }
}

fn classify(specs: &[DiskSpec], config: &GameConfig) -> Result<Vec<Disk>, WorldError> {
    for disk_type in DiskType::ALL {
        match config.speed_factor(disk_type) {
            None => return Err(WorldError::MissingDiskType(disk_type)),
            Some(factor) if !factor.is_finite() || factor <= 0.0 => {
                return Err(WorldError::InvalidSpeedFactor { disk_type, factor });
            }
            Some(_) => {}
        }
    }

    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            if !spec.position.is_finite() || !spec.radius.is_finite() {
                return Err(WorldError::NonFiniteDisk { index });
            }
            if spec.radius <= 0.0 {
                return Err(WorldError::NonPositiveRadius {
                    index,
                    radius: spec.radius,
                });
            }
            let disk_type = DiskType::from_radius(spec.radius, &config.disk_type_thresholds);
            let speed_factor = config
                .speed_factor(disk_type)
                .ok_or(WorldError::MissingDiskType(disk_type))?;
            Ok(Disk {
                id: DiskId(index as u32),
                position: spec.position,
                radius: spec.radius,
                disk_type,
                speed_factor,
            })
        })
        .collect()
}
