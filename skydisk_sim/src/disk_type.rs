// Disk types — data-driven terrain behavior.
//
// Every disk falls into one of five terrain types, chosen from its radius
// (small disks are bare red rock, the largest are grey rock). Behavioral
// differences between types are expressed as data in `DiskTypeData`, keyed
// by `DiskType` in the game config, so the nav builder and ring movement
// read a speed factor from a table instead of branching per type.
//
// See also: `config.rs` where the type table and radius thresholds live,
// `disk.rs` for the registry that classifies disks, `nav.rs` where the
// inverse speed factor weights bridge edges.

use serde::{Deserialize, Serialize};

/// Terrain type of a disk, ordered from smallest to largest radius band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiskType {
    RedRock,
    Leafy,
    Icy,
    Sandy,
    GreyRock,
}

impl DiskType {
    pub const ALL: [DiskType; 5] = [
        DiskType::RedRock,
        DiskType::Leafy,
        DiskType::Icy,
        DiskType::Sandy,
        DiskType::GreyRock,
    ];

    /// Classify a disk by radius. `thresholds[i]` is the exclusive upper
    /// radius bound of `ALL[i]`; anything at or above the last bound is
    /// `GreyRock`.
    pub fn from_radius(radius: f32, thresholds: &[f32; 4]) -> Self {
        thresholds
            .iter()
            .position(|&bound| radius < bound)
            .map_or(DiskType::GreyRock, |i| Self::ALL[i])
    }
}

/// Per-type behavioral parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiskTypeData {
    /// Multiplier on ring movement speed while on a disk of this type.
    /// Must be positive; bridge costs divide by it.
    pub ring_speed_factor: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANDS: [f32; 4] = [8.0, 12.0, 20.0, 30.0];

    #[test]
    fn radius_bands() {
        assert_eq!(DiskType::from_radius(6.0, &BANDS), DiskType::RedRock);
        assert_eq!(DiskType::from_radius(8.0, &BANDS), DiskType::Leafy);
        assert_eq!(DiskType::from_radius(11.9, &BANDS), DiskType::Leafy);
        assert_eq!(DiskType::from_radius(15.0, &BANDS), DiskType::Icy);
        assert_eq!(DiskType::from_radius(29.0, &BANDS), DiskType::Sandy);
        assert_eq!(DiskType::from_radius(30.0, &BANDS), DiskType::GreyRock);
        assert_eq!(DiskType::from_radius(50.0, &BANDS), DiskType::GreyRock);
    }

    #[test]
    fn disk_type_is_a_json_map_key() {
        let mut table = std::collections::BTreeMap::new();
        table.insert(DiskType::Icy, DiskTypeData { ring_speed_factor: 0.25 });
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"Icy":{"ring_speed_factor":0.25}}"#);
    }
}
