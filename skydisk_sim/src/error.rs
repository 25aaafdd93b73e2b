// Load-time errors.
//
// Malformed world input is the only fatal condition in the simulation: a
// disk with a non-positive radius, a config missing a disk type, or a world
// file that does not parse. These are rejected before any graph is built.
// Everything after load (unreachable targets, dead-end nodes) is an
// ordinary result state, not an error.

use crate::disk_type::DiskType;
use thiserror::Error;

/// Errors raised while loading or validating a disk world.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("disk {index} has non-positive radius {radius}")]
    NonPositiveRadius { index: usize, radius: f32 },
    #[error("disk {index} has a non-finite position or radius")]
    NonFiniteDisk { index: usize },
    #[error("config has no entry for disk type {0:?}")]
    MissingDiskType(DiskType),
    #[error("disk type {disk_type:?} has non-positive speed factor {factor}")]
    InvalidSpeedFactor { disk_type: DiskType, factor: f32 },
    #[error("invalid first line {0:?}, expected \"DISK version 1\"")]
    InvalidHeader(String),
    #[error("non-positive world radius {0}")]
    NonPositiveWorldRadius(f32),
    #[error("negative disk count {0}")]
    NegativeDiskCount(i64),
    #[error("expected {expected} disks but the file ends after {found}")]
    NotEnoughDisks { expected: usize, found: usize },
    #[error("could not parse {what} from {token:?}")]
    InvalidNumber { what: &'static str, token: String },
    #[error("could not read world file: {0}")]
    Io(#[from] std::io::Error),
}
