// Disk world text format.
//
// A world file is a header line followed by whitespace-separated numbers:
//
//     DISK version 1
//     <world radius>
//     <disk count>
//     <x> <z> <radius>     (disk count times)
//
// The header must be the exact first line. After it, line breaks carry no
// meaning. Numbers after the last disk are ignored. Any malformed value is
// a `WorldError`; nothing is clamped or skipped.
//
// See also: `disk.rs` for the registry the parser produces and the
// per-disk validation it applies.

use crate::config::GameConfig;
use crate::disk::{DiskRegistry, DiskSpec};
use crate::error::WorldError;
use log::debug;
use std::path::Path;

/// Required first line of a world file.
pub const WORLD_HEADER: &str = "DISK version 1";

/// Parse a world file's contents into a validated registry.
pub fn parse_world(text: &str, config: &GameConfig) -> Result<DiskRegistry, WorldError> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default().trim_end();
    if header != WORLD_HEADER {
        return Err(WorldError::InvalidHeader(header.to_string()));
    }

    let mut tokens = lines.flat_map(str::split_whitespace);

    let world_radius: f32 = parse_next(&mut tokens, "world radius")?;
    if !world_radius.is_finite() || world_radius <= 0.0 {
        return Err(WorldError::NonPositiveWorldRadius(world_radius));
    }

    let count: i64 = parse_next(&mut tokens, "disk count")?;
    let expected = usize::try_from(count).map_err(|_| WorldError::NegativeDiskCount(count))?;

    let mut specs = Vec::with_capacity(expected.min(4096));
    for found in 0..expected {
        let mut field = |what: &'static str| -> Result<f32, WorldError> {
            match tokens.next() {
                Some(token) => parse_token(token, what),
                None => Err(WorldError::NotEnoughDisks { expected, found }),
            }
        };
        let x = field("disk x")?;
        let z = field("disk z")?;
        let radius = field("disk radius")?;
        specs.push(DiskSpec::new(x, z, radius));
    }

    let registry = DiskRegistry::with_world_radius(&specs, world_radius, config)?;
    debug!(
        "parsed world: radius {}, {} disks",
        registry.world_radius(),
        registry.disk_count()
    );
    Ok(registry)
}

/// Read and parse a world file from disk.
pub fn load_world(path: impl AsRef<Path>, config: &GameConfig) -> Result<DiskRegistry, WorldError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    debug!("loading world from {}", path.display());
    parse_world(&text, config)
}

/// Render a registry in the world file format. `parse_world` reads the
/// output back to an equal registry.
pub fn format_world(registry: &DiskRegistry) -> String {
    let mut out = format!(
        "{WORLD_HEADER}\n{}\n{}\n",
        registry.world_radius(),
        registry.disk_count()
    );
    for disk in registry.disks() {
        out.push_str(&format!(
            "{} {} {}\n",
            disk.position.x, disk.position.z, disk.radius
        ));
    }
    out
}

fn parse_next<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &'static str,
) -> Result<T, WorldError> {
    parse_token(tokens.next().unwrap_or_default(), what)
}

fn parse_token<T: std::str::FromStr>(token: &str, what: &'static str) -> Result<T, WorldError> {
    token.parse().map_err(|_| WorldError::InvalidNumber {
        what,
        token: token.to_string(),
    })
}
