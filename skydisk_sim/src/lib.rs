// skydisk_sim — disk-world navigation and wandering rings.
//
// The world is a set of circular platforms ("disks") scattered on a plane.
// Where two disks touch, a nav node is placed on each rim facing the other;
// the nodes are linked across the gap and around each rim into a weighted
// graph. Rings wander the world by repeatedly picking a random node and
// following a route found by a bidirectional best-first search.
//
// Module overview:
// - `sim.rs`:         Top-level SimState, fixed-tick loop, save/load.
// - `ring.rs`:        Ring agents: replanning and waypoint following.
// - `nav.rs`:         Navigation graph structures + construction from disks.
// - `pathfinding.rs`: Bidirectional search, `Route`, Dijkstra reference.
// - `disk.rs`:        DiskRegistry: validated, classified disks.
// - `disk_type.rs`:   DiskType + per-type data (ring speed factor).
// - `world_file.rs`:  "DISK version 1" text format reader/writer.
// - `config.rs`:      GameConfig — all tunable parameters.
// - `event.rs`:       SimEvents emitted by `step()`.
// - `error.rs`:       WorldError for load-time failures.
// - `types.rs`:       Vec3 and the compact ID handles.
// - `prng`:           Re-exported from `skydisk_prng` — xoshiro256++ PRNG.
//
// The library logs through the `log` facade and never installs a logger.
//
// **Critical constraint: determinism.** The simulation is a pure function
// of seed, disks and config. All randomness comes from the seeded
// `GameRng`; hash maps are used for membership only and never iterated.

pub mod config;
pub mod disk;
pub mod disk_type;
pub mod error;
pub mod event;
pub mod nav;
pub mod pathfinding;
pub use skydisk_prng as prng;
pub mod ring;
pub mod sim;
pub mod types;
pub mod world_file;
