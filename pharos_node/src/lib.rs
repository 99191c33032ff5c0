// pharos_node/src/lib.rs

// The thin adapter layer around `pharos_core`: wire payload types, the
// translation into core inputs, and the single-worker dispatch loop.
pub mod adapter;
pub mod messages;
pub mod worker;
