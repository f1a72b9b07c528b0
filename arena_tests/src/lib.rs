//! Test support for the arena client crates.
//!
//! Provides a scripted snapshot feeder standing in for a real game server,
//! plus fixture builders for mockup streams. No authoritative simulation
//! lives here; sessions replay whatever the test scripts.

pub mod harness;
