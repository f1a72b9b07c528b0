//! `arena_client`
//!
//! Client-side systems:
//! - Connection management (reliable + unreliable channels)
//! - World context: entity table, template table, player binding
//! - Per-frame snapshot reconciliation and death-fade lifecycle
//! - Scene composition against the rendering abstraction
//! - Input capture and command generation

pub mod client;
pub mod input;
pub mod reconcile;
pub mod scene;
pub mod world;

pub use client::GameClient;
