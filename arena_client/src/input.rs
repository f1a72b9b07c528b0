//! Input handling.
//!
//! In a real client this would integrate with windowing and raw mouse
//! sampling. This scaffold focuses on producing deterministic per-frame
//! `PlayerCommand` messages from a sampled cursor position.

use arena_shared::{
    math::Vec2,
    net::{ClientId, PlayerCommand},
};

use crate::reconcile::Viewport;

/// User input state at a moment in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    /// Cursor position in viewport pixels.
    pub mouse: Vec2,
}

/// Aim target relative to the viewport center, rounded to whole pixels.
pub fn aim_target(input: InputState, viewport: Viewport) -> Vec2 {
    let center = viewport.center();
    Vec2::new(
        (input.mouse.x - center.x).round(),
        (input.mouse.y - center.y).round(),
    )
}

/// Turns sampled input into a `PlayerCommand` for a frame.
pub fn build_command(
    client_id: ClientId,
    frame: u32,
    input: InputState,
    viewport: Viewport,
) -> PlayerCommand {
    PlayerCommand {
        client_id,
        frame,
        target: aim_target(input, viewport),
    }
}
