//! Scene composition.
//!
//! Turns reconciled frame poses into backend draw calls: arena backdrop,
//! then per entity the guns beneath the body, the body polygon, turrets
//! above it, and the two-layer health bar. Pure presentation; no game state
//! lives here.

use arena_shared::{
    color::{derive_stroke, Color},
    math::Vec2,
    mockup::{Mockup, MockupTable},
    render::RenderBackend,
};

use crate::{
    reconcile::{FramePose, Viewport},
    world::ArenaDims,
};

/// Arena floor color.
pub const BACKDROP: Color = Color::new(0xd9, 0xd9, 0xd9);
/// Fill for guns and turrets.
pub const ATTACHMENT_GRAY: Color = Color::new(0x80, 0x80, 0x80);

/// Draws the arena floor rectangle, camera-shifted so the controlled entity
/// sits at the viewport center.
pub fn draw_arena(
    backend: &mut dyn RenderBackend,
    arena: ArenaDims,
    camera: Vec2,
    viewport: Viewport,
) {
    let center = viewport.center();
    backend.fill_rect(
        center.x - camera.x,
        center.y - camera.y,
        arena.width,
        arena.height,
        BACKDROP,
    );
}

/// Draws one entity from its reconciled pose and template.
pub fn draw_entity(backend: &mut dyn RenderBackend, pose: &FramePose, mockup: &Mockup) {
    // Guns sit below the body.
    for gun in &mockup.guns {
        let mount = gun.mount_direction() + gun.angle + pose.angle;
        let gx = gun.mount_offset() * mount.cos();
        let gy = gun.mount_offset() * mount.sin();

        backend.draw_trapezoid(
            pose.x + gx,
            pose.y + gy,
            f32::from(gun.length) * pose.scale,
            f32::from(gun.width) * pose.scale,
            pose.angle + gun.angle,
            gun.aspect,
            ATTACHMENT_GRAY,
            derive_stroke(ATTACHMENT_GRAY),
        );
    }

    backend.draw_poly(
        pose.x,
        pose.y,
        pose.radius * pose.scale,
        f32::from(mockup.shape),
        pose.angle,
        pose.color,
        derive_stroke(pose.color),
    );

    // Turrets sit above, offset from the body center and sharing its
    // orientation.
    for turret in &mockup.turrets {
        backend.draw_poly(
            pose.x + turret.x,
            pose.y + turret.y,
            f32::from(turret.size) * pose.scale,
            f32::from(turret.shape),
            pose.angle,
            ATTACHMENT_GRAY,
            derive_stroke(ATTACHMENT_GRAY),
        );
    }
}

/// Draws the two-layer health bar beneath an entity.
pub fn draw_health(backend: &mut dyn RenderBackend, pose: &FramePose) {
    backend.draw_bar(
        pose.x - pose.max_health,
        pose.y + pose.radius + 10.0,
        pose.max_health * 2.0 * pose.scale,
        10.0 * pose.scale,
        derive_stroke(pose.color),
    );
    backend.draw_bar(
        pose.x - pose.max_health + 2.0,
        pose.y + pose.radius + 12.0,
        (pose.health * 2.0 - 4.0) * pose.scale,
        6.0 * pose.scale,
        pose.color,
    );
}

/// Composes a full frame: backdrop, then every entity with its health bar.
///
/// Poses referencing a template that has since vanished are skipped; one bad
/// record never blanks the frame.
pub fn draw_frame(
    backend: &mut dyn RenderBackend,
    poses: &[FramePose],
    mockups: &MockupTable,
    arena: ArenaDims,
    camera: Vec2,
    viewport: Viewport,
) {
    backend.begin_frame();
    draw_arena(backend, arena, camera, viewport);
    for pose in poses {
        if let Some(mockup) = mockups.get(pose.mockup) {
            draw_entity(backend, pose, mockup);
            draw_health(backend, pose);
        }
    }
    backend.end_frame();
}
