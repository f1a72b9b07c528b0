//! Snapshot reconciliation.
//!
//! The server sends discrete authoritative snapshots; the client renders at
//! its own cadence. Once per frame the reconciler exponentially blends every
//! entity's presentation pose toward its authoritative pose, advances the
//! death fade, and emits the screen-space poses the renderer consumes.
//!
//! Blend factors are applied per tick regardless of elapsed wall-clock time,
//! so perceived smoothing speed follows the frame rate. The game is tuned
//! around that behavior; do not convert to time-scaled easing.

use arena_shared::{
    color::Color,
    math::{lerp, lerp_angle, Vec2},
    mockup::MockupId,
    net::EntityId,
};
use tracing::warn;

use crate::world::{ArenaDims, Lifecycle, World};

/// A dying entity flips to dead once its visual scale decays below this.
pub const DEATH_SCALE_EPSILON: f32 = 0.01;

/// Per-field-category blend factors.
#[derive(Debug, Clone, Copy)]
pub struct BlendFactors {
    pub position: f32,
    pub orientation: f32,
    pub health: f32,
    pub scale: f32,
    pub arena: f32,
}

impl Default for BlendFactors {
    fn default() -> Self {
        Self {
            position: 0.2,
            orientation: 0.4,
            health: 0.2,
            scale: 0.2,
            arena: 0.1,
        }
    }
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn center(self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Final per-entity pose handed to the presentation leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePose {
    pub id: EntityId,
    pub mockup: MockupId,
    /// Screen-space position.
    pub x: f32,
    pub y: f32,
    /// Base radius from the entity's template.
    pub radius: f32,
    pub scale: f32,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: Color,
}

/// Blend step with the cold-start bypass: a presentation field still at the
/// 0.0 sentinel snaps straight to the authoritative value, so freshly created
/// entities never fly in from the origin.
fn follow(current: f32, target: f32, t: f32) -> f32 {
    if current == 0.0 {
        target
    } else {
        lerp(current, target, t)
    }
}

/// The reconciliation engine.
///
/// Stateless across ticks; all long-lived state lives in the [`World`].
#[derive(Debug, Default)]
pub struct Reconciler {
    pub factors: BlendFactors,
}

impl Reconciler {
    pub fn new(factors: BlendFactors) -> Self {
        Self { factors }
    }

    /// Runs one reconciliation pass over the world.
    ///
    /// Mutates presentation fields in place and returns the frame's poses.
    /// Per-entity problems (unknown template) skip that entity for the frame;
    /// nothing here can abort the frame.
    pub fn tick(&self, world: &mut World, viewport: Viewport) -> Vec<FramePose> {
        let f = self.factors;

        world.arena = ArenaDims {
            width: lerp(world.arena.width, world.arena_server.width, f.arena),
            height: lerp(world.arena.height, world.arena_server.height, f.arena),
        };

        // Camera anchor: the controlled entity's presentation pose as of the
        // start of this frame. Unbound player renders world-anchored.
        let center = viewport.center();
        let player_id = world.player;
        let camera = world.player_pos().unwrap_or(Vec2::ZERO);

        let World {
            entities, mockups, ..
        } = world;

        let mut poses = Vec::with_capacity(entities.len());

        for entity in entities.values_mut() {
            if entity.lifecycle == Lifecycle::Dead {
                continue;
            }

            let Some(mockup) = mockups.get(entity.mockup) else {
                warn!(
                    id = entity.id.0,
                    mockup = entity.mockup.0,
                    "Entity references unknown template, skipping"
                );
                continue;
            };

            let pose = &mut entity.pose;
            let server = &entity.server;

            pose.x = follow(pose.x, server.x, f.position);
            pose.y = follow(pose.y, server.y, f.position);
            pose.health = follow(pose.health, server.health, f.health);
            pose.max_health = follow(pose.max_health, server.max_health, f.health);

            let mut scale_target = 1.0;
            if entity.lifecycle == Lifecycle::Dying {
                scale_target = 0.0;
                if pose.scale < DEATH_SCALE_EPSILON {
                    entity.lifecycle = Lifecycle::Dead;
                    continue;
                }
            }

            pose.scale = lerp(pose.scale, scale_target, f.scale);
            pose.angle = lerp_angle(pose.angle, server.angle, f.orientation);

            // Self is pinned to the viewport center; everything else is
            // placed by its world-space delta from the controlled entity.
            let (x, y) = if Some(entity.id) == player_id {
                (center.x, center.y)
            } else {
                (pose.x - camera.x + center.x, pose.y - camera.y + center.y)
            };

            poses.push(FramePose {
                id: entity.id,
                mockup: entity.mockup,
                x,
                y,
                radius: mockup.radius(),
                scale: pose.scale,
                angle: pose.angle,
                health: pose.health,
                max_health: pose.max_health,
                color: entity.color,
            });
        }

        poses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_shared::{
        mockup::{Mockup, MockupId},
        net::{EntityUpdate, Snapshot},
    };

    const VIEWPORT: Viewport = Viewport {
        width: 800.0,
        height: 600.0,
    };

    fn world_with_template() -> World {
        let mut world = World::default();
        let template = Mockup {
            id: MockupId(7),
            size: 20,
            shape: 3,
            guns: Vec::new(),
            turrets: Vec::new(),
        };
        let mut hex = String::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&template.id.0.to_le_bytes());
        bytes.extend_from_slice(&template.size.to_le_bytes());
        bytes.push(template.shape);
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        for b in bytes {
            hex.push_str(&format!("{:02x}", b));
        }
        world.load_mockups(&hex).unwrap();
        world
    }

    fn update(id: i32, x: f32, y: f32, angle: f32) -> EntityUpdate {
        EntityUpdate {
            id: EntityId(id),
            mockup: MockupId(7),
            x,
            y,
            angle,
            health: 80.0,
            max_health: 100.0,
            color: Color::new(0x00, 0xb0, 0xe1),
        }
    }

    fn feed(world: &mut World, entities: Vec<EntityUpdate>) {
        world.apply_snapshot(&Snapshot {
            tick: 0,
            arena_width: 1000.0,
            arena_height: 1000.0,
            entities,
        });
    }

    #[test]
    fn cold_start_snaps_to_authoritative() {
        let mut world = world_with_template();
        feed(&mut world, vec![update(1, 100.0, 50.0, 0.0)]);

        let reconciler = Reconciler::default();
        reconciler.tick(&mut world, VIEWPORT);

        let pose = world.get(EntityId(1)).unwrap().pose;
        assert_eq!(pose.x, 100.0);
        assert_eq!(pose.y, 50.0);
        assert_eq!(pose.angle, 0.0);
        assert_eq!(pose.health, 80.0);
        assert_eq!(pose.max_health, 100.0);
    }

    #[test]
    fn converges_monotonically_and_holds_fixed_point() {
        let mut world = world_with_template();
        feed(&mut world, vec![update(1, 100.0, 0.0, 0.0)]);

        let reconciler = Reconciler::default();
        reconciler.tick(&mut world, VIEWPORT); // snap
        feed(&mut world, vec![update(1, 200.0, 0.0, 0.0)]);

        let mut prev_gap = (200.0 - world.get(EntityId(1)).unwrap().pose.x).abs();
        for _ in 0..20 {
            reconciler.tick(&mut world, VIEWPORT);
            let gap = (200.0 - world.get(EntityId(1)).unwrap().pose.x).abs();
            assert!(gap < prev_gap, "gap {gap} did not shrink from {prev_gap}");
            prev_gap = gap;
        }

        // Converged state is a fixed point.
        let mut settled = world.get(EntityId(1)).unwrap().pose;
        settled.x = 200.0;
        world.entities.get_mut(&EntityId(1)).unwrap().pose = settled;
        reconciler.tick(&mut world, VIEWPORT);
        assert_eq!(world.get(EntityId(1)).unwrap().pose.x, 200.0);
    }

    #[test]
    fn angle_blends_through_the_seam() {
        let mut world = world_with_template();
        feed(&mut world, vec![update(1, 10.0, 10.0, -3.0)]);

        let reconciler = Reconciler::default();
        reconciler.tick(&mut world, VIEWPORT);
        // Presentation angle starts blending from -3.0 toward 3.0.
        world.entities.get_mut(&EntityId(1)).unwrap().pose.angle = -3.0;
        feed(&mut world, vec![update(1, 10.0, 10.0, 3.0)]);

        reconciler.tick(&mut world, VIEWPORT);
        let angle = world.get(EntityId(1)).unwrap().pose.angle;
        // Short way heads negative past -PI, never the 6-radian long way.
        assert!(angle < -3.0);
        assert!((angle - -3.0).abs() < std::f32::consts::PI);
    }

    #[test]
    fn dying_entity_fades_then_dies_in_bounded_ticks() {
        let mut world = world_with_template();
        feed(&mut world, vec![update(1, 10.0, 10.0, 0.0)]);

        let reconciler = Reconciler::default();
        // Let the spawn fade-in settle near full scale.
        for _ in 0..60 {
            reconciler.tick(&mut world, VIEWPORT);
        }
        world.entities.get_mut(&EntityId(1)).unwrap().pose.scale = 1.0;
        world.mark_dying(EntityId(1));

        // 0.8^21 ~= 0.0092 is the first value under epsilon, so the
        // transition fires on tick 22.
        let mut ticks = 0;
        while world.get(EntityId(1)).unwrap().lifecycle != Lifecycle::Dead {
            reconciler.tick(&mut world, VIEWPORT);
            ticks += 1;
            assert!(ticks < 100, "dying entity never died");
        }
        assert_eq!(ticks, 22);

        // Dead entities are inert: no blending, no emitted pose.
        let scale = world.get(EntityId(1)).unwrap().pose.scale;
        let poses = reconciler.tick(&mut world, VIEWPORT);
        assert_eq!(world.get(EntityId(1)).unwrap().pose.scale, scale);
        assert!(poses.iter().all(|p| p.id != EntityId(1)));
    }

    #[test]
    fn self_is_pinned_and_others_are_camera_relative() {
        let mut world = world_with_template();
        feed(
            &mut world,
            vec![update(1, 100.0, 50.0, 0.0), update(2, 160.0, 90.0, 0.0)],
        );
        world.set_player(EntityId(1));

        let reconciler = Reconciler::default();
        reconciler.tick(&mut world, VIEWPORT); // snap both to authoritative
        let poses = reconciler.tick(&mut world, VIEWPORT);

        let me = poses.iter().find(|p| p.id == EntityId(1)).unwrap();
        assert_eq!((me.x, me.y), (400.0, 300.0));

        let other = poses.iter().find(|p| p.id == EntityId(2)).unwrap();
        assert_eq!((other.x, other.y), (400.0 + 60.0, 300.0 + 40.0));
    }

    #[test]
    fn unknown_template_skips_entity_not_frame() {
        let mut world = world_with_template();
        let mut orphan = update(9, 5.0, 5.0, 0.0);
        orphan.mockup = MockupId(999);
        feed(&mut world, vec![update(1, 100.0, 50.0, 0.0), orphan]);

        let poses = Reconciler::default().tick(&mut world, VIEWPORT);
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].id, EntityId(1));
        // The orphan's presentation pose was left untouched.
        assert_eq!(world.get(EntityId(9)).unwrap().pose.x, 0.0);
    }

    #[test]
    fn arena_dims_follow_server() {
        let mut world = world_with_template();
        feed(&mut world, Vec::new());

        let reconciler = Reconciler::default();
        reconciler.tick(&mut world, VIEWPORT);
        let first = world.arena().width;
        assert!(first > 0.0 && first < 1000.0);

        reconciler.tick(&mut world, VIEWPORT);
        assert!(world.arena().width > first);
    }
}
