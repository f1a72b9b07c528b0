//! Client world state.
//!
//! One explicit context object owned by the game loop, replacing any notion
//! of process-wide globals. Access rules are enforced through the method
//! surface:
//! - the mockup decoder writes the template table once, at load time;
//! - the network layer is the sole writer of authoritative fields, lifecycle
//!   triggers, and entity insertion/removal;
//! - the reconciliation engine is the sole writer of presentation fields.

use std::collections::HashMap;

use arena_shared::{
    color::Color,
    math::Vec2,
    mockup::{DecodeError, MockupId, MockupTable},
    net::{EntityId, EntityUpdate, Snapshot},
};
use tracing::debug;

/// Presentation pose: the locally displayed, smoothed state.
///
/// All fields start at the 0.0 sentinel; the first reconciliation tick snaps
/// snapshot-backed fields straight to their authoritative values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub scale: f32,
    pub health: f32,
    pub max_health: f32,
}

/// Authoritative pose: the latest server state, treated as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServerPose {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
}

impl From<&EntityUpdate> for ServerPose {
    fn from(u: &EntityUpdate) -> Self {
        Self {
            x: u.x,
            y: u.y,
            angle: u.angle,
            health: u.health,
            max_health: u.max_health,
        }
    }
}

/// Entity lifecycle. `Dying` drives the fade-out; `Dead` entities are
/// excluded from blending and rendering until the network layer removes or
/// respawns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Alive,
    Dying,
    Dead,
}

/// One live actor in the arena.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub mockup: MockupId,
    pub color: Color,
    pub pose: Pose,
    pub server: ServerPose,
    pub lifecycle: Lifecycle,
}

impl Entity {
    fn from_update(u: &EntityUpdate) -> Self {
        Self {
            id: u.id,
            mockup: u.mockup,
            color: u.color,
            pose: Pose::default(),
            server: ServerPose::from(u),
            lifecycle: Lifecycle::Alive,
        }
    }
}

/// Arena rectangle dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArenaDims {
    pub width: f32,
    pub height: f32,
}

/// The shared world: entity table, template table, player binding, arena
/// dims. Owned by the game loop and passed explicitly to the engine.
#[derive(Debug, Default)]
pub struct World {
    pub(crate) entities: HashMap<EntityId, Entity>,
    pub(crate) mockups: MockupTable,
    pub(crate) player: Option<EntityId>,
    /// Smoothed arena dims (presentation side).
    pub(crate) arena: ArenaDims,
    /// Latest server-sent arena dims.
    pub(crate) arena_server: ArenaDims,
}

impl World {
    // ─── Template loading (decoder; write-once at startup) ───

    /// Decodes a hex mockup stream into the template table.
    ///
    /// On failure the table is unchanged; the caller treats this as fatal to
    /// game start.
    pub fn load_mockups(&mut self, hex: &str) -> Result<usize, DecodeError> {
        self.mockups.load_hex(hex)
    }

    pub fn mockups(&self) -> &MockupTable {
        &self.mockups
    }

    // ─── Network-side writers (authoritative fields only) ───

    /// Applies a snapshot: replaces authoritative fields of known entities
    /// and inserts fresh records for unseen ids. Presentation fields are
    /// never touched here.
    pub fn apply_snapshot(&mut self, snap: &Snapshot) {
        self.arena_server = ArenaDims {
            width: snap.arena_width,
            height: snap.arena_height,
        };
        for update in &snap.entities {
            match self.entities.get_mut(&update.id) {
                Some(entity) => {
                    entity.server = ServerPose::from(update);
                    entity.mockup = update.mockup;
                    entity.color = update.color;
                }
                None => {
                    debug!(id = update.id.0, "New entity");
                    self.entities.insert(update.id, Entity::from_update(update));
                }
            }
        }
    }

    /// Starts the fade-out for an entity. Only live entities begin dying.
    pub fn mark_dying(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.lifecycle == Lifecycle::Alive {
                entity.lifecycle = Lifecycle::Dying;
            }
        }
    }

    /// Removes an entity from the active set.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Binds the locally controlled entity (initial spawn or respawn).
    pub fn set_player(&mut self, id: EntityId) {
        self.player = Some(id);
    }

    /// Drops all live state. Used on full reconnect; templates survive.
    pub fn clear_entities(&mut self) {
        self.entities.clear();
        self.player = None;
    }

    // ─── Reads ───

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Presentation position of the controlled entity, if bound and known.
    pub fn player_pos(&self) -> Option<Vec2> {
        let id = self.player?;
        let entity = self.entities.get(&id)?;
        Some(Vec2::new(entity.pose.x, entity.pose.y))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Smoothed arena dims.
    pub fn arena(&self) -> ArenaDims {
        self.arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: i32, x: f32, y: f32) -> EntityUpdate {
        EntityUpdate {
            id: EntityId(id),
            mockup: MockupId(1),
            x,
            y,
            angle: 0.0,
            health: 50.0,
            max_health: 50.0,
            color: Color::new(0x00, 0xb0, 0xe1),
        }
    }

    fn snapshot(entities: Vec<EntityUpdate>) -> Snapshot {
        Snapshot {
            tick: 0,
            arena_width: 1000.0,
            arena_height: 800.0,
            entities,
        }
    }

    #[test]
    fn snapshot_inserts_unseen_and_updates_known() {
        let mut world = World::default();
        world.apply_snapshot(&snapshot(vec![update(1, 10.0, 20.0)]));
        assert_eq!(world.len(), 1);
        // Fresh entities carry the zero presentation sentinel.
        assert_eq!(world.get(EntityId(1)).unwrap().pose, Pose::default());

        world.apply_snapshot(&snapshot(vec![update(1, 30.0, 40.0)]));
        let entity = world.get(EntityId(1)).unwrap();
        assert_eq!(entity.server.x, 30.0);
        assert_eq!(entity.pose, Pose::default());
    }

    #[test]
    fn snapshot_never_touches_presentation_or_lifecycle() {
        let mut world = World::default();
        world.apply_snapshot(&snapshot(vec![update(1, 10.0, 20.0)]));
        world.mark_dying(EntityId(1));

        world.apply_snapshot(&snapshot(vec![update(1, 99.0, 99.0)]));
        let entity = world.get(EntityId(1)).unwrap();
        assert_eq!(entity.lifecycle, Lifecycle::Dying);
        assert_eq!(entity.pose.x, 0.0);
    }

    #[test]
    fn mark_dying_only_from_alive() {
        let mut world = World::default();
        world.apply_snapshot(&snapshot(vec![update(1, 0.0, 0.0)]));

        world.mark_dying(EntityId(1));
        assert_eq!(world.get(EntityId(1)).unwrap().lifecycle, Lifecycle::Dying);

        // A second death signal while dying changes nothing.
        world.mark_dying(EntityId(1));
        assert_eq!(world.get(EntityId(1)).unwrap().lifecycle, Lifecycle::Dying);
    }

    #[test]
    fn clear_keeps_templates() {
        let mut world = World::default();
        world.apply_snapshot(&snapshot(vec![update(1, 0.0, 0.0)]));
        world.set_player(EntityId(1));
        world.clear_entities();

        assert!(world.is_empty());
        assert_eq!(world.player(), None);
    }
}
