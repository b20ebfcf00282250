//! Entity registry.
//!
//! A local mirror of server-authoritative world state, keyed by the
//! server-assigned id. The server creates and removes entries through
//! snapshots and remove orders; prediction only moves them in between.

use std::collections::HashMap;

use tracing::warn;

use webgame_shared::math::{Rotation, Vec2};
use webgame_shared::protocol::{EntityId, EntitySnapshot};

/// Entity family, derived from the server's `type` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    AllyNpc,
    EnemyNpc,
    Object,
    Unknown,
}

impl EntityKind {
    /// Maps a server `type` string (e.g. `npc_enemy_1`) to its family.
    pub fn from_type_name(name: &str) -> Self {
        if name == "player" {
            Self::Player
        } else if name.starts_with("npc_ally") {
            Self::AllyNpc
        } else if name.starts_with("npc_enemy") {
            Self::EnemyNpc
        } else if name.contains("object") {
            Self::Object
        } else {
            Self::Unknown
        }
    }
}

/// Resolves the displayable asset for an entity family.
///
/// The lookup is external to the core: a host with its own art swaps this
/// out, headless runs keep the default table.
pub trait AssetCatalog: Send {
    /// Returns the asset for `kind`, or `None` when there is none.
    fn resolve(&self, kind: EntityKind) -> Option<String>;
}

/// Default sprite table.
#[derive(Debug, Default)]
pub struct SpriteCatalog;

impl AssetCatalog for SpriteCatalog {
    fn resolve(&self, kind: EntityKind) -> Option<String> {
        let sprite = match kind {
            EntityKind::Player => "knight.png",
            EntityKind::AllyNpc => "guard.png",
            EntityKind::EnemyNpc => "skeleton_warrior.png",
            EntityKind::Object => "object1.png",
            EntityKind::Unknown => return None,
        };
        Some(sprite.to_string())
    }
}

/// One tracked entity, the local player included.
#[derive(Debug, Clone)]
pub struct EntityState {
    pub id: EntityId,
    /// World position. Authoritative values overwrite this outright;
    /// prediction advances it in between.
    pub position: Vec2,
    /// Unit (or zero) heading.
    pub direction: Vec2,
    pub speed: f32,
    pub kind: EntityKind,
    /// Facing derived from `direction` while moving. Keeps its last value
    /// when the entity stops.
    pub rotation: Rotation,
    /// Resolved displayable asset. Empty when the kind has none.
    pub asset: String,
}

/// Id-keyed world mirror.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, EntityState>,
    local_id: Option<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the locally created player entry under
    /// [`EntityId::PLACEHOLDER`]. The handshake re-keys it later.
    pub fn spawn_local(&mut self, catalog: &dyn AssetCatalog, position: Vec2) {
        let state = EntityState {
            id: EntityId::PLACEHOLDER,
            position,
            direction: Vec2::ZERO,
            speed: 0.0,
            kind: EntityKind::Player,
            rotation: Rotation::FACING_UP,
            asset: resolve_asset(catalog, EntityKind::Player, EntityId::PLACEHOLDER),
        };
        self.entities.insert(EntityId::PLACEHOLDER, state);
        self.local_id = Some(EntityId::PLACEHOLDER);
    }

    /// Moves the local player entry to the server-assigned id.
    pub fn rekey_local(&mut self, new_id: EntityId) {
        let Some(old_id) = self.local_id else {
            warn!(id = ?new_id, "No local player to rekey");
            return;
        };
        if let Some(mut state) = self.entities.remove(&old_id) {
            state.id = new_id;
            self.entities.insert(new_id, state);
        }
        self.local_id = Some(new_id);
    }

    /// Applies one snapshot: creates the entity on first mention,
    /// otherwise overwrites `position` and only the optional fields that
    /// are present.
    ///
    /// The local player's id showing up here is a protocol violation; the
    /// entry is logged and skipped.
    pub fn upsert_from_snapshot(&mut self, catalog: &dyn AssetCatalog, snapshot: &EntitySnapshot) {
        if self.local_id == Some(snapshot.id) {
            warn!(id = ?snapshot.id, "Got our own id in an entities snapshot");
            return;
        }
        match self.entities.get_mut(&snapshot.id) {
            Some(state) => {
                state.position = snapshot.pos;
                if let Some(dir) = snapshot.dir {
                    state.direction = dir;
                }
                if let Some(speed) = snapshot.speed {
                    state.speed = speed;
                }
                if let Some(name) = snapshot.type_name.as_deref() {
                    let kind = EntityKind::from_type_name(name);
                    if kind != state.kind {
                        state.kind = kind;
                        state.asset = resolve_asset(catalog, kind, snapshot.id);
                    }
                }
            }
            None => {
                let kind = snapshot
                    .type_name
                    .as_deref()
                    .map(EntityKind::from_type_name)
                    .unwrap_or(EntityKind::Unknown);
                let state = EntityState {
                    id: snapshot.id,
                    position: snapshot.pos,
                    direction: snapshot.dir.unwrap_or(Vec2::ZERO),
                    speed: snapshot.speed.unwrap_or(0.0),
                    kind,
                    rotation: Rotation::FACING_UP,
                    asset: resolve_asset(catalog, kind, snapshot.id),
                };
                self.entities.insert(snapshot.id, state);
            }
        }
    }

    /// Deletes every listed entity. Unknown ids are logged and skipped;
    /// removal never fails.
    pub fn remove(&mut self, ids: &[EntityId]) {
        for id in ids {
            if self.entities.remove(id).is_none() {
                warn!(id = ?id, "Remove order for an unknown id");
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityState> {
        self.entities.get(&id)
    }

    pub fn local_id(&self) -> Option<EntityId> {
        self.local_id
    }

    pub fn local(&self) -> Option<&EntityState> {
        self.entities.get(&self.local_id?)
    }

    pub fn local_mut(&mut self) -> Option<&mut EntityState> {
        let id = self.local_id?;
        self.entities.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EntityState> {
        self.entities.values_mut()
    }
}

fn resolve_asset(catalog: &dyn AssetCatalog, kind: EntityKind, id: EntityId) -> String {
    match catalog.resolve(kind) {
        Some(asset) => asset,
        None => {
            warn!(id = ?id, ?kind, "No asset for entity kind");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: u64, x: f32, y: f32) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId(id),
            pos: Vec2::new(x, y),
            dir: None,
            speed: None,
            type_name: None,
        }
    }

    #[test]
    fn first_mention_creates_with_defaults() {
        let mut registry = EntityRegistry::new();
        let mut snap = snapshot(3, 1.0, 1.0);
        snap.type_name = Some("npc_enemy_1".to_string());
        registry.upsert_from_snapshot(&SpriteCatalog, &snap);

        let state = registry.get(EntityId(3)).unwrap();
        assert_eq!(state.position, Vec2::new(1.0, 1.0));
        assert_eq!(state.direction, Vec2::ZERO);
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.kind, EntityKind::EnemyNpc);
        assert_eq!(state.asset, "skeleton_warrior.png");
    }

    #[test]
    fn repeated_ids_never_duplicate() {
        let mut registry = EntityRegistry::new();
        registry.upsert_from_snapshot(&SpriteCatalog, &snapshot(3, 0.0, 0.0));
        registry.upsert_from_snapshot(&SpriteCatalog, &snapshot(3, 2.0, 2.0));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(EntityId(3)).unwrap().position, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn partial_snapshot_preserves_other_fields() {
        let mut registry = EntityRegistry::new();
        let full = EntitySnapshot {
            id: EntityId(5),
            pos: Vec2::new(0.0, 0.0),
            dir: Some(Vec2::new(0.0, 1.0)),
            speed: Some(2.0),
            type_name: Some("npc_ally_1".to_string()),
        };
        registry.upsert_from_snapshot(&SpriteCatalog, &full);
        registry.upsert_from_snapshot(&SpriteCatalog, &snapshot(5, 4.0, 4.0));

        let state = registry.get(EntityId(5)).unwrap();
        assert_eq!(state.position, Vec2::new(4.0, 4.0));
        assert_eq!(state.direction, Vec2::new(0.0, 1.0));
        assert_eq!(state.speed, 2.0);
        assert_eq!(state.kind, EntityKind::AllyNpc);
    }

    #[test]
    fn remove_of_unknown_id_is_a_noop() {
        let mut registry = EntityRegistry::new();
        registry.upsert_from_snapshot(&SpriteCatalog, &snapshot(3, 1.0, 1.0));
        registry.remove(&[EntityId(3), EntityId(99)]);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn own_id_in_snapshot_is_skipped() {
        let mut registry = EntityRegistry::new();
        registry.spawn_local(&SpriteCatalog, Vec2::ZERO);
        registry.rekey_local(EntityId(7));
        registry.upsert_from_snapshot(&SpriteCatalog, &snapshot(7, 9.0, 9.0));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.local().unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn rekey_moves_the_local_entry() {
        let mut registry = EntityRegistry::new();
        registry.spawn_local(&SpriteCatalog, Vec2::ZERO);
        assert_eq!(registry.local_id(), Some(EntityId::PLACEHOLDER));

        registry.rekey_local(EntityId(4));
        assert_eq!(registry.local_id(), Some(EntityId(4)));
        assert!(registry.get(EntityId::PLACEHOLDER).is_none());
        assert_eq!(registry.get(EntityId(4)).unwrap().kind, EntityKind::Player);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn kind_change_reresolves_the_asset() {
        let mut registry = EntityRegistry::new();
        let mut snap = snapshot(6, 0.0, 0.0);
        snap.type_name = Some("npc_ally_1".to_string());
        registry.upsert_from_snapshot(&SpriteCatalog, &snap);
        assert_eq!(registry.get(EntityId(6)).unwrap().asset, "guard.png");

        snap.type_name = Some("npc_enemy_1".to_string());
        registry.upsert_from_snapshot(&SpriteCatalog, &snap);
        assert_eq!(
            registry.get(EntityId(6)).unwrap().asset,
            "skeleton_warrior.png"
        );
    }

    #[test]
    fn unknown_type_falls_back_to_empty_asset() {
        let mut registry = EntityRegistry::new();
        let mut snap = snapshot(8, 0.0, 0.0);
        snap.type_name = Some("dragon".to_string());
        registry.upsert_from_snapshot(&SpriteCatalog, &snap);

        let state = registry.get(EntityId(8)).unwrap();
        assert_eq!(state.kind, EntityKind::Unknown);
        assert_eq!(state.asset, "");
    }

    #[test]
    fn type_names_map_to_families() {
        assert_eq!(EntityKind::from_type_name("player"), EntityKind::Player);
        assert_eq!(EntityKind::from_type_name("npc_ally_1"), EntityKind::AllyNpc);
        assert_eq!(EntityKind::from_type_name("npc_enemy_1"), EntityKind::EnemyNpc);
        assert_eq!(EntityKind::from_type_name("object1"), EntityKind::Object);
        assert_eq!(EntityKind::from_type_name("dragon"), EntityKind::Unknown);
    }
}
