//! Authoritative tower state management utilities.

use std::collections::BTreeMap;
use std::time::Duration;

use rampart_core::{TileCoord, TowerId, TowerSnapshot, TowerTypeId, WorldPoint};

/// One constructed tower, stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Tile the tower occupies.
    pub(crate) tile: TileCoord,
    /// Center of the occupied tile in world units.
    pub(crate) center: WorldPoint,
    /// Catalog entry the tower was built from.
    pub(crate) tower_type: TowerTypeId,
    /// Time accumulated since the last shot.
    pub(crate) since_last_shot: Duration,
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug, Default)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: u32,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Removes every tower and resets identifier allocation.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_tower_id = 0;
    }

    /// Constructs a tower on the provided tile, returning its identifier.
    ///
    /// A fresh tower starts its cooldown from zero, so the first shot waits
    /// out a full fire interval.
    pub(crate) fn build(
        &mut self,
        tile: TileCoord,
        center: WorldPoint,
        tower_type: TowerTypeId,
    ) -> TowerId {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id += 1;
        let _ = self.entries.insert(
            id,
            Tower {
                id,
                tile,
                center,
                tower_type,
                since_last_shot: Duration::ZERO,
            },
        );
        id
    }

    /// Removes and returns the tower occupying the provided tile.
    pub(crate) fn remove_at(&mut self, tile: TileCoord) -> Option<Tower> {
        let id = self
            .entries
            .values()
            .find(|tower| tower.tile == tile)
            .map(|tower| tower.id)?;
        self.entries.remove(&id)
    }

    /// True when a tower already occupies the provided tile.
    pub(crate) fn is_occupied(&self, tile: TileCoord) -> bool {
        self.entries.values().any(|tower| tower.tile == tile)
    }

    /// Tower identifiers in ascending allocation order.
    pub(crate) fn ids(&self) -> Vec<TowerId> {
        self.entries.keys().copied().collect()
    }

    /// Mutable access to one tower by identifier.
    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    /// Snapshots of every tower, paired with each tower's targeting radius.
    pub(crate) fn snapshots<F>(&self, range_of: F) -> Vec<TowerSnapshot>
    where
        F: Fn(TowerTypeId) -> f32,
    {
        self.entries
            .values()
            .map(|tower| TowerSnapshot {
                id: tower.id,
                tile: tower.tile,
                center: tower.center,
                tower_type: tower.tower_type,
                range: range_of(tower.tower_type),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::TowerRegistry;
    use rampart_core::{TileCoord, TowerId, TowerTypeId, WorldPoint};
    use std::time::Duration;

    fn build_at(registry: &mut TowerRegistry, column: u32, row: u32) -> TowerId {
        registry.build(
            TileCoord::new(column, row),
            WorldPoint::new(column as f32 * 60.0 + 30.0, row as f32 * 60.0 + 30.0),
            TowerTypeId::new(0),
        )
    }

    #[test]
    fn fresh_towers_start_their_cooldown_from_zero() {
        let mut registry = TowerRegistry::new();
        let id = build_at(&mut registry, 0, 0);
        let tower = registry.get_mut(id).expect("tower stored");
        assert_eq!(tower.since_last_shot, Duration::ZERO);
    }

    #[test]
    fn identifiers_allocate_monotonically() {
        let mut registry = TowerRegistry::new();
        let first = build_at(&mut registry, 0, 0);
        let second = build_at(&mut registry, 1, 0);
        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
    }

    #[test]
    fn identifiers_are_not_reused_after_removal() {
        let mut registry = TowerRegistry::new();
        let first = build_at(&mut registry, 0, 0);
        let removed = registry
            .remove_at(TileCoord::new(0, 0))
            .expect("tower removed");
        assert_eq!(removed.id, first);

        let second = build_at(&mut registry, 0, 0);
        assert_eq!(second, TowerId::new(1));
    }

    #[test]
    fn occupancy_follows_builds_and_removals() {
        let mut registry = TowerRegistry::new();
        let tile = TileCoord::new(2, 3);
        assert!(!registry.is_occupied(tile));

        let _ = registry.build(tile, WorldPoint::new(150.0, 210.0), TowerTypeId::new(0));
        assert!(registry.is_occupied(tile));

        let _ = registry.remove_at(tile);
        assert!(!registry.is_occupied(tile));
    }

    #[test]
    fn clearing_resets_identifier_allocation() {
        let mut registry = TowerRegistry::new();
        let _ = build_at(&mut registry, 0, 0);
        registry.clear();
        let fresh = build_at(&mut registry, 1, 1);
        assert_eq!(fresh, TowerId::new(0));
    }
}
