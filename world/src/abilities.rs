//! Ability cooldowns, placement selection, and timed ground effects.

use std::collections::BTreeMap;
use std::time::Duration;

use rampart_core::{
    level::AbilitySpec, AbilityId, AbilityStatus, EffectSnapshot, EnemyId, Event, TileCoord,
    TileGrid,
};

use crate::enemies::Enemy;

/// One placed ground effect burning down its duration.
#[derive(Clone, Debug)]
struct ActiveEffect {
    ability: AbilityId,
    tiles: Vec<TileCoord>,
    elapsed: Duration,
    ticks_applied: u32,
}

/// Runtime state for every ability definition of the loaded level.
#[derive(Debug, Default)]
pub(crate) struct AbilityRuntime {
    cooldowns: Vec<Duration>,
    pending: Option<AbilityId>,
    effects: Vec<ActiveEffect>,
}

impl AbilityRuntime {
    /// Creates runtime state with no abilities registered.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Re-arms the runtime for a level exposing `ability_count` definitions.
    pub(crate) fn reset(&mut self, ability_count: usize) {
        self.cooldowns.clear();
        self.cooldowns.resize(ability_count, Duration::ZERO);
        self.pending = None;
        self.effects.clear();
    }

    /// Ability currently awaiting a placement tile, if any.
    pub(crate) const fn pending(&self) -> Option<AbilityId> {
        self.pending
    }

    /// Arms the provided ability for placement, replacing any prior choice.
    pub(crate) fn select(&mut self, ability: AbilityId) {
        self.pending = Some(ability);
    }

    /// Clears the armed selection, returning what was armed.
    pub(crate) fn cancel(&mut self) -> Option<AbilityId> {
        self.pending.take()
    }

    /// Cooldown left before the ability can be activated again.
    pub(crate) fn remaining_cooldown(&self, ability: AbilityId) -> Duration {
        usize::try_from(ability.get())
            .ok()
            .and_then(|index| self.cooldowns.get(index))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Places the effect on the provided tiles and starts the cooldown.
    ///
    /// The first damage tick lands immediately; later ticks follow the
    /// definition's interval while [`AbilityRuntime::advance`] runs.
    pub(crate) fn activate(
        &mut self,
        spec: &AbilitySpec,
        tiles: Vec<TileCoord>,
        grid: &TileGrid,
        enemies: &mut BTreeMap<EnemyId, Enemy>,
    ) {
        if let Some(slot) = usize::try_from(spec.id.get())
            .ok()
            .and_then(|index| self.cooldowns.get_mut(index))
        {
            *slot = spec.cooldown;
        }
        self.pending = None;
        damage_enemies_on_tiles(&tiles, spec.damage, grid, enemies);
        self.effects.push(ActiveEffect {
            ability: spec.id,
            tiles,
            elapsed: Duration::ZERO,
            ticks_applied: 0,
        });
    }

    /// Advances cooldowns and every placed effect by `dt`.
    ///
    /// Damage ticks owed for the elapsed time are applied before an effect
    /// expires, so a tick scheduled exactly at the duration boundary still
    /// lands. Expired effects report through `out_events` and are removed.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        specs: &[AbilitySpec],
        grid: &TileGrid,
        enemies: &mut BTreeMap<EnemyId, Enemy>,
        out_events: &mut Vec<Event>,
    ) {
        for remaining in &mut self.cooldowns {
            *remaining = remaining.saturating_sub(dt);
        }
        self.effects.retain_mut(|effect| {
            let Some(spec) = spec_of(specs, effect.ability) else {
                return false;
            };
            effect.elapsed = effect.elapsed.saturating_add(dt);
            let capped = effect.elapsed.min(spec.effect_duration);
            let due = capped.as_millis() / spec.damage_every.as_millis();
            while u128::from(effect.ticks_applied) < due {
                effect.ticks_applied += 1;
                damage_enemies_on_tiles(&effect.tiles, spec.damage, grid, enemies);
            }
            if effect.elapsed >= spec.effect_duration {
                out_events.push(Event::AbilityExpired {
                    ability: effect.ability,
                });
                return false;
            }
            true
        });
    }

    /// Card state for every registered ability.
    pub(crate) fn statuses(&self) -> Vec<AbilityStatus> {
        self.cooldowns
            .iter()
            .enumerate()
            .map(|(index, remaining)| {
                let ability = AbilityId::new(index as u32);
                AbilityStatus {
                    ability,
                    remaining_cooldown: *remaining,
                    ready: remaining.is_zero(),
                    selecting: self.pending == Some(ability),
                }
            })
            .collect()
    }

    /// Snapshots of the placed effects in activation order.
    pub(crate) fn effect_snapshots(&self, specs: &[AbilitySpec]) -> Vec<EffectSnapshot> {
        self.effects
            .iter()
            .map(|effect| EffectSnapshot {
                ability: effect.ability,
                tiles: effect.tiles.clone(),
                remaining: spec_of(specs, effect.ability).map_or(Duration::ZERO, |spec| {
                    spec.effect_duration.saturating_sub(effect.elapsed)
                }),
            })
            .collect()
    }
}

fn spec_of(specs: &[AbilitySpec], ability: AbilityId) -> Option<&AbilitySpec> {
    usize::try_from(ability.get()).ok().and_then(|index| specs.get(index))
}

/// Applies one damage tick to every living enemy standing on a covered tile.
fn damage_enemies_on_tiles(
    tiles: &[TileCoord],
    damage: u32,
    grid: &TileGrid,
    enemies: &mut BTreeMap<EnemyId, Enemy>,
) {
    for enemy in enemies.values_mut() {
        if !enemy.is_alive() {
            continue;
        }
        if let Some(tile) = grid.tile_at_point(enemy.position) {
            if tiles.contains(&tile) {
                enemy.health = enemy.health.saturating_sub(damage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AbilityRuntime;
    use crate::enemies::Enemy;
    use rampart_core::{
        level::{AbilityKind, AbilitySpec},
        AbilityId, EnemyId, Event, RouteId, TileCoord, TileGrid, TileKind, WorldPoint,
    };
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn corridor_grid() -> TileGrid {
        let rows = vec![["S1", "O", "O", "O", "E1"]
            .iter()
            .map(|token| TileKind::from_token(token).expect("valid token"))
            .collect()];
        TileGrid::from_rows(rows, 80.0).expect("grid builds")
    }

    fn lava_spec(cooldown_ms: u64) -> AbilitySpec {
        AbilitySpec {
            id: AbilityId::new(0),
            key: "lava_floor".to_owned(),
            kind: AbilityKind::LavaFloor,
            name: "Lava floor".to_owned(),
            selection_count: 3,
            damage: 50,
            damage_every: Duration::from_millis(250),
            cooldown: Duration::from_millis(cooldown_ms),
            effect_duration: Duration::from_millis(1_000),
            color: "#ff0".to_owned(),
            icon: "🔥".to_owned(),
        }
    }

    fn enemy_on_tile(grid: &TileGrid, column: u32, health: u32) -> Enemy {
        Enemy {
            id: EnemyId::new(0),
            route: RouteId::new(1),
            route_index: 0,
            position: grid.tile_center(TileCoord::new(column, 0)),
            health,
            max_health: health,
            speed: 0.08,
            coin_reward: 1,
        }
    }

    fn covered_tiles() -> Vec<TileCoord> {
        vec![
            TileCoord::new(1, 0),
            TileCoord::new(2, 0),
            TileCoord::new(3, 0),
        ]
    }

    #[test]
    fn activation_ticks_immediately_then_on_the_interval() {
        let grid = corridor_grid();
        let spec = lava_spec(30_000);
        let mut runtime = AbilityRuntime::new();
        runtime.reset(1);
        let mut enemies = BTreeMap::new();
        let _ = enemies.insert(EnemyId::new(0), enemy_on_tile(&grid, 2, 300));
        let mut events = Vec::new();

        runtime.activate(&spec, covered_tiles(), &grid, &mut enemies);
        assert_eq!(enemies[&EnemyId::new(0)].health, 250);

        for _ in 0..3 {
            runtime.advance(
                Duration::from_millis(250),
                std::slice::from_ref(&spec),
                &grid,
                &mut enemies,
                &mut events,
            );
        }
        assert_eq!(enemies[&EnemyId::new(0)].health, 100);
        assert!(events.is_empty());

        runtime.advance(
            Duration::from_millis(250),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );
        assert_eq!(enemies[&EnemyId::new(0)].health, 50);
        assert_eq!(
            events,
            vec![Event::AbilityExpired {
                ability: AbilityId::new(0),
            }]
        );
        assert!(runtime.effect_snapshots(std::slice::from_ref(&spec)).is_empty());
    }

    #[test]
    fn oversized_step_applies_every_owed_tick_before_expiring() {
        let grid = corridor_grid();
        let spec = lava_spec(30_000);
        let mut runtime = AbilityRuntime::new();
        runtime.reset(1);
        let mut enemies = BTreeMap::new();
        let _ = enemies.insert(EnemyId::new(0), enemy_on_tile(&grid, 2, 300));
        let mut events = Vec::new();

        runtime.activate(&spec, covered_tiles(), &grid, &mut enemies);
        runtime.advance(
            Duration::from_millis(1_000),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );

        assert_eq!(enemies[&EnemyId::new(0)].health, 50);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn enemies_off_the_covered_tiles_are_untouched() {
        let grid = corridor_grid();
        let spec = lava_spec(30_000);
        let mut runtime = AbilityRuntime::new();
        runtime.reset(1);
        let mut enemies = BTreeMap::new();
        let _ = enemies.insert(EnemyId::new(0), enemy_on_tile(&grid, 4, 300));
        let mut events = Vec::new();

        runtime.activate(&spec, covered_tiles(), &grid, &mut enemies);
        runtime.advance(
            Duration::from_millis(1_000),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );

        assert_eq!(enemies[&EnemyId::new(0)].health, 300);
    }

    #[test]
    fn expired_effects_stop_dealing_damage() {
        let grid = corridor_grid();
        let spec = lava_spec(30_000);
        let mut runtime = AbilityRuntime::new();
        runtime.reset(1);
        let mut enemies = BTreeMap::new();
        let _ = enemies.insert(EnemyId::new(0), enemy_on_tile(&grid, 2, 1_000));
        let mut events = Vec::new();

        runtime.activate(&spec, covered_tiles(), &grid, &mut enemies);
        runtime.advance(
            Duration::from_millis(1_000),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );
        let settled = enemies[&EnemyId::new(0)].health;

        runtime.advance(
            Duration::from_millis(1_000),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );

        assert_eq!(enemies[&EnemyId::new(0)].health, settled);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn cooldown_starts_at_activation_and_counts_down() {
        let grid = corridor_grid();
        let spec = lava_spec(2_000);
        let mut runtime = AbilityRuntime::new();
        runtime.reset(1);
        let mut enemies = BTreeMap::new();
        let mut events = Vec::new();

        assert_eq!(runtime.remaining_cooldown(AbilityId::new(0)), Duration::ZERO);

        runtime.activate(&spec, covered_tiles(), &grid, &mut enemies);
        assert_eq!(
            runtime.remaining_cooldown(AbilityId::new(0)),
            Duration::from_millis(2_000)
        );

        runtime.advance(
            Duration::from_millis(1_500),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );
        assert_eq!(
            runtime.remaining_cooldown(AbilityId::new(0)),
            Duration::from_millis(500)
        );

        runtime.advance(
            Duration::from_millis(1_500),
            std::slice::from_ref(&spec),
            &grid,
            &mut enemies,
            &mut events,
        );
        assert_eq!(runtime.remaining_cooldown(AbilityId::new(0)), Duration::ZERO);
    }

    #[test]
    fn statuses_report_readiness_and_selection() {
        let mut runtime = AbilityRuntime::new();
        runtime.reset(2);

        runtime.select(AbilityId::new(1));
        let statuses = runtime.statuses();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].ready);
        assert!(!statuses[0].selecting);
        assert!(statuses[1].selecting);

        assert_eq!(runtime.cancel(), Some(AbilityId::new(1)));
        assert_eq!(runtime.cancel(), None);
        assert!(runtime.statuses().iter().all(|status| !status.selecting));
    }

    #[test]
    fn dead_enemies_are_skipped_by_damage_ticks() {
        let grid = corridor_grid();
        let spec = lava_spec(30_000);
        let mut runtime = AbilityRuntime::new();
        runtime.reset(1);
        let mut enemies = BTreeMap::new();
        let _ = enemies.insert(EnemyId::new(0), enemy_on_tile(&grid, 2, 0));

        runtime.activate(&spec, covered_tiles(), &grid, &mut enemies);
        assert_eq!(enemies[&EnemyId::new(0)].health, 0);
    }
}
