#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rampart.

mod abilities;
mod enemies;
mod projectiles;
mod towers;
mod waves;

use std::collections::BTreeMap;
use std::time::Duration;

use rampart_core::{
    level::{LevelError, LevelPlan},
    AbilityId, AbilityRejection, BuildRejection, Command, EnemyId, Event, PlayState,
    PurchaseRejection, RouteId, SellRejection, TileCoord, TowerTypeId, WaveRejection,
    WELCOME_BANNER,
};
use rampart_system_routing::{centered_window, RouteSet};
use rampart_system_targeting::{select_target, TargetCandidate};

use self::abilities::AbilityRuntime;
use self::enemies::Enemy;
use self::projectiles::ProjectilePool;
use self::towers::TowerRegistry;
use self::waves::WaveScheduler;

/// Coin cost of each successive extra-life purchase. Purchases past the last
/// rung stay at the final price.
const LIFE_PRICES: [u32; 7] = [10, 25, 50, 75, 100, 150, 200];

/// Represents the authoritative Rampart world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    plan: Option<LevelPlan>,
    routes: RouteSet,
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: u32,
    towers: TowerRegistry,
    projectiles: ProjectilePool,
    abilities: AbilityRuntime,
    waves: WaveScheduler,
    economy: Economy,
    play_state: PlayState,
}

impl World {
    /// Creates a world with no level loaded.
    ///
    /// Until a [`Command::LoadLevel`] commits, ticks are ignored and every
    /// other command comes back with the matching rejection event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            plan: None,
            routes: RouteSet::default(),
            enemies: BTreeMap::new(),
            next_enemy_id: 0,
            towers: TowerRegistry::new(),
            projectiles: ProjectilePool::new(),
            abilities: AbilityRuntime::new(),
            waves: WaveScheduler::new(),
            economy: Economy::default(),
            play_state: PlayState::Running,
        }
    }

    fn load_level(&mut self, plan: LevelPlan, out_events: &mut Vec<Event>) {
        let routes = RouteSet::build(plan.grid());
        if let Some(route) = first_unroutable_wave_route(&plan, &routes) {
            out_events.push(Event::LevelRejected {
                reason: LevelError::UnreachableRoute { route },
            });
            return;
        }

        self.enemies.clear();
        self.next_enemy_id = 0;
        self.towers.clear();
        self.projectiles.clear();
        self.abilities.reset(plan.abilities().len());
        self.economy = Economy {
            coins: plan.starting_coins(),
            lives: plan.starting_lives(),
            life_purchases: 0,
        };
        self.play_state = PlayState::Running;
        out_events.push(Event::LevelLoaded {
            name: plan.name().to_owned(),
            waves: plan.wave_count(),
        });
        self.routes = routes;
        self.plan = Some(plan);
        self.start_wave(0, out_events);
    }

    fn start_wave(&mut self, index: u32, out_events: &mut Vec<Event>) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let Some(wave) = usize::try_from(index)
            .ok()
            .and_then(|position| plan.waves().get(position))
        else {
            return;
        };
        let enemies = wave.enemy_total();
        self.waves.start_wave(index, wave);
        out_events.push(Event::WaveStarted { index, enemies });
    }

    fn advance_time(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.plan.is_none() || !matches!(self.play_state, PlayState::Running) {
            return;
        }
        out_events.push(Event::TimeAdvanced { dt });
        self.spawn_due_enemies(dt, out_events);
        self.advance_enemies(dt);
        self.update_towers(dt, out_events);
        self.update_abilities(dt, out_events);
        self.reconcile_enemies(out_events);
        self.advance_wave_if_clear(out_events);
    }

    fn spawn_due_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let Some(wave) = usize::try_from(self.waves.wave_index())
            .ok()
            .and_then(|position| plan.waves().get(position))
        else {
            return;
        };
        let Some(group_index) = self.waves.next_spawn(dt, wave) else {
            return;
        };
        let Some(group) = wave.groups.get(group_index) else {
            return;
        };
        let Some(start_tile) = self
            .routes
            .route(group.route)
            .and_then(|tiles| tiles.first().copied())
        else {
            return;
        };

        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id += 1;
        let health = group.health;
        let _ = self.enemies.insert(
            id,
            Enemy {
                id,
                route: group.route,
                route_index: 0,
                position: plan.grid().tile_center(start_tile),
                health,
                max_health: health,
                speed: group.speed,
                coin_reward: group.coin_reward,
            },
        );
        out_events.push(Event::EnemySpawned {
            enemy: id,
            tile: start_tile,
            health,
        });
    }

    fn advance_enemies(&mut self, dt: Duration) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let grid = plan.grid();
        let dt_ms = dt.as_secs_f32() * 1_000.0;
        for enemy in self.enemies.values_mut() {
            let route_tiles = self.routes.route(enemy.route).unwrap_or(&[]);
            let Some(next_tile) = route_tiles.get(enemy.route_index + 1) else {
                continue;
            };
            enemy.advance_toward(grid.tile_center(*next_tile), enemy.speed * dt_ms);
        }
    }

    fn update_towers(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let mut candidates: Vec<TargetCandidate> = Vec::new();
        for id in self.towers.ids() {
            let Some(tower) = self.towers.get_mut(id) else {
                continue;
            };
            tower.since_last_shot = tower.since_last_shot.saturating_add(dt);
            if let Some(spec) = plan.tower(tower.tower_type) {
                if tower.since_last_shot >= spec.fire_rate {
                    candidates.clear();
                    candidates.extend(self.enemies.values().filter(|enemy| enemy.is_alive()).map(
                        |enemy| TargetCandidate {
                            enemy: enemy.id,
                            position: enemy.position,
                        },
                    ));
                    if let Some(target) = select_target(tower.center, spec.range, &candidates) {
                        self.projectiles.acquire(
                            id,
                            target,
                            tower.center,
                            spec.damage,
                            spec.projectile_speed,
                        );
                        tower.since_last_shot = Duration::ZERO;
                        out_events.push(Event::ProjectileFired { tower: id, target });
                    }
                }
            }
            // A projectile fired this tick flies with the same dt as the rest.
            self.projectiles
                .advance_owned(id, dt, &mut self.enemies, out_events);
        }
    }

    fn update_abilities(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        self.abilities.advance(
            dt,
            plan.abilities(),
            plan.grid(),
            &mut self.enemies,
            out_events,
        );
    }

    // Dead enemies settle before escapes, so an enemy killed on the final
    // route node still pays out instead of costing a life.
    fn reconcile_enemies(&mut self, out_events: &mut Vec<Event>) {
        let mut outcomes: Vec<(EnemyId, EnemyOutcome)> = Vec::new();
        for enemy in self.enemies.values() {
            if !enemy.is_alive() {
                outcomes.push((
                    enemy.id,
                    EnemyOutcome::Killed {
                        reward: enemy.coin_reward,
                    },
                ));
            } else if enemy.has_finished(
                self.routes.route(enemy.route).map(<[TileCoord]>::len),
            ) {
                outcomes.push((enemy.id, EnemyOutcome::Escaped));
            }
        }
        for (id, outcome) in outcomes {
            let _ = self.enemies.remove(&id);
            match outcome {
                EnemyOutcome::Killed { reward } => {
                    self.economy.coins = self.economy.coins.saturating_add(reward);
                    self.waves.record_kill();
                    out_events.push(Event::EnemyKilled { enemy: id, reward });
                }
                EnemyOutcome::Escaped => {
                    self.economy.lives = self.economy.lives.saturating_sub(1);
                    out_events.push(Event::EnemyEscaped {
                        enemy: id,
                        lives_left: self.economy.lives,
                    });
                }
            }
        }
        if self.economy.lives == 0 {
            let waves_survived = self.waves.wave_index();
            self.play_state = PlayState::Defeat { waves_survived };
            out_events.push(Event::GameLost { waves_survived });
        }
    }

    fn advance_wave_if_clear(&mut self, out_events: &mut Vec<Event>) {
        if !matches!(self.play_state, PlayState::Running) {
            return;
        }
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let wave_count = plan.wave_count();
        if !self.waves.is_exhausted() || !self.enemies.is_empty() {
            return;
        }
        let next = self.waves.wave_index().saturating_add(1);
        if next >= wave_count {
            self.play_state = PlayState::Victory {
                waves_survived: wave_count,
            };
            out_events.push(Event::GameWon {
                waves_survived: wave_count,
            });
        } else {
            self.start_wave(next, out_events);
        }
    }

    fn build_tower(&mut self, tile: TileCoord, tower_type: TowerTypeId, out_events: &mut Vec<Event>) {
        let reject = |reason| Event::BuildRejected { tile, reason };
        let Some(kind) = self.plan.as_ref().and_then(|plan| plan.grid().kind_at(tile)) else {
            out_events.push(reject(BuildRejection::OutOfBounds));
            return;
        };
        if !kind.is_buildable() {
            out_events.push(reject(BuildRejection::NotBuildable));
            return;
        }
        if self.towers.is_occupied(tile) {
            out_events.push(reject(BuildRejection::Occupied));
            return;
        }
        let Some(price) = self
            .plan
            .as_ref()
            .and_then(|plan| plan.tower(tower_type))
            .map(|spec| spec.price)
        else {
            out_events.push(reject(BuildRejection::UnknownTowerType));
            return;
        };
        if self.economy.coins < price {
            out_events.push(reject(BuildRejection::InsufficientCoins {
                price,
                coins: self.economy.coins,
            }));
            return;
        }
        let Some(center) = self.plan.as_ref().map(|plan| plan.grid().tile_center(tile)) else {
            return;
        };
        self.economy.coins -= price;
        let tower = self.towers.build(tile, center, tower_type);
        out_events.push(Event::TowerBuilt {
            tower,
            tile,
            tower_type,
            price,
        });
    }

    fn sell_tower(&mut self, tile: TileCoord, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.remove_at(tile) else {
            out_events.push(Event::SellRejected {
                tile,
                reason: SellRejection::NoTower,
            });
            return;
        };
        let refund = self
            .plan
            .as_ref()
            .and_then(|plan| plan.tower(tower.tower_type))
            .map_or(0, |spec| spec.sell_price);
        self.economy.coins = self.economy.coins.saturating_add(refund);
        self.projectiles.release_owned(tower.id);
        out_events.push(Event::TowerSold {
            tower: tower.id,
            tile,
            refund,
        });
    }

    fn select_ability(&mut self, ability: AbilityId, out_events: &mut Vec<Event>) {
        if self.plan.as_ref().and_then(|plan| plan.ability(ability)).is_none() {
            out_events.push(Event::AbilityRejected {
                ability,
                reason: AbilityRejection::UnknownAbility,
            });
            return;
        }
        let remaining = self.abilities.remaining_cooldown(ability);
        if !remaining.is_zero() {
            out_events.push(Event::AbilityRejected {
                ability,
                reason: AbilityRejection::OnCooldown { remaining },
            });
            return;
        }
        self.abilities.select(ability);
        out_events.push(Event::AbilitySelected { ability });
    }

    // A rejected placement keeps the selection armed so the player can click
    // again; only cancellation or activation disarms it.
    fn place_ability(&mut self, tile: TileCoord, out_events: &mut Vec<Event>) {
        let Some(ability) = self.abilities.pending() else {
            out_events.push(Event::PlacementRejected {
                tile,
                reason: AbilityRejection::NoSelection,
            });
            return;
        };
        let Some((route, center_index)) = self.routes.route_containing(tile) else {
            out_events.push(Event::PlacementRejected {
                tile,
                reason: AbilityRejection::NotOnRoute,
            });
            return;
        };
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let Some(spec) = plan.ability(ability) else {
            return;
        };
        let Some(tiles) = self
            .routes
            .route(route)
            .and_then(|route_tiles| {
                let (start, end) =
                    centered_window(route_tiles.len(), center_index, spec.selection_count as usize)?;
                route_tiles.get(start..=end)
            })
            .map(<[TileCoord]>::to_vec)
        else {
            return;
        };
        self.abilities
            .activate(spec, tiles.clone(), plan.grid(), &mut self.enemies);
        out_events.push(Event::AbilityActivated { ability, tiles });
    }

    fn cancel_placement(&mut self, out_events: &mut Vec<Event>) {
        if let Some(ability) = self.abilities.cancel() {
            out_events.push(Event::PlacementCancelled { ability });
        }
    }

    fn buy_life(&mut self, out_events: &mut Vec<Event>) {
        let price = self.economy.next_life_price();
        if self.economy.coins < price {
            out_events.push(Event::PurchaseRejected {
                reason: PurchaseRejection::InsufficientCoins {
                    price,
                    coins: self.economy.coins,
                },
            });
            return;
        }
        self.economy.coins -= price;
        self.economy.lives = self.economy.lives.saturating_add(1);
        self.economy.life_purchases = self.economy.life_purchases.saturating_add(1);
        out_events.push(Event::LifePurchased {
            lives: self.economy.lives,
            price,
        });
    }

    fn pause(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.play_state, PlayState::Running) {
            self.play_state = PlayState::Paused;
            out_events.push(Event::Paused);
        }
    }

    fn resume(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.play_state, PlayState::Paused) {
            self.play_state = PlayState::Running;
            out_events.push(Event::Resumed);
        }
    }

    fn set_wave(&mut self, index: u32, out_events: &mut Vec<Event>) {
        let wave_count = self.plan.as_ref().map_or(0, LevelPlan::wave_count);
        if index >= wave_count {
            out_events.push(Event::WaveRejected {
                index,
                reason: WaveRejection::OutOfRange { index, wave_count },
            });
            return;
        }
        self.start_wave(index, out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { plan } => world.load_level(plan, out_events),
        Command::Tick { dt } => world.advance_time(dt, out_events),
        Command::Build { tile, tower_type } => world.build_tower(tile, tower_type, out_events),
        Command::Sell { tile } => world.sell_tower(tile, out_events),
        Command::SelectAbility { ability } => world.select_ability(ability, out_events),
        Command::PlaceAbility { tile } => world.place_ability(tile, out_events),
        Command::CancelPlacement => world.cancel_placement(out_events),
        Command::BuyLife => world.buy_life(out_events),
        Command::Pause => world.pause(out_events),
        Command::Resume => world.resume(out_events),
        Command::SetWave { index } => world.set_wave(index, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{World, LIFE_PRICES};
    use rampart_core::{
        AbilityStatusView, EconomySnapshot, EffectView, EnemyView, PlayState, ProjectileView,
        RouteId, TileCoord, TileGrid, TowerView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Coarse simulation phase the world is currently in.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Display name of the loaded level, if one committed.
    #[must_use]
    pub fn level_name(world: &World) -> Option<&str> {
        world.plan.as_ref().map(|plan| plan.name())
    }

    /// Tile grid of the loaded level, if one committed.
    #[must_use]
    pub fn tile_grid(world: &World) -> Option<&TileGrid> {
        world.plan.as_ref().map(|plan| plan.grid())
    }

    /// Enemy routes in ascending label order, for path overlays.
    #[must_use]
    pub fn routes(world: &World) -> Vec<(RouteId, &[TileCoord])> {
        world.routes.iter().collect()
    }

    /// Captures a read-only view of the enemies on the playfield.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.values().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of the constructed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.snapshots(|tower_type| {
            world
                .plan
                .as_ref()
                .and_then(|plan| plan.tower(tower_type))
                .map_or(0.0, |spec| spec.range)
        }))
    }

    /// Captures a read-only view of the in-flight projectiles.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.projectiles.snapshots())
    }

    /// Captures a read-only view of the placed ability effects.
    #[must_use]
    pub fn effect_view(world: &World) -> EffectView {
        EffectView::from_snapshots(match world.plan.as_ref() {
            Some(plan) => world.abilities.effect_snapshots(plan.abilities()),
            None => Vec::new(),
        })
    }

    /// Captures the cooldown and selection state of every ability.
    #[must_use]
    pub fn ability_statuses(world: &World) -> AbilityStatusView {
        AbilityStatusView::from_statuses(world.abilities.statuses())
    }

    /// Coins, lives, and wave progress captured in a single read.
    #[must_use]
    pub fn economy(world: &World) -> EconomySnapshot {
        let wave_index = world.waves.wave_index();
        let (wave_count, wave_enemy_total) = world.plan.as_ref().map_or((0, 0), |plan| {
            let total = usize::try_from(wave_index)
                .ok()
                .and_then(|position| plan.waves().get(position))
                .map_or(0, |wave| wave.enemy_total());
            (plan.wave_count(), total)
        });
        EconomySnapshot {
            coins: world.economy.coins,
            lives: world.economy.lives,
            wave_index,
            wave_count,
            kills_this_wave: world.waves.kills(),
            wave_enemy_total,
            next_life_price: world.economy.next_life_price(),
        }
    }

    /// Price ladder applied to successive extra-life purchases.
    #[must_use]
    pub fn life_price_ladder() -> &'static [u32] {
        &LIFE_PRICES
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Economy {
    coins: u32,
    lives: u32,
    life_purchases: u32,
}

impl Economy {
    fn next_life_price(&self) -> u32 {
        let rung = usize::try_from(self.life_purchases)
            .map_or(LIFE_PRICES.len() - 1, |count| count.min(LIFE_PRICES.len() - 1));
        LIFE_PRICES[rung]
    }
}

#[derive(Clone, Copy, Debug)]
enum EnemyOutcome {
    Killed { reward: u32 },
    Escaped,
}

fn first_unroutable_wave_route(plan: &LevelPlan, routes: &RouteSet) -> Option<RouteId> {
    plan.waves()
        .iter()
        .flat_map(|wave| wave.groups.iter())
        .map(|group| group.route)
        .find(|route| routes.route(*route).map_or(true, <[TileCoord]>::is_empty))
}
