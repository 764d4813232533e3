//! Level document schema, defaults, and validation.
//!
//! Raw [`LevelData`] mirrors the JSON emitted by the level editor, including
//! its field spellings and optional fields. [`LevelData::validate`] turns the
//! raw document into a [`LevelPlan`] with every default resolved, every unit
//! converted, and every configuration mistake reported as a [`LevelError`]
//! instead of surfacing later as a mid-game fault.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::{AbilityId, GridError, RouteId, TileGrid, TileKind, TowerTypeId};

/// Top-level document holding one or more playable maps.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelDocument {
    /// Maps contained in the document, in authored order.
    pub maps: Vec<LevelData>,
}

/// Raw map entry as authored by the level editor.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelData {
    /// Display name of the map.
    #[serde(default)]
    pub name: String,
    /// Coins the player starts with.
    #[serde(rename = "startingCoins", default = "default_starting_coins")]
    pub starting_coins: u32,
    /// Lives the player starts with.
    #[serde(rename = "startingLives", default = "default_starting_lives")]
    pub starting_lives: u32,
    /// Side length of a square tile in world units.
    #[serde(rename = "tileSize", default = "default_tile_size")]
    pub tile_size: f32,
    /// Tile tokens, one row per entry, outermost rows first.
    #[serde(default)]
    pub layout: Vec<Vec<String>>,
    /// Tower catalog keyed by the editor's catalog key.
    #[serde(rename = "towerTypes", default)]
    pub tower_types: BTreeMap<String, TowerData>,
    /// Ability definitions available on this map.
    #[serde(default)]
    pub abilities: Vec<AbilityData>,
    /// Wave schedule; the editor stores it under `levels`.
    #[serde(rename = "levels", default)]
    pub waves: Vec<WaveData>,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            name: String::new(),
            starting_coins: default_starting_coins(),
            starting_lives: default_starting_lives(),
            tile_size: default_tile_size(),
            layout: Vec::new(),
            tower_types: BTreeMap::new(),
            abilities: Vec::new(),
            waves: Vec::new(),
        }
    }
}

/// Raw tower catalog entry.
#[derive(Clone, Debug, Deserialize)]
pub struct TowerData {
    /// Display name shown in logs and menus.
    #[serde(default)]
    pub name: String,
    /// Purchase price in coins.
    pub price: u32,
    /// Hit points removed per projectile impact.
    #[serde(default = "default_tower_damage")]
    pub damage: u32,
    /// Milliseconds between shots.
    #[serde(rename = "fireRate", default = "default_fire_rate")]
    pub fire_rate: u64,
    /// Targeting radius in world units.
    #[serde(default = "default_tower_range")]
    pub range: f32,
    /// Projectile speed in tiles per second.
    #[serde(default = "default_projectile_speed")]
    pub speed: f32,
    /// Refund granted on sale; defaults to half the price.
    #[serde(rename = "sellPrice", default)]
    pub sell_price: Option<u32>,
    /// Flag color rendered on the tower.
    #[serde(default = "default_tower_color")]
    pub color: String,
}

impl Default for TowerData {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: 1,
            damage: default_tower_damage(),
            fire_rate: default_fire_rate(),
            range: default_tower_range(),
            speed: default_projectile_speed(),
            sell_price: None,
            color: default_tower_color(),
        }
    }
}

/// Raw ability definition.
#[derive(Clone, Debug, Deserialize)]
pub struct AbilityData {
    /// Registry key that selects the ability behavior.
    pub id: String,
    /// Display name shown on the ability card.
    #[serde(default = "default_ability_name")]
    pub name: String,
    /// Number of route tiles covered by one placement.
    #[serde(rename = "selectionCount", default = "default_selection_count")]
    pub selection_count: u32,
    /// Hit points removed per damage tick.
    #[serde(default = "default_ability_damage")]
    pub damage: u32,
    /// Milliseconds between damage ticks while the effect is active.
    #[serde(default = "default_damage_every")]
    pub damage_every: u64,
    /// Milliseconds before the ability can be used again, counted from
    /// activation and inclusive of the effect duration.
    #[serde(default = "default_ability_cooldown")]
    pub cooldown: u64,
    /// Milliseconds the placed effect stays on the ground.
    #[serde(rename = "effectDuration", default = "default_effect_duration")]
    pub effect_duration: u64,
    /// Overlay color of the placed effect.
    #[serde(default = "default_ability_color")]
    pub color: String,
    /// Presentation hints for the ability card.
    #[serde(default)]
    pub ui: AbilityUi,
}

impl Default for AbilityData {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: default_ability_name(),
            selection_count: default_selection_count(),
            damage: default_ability_damage(),
            damage_every: default_damage_every(),
            cooldown: default_ability_cooldown(),
            effect_duration: default_effect_duration(),
            color: default_ability_color(),
            ui: AbilityUi::default(),
        }
    }
}

/// Presentation hints attached to an ability definition.
#[derive(Clone, Debug, Deserialize)]
pub struct AbilityUi {
    /// Icon glyph shown on the ability card.
    #[serde(default = "default_ability_icon")]
    pub icon: String,
}

impl Default for AbilityUi {
    fn default() -> Self {
        Self {
            icon: default_ability_icon(),
        }
    }
}

/// Raw wave entry holding the spawn groups of one wave.
#[derive(Clone, Debug, Deserialize)]
pub struct WaveData {
    /// Spawn groups processed in order until each is exhausted.
    #[serde(default)]
    pub enemies: Vec<SpawnGroupData>,
}

/// Raw spawn group entry.
#[derive(Clone, Debug, Deserialize)]
pub struct SpawnGroupData {
    /// Display name of the enemy kind.
    #[serde(rename = "type", default = "default_enemy_type")]
    pub enemy_type: String,
    /// Number of enemies the group spawns.
    pub count: u32,
    /// Hit points each enemy spawns with.
    #[serde(default = "default_enemy_health")]
    pub health: u32,
    /// Walking speed in tiles per second.
    #[serde(default = "default_enemy_speed")]
    pub speed: f32,
    /// Route label such as `S1E1` naming the start and end pair.
    #[serde(default = "default_group_path")]
    pub path: String,
    /// Milliseconds between spawns from this group.
    #[serde(default = "default_spawn_interval")]
    pub interval: u64,
    /// Coins awarded per enemy killed.
    #[serde(rename = "coinReward", default = "default_coin_reward")]
    pub coin_reward: u32,
}

impl Default for SpawnGroupData {
    fn default() -> Self {
        Self {
            enemy_type: default_enemy_type(),
            count: 1,
            health: default_enemy_health(),
            speed: default_enemy_speed(),
            path: default_group_path(),
            interval: default_spawn_interval(),
            coin_reward: default_coin_reward(),
        }
    }
}

fn default_starting_coins() -> u32 {
    10
}

fn default_starting_lives() -> u32 {
    10
}

fn default_tile_size() -> f32 {
    80.0
}

fn default_tower_damage() -> u32 {
    1
}

fn default_fire_rate() -> u64 {
    1200
}

fn default_tower_range() -> f32 {
    150.0
}

fn default_projectile_speed() -> f32 {
    3.0
}

fn default_tower_color() -> String {
    String::from("#4682b4")
}

fn default_ability_name() -> String {
    String::from("Ability")
}

fn default_selection_count() -> u32 {
    3
}

fn default_ability_damage() -> u32 {
    50
}

fn default_damage_every() -> u64 {
    500
}

fn default_ability_cooldown() -> u64 {
    30_000
}

fn default_effect_duration() -> u64 {
    5_000
}

fn default_ability_color() -> String {
    String::from("#ff0")
}

fn default_ability_icon() -> String {
    String::from("\u{2728}")
}

fn default_enemy_type() -> String {
    String::from("basic")
}

fn default_enemy_health() -> u32 {
    10
}

fn default_enemy_speed() -> f32 {
    1.0
}

fn default_group_path() -> String {
    String::from("S1E1")
}

fn default_spawn_interval() -> u64 {
    800
}

fn default_coin_reward() -> u32 {
    1
}

/// Reasons a raw level document fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The tile layout could not be assembled into a grid.
    #[error("layout is malformed: {0}")]
    Grid(#[from] GridError),
    /// The layout contained a token outside the supported set.
    #[error("unknown tile token {token:?} at column {column}, row {row}")]
    UnknownTile {
        /// Token text as written in the layout.
        token: String,
        /// Zero-based column of the offending token.
        column: u32,
        /// Zero-based row of the offending token.
        row: u32,
    },
    /// Two start tiles carry the same route label.
    #[error("route {route:?} has more than one start tile")]
    DuplicateStart {
        /// Label shared by the conflicting start tiles.
        route: RouteId,
    },
    /// Two end tiles carry the same route label.
    #[error("route {route:?} has more than one end tile")]
    DuplicateEnd {
        /// Label shared by the conflicting end tiles.
        route: RouteId,
    },
    /// The map schedules no waves at all.
    #[error("map must schedule at least one wave")]
    NoWaves,
    /// A tower catalog entry holds an out-of-range value.
    #[error("tower {key:?} has an invalid {field}")]
    InvalidTowerField {
        /// Catalog key of the offending tower entry.
        key: String,
        /// Name of the offending field.
        field: &'static str,
    },
    /// A spawn group holds an out-of-range value.
    #[error("wave {wave}, group {group} has an invalid {field}")]
    InvalidWaveField {
        /// Zero-based index of the offending wave.
        wave: u32,
        /// Zero-based index of the offending group within the wave.
        group: u32,
        /// Name of the offending field.
        field: &'static str,
    },
    /// An ability definition holds an out-of-range value.
    #[error("ability {id:?} has an invalid {field}")]
    InvalidAbilityField {
        /// Registry key of the offending ability.
        id: String,
        /// Name of the offending field.
        field: &'static str,
    },
    /// A spawn group names a route label that cannot be parsed.
    #[error("route label {label:?} is not of the form S<n>E<n>")]
    BadRouteLabel {
        /// Label text as written in the spawn group.
        label: String,
    },
    /// A spawn group references a route with no start tile in the layout.
    #[error("route {route:?} has no start tile in the layout")]
    MissingStart {
        /// Route referenced by the spawn group.
        route: RouteId,
    },
    /// A spawn group references a route with no end tile in the layout.
    #[error("route {route:?} has no end tile in the layout")]
    MissingEnd {
        /// Route referenced by the spawn group.
        route: RouteId,
    },
    /// Two ability definitions share a registry key.
    #[error("ability {id:?} is defined more than once")]
    DuplicateAbility {
        /// Registry key shared by the conflicting definitions.
        id: String,
    },
    /// An ability definition names a registry key with no behavior.
    #[error("ability {id:?} is not a known ability kind")]
    UnknownAbilityKind {
        /// Registry key as written in the definition.
        id: String,
    },
    /// No walkable path connects a route's start tile to its end tile.
    #[error("route {route:?} has no walkable path from start to end")]
    UnreachableRoute {
        /// Route whose tiles do not connect.
        route: RouteId,
    },
}

/// Closed set of ability behaviors the engine implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    /// Damage-over-time floor effect placed on a window of route tiles.
    LavaFloor,
}

impl AbilityKind {
    fn from_registry_key(key: &str) -> Option<Self> {
        match key {
            "lava_floor" | "lava_floor_alt" => Some(Self::LavaFloor),
            _ => None,
        }
    }
}

/// Validated tower catalog entry with defaults resolved and units converted.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSpec {
    /// Identifier assigned to the entry during validation.
    pub id: TowerTypeId,
    /// Catalog key the editor used for this entry.
    pub key: String,
    /// Display name shown in logs and menus.
    pub name: String,
    /// Purchase price in coins.
    pub price: u32,
    /// Hit points removed per projectile impact.
    pub damage: u32,
    /// Cooldown between shots.
    pub fire_rate: Duration,
    /// Targeting radius in world units.
    pub range: f32,
    /// Projectile speed in world units per millisecond.
    pub projectile_speed: f32,
    /// Refund granted on sale.
    pub sell_price: u32,
    /// Flag color rendered on the tower.
    pub color: String,
}

/// Validated ability definition with defaults resolved and units converted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbilitySpec {
    /// Identifier assigned to the definition during validation.
    pub id: AbilityId,
    /// Registry key the editor used for this definition.
    pub key: String,
    /// Behavior implemented by the definition.
    pub kind: AbilityKind,
    /// Display name shown on the ability card.
    pub name: String,
    /// Number of route tiles covered by one placement.
    pub selection_count: u32,
    /// Hit points removed per damage tick.
    pub damage: u32,
    /// Interval between damage ticks while the effect is active.
    pub damage_every: Duration,
    /// Cooldown counted from activation, inclusive of the effect duration.
    pub cooldown: Duration,
    /// Time the placed effect stays on the ground.
    pub effect_duration: Duration,
    /// Overlay color of the placed effect.
    pub color: String,
    /// Icon glyph shown on the ability card.
    pub icon: String,
}

/// Validated spawn group with defaults resolved and units converted.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnGroupPlan {
    /// Display name of the enemy kind.
    pub enemy_type: String,
    /// Number of enemies the group spawns.
    pub count: u32,
    /// Hit points each enemy spawns with.
    pub health: u32,
    /// Walking speed in world units per millisecond.
    pub speed: f32,
    /// Route the group's enemies walk.
    pub route: RouteId,
    /// Interval between spawns from this group.
    pub interval: Duration,
    /// Coins awarded per enemy killed.
    pub coin_reward: u32,
}

/// Validated wave holding its spawn groups in authored order.
#[derive(Clone, Debug, PartialEq)]
pub struct WavePlan {
    /// Spawn groups processed in order until each is exhausted.
    pub groups: Vec<SpawnGroupPlan>,
}

impl WavePlan {
    /// Total number of enemies the wave will spawn.
    #[must_use]
    pub fn enemy_total(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// Fully validated level ready to be loaded into the world.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelPlan {
    name: String,
    starting_coins: u32,
    starting_lives: u32,
    grid: TileGrid,
    towers: Vec<TowerSpec>,
    abilities: Vec<AbilitySpec>,
    waves: Vec<WavePlan>,
}

impl LevelPlan {
    /// Display name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coins the player starts with.
    #[must_use]
    pub const fn starting_coins(&self) -> u32 {
        self.starting_coins
    }

    /// Lives the player starts with.
    #[must_use]
    pub const fn starting_lives(&self) -> u32 {
        self.starting_lives
    }

    /// Tile grid parsed from the layout tokens.
    #[must_use]
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Tower catalog in catalog-key order.
    #[must_use]
    pub fn towers(&self) -> &[TowerSpec] {
        &self.towers
    }

    /// Looks up a tower catalog entry by its assigned identifier.
    #[must_use]
    pub fn tower(&self, id: TowerTypeId) -> Option<&TowerSpec> {
        usize::try_from(id.get()).ok().and_then(|index| self.towers.get(index))
    }

    /// Looks up a tower catalog entry by its editor key.
    #[must_use]
    pub fn tower_by_key(&self, key: &str) -> Option<&TowerSpec> {
        self.towers.iter().find(|spec| spec.key == key)
    }

    /// Ability definitions in authored order.
    #[must_use]
    pub fn abilities(&self) -> &[AbilitySpec] {
        &self.abilities
    }

    /// Looks up an ability definition by its assigned identifier.
    #[must_use]
    pub fn ability(&self, id: AbilityId) -> Option<&AbilitySpec> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.abilities.get(index))
    }

    /// Wave schedule in authored order.
    #[must_use]
    pub fn waves(&self) -> &[WavePlan] {
        &self.waves
    }

    /// Number of waves the level schedules.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        self.waves.len() as u32
    }
}

impl LevelData {
    /// Validates the raw document, resolving defaults and converting units.
    pub fn validate(&self) -> Result<LevelPlan, LevelError> {
        let grid = self.build_grid()?;
        let towers = self.validate_towers()?;
        let abilities = self.validate_abilities()?;
        let waves = self.validate_waves(&grid)?;
        Ok(LevelPlan {
            name: self.name.clone(),
            starting_coins: self.starting_coins,
            starting_lives: self.starting_lives,
            grid,
            towers,
            abilities,
            waves,
        })
    }

    fn build_grid(&self) -> Result<TileGrid, LevelError> {
        let mut rows = Vec::with_capacity(self.layout.len());
        for (row_index, row) in self.layout.iter().enumerate() {
            let mut kinds = Vec::with_capacity(row.len());
            for (column_index, token) in row.iter().enumerate() {
                let kind =
                    TileKind::from_token(token).ok_or_else(|| LevelError::UnknownTile {
                        token: token.clone(),
                        column: column_index as u32,
                        row: row_index as u32,
                    })?;
                kinds.push(kind);
            }
            rows.push(kinds);
        }
        let grid = TileGrid::from_rows(rows, self.tile_size)?;

        let mut seen_starts = BTreeSet::new();
        for (route, _) in grid.start_tiles() {
            if !seen_starts.insert(route) {
                return Err(LevelError::DuplicateStart { route });
            }
        }
        let mut seen_ends = BTreeSet::new();
        for (route, _) in grid.end_tiles() {
            if !seen_ends.insert(route) {
                return Err(LevelError::DuplicateEnd { route });
            }
        }
        Ok(grid)
    }

    fn validate_towers(&self) -> Result<Vec<TowerSpec>, LevelError> {
        let units_per_ms = self.tile_size / 1_000.0;
        let mut towers = Vec::with_capacity(self.tower_types.len());
        for (index, (key, data)) in self.tower_types.iter().enumerate() {
            let invalid = |field| LevelError::InvalidTowerField {
                key: key.clone(),
                field,
            };
            if data.price == 0 {
                return Err(invalid("price"));
            }
            if data.damage == 0 {
                return Err(invalid("damage"));
            }
            if data.fire_rate == 0 {
                return Err(invalid("fireRate"));
            }
            if !(data.range.is_finite() && data.range > 0.0) {
                return Err(invalid("range"));
            }
            if !(data.speed.is_finite() && data.speed > 0.0) {
                return Err(invalid("speed"));
            }
            towers.push(TowerSpec {
                id: TowerTypeId::new(index as u32),
                key: key.clone(),
                name: data.name.clone(),
                price: data.price,
                damage: data.damage,
                fire_rate: Duration::from_millis(data.fire_rate),
                range: data.range,
                projectile_speed: data.speed * units_per_ms,
                sell_price: data.sell_price.unwrap_or(data.price / 2),
                color: data.color.clone(),
            });
        }
        Ok(towers)
    }

    fn validate_abilities(&self) -> Result<Vec<AbilitySpec>, LevelError> {
        let mut seen = BTreeSet::new();
        let mut abilities = Vec::with_capacity(self.abilities.len());
        for (index, data) in self.abilities.iter().enumerate() {
            if !seen.insert(data.id.as_str()) {
                return Err(LevelError::DuplicateAbility {
                    id: data.id.clone(),
                });
            }
            let kind = AbilityKind::from_registry_key(&data.id).ok_or_else(|| {
                LevelError::UnknownAbilityKind {
                    id: data.id.clone(),
                }
            })?;
            let invalid = |field| LevelError::InvalidAbilityField {
                id: data.id.clone(),
                field,
            };
            if data.selection_count == 0 {
                return Err(invalid("selectionCount"));
            }
            if data.damage == 0 {
                return Err(invalid("damage"));
            }
            if data.damage_every == 0 {
                return Err(invalid("damage_every"));
            }
            if data.effect_duration == 0 {
                return Err(invalid("effectDuration"));
            }
            if data.cooldown < data.effect_duration {
                return Err(invalid("cooldown"));
            }
            abilities.push(AbilitySpec {
                id: AbilityId::new(index as u32),
                key: data.id.clone(),
                kind,
                name: data.name.clone(),
                selection_count: data.selection_count,
                damage: data.damage,
                damage_every: Duration::from_millis(data.damage_every),
                cooldown: Duration::from_millis(data.cooldown),
                effect_duration: Duration::from_millis(data.effect_duration),
                color: data.color.clone(),
                icon: data.ui.icon.clone(),
            });
        }
        Ok(abilities)
    }

    fn validate_waves(&self, grid: &TileGrid) -> Result<Vec<WavePlan>, LevelError> {
        if self.waves.is_empty() {
            return Err(LevelError::NoWaves);
        }
        let units_per_ms = self.tile_size / 1_000.0;
        let starts: BTreeSet<RouteId> =
            grid.start_tiles().into_iter().map(|(route, _)| route).collect();
        let ends: BTreeSet<RouteId> =
            grid.end_tiles().into_iter().map(|(route, _)| route).collect();

        let mut waves = Vec::with_capacity(self.waves.len());
        for (wave_index, wave) in self.waves.iter().enumerate() {
            let mut groups = Vec::with_capacity(wave.enemies.len());
            for (group_index, data) in wave.enemies.iter().enumerate() {
                let invalid = |field| LevelError::InvalidWaveField {
                    wave: wave_index as u32,
                    group: group_index as u32,
                    field,
                };
                if data.count == 0 {
                    return Err(invalid("count"));
                }
                if data.health == 0 {
                    return Err(invalid("health"));
                }
                if !(data.speed.is_finite() && data.speed > 0.0) {
                    return Err(invalid("speed"));
                }
                if data.interval == 0 {
                    return Err(invalid("interval"));
                }
                let route = parse_route_label(&data.path).ok_or_else(|| {
                    LevelError::BadRouteLabel {
                        label: data.path.clone(),
                    }
                })?;
                if !starts.contains(&route) {
                    return Err(LevelError::MissingStart { route });
                }
                if !ends.contains(&route) {
                    return Err(LevelError::MissingEnd { route });
                }
                groups.push(SpawnGroupPlan {
                    enemy_type: data.enemy_type.clone(),
                    count: data.count,
                    health: data.health,
                    speed: data.speed * units_per_ms,
                    route,
                    interval: Duration::from_millis(data.interval),
                    coin_reward: data.coin_reward,
                });
            }
            waves.push(WavePlan { groups });
        }
        Ok(waves)
    }
}

/// Parses a route label of the form `S<n>E<n>` into its route identifier.
///
/// The start and end numbers must match; `S1E2` is not a valid label.
#[must_use]
pub fn parse_route_label(label: &str) -> Option<RouteId> {
    let rest = label.strip_prefix(['S', 's'])?;
    let split = rest.find(['E', 'e'])?;
    let start = rest[..split].parse::<u32>().ok()?;
    let end = rest[split + 1..].parse::<u32>().ok()?;
    (start == end).then_some(RouteId::new(start))
}

#[cfg(test)]
mod tests {
    use super::{
        parse_route_label, AbilityData, AbilityKind, LevelData, LevelDocument, LevelError,
        SpawnGroupData, TowerData, WaveData,
    };
    use crate::{GridError, RouteId, TileCoord, TowerTypeId};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn straight_layout() -> Vec<Vec<String>> {
        let rows = [
            ["-", "X", "X", "X", "-"],
            ["S1", "O", "O", "O", "E1"],
            ["-", "X", "X", "X", "-"],
        ];
        rows.iter()
            .map(|row| row.iter().map(|token| (*token).to_string()).collect())
            .collect()
    }

    fn sample_data() -> LevelData {
        let mut tower_types = BTreeMap::new();
        let _ = tower_types.insert(
            String::from("001"),
            TowerData {
                name: String::from("Basic Tower"),
                price: 5,
                damage: 2,
                ..TowerData::default()
            },
        );
        LevelData {
            name: String::from("Test Map"),
            layout: straight_layout(),
            tower_types,
            abilities: vec![AbilityData {
                id: String::from("lava_floor"),
                ..AbilityData::default()
            }],
            waves: vec![WaveData {
                enemies: vec![SpawnGroupData {
                    count: 3,
                    ..SpawnGroupData::default()
                }],
            }],
            ..LevelData::default()
        }
    }

    #[test]
    fn route_labels_parse_when_numbers_match() {
        assert_eq!(parse_route_label("S1E1"), Some(RouteId::new(1)));
        assert_eq!(parse_route_label("s2e2"), Some(RouteId::new(2)));
        assert_eq!(parse_route_label("S12E12"), Some(RouteId::new(12)));
    }

    #[test]
    fn mismatched_route_labels_are_rejected() {
        assert_eq!(parse_route_label("S1E2"), None);
        assert_eq!(parse_route_label("E1S1"), None);
        assert_eq!(parse_route_label("S1"), None);
        assert_eq!(parse_route_label(""), None);
    }

    #[test]
    fn sample_data_validates() {
        let plan = sample_data().validate().expect("plan validates");
        assert_eq!(plan.name(), "Test Map");
        assert_eq!(plan.starting_coins(), 10);
        assert_eq!(plan.starting_lives(), 10);
        assert_eq!(plan.wave_count(), 1);
        assert_eq!(plan.waves()[0].enemy_total(), 3);
        assert_eq!(plan.towers().len(), 1);
        assert_eq!(plan.towers()[0].key, "001");
        assert_eq!(plan.towers()[0].sell_price, 2);
        assert_eq!(plan.abilities()[0].kind, AbilityKind::LavaFloor);
    }

    #[test]
    fn tower_speed_converts_to_units_per_millisecond() {
        let plan = sample_data().validate().expect("plan validates");
        let tower = &plan.towers()[0];
        assert!((tower.projectile_speed - 3.0 * 80.0 / 1_000.0).abs() < 1e-6);
        assert_eq!(tower.fire_rate, Duration::from_millis(1_200));
    }

    #[test]
    fn enemy_speed_converts_to_units_per_millisecond() {
        let plan = sample_data().validate().expect("plan validates");
        let group = &plan.waves()[0].groups[0];
        assert!((group.speed - 80.0 / 1_000.0).abs() < 1e-6);
        assert_eq!(group.interval, Duration::from_millis(800));
    }

    #[test]
    fn unknown_tokens_are_reported_with_their_position() {
        let mut data = sample_data();
        data.layout[2][1] = String::from("Q");
        assert_eq!(
            data.validate(),
            Err(LevelError::UnknownTile {
                token: String::from("Q"),
                column: 1,
                row: 2,
            })
        );
    }

    #[test]
    fn ragged_layouts_surface_the_grid_error() {
        let mut data = sample_data();
        let _ = data.layout[1].pop();
        assert_eq!(
            data.validate(),
            Err(LevelError::Grid(GridError::RaggedRow {
                row: 1,
                len: 4,
                expected: 5,
            }))
        );
    }

    #[test]
    fn duplicate_start_labels_are_rejected() {
        let mut data = sample_data();
        data.layout[0][0] = String::from("S1");
        assert_eq!(
            data.validate(),
            Err(LevelError::DuplicateStart {
                route: RouteId::new(1),
            })
        );
    }

    #[test]
    fn missing_waves_are_rejected() {
        let mut data = sample_data();
        data.waves.clear();
        assert_eq!(data.validate(), Err(LevelError::NoWaves));
    }

    #[test]
    fn zero_count_groups_are_rejected() {
        let mut data = sample_data();
        data.waves[0].enemies[0].count = 0;
        assert_eq!(
            data.validate(),
            Err(LevelError::InvalidWaveField {
                wave: 0,
                group: 0,
                field: "count",
            })
        );
    }

    #[test]
    fn groups_referencing_absent_routes_are_rejected() {
        let mut data = sample_data();
        data.waves[0].enemies[0].path = String::from("S2E2");
        assert_eq!(
            data.validate(),
            Err(LevelError::MissingStart {
                route: RouteId::new(2),
            })
        );
    }

    #[test]
    fn unknown_ability_kinds_are_rejected() {
        let mut data = sample_data();
        data.abilities[0].id = String::from("meteor_strike");
        assert_eq!(
            data.validate(),
            Err(LevelError::UnknownAbilityKind {
                id: String::from("meteor_strike"),
            })
        );
    }

    #[test]
    fn cooldowns_shorter_than_the_effect_are_rejected() {
        let mut data = sample_data();
        data.abilities[0].cooldown = 1_000;
        data.abilities[0].effect_duration = 5_000;
        assert_eq!(
            data.validate(),
            Err(LevelError::InvalidAbilityField {
                id: String::from("lava_floor"),
                field: "cooldown",
            })
        );
    }

    #[test]
    fn editor_documents_deserialize_with_defaults() {
        let text = r##"{
            "maps": [
                {
                    "name": "Crossing",
                    "startingCoins": 100,
                    "startingLives": 50,
                    "tileSize": 60,
                    "layout": [
                        ["-", "X", "X", "X", "-"],
                        ["S1", "O", "O", "O", "E1"],
                        ["-", "X", "X", "X", "-"]
                    ],
                    "towerTypes": {
                        "001": {
                            "name": "Basic Tower",
                            "price": 1,
                            "damage": 50,
                            "fireRate": 400,
                            "range": 2500,
                            "color": "#468bb0",
                            "sellPrice": 1,
                            "speed": 2
                        }
                    },
                    "abilities": [
                        {
                            "_comment": "cooldown includes effectDuration",
                            "id": "lava_floor",
                            "name": "Lava Floor",
                            "type": "targeted",
                            "selectionCount": 7,
                            "damage": 250,
                            "damage_every": 250,
                            "cooldown": 10000,
                            "effectDuration": 5000,
                            "color": "rgba(245, 164, 66, 0.6)",
                            "ui": { "icon": "X" }
                        }
                    ],
                    "levels": [
                        {
                            "level": 1,
                            "enemies": [
                                {
                                    "type": "basic",
                                    "count": 5,
                                    "health": 100,
                                    "speed": 1,
                                    "path": "S1E1",
                                    "interval": 1000,
                                    "coinReward": 1
                                }
                            ]
                        }
                    ]
                }
            ]
        }"##;
        let document: LevelDocument = serde_json::from_str(text).expect("document parses");
        assert_eq!(document.maps.len(), 1);
        let plan = document.maps[0].validate().expect("map validates");
        assert_eq!(plan.name(), "Crossing");
        assert_eq!(plan.starting_coins(), 100);
        assert_eq!(plan.grid().columns(), 5);
        assert_eq!(plan.grid().rows(), 3);
        assert!((plan.grid().tile_length() - 60.0).abs() < f32::EPSILON);
        let tower = plan.tower(TowerTypeId::new(0)).expect("tower exists");
        assert_eq!(tower.name, "Basic Tower");
        assert_eq!(tower.sell_price, 1);
        let ability = &plan.abilities()[0];
        assert_eq!(ability.selection_count, 7);
        assert_eq!(ability.cooldown, Duration::from_millis(10_000));
        assert_eq!(
            plan.grid().start_tiles(),
            vec![(RouteId::new(1), TileCoord::new(0, 1))]
        );
    }
}
