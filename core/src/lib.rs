#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that double as
//! the structured activity log. Read access flows exclusively through the
//! snapshot and view types declared here, so every consumer observes the same
//! deterministic ordering.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::level::{LevelError, LevelPlan};

pub mod level;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Rampart.";

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the level's tower catalog, assigned during validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerTypeId(u32);

impl TowerTypeId {
    /// Creates a new tower type identifier with the provided index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the catalog index of the tower type.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the level's ability list, assigned during validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityId(u32);

impl AbilityId {
    /// Creates a new ability identifier with the provided index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the list index of the ability definition.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Numeric label shared by a start tile and its matching end tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(u32);

impl RouteId {
    /// Creates a new route identifier with the provided label number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric label of the route.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Reports whether another tile shares an edge with this one.
    #[must_use]
    pub fn is_adjacent_to(&self, other: TileCoord) -> bool {
        let column_gap = self.column.abs_diff(other.column);
        let row_gap = self.row.abs_diff(other.row);
        column_gap + row_gap == 1
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the point in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component of the point in world units.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared distance to another point, in squared world units.
    #[must_use]
    pub fn distance_squared(&self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// Classification applied to every tile once the layout tokens are parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Void outside the playfield; neither walkable nor buildable.
    Empty,
    /// Road surface that enemies travel along.
    Path,
    /// Open ground that accepts tower construction.
    Buildable,
    /// Spawn tile labeled with the route it feeds.
    Start(RouteId),
    /// Exit tile labeled with the route it terminates.
    End(RouteId),
}

impl TileKind {
    /// Parses a single layout token, returning `None` for unknown tokens.
    ///
    /// Accepted tokens are `-`, `O`, `X`, and `S`/`E` followed by a route
    /// number; the start and end prefixes are matched case-insensitively the
    /// way the original level editor emitted them.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "-" => Some(Self::Empty),
            "O" => Some(Self::Path),
            "X" => Some(Self::Buildable),
            _ => {
                let (prefix, digits) = token.split_at(token.len().min(1));
                let route = digits.parse::<u32>().ok().map(RouteId::new)?;
                match prefix {
                    "S" | "s" => Some(Self::Start(route)),
                    "E" | "e" => Some(Self::End(route)),
                    _ => None,
                }
            }
        }
    }

    /// Reports whether enemies may traverse a tile of this kind.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Path | Self::Start(_) | Self::End(_))
    }

    /// Reports whether towers may be constructed on a tile of this kind.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Buildable)
    }
}

/// Reasons a tile layout cannot be turned into a [`TileGrid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GridError {
    /// The layout contained no rows or no columns.
    #[error("layout must contain at least one row and one column")]
    Empty,
    /// A row's length differed from the first row's length.
    #[error("row {row} holds {len} tiles but the first row holds {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of tiles found in the offending row.
        len: usize,
        /// Number of tiles in the first row.
        expected: usize,
    },
    /// The configured tile edge length was zero, negative, or non-finite.
    #[error("tile length must be a positive, finite number of world units")]
    InvalidTileLength,
    /// The layout exceeded the supported grid dimensions.
    #[error("layout exceeds the supported grid dimensions")]
    Oversized,
}

/// Immutable rectangular playfield parsed from layout tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    /// Builds a grid from parsed rows, rejecting ragged or empty layouts.
    pub fn from_rows(rows: Vec<Vec<TileKind>>, tile_length: f32) -> Result<Self, GridError> {
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(GridError::InvalidTileLength);
        }
        let expected = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || expected == 0 {
            return Err(GridError::Empty);
        }
        for (row, tiles) in rows.iter().enumerate() {
            if tiles.len() != expected {
                return Err(GridError::RaggedRow {
                    row,
                    len: tiles.len(),
                    expected,
                });
            }
        }

        let columns = u32::try_from(expected).map_err(|_| GridError::Oversized)?;
        let row_count = u32::try_from(rows.len()).map_err(|_| GridError::Oversized)?;
        let tiles = rows.into_iter().flatten().collect();
        Ok(Self {
            columns,
            rows: row_count,
            tile_length,
            tiles,
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Returns the kind of the tile at the provided coordinate, if in bounds.
    #[must_use]
    pub fn kind_at(&self, tile: TileCoord) -> Option<TileKind> {
        self.index(tile).and_then(|index| self.tiles.get(index)).copied()
    }

    /// Reports whether enemies may traverse the provided tile.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.kind_at(tile).is_some_and(TileKind::is_walkable)
    }

    /// Reports whether a tower may be constructed on the provided tile.
    ///
    /// The answer depends only on the immutable layout, never on towers
    /// built or sold elsewhere, so repeated calls always agree.
    #[must_use]
    pub fn is_buildable(&self, tile: TileCoord) -> bool {
        self.kind_at(tile).is_some_and(TileKind::is_buildable)
    }

    /// Center of the provided tile in world units.
    #[must_use]
    pub fn tile_center(&self, tile: TileCoord) -> WorldPoint {
        WorldPoint::new(
            (tile.column() as f32 + 0.5) * self.tile_length,
            (tile.row() as f32 + 0.5) * self.tile_length,
        )
    }

    /// Tile containing the provided world-space point, if any.
    #[must_use]
    pub fn tile_at_point(&self, point: WorldPoint) -> Option<TileCoord> {
        if !(point.x() >= 0.0 && point.y() >= 0.0) {
            return None;
        }
        let column = (point.x() / self.tile_length) as u32;
        let row = (point.y() / self.tile_length) as u32;
        let tile = TileCoord::new(column, row);
        self.index(tile).map(|_| tile)
    }

    /// Start tiles present in the layout, sorted by route label.
    #[must_use]
    pub fn start_tiles(&self) -> Vec<(RouteId, TileCoord)> {
        self.labeled_tiles(|kind| match kind {
            TileKind::Start(route) => Some(route),
            _ => None,
        })
    }

    /// End tiles present in the layout, sorted by route label.
    #[must_use]
    pub fn end_tiles(&self) -> Vec<(RouteId, TileCoord)> {
        self.labeled_tiles(|kind| match kind {
            TileKind::End(route) => Some(route),
            _ => None,
        })
    }

    fn labeled_tiles<F>(&self, mut select: F) -> Vec<(RouteId, TileCoord)>
    where
        F: FnMut(TileKind) -> Option<RouteId>,
    {
        let mut labeled: Vec<(RouteId, TileCoord)> = Vec::new();
        for (index, kind) in self.tiles.iter().enumerate() {
            if let Some(route) = select(*kind) {
                let column = index as u32 % self.columns;
                let row = index as u32 / self.columns;
                labeled.push((route, TileCoord::new(column, row)));
            }
        }
        labeled.sort_by_key(|(route, _)| *route);
        labeled
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() < self.columns && tile.row() < self.rows {
            let row = usize::try_from(tile.row()).ok()?;
            let column = usize::try_from(tile.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Coarse simulation phase reported alongside every query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// The simulation advances normally on every tick.
    Running,
    /// Tick commands are frozen until a resume command arrives.
    Paused,
    /// Every wave was cleared; the simulation is permanently frozen.
    Victory {
        /// Number of waves survived when the game was won.
        waves_survived: u32,
    },
    /// The defenders ran out of lives; the simulation is permanently frozen.
    Defeat {
        /// Number of fully cleared waves at the moment of defeat.
        waves_survived: u32,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the world content with a validated level plan.
    LoadLevel {
        /// Validated level produced by [`level::LevelData::validate`].
        plan: LevelPlan,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests construction of a tower on the provided tile.
    Build {
        /// Tile the tower should occupy.
        tile: TileCoord,
        /// Catalog entry describing the tower to construct.
        tower_type: TowerTypeId,
    },
    /// Requests demolition of the tower on the provided tile.
    Sell {
        /// Tile currently occupied by the tower to sell.
        tile: TileCoord,
    },
    /// Arms an ability so the next placement command targets it.
    SelectAbility {
        /// Ability definition the player wants to place.
        ability: AbilityId,
    },
    /// Confirms placement of the armed ability on the provided tile.
    PlaceAbility {
        /// Tile the player clicked while the ability was armed.
        tile: TileCoord,
    },
    /// Disarms the pending ability selection without consuming cooldown.
    CancelPlacement,
    /// Purchases one extra life at the current ladder price.
    BuyLife,
    /// Freezes tick processing until a resume command arrives.
    Pause,
    /// Resumes tick processing after a pause.
    Resume,
    /// Jumps to the wave with the provided index, resetting wave progress.
    SetWave {
        /// Zero-based index of the wave to activate.
        index: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a level plan replaced the world content.
    LevelLoaded {
        /// Display name of the loaded level.
        name: String,
        /// Number of waves the level schedules.
        waves: u32,
    },
    /// Reports that a level plan was refused at load time.
    LevelRejected {
        /// Specific configuration problem that blocked the load.
        reason: LevelError,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Zero-based index of the wave that started.
        index: u32,
        /// Total number of enemies the wave will spawn.
        enemies: u32,
    },
    /// Confirms that an enemy entered the playfield.
    EnemySpawned {
        /// Identifier assigned to the enemy by the world.
        enemy: EnemyId,
        /// Start tile of the route the enemy will follow.
        tile: TileCoord,
        /// Hit points the enemy spawned with.
        health: u32,
    },
    /// Confirms that an enemy was destroyed by damage.
    EnemyKilled {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Coins credited for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of its route.
    EnemyEscaped {
        /// Identifier of the escaped enemy.
        enemy: EnemyId,
        /// Lives remaining after the escape was charged.
        lives_left: u32,
    },
    /// Confirms that a tower was constructed.
    TowerBuilt {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Tile the tower occupies.
        tile: TileCoord,
        /// Catalog entry the tower was built from.
        tower_type: TowerTypeId,
        /// Coins deducted for the construction.
        price: u32,
    },
    /// Reports that a build request was rejected.
    BuildRejected {
        /// Tile provided in the build request.
        tile: TileCoord,
        /// Specific reason the build failed.
        reason: BuildRejection,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the demolished tower.
        tower: TowerId,
        /// Tile the tower previously occupied.
        tile: TileCoord,
        /// Coins refunded by the sale.
        refund: u32,
    },
    /// Reports that a sell request was rejected.
    SellRejected {
        /// Tile provided in the sell request.
        tile: TileCoord,
        /// Specific reason the sale failed.
        reason: SellRejection,
    },
    /// Confirms that a tower launched a projectile at an enemy.
    ProjectileFired {
        /// Tower that fired the projectile.
        tower: TowerId,
        /// Enemy the projectile will chase.
        target: EnemyId,
    },
    /// Confirms that a projectile struck its target.
    ProjectileHit {
        /// Enemy that absorbed the impact.
        target: EnemyId,
        /// Hit points removed by the impact.
        damage: u32,
    },
    /// Confirms that an ability is armed and awaiting a placement tile.
    AbilitySelected {
        /// Ability definition that became armed.
        ability: AbilityId,
    },
    /// Reports that an ability selection request was rejected.
    AbilityRejected {
        /// Ability the request referred to.
        ability: AbilityId,
        /// Specific reason the request failed.
        reason: AbilityRejection,
    },
    /// Reports that an ability placement request was rejected.
    PlacementRejected {
        /// Tile provided in the placement request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: AbilityRejection,
    },
    /// Confirms that the pending ability selection was discarded.
    PlacementCancelled {
        /// Ability that was disarmed.
        ability: AbilityId,
    },
    /// Confirms that an ability activated on a window of tiles.
    AbilityActivated {
        /// Ability definition that activated.
        ability: AbilityId,
        /// Tiles the resulting effect covers.
        tiles: Vec<TileCoord>,
    },
    /// Reports that an ability effect reached the end of its duration.
    AbilityExpired {
        /// Ability whose effect instance was removed.
        ability: AbilityId,
    },
    /// Confirms that an extra life was purchased.
    LifePurchased {
        /// Lives available after the purchase.
        lives: u32,
        /// Coins deducted for the purchase.
        price: u32,
    },
    /// Reports that an extra-life purchase was rejected.
    PurchaseRejected {
        /// Specific reason the purchase failed.
        reason: PurchaseRejection,
    },
    /// Reports that a wave jump request was rejected.
    WaveRejected {
        /// Index provided in the request.
        index: u32,
        /// Specific reason the jump failed.
        reason: WaveRejection,
    },
    /// Announces that tick processing is frozen.
    Paused,
    /// Announces that tick processing resumed.
    Resumed,
    /// Announces that every wave was cleared.
    GameWon {
        /// Number of waves survived.
        waves_survived: u32,
    },
    /// Announces that the defenders ran out of lives.
    GameLost {
        /// Number of fully cleared waves at the moment of defeat.
        waves_survived: u32,
    },
}

/// Reasons a build request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum BuildRejection {
    /// The requested tile lies outside the grid bounds.
    #[error("tile is outside the playfield")]
    OutOfBounds,
    /// The requested tile is not open ground.
    #[error("tile does not accept towers")]
    NotBuildable,
    /// Another tower already occupies the requested tile.
    #[error("a tower already occupies that tile")]
    Occupied,
    /// The requested catalog entry does not exist in the loaded level.
    #[error("unknown tower type")]
    UnknownTowerType,
    /// The player cannot afford the requested tower.
    #[error("tower costs {price} coins but only {coins} are available")]
    InsufficientCoins {
        /// Price of the requested tower.
        price: u32,
        /// Coins available when the request was made.
        coins: u32,
    },
}

/// Reasons a sell request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SellRejection {
    /// No tower occupies the requested tile.
    #[error("no tower occupies that tile")]
    NoTower,
}

/// Reasons an ability selection or placement may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum AbilityRejection {
    /// The referenced ability does not exist in the loaded level.
    #[error("unknown ability")]
    UnknownAbility,
    /// The ability is still cooling down from its previous activation.
    #[error("ability is cooling down for another {remaining:?}")]
    OnCooldown {
        /// Cooldown remaining at the moment of the request.
        remaining: Duration,
    },
    /// A placement arrived while no ability was armed.
    #[error("no ability is armed for placement")]
    NoSelection,
    /// The clicked tile does not belong to any enemy route.
    #[error("ability must be placed on a route tile")]
    NotOnRoute,
}

/// Reasons an extra-life purchase may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PurchaseRejection {
    /// The player cannot afford the next rung of the life price ladder.
    #[error("an extra life costs {price} coins but only {coins} are available")]
    InsufficientCoins {
        /// Current price of an extra life.
        price: u32,
        /// Coins available when the request was made.
        coins: u32,
    },
}

/// Reasons a wave jump request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum WaveRejection {
    /// The requested index does not name a wave in the loaded level.
    #[error("wave {index} does not exist; the level has {wave_count} waves")]
    OutOfRange {
        /// Index provided in the request.
        index: u32,
        /// Number of waves the loaded level schedules.
        wave_count: u32,
    },
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Continuous world-space position of the enemy.
    pub position: WorldPoint,
    /// Remaining hit points.
    pub health: u32,
    /// Hit points the enemy spawned with.
    pub max_health: u32,
    /// Route the enemy travels.
    pub route: RouteId,
    /// Index of the last route node the enemy reached.
    pub route_index: usize,
}

/// Read-only snapshot describing all enemies on the playfield.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Tile the tower occupies.
    pub tile: TileCoord,
    /// Center of the occupied tile in world units.
    pub center: WorldPoint,
    /// Catalog entry the tower was built from.
    pub tower_type: TowerTypeId,
    /// Targeting radius in world units.
    pub range: f32,
}

/// Read-only snapshot describing all towers on the playfield.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of one in-flight projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Continuous world-space position of the projectile.
    pub position: WorldPoint,
    /// Enemy the projectile is chasing.
    pub target: EnemyId,
    /// Tower that launched the projectile.
    pub tower: TowerId,
}

/// Read-only snapshot describing all in-flight projectiles.
///
/// Snapshots are captured in the world's stable arena order, so two queries
/// taken between the same ticks observe identical sequences.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<ProjectileSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of one active area effect used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectSnapshot {
    /// Ability definition the effect belongs to.
    pub ability: AbilityId,
    /// Tiles the effect covers.
    pub tiles: Vec<TileCoord>,
    /// Effect duration still remaining.
    pub remaining: Duration,
}

/// Read-only snapshot describing all active area effects.
#[derive(Clone, Debug, Default)]
pub struct EffectView {
    snapshots: Vec<EffectSnapshot>,
}

impl EffectView {
    /// Creates a new effect view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EffectSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.ability);
        Self { snapshots }
    }

    /// Iterator over the captured effect snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EffectSnapshot> {
        self.snapshots
    }
}

/// Cooldown and selection state of one ability definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbilityStatus {
    /// Ability definition the status describes.
    pub ability: AbilityId,
    /// Cooldown remaining before the ability can activate again.
    pub remaining_cooldown: Duration,
    /// True when the cooldown is complete and the ability can be armed.
    pub ready: bool,
    /// True when this ability is armed and awaiting a placement tile.
    pub selecting: bool,
}

/// Read-only snapshot describing every ability definition's status.
#[derive(Clone, Debug, Default)]
pub struct AbilityStatusView {
    statuses: Vec<AbilityStatus>,
}

impl AbilityStatusView {
    /// Creates a new status view from the provided statuses.
    #[must_use]
    pub fn from_statuses(mut statuses: Vec<AbilityStatus>) -> Self {
        statuses.sort_by_key(|status| status.ability);
        Self { statuses }
    }

    /// Iterator over the captured statuses in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AbilityStatus> {
        self.statuses.iter()
    }

    /// Consumes the view, yielding the underlying statuses.
    #[must_use]
    pub fn into_vec(self) -> Vec<AbilityStatus> {
        self.statuses
    }
}

/// Coins, lives, and wave progress captured in a single read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EconomySnapshot {
    /// Coins available for purchases.
    pub coins: u32,
    /// Lives remaining before defeat.
    pub lives: u32,
    /// Zero-based index of the active wave.
    pub wave_index: u32,
    /// Total number of waves the level schedules.
    pub wave_count: u32,
    /// Enemies destroyed since the active wave began.
    pub kills_this_wave: u32,
    /// Total enemies the active wave will spawn.
    pub wave_enemy_total: u32,
    /// Price of the next extra-life purchase.
    pub next_life_price: u32,
}

#[cfg(test)]
mod tests {
    use super::{
        AbilityRejection, BuildRejection, EnemyId, GridError, RouteId, TileCoord, TileGrid,
        TileKind, TowerTypeId, WorldPoint,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn enemy_id_round_trips_through_bincode() {
        assert_round_trip(&EnemyId::new(7));
    }

    #[test]
    fn tower_type_id_round_trips_through_bincode() {
        assert_round_trip(&TowerTypeId::new(3));
    }

    #[test]
    fn build_rejection_round_trips_through_bincode() {
        assert_round_trip(&BuildRejection::InsufficientCoins {
            price: 20,
            coins: 7,
        });
    }

    #[test]
    fn ability_rejection_round_trips_through_bincode() {
        assert_round_trip(&AbilityRejection::NotOnRoute);
    }

    #[test]
    fn tile_coord_round_trips_through_bincode() {
        assert_round_trip(&TileCoord::new(4, 9));
    }

    #[test]
    fn tokens_parse_into_tile_kinds() {
        assert_eq!(TileKind::from_token("-"), Some(TileKind::Empty));
        assert_eq!(TileKind::from_token("O"), Some(TileKind::Path));
        assert_eq!(TileKind::from_token("X"), Some(TileKind::Buildable));
        assert_eq!(
            TileKind::from_token("S1"),
            Some(TileKind::Start(RouteId::new(1)))
        );
        assert_eq!(
            TileKind::from_token("e12"),
            Some(TileKind::End(RouteId::new(12)))
        );
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(TileKind::from_token("S"), None);
        assert_eq!(TileKind::from_token("E-1"), None);
        assert_eq!(TileKind::from_token("Q3"), None);
        assert_eq!(TileKind::from_token(""), None);
        assert_eq!(TileKind::from_token("XX"), None);
    }

    #[test]
    fn walkability_covers_path_and_labeled_tiles() {
        assert!(TileKind::Path.is_walkable());
        assert!(TileKind::Start(RouteId::new(1)).is_walkable());
        assert!(TileKind::End(RouteId::new(1)).is_walkable());
        assert!(!TileKind::Buildable.is_walkable());
        assert!(!TileKind::Empty.is_walkable());
    }

    fn small_grid() -> TileGrid {
        let rows = vec![
            vec![
                TileKind::Start(RouteId::new(1)),
                TileKind::Path,
                TileKind::End(RouteId::new(1)),
            ],
            vec![TileKind::Buildable, TileKind::Empty, TileKind::Buildable],
        ];
        TileGrid::from_rows(rows, 60.0).expect("grid builds")
    }

    #[test]
    fn ragged_layouts_are_rejected() {
        let rows = vec![vec![TileKind::Path, TileKind::Path], vec![TileKind::Path]];
        assert_eq!(
            TileGrid::from_rows(rows, 60.0),
            Err(GridError::RaggedRow {
                row: 1,
                len: 1,
                expected: 2,
            })
        );
    }

    #[test]
    fn empty_layouts_are_rejected() {
        assert_eq!(TileGrid::from_rows(Vec::new(), 60.0), Err(GridError::Empty));
        assert_eq!(
            TileGrid::from_rows(vec![Vec::new()], 60.0),
            Err(GridError::Empty)
        );
    }

    #[test]
    fn non_positive_tile_lengths_are_rejected() {
        let rows = vec![vec![TileKind::Path]];
        assert_eq!(
            TileGrid::from_rows(rows, 0.0),
            Err(GridError::InvalidTileLength)
        );
    }

    #[test]
    fn grid_extents_span_every_tile() {
        let grid = small_grid();
        assert!((grid.width() - 180.0).abs() < f32::EPSILON);
        assert!((grid.height() - 120.0).abs() < f32::EPSILON);
    }

    #[test]
    fn tile_centers_sit_half_a_tile_inward() {
        let grid = small_grid();
        let center = grid.tile_center(TileCoord::new(1, 0));
        assert!((center.x() - 90.0).abs() < f32::EPSILON);
        assert!((center.y() - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn points_map_back_to_their_tile() {
        let grid = small_grid();
        assert_eq!(
            grid.tile_at_point(WorldPoint::new(90.0, 30.0)),
            Some(TileCoord::new(1, 0))
        );
        assert_eq!(grid.tile_at_point(WorldPoint::new(-1.0, 30.0)), None);
        assert_eq!(grid.tile_at_point(WorldPoint::new(90.0, 500.0)), None);
    }

    #[test]
    fn buildability_follows_the_layout() {
        let grid = small_grid();
        assert!(grid.is_buildable(TileCoord::new(0, 1)));
        assert!(!grid.is_buildable(TileCoord::new(1, 0)));
        assert!(!grid.is_buildable(TileCoord::new(1, 1)));
        assert!(!grid.is_buildable(TileCoord::new(9, 9)));
    }

    #[test]
    fn start_and_end_tiles_are_sorted_by_route() {
        let rows = vec![
            vec![
                TileKind::Start(RouteId::new(2)),
                TileKind::Path,
                TileKind::End(RouteId::new(2)),
            ],
            vec![
                TileKind::Start(RouteId::new(1)),
                TileKind::Path,
                TileKind::End(RouteId::new(1)),
            ],
        ];
        let grid = TileGrid::from_rows(rows, 60.0).expect("grid builds");
        let starts = grid.start_tiles();
        assert_eq!(
            starts,
            vec![
                (RouteId::new(1), TileCoord::new(0, 1)),
                (RouteId::new(2), TileCoord::new(0, 0)),
            ]
        );
    }

    #[test]
    fn adjacency_requires_a_shared_edge() {
        let tile = TileCoord::new(3, 3);
        assert!(tile.is_adjacent_to(TileCoord::new(3, 4)));
        assert!(tile.is_adjacent_to(TileCoord::new(2, 3)));
        assert!(!tile.is_adjacent_to(TileCoord::new(2, 2)));
        assert!(!tile.is_adjacent_to(TileCoord::new(3, 3)));
    }
}
