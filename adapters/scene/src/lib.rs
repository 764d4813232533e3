#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared presentation contracts for Rampart adapters.
//!
//! The scene is a pure flattening of world query views into render-ready
//! data: filled tile rectangles, enemies with health fractions, towers with
//! range rings, projectile dots, effect overlays, and the HUD ledger. No
//! rendering backend is referenced here; any client that can draw rectangles,
//! circles, and text can present a [`Scene`].

use anyhow::{Context as _, Result as AnyResult};
use glam::Vec2;
use rampart_core::{
    level::LevelPlan, EconomySnapshot, EffectView, EnemyView, PlayState, ProjectileView,
    TileCoord, TileKind, TowerId, TowerView, WorldPoint,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Parses a level-data color string.
    ///
    /// Accepts the two forms the level editor emits: hex (`#rgb` or
    /// `#rrggbb`) and functional (`rgb(r, g, b)` or `rgba(r, g, b, a)` with
    /// byte channels and a fractional alpha).
    pub fn parse(value: &str) -> Result<Self, SceneError> {
        let invalid = || SceneError::InvalidColor {
            value: value.to_owned(),
        };
        let trimmed = value.trim();
        if let Some(digits) = trimmed.strip_prefix('#') {
            return Self::parse_hex(digits).ok_or_else(invalid);
        }
        if let Some(body) = trimmed
            .strip_prefix("rgba(")
            .or_else(|| trimmed.strip_prefix("rgb("))
        {
            let body = body.strip_suffix(')').ok_or_else(invalid)?;
            return Self::parse_channels(body).ok_or_else(invalid);
        }
        Err(invalid())
    }

    fn parse_hex(digits: &str) -> Option<Self> {
        let expand = |nibble: u8| nibble << 4 | nibble;
        match digits.len() {
            3 => {
                let short = u16::from_str_radix(digits, 16).ok()?;
                Some(Self::from_rgb_u8(
                    expand((short >> 8) as u8 & 0x0f),
                    expand((short >> 4) as u8 & 0x0f),
                    expand(short as u8 & 0x0f),
                ))
            }
            6 => {
                let wide = u32::from_str_radix(digits, 16).ok()?;
                Some(Self::from_rgb_u8(
                    (wide >> 16) as u8,
                    (wide >> 8) as u8,
                    wide as u8,
                ))
            }
            _ => None,
        }
    }

    fn parse_channels(body: &str) -> Option<Self> {
        let mut parts = body.split(',').map(str::trim);
        let red = parts.next()?.parse::<u8>().ok()?;
        let green = parts.next()?.parse::<u8>().ok()?;
        let blue = parts.next()?.parse::<u8>().ok()?;
        let alpha = match parts.next() {
            Some(text) => {
                let alpha = text.parse::<f32>().ok()?;
                (0.0..=1.0).contains(&alpha).then_some(alpha)?
            }
            None => 1.0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            alpha,
            ..Self::from_rgb_u8(red, green, blue)
        })
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Amount a selected tower's flag color is lightened for emphasis.
const SELECTED_TOWER_LIGHTEN: f32 = 0.35;

/// Fill color of void tiles outside the playfield.
pub const EMPTY_TILE_COLOR: Color = Color::from_rgb_u8(126, 192, 238);
/// Fill color of the road enemies travel along.
pub const PATH_TILE_COLOR: Color = Color::from_rgb_u8(189, 151, 104);
/// Fill color of open ground that accepts towers.
pub const BUILDABLE_TILE_COLOR: Color = Color::from_rgb_u8(106, 168, 79);
/// Fill color of spawn tiles.
pub const START_TILE_COLOR: Color = Color::from_rgb_u8(217, 119, 87);
/// Fill color of exit tiles.
pub const END_TILE_COLOR: Color = Color::from_rgb_u8(90, 90, 110);

/// Describes the square tile grid that composes the playfield.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
    /// Total width of the grid in world units.
    pub width: f32,
    /// Total height of the grid in world units.
    pub height: f32,
    /// Filled rectangles, one per tile in row-major order.
    pub tiles: Vec<TileFill>,
}

/// Single filled tile rectangle within the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileFill {
    /// Tile the rectangle covers.
    pub tile: TileCoord,
    /// Fill color derived from the tile's kind.
    pub color: Color,
}

/// Enemy rendered as a filled circle with a health bar above it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyPresentation {
    /// Continuous world-space position of the enemy's center.
    pub position: Vec2,
    /// Remaining health as a fraction of maximum, in 0.0..=1.0.
    pub health_fraction: f32,
}

/// Tower rendered as a filled tile with an optional range ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerPresentation {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Tile the tower occupies.
    pub tile: TileCoord,
    /// Center of the occupied tile in world units.
    pub position: Vec2,
    /// Targeting radius in world units, drawn as a ring when selected.
    pub range: f32,
    /// Flag color from the tower's catalog entry.
    pub color: Color,
    /// Whether the player currently has this tower selected.
    pub selected: bool,
}

/// Projectile rendered as a small filled dot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectilePresentation {
    /// Continuous world-space position of the projectile.
    pub position: Vec2,
}

/// Active ability effect rendered as translucent overlays on its tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectPresentation {
    /// Tiles the effect covers.
    pub tiles: Vec<TileCoord>,
    /// Overlay color from the ability definition.
    pub color: Color,
    /// Effect duration still remaining.
    pub remaining: Duration,
}

/// Economy and progress figures presented in the HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HudPresentation {
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
    /// Coarse simulation phase, including terminal outcomes.
    pub play_state: PlayState,
}

impl HudPresentation {
    /// One-line status suitable for a text HUD or log.
    #[must_use]
    pub fn status_line(&self) -> String {
        match self.play_state {
            PlayState::Victory { waves_survived } => {
                format!("victory after {waves_survived} waves")
            }
            PlayState::Defeat { waves_survived } => {
                format!("defeat after {waves_survived} waves")
            }
            PlayState::Running | PlayState::Paused => format!(
                "wave {}/{} | kills {}/{} | {} coins | {} lives",
                self.wave_index + 1,
                self.wave_count,
                self.kills_this_wave,
                self.wave_enemy_total,
                self.coins,
                self.lives,
            ),
        }
    }
}

/// World query views flattened into one frame's worth of scene inputs.
#[derive(Clone, Copy, Debug)]
pub struct FrameState<'a> {
    /// Enemies currently on the playfield.
    pub enemies: &'a EnemyView,
    /// Towers currently constructed.
    pub towers: &'a TowerView,
    /// Projectiles currently in flight.
    pub projectiles: &'a ProjectileView,
    /// Ability effects currently ticking.
    pub effects: &'a EffectView,
    /// Coins, lives, and wave progress.
    pub economy: EconomySnapshot,
    /// Coarse simulation phase.
    pub play_state: PlayState,
    /// Tower the player has selected, if any.
    pub selected_tower: Option<TowerId>,
}

/// Scene description combining the tile grid and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the play area.
    pub grid: GridPresentation,
    /// Enemies positioned in world units.
    pub enemies: Vec<EnemyPresentation>,
    /// Towers positioned in world units.
    pub towers: Vec<TowerPresentation>,
    /// Projectiles positioned in world units.
    pub projectiles: Vec<ProjectilePresentation>,
    /// Active ability effect overlays.
    pub effects: Vec<EffectPresentation>,
    /// Economy and progress figures for the HUD.
    pub hud: HudPresentation,
}

impl Scene {
    /// Flattens one frame of world query views into render-ready data.
    ///
    /// Fails only when the level plan carries a color string the scene
    /// cannot parse; the simulation itself never depends on colors, so the
    /// error surfaces here at the presentation edge.
    pub fn compose(plan: &LevelPlan, frame: &FrameState<'_>) -> AnyResult<Self> {
        let grid = grid_presentation(plan);

        let enemies = frame
            .enemies
            .iter()
            .map(|enemy| EnemyPresentation {
                position: world_to_vec(enemy.position),
                health_fraction: if enemy.max_health == 0 {
                    0.0
                } else {
                    enemy.health as f32 / enemy.max_health as f32
                },
            })
            .collect();

        let mut towers = Vec::new();
        for snapshot in frame.towers.iter() {
            let color = match plan.tower(snapshot.tower_type) {
                Some(spec) => Color::parse(&spec.color)
                    .with_context(|| format!("tower {:?} color", spec.key))?,
                None => BUILDABLE_TILE_COLOR,
            };
            let selected = frame.selected_tower == Some(snapshot.id);
            towers.push(TowerPresentation {
                id: snapshot.id,
                tile: snapshot.tile,
                position: world_to_vec(snapshot.center),
                range: snapshot.range,
                color: if selected {
                    color.lighten(SELECTED_TOWER_LIGHTEN)
                } else {
                    color
                },
                selected,
            });
        }

        let projectiles = frame
            .projectiles
            .iter()
            .map(|snapshot| ProjectilePresentation {
                position: world_to_vec(snapshot.position),
            })
            .collect();

        let mut effects = Vec::new();
        for snapshot in frame.effects.iter() {
            let color = match plan.ability(snapshot.ability) {
                Some(spec) => Color::parse(&spec.color)
                    .with_context(|| format!("ability {:?} color", spec.key))?,
                None => PATH_TILE_COLOR,
            };
            effects.push(EffectPresentation {
                tiles: snapshot.tiles.clone(),
                color,
                remaining: snapshot.remaining,
            });
        }

        Ok(Self {
            grid,
            enemies,
            towers,
            projectiles,
            effects,
            hud: HudPresentation {
                coins: frame.economy.coins,
                lives: frame.economy.lives,
                wave_index: frame.economy.wave_index,
                wave_count: frame.economy.wave_count,
                kills_this_wave: frame.economy.kills_this_wave,
                wave_enemy_total: frame.economy.wave_enemy_total,
                next_life_price: frame.economy.next_life_price,
                play_state: frame.play_state,
            },
        })
    }
}

fn grid_presentation(plan: &LevelPlan) -> GridPresentation {
    let grid = plan.grid();
    let mut tiles = Vec::with_capacity((grid.columns() * grid.rows()) as usize);
    for row in 0..grid.rows() {
        for column in 0..grid.columns() {
            let tile = TileCoord::new(column, row);
            let Some(kind) = grid.kind_at(tile) else {
                continue;
            };
            tiles.push(TileFill {
                tile,
                color: tile_color(kind),
            });
        }
    }
    GridPresentation {
        columns: grid.columns(),
        rows: grid.rows(),
        tile_length: grid.tile_length(),
        width: grid.width(),
        height: grid.height(),
        tiles,
    }
}

fn tile_color(kind: TileKind) -> Color {
    match kind {
        TileKind::Empty => EMPTY_TILE_COLOR,
        TileKind::Path => PATH_TILE_COLOR,
        TileKind::Buildable => BUILDABLE_TILE_COLOR,
        TileKind::Start(_) => START_TILE_COLOR,
        TileKind::End(_) => END_TILE_COLOR,
    }
}

fn world_to_vec(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x(), point.y())
}

/// Errors that can occur when constructing scene descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum SceneError {
    /// A level color string matched none of the supported formats.
    InvalidColor {
        /// Color text as written in the level data.
        value: String,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor { value } => {
                write!(f, "color '{value}' is not a supported format")
            }
        }
    }
}

impl Error for SceneError {}
