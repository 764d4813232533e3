#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player-facing handle over the authoritative world.
//!
//! UI layers hold a [`Session`] instead of reaching into the world directly:
//! every method translates into a single [`Command`], applies it, and turns
//! the resulting rejection event (if any) back into a synchronous `Result`
//! whose error renders as human-readable text. All events, accepted or
//! rejected, accumulate in the session's log until the client drains them.

use std::time::Duration;

use rampart_core::{
    level::{LevelError, LevelPlan},
    AbilityId, AbilityRejection, AbilityStatusView, BuildRejection, Command, EconomySnapshot,
    EffectView, EnemyView, Event, PlayState, ProjectileView, PurchaseRejection, RouteId,
    SellRejection, TileCoord, TileGrid, TowerId, TowerTypeId, TowerView, WaveRejection,
};
use rampart_world::{apply, query, World};

/// Orchestrator handle owned by the UI layer.
#[derive(Debug)]
pub struct Session {
    world: World,
    events: Vec<Event>,
    selected_tower: Option<TowerId>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session around an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: World::new(),
            events: Vec::new(),
            selected_tower: None,
        }
    }

    fn submit(&mut self, command: Command) -> &[Event] {
        let start = self.events.len();
        apply(&mut self.world, command, &mut self.events);
        &self.events[start..]
    }

    /// Replaces the world content with a validated level plan.
    ///
    /// A plan can still be refused here when one of its wave routes has no
    /// walkable path; static validation cannot see connectivity.
    pub fn load_level(&mut self, plan: LevelPlan) -> Result<(), LevelError> {
        self.selected_tower = None;
        for event in self.submit(Command::LoadLevel { plan }) {
            if let Event::LevelRejected { reason } = event {
                return Err(reason.clone());
            }
        }
        Ok(())
    }

    /// Advances the simulation clock by the provided delta time.
    pub fn advance(&mut self, dt: Duration) {
        let _ = self.submit(Command::Tick { dt });
    }

    /// Requests construction of a tower, returning its identifier on success.
    pub fn build(
        &mut self,
        tile: TileCoord,
        tower_type: TowerTypeId,
    ) -> Result<TowerId, BuildRejection> {
        for event in self.submit(Command::Build { tile, tower_type }) {
            match event {
                Event::TowerBuilt { tower, .. } => return Ok(*tower),
                Event::BuildRejected { reason, .. } => return Err(*reason),
                _ => {}
            }
        }
        Err(BuildRejection::OutOfBounds)
    }

    /// Requests demolition of the tower on a tile, returning the refund.
    pub fn sell(&mut self, tile: TileCoord) -> Result<u32, SellRejection> {
        let selected = self.selected_tower;
        let mut outcome = Err(SellRejection::NoTower);
        let mut clear_selection = false;
        for event in self.submit(Command::Sell { tile }) {
            match event {
                Event::TowerSold { tower, refund, .. } => {
                    outcome = Ok(*refund);
                    clear_selection = selected == Some(*tower);
                }
                Event::SellRejected { reason, .. } => outcome = Err(*reason),
                _ => {}
            }
        }
        if clear_selection {
            self.selected_tower = None;
        }
        outcome
    }

    /// Arms an ability so the next placement call targets it.
    pub fn select_ability(&mut self, ability: AbilityId) -> Result<(), AbilityRejection> {
        for event in self.submit(Command::SelectAbility { ability }) {
            if let Event::AbilityRejected { reason, .. } = event {
                return Err(*reason);
            }
        }
        Ok(())
    }

    /// Confirms placement of the armed ability, returning the covered tiles.
    pub fn place_ability(&mut self, tile: TileCoord) -> Result<Vec<TileCoord>, AbilityRejection> {
        let mut activated = None;
        for event in self.submit(Command::PlaceAbility { tile }) {
            match event {
                Event::AbilityActivated { tiles, .. } => activated = Some(tiles.clone()),
                Event::PlacementRejected { reason, .. } => return Err(*reason),
                _ => {}
            }
        }
        activated.ok_or(AbilityRejection::NoSelection)
    }

    /// Disarms the pending ability selection without consuming cooldown.
    pub fn cancel_placement(&mut self) {
        let _ = self.submit(Command::CancelPlacement);
    }

    /// Purchases one extra life, returning the price paid.
    pub fn buy_life(&mut self) -> Result<u32, PurchaseRejection> {
        for event in self.submit(Command::BuyLife) {
            match event {
                Event::LifePurchased { price, .. } => return Ok(*price),
                Event::PurchaseRejected { reason } => return Err(*reason),
                _ => {}
            }
        }
        Err(PurchaseRejection::InsufficientCoins { price: 0, coins: 0 })
    }

    /// Freezes tick processing until [`Session::resume`] is called.
    pub fn pause(&mut self) {
        let _ = self.submit(Command::Pause);
    }

    /// Resumes tick processing after a pause.
    pub fn resume(&mut self) {
        let _ = self.submit(Command::Resume);
    }

    /// Jumps to the wave with the provided index.
    pub fn set_wave(&mut self, index: u32) -> Result<(), WaveRejection> {
        for event in self.submit(Command::SetWave { index }) {
            if let Event::WaveRejected { reason, .. } = event {
                return Err(*reason);
            }
        }
        Ok(())
    }

    /// Marks the tower on a tile as selected for the presentation layer.
    ///
    /// Selection is a client-side concern; the world neither stores nor
    /// reacts to it. Selecting an empty tile clears the selection.
    pub fn select_tower_at(&mut self, tile: TileCoord) -> Option<TowerId> {
        self.selected_tower = query::tower_view(&self.world)
            .iter()
            .find(|snapshot| snapshot.tile == tile)
            .map(|snapshot| snapshot.id);
        self.selected_tower
    }

    /// Tower the player currently has selected, if any.
    #[must_use]
    pub const fn selected_tower(&self) -> Option<TowerId> {
        self.selected_tower
    }

    /// Moves the accumulated event log out of the session.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Coarse simulation phase the world is currently in.
    #[must_use]
    pub fn play_state(&self) -> PlayState {
        query::play_state(&self.world)
    }

    /// Display name of the loaded level, if one committed.
    #[must_use]
    pub fn level_name(&self) -> Option<&str> {
        query::level_name(&self.world)
    }

    /// Tile grid of the loaded level, if one committed.
    #[must_use]
    pub fn grid(&self) -> Option<&TileGrid> {
        query::tile_grid(&self.world)
    }

    /// Enemy routes in ascending label order.
    #[must_use]
    pub fn routes(&self) -> Vec<(RouteId, &[TileCoord])> {
        query::routes(&self.world)
    }

    /// Read-only view of the enemies on the playfield.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Read-only view of the constructed towers.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Read-only view of the in-flight projectiles.
    #[must_use]
    pub fn projectiles(&self) -> ProjectileView {
        query::projectile_view(&self.world)
    }

    /// Read-only view of the placed ability effects.
    #[must_use]
    pub fn effects(&self) -> EffectView {
        query::effect_view(&self.world)
    }

    /// Cooldown and selection state of every ability.
    #[must_use]
    pub fn ability_statuses(&self) -> AbilityStatusView {
        query::ability_statuses(&self.world)
    }

    /// Coins, lives, and wave progress captured in a single read.
    #[must_use]
    pub fn economy(&self) -> EconomySnapshot {
        query::economy(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::level::{LevelData, SpawnGroupData, TowerData, WaveData};
    use std::collections::BTreeMap;

    fn sample_plan() -> LevelPlan {
        let mut tower_types = BTreeMap::new();
        let _ = tower_types.insert(
            "cannon".to_owned(),
            TowerData {
                price: 5,
                ..TowerData::default()
            },
        );
        let layout = [
            ["S1", "O", "O", "E1"].as_slice(),
            ["X", "X", "X", "X"].as_slice(),
        ]
        .iter()
        .map(|row| row.iter().map(|token| (*token).to_owned()).collect())
        .collect();
        LevelData {
            name: "session test".to_owned(),
            starting_coins: 10,
            layout,
            tower_types,
            waves: vec![WaveData {
                enemies: vec![SpawnGroupData {
                    count: 1,
                    ..SpawnGroupData::default()
                }],
            }],
            ..LevelData::default()
        }
        .validate()
        .expect("plan validates")
    }

    fn loaded_session() -> Session {
        let mut session = Session::new();
        session.load_level(sample_plan()).expect("level loads");
        session
    }

    #[test]
    fn building_returns_the_allocated_tower_id() {
        let mut session = loaded_session();
        let id = session
            .build(TileCoord::new(1, 1), TowerTypeId::new(0))
            .expect("build succeeds");
        assert_eq!(id, TowerId::new(0));
        assert_eq!(session.economy().coins, 5);
    }

    #[test]
    fn rejected_builds_surface_their_reason_synchronously() {
        let mut session = loaded_session();
        assert_eq!(
            session.build(TileCoord::new(1, 0), TowerTypeId::new(0)),
            Err(BuildRejection::NotBuildable)
        );
        let _ = session
            .build(TileCoord::new(1, 1), TowerTypeId::new(0))
            .expect("first build succeeds");
        assert_eq!(
            session.build(TileCoord::new(2, 1), TowerTypeId::new(0)),
            Err(BuildRejection::InsufficientCoins { price: 5, coins: 5 })
        );
    }

    #[test]
    fn selling_refunds_and_clears_a_matching_selection() {
        let mut session = loaded_session();
        let tile = TileCoord::new(1, 1);
        let id = session
            .build(tile, TowerTypeId::new(0))
            .expect("build succeeds");

        assert_eq!(session.select_tower_at(tile), Some(id));
        assert_eq!(session.sell(tile), Ok(2));
        assert_eq!(session.selected_tower(), None);
        assert_eq!(session.sell(tile), Err(SellRejection::NoTower));
    }

    #[test]
    fn selecting_an_empty_tile_clears_the_selection() {
        let mut session = loaded_session();
        let tile = TileCoord::new(1, 1);
        let _ = session
            .build(tile, TowerTypeId::new(0))
            .expect("build succeeds");
        assert!(session.select_tower_at(tile).is_some());
        assert!(session.select_tower_at(TileCoord::new(2, 1)).is_none());
        assert_eq!(session.selected_tower(), None);
    }

    #[test]
    fn the_event_log_accumulates_until_drained() {
        let mut session = loaded_session();
        let _ = session.build(TileCoord::new(1, 1), TowerTypeId::new(0));
        session.advance(Duration::from_millis(16));

        let events = session.drain_events();
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LevelLoaded { .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TowerBuilt { .. })));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. })));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn ability_calls_map_rejections_to_errors() {
        let mut session = loaded_session();
        assert_eq!(
            session.select_ability(AbilityId::new(0)),
            Err(AbilityRejection::UnknownAbility)
        );
        assert_eq!(
            session.place_ability(TileCoord::new(1, 0)),
            Err(AbilityRejection::NoSelection)
        );
    }

    #[test]
    fn pausing_through_the_session_freezes_ticks() {
        let mut session = loaded_session();
        let _ = session.drain_events();
        session.pause();
        session.advance(Duration::from_millis(16));
        assert_eq!(session.play_state(), PlayState::Paused);
        assert!(!session
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. })));

        session.resume();
        session.advance(Duration::from_millis(16));
        assert!(session
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. })));
    }

    #[test]
    fn wave_jumps_validate_through_the_session() {
        let mut session = loaded_session();
        assert_eq!(
            session.set_wave(4),
            Err(WaveRejection::OutOfRange {
                index: 4,
                wave_count: 1,
            })
        );
        assert_eq!(session.set_wave(0), Ok(()));
    }

    #[test]
    fn life_purchases_report_the_price_paid() {
        let mut session = loaded_session();
        assert_eq!(session.buy_life(), Ok(10));
        assert_eq!(
            session.buy_life(),
            Err(PurchaseRejection::InsufficientCoins { price: 25, coins: 0 })
        );
    }
}
