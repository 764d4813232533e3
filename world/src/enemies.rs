//! Authoritative enemy state and route-following motion.

use rampart_core::{EnemyId, EnemySnapshot, RouteId, WorldPoint};

/// One enemy walking a route, stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    /// Identifier allocated by the world for the enemy.
    pub(crate) id: EnemyId,
    /// Route the enemy walks.
    pub(crate) route: RouteId,
    /// Index of the last route node the enemy reached.
    pub(crate) route_index: usize,
    /// Continuous world-space position.
    pub(crate) position: WorldPoint,
    /// Remaining hit points.
    pub(crate) health: u32,
    /// Hit points the enemy spawned with.
    pub(crate) max_health: u32,
    /// Walking speed in world units per millisecond.
    pub(crate) speed: f32,
    /// Coins awarded when the enemy is destroyed.
    pub(crate) coin_reward: u32,
}

impl Enemy {
    /// Moves toward `target`, clamping onto it and advancing the cursor when
    /// the remaining distance is less than this tick's step.
    ///
    /// Leftover step distance after a clamp is dropped; the walk toward the
    /// following node begins on the next tick.
    pub(crate) fn advance_toward(&mut self, target: WorldPoint, step: f32) {
        let dx = target.x() - self.position.x();
        let dy = target.y() - self.position.y();
        let distance = (dx * dx + dy * dy).sqrt();
        if distance < step {
            self.position = target;
            self.route_index += 1;
        } else {
            self.position = WorldPoint::new(
                self.position.x() + dx / distance * step,
                self.position.y() + dy / distance * step,
            );
        }
    }

    /// True while the enemy has hit points left.
    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// True once the cursor sits on the final node of a route of the
    /// provided length. Missing routes count as finished so a stale route
    /// reference removes the enemy instead of faulting.
    pub(crate) fn has_finished(&self, route_len: Option<usize>) -> bool {
        route_len.map_or(true, |len| self.route_index + 1 >= len)
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            route: self.route,
            route_index: self.route_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Enemy;
    use rampart_core::{EnemyId, RouteId, WorldPoint};

    fn enemy_at(x: f32, y: f32, speed: f32) -> Enemy {
        Enemy {
            id: EnemyId::new(1),
            route: RouteId::new(1),
            route_index: 0,
            position: WorldPoint::new(x, y),
            health: 10,
            max_health: 10,
            speed,
            coin_reward: 1,
        }
    }

    #[test]
    fn partial_steps_move_along_the_direction_vector() {
        let mut enemy = enemy_at(0.0, 0.0, 0.08);
        enemy.advance_toward(WorldPoint::new(60.0, 0.0), 16.0);
        assert!((enemy.position.x() - 16.0).abs() < 1e-4);
        assert!((enemy.position.y()).abs() < 1e-4);
        assert_eq!(enemy.route_index, 0);
    }

    #[test]
    fn final_approach_clamps_onto_the_node_and_advances_the_cursor() {
        let mut enemy = enemy_at(55.0, 0.0, 0.08);
        enemy.advance_toward(WorldPoint::new(60.0, 0.0), 16.0);
        assert_eq!(enemy.position, WorldPoint::new(60.0, 0.0));
        assert_eq!(enemy.route_index, 1);
    }

    #[test]
    fn landing_exactly_on_the_node_advances_on_the_following_step() {
        let mut enemy = enemy_at(44.0, 0.0, 0.08);
        enemy.advance_toward(WorldPoint::new(60.0, 0.0), 16.0);
        assert_eq!(enemy.position, WorldPoint::new(60.0, 0.0));
        assert_eq!(enemy.route_index, 0);

        enemy.advance_toward(WorldPoint::new(60.0, 0.0), 16.0);
        assert_eq!(enemy.route_index, 1);
    }

    #[test]
    fn finish_detection_covers_short_and_missing_routes() {
        let enemy = enemy_at(0.0, 0.0, 0.08);
        assert!(enemy.has_finished(Some(1)));
        assert!(enemy.has_finished(None));
        assert!(!enemy.has_finished(Some(3)));
    }
}
