//! Pooled projectile flight state and collision bookkeeping.

use std::collections::BTreeMap;
use std::time::Duration;

use rampart_core::{EnemyId, Event, ProjectileSnapshot, TowerId, WorldPoint};

use crate::enemies::Enemy;

/// Flight time budget before an airborne projectile fizzles.
pub(crate) const PROJECTILE_LIFETIME: Duration = Duration::from_millis(2_500);

/// One pooled projectile slot.
///
/// Slots are never removed from the pool; inactive slots wait on the free
/// list until a tower fires again and every field is overwritten.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    /// Current position in world units.
    pub(crate) position: WorldPoint,
    /// Enemy the projectile homes toward.
    pub(crate) target: EnemyId,
    /// Tower that fired the projectile.
    pub(crate) owner: TowerId,
    /// Damage applied when the projectile connects.
    pub(crate) damage: u32,
    /// Flight speed in world units per millisecond.
    pub(crate) speed: f32,
    /// Time spent in flight so far.
    pub(crate) lived: Duration,
    /// Whether the slot currently represents an airborne projectile.
    pub(crate) active: bool,
}

/// Arena of projectile slots with free-list reuse.
#[derive(Debug, Default)]
pub(crate) struct ProjectilePool {
    slots: Vec<Projectile>,
    free: Vec<usize>,
}

impl ProjectilePool {
    /// Creates an empty pool.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Drops every slot, airborne or pooled.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Launches a projectile, reusing a pooled slot when one is available.
    pub(crate) fn acquire(
        &mut self,
        owner: TowerId,
        target: EnemyId,
        position: WorldPoint,
        damage: u32,
        speed: f32,
    ) {
        let projectile = Projectile {
            position,
            target,
            owner,
            damage,
            speed,
            lived: Duration::ZERO,
            active: true,
        };
        match self.free.pop() {
            Some(index) => self.slots[index] = projectile,
            None => self.slots.push(projectile),
        }
    }

    /// Advances every airborne projectile fired by the provided tower.
    ///
    /// A projectile is released back to the pool when its flight budget runs
    /// out, when its target is gone or already dead, or when it connects. A
    /// connecting projectile applies its damage exactly once and reports the
    /// hit through `out_events`.
    pub(crate) fn advance_owned(
        &mut self,
        owner: TowerId,
        dt: Duration,
        enemies: &mut BTreeMap<EnemyId, Enemy>,
        out_events: &mut Vec<Event>,
    ) {
        let dt_ms = dt.as_secs_f32() * 1_000.0;
        let Self { slots, free } = self;
        for (index, slot) in slots.iter_mut().enumerate() {
            if !slot.active || slot.owner != owner {
                continue;
            }
            slot.lived = slot.lived.saturating_add(dt);
            let mut release = slot.lived >= PROJECTILE_LIFETIME;
            if !release {
                match enemies.get_mut(&slot.target) {
                    Some(enemy) if enemy.is_alive() => {
                        let dx = enemy.position.x() - slot.position.x();
                        let dy = enemy.position.y() - slot.position.y();
                        let distance = (dx * dx + dy * dy).sqrt();
                        let step = slot.speed * dt_ms;
                        if distance < step {
                            enemy.health = enemy.health.saturating_sub(slot.damage);
                            out_events.push(Event::ProjectileHit {
                                target: slot.target,
                                damage: slot.damage,
                            });
                            release = true;
                        } else if distance > 0.0 {
                            slot.position = WorldPoint::new(
                                slot.position.x() + dx / distance * step,
                                slot.position.y() + dy / distance * step,
                            );
                        }
                    }
                    _ => release = true,
                }
            }
            if release {
                slot.active = false;
                free.push(index);
            }
        }
    }

    /// Releases every airborne projectile fired by the provided tower.
    pub(crate) fn release_owned(&mut self, owner: TowerId) {
        let Self { slots, free } = self;
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.active && slot.owner == owner {
                slot.active = false;
                free.push(index);
            }
        }
    }

    /// Snapshots of the airborne projectiles in stable arena order.
    pub(crate) fn snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.slots
            .iter()
            .filter(|slot| slot.active)
            .map(|slot| ProjectileSnapshot {
                position: slot.position,
                target: slot.target,
                tower: slot.owner,
            })
            .collect()
    }
}
