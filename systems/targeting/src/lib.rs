#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks deterministic tower targets.
//!
//! Selection scans the candidates in the order they are supplied and keeps
//! the strictly nearest one, so with candidates listed in spawn order the
//! earliest-spawned enemy wins distance ties. Comparisons stay in squared
//! world units; no square root is taken anywhere.

use rampart_core::{EnemyId, WorldPoint};

/// One enemy offered to the selection scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetCandidate {
    /// Identifier of the candidate enemy.
    pub enemy: EnemyId,
    /// Current world-space position of the candidate.
    pub position: WorldPoint,
}

/// Picks the nearest candidate strictly inside `range` of `origin`.
///
/// A candidate exactly at the range boundary is not eligible. Returns
/// `None` when no candidate qualifies or `range` is not positive.
#[must_use]
pub fn select_target(
    origin: WorldPoint,
    range: f32,
    candidates: &[TargetCandidate],
) -> Option<EnemyId> {
    if !(range.is_finite() && range > 0.0) {
        return None;
    }
    let mut best: Option<EnemyId> = None;
    let mut best_distance_sq = range * range;
    for candidate in candidates {
        let distance_sq = origin.distance_squared(candidate.position);
        if distance_sq < best_distance_sq {
            best_distance_sq = distance_sq;
            best = Some(candidate.enemy);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{select_target, TargetCandidate};
    use rampart_core::{EnemyId, WorldPoint};

    fn candidate(id: u32, x: f32, y: f32) -> TargetCandidate {
        TargetCandidate {
            enemy: EnemyId::new(id),
            position: WorldPoint::new(x, y),
        }
    }

    #[test]
    fn nearest_candidate_wins() {
        let origin = WorldPoint::new(0.0, 0.0);
        let candidates = vec![
            candidate(1, 90.0, 0.0),
            candidate(2, 30.0, 0.0),
            candidate(3, 60.0, 0.0),
        ];
        assert_eq!(
            select_target(origin, 150.0, &candidates),
            Some(EnemyId::new(2))
        );
    }

    #[test]
    fn earlier_candidate_keeps_distance_ties() {
        let origin = WorldPoint::new(0.0, 0.0);
        let candidates = vec![candidate(4, 50.0, 0.0), candidate(9, 0.0, 50.0)];
        assert_eq!(
            select_target(origin, 150.0, &candidates),
            Some(EnemyId::new(4))
        );
    }

    #[test]
    fn candidate_exactly_at_range_is_not_eligible() {
        let origin = WorldPoint::new(0.0, 0.0);
        let candidates = vec![candidate(1, 150.0, 0.0)];
        assert_eq!(select_target(origin, 150.0, &candidates), None);
        assert_eq!(
            select_target(origin, 150.1, &candidates),
            Some(EnemyId::new(1))
        );
    }

    #[test]
    fn out_of_range_candidates_are_ignored() {
        let origin = WorldPoint::new(100.0, 100.0);
        let candidates = vec![candidate(1, 400.0, 400.0), candidate(2, 120.0, 100.0)];
        assert_eq!(
            select_target(origin, 50.0, &candidates),
            Some(EnemyId::new(2))
        );
    }

    #[test]
    fn empty_candidate_lists_yield_no_target() {
        let origin = WorldPoint::new(0.0, 0.0);
        assert_eq!(select_target(origin, 150.0, &[]), None);
    }

    #[test]
    fn non_positive_ranges_yield_no_target() {
        let origin = WorldPoint::new(0.0, 0.0);
        let candidates = vec![candidate(1, 0.0, 0.0)];
        assert_eq!(select_target(origin, 0.0, &candidates), None);
        assert_eq!(select_target(origin, -5.0, &candidates), None);
    }
}
