//! Wave progression and spawn pacing.

use std::time::Duration;

use rampart_core::level::WavePlan;

/// Tracks the running wave, its unspawned enemies, and the spawn timer.
#[derive(Debug, Default)]
pub(crate) struct WaveScheduler {
    wave_index: u32,
    remaining: Vec<u32>,
    spawn_timer: Duration,
    kills: u32,
}

impl WaveScheduler {
    /// Creates a scheduler with no wave loaded.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Index of the wave currently being played.
    pub(crate) const fn wave_index(&self) -> u32 {
        self.wave_index
    }

    /// Enemies killed since the running wave started.
    pub(crate) const fn kills(&self) -> u32 {
        self.kills
    }

    /// Records one kill against the running wave.
    pub(crate) fn record_kill(&mut self) {
        self.kills += 1;
    }

    /// True once every spawn group of the running wave has drained.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.remaining.iter().all(|count| *count == 0)
    }

    /// Restarts spawning at the provided wave.
    pub(crate) fn start_wave(&mut self, index: u32, wave: &WavePlan) {
        self.wave_index = index;
        self.remaining = wave.groups.iter().map(|group| group.count).collect();
        self.spawn_timer = Duration::ZERO;
        self.kills = 0;
    }

    /// Advances the spawn timer and reports at most one due spawn.
    ///
    /// Groups drain in authored order and each gates the timer on its own
    /// interval. The timer restarts from zero after a spawn, so a large `dt`
    /// never releases more than one enemy.
    pub(crate) fn next_spawn(&mut self, dt: Duration, wave: &WavePlan) -> Option<usize> {
        self.spawn_timer = self.spawn_timer.saturating_add(dt);
        let group_index = self.remaining.iter().position(|count| *count > 0)?;
        let group = wave.groups.get(group_index)?;
        if self.spawn_timer >= group.interval {
            self.remaining[group_index] -= 1;
            self.spawn_timer = Duration::ZERO;
            Some(group_index)
        } else {
            None
        }
    }
}
