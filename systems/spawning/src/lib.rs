#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave and difficulty manager driving the endless sequence of waves.
//!
//! The manager cycles `Ready → InProgress → Countdown → InProgress …`. It owns
//! the spawn schedules of the running wave (plus any parallel overlays) and
//! two counters: the wave number within the current map segment and the
//! match-wide absolute wave number, related by
//! `absolute = segment_index * WAVES_PER_SEGMENT + segment_wave`.

use std::{collections::VecDeque, time::Duration};

use endless_defence_core::{EnemyKind, EnemyStats, Event, WAVES_PER_SEGMENT};
use endless_defence_system_wave_generation::{generate_composition, scaled_stats, WaveComposition};

/// Default pause between a cleared wave and the next automatic one.
pub const DEFAULT_AUTO_WAVE_DELAY: Duration = Duration::from_secs(10);

/// Configuration parameters required to construct the wave manager.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    auto_wave_delay: Duration,
}

impl Config {
    /// Creates a new configuration using the provided auto-wave delay.
    #[must_use]
    pub const fn new(auto_wave_delay: Duration) -> Self {
        Self { auto_wave_delay }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_WAVE_DELAY)
    }
}

/// Lifecycle phase of the wave manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Waiting for the player to start the first wave.
    Ready,
    /// Enemies are spawning or still alive.
    InProgress,
    /// Counting down towards the next automatic wave.
    Countdown {
        /// Time left until the next wave starts.
        remaining: Duration,
    },
}

/// Enemy the simulation should insert into the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Difficulty-scaled stats of the enemy.
    pub stats: EnemyStats,
}

/// Everything produced by a single [`WaveManager::update`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveUpdate {
    /// Enemies to spawn at the head of the composite path, in order.
    pub spawns: Vec<SpawnRequest>,
    /// Wave lifecycle events.
    pub events: Vec<Event>,
    /// Set when a segment's final wave was cleared and the map must grow.
    pub extend_map: bool,
    /// Money earned by clearing a wave during this update.
    pub reward: u32,
}

#[derive(Clone, Debug)]
struct SpawnSchedule {
    wave: u32,
    pending: VecDeque<(EnemyKind, Duration)>,
    elapsed: Duration,
}

impl SpawnSchedule {
    fn from_composition(wave: u32, composition: &WaveComposition) -> Self {
        let mut pending = VecDeque::with_capacity(composition.total_enemies() as usize);
        for group in composition.groups() {
            for _ in 0..group.count {
                let delay = if pending.is_empty() {
                    Duration::ZERO
                } else {
                    group.delay
                };
                pending.push_back((group.kind, delay));
            }
        }
        Self {
            wave,
            pending,
            elapsed: Duration::ZERO,
        }
    }

    fn drain_due(&mut self, dt: Duration, out: &mut Vec<SpawnRequest>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        while let Some(&(kind, delay)) = self.pending.front() {
            if self.elapsed < delay {
                break;
            }
            self.elapsed -= delay;
            let _ = self.pending.pop_front();
            out.push(SpawnRequest {
                kind,
                stats: scaled_stats(kind, self.wave),
            });
        }
    }

    fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

/// State machine that schedules waves and tracks progression counters.
#[derive(Debug)]
pub struct WaveManager {
    auto_wave_delay: Duration,
    phase: WavePhase,
    segment_index: u32,
    segment_wave: u32,
    absolute_wave: u32,
    schedules: Vec<SpawnSchedule>,
    pending_reward: u32,
    planned: u32,
    spawned: u32,
}

impl WaveManager {
    /// Creates a manager that waits for the first wave to be started.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            auto_wave_delay: config.auto_wave_delay,
            phase: WavePhase::Ready,
            segment_index: 0,
            segment_wave: 1,
            absolute_wave: 1,
            schedules: Vec::new(),
            pending_reward: 0,
            planned: 0,
            spawned: 0,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Index of the map segment the current wave belongs to.
    #[must_use]
    pub const fn segment_index(&self) -> u32 {
        self.segment_index
    }

    /// Wave number within the current segment, in `1..=WAVES_PER_SEGMENT`.
    #[must_use]
    pub const fn segment_wave(&self) -> u32 {
        self.segment_wave
    }

    /// Match-wide number of the running (or next) wave.
    #[must_use]
    pub const fn absolute_wave(&self) -> u32 {
        self.absolute_wave
    }

    /// Enemies scheduled for the running wave, overlays included.
    #[must_use]
    pub const fn planned_this_wave(&self) -> u32 {
        self.planned
    }

    /// Enemies already handed out for the running wave.
    #[must_use]
    pub const fn spawned_this_wave(&self) -> u32 {
        self.spawned
    }

    /// Starts the next wave now, or overlays a parallel wave onto a running one.
    pub fn advance(&mut self, out: &mut Vec<Event>) {
        match self.phase {
            WavePhase::Ready | WavePhase::Countdown { .. } => self.start_wave(out),
            WavePhase::InProgress => {
                let composition = generate_composition(self.absolute_wave);
                self.schedules
                    .push(SpawnSchedule::from_composition(self.absolute_wave, &composition));
                self.pending_reward = self.pending_reward.saturating_add(composition.reward());
                self.planned = self.planned.saturating_add(composition.total_enemies());
                tracing::info!(
                    wave = self.absolute_wave,
                    enemies = composition.total_enemies(),
                    "parallel wave overlaid"
                );
                out.push(Event::ParallelWaveStarted {
                    absolute_wave: self.absolute_wave,
                });
            }
        }
    }

    /// Advances spawn timers and the countdown by `dt`.
    ///
    /// `alive_wave_enemies` is the number of enemies still on the map after
    /// this tick's removal pass; the wave only clears once it reaches zero and
    /// every schedule is exhausted.
    pub fn update(&mut self, dt: Duration, alive_wave_enemies: usize) -> WaveUpdate {
        let mut update = WaveUpdate::default();
        let mut spawn_dt = dt;

        if let WavePhase::Countdown { remaining } = self.phase {
            if dt < remaining {
                self.phase = WavePhase::Countdown {
                    remaining: remaining - dt,
                };
                return update;
            }
            spawn_dt = dt - remaining;
            self.start_wave(&mut update.events);
        }

        if self.phase != WavePhase::InProgress {
            return update;
        }

        for schedule in &mut self.schedules {
            schedule.drain_due(spawn_dt, &mut update.spawns);
        }
        self.schedules.retain(|schedule| !schedule.is_exhausted());
        self.spawned = self.spawned.saturating_add(update.spawns.len() as u32);

        if self.schedules.is_empty() && update.spawns.is_empty() && alive_wave_enemies == 0 {
            self.clear_wave(&mut update);
        }

        update
    }

    fn start_wave(&mut self, out: &mut Vec<Event>) {
        let composition = generate_composition(self.absolute_wave);
        self.schedules.clear();
        self.schedules
            .push(SpawnSchedule::from_composition(self.absolute_wave, &composition));
        self.pending_reward = composition.reward();
        self.planned = composition.total_enemies();
        self.spawned = 0;
        self.phase = WavePhase::InProgress;

        tracing::info!(
            wave = self.absolute_wave,
            segment_wave = self.segment_wave,
            enemies = self.planned,
            "wave started"
        );
        out.push(Event::WaveStarted {
            absolute_wave: self.absolute_wave,
            segment_wave: self.segment_wave,
        });
    }

    fn clear_wave(&mut self, update: &mut WaveUpdate) {
        debug_assert_eq!(self.spawned, self.planned, "cleared wave spawned a different count");

        update.reward = self.pending_reward;
        update.events.push(Event::WaveCleared {
            absolute_wave: self.absolute_wave,
            reward: self.pending_reward,
        });
        tracing::info!(
            wave = self.absolute_wave,
            reward = self.pending_reward,
            "wave cleared"
        );
        self.pending_reward = 0;

        self.absolute_wave = self.absolute_wave.saturating_add(1);
        if self.segment_wave >= WAVES_PER_SEGMENT {
            update.extend_map = true;
            self.segment_index = self.segment_index.saturating_add(1);
            self.segment_wave = 1;
        } else {
            self.segment_wave += 1;
        }
        debug_assert_eq!(
            self.absolute_wave,
            self.segment_index * WAVES_PER_SEGMENT + self.segment_wave,
            "wave counters diverged"
        );

        self.phase = WavePhase::Countdown {
            remaining: self.auto_wave_delay,
        };
        update.events.push(Event::CountdownStarted {
            remaining: self.auto_wave_delay,
        });
    }
}

impl Default for WaveManager {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_spawns_first_enemy_immediately_then_waits() {
        let composition = generate_composition(1);
        let mut schedule = SpawnSchedule::from_composition(1, &composition);
        let mut out = Vec::new();

        schedule.drain_due(Duration::ZERO, &mut out);
        assert_eq!(out.len(), 1);

        schedule.drain_due(Duration::from_millis(799), &mut out);
        assert_eq!(out.len(), 1);

        schedule.drain_due(Duration::from_millis(1), &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn long_frames_release_every_due_spawn() {
        let composition = generate_composition(1);
        let mut schedule = SpawnSchedule::from_composition(1, &composition);
        let mut out = Vec::new();

        schedule.drain_due(Duration::from_secs(60), &mut out);

        assert_eq!(out.len(), 5);
        assert!(schedule.is_exhausted());
    }
}
