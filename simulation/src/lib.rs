#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Match orchestration for Endless Defence.
//!
//! [`Simulation`] owns the world, the wave manager and the combat and movement
//! systems, and executes [`Command`] values against them. Every tick runs in
//! a fixed order: towers resolve, enemies update their statuses and move, dead
//! and leaked enemies are removed, and only then does the wave manager check
//! whether the wave cleared. Spawns and map extensions requested by the wave
//! manager are applied last.

mod config;
mod economy;

use std::time::Duration;

use endless_defence_core::{
    Clock, Command, CommandError, EnemyId, Event, PlacementError, PlayerEconomy, SimulationClock,
    StatusKind, TowerId, TowerKind,
};
use endless_defence_system_movement::Movement;
use endless_defence_system_spawning::{Config as WaveConfig, WaveManager, WavePhase};
use endless_defence_system_tower_combat::{sell_tower, upgrade_tower, TowerCombat};
use endless_defence_world::{derive_stream_seed, Enemy, World};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use config::{
    ConfigError, GridConfig, MatchConfig, DEFAULT_SEED, DEFAULT_STARTING_HEALTH,
    DEFAULT_STARTING_MONEY, MAX_TIME_SCALE,
};
pub use economy::Purse;

/// Distance within which a boss can smash a tower.
pub const SIEGE_RADIUS: f32 = 3.0;

const COMBAT_STREAM_LABEL: &str = "combat";
const MOVEMENT_STREAM_LABEL: &str = "movement";

/// Authoritative match state plus the systems that advance it.
#[derive(Debug)]
pub struct Simulation<E = Purse, C = SimulationClock> {
    world: World,
    waves: WaveManager,
    combat: TowerCombat,
    movement: Movement,
    combat_rng: ChaCha8Rng,
    movement_rng: ChaCha8Rng,
    economy: E,
    clock: C,
    time_scale: f32,
    paused: bool,
    sell_refund_fraction: f32,
    lost: bool,
    reached_end: Vec<EnemyId>,
    finished: Vec<Enemy>,
    expired: Vec<StatusKind>,
    sieges: Vec<(EnemyId, Vec3)>,
}

impl Simulation {
    /// Creates a match with an in-memory purse and a simulation-driven clock.
    #[must_use]
    pub fn from_config(config: &MatchConfig) -> Self {
        let economy = Purse::new(config.starting_money, config.starting_health);
        Self::new(config, economy, SimulationClock::default())
    }
}

impl<E, C> Simulation<E, C>
where
    E: PlayerEconomy,
    C: Clock,
{
    /// Creates a match driven by the provided economy and clock collaborators.
    #[must_use]
    pub fn new(config: &MatchConfig, economy: E, clock: C) -> Self {
        let stream =
            |label: &str| ChaCha8Rng::seed_from_u64(derive_stream_seed(config.seed, label, 0));
        Self {
            world: World::new(config.seed, config.grid.into()),
            waves: WaveManager::new(WaveConfig::new(config.auto_wave_delay())),
            combat: TowerCombat::new(),
            movement: Movement::new(),
            combat_rng: stream(COMBAT_STREAM_LABEL),
            movement_rng: stream(MOVEMENT_STREAM_LABEL),
            economy,
            clock,
            time_scale: sanitize_time_scale(config.time_scale).unwrap_or(1.0),
            paused: false,
            sell_refund_fraction: config.sell_refund_fraction,
            lost: false,
            reached_end: Vec::new(),
            finished: Vec::new(),
            expired: Vec::new(),
            sieges: Vec::new(),
        }
    }

    /// Read access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world for scripted scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Read access to the wave manager.
    #[must_use]
    pub const fn waves(&self) -> &WaveManager {
        &self.waves
    }

    /// Read access to the player economy.
    #[must_use]
    pub const fn economy(&self) -> &E {
        &self.economy
    }

    /// Scaled simulation time elapsed so far.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Factor applied to every tick's delta time.
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Reports whether ticks are currently skipped.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reports whether the player ran out of health.
    #[must_use]
    pub const fn is_lost(&self) -> bool {
        self.lost
    }

    /// Executes a command, appending the resulting events to `out`.
    ///
    /// Rejected commands leave the match untouched and emit nothing.
    pub fn apply(&mut self, command: Command, out: &mut Vec<Event>) -> Result<(), CommandError> {
        if self.lost {
            return Err(CommandError::MatchOver);
        }

        let result = self.execute(command, out);
        if let Err(error) = &result {
            tracing::debug!(%error, "command rejected");
        }
        result
    }

    fn execute(&mut self, command: Command, out: &mut Vec<Event>) -> Result<(), CommandError> {
        match command {
            Command::Tick { dt } => self.tick(dt, out),
            Command::PlaceTower { kind, position } => self.place_tower(kind, position, out)?,
            Command::UpgradeTower { tower } => {
                let level = upgrade_tower(self.world.towers_mut(), tower, &mut self.economy)?;
                out.push(Event::TowerUpgraded { tower, level });
            }
            Command::SellTower { tower } => {
                let refund = sell_tower(
                    &mut self.world,
                    tower,
                    self.sell_refund_fraction,
                    &mut self.economy,
                )?;
                out.push(Event::TowerSold { tower, refund });
            }
            Command::AdvanceWave => self.waves.advance(out),
            Command::SetTimeScale { scale } => match sanitize_time_scale(scale) {
                Some(scale) => self.time_scale = scale,
                None => tracing::warn!(scale, "ignoring non-finite time scale"),
            },
            Command::SetPaused { paused } => self.paused = paused,
        }
        Ok(())
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        position: Vec3,
        out: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        let placement = self.world.check_placement(position)?;
        if !self.economy.spend_money(kind.profile().cost) {
            return Err(PlacementError::InsufficientFunds.into());
        }
        let tower = self.world.place_tower(kind, placement);
        out.push(Event::TowerPlaced {
            tower,
            kind,
            position: placement.position,
        });
        Ok(())
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.paused {
            return;
        }

        let dt = scaled(dt, self.time_scale);
        self.clock.advance(dt);
        let now = self.clock.now();
        out.push(Event::TimeAdvanced { dt });

        let (towers, enemies) = self.world.combatants_mut();
        self.combat
            .handle(towers, enemies, dt, now, &mut self.combat_rng, out);

        self.update_enemies(dt, now, out);
        self.remove_finished(out);

        if self.economy.health() == 0 {
            self.lose(out);
            return;
        }

        self.update_waves(dt, out);
    }

    fn update_enemies(&mut self, dt: Duration, now: Duration, out: &mut Vec<Event>) {
        self.sieges.clear();
        for enemy in self.world.enemies_mut().iter_mut() {
            if !enemy.is_alive() || enemy.has_reached_end() {
                continue;
            }
            let burned = enemy.update_statuses(now, &mut self.expired);
            if burned > 0.0 {
                out.push(Event::DamageDealt {
                    enemy: enemy.id(),
                    position: enemy.position(),
                    amount: burned,
                    element: None,
                });
            }
            if enemy.tick_siege(dt) {
                self.sieges.push((enemy.id(), enemy.position()));
            }
        }
        self.expired.clear();

        for index in 0..self.sieges.len() {
            let (boss, position) = self.sieges[index];
            self.siege(boss, position, out);
        }

        self.movement.handle(
            self.world.enemies_mut(),
            dt,
            &mut self.movement_rng,
            &mut self.reached_end,
        );
        self.reached_end.clear();
    }

    fn siege(&mut self, boss: EnemyId, position: Vec3, out: &mut Vec<Event>) {
        let Some(tower) = self.world.nearest_tower(position, SIEGE_RADIUS) else {
            return;
        };
        if self.world.remove_tower(tower).is_none() {
            return;
        }
        if let Some(enemy) = self.world.enemies_mut().get_mut(boss) {
            enemy.reset_siege();
        }
        tracing::info!(tower = tower.get(), boss = boss.get(), "tower destroyed by siege");
        out.push(Event::TowerDestroyed { tower, by: boss });
    }

    fn remove_finished(&mut self, out: &mut Vec<Event>) {
        self.world.remove_finished(&mut self.finished);
        for enemy in self.finished.drain(..) {
            if !enemy.is_alive() {
                self.economy.add_money(enemy.reward());
                self.economy.add_kill();
                out.push(Event::EnemyDied {
                    enemy: enemy.id(),
                    reward: enemy.reward(),
                });
            } else {
                self.economy.apply_damage(enemy.damage());
                out.push(Event::EnemyReachedEnd {
                    enemy: enemy.id(),
                    damage: enemy.damage(),
                });
            }
        }
    }

    fn update_waves(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let update = self.waves.update(dt, self.world.enemies().active_count());
        out.extend(update.events);
        if update.reward > 0 {
            self.economy.add_money(update.reward);
        }

        if update.extend_map {
            let extension = self.world.extend_map();
            out.push(Event::SegmentExtended {
                segment: extension.segment,
            });
        }

        for spawn in update.spawns {
            let enemy = self.world.spawn_enemy(spawn.kind, spawn.stats);
            let position = self
                .world
                .enemies()
                .get(enemy)
                .map_or(Vec3::ZERO, Enemy::position);
            out.push(Event::EnemySpawned {
                enemy,
                kind: spawn.kind,
                position,
            });
        }
    }

    fn lose(&mut self, out: &mut Vec<Event>) {
        self.lost = true;
        let absolute_wave = match self.waves.phase() {
            WavePhase::InProgress => self.waves.absolute_wave(),
            WavePhase::Ready | WavePhase::Countdown { .. } => {
                self.waves.absolute_wave().saturating_sub(1)
            }
        };
        tracing::info!(wave = absolute_wave, "match lost");
        out.push(Event::MatchLost { absolute_wave });
    }

    /// Identifiers of every tower currently standing, in ascending order.
    #[must_use]
    pub fn tower_ids(&self) -> Vec<TowerId> {
        self.world.towers().iter().map(|tower| tower.id()).collect()
    }
}

fn scaled(dt: Duration, scale: f32) -> Duration {
    if scale == 1.0 {
        return dt;
    }
    Duration::try_from_secs_f64(dt.as_secs_f64() * f64::from(scale)).unwrap_or(Duration::MAX)
}

fn sanitize_time_scale(scale: f32) -> Option<f32> {
    scale.is_finite().then(|| scale.clamp(0.0, MAX_TIME_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use endless_defence_world::CellState;

    const FRAME: Duration = Duration::from_millis(50);

    fn open_cell(simulation: &Simulation) -> Vec3 {
        let grid = simulation.world().map().segments()[0].grid();
        let (cell, _) = grid
            .iter()
            .find(|(_, state)| *state == CellState::Open)
            .expect("open cell");
        grid.center(cell)
    }

    #[test]
    fn placement_charges_the_purse_and_snaps_to_the_cell() {
        let mut simulation = Simulation::from_config(&MatchConfig::default());
        let position = open_cell(&simulation);
        let mut events = Vec::new();

        simulation
            .apply(
                Command::PlaceTower {
                    kind: TowerKind::Archer,
                    position: position + Vec3::new(0.2, 0.0, 0.2),
                },
                &mut events,
            )
            .expect("placement succeeds");

        assert_eq!(simulation.economy().money(), DEFAULT_STARTING_MONEY - 50);
        assert_eq!(
            events,
            vec![Event::TowerPlaced {
                tower: TowerId::new(0),
                kind: TowerKind::Archer,
                position,
            }]
        );
    }

    #[test]
    fn unaffordable_placement_is_rejected_without_mutation() {
        let config = MatchConfig {
            starting_money: 10,
            ..MatchConfig::default()
        };
        let mut simulation = Simulation::from_config(&config);
        let position = open_cell(&simulation);
        let mut events = Vec::new();

        let result = simulation.apply(
            Command::PlaceTower {
                kind: TowerKind::Archer,
                position,
            },
            &mut events,
        );

        assert_eq!(
            result,
            Err(CommandError::Placement(PlacementError::InsufficientFunds))
        );
        assert!(events.is_empty());
        assert!(simulation.world().towers().is_empty());
        assert_eq!(simulation.economy().money(), 10);
    }

    #[test]
    fn paused_ticks_are_skipped_entirely() {
        let mut simulation = Simulation::from_config(&MatchConfig::default());
        let mut events = Vec::new();
        simulation
            .apply(Command::SetPaused { paused: true }, &mut events)
            .expect("pause");
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick");

        assert!(events.is_empty());
        assert_eq!(simulation.now(), Duration::ZERO);
    }

    #[test]
    fn time_scale_multiplies_every_tick() {
        let mut simulation = Simulation::from_config(&MatchConfig::default());
        let mut events = Vec::new();
        simulation
            .apply(Command::SetTimeScale { scale: 2.0 }, &mut events)
            .expect("scale");
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick");

        assert_eq!(simulation.now(), FRAME * 2);
        assert_eq!(events, vec![Event::TimeAdvanced { dt: FRAME * 2 }]);

        simulation
            .apply(Command::SetTimeScale { scale: f32::NAN }, &mut events)
            .expect("ignored");
        assert_eq!(simulation.time_scale(), 2.0);
    }

    #[test]
    fn oversized_time_scale_is_clamped() {
        let mut simulation = Simulation::from_config(&MatchConfig::default());
        let mut events = Vec::new();
        simulation
            .apply(Command::SetTimeScale { scale: 1e30 }, &mut events)
            .expect("clamped");
        assert_eq!(simulation.time_scale(), MAX_TIME_SCALE);

        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick");
        assert_eq!(simulation.now(), Duration::from_secs(5));
    }

    #[test]
    fn overflowing_scaled_frame_saturates() {
        assert_eq!(scaled(Duration::MAX, MAX_TIME_SCALE), Duration::MAX);
    }

    #[test]
    fn selling_refunds_seventy_percent() {
        let mut simulation = Simulation::from_config(&MatchConfig::default());
        let position = open_cell(&simulation);
        let mut events = Vec::new();
        simulation
            .apply(
                Command::PlaceTower {
                    kind: TowerKind::Archer,
                    position,
                },
                &mut events,
            )
            .expect("placed");
        simulation
            .apply(
                Command::UpgradeTower {
                    tower: TowerId::new(0),
                },
                &mut events,
            )
            .expect("upgraded");
        events.clear();

        simulation
            .apply(
                Command::SellTower {
                    tower: TowerId::new(0),
                },
                &mut events,
            )
            .expect("sold");

        assert_eq!(
            events,
            vec![Event::TowerSold {
                tower: TowerId::new(0),
                refund: 61
            }]
        );
        assert_eq!(simulation.economy().money(), 200 - 50 - 38 + 61);
        assert!(simulation.tower_ids().is_empty());
    }
}
