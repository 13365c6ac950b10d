#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Damage resolution for towers: cooldowns, elemental matchups, secondary
//! effects and chained shots, plus the upgrade and sale economics.

use std::time::Duration;

use endless_defence_core::{
    EnemyId, EnemyKind, Event, PlayerEconomy, SecondaryEffect, SellError, TowerId, TowerProfile,
    UpgradeError,
};
use endless_defence_system_tower_targeting::{nearest_chain_target, select_target};
use endless_defence_world::{EnemyArena, Tower, TowerRegistry, World};
use rand::Rng;

/// Damage factor applied when the tower is weak against the enemy kind.
pub const WEAK_MULTIPLIER: f32 = 0.5;

/// Damage factor applied when the enemy kind is one of the tower's priorities.
pub const PRIORITY_MULTIPLIER: f32 = 1.5;

/// Default share of the cumulative spend refunded on sale.
pub const DEFAULT_SELL_REFUND_FRACTION: f32 = 0.7;

/// Combat system that resolves every tower once per tick.
#[derive(Debug, Default)]
pub struct TowerCombat {
    chain_hits: Vec<EnemyId>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every tower in identifier order.
    pub fn handle<R>(
        &mut self,
        towers: &mut TowerRegistry,
        enemies: &mut EnemyArena,
        dt: Duration,
        now: Duration,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        for tower in towers.iter_mut() {
            self.resolve_tick(tower, enemies, dt, now, rng, out);
        }
    }

    /// Counts the tower's cooldown down, re-acquires its target and fires when ready.
    pub fn resolve_tick<R>(
        &mut self,
        tower: &mut Tower,
        enemies: &mut EnemyArena,
        dt: Duration,
        now: Duration,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        let ready = tower.tick_cooldown(dt);
        let target = select_target(tower, enemies);
        tower.set_target(target);

        let (true, Some(primary)) = (ready, target) else {
            return;
        };

        tower.reset_cooldown();
        out.push(Event::TowerFired {
            tower: tower.id(),
            target: primary,
        });

        let profile = *tower.profile();
        let rolled = profile
            .secondary
            .filter(|effect| rng.gen::<f32>() < effect.chance);

        strike(&profile, enemies, primary, tower.damage(), out);
        if let Some(effect) = rolled {
            inflict(enemies, primary, effect, effect.duration, now, out);
        }

        let Some(chain) = profile.chain else {
            return;
        };

        self.chain_hits.clear();
        self.chain_hits.push(primary);
        let mut origin = match enemies.get(primary) {
            Some(enemy) => enemy.position(),
            None => return,
        };
        let mut damage = tower.damage();

        for _ in 0..chain.max_jumps {
            let Some(next) =
                nearest_chain_target(&profile, enemies, origin, chain.hop_radius, &self.chain_hits)
            else {
                break;
            };

            damage *= chain.damage_reduction;
            strike(&profile, enemies, next, damage, out);
            if let Some(effect) = rolled {
                let duration = effect.duration.mul_f32(chain.effect_duration_factor);
                inflict(enemies, next, effect, duration, now, out);
            }

            self.chain_hits.push(next);
            if let Some(enemy) = enemies.get(next) {
                origin = enemy.position();
            }
        }
    }
}

/// Combined matchup factor for a tower profile against an enemy kind.
#[must_use]
pub fn matchup_multiplier(profile: &TowerProfile, kind: EnemyKind) -> f32 {
    let mut multiplier = 1.0;
    if profile.weak_against.contains(kind) {
        multiplier *= WEAK_MULTIPLIER;
    }
    if profile.target_priorities.contains(kind) {
        multiplier *= PRIORITY_MULTIPLIER;
    }
    multiplier
}

/// Damage that remains after the enemy's resistance.
#[must_use]
pub fn mitigated_damage(raw: f32, resistance: f32) -> f32 {
    raw * (1.0 - resistance)
}

fn strike(
    profile: &TowerProfile,
    enemies: &mut EnemyArena,
    target: EnemyId,
    base_damage: f32,
    out: &mut Vec<Event>,
) {
    let Some(enemy) = enemies.get_mut(target) else {
        tracing::debug!(enemy = target.get(), "strike on unknown enemy");
        return;
    };

    let raw = base_damage * matchup_multiplier(profile, enemy.kind());
    let amount = mitigated_damage(raw, enemy.resistance());
    let _ = enemy.take_damage(amount);
    out.push(Event::DamageDealt {
        enemy: target,
        position: enemy.position(),
        amount,
        element: Some(profile.element),
    });
}

fn inflict(
    enemies: &mut EnemyArena,
    target: EnemyId,
    effect: SecondaryEffect,
    duration: Duration,
    now: Duration,
    out: &mut Vec<Event>,
) {
    let Some(enemy) = enemies.get_mut(target) else {
        return;
    };
    if !enemy.is_alive() {
        return;
    }

    enemy.apply_status(effect.kind, duration, effect.strength, now);
    out.push(Event::StatusApplied {
        enemy: target,
        kind: effect.kind,
    });
}

/// Charges the next upgrade price and raises the tower's level.
///
/// Nothing is charged or mutated when the tower is missing, already at its
/// maximum level, or the player cannot afford the price.
pub fn upgrade_tower<E>(
    towers: &mut TowerRegistry,
    id: TowerId,
    economy: &mut E,
) -> Result<u32, UpgradeError>
where
    E: PlayerEconomy + ?Sized,
{
    let tower = towers.get_mut(id).ok_or(UpgradeError::MissingTower)?;
    let cost = tower.next_upgrade_cost().ok_or(UpgradeError::MaxLevel)?;
    if !economy.spend_money(cost) {
        return Err(UpgradeError::InsufficientFunds);
    }
    tower.upgrade(cost)
}

/// Removes the tower from the world and refunds part of its cumulative spend.
pub fn sell_tower<E>(
    world: &mut World,
    id: TowerId,
    refund_fraction: f32,
    economy: &mut E,
) -> Result<u32, SellError>
where
    E: PlayerEconomy + ?Sized,
{
    let tower = world.remove_tower(id).ok_or(SellError::MissingTower)?;
    let refund = tower.sell_value(refund_fraction);
    economy.add_money(refund);
    Ok(refund)
}
