#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-enemy ledger of timed status effects.
//!
//! Each [`StatusKind`] is either absent or active; re-applying an active kind
//! restarts its window with the new duration and strength instead of
//! stacking. All time arrives as an explicit `now` read from the match clock
//! so the ledger never consults ambient time on its own.

use std::{collections::BTreeMap, time::Duration};

use endless_defence_core::StatusKind;

/// Fixed interval between two burn damage applications.
pub const BURN_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Speed multiplier applied while an enemy is confused.
pub const CONFUSED_SPEED_FACTOR: f32 = 0.6;

/// Active status entry stored for a single kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEntry {
    /// Kind of the effect.
    pub kind: StatusKind,
    /// Instant after which the effect is removed.
    pub end_time: Duration,
    /// Effect-specific magnitude.
    pub strength: f32,
}

/// Outcome of applying a status to the ledger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Application {
    /// The status was recorded (or refreshed) as a timed entry.
    Timed,
    /// The status is instantaneous; the owner should knock the enemy back.
    Push {
        /// Distance to displace the enemy back along its path.
        distance: f32,
    },
}

/// Timed effect ledger owned by a single enemy.
#[derive(Clone, Debug, Default)]
pub struct StatusLedger {
    entries: BTreeMap<StatusKind, StatusEntry>,
    next_burn_at: Option<Duration>,
}

impl StatusLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a status, overwriting any active entry of the same kind.
    pub fn apply(
        &mut self,
        kind: StatusKind,
        duration: Duration,
        strength: f32,
        now: Duration,
    ) -> Application {
        if kind == StatusKind::Pushed {
            return Application::Push { distance: strength };
        }

        let entry = StatusEntry {
            kind,
            end_time: now.saturating_add(duration),
            strength,
        };
        // An entry past its end time counts as absent even before `tick` prunes it.
        let was_active = self
            .entries
            .insert(kind, entry)
            .is_some_and(|previous| now <= previous.end_time);

        if kind == StatusKind::Burning && !(was_active && self.next_burn_at.is_some()) {
            self.next_burn_at = Some(now.saturating_add(BURN_TICK_INTERVAL));
        }

        Application::Timed
    }

    /// Processes burn ticks and expiries up to `now`.
    ///
    /// Returns the burn damage accumulated since the previous call and appends
    /// every kind that expired to `expired`. Burn ticks that elapsed during a
    /// long frame are caught up rather than dropped.
    pub fn tick(&mut self, now: Duration, expired: &mut Vec<StatusKind>) -> f32 {
        let burn_damage = self.collect_burn(now);

        let before = expired.len();
        for entry in self.entries.values() {
            if now > entry.end_time {
                expired.push(entry.kind);
            }
        }
        for kind in &expired[before..] {
            let _ = self.entries.remove(kind);
            if *kind == StatusKind::Burning {
                self.next_burn_at = None;
            }
        }

        burn_damage
    }

    fn collect_burn(&mut self, now: Duration) -> f32 {
        let Some(burning) = self.entries.get(&StatusKind::Burning).copied() else {
            self.next_burn_at = None;
            return 0.0;
        };
        let Some(mut next) = self.next_burn_at else {
            return 0.0;
        };

        let horizon = now.min(burning.end_time);
        let mut damage = 0.0;
        while next <= horizon {
            damage += burning.strength;
            next = next.saturating_add(BURN_TICK_INTERVAL);
        }
        self.next_burn_at = Some(next);
        damage
    }

    /// Multiplier applied to the owner's original speed.
    ///
    /// Frozen forces zero regardless of any other entry; Slowed and Confused
    /// compose multiplicatively otherwise.
    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        if self.is_active(StatusKind::Frozen) {
            return 0.0;
        }

        let mut factor = 1.0;
        if let Some(slowed) = self.entries.get(&StatusKind::Slowed) {
            factor *= (1.0 - slowed.strength).clamp(0.0, 1.0);
        }
        if self.is_active(StatusKind::Confused) {
            factor *= CONFUSED_SPEED_FACTOR;
        }
        factor
    }

    /// Whether the owner must skip movement this tick.
    #[must_use]
    pub fn halts_movement(&self) -> bool {
        self.is_active(StatusKind::Frozen) || self.is_active(StatusKind::Stunned)
    }

    /// Whether the kind is currently active.
    #[must_use]
    pub fn is_active(&self, kind: StatusKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Active entry for the kind, if any.
    #[must_use]
    pub fn entry(&self, kind: StatusKind) -> Option<&StatusEntry> {
        self.entries.get(&kind)
    }

    /// Iterator over active entries ordered by kind.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.values()
    }

    /// Reports whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f32) -> Duration {
        Duration::from_secs_f32(value)
    }

    #[test]
    fn reapplication_overwrites_instead_of_stacking() {
        let mut ledger = StatusLedger::new();
        let _ = ledger.apply(StatusKind::Slowed, secs(2.0), 0.3, secs(0.0));
        let _ = ledger.apply(StatusKind::Slowed, secs(1.0), 0.5, secs(1.5));

        let entry = ledger.entry(StatusKind::Slowed).expect("slowed entry");
        assert_eq!(entry.end_time, secs(2.5));
        assert_eq!(entry.strength, 0.5);
        assert_eq!(ledger.iter().count(), 1);
    }

    #[test]
    fn frozen_dominates_slowed_and_slowed_survives_thaw() {
        let mut ledger = StatusLedger::new();
        let mut expired = Vec::new();
        let _ = ledger.apply(StatusKind::Slowed, secs(5.0), 0.5, secs(0.0));
        let _ = ledger.apply(StatusKind::Frozen, secs(1.0), 1.0, secs(0.0));
        assert_eq!(ledger.speed_factor(), 0.0);
        assert!(ledger.halts_movement());

        let _ = ledger.tick(secs(1.5), &mut expired);
        assert_eq!(expired, vec![StatusKind::Frozen]);
        assert!((ledger.speed_factor() - 0.5).abs() < f32::EPSILON);
        assert!(!ledger.halts_movement());
    }

    #[test]
    fn expiry_requires_now_past_end_time() {
        let mut ledger = StatusLedger::new();
        let mut expired = Vec::new();
        let _ = ledger.apply(StatusKind::Stunned, secs(1.0), 1.0, secs(0.0));

        let _ = ledger.tick(secs(1.0), &mut expired);
        assert!(expired.is_empty(), "entry must survive until now > end_time");
        assert!(ledger.is_active(StatusKind::Stunned));

        let _ = ledger.tick(secs(1.01), &mut expired);
        assert_eq!(expired, vec![StatusKind::Stunned]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn burn_ticks_every_half_second_independent_of_frame_size() {
        let mut ledger = StatusLedger::new();
        let mut expired = Vec::new();
        let _ = ledger.apply(StatusKind::Burning, secs(3.0), 2.0, secs(0.0));

        assert_eq!(ledger.tick(secs(0.4), &mut expired), 0.0);
        assert_eq!(ledger.tick(secs(0.5), &mut expired), 2.0);
        assert_eq!(ledger.tick(secs(0.9), &mut expired), 0.0);
        // A long frame catches up on the missed ticks at 1.0, 1.5 and 2.0.
        assert_eq!(ledger.tick(secs(2.2), &mut expired), 6.0);
        assert!(expired.is_empty());
    }

    #[test]
    fn burn_stops_at_end_time() {
        let mut ledger = StatusLedger::new();
        let mut expired = Vec::new();
        let _ = ledger.apply(StatusKind::Burning, secs(1.0), 3.0, secs(0.0));

        let damage = ledger.tick(secs(10.0), &mut expired);
        assert_eq!(damage, 6.0, "only the ticks at 0.5s and 1.0s fall inside the window");
        assert_eq!(expired, vec![StatusKind::Burning]);
        assert_eq!(ledger.tick(secs(11.0), &mut expired), 0.0);
    }

    #[test]
    fn burn_reapplied_after_unticked_expiry_restarts_its_schedule() {
        let mut ledger = StatusLedger::new();
        let mut expired = Vec::new();
        let _ = ledger.apply(StatusKind::Burning, secs(1.0), 2.0, secs(0.0));
        let _ = ledger.apply(StatusKind::Burning, secs(1.0), 2.0, secs(10.0));

        assert_eq!(ledger.tick(secs(10.4), &mut expired), 0.0);
        assert_eq!(
            ledger.tick(secs(10.5), &mut expired),
            2.0,
            "the idle gap before the second burn is never billed"
        );
        assert!(expired.is_empty());
    }

    #[test]
    fn burn_refresh_while_active_keeps_the_cadence() {
        let mut ledger = StatusLedger::new();
        let mut expired = Vec::new();
        let _ = ledger.apply(StatusKind::Burning, secs(2.0), 1.0, secs(0.0));
        let _ = ledger.apply(StatusKind::Burning, secs(2.0), 4.0, secs(0.3));

        assert_eq!(ledger.tick(secs(0.5), &mut expired), 4.0);
        assert_eq!(ledger.tick(secs(1.0), &mut expired), 4.0);
    }

    #[test]
    fn push_is_not_retained() {
        let mut ledger = StatusLedger::new();
        let outcome = ledger.apply(StatusKind::Pushed, Duration::ZERO, 0.6, secs(0.0));
        assert_eq!(outcome, Application::Push { distance: 0.6 });
        assert!(ledger.is_empty());
    }

    #[test]
    fn confusion_reduces_speed_without_halting() {
        let mut ledger = StatusLedger::new();
        let _ = ledger.apply(StatusKind::Confused, secs(2.0), 1.0, secs(0.0));
        assert!((ledger.speed_factor() - CONFUSED_SPEED_FACTOR).abs() < f32::EPSILON);
        assert!(!ledger.halts_movement());
    }
}
