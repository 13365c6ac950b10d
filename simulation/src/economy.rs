use endless_defence_core::PlayerEconomy;

/// In-memory player counters used by the headless runner and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Purse {
    money: u32,
    health: u32,
    kills: u32,
}

impl Purse {
    /// Creates a purse holding the provided money and health.
    #[must_use]
    pub const fn new(money: u32, health: u32) -> Self {
        Self {
            money,
            health,
            kills: 0,
        }
    }

    /// Number of enemies killed so far.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }
}

impl PlayerEconomy for Purse {
    fn money(&self) -> u32 {
        self.money
    }

    fn spend_money(&mut self, amount: u32) -> bool {
        match self.money.checked_sub(amount) {
            Some(left) => {
                self.money = left;
                true
            }
            None => false,
        }
    }

    fn add_money(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    fn health(&self) -> u32 {
        self.health
    }

    fn apply_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    fn add_kill(&mut self) {
        self.kills = self.kills.saturating_add(1);
    }
}
