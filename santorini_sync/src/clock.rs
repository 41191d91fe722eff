// Local display clock between ledger entries.
//
// The ledger's `ClockState` is authoritative: every adopted entry resets
// both sides' remaining time. Between entries the controller ticks the side
// to move down locally so a UI can show a running clock. Elapsed time is
// accumulated and only whole `tick_ms` steps are subtracted, so feeding the
// clock many small updates gives the same result as one large one.
//
// Reaching zero is reported once per expiry as a *provisional* time loss;
// only the ledger can finish the match on time.
//
// The clock only runs while armed. The controller arms it for the side to
// move in a live, non-terminal game and disarms it otherwise.

use santorini_protocol::ClockState;
use santorini_sim::types::Player;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalClock {
    remaining: [u64; 2],
    running: Option<Player>,
    carry_ms: u64,
    tick_ms: u64,
    expired: Option<Player>,
}

impl LocalClock {
    pub fn new(initial_ms: u64, tick_ms: u64) -> Self {
        Self {
            remaining: [initial_ms; 2],
            running: None,
            carry_ms: 0,
            tick_ms: tick_ms.max(1),
            expired: None,
        }
    }

    /// Take the ledger's clock readings as the new truth.
    pub fn adopt(&mut self, state: ClockState) {
        self.remaining = [state.player0_remaining_ms, state.player1_remaining_ms];
        self.carry_ms = 0;
        self.expired = Player::ALL
            .into_iter()
            .find(|p| self.remaining[p.index()] == 0);
    }

    /// Start (or keep) running `side`'s clock.
    pub fn arm(&mut self, side: Player) {
        if self.running != Some(side) {
            self.carry_ms = 0;
        }
        self.running = Some(side);
    }

    pub fn disarm(&mut self) {
        self.running = None;
        self.carry_ms = 0;
    }

    pub fn running(&self) -> Option<Player> {
        self.running
    }

    /// Tick the running side down by the whole ticks contained in
    /// `elapsed_ms` plus any carried remainder. Returns the side whose
    /// clock just reached zero, once.
    pub fn advance(&mut self, elapsed_ms: u64) -> Option<Player> {
        let side = self.running?;
        self.carry_ms = self.carry_ms.saturating_add(elapsed_ms);
        let ticks = self.carry_ms / self.tick_ms;
        self.carry_ms %= self.tick_ms;
        let left = &mut self.remaining[side.index()];
        *left = left.saturating_sub(ticks.saturating_mul(self.tick_ms));
        if *left == 0 && self.expired.is_none() {
            self.expired = Some(side);
            return Some(side);
        }
        None
    }

    pub fn remaining(&self, side: Player) -> u64 {
        self.remaining[side.index()]
    }

    /// The side whose clock has run out, if any.
    pub fn expired(&self) -> Option<Player> {
        self.expired
    }

    pub fn state(&self) -> ClockState {
        ClockState::new(self.remaining[0], self.remaining[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disarmed_clock_does_not_move() {
        let mut clock = LocalClock::new(1_000, 100);
        assert_eq!(clock.advance(5_000), None);
        assert_eq!(clock.state(), ClockState::even(1_000));
    }

    #[test]
    fn only_whole_ticks_are_subtracted() {
        let mut clock = LocalClock::new(1_000, 100);
        clock.arm(Player::Zero);
        clock.advance(50);
        assert_eq!(clock.remaining(Player::Zero), 1_000);
        clock.advance(60);
        assert_eq!(clock.remaining(Player::Zero), 900);
        clock.advance(90);
        assert_eq!(clock.remaining(Player::Zero), 800);
        assert_eq!(clock.remaining(Player::One), 1_000);
    }

    #[test]
    fn expiry_reported_once() {
        let mut clock = LocalClock::new(200, 100);
        clock.arm(Player::One);
        assert_eq!(clock.advance(150), None);
        assert_eq!(clock.advance(100), Some(Player::One));
        assert_eq!(clock.advance(100), None);
        assert_eq!(clock.expired(), Some(Player::One));
        assert_eq!(clock.remaining(Player::One), 0);
    }

    #[test]
    fn switching_sides_drops_the_carry() {
        let mut clock = LocalClock::new(1_000, 100);
        clock.arm(Player::Zero);
        clock.advance(90);
        clock.arm(Player::One);
        clock.advance(20);
        assert_eq!(clock.state(), ClockState::even(1_000));
    }

    #[test]
    fn adopt_overrides_local_time() {
        let mut clock = LocalClock::new(200, 100);
        clock.arm(Player::Zero);
        clock.advance(300);
        assert_eq!(clock.expired(), Some(Player::Zero));
        clock.adopt(ClockState::new(5_000, 4_000));
        assert_eq!(clock.expired(), None);
        assert_eq!(clock.remaining(Player::Zero), 5_000);
        assert_eq!(clock.running(), Some(Player::Zero));
        clock.disarm();
        assert_eq!(clock.running(), None);
    }
}
