//! Session balances and the notifications emitted when they change.

use bastion_core::{EconomyConfig, EconomyState, Event};

/// Sole owner of gold, lives, score, the wave counter and the defeat flag.
///
/// Every mutator appends the matching change event so collaborators never
/// observe a balance that was not announced.
#[derive(Clone, Debug)]
pub(crate) struct EconomyLedger {
    state: EconomyState,
}

impl EconomyLedger {
    pub(crate) fn new(config: &EconomyConfig) -> Self {
        Self {
            state: initial_state(config),
        }
    }

    pub(crate) fn state(&self) -> EconomyState {
        self.state
    }

    pub(crate) fn gold(&self) -> u32 {
        self.state.gold
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    /// Restores the starting balances and announces each of them.
    pub(crate) fn reset(&mut self, config: &EconomyConfig, out_events: &mut Vec<Event>) {
        self.state = initial_state(config);
        out_events.push(Event::GoldChanged {
            gold: self.state.gold,
        });
        out_events.push(Event::LivesChanged {
            lives: self.state.lives,
        });
        out_events.push(Event::ScoreChanged {
            score: self.state.score,
        });
    }

    /// Deducts `amount` if the balance covers it.
    ///
    /// Returns `false` without mutating anything when funds are insufficient.
    pub(crate) fn spend(&mut self, amount: u32, out_events: &mut Vec<Event>) -> bool {
        let Some(remaining) = self.state.gold.checked_sub(amount) else {
            return false;
        };
        self.state.gold = remaining;
        out_events.push(Event::GoldChanged { gold: remaining });
        true
    }

    /// Credits a kill reward to both gold and score.
    pub(crate) fn credit_reward(&mut self, reward: u32, out_events: &mut Vec<Event>) {
        self.state.gold = self.state.gold.saturating_add(reward);
        self.state.score = self.state.score.saturating_add(reward);
        out_events.push(Event::GoldChanged {
            gold: self.state.gold,
        });
        out_events.push(Event::ScoreChanged {
            score: self.state.score,
        });
    }

    /// Removes one life and reports whether this mutation ended the session.
    pub(crate) fn lose_life(&mut self, out_events: &mut Vec<Event>) -> bool {
        self.state.lives = self.state.lives.saturating_sub(1);
        out_events.push(Event::LivesChanged {
            lives: self.state.lives,
        });

        if self.state.lives == 0 && !self.state.game_over {
            self.state.game_over = true;
            return true;
        }
        false
    }

    pub(crate) fn set_wave(&mut self, wave: u32) {
        self.state.current_wave = wave;
    }
}

fn initial_state(config: &EconomyConfig) -> EconomyState {
    EconomyState {
        gold: config.starting_gold,
        lives: config.starting_lives,
        score: 0,
        current_wave: 0,
        game_over: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_is_all_or_nothing() {
        let mut ledger = EconomyLedger::new(&EconomyConfig::default());
        let mut events = Vec::new();

        assert!(ledger.spend(150, &mut events));
        assert!(!ledger.spend(100, &mut events));
        assert_eq!(ledger.gold(), 50);
        assert_eq!(events, vec![Event::GoldChanged { gold: 50 }]);
    }

    #[test]
    fn reward_credits_gold_and_score() {
        let mut ledger = EconomyLedger::new(&EconomyConfig::default());
        let mut events = Vec::new();
        ledger.credit_reward(10, &mut events);

        assert_eq!(ledger.state().gold, 210);
        assert_eq!(ledger.state().score, 10);
        assert_eq!(
            events,
            vec![
                Event::GoldChanged { gold: 210 },
                Event::ScoreChanged { score: 10 }
            ]
        );
    }

    #[test]
    fn losing_the_last_life_ends_the_session_once() {
        let config = EconomyConfig {
            starting_gold: 0,
            starting_lives: 1,
        };
        let mut ledger = EconomyLedger::new(&config);
        let mut events = Vec::new();

        assert!(ledger.lose_life(&mut events));
        assert!(!ledger.lose_life(&mut events));
        assert!(ledger.is_game_over());
        assert_eq!(ledger.state().lives, 0);
    }
}
