#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use std::time::Duration;

use bastion_core::{Command, DefenderTarget, DefenderView};

/// Defender combat system that queues firing commands for ready defenders.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for engaged defenders whose
    /// cooldown elapsed at `now`.
    pub fn handle(
        &mut self,
        now: Duration,
        defenders: &DefenderView,
        targets: &[DefenderTarget],
        out: &mut Vec<Command>,
    ) {
        if targets.is_empty() || defenders.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            if let Some(snapshot) = defenders.get(target.defender) {
                if snapshot.ready_at(now) {
                    self.scratch.push(Command::FireProjectile {
                        defender: target.defender,
                        target: target.hostile,
                    });
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
