#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic defender targets from world snapshots.

use bastion_core::{
    Command, DefenderTarget, DefenderView, HostileId, HostileView, Targetable, Vec2,
};

/// Defender targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    hostile_workspace: Vec<HostileCandidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates or reacquires the target of every defender.
    ///
    /// A defender keeps its current target while that hostile is still in
    /// play and within range. Otherwise the closest hostile within range is
    /// selected; hostiles are scanned in ascending identifier order and only a
    /// strictly closer candidate replaces the current pick, so the first one
    /// encountered wins exact ties. `out_targets` is cleared and receives one
    /// entry per engaged defender. Target changes are emitted as
    /// [`Command::AssignTarget`] into `out_commands`.
    pub fn handle(
        &mut self,
        defenders: &DefenderView,
        hostiles: &HostileView,
        out_targets: &mut Vec<DefenderTarget>,
        out_commands: &mut Vec<Command>,
    ) {
        out_targets.clear();
        if defenders.is_empty() {
            return;
        }

        self.prepare_hostile_workspace(hostiles);

        for defender in defenders.iter() {
            let range = defender.stats.range;
            let retained = defender.target.and_then(|current| {
                self.candidate(current)
                    .map(|candidate| (current, candidate.position.distance(defender.position)))
                    .filter(|(_, distance)| *distance <= range)
            });

            let selected = retained.or_else(|| self.closest(defender.position, range));
            let next_target = selected.map(|(hostile, _)| hostile);
            if next_target != defender.target {
                out_commands.push(Command::AssignTarget {
                    defender: defender.id,
                    target: next_target,
                });
            }

            if let Some((hostile, distance)) = selected {
                out_targets.push(DefenderTarget {
                    defender: defender.id,
                    hostile,
                    distance,
                });
            }
        }
    }

    fn prepare_hostile_workspace(&mut self, hostiles: &HostileView) {
        self.hostile_workspace.clear();
        self.hostile_workspace.reserve(hostiles.len());
        for snapshot in hostiles.iter() {
            self.hostile_workspace.push(HostileCandidate {
                id: snapshot.target_id(),
                position: snapshot.aim_point(),
            });
        }
    }

    fn candidate(&self, id: HostileId) -> Option<&HostileCandidate> {
        self.hostile_workspace
            .binary_search_by_key(&id, |candidate| candidate.id)
            .ok()
            .map(|index| &self.hostile_workspace[index])
    }

    fn closest(&self, origin: Vec2, range: f32) -> Option<(HostileId, f32)> {
        let mut best: Option<(HostileId, f32)> = None;
        for candidate in &self.hostile_workspace {
            let distance = candidate.position.distance(origin);
            if distance > range {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((candidate.id, distance)),
            }
        }
        best
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HostileCandidate {
    id: HostileId,
    position: Vec2,
}
