//! Player-controlled unit and its melee activations.

use std::{
    collections::{BTreeMap, HashSet},
    time::Duration,
};

use bastion_core::{
    ActivationId, Damage, Direction, Hitbox, HostileId, MeleeSnapshot, PlayerConfig,
    PlayerSnapshot, Vec2,
};

#[derive(Clone, Debug)]
pub(crate) struct PlayerUnit {
    pub(crate) position: Vec2,
    pub(crate) destination: Option<Vec2>,
    pub(crate) speed: f32,
    pub(crate) facing: Direction,
    pub(crate) melee_ready_at: Duration,
}

impl PlayerUnit {
    pub(crate) fn spawn(position: Vec2, config: &PlayerConfig) -> Self {
        Self {
            position,
            destination: None,
            speed: config.speed,
            facing: Direction::default(),
            melee_ready_at: Duration::ZERO,
        }
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            destination: self.destination,
            speed: self.speed,
            facing: self.facing,
            melee_ready_at: self.melee_ready_at,
        }
    }
}

#[derive(Clone, Debug)]
struct Activation {
    hitbox: Hitbox,
    damage: Damage,
    expires_at: Duration,
    hit: HashSet<HostileId>,
}

/// Live melee swings keyed by activation, each with its own hit set.
#[derive(Clone, Debug)]
pub(crate) struct MeleeLedger {
    activations: BTreeMap<ActivationId, Activation>,
    next_activation_id: u32,
}

impl MeleeLedger {
    pub(crate) fn new() -> Self {
        Self {
            activations: BTreeMap::new(),
            next_activation_id: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.activations.clear();
    }

    pub(crate) fn open(
        &mut self,
        hitbox: Hitbox,
        damage: Damage,
        expires_at: Duration,
    ) -> ActivationId {
        let id = ActivationId::new(self.next_activation_id);
        self.next_activation_id = self.next_activation_id.wrapping_add(1);
        let _ = self.activations.insert(
            id,
            Activation {
                hitbox,
                damage,
                expires_at,
                hit: HashSet::new(),
            },
        );
        id
    }

    /// Records a hit and yields the swing damage when `hostile` was not hit before.
    pub(crate) fn record_hit(&mut self, id: ActivationId, hostile: HostileId) -> Option<Damage> {
        let activation = self.activations.get_mut(&id)?;
        if activation.hit.insert(hostile) {
            Some(activation.damage)
        } else {
            None
        }
    }

    /// Closes every swing whose window ended at or before `now`.
    pub(crate) fn expire(&mut self, now: Duration) {
        self.activations
            .retain(|_, activation| now < activation.expires_at);
    }

    pub(crate) fn snapshots(&self) -> Vec<MeleeSnapshot> {
        self.activations
            .iter()
            .map(|(id, activation)| {
                let mut already_hit: Vec<HostileId> = activation.hit.iter().copied().collect();
                already_hit.sort_unstable();
                MeleeSnapshot {
                    id: *id,
                    hitbox: activation.hitbox,
                    damage: activation.damage,
                    already_hit,
                }
            })
            .collect()
    }
}
