//! Authoritative entity storage and identifier allocation.

use std::{collections::BTreeMap, time::Duration};

use bastion_core::{
    CellCoord, Damage, Damageable, DefenderId, DefenderKind, DefenderSnapshot, DefenderStats,
    Facing, Health, HostileId, HostileKind, HostileSnapshot, HostileType, ProjectileId,
    ProjectileKind, ProjectileSnapshot, SlowState, StatusEffect, Vec2,
};

/// Hostile stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Hostile {
    pub(crate) kind: HostileKind,
    pub(crate) position: Vec2,
    pub(crate) waypoint_index: usize,
    pub(crate) base_speed: f32,
    pub(crate) slow: SlowState,
    pub(crate) health: Health,
    pub(crate) max_health: Health,
    pub(crate) reward: u32,
    pub(crate) facing: Facing,
    removal_pending: bool,
}

impl Hostile {
    /// Creates a hostile at full health standing on the first waypoint.
    pub(crate) fn spawn(entry: &HostileType, position: Vec2) -> Self {
        Self {
            kind: entry.kind,
            position,
            waypoint_index: 0,
            base_speed: entry.speed,
            slow: SlowState::default(),
            health: Health::new(entry.health),
            max_health: Health::new(entry.health),
            reward: entry.reward,
            facing: Facing::Right,
            removal_pending: false,
        }
    }

    /// Applies a status effect that lasts from `now` for its configured duration.
    pub(crate) fn apply_effect(&mut self, effect: StatusEffect, now: Duration) {
        match effect {
            StatusEffect::Slow { factor, .. } => {
                self.slow = SlowState::new(factor, now.saturating_add(effect.duration()));
            }
        }
    }

    fn snapshot(&self, id: HostileId) -> HostileSnapshot {
        HostileSnapshot {
            id,
            kind: self.kind,
            position: self.position,
            waypoint_index: self.waypoint_index,
            base_speed: self.base_speed,
            slow: self.slow,
            health: self.health,
            max_health: self.max_health,
            reward: self.reward,
            facing: self.facing,
        }
    }
}

impl Damageable for Hostile {
    fn health(&self) -> Health {
        self.health
    }

    fn max_health(&self) -> Health {
        self.max_health
    }

    fn take_damage(&mut self, amount: Damage) -> Health {
        self.health = self.health.saturating_sub(amount).min(self.max_health);
        self.health
    }
}

/// Defender stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Defender {
    pub(crate) kind: DefenderKind,
    pub(crate) cell: CellCoord,
    pub(crate) position: Vec2,
    pub(crate) level: u8,
    pub(crate) stats: DefenderStats,
    pub(crate) target: Option<HostileId>,
    pub(crate) next_fire_at: Duration,
}

impl Defender {
    /// Creates a level one defender that may fire immediately.
    pub(crate) fn construct(
        kind: DefenderKind,
        cell: CellCoord,
        position: Vec2,
        stats: DefenderStats,
    ) -> Self {
        Self {
            kind,
            cell,
            position,
            level: 1,
            stats,
            target: None,
            next_fire_at: Duration::ZERO,
        }
    }

    fn snapshot(&self, id: DefenderId) -> DefenderSnapshot {
        DefenderSnapshot {
            id,
            kind: self.kind,
            cell: self.cell,
            position: self.position,
            level: self.level,
            stats: self.stats,
            target: self.target,
            next_fire_at: self.next_fire_at,
        }
    }
}

/// Projectile stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) kind: ProjectileKind,
    pub(crate) source: DefenderId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) damage: Damage,
    pub(crate) splash_radius: Option<f32>,
    pub(crate) effect: Option<StatusEffect>,
    pub(crate) expires_at: Duration,
}

impl Projectile {
    fn snapshot(&self, id: ProjectileId) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id,
            kind: self.kind,
            source: self.source,
            position: self.position,
            velocity: self.velocity,
            damage: self.damage,
            splash_radius: self.splash_radius,
            effect: self.effect,
            expires_at: self.expires_at,
        }
    }
}

/// Registry that stores every live entity and manages identifier allocation.
///
/// Identifiers keep increasing across [`EntityRegistry::clear`] so that stale
/// references held by collaborators never alias entities of a later session.
#[derive(Debug)]
pub(crate) struct EntityRegistry {
    hostiles: BTreeMap<HostileId, Hostile>,
    defenders: BTreeMap<DefenderId, Defender>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_hostile_id: u32,
    next_defender_id: u32,
    next_projectile_id: u32,
}

impl EntityRegistry {
    /// Creates an empty registry with reset identifier counters.
    pub(crate) fn new() -> Self {
        Self {
            hostiles: BTreeMap::new(),
            defenders: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            next_hostile_id: 0,
            next_defender_id: 0,
            next_projectile_id: 0,
        }
    }

    /// Drops every entity while preserving identifier counters.
    pub(crate) fn clear(&mut self) {
        self.hostiles.clear();
        self.defenders.clear();
        self.projectiles.clear();
    }

    pub(crate) fn insert_hostile(&mut self, hostile: Hostile) -> HostileId {
        let id = HostileId::new(self.next_hostile_id);
        self.next_hostile_id = self.next_hostile_id.wrapping_add(1);
        let _ = self.hostiles.insert(id, hostile);
        id
    }

    /// Looks up a hostile that has not been scheduled for removal.
    pub(crate) fn active_hostile(&self, id: HostileId) -> Option<&Hostile> {
        self.hostiles
            .get(&id)
            .filter(|hostile| !hostile.removal_pending)
    }

    pub(crate) fn active_hostile_mut(&mut self, id: HostileId) -> Option<&mut Hostile> {
        self.hostiles
            .get_mut(&id)
            .filter(|hostile| !hostile.removal_pending)
    }

    /// Excludes the hostile from every view until the next prune removes it.
    pub(crate) fn schedule_hostile_removal(&mut self, id: HostileId) {
        if let Some(hostile) = self.hostiles.get_mut(&id) {
            hostile.removal_pending = true;
        }
    }

    /// Removes every hostile scheduled for removal and reports how many were dropped.
    pub(crate) fn prune(&mut self) -> usize {
        let before = self.hostiles.len();
        self.hostiles.retain(|_, hostile| !hostile.removal_pending);
        before - self.hostiles.len()
    }

    pub(crate) fn active_hostile_count(&self) -> usize {
        self.hostiles
            .values()
            .filter(|hostile| !hostile.removal_pending)
            .count()
    }

    pub(crate) fn hostile_snapshots(&self) -> Vec<HostileSnapshot> {
        self.hostiles
            .iter()
            .filter(|(_, hostile)| !hostile.removal_pending)
            .map(|(id, hostile)| hostile.snapshot(*id))
            .collect()
    }

    pub(crate) fn insert_defender(&mut self, defender: Defender) -> DefenderId {
        let id = DefenderId::new(self.next_defender_id);
        self.next_defender_id = self.next_defender_id.wrapping_add(1);
        let _ = self.defenders.insert(id, defender);
        id
    }

    pub(crate) fn defender(&self, id: DefenderId) -> Option<&Defender> {
        self.defenders.get(&id)
    }

    pub(crate) fn defender_mut(&mut self, id: DefenderId) -> Option<&mut Defender> {
        self.defenders.get_mut(&id)
    }

    pub(crate) fn defender_snapshots(&self) -> Vec<DefenderSnapshot> {
        self.defenders
            .iter()
            .map(|(id, defender)| defender.snapshot(*id))
            .collect()
    }

    pub(crate) fn insert_projectile(&mut self, projectile: Projectile) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        let _ = self.projectiles.insert(id, projectile);
        id
    }

    pub(crate) fn remove_projectile(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }

    /// Moves every projectile along its velocity and drops those past their deadline.
    ///
    /// Returns the identifiers of expired projectiles in ascending order.
    pub(crate) fn advance_projectiles(
        &mut self,
        seconds: f32,
        now: Duration,
    ) -> Vec<ProjectileId> {
        let mut expired = Vec::new();
        for (id, projectile) in &mut self.projectiles {
            projectile.position += projectile.velocity * seconds;
            if now >= projectile.expires_at {
                expired.push(*id);
            }
        }

        for id in &expired {
            let _ = self.projectiles.remove(id);
        }
        expired
    }

    pub(crate) fn projectile_snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.projectiles
            .iter()
            .map(|(id, projectile)| projectile.snapshot(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> HostileType {
        HostileType {
            kind: HostileKind::Basic,
            speed: 50.0,
            health: 100,
            reward: 10,
        }
    }

    #[test]
    fn registry_starts_empty_with_zero_identifiers() {
        let mut registry = EntityRegistry::new();
        assert_eq!(registry.active_hostile_count(), 0);
        let first = registry.insert_hostile(Hostile::spawn(&basic(), Vec2::ZERO));
        let second = registry.insert_hostile(Hostile::spawn(&basic(), Vec2::ZERO));
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn scheduled_hostiles_leave_views_before_prune() {
        let mut registry = EntityRegistry::new();
        let id = registry.insert_hostile(Hostile::spawn(&basic(), Vec2::ZERO));
        registry.schedule_hostile_removal(id);

        assert!(registry.active_hostile(id).is_none());
        assert!(registry.hostile_snapshots().is_empty());
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.prune(), 0);
    }

    #[test]
    fn identifiers_survive_clear() {
        let mut registry = EntityRegistry::new();
        let _ = registry.insert_hostile(Hostile::spawn(&basic(), Vec2::ZERO));
        registry.clear();
        let next = registry.insert_hostile(Hostile::spawn(&basic(), Vec2::ZERO));
        assert_eq!(next.get(), 1);
        assert_eq!(registry.active_hostile_count(), 1);
    }

    #[test]
    fn damage_clamps_health_at_zero() {
        let mut hostile = Hostile::spawn(&basic(), Vec2::ZERO);
        assert_eq!(hostile.take_damage(Damage::new(60)), Health::new(40));
        assert_eq!(hostile.take_damage(Damage::new(60)), Health::new(0));
        assert!(hostile.is_defeated());
        assert!(hostile.health() <= hostile.max_health());
    }
}
