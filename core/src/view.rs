//! Read-only snapshots of world state and the capability contracts systems
//! program against.

use std::time::Duration;

use glam::Vec2;

use crate::{
    ActivationId, CellCoord, Damage, DefenderId, DefenderKind, DefenderStats, Direction, Facing,
    Health, Hitbox, HostileId, HostileKind, ProjectileId, ProjectileKind, StatusEffect,
    HOSTILE_BODY_HALF_EXTENT, PROJECTILE_BODY_HALF_EXTENT,
};

/// Entity that defenders can select as a firing target.
pub trait Targetable {
    /// Identifier used for weak target references.
    fn target_id(&self) -> HostileId;

    /// Point defenders measure distance to and aim at.
    fn aim_point(&self) -> Vec2;
}

/// Entity that advances through the world at a modifiable speed.
pub trait Moving {
    /// Current position.
    fn position(&self) -> Vec2;

    /// Speed after status effects active at `now`, in world units per second.
    fn effective_speed(&self, now: Duration) -> f32;
}

/// Entity with a bounded health pool.
pub trait Damageable {
    /// Remaining health.
    fn health(&self) -> Health;

    /// Upper bound of the health pool.
    fn max_health(&self) -> Health;

    /// Subtracts damage, clamping at zero, and returns the remaining health.
    fn take_damage(&mut self, amount: Damage) -> Health;

    /// Reports whether the health pool is exhausted.
    fn is_defeated(&self) -> bool {
        self.health().is_zero()
    }
}

/// Movement slow carried by a hostile, expressed as a factor and a deadline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowState {
    factor: f32,
    expires_at: Duration,
}

impl Default for SlowState {
    fn default() -> Self {
        Self {
            factor: 1.0,
            expires_at: Duration::ZERO,
        }
    }
}

impl SlowState {
    /// Creates a slow that lasts until `expires_at`.
    #[must_use]
    pub fn new(factor: f32, expires_at: Duration) -> Self {
        Self {
            factor: factor.clamp(f32::MIN_POSITIVE, 1.0),
            expires_at,
        }
    }

    /// Stored factor, regardless of expiry.
    #[must_use]
    pub const fn factor(&self) -> f32 {
        self.factor
    }

    /// Deadline after which the slow no longer applies.
    #[must_use]
    pub const fn expires_at(&self) -> Duration {
        self.expires_at
    }

    /// Factor in effect at `now`; reverts to `1.0` once `now` passes the deadline.
    #[must_use]
    pub fn factor_at(&self, now: Duration) -> f32 {
        if now > self.expires_at {
            1.0
        } else {
            self.factor
        }
    }
}

/// Immutable representation of a single hostile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileSnapshot {
    /// Unique identifier assigned to the hostile.
    pub id: HostileId,
    /// Type of the hostile.
    pub kind: HostileKind,
    /// Current position.
    pub position: Vec2,
    /// Index of the last waypoint reached.
    pub waypoint_index: usize,
    /// Speed before status effects.
    pub base_speed: f32,
    /// Active movement slow.
    pub slow: SlowState,
    /// Remaining health.
    pub health: Health,
    /// Upper bound of the health pool.
    pub max_health: Health,
    /// Reward credited on kill.
    pub reward: u32,
    /// Horizontal orientation derived from the last motion.
    pub facing: Facing,
}

impl HostileSnapshot {
    /// Collision body of the hostile.
    #[must_use]
    pub fn body(&self) -> Hitbox {
        Hitbox::new(self.position, Vec2::splat(HOSTILE_BODY_HALF_EXTENT))
    }
}

impl Targetable for HostileSnapshot {
    fn target_id(&self) -> HostileId {
        self.id
    }

    fn aim_point(&self) -> Vec2 {
        self.position
    }
}

impl Moving for HostileSnapshot {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn effective_speed(&self, now: Duration) -> f32 {
        self.base_speed * self.slow.factor_at(now)
    }
}

/// Immutable representation of a single defender used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderSnapshot {
    /// Identifier allocated to the defender by the world.
    pub id: DefenderId,
    /// Type of defender.
    pub kind: DefenderKind,
    /// Cell occupied by the defender.
    pub cell: CellCoord,
    /// World-space centre of the occupied cell.
    pub position: Vec2,
    /// Current upgrade level, starting at one.
    pub level: u8,
    /// Statistics at the current level.
    pub stats: DefenderStats,
    /// Weak reference to the currently selected hostile.
    pub target: Option<HostileId>,
    /// Earliest time the defender may fire again.
    pub next_fire_at: Duration,
}

impl DefenderSnapshot {
    /// Reports whether the cooldown elapsed at `now`.
    #[must_use]
    pub fn ready_at(&self, now: Duration) -> bool {
        now >= self.next_fire_at
    }
}

/// Immutable representation of a single projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile by the world.
    pub id: ProjectileId,
    /// Visual type of the projectile.
    pub kind: ProjectileKind,
    /// Defender that fired the projectile.
    pub source: DefenderId,
    /// Current position.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Damage dealt to the primary target.
    pub damage: Damage,
    /// Splash radius around the primary impact, if any.
    pub splash_radius: Option<f32>,
    /// Status effect applied on impact, if any.
    pub effect: Option<StatusEffect>,
    /// Time after which the projectile is discarded.
    pub expires_at: Duration,
}

impl ProjectileSnapshot {
    /// Collision body of the projectile.
    #[must_use]
    pub fn body(&self) -> Hitbox {
        Hitbox::new(self.position, Vec2::splat(PROJECTILE_BODY_HALF_EXTENT))
    }
}

/// Immutable representation of an active melee swing.
#[derive(Clone, Debug, PartialEq)]
pub struct MeleeSnapshot {
    /// Identifier of the swing.
    pub id: ActivationId,
    /// Region damaged by the swing.
    pub hitbox: Hitbox,
    /// Damage dealt to each hostile the swing touches.
    pub damage: Damage,
    /// Hostiles already damaged by this swing, in ascending order.
    pub already_hit: Vec<HostileId>,
}

impl MeleeSnapshot {
    /// Reports whether the swing already damaged `hostile`.
    #[must_use]
    pub fn has_hit(&self, hostile: HostileId) -> bool {
        self.already_hit.binary_search(&hostile).is_ok()
    }
}

/// Immutable representation of the player-controlled unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current position.
    pub position: Vec2,
    /// Destination the unit walks toward, if any.
    pub destination: Option<Vec2>,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Dominant direction of the last move or swing.
    pub facing: Direction,
    /// Earliest time the unit may swing again.
    pub melee_ready_at: Duration,
}

/// Snapshot of the session's balances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EconomyState {
    /// Currency balance.
    pub gold: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Accumulated score.
    pub score: u32,
    /// One-based number of the latest wave, zero before the first.
    pub current_wave: u32,
    /// Indicates whether lives ran out.
    pub game_over: bool,
}

macro_rules! snapshot_view {
    ($(#[$meta:meta])* $view:ident, $snapshot:ident, $id:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        pub struct $view {
            snapshots: Vec<$snapshot>,
        }

        impl $view {
            /// Creates a view from the provided snapshots, ordered by identifier.
            #[must_use]
            pub fn from_snapshots(mut snapshots: Vec<$snapshot>) -> Self {
                snapshots.sort_by_key(|snapshot| snapshot.id);
                Self { snapshots }
            }

            /// Iterator over the captured snapshots in ascending identifier order.
            pub fn iter(&self) -> impl Iterator<Item = &$snapshot> {
                self.snapshots.iter()
            }

            /// Looks up a snapshot by identifier.
            #[must_use]
            pub fn get(&self, id: $id) -> Option<&$snapshot> {
                self.snapshots
                    .binary_search_by_key(&id, |snapshot| snapshot.id)
                    .ok()
                    .map(|index| &self.snapshots[index])
            }

            /// Number of captured snapshots.
            #[must_use]
            pub fn len(&self) -> usize {
                self.snapshots.len()
            }

            /// Reports whether the view is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.snapshots.is_empty()
            }
        }
    };
}

snapshot_view!(
    /// Read-only snapshot of every active hostile.
    HostileView,
    HostileSnapshot,
    HostileId
);
snapshot_view!(
    /// Read-only snapshot of every defender.
    DefenderView,
    DefenderSnapshot,
    DefenderId
);
snapshot_view!(
    /// Read-only snapshot of every projectile in flight.
    ProjectileView,
    ProjectileSnapshot,
    ProjectileId
);
snapshot_view!(
    /// Read-only snapshot of every melee swing still inside its window.
    MeleeView,
    MeleeSnapshot,
    ActivationId
);
