#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bastion defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems and presentation collaborators react to. Systems consume event
//! streams, query immutable snapshot views, and respond exclusively with new
//! command batches.

mod catalog;
mod view;

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{
    CombatConfig, ConfigError, DefenderKind, DefenderStats, DefenderType, EconomyConfig,
    GridLayout, HostileKind, HostileType, PlayerConfig, ProjectileKind, Route, SessionConfig,
    SpawnGroup, StatusEffect, UpgradeModifiers, WaveDefinition, MIN_SLOW_FACTOR,
};
pub use view::{
    Damageable, DefenderSnapshot, DefenderView, EconomyState, HostileSnapshot, HostileView,
    MeleeSnapshot, MeleeView, Moving, PlayerSnapshot, ProjectileSnapshot, ProjectileView,
    SlowState, Targetable,
};

/// Distance below which a moving unit counts as having reached its waypoint.
pub const ARRIVAL_THRESHOLD: f32 = 5.0;

/// Half of the edge length of the square collision body carried by hostiles.
pub const HOSTILE_BODY_HALF_EXTENT: f32 = 12.0;

/// Half of the edge length of the square collision body carried by projectiles.
pub const PROJECTILE_BODY_HALF_EXTENT: f32 = 8.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
        /// Monotonic session time at the end of this tick.
        now: Duration,
    },
    /// Discards every entity and restores economy and grid defaults.
    ResetSession,
    /// Announces that a wave has begun releasing hostiles.
    StartWave {
        /// One-based number of the wave.
        wave: u32,
        /// Total number of hostiles the wave will release.
        hostiles: u32,
    },
    /// Creates a hostile at the start of the route.
    SpawnHostile {
        /// Type of hostile to create.
        kind: HostileKind,
    },
    /// Moves a hostile to a new position along the route.
    AdvanceHostile {
        /// Identifier of the hostile that moved.
        hostile: HostileId,
        /// Position reached at the end of the tick.
        position: Vec2,
        /// Index of the last waypoint the hostile reached.
        waypoint_index: usize,
        /// Horizontal orientation derived from the motion.
        facing: Facing,
    },
    /// Removes a hostile that reached the final waypoint and charges a life.
    EscapeHostile {
        /// Identifier of the hostile that reached the goal.
        hostile: HostileId,
    },
    /// Announces that every hostile of the wave has been resolved.
    DeclareWaveCleared {
        /// One-based number of the cleared wave.
        wave: u32,
    },
    /// Announces that every configured wave has been completed.
    DeclareVictory,
    /// Requests that the player unit walk toward a destination.
    SetPlayerDestination {
        /// World-space destination.
        destination: Vec2,
    },
    /// Moves the player unit to a new position.
    MovePlayer {
        /// Position reached at the end of the tick.
        position: Vec2,
        /// Dominant direction of travel.
        facing: Direction,
        /// Indicates whether the destination was reached.
        arrived: bool,
    },
    /// Requests a melee swing toward the provided point.
    ActivateMelee {
        /// World-space point the swing is aimed at.
        target: Vec2,
    },
    /// Updates the weak target reference held by a defender.
    AssignTarget {
        /// Defender whose target changed.
        defender: DefenderId,
        /// Newly selected hostile, if any.
        target: Option<HostileId>,
    },
    /// Requests that a defender launch a projectile at a hostile.
    FireProjectile {
        /// Defender that fires.
        defender: DefenderId,
        /// Hostile the projectile is aimed at.
        target: HostileId,
    },
    /// Resolves a projectile impact into damage applications.
    ApplyHit {
        /// Projectile consumed by the impact.
        projectile: ProjectileId,
        /// Damage and effects applied to each affected hostile.
        applications: Vec<DamageApplication>,
    },
    /// Applies melee damage from an activation to an overlapping hostile.
    ApplyMeleeHit {
        /// Activation that produced the hit.
        activation: ActivationId,
        /// Hostile overlapping the activation hitbox.
        hostile: HostileId,
    },
    /// Requests construction of a defender on a grid cell.
    PlaceDefender {
        /// Type of defender to construct.
        kind: DefenderKind,
        /// Cell that will host the defender.
        cell: CellCoord,
    },
    /// Requests that a defender advance to its next upgrade level.
    UpgradeDefender {
        /// Identifier of the defender to upgrade.
        defender: DefenderId,
    },
    /// Drops every entity scheduled for removal during the tick and closes
    /// melee swings whose window has ended.
    PruneRemoved,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Monotonic session time after the tick.
        now: Duration,
    },
    /// Confirms that the session was reset to its initial state.
    SessionRestarted,
    /// Reports the updated score.
    ScoreChanged {
        /// Score after the mutation.
        score: u32,
    },
    /// Reports the updated currency balance.
    GoldChanged {
        /// Currency balance after the mutation.
        gold: u32,
    },
    /// Reports the updated number of remaining lives.
    LivesChanged {
        /// Lives remaining after the mutation.
        lives: u32,
    },
    /// Announces the start of a wave.
    WaveStarted {
        /// One-based number of the wave.
        wave: u32,
    },
    /// Announces that every hostile of the wave was killed or escaped.
    AllEnemiesDefeated {
        /// One-based number of the cleared wave.
        wave: u32,
    },
    /// Announces that the player ran out of lives.
    GameOver,
    /// Announces that every wave was completed.
    GameWon,
    /// Confirms that a hostile entered the route.
    HostileSpawned {
        /// Identifier assigned to the hostile.
        hostile: HostileId,
        /// Type of hostile that was created.
        kind: HostileKind,
        /// Spawn position.
        position: Vec2,
    },
    /// Reports damage taken by a hostile.
    HostileDamaged {
        /// Hostile that took damage.
        hostile: HostileId,
        /// Amount of damage applied.
        amount: Damage,
        /// Health remaining after the damage.
        health: Health,
    },
    /// Reports that a hostile reached the final waypoint.
    HostileReachedGoal {
        /// Hostile that escaped.
        hostile: HostileId,
    },
    /// Reports that a hostile's health reached zero.
    HostileDefeated {
        /// Hostile that was defeated.
        hostile: HostileId,
        /// Reward credited for the kill.
        reward: u32,
    },
    /// Confirms that a defender was constructed.
    DefenderPlaced {
        /// Identifier assigned to the defender.
        defender: DefenderId,
        /// Type of defender constructed.
        kind: DefenderKind,
        /// Cell occupied by the defender.
        cell: CellCoord,
        /// World-space centre of the occupied cell.
        position: Vec2,
    },
    /// Reports that a placement request was rejected.
    DefenderPlacementRejected {
        /// Type of defender requested.
        kind: DefenderKind,
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a defender advanced a level.
    DefenderUpgraded {
        /// Defender that was upgraded.
        defender: DefenderId,
        /// Level reached after the upgrade.
        level: u8,
    },
    /// Reports that an upgrade request was rejected.
    DefenderUpgradeRejected {
        /// Defender targeted by the request.
        defender: DefenderId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a defender launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Defender that fired.
        defender: DefenderId,
        /// Hostile the projectile was aimed at.
        target: HostileId,
        /// Visual type of the projectile.
        kind: ProjectileKind,
    },
    /// Reports that a projectile outlived its lifetime without hitting.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
    },
    /// Confirms a new walk destination for the player unit.
    PlayerDestinationSet {
        /// Accepted destination in world units.
        destination: Vec2,
    },
    /// Reports that the player unit moved.
    PlayerMoved {
        /// Position after the move.
        position: Vec2,
        /// Dominant direction of travel.
        facing: Direction,
    },
    /// Announces a melee swing and the region it covers.
    MeleeActivated {
        /// Identifier assigned to the swing.
        activation: ActivationId,
        /// Region damaged by the swing.
        hitbox: Hitbox,
    },
}

/// Damage and status effect applied to a single hostile by one impact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageApplication {
    /// Hostile receiving the damage.
    pub hostile: HostileId,
    /// Amount of damage to subtract from the hostile's health.
    pub amount: Damage,
    /// Status effect carried by the impact, if any.
    pub effect: Option<StatusEffect>,
}

/// Firing solution describing which hostile a defender is engaging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderTarget {
    /// Identifier of the defender that selected the hostile.
    pub defender: DefenderId,
    /// Identifier of the hostile being engaged.
    pub hostile: HostileId,
    /// Euclidean distance between the defender and the hostile.
    pub distance: f32,
}

/// Horizontal orientation of a hostile, derived from the sign of its motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Moving toward decreasing x.
    Left,
    /// Moving toward increasing x, or not moving horizontally.
    #[default]
    Right,
}

impl Facing {
    /// Derives the facing from a horizontal displacement.
    #[must_use]
    pub fn from_dx(dx: f32) -> Self {
        if dx < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Cardinal directions used for the player unit's orientation and swings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward decreasing y.
    North,
    /// Toward increasing x.
    East,
    /// Toward increasing y.
    #[default]
    South,
    /// Toward decreasing x.
    West,
}

impl Direction {
    /// Picks the cardinal direction along the dominant axis of `delta`.
    ///
    /// Horizontal wins only when strictly dominant, so diagonal and zero
    /// deltas resolve vertically.
    #[must_use]
    pub fn dominant(delta: Vec2) -> Self {
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 {
                Self::East
            } else {
                Self::West
            }
        } else if delta.y > 0.0 {
            Self::South
        } else {
            Self::North
        }
    }

    /// Unit vector pointing in this direction.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Self::North => Vec2::new(0.0, -1.0),
            Self::East => Vec2::new(1.0, 0.0),
            Self::South => Vec2::new(0.0, 1.0),
            Self::West => Vec2::new(-1.0, 0.0),
        }
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier assigned to a hostile.
    HostileId
);
entity_id!(
    /// Unique identifier assigned to a defender.
    DefenderId
);
entity_id!(
    /// Unique identifier assigned to a projectile.
    ProjectileId
);
entity_id!(
    /// Unique identifier assigned to a single melee swing.
    ActivationId
);

/// Remaining hit points of a hostile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(u32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts damage, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, damage: Damage) -> Self {
        Self(self.0.saturating_sub(damage.0))
    }
}

/// Amount of hit points removed by an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Damage(u32);

impl Damage {
    /// Creates a new damage value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Placement state of a single build grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    /// The cell is free for construction and player movement.
    Walkable,
    /// The cell is permanently blocked by the layout.
    Obstacle,
    /// The cell hosts a defender and is blocked for future placement.
    Occupied(DefenderId),
}

/// Axis-aligned rectangle used for overlap tests.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    center: Vec2,
    half_extents: Vec2,
}

impl Hitbox {
    /// Creates a hitbox centred on `center` with the provided half extents.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Creates a square hitbox with the provided edge length.
    #[must_use]
    pub fn square(center: Vec2, size: f32) -> Self {
        Self::new(center, Vec2::splat(size * 0.5))
    }

    /// Centre of the rectangle.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Half of the rectangle's width and height.
    #[must_use]
    pub const fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Reports whether the two rectangles share interior area.
    #[must_use]
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        let gap = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        gap.x < reach.x && gap.y < reach.y
    }
}

/// Reasons a defender placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the build grid")]
    OutOfBounds,
    /// The requested cell is an obstacle.
    #[error("cell is not walkable")]
    NotWalkable,
    /// The requested cell already hosts a defender.
    #[error("cell already hosts a defender")]
    Occupied,
    /// No catalog entry exists for the requested defender type.
    #[error("defender type has no catalog entry")]
    UnknownKind,
    /// The currency balance does not cover the construction cost.
    #[error("placement costs {required} gold but only {available} is available")]
    InsufficientFunds {
        /// Cost of the requested defender.
        required: u32,
        /// Balance at the time of the request.
        available: u32,
    },
    /// The session already ended in defeat.
    #[error("the session is over")]
    SessionOver,
}

/// Reasons a defender upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No defender with the provided identifier exists.
    #[error("no defender with the provided identifier exists")]
    MissingDefender,
    /// The defender already reached its maximum level.
    #[error("defender is already at its maximum level")]
    MaxLevel,
    /// The currency balance does not cover the upgrade cost.
    #[error("upgrade costs {required} gold but only {available} is available")]
    InsufficientFunds {
        /// Cost of the next level.
        required: u32,
        /// Balance at the time of the request.
        available: u32,
    },
    /// The session already ended in defeat.
    #[error("the session is over")]
    SessionOver,
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, Damage, DefenderId, Direction, Facing, Health, Hitbox, HostileId,
        PlacementError, UpgradeError, Vec2,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&HostileId::new(42));
        assert_round_trip(&DefenderId::new(7));
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&PlacementError::InsufficientFunds {
            required: 150,
            available: 100,
        });
        assert_round_trip(&UpgradeError::MaxLevel);
    }

    #[test]
    fn health_saturates_at_zero() {
        let health = Health::new(30).saturating_sub(Damage::new(45));
        assert!(health.is_zero());
        assert_eq!(Health::new(30).saturating_sub(Damage::new(5)), Health::new(25));
    }

    #[test]
    fn facing_follows_horizontal_sign() {
        assert_eq!(Facing::from_dx(-0.5), Facing::Left);
        assert_eq!(Facing::from_dx(0.0), Facing::Right);
        assert_eq!(Facing::from_dx(3.0), Facing::Right);
    }

    #[test]
    fn dominant_direction_prefers_vertical_on_ties() {
        assert_eq!(Direction::dominant(Vec2::new(10.0, 2.0)), Direction::East);
        assert_eq!(Direction::dominant(Vec2::new(-10.0, 2.0)), Direction::West);
        assert_eq!(Direction::dominant(Vec2::new(4.0, 4.0)), Direction::South);
        assert_eq!(Direction::dominant(Vec2::new(4.0, -4.0)), Direction::North);
    }

    #[test]
    fn touching_hitboxes_do_not_overlap() {
        let left = Hitbox::square(Vec2::new(0.0, 0.0), 10.0);
        let touching = Hitbox::square(Vec2::new(10.0, 0.0), 10.0);
        let overlapping = Hitbox::square(Vec2::new(9.0, 3.0), 10.0);
        assert!(!left.overlaps(&touching));
        assert!(left.overlaps(&overlapping));
    }

    #[test]
    fn cell_coord_exposes_components() {
        let cell = CellCoord::new(3, 9);
        assert_eq!((cell.column(), cell.row()), (3, 9));
    }
}
