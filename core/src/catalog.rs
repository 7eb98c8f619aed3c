//! Session configuration consumed by the world and the systems.
//!
//! Every tunable number of a session lives here: the economy defaults, the
//! build grid, the route, the hostile and defender catalogs, and the wave list.
//! The [`Default`] implementation carries the shipped content so a session can
//! start without any external file.

use std::{collections::BTreeSet, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

/// Smallest slow factor an upgrade may push a status effect to.
pub const MIN_SLOW_FACTOR: f32 = 0.1;

/// Types of hostiles that can walk the route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostileKind {
    /// Balanced hostile.
    Basic,
    /// Quick, fragile hostile.
    Fast,
    /// Slow hostile with a large health pool.
    Tank,
}

/// Types of defenders that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefenderKind {
    /// Fast single-target tower.
    Crossbow,
    /// Slow tower dealing splash damage.
    Cannon,
    /// Tower whose projectiles slow hostiles.
    Magic,
    /// Long-range tower with heavy splash damage.
    Rocket,
}

/// Visual type of a projectile, forwarded to presentation collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectileKind {
    /// Crossbow bolt.
    Arrow,
    /// Cannon shell.
    Cannonball,
    /// Magic orb.
    MagicOrb,
    /// Rocket.
    Rocket,
}

/// Temporary stat modifier applied to hostiles on impact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StatusEffect {
    /// Multiplies movement speed by `factor` for `duration_ms`.
    Slow {
        /// Speed multiplier in `(0, 1]`.
        factor: f32,
        /// Lifetime of the effect in milliseconds.
        duration_ms: u64,
    },
}

impl StatusEffect {
    /// Lifetime of the effect.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Slow { duration_ms, .. } => Duration::from_millis(*duration_ms),
        }
    }

    fn strengthened(self, step: f32) -> Self {
        match self {
            Self::Slow {
                factor,
                duration_ms,
            } => Self::Slow {
                factor: (factor - step).clamp(MIN_SLOW_FACTOR, 1.0),
                duration_ms,
            },
        }
    }
}

/// Starting balances of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Currency available when the session starts.
    pub starting_gold: u32,
    /// Lives available when the session starts.
    pub starting_lives: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gold: 200,
            starting_lives: 20,
        }
    }
}

/// Dimensions and obstacles of the build grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Number of cell columns.
    pub columns: u32,
    /// Number of cell rows.
    pub rows: u32,
    /// Edge length of a square cell in world units.
    pub tile_length: f32,
    /// Cells that can never host a defender.
    pub obstacles: Vec<CellCoord>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 32,
            rows: 24,
            tile_length: 32.0,
            obstacles: Vec::new(),
        }
    }
}

impl GridLayout {
    /// Total width of the play area in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the play area in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Resolves the cell containing a world-space point.
    ///
    /// Points left of or above the origin, beyond the far edges, or any point
    /// when the tile length is not positive yield `None`.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if !(self.tile_length > 0.0) || point.x < 0.0 || point.y < 0.0 {
            return None;
        }

        let column = (point.x / self.tile_length).floor();
        let row = (point.y / self.tile_length).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.tile_length,
            (cell.row() as f32 + 0.5) * self.tile_length,
        )
    }
}

/// Ordered waypoint sequence every hostile follows.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    points: Vec<Vec2>,
    fallback: bool,
}

impl Route {
    /// Builds a route from externally supplied waypoints.
    ///
    /// Fewer than two points, or any non-finite coordinate, substitutes the
    /// fixed fallback route spanning the play area.
    #[must_use]
    pub fn from_waypoints(points: &[Vec2], grid: &GridLayout) -> Self {
        let usable = points.len() >= 2 && points.iter().all(|point| point.is_finite());
        if usable {
            return Self {
                points: points.to_vec(),
                fallback: false,
            };
        }

        let width = grid.width();
        let height = grid.height();
        Self {
            points: vec![
                Vec2::new(0.0, height / 2.0),
                Vec2::new(width / 3.0, height / 2.0),
                Vec2::new(width / 3.0, height / 4.0),
                Vec2::new(2.0 * width / 3.0, height / 4.0),
                Vec2::new(2.0 * width / 3.0, 3.0 * height / 4.0),
                Vec2::new(width, 3.0 * height / 4.0),
            ],
            fallback: true,
        }
    }

    /// Reports whether the fallback route replaced the supplied waypoints.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Waypoints in traversal order.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Waypoint at `index`, if any.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    /// Spawn position at the head of the route.
    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.points.first().copied().unwrap_or(Vec2::ZERO)
    }

    /// Index of the goal waypoint.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Catalog entry describing a hostile type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostileType {
    /// Type described by the entry.
    pub kind: HostileKind,
    /// Base movement speed in world units per second.
    pub speed: f32,
    /// Maximum and starting health.
    pub health: u32,
    /// Currency and score credited on kill.
    pub reward: u32,
}

/// Combat statistics of a defender at a given level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenderStats {
    /// Targeting radius in world units.
    pub range: f32,
    /// Minimum time between shots in milliseconds.
    pub fire_interval_ms: u64,
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Visual type of the projectiles.
    pub projectile: ProjectileKind,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Splash radius around the primary impact, if any.
    #[serde(default)]
    pub splash_radius: Option<f32>,
    /// Status effect applied on impact, if any.
    #[serde(default)]
    pub effect: Option<StatusEffect>,
}

impl DefenderStats {
    /// Minimum time between shots.
    #[must_use]
    pub const fn fire_interval(&self) -> Duration {
        Duration::from_millis(self.fire_interval_ms)
    }

    /// Applies one level of upgrade modifiers.
    ///
    /// Integer statistics are scaled by whole percentages and rounded down so
    /// repeated upgrades stay exact.
    #[must_use]
    pub fn upgraded(&self, modifiers: &UpgradeModifiers) -> Self {
        let damage = u64::from(self.damage) * u64::from(modifiers.damage_percent) / 100;
        let interval = self.fire_interval_ms * u64::from(modifiers.fire_interval_percent) / 100;
        Self {
            range: self.range * modifiers.range_percent as f32 / 100.0,
            fire_interval_ms: interval,
            damage: damage.min(u64::from(u32::MAX)) as u32,
            projectile: self.projectile,
            projectile_speed: self.projectile_speed,
            splash_radius: self
                .splash_radius
                .map(|radius| radius * modifiers.splash_radius_percent as f32 / 100.0),
            effect: self
                .effect
                .map(|effect| effect.strengthened(modifiers.slow_factor_step)),
        }
    }
}

/// Per-level stat multipliers applied by an upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeModifiers {
    /// Damage multiplier in percent.
    pub damage_percent: u32,
    /// Fire interval multiplier in percent; values below 100 fire faster.
    pub fire_interval_percent: u32,
    /// Range multiplier in percent.
    pub range_percent: u32,
    /// Splash radius multiplier in percent.
    pub splash_radius_percent: u32,
    /// Amount subtracted from the slow factor, strengthening the slow.
    pub slow_factor_step: f32,
}

impl Default for UpgradeModifiers {
    fn default() -> Self {
        Self {
            damage_percent: 100,
            fire_interval_percent: 100,
            range_percent: 100,
            splash_radius_percent: 100,
            slow_factor_step: 0.0,
        }
    }
}

/// Catalog entry describing a defender type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenderType {
    /// Type described by the entry.
    pub kind: DefenderKind,
    /// Construction cost.
    pub cost: u32,
    /// Statistics at level one.
    pub stats: DefenderStats,
    /// Modifiers applied on every upgrade.
    #[serde(default)]
    pub upgrade: UpgradeModifiers,
    /// Cost of each upgrade; entry `n` moves the defender from level `n + 1`.
    #[serde(default)]
    pub upgrade_costs: Vec<u32>,
}

impl DefenderType {
    /// Highest level this type can reach.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        u8::try_from(self.upgrade_costs.len().saturating_add(1)).unwrap_or(u8::MAX)
    }

    /// Cost of upgrading away from `level`, or `None` at the maximum level.
    #[must_use]
    pub fn upgrade_cost(&self, level: u8) -> Option<u32> {
        let index = usize::from(level).checked_sub(1)?;
        self.upgrade_costs.get(index).copied()
    }
}

/// Batch of identical hostiles released at a fixed cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Type of hostile released.
    pub kind: HostileKind,
    /// Number of hostiles in the group.
    pub count: u32,
    /// Spacing between consecutive spawns of the group in milliseconds.
    pub delay_ms: u64,
}

impl SpawnGroup {
    /// Spacing between consecutive spawns.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Spawn groups of one wave and the pause that follows its clearance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Groups released in parallel when the wave starts.
    pub groups: Vec<SpawnGroup>,
    /// Pause between clearance and the next wave in milliseconds.
    pub inter_wave_delay_ms: u64,
}

impl WaveDefinition {
    /// Total number of hostiles released by the wave.
    #[must_use]
    pub fn total_hostiles(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |total, group| total.saturating_add(group.count))
    }

    /// Pause between clearance and the next wave.
    #[must_use]
    pub const fn inter_wave_delay(&self) -> Duration {
        Duration::from_millis(self.inter_wave_delay_ms)
    }
}

/// Projectile tuning shared by every defender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Lifetime of a projectile in milliseconds.
    pub projectile_ttl_ms: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            projectile_ttl_ms: 2_000,
        }
    }
}

impl CombatConfig {
    /// Lifetime of a projectile.
    #[must_use]
    pub const fn projectile_ttl(&self) -> Duration {
        Duration::from_millis(self.projectile_ttl_ms)
    }
}

/// Tuning of the player-controlled melee unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Damage dealt by one swing to each hostile it touches.
    pub melee_damage: u32,
    /// Minimum time between swings in milliseconds.
    pub melee_cooldown_ms: u64,
    /// Distance from the unit to the centre of the swing hitbox.
    pub melee_reach: f32,
    /// Edge length of the square swing hitbox.
    pub melee_size: f32,
    /// Time a swing keeps damaging newly overlapping hostiles.
    pub melee_window_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 150.0,
            melee_damage: 50,
            melee_cooldown_ms: 600,
            melee_reach: 32.0,
            melee_size: 32.0,
            melee_window_ms: 200,
        }
    }
}

/// Complete description of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Starting balances.
    pub economy: EconomyConfig,
    /// Build grid dimensions and obstacles.
    pub grid: GridLayout,
    /// Precomputed waypoints; invalid lists fall back to a default route.
    pub route: Vec<Vec2>,
    /// Pause before the first wave in milliseconds.
    pub first_wave_delay_ms: u64,
    /// Hostile catalog.
    pub hostiles: Vec<HostileType>,
    /// Defender catalog.
    pub defenders: Vec<DefenderType>,
    /// Waves in release order.
    pub waves: Vec<WaveDefinition>,
    /// Projectile tuning.
    pub combat: CombatConfig,
    /// Player unit tuning.
    pub player: PlayerConfig,
}

impl SessionConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing sections fall back to the shipped defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross references between catalogs and waves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 || self.grid.rows == 0 || !(self.grid.tile_length > 0.0) {
            return Err(ConfigError::EmptyGrid);
        }

        let mut hostile_kinds = BTreeSet::new();
        for entry in &self.hostiles {
            if !hostile_kinds.insert(entry.kind) {
                return Err(ConfigError::DuplicateHostileType(entry.kind));
            }
        }

        let mut defender_kinds = BTreeSet::new();
        for entry in &self.defenders {
            if !defender_kinds.insert(entry.kind) {
                return Err(ConfigError::DuplicateDefenderType(entry.kind));
            }
            if let Some(StatusEffect::Slow { factor, .. }) = entry.stats.effect {
                if !(factor > 0.0 && factor <= 1.0) {
                    return Err(ConfigError::InvalidSlowFactor {
                        kind: entry.kind,
                        factor,
                    });
                }
            }
        }

        for (index, wave) in self.waves.iter().enumerate() {
            for group in &wave.groups {
                if !hostile_kinds.contains(&group.kind) {
                    return Err(ConfigError::MissingHostileType {
                        wave: index + 1,
                        kind: group.kind,
                    });
                }
            }
        }

        Ok(())
    }

    /// Pause before the first wave.
    #[must_use]
    pub const fn first_wave_delay(&self) -> Duration {
        Duration::from_millis(self.first_wave_delay_ms)
    }

    /// Catalog entry for a hostile type.
    #[must_use]
    pub fn hostile(&self, kind: HostileKind) -> Option<&HostileType> {
        self.hostiles.iter().find(|entry| entry.kind == kind)
    }

    /// Catalog entry for a defender type.
    #[must_use]
    pub fn defender(&self, kind: DefenderKind) -> Option<&DefenderType> {
        self.defenders.iter().find(|entry| entry.kind == kind)
    }

    /// Route resolved against the grid, substituting the fallback if needed.
    #[must_use]
    pub fn route(&self) -> Route {
        Route::from_waypoints(&self.route, &self.grid)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            economy: EconomyConfig::default(),
            grid: GridLayout::default(),
            route: Vec::new(),
            first_wave_delay_ms: 5_000,
            hostiles: vec![
                HostileType {
                    kind: HostileKind::Basic,
                    speed: 50.0,
                    health: 100,
                    reward: 10,
                },
                HostileType {
                    kind: HostileKind::Fast,
                    speed: 80.0,
                    health: 60,
                    reward: 15,
                },
                HostileType {
                    kind: HostileKind::Tank,
                    speed: 30.0,
                    health: 300,
                    reward: 25,
                },
            ],
            defenders: default_defenders(),
            waves: default_waves(),
            combat: CombatConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

fn default_defenders() -> Vec<DefenderType> {
    let upgrade_costs = vec![50, 100];
    vec![
        DefenderType {
            kind: DefenderKind::Crossbow,
            cost: 100,
            stats: DefenderStats {
                range: 150.0,
                fire_interval_ms: 1_000,
                damage: 20,
                projectile: ProjectileKind::Arrow,
                projectile_speed: 300.0,
                splash_radius: None,
                effect: None,
            },
            upgrade: UpgradeModifiers {
                damage_percent: 120,
                fire_interval_percent: 90,
                ..UpgradeModifiers::default()
            },
            upgrade_costs: upgrade_costs.clone(),
        },
        DefenderType {
            kind: DefenderKind::Cannon,
            cost: 150,
            stats: DefenderStats {
                range: 120.0,
                fire_interval_ms: 2_000,
                damage: 40,
                projectile: ProjectileKind::Cannonball,
                projectile_speed: 200.0,
                splash_radius: Some(50.0),
                effect: None,
            },
            upgrade: UpgradeModifiers {
                damage_percent: 130,
                splash_radius_percent: 120,
                ..UpgradeModifiers::default()
            },
            upgrade_costs: upgrade_costs.clone(),
        },
        DefenderType {
            kind: DefenderKind::Magic,
            cost: 200,
            stats: DefenderStats {
                range: 180.0,
                fire_interval_ms: 1_500,
                damage: 30,
                projectile: ProjectileKind::MagicOrb,
                projectile_speed: 250.0,
                splash_radius: None,
                effect: Some(StatusEffect::Slow {
                    factor: 0.5,
                    duration_ms: 2_000,
                }),
            },
            upgrade: UpgradeModifiers {
                damage_percent: 120,
                slow_factor_step: 0.1,
                ..UpgradeModifiers::default()
            },
            upgrade_costs: upgrade_costs.clone(),
        },
        DefenderType {
            kind: DefenderKind::Rocket,
            cost: 250,
            stats: DefenderStats {
                range: 200.0,
                fire_interval_ms: 3_000,
                damage: 80,
                projectile: ProjectileKind::Rocket,
                projectile_speed: 150.0,
                splash_radius: Some(80.0),
                effect: None,
            },
            upgrade: UpgradeModifiers {
                damage_percent: 140,
                splash_radius_percent: 130,
                ..UpgradeModifiers::default()
            },
            upgrade_costs,
        },
    ]
}

fn default_waves() -> Vec<WaveDefinition> {
    let group = |kind, count, delay_ms| SpawnGroup {
        kind,
        count,
        delay_ms,
    };
    vec![
        WaveDefinition {
            groups: vec![group(HostileKind::Basic, 10, 1_500)],
            inter_wave_delay_ms: 5_000,
        },
        WaveDefinition {
            groups: vec![group(HostileKind::Basic, 15, 1_200)],
            inter_wave_delay_ms: 8_000,
        },
        WaveDefinition {
            groups: vec![
                group(HostileKind::Basic, 10, 1_200),
                group(HostileKind::Fast, 5, 2_000),
            ],
            inter_wave_delay_ms: 10_000,
        },
        WaveDefinition {
            groups: vec![
                group(HostileKind::Basic, 15, 1_000),
                group(HostileKind::Fast, 8, 1_500),
                group(HostileKind::Tank, 3, 3_000),
            ],
            inter_wave_delay_ms: 15_000,
        },
    ]
}

/// Problems detected while loading or validating a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse session configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The grid has no cells or a non-positive tile length.
    #[error("grid must contain at least one cell and a positive tile length")]
    EmptyGrid,
    /// A hostile type appears twice in the catalog.
    #[error("hostile type {0:?} is defined more than once")]
    DuplicateHostileType(HostileKind),
    /// A defender type appears twice in the catalog.
    #[error("defender type {0:?} is defined more than once")]
    DuplicateDefenderType(DefenderKind),
    /// A defender's slow effect lies outside `(0, 1]`.
    #[error("defender type {kind:?} has slow factor {factor} outside (0, 1]")]
    InvalidSlowFactor {
        /// Offending defender type.
        kind: DefenderKind,
        /// Configured factor.
        factor: f32,
    },
    /// A wave references a hostile type missing from the catalog.
    #[error("wave {wave} releases hostile type {kind:?} which has no catalog entry")]
    MissingHostileType {
        /// One-based wave number.
        wave: usize,
        /// Missing hostile type.
        kind: HostileKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.waves.len(), 4);
        assert_eq!(config.waves[3].total_hostiles(), 26);
    }

    #[test]
    fn invalid_route_falls_back_to_play_area_route() {
        let grid = GridLayout::default();
        let route = Route::from_waypoints(&[Vec2::new(10.0, 10.0)], &grid);
        assert!(route.is_fallback());
        assert_eq!(route.points().len(), 6);
        assert_eq!(route.start(), Vec2::new(0.0, 384.0));
        assert_eq!(route.point(5), Some(Vec2::new(1024.0, 576.0)));
    }

    #[test]
    fn supplied_route_is_kept() {
        let grid = GridLayout::default();
        let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)];
        let route = Route::from_waypoints(&points, &grid);
        assert!(!route.is_fallback());
        assert_eq!(route.last_index(), 1);
    }

    #[test]
    fn cell_lookup_rejects_points_outside_grid() {
        let grid = GridLayout::default();
        assert_eq!(grid.cell_at(Vec2::new(40.0, 70.0)), Some(CellCoord::new(1, 2)));
        assert_eq!(grid.cell_at(Vec2::new(-1.0, 5.0)), None);
        assert_eq!(grid.cell_at(Vec2::new(1024.0, 5.0)), None);
        assert_eq!(grid.cell_center(CellCoord::new(1, 2)), Vec2::new(48.0, 80.0));
    }

    #[test]
    fn crossbow_upgrade_scales_damage_and_interval() {
        let config = SessionConfig::default();
        let crossbow = config.defender(DefenderKind::Crossbow).expect("crossbow");
        let level_two = crossbow.stats.upgraded(&crossbow.upgrade);
        let level_three = level_two.upgraded(&crossbow.upgrade);
        assert_eq!(level_two.damage, 24);
        assert_eq!(level_two.fire_interval_ms, 900);
        assert_eq!(level_three.damage, 28);
        assert_eq!(level_three.fire_interval_ms, 810);
        assert_eq!(crossbow.max_level(), 3);
        assert_eq!(crossbow.upgrade_cost(1), Some(50));
        assert_eq!(crossbow.upgrade_cost(2), Some(100));
        assert_eq!(crossbow.upgrade_cost(3), None);
    }

    #[test]
    fn magic_upgrade_strengthens_slow() {
        let config = SessionConfig::default();
        let magic = config.defender(DefenderKind::Magic).expect("magic");
        let upgraded = magic.stats.upgraded(&magic.upgrade);
        match upgraded.effect {
            Some(StatusEffect::Slow { factor, duration_ms }) => {
                assert!((factor - 0.4).abs() < 1e-6);
                assert_eq!(duration_ms, 2_000);
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let source = r#"
            first_wave_delay_ms = 1000

            [economy]
            starting_gold = 500

            [[waves]]
            inter_wave_delay_ms = 2000
            groups = [{ kind = "tank", count = 2, delay_ms = 500 }]
        "#;

        let config = SessionConfig::from_toml_str(source).expect("valid config");
        assert_eq!(config.economy.starting_gold, 500);
        assert_eq!(config.economy.starting_lives, 20);
        assert_eq!(config.first_wave_delay_ms, 1_000);
        assert_eq!(config.waves.len(), 1);
        assert_eq!(config.waves[0].groups[0].kind, HostileKind::Tank);
        assert_eq!(config.hostiles.len(), 3);
    }

    #[test]
    fn wave_referencing_missing_hostile_is_rejected() {
        let mut config = SessionConfig::default();
        config.hostiles.retain(|entry| entry.kind != HostileKind::Tank);
        let error = config.validate().expect_err("tank is missing");
        assert!(matches!(
            error,
            ConfigError::MissingHostileType {
                wave: 4,
                kind: HostileKind::Tank
            }
        ));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let error = SessionConfig::from_toml_str("economy = 3").expect_err("invalid");
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
