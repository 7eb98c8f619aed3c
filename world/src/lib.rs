#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Bastion defence simulation.

mod economy;
mod grid;
mod player;
mod registry;

use std::time::Duration;

use bastion_core::{
    ActivationId, CellCoord, CellState, Command, Damage, DamageApplication, Damageable, DefenderId,
    DefenderKind, Direction, Event, Facing, Hitbox, HostileId, HostileKind, PlacementError, Route,
    SessionConfig, UpgradeError, Vec2,
};
use economy::EconomyLedger;
use grid::BuildGrid;
use player::{MeleeLedger, PlayerUnit};
use registry::{Defender, EntityRegistry, Hostile, Projectile};

/// Represents the authoritative state of a defence session.
#[derive(Debug)]
pub struct World {
    config: SessionConfig,
    route: Route,
    grid: BuildGrid,
    registry: EntityRegistry,
    economy: EconomyLedger,
    player: PlayerUnit,
    melee: MeleeLedger,
    now: Duration,
    victorious: bool,
}

impl World {
    /// Creates a world populated from the provided session configuration.
    ///
    /// The configuration is expected to have passed [`SessionConfig::validate`];
    /// catalog lookups that fail at runtime are ignored rather than reported.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let route = config.route();
        if route.is_fallback() {
            tracing::warn!(
                supplied = config.route.len(),
                "route data unusable, substituting the default route"
            );
        }

        let grid = BuildGrid::new(&config.grid);
        let economy = EconomyLedger::new(&config.economy);
        let player = PlayerUnit::spawn(play_area_center(&config), &config.player);
        Self {
            route,
            grid,
            registry: EntityRegistry::new(),
            economy,
            player,
            melee: MeleeLedger::new(),
            now: Duration::ZERO,
            victorious: false,
            config,
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.registry.clear();
        self.melee.clear();
        self.grid = BuildGrid::new(&self.config.grid);
        self.player = PlayerUnit::spawn(play_area_center(&self.config), &self.config.player);
        self.now = Duration::ZERO;
        self.victorious = false;
        out_events.push(Event::SessionRestarted);
        self.economy.reset(&self.config.economy, out_events);
        tracing::info!("session restarted");
    }

    fn advance_clock(&mut self, dt: Duration, now: Duration, out_events: &mut Vec<Event>) {
        self.now = now;
        out_events.push(Event::TimeAdvanced { dt, now });

        for projectile in self.registry.advance_projectiles(dt.as_secs_f32(), now) {
            out_events.push(Event::ProjectileExpired { projectile });
        }
    }

    fn spawn_hostile(&mut self, kind: HostileKind, out_events: &mut Vec<Event>) {
        let Some(entry) = self.config.hostile(kind).copied() else {
            tracing::debug!(?kind, "ignoring spawn of uncatalogued hostile type");
            return;
        };

        let position = self.route.start();
        let hostile = self.registry.insert_hostile(Hostile::spawn(&entry, position));
        out_events.push(Event::HostileSpawned {
            hostile,
            kind,
            position,
        });
    }

    fn advance_hostile(
        &mut self,
        id: HostileId,
        position: Vec2,
        waypoint_index: usize,
        facing: Facing,
    ) {
        if let Some(hostile) = self.registry.active_hostile_mut(id) {
            hostile.position = position;
            hostile.waypoint_index = hostile.waypoint_index.max(waypoint_index);
            hostile.facing = facing;
        }
    }

    fn escape_hostile(&mut self, id: HostileId, out_events: &mut Vec<Event>) {
        if self.registry.active_hostile(id).is_none() {
            return;
        }

        self.registry.schedule_hostile_removal(id);
        out_events.push(Event::HostileReachedGoal { hostile: id });
        if self.economy.lose_life(out_events) {
            tracing::info!(
                score = self.economy.state().score,
                wave = self.economy.state().current_wave,
                "lives exhausted, session lost"
            );
            out_events.push(Event::GameOver);
        }
    }

    fn damage_hostile(&mut self, id: HostileId, amount: Damage, out_events: &mut Vec<Event>) {
        let Some(hostile) = self.registry.active_hostile_mut(id) else {
            return;
        };
        let health = hostile.take_damage(amount);
        out_events.push(Event::HostileDamaged {
            hostile: id,
            amount,
            health,
        });

        if hostile.is_defeated() {
            let reward = hostile.reward;
            self.registry.schedule_hostile_removal(id);
            self.economy.credit_reward(reward, out_events);
            out_events.push(Event::HostileDefeated {
                hostile: id,
                reward,
            });
        }
    }

    fn apply_hit(&mut self, applications: Vec<DamageApplication>, out_events: &mut Vec<Event>) {
        for application in applications {
            if let (Some(effect), Some(hostile)) = (
                application.effect,
                self.registry.active_hostile_mut(application.hostile),
            ) {
                hostile.apply_effect(effect, self.now);
            }
            self.damage_hostile(application.hostile, application.amount, out_events);
        }
    }

    fn set_player_destination(&mut self, destination: Vec2, out_events: &mut Vec<Event>) {
        let walkable = self
            .config
            .grid
            .cell_at(destination)
            .and_then(|cell| self.grid.state(cell))
            == Some(CellState::Walkable);
        if walkable {
            self.player.destination = Some(destination);
            out_events.push(Event::PlayerDestinationSet { destination });
        } else {
            tracing::debug!(
                x = destination.x,
                y = destination.y,
                "ignoring move toward a blocked or out-of-bounds point"
            );
        }
    }

    fn move_player(
        &mut self,
        position: Vec2,
        facing: Direction,
        arrived: bool,
        out_events: &mut Vec<Event>,
    ) {
        self.player.position = position;
        self.player.facing = facing;
        if arrived {
            self.player.destination = None;
        }
        out_events.push(Event::PlayerMoved { position, facing });
    }

    fn activate_melee(&mut self, target: Vec2, out_events: &mut Vec<Event>) {
        if self.now < self.player.melee_ready_at {
            return;
        }

        let tuning = self.config.player;
        let facing = Direction::dominant(target - self.player.position);
        let center = self.player.position + facing.unit() * tuning.melee_reach;
        let hitbox = Hitbox::square(center, tuning.melee_size);
        let expires_at = self
            .now
            .saturating_add(Duration::from_millis(tuning.melee_window_ms));
        let activation = self
            .melee
            .open(hitbox, Damage::new(tuning.melee_damage), expires_at);

        self.player.facing = facing;
        self.player.melee_ready_at = self
            .now
            .saturating_add(Duration::from_millis(tuning.melee_cooldown_ms));
        out_events.push(Event::MeleeActivated { activation, hitbox });
    }

    fn melee_hit(
        &mut self,
        activation: ActivationId,
        hostile: HostileId,
        out_events: &mut Vec<Event>,
    ) {
        if self.registry.active_hostile(hostile).is_none() {
            return;
        }
        if let Some(damage) = self.melee.record_hit(activation, hostile) {
            self.damage_hostile(hostile, damage, out_events);
        }
    }

    fn fire_projectile(
        &mut self,
        defender_id: DefenderId,
        target: HostileId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(aim) = self
            .registry
            .active_hostile(target)
            .map(|hostile| hostile.position)
        else {
            return;
        };
        let Some(defender) = self.registry.defender(defender_id) else {
            return;
        };
        if self.now < defender.next_fire_at {
            return;
        }

        let stats = defender.stats;
        let origin = defender.position;
        let velocity = (aim - origin).normalize_or_zero() * stats.projectile_speed;
        let projectile = self.registry.insert_projectile(Projectile {
            kind: stats.projectile,
            source: defender_id,
            position: origin,
            velocity,
            damage: Damage::new(stats.damage),
            splash_radius: stats.splash_radius,
            effect: stats.effect,
            expires_at: self.now.saturating_add(self.config.combat.projectile_ttl()),
        });

        if let Some(defender) = self.registry.defender_mut(defender_id) {
            defender.next_fire_at = self.now.saturating_add(stats.fire_interval());
        }
        out_events.push(Event::ProjectileFired {
            projectile,
            defender: defender_id,
            target,
            kind: stats.projectile,
        });
    }

    fn place_defender(
        &mut self,
        kind: DefenderKind,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<DefenderId, PlacementError> {
        if self.economy.is_game_over() {
            return Err(PlacementError::SessionOver);
        }
        let entry = self
            .config
            .defender(kind)
            .ok_or(PlacementError::UnknownKind)?;
        match self.grid.state(cell) {
            None => return Err(PlacementError::OutOfBounds),
            Some(CellState::Obstacle) => return Err(PlacementError::NotWalkable),
            Some(CellState::Occupied(_)) => return Err(PlacementError::Occupied),
            Some(CellState::Walkable) => {}
        }

        let cost = entry.cost;
        let stats = entry.stats;
        let available = self.economy.gold();
        if !self.economy.spend(cost, out_events) {
            return Err(PlacementError::InsufficientFunds {
                required: cost,
                available,
            });
        }

        let position = self.config.grid.cell_center(cell);
        let defender = self
            .registry
            .insert_defender(Defender::construct(kind, cell, position, stats));
        self.grid.occupy(cell, defender);
        out_events.push(Event::DefenderPlaced {
            defender,
            kind,
            cell,
            position,
        });
        Ok(defender)
    }

    fn upgrade_defender(
        &mut self,
        id: DefenderId,
        out_events: &mut Vec<Event>,
    ) -> Result<u8, UpgradeError> {
        if self.economy.is_game_over() {
            return Err(UpgradeError::SessionOver);
        }
        let defender = self
            .registry
            .defender(id)
            .ok_or(UpgradeError::MissingDefender)?;
        let entry = self
            .config
            .defender(defender.kind)
            .ok_or(UpgradeError::MissingDefender)?;
        let cost = entry
            .upgrade_cost(defender.level)
            .ok_or(UpgradeError::MaxLevel)?;
        let modifiers = entry.upgrade;

        let available = self.economy.gold();
        if !self.economy.spend(cost, out_events) {
            return Err(UpgradeError::InsufficientFunds {
                required: cost,
                available,
            });
        }

        let defender = self
            .registry
            .defender_mut(id)
            .ok_or(UpgradeError::MissingDefender)?;
        defender.level = defender.level.saturating_add(1);
        defender.stats = defender.stats.upgraded(&modifiers);
        let level = defender.level;
        out_events.push(Event::DefenderUpgraded {
            defender: id,
            level,
        });
        Ok(level)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session is lost only [`Command::ResetSession`] and
/// [`Command::PruneRemoved`] take effect; placement and upgrade requests are
/// answered with a rejection event and every other command is ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.economy.is_game_over() {
        match command {
            Command::ResetSession
            | Command::PruneRemoved
            | Command::PlaceDefender { .. }
            | Command::UpgradeDefender { .. } => {}
            _ => return,
        }
    }

    match command {
        Command::Tick { dt, now } => world.advance_clock(dt, now, out_events),
        Command::ResetSession => world.reset(out_events),
        Command::StartWave { wave, hostiles } => {
            world.economy.set_wave(wave);
            tracing::info!(wave, hostiles, "wave started");
            out_events.push(Event::WaveStarted { wave });
        }
        Command::SpawnHostile { kind } => world.spawn_hostile(kind, out_events),
        Command::AdvanceHostile {
            hostile,
            position,
            waypoint_index,
            facing,
        } => world.advance_hostile(hostile, position, waypoint_index, facing),
        Command::EscapeHostile { hostile } => world.escape_hostile(hostile, out_events),
        Command::DeclareWaveCleared { wave } => {
            tracing::info!(wave, "wave cleared");
            out_events.push(Event::AllEnemiesDefeated { wave });
        }
        Command::DeclareVictory => {
            if !world.victorious {
                world.victorious = true;
                tracing::info!(score = world.economy.state().score, "all waves completed");
                out_events.push(Event::GameWon);
            }
        }
        Command::SetPlayerDestination { destination } => {
            world.set_player_destination(destination, out_events);
        }
        Command::MovePlayer {
            position,
            facing,
            arrived,
        } => world.move_player(position, facing, arrived, out_events),
        Command::ActivateMelee { target } => world.activate_melee(target, out_events),
        Command::AssignTarget { defender, target } => {
            if let Some(defender) = world.registry.defender_mut(defender) {
                defender.target = target;
            }
        }
        Command::FireProjectile { defender, target } => {
            world.fire_projectile(defender, target, out_events);
        }
        Command::ApplyHit {
            projectile,
            applications,
        } => {
            if world.registry.remove_projectile(projectile).is_some() {
                world.apply_hit(applications, out_events);
            }
        }
        Command::ApplyMeleeHit {
            activation,
            hostile,
        } => world.melee_hit(activation, hostile, out_events),
        Command::PlaceDefender { kind, cell } => {
            if let Err(reason) = world.place_defender(kind, cell, out_events) {
                tracing::debug!(?kind, ?cell, %reason, "placement rejected");
                out_events.push(Event::DefenderPlacementRejected { kind, cell, reason });
            }
        }
        Command::UpgradeDefender { defender } => {
            if let Err(reason) = world.upgrade_defender(defender, out_events) {
                tracing::debug!(defender = defender.get(), %reason, "upgrade rejected");
                out_events.push(Event::DefenderUpgradeRejected { defender, reason });
            }
        }
        Command::PruneRemoved => {
            // Swings close only here, after collision resolution has seen them once.
            world.melee.expire(world.now);
            let removed = world.registry.prune();
            if removed > 0 {
                tracing::trace!(removed, "pruned resolved hostiles");
            }
        }
    }
}

fn play_area_center(config: &SessionConfig) -> Vec2 {
    Vec2::new(config.grid.width() / 2.0, config.grid.height() / 2.0)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use bastion_core::{
        CellCoord, CellState, DefenderId, DefenderView, EconomyState, GridLayout, HostileView,
        MeleeView, PlayerSnapshot, ProjectileView, Route, SessionConfig,
    };

    use super::World;

    /// Captures the current balances of the session.
    #[must_use]
    pub fn economy(world: &World) -> EconomyState {
        world.economy.state()
    }

    /// Captures a read-only view of every hostile still in play.
    ///
    /// Hostiles that were killed or escaped during the current tick are
    /// already excluded even before they are pruned.
    #[must_use]
    pub fn hostile_view(world: &World) -> HostileView {
        HostileView::from_snapshots(world.registry.hostile_snapshots())
    }

    /// Number of hostiles still in play.
    #[must_use]
    pub fn active_hostiles(world: &World) -> usize {
        world.registry.active_hostile_count()
    }

    /// Captures a read-only view of every placed defender.
    #[must_use]
    pub fn defender_view(world: &World) -> DefenderView {
        DefenderView::from_snapshots(world.registry.defender_snapshots())
    }

    /// Captures a read-only view of every projectile in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.registry.projectile_snapshots())
    }

    /// Captures a read-only view of every melee swing still inside its window.
    #[must_use]
    pub fn melee_view(world: &World) -> MeleeView {
        MeleeView::from_snapshots(world.melee.snapshots())
    }

    /// Captures the state of the player-controlled unit.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Waypoint sequence every hostile follows.
    #[must_use]
    pub fn route(world: &World) -> &Route {
        &world.route
    }

    /// Dimensions and obstacles of the build grid.
    #[must_use]
    pub fn grid_layout(world: &World) -> &GridLayout {
        &world.config.grid
    }

    /// Placement state of a cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn cell_state(world: &World, cell: CellCoord) -> Option<CellState> {
        world.grid.state(cell)
    }

    /// Defender occupying the provided cell, if any.
    #[must_use]
    pub fn defender_at(world: &World, cell: CellCoord) -> Option<DefenderId> {
        match world.grid.state(cell) {
            Some(CellState::Occupied(defender)) => Some(defender),
            _ => None,
        }
    }

    /// Session time reached by the most recent tick.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Configuration the world was created from.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Reports whether every wave has been completed.
    #[must_use]
    pub fn is_victorious(world: &World) -> bool {
        world.victorious
    }
}
