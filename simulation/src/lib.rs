#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Host-facing façade that owns the world and drives every system once per tick.
//!
//! A host calls [`Simulation::advance`] once per frame with the elapsed time
//! and the monotonic session clock. The pipeline runs in a fixed order:
//! clock, wave scheduling, movement, target acquisition, firing, collision
//! resolution and finally pruning of resolved hostiles. Requests issued by an
//! input layer between ticks are executed synchronously and report their
//! outcome directly.

mod bus;

use std::time::Duration;

use bastion_core::{
    ActivationId, Command, ConfigError, DefenderId, DefenderKind, DefenderTarget, EconomyState,
    Event, PlacementError, SessionConfig, UpgradeError, Vec2,
};
use bastion_system_builder::{Builder, PlacementPreview};
use bastion_system_combat_resolution::CombatResolution;
use bastion_system_movement::Movement;
use bastion_system_spawning::WaveScheduler;
use bastion_system_tower_combat::TowerCombat;
use bastion_system_tower_targeting::TowerTargeting;
use bastion_world::{self as world, query, World};

pub use bus::{EventBus, SubscriptionId};
pub use bastion_system_spawning::WavePhase;

/// Complete defence session: authoritative world, systems and event bus.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    scheduler: WaveScheduler,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    resolution: CombatResolution,
    builder: Builder,
    bus: EventBus,
    targets: Vec<DefenderTarget>,
    carried: Vec<Event>,
    scheduler_input: Vec<Event>,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Simulation {
    /// Validates the configuration and creates a session waiting for its first tick.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            waves = config.waves.len(),
            gold = config.economy.starting_gold,
            lives = config.economy.starting_lives,
            "simulation ready"
        );

        let scheduler = WaveScheduler::new(&config);
        Ok(Self {
            world: World::new(config),
            scheduler,
            movement: Movement::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            resolution: CombatResolution::new(),
            builder: Builder::new(),
            bus: EventBus::new(),
            targets: Vec::new(),
            carried: Vec::new(),
            scheduler_input: Vec::new(),
            events: Vec::new(),
            commands: Vec::new(),
        })
    }

    /// Advances the session by `dt`, ending at the monotonic time `now`.
    ///
    /// Returns the events emitted during the tick; they are also published on
    /// the bus. Once the session is lost ticks are ignored until
    /// [`Simulation::restart`].
    pub fn advance(&mut self, dt: Duration, now: Duration) -> &[Event] {
        self.events.clear();
        if query::economy(&self.world).game_over {
            tracing::trace!("ignoring tick after game over");
            return &self.events;
        }

        world::apply(&mut self.world, Command::Tick { dt, now }, &mut self.events);

        self.scheduler_input.clear();
        self.scheduler_input.append(&mut self.carried);
        self.scheduler_input.extend_from_slice(&self.events);
        self.scheduler
            .handle(&self.scheduler_input, &mut self.commands);
        execute(&mut self.world, &mut self.commands, &mut self.events);
        let resolved_from = self.events.len();

        self.movement.handle(
            &self.events,
            &query::hostile_view(&self.world),
            query::route(&self.world),
            &query::player(&self.world),
            &mut self.commands,
        );
        execute(&mut self.world, &mut self.commands, &mut self.events);

        let defenders = query::defender_view(&self.world);
        let hostiles = query::hostile_view(&self.world);
        self.targeting
            .handle(&defenders, &hostiles, &mut self.targets, &mut self.commands);
        execute(&mut self.world, &mut self.commands, &mut self.events);

        self.combat
            .handle(now, &defenders, &self.targets, &mut self.commands);
        execute(&mut self.world, &mut self.commands, &mut self.events);

        self.resolution.handle(
            &query::projectile_view(&self.world),
            &query::hostile_view(&self.world),
            &query::melee_view(&self.world),
            &mut self.commands,
        );
        execute(&mut self.world, &mut self.commands, &mut self.events);

        world::apply(&mut self.world, Command::PruneRemoved, &mut self.events);

        // Defeats and escapes after the scheduler ran reach it on the next tick.
        self.carried.extend(
            self.events[resolved_from..]
                .iter()
                .filter(|event| {
                    matches!(
                        event,
                        Event::HostileDefeated { .. } | Event::HostileReachedGoal { .. }
                    )
                })
                .cloned(),
        );

        self.bus.publish(&self.events);
        &self.events
    }

    /// Requests that the player unit walk toward a world-space point.
    ///
    /// Returns `false` when the destination is blocked, off the grid, or the
    /// session is over.
    pub fn request_move(&mut self, x: f32, y: f32) -> bool {
        let destination = Vec2::new(x, y);
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SetPlayerDestination { destination },
            &mut events,
        );
        self.bus.publish(&events);
        events
            .iter()
            .any(|event| matches!(event, Event::PlayerDestinationSet { .. }))
    }

    /// Requests a melee swing aimed at a world-space point.
    ///
    /// Returns the identifier of the swing, or `None` while the cooldown runs.
    pub fn request_melee(&mut self, x: f32, y: f32) -> Option<ActivationId> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::ActivateMelee {
                target: Vec2::new(x, y),
            },
            &mut events,
        );
        self.bus.publish(&events);
        events.iter().find_map(|event| match event {
            Event::MeleeActivated { activation, .. } => Some(*activation),
            _ => None,
        })
    }

    /// Requests construction of a defender on the cell containing a world-space point.
    pub fn request_place(
        &mut self,
        kind: DefenderKind,
        x: f32,
        y: f32,
    ) -> Result<DefenderId, PlacementError> {
        let mut commands = Vec::new();
        let _ = self.builder.handle(
            kind,
            Vec2::new(x, y),
            query::config(&self.world),
            &mut commands,
        )?;

        let mut events = Vec::new();
        execute(&mut self.world, &mut commands, &mut events);
        self.bus.publish(&events);

        let outcome = events.iter().find_map(|event| match event {
            Event::DefenderPlaced { defender, .. } => Some(Ok(*defender)),
            Event::DefenderPlacementRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        });
        outcome.unwrap_or(Err(PlacementError::SessionOver))
    }

    /// Requests that a defender advance to its next level.
    ///
    /// Returns the level reached on success.
    pub fn request_upgrade(&mut self, defender: DefenderId) -> Result<u8, UpgradeError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::UpgradeDefender { defender },
            &mut events,
        );
        self.bus.publish(&events);

        let outcome = events.iter().find_map(|event| match event {
            Event::DefenderUpgraded { level, .. } => Some(Ok(*level)),
            Event::DefenderUpgradeRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        });
        outcome.unwrap_or(Err(UpgradeError::SessionOver))
    }

    /// Restores every entity, balance and the wave schedule to their initial state.
    pub fn restart(&mut self) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::ResetSession, &mut events);
        self.scheduler.reset();
        self.targets.clear();
        self.carried.clear();
        self.events.clear();
        self.bus.publish(&events);
    }

    /// Evaluates a placement at a world-space point without mutating the session.
    #[must_use]
    pub fn preview(&self, kind: DefenderKind, x: f32, y: f32) -> PlacementPreview {
        let world = &self.world;
        self.builder.preview(
            kind,
            Vec2::new(x, y),
            query::config(world),
            &query::economy(world),
            |cell| query::cell_state(world, cell),
        )
    }

    /// Registers a handler invoked for every event the session emits.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Detaches a handler, reporting whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Events emitted by the most recent tick.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current balances of the session.
    #[must_use]
    pub fn economy(&self) -> EconomyState {
        query::economy(&self.world)
    }

    /// Reports whether every wave has been completed.
    #[must_use]
    pub fn is_victorious(&self) -> bool {
        query::is_victorious(&self.world)
    }

    /// Current phase of the wave state machine.
    #[must_use]
    pub fn wave_phase(&self) -> WavePhase {
        self.scheduler.phase()
    }

    /// Hostiles of the current wave that are not yet killed or escaped.
    #[must_use]
    pub fn wave_remaining(&self) -> u32 {
        self.scheduler.remaining()
    }

    /// Firing solutions selected during the most recent tick.
    #[must_use]
    pub fn targets(&self) -> &[DefenderTarget] {
        &self.targets
    }
}

fn execute(world: &mut World, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut config = SessionConfig::default();
        config.grid.columns = 0;
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::EmptyGrid)
        ));
    }

    #[test]
    fn first_tick_only_reports_time() {
        let mut simulation = Simulation::new(SessionConfig::default()).expect("valid config");
        let step = Duration::from_millis(16);
        let events = simulation.advance(step, step).to_vec();
        assert_eq!(events, vec![Event::TimeAdvanced { dt: step, now: step }]);
        assert_eq!(simulation.wave_phase(), WavePhase::Idle);
    }

    #[test]
    fn off_grid_placement_is_rejected_before_reaching_the_world() {
        let mut simulation = Simulation::new(SessionConfig::default()).expect("valid config");
        assert_eq!(
            simulation.request_place(DefenderKind::Crossbow, -10.0, 10.0),
            Err(PlacementError::OutOfBounds)
        );
        assert_eq!(simulation.economy().gold, 200);
    }
}
