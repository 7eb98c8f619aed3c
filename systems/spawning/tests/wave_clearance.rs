use std::time::Duration;

use bastion_core::{Command, Event, HostileId, HostileKind, SessionConfig, SpawnGroup, WaveDefinition};
use bastion_system_spawning::{WavePhase, WaveScheduler};
use bastion_world::{self as world, query, World};

fn ten_basic_config() -> SessionConfig {
    SessionConfig {
        first_wave_delay_ms: 0,
        waves: vec![
            WaveDefinition {
                groups: vec![SpawnGroup {
                    kind: HostileKind::Basic,
                    count: 10,
                    delay_ms: 1_500,
                }],
                inter_wave_delay_ms: 2_000,
            },
            WaveDefinition {
                groups: vec![SpawnGroup {
                    kind: HostileKind::Tank,
                    count: 1,
                    delay_ms: 0,
                }],
                inter_wave_delay_ms: 0,
            },
        ],
        ..SessionConfig::default()
    }
}

struct Harness {
    world: World,
    scheduler: WaveScheduler,
    pending: Vec<Event>,
    log: Vec<(Duration, Event)>,
}

impl Harness {
    fn new(config: SessionConfig) -> Self {
        Self {
            scheduler: WaveScheduler::new(&config),
            world: World::new(config),
            pending: Vec::new(),
            log: Vec::new(),
        }
    }

    fn tick(&mut self, now: Duration) {
        let dt = Duration::from_millis(100);
        let mut events = std::mem::take(&mut self.pending);
        world::apply(&mut self.world, Command::Tick { dt, now }, &mut events);

        let mut commands = Vec::new();
        self.scheduler.handle(&events, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.log.extend(events.into_iter().map(|event| (now, event)));
    }

    fn resolve(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.pending);
        world::apply(&mut self.world, Command::PruneRemoved, &mut self.pending);
    }

    fn spawn_times(&self) -> Vec<Duration> {
        self.log
            .iter()
            .filter(|(_, event)| matches!(event, Event::HostileSpawned { .. }))
            .map(|(at, _)| *at)
            .collect()
    }

    fn saw(&self, wanted: &Event) -> bool {
        self.log.iter().any(|(_, event)| event == wanted)
    }
}

#[test]
fn wave_waits_for_every_spawned_hostile_to_resolve() {
    let mut harness = Harness::new(ten_basic_config());
    let mut now = Duration::ZERO;
    while now < Duration::from_secs(60) {
        now += Duration::from_millis(100);
        harness.tick(now);
    }

    let spawns = harness.spawn_times();
    assert_eq!(spawns.len(), 10);
    assert_eq!(spawns.last(), Some(&Duration::from_millis(13_500)));
    assert_eq!(spawns[1], Duration::from_millis(1_500));
    assert_eq!(harness.scheduler.phase(), WavePhase::AwaitingClear { wave: 0 });
    assert!(!harness.saw(&Event::AllEnemiesDefeated { wave: 1 }));
    assert!(!harness.saw(&Event::WaveStarted { wave: 2 }));
    assert_eq!(query::active_hostiles(&harness.world), 10);

    for id in 0..9 {
        harness.resolve(Command::EscapeHostile {
            hostile: HostileId::new(id),
        });
    }
    now += Duration::from_millis(100);
    harness.tick(now);
    assert_eq!(harness.scheduler.remaining(), 1);
    assert!(!harness.saw(&Event::AllEnemiesDefeated { wave: 1 }));

    harness.resolve(Command::EscapeHostile {
        hostile: HostileId::new(9),
    });
    now += Duration::from_millis(100);
    harness.tick(now);
    assert!(harness.saw(&Event::AllEnemiesDefeated { wave: 1 }));
    assert!(!harness.saw(&Event::WaveStarted { wave: 2 }));

    let cleared_at = now;
    while now < cleared_at + Duration::from_millis(2_000) {
        now += Duration::from_millis(100);
        harness.tick(now);
    }
    assert!(harness.saw(&Event::WaveStarted { wave: 2 }));
    assert_eq!(query::economy(&harness.world).current_wave, 2);
    assert_eq!(query::economy(&harness.world).lives, 10);
}
