#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting hostile spawn commands.
//!
//! The scheduler walks a small state machine:
//! `Idle → SpawningBatch → AwaitingClear → InterWaveDelay → SpawningBatch → …`
//! until the last wave clears, at which point it settles in
//! `AllWavesCompleted` and declares victory once. A wave is only considered
//! cleared after every one of its spawns was issued and every hostile it
//! released was either defeated or escaped.

use std::time::Duration;

use bastion_core::{Command, Event, SessionConfig, WaveDefinition};

/// Phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Waiting for the first wave to begin.
    Idle,
    /// Issuing the spawns of a wave.
    SpawningBatch {
        /// Zero-based index of the wave.
        wave: usize,
    },
    /// Every spawn was issued; waiting for the released hostiles to resolve.
    AwaitingClear {
        /// Zero-based index of the wave.
        wave: usize,
    },
    /// Pausing between a cleared wave and the next.
    InterWaveDelay {
        /// Zero-based index of the wave that starts next.
        next_wave: usize,
        /// Time at which the next wave starts.
        until: Duration,
    },
    /// Every configured wave was cleared.
    AllWavesCompleted,
}

/// Pure system that sequences waves against spawn progress and clearance.
#[derive(Debug)]
pub struct WaveScheduler {
    waves: Vec<WaveDefinition>,
    first_wave_delay: Duration,
    phase: WavePhase,
    wave_started_at: Duration,
    spawned: Vec<u32>,
    remaining: u32,
}

impl WaveScheduler {
    /// Creates a scheduler for the waves of the provided session.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            waves: config.waves.clone(),
            first_wave_delay: config.first_wave_delay(),
            phase: WavePhase::Idle,
            wave_started_at: Duration::ZERO,
            spawned: Vec::new(),
            remaining: 0,
        }
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Hostiles of the current wave that are not yet resolved, including
    /// those still waiting to spawn.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the machine to [`WavePhase::Idle`] with all counters cleared.
    pub fn reset(&mut self) {
        self.phase = WavePhase::Idle;
        self.wave_started_at = Duration::ZERO;
        self.spawned.clear();
        self.remaining = 0;
    }

    /// Consumes world events and emits wave and spawn commands.
    ///
    /// Resolution events decrement the outstanding count; a clock advance
    /// drives every transition due at the reported time.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut now = None;
        for event in events {
            match event {
                Event::SessionRestarted => self.reset(),
                Event::HostileDefeated { .. } | Event::HostileReachedGoal { .. } => {
                    if self.is_wave_active() {
                        self.remaining = self.remaining.saturating_sub(1);
                    }
                }
                Event::TimeAdvanced { now: at, .. } => now = Some(*at),
                _ => {}
            }
        }

        if let Some(now) = now {
            self.advance(now, out);
        }
    }

    fn is_wave_active(&self) -> bool {
        matches!(
            self.phase,
            WavePhase::SpawningBatch { .. } | WavePhase::AwaitingClear { .. }
        )
    }

    fn advance(&mut self, now: Duration, out: &mut Vec<Command>) {
        loop {
            match self.phase {
                WavePhase::Idle => {
                    if now < self.first_wave_delay {
                        return;
                    }
                    self.start_wave(0, self.first_wave_delay, out);
                }
                WavePhase::SpawningBatch { wave } => {
                    if !self.issue_due_spawns(wave, now, out) {
                        return;
                    }
                    tracing::debug!(
                        wave = wave + 1,
                        remaining = self.remaining,
                        "all spawns issued, awaiting clearance"
                    );
                    self.phase = WavePhase::AwaitingClear { wave };
                }
                WavePhase::AwaitingClear { wave } => {
                    if self.remaining > 0 {
                        return;
                    }
                    self.clear_wave(wave, now, out);
                }
                WavePhase::InterWaveDelay { next_wave, until } => {
                    if now < until {
                        return;
                    }
                    self.start_wave(next_wave, until, out);
                }
                WavePhase::AllWavesCompleted => return,
            }
        }
    }

    fn start_wave(&mut self, wave: usize, at: Duration, out: &mut Vec<Command>) {
        let Some(definition) = self.waves.get(wave) else {
            self.complete(out);
            return;
        };

        let hostiles = definition.total_hostiles();
        self.spawned.clear();
        self.spawned.resize(definition.groups.len(), 0);
        self.remaining = hostiles;
        self.wave_started_at = at;
        self.phase = WavePhase::SpawningBatch { wave };
        out.push(Command::StartWave {
            wave: wave_number(wave),
            hostiles,
        });
    }

    /// Issues every spawn due at `now` and reports whether the wave finished spawning.
    fn issue_due_spawns(&mut self, wave: usize, now: Duration, out: &mut Vec<Command>) -> bool {
        let Some(definition) = self.waves.get(wave) else {
            return true;
        };

        let elapsed = now.saturating_sub(self.wave_started_at);
        let mut finished = true;
        for (group, spawned) in definition.groups.iter().zip(self.spawned.iter_mut()) {
            while *spawned < group.count && group.delay().saturating_mul(*spawned) <= elapsed {
                out.push(Command::SpawnHostile { kind: group.kind });
                *spawned += 1;
            }
            if *spawned < group.count {
                finished = false;
            }
        }
        finished
    }

    fn clear_wave(&mut self, wave: usize, now: Duration, out: &mut Vec<Command>) {
        out.push(Command::DeclareWaveCleared {
            wave: wave_number(wave),
        });

        let next_wave = wave + 1;
        if next_wave >= self.waves.len() {
            self.complete(out);
            return;
        }

        let delay = self
            .waves
            .get(wave)
            .map_or(Duration::ZERO, WaveDefinition::inter_wave_delay);
        self.phase = WavePhase::InterWaveDelay {
            next_wave,
            until: now.saturating_add(delay),
        };
    }

    fn complete(&mut self, out: &mut Vec<Command>) {
        self.phase = WavePhase::AllWavesCompleted;
        self.spawned.clear();
        self.remaining = 0;
        out.push(Command::DeclareVictory);
    }
}

fn wave_number(index: usize) -> u32 {
    u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{HostileId, HostileKind, SpawnGroup};

    fn config(waves: Vec<WaveDefinition>) -> SessionConfig {
        SessionConfig {
            first_wave_delay_ms: 1_000,
            waves,
            ..SessionConfig::default()
        }
    }

    fn wave(groups: Vec<SpawnGroup>, inter_wave_delay_ms: u64) -> WaveDefinition {
        WaveDefinition {
            groups,
            inter_wave_delay_ms,
        }
    }

    fn group(kind: HostileKind, count: u32, delay_ms: u64) -> SpawnGroup {
        SpawnGroup {
            kind,
            count,
            delay_ms,
        }
    }

    fn tick(scheduler: &mut WaveScheduler, now_ms: u64, extra: &[Event]) -> Vec<Command> {
        let mut events = extra.to_vec();
        events.push(Event::TimeAdvanced {
            dt: Duration::from_millis(16),
            now: Duration::from_millis(now_ms),
        });
        let mut out = Vec::new();
        scheduler.handle(&events, &mut out);
        out
    }

    fn defeated(id: u32) -> Event {
        Event::HostileDefeated {
            hostile: HostileId::new(id),
            reward: 10,
        }
    }

    #[test]
    fn idle_until_first_wave_delay() {
        let mut scheduler =
            WaveScheduler::new(&config(vec![wave(vec![group(HostileKind::Basic, 2, 500)], 0)]));
        assert!(tick(&mut scheduler, 999, &[]).is_empty());
        assert_eq!(scheduler.phase(), WavePhase::Idle);

        assert_eq!(
            tick(&mut scheduler, 1_000, &[]),
            vec![
                Command::StartWave {
                    wave: 1,
                    hostiles: 2
                },
                Command::SpawnHostile {
                    kind: HostileKind::Basic
                },
            ]
        );
        assert_eq!(scheduler.phase(), WavePhase::SpawningBatch { wave: 0 });
    }

    #[test]
    fn groups_spawn_in_parallel() {
        let mut scheduler = WaveScheduler::new(&config(vec![wave(
            vec![
                group(HostileKind::Basic, 2, 400),
                group(HostileKind::Fast, 2, 300),
            ],
            0,
        )]));
        let first = tick(&mut scheduler, 1_000, &[]);
        assert_eq!(first.len(), 3);

        let second = tick(&mut scheduler, 1_300, &[]);
        assert_eq!(
            second,
            vec![Command::SpawnHostile {
                kind: HostileKind::Fast
            }]
        );

        let third = tick(&mut scheduler, 1_400, &[]);
        assert_eq!(
            third,
            vec![Command::SpawnHostile {
                kind: HostileKind::Basic
            }]
        );
        assert_eq!(scheduler.phase(), WavePhase::AwaitingClear { wave: 0 });
    }

    #[test]
    fn next_wave_waits_for_clearance_then_delay() {
        let mut scheduler = WaveScheduler::new(&config(vec![
            wave(vec![group(HostileKind::Basic, 1, 100)], 2_000),
            wave(vec![group(HostileKind::Tank, 1, 100)], 0),
        ]));
        let _ = tick(&mut scheduler, 1_000, &[]);
        assert_eq!(scheduler.phase(), WavePhase::AwaitingClear { wave: 0 });

        assert!(tick(&mut scheduler, 60_000, &[]).is_empty());
        assert_eq!(scheduler.remaining(), 1);

        assert_eq!(
            tick(&mut scheduler, 60_100, &[defeated(0)]),
            vec![Command::DeclareWaveCleared { wave: 1 }]
        );
        assert_eq!(
            scheduler.phase(),
            WavePhase::InterWaveDelay {
                next_wave: 1,
                until: Duration::from_millis(62_100),
            }
        );

        assert!(tick(&mut scheduler, 62_000, &[]).is_empty());
        assert_eq!(
            tick(&mut scheduler, 62_100, &[]),
            vec![
                Command::StartWave {
                    wave: 2,
                    hostiles: 1
                },
                Command::SpawnHostile {
                    kind: HostileKind::Tank
                },
            ]
        );
    }

    #[test]
    fn victory_is_declared_exactly_once() {
        let mut scheduler =
            WaveScheduler::new(&config(vec![wave(vec![group(HostileKind::Basic, 1, 0)], 0)]));
        let _ = tick(&mut scheduler, 1_000, &[]);
        let escaped = Event::HostileReachedGoal {
            hostile: HostileId::new(0),
        };
        assert_eq!(
            tick(&mut scheduler, 1_016, &[escaped]),
            vec![
                Command::DeclareWaveCleared { wave: 1 },
                Command::DeclareVictory
            ]
        );
        assert_eq!(scheduler.phase(), WavePhase::AllWavesCompleted);
        assert!(tick(&mut scheduler, 2_000, &[]).is_empty());
    }

    #[test]
    fn restart_event_returns_to_idle() {
        let mut scheduler =
            WaveScheduler::new(&config(vec![wave(vec![group(HostileKind::Basic, 3, 100)], 0)]));
        let _ = tick(&mut scheduler, 1_000, &[]);
        let mut out = Vec::new();
        scheduler.handle(&[Event::SessionRestarted], &mut out);

        assert!(out.is_empty());
        assert_eq!(scheduler.phase(), WavePhase::Idle);
        assert_eq!(scheduler.remaining(), 0);
    }
}
