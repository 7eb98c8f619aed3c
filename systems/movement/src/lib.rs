#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks hostiles along the route and the
//! player unit toward its destination.

use std::time::Duration;

use bastion_core::{
    Command, Direction, Event, Facing, HostileSnapshot, HostileView, Moving, PlayerSnapshot,
    Route, Vec2, ARRIVAL_THRESHOLD,
};

/// Outcome of advancing a single hostile for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathStep {
    /// The hostile is still en route.
    Moved {
        /// Position at the end of the tick.
        position: Vec2,
        /// Index of the last waypoint reached.
        waypoint_index: usize,
        /// Orientation derived from the horizontal motion of the tick.
        facing: Facing,
    },
    /// The hostile arrived at the final waypoint.
    ReachedGoal {
        /// Index of the final waypoint.
        waypoint_index: usize,
    },
}

/// Advances a hostile toward the waypoint after the last one it reached.
///
/// Arriving within [`ARRIVAL_THRESHOLD`] of the next waypoint advances the
/// index; arriving at the final waypoint reports [`PathStep::ReachedGoal`].
/// Motion never overshoots the waypoint it heads toward.
#[must_use]
pub fn advance(hostile: &HostileSnapshot, route: &Route, dt: Duration, now: Duration) -> PathStep {
    let last = route.last_index();
    let mut waypoint_index = hostile.waypoint_index;
    if waypoint_index >= last {
        return PathStep::ReachedGoal {
            waypoint_index: last,
        };
    }

    let Some(mut target) = route.point(waypoint_index + 1) else {
        return PathStep::ReachedGoal {
            waypoint_index: last,
        };
    };

    let start = hostile.position;
    if start.distance(target) < ARRIVAL_THRESHOLD {
        waypoint_index += 1;
        if waypoint_index >= last {
            return PathStep::ReachedGoal { waypoint_index };
        }
        match route.point(waypoint_index + 1) {
            Some(next) => target = next,
            None => return PathStep::ReachedGoal { waypoint_index },
        }
    }

    let step = hostile.effective_speed(now) * dt.as_secs_f32();
    let position = step_toward(start, target, step);
    PathStep::Moved {
        position,
        waypoint_index,
        facing: Facing::from_dx(position.x - start.x),
    }
}

/// Moves the player unit toward its destination, if it has one.
///
/// Returns `None` when the unit is idle.
#[must_use]
pub fn advance_player(player: &PlayerSnapshot, dt: Duration) -> Option<Command> {
    let destination = player.destination?;
    let delta = destination - player.position;
    let remaining = delta.length();
    let facing = if remaining > 0.0 {
        Direction::dominant(delta)
    } else {
        player.facing
    };

    if remaining < ARRIVAL_THRESHOLD {
        return Some(Command::MovePlayer {
            position: destination,
            facing,
            arrived: true,
        });
    }

    let step = player.speed * dt.as_secs_f32();
    let position = step_toward(player.position, destination, step);
    Some(Command::MovePlayer {
        position,
        facing,
        arrived: position == destination,
    })
}

fn step_toward(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if step <= 0.0 || distance <= 0.0 {
        return from;
    }
    if step >= distance {
        return to;
    }
    from + delta / distance * step
}

/// Pure system that reacts to clock events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement;

impl Movement {
    /// Creates a new movement system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// Nothing is emitted unless the events contain a clock advance.
    pub fn handle(
        &mut self,
        events: &[Event],
        hostiles: &HostileView,
        route: &Route,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        let Some((dt, now)) = clock(events) else {
            return;
        };

        for hostile in hostiles.iter() {
            match advance(hostile, route, dt, now) {
                PathStep::Moved {
                    position,
                    waypoint_index,
                    facing,
                } => out.push(Command::AdvanceHostile {
                    hostile: hostile.id,
                    position,
                    waypoint_index,
                    facing,
                }),
                PathStep::ReachedGoal { .. } => {
                    out.push(Command::EscapeHostile {
                        hostile: hostile.id,
                    });
                }
            }
        }

        if let Some(command) = advance_player(player, dt) {
            out.push(command);
        }
    }
}

fn clock(events: &[Event]) -> Option<(Duration, Duration)> {
    let mut elapsed = None;
    for event in events {
        if let Event::TimeAdvanced { dt, now } = event {
            let (total, _) = elapsed.unwrap_or((Duration::ZERO, *now));
            elapsed = Some((total.saturating_add(*dt), *now));
        }
    }
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{GridLayout, Health, HostileId, HostileKind, SlowState};

    fn route() -> Route {
        Route::from_waypoints(
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(100.0, 0.0),
                Vec2::new(100.0, 100.0),
            ],
            &GridLayout::default(),
        )
    }

    fn hostile(position: Vec2, waypoint_index: usize) -> HostileSnapshot {
        HostileSnapshot {
            id: HostileId::new(0),
            kind: HostileKind::Basic,
            position,
            waypoint_index,
            base_speed: 50.0,
            slow: SlowState::default(),
            health: Health::new(100),
            max_health: Health::new(100),
            reward: 10,
            facing: Facing::Right,
        }
    }

    #[test]
    fn moves_toward_next_waypoint_at_base_speed() {
        let step = advance(
            &hostile(Vec2::ZERO, 0),
            &route(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(
            step,
            PathStep::Moved {
                position: Vec2::new(50.0, 0.0),
                waypoint_index: 0,
                facing: Facing::Right,
            }
        );
    }

    #[test]
    fn slow_halves_distance_covered() {
        let mut slowed = hostile(Vec2::ZERO, 0);
        slowed.slow = SlowState::new(0.5, Duration::from_secs(5));
        let step = advance(
            &slowed,
            &route(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert!(matches!(
            step,
            PathStep::Moved { position, .. } if position == Vec2::new(25.0, 0.0)
        ));
    }

    #[test]
    fn motion_stops_at_the_waypoint() {
        let step = advance(
            &hostile(Vec2::new(90.0, 0.0), 0),
            &route(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert!(matches!(
            step,
            PathStep::Moved { position, waypoint_index: 0, .. } if position == Vec2::new(100.0, 0.0)
        ));
    }

    #[test]
    fn arrival_advances_index_and_turns() {
        let step = advance(
            &hostile(Vec2::new(98.0, 0.0), 0),
            &route(),
            Duration::from_millis(100),
            Duration::from_millis(100),
        );
        match step {
            PathStep::Moved {
                position,
                waypoint_index,
                ..
            } => {
                assert_eq!(waypoint_index, 1);
                assert!(position.y > 0.0);
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn arrival_at_final_waypoint_reaches_goal() {
        let step = advance(
            &hostile(Vec2::new(100.0, 97.0), 1),
            &route(),
            Duration::from_millis(16),
            Duration::from_millis(16),
        );
        assert_eq!(step, PathStep::ReachedGoal { waypoint_index: 2 });
    }

    #[test]
    fn leftward_motion_faces_left() {
        let route = Route::from_waypoints(
            &[Vec2::new(100.0, 0.0), Vec2::new(0.0, 0.0)],
            &GridLayout::default(),
        );
        let step = advance(
            &hostile(Vec2::new(100.0, 0.0), 0),
            &route,
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert!(matches!(
            step,
            PathStep::Moved {
                facing: Facing::Left,
                ..
            }
        ));
    }

    #[test]
    fn player_walks_and_arrives() {
        let mut player = PlayerSnapshot {
            position: Vec2::new(0.0, 0.0),
            destination: Some(Vec2::new(0.0, 200.0)),
            speed: 150.0,
            facing: Direction::North,
            melee_ready_at: Duration::ZERO,
        };

        assert_eq!(
            advance_player(&player, Duration::from_secs(1)),
            Some(Command::MovePlayer {
                position: Vec2::new(0.0, 150.0),
                facing: Direction::South,
                arrived: false,
            })
        );

        player.position = Vec2::new(0.0, 150.0);
        assert_eq!(
            advance_player(&player, Duration::from_secs(1)),
            Some(Command::MovePlayer {
                position: Vec2::new(0.0, 200.0),
                facing: Direction::South,
                arrived: true,
            })
        );

        player.destination = None;
        assert_eq!(advance_player(&player, Duration::from_secs(1)), None);
    }

    #[test]
    fn handle_requires_clock_advance() {
        let mut movement = Movement::new();
        let hostiles = HostileView::from_snapshots(vec![hostile(Vec2::ZERO, 0)]);
        let player = PlayerSnapshot {
            position: Vec2::ZERO,
            destination: None,
            speed: 150.0,
            facing: Direction::South,
            melee_ready_at: Duration::ZERO,
        };
        let mut out = Vec::new();

        movement.handle(&[], &hostiles, &route(), &player, &mut out);
        assert!(out.is_empty());

        let dt = Duration::from_millis(100);
        movement.handle(
            &[Event::TimeAdvanced { dt, now: dt }],
            &hostiles,
            &route(),
            &player,
            &mut out,
        );
        assert_eq!(
            out,
            vec![Command::AdvanceHostile {
                hostile: HostileId::new(0),
                position: Vec2::new(5.0, 0.0),
                waypoint_index: 0,
                facing: Facing::Right,
            }]
        );
    }
}
