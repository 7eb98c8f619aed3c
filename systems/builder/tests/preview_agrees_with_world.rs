use bastion_core::{CellCoord, DefenderKind, Event, SessionConfig, Vec2};
use bastion_system_builder::Builder;
use bastion_world::{self as world, query, World};

fn submit(world: &mut World, builder: &mut Builder, kind: DefenderKind, point: Vec2) -> Vec<Event> {
    let mut commands = Vec::new();
    let mut events = Vec::new();
    if builder
        .handle(kind, point, query::config(world), &mut commands)
        .is_ok()
    {
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
    events
}

#[test]
fn preview_predicts_the_world_outcome() {
    let mut config = SessionConfig::default();
    config.grid.obstacles.push(CellCoord::new(1, 1));
    let mut world = World::new(config);
    let mut builder = Builder::new();

    let attempts = [
        (DefenderKind::Crossbow, Vec2::new(40.0, 40.0)),
        (DefenderKind::Crossbow, Vec2::new(100.0, 100.0)),
        (DefenderKind::Crossbow, Vec2::new(110.0, 110.0)),
        (DefenderKind::Cannon, Vec2::new(200.0, 100.0)),
        (DefenderKind::Crossbow, Vec2::new(200.0, 100.0)),
        (DefenderKind::Crossbow, Vec2::new(300.0, 100.0)),
    ];

    let mut placed = 0;
    for (kind, point) in attempts {
        let preview = {
            let snapshot = &world;
            builder.preview(
                kind,
                point,
                query::config(snapshot),
                &query::economy(snapshot),
                |cell| query::cell_state(snapshot, cell),
            )
        };
        let events = submit(&mut world, &mut builder, kind, point);

        let outcome = events.iter().find_map(|event| match event {
            Event::DefenderPlaced { .. } => Some(None),
            Event::DefenderPlacementRejected { reason, .. } => Some(Some(*reason)),
            _ => None,
        });
        assert_eq!(outcome, Some(preview.rejection), "mismatch at {point:?}");
        if preview.placeable() {
            placed += 1;
        }
    }

    assert_eq!(placed, 2);
    assert_eq!(query::economy(&world).gold, 0);
}
