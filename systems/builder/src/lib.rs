#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves world-space placement requests into grid commands.

use bastion_core::{
    CellCoord, CellState, Command, DefenderKind, EconomyState, PlacementError, SessionConfig,
    Vec2,
};

/// Declarative placement preview describing a potential defender construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Type of defender proposed for placement.
    pub kind: DefenderKind,
    /// Cell under the hovered point, if it lies on the grid.
    pub cell: Option<CellCoord>,
    /// Construction cost, if the type is catalogued.
    pub cost: Option<u32>,
    /// Reason the placement would be rejected, if any.
    pub rejection: Option<PlacementError>,
}

impl PlacementPreview {
    /// Indicates whether the preview represents a valid, affordable placement.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Placement front end that translates world coordinates into placement commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct Builder;

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates a placement at `point` without mutating anything.
    ///
    /// Checks run in the same order the world applies them, so a placeable
    /// preview is accepted when submitted before the world changes.
    /// The `cell_state` closure should mirror the world's `query::cell_state`.
    #[must_use]
    pub fn preview<F>(
        &self,
        kind: DefenderKind,
        point: Vec2,
        config: &SessionConfig,
        economy: &EconomyState,
        cell_state: F,
    ) -> PlacementPreview
    where
        F: Fn(CellCoord) -> Option<CellState>,
    {
        let cell = config.grid.cell_at(point);
        let cost = config.defender(kind).map(|entry| entry.cost);
        let rejection = evaluate(cell, cost, economy, cell_state).err();
        PlacementPreview {
            kind,
            cell,
            cost,
            rejection,
        }
    }

    /// Resolves a world-space placement request into a [`Command::PlaceDefender`].
    ///
    /// Points outside the grid cannot be expressed as a cell and are rejected
    /// here; every other check is left to the world.
    pub fn handle(
        &mut self,
        kind: DefenderKind,
        point: Vec2,
        config: &SessionConfig,
        out: &mut Vec<Command>,
    ) -> Result<CellCoord, PlacementError> {
        let cell = config
            .grid
            .cell_at(point)
            .ok_or(PlacementError::OutOfBounds)?;
        out.push(Command::PlaceDefender { kind, cell });
        Ok(cell)
    }
}

fn evaluate<F>(
    cell: Option<CellCoord>,
    cost: Option<u32>,
    economy: &EconomyState,
    cell_state: F,
) -> Result<(), PlacementError>
where
    F: Fn(CellCoord) -> Option<CellState>,
{
    if economy.game_over {
        return Err(PlacementError::SessionOver);
    }
    let cost = cost.ok_or(PlacementError::UnknownKind)?;
    let cell = cell.ok_or(PlacementError::OutOfBounds)?;
    match cell_state(cell) {
        None => return Err(PlacementError::OutOfBounds),
        Some(CellState::Obstacle) => return Err(PlacementError::NotWalkable),
        Some(CellState::Occupied(_)) => return Err(PlacementError::Occupied),
        Some(CellState::Walkable) => {}
    }
    if economy.gold < cost {
        return Err(PlacementError::InsufficientFunds {
            required: cost,
            available: economy.gold,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::DefenderId;

    fn economy(gold: u32) -> EconomyState {
        EconomyState {
            gold,
            lives: 20,
            score: 0,
            current_wave: 0,
            game_over: false,
        }
    }

    fn open_grid(_: CellCoord) -> Option<CellState> {
        Some(CellState::Walkable)
    }

    #[test]
    fn handle_emits_command_for_the_containing_cell() {
        let mut builder = Builder::new();
        let mut out = Vec::new();
        let cell = builder.handle(
            DefenderKind::Cannon,
            Vec2::new(70.0, 40.0),
            &SessionConfig::default(),
            &mut out,
        );

        assert_eq!(cell, Ok(CellCoord::new(2, 1)));
        assert_eq!(
            out,
            vec![Command::PlaceDefender {
                kind: DefenderKind::Cannon,
                cell: CellCoord::new(2, 1),
            }]
        );
    }

    #[test]
    fn handle_rejects_points_off_the_grid() {
        let mut builder = Builder::new();
        let mut out = Vec::new();
        let result = builder.handle(
            DefenderKind::Cannon,
            Vec2::new(-1.0, 40.0),
            &SessionConfig::default(),
            &mut out,
        );

        assert_eq!(result, Err(PlacementError::OutOfBounds));
        assert!(out.is_empty());
    }

    #[test]
    fn preview_reports_affordability() {
        let builder = Builder::new();
        let config = SessionConfig::default();
        let point = Vec2::new(100.0, 100.0);

        let rich = builder.preview(DefenderKind::Rocket, point, &config, &economy(250), open_grid);
        assert!(rich.placeable());
        assert_eq!(rich.cost, Some(250));

        let poor = builder.preview(DefenderKind::Rocket, point, &config, &economy(249), open_grid);
        assert_eq!(
            poor.rejection,
            Some(PlacementError::InsufficientFunds {
                required: 250,
                available: 249,
            })
        );
    }

    #[test]
    fn preview_reports_occupied_and_blocked_cells() {
        let builder = Builder::new();
        let config = SessionConfig::default();
        let point = Vec2::new(10.0, 10.0);

        let occupied = builder.preview(DefenderKind::Crossbow, point, &config, &economy(500), |_| {
            Some(CellState::Occupied(DefenderId::new(0)))
        });
        assert_eq!(occupied.rejection, Some(PlacementError::Occupied));

        let blocked = builder.preview(DefenderKind::Crossbow, point, &config, &economy(500), |_| {
            Some(CellState::Obstacle)
        });
        assert_eq!(blocked.rejection, Some(PlacementError::NotWalkable));
        assert_eq!(blocked.cell, Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn preview_after_defeat_is_rejected() {
        let builder = Builder::new();
        let mut lost = economy(500);
        lost.game_over = true;
        let preview = builder.preview(
            DefenderKind::Crossbow,
            Vec2::new(10.0, 10.0),
            &SessionConfig::default(),
            &lost,
            open_grid,
        );
        assert_eq!(preview.rejection, Some(PlacementError::SessionOver));
    }
}
