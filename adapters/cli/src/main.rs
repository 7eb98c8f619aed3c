#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Bastion session and prints its event stream.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{Context, Result};
use bastion_core::{DefenderKind, Event, SessionConfig};
use bastion_simulation::Simulation;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Runs a scripted defence session without presentation.
#[derive(Debug, Parser)]
#[command(name = "bastion", version, about)]
struct Cli {
    /// Session configuration in TOML; the shipped defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Defender constructed before the first tick, as `kind@x,y` in world units.
    #[arg(long = "place", value_name = "KIND@X,Y")]
    placements: Vec<Placement>,
    /// Simulated session length in seconds.
    #[arg(long, default_value_t = 180)]
    seconds: u64,
    /// Length of one simulated tick in milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Prints only the final summary instead of every event.
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    kind: DefenderKind,
    x: f32,
    y: f32,
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, point) = value
            .split_once('@')
            .ok_or_else(|| format!("expected KIND@X,Y, got `{value}`"))?;
        let kind = parse_kind(kind.trim())?;
        let (x, y) = point
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y coordinates, got `{point}`"))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| format!("invalid x coordinate `{x}`"))?;
        let y = y
            .trim()
            .parse()
            .map_err(|_| format!("invalid y coordinate `{y}`"))?;
        Ok(Self { kind, x, y })
    }
}

fn parse_kind(name: &str) -> Result<DefenderKind, String> {
    match name.to_ascii_lowercase().as_str() {
        "crossbow" => Ok(DefenderKind::Crossbow),
        "cannon" => Ok(DefenderKind::Cannon),
        "magic" => Ok(DefenderKind::Magic),
        "rocket" => Ok(DefenderKind::Rocket),
        other => Err(format!("unknown defender type `{other}`")),
    }
}

/// Entry point for the Bastion command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let mut simulation = Simulation::new(config).context("invalid session configuration")?;

    for placement in &cli.placements {
        match simulation.request_place(placement.kind, placement.x, placement.y) {
            Ok(defender) => tracing::info!(
                defender = defender.get(),
                kind = ?placement.kind,
                "defender placed"
            ),
            Err(reason) => tracing::warn!(
                kind = ?placement.kind,
                x = placement.x,
                y = placement.y,
                %reason,
                "placement rejected"
            ),
        }
    }

    let tick = Duration::from_millis(cli.tick_ms);
    let end = Duration::from_secs(cli.seconds);
    let mut now = Duration::ZERO;
    while now < end {
        now += tick;
        let events = simulation.advance(tick, now);
        if !cli.quiet {
            for event in events {
                if !matches!(event, Event::TimeAdvanced { .. }) {
                    println!("{:>9.3}s {event:?}", now.as_secs_f64());
                }
            }
        }
        let finished = events
            .iter()
            .any(|event| matches!(event, Event::GameOver | Event::GameWon));
        if finished {
            break;
        }
    }

    let economy = simulation.economy();
    let outcome = if economy.game_over {
        "defeat"
    } else if simulation.is_victorious() {
        "victory"
    } else {
        "unfinished"
    };
    println!(
        "{outcome} after {:.1}s: wave {}, score {}, gold {}, lives {}",
        now.as_secs_f64(),
        economy.current_wave,
        economy.score,
        economy.gold,
        economy.lives
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SessionConfig::from_toml_str(&source)
        .with_context(|| format!("failed to load session configuration from {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn placement_parses_kind_and_coordinates() {
        assert_eq!(
            "Cannon@ 250, 420.5".parse::<Placement>(),
            Ok(Placement {
                kind: DefenderKind::Cannon,
                x: 250.0,
                y: 420.5,
            })
        );
        assert!("tesla@1,2".parse::<Placement>().is_err());
        assert!("crossbow@1".parse::<Placement>().is_err());
        assert!("crossbow".parse::<Placement>().is_err());
    }

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shipped_configuration_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/session.toml");
        let config = load_config(Some(&path)).expect("shipped configuration loads");
        assert_eq!(config, SessionConfig::default());
    }
}
