//! # Parity League
//!
//! Runs a complete round-robin even/odd league in one process: a manager, a few
//! referees and a field of players, all talking over the in-process network.
//!
//! ## 🚀 Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -- --players 6 --referees 2
//! PARITY_LEAGUE_CONFIG=league.toml cargo run
//! ```

use parity_league::config::LeagueConfig;
use parity_league::league::render_standings;
use parity_league::lifecycle::{setup_tracing, LeagueSystem};
use parity_league::model::ParityChoice;
use parity_league::player::{FixedParity, ParityStrategy, RandomParity};
use std::env;
use tracing::{error, info};

const NAMES: [&str; 8] = ["Ada", "Brian", "Chen", "Dana", "Emil", "Farah", "Goran", "Hana"];

fn print_usage() {
    println!("Parity League");
    println!();
    println!("Usage:");
    println!("  parity-league [--players N] [--referees N] [--wait SECS] [--config PATH]");
    println!();
    println!("Options:");
    println!("  --players, -p    number of players (default: min_players from config)");
    println!("  --referees, -r   number of referees (default: min_referees from config)");
    println!("  --wait, -w       start countdown in seconds (default: start_wait_secs)");
    println!("  --config, -c     TOML config file (default: $PARITY_LEAGUE_CONFIG)");
}

struct Options {
    players: Option<usize>,
    referees: Option<usize>,
    wait: Option<u64>,
    config: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        players: None,
        referees: None,
        wait: None,
        config: None,
    };
    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        let missing = || format!("{} needs a value", args[i]);
        match args[i].as_str() {
            "--players" | "-p" => {
                options.players = Some(value.ok_or_else(missing)?.parse().map_err(|e| format!("--players: {e}"))?);
                i += 1;
            }
            "--referees" | "-r" => {
                options.referees = Some(value.ok_or_else(missing)?.parse().map_err(|e| format!("--referees: {e}"))?);
                i += 1;
            }
            "--wait" | "-w" => {
                options.wait = Some(value.ok_or_else(missing)?.parse().map_err(|e| format!("--wait: {e}"))?);
                i += 1;
            }
            "--config" | "-c" => {
                options.config = Some(value.ok_or_else(missing)?.clone());
                i += 1;
            }
            other => return Err(format!("unknown argument {other}")),
        }
        i += 1;
    }
    Ok(options)
}

fn strategy_for(index: usize) -> Box<dyn ParityStrategy> {
    // A couple of stubborn players keep the table interesting.
    match index % 4 {
        1 => Box::new(FixedParity(ParityChoice::Even)),
        3 => Box::new(FixedParity(ParityChoice::Odd)),
        _ => Box::new(RandomParity),
    }
}

/// Applies the command line to `config` and returns the field size.
///
/// The start thresholds are lowered to the requested field, otherwise the league
/// would wait forever for participants that never come.
fn fit_to_field(config: &mut LeagueConfig, options: &Options) -> Result<(usize, usize), String> {
    if let Some(wait) = options.wait {
        config.start_wait_secs = wait;
    }
    let players = options.players.unwrap_or(config.min_players);
    let referees = options.referees.unwrap_or(config.min_referees).max(1);
    config.min_players = players;
    config.min_referees = config.min_referees.min(referees);
    config.validate().map_err(|e| e.to_string())?;
    Ok((players, referees))
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let options = parse_args(&args).map_err(|e| {
        print_usage();
        e
    })?;

    setup_tracing();

    let mut config = match &options.config {
        Some(path) => LeagueConfig::load(path),
        None => LeagueConfig::from_env(),
    }
    .map_err(|e| e.to_string())?;
    let (players, referees) = fit_to_field(&mut config, &options)?;

    info!(players, referees, wait_secs = config.start_wait_secs, "Starting league");
    let mut system = LeagueSystem::start(config);

    for _ in 0..referees {
        system.add_referee().await.map_err(|e| e.to_string())?;
    }
    for i in 0..players {
        let name = match NAMES.get(i) {
            Some(name) => name.to_string(),
            None => format!("Player {}", i + 1),
        };
        system
            .add_player(&name, strategy_for(i))
            .await
            .map_err(|e| e.to_string())?;
    }

    match system.wait_for_completion().await {
        Ok(snapshot) => {
            println!();
            println!("=== Final Standings ===");
            print!("{}", render_standings(&snapshot.standings));
            if let Some(champion) = snapshot.champion {
                println!();
                println!("🏆 Champion: {} ({}) with {} points", champion.display_name, champion.player_id, champion.points);
            }
        }
        Err(e) => error!(error = %e, "League did not complete"),
    }

    system.shutdown().await?;
    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> Options {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        parse_args(&args).unwrap()
    }

    #[test]
    fn test_small_field_lowers_start_threshold() {
        let mut config = LeagueConfig::default();
        let (players, referees) = fit_to_field(&mut config, &options(&["-p", "3", "-w", "0"])).unwrap();
        assert_eq!((players, referees), (3, 1));
        assert_eq!(config.min_players, 3);
        assert_eq!(config.start_wait_secs, 0);
    }

    #[test]
    fn test_referee_threshold_follows_field() {
        let mut config = LeagueConfig {
            min_referees: 3,
            ..LeagueConfig::default()
        };
        let (_, referees) = fit_to_field(&mut config, &options(&["--referees", "2"])).unwrap();
        assert_eq!(referees, 2);
        assert_eq!(config.min_referees, 2);
    }

    #[test]
    fn test_defaults_come_from_config() {
        let mut config = LeagueConfig::default();
        assert_eq!(fit_to_field(&mut config, &options(&[])).unwrap(), (4, 1));
    }

    #[test]
    fn test_single_player_is_rejected() {
        let mut config = LeagueConfig::default();
        assert!(fit_to_field(&mut config, &options(&["--players", "1"])).is_err());
    }
}
