use memgame_orchestrator::session::run_session;
use memgame_orchestrator::{OrchestratorConfig, create_engine};
use std::env;
use std::io;
use std::path::Path;

fn main() {
    env_logger::init();

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "memory_game".to_string());
    let path = args.next();

    if args.next().is_some() {
        eprintln!("Usage: {program} [config.toml]");
        std::process::exit(2);
    }

    let config = match path {
        Some(path) => {
            if Path::new(&path).extension().and_then(|ext| ext.to_str()) != Some("toml") {
                eprintln!("Expected a .toml config path, got: {path}");
                std::process::exit(2);
            }
            OrchestratorConfig::from_file(&path).unwrap_or_else(|e| {
                eprintln!("{e}");
                std::process::exit(2)
            })
        }
        None => OrchestratorConfig::default(),
    };

    let mut engine = create_engine(&config).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(2)
    });
    log::info!(
        "memory game: mode {}, {} round(s) to win",
        config.mode.mode_type,
        config.game.rounds
    );

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    match run_session(&mut engine, &mut input, &mut output, config.game.replay_pause_ms) {
        Ok(summary) => log::info!(
            "played {} game(s): {} won, {} lost",
            summary.games,
            summary.wins,
            summary.losses
        ),
        Err(e) => log::error!("{e}"),
    }
}
