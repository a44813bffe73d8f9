//! Replay loop around single games.

use memgame_hal::traits::{DaqBackend, HalError};
use memgame_runtime::engine::{GameEngine, GameOutcome};
use rand::Rng;
use std::io::{self, BufRead, Write};

pub const DISCONNECTED_MESSAGE: &str = "Error: simulator has been disconnected.";
pub const REPLAY_PROMPT: &str = "do you want to play again? (1 for yes, 0 for no.)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    PlayerQuit,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub end: SessionEnd,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("error starting board: {0}")]
    Init(#[source] HalError),
    #[error("console I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Runs games until the player declines or the board goes away.
///
/// Console text goes to `output`; replay answers come from `input`.
pub fn run_session<H, R, I, O>(
    engine: &mut GameEngine<H, R>,
    input: &mut I,
    output: &mut O,
    replay_pause_ms: u64,
) -> Result<SessionSummary, SessionError>
where
    H: DaqBackend,
    R: Rng,
    I: BufRead,
    O: Write,
{
    if let Err(e) = engine.hal.init_device() {
        writeln!(output, "Error starting DAQ board: {e}. Sorry!")?;
        return Err(SessionError::Init(e));
    }
    log::info!("board initialised, starting session");

    let mut summary = SessionSummary {
        games: 0,
        wins: 0,
        losses: 0,
        end: SessionEnd::PlayerQuit,
    };

    loop {
        if !engine.hal.device_connected() {
            summary.end = SessionEnd::Disconnected;
            break;
        }

        let report = engine.play_game();
        summary.games += 1;
        match report.outcome {
            GameOutcome::Won => summary.wins += 1,
            GameOutcome::Lost => summary.losses += 1,
            GameOutcome::Disconnected => {
                writeln!(output, "{DISCONNECTED_MESSAGE}")?;
                summary.end = SessionEnd::Disconnected;
                break;
            }
        }

        let again = ask_play_again(input, output)?;
        if !engine.hal.device_connected() {
            writeln!(output, "{DISCONNECTED_MESSAGE}")?;
            summary.end = SessionEnd::Disconnected;
            break;
        }
        if !again {
            break;
        }
        engine.hal.delay_ms(replay_pause_ms);
    }

    log::info!(
        "session over: {} game(s), {} won, {} lost ({:?})",
        summary.games,
        summary.wins,
        summary.losses,
        summary.end
    );
    Ok(summary)
}

/// Asks until an integer arrives. 1 means yes; anything else or end of
/// input means no.
pub fn ask_play_again<I: BufRead, O: Write>(input: &mut I, output: &mut O) -> io::Result<bool> {
    loop {
        writeln!(output, "{REPLAY_PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().parse::<i64>() {
            Ok(answer) => return Ok(answer == 1),
            Err(_) => log::warn!("replay answer {:?} is not a number", line.trim()),
        }
    }
}
