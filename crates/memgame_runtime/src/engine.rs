use crate::feedback;
use crate::input::{self, Validation};
use crate::playback;
use crate::sequence::Sequence;
use crate::timing::Timing;
use memgame_hal::config::ChannelMap;
use memgame_hal::traits::DaqBackend;
use rand::Rng;

/// Rounds needed to win a game.
pub const DEFAULT_ROUNDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub rounds: usize,
    pub timing: Timing,
    pub channels: ChannelMap,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            timing: Timing::default(),
            channels: ChannelMap::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
    Disconnected,
}

/// Position of a game in the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Round `n` (1-based) is next to be played.
    AwaitingRound(usize),
    Won,
    Lost,
    Disconnected,
}

impl RoundState {
    pub fn outcome(self) -> Option<GameOutcome> {
        match self {
            RoundState::AwaitingRound(_) => None,
            RoundState::Won => Some(GameOutcome::Won),
            RoundState::Lost => Some(GameOutcome::Lost),
            RoundState::Disconnected => Some(GameOutcome::Disconnected),
        }
    }
}

/// Everything one game owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub sequence: Sequence,
    pub state: RoundState,
    pub rounds_completed: usize,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            sequence: Sequence::new(),
            state: RoundState::AwaitingRound(1),
            rounds_completed: 0,
        }
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.state.outcome()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub outcome: GameOutcome,
    pub rounds_completed: usize,
    pub sequence: Sequence,
}

/// Drives games on one board.
pub struct GameEngine<H: DaqBackend, R: Rng> {
    pub hal: H,
    pub rng: R,
    pub settings: GameSettings,
    pub games_played: u64,
}

impl<H: DaqBackend, R: Rng> GameEngine<H, R> {
    pub fn new(hal: H, rng: R, settings: GameSettings) -> Self {
        Self {
            hal,
            rng,
            settings,
            games_played: 0,
        }
    }

    /// Plays rounds until the game ends, then shows the end-of-game flash.
    pub fn play_game(&mut self) -> GameReport {
        let mut game = GameState::new();
        let outcome = loop {
            if let Some(outcome) = game.outcome() {
                break outcome;
            }
            self.step(&mut game);
        };

        match outcome {
            GameOutcome::Won => feedback::end_of_game_flash(
                &mut self.hal,
                self.settings.channels.win,
                &self.settings.timing,
            ),
            GameOutcome::Lost => feedback::end_of_game_flash(
                &mut self.hal,
                self.settings.channels.loss,
                &self.settings.timing,
            ),
            GameOutcome::Disconnected => {}
        }

        self.games_played += 1;
        log::info!(
            "game {} finished: {:?} after {} round(s)",
            self.games_played,
            outcome,
            game.rounds_completed
        );
        GameReport {
            outcome,
            rounds_completed: game.rounds_completed,
            sequence: game.sequence,
        }
    }

    /// Plays one round. Does nothing once the game has ended.
    pub fn step(&mut self, game: &mut GameState) {
        let RoundState::AwaitingRound(round) = game.state else {
            return;
        };

        let symbol = game.sequence.extend_random(&mut self.rng);
        log::debug!("round {round}: appended light {symbol}");

        playback::play_sequence(&mut self.hal, &game.sequence, &self.settings);
        if !self.hal.device_connected() {
            log::warn!("board disconnected during playback of round {round}");
            game.state = RoundState::Disconnected;
            return;
        }

        game.state = match input::validate_input(&mut self.hal, &game.sequence, &self.settings) {
            Validation::Disconnected => {
                log::warn!("board disconnected while reading round {round}");
                RoundState::Disconnected
            }
            Validation::Mismatch { .. } => RoundState::Lost,
            Validation::Success => {
                game.rounds_completed = round;
                if round >= self.settings.rounds {
                    RoundState::Won
                } else {
                    RoundState::AwaitingRound(round + 1)
                }
            }
        };
    }
}
