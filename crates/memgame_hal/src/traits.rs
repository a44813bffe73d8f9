use std::time::Duration;
use thiserror::Error;

/// Number of light/button pairs on the board.
pub const NUM_LIGHTS: usize = 4;

#[derive(Debug, Error)]
pub enum HalError {
    #[error("communication error: {0}")]
    CommError(String),
    #[error("device initialisation failed: {0}")]
    InitFailed(String),
    #[error("invalid channel mapping: {0}")]
    InvalidMapping(String),
    #[error("device not connected")]
    NotConnected,
    #[error("timeout")]
    Timeout,
}

/// Digital I/O board as seen by the game.
///
/// Channels are plain indices. Outputs carry the lights and the two
/// end-of-game indicators, inputs carry the buttons (`true` = pressed).
pub trait DaqBackend: Send {
    /// Brings the board up. Called once per session; failure is fatal.
    fn init_device(&mut self) -> Result<(), HalError>;

    /// Polls the link. Once this returns `false` the board stays gone.
    fn device_connected(&mut self) -> bool;

    fn digital_read(&mut self, channel: usize) -> bool;
    fn digital_write(&mut self, channel: usize, level: bool);

    /// Blocking pause used for visual pacing.
    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

impl DaqBackend for Box<dyn DaqBackend> {
    fn init_device(&mut self) -> Result<(), HalError> {
        (**self).init_device()
    }
    fn device_connected(&mut self) -> bool {
        (**self).device_connected()
    }
    fn digital_read(&mut self, channel: usize) -> bool {
        (**self).digital_read(channel)
    }
    fn digital_write(&mut self, channel: usize, level: bool) {
        (**self).digital_write(channel, level)
    }
    fn delay_ms(&mut self, ms: u64) {
        (**self).delay_ms(ms)
    }
}
