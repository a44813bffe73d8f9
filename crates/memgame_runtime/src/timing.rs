use serde::Deserialize;

/// Visual pacing of the game, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Pause before each playback light comes on.
    pub pre_delay_ms: u64,
    /// How long each playback light stays on.
    pub on_ms: u64,
    pub wrong_flashes: u32,
    /// On and off time of each wrong-answer blink.
    pub wrong_flash_ms: u64,
    pub end_flashes: u32,
    /// End-of-game flash `i` (1-based) stays on for `i * end_step_ms`.
    pub end_step_ms: u64,
    pub end_gap_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pre_delay_ms: 500,
            on_ms: 1000,
            wrong_flashes: 10,
            wrong_flash_ms: 50,
            end_flashes: 3,
            end_step_ms: 200,
            end_gap_ms: 300,
        }
    }
}
