//! Blink patterns shown outside playback.

use crate::timing::Timing;
use memgame_hal::traits::DaqBackend;

/// Rapid blinking of the light the player should have pressed.
pub fn flash_correct_light<H: DaqBackend>(hal: &mut H, channel: usize, timing: &Timing) {
    for _ in 0..timing.wrong_flashes {
        hal.digital_write(channel, true);
        hal.delay_ms(timing.wrong_flash_ms);
        hal.digital_write(channel, false);
        hal.delay_ms(timing.wrong_flash_ms);
    }
}

/// Slow flashes of a win/loss indicator, each one longer than the last.
pub fn end_of_game_flash<H: DaqBackend>(hal: &mut H, channel: usize, timing: &Timing) {
    for step in 1..=u64::from(timing.end_flashes) {
        hal.digital_write(channel, true);
        hal.delay_ms(timing.end_step_ms * step);
        hal.digital_write(channel, false);
        hal.delay_ms(timing.end_gap_ms);
    }
}
