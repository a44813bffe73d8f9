use crate::engine::GameSettings;
use crate::feedback;
use crate::sequence::{Sequence, Symbol};
use memgame_hal::config::ChannelMap;
use memgame_hal::traits::DaqBackend;

/// Result of waiting for one button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Button(Symbol),
    Disconnected,
}

/// Result of checking the player's answer for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Success,
    Mismatch {
        /// 0-based index into the sequence.
        position: usize,
        expected: Symbol,
        pressed: Symbol,
    },
    Disconnected,
}

/// Blocks until one button has been pressed and released.
///
/// Buttons are scanned in index order and a pressed one is read until it
/// lets go, so a held button counts once. With several buttons down the
/// lowest index wins. The link is polled before every read and once more
/// after the release.
pub fn await_press<H: DaqBackend>(hal: &mut H, channels: &ChannelMap) -> Press {
    loop {
        for (index, &channel) in channels.buttons.iter().enumerate() {
            if !hal.device_connected() {
                return Press::Disconnected;
            }
            let mut pressed = false;
            while hal.digital_read(channel) {
                pressed = true;
                if !hal.device_connected() {
                    return Press::Disconnected;
                }
            }
            if pressed {
                // A failed read also looks like a release.
                if !hal.device_connected() {
                    return Press::Disconnected;
                }
                return Press::Button(index as Symbol);
            }
        }
    }
}

/// Reads one press per symbol and compares it with the sequence.
///
/// The first wrong press flashes the light that was expected and ends the
/// check.
pub fn validate_input<H: DaqBackend>(
    hal: &mut H,
    sequence: &Sequence,
    settings: &GameSettings,
) -> Validation {
    for (position, expected) in sequence.iter().enumerate() {
        let pressed = match await_press(hal, &settings.channels) {
            Press::Button(symbol) => symbol,
            Press::Disconnected => return Validation::Disconnected,
        };
        if pressed != expected {
            log::debug!("press {position}: expected {expected}, got {pressed}");
            let channel = settings.channels.light(expected as usize);
            feedback::flash_correct_light(hal, channel, &settings.timing);
            return Validation::Mismatch {
                position,
                expected,
                pressed,
            };
        }
    }
    Validation::Success
}
