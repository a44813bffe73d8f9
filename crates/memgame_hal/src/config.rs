use crate::traits::{HalError, NUM_LIGHTS};
use serde::Deserialize;
use std::collections::HashSet;

/// Which board channel carries each light, button and indicator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelMap {
    #[serde(default = "default_lights")]
    pub lights: Vec<usize>,
    #[serde(default = "default_buttons")]
    pub buttons: Vec<usize>,
    #[serde(default = "default_win")]
    pub win: usize,
    #[serde(default = "default_loss")]
    pub loss: usize,
}

fn default_lights() -> Vec<usize> {
    (0..NUM_LIGHTS).collect()
}
fn default_buttons() -> Vec<usize> {
    (0..NUM_LIGHTS).collect()
}
fn default_win() -> usize {
    NUM_LIGHTS
}
fn default_loss() -> usize {
    NUM_LIGHTS + 1
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            lights: default_lights(),
            buttons: default_buttons(),
            win: default_win(),
            loss: default_loss(),
        }
    }
}

impl ChannelMap {
    /// Output channel of light `index`.
    pub fn light(&self, index: usize) -> usize {
        self.lights[index]
    }

    /// Input channel of button `index`.
    pub fn button(&self, index: usize) -> usize {
        self.buttons[index]
    }

    /// Every output channel the game drives, lights first.
    pub fn outputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.lights
            .iter()
            .copied()
            .chain([self.win, self.loss])
    }

    pub fn validate(&self) -> Result<(), HalError> {
        if self.lights.len() != NUM_LIGHTS {
            return Err(HalError::InvalidMapping(format!(
                "expected {NUM_LIGHTS} light channels, got {}",
                self.lights.len()
            )));
        }
        if self.buttons.len() != NUM_LIGHTS {
            return Err(HalError::InvalidMapping(format!(
                "expected {NUM_LIGHTS} button channels, got {}",
                self.buttons.len()
            )));
        }
        let outputs: HashSet<usize> = self.outputs().collect();
        if outputs.len() != NUM_LIGHTS + 2 {
            return Err(HalError::InvalidMapping(
                "light, win and loss channels must all be distinct".into(),
            ));
        }
        let inputs: HashSet<usize> = self.buttons.iter().copied().collect();
        if inputs.len() != NUM_LIGHTS {
            return Err(HalError::InvalidMapping(
                "button channels must be distinct".into(),
            ));
        }
        Ok(())
    }
}

/// Register addresses behind each channel on a fieldbus board.
///
/// Output channel `n` is coil `outputs[n]`, input channel `n` is discrete
/// input `inputs[n]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressMapping {
    #[serde(default = "default_output_addresses")]
    pub outputs: Vec<u16>,
    #[serde(default = "default_input_addresses")]
    pub inputs: Vec<u16>,
}

fn default_output_addresses() -> Vec<u16> {
    (0..(NUM_LIGHTS + 2) as u16).collect()
}
fn default_input_addresses() -> Vec<u16> {
    (0..NUM_LIGHTS as u16).collect()
}

impl Default for AddressMapping {
    fn default() -> Self {
        Self {
            outputs: default_output_addresses(),
            inputs: default_input_addresses(),
        }
    }
}

impl AddressMapping {
    pub fn coil(&self, channel: usize) -> Option<u16> {
        self.outputs.get(channel).copied()
    }

    pub fn discrete_input(&self, channel: usize) -> Option<u16> {
        self.inputs.get(channel).copied()
    }

    /// Checks that every channel in `channels` has an address.
    pub fn covers(&self, channels: &ChannelMap) -> Result<(), HalError> {
        if let Some(missing) = channels.outputs().find(|&c| self.coil(c).is_none()) {
            return Err(HalError::InvalidMapping(format!(
                "no coil address for output channel {missing}"
            )));
        }
        if let Some(missing) = channels
            .buttons
            .iter()
            .copied()
            .find(|&c| self.discrete_input(c).is_none())
        {
            return Err(HalError::InvalidMapping(format!(
                "no discrete input address for input channel {missing}"
            )));
        }
        Ok(())
    }
}

/// Behaviour of the simulated board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Echo every light shown during playback back as button presses.
    pub autoplay: bool,
    /// Echoed round (1-based, counted over the board's lifetime) whose last
    /// press goes to the wrong button.
    pub autoplay_mistake_round: Option<u32>,
    /// Lights lit for less than this are not echoed.
    pub autoplay_min_on_ms: u64,
    /// Number of reads a press stays down before it is released.
    pub hold_reads: u32,
    /// Link drops after this many connection polls.
    pub disconnect_after_polls: Option<u64>,
    pub fail_init: bool,
    /// Sleep for real in `delay_ms` instead of only advancing the virtual clock.
    pub realtime: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            autoplay_mistake_round: None,
            autoplay_min_on_ms: 200,
            hold_reads: 3,
            disconnect_after_polls: None,
            fail_init: false,
            realtime: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_channel_map_is_valid() {
        let channels = ChannelMap::default();
        assert!(channels.validate().is_ok());
        assert_eq!(channels.outputs().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn rejects_indicator_on_light_channel() {
        let channels = ChannelMap {
            win: 2,
            ..ChannelMap::default()
        };
        assert!(matches!(
            channels.validate(),
            Err(HalError::InvalidMapping(_))
        ));
    }

    #[test]
    fn rejects_wrong_button_count() {
        let channels = ChannelMap {
            buttons: vec![0, 1, 2],
            ..ChannelMap::default()
        };
        assert!(channels.validate().is_err());
    }

    #[test]
    fn parses_partial_channel_table() {
        let channels: ChannelMap = toml::from_str("win = 8\nloss = 9\n").unwrap();
        assert_eq!(channels.lights, vec![0, 1, 2, 3]);
        assert_eq!(channels.win, 8);
        assert!(channels.validate().is_ok());
    }

    #[test]
    fn address_mapping_must_cover_channels() {
        let channels = ChannelMap {
            win: 8,
            loss: 9,
            ..ChannelMap::default()
        };
        assert!(AddressMapping::default().covers(&channels).is_err());

        let mapping = AddressMapping {
            outputs: vec![0, 1, 2, 3, 0, 0, 0, 0, 16, 17],
            inputs: vec![0, 1, 2, 3],
        };
        assert!(mapping.covers(&channels).is_ok());
        assert_eq!(mapping.coil(9), Some(17));
    }

    #[test]
    fn sim_config_defaults_fill_missing_keys() {
        let sim: SimConfig = toml::from_str("autoplay_mistake_round = 2\n").unwrap();
        assert!(sim.autoplay);
        assert_eq!(sim.autoplay_mistake_round, Some(2));
        assert_eq!(sim.hold_reads, 3);
    }
}
