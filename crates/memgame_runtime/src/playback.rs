use crate::engine::GameSettings;
use crate::sequence::Sequence;
use memgame_hal::traits::DaqBackend;

/// Shows the sequence oldest first, one light at a time.
///
/// Stops early when the board drops; the caller polls the link again
/// afterwards to learn about it.
pub fn play_sequence<H: DaqBackend>(hal: &mut H, sequence: &Sequence, settings: &GameSettings) {
    for symbol in sequence.iter() {
        let channel = settings.channels.light(symbol as usize);
        hal.delay_ms(settings.timing.pre_delay_ms);
        hal.digital_write(channel, true);
        hal.delay_ms(settings.timing.on_ms);
        hal.digital_write(channel, false);

        if !hal.device_connected() {
            log::debug!("playback aborted: board disconnected");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgame_hal::config::{ChannelMap, SimConfig};
    use memgame_hal::sim::{Pulse, SimBackend, SimEvent};

    #[test]
    fn single_symbol_lights_its_channel_once() {
        let settings = GameSettings::default();
        let mut sim = SimBackend::scripted(&settings.channels);
        play_sequence(&mut sim, &Sequence::from(vec![2]), &settings);

        assert_eq!(
            sim.pulses(2),
            vec![Pulse {
                start_ms: 500,
                duration_ms: 1000
            }]
        );
        for other in [0, 1, 3] {
            assert!(sim.pulses(other).is_empty());
        }
    }

    #[test]
    fn plays_oldest_symbol_first() {
        let settings = GameSettings::default();
        let mut sim = SimBackend::scripted(&settings.channels);
        play_sequence(&mut sim, &Sequence::from(vec![3, 0, 3]), &settings);

        let lit: Vec<usize> = sim
            .events()
            .iter()
            .filter_map(|e| match *e {
                SimEvent::Write {
                    channel,
                    level: true,
                    ..
                } => Some(channel),
                _ => None,
            })
            .collect();
        assert_eq!(lit, vec![3, 0, 3]);
        assert_eq!(sim.now_ms(), 3 * 1500);
    }

    #[test]
    fn honours_remapped_light_channels() {
        let settings = GameSettings {
            channels: ChannelMap {
                lights: vec![10, 11, 12, 13],
                ..ChannelMap::default()
            },
            ..GameSettings::default()
        };
        let mut sim = SimBackend::scripted(&settings.channels);
        play_sequence(&mut sim, &Sequence::from(vec![1]), &settings);
        assert_eq!(sim.pulses(11).len(), 1);
    }

    #[test]
    fn stops_after_disconnect() {
        let settings = GameSettings::default();
        let config = SimConfig {
            autoplay: false,
            disconnect_after_polls: Some(1),
            ..SimConfig::default()
        };
        let mut sim = SimBackend::with_config(config, &settings.channels);
        play_sequence(&mut sim, &Sequence::from(vec![0, 1, 2, 3]), &settings);

        assert_eq!(sim.pulses(0).len(), 1);
        assert_eq!(sim.pulses(1).len(), 1);
        assert!(sim.pulses(2).is_empty());
        assert!(sim.pulses(3).is_empty());
    }
}
