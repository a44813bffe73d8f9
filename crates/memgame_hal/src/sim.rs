use crate::config::{ChannelMap, SimConfig};
use crate::traits::{DaqBackend, HalError};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// One interaction with the simulated board, in order of occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Write { channel: usize, level: bool, at_ms: u64 },
    Read { channel: usize, pressed: bool },
    Poll { connected: bool },
}

/// An output held high from `start_ms` for `duration_ms` of virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub start_ms: u64,
    pub duration_ms: u64,
}

/// In-memory board with a virtual clock.
///
/// Button presses are queued and released after `hold_reads` reads of the
/// pressed channel. With autoplay on, the board presses back every light it
/// saw during playback.
pub struct SimBackend {
    config: SimConfig,
    channels: ChannelMap,
    outputs: HashMap<usize, bool>,
    held: HashMap<usize, u32>,
    pending: VecDeque<Vec<usize>>,
    lit_since: HashMap<usize, u64>,
    seen: Vec<usize>,
    rounds_echoed: u32,
    connected: bool,
    polls: u64,
    now_ms: u64,
    events: Vec<SimEvent>,
}

impl SimBackend {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default(), &ChannelMap::default())
    }

    pub fn with_config(config: SimConfig, channels: &ChannelMap) -> Self {
        Self {
            config,
            channels: channels.clone(),
            outputs: HashMap::new(),
            held: HashMap::new(),
            pending: VecDeque::new(),
            lit_since: HashMap::new(),
            seen: Vec::new(),
            rounds_echoed: 0,
            connected: true,
            polls: 0,
            now_ms: 0,
            events: Vec::new(),
        }
    }

    /// Board that only presses what the caller queues.
    pub fn scripted(channels: &ChannelMap) -> Self {
        let config = SimConfig {
            autoplay: false,
            ..SimConfig::default()
        };
        Self::with_config(config, channels)
    }

    /// Queues a press of one input channel.
    pub fn press(&mut self, channel: usize) {
        self.pending.push_back(vec![channel]);
    }

    /// Queues several input channels pressed at the same time.
    pub fn press_chord(&mut self, channels: &[usize]) {
        self.pending.push_back(channels.to_vec());
    }

    /// Drops the link; every later poll reports disconnected.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn get_output(&self, channel: usize) -> Option<bool> {
        self.outputs.get(&channel).copied()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn read_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::Read { .. }))
            .count()
    }

    /// High periods of an output channel, from the write log.
    pub fn pulses(&self, channel: usize) -> Vec<Pulse> {
        let mut pulses = Vec::new();
        let mut rising = None;
        for event in &self.events {
            if let SimEvent::Write {
                channel: c,
                level,
                at_ms,
            } = *event
            {
                if c != channel {
                    continue;
                }
                match (level, rising) {
                    (true, None) => rising = Some(at_ms),
                    (false, Some(start_ms)) => {
                        pulses.push(Pulse {
                            start_ms,
                            duration_ms: at_ms - start_ms,
                        });
                        rising = None;
                    }
                    _ => {}
                }
            }
        }
        pulses
    }

    fn nothing_held(&self) -> bool {
        self.held.values().all(|&n| n == 0)
    }

    /// Turns the lights seen since the last read into queued presses.
    fn echo_seen_lights(&mut self) {
        if self.seen.is_empty() {
            return;
        }
        self.rounds_echoed += 1;
        let mut presses: Vec<usize> = self.seen.drain(..).collect();
        if self.config.autoplay_mistake_round == Some(self.rounds_echoed) {
            if let Some(last) = presses.last_mut() {
                *last = (*last + 1) % self.channels.buttons.len();
            }
            log::debug!("sim: round {} echoed with a wrong last press", self.rounds_echoed);
        }
        for index in presses {
            let button = self.channels.button(index);
            self.pending.push_back(vec![button]);
        }
    }

    fn start_next_press(&mut self) {
        if self.config.autoplay && self.pending.is_empty() {
            self.echo_seen_lights();
        }
        if let Some(chord) = self.pending.pop_front() {
            let hold = self.config.hold_reads.max(1);
            for channel in chord {
                self.held.insert(channel, hold);
            }
        }
    }

    fn track_light(&mut self, channel: usize, level: bool) {
        let Some(index) = self.channels.lights.iter().position(|&c| c == channel) else {
            return;
        };
        if level {
            self.lit_since.entry(channel).or_insert(self.now_ms);
        } else if let Some(since) = self.lit_since.remove(&channel) {
            if self.now_ms - since >= self.config.autoplay_min_on_ms {
                self.seen.push(index);
            }
        }
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DaqBackend for SimBackend {
    fn init_device(&mut self) -> Result<(), HalError> {
        if self.config.fail_init {
            return Err(HalError::InitFailed("simulated board refused to start".into()));
        }
        log::info!("sim: board ready (autoplay: {})", self.config.autoplay);
        Ok(())
    }

    fn device_connected(&mut self) -> bool {
        self.polls += 1;
        if let Some(limit) = self.config.disconnect_after_polls {
            if self.polls > limit {
                self.connected = false;
            }
        }
        self.events.push(SimEvent::Poll {
            connected: self.connected,
        });
        self.connected
    }

    fn digital_read(&mut self, channel: usize) -> bool {
        if self.connected && self.nothing_held() {
            self.start_next_press();
        }
        let pressed = match self.held.get_mut(&channel) {
            Some(remaining) if self.connected && *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        self.events.push(SimEvent::Read { channel, pressed });
        pressed
    }

    fn digital_write(&mut self, channel: usize, level: bool) {
        self.outputs.insert(channel, level);
        if self.config.autoplay {
            self.track_light(channel, level);
        }
        self.events.push(SimEvent::Write {
            channel,
            level,
            at_ms: self.now_ms,
        });
    }

    fn delay_ms(&mut self, ms: u64) {
        self.now_ms += ms;
        if self.config.realtime {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_until_released(sim: &mut SimBackend, channel: usize) -> usize {
        let mut reads = 0;
        while sim.digital_read(channel) {
            reads += 1;
        }
        reads
    }

    #[test]
    fn unknown_input_reads_released() {
        let mut sim = SimBackend::scripted(&ChannelMap::default());
        assert!(!sim.digital_read(3));
        assert_eq!(sim.get_output(0), None);
    }

    #[test]
    fn queued_press_holds_for_configured_reads() {
        let mut sim = SimBackend::scripted(&ChannelMap::default());
        sim.press(2);
        assert!(!sim.digital_read(0));
        assert_eq!(read_until_released(&mut sim, 2), 3);
        assert!(!sim.digital_read(2));
    }

    #[test]
    fn presses_are_served_in_order() {
        let mut sim = SimBackend::scripted(&ChannelMap::default());
        sim.press(1);
        sim.press(0);
        assert!(!sim.digital_read(0));
        assert_eq!(read_until_released(&mut sim, 1), 3);
        assert_eq!(read_until_released(&mut sim, 0), 3);
    }

    #[test]
    fn chord_holds_every_channel() {
        let mut sim = SimBackend::scripted(&ChannelMap::default());
        sim.press_chord(&[1, 3]);
        assert!(sim.digital_read(1));
        assert!(sim.digital_read(3));
    }

    #[test]
    fn disconnects_after_poll_budget() {
        let config = SimConfig {
            disconnect_after_polls: Some(2),
            ..SimConfig::default()
        };
        let mut sim = SimBackend::with_config(config, &ChannelMap::default());
        assert!(sim.device_connected());
        assert!(sim.device_connected());
        assert!(!sim.device_connected());
        assert!(!sim.device_connected());
    }

    #[test]
    fn disconnected_board_reads_nothing() {
        let mut sim = SimBackend::scripted(&ChannelMap::default());
        sim.press(0);
        sim.disconnect();
        assert!(!sim.digital_read(0));
        assert!(!sim.device_connected());
    }

    #[test]
    fn init_failure_is_reported() {
        let config = SimConfig {
            fail_init: true,
            ..SimConfig::default()
        };
        let mut sim = SimBackend::with_config(config, &ChannelMap::default());
        assert!(matches!(sim.init_device(), Err(HalError::InitFailed(_))));
    }

    #[test]
    fn pulses_follow_virtual_clock() {
        let mut sim = SimBackend::scripted(&ChannelMap::default());
        sim.delay_ms(500);
        sim.digital_write(2, true);
        sim.delay_ms(1000);
        sim.digital_write(2, false);
        assert_eq!(
            sim.pulses(2),
            vec![Pulse {
                start_ms: 500,
                duration_ms: 1000
            }]
        );
        assert!(sim.pulses(1).is_empty());
        assert_eq!(sim.now_ms(), 1500);
    }

    #[test]
    fn autoplay_echoes_long_flashes_only() {
        let mut sim = SimBackend::new();
        for light in [3, 1] {
            sim.digital_write(light, true);
            sim.delay_ms(1000);
            sim.digital_write(light, false);
        }
        sim.digital_write(0, true);
        sim.delay_ms(50);
        sim.digital_write(0, false);

        assert!(!sim.digital_read(0));
        assert!(!sim.digital_read(1));
        assert!(!sim.digital_read(2));
        assert_eq!(read_until_released(&mut sim, 3), 3);
        assert_eq!(read_until_released(&mut sim, 1), 3);
        assert!(!sim.digital_read(0));
    }

    #[test]
    fn autoplay_mistake_shifts_last_press() {
        let config = SimConfig {
            autoplay_mistake_round: Some(1),
            ..SimConfig::default()
        };
        let mut sim = SimBackend::with_config(config, &ChannelMap::default());
        sim.digital_write(3, true);
        sim.delay_ms(1000);
        sim.digital_write(3, false);

        assert!(sim.digital_read(0));
    }
}
