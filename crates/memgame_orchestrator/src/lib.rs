//! Session orchestrator: coordinates board, engine and console.
//!
//! Reads a TOML config file, selects the board backend, builds the game
//! engine and runs the replay loop in `session`.
//!
//! Supported modes:
//! - `sim`: SimBackend (tests and self-playing demo)
//! - `modbus_tcp`: ModbusBackend over TCP
//! - `modbus_rtu`: ModbusBackend over a serial port
//! - `fpga`: reserved

pub mod session;

use memgame_hal::config::{AddressMapping, ChannelMap, SimConfig};
use memgame_hal::sim::SimBackend;
use memgame_hal::traits::{DaqBackend, HalError};
use memgame_modbus::{ModbusBackend, ModbusLink};
use memgame_runtime::engine::{DEFAULT_ROUNDS, GameEngine, GameSettings};
use memgame_runtime::sequence::MAX_SYMBOLS;
use memgame_runtime::timing::Timing;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::time::Duration;

/// Top-level config, deserialized from TOML.
#[derive(Debug, Deserialize)]
pub struct OrchestratorConfig {
    pub mode: ModeConfig,
    #[serde(default)]
    pub modbus: Option<ModbusSection>,
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub channels: ChannelMap,
    #[serde(default)]
    pub mapping: AddressMapping,
    #[serde(default)]
    pub sim: SimConfig,
}

#[derive(Debug, Deserialize)]
pub struct ModeConfig {
    #[serde(rename = "type")]
    pub mode_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ModbusSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_slave_id")]
    pub slave_id: u8,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    // RTU fields
    #[serde(default)]
    pub serial_port: Option<String>,
    #[serde(default)]
    pub baud_rate: Option<u32>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    502
}
fn default_slave_id() -> u8 {
    1
}
fn default_timeout() -> u64 {
    1000
}

#[derive(Debug, Deserialize)]
pub struct GameSection {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Fixed RNG seed; drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_replay_pause")]
    pub replay_pause_ms: u64,
}

fn default_rounds() -> usize {
    DEFAULT_ROUNDS
}
fn default_replay_pause() -> u64 {
    1000
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            seed: None,
            replay_pause_ms: default_replay_pause(),
        }
    }
}

/// Board selected by `[mode]`, with the link details already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum HalMode {
    Sim,
    Modbus {
        link: ModbusLink,
        slave_id: u8,
        timeout: Duration,
    },
    Fpga,
}

impl ModbusSection {
    fn tcp_link(&self) -> Result<ModbusLink, OrchestratorError> {
        let addr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| OrchestratorError::ConfigError(format!("modbus.host: {e}")))?;
        Ok(ModbusLink::Tcp(addr))
    }

    fn rtu_link(&self) -> Result<ModbusLink, OrchestratorError> {
        let serial_port = self.serial_port.clone().ok_or_else(|| {
            OrchestratorError::ConfigError("modbus.serial_port required for RTU".into())
        })?;
        Ok(ModbusLink::Rtu {
            serial_port,
            baud_rate: self.baud_rate.unwrap_or(9600),
        })
    }
}

impl Default for OrchestratorConfig {
    /// Self-playing simulated board with the standard game.
    fn default() -> Self {
        Self {
            mode: ModeConfig {
                mode_type: "sim".to_string(),
            },
            modbus: None,
            game: GameSection::default(),
            timing: Timing::default(),
            channels: ChannelMap::default(),
            mapping: AddressMapping::default(),
            sim: SimConfig {
                realtime: true,
                ..SimConfig::default()
            },
        }
    }
}

impl OrchestratorConfig {
    /// Parse from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Parse and validate a TOML file.
    pub fn from_file(path: &str) -> Result<Self, OrchestratorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OrchestratorError::ConfigError(format!("{path}: {e}")))?;
        let config =
            Self::from_toml(&content).map_err(|e| OrchestratorError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves `[mode]` and, for Modbus boards, the `[modbus]` link.
    pub fn hal_mode(&self) -> Result<HalMode, OrchestratorError> {
        match self.mode.mode_type.as_str() {
            "sim" => Ok(HalMode::Sim),
            "modbus_tcp" => self.modbus_mode(ModbusSection::tcp_link),
            "modbus_rtu" => self.modbus_mode(ModbusSection::rtu_link),
            "fpga" => Ok(HalMode::Fpga),
            other => Err(OrchestratorError::ConfigError(format!(
                "unknown mode type: {other}"
            ))),
        }
    }

    fn modbus_mode(
        &self,
        link: fn(&ModbusSection) -> Result<ModbusLink, OrchestratorError>,
    ) -> Result<HalMode, OrchestratorError> {
        let section = self.modbus.as_ref().ok_or_else(|| {
            OrchestratorError::ConfigError(format!(
                "[modbus] section required for {}",
                self.mode.mode_type
            ))
        })?;
        Ok(HalMode::Modbus {
            link: link(section)?,
            slave_id: section.slave_id,
            timeout: Duration::from_millis(section.timeout_ms),
        })
    }

    /// Checks the parts serde cannot: channel layout and round count.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        let mode = self.hal_mode()?;
        self.channels.validate()?;
        if matches!(mode, HalMode::Modbus { .. }) {
            self.mapping.covers(&self.channels)?;
        }
        if !(1..=MAX_SYMBOLS).contains(&self.game.rounds) {
            return Err(OrchestratorError::ConfigError(format!(
                "game.rounds must be between 1 and {MAX_SYMBOLS}, got {}",
                self.game.rounds
            )));
        }
        Ok(())
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            rounds: self.game.rounds,
            timing: self.timing,
            channels: self.channels.clone(),
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.game.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Validates the config and creates its board backend. The board is not
/// initialised yet.
pub fn create_backend(
    config: &OrchestratorConfig,
) -> Result<Box<dyn DaqBackend>, OrchestratorError> {
    config.validate()?;
    match config.hal_mode()? {
        HalMode::Sim => Ok(Box::new(SimBackend::with_config(
            config.sim.clone(),
            &config.channels,
        ))),
        HalMode::Modbus {
            link,
            slave_id,
            timeout,
        } => {
            let backend = ModbusBackend::new(link, slave_id, timeout, config.mapping.clone())?;
            Ok(Box::new(backend))
        }
        HalMode::Fpga => Err(OrchestratorError::ConfigError(
            "FPGA backend not yet implemented".into(),
        )),
    }
}

/// Backend, RNG and settings assembled into a ready engine.
pub fn create_engine(
    config: &OrchestratorConfig,
) -> Result<GameEngine<Box<dyn DaqBackend>, StdRng>, OrchestratorError> {
    let backend = create_backend(config)?;
    Ok(GameEngine::new(backend, config.rng(), config.game_settings()))
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("config error: {0}")]
    ConfigError(String),
    #[error("HAL error: {0}")]
    HalError(#[from] HalError),
}
