//! Modbus RTU/TCP backend for the memory game board.
//!
//! Implements `DaqBackend` with tokio-modbus: lights and indicators are
//! coils, buttons are discrete inputs. Every read and write is its own
//! transaction, so a button poll always sees the live board state.

use memgame_hal::config::AddressMapping;
use memgame_hal::traits::{DaqBackend, HalError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_modbus::client::{Context, Reader, Writer, rtu, tcp};
use tokio_modbus::slave::Slave;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};

/// Where the board is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModbusLink {
    Tcp(SocketAddr),
    Rtu { serial_port: String, baud_rate: u32 },
}

/// Board behind a Modbus slave.
///
/// The link is opened by `init_device`. The first failed transaction marks
/// it down for good; there is no reconnect.
pub struct ModbusBackend {
    link: ModbusLink,
    slave_id: u8,
    timeout: Duration,
    mapping: AddressMapping,
    rt: Runtime,
    ctx: Option<Context>,
    link_up: bool,
}

impl ModbusBackend {
    pub fn new(
        link: ModbusLink,
        slave_id: u8,
        timeout: Duration,
        mapping: AddressMapping,
    ) -> Result<Self, HalError> {
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HalError::CommError(e.to_string()))?;
        log::info!(
            "Modbus mapping: {} coils, {} DI",
            mapping.outputs.len(),
            mapping.inputs.len()
        );
        Ok(Self {
            link,
            slave_id,
            timeout,
            mapping,
            rt,
            ctx: None,
            link_up: false,
        })
    }

    fn connect_tcp(&self, addr: SocketAddr) -> Result<Context, HalError> {
        log::info!("Connecting to Modbus TCP slave at {addr} (unit {})", self.slave_id);
        let slave = Slave(self.slave_id);
        let timeout = self.timeout;
        self.rt
            .block_on(async move {
                tokio::time::timeout(timeout, tcp::connect_slave(addr, slave)).await
            })
            .map_err(|_| HalError::InitFailed(format!("connect to {addr} timed out")))?
            .map_err(|e| HalError::InitFailed(format!("connect to {addr}: {e}")))
    }

    fn connect_rtu(&self, serial_port: &str, baud_rate: u32) -> Result<Context, HalError> {
        log::info!(
            "Connecting to Modbus RTU slave at {serial_port} (baud {baud_rate}, unit {})",
            self.slave_id
        );
        let slave = Slave(self.slave_id);
        let serial_port = serial_port.to_string();
        self.rt.block_on(async move {
            let builder = tokio_serial::new(serial_port, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None);

            let port = builder
                .open_native_async()
                .map_err(|e| HalError::InitFailed(format!("open serial port: {e}")))?;

            Ok::<Context, HalError>(rtu::attach_slave(port, slave))
        })
    }

    fn read_input(&mut self, address: u16) -> Result<bool, HalError> {
        let ctx = self.ctx.as_mut().ok_or(HalError::NotConnected)?;
        let timeout = self.timeout;
        let bits = self
            .rt
            .block_on(async {
                tokio::time::timeout(timeout, ctx.read_discrete_inputs(address, 1)).await
            })
            .map_err(|_| HalError::Timeout)?
            .map_err(|e| HalError::CommError(format!("read_discrete_inputs: {e}")))?
            .map_err(|e| HalError::CommError(format!("Modbus exception: {e:?}")))?;
        Ok(bits.first().copied().unwrap_or(false))
    }

    fn write_coil(&mut self, address: u16, level: bool) -> Result<(), HalError> {
        let ctx = self.ctx.as_mut().ok_or(HalError::NotConnected)?;
        let timeout = self.timeout;
        self.rt
            .block_on(async {
                tokio::time::timeout(timeout, ctx.write_single_coil(address, level)).await
            })
            .map_err(|_| HalError::Timeout)?
            .map_err(|e| HalError::CommError(format!("write_single_coil: {e}")))?
            .map_err(|e| HalError::CommError(format!("Modbus exception: {e:?}")))?;
        Ok(())
    }

    fn drop_link(&mut self, error: &HalError) {
        if self.link_up {
            log::warn!("Modbus link lost: {error}");
        }
        self.link_up = false;
        self.ctx = None;
    }
}

impl DaqBackend for ModbusBackend {
    fn init_device(&mut self) -> Result<(), HalError> {
        let ctx = match self.link.clone() {
            ModbusLink::Tcp(addr) => self.connect_tcp(addr)?,
            ModbusLink::Rtu {
                serial_port,
                baud_rate,
            } => self.connect_rtu(&serial_port, baud_rate)?,
        };
        self.ctx = Some(ctx);
        self.link_up = true;
        Ok(())
    }

    fn device_connected(&mut self) -> bool {
        self.link_up
    }

    fn digital_read(&mut self, channel: usize) -> bool {
        if !self.link_up {
            return false;
        }
        let Some(address) = self.mapping.discrete_input(channel) else {
            log::warn!("no discrete input mapped for channel {channel}");
            return false;
        };
        match self.read_input(address) {
            Ok(pressed) => pressed,
            Err(e) => {
                self.drop_link(&e);
                false
            }
        }
    }

    fn digital_write(&mut self, channel: usize, level: bool) {
        if !self.link_up {
            return;
        }
        let Some(address) = self.mapping.coil(channel) else {
            log::warn!("no coil mapped for channel {channel}");
            return;
        };
        if let Err(e) = self.write_coil(address, level) {
            self.drop_link(&e);
        } else {
            log::debug!("coil {address} <- {level}");
        }
    }
}
