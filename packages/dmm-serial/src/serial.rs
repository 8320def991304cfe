//! Implements discovering, opening, and talking to DMM drives behind a USB serial
//! adapter.

use std::time::Duration;

use log::{debug, trace, warn};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    select,
    time::sleep,
};
use tokio_serial::{DataBits, Parity, SerialPortInfo, SerialPortType, SerialStream, StopBits};

use dmm_protocol::{DecodeError, Encode, FrameAssembler, Packet, BAUD_RATE};

use crate::{take_matching, Connection, RawPacket};

/// Finds all USB serial ports a drive could be attached to.
///
/// DMM drives only expose a bare RS232 port, so there is no vendor id to filter on.
/// Every USB adapter is a candidate.
pub fn find_ports() -> Result<Vec<SerialPortInfo>, SerialError> {
    let ports = tokio_serial::available_ports()?;

    let ports: Vec<_> = ports
        .into_iter()
        .filter(|port| {
            if cfg!(target_os = "macos") && port.port_name.starts_with("/dev/tty.") {
                // https://pbxbook.com/other/mac-tty.html
                debug!(
                    "Ignoring port named {:?} because it is a call-in device",
                    port.port_name
                );
                return false;
            }

            matches!(port.port_type, SerialPortType::UsbPort(_))
        })
        .collect();

    debug!("Found {} candidate serial ports", ports.len());
    Ok(ports)
}

/// An open serial link to one or more drives sharing a bus.
#[derive(Debug)]
pub struct SerialConnection {
    port_name: String,
    stream: SerialStream,
    assembler: FrameAssembler,
    incoming_packets: Vec<RawPacket>,
}

impl SerialConnection {
    /// Opens `port_name` at the drive's line settings.
    pub fn open(port_name: &str, timeout: Duration) -> Result<Self, SerialError> {
        let stream = SerialStream::open(
            &tokio_serial::new(port_name, BAUD_RATE)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .timeout(timeout),
        )?;

        debug!("Opened {port_name} at {BAUD_RATE} baud");

        Ok(Self {
            port_name: port_name.to_string(),
            stream,
            assembler: FrameAssembler::new(),
            incoming_packets: Vec::new(),
        })
    }

    /// Opens the first port returned by [`find_ports`].
    pub fn open_first(timeout: Duration) -> Result<Self, SerialError> {
        let port = find_ports()?
            .into_iter()
            .next()
            .ok_or(SerialError::NoPorts)?;

        Self::open(&port.port_name, timeout)
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Reads bytes until one packet is assembled, and adds it to the queue of
    /// incoming packets.
    async fn receive_one_packet(&mut self) -> Result<(), SerialError> {
        loop {
            let byte = self.stream.read_u8().await?;

            let Some(raw) = self.assembler.feed(byte) else {
                continue;
            };

            trace!("received packet: {:02x?}", raw);

            let packet = Packet::decode_exact(raw).inspect_err(|e| {
                warn!("Dropping corrupted packet: {e}");
            })?;

            self.incoming_packets.push(RawPacket::new(packet));
            return Ok(());
        }
    }
}

impl Connection for SerialConnection {
    type Error = SerialError;

    async fn send(&mut self, packet: impl Encode) -> Result<(), SerialError> {
        let mut encoded = vec![0; packet.size()];
        packet.encode(&mut encoded);

        trace!("sent packet: {:02x?}", encoded);

        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;

        Ok(())
    }

    async fn recv(
        &mut self,
        axis: u8,
        function: u8,
        timeout: Duration,
    ) -> Result<Packet, SerialError> {
        select! {
            result = async {
                loop {
                    if let Some(packet) = take_matching(&mut self.incoming_packets, axis, function) {
                        return Ok(packet);
                    }

                    self.receive_one_packet().await?;
                }
            } => result,
            _ = sleep(timeout) => Err(SerialError::Timeout)
        }
    }
}

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Packet decoding error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Packet timeout")]
    Timeout,

    #[error("Serialport Error")]
    SerialportError(#[from] tokio_serial::Error),

    #[error("No serial ports found")]
    NoPorts,
}
