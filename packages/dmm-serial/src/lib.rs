//! Crate for talking to DMM integrated servo drives over an RS232 link.
//!
//! The wire format lives in [`protocol`]; this crate adds the transports and a few
//! request/reply commands built on top of it.

pub use dmm_protocol as protocol;

use std::{
    future::Future,
    time::{Duration, Instant},
};

use log::{error, trace, warn};

use dmm_protocol::{DecodeError, Encode, Packet};

pub mod commands;

use crate::commands::Command;

#[cfg(feature = "serial")]
pub mod blocking;
#[cfg(feature = "serial")]
pub mod serial;

/// How long a received packet stays queued before it is discarded.
pub(crate) const PACKET_LIFETIME: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawPacket {
    pub packet: Packet,
    pub used: bool,
    pub timestamp: Instant,
}
impl RawPacket {
    pub fn new(packet: Packet) -> Self {
        Self {
            packet,
            used: false,
            timestamp: Instant::now(),
        }
    }

    pub fn is_obsolete(&self, timeout: Duration) -> bool {
        self.timestamp.elapsed() > timeout || self.used
    }

    pub fn matches(&self, axis: u8, function: u8) -> bool {
        self.packet.axis == axis & 0x7f && self.packet.function == function & 0x1f
    }

    /// Marks the packet as used and returns it.
    pub fn take(&mut self) -> Packet {
        self.used = true;
        self.packet
    }
}

/// Removes old and used packets from the incoming packets buffer.
pub(crate) fn trim_packets(packets: &mut Vec<RawPacket>) {
    trace!("Trimming packets. Length before: {}", packets.len());

    packets.retain(|packet| !packet.is_obsolete(PACKET_LIFETIME));

    trace!("Trimmed packets. Length after: {}", packets.len());
}

/// Takes the first unused packet from `axis` with the given function code.
pub(crate) fn take_matching(
    packets: &mut Vec<RawPacket>,
    axis: u8,
    function: u8,
) -> Option<Packet> {
    let found = packets
        .iter_mut()
        .find(|packet| !packet.used && packet.matches(axis, function))
        .map(RawPacket::take);

    trim_packets(packets);
    found
}

/// Represents an open link to one or more drives.
#[allow(async_fn_in_trait)]
pub trait Connection {
    type Error: std::error::Error + From<DecodeError>;

    /// Sends a packet.
    fn send(&mut self, packet: impl Encode) -> impl Future<Output = Result<(), Self::Error>>;

    /// Receives the next packet from `axis` with the given function code.
    fn recv(
        &mut self,
        axis: u8,
        function: u8,
        timeout: Duration,
    ) -> impl Future<Output = Result<Packet, Self::Error>>;

    /// Executes a [`Command`].
    fn execute_command<C: Command>(
        &mut self,
        command: C,
    ) -> impl Future<Output = Result<C::Output, Self::Error>> {
        command.execute(self)
    }

    /// Sends a drive command to `axis` without waiting for a reply.
    async fn command(
        &mut self,
        axis: u8,
        command: protocol::Command,
    ) -> Result<(), Self::Error> {
        self.send(command.to_packet(axis)).await
    }

    /// Sends a packet and waits for the reply with function code `reply`.
    ///
    /// The exchange is retried `retries` times before giving up with the error of
    /// the last attempt.
    async fn handshake(
        &mut self,
        packet: Packet,
        reply: u8,
        timeout: Duration,
        retries: usize,
    ) -> Result<Packet, Self::Error> {
        let mut attempt = 0;

        loop {
            self.send(packet).await?;
            match self.recv(packet.axis, reply, timeout).await {
                Ok(decoded) => return Ok(decoded),
                Err(e) if attempt < retries => {
                    warn!(
                        "Handshake failed while waiting for {reply:#04x} from axis {}: {e}. Retrying...",
                        packet.axis
                    );
                    attempt += 1;
                }
                Err(e) => {
                    error!("Handshake failed after {retries} retries with error: {e}");
                    return Err(e);
                }
            }
        }
    }
}
