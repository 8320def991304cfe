//! Blocking access to a drive for hosts that poll a [`Session`] from their own loop.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use log::{debug, error};
use serialport::{DataBits, Parity, SerialPort, StopBits};

use dmm_protocol::{ByteSink, ReportHandler, Session, BAUD_RATE};

use crate::serial::SerialError;

/// A serial port opened in blocking mode.
///
/// Writes through [`ByteSink`] cannot fail, so the first write error is kept and
/// can be picked up with [`BlockingPort::take_error`].
pub struct BlockingPort {
    port: Box<dyn SerialPort>,
    write_error: Option<io::Error>,
}

impl BlockingPort {
    pub fn open(port_name: &str, timeout: Duration) -> Result<Self, SerialError> {
        let port = serialport::new(port_name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open()?;

        debug!("Opened {port_name} at {BAUD_RATE} baud (blocking)");

        Ok(Self {
            port,
            write_error: None,
        })
    }

    /// Returns the first write error since the last call, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.write_error.take()
    }

    /// Reads every byte the port currently has buffered and returns how many were
    /// read.
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, SerialError> {
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(0);
        }

        let start = buf.len();
        buf.resize(start + available, 0);
        let read = self.port.read(&mut buf[start..])?;
        buf.truncate(start + read);

        Ok(read)
    }
}

impl ByteSink for BlockingPort {
    fn write(&mut self, byte: u8) {
        if self.write_error.is_some() {
            return;
        }

        if let Err(e) = self.port.write_all(&[byte]) {
            error!("Failed to write to serial port: {e}");
            self.write_error = Some(e);
        }
    }
}

/// Delivers every byte currently waiting on the port to `session`, in arrival
/// order. Returns the number of bytes delivered.
pub fn pump<H: ReportHandler>(session: &mut Session<BlockingPort, H>) -> Result<usize, SerialError> {
    let mut received = Vec::new();
    let read = session.sink_mut().read_available(&mut received)?;

    session.feed_all(&received);

    Ok(read)
}
