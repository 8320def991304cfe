//! Incremental packet assembly from a raw byte stream.

use log::{debug, trace};

use crate::packet::declared_len;

/// Size of the accumulation buffer.
pub const BUFFER_CAPACITY: usize = 8;

/// Reassembles packets from a byte stream, one byte at a time.
///
/// Packets have no start or stop tokens. A byte with bit 7 clear can only be the
/// address byte of a new packet, so receiving one always starts over and silently
/// abandons whatever was accumulated before it. The control byte then declares the
/// total length, and the packet is complete once that many bytes have arrived.
///
/// After a packet completes, the assembler does not reset itself: any further bytes
/// with bit 7 set are accumulated (and dropped once the buffer is full) without
/// producing another packet, until the next address byte arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAssembler {
    buffer: [u8; BUFFER_CAPACITY],
    count: usize,
    declared: usize,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_CAPACITY],
            count: 0,
            declared: 0,
        }
    }

    /// Number of bytes accumulated for the current packet.
    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length declared by the current packet's control byte, or 0 if it has not
    /// arrived yet.
    pub const fn declared_len(&self) -> usize {
        self.declared
    }

    /// Discards any partially accumulated packet.
    pub fn reset(&mut self) {
        self.count = 0;
        self.declared = 0;
    }

    /// Consumes one byte from the wire.
    ///
    /// Returns the raw packet when this byte completes it.
    pub fn feed(&mut self, byte: u8) -> Option<&[u8]> {
        let is_address = byte & 0x80 == 0;

        if is_address {
            if self.count > 0 && self.count != self.declared {
                debug!(
                    "Resynchronizing, abandoning {} byte partial packet: {:02x?}",
                    self.count,
                    &self.buffer[..self.count]
                );
            }
            self.reset();
        } else if self.count == 0 || self.count >= BUFFER_CAPACITY {
            debug!("Dropping byte {byte:#04x} outside of a packet");
            return None;
        }

        self.buffer[self.count] = byte;
        self.count += 1;

        if self.count == 2 {
            self.declared = declared_len(byte);
        }

        if self.count == self.declared {
            trace!("assembled packet: {:02x?}", &self.buffer[..self.count]);
            return Some(&self.buffer[..self.count]);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::{Packet, function::cmds};

    fn feed_all(assembler: &mut FrameAssembler, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes
            .iter()
            .filter_map(|&byte| assembler.feed(byte).map(<[u8]>::to_vec))
            .collect()
    }

    #[test]
    fn single_packet() {
        let mut assembler = FrameAssembler::new();
        let packets = feed_all(&mut assembler, &[0x00, 0x81, 0x80, 0x81]);

        assert_eq!(packets, vec![vec![0x00, 0x81, 0x80, 0x81]]);
    }

    #[test]
    fn declared_length_from_control_byte() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(0x01), None);
        assert_eq!(assembler.declared_len(), 0);
        assert_eq!(assembler.feed(0x80 | (2 << 5) | 0x1b), None);
        assert_eq!(assembler.declared_len(), 6);
    }

    #[test]
    fn leading_high_bytes_are_dropped() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(0x81), None);
        assert_eq!(assembler.feed(0xff), None);
        assert!(assembler.is_empty());

        let packets = feed_all(&mut assembler, &[0x00, 0x81, 0x80, 0x81]);
        assert_eq!(packets.len(), 1);
    }

    #[test]
    fn truncated_packet_is_abandoned() {
        let mut assembler = FrameAssembler::new();
        let long = Packet::new(2, cmds::GO_ABSOLUTE_POS, 1 << 20).to_bytes();
        let short = Packet::new(3, cmds::GO_ABSOLUTE_POS, 7).to_bytes();

        let mut stream = long[..4].to_vec();
        stream.extend_from_slice(&short);

        assert_eq!(feed_all(&mut assembler, &stream), vec![short.to_vec()]);
    }

    #[test]
    fn consecutive_address_bytes() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(0x05), None);
        assert_eq!(assembler.feed(0x06), None);
        assert_eq!(assembler.len(), 1);

        let packets = feed_all(&mut assembler, &[0x81, 0x80, 0x87]);
        assert_eq!(packets, vec![vec![0x06, 0x81, 0x80, 0x87]]);
    }

    #[test]
    fn no_reset_after_completion() {
        let mut assembler = FrameAssembler::new();
        let mut stream = vec![0x00, 0x81, 0x80, 0x81];
        // Trailing noise after a complete packet never completes anything.
        stream.extend_from_slice(&[0x80; 10]);

        assert_eq!(feed_all(&mut assembler, &stream).len(), 1);
        assert_eq!(assembler.len(), BUFFER_CAPACITY);

        // The next address byte starts over.
        assert_eq!(feed_all(&mut assembler, &[0x00, 0x81, 0x80, 0x81]).len(), 1);
    }

    #[test]
    fn overrun_is_capped() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed(0x00), None);
        // Length code 3 declares a 7 byte packet.
        assert_eq!(assembler.feed(0xE0), None);
        assert_eq!(assembler.declared_len(), 7);

        let completed: Vec<usize> = (2..7)
            .filter(|_| assembler.feed(0x80).is_some())
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(assembler.len(), 7);

        for _ in 0..32 {
            assert_eq!(assembler.feed(0x80), None);
        }
        assert_eq!(assembler.len(), BUFFER_CAPACITY);
    }

    #[quickcheck]
    fn resynchronizes_after_noise(noise: Vec<u8>, value: i32) -> TestResult {
        let packet = Packet::new(9, cmds::TURN_CONST_SPEED, value);
        let bytes = packet.to_bytes();

        let mut assembler = FrameAssembler::new();
        for byte in noise {
            assembler.feed(byte);
        }

        let packets = feed_all(&mut assembler, &bytes);
        match packets.as_slice() {
            [only] if only.as_slice() == &*bytes => TestResult::passed(),
            other => TestResult::error(format!("{:02X?} -> {other:02X?}", &*bytes)),
        }
    }
}
