//! Wire packets.

use core::{fmt, ops::Deref};

use log::trace;

use crate::{
    checksum::{checksum, verify},
    decode::{Decode, DecodeError, DecodeErrorKind, DecodeWithLength},
    encode::Encode,
    function::{Parameter, Signedness, parameter_name},
    varint::{VarI28, VarU28},
};

/// Shortest packet: address, control, one data byte, checksum.
pub const MIN_PACKET_SIZE: usize = 4;

/// Longest packet: address, control, four data bytes, checksum.
pub const MAX_PACKET_SIZE: usize = 7;

/// Extracts the 2-bit length code from a control byte.
#[inline]
pub const fn length_code(control: u8) -> u8 {
    (control >> 5) & 0x03
}

/// Total packet length declared by a control byte.
#[inline]
pub const fn declared_len(control: u8) -> usize {
    MIN_PACKET_SIZE + length_code(control) as usize
}

/// A single DMM protocol packet.
///
/// # Encoding
///
/// | Byte      | Bit 7 | Bits 5–6             | Bits 0–4        |
/// |-----------|-------|----------------------|-----------------|
/// | address   | 0     | axis id (bits 0–6)   |                 |
/// | control   | 1     | `length - 4`         | function code   |
/// | data × n  | 1     | 7-bit group of the value, most significant first |
/// | checksum  | 1     | low 7 bits of the sum of all previous bytes      |
///
/// The address byte is the only byte with bit 7 clear, which is how a receiver
/// finds the start of a packet. Values are sent as a [`VarI28`]; on decode they are
/// read back as a [`VarI28`] or a [`VarU28`] depending on
/// [`Signedness::for_function`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    /// 7-bit drive address.
    pub axis: u8,
    /// 5-bit function code.
    pub function: u8,
    /// Data value. Always sent signed; on receipt it is read back signed or
    /// unsigned depending on [`Signedness::for_function`] of `function`.
    pub value: i32,
}

impl Packet {
    pub const fn new(axis: u8, function: u8, value: i32) -> Self {
        Self {
            axis,
            function,
            value,
        }
    }

    /// The telemetry parameter this packet reports, if its function code is one.
    pub fn parameter(&self) -> Option<Parameter> {
        Parameter::from_code(self.function)
    }

    /// Whether this packet is the drive's absolute position report.
    pub fn is_position_report(&self) -> bool {
        self.function == Parameter::AbsolutePosition.code()
    }

    /// The value as it goes on the wire: the low 28 bits, sign extended.
    pub const fn argument(&self) -> VarI28 {
        VarI28::truncating(self.value)
    }

    /// Encodes this packet into a stack buffer.
    pub fn to_bytes(&self) -> PacketBytes {
        let mut bytes = PacketBytes {
            buf: [0; MAX_PACKET_SIZE],
            len: self.size(),
        };
        self.encode(&mut bytes.buf);
        bytes
    }

    /// Decodes a packet that spans all of `data`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`Decode::decode`], returns
    /// [`DecodeErrorKind::InvalidLength`] when `data` is longer than the length its
    /// control byte declares.
    pub fn decode_exact(data: &[u8]) -> Result<Self, DecodeError> {
        let mut rest = data;
        let packet = Self::decode(&mut rest)?;

        if !rest.is_empty() {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::InvalidLength {
                declared: data.len() - rest.len(),
                actual: data.len(),
            }));
        }

        Ok(packet)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Axis: {}, {} ({:#04x}): Value: {}",
            self.axis,
            parameter_name(self.function),
            self.function,
            self.value
        )
    }
}

impl Encode for Packet {
    fn size(&self) -> usize {
        MIN_PACKET_SIZE - 1 + self.argument().groups()
    }

    fn encode(&self, data: &mut [u8]) {
        let len = self.size();

        data[0] = self.axis & 0x7f;
        data[1] = 0x80 | (((len - MIN_PACKET_SIZE) as u8) << 5) | (self.function & 0x1f);
        self.argument().encode(&mut data[2..]);
        data[len - 1] = checksum(&data[..len - 1]);

        trace!("encoded packet: {:02x?}", &data[..len]);
    }
}

impl Decode for Packet {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = *data;

        let control = bytes
            .get(1)
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;
        let len = declared_len(*control);
        let packet = bytes
            .get(..len)
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;

        for (index, &value) in packet.iter().enumerate() {
            if (value & 0x80 == 0) != (index == 0) {
                return Err(DecodeError::new::<Self>(DecodeErrorKind::FramingBit {
                    index,
                    value,
                }));
            }
        }

        verify::<Self>(packet)?;

        let axis = packet[0] & 0x7f;
        let function = packet[1] & 0x1f;

        let mut groups = &packet[2..len - 1];
        let value = match Signedness::for_function(function) {
            Signedness::Signed => VarI28::decode_with_len(&mut groups, len - 3)?.into_inner(),
            Signedness::Unsigned => {
                VarU28::decode_with_len(&mut groups, len - 3)?.into_inner() as i32
            }
        };

        *data = &bytes[len..];

        Ok(Self {
            axis,
            function,
            value,
        })
    }
}

/// An encoded [`Packet`] held on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketBytes {
    buf: [u8; MAX_PACKET_SIZE],
    len: usize,
}

impl Deref for PacketBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}
