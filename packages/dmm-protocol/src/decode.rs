use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    type_name: &'static str,
}

impl DecodeError {
    pub fn new<T>(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            type_name: core::any::type_name::<T>(),
        }
    }

    pub const fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Returns `true` if the packet was complete but its checksum byte did not match.
    pub const fn is_checksum(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::Checksum { .. })
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Failed to decode {}: {}", self.type_name, self.kind)
    }
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("Packet was too short.")]
    UnexpectedEnd,

    #[error("Packet length mismatch. Control byte declares {declared} bytes, found {actual}.")]
    InvalidLength { declared: usize, actual: usize },

    #[error("Byte {index} has an invalid framing bit ({value:#04x}).")]
    FramingBit { index: usize, value: u8 },

    #[error("Variable-length integer must span 1 to 4 groups, found {count}.")]
    GroupCount { count: usize },

    #[error("Checksum mismatch. Found {value:#04x}, expected {expected:#04x}.")]
    Checksum { value: u8, expected: u8 },
}

/// A type that can be reconstructed (decoded) from a raw sequence of bytes.
///
/// The input slice will be advanced by the number of bytes successfully consumed
/// during decoding.
pub trait Decode {
    /// Attempts to decode `Self` from the beginning of the provided byte slice.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the input is malformed or insufficient
    /// to decode a complete value of this type.
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

/// A type that can be decoded from a sequence of bytes, given the number of
/// items it spans.
///
/// Used for fields whose length is declared somewhere else in the packet, such as
/// the data groups of a variable-length integer whose count comes from the
/// control byte.
pub trait DecodeWithLength {
    /// Attempts to decode `Self` from the provided byte slice, consuming exactly
    /// `len` items.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the input is malformed or insufficient
    /// to decode a complete value of this type.
    fn decode_with_len(data: &mut &[u8], len: usize) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

impl Decode for u8 {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let (&first, rest) = data
            .split_first()
            .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;
        *data = rest;
        Ok(first)
    }
}
