use crate::{DecodeError, DecodeErrorKind};

/// Computes the checksum byte for the given packet bytes (everything before the checksum).
///
/// The checksum is the additive sum of every byte modulo 256, truncated to its low
/// 7 bits and with bit 7 forced high so that it can never be mistaken for an address
/// byte.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte));
    (sum & 0x7f) | 0x80
}

/// Verifies the trailing checksum byte of a complete packet.
///
/// Only the low 7 bits of the checksum byte take part in the comparison.
pub(crate) fn verify<T>(packet: &[u8]) -> Result<(), DecodeError> {
    let (&found, body) = packet
        .split_last()
        .ok_or_else(|| DecodeError::new::<T>(DecodeErrorKind::UnexpectedEnd))?;
    let expected = checksum(body);

    if (found ^ expected) & 0x7f != 0 {
        return Err(DecodeError::new::<T>(DecodeErrorKind::Checksum {
            value: found,
            expected,
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_to_zero() {
        // 0x00 + 0x81 + 0x80 = 0x101
        assert_eq!(checksum(&[0x00, 0x81, 0x80]), 0x81);
    }

    #[test]
    fn high_bit_ignored() {
        assert!(verify::<()>(&[0x00, 0x81, 0x80, 0x81]).is_ok());
        assert!(verify::<()>(&[0x00, 0x81, 0x80, 0x01]).is_ok());
    }

    #[test]
    fn mismatch() {
        let err = verify::<()>(&[0x00, 0x81, 0x80, 0x82]).unwrap_err();
        assert_eq!(
            err.kind(),
            DecodeErrorKind::Checksum {
                value: 0x82,
                expected: 0x81
            }
        );
    }
}
