use core::fmt;

use crate::decode::{Decode, DecodeError, DecodeErrorKind, DecodeWithLength};
use crate::encode::Encode;

/// Maximum number of 7-bit data groups a packet can carry.
pub const MAX_GROUPS: usize = 4;

/// Reads `len` data groups and folds them together, most significant group first.
///
/// `first` maps the low 7 bits of the first group to the initial accumulator,
/// which is where signed and unsigned reconstruction differ.
fn fold_groups<T>(
    data: &mut &[u8],
    len: usize,
    first: impl FnOnce(u8) -> i32,
) -> Result<i32, DecodeError> {
    if !(1..=MAX_GROUPS).contains(&len) {
        return Err(DecodeError::new::<T>(DecodeErrorKind::GroupCount { count: len }));
    }

    let mut value = first(u8::decode(data)? & 0x7f);
    for _ in 1..len {
        value = (value << 7) | i32::from(u8::decode(data)? & 0x7f);
    }

    Ok(value)
}

/// Writes the lowest `groups` 7-bit groups of `value` as data bytes, most
/// significant group first, each with bit 7 set.
fn write_groups(value: i32, groups: usize, data: &mut [u8]) {
    for (i, byte) in data[..groups].iter_mut().enumerate() {
        let shift = 7 * (groups - 1 - i);
        *byte = 0x80 | ((value >> shift) & 0x7f) as u8;
    }
}

/// A variable-width encoded signed 28-bit integer.
///
/// The value is carried in one to four 7-bit groups, most significant first. Bit 6
/// of the first group is the sign bit and is extended across the upper bits when
/// decoding. Every data byte on the wire has bit 7 set.
///
/// Encoding always picks the fewest groups whose sign extension reproduces the value:
///
/// | Groups | Range                     |
/// |--------|---------------------------|
/// | 1      | `-2^6 ..= 2^6 - 1`        |
/// | 2      | `-2^13 ..= 2^13 - 1`      |
/// | 3      | `-2^20 ..= 2^20 - 1`      |
/// | 4      | `-2^27 ..= 2^27 - 1`      |
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarI28 {
    inner: i32,
}

impl VarI28 {
    pub const MIN: i32 = -(1 << 27);
    pub const MAX: i32 = (1 << 27) - 1;

    /// Creates a new [`VarI28`].
    ///
    /// # Panics
    ///
    /// Panics if the value is outside of `-2^27 ..= 2^27 - 1`.
    pub fn new(value: i32) -> Self {
        Self::try_new(value).expect("Value out of range for variable-length i28")
    }

    /// Tries to create a new [`VarI28`].
    ///
    /// # Errors
    ///
    /// Returns a [`VarI28SizeError`] if the value is outside of `-2^27 ..= 2^27 - 1`.
    pub const fn try_new(value: i32) -> Result<Self, VarI28SizeError> {
        if value < Self::MIN || value > Self::MAX {
            Err(VarI28SizeError { value })
        } else {
            Ok(Self { inner: value })
        }
    }

    /// Creates a new [`VarI28`] from the low 28 bits of `value`, reinterpreted as a
    /// two's complement 28-bit integer.
    ///
    /// This is what the drive sees for any argument wider than 28 bits.
    pub const fn truncating(value: i32) -> Self {
        Self {
            inner: (value << 4) >> 4,
        }
    }

    /// Returns the inner raw `i32` value.
    pub const fn into_inner(self) -> i32 {
        self.inner
    }

    /// Number of 7-bit groups needed to carry this value.
    pub const fn groups(&self) -> usize {
        let mut groups = 1;
        while groups < MAX_GROUPS {
            let rest = self.inner >> (7 * groups - 1);
            if rest == 0 || rest == -1 {
                break;
            }
            groups += 1;
        }
        groups
    }
}

impl From<VarI28> for i32 {
    fn from(value: VarI28) -> Self {
        value.inner
    }
}

impl TryFrom<i32> for VarI28 {
    type Error = VarI28SizeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl Encode for VarI28 {
    fn size(&self) -> usize {
        self.groups()
    }

    fn encode(&self, data: &mut [u8]) {
        write_groups(self.inner, self.groups(), data);
    }
}

impl DecodeWithLength for VarI28 {
    fn decode_with_len(data: &mut &[u8], len: usize) -> Result<Self, DecodeError> {
        let inner = fold_groups::<Self>(data, len, |first| {
            let first = i32::from(first);
            if first & 0x40 != 0 { first - 0x80 } else { first }
        })?;

        Ok(Self { inner })
    }
}

/// A variable-width encoded unsigned 28-bit integer.
///
/// Same group layout as [`VarI28`], except that bit 6 of the first group is an
/// ordinary data bit. The drive uses this form for gains, speed and acceleration
/// limits and other quantities that are never negative.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarU28 {
    inner: u32,
}

impl VarU28 {
    pub const MAX: u32 = (1 << 28) - 1;

    /// Creates a new [`VarU28`].
    ///
    /// # Panics
    ///
    /// Panics if the value is greater than `2^28 - 1`.
    pub fn new(value: u32) -> Self {
        Self::try_new(value).expect("Value too large for variable-length u28")
    }

    /// Tries to create a new [`VarU28`].
    ///
    /// # Errors
    ///
    /// Returns a [`VarU28SizeError`] if the value is greater than `2^28 - 1`.
    pub const fn try_new(value: u32) -> Result<Self, VarU28SizeError> {
        if value > Self::MAX {
            Err(VarU28SizeError { value })
        } else {
            Ok(Self { inner: value })
        }
    }

    /// Returns the inner raw `u32` value.
    pub const fn into_inner(self) -> u32 {
        self.inner
    }

    /// Number of 7-bit groups needed to carry this value.
    pub const fn groups(&self) -> usize {
        let mut groups = 1;
        while groups < MAX_GROUPS && self.inner >> (7 * groups) != 0 {
            groups += 1;
        }
        groups
    }
}

impl From<VarU28> for u32 {
    fn from(value: VarU28) -> Self {
        value.inner
    }
}

impl TryFrom<u32> for VarU28 {
    type Error = VarU28SizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl Encode for VarU28 {
    fn size(&self) -> usize {
        self.groups()
    }

    fn encode(&self, data: &mut [u8]) {
        write_groups(self.inner as i32, self.groups(), data);
    }
}

impl DecodeWithLength for VarU28 {
    fn decode_with_len(data: &mut &[u8], len: usize) -> Result<Self, DecodeError> {
        let inner = fold_groups::<Self>(data, len, i32::from)?;

        // At most 28 bits were folded in, so this is never negative.
        Ok(Self {
            inner: inner as u32,
        })
    }
}

/// Returned when a [`VarI28`] cannot fit the specified value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VarI28SizeError {
    pub value: i32,
}

impl fmt::Display for VarI28SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value {} cannot fit in a variable-length i28", self.value)
    }
}

impl core::error::Error for VarI28SizeError {}

/// Returned when a [`VarU28`] cannot fit the specified value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VarU28SizeError {
    pub value: u32,
}

impl fmt::Display for VarU28SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value {} cannot fit in a variable-length u28", self.value)
    }
}

impl core::error::Error for VarU28SizeError {}

#[cfg(test)]
mod tests {
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use super::*;

    fn encoded<E: Encode>(value: E) -> Vec<u8> {
        let mut buf = vec![0; value.size()];
        value.encode(&mut buf);
        buf
    }

    #[test]
    fn thin() {
        const EXPECTED_ENCODING: [u8; 1] = [0x85];

        assert_eq!(EXPECTED_ENCODING.to_vec(), encoded(VarI28::new(5)));
        assert_eq!(
            5,
            VarI28::decode_with_len(&mut EXPECTED_ENCODING.as_slice(), 1)
                .unwrap()
                .into_inner()
        );
    }

    #[test]
    fn negative_one() {
        // All ones in a single group, sign bit set.
        const EXPECTED_ENCODING: [u8; 1] = [0xFF];

        assert_eq!(EXPECTED_ENCODING.to_vec(), encoded(VarI28::new(-1)));
        assert_eq!(
            -1,
            VarI28::decode_with_len(&mut EXPECTED_ENCODING.as_slice(), 1)
                .unwrap()
                .into_inner()
        );
    }

    #[test]
    fn group_boundaries() {
        assert_eq!(VarI28::new(63).groups(), 1);
        assert_eq!(VarI28::new(64).groups(), 2);
        assert_eq!(VarI28::new(-64).groups(), 1);
        assert_eq!(VarI28::new(-65).groups(), 2);
        assert_eq!(VarI28::new((1 << 13) - 1).groups(), 2);
        assert_eq!(VarI28::new(1 << 13).groups(), 3);
        assert_eq!(VarI28::new(1 << 20).groups(), 4);
        assert_eq!(VarI28::new(VarI28::MAX).groups(), 4);
        assert_eq!(VarI28::new(VarI28::MIN).groups(), 4);
    }

    #[test]
    fn wide() {
        // 2^20 needs the fourth group to keep bit 6 of the first one clear.
        const EXPECTED_ENCODING: [u8; 4] = [0x80, 0xC0, 0x80, 0x80];

        assert_eq!(EXPECTED_ENCODING.to_vec(), encoded(VarI28::new(1 << 20)));
        assert_eq!(
            1 << 20,
            VarI28::decode_with_len(&mut EXPECTED_ENCODING.as_slice(), 4)
                .unwrap()
                .into_inner()
        );
    }

    #[test]
    fn unsigned_ignores_sign_bit() {
        // Bit 6 of the first group set: -28 when signed, 100 when unsigned.
        let data = [0xE4];

        assert_eq!(
            -28,
            VarI28::decode_with_len(&mut data.as_slice(), 1)
                .unwrap()
                .into_inner()
        );
        assert_eq!(
            100,
            VarU28::decode_with_len(&mut data.as_slice(), 1)
                .unwrap()
                .into_inner()
        );
        assert_eq!(data.to_vec(), encoded(VarU28::new(100)));
    }

    #[test]
    fn truncating() {
        assert_eq!(VarI28::truncating(1 << 28).into_inner(), 0);
        assert_eq!(VarI28::truncating((1 << 28) + 5).into_inner(), 5);
        assert_eq!(VarI28::truncating(1 << 27).into_inner(), VarI28::MIN);
        assert_eq!(VarI28::truncating(-1).into_inner(), -1);
    }

    #[test]
    fn out_of_range() {
        assert_eq!(
            VarI28::try_new(1 << 27),
            Err(VarI28SizeError { value: 1 << 27 })
        );
        assert!(VarU28::try_new(1 << 28).is_err());
    }

    #[test]
    fn bad_group_count() {
        let data = [0x80; 5];
        let err = VarI28::decode_with_len(&mut data.as_slice(), 5).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::GroupCount { count: 5 });

        let err = VarU28::decode_with_len(&mut data.as_slice(), 0).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::GroupCount { count: 0 });
    }

    #[test]
    fn short_input() {
        let err = VarI28::decode_with_len(&mut [0x80, 0x80].as_slice(), 3).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEnd);
    }

    #[quickcheck]
    fn signed_roundtrip(value: i32) -> TestResult {
        let Ok(var) = VarI28::try_new(value) else {
            return TestResult::discard();
        };
        let bytes = encoded(var);
        if bytes.iter().any(|byte| byte & 0x80 == 0) {
            return TestResult::error(format!("{value} -> {bytes:02X?} has a clear framing bit"));
        }
        match VarI28::decode_with_len(&mut bytes.as_slice(), bytes.len()) {
            Ok(roundtrip) if roundtrip == var => TestResult::passed(),
            other => TestResult::error(format!("{value} -> {bytes:02X?} -> {other:?}")),
        }
    }

    #[quickcheck]
    fn signed_is_minimal(value: i32) -> TestResult {
        let Ok(var) = VarI28::try_new(value) else {
            return TestResult::discard();
        };
        let groups = var.groups();
        if groups == 1 {
            return TestResult::passed();
        }
        // One group fewer must not be able to reproduce the value.
        let bytes = encoded(var);
        match VarI28::decode_with_len(&mut &bytes[1..], groups - 1) {
            Ok(shorter) if shorter == var => {
                TestResult::error(format!("{value} fits in {} groups", groups - 1))
            }
            _ => TestResult::passed(),
        }
    }

    #[quickcheck]
    fn unsigned_roundtrip(value: u32) -> TestResult {
        let Ok(var) = VarU28::try_new(value) else {
            return TestResult::discard();
        };
        let bytes = encoded(var);
        match VarU28::decode_with_len(&mut bytes.as_slice(), bytes.len()) {
            Ok(roundtrip) if roundtrip == var => TestResult::passed(),
            other => TestResult::error(format!("{value} -> {bytes:02X?} -> {other:?}")),
        }
    }
}
