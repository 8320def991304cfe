/// A type that can be encoded into a sequence of wire bytes.
pub trait Encode {
    /// Returns the number of bytes this value will take when encoded.
    fn size(&self) -> usize;

    /// Encodes this instance into the provided byte slice.
    ///
    /// # Panics
    ///
    /// Implementations may panic if `data` is shorter than [`Encode::size`].
    fn encode(&self, data: &mut [u8]);
}
