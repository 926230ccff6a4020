/// The single reusable buffer every flash transaction goes through.
///
/// Holds the transport's command framing followed by at most
/// `N - FRAME_OVERHEAD` payload bytes.
pub struct TransferBuffer<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for TransferBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransferBuffer<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Total size in bytes, framing included.
    #[must_use]
    pub const fn size(&self) -> usize {
        N
    }

    pub(crate) fn frame(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
