//! Addressed reads from serial flash.
//!
//! [`FlashRead`] is the only thing the loader needs from a flash device: copy
//! `len` bytes starting at a flash address into a caller-owned frame buffer.
//! [`SpiFlash`] implements it for SPI NOR flash behind any
//! [`embedded_hal::spi::SpiDevice`].

#![cfg_attr(not(test), no_std)]

use embedded_hal::spi::SpiDevice;

/// A flash device that can serve addressed reads.
pub trait FlashRead {
    /// The error type that can be returned by the read operation.
    type Error;

    /// Number of bytes in front of the payload that [`Self::read`] uses for
    /// command framing.
    const FRAME_OVERHEAD: usize;

    /// Reads `len` bytes of flash starting at `address`.
    ///
    /// `frame` must be at least `FRAME_OVERHEAD + len` bytes long. On success
    /// the returned slice is exactly `len` bytes long and lies inside `frame`.
    /// On failure the contents of `frame` are unspecified.
    fn read<'f>(
        &mut self,
        address: u32,
        frame: &'f mut [u8],
        len: usize,
    ) -> Result<&'f [u8], Self::Error>;
}

impl<T> FlashRead for &mut T
where
    T: FlashRead + ?Sized,
{
    type Error = T::Error;

    const FRAME_OVERHEAD: usize = T::FRAME_OVERHEAD;

    fn read<'f>(
        &mut self,
        address: u32,
        frame: &'f mut [u8],
        len: usize,
    ) -> Result<&'f [u8], Self::Error> {
        (**self).read(address, frame, len)
    }
}

/// Failures reported while bringing up the flash transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("SPI device not found")]
    DeviceNotFound,
    #[error("SPI device is busy")]
    DeviceBusy,
    #[error("SPI device is slave-only")]
    SlaveOnly,
    #[error("too many SPI slave devices")]
    TooManySlaves,
}

/// Fast Read Dual Output.
pub const OPCODE_FAST_READ_DUAL_OUTPUT: u8 = 0x6b;
/// Fast Read.
pub const OPCODE_FAST_READ: u8 = 0x0b;

/// Highest address reachable with a 3-byte address.
pub const MAX_ADDRESS: u32 = 0x00ff_ffff;

/// Length of the opcode and the 3-byte address.
const COMMAND_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpiFlashError<E> {
    #[error("SPI transfer failed: {0:?}")]
    Bus(E),
    #[error("flash read at {address:#x}+{len:#x} exceeds 24-bit addressing")]
    AddressOutOfRange { address: u32, len: usize },
    #[error("transfer frame too small: {needed} bytes needed, {available} available")]
    FrameTooSmall { needed: usize, available: usize },
}

/// SPI NOR flash read with a 3-byte address.
///
/// A read is one full-duplex transfer of the frame
///
/// | offset    | size    | content                  |
/// |-----------|---------|--------------------------|
/// | 0         | 1       | opcode                   |
/// | 1         | 3       | address, big-endian      |
/// | 4         | `DUMMY` | dummy bytes              |
/// | 4 + DUMMY | `len`   | payload                  |
///
/// `DUMMY` is the number of dummy bytes the flash needs for its access
/// latency at the configured clock.
#[derive(Debug)]
pub struct SpiFlash<Spi, const DUMMY: usize> {
    spi: Spi,
    opcode: u8,
}

impl<Spi, const DUMMY: usize> SpiFlash<Spi, DUMMY>
where
    Spi: SpiDevice,
{
    /// Creates a flash reader that issues Fast Read Dual Output commands.
    pub const fn new(spi: Spi) -> Self {
        Self::with_opcode(spi, OPCODE_FAST_READ_DUAL_OUTPUT)
    }

    pub const fn with_opcode(spi: Spi, opcode: u8) -> Self {
        Self { spi, opcode }
    }

    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    #[must_use]
    pub fn release(self) -> Spi {
        self.spi
    }
}

impl<Spi, const DUMMY: usize> FlashRead for SpiFlash<Spi, DUMMY>
where
    Spi: SpiDevice,
{
    type Error = SpiFlashError<Spi::Error>;

    const FRAME_OVERHEAD: usize = COMMAND_LEN + DUMMY;

    fn read<'f>(
        &mut self,
        address: u32,
        frame: &'f mut [u8],
        len: usize,
    ) -> Result<&'f [u8], Self::Error> {
        let out_of_range = || SpiFlashError::AddressOutOfRange { address, len };
        let last = u32::try_from(len.saturating_sub(1))
            .ok()
            .and_then(|n| address.checked_add(n))
            .ok_or_else(out_of_range)?;
        if last > MAX_ADDRESS {
            return Err(out_of_range());
        }

        let needed = Self::FRAME_OVERHEAD + len;
        if frame.len() < needed {
            return Err(SpiFlashError::FrameTooSmall {
                needed,
                available: frame.len(),
            });
        }
        let frame = &mut frame[..needed];

        let [_, a2, a1, a0] = address.to_be_bytes();
        frame[..COMMAND_LEN].copy_from_slice(&[self.opcode, a2, a1, a0]);
        frame[COMMAND_LEN..Self::FRAME_OVERHEAD].fill(0);

        self.spi
            .transfer_in_place(frame)
            .map_err(SpiFlashError::Bus)?;

        Ok(&frame[Self::FRAME_OVERHEAD..])
    }
}
