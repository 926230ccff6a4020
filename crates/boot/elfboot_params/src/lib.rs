//! Board configuration of the boot loader.
//!
//! Addresses are physical. Change these to match the hardware design.

#![no_std]

/// Base address of the UART Lite used as console.
pub const UART_BASE: usize = 0x4060_0000;

/// Base address of the AXI Quad SPI controller the flash is attached to.
pub const SPI_BASE: usize = 0x44a0_0000;

/// Number of slave select lines wired to the SPI controller.
pub const SPI_NUM_SLAVES: u8 = 1;

/// Slave select mask of the SPI flash. Bit `n` selects slave `n`.
pub const SPI_FLASH_SLAVE_SELECT: u32 = 1 << 0;

/// Number of dummy bytes (derived from the number of dummy cycles) the SPI
/// flash needs at the configured SPI clock.
pub const SPI_FLASH_DUMMY_BYTES: usize = 4;

/// SPI read command: Fast Read Dual Output.
pub const SPI_READ_OPCODE: u8 = 0x6b;

/// Base address of the ELF image in the SPI flash.
pub const ELF_IMAGE_BASE: u32 = 0x0021_9000;

/// Maximum number of bytes read from flash in one go.
///
/// Must be large enough to hold the 52 byte ELF32 header.
pub const READ_CHUNK_SIZE: usize = 256;

/// Opcode, 3-byte address and dummy bytes in front of every read payload.
pub const SPI_FRAME_OVERHEAD: usize = 4 + SPI_FLASH_DUMMY_BYTES;

/// Size of the transfer buffer, framing included.
pub const TRANSFER_BUFFER_SIZE: usize = READ_CHUNK_SIZE + SPI_FRAME_OVERHEAD;

/// External memory the image is loaded into.
pub const RAM_START: u32 = 0x8000_0000;
pub const RAM_SIZE: u32 = 0x0800_0000;

/// Largest program header count accepted when the image is checked.
pub const MAX_PROGRAM_HEADERS: u16 = 16;

/// Stack of the boot loader itself, in local memory.
pub const STACK_SIZE: usize = 2048;

const _: () = assert!(READ_CHUNK_SIZE >= 52);
const _: () = assert!(SPI_FLASH_SLAVE_SELECT.is_power_of_two());
