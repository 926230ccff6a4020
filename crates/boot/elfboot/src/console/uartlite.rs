//! Polled driver for the AXI UART Lite transmitter.
//!
//! Baud rate and frame format are fixed in hardware, so there is nothing to
//! configure beyond clearing the FIFOs.

use core::{hint, ptr};

use bitflags::bitflags;
use elfboot_params::UART_BASE;
use vcell::VolatileCell;

#[repr(C)]
struct Registers {
    /// receive FIFO (read only)
    _rx_fifo: VolatileCell<u32>,
    /// transmit FIFO (write only)
    tx_fifo: VolatileCell<u32>,
    status: VolatileCell<u32>,
    control: VolatileCell<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy)]
    struct Status: u32 {
        const RX_FIFO_VALID_DATA = 1 << 0;
        const RX_FIFO_FULL = 1 << 1;
        const TX_FIFO_EMPTY = 1 << 2;
        const TX_FIFO_FULL = 1 << 3;
        const INTR_ENABLED = 1 << 4;
        const OVERRUN_ERROR = 1 << 5;
        const FRAME_ERROR = 1 << 6;
        const PARITY_ERROR = 1 << 7;
    }

    #[derive(Debug, Clone, Copy)]
    struct Control: u32 {
        const RST_TX_FIFO = 1 << 0;
        const RST_RX_FIFO = 1 << 1;
        const ENABLE_INTR = 1 << 4;
    }
}

fn regs() -> &'static Registers {
    unsafe { &*ptr::with_exposed_provenance::<Registers>(UART_BASE) }
}

fn status() -> Status {
    Status::from_bits_retain(regs().status.get())
}

/// Clears both FIFOs and leaves interrupts disabled.
pub fn init() {
    regs()
        .control
        .set((Control::RST_TX_FIFO | Control::RST_RX_FIFO).bits());
}

/// Sends one byte, spinning while the transmit FIFO is full.
pub fn putc_sync(c: u8) {
    while status().contains(Status::TX_FIFO_FULL) {
        hint::spin_loop();
    }
    regs().tx_fifo.set(u32::from(c));
}
