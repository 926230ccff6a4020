//! Polled driver for the AXI Quad SPI controller in standard SPI mode.
//!
//! The controller is used as master with manual slave select, interrupts
//! disabled. Every byte is shifted out through the data transmit register and
//! the byte shifted in at the same time is collected from the data receive
//! register before the next one is sent.

use core::{hint, ptr};

use bitflags::bitflags;
use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiDevice};
use flash_io::InitError;
use vcell::VolatileCell;

#[repr(C)]
struct Registers {
    _reserved0: [u32; 7],
    /// device global interrupt enable register
    dgier: VolatileCell<u32>,
    /// IP interrupt status register
    ipisr: VolatileCell<u32>,
    _reserved1: u32,
    /// IP interrupt enable register
    ipier: VolatileCell<u32>,
    _reserved2: [u32; 5],
    /// software reset register
    srr: VolatileCell<u32>,
    _reserved3: [u32; 7],
    /// SPI control register
    spicr: VolatileCell<u32>,
    /// SPI status register
    spisr: VolatileCell<u32>,
    /// SPI data transmit register
    dtr: VolatileCell<u32>,
    /// SPI data receive register
    drr: VolatileCell<u32>,
    /// SPI slave select register (active low)
    ssr: VolatileCell<u32>,
}

const _: () = assert!(core::mem::offset_of!(Registers, srr) == 0x40);
const _: () = assert!(core::mem::offset_of!(Registers, ssr) == 0x70);

/// Value written to SRR to reset the core.
const SRR_RESET: u32 = 0x0000_000a;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Control: u32 {
        const LOOPBACK = 1 << 0;
        const ENABLE = 1 << 1;
        const MASTER = 1 << 2;
        const CPOL = 1 << 3;
        const CPHA = 1 << 4;
        const TX_FIFO_RESET = 1 << 5;
        const RX_FIFO_RESET = 1 << 6;
        const MANUAL_SLAVE_SELECT = 1 << 7;
        const MASTER_INHIBIT = 1 << 8;
        const LSB_FIRST = 1 << 9;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Status: u32 {
        const RX_EMPTY = 1 << 0;
        const RX_FULL = 1 << 1;
        const TX_EMPTY = 1 << 2;
        const TX_FULL = 1 << 3;
        const MODE_FAULT = 1 << 4;
        const SLAVE_MODE_SELECT = 1 << 5;
    }
}

/// SPICR right after a reset.
const CONTROL_RESET_VALUE: Control = Control::MANUAL_SLAVE_SELECT.union(Control::MASTER_INHIBIT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiError {
    /// Another master drove the slave select line.
    ModeFault,
}

impl spi::Error for SpiError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ModeFault => ErrorKind::ModeFault,
        }
    }
}

pub struct AxiSpi {
    regs: &'static Registers,
    num_slaves: u8,
}

impl AxiSpi {
    /// Resets the controller at `base` and sets it up as polled master with
    /// manual slave select.
    ///
    /// # Safety
    ///
    /// `base` must be the address of an AXI Quad SPI register block that no
    /// one else accesses.
    pub unsafe fn init(base: usize, num_slaves: u8) -> Result<Self, InitError> {
        let regs = unsafe { &*ptr::with_exposed_provenance::<Registers>(base) };
        let spi = Self { regs, num_slaves };

        let control = spi.control();
        if control.contains(Control::ENABLE)
            && !control.contains(Control::MASTER_INHIBIT)
            && !spi.status().contains(Status::TX_EMPTY)
        {
            // a transfer left running by an earlier stage.
            return Err(InitError::DeviceBusy);
        }

        regs.srr.set(SRR_RESET);
        if spi.control() != CONTROL_RESET_VALUE {
            return Err(InitError::DeviceNotFound);
        }

        regs.dgier.set(0);
        regs.ipier.set(0);
        regs.ipisr.set(regs.ipisr.get());
        spi.deselect();

        let control = Control::MASTER
            | Control::MANUAL_SLAVE_SELECT
            | Control::MASTER_INHIBIT
            | Control::TX_FIFO_RESET
            | Control::RX_FIFO_RESET;
        spi.set_control(control);
        if !spi.control().contains(Control::MASTER) {
            return Err(InitError::SlaveOnly);
        }
        let control = control.difference(Control::TX_FIFO_RESET | Control::RX_FIFO_RESET);
        spi.set_control(control | Control::ENABLE);

        Ok(spi)
    }

    /// Returns the device behind the slave select lines in `mask`.
    ///
    /// `mask` must select exactly one of the connected slaves.
    pub fn device(&mut self, mask: u32) -> Result<AxiSpiDevice<'_>, InitError> {
        if mask.count_ones() != 1 || mask.trailing_zeros() >= u32::from(self.num_slaves) {
            return Err(InitError::TooManySlaves);
        }
        Ok(AxiSpiDevice { spi: self, mask })
    }

    fn control(&self) -> Control {
        Control::from_bits_retain(self.regs.spicr.get())
    }

    fn set_control(&self, control: Control) {
        self.regs.spicr.set(control.bits());
    }

    fn status(&self) -> Status {
        Status::from_bits_retain(self.regs.spisr.get())
    }

    fn select(&self, mask: u32) {
        self.regs.ssr.set(!mask);
    }

    fn deselect(&self) {
        self.regs.ssr.set(!0);
    }

    fn start(&self) {
        self.set_control(self.control().difference(Control::MASTER_INHIBIT));
    }

    fn stop(&self) {
        self.set_control(self.control().union(Control::MASTER_INHIBIT));
    }

    /// Shifts one byte out and returns the byte shifted in.
    fn exchange(&self, tx: u8) -> Result<u8, SpiError> {
        self.regs.dtr.set(u32::from(tx));
        loop {
            let status = self.status();
            if status.contains(Status::MODE_FAULT) {
                return Err(SpiError::ModeFault);
            }
            if !status.contains(Status::RX_EMPTY) {
                break;
            }
            hint::spin_loop();
        }
        Ok(self.regs.drr.get().to_le_bytes()[0])
    }
}

/// One slave on an [`AxiSpi`] bus.
pub struct AxiSpiDevice<'a> {
    spi: &'a mut AxiSpi,
    mask: u32,
}

impl ErrorType for AxiSpiDevice<'_> {
    type Error = SpiError;
}

impl SpiDevice for AxiSpiDevice<'_> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let spi = &*self.spi;
        spi.select(self.mask);
        spi.start();
        let res = operations.iter_mut().try_for_each(|op| run(spi, op));
        spi.stop();
        spi.deselect();
        res
    }
}

fn run(spi: &AxiSpi, op: &mut Operation<'_, u8>) -> Result<(), SpiError> {
    match op {
        Operation::Read(words) => {
            for w in &mut **words {
                *w = spi.exchange(0)?;
            }
        }
        Operation::Write(words) => {
            for &w in &**words {
                spi.exchange(w)?;
            }
        }
        Operation::Transfer(read, write) => {
            for i in 0..usize::max(read.len(), write.len()) {
                let rx = spi.exchange(write.get(i).copied().unwrap_or(0))?;
                if let Some(r) = read.get_mut(i) {
                    *r = rx;
                }
            }
        }
        Operation::TransferInPlace(words) => {
            for w in &mut **words {
                *w = spi.exchange(*w)?;
            }
        }
        Operation::DelayNs(ns) => {
            // at most one iteration per nanosecond on any clock this core
            // runs at, so this waits at least `ns`.
            for _ in 0..*ns {
                hint::spin_loop();
            }
        }
    }
    Ok(())
}
