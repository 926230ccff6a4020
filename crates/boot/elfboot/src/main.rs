//! Second-stage boot loader.
//!
//! Runs from local memory right after reset, copies the ELF image stored in
//! SPI flash into external RAM and jumps to its entry point.

#![no_std]
#![no_main]

use elf_loader::{
    Bounds, BootError, Launch, Loader, LoaderConfig, PhysicalMemory, RamWindow, TransferBuffer,
};
use elfboot_params::{
    ELF_IMAGE_BASE, MAX_PROGRAM_HEADERS, RAM_SIZE, RAM_START, READ_CHUNK_SIZE, SPI_BASE,
    SPI_FLASH_DUMMY_BYTES, SPI_FLASH_SLAVE_SELECT, SPI_NUM_SLAVES, SPI_READ_OPCODE,
    TRANSFER_BUFFER_SIZE,
};
use flash_io::{FlashRead as _, SpiFlash, SpiFlashError};
use riscv::asm;

use self::{
    device::axi_spi::{AxiSpi, SpiError},
    trace::ConsoleTracer,
};

mod console;
mod device;
mod entry;
mod trace;

pub use elfboot_params::STACK_SIZE;

type Flash<'a> = SpiFlash<device::axi_spi::AxiSpiDevice<'a>, SPI_FLASH_DUMMY_BYTES>;

const _: () = assert!(<Flash<'static>>::FRAME_OVERHEAD == elfboot_params::SPI_FRAME_OVERHEAD);

// entry.s jumps here in machine mode with a stack and a cleared bss.
extern "C" fn main() -> ! {
    console::init();
    println!();
    println!("SPI ELF Bootloader");
    println!();

    match run() {
        Ok(launch) => {
            // make the copied code visible to instruction fetch.
            asm::fence();
            asm::fence_i();
            unsafe { launch.jump() }
        }
        Err(e) => {
            println!();
            println!("boot failed: {e}");
            if let Some(e) = e.transfer_error() {
                println!("  caused by: {e}");
            }
            println!("exit status {}", e.status());
            halt();
        }
    }
}

fn run() -> Result<Launch, BootError<SpiFlashError<SpiError>>> {
    let mut spi = unsafe { AxiSpi::init(SPI_BASE, SPI_NUM_SLAVES) }?;
    let flash = Flash::with_opcode(spi.device(SPI_FLASH_SLAVE_SELECT)?, SPI_READ_OPCODE);

    println!("Copying ELF image from SPI flash @ {ELF_IMAGE_BASE:#x} to RAM");

    let mut buffer = TransferBuffer::<TRANSFER_BUFFER_SIZE>::new();
    // the loader runs from local memory, RAM is free for the image.
    let memory = unsafe { PhysicalMemory::new() };
    let loader = Loader::new(flash, memory, ConsoleTracer, &mut buffer, config())?;
    loader.load()
}

fn config() -> LoaderConfig {
    let config = LoaderConfig::new(ELF_IMAGE_BASE).max_chunk(READ_CHUNK_SIZE);
    if cfg!(feature = "trusted-image") {
        return config;
    }
    config.checked(Bounds {
        ram: RamWindow::new(RAM_START, RAM_SIZE),
        max_phnum: MAX_PROGRAM_HEADERS,
    })
}

pub fn halt() -> ! {
    loop {
        asm::wfi();
    }
}
