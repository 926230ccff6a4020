//! Flash-to-RAM loader for ELF32 images.
//!
//! One boot pass runs strictly forward:
//!
//! 1. read the [`ElfHeader`](elf32_types::ElfHeader) at the image base and
//!    check its magic,
//! 2. read each program header table entry in turn,
//! 3. for each `PT_LOAD` entry, copy `filesz` bytes to `paddr` through the
//!    [`TransferBuffer`] in buffer-sized chunks and clear the remaining
//!    `memsz - filesz` bytes,
//! 4. hand back a [`Launch`] holding the entry point.
//!
//! Every flash read goes through the same caller-owned [`TransferBuffer`].
//! Nothing is allocated. The first failure ends the pass.
//!
//! ```ignore
//! let mut buffer = TransferBuffer::<264>::new();
//! let memory = unsafe { PhysicalMemory::new() };
//! let config = LoaderConfig::new(0x21_9000);
//! let launch = Loader::new(flash, memory, NoTrace, &mut buffer, config)?.load()?;
//! unsafe { launch.jump() }
//! ```

#![cfg_attr(not(test), no_std)]

pub use self::{
    buffer::TransferBuffer,
    config::{Bounds, ImagePolicy, LoaderConfig, RamWindow},
    error::{BootError, ConfigError, FormatError, Stage},
    launch::Launch,
    loader::Loader,
    memory::{PhysicalMemory, TargetMemory},
    trace::{NoTrace, Tracer},
};

mod buffer;
mod config;
mod error;
mod launch;
mod loader;
mod memory;
pub mod trace;

