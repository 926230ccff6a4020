//! Boot progress on the console.

#[cfg(feature = "verbose")]
use elf32_types::ElfHeader;
use elf32_types::ProgramHeader;
use elf_loader::Tracer;

use crate::{print, println};

/// A dot is printed every time this many bytes of a segment are copied.
const PROGRESS_INTERVAL: u32 = 1024;

pub struct ConsoleTracer;

impl Tracer for ConsoleTracer {
    #[cfg(feature = "verbose")]
    fn header_parsed(&mut self, header: &ElfHeader) {
        println!("ELF ident: {:02x?}", header.ident);
        println!(
            "  type {:#x} machine {:#x} entry {:#010x}",
            header.ty, header.machine, header.entry
        );
        println!(
            "  phoff {:#x} phentsize {} phnum {}",
            header.phoff, header.phentsize, header.phnum
        );
    }

    #[cfg(feature = "verbose")]
    fn program_header(&mut self, index: u16, ph: &ProgramHeader) {
        println!(
            "program header {index}: type {:#x} flags {:#x} offset {:#x}",
            ph.ty, ph.flags, ph.offset
        );
        println!(
            "  paddr {:#010x} filesz {:#x} memsz {:#x}",
            ph.paddr, ph.filesz, ph.memsz
        );
    }

    #[cfg_attr(not(feature = "verbose"), expect(unused_variables))]
    fn chunk_copied(&mut self, index: u16, ph: &ProgramHeader, copied: u32, chunk: &[u8]) {
        #[cfg(feature = "verbose")]
        {
            if copied == 0 {
                println!(
                    "segment {index} first bytes @ {:#010x}: {:02x?}",
                    ph.paddr,
                    &chunk[..chunk.len().min(8)]
                );
            }
            let len = u32::try_from(chunk.len()).unwrap_or(u32::MAX);
            if copied.saturating_add(len) == ph.filesz {
                let tail = chunk.len().saturating_sub(8);
                println!(
                    "segment {index} last bytes @ {:#010x}: {:02x?}",
                    ph.paddr.wrapping_add(ph.filesz),
                    &chunk[tail..]
                );
            }
        }

        if copied % PROGRESS_INTERVAL == 0 {
            print!(".");
        }
    }

    #[cfg(feature = "verbose")]
    fn segment_zeroed(&mut self, index: u16, paddr: u32, len: u32) {
        println!(
            "segment {index} zeroed {paddr:#010x}..{:#010x}",
            paddr.wrapping_add(len)
        );
    }

    fn before_launch(&mut self, entry: u32) {
        println!();
        println!("Transferring execution to program @ {entry:#x}");
    }
}
