//! Diagnostic hooks.
//!
//! The loader itself never prints. It reports progress to a [`Tracer`] at
//! fixed points of the boot pass and leaves formatting to the caller.

use elf32_types::{ElfHeader, ProgramHeader};

/// Observer of a boot pass. Every hook defaults to doing nothing.
pub trait Tracer {
    /// The header has been read and its magic checked.
    fn header_parsed(&mut self, _header: &ElfHeader) {}

    /// Program header `index` has been read.
    fn program_header(&mut self, _index: u16, _ph: &ProgramHeader) {}

    /// `chunk` has been copied to `ph.paddr + copied`.
    fn chunk_copied(&mut self, _index: u16, _ph: &ProgramHeader, _copied: u32, _chunk: &[u8]) {}

    /// `len` bytes at `paddr` have been cleared.
    fn segment_zeroed(&mut self, _index: u16, _paddr: u32, _len: u32) {}

    /// All segments are in place; control goes to `entry` next.
    fn before_launch(&mut self, _entry: u32) {}
}

impl<T> Tracer for &mut T
where
    T: Tracer + ?Sized,
{
    fn header_parsed(&mut self, header: &ElfHeader) {
        (**self).header_parsed(header);
    }

    fn program_header(&mut self, index: u16, ph: &ProgramHeader) {
        (**self).program_header(index, ph);
    }

    fn chunk_copied(&mut self, index: u16, ph: &ProgramHeader, copied: u32, chunk: &[u8]) {
        (**self).chunk_copied(index, ph, copied, chunk);
    }

    fn segment_zeroed(&mut self, index: u16, paddr: u32, len: u32) {
        (**self).segment_zeroed(index, paddr, len);
    }

    fn before_launch(&mut self, entry: u32) {
        (**self).before_launch(entry);
    }
}

/// A tracer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl Tracer for NoTrace {}
