//! Format of a 32-bit ELF executable file.
//!
//! Only the parts needed to copy an executable into memory are described:
//! the file header and the program header table. Both records are stored
//! little-endian on flash; [`ElfHeader::decode`] and
//! [`ProgramHeader::decode`] return them in host byte order.
//!
//! | offset    | size              | content              | type              |
//! |-----------|-------------------|----------------------|-------------------|
//! | 0         | 52                | File header          | [`ElfHeader`]     |
//! | `phoff`   | `phnum * 32`      | Program header table | [`ProgramHeader`] |
//! | `offset`  | `filesz`          | Segment contents     | bytes             |

#![cfg_attr(not(test), no_std)]

use dataview::{Pod, PodMethods as _};

/// Identification bytes every ELF file starts with (`"\x7FELF"`).
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Length of the identification array at the start of the header.
pub const EI_NIDENT: usize = 16;
/// Index of the file class byte within the identification array.
pub const EI_CLASS: usize = 4;
/// Index of the data encoding byte within the identification array.
pub const EI_DATA: usize = 5;

/// 32-bit objects.
pub const ELFCLASS32: u8 = 1;
/// Two's complement, little-endian data encoding.
pub const ELFDATA2LSB: u8 = 1;

/// Loadable program segment.
pub const PT_LOAD: u32 = 1;

/// Segment is executable.
pub const PF_X: u32 = 1 << 0;
/// Segment is writable.
pub const PF_W: u32 = 1 << 1;
/// Segment is readable.
pub const PF_R: u32 = 1 << 2;

/// File header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod)]
pub struct ElfHeader {
    pub ident: [u8; EI_NIDENT],
    pub ty: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u32,
    pub phoff: u32,
    pub shoff: u32,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

/// Program section header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod)]
pub struct ProgramHeader {
    pub ty: u32,
    pub offset: u32,
    pub vaddr: u32,
    pub paddr: u32,
    pub filesz: u32,
    pub memsz: u32,
    pub flags: u32,
    pub align: u32,
}

const _: () = assert!(size_of::<ElfHeader>() == 52);
const _: () = assert!(size_of::<ProgramHeader>() == 32);

impl ElfHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = size_of::<Self>();

    #[must_use]
    pub const fn zero() -> Self {
        Self {
            ident: [0; EI_NIDENT],
            ty: 0,
            machine: 0,
            version: 0,
            entry: 0,
            phoff: 0,
            shoff: 0,
            flags: 0,
            ehsize: 0,
            phentsize: 0,
            phnum: 0,
            shentsize: 0,
            shnum: 0,
            shstrndx: 0,
        }
    }

    /// Decodes a header from its on-flash representation.
    ///
    /// Returns `None` if `bytes` is not exactly [`Self::SIZE`] bytes long.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let mut hdr = Self::zero();
        hdr.as_bytes_mut().copy_from_slice(bytes);
        Some(hdr.from_le())
    }

    /// Returns `true` if the first four identification bytes are [`ELF_MAGIC`].
    #[must_use]
    pub fn has_magic(&self) -> bool {
        self.ident[..ELF_MAGIC.len()] == ELF_MAGIC
    }

    /// Returns `true` if the file claims to be a little-endian 32-bit object.
    #[must_use]
    pub fn is_elf32_le(&self) -> bool {
        self.ident[EI_CLASS] == ELFCLASS32 && self.ident[EI_DATA] == ELFDATA2LSB
    }

    fn from_le(self) -> Self {
        Self {
            ident: self.ident,
            ty: u16::from_le(self.ty),
            machine: u16::from_le(self.machine),
            version: u32::from_le(self.version),
            entry: u32::from_le(self.entry),
            phoff: u32::from_le(self.phoff),
            shoff: u32::from_le(self.shoff),
            flags: u32::from_le(self.flags),
            ehsize: u16::from_le(self.ehsize),
            phentsize: u16::from_le(self.phentsize),
            phnum: u16::from_le(self.phnum),
            shentsize: u16::from_le(self.shentsize),
            shnum: u16::from_le(self.shnum),
            shstrndx: u16::from_le(self.shstrndx),
        }
    }
}

impl ProgramHeader {
    /// Size of one program header table entry in bytes.
    pub const SIZE: usize = size_of::<Self>();

    #[must_use]
    pub const fn zero() -> Self {
        Self {
            ty: 0,
            offset: 0,
            vaddr: 0,
            paddr: 0,
            filesz: 0,
            memsz: 0,
            flags: 0,
            align: 0,
        }
    }

    /// Decodes a program header from its on-flash representation.
    ///
    /// Returns `None` if `bytes` is not exactly [`Self::SIZE`] bytes long.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let mut ph = Self::zero();
        ph.as_bytes_mut().copy_from_slice(bytes);
        Some(ph.from_le())
    }

    #[must_use]
    pub fn is_load(&self) -> bool {
        self.ty == PT_LOAD
    }

    /// Number of bytes present in memory but not backed by the file.
    ///
    /// Zero when `memsz <= filesz`.
    #[must_use]
    pub fn bss_len(&self) -> u32 {
        self.memsz.saturating_sub(self.filesz)
    }

    fn from_le(self) -> Self {
        Self {
            ty: u32::from_le(self.ty),
            offset: u32::from_le(self.offset),
            vaddr: u32::from_le(self.vaddr),
            paddr: u32::from_le(self.paddr),
            filesz: u32::from_le(self.filesz),
            memsz: u32::from_le(self.memsz),
            flags: u32::from_le(self.flags),
            align: u32::from_le(self.align),
        }
    }
}
