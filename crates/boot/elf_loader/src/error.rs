use core::fmt;

use flash_io::InitError;

/// The phase of the boot pass a flash read belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    ProgramHeader(u16),
    Segment(u16),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "ELF header"),
            Self::ProgramHeader(i) => write!(f, "ELF program header {i}"),
            Self::Segment(i) => write!(f, "ELF program segment {i}"),
        }
    }
}

/// The image on flash is not something the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("invalid ELF header: bad magic {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("not a little-endian ELF32 image (class {class}, data {data})")]
    UnsupportedClass { class: u8, data: u8 },
    #[error("{0} truncated by the transport")]
    Truncated(Stage),
    #[error("unexpected program header entry size {0}")]
    ProgramHeaderSize(u16),
    #[error("too many program headers: {phnum} > {max}")]
    TooManyProgramHeaders { phnum: u16, max: u16 },
    #[error("entry point {0:#010x} outside RAM")]
    EntryOutOfBounds(u32),
    #[error("segment {index}: memsz {memsz:#x} smaller than filesz {filesz:#x}")]
    SegmentSizeMismatch { index: u16, filesz: u32, memsz: u32 },
    #[error("{stage}: address arithmetic overflows 32 bits")]
    AddressOverflow { stage: Stage },
    #[error("segment {index}: {paddr:#010x}+{memsz:#x} outside RAM")]
    SegmentOutOfBounds { index: u16, paddr: u32, memsz: u32 },
}

/// The loader was set up with parameters it cannot work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("transfer buffer holds {capacity} payload bytes, {required} required")]
    BufferTooSmall { capacity: usize, required: usize },
}

/// Every way a boot pass can fail.
///
/// All failures are fatal; the loader never retries.
#[derive(Debug, thiserror::Error)]
pub enum BootError<E> {
    #[error("flash transport initialization failed: {0}")]
    TransportInit(#[from] InitError),
    #[error("failed to read {stage}")]
    Transfer { stage: Stage, error: E },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl<E> BootError<E> {
    /// Status reported to whatever started the loader.
    #[must_use]
    pub fn status(&self) -> i32 {
        -1
    }

    /// Returns the transport error of a failed read, if any.
    #[must_use]
    pub fn transfer_error(&self) -> Option<&E> {
        match self {
            Self::Transfer { error, .. } => Some(error),
            _ => None,
        }
    }
}
