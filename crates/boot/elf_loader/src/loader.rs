use elf32_types::{ElfHeader, ProgramHeader};
use flash_io::FlashRead;
use safe_cast::{SafeFrom as _, to_u32};

use crate::{
    Launch, TransferBuffer,
    config::{Bounds, ImagePolicy, LoaderConfig},
    error::{BootError, ConfigError, FormatError, Stage},
    memory::TargetMemory,
    trace::Tracer,
};

const PH_ENTRY_SIZE: u32 = to_u32!(ProgramHeader::SIZE);

/// Copies an ELF image from flash into memory.
///
/// A loader is good for one boot pass: [`Loader::load`] consumes it.
pub struct Loader<'buf, Flash, Memory, Trace, const N: usize> {
    flash: Flash,
    memory: Memory,
    tracer: Trace,
    buffer: &'buf mut TransferBuffer<N>,
    config: LoaderConfig,
    chunk_size: u32,
}

impl<'buf, Flash, Memory, Trace, const N: usize> Loader<'buf, Flash, Memory, Trace, N>
where
    Flash: FlashRead,
    Memory: TargetMemory,
    Trace: Tracer,
{
    /// Creates a loader.
    ///
    /// Fails if the payload part of `buffer`, limited by
    /// [`LoaderConfig::max_chunk`], cannot hold an [`ElfHeader`].
    pub fn new(
        flash: Flash,
        memory: Memory,
        tracer: Trace,
        buffer: &'buf mut TransferBuffer<N>,
        config: LoaderConfig,
    ) -> Result<Self, ConfigError> {
        let capacity = N.saturating_sub(Flash::FRAME_OVERHEAD);
        let capacity = config.max_chunk.map_or(capacity, |max| max.min(capacity));
        if capacity < ElfHeader::SIZE {
            return Err(ConfigError::BufferTooSmall {
                capacity,
                required: ElfHeader::SIZE,
            });
        }
        let chunk_size = u32::try_from(capacity).unwrap_or(u32::MAX);

        Ok(Self {
            flash,
            memory,
            tracer,
            buffer,
            config,
            chunk_size,
        })
    }

    /// Largest number of payload bytes moved by one flash read.
    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Runs the whole boot pass.
    ///
    /// Reads and validates the header, then walks the program header table
    /// and copies every loadable segment. The first failure stops the pass;
    /// segments copied before it stay in memory.
    pub fn load(mut self) -> Result<Launch, BootError<Flash::Error>> {
        let header = self.read_header()?;

        for index in 0..header.phnum {
            let ph = self.read_program_header(&header, index)?;
            self.tracer.program_header(index, &ph);
            if !ph.is_load() {
                continue;
            }
            self.load_segment(index, &ph)?;
        }

        self.tracer.before_launch(header.entry);
        Ok(Launch::new(header.entry))
    }

    /// Reads the header at the image base and validates it.
    pub fn read_header(&mut self) -> Result<ElfHeader, BootError<Flash::Error>> {
        let bytes = fetch(
            &mut self.flash,
            self.buffer.frame(),
            self.config.image_base,
            ElfHeader::SIZE,
            Stage::Header,
        )?;
        let header = ElfHeader::decode(bytes).ok_or(FormatError::Truncated(Stage::Header))?;

        if !header.has_magic() {
            let mut magic = [0; 4];
            magic.copy_from_slice(&header.ident[..4]);
            return Err(FormatError::BadMagic(magic).into());
        }
        if let ImagePolicy::Checked(bounds) = self.config.policy {
            check_header(&header, &bounds)?;
        }

        self.tracer.header_parsed(&header);
        Ok(header)
    }

    /// Reads entry `index` of the program header table.
    pub fn read_program_header(
        &mut self,
        header: &ElfHeader,
        index: u16,
    ) -> Result<ProgramHeader, BootError<Flash::Error>> {
        let stage = Stage::ProgramHeader(index);
        let entry_offset = u32::from(index) * PH_ENTRY_SIZE;
        let offset = self.add(header.phoff, entry_offset, stage)?;
        let address = self.add(self.config.image_base, offset, stage)?;

        let bytes = fetch(
            &mut self.flash,
            self.buffer.frame(),
            address,
            ProgramHeader::SIZE,
            stage,
        )?;
        let ph = ProgramHeader::decode(bytes).ok_or(FormatError::Truncated(stage))?;
        Ok(ph)
    }

    /// Copies the file-backed part of segment `index` to `ph.paddr` one
    /// buffer-sized chunk at a time, then clears the rest up to `ph.memsz`.
    pub fn load_segment(
        &mut self,
        index: u16,
        ph: &ProgramHeader,
    ) -> Result<(), BootError<Flash::Error>> {
        let stage = Stage::Segment(index);
        if let ImagePolicy::Checked(bounds) = self.config.policy {
            self.check_segment(index, ph, &bounds)?;
        }
        let src = self.add(self.config.image_base, ph.offset, stage)?;

        let mut copied = 0;
        while copied < ph.filesz {
            let n = u32::min(self.chunk_size, ph.filesz - copied);
            let chunk = fetch(
                &mut self.flash,
                self.buffer.frame(),
                src.wrapping_add(copied),
                usize::safe_from(n),
                stage,
            )?;
            self.memory.write(ph.paddr.wrapping_add(copied), chunk);
            self.tracer.chunk_copied(index, ph, copied, chunk);
            copied += n;
        }

        let bss_len = ph.bss_len();
        if bss_len > 0 {
            let bss_start = ph.paddr.wrapping_add(ph.filesz);
            self.memory.zero(bss_start, bss_len);
            self.tracer.segment_zeroed(index, bss_start, bss_len);
        }

        Ok(())
    }

    /// Adds two image addresses. Wraps under [`ImagePolicy::Trusted`].
    fn add(&self, a: u32, b: u32, stage: Stage) -> Result<u32, FormatError> {
        match self.config.policy {
            ImagePolicy::Trusted => Ok(a.wrapping_add(b)),
            ImagePolicy::Checked(_) => a
                .checked_add(b)
                .ok_or(FormatError::AddressOverflow { stage }),
        }
    }

    fn check_segment(
        &self,
        index: u16,
        ph: &ProgramHeader,
        bounds: &Bounds,
    ) -> Result<(), FormatError> {
        let stage = Stage::Segment(index);
        if ph.memsz < ph.filesz {
            return Err(FormatError::SegmentSizeMismatch {
                index,
                filesz: ph.filesz,
                memsz: ph.memsz,
            });
        }
        let src = self.add(self.config.image_base, ph.offset, stage)?;
        self.add(src, ph.filesz, stage)?;
        self.add(ph.paddr, ph.memsz, stage)?;
        if !bounds.ram.contains(ph.paddr, ph.memsz) {
            return Err(FormatError::SegmentOutOfBounds {
                index,
                paddr: ph.paddr,
                memsz: ph.memsz,
            });
        }
        Ok(())
    }
}

fn check_header(header: &ElfHeader, bounds: &Bounds) -> Result<(), FormatError> {
    if !header.is_elf32_le() {
        return Err(FormatError::UnsupportedClass {
            class: header.ident[elf32_types::EI_CLASS],
            data: header.ident[elf32_types::EI_DATA],
        });
    }
    if header.phnum > 0 && usize::from(header.phentsize) != ProgramHeader::SIZE {
        return Err(FormatError::ProgramHeaderSize(header.phentsize));
    }
    if header.phnum > bounds.max_phnum {
        return Err(FormatError::TooManyProgramHeaders {
            phnum: header.phnum,
            max: bounds.max_phnum,
        });
    }
    if !bounds.ram.contains(header.entry, 0) {
        return Err(FormatError::EntryOutOfBounds(header.entry));
    }
    Ok(())
}

/// Reads `len` bytes at flash `address` through `frame`.
fn fetch<'f, Flash>(
    flash: &mut Flash,
    frame: &'f mut [u8],
    address: u32,
    len: usize,
    stage: Stage,
) -> Result<&'f [u8], BootError<Flash::Error>>
where
    Flash: FlashRead,
{
    flash
        .read(address, frame, len)
        .map_err(|error| BootError::Transfer { stage, error })
}
