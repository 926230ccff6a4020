//! Boot passes over a simulated SPI NOR flash.

use core::convert::Infallible;

use elf_loader::{
    Bounds, BootError, FormatError, LoaderConfig, Loader, NoTrace, RamWindow, Stage,
    TargetMemory, TransferBuffer,
};
use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
use flash_io::SpiFlash;

const IMAGE_BASE: u32 = 0x21_9000;
const DUMMY: usize = 4;
const CHUNK: usize = 256;
const FRAME: usize = CHUNK + 4 + DUMMY;

/// 4 MiB of SPI NOR answering fast-read commands.
struct Nor {
    memory: Vec<u8>,
    transfers: Vec<(u32, usize)>,
}

impl Nor {
    fn with_image(image: &[u8]) -> Self {
        let mut memory = vec![0xff; 4 << 20];
        let base = IMAGE_BASE as usize;
        memory[base..base + image.len()].copy_from_slice(image);
        Self {
            memory,
            transfers: vec![],
        }
    }
}

impl ErrorType for Nor {
    type Error = Infallible;
}

impl SpiDevice for Nor {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for op in operations {
            let Operation::TransferInPlace(words) = op else {
                panic!("unexpected SPI operation");
            };
            assert_eq!(words[0], 0x6b);
            let address = u32::from_be_bytes([0, words[1], words[2], words[3]]);
            let payload = &mut words[4 + DUMMY..];
            self.transfers.push((address, payload.len()));
            let start = address as usize;
            payload.copy_from_slice(&self.memory[start..start + payload.len()]);
        }
        Ok(())
    }
}

/// RAM starting at `base`.
struct Ram {
    base: u32,
    bytes: Vec<u8>,
    touched: usize,
}

impl Ram {
    fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0xcc; size],
            touched: 0,
        }
    }

    fn at(&self, paddr: u32, len: usize) -> &[u8] {
        let start = (paddr - self.base) as usize;
        &self.bytes[start..start + len]
    }
}

impl TargetMemory for Ram {
    fn write(&mut self, paddr: u32, bytes: &[u8]) {
        let start = (paddr - self.base) as usize;
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        self.touched += bytes.len();
    }

    fn zero(&mut self, paddr: u32, len: u32) {
        let start = (paddr - self.base) as usize;
        self.bytes[start..start + len as usize].fill(0);
        self.touched += len as usize;
    }
}

struct Segment {
    ty: u32,
    paddr: u32,
    memsz: u32,
    data: Vec<u8>,
}

/// Builds an image with the program header table after the segment data,
/// the way linkers often place it when the header is not part of a segment.
fn build_image(entry: u32, segments: &[Segment]) -> Vec<u8> {
    let mut img = vec![0; 52];
    let mut offsets = vec![];
    for seg in segments {
        while img.len() % 4 != 0 {
            img.push(0);
        }
        offsets.push(img.len() as u32);
        img.extend_from_slice(&seg.data);
    }
    while img.len() % 4 != 0 {
        img.push(0);
    }
    let phoff = img.len() as u32;
    for (seg, offset) in segments.iter().zip(offsets) {
        let words = [
            seg.ty,
            offset,
            seg.paddr,
            seg.paddr,
            seg.data.len() as u32,
            seg.memsz,
            5,
            4,
        ];
        for w in words {
            img.extend_from_slice(&w.to_le_bytes());
        }
    }

    img[..4].copy_from_slice(b"\x7fELF");
    img[4] = 1; // ELFCLASS32
    img[5] = 1; // ELFDATA2LSB
    img[6] = 1; // EV_CURRENT
    img[16..18].copy_from_slice(&2_u16.to_le_bytes()); // ET_EXEC
    img[18..20].copy_from_slice(&243_u16.to_le_bytes()); // EM_RISCV
    img[20..24].copy_from_slice(&1_u32.to_le_bytes());
    img[24..28].copy_from_slice(&entry.to_le_bytes());
    img[28..32].copy_from_slice(&phoff.to_le_bytes());
    img[40..42].copy_from_slice(&52_u16.to_le_bytes());
    img[42..44].copy_from_slice(&32_u16.to_le_bytes());
    img[44..46].copy_from_slice(&(segments.len() as u16).to_le_bytes());
    img
}

fn bytes(len: usize, seed: u32) -> Vec<u8> {
    (0..len as u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8 ^ seed as u8)
        .collect()
}

fn boot(
    nor: &mut Nor,
    ram: &mut Ram,
    config: LoaderConfig,
) -> Result<u32, BootError<flash_io::SpiFlashError<Infallible>>> {
    let mut buffer = TransferBuffer::<FRAME>::new();
    let flash = SpiFlash::<_, DUMMY>::new(nor);
    let launch = Loader::new(flash, ram, NoTrace, &mut buffer, config)?.load()?;
    Ok(launch.entry())
}

fn checked() -> LoaderConfig {
    LoaderConfig::new(IMAGE_BASE).checked(Bounds {
        ram: RamWindow::new(0x8000_0000, 0x1_0000),
        max_phnum: 16,
    })
}

#[test]
fn loads_text_data_and_bss() {
    let text = bytes(1500, 1);
    let data = bytes(300, 2);
    let segments = [
        Segment {
            ty: 1,
            paddr: 0x8000_0000,
            memsz: 1500,
            data: text.clone(),
        },
        Segment {
            ty: 0x6474_e551, // PT_GNU_STACK
            paddr: 0,
            memsz: 0,
            data: vec![],
        },
        Segment {
            ty: 1,
            paddr: 0x8000_1000,
            memsz: 300 + 0x200,
            data: data.clone(),
        },
    ];
    let image = build_image(0x8000_0000, &segments);
    let mut nor = Nor::with_image(&image);
    let mut ram = Ram::new(0x8000_0000, 0x1_0000);

    let entry = boot(&mut nor, &mut ram, checked()).unwrap();

    assert_eq!(entry, 0x8000_0000);
    assert_eq!(ram.at(0x8000_0000, 1500), &text[..]);
    assert_eq!(ram.at(0x8000_1000, 300), &data[..]);
    assert!(ram.at(0x8000_1000 + 300, 0x200).iter().all(|&b| b == 0));
    // untouched memory right after the cleared range
    assert_eq!(ram.at(0x8000_1000 + 300 + 0x200, 4), [0xcc; 4]);
    assert_eq!(ram.touched, 1500 + 300 + 0x200);

    // header + 3 program headers + 6 text chunks + 2 data chunks
    assert_eq!(nor.transfers.len(), 1 + 3 + 6 + 2);
    assert_eq!(nor.transfers[0], (IMAGE_BASE, 52));
    assert!(nor.transfers.iter().all(|&(_, len)| len <= CHUNK));
}

#[test]
fn wrong_magic_is_rejected_before_any_write() {
    let mut image = build_image(
        0x8000_0000,
        &[Segment {
            ty: 1,
            paddr: 0x8000_0000,
            memsz: 16,
            data: bytes(10, 0),
        }],
    );
    image[3] = b'G';
    let mut nor = Nor::with_image(&image);
    let mut ram = Ram::new(0x8000_0000, 0x1_0000);

    let err = boot(&mut nor, &mut ram, LoaderConfig::new(IMAGE_BASE)).unwrap_err();

    assert!(matches!(err, BootError::Format(FormatError::BadMagic(_))));
    assert_eq!(err.to_string(), "invalid ELF header: bad magic [7f, 45, 4c, 47]");
    assert_eq!(nor.transfers, [(IMAGE_BASE, 52)]);
    assert_eq!(ram.touched, 0);
}

#[test]
fn erased_flash_is_not_an_image() {
    let mut nor = Nor::with_image(&[]);
    let mut ram = Ram::new(0x8000_0000, 0x1_0000);

    let err = boot(&mut nor, &mut ram, LoaderConfig::new(IMAGE_BASE)).unwrap_err();
    assert!(matches!(
        err,
        BootError::Format(FormatError::BadMagic([0xff, 0xff, 0xff, 0xff]))
    ));
}

#[test]
fn read_past_24_bit_flash_fails_the_segment() {
    let mut image = build_image(
        0x8000_0000,
        &[Segment {
            ty: 1,
            paddr: 0x8000_0000,
            memsz: 16,
            data: bytes(16, 0),
        }],
    );
    // point the segment at the very end of the 24-bit address space
    let phoff = u32::from_le_bytes(image[28..32].try_into().unwrap()) as usize;
    let offset = 0x0100_0000 - IMAGE_BASE - 8;
    image[phoff + 4..phoff + 8].copy_from_slice(&offset.to_le_bytes());
    let mut nor = Nor::with_image(&image);
    let mut ram = Ram::new(0x8000_0000, 0x1_0000);

    let err = boot(&mut nor, &mut ram, LoaderConfig::new(IMAGE_BASE)).unwrap_err();

    assert!(matches!(
        err,
        BootError::Transfer {
            stage: Stage::Segment(0),
            error: flash_io::SpiFlashError::AddressOutOfRange { .. },
        }
    ));
    assert_eq!(err.to_string(), "failed to read ELF program segment 0");
    assert_eq!(ram.touched, 0);
}
