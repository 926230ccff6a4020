/// A range of physical memory that loaded segments may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamWindow {
    pub start: u32,
    pub size: u32,
}

impl RamWindow {
    #[must_use]
    pub const fn new(start: u32, size: u32) -> Self {
        Self { start, size }
    }

    /// Returns `true` if `[addr, addr + len)` lies inside the window.
    ///
    /// An empty range is contained if `addr` itself is.
    #[must_use]
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        let start = u64::from(self.start);
        let end = start + u64::from(self.size);
        let addr = u64::from(addr);
        addr >= start && addr + u64::from(len) <= end && (len > 0 || addr < end)
    }
}

/// How much of the image is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Only the magic bytes are checked. Header fields are used as-is and
    /// address arithmetic wraps modulo 2^32.
    Trusted,
    /// Header fields are validated before they are used for addressing.
    Checked(Bounds),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Memory the segments and the entry point must fall into.
    pub ram: RamWindow,
    /// Largest accepted program header count.
    pub max_phnum: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Flash address of the first byte of the image.
    pub image_base: u32,
    /// Upper limit for a single segment read, on top of the buffer capacity.
    pub max_chunk: Option<usize>,
    pub policy: ImagePolicy,
}

impl LoaderConfig {
    #[must_use]
    pub const fn new(image_base: u32) -> Self {
        Self {
            image_base,
            max_chunk: None,
            policy: ImagePolicy::Trusted,
        }
    }

    #[must_use]
    pub const fn max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = Some(max_chunk);
        self
    }

    #[must_use]
    pub const fn checked(mut self, bounds: Bounds) -> Self {
        self.policy = ImagePolicy::Checked(bounds);
        self
    }
}
