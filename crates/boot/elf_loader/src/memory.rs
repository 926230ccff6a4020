use core::ptr;

use safe_cast::SafeFrom as _;

/// Destination address space of the loaded segments.
pub trait TargetMemory {
    /// Copies `bytes` to physical address `paddr`.
    fn write(&mut self, paddr: u32, bytes: &[u8]);

    /// Sets `len` bytes starting at physical address `paddr` to zero.
    fn zero(&mut self, paddr: u32, len: u32);
}

impl<T> TargetMemory for &mut T
where
    T: TargetMemory + ?Sized,
{
    fn write(&mut self, paddr: u32, bytes: &[u8]) {
        (**self).write(paddr, bytes);
    }

    fn zero(&mut self, paddr: u32, len: u32) {
        (**self).zero(paddr, len);
    }
}

/// Raw access to physical memory.
#[derive(Debug)]
pub struct PhysicalMemory {
    _private: (),
}

impl PhysicalMemory {
    /// Creates a handle that writes directly to physical addresses.
    ///
    /// # Safety
    ///
    /// Every range passed to [`TargetMemory::write`] and
    /// [`TargetMemory::zero`] must be writable memory that the running
    /// program (its code, stack and transfer buffer included) does not use.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl TargetMemory for PhysicalMemory {
    fn write(&mut self, paddr: u32, bytes: &[u8]) {
        let dst = ptr::with_exposed_provenance_mut::<u8>(usize::safe_from(paddr));
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len()) }
    }

    fn zero(&mut self, paddr: u32, len: u32) {
        let dst = ptr::with_exposed_provenance_mut::<u8>(usize::safe_from(paddr));
        unsafe { dst.write_bytes(0, usize::safe_from(len)) }
    }
}
