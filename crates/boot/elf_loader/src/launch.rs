use core::{mem, ptr};

use safe_cast::SafeFrom as _;

/// A fully loaded image, ready to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a loaded image does nothing until it is launched"]
pub struct Launch {
    entry: u32,
}

impl Launch {
    pub(crate) const fn new(entry: u32) -> Self {
        Self { entry }
    }

    /// Address execution continues at.
    #[must_use]
    pub const fn entry(&self) -> u32 {
        self.entry
    }

    /// Transfers control to the entry point. Never returns.
    ///
    /// # Safety
    ///
    /// The segments must have been written to the memory the image was
    /// linked for, and any instruction cache must already be coherent with
    /// them. Nothing of the caller's state survives the jump.
    pub unsafe fn jump(self) -> ! {
        let entry = ptr::with_exposed_provenance::<()>(usize::safe_from(self.entry));
        let entry: extern "C" fn() -> ! = unsafe { mem::transmute(entry) };
        entry()
    }
}
