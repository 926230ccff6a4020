//! Integer conversions between `u32` image fields and `usize` that cannot
//! lose bits on the targets this workspace builds for.
//!
//! ELF32 offsets and addresses are `u32`, while slices and pointers want
//! `usize`. Only targets whose pointers are at least 32 bits wide get the
//! `u32 -> usize` impl, so a narrower target fails to build instead of
//! truncating addresses at run time.

#![cfg_attr(not(test), no_std)]

/// Converts a size known at compile time to `u32`.
///
/// Panics (at compile time, when used through [`to_u32!`]) if `n` does not
/// fit.
#[must_use]
#[expect(clippy::cast_possible_truncation)]
pub const fn to_u32(n: usize) -> u32 {
    assert!(n <= u32::MAX as usize);
    n as u32
}

/// [`to_u32`] evaluated in a const block.
#[macro_export]
macro_rules! to_u32 {
    ($n:expr) => {
        const { $crate::to_u32($n) }
    };
}

/// Lossless conversion that `From` does not provide for every target.
pub trait SafeFrom<T> {
    fn safe_from(value: T) -> Self;
}

pub trait SafeInto<T> {
    fn safe_into(self) -> T;
}

impl SafeFrom<u16> for usize {
    fn safe_from(value: u16) -> Self {
        value.into()
    }
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl SafeFrom<u32> for usize {
    #[expect(clippy::cast_possible_truncation)]
    fn safe_from(value: u32) -> Self {
        value as Self
    }
}

impl<T, U> SafeInto<U> for T
where
    U: SafeFrom<T>,
{
    fn safe_into(self) -> U {
        U::safe_from(self)
    }
}
