use core::arch::global_asm;

use crate::{STACK_SIZE, main};

#[repr(C, align(16))]
pub struct Stack {
    _data: [u8; STACK_SIZE],
}

// entry.s sets up the stack pointer to the top of this.
pub static mut STACK0: Stack = Stack {
    _data: [0; STACK_SIZE],
};

global_asm!(
    include_str!("entry.s"),
    STACK0 = sym STACK0,
    STACK_SIZE = const STACK_SIZE,
    main = sym main,
);
