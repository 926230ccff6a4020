//! Console output, to the UART.
//!
//! The boot loader only ever writes to the console. Output is synchronous;
//! each character waits for room in the transmit FIFO.

pub mod print;
pub mod uartlite;

pub fn init() {
    uartlite::init();
}

/// Sends one character to the UART.
///
/// Used by `print!()` and `println!()`. Newlines are sent as CR LF.
pub fn put_char(c: char) {
    if c == '\n' {
        uartlite::putc_sync(b'\r');
    }
    let mut buf = [0; 4];
    for b in c.encode_utf8(&mut buf).bytes() {
        uartlite::putc_sync(b);
    }
}
