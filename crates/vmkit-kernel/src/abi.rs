//! The four `int`-returning library entry points of §6: thin wrappers over
//! [`Pcb`]'s typed methods that log-and-collapse a `CoreError` to a negative
//! status code, the way `CoreError::to_status` is meant to be used at this
//! one boundary. Everything above this layer (the demo binary, tests) should
//! prefer the typed `Pcb` methods directly and only reach for these when it
//! genuinely wants the ABI's `int` convention.

use log::warn;

use crate::process::Pcb;

/// `alloc(size, reg_index) -> status`. Size 0 is rejected by `Pcb::alloc`.
pub fn alloc(pcb: &Pcb, size: u32, reg_index: usize) -> i32 {
    match pcb.alloc(size, reg_index) {
        Ok(_) => 0,
        Err(e) => {
            warn!("alloc(size={size}, reg={reg_index}) failed: {e}");
            e.to_status()
        }
    }
}

/// `free(reg_index) -> status`.
pub fn free(pcb: &Pcb, reg_index: usize) -> i32 {
    match pcb.free(reg_index) {
        Ok(()) => 0,
        Err(e) => {
            warn!("free(reg={reg_index}) failed: {e}");
            e.to_status()
        }
    }
}

/// `read(reg_index, offset, &dst_word) -> status`; the byte is zero-extended
/// into `dst_word` on success.
pub fn read(pcb: &Pcb, reg_index: usize, offset: u32, dst_word: &mut u32) -> i32 {
    match pcb.read(reg_index, offset) {
        Ok(byte) => {
            *dst_word = byte as u32;
            0
        }
        Err(e) => {
            warn!("read(reg={reg_index}, offset={offset}) failed: {e}");
            e.to_status()
        }
    }
}

/// `write(byte, reg_index, offset) -> status`.
pub fn write(pcb: &Pcb, byte: u8, reg_index: usize, offset: u32) -> i32 {
    match pcb.write(byte, reg_index, offset) {
        Ok(()) => 0,
        Err(e) => {
            warn!("write(reg={reg_index}, offset={offset}) failed: {e}");
            e.to_status()
        }
    }
}
