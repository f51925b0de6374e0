//! `sys_memmap`, the single memory-related system call (number 17).
//!
//! Every device-touching step of the core funnels through this module's
//! functions rather than reaching into `vmkit_vm` directly: swapping a page
//! and the byte-level IO read/write live here; `INC`'s VMA-growth
//! bookkeeping lives in [`crate::address_space`] since it only ever touches
//! page-table/VMA state, never a device. Together they form the `sys_memmap`
//! sub-op surface of §6, keyed by the stable ordinals below.

use log::debug;

use vmkit_vm::{copy_page, FrameNumber, PhysAddr, PhysicalMemory};

use crate::error::CoreError;

/// `sys_memmap`'s call number, kept for documentation/ABI parity with the
/// source; nothing in this crate dispatches on it numerically.
pub const SYS_MEMMAP: u32 = 17;

/// Sub-op ordinals, stable per §6: `INC=0`, `IO_READ=1`, `IO_WRITE=2`,
/// `SWAP=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MemmapOp {
    Inc = 0,
    IoRead = 1,
    IoWrite = 2,
    Swap = 3,
}

/// Which device a `SWAP` frame number names. The caller always pairs a RAM
/// frame with a SWAP frame; direction is inferred from which argument slot
/// each one occupies, matching the source's `regs.a2 = vicfpn (RAM); regs.a3
/// = swpfpn (SWAP)` convention — no fourth argument is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    RamToSwap,
    SwapToRam,
}

/// Move one page-sized block between the caller's active RAM and swap
/// devices (`SWAP`).
pub fn swap(
    ram: &PhysicalMemory,
    swap_dev: &PhysicalMemory,
    direction: SwapDirection,
    src_fpn: u32,
    dst_fpn: u32,
) -> Result<(), CoreError> {
    debug!("sys_memmap SWAP {direction:?} src={src_fpn} dst={dst_fpn}");
    match direction {
        SwapDirection::RamToSwap => {
            copy_page(ram, FrameNumber::new(src_fpn), swap_dev, FrameNumber::new(dst_fpn))?
        }
        SwapDirection::SwapToRam => {
            copy_page(swap_dev, FrameNumber::new(src_fpn), ram, FrameNumber::new(dst_fpn))?
        }
    }
    Ok(())
}

/// Read one byte from RAM (`IO_READ`).
pub fn io_read(ram: &PhysicalMemory, phys_addr: u32) -> Result<u8, CoreError> {
    Ok(ram.read_byte(PhysAddr::new(phys_addr))?)
}

/// Write one byte to RAM (`IO_WRITE`).
pub fn io_write(ram: &PhysicalMemory, phys_addr: u32, byte: u8) -> Result<(), CoreError> {
    ram.write_byte(PhysAddr::new(phys_addr), byte)?;
    Ok(())
}
