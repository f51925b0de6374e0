//! Process control block.
//!
//! Per the redesign note in §9, a PCB holds no back-pointers into scheduler
//! queues — `killall` instead walks the scheduler via
//! [`crate::scheduler::Scheduler::for_each_queue`]. The `mmvm_lock` of §5 is
//! simply this struct's `Mutex<AddressSpace>`; `queue_lock` lives inside the
//! scheduler.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use vmkit_vm::PhysicalMemory;

use crate::address_space::AddressSpace;
use crate::constants::{KernelConfig, NUM_REGISTERS};
use crate::error::CoreError;

pub type Pid = u32;

/// The VMA every library entry point in §6 operates against.
pub const DEFAULT_VMAID: u32 = 0;

pub struct Pcb {
    pub pid: Pid,
    pub path: String,
    pub priority: u32,
    pc: AtomicU32,
    registers: Mutex<[u32; NUM_REGISTERS]>,
    mm: Mutex<AddressSpace>,
    pub ram: std::sync::Arc<PhysicalMemory>,
    pub swap: std::sync::Arc<PhysicalMemory>,
}

impl Pcb {
    pub fn new(
        pid: Pid,
        path: impl Into<String>,
        priority: u32,
        config: KernelConfig,
        ram: std::sync::Arc<PhysicalMemory>,
        swap: std::sync::Arc<PhysicalMemory>,
    ) -> Self {
        Self {
            pid,
            path: path.into(),
            priority,
            pc: AtomicU32::new(0),
            registers: Mutex::new([0; NUM_REGISTERS]),
            mm: Mutex::new(AddressSpace::new(config)),
            ram,
            swap,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc.load(Ordering::Relaxed)
    }

    pub fn set_pc(&self, pc: u32) {
        self.pc.store(pc, Ordering::Relaxed);
    }

    pub fn register(&self, idx: usize) -> u32 {
        self.registers.lock().unwrap()[idx]
    }

    pub fn set_register(&self, idx: usize, value: u32) {
        self.registers.lock().unwrap()[idx] = value;
    }

    /// `liballoc`: allocate `size` bytes in VMA 0 and stash the base address
    /// in register `reg_index`.
    pub fn alloc(&self, size: u32, reg_index: usize) -> Result<u32, CoreError> {
        let mut mm = self.mm.lock().unwrap();
        let addr = mm.alloc(DEFAULT_VMAID, reg_index as u32, size)?;
        self.set_register(reg_index, addr);
        Ok(addr)
    }

    /// `libfree`.
    pub fn free(&self, reg_index: usize) -> Result<(), CoreError> {
        let mut mm = self.mm.lock().unwrap();
        mm.free(DEFAULT_VMAID, reg_index as u32)?;
        self.set_register(reg_index, 0);
        Ok(())
    }

    /// `libread`.
    pub fn read(&self, reg_index: usize, offset: u32) -> Result<u8, CoreError> {
        let mut mm = self.mm.lock().unwrap();
        mm.read_byte(reg_index as u32, offset, &self.ram, &self.swap)
    }

    /// `libwrite`.
    pub fn write(&self, value: u8, reg_index: usize, offset: u32) -> Result<(), CoreError> {
        let mut mm = self.mm.lock().unwrap();
        mm.write_byte(reg_index as u32, offset, value, &self.ram, &self.swap)
    }

    /// Free every region still referenced from a non-zero register, as the
    /// kill service does before discarding a victim PCB.
    pub fn free_all_regions(&self) {
        for idx in 0..NUM_REGISTERS {
            if self.register(idx) != 0 {
                let _ = self.free(idx);
            }
        }
    }

    /// Release every physical frame this process holds. Called once, when
    /// the PCB is finally dropped by the kernel.
    pub fn teardown(&self) {
        let mut mm = self.mm.lock().unwrap();
        mm.release_all_frames(&self.ram, &self.swap);
    }
}

impl std::fmt::Debug for Pcb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pcb")
            .field("pid", &self.pid)
            .field("path", &self.path)
            .field("priority", &self.priority)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmkit_vm::SimMemoryDevice;

    fn test_pcb(pid: Pid, path: &str, priority: u32) -> Pcb {
        let cfg = KernelConfig::default();
        let ram = std::sync::Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new("ram", cfg.page_size, cfg.ram_frames))));
        let swap = std::sync::Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new("swap", cfg.page_size, cfg.swap_frames))));
        Pcb::new(pid, path, priority, cfg, ram, swap)
    }

    #[test]
    fn alloc_records_address_in_register() {
        let pcb = test_pcb(1, "P0", 0);
        let addr = pcb.alloc(300, 0).unwrap();
        assert_eq!(addr, 0);
        assert_eq!(pcb.register(0), 0);
    }

    #[test]
    fn free_clears_register() {
        let pcb = test_pcb(1, "P0", 0);
        pcb.alloc(100, 2).unwrap();
        pcb.free(2).unwrap();
        assert_eq!(pcb.register(2), 0);
    }

    #[test]
    fn free_all_regions_skips_zero_slots() {
        let pcb = test_pcb(1, "P0", 0);
        pcb.alloc(50, 0).unwrap();
        pcb.free_all_regions();
        assert_eq!(pcb.register(0), 0);
    }
}
