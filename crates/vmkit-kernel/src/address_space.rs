//! A process's address space: page table, VMA list, symbol table, and FIFO
//! replacement queue, plus the operations that mutate them under one lock.
//!
//! Every public method here assumes its caller already holds the owning
//! [`crate::process::Pcb`]'s `mmvm_lock` (its `AddressSpace` is stored behind
//! a `Mutex`) — see §5: all multi-step operations below must run as one
//! critical section.

use log::{debug, warn};

use vmkit_vm::PhysicalMemory;

use crate::constants::KernelConfig;
use crate::error::CoreError;
use crate::fifo::FifoQueue;
use crate::pte::Pte;
use crate::symtable::SymbolTable;
use crate::syscall::{self, SwapDirection};
use crate::vma::{Region, Vma};

pub struct AddressSpace {
    config: KernelConfig,
    page_table: Vec<Pte>,
    vmas: Vec<Vma>,
    symtable: SymbolTable,
    fifo: FifoQueue,
}

impl AddressSpace {
    pub fn new(config: KernelConfig) -> Self {
        let page_table = vec![Pte::Unused; config.paging_max_pgn as usize];
        let symtable = SymbolTable::new(config.paging_max_symtbl_sz as usize);
        Self {
            vmas: vec![Vma::new(0, 0)],
            page_table,
            symtable,
            fifo: FifoQueue::new(),
            config,
        }
    }

    fn vma(&self, vmaid: u32) -> Result<&Vma, CoreError> {
        self.vmas.iter().find(|v| v.id == vmaid).ok_or(CoreError::BadArg)
    }

    fn vma_mut(&mut self, vmaid: u32) -> Result<&mut Vma, CoreError> {
        self.vmas.iter_mut().find(|v| v.id == vmaid).ok_or(CoreError::BadArg)
    }

    /// `validate_overlap_vm_area`: does `[start, end)` collide with any VMA
    /// other than `vmaid`?
    fn overlaps_other_vma(&self, vmaid: u32, start: u32, end: u32) -> bool {
        self.vmas.iter().any(|v| v.id != vmaid && v.overlaps(start, end))
    }

    /// `inc_vma_limit`: grow a VMA to make room for `inc_sz` more bytes.
    /// Reserves page-table capacity for the new range (install `Unused`
    /// PTEs; the page-fault path installs real frames lazily on first
    /// touch) and validates against overlap before committing `vm_end`/
    /// `sbrk`. On any failure both fields are left untouched.
    fn inc_vma_limit(&mut self, vmaid: u32, inc_sz: u32) -> Result<(), CoreError> {
        let inc_amt = self.config.round_up_to_page(inc_sz);
        let old_end = self.vma(vmaid)?.vm_end;
        let old_sbrk = self.vma(vmaid)?.sbrk;
        let new_start = old_sbrk;
        let new_end = old_sbrk + inc_amt;

        if self.overlaps_other_vma(vmaid, new_start, new_end) {
            return Err(CoreError::OverlapVma);
        }

        let last_pgn = self.config.page_number(new_end.saturating_sub(1));
        if new_end > 0 && last_pgn >= self.page_table.len() as u32 {
            warn!("vma {vmaid} growth to {new_end} exceeds page table capacity");
            return Err(CoreError::AllocFailed);
        }

        let vma = self.vma_mut(vmaid)?;
        vma.vm_end = new_end;
        vma.sbrk = new_end;
        debug!("sys_memmap INC vma={vmaid} inc_sz={inc_sz} -> [{old_end}, {new_end})");
        Ok(())
    }

    /// `__alloc`: first-fit reuse, falling back to VMA growth.
    pub fn alloc(&mut self, vmaid: u32, rgid: u32, size: u32) -> Result<u32, CoreError> {
        if size == 0 {
            return Err(CoreError::BadArg);
        }
        if self.symtable.get(rgid).is_none() {
            return Err(CoreError::BadArg);
        }

        let vma = self.vma_mut(vmaid)?;
        if let Some(region) = vma.take_free_region(size) {
            self.symtable.set(rgid, region);
            return Ok(region.start);
        }

        let old_sbrk = self.vma(vmaid)?.sbrk;
        let inc_sz = size;
        self.inc_vma_limit(vmaid, inc_sz)?;

        let inc_amt = self.config.round_up_to_page(inc_sz);
        if inc_amt > size {
            let tail = Region {
                start: old_sbrk + size,
                end: old_sbrk + inc_amt,
            };
            self.vma_mut(vmaid)?.enlist_free_region(tail);
        }

        let region = Region {
            start: old_sbrk,
            end: old_sbrk + size,
        };
        self.symtable.set(rgid, region);
        Ok(old_sbrk)
    }

    /// `__free`: move the symbol table's region onto the owning VMA's free
    /// list and clear the slot.
    pub fn free(&mut self, vmaid: u32, rgid: u32) -> Result<(), CoreError> {
        let region = self.symtable.get(rgid).ok_or(CoreError::BadArg)?;
        if region.is_cleared() {
            return Err(CoreError::NoSuchRegion(rgid));
        }
        self.vma_mut(vmaid)?.enlist_free_region(region);
        self.symtable.clear(rgid);
        Ok(())
    }

    /// `pg_getpage`/`resolve`: translate a page number to a resident RAM
    /// frame, faulting the page in if necessary.
    fn resolve(&mut self, pgn: u32, ram: &PhysicalMemory, swap: &PhysicalMemory) -> Result<u32, CoreError> {
        let pte = *self
            .page_table
            .get(pgn as usize)
            .ok_or(CoreError::BadArg)?;

        if let Pte::Present { fpn, .. } = pte {
            return Ok(fpn);
        }

        match ram.get_free_frame() {
            Ok(new_fpn) => {
                let new_fpn = new_fpn.val();
                if let Pte::Swapped { slot } = pte {
                    syscall::swap(ram, swap, SwapDirection::SwapToRam, slot, new_fpn)?;
                    swap.put_free_frame(vmkit_vm::FrameNumber::new(slot))?;
                } else {
                    ram.zero_frame(vmkit_vm::FrameNumber::new(new_fpn))?;
                }
                self.page_table[pgn as usize] = Pte::Present { fpn: new_fpn, dirty: false };
                self.fifo.enlist(pgn);
                debug!("page fault: pgn={pgn} resolved directly to fpn={new_fpn}");
                Ok(new_fpn)
            }
            Err(vmkit_vm::DeviceError::FrameExhausted) => {
                let vicpgn = self.fifo.find_victim_page().ok_or(CoreError::NoVictim)?;
                let vicfpn = match self.page_table[vicpgn as usize] {
                    Pte::Present { fpn, .. } => fpn,
                    _ => return Err(CoreError::NoVictim),
                };
                let swpfpn = swap
                    .get_free_frame()
                    .map_err(|_| CoreError::SwapFull)?
                    .val();

                syscall::swap(ram, swap, SwapDirection::RamToSwap, vicfpn, swpfpn)?;
                if let Pte::Swapped { slot } = pte {
                    syscall::swap(ram, swap, SwapDirection::SwapToRam, slot, vicfpn)?;
                    swap.put_free_frame(vmkit_vm::FrameNumber::new(slot))?;
                } else {
                    ram.zero_frame(vmkit_vm::FrameNumber::new(vicfpn))?;
                }

                self.page_table[vicpgn as usize] = Pte::Swapped { slot: swpfpn };
                self.page_table[pgn as usize] = Pte::Present { fpn: vicfpn, dirty: false };
                self.fifo.enlist(pgn);
                debug!("page fault: pgn={pgn} evicted pgn={vicpgn} fpn={vicfpn} to swap slot={swpfpn}");
                Ok(vicfpn)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `__read`/`pg_getval`.
    pub fn read_byte(
        &mut self,
        rgid: u32,
        offset: u32,
        ram: &PhysicalMemory,
        swap: &PhysicalMemory,
    ) -> Result<u8, CoreError> {
        let region = self.symtable.get(rgid).ok_or(CoreError::BadArg)?;
        let addr = region.start + offset;
        let pgn = self.config.page_number(addr);
        let off = self.config.page_offset(addr);
        let fpn = self.resolve(pgn, ram, swap)?;
        let phys = fpn * self.config.page_size + off;
        syscall::io_read(ram, phys)
    }

    /// `__write`/`pg_setval`.
    pub fn write_byte(
        &mut self,
        rgid: u32,
        offset: u32,
        value: u8,
        ram: &PhysicalMemory,
        swap: &PhysicalMemory,
    ) -> Result<(), CoreError> {
        let region = self.symtable.get(rgid).ok_or(CoreError::BadArg)?;
        let addr = region.start + offset;
        let pgn = self.config.page_number(addr);
        let off = self.config.page_offset(addr);
        let fpn = self.resolve(pgn, ram, swap)?;
        let phys = fpn * self.config.page_size + off;
        syscall::io_write(ram, phys, value)?;
        if let Pte::Present { dirty, .. } = &mut self.page_table[pgn as usize] {
            *dirty = true;
        }
        Ok(())
    }

    /// Release every frame this address space holds, in RAM and in swap —
    /// `free_pcb_memph`. Called once when a process is torn down.
    pub fn release_all_frames(&mut self, ram: &PhysicalMemory, swap: &PhysicalMemory) {
        for pte in &mut self.page_table {
            match *pte {
                Pte::Present { fpn, .. } => {
                    ram.put_free_frame(vmkit_vm::FrameNumber::new(fpn)).ok();
                }
                Pte::Swapped { slot } => {
                    swap.put_free_frame(vmkit_vm::FrameNumber::new(slot)).ok();
                }
                Pte::Unused => {}
            }
            *pte = Pte::Unused;
        }
        self.fifo = FifoQueue::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vmkit_vm::SimMemoryDevice;

    fn devices(ram_frames: u32, swap_frames: u32, page_size: u32) -> (Arc<PhysicalMemory>, Arc<PhysicalMemory>) {
        let ram = Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new("ram", page_size, ram_frames))));
        let swap = Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new("swap", page_size, swap_frames))));
        (ram, swap)
    }

    #[test]
    fn alloc_then_alloc_reuses_free_tail() {
        let mut space = AddressSpace::new(KernelConfig::default());
        let addr0 = space.alloc(0, 0, 300).unwrap();
        assert_eq!(addr0, 0);
        let addr1 = space.alloc(0, 1, 100).unwrap();
        assert_eq!(addr1, 300);
        assert_eq!(space.vma(0).unwrap().vm_end, 512);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let (ram, swap) = devices(16, 16, 256);
        let mut space = AddressSpace::new(KernelConfig::default());
        space.alloc(0, 0, 300).unwrap();
        space.write_byte(0, 0, 0x41, &ram, &swap).unwrap();
        assert_eq!(space.read_byte(0, 0, &ram, &swap).unwrap(), 0x41);
    }

    #[test]
    fn free_on_cleared_slot_fails() {
        let mut space = AddressSpace::new(KernelConfig::default());
        assert!(space.free(0, 0).is_err());
    }

    #[test]
    fn fifo_eviction_picks_the_head() {
        // RAM sized to hold exactly 4 resident pages, forcing the 5th
        // page touched to evict the FIFO head rather than find a free frame.
        let cfg = KernelConfig::default();
        let (ram, swap) = devices(4, 4, cfg.page_size);
        let mut space = AddressSpace::new(cfg);
        space.alloc(0, 0, 256).unwrap();
        space.alloc(0, 1, 256).unwrap();
        space.alloc(0, 2, 256).unwrap();
        space.alloc(0, 3, 256).unwrap();

        space.write_byte(0, 0, 1, &ram, &swap).unwrap();
        space.write_byte(1, 0, 2, &ram, &swap).unwrap();
        space.write_byte(2, 0, 3, &ram, &swap).unwrap();
        space.write_byte(3, 0, 4, &ram, &swap).unwrap();

        // page 1 already resident: no fault, no FIFO change
        assert_eq!(space.read_byte(1, 0, &ram, &swap).unwrap(), 2);

        // RAM is now full (4 frames, 4 resident pages): a 5th allocation's
        // first touch must evict page 0, the FIFO head.
        space.alloc(0, 4, 256).unwrap();
        space.write_byte(4, 0, 5, &ram, &swap).unwrap();

        // page 0's content should now be recoverable from swap.
        assert_eq!(space.read_byte(0, 0, &ram, &swap).unwrap(), 1);
    }

    /// Free-region ranges on VMA 0 stay disjoint and strictly inside
    /// `[vm_start, sbrk)` (invariant 2 of §8) after any interleaving of
    /// alloc/free against a handful of region ids.
    fn free_regions_are_disjoint_and_in_bounds(space: &AddressSpace, vmaid: u32) -> bool {
        let vma = match space.vma(vmaid) {
            Ok(v) => v,
            Err(_) => return true,
        };
        let regions = vma.free_regions();
        for r in regions {
            if !(r.start < r.end && r.start >= vma.vm_start && r.end <= vma.sbrk) {
                return false;
            }
        }
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.start < b.end && b.start < a.end {
                    return false;
                }
            }
        }
        true
    }

    /// Symbol-table entries are either cleared or a well-formed sub-range of
    /// `[0, sbrk)` for their owning VMA (invariant 3 of §8).
    fn symtable_entries_are_well_formed(space: &AddressSpace, vmaid: u32) -> bool {
        let sbrk = match space.vma(vmaid) {
            Ok(v) => v.sbrk,
            Err(_) => return true,
        };
        (0..space.symtable.len() as u32).all(|rgid| match space.symtable.get(rgid) {
            Some(r) if r.is_cleared() => true,
            Some(r) => r.start < r.end && r.end <= sbrk,
            None => true,
        })
    }

    use proptest::prelude::*;

    proptest::proptest! {
        #[test]
        fn alloc_free_sequences_preserve_region_invariants(
            ops in proptest::collection::vec(
                (any::<bool>(), 0u32..6, 1u32..600),
                1..60,
            )
        ) {
            let mut space = AddressSpace::new(KernelConfig::default());
            for (do_alloc, rgid, size) in ops {
                if do_alloc {
                    let _ = space.alloc(0, rgid, size);
                } else {
                    let _ = space.free(0, rgid);
                }
                assert!(free_regions_are_disjoint_and_in_bounds(&space, 0));
                assert!(symtable_entries_are_well_formed(&space, 0));
                let vma = space.vma(0).unwrap();
                assert!(vma.vm_start <= vma.sbrk && vma.sbrk <= vma.vm_end);
            }
        }
    }
}
