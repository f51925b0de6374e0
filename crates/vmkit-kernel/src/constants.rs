//! In-memory configuration for a simulated kernel instance.
//!
//! `KernelConfig` is a plain value type, not a loaded file format: an
//! embedder builds one (directly, or via the `clap`-parsed demo binary) and
//! hands it to [`crate::kernel::Kernel::new`].

/// Fixed register-file width every PCB carries (region-base slots).
pub const NUM_REGISTERS: usize = 10;

/// Cap on a process name read by the kill-by-name service, matching the
/// source's 99-byte scratch buffer.
pub const MAX_PROC_NAME_LEN: usize = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Bytes per page; must be a power of two.
    pub page_size: u32,
    /// Frames available in the shared RAM device.
    pub ram_frames: u32,
    /// Frames available in the shared swap device.
    pub swap_frames: u32,
    /// Length of the flat per-process page table.
    pub paging_max_pgn: u32,
    /// Slots in the per-process symbol (region) table.
    pub paging_max_symtbl_sz: u32,
    /// Number of MLQ priority levels.
    pub max_prio: u32,
    /// Bound on any single process queue's length.
    pub max_queue_size: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            page_size: 256,
            ram_frames: 1024,
            swap_frames: 1024,
            paging_max_pgn: 256,
            paging_max_symtbl_sz: 32,
            max_prio: 4,
            max_queue_size: 10,
        }
    }
}

impl KernelConfig {
    /// Number of low address bits consumed by the in-page offset, derived
    /// from `page_size`. `pgn = addr >> offset_bits`, `off = addr & mask`.
    pub fn offset_bits(&self) -> u32 {
        debug_assert!(self.page_size.is_power_of_two(), "page_size must be a power of two");
        self.page_size.trailing_zeros()
    }

    pub fn offset_mask(&self) -> u32 {
        self.page_size - 1
    }

    pub fn page_number(&self, addr: u32) -> u32 {
        addr >> self.offset_bits()
    }

    pub fn page_offset(&self, addr: u32) -> u32 {
        addr & self.offset_mask()
    }

    pub fn round_up_to_page(&self, size: u32) -> u32 {
        let mask = self.page_size - 1;
        (size + mask) & !mask
    }
}
