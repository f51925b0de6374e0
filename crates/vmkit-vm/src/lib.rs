//! Byte-addressable physical memory devices and the per-device frame
//! allocator that backs vmkit's demand-paged virtual memory manager.
//!
//! This crate models component 1 and 2 of the system overview: RAM and swap
//! are both [`PhysicalMemory`] instances built on a [`MemoryDevice`]
//! (currently just [`SimMemoryDevice`], a flat in-memory byte array), each
//! owning a [`FrameAllocator`]. The kernel crate consumes these as shared
//! `Arc` handles; it never reaches into device internals directly.

pub mod error;
pub mod memory;

pub use error::DeviceError;
pub use memory::{
    copy_page, FrameAllocator, FrameNumber, MemoryDevice, PhysAddr, PhysicalMemory,
    SimMemoryDevice,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_allocator_recycles_returned_frames() {
        let alloc = FrameAllocator::new(2);
        let a = alloc.get_free_frame().unwrap();
        let b = alloc.get_free_frame().unwrap();
        assert!(alloc.get_free_frame().is_err());

        alloc.put_free_frame(a).unwrap();
        let c = alloc.get_free_frame().unwrap();
        assert_eq!(a.val(), c.val());

        alloc.put_free_frame(b).unwrap();
        alloc.put_free_frame(c).unwrap();
        assert_eq!(alloc.free_count(), 2);
    }

    #[test]
    fn double_free_is_rejected() {
        let alloc = FrameAllocator::new(1);
        let a = alloc.get_free_frame().unwrap();
        alloc.put_free_frame(a).unwrap();
        assert_eq!(alloc.put_free_frame(a), Err(DeviceError::FrameNotAllocated(a.val())));
    }

    #[test]
    fn device_read_write_roundtrip() {
        let dev = SimMemoryDevice::new("ram", 256, 4);
        dev.write(PhysAddr::new(10), 0x41).unwrap();
        assert_eq!(dev.read(PhysAddr::new(10)).unwrap(), 0x41);
        assert_eq!(dev.read(PhysAddr::new(11)).unwrap(), 0);
    }

    #[test]
    fn device_read_out_of_bounds() {
        let dev = SimMemoryDevice::new("ram", 256, 1);
        assert_eq!(dev.read(PhysAddr::new(256)), Err(DeviceError::OutOfBounds(256)));
    }

    #[test]
    fn copy_page_moves_a_whole_frame() {
        let ram = PhysicalMemory::new(Box::new(SimMemoryDevice::new("ram", 4, 2)));
        let swap = PhysicalMemory::new(Box::new(SimMemoryDevice::new("swap", 4, 2)));

        let src_fpn = ram.get_free_frame().unwrap();
        for i in 0..4u32 {
            ram.write_byte(PhysAddr::new(src_fpn.val() * 4 + i), i as u8 + 1)
                .unwrap();
        }

        let dst_fpn = swap.get_free_frame().unwrap();
        copy_page(&ram, src_fpn, &swap, dst_fpn).unwrap();

        for i in 0..4u32 {
            let b = swap.read_byte(PhysAddr::new(dst_fpn.val() * 4 + i)).unwrap();
            assert_eq!(b, i as u8 + 1);
        }
    }

    #[test]
    fn zero_frame_clears_every_byte() {
        let ram = PhysicalMemory::new(Box::new(SimMemoryDevice::new("ram", 4, 1)));
        let fpn = ram.get_free_frame().unwrap();
        ram.write_byte(PhysAddr::new(0), 0xFF).unwrap();
        ram.zero_frame(fpn).unwrap();
        for i in 0..4u32 {
            assert_eq!(ram.read_byte(PhysAddr::new(i)).unwrap(), 0);
        }
    }
}
