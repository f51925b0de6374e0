use std::sync::Mutex;

use log::{debug, trace};

use crate::error::DeviceError;

/// A physical address within a single memory device's byte array.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct PhysAddr(u32);

impl PhysAddr {
    pub fn new(addr: u32) -> Self {
        Self(addr)
    }

    pub fn val(&self) -> u32 {
        self.0
    }
}

/// A frame number (physical page index) inside a single memory device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameNumber(u32);

impl FrameNumber {
    pub fn new(fpn: u32) -> Self {
        Self(fpn)
    }

    pub fn val(&self) -> u32 {
        self.0
    }
}

/// Byte-addressable memory device: RAM, or a swap device.
///
/// Mirrors the `MEMPHY_read`/`MEMPHY_write` pair, split into a trait so RAM
/// and swap devices share one interface.
pub trait MemoryDevice: Send {
    fn name(&self) -> &str;
    fn page_size(&self) -> u32;
    fn frame_count(&self) -> u32;
    fn read(&self, addr: PhysAddr) -> Result<u8, DeviceError>;
    fn write(&self, addr: PhysAddr, value: u8) -> Result<(), DeviceError>;
}

/// A simple flat byte array backing a RAM or swap device, sized as
/// `frame_count * page_size` bytes. Interior mutability is behind a mutex so
/// the device can be shared across processes independently of any
/// address-space lock: RAM and swap are process-shared, and their internal
/// allocators stay thread-safe on their own.
pub struct SimMemoryDevice {
    name: String,
    page_size: u32,
    bytes: Mutex<Vec<u8>>,
}

impl SimMemoryDevice {
    pub fn new(name: impl Into<String>, page_size: u32, frame_count: u32) -> Self {
        let size = page_size as usize * frame_count as usize;
        Self {
            name: name.into(),
            page_size,
            bytes: Mutex::new(vec![0u8; size]),
        }
    }
}

impl MemoryDevice for SimMemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn frame_count(&self) -> u32 {
        let bytes = self.bytes.lock().unwrap();
        (bytes.len() as u32) / self.page_size
    }

    fn read(&self, addr: PhysAddr) -> Result<u8, DeviceError> {
        let bytes = self.bytes.lock().unwrap();
        bytes
            .get(addr.val() as usize)
            .copied()
            .ok_or(DeviceError::OutOfBounds(addr.val()))
    }

    fn write(&self, addr: PhysAddr, value: u8) -> Result<(), DeviceError> {
        let mut bytes = self.bytes.lock().unwrap();
        let slot = bytes
            .get_mut(addr.val() as usize)
            .ok_or(DeviceError::OutOfBounds(addr.val()))?;
        *slot = value;
        Ok(())
    }
}

/// Per-device free-frame list. RAM and swap each own one; a process holds a
/// shared handle to whichever device it currently needs frames from.
pub struct FrameAllocator {
    free: Mutex<Vec<u32>>,
}

impl FrameAllocator {
    /// All frames `0..frame_count` start free.
    pub fn new(frame_count: u32) -> Self {
        let free = (0..frame_count).rev().collect();
        Self {
            free: Mutex::new(free),
        }
    }

    pub fn get_free_frame(&self) -> Result<FrameNumber, DeviceError> {
        let mut free = self.free.lock().unwrap();
        let fpn = free.pop().ok_or(DeviceError::FrameExhausted)?;
        trace!("allocated frame {fpn}, {} remaining", free.len());
        Ok(FrameNumber::new(fpn))
    }

    pub fn put_free_frame(&self, fpn: FrameNumber) -> Result<(), DeviceError> {
        let mut free = self.free.lock().unwrap();
        if free.contains(&fpn.val()) {
            return Err(DeviceError::FrameNotAllocated(fpn.val()));
        }
        free.push(fpn.val());
        trace!("released frame {}, {} free", fpn.val(), free.len());
        Ok(())
    }

    pub fn free_count(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

/// A physical memory device paired with the frame allocator that manages its
/// frames. RAM and every swap device are each one `PhysicalMemory`; a PCB
/// holds `Arc<PhysicalMemory>` handles to the ones it currently uses.
pub struct PhysicalMemory {
    device: Box<dyn MemoryDevice>,
    frames: FrameAllocator,
}

impl PhysicalMemory {
    pub fn new(device: Box<dyn MemoryDevice>) -> Self {
        let frame_count = device.frame_count();
        debug!(
            "physical memory '{}' online with {} frames of {} bytes",
            device.name(),
            frame_count,
            device.page_size()
        );
        Self {
            device,
            frames: FrameAllocator::new(frame_count),
        }
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn page_size(&self) -> u32 {
        self.device.page_size()
    }

    pub fn get_free_frame(&self) -> Result<FrameNumber, DeviceError> {
        self.frames.get_free_frame()
    }

    pub fn put_free_frame(&self, fpn: FrameNumber) -> Result<(), DeviceError> {
        self.frames.put_free_frame(fpn)
    }

    pub fn free_frame_count(&self) -> usize {
        self.frames.free_count()
    }

    pub fn read_byte(&self, addr: PhysAddr) -> Result<u8, DeviceError> {
        self.device.read(addr)
    }

    pub fn write_byte(&self, addr: PhysAddr, value: u8) -> Result<(), DeviceError> {
        self.device.write(addr, value)
    }

    /// Zero an entire frame, e.g. when handing it to a never-touched page.
    pub fn zero_frame(&self, fpn: FrameNumber) -> Result<(), DeviceError> {
        let page_size = self.page_size();
        let base = fpn.val() * page_size;
        for i in 0..page_size {
            self.device.write(PhysAddr::new(base + i), 0)?;
        }
        Ok(())
    }
}

/// Bulk page copy between two physical memory devices. Used by the `SWAP`
/// sub-op to move a page-sized block between RAM and a swap device.
pub fn copy_page(
    src: &PhysicalMemory,
    src_fpn: FrameNumber,
    dst: &PhysicalMemory,
    dst_fpn: FrameNumber,
) -> Result<(), DeviceError> {
    let page_size = src.page_size();
    debug_assert_eq!(page_size, dst.page_size(), "page size mismatch on copy_page");

    let src_base = src_fpn.val() * page_size;
    let dst_base = dst_fpn.val() * page_size;
    for i in 0..page_size {
        let byte = src.read_byte(PhysAddr::new(src_base + i))?;
        dst.write_byte(PhysAddr::new(dst_base + i), byte)?;
    }
    Ok(())
}
