use thiserror::Error;

/// Failures raised by a single byte-addressable memory device.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("address {0:#x} is out of bounds for this device")]
    OutOfBounds(u32),

    #[error("device has no free frames left")]
    FrameExhausted,

    #[error("frame {0} is not currently allocated")]
    FrameNotAllocated(u32),
}
