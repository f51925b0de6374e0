use thiserror::Error;
use vmkit_vm::DeviceError;

/// Failures raised by the core's memory-management and scheduling entry
/// points. `CoreError` is the typed boundary the Rust API exposes; the
/// `int`-returning ABI wrappers collapse it to a negative code and log it at
/// `warn` before doing so.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument")]
    BadArg,

    #[error("no such region {0}")]
    NoSuchRegion(u32),

    #[error("allocation failed")]
    AllocFailed,

    #[error("proposed VMA range overlaps an existing VMA")]
    OverlapVma,

    #[error("no victim page available to evict")]
    NoVictim,

    #[error("swap device has no free slots")]
    SwapFull,

    #[error("device failure while paging: {0}")]
    SwapIo(#[from] DeviceError),

    #[error("page fault could not be resolved")]
    PageFault,

    #[error("out of memory allocating kernel bookkeeping state")]
    Oom,
}

impl CoreError {
    /// Collapse to the negative-int ABI convention of the four library
    /// entry points (§6): 0 on success, negative on failure.
    pub fn to_status(&self) -> i32 {
        -1
    }
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("kernel initialization failed: {0}")]
    Init(String),

    #[error("unknown process id {0}")]
    NoSuchProcess(u32),
}
