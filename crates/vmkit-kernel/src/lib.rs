//! The core of a teaching operating-system simulator: per-process
//! demand-paged virtual memory with swap, an MLQ CPU scheduler, and a
//! kill-by-name system call.
//!
//! [`Kernel`] is the single entry point an embedder constructs; everything
//! else in this crate is reached through it or through a [`Pcb`] it hands
//! back from [`Kernel::spawn`].

pub mod abi;
pub mod address_space;
pub mod constants;
pub mod error;
pub mod fifo;
pub mod kernel;
pub mod killall;
pub mod process;
pub mod pte;
pub mod scheduler;
pub mod symtable;
pub mod syscall;
pub mod vma;

pub use constants::KernelConfig;
pub use error::{CoreError, KernelError};
pub use kernel::{Kernel, SchedulerKind};
pub use killall::KillallOutcome;
pub use process::{Pcb, Pid};
pub use scheduler::{MlqScheduler, Scheduler, SimpleScheduler};
