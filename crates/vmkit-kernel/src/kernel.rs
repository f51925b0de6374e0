//! Top-level kernel handle.
//!
//! Per the redesign note in §9, every piece of state the source kept in
//! module-level statics and mutexes is an explicit value owned here instead;
//! a test (or the demo binary) builds a fresh `Kernel` per case rather than
//! relying on process-global state.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use vmkit_vm::{PhysicalMemory, SimMemoryDevice};

use crate::constants::KernelConfig;
use crate::killall::{self, KillallOutcome};
use crate::process::{Pcb, Pid};
use crate::scheduler::{MlqScheduler, Scheduler, SimpleScheduler};

/// Which [`Scheduler`] impl a [`Kernel`] dispatches through. MLQ is the
/// default; `Simple` selects the single-ready-queue fallback of §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerKind {
    #[default]
    Mlq,
    Simple,
}

pub struct Kernel {
    config: KernelConfig,
    ram: Arc<PhysicalMemory>,
    swap: Arc<PhysicalMemory>,
    scheduler: Box<dyn Scheduler>,
    processes: Mutex<Vec<Arc<Pcb>>>,
    next_pid: Mutex<Pid>,
}

impl Kernel {
    pub fn new(config: KernelConfig) -> Self {
        Self::with_scheduler(config, SchedulerKind::default())
    }

    pub fn with_scheduler(config: KernelConfig, kind: SchedulerKind) -> Self {
        let ram = Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new(
            "ram",
            config.page_size,
            config.ram_frames,
        ))));
        let swap = Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new(
            "swap",
            config.page_size,
            config.swap_frames,
        ))));
        let scheduler: Box<dyn Scheduler> = match kind {
            SchedulerKind::Mlq => Box::new(MlqScheduler::new(
                config.max_prio as usize,
                config.max_queue_size as usize,
            )),
            SchedulerKind::Simple => Box::new(SimpleScheduler::new(config.max_queue_size as usize)),
        };
        info!(
            "kernel online: page_size={} ram_frames={} swap_frames={} max_prio={}",
            config.page_size, config.ram_frames, config.swap_frames, config.max_prio
        );
        Self {
            config,
            ram,
            swap,
            scheduler,
            processes: Mutex::new(Vec::new()),
            next_pid: Mutex::new(1),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Spawn a process with the given program path and priority, registered
    /// with the ready scheduler.
    pub fn spawn(&self, path: impl Into<String>, priority: u32) -> Arc<Pcb> {
        let mut next_pid = self.next_pid.lock().unwrap();
        let pid = *next_pid;
        *next_pid += 1;
        drop(next_pid);

        let path = path.into();
        let pcb = Arc::new(Pcb::new(
            pid,
            path.clone(),
            priority,
            self.config,
            Arc::clone(&self.ram),
            Arc::clone(&self.swap),
        ));
        info!("spawned pid={pid} path={path} priority={priority}");
        self.processes.lock().unwrap().push(Arc::clone(&pcb));
        self.scheduler.add_proc(Arc::clone(&pcb));
        pcb
    }

    pub fn dispatch(&self) -> Option<Arc<Pcb>> {
        let pcb = self.scheduler.get_proc()?;
        self.scheduler.mark_running(Arc::clone(&pcb));
        Some(pcb)
    }

    pub fn preempt(&self, pcb: Arc<Pcb>) {
        self.scheduler.put_proc(pcb);
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    /// `sys_killall`: terminate every process matching the name read out of
    /// `caller`'s memory region `memrg`.
    pub fn killall(&self, caller: &Pcb, memrg: usize) -> i32 {
        let count = killall::killall(caller, self.scheduler.as_ref(), memrg);
        if count < 0 {
            warn!("killall against region {memrg} failed to read a process name");
        }
        count
    }

    /// Same as [`Kernel::killall`] but returns the full outcome (process
    /// name plus each victim's pid and path) for callers that need to print
    /// the stdout contract of §6, such as the demo binary.
    pub fn killall_report(&self, caller: &Pcb, memrg: usize) -> Result<KillallOutcome, ()> {
        killall::killall_report(caller, self.scheduler.as_ref(), memrg)
    }

    /// Number of processes ever spawned on this kernel; the registry is
    /// advisory bookkeeping for the demo binary, not a liveness tracker —
    /// queue membership is the source of truth for dispatch and kill.
    pub fn process_count(&self) -> usize {
        self.processes.lock().unwrap().len()
    }
}
