//! Process dispatch (components 9-10).
//!
//! Two interchangeable schedulers sit behind one [`Scheduler`] trait, the
//! way the teacher crate keeps a pluggable scheduler trait with a default
//! impl behind it: [`MlqScheduler`] (the default) and [`SimpleScheduler`], a
//! single-ready-queue fallback grounded directly in the source's non-MLQ
//! `#else` branch of `sched.c`.
//!
//! Per the redesign note in §9, PCBs hold no back-pointers to the queues
//! they sit in; `killall` reaches every queue through
//! [`Scheduler::for_each_queue`] instead.

pub mod mlq;
pub mod queue;
pub mod simple;

use std::sync::Arc;

pub use mlq::MlqScheduler;
pub use queue::ProcessQueue;
pub use simple::SimpleScheduler;

use crate::process::Pcb;

/// A pluggable process dispatcher. All queue mutations are serialized by
/// whatever `queue_lock` equivalent the implementation holds internally.
pub trait Scheduler: Send + Sync {
    /// Enqueue a newly-ready process (`add_proc`).
    fn add_proc(&self, pcb: Arc<Pcb>);

    /// Return a preempted or just-dispatched process to the ready set
    /// (`put_proc`).
    fn put_proc(&self, pcb: Arc<Pcb>);

    /// Dispatch the next process to run (`get_proc`), or `None` if every
    /// ready queue is empty.
    fn get_proc(&self) -> Option<Arc<Pcb>>;

    /// `queue_empty`: true iff no process is ready anywhere.
    fn queue_empty(&self) -> bool;

    /// Record `pcb` as currently executing, for `killall` to find it even
    /// mid-dispatch.
    fn mark_running(&self, pcb: Arc<Pcb>);

    /// Apply `f` to every internal queue — every ready-queue level plus the
    /// running list — so a caller (namely `killall`) can drain and filter
    /// each one without needing queue back-pointers on the PCB.
    fn for_each_queue(&self, f: &mut dyn FnMut(&mut ProcessQueue));
}
