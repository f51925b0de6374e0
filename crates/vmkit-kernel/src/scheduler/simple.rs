use std::sync::{Arc, Mutex};

use crate::process::Pcb;

use super::{ProcessQueue, Scheduler};

/// A single ready queue plus a running list, selecting the
/// numerically-highest-priority process first and falling back to
/// insertion order — the non-`MLQ_SCHED` branch of `sched.c`.
pub struct SimpleScheduler {
    ready: Mutex<ProcessQueue>,
    running: Mutex<ProcessQueue>,
}

impl SimpleScheduler {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            ready: Mutex::new(ProcessQueue::new(max_queue_size)),
            running: Mutex::new(ProcessQueue::new(max_queue_size)),
        }
    }
}

impl Scheduler for SimpleScheduler {
    fn add_proc(&self, pcb: Arc<Pcb>) {
        self.ready.lock().unwrap().enqueue(pcb);
    }

    fn put_proc(&self, pcb: Arc<Pcb>) {
        self.ready.lock().unwrap().enqueue(pcb);
    }

    fn get_proc(&self) -> Option<Arc<Pcb>> {
        self.ready.lock().unwrap().dequeue()
    }

    fn queue_empty(&self) -> bool {
        self.ready.lock().unwrap().is_empty()
    }

    fn mark_running(&self, pcb: Arc<Pcb>) {
        self.running.lock().unwrap().enqueue(pcb);
    }

    fn for_each_queue(&self, f: &mut dyn FnMut(&mut ProcessQueue)) {
        f(&mut self.ready.lock().unwrap());
        f(&mut self.running.lock().unwrap());
    }
}
