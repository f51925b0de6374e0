use std::sync::Arc;

use crate::process::Pcb;

/// Bounded array queue of PCB references (component 9). Dequeue picks the
/// numerically smallest `priority` (highest priority); ties break on
/// insertion order, mirroring the source's linear scan + shift-down.
pub struct ProcessQueue {
    procs: Vec<Arc<Pcb>>,
    capacity: usize,
}

impl ProcessQueue {
    pub fn new(capacity: usize) -> Self {
        Self { procs: Vec::with_capacity(capacity), capacity }
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn enqueue(&mut self, pcb: Arc<Pcb>) -> bool {
        if self.procs.len() >= self.capacity {
            return false;
        }
        self.procs.push(pcb);
        true
    }

    /// Pop the process with the numerically smallest priority; among equal
    /// priorities, the earliest-enqueued wins, and insertion order of the
    /// remaining processes is preserved.
    pub fn dequeue(&mut self) -> Option<Arc<Pcb>> {
        if self.procs.is_empty() {
            return None;
        }
        let best_idx = self
            .procs
            .iter()
            .enumerate()
            .min_by_key(|(idx, p)| (p.priority, *idx))
            .map(|(idx, _)| idx)?;
        Some(self.procs.remove(best_idx))
    }

    /// Drain every entry matching `predicate`, returning them while leaving
    /// the rest in their original relative order.
    pub fn drain_matching(&mut self, mut predicate: impl FnMut(&Pcb) -> bool) -> Vec<Arc<Pcb>> {
        let mut matched = Vec::new();
        self.procs.retain(|pcb| {
            if predicate(pcb) {
                matched.push(Arc::clone(pcb));
                false
            } else {
                true
            }
        });
        matched
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Pcb>> {
        self.procs.iter()
    }
}
