use std::sync::{Arc, Mutex};

use crate::process::Pcb;

use super::{ProcessQueue, Scheduler};

struct State {
    levels: Vec<ProcessQueue>,
    slot: Vec<u32>,
    curr_prio: usize,
    curr_slot: u32,
}

/// Multi-level priority queue scheduler (component 10, default). `MAX_PRIO`
/// ready queues, a per-level time-slot budget `slot[p] = MAX_PRIO - p`, and a
/// rotating `curr_prio`/`curr_slot` cursor — one mutex serializes every
/// mutation, matching `queue_lock`.
pub struct MlqScheduler {
    state: Mutex<State>,
    running: Mutex<ProcessQueue>,
    max_prio: usize,
}

impl MlqScheduler {
    pub fn new(max_prio: usize, max_queue_size: usize) -> Self {
        let levels = (0..max_prio).map(|_| ProcessQueue::new(max_queue_size)).collect();
        let slot = (0..max_prio).map(|p| (max_prio - p) as u32).collect();
        Self {
            state: Mutex::new(State {
                levels,
                slot,
                curr_prio: 0,
                curr_slot: max_prio as u32,
            }),
            running: Mutex::new(ProcessQueue::new(max_queue_size)),
            max_prio,
        }
    }

    fn level_of(&self, priority: u32) -> usize {
        (priority as usize).min(self.max_prio.saturating_sub(1))
    }
}

impl Scheduler for MlqScheduler {
    fn add_proc(&self, pcb: Arc<Pcb>) {
        let mut state = self.state.lock().unwrap();
        let level = self.level_of(pcb.priority);
        state.levels[level].enqueue(pcb);
    }

    fn put_proc(&self, pcb: Arc<Pcb>) {
        self.add_proc(pcb);
    }

    fn get_proc(&self) -> Option<Arc<Pcb>> {
        let mut state = self.state.lock().unwrap();

        if state.levels.iter().all(ProcessQueue::is_empty) {
            return None;
        }

        if state.curr_slot > 0 && !state.levels[state.curr_prio].is_empty() {
            state.curr_slot -= 1;
            return state.levels[state.curr_prio].dequeue();
        }

        for offset in 1..self.max_prio {
            let p = (state.curr_prio + offset) % self.max_prio;
            if !state.levels[p].is_empty() {
                state.curr_prio = p;
                state.curr_slot = state.slot[p] - 1;
                return state.levels[p].dequeue();
            }
        }

        state.curr_prio = 0;
        state.curr_slot = state.slot[0].saturating_sub(1);
        state.levels[0].dequeue()
    }

    fn queue_empty(&self) -> bool {
        self.state.lock().unwrap().levels.iter().all(ProcessQueue::is_empty)
    }

    fn mark_running(&self, pcb: Arc<Pcb>) {
        self.running.lock().unwrap().enqueue(pcb);
    }

    fn for_each_queue(&self, f: &mut dyn FnMut(&mut ProcessQueue)) {
        let mut state = self.state.lock().unwrap();
        for level in &mut state.levels {
            f(level);
        }
        f(&mut self.running.lock().unwrap());
    }
}
