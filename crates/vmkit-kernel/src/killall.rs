//! `sys_killall`: quiesce every process matching a name read out of a
//! caller's virtual memory, across every scheduler queue.

use log::{info, warn};

use crate::constants::MAX_PROC_NAME_LEN;
use crate::process::{Pcb, Pid};
use crate::scheduler::Scheduler;

/// Read a process name out of `caller`'s region `memrg`, one byte at a
/// time. Stops on NUL, on the sentinel `0xFFFFFFFF` (surfaced as 255 or -1
/// depending on how the caller widened it), on a read error, on a
/// non-ASCII-ish byte, or after `MAX_PROC_NAME_LEN` bytes.
fn read_proc_name(caller: &Pcb, memrg: usize) -> Result<String, ()> {
    let mut name = String::new();
    for offset in 0..MAX_PROC_NAME_LEN as u32 {
        let byte = match caller.read(memrg, offset) {
            Ok(b) => b,
            Err(_) => return Err(()),
        };
        // NUL, the 0xFFFFFFFF sentinel (255 as a byte), and anything
        // outside [1, 127] all terminate the name the same way.
        if byte == 0 || byte > 127 {
            return Ok(name);
        }
        name.push(byte as char);
    }
    Ok(name)
}

/// The name that was searched for and the victims actually terminated, in
/// termination order. The demo binary prints the stdout contract lines of
/// §6 straight off this; library callers that only want the count use
/// [`killall`].
pub struct KillallOutcome {
    pub proc_name: String,
    pub terminated: Vec<(Pid, String)>,
}

/// Terminate every process named `name` it can find across `scheduler`'s
/// queues and running list. `Err(())` means the name could not be read from
/// `caller`'s memory (the ABI-facing [`killall`] collapses this to `-1`).
pub fn killall_report(caller: &Pcb, scheduler: &dyn Scheduler, memrg: usize) -> Result<KillallOutcome, ()> {
    let proc_name = match read_proc_name(caller, memrg) {
        Ok(n) => n,
        Err(()) => {
            warn!("killall: failed to read process name from region {memrg}");
            return Err(());
        }
    };

    info!("killall: terminating processes named \"{proc_name}\"");

    let mut victims = Vec::new();
    scheduler.for_each_queue(&mut |queue| {
        let matched = queue.drain_matching(|pcb| pcb.path == proc_name);
        victims.extend(matched);
    });

    let mut terminated = Vec::with_capacity(victims.len());
    for victim in &victims {
        info!("killall: terminating pid={} name={}", victim.pid, victim.path);
        victim.free_all_regions();
        victim.teardown();
        terminated.push((victim.pid, victim.path.clone()));
    }

    Ok(KillallOutcome { proc_name, terminated })
}

/// ABI-facing wrapper over [`killall_report`]: the count terminated, or
/// `-1` on a name-read failure.
pub fn killall(caller: &Pcb, scheduler: &dyn Scheduler, memrg: usize) -> i32 {
    match killall_report(caller, scheduler, memrg) {
        Ok(outcome) => outcome.terminated.len() as i32,
        Err(()) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::KernelConfig;
    use crate::scheduler::MlqScheduler;
    use std::sync::Arc;
    use vmkit_vm::{PhysicalMemory, SimMemoryDevice};

    fn devices(cfg: &KernelConfig) -> (Arc<PhysicalMemory>, Arc<PhysicalMemory>) {
        (
            Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new("ram", cfg.page_size, cfg.ram_frames)))),
            Arc::new(PhysicalMemory::new(Box::new(SimMemoryDevice::new("swap", cfg.page_size, cfg.swap_frames)))),
        )
    }

    fn make_pcb(pid: u32, path: &str, priority: u32) -> Arc<Pcb> {
        let cfg = KernelConfig::default();
        let (ram, swap) = devices(&cfg);
        Arc::new(Pcb::new(pid, path, priority, cfg, ram, swap))
    }

    fn write_name(pcb: &Pcb, reg: usize, name: &str) {
        pcb.alloc(100, reg).unwrap();
        for (i, b) in name.bytes().enumerate() {
            pcb.write(b, reg, i as u32).unwrap();
        }
        pcb.write(0, reg, name.len() as u32).unwrap();
    }

    #[test]
    fn killall_terminates_matching_processes_across_levels_and_running() {
        let sched = MlqScheduler::new(3, 8);
        let caller = make_pcb(0, "caller", 0);
        write_name(&caller, 5, "P0");

        let victim_ready = make_pcb(1, "P0", 1);
        let survivor = make_pcb(2, "P1", 1);
        let victim_running = make_pcb(3, "P0", 2);

        sched.add_proc(Arc::clone(&victim_ready));
        sched.add_proc(Arc::clone(&survivor));
        sched.mark_running(Arc::clone(&victim_running));

        let count = killall(&caller, &sched, 5);
        assert_eq!(count, 2);

        // the survivor must still be dispatchable.
        let remaining = sched.get_proc().unwrap();
        assert_eq!(remaining.pid, survivor.pid);
    }

    #[test]
    fn killall_with_no_match_terminates_nothing() {
        let sched = MlqScheduler::new(3, 8);
        let caller = make_pcb(0, "caller", 0);
        write_name(&caller, 5, "Ghost");
        sched.add_proc(make_pcb(1, "P0", 0));
        assert_eq!(killall(&caller, &sched, 5), 0);
    }

    #[test]
    fn killall_path_read_failure_returns_negative_one() {
        let sched = MlqScheduler::new(3, 8);
        let caller = make_pcb(0, "caller", 0);
        // region 999 is out of the symbol table's range: the very first
        // byte read fails.
        assert_eq!(killall(&caller, &sched, 999), -1);
    }

    #[test]
    fn killall_victim_with_no_live_regions_is_still_terminated() {
        let sched = MlqScheduler::new(3, 8);
        let caller = make_pcb(0, "caller", 0);
        write_name(&caller, 5, "Empty");

        // never allocated anything: every register slot is 0.
        let victim = make_pcb(1, "Empty", 0);
        sched.add_proc(Arc::clone(&victim));

        assert_eq!(killall(&caller, &sched, 5), 1);
    }

    #[test]
    fn killall_caller_can_match_its_own_name() {
        let sched = MlqScheduler::new(3, 8);
        let caller = make_pcb(0, "Self", 0);
        write_name(&caller, 5, "Self");
        sched.mark_running(Arc::clone(&caller));

        assert_eq!(killall(&caller, &sched, 5), 1);
        // the caller's own region 5 was freed as part of its own teardown.
    }

    #[test]
    fn killall_multiple_matches_span_levels_and_running_list() {
        let sched = MlqScheduler::new(3, 8);
        let caller = make_pcb(0, "caller", 0);
        write_name(&caller, 5, "P0");

        sched.add_proc(make_pcb(1, "P0", 0));
        sched.add_proc(make_pcb(2, "P0", 1));
        sched.add_proc(make_pcb(3, "P1", 2));
        sched.mark_running(make_pcb(4, "P0", 0));

        assert_eq!(killall(&caller, &sched, 5), 3);
        // the lone survivor is still dispatchable.
        let remaining = sched.get_proc().unwrap();
        assert_eq!(remaining.path, "P1");
    }
}
