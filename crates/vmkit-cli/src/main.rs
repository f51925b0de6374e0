use std::error::Error;

use clap::{Parser, Subcommand};
use vmkit_kernel::{Kernel, KernelConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bytes per page.
    #[arg(long, default_value_t = 256, global = true)]
    page_size: u32,

    /// Frames available in the shared RAM device.
    #[arg(long, default_value_t = 8, global = true)]
    ram_frames: u32,

    /// Frames available in the shared swap device.
    #[arg(long, default_value_t = 64, global = true)]
    swap_frames: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn two demo processes under the MLQ scheduler and drive them
    /// through alloc/write/read/free and a kill-by-name call.
    Demo,
}

fn kernel_config(cli: &Cli) -> KernelConfig {
    KernelConfig {
        page_size: cli.page_size,
        ram_frames: cli.ram_frames,
        swap_frames: cli.swap_frames,
        ..KernelConfig::default()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => run_demo(kernel_config(&cli)),
    }

    Ok(())
}

fn run_demo(config: KernelConfig) {
    let kernel = Kernel::new(config);

    let alice = kernel.spawn("alice.bin", 0);
    let bob = kernel.spawn("bob.bin", 1);

    if let Ok(addr) = alice.alloc(300, 0) {
        println!("PID={} - Region=0 - Address={addr:08} - Size=300 byte", alice.pid);
    }

    if alice.write(0x41, 0, 0).is_ok() {
        println!("write region=0 offset=0 value=65");
    }
    if let Ok(value) = alice.read(0, 0) {
        println!("read region=0 offset=0 value={value}");
    }

    if alice.free(0).is_ok() {
        println!("PID={} - Region=0", alice.pid);
    }

    if let Ok(addr) = bob.alloc(64, 0) {
        println!("PID={} - Region=0 - Address={addr:08} - Size=64 byte", bob.pid);
    }

    // bob looks up its own name by region, to drive killall against itself.
    bob.alloc(16, 1).ok();
    for (i, b) in b"bob.bin".iter().enumerate() {
        bob.write(*b, 1, i as u32).ok();
    }
    bob.write(0, 1, 7).ok();

    match kernel.killall_report(&bob, 1) {
        Ok(outcome) => {
            println!(
                "The procname retrieved from memregionid {} is \"{}\"",
                1, outcome.proc_name
            );
            for (pid, name) in &outcome.terminated {
                println!("Terminating ... pid={pid}, name={name}");
            }
            println!(
                "Total {} processes named \"{}\" terminated",
                outcome.terminated.len(),
                outcome.proc_name
            );
        }
        Err(()) => eprintln!("killall: could not read process name"),
    }
}
