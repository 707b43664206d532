//! DATANET-355 Emulator - CLI Entry Point
//!
//! Commands:
//! - `dn355-emu run <image>` - Load an octal image and execute it
//! - `dn355-emu disasm <image>` - Disassemble an octal image

use clap::{Parser, Subcommand};
use dn355::cpu::{decode, Cpu, CpuError, CpuState};
use dn355::loader;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dn355-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the DATANET-355/6600 front-end processor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an image until it stops or faults
    Run {
        /// Path to the octal image file
        image: String,
        /// Load origin (octal word address)
        #[arg(short, long, default_value = "100", value_parser = parse_octal15)]
        origin: u32,
        /// Start address (octal; defaults to the origin)
        #[arg(short, long, value_parser = parse_octal15)]
        start: Option<u32>,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Per-instruction delay in microseconds
        #[arg(long, default_value = "0")]
        delay_us: u64,
        /// Show a per-instruction trace
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state as JSON
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Disassemble an image to readable text
    Disasm {
        /// Path to the octal image file
        image: String,
        /// Load origin (octal word address)
        #[arg(short, long, default_value = "100", value_parser = parse_octal15)]
        origin: u32,
    },
}

fn parse_octal15(s: &str) -> Result<u32, String> {
    let v = u32::from_str_radix(s, 8).map_err(|e| e.to_string())?;
    if v > 0o77777 {
        return Err(format!("{v:#o} exceeds 15 bits"));
    }
    Ok(v)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Run { image, origin, start, max_cycles, delay_us, trace, snapshot } => {
            run_image(&image, origin, start.unwrap_or(origin), max_cycles, delay_us, trace, snapshot);
        }
        Commands::Disasm { image, origin } => {
            disassemble_image(&image, origin);
        }
    }
}

fn run_image(
    path: &str,
    origin: u32,
    start: u32,
    max_cycles: u64,
    delay_us: u64,
    trace: bool,
    snapshot: Option<String>,
) {
    let image = match loader::load_image(path, origin) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };
    if image.is_empty() {
        eprintln!("No words to execute in {path}");
        std::process::exit(1);
    }
    println!("Loaded {} words from {path}", image.len());

    let mut cpu = Cpu::new();
    image.apply(&mut cpu.mem);
    cpu.regs.ic = start;

    let delay = Duration::from_micros(delay_us);
    while cpu.state == CpuState::Running && cpu.cycles < max_cycles {
        match cpu.step() {
            Ok(info) => {
                if trace {
                    println!(
                        "{:05o}: {:<16} A={:06o} Q={:06o} {:?}",
                        info.ic,
                        decode::disassemble(info.raw),
                        cpu.regs.a,
                        cpu.regs.q,
                        cpu.regs.ind
                    );
                }
            }
            Err(CpuError::Fault(f)) => {
                // Trap through the vector table; an unset trap word is a
                // dead stop (TRA-to-self is the conventional stop loop,
                // caught by the cycle bound).
                eprintln!("Fault at IC={:05o}: {f}", cpu.regs.ic);
                let vector = f.vector();
                if cpu.mem.read_word(vector.address()) == 0 {
                    eprintln!("No handler at {:05o}, stopping", vector.address());
                    break;
                }
                cpu.vector_fault(&f);
            }
            Err(e) => {
                eprintln!("CPU stopped at IC={:05o}: {e}", cpu.regs.ic);
                break;
            }
        }
        if delay_us > 0 {
            std::thread::sleep(delay);
        }
    }

    println!();
    println!("Cycles: {}", cpu.cycles);
    println!("State:  {:?}", cpu.state);
    println!("IC={:05o} A={:06o} Q={:06o} S={:02o} {:?}",
        cpu.regs.ic, cpu.regs.a, cpu.regs.q, cpu.regs.s, cpu.regs.ind);
    for n in 1..=3 {
        println!("X{n}={:06o}", cpu.regs.x(n));
    }
    if cpu.cycles >= max_cycles {
        println!("Reached max cycles limit ({max_cycles}). Use --max-cycles to increase.");
    }

    if let Some(out) = snapshot {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&out, json) {
                    eprintln!("Failed to write snapshot {out}: {e}");
                    std::process::exit(1);
                }
                println!("Snapshot written to {out}");
            }
            Err(e) => {
                eprintln!("Failed to serialize snapshot: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn disassemble_image(path: &str, origin: u32) {
    let image = match loader::load_image(path, origin) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };
    for (addr, word) in &image.entries {
        println!("{addr:05o}: {word:06o}  {}", decode::disassemble(*word));
    }
}
