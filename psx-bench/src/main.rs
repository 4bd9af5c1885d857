use clap::Parser;
use psx_core::config::PsxConfig;
use psx_core::exe::Exe;
use psx_core::psx::Psx;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::Layer as _;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Runs a BIOS headless and reports the instruction rate.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// BIOS image (512 KiB)
    #[arg(long)]
    bios: PathBuf,

    /// PS-X EXE to sideload once the BIOS reaches the shell
    #[arg(long)]
    exe: Option<PathBuf>,

    /// Panic on unhandled bus accesses and unimplemented instructions
    #[arg(long)]
    strict: bool,

    /// Log BIOS A/B/C function calls
    #[arg(long)]
    trace_bios: bool,

    /// Stop after this many instructions
    #[arg(long)]
    instructions: Option<u64>,

    /// Log filter, e.g. `psx_core::cpu=trace,psx_core=warn`
    #[arg(long)]
    log: Option<Targets>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let targets = args.log.clone().unwrap_or_else(|| {
        let mut targets = Targets::new()
            .with_target("psx_core::tty", LevelFilter::INFO)
            .with_target("psx_core", LevelFilter::WARN);
        if args.trace_bios {
            targets = targets.with_target("psx_core::bios", LevelFilter::DEBUG);
        }
        targets
    });
    let fmt_layer = tracing_subscriber::fmt::layer().without_time().with_filter(targets);
    tracing_subscriber::registry().with(fmt_layer).init();

    let config = PsxConfig {
        strict_memory: args.strict,
        strict_instructions: args.strict,
        trace_bios_calls: args.trace_bios,
        ..Default::default()
    };

    let bios = std::fs::read(&args.bios)?;
    let mut psx = Psx::new(&bios, config)?;
    if let Some(path) = &args.exe {
        psx.sideload_exe(Exe::read(path)?)?;
    }

    let limit = args.instructions.unwrap_or(u64::MAX);
    let start_time = Instant::now();
    let mut last_report = Instant::now();

    while psx.steps < limit {
        psx.step();

        if last_report.elapsed().as_secs() >= 1 {
            let ips = psx.steps as f64 / start_time.elapsed().as_secs_f64();
            println!("Instructions executed: {}, MIPS: {:.2}", psx.steps, ips / 1_000_000.0);
            last_report = Instant::now();
        }
    }

    let elapsed = start_time.elapsed();
    println!(
        "Executed {} instructions in {:.2?} ({:.2} MIPS)",
        psx.steps,
        elapsed,
        psx.steps as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
    println!("{}", psx.cpu);

    Ok(())
}
