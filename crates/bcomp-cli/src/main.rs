//! CLI entry point for the bcomp runner binary.
//!
//! Loads a memory image, points IP at the entry address, ticks the core
//! until HALT and prints the canonical per-instruction trace.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use bcomp_core::{InstructionTracer, Machine, NullHooks, Register, TickOutcome};

const HELP_TEXT: &str = "Usage: bcomp-run <image> [--ip <hex>] [--sp <hex>] [--max-ticks <n>] [--no-trace] [--help]

The image holds one memory cell per line: `<addr> <value>` as hex words,
with `;` starting a comment. Execution begins at --ip (default 0) and
stops at HALT or after --max-ticks ticks (default 1000000).";

const DEFAULT_MAX_TICKS: u64 = 1_000_000;

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    image: PathBuf,
    ip: u16,
    sp: Option<u16>,
    max_ticks: u64,
    trace: bool,
}

#[derive(Debug)]
enum ParseResult {
    Args(CliArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut image: Option<PathBuf> = None;
    let mut ip = 0u16;
    let mut sp = None;
    let mut max_ticks = DEFAULT_MAX_TICKS;
    let mut trace = true;

    while let Some(arg) = args.next() {
        if arg == "--help" {
            return Ok(ParseResult::Help);
        }

        if arg == "--no-trace" {
            trace = false;
            continue;
        }

        if arg == "--ip" || arg == "--sp" || arg == "--max-ticks" {
            let value = args
                .next()
                .ok_or_else(|| format!("missing value for {}", arg.to_string_lossy()))?;
            let value = value.to_string_lossy();
            if arg == "--max-ticks" {
                max_ticks = value
                    .parse()
                    .map_err(|_| format!("invalid tick count: {value}"))?;
            } else {
                let parsed = u16::from_str_radix(value.trim_start_matches("0x"), 16)
                    .map_err(|_| format!("invalid hex address: {value}"))?;
                if arg == "--ip" {
                    ip = parsed;
                } else {
                    sp = Some(parsed);
                }
            }
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if image.is_some() {
            return Err(String::from("multiple image paths provided"));
        }
        image = Some(PathBuf::from(arg));
    }

    let image = image.ok_or_else(|| String::from("missing image path"))?;
    Ok(ParseResult::Args(CliArgs {
        image,
        ip,
        sp,
        max_ticks,
        trace,
    }))
}

/// Parses a memory image: one `<addr> <value>` hex pair per line,
/// comments starting with `;`.
fn parse_image(source: &str) -> Result<Vec<(u16, u16)>, String> {
    let mut cells = Vec::new();
    for (number, line) in (1..).zip(source.lines()) {
        let cell = line.split(';').next().unwrap_or("").trim();
        if cell.is_empty() {
            continue;
        }
        let mut words = cell.split_whitespace();
        let (Some(addr), Some(value), None) = (words.next(), words.next(), words.next()) else {
            return Err(format!("line {number}: expected `<addr> <value>`"));
        };
        let addr = u16::from_str_radix(addr.trim_start_matches("0x"), 16)
            .map_err(|_| format!("line {number}: invalid address `{addr}`"))?;
        let value = u16::from_str_radix(value.trim_start_matches("0x"), 16)
            .map_err(|_| format!("line {number}: invalid value `{value}`"))?;
        cells.push((addr, value));
    }
    Ok(cells)
}

fn execute(args: &CliArgs) -> Result<(), String> {
    let source = fs::read_to_string(&args.image)
        .map_err(|error| format!("cannot read {}: {error}", args.image.display()))?;
    let cells = parse_image(&source)?;

    let mut machine = Machine::new();
    for (addr, value) in cells {
        machine.memory_mut().write(addr, value);
    }
    machine.set_entry(args.ip);
    if let Some(sp) = args.sp {
        machine.state_mut().set_sp(sp);
    }

    let mut tracer = InstructionTracer::new(&machine);
    let mut ticks = 0u64;
    let halted = loop {
        if ticks >= args.max_ticks {
            break false;
        }
        match machine.tick(&mut NullHooks) {
            TickOutcome::Halted => break true,
            TickOutcome::Running(effects) => {
                ticks += 1;
                if let Some(row) = tracer.observe(&machine, &effects) {
                    if args.trace {
                        println!("{row}");
                    }
                }
            }
        }
    };

    if !halted {
        return Err(format!("no HALT within {} ticks", args.max_ticks));
    }

    println!("halted after {ticks} ticks");
    let state = machine.state();
    let dump: Vec<String> = Register::ALL
        .iter()
        .map(|register| format!("{}={:04X}", register.name(), state.read(*register)))
        .collect();
    println!("{}", dump.join(" "));
    Ok(())
}

fn main() {
    match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{HELP_TEXT}");
        }
        Ok(ParseResult::Args(args)) => {
            if let Err(error) = execute(&args) {
                eprintln!("error: {error}");
                std::process::exit(1);
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{HELP_TEXT}");
            std::process::exit(1);
        }
    }
}
