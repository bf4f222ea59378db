//! Drive the cache hierarchy over a command file, translating every
//! virtual address with the page walker and dumping all three caches
//! after each program line.

use clap::Parser;
use memsim_cache::CacheHierarchy;
use memsim_commands::{Command, DataSize, Order, Program};
use memsim_memory::Memory;
use memsim_tools::{
    EXIT_OUTPUT, create_output_or_exit, init_logging, load_memory_or_exit, parse_or_usage,
    read_program_or_exit,
};
use memsim_vmem::page_walk;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;

const RULE: &str = "-------------------------------------------------------------------";

#[derive(Parser)]
#[command(about = "Replay a command file against the two-level cache hierarchy")]
struct Args {
    /// Command file (text) to read from.
    commands: PathBuf,
    /// Memory image to load: a binary dump, or a description file with --desc.
    memory: PathBuf,
    /// File to write the per-line state dumps to.
    output: PathBuf,
    /// Treat the memory file as a description file instead of a dump.
    #[arg(long)]
    desc: bool,
    /// Raise the log level (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args: Args = parse_or_usage();
    init_logging(args.verbose);

    let program = read_program_or_exit(&args.commands);
    let out = create_output_or_exit(&args.output);
    let mem = load_memory_or_exit(&args.memory, args.desc);

    if let Err(err) = run(&program, mem, &mut BufWriter::new(out)) {
        eprintln!("Cannot write output: {err}");
        exit(EXIT_OUTPUT);
    }
}

fn run(program: &Program, mut mem: Memory, out: &mut impl Write) -> io::Result<()> {
    let mut caches = CacheHierarchy::new();

    for (line_index, command) in program.iter().enumerate() {
        writeln!(out, "{RULE}")?;
        writeln!(out, "After program line {line_index}: {command}\n")?;
        match execute(&mut caches, &mut mem, command) {
            Ok(report) => {
                writeln!(out, "{report}\n")?;
                writeln!(out, "L1 ICACHE:")?;
                caches.l1i.dump(out).map_err(io::Error::other)?;
                writeln!(out, "\nL1 DCACHE:")?;
                caches.l1d.dump(out).map_err(io::Error::other)?;
                writeln!(out, "\nL2 CACHE:")?;
                caches.l2.dump(out).map_err(io::Error::other)?;
            }
            Err(err) => writeln!(out, "error: {err}")?,
        }
        writeln!(out, "{RULE}")?;
    }
    out.flush()
}

/// Translate and perform one command, describing the outcome.
fn execute(
    caches: &mut CacheHierarchy,
    mem: &mut Memory,
    command: &Command,
) -> memsim_types::Result<String> {
    let paddr = page_walk(mem.as_bytes(), command.vaddr)?;
    let report = match (command.order, command.data_size) {
        (Order::Read, DataSize::Word) => {
            let word = caches.read_word(mem, command.access, paddr)?;
            format!("VA = {}; PA = {paddr}; read word = 0x{word:08X}", command.vaddr)
        }
        (Order::Read, DataSize::Byte) => {
            let byte = caches.read_byte(mem, command.access, paddr)?;
            format!("VA = {}; PA = {paddr}; read byte = 0x{byte:02X}", command.vaddr)
        }
        (Order::Write, DataSize::Word) => {
            caches.write_word(mem, paddr, command.write_data)?;
            format!(
                "VA = {}; PA = {paddr}; wrote word 0x{:08X}",
                command.vaddr, command.write_data
            )
        }
        (Order::Write, DataSize::Byte) => {
            caches.write_byte(mem, paddr, command.write_data as u8)?;
            format!(
                "VA = {}; PA = {paddr}; wrote byte 0x{:02X}",
                command.vaddr, command.write_data
            )
        }
    };
    Ok(report)
}
