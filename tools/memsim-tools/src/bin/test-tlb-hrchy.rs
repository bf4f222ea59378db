//! Drive the hierarchical TLB (L1-I/L1-D over L2) over a command file,
//! dumping all three tables after every program line.

use clap::Parser;
use memsim_commands::Program;
use memsim_memory::Memory;
use memsim_tlb::hierarchy::TlbHierarchy;
use memsim_tools::{
    EXIT_OUTPUT, create_output_or_exit, init_logging, load_memory_or_exit, parse_or_usage,
    read_program_or_exit,
};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;

const RULE: &str = "-------------------------------------------------------------------";

#[derive(Parser)]
#[command(about = "Replay a command file against the hierarchical TLB")]
struct Args {
    /// Command file (text) to read from.
    commands: PathBuf,
    /// Memory dump file (binary) to load.
    memory: PathBuf,
    /// File to write the per-line state dumps to.
    output: PathBuf,
    /// Raise the log level (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args: Args = parse_or_usage();
    init_logging(args.verbose);

    let program = read_program_or_exit(&args.commands);
    let out = create_output_or_exit(&args.output);
    let mem = load_memory_or_exit(&args.memory, false);

    if let Err(err) = run(&program, &mem, &mut BufWriter::new(out)) {
        eprintln!("Cannot write output: {err}");
        exit(EXIT_OUTPUT);
    }
}

fn run(program: &Program, mem: &Memory, out: &mut impl Write) -> io::Result<()> {
    let mut tlbs = TlbHierarchy::new();

    for (line_index, command) in program.iter().enumerate() {
        writeln!(out, "{RULE}")?;
        writeln!(out, "After program line {line_index}...\n")?;
        write!(out, "VA = {}", command.vaddr)?;
        match tlbs.translate(mem, command.vaddr, command.access) {
            Ok(translation) => {
                writeln!(out, "; PA  = {}\n", translation.paddr)?;
                writeln!(out, "{}\n", if translation.hit { "HIT..." } else { "MISS..." })?;
                writeln!(out, "L1 ITLB:")?;
                tlbs.itlb.dump(out).map_err(io::Error::other)?;
                writeln!(out, "\nL1 DTLB:")?;
                tlbs.dtlb.dump(out).map_err(io::Error::other)?;
                writeln!(out, "\nL2 TLB:")?;
                tlbs.l2.dump(out).map_err(io::Error::other)?;
            }
            Err(err) => writeln!(out, "\nerror with tlb_search(): {err}")?,
        }
        writeln!(out, "{RULE}")?;
    }
    out.flush()
}
