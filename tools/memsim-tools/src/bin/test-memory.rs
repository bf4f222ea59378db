//! Bring up a memory image and dump the virtual page behind each given
//! address.

use clap::{Parser, ValueEnum};
use memsim_addresses::VirtAddr;
use memsim_tools::{EXIT_OUTPUT, EXIT_USAGE, init_logging, load_memory_or_exit, parse_or_usage};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::exit;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    /// The file is a binary dump of the whole image.
    Dump,
    /// The file is a textual memory description.
    Desc,
}

#[derive(Parser)]
#[command(about = "Bring up a memory image and dump virtual pages from it")]
struct Args {
    /// How to interpret the memory file.
    #[arg(value_enum)]
    mode: Mode,
    /// The memory file to load.
    memory: PathBuf,
    /// Virtual addresses (hex, 0x optional) of the pages to dump.
    vaddrs: Vec<String>,
    /// Raise the log level (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args: Args = parse_or_usage();
    init_logging(args.verbose);

    let mem = load_memory_or_exit(&args.memory, matches!(args.mode, Mode::Desc));

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for raw in &args.vaddrs {
        let hex = raw.strip_prefix("0x").unwrap_or(raw);
        let Ok(addr) = u64::from_str_radix(hex, 16) else {
            eprintln!("Invalid virtual address \"{raw}\"");
            exit(EXIT_USAGE);
        };
        let vaddr = VirtAddr::from_u64(addr);

        if writeln!(out, "VA = 0x{addr:016X} ({vaddr})").is_err() {
            exit(EXIT_OUTPUT);
        }
        match mem.page_dump(&mut out, vaddr) {
            Ok(()) => {}
            Err(err) => {
                let _ = writeln!(out, "error: {err}");
            }
        }
    }
    if out.flush().is_err() {
        exit(EXIT_OUTPUT);
    }
}
