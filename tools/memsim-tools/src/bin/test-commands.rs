//! Parse a command file and print it back in canonical form.

use clap::Parser;
use memsim_tools::{EXIT_OUTPUT, init_logging, parse_or_usage, read_program_or_exit};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[command(about = "Parse a command file and print it back")]
struct Args {
    /// Command file (text) to read from.
    commands: PathBuf,
    /// Raise the log level (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args: Args = parse_or_usage();
    init_logging(args.verbose);

    let program = read_program_or_exit(&args.commands);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if program.print(&mut out).is_err() {
        exit(EXIT_OUTPUT);
    }
}
