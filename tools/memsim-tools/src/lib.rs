//! Shared plumbing of the driver binaries: CLI parsing, logging setup,
//! and the conventional exit codes.
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | usage error |
//! | 2 | command file cannot be read |
//! | 3 | output file cannot be created |
//! | 4 | memory image cannot be brought up |

use clap::Parser;
use memsim_commands::Program;
use memsim_memory::Memory;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::path::Path;
use std::process::exit;

/// Usage error.
pub const EXIT_USAGE: i32 = 1;
/// The command file could not be read or parsed.
pub const EXIT_COMMANDS: i32 = 2;
/// The output file could not be created or written.
pub const EXIT_OUTPUT: i32 = 3;
/// The memory image could not be brought up.
pub const EXIT_MEMORY: i32 = 4;

/// Parse the command line, exiting with [`EXIT_USAGE`] on malformed input.
#[must_use]
pub fn parse_or_usage<T: Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        exit(EXIT_USAGE)
    })
}

/// Install the terminal logger; each `-v` raises the level one notch from
/// the default `warn`.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Read the command file, exiting with [`EXIT_COMMANDS`] on failure.
#[must_use]
pub fn read_program_or_exit(path: &Path) -> Program {
    Program::read_from_file(path).unwrap_or_else(|err| {
        eprintln!(
            "Cannot read commands from \"{}\": {err}",
            path.display()
        );
        exit(EXIT_COMMANDS)
    })
}

/// Create the output file, exiting with [`EXIT_OUTPUT`] on failure.
#[must_use]
pub fn create_output_or_exit(path: &Path) -> File {
    File::create(path).unwrap_or_else(|err| {
        eprintln!("Cannot open \"{}\" for writing: {err}", path.display());
        exit(EXIT_OUTPUT)
    })
}

/// Bring up the memory image, exiting with [`EXIT_MEMORY`] on failure.
#[must_use]
pub fn load_memory_or_exit(path: &Path, description: bool) -> Memory {
    let loaded = if description {
        Memory::from_description_file(path)
    } else {
        Memory::from_dump_file(path)
    };
    loaded.unwrap_or_else(|err| {
        eprintln!("Cannot read memory from \"{}\": {err}", path.display());
        exit(EXIT_MEMORY)
    })
}
