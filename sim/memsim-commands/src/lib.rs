//! # Processor Command Stream
//!
//! The textual command format the drivers feed the simulator with, one
//! command per line, whitespace tolerant:
//!
//! ```text
//! <R|W> <I|DB|DW> [0x<hex value>] @0x<hex vaddr>
//! ```
//!
//! - `I` commands are read-only instruction fetches: no size letter, no
//!   data token.
//! - `DW` is a 32-bit data word access, `DB` an 8-bit data byte access.
//! - `W` carries a data token of at most 8 hex digits for a word and at
//!   most 2 for a byte.
//! - The address is up to 16 hex digits (64 bits) behind `@0x`.
//!
//! ```rust
//! # use memsim_commands::*;
//! let cmd: Command = "W DB 0xAB @0x0000000000002001".parse().unwrap();
//! assert_eq!(cmd.write_data, 0xAB);
//! assert_eq!(cmd.to_string(), "W DB 0xAB @0x0000000000002001");
//! ```
//!
//! [`Program`] is the container a whole command file parses into.

mod command;
mod program;

pub use command::{Command, DataSize, Order};
pub use program::Program;
