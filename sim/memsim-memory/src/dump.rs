//! Human-readable dump of one virtual page, word by word.

use crate::image::Memory;
use memsim_addresses::VirtAddr;
use memsim_types::{Error, PAGE_SIZE, Result, WORD_BYTES};
use memsim_vmem::page_walk;
use std::io::Write;

/// How to prefix each printed row of a page dump.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum AddrFmt {
    /// No address prefix.
    None,
    /// Physical byte offset from the start of the image, hexadecimal.
    #[default]
    Offset,
    /// Physical byte offset from the start of the image, decimal.
    OffsetU,
}

impl Memory {
    /// Print the page containing virtual address `from` as 32-bit words.
    ///
    /// `line_size` words per row, joined by `sep`, each row prefixed
    /// according to `show_addr`.
    ///
    /// ### Errors
    /// [`Error::BadParameter`] for a zero `line_size`, [`Error::Io`] on
    /// write failure, plus any page-walk error for `from`.
    pub fn page_dump_with_options(
        &self,
        out: &mut dyn Write,
        from: VirtAddr,
        show_addr: AddrFmt,
        line_size: usize,
        sep: &str,
    ) -> Result<()> {
        if line_size == 0 {
            return Err(Error::BadParameter);
        }

        let base = page_walk(self.as_bytes(), from.page_start())?.page_base();
        let words = PAGE_SIZE / WORD_BYTES;
        for row_start in (0..words).step_by(line_size) {
            let row_addr = base + (row_start * WORD_BYTES) as u32;
            match show_addr {
                AddrFmt::None => {}
                AddrFmt::Offset => write!(out, "0x{row_addr:08X}: ")?,
                AddrFmt::OffsetU => write!(out, "{row_addr:>10}: ")?,
            }
            for i in row_start..words.min(row_start + line_size) {
                if i > row_start {
                    write!(out, "{sep}")?;
                }
                let word = self.read_word(row_addr + ((i - row_start) * WORD_BYTES) as u32)?;
                write!(out, "{word:08X}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// [`Memory::page_dump_with_options`] with the conventional options:
    /// hexadecimal offsets, 16 words per row, single-space separator.
    ///
    /// ### Errors
    /// As [`Memory::page_dump_with_options`].
    pub fn page_dump(&self, out: &mut dyn Write, from: VirtAddr) -> Result<()> {
        self.page_dump_with_options(out, from, AddrFmt::Offset, 16, " ")
    }
}
