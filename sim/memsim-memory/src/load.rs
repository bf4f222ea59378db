//! Image bring-up from a dump file or a textual description file.
//!
//! The description format, one whitespace-separated token stream:
//!
//! ```text
//! <total size in bytes>
//! <PGD page file>
//! <N = number of translation pages>
//! <0x-offset> <page file>     (N times)
//! <0x-vaddr>  <page file>     (any number of times)
//! ```
//!
//! Translation pages land at their explicit physical offset; data pages
//! land at the physical page the directories loaded so far map their
//! virtual address to. Page file names resolve relative to the description
//! file's directory.

use crate::image::Memory;
use log::{debug, info};
use memsim_addresses::VirtAddr;
use memsim_types::{Error, PAGE_SIZE, Result};
use memsim_vmem::page_walk;
use std::fs;
use std::path::Path;

impl Memory {
    /// Seed the whole image verbatim from a binary dump file.
    ///
    /// ### Errors
    /// [`Error::Io`] when the file cannot be read.
    pub fn from_dump_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        info!("memory image: {} bytes from dump {}", bytes.len(), path.display());
        Ok(Self::from_bytes(bytes))
    }

    /// Build the image from a textual description file.
    ///
    /// ### Errors
    /// - [`Error::Io`] when the description or a page file cannot be read.
    /// - [`Error::BadParameter`] for malformed numbers, page files that are
    ///   not exactly 4 KiB, or unaligned physical offsets.
    /// - [`Error::EndOfFile`] when the description ends mid-record.
    /// - Any page-walk error for a data page whose virtual address is not
    ///   mapped by the directories loaded before it.
    pub fn from_description_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tokens = text.split_whitespace();
        let mut next = move || tokens.next().ok_or(Error::EndOfFile);

        let total = parse_number(next()?)?;
        let mut mem = Self::zeroed(total)?;

        let pgd = read_page_file(dir, next()?)?;
        mem.place(0, &pgd)?;

        let translation_pages = parse_number(next()?)?;
        for _ in 0..translation_pages {
            let offset = parse_hex_u32(next()?)?;
            if offset as usize % PAGE_SIZE != 0 {
                return Err(Error::BadParameter);
            }
            let name = next()?;
            let page = read_page_file(dir, name)?;
            debug!("translation page {name} at 0x{offset:08X}");
            mem.place(offset as usize, &page)?;
        }

        let mut data_pages = 0usize;
        while let Ok(token) = next() {
            let vaddr = VirtAddr::from_u64(parse_hex_u64(token)?);
            let name = next()?;
            let page = read_page_file(dir, name)?;
            let paddr = page_walk(mem.as_bytes(), vaddr)?;
            debug!("data page {name} at {vaddr:?} -> {paddr:?}");
            mem.place(paddr.page_base() as usize, &page)?;
            data_pages += 1;
        }

        info!(
            "memory image: {total} bytes, {translation_pages} translation pages, {data_pages} data pages from {}",
            path.display()
        );
        Ok(mem)
    }
}

/// Read one page file and check it holds exactly one 4 KiB page.
fn read_page_file(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let bytes = fs::read(dir.join(name))?;
    if bytes.len() != PAGE_SIZE {
        return Err(Error::BadParameter);
    }
    Ok(bytes)
}

/// Parse a byte count, decimal or `0x`-prefixed hexadecimal.
fn parse_number(token: &str) -> Result<usize> {
    match token.strip_prefix("0x") {
        Some(hex) => Ok(usize::from_str_radix(hex, 16)?),
        None => Ok(token.parse()?),
    }
}

/// Parse a hexadecimal value with optional `0x` prefix.
fn parse_hex_u32(token: &str) -> Result<u32> {
    Ok(u32::from_str_radix(token.strip_prefix("0x").unwrap_or(token), 16)?)
}

fn parse_hex_u64(token: &str) -> Result<u64> {
    Ok(u64::from_str_radix(token.strip_prefix("0x").unwrap_or(token), 16)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsim_types::WORD_BYTES;
    use std::io::Write;

    /// Lay out the standard test image in `dir`:
    /// PGD at 0, PUD at 0x1000, PMD at 0x2000, PTE at 0x3000;
    /// virtual 0x1000 -> physical page 0x10, virtual 0x2000 -> 0x11.
    fn write_description(dir: &Path) -> std::path::PathBuf {
        let mut pgd = vec![0u8; PAGE_SIZE];
        let mut pud = vec![0u8; PAGE_SIZE];
        let mut pmd = vec![0u8; PAGE_SIZE];
        let mut pte = vec![0u8; PAGE_SIZE];
        put_entry(&mut pgd, 0, 0x1000);
        put_entry(&mut pud, 0, 0x2000);
        put_entry(&mut pmd, 0, 0x3000);
        put_entry(&mut pte, 1, 0x10000);
        put_entry(&mut pte, 2, 0x11000);

        fs::write(dir.join("pgd.bin"), &pgd).unwrap();
        fs::write(dir.join("pud.bin"), &pud).unwrap();
        fs::write(dir.join("pmd.bin"), &pmd).unwrap();
        fs::write(dir.join("pte.bin"), &pte).unwrap();
        fs::write(dir.join("data1.bin"), page_filled(0xA1)).unwrap();
        fs::write(dir.join("data2.bin"), page_filled(0xB2)).unwrap();

        let master = dir.join("memory.txt");
        let mut f = fs::File::create(&master).unwrap();
        writeln!(f, "1048576").unwrap();
        writeln!(f, "pgd.bin").unwrap();
        writeln!(f, "3").unwrap();
        writeln!(f, "0x1000 pud.bin").unwrap();
        writeln!(f, "0x2000 pmd.bin").unwrap();
        writeln!(f, "0x3000 pte.bin").unwrap();
        writeln!(f, "0x0000000000001000 data1.bin").unwrap();
        writeln!(f, "0x0000000000002000 data2.bin").unwrap();
        master
    }

    fn put_entry(page: &mut [u8], index: usize, value: u32) {
        page[index * WORD_BYTES..(index + 1) * WORD_BYTES].copy_from_slice(&value.to_le_bytes());
    }

    fn page_filled(byte: u8) -> Vec<u8> {
        vec![byte; PAGE_SIZE]
    }

    #[test]
    fn description_places_pages_where_the_walk_says() {
        let dir = tempfile::tempdir().unwrap();
        let master = write_description(dir.path());
        let mem = Memory::from_description_file(&master).unwrap();

        assert_eq!(mem.len(), 1 << 20);
        // Directories landed at their offsets.
        assert_eq!(mem.read_word(0).unwrap(), 0x1000);
        assert_eq!(mem.read_word(0x1000).unwrap(), 0x2000);
        // Data pages landed where the walk maps their virtual address.
        let pa = page_walk(mem.as_bytes(), VirtAddr::from_u64(0x1000)).unwrap();
        assert_eq!(pa.page_base(), 0x10000);
        assert_eq!(mem.read_byte(0x10000).unwrap(), 0xA1);
        assert_eq!(mem.read_byte(0x10FFF).unwrap(), 0xA1);
        let pa = page_walk(mem.as_bytes(), VirtAddr::from_u64(0x2000)).unwrap();
        assert_eq!(pa.page_base(), 0x11000);
        assert_eq!(mem.read_byte(0x11000).unwrap(), 0xB2);
    }

    #[test]
    fn dump_mode_reads_the_file_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mem.bin");
        fs::write(&path, [1u8, 2, 3, 4, 5]).unwrap();
        let mem = Memory::from_dump_file(&path).unwrap();
        assert_eq!(mem.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_files_surface_io() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Memory::from_dump_file(dir.path().join("nope.bin")),
            Err(Error::Io)
        );
        assert_eq!(
            Memory::from_description_file(dir.path().join("nope.txt")),
            Err(Error::Io)
        );
    }

    #[test]
    fn wrong_sized_page_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pgd.bin"), vec![0u8; PAGE_SIZE - 1]).unwrap();
        let master = dir.path().join("memory.txt");
        fs::write(&master, "4096\npgd.bin\n0\n").unwrap();
        assert_eq!(
            Memory::from_description_file(&master),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn unaligned_translation_offset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pgd.bin"), vec![0u8; PAGE_SIZE]).unwrap();
        fs::write(dir.path().join("pud.bin"), vec![0u8; PAGE_SIZE]).unwrap();
        let master = dir.path().join("memory.txt");
        fs::write(&master, "65536\npgd.bin\n1\n0x1004 pud.bin\n").unwrap();
        assert_eq!(
            Memory::from_description_file(&master),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn truncated_description_surfaces_end_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("memory.txt");
        fs::write(&master, "4096\n").unwrap();
        assert_eq!(
            Memory::from_description_file(&master),
            Err(Error::EndOfFile)
        );
    }
}
