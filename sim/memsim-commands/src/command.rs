use core::fmt;
use core::str::FromStr;
use memsim_addresses::VirtAddr;
use memsim_types::{Access, Error, Result, Word};

/// Whether a command reads or writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Order {
    Read,
    Write,
}

/// Width of the accessed datum.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataSize {
    /// 8 bits.
    Byte,
    /// 32 bits.
    Word,
}

/// One simulated processor command.
///
/// Instruction fetches are always word-sized reads with `write_data` zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Command {
    pub order: Order,
    pub access: Access,
    pub data_size: DataSize,
    /// Value carried by a write; zero for reads.
    pub write_data: Word,
    pub vaddr: VirtAddr,
}

impl Command {
    /// Parse the `I`/`DB`/`DW` access token.
    fn parse_kind(token: &str) -> Result<(Access, DataSize)> {
        match token {
            "I" => Ok((Access::Instruction, DataSize::Word)),
            "DB" => Ok((Access::Data, DataSize::Byte)),
            "DW" => Ok((Access::Data, DataSize::Word)),
            _ => Err(Error::BadParameter),
        }
    }

    /// Parse a `0x…` write-data token, enforcing the per-size width.
    fn parse_data(token: &str, size: DataSize) -> Result<Word> {
        let hex = token.strip_prefix("0x").ok_or(Error::BadParameter)?;
        let max_digits = match size {
            DataSize::Byte => 2,
            DataSize::Word => 8,
        };
        if hex.is_empty() || hex.len() > max_digits {
            return Err(Error::BadParameter);
        }
        Ok(Word::from_str_radix(hex, 16)?)
    }

    /// Parse an `@0x…` address token of up to 16 hex digits.
    fn parse_vaddr(token: &str) -> Result<VirtAddr> {
        let hex = token.strip_prefix("@0x").ok_or(Error::BadParameter)?;
        if hex.is_empty() || hex.len() > 16 {
            return Err(Error::BadParameter);
        }
        Ok(VirtAddr::from_u64(u64::from_str_radix(hex, 16)?))
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = s.split_whitespace();
        let order = match tokens.next().ok_or(Error::BadParameter)? {
            "R" => Order::Read,
            "W" => Order::Write,
            _ => return Err(Error::BadParameter),
        };
        let (access, data_size) = Self::parse_kind(tokens.next().ok_or(Error::BadParameter)?)?;

        // Instructions may not be writes.
        if order == Order::Write && access == Access::Instruction {
            return Err(Error::BadParameter);
        }

        let write_data = if order == Order::Write {
            Self::parse_data(tokens.next().ok_or(Error::BadParameter)?, data_size)?
        } else {
            0
        };
        let vaddr = Self::parse_vaddr(tokens.next().ok_or(Error::BadParameter)?)?;

        if tokens.next().is_some() {
            return Err(Error::BadParameter);
        }

        Ok(Self {
            order,
            access,
            data_size,
            write_data,
            vaddr,
        })
    }
}

impl fmt::Display for Command {
    /// The canonical form of the command grammar.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            Order::Read => 'R',
            Order::Write => 'W',
        };
        let kind = match (self.access, self.data_size) {
            (Access::Instruction, _) => "I",
            (Access::Data, DataSize::Byte) => "DB",
            (Access::Data, DataSize::Word) => "DW",
        };
        write!(f, "{order} {kind}")?;
        if self.order == Order::Write {
            match self.data_size {
                DataSize::Byte => write!(f, " 0x{:02X}", self.write_data)?,
                DataSize::Word => write!(f, " 0x{:08X}", self.write_data)?,
            }
        }
        write!(f, " @0x{:016X}", self.vaddr.as_u64())
    }
}
