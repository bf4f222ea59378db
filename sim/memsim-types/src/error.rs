//! The single flat error taxonomy shared by every simulator component.
//!
//! No error is recovered locally: every non-success return bubbles to the
//! caller via `?`. Null-equivalent inputs, out-of-range indices, misaligned
//! addresses and unknown kind tags all surface as [`Error::BadParameter`];
//! file-system failures as [`Error::Io`]; allocation failures as
//! [`Error::NotEnoughMemory`].

use core::num::ParseIntError;

/// Convenience alias used by all fallible simulator operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong in the simulator core.
///
/// The variants are deliberately fieldless and `Copy`: the drivers print the
/// textual message and abort the current command, nothing downstream ever
/// inspects a payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Not enough memory")]
    NotEnoughMemory,
    #[error("IO error")]
    Io,
    #[error("Bad parameter")]
    BadParameter,
    #[error("End of file")]
    EndOfFile,
    #[error("Wrong address")]
    WrongAddress,
    #[error("Wrong size")]
    WrongSize,
    #[error("Not found")]
    NotFound,
}

impl From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Self::Io
    }
}

impl From<ParseIntError> for Error {
    fn from(_: ParseIntError) -> Self {
        Self::BadParameter
    }
}
