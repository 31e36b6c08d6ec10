use crate::memory::Word;
use std::io;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// the word at `pc` doesn't decode to anything we can run; PC is left
    /// pointing at it
    #[error("invalid opcode 0x{word:04x} at 0x{pc:04x}")]
    InvalidOpcode { pc: Word, word: Word },
    /// the display rejected a forwarded store (the store itself still happened)
    #[error("display error: {0}")]
    Display(#[source] io::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
