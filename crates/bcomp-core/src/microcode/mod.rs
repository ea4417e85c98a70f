//! Microprogram representation: control-bit positions, word decoding and
//! the preloaded ROM.

/// Named control-bit positions of the 40-bit microword.
pub mod bits;
/// The 256-cell microprogram ROM and its embedded table.
pub mod rom;
/// Microword decoding into named control fields.
pub mod word;

pub use rom::{MicroRom, RomError, INFETCH, MICROCODE, MICRO_ROM_WORDS};
pub use word::{BranchWord, DatapathControls, MicroOp, MicroWord, OperationalWord, WriteSet};
