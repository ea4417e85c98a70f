//! The combinational datapath: summator, ALU, commutator and flags.
//!
//! Everything here is a pure function of the pre-edge state and the
//! current microinstruction; the sequencer owns all mutation.

/// 16-bit ALU with input inverters and carry injection.
pub mod alu;
/// Byte routing, sign extension and shifts.
pub mod commutator;
/// Conditional N/Z/V/C computation.
pub mod flags;
/// Bit adder and ripple-carry summator.
pub mod summator;

pub use alu::{alu, AluOutput};
pub use commutator::{commutate, CommutatorOutput};
pub use flags::{compute_flags, FlagsUpdate};
pub use summator::{full_adder, summator, Summation};
