//! Cycle-accurate core of the bcomp machine: a 16-bit accumulator
//! architecture driven by a horizontally microprogrammed control unit.
//!
//! Every call to [`Machine::tick`] performs one rising clock edge: the
//! current microinstruction drives the input muxes, the ALU, the
//! commutator and the flags unit, all writes commit together from
//! pre-edge values, and the microPC advances or branches.

/// Combinational datapath: summator, ALU, commutator, flags.
pub mod datapath;
pub use datapath::{
    alu, commutate, compute_flags, full_adder, summator, AluOutput, CommutatorOutput, FlagsUpdate,
    Summation,
};

/// Main memory model.
pub mod memory;
pub use memory::{MainMemory, ADDRESS_MASK, MAIN_MEMORY_WORDS};

/// Microprogram representation and the preloaded ROM.
pub mod microcode;
pub use microcode::{
    BranchWord, DatapathControls, MicroOp, MicroRom, MicroWord, OperationalWord, RomError,
    WriteSet, INFETCH, MICROCODE, MICRO_ROM_WORDS,
};

/// Architectural machine state.
pub mod state;
pub use state::{
    MachineState, Register, RunState, MICRO_PC_RESET, PS_C, PS_EI, PS_MASK, PS_N, PS_RESET, PS_V,
    PS_W, PS_Z, REGISTER_COUNT,
};

/// The microsequencer: evaluate and commit one clock edge.
pub mod sequencer;
pub use sequencer::{commit, evaluate, BranchOutcome, MicroStep};

/// The machine facade and tick interface.
pub mod machine;
pub use machine::{CycleHooks, Machine, NullHooks, RunOutcome, TickEffects, TickOutcome};

/// Canonical per-instruction trace generation.
pub mod trace;
pub use trace::{InstructionTrace, InstructionTracer};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
