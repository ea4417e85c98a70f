//! Architectural machine-state primitives.

/// Register file types and storage model.
pub mod registers;
/// Host-observable execution state machine.
pub mod run_state;

pub use registers::{
    MachineState, Register, MICRO_PC_RESET, PS_C, PS_EI, PS_MASK, PS_N, PS_RESET, PS_V, PS_W, PS_Z,
    REGISTER_COUNT,
};
pub use run_state::RunState;
