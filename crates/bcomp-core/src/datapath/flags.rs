//! Conditional N/Z/V/C computation from the commutator output.

use super::commutator::CommutatorOutput;

/// Staged flag commits for one tick.
///
/// Each field is `Some` only when the corresponding gate bit of the
/// microinstruction asserts; ungated flags keep their pre-edge value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagsUpdate {
    /// New N and Z values, gated by STNZ.
    pub nz: Option<(bool, bool)>,
    /// New V value, gated by SETV.
    pub v: Option<bool>,
    /// New C value, gated by SETC.
    pub c: Option<bool>,
}

impl FlagsUpdate {
    /// A tick that commits no flags.
    pub const NONE: Self = Self {
        nz: None,
        v: None,
        c: None,
    };
}

/// Computes the flag commits for one commutator output.
#[must_use]
pub fn compute_flags(
    output: CommutatorOutput,
    set_c: bool,
    set_v: bool,
    st_nz: bool,
) -> FlagsUpdate {
    FlagsUpdate {
        nz: st_nz.then(|| (output.value & 0x8000 != 0, output.value == 0)),
        v: set_v.then(|| output.c17 ^ output.c16),
        c: set_c.then_some(output.c16),
    }
}
