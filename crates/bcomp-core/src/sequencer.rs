//! The microsequencer: decode, datapath evaluation and commit for one
//! rising clock edge.
//!
//! Every tick is split in two phases so commits stay precise:
//! 1. [`evaluate`] reads only pre-edge state and stages every side effect
//!    of the current microinstruction in a [`MicroStep`].
//! 2. [`commit`] applies the staged step; nothing is read back from the
//!    state being written.
//!
//! Branch words stage no writes at all; they only pick the next microPC.

use crate::datapath::{alu, commutate, compute_flags, CommutatorOutput, FlagsUpdate};
use crate::memory::MainMemory;
use crate::microcode::{BranchWord, DatapathControls, MicroOp, OperationalWord};
use crate::state::{MachineState, PS_C, PS_N, PS_V, PS_Z};

/// Resolution of a branch word's bit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchOutcome {
    /// True when the tested bit matched the expected value.
    pub taken: bool,
    /// The word's jump target; a taken branch with target 0 still falls
    /// through to microPC + 1.
    pub target: u8,
}

impl BranchOutcome {
    /// True when this is the end-of-instruction marker: a taken branch
    /// into the INFETCH entry.
    #[must_use]
    pub const fn is_instruction_boundary(self) -> bool {
        self.taken && self.target == crate::microcode::INFETCH
    }
}

/// Staged side effects of one tick, computed entirely from pre-edge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroStep {
    /// The commutator output the staged writes were derived from.
    pub commutator: CommutatorOutput,
    /// New DR value; LOAD override is already resolved here.
    pub write_dr: Option<u16>,
    /// New CR value.
    pub write_cr: Option<u16>,
    /// New IP value (truncated on commit).
    pub write_ip: Option<u16>,
    /// New SP value (truncated on commit).
    pub write_sp: Option<u16>,
    /// New AC value.
    pub write_ac: Option<u16>,
    /// New BR value.
    pub write_br: Option<u16>,
    /// New PS value (truncated on commit; gated flags override their bits).
    pub write_ps: Option<u16>,
    /// New AR value (truncated on commit).
    pub write_ar: Option<u16>,
    /// Staged flag commits.
    pub flags: FlagsUpdate,
    /// Main-memory write `(addr, value)` from the pre-edge AR and DR.
    pub store: Option<(u16, u16)>,
    /// Branch resolution, present only for branch words.
    pub branch: Option<BranchOutcome>,
    /// The microPC value to install.
    pub next_micro_pc: u8,
}

/// Step A: left operand mux (AC, BR, PS in priority order; empty reads 0).
///
/// The reserved pre-staged instruction input (bit 7) also lands here and
/// reads zero.
#[must_use]
const fn select_left(state: &MachineState, controls: &DatapathControls) -> u16 {
    if controls.rd_ac {
        state.ac()
    } else if controls.rd_br {
        state.br()
    } else if controls.rd_ps {
        state.ps()
    } else {
        0
    }
}

/// Step A: right operand mux (DR, CR, IP, SP in priority order).
#[must_use]
const fn select_right(state: &MachineState, controls: &DatapathControls) -> u16 {
    if controls.rd_dr {
        state.dr()
    } else if controls.rd_cr {
        state.cr()
    } else if controls.rd_ip {
        state.ip()
    } else if controls.rd_sp {
        state.sp()
    } else {
        0
    }
}

/// Evaluates one microinstruction against pre-edge state.
#[must_use]
pub fn evaluate(state: &MachineState, memory: &MainMemory, op: &MicroOp) -> MicroStep {
    let controls = match op {
        MicroOp::Operational(word) => &word.datapath,
        MicroOp::Branch(word) => &word.datapath,
    };

    let left = select_left(state, controls);
    let right = select_right(state, controls);
    let lane = alu(left, right, controls, state.carry());
    let commutator = commutate(lane, controls);

    match op {
        MicroOp::Branch(word) => evaluate_branch(state, word, commutator),
        MicroOp::Operational(word) => evaluate_operational(state, memory, word, commutator),
    }
}

fn evaluate_branch(
    state: &MachineState,
    word: &BranchWord,
    commutator: CommutatorOutput,
) -> MicroStep {
    let tested = word.mask & (commutator.value & 0x00FF) as u8 != 0;
    let taken = tested == word.expected;
    let effective_target = if taken { word.target } else { 0 };
    let next_micro_pc = if effective_target != 0 {
        effective_target
    } else {
        state.micro_pc().wrapping_add(1)
    };

    MicroStep {
        commutator,
        write_dr: None,
        write_cr: None,
        write_ip: None,
        write_sp: None,
        write_ac: None,
        write_br: None,
        write_ps: None,
        write_ar: None,
        flags: FlagsUpdate::NONE,
        store: None,
        branch: Some(BranchOutcome {
            taken,
            target: word.target,
        }),
        next_micro_pc,
    }
}

fn evaluate_operational(
    state: &MachineState,
    memory: &MainMemory,
    word: &OperationalWord,
    commutator: CommutatorOutput,
) -> MicroStep {
    let value = commutator.value;

    // LOAD overrides WRDR; STOR is suppressed while LOAD asserts.
    let write_dr = if word.load {
        Some(memory.read(state.ar()))
    } else if word.writes.dr {
        Some(value)
    } else {
        None
    };
    let store = (word.stor && !word.load).then(|| (state.ar(), state.dr()));

    MicroStep {
        commutator,
        write_dr,
        write_cr: word.writes.cr.then_some(value),
        write_ip: word.writes.ip.then_some(value),
        write_sp: word.writes.sp.then_some(value),
        write_ac: word.writes.ac.then_some(value),
        write_br: word.writes.br.then_some(value),
        write_ps: word.writes.ps.then_some(value),
        write_ar: word.writes.ar.then_some(value),
        flags: compute_flags(commutator, word.set_c, word.set_v, word.st_nz),
        store,
        branch: None,
        next_micro_pc: state.micro_pc().wrapping_add(1),
    }
}

/// Commits a staged step: all writes land together on the clock edge.
pub fn commit(state: &mut MachineState, memory: &mut MainMemory, step: &MicroStep) {
    if let Some((addr, value)) = step.store {
        memory.write(addr, value);
    }

    if let Some(value) = step.write_dr {
        state.set_dr(value);
    }
    if let Some(value) = step.write_cr {
        state.set_cr(value);
    }
    if let Some(value) = step.write_ip {
        state.set_ip(value);
    }
    if let Some(value) = step.write_sp {
        state.set_sp(value);
    }
    if let Some(value) = step.write_ac {
        state.set_ac(value);
    }
    if let Some(value) = step.write_br {
        state.set_br(value);
    }
    if let Some(value) = step.write_ar {
        state.set_ar(value);
    }

    let mut ps = state.ps();
    if let Some(value) = step.write_ps {
        ps = value;
    }
    if let Some(carry) = step.flags.c {
        ps = set_bit(ps, PS_C, carry);
    }
    if let Some(overflow) = step.flags.v {
        ps = set_bit(ps, PS_V, overflow);
    }
    if let Some((negative, zero)) = step.flags.nz {
        ps = set_bit(ps, PS_N, negative);
        ps = set_bit(ps, PS_Z, zero);
    }
    state.set_ps(ps);

    state.set_micro_pc(step.next_micro_pc);
}

const fn set_bit(word: u16, mask: u16, value: bool) -> u16 {
    if value {
        word | mask
    } else {
        word & !mask
    }
}

#[cfg(test)]
mod tests {
    use super::{commit, evaluate};
    use crate::memory::MainMemory;
    use crate::microcode::{bits, MicroWord};
    use crate::state::MachineState;

    fn decode(raw: u64) -> crate::microcode::MicroOp {
        MicroWord::new(raw).decode()
    }

    #[test]
    fn operational_word_advances_micro_pc_by_one() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_micro_pc(0x42);

        let step = evaluate(&state, &memory, &decode(0));
        commit(&mut state, &mut memory, &step);

        assert_eq!(state.micro_pc(), 0x43);
    }

    #[test]
    fn micro_pc_wraps_at_the_eight_bit_boundary() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_micro_pc(0xFF);

        let step = evaluate(&state, &memory, &decode(0));
        commit(&mut state, &mut memory, &step);

        assert_eq!(state.micro_pc(), 0x00);
    }

    #[test]
    fn load_overrides_the_dr_write_strobe() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        memory.write(0x0123, 0xCAFE);
        state.set_ar(0x0123);
        state.set_ac(0x5555);

        // AC would be routed into DR, but LOAD must win.
        let raw = bits::RDAC | bits::LTOL | bits::HTOH | bits::WRDR | bits::LOAD;
        let step = evaluate(&state, &memory, &decode(raw));
        commit(&mut state, &mut memory, &step);

        assert_eq!(state.dr(), 0xCAFE);
    }

    #[test]
    fn load_suppresses_a_simultaneous_store() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        memory.write(0x0040, 0x1111);
        state.set_ar(0x0040);
        state.set_dr(0x2222);

        let step = evaluate(&state, &memory, &decode(bits::LOAD | bits::STOR));
        commit(&mut state, &mut memory, &step);

        assert_eq!(state.dr(), 0x1111);
        assert_eq!(memory.read(0x0040), 0x1111);
    }

    #[test]
    fn store_uses_pre_edge_dr_and_ar() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_ar(0x0200);
        state.set_dr(0xBEEF);

        // The same word also rewrites DR from AC; memory must still see
        // the pre-edge DR.
        state.set_ac(0x0001);
        let raw = bits::RDAC | bits::LTOL | bits::HTOH | bits::WRDR | bits::STOR;
        let step = evaluate(&state, &memory, &decode(raw));
        commit(&mut state, &mut memory, &step);

        assert_eq!(memory.read(0x0200), 0xBEEF);
        assert_eq!(state.dr(), 0x0001);
    }

    #[test]
    fn multiple_register_writes_share_one_commutator_value() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_ac(0x1234);

        let raw = bits::RDAC | bits::LTOL | bits::HTOH | bits::WRBR | bits::WRDR | bits::WRAR;
        let step = evaluate(&state, &memory, &decode(raw));
        commit(&mut state, &mut memory, &step);

        assert_eq!(state.br(), 0x1234);
        assert_eq!(state.dr(), 0x1234);
        assert_eq!(state.ar(), 0x0234);
    }

    #[test]
    fn branch_words_commit_no_writes() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_ac(0x00FF);
        let before = state.clone();

        // A branch word whose overlaid bits 24..=31 would be every write
        // strobe if it were operational.
        let raw = bits::TYPE
            | (0xFFu64 << bits::BRANCH_TARGET_SHIFT)
            | (0x01u64 << bits::BRANCH_MASK_SHIFT)
            | bits::BRANCH_EXPECTED
            | bits::RDAC
            | bits::LTOL;
        let step = evaluate(&state, &memory, &decode(raw));
        commit(&mut state, &mut memory, &step);

        assert_eq!(state.ac(), before.ac());
        assert_eq!(state.ps(), before.ps());
        assert_eq!(state.micro_pc(), 0xFF);
    }

    #[test]
    fn branch_with_empty_mask_and_expected_zero_always_jumps() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_micro_pc(0x30);

        let raw = bits::TYPE | (0x77u64 << bits::BRANCH_TARGET_SHIFT);
        let step = evaluate(&state, &memory, &decode(raw));
        let outcome = step.branch.expect("branch word must resolve");
        assert!(outcome.taken);
        commit(&mut state, &mut memory, &step);
        assert_eq!(state.micro_pc(), 0x77);
    }

    #[test]
    fn untaken_branch_falls_through() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_micro_pc(0x30);
        state.set_ac(0x0000);

        // Expect bit 0 of AC to be 1; it is 0, so fall through.
        let raw = bits::TYPE
            | bits::BRANCH_EXPECTED
            | (0x77u64 << bits::BRANCH_TARGET_SHIFT)
            | (0x01u64 << bits::BRANCH_MASK_SHIFT)
            | bits::RDAC
            | bits::LTOL;
        let step = evaluate(&state, &memory, &decode(raw));
        assert!(!step.branch.expect("branch word must resolve").taken);
        commit(&mut state, &mut memory, &step);
        assert_eq!(state.micro_pc(), 0x31);
    }

    #[test]
    fn taken_branch_with_zero_target_still_falls_through() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_micro_pc(0x30);

        let raw = bits::TYPE;
        let step = evaluate(&state, &memory, &decode(raw));
        assert!(step.branch.expect("branch word must resolve").taken);
        commit(&mut state, &mut memory, &step);
        assert_eq!(state.micro_pc(), 0x31);
    }

    #[test]
    fn gated_flags_override_a_simultaneous_ps_write() {
        let mut state = MachineState::default();
        let mut memory = MainMemory::new();
        state.set_ac(0x0000);

        // PS <- AC (zero) while STNZ commits Z from the same zero output.
        let raw = bits::RDAC | bits::LTOL | bits::HTOH | bits::WRPS | bits::STNZ;
        let step = evaluate(&state, &memory, &decode(raw));
        commit(&mut state, &mut memory, &step);

        assert!(state.zero());
        assert!(!state.negative());
        assert!(!state.running());
    }
}
