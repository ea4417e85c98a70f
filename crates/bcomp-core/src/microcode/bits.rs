//! Named positions of every control bit in the 40-bit microword.
//!
//! These positions are the authoritative mapping between the packed ROM
//! encoding and the decoded control structures; nothing else in the crate
//! hard-codes a bit number.

/// Right-mux select: data register.
pub const RDDR: u64 = 1 << 0;
/// Right-mux select: command register.
pub const RDCR: u64 = 1 << 1;
/// Right-mux select: instruction pointer.
pub const RDIP: u64 = 1 << 2;
/// Right-mux select: stack pointer.
pub const RDSP: u64 = 1 << 3;
/// Left-mux select: accumulator.
pub const RDAC: u64 = 1 << 4;
/// Left-mux select: buffer register.
pub const RDBR: u64 = 1 << 5;
/// Left-mux select: program state (zero-extended to 16 bits).
pub const RDPS: u64 = 1 << 6;
/// Left-mux select: reserved pre-staged instruction input; reads as zero.
pub const RDIR: u64 = 1 << 7;

/// Invert the right ALU operand.
pub const COMR: u64 = 1 << 8;
/// Invert the left ALU operand.
pub const COML: u64 = 1 << 9;
/// Inject +1 into the summator carry chain.
pub const PLS1: u64 = 1 << 10;
/// Select AND instead of the sum.
pub const SORA: u64 = 1 << 11;

/// Route the ALU low byte to the output low byte.
pub const LTOL: u64 = 1 << 12;
/// Route the ALU low byte to the output high byte.
pub const LTOH: u64 = 1 << 13;
/// Route the ALU high byte to the output low byte.
pub const HTOL: u64 = 1 << 14;
/// Route the ALU high byte to the output high byte.
pub const HTOH: u64 = 1 << 15;

/// Sign-extend ALU bit 7 into the output high byte.
pub const SEXT: u64 = 1 << 16;
/// Shift the ALU output left by one.
pub const SHLT: u64 = 1 << 17;
/// During a left shift, fill bit 0 from PS.C.
pub const SHL0: u64 = 1 << 18;
/// Shift the ALU output right by one.
pub const SHRT: u64 = 1 << 19;
/// During a right shift, fill bit 15 from PS.C (rotate through carry).
pub const SHRF: u64 = 1 << 20;

/// Commit the carry flag.
pub const SETC: u64 = 1 << 21;
/// Commit the overflow flag.
pub const SETV: u64 = 1 << 22;
/// Commit the negative and zero flags.
pub const STNZ: u64 = 1 << 23;

/// Write DR from the commutator output.
pub const WRDR: u64 = 1 << 24;
/// Write CR from the commutator output.
pub const WRCR: u64 = 1 << 25;
/// Write IP from the commutator output (11 bits).
pub const WRIP: u64 = 1 << 26;
/// Write SP from the commutator output (11 bits).
pub const WRSP: u64 = 1 << 27;
/// Write AC from the commutator output.
pub const WRAC: u64 = 1 << 28;
/// Write BR from the commutator output.
pub const WRBR: u64 = 1 << 29;
/// Write PS from the commutator output (9 bits).
pub const WRPS: u64 = 1 << 30;
/// Write AR from the commutator output (11 bits).
pub const WRAR: u64 = 1 << 31;

/// Synchronous memory read: DR receives `mem[AR]`, overriding WRDR.
pub const LOAD: u64 = 1 << 32;
/// Synchronous memory write: `mem[AR]` receives DR; suppressed by LOAD.
pub const STOR: u64 = 1 << 33;
/// I/O hook bit; no effect on core state.
pub const IO: u64 = 1 << 34;
/// Interrupt-controller hook bit; no effect on core state.
pub const INTS: u64 = 1 << 35;
/// Halt bit: the machine freezes while the current word carries it.
pub const HALT: u64 = 1 << 38;
/// Word type: 1 = branch microinstruction, 0 = operational.
pub const TYPE: u64 = 1 << 39;

/// Shift of the bit-test mask field in branch words (`M[23:16]`).
pub const BRANCH_MASK_SHIFT: u64 = 16;
/// Shift of the jump target field in branch words (`M[31:24]`).
pub const BRANCH_TARGET_SHIFT: u64 = 24;
/// Position of the expected-value bit in branch words (`M[32]`).
pub const BRANCH_EXPECTED: u64 = 1 << 32;

/// Total width of a microword in bits.
pub const MICROWORD_BITS: u32 = 40;
/// Mask selecting the 40 defined microword bits.
pub const MICROWORD_MASK: u64 = (1 << MICROWORD_BITS) - 1;

#[cfg(test)]
mod tests {
    use super::{
        BRANCH_EXPECTED, HALT, LOAD, LTOL, MICROWORD_MASK, RDDR, SETC, STOR, TYPE, WRAR, WRDR,
    };

    #[test]
    fn control_bit_positions_match_the_definitive_assignment() {
        assert_eq!(RDDR, 1);
        assert_eq!(LTOL, 1 << 12);
        assert_eq!(SETC, 1 << 21);
        assert_eq!(WRDR, 1 << 24);
        assert_eq!(WRAR, 1 << 31);
        assert_eq!(LOAD, 1 << 32);
        assert_eq!(STOR, 1 << 33);
        assert_eq!(HALT, 1 << 38);
        assert_eq!(TYPE, 1 << 39);
        assert_eq!(BRANCH_EXPECTED, LOAD);
    }

    #[test]
    fn every_defined_bit_fits_the_word() {
        assert_eq!(TYPE & MICROWORD_MASK, TYPE);
        assert_eq!(MICROWORD_MASK, 0xFF_FFFF_FFFF);
    }
}
