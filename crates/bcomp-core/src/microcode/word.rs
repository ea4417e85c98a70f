//! Microword decoding: from the packed 40-bit cell to named control fields.

use super::bits;

/// A single 40-bit microinstruction as stored in the ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MicroWord(u64);

impl MicroWord {
    /// Wraps a raw cell value, truncated to the 40 defined bits.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw & bits::MICROWORD_MASK)
    }

    /// Returns the packed cell value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns true when the halt bit (38) is set.
    #[must_use]
    pub const fn halts(self) -> bool {
        self.0 & bits::HALT != 0
    }

    /// Returns true when the I/O hook bit (34) is set.
    #[must_use]
    pub const fn io_hook(self) -> bool {
        self.0 & bits::IO != 0
    }

    /// Returns true when the interrupt-controller hook bit (35) is set.
    #[must_use]
    pub const fn ints_hook(self) -> bool {
        self.0 & bits::INTS != 0
    }

    /// Returns true for branch-type words (bit 39).
    #[must_use]
    pub const fn is_branch(self) -> bool {
        self.0 & bits::TYPE != 0
    }

    /// Decodes the word into its control-field representation.
    ///
    /// In branch words bits 16..=23 carry the bit-test mask and bits
    /// 24..=32 the target and expected value, so the shift controls and
    /// the write set do not exist there; the decoder reflects that by
    /// construction instead of leaving it to every consumer.
    #[must_use]
    pub fn decode(self) -> MicroOp {
        let raw = self.0;
        let datapath = DatapathControls {
            rd_dr: raw & bits::RDDR != 0,
            rd_cr: raw & bits::RDCR != 0,
            rd_ip: raw & bits::RDIP != 0,
            rd_sp: raw & bits::RDSP != 0,
            rd_ac: raw & bits::RDAC != 0,
            rd_br: raw & bits::RDBR != 0,
            rd_ps: raw & bits::RDPS != 0,
            com_r: raw & bits::COMR != 0,
            com_l: raw & bits::COML != 0,
            pls1: raw & bits::PLS1 != 0,
            sora: raw & bits::SORA != 0,
            ltol: raw & bits::LTOL != 0,
            ltoh: raw & bits::LTOH != 0,
            htol: raw & bits::HTOL != 0,
            htoh: raw & bits::HTOH != 0,
            sext: !self.is_branch() && raw & bits::SEXT != 0,
            shlt: !self.is_branch() && raw & bits::SHLT != 0,
            shl0: !self.is_branch() && raw & bits::SHL0 != 0,
            shrt: !self.is_branch() && raw & bits::SHRT != 0,
            shrf: !self.is_branch() && raw & bits::SHRF != 0,
        };

        if self.is_branch() {
            MicroOp::Branch(BranchWord {
                datapath,
                mask: ((raw >> bits::BRANCH_MASK_SHIFT) & 0xFF) as u8,
                target: ((raw >> bits::BRANCH_TARGET_SHIFT) & 0xFF) as u8,
                expected: raw & bits::BRANCH_EXPECTED != 0,
            })
        } else {
            MicroOp::Operational(OperationalWord {
                datapath,
                set_c: raw & bits::SETC != 0,
                set_v: raw & bits::SETV != 0,
                st_nz: raw & bits::STNZ != 0,
                writes: WriteSet {
                    dr: raw & bits::WRDR != 0,
                    cr: raw & bits::WRCR != 0,
                    ip: raw & bits::WRIP != 0,
                    sp: raw & bits::WRSP != 0,
                    ac: raw & bits::WRAC != 0,
                    br: raw & bits::WRBR != 0,
                    ps: raw & bits::WRPS != 0,
                    ar: raw & bits::WRAR != 0,
                },
                load: raw & bits::LOAD != 0,
                stor: raw & bits::STOR != 0,
            })
        }
    }
}

/// Input-mux, ALU and commutator controls shared by both word types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DatapathControls {
    /// Right mux: select DR.
    pub rd_dr: bool,
    /// Right mux: select CR.
    pub rd_cr: bool,
    /// Right mux: select IP.
    pub rd_ip: bool,
    /// Right mux: select SP.
    pub rd_sp: bool,
    /// Left mux: select AC.
    pub rd_ac: bool,
    /// Left mux: select BR.
    pub rd_br: bool,
    /// Left mux: select PS.
    pub rd_ps: bool,
    /// Invert the right operand.
    pub com_r: bool,
    /// Invert the left operand.
    pub com_l: bool,
    /// Inject +1 into the carry chain.
    pub pls1: bool,
    /// Select AND instead of the sum.
    pub sora: bool,
    /// Low byte to low byte.
    pub ltol: bool,
    /// Low byte to high byte.
    pub ltoh: bool,
    /// High byte to low byte.
    pub htol: bool,
    /// High byte to high byte.
    pub htoh: bool,
    /// Sign-extend bit 7 into the high byte.
    pub sext: bool,
    /// Left shift.
    pub shlt: bool,
    /// Left-shift fill from PS.C.
    pub shl0: bool,
    /// Right shift.
    pub shrt: bool,
    /// Right-shift fill from PS.C.
    pub shrf: bool,
}

/// Register/memory write strobes of an operational word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct WriteSet {
    /// Write DR.
    pub dr: bool,
    /// Write CR.
    pub cr: bool,
    /// Write IP.
    pub ip: bool,
    /// Write SP.
    pub sp: bool,
    /// Write AC.
    pub ac: bool,
    /// Write BR.
    pub br: bool,
    /// Write PS.
    pub ps: bool,
    /// Write AR.
    pub ar: bool,
}

/// Decoded operational microinstruction: datapath controls plus commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationalWord {
    /// Input-mux, ALU and commutator controls.
    pub datapath: DatapathControls,
    /// Commit the carry flag.
    pub set_c: bool,
    /// Commit the overflow flag.
    pub set_v: bool,
    /// Commit the negative and zero flags.
    pub st_nz: bool,
    /// Register write strobes.
    pub writes: WriteSet,
    /// Memory read into DR, overriding the DR write strobe.
    pub load: bool,
    /// Memory write from DR; suppressed when `load` is set.
    pub stor: bool,
}

/// Decoded branch microinstruction: a bit test over the commutator low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchWord {
    /// Input-mux, ALU and byte-routing controls (shifts forced off).
    pub datapath: DatapathControls,
    /// One-hot-style mask over `C[7:0]`; the tested value is the OR of the
    /// selected bits.
    pub mask: u8,
    /// Jump target when the test matches; target 0 falls through.
    pub target: u8,
    /// Expected value of the tested bit.
    pub expected: bool,
}

/// Decoded microinstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    /// Ordinary word: datapath evaluation plus commits.
    Operational(OperationalWord),
    /// Conditional microbranch: no commits.
    Branch(BranchWord),
}

#[cfg(test)]
mod tests {
    use super::super::bits;
    use super::{MicroOp, MicroWord};

    #[test]
    fn halt_cell_decodes_as_operational_with_halt_bit() {
        let word = MicroWord::new(0x40_0000_0000);
        assert!(word.halts());
        assert!(!word.is_branch());
        let MicroOp::Operational(op) = word.decode() else {
            panic!("expected operational word");
        };
        assert!(!op.load && !op.stor);
        assert_eq!(op.writes, super::WriteSet::default());
    }

    #[test]
    fn hook_cells_expose_io_and_ints() {
        assert!(MicroWord::new(0x04_0000_0000).io_hook());
        assert!(MicroWord::new(0x08_0000_0000).ints_hook());
        assert!(!MicroWord::new(0x04_0000_0000).ints_hook());
    }

    #[test]
    fn operational_word_decodes_reads_routes_and_writes() {
        let raw = bits::RDIP | bits::PLS1 | bits::LTOL | bits::HTOH | bits::WRIP;
        let MicroOp::Operational(op) = MicroWord::new(raw).decode() else {
            panic!("expected operational word");
        };
        assert!(op.datapath.rd_ip && op.datapath.pls1);
        assert!(op.datapath.ltol && op.datapath.htoh);
        assert!(op.writes.ip);
        assert!(!op.writes.ac && !op.writes.ar);
        assert!(!op.set_c && !op.set_v && !op.st_nz);
    }

    #[test]
    fn branch_word_extracts_mask_target_and_expected() {
        let raw = bits::TYPE
            | bits::BRANCH_EXPECTED
            | (0x5D << bits::BRANCH_TARGET_SHIFT)
            | (0x04 << bits::BRANCH_MASK_SHIFT)
            | bits::RDPS
            | bits::LTOL;
        let MicroOp::Branch(branch) = MicroWord::new(raw).decode() else {
            panic!("expected branch word");
        };
        assert_eq!(branch.mask, 0x04);
        assert_eq!(branch.target, 0x5D);
        assert!(branch.expected);
        assert!(branch.datapath.rd_ps && branch.datapath.ltol);
    }

    #[test]
    fn branch_words_force_the_shift_controls_off() {
        // Mask bits 16..=23 overlay SEXT..STNZ; they must not act as
        // shift controls while the word is a branch.
        let raw = bits::TYPE | (0xFF << bits::BRANCH_MASK_SHIFT) | bits::RDAC | bits::LTOL;
        let MicroOp::Branch(branch) = MicroWord::new(raw).decode() else {
            panic!("expected branch word");
        };
        assert!(!branch.datapath.sext);
        assert!(!branch.datapath.shlt);
        assert!(!branch.datapath.shl0);
        assert!(!branch.datapath.shrt);
        assert!(!branch.datapath.shrf);
        assert!(branch.datapath.ltol);
    }

    #[test]
    fn raw_values_are_truncated_to_forty_bits() {
        let word = MicroWord::new(u64::MAX);
        assert_eq!(word.raw(), bits::MICROWORD_MASK);
    }
}
