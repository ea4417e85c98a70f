//! The microprogram ROM: 256 cells of 40 bits, preloaded at reset.

use thiserror::Error;

use super::word::MicroWord;

/// Number of cells in the microprogram ROM.
pub const MICRO_ROM_WORDS: usize = 256;

/// Microaddress of the INFETCH entry.
pub const INFETCH: u8 = 0x01;

/// Construction-time ROM validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RomError {
    /// The provided table does not contain exactly 256 cells.
    #[error("invalid microcode length: expected {expected} cells, got {actual}")]
    InvalidLength {
        /// Required cell count.
        expected: usize,
        /// Provided cell count.
        actual: usize,
    },
    /// A cell value does not fit in 40 bits.
    #[error("microcode cell {index:#04X} exceeds 40 bits: {value:#012X}")]
    WordTooWide {
        /// Offending cell index.
        index: usize,
        /// Offending cell value.
        value: u64,
    },
}

/// The 256×40-bit microprogram ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroRom {
    cells: Box<[MicroWord]>,
}

impl Default for MicroRom {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MicroRom {
    /// Builds the ROM preloaded with the machine microprogram.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            cells: MICROCODE.iter().map(|raw| MicroWord::new(*raw)).collect(),
        }
    }

    /// Builds a ROM from an externally supplied table.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] when the table is not exactly 256 cells or a
    /// cell value does not fit in 40 bits.
    pub fn from_words(words: &[u64]) -> Result<Self, RomError> {
        if words.len() != MICRO_ROM_WORDS {
            return Err(RomError::InvalidLength {
                expected: MICRO_ROM_WORDS,
                actual: words.len(),
            });
        }
        for (index, value) in words.iter().copied().enumerate() {
            if value != MicroWord::new(value).raw() {
                return Err(RomError::WordTooWide { index, value });
            }
        }
        Ok(Self {
            cells: words.iter().map(|raw| MicroWord::new(*raw)).collect(),
        })
    }

    /// Fetches the cell at `addr`.
    #[must_use]
    pub fn fetch(&self, addr: u8) -> MicroWord {
        self.cells[usize::from(addr)]
    }
}

/// The machine microprogram.
///
/// Layout of the routines (microaddresses in hex):
///
/// ```text
/// 00        halt cell
/// 01..05    INFETCH: AR<-IP, DR<-mem, CR<-DR, IP<-IP+1, BR<-CR>>8
/// 06..1C    opcode decode tree over BR[7:4] (CR[15:12])
/// 20/28/30  AND / LDA / OR        38  STA
/// 40..53    non-address sub-opcode decode tree over BR[3:0]
/// 54..59    HLT, NOP, CLA, CMA
/// 5B..6E    BEQ, BNE, BMI, BPL, BCS
/// 70/78/80  ADD / SUB / CMP       88..8F  INC, DEC, ROL, ROR
/// 90        ADC (carry tested via a microbranch on PS.C)
/// 9A/A0     CALL / JUMP           A2/A7   PUSH / POP
/// AC/B1     RET / IRET            BA/C5   EI / DI (mask built by shifts)
/// D0..DC    interrupt entry: push IP, push PS, INTS/IO hooks, vector
/// E0..FF    unused, zero
/// ```
///
/// Operand opcodes resolve the indirect bit (CR[11], still staged in
/// BR[3]) with a microbranch inside their own fetch prefix; every routine
/// ends with an unconditional branch to INFETCH, which is the
/// end-of-instruction marker the tracer keys on.
pub const MICROCODE: [u64; MICRO_ROM_WORDS] = [
    0x4000000000, 0x0080009004, 0x0100000000, 0x0002009001, // 0x00
    0x0004009404, 0x0020004002, 0x8112801020, 0x810D401020, // 0x04
    0x810B201020, 0x8120101020, 0x8040000000, 0x8128101020, // 0x08
    0x8030000000, 0x8110201020, 0x8190101020, 0x8038000000, // 0x0C
    0x8180101020, 0x8078000000, 0x8118401020, 0x8116201020, // 0x10
    0x81A0101020, 0x809A000000, 0x815B101020, 0x8070000000, // 0x14
    0x811B201020, 0x8163101020, 0x805F000000, 0x816B101020, // 0x18
    0x8067000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0x1C
    0x0080009002, 0x8024081020, 0x0100000000, 0x0080009001, // 0x20
    0x0100000000, 0x0010809811, 0x8001000000, 0x0000000000, // 0x24
    0x0080009002, 0x802C081020, 0x0100000000, 0x0080009001, // 0x28
    0x0100000000, 0x0010809001, 0x8001000000, 0x0000000000, // 0x2C
    0x0080009002, 0x8034081020, 0x0100000000, 0x0080009001, // 0x30
    0x0100000000, 0x0020009B11, 0x0010809B20, 0x8001000000, // 0x34
    0x0080009002, 0x803C081020, 0x0100000000, 0x0080009001, // 0x38
    0x0001009010, 0x0200000000, 0x8001000000, 0x0000000000, // 0x3C
    0x814C081020, 0x8147041020, 0x8145021020, 0x8155011020, // 0x40
    0x8054000000, 0x8158011020, 0x8056000000, 0x814A021020, // 0x44
    0x818A011020, 0x8088000000, 0x818E011020, 0x808C000000, // 0x48
    0x8152041020, 0x8150021020, 0x81A7011020, 0x80A2000000, // 0x4C
    0x81B1011020, 0x80AC000000, 0x81C5011020, 0x80BA000000, // 0x50
    0x4000000000, 0x8001000000, 0x0010C09000, 0x8001000000, // 0x54
    0x0010809B10, 0x8001000000, 0x0000000000, 0x815D041040, // 0x58
    0x8001000000, 0x0004009002, 0x8001000000, 0x8061041040, // 0x5C
    0x8001000000, 0x0004009002, 0x8001000000, 0x8165081040, // 0x60
    0x8001000000, 0x0004009002, 0x8001000000, 0x8069081040, // 0x64
    0x8001000000, 0x0004009002, 0x8001000000, 0x816D011040, // 0x68
    0x8001000000, 0x0004009002, 0x8001000000, 0x0000000000, // 0x6C
    0x0080009002, 0x8074081020, 0x0100000000, 0x0080009001, // 0x70
    0x0100000000, 0x0010E09011, 0x8001000000, 0x0000000000, // 0x74
    0x0080009002, 0x807C081020, 0x0100000000, 0x0080009001, // 0x78
    0x0100000000, 0x0010E09511, 0x8001000000, 0x0000000000, // 0x7C
    0x0080009002, 0x8084081020, 0x0100000000, 0x0080009001, // 0x80
    0x0100000000, 0x0000E09511, 0x8001000000, 0x0000000000, // 0x84
    0x0010E09410, 0x8001000000, 0x0010E09110, 0x8001000000, // 0x88
    0x0010E60010, 0x8001000000, 0x0010B80010, 0x8001000000, // 0x8C
    0x0080009002, 0x8094081020, 0x0100000000, 0x0080009001, // 0x90
    0x0100000000, 0x8098011040, 0x0010E09411, 0x8001000000, // 0x94
    0x0010E09011, 0x8001000000, 0x0008009208, 0x0080009008, // 0x98
    0x0001009004, 0x0200000000, 0x0004009002, 0x8001000000, // 0x9C
    0x0004009002, 0x8001000000, 0x0008009208, 0x0080009008, // 0xA0
    0x0001009010, 0x0200000000, 0x8001000000, 0x0080009008, // 0xA4
    0x0100000000, 0x0010009001, 0x0008009408, 0x8001000000, // 0xA8
    0x0080009008, 0x0100000000, 0x0004009001, 0x0008009408, // 0xAC
    0x8001000000, 0x0080009008, 0x0100000000, 0x0040009001, // 0xB0
    0x0008009408, 0x0080009008, 0x0100000000, 0x0004009001, // 0xB4
    0x0008009408, 0x8001000000, 0x0020009400, 0x0020020020, // 0xB8
    0x0020020020, 0x0020020020, 0x0020020020, 0x0020020020, // 0xBC
    0x0020020020, 0x0001009020, 0x0020009B41, 0x0040009B20, // 0xC0
    0x8001000000, 0x0020009400, 0x0020020020, 0x0020020020, // 0xC4
    0x0020020020, 0x0020020020, 0x0020020020, 0x0020020020, // 0xC8
    0x0001009020, 0x0040009941, 0x8001000000, 0x0000000000, // 0xCC
    0x0800000000, 0x0008009208, 0x0080009008, 0x0001009004, // 0xD0
    0x0200000000, 0x0008009208, 0x0080009008, 0x0001009040, // 0xD4
    0x0200000000, 0x0400000000, 0x0001009080, 0x0004009001, // 0xD8
    0x8001000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xDC
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xE0
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xE4
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xE8
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xEC
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xF0
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xF4
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xF8
    0x0000000000, 0x0000000000, 0x0000000000, 0x0000000000, // 0xFC
];
