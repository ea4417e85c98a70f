//! Canonical per-instruction trace generation.
//!
//! The tracer is a collaborator, not part of the tick itself: a harness
//! feeds it the committed state and the tick effects after every tick,
//! and it emits one row per executed instruction.

use std::fmt::{self, Display, Formatter};

use crate::machine::{Machine, TickEffects};
use crate::microcode::INFETCH;

/// MicroPC value at which CR holds the freshly fetched instruction word.
const CR_CAPTURE_POINT: u8 = 4;

/// One canonical trace row, emitted at each end-of-instruction marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionTrace {
    /// Address the instruction was fetched from.
    pub cur_ip: u16,
    /// The instruction word itself.
    pub cur_cr: u16,
    /// IP after the instruction.
    pub ip: u16,
    /// CR after the instruction.
    pub cr: u16,
    /// AR after the instruction.
    pub ar: u16,
    /// DR after the instruction.
    pub dr: u16,
    /// SP after the instruction.
    pub sp: u16,
    /// BR after the instruction.
    pub br: u16,
    /// AC after the instruction.
    pub ac: u16,
    /// The N/Z/V/C nibble of PS.
    pub flags: u8,
    /// Address of the most recent main-memory write.
    pub last_mod_addr: u16,
    /// Value of the most recent main-memory write.
    pub last_mod_mem: u16,
}

impl Display for InstructionTrace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:03X} {:04X}  IP={:03X} CR={:04X} AR={:03X} DR={:04X} SP={:03X} BR={:04X} AC={:04X} NZVC={:04b}  {:03X} {:04X}",
            self.cur_ip,
            self.cur_cr,
            self.ip,
            self.cr,
            self.ar,
            self.dr,
            self.sp,
            self.br,
            self.ac,
            self.flags,
            self.last_mod_addr,
            self.last_mod_mem,
        )
    }
}

/// Observes committed state between ticks and assembles trace rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionTracer {
    cur_ip: u16,
    cur_cr: u16,
    last_store: (u16, u16),
}

impl InstructionTracer {
    /// Builds a tracer for a machine about to start at INFETCH.
    #[must_use]
    pub fn new(machine: &Machine) -> Self {
        Self {
            cur_ip: machine.state().ip(),
            cur_cr: machine.state().cr(),
            last_store: (0, 0),
        }
    }

    /// Digests one committed tick.
    ///
    /// Returns a trace row when this tick was the end-of-instruction
    /// marker (a taken microbranch into INFETCH).
    pub fn observe(&mut self, machine: &Machine, effects: &TickEffects) -> Option<InstructionTrace> {
        if let Some(store) = effects.store {
            self.last_store = store;
        }

        let row = effects
            .branch
            .filter(|branch| branch.is_instruction_boundary())
            .map(|_| self.row(machine));

        let state = machine.state();
        if state.micro_pc() == INFETCH {
            self.cur_ip = state.ip();
        }
        if state.micro_pc() == CR_CAPTURE_POINT {
            self.cur_cr = state.cr();
        }

        row
    }

    fn row(&self, machine: &Machine) -> InstructionTrace {
        let state = machine.state();
        InstructionTrace {
            cur_ip: self.cur_ip,
            cur_cr: self.cur_cr,
            ip: state.ip(),
            cr: state.cr(),
            ar: state.ar(),
            dr: state.dr(),
            sp: state.sp(),
            br: state.br(),
            ac: state.ac(),
            flags: state.flag_nibble(),
            last_mod_addr: self.last_mod_addr(),
            last_mod_mem: self.last_store.1,
        }
    }

    const fn last_mod_addr(&self) -> u16 {
        self.last_store.0
    }
}

#[cfg(test)]
mod tests {
    use super::{InstructionTrace, InstructionTracer};
    use crate::machine::{Machine, NullHooks, TickOutcome};

    fn trace_program(machine: &mut Machine, max_ticks: u64) -> Vec<InstructionTrace> {
        let mut tracer = InstructionTracer::new(machine);
        let mut rows = Vec::new();
        for _ in 0..max_ticks {
            match machine.tick(&mut NullHooks) {
                TickOutcome::Halted => break,
                TickOutcome::Running(effects) => {
                    rows.extend(tracer.observe(machine, &effects));
                }
            }
        }
        rows
    }

    #[test]
    fn one_row_per_executed_instruction() {
        let mut machine = Machine::new();
        machine.load_words(0x0100, &[0x0100, 0x0100, 0x0000]); // NOP NOP HLT
        machine.set_entry(0x0100);

        let rows = trace_program(&mut machine, 10_000);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cur_ip, 0x0100);
        assert_eq!(rows[0].cur_cr, 0x0100);
        assert_eq!(rows[1].cur_ip, 0x0101);
        assert_eq!(rows[0].ip, 0x0101);
    }

    #[test]
    fn store_instructions_report_the_modified_cell() {
        let mut machine = Machine::new();
        machine.state_mut().set_ac(0xABCD);
        machine.load_words(0x0100, &[0x4055, 0x0000]); // STA 0x055, HLT
        machine.set_entry(0x0100);

        let rows = trace_program(&mut machine, 10_000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].last_mod_addr, 0x0055);
        assert_eq!(rows[0].last_mod_mem, 0xABCD);
    }

    #[test]
    fn rows_render_as_one_canonical_line() {
        let row = InstructionTrace {
            cur_ip: 0x188,
            cur_cr: 0xA184,
            ip: 0x189,
            cr: 0xA184,
            ar: 0x184,
            dr: 0x2345,
            sp: 0x000,
            br: 0x00A1,
            ac: 0x2345,
            flags: 0b0000,
            last_mod_addr: 0x000,
            last_mod_mem: 0x0000,
        };
        assert_eq!(
            row.to_string(),
            "188 A184  IP=189 CR=A184 AR=184 DR=2345 SP=000 BR=00A1 AC=2345 NZVC=0000  000 0000"
        );
    }
}
