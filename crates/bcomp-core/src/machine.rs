//! The machine facade: registers, memory and ROM behind a tick interface.

use crate::memory::MainMemory;
use crate::microcode::{MicroRom, MicroWord};
use crate::sequencer::{self, BranchOutcome};
use crate::state::{MachineState, RunState};

/// Callbacks for the IO and INTS microbits.
///
/// The core treats both bits as no-ops on register and memory state; a
/// harness that wires an I/O subsystem or an interrupt controller observes
/// them here. Callbacks run at the end of the tick, after commit.
pub trait CycleHooks {
    /// Invoked when the current microinstruction carries the IO bit.
    fn on_io(&mut self) {}

    /// Invoked when the current microinstruction carries the INTS bit.
    fn on_ints(&mut self) {}
}

/// Hook implementation that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHooks;

impl CycleHooks for NullHooks {}

/// Side effects of one executed tick, for tracers and harnesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEffects {
    /// MicroPC the executed word was fetched from.
    pub micro_pc_before: u8,
    /// Branch resolution when the word was a branch.
    pub branch: Option<BranchOutcome>,
    /// Committed main-memory write `(addr, value)`, if any.
    pub store: Option<(u16, u16)>,
}

/// Result of one [`Machine::tick`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick executed and committed.
    Running(TickEffects),
    /// The current microinstruction carries the HALT bit; state is frozen
    /// and no work was performed.
    Halted,
}

/// Aggregated result of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Number of ticks executed.
    pub ticks: u64,
    /// True when the run ended on HALT rather than the tick limit.
    pub halted: bool,
}

/// The complete machine: register file, main memory and microcode ROM.
#[derive(Debug, Clone)]
pub struct Machine {
    state: MachineState,
    memory: MainMemory,
    rom: MicroRom,
    run_state: RunState,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Builds a machine with the builtin microprogram, at the reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rom(MicroRom::builtin())
    }

    /// Builds a machine around an externally validated ROM.
    #[must_use]
    pub fn with_rom(rom: MicroRom) -> Self {
        Self {
            state: MachineState::default(),
            memory: MainMemory::new(),
            rom,
            run_state: RunState::Running,
        }
    }

    /// Applies full reset semantics: registers to the reset vector, main
    /// memory zeroed, run state cleared. The ROM keeps its preload.
    pub fn reset(&mut self) {
        self.state.reset();
        self.memory.clear();
        self.run_state = RunState::Running;
    }

    /// Read access to the register file.
    #[must_use]
    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    /// Mutable access to the register file, for preloaders and tests.
    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    /// Read access to main memory.
    #[must_use]
    pub const fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// Mutable access to main memory, for preloaders.
    pub fn memory_mut(&mut self) -> &mut MainMemory {
        &mut self.memory
    }

    /// The loaded microcode ROM.
    #[must_use]
    pub const fn rom(&self) -> &MicroRom {
        &self.rom
    }

    /// Current host-observable run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// The microinstruction the next tick would execute.
    #[must_use]
    pub fn current_word(&self) -> MicroWord {
        self.rom.fetch(self.state.micro_pc())
    }

    /// True when the machine is frozen on a HALT microinstruction.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.run_state.is_halted() || self.current_word().halts()
    }

    /// Preloader entry: copies `words` into memory starting at `base`.
    pub fn load_words(&mut self, base: u16, words: &[u16]) {
        self.memory.load_words(base, words);
    }

    /// Preloader entry: sets the instruction pointer to the program entry.
    pub const fn set_entry(&mut self, ip: u16) {
        self.state.set_ip(ip);
    }

    /// Performs one rising clock edge.
    ///
    /// When the current microinstruction carries the HALT bit the machine
    /// freezes: no state changes and [`TickOutcome::Halted`] is returned
    /// on this and every following call.
    pub fn tick(&mut self, hooks: &mut dyn CycleHooks) -> TickOutcome {
        let word = self.current_word();
        if word.halts() {
            self.run_state = RunState::Halted;
            return TickOutcome::Halted;
        }

        let micro_pc_before = self.state.micro_pc();
        let op = word.decode();
        let step = sequencer::evaluate(&self.state, &self.memory, &op);
        sequencer::commit(&mut self.state, &mut self.memory, &step);

        if word.io_hook() {
            hooks.on_io();
        }
        if word.ints_hook() {
            hooks.on_ints();
        }

        TickOutcome::Running(TickEffects {
            micro_pc_before,
            branch: step.branch,
            store: step.store,
        })
    }

    /// Ticks until HALT is observed or `max_ticks` is reached.
    pub fn run_until_halt(&mut self, hooks: &mut dyn CycleHooks, max_ticks: u64) -> RunOutcome {
        let mut ticks = 0;
        while ticks < max_ticks {
            match self.tick(hooks) {
                TickOutcome::Halted => {
                    return RunOutcome {
                        ticks,
                        halted: true,
                    };
                }
                TickOutcome::Running(_) => ticks += 1,
            }
        }
        RunOutcome {
            ticks,
            halted: self.is_halted(),
        }
    }
}
