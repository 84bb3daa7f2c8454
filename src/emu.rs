//! Emulator orchestrator
//!
//! Wires a [`Cpu`] to a [`Bus`] and drives the fetch/execute loop. This
//! is the host-facing surface: everything about loading a ROM,
//! applying the CPUDIAG compatibility patches and clocking the machine
//! to completion lives here rather than in the CPU itself.
//!
//! Reference: hatonacat/i8080 (read-rom.cpp)

use crate::bus::Bus;
use crate::cpu::{Cpu, HaltReason};
use crate::memory::RomError;

/// CPUDIAG's fixed load origin.
pub const CPUDIAG_ORIGIN: u16 = 0x0100;

/// Stack-pointer fixup CPUDIAG's ROM needs at this origin.
const CPUDIAG_SP_FIXUP_ADDR: u16 = 0x0170;
const CPUDIAG_SP_FIXUP_VALUE: u8 = 0x07;

/// `JMP 0x05C2`, patched in to skip the DAA test (DAA is a no-op in
/// this core; without the patch CPUDIAG's DAA check fails and the
/// diagnostic reports a failure instead of running to completion).
const CPUDIAG_DAA_SKIP_ADDR: u16 = 0x059C;
const CPUDIAG_DAA_SKIP_BYTES: [u8; 3] = [0xC3, 0xC2, 0x05];

/// A safety bound on the number of instructions [`Emu::run_until_halt`]
/// will execute before giving up, so a runaway program (or a bug in
/// this core) can't hang the host forever.
const MAX_STEPS: u64 = 50_000_000;

/// Couples a [`Cpu`] to the [`Bus`] it executes against.
pub struct Emu {
    pub cpu: Cpu,
    pub bus: Bus,
}

impl Emu {
    /// An emulator with a freshly reset CPU and bus, PC at 0x0000.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
        }
    }

    /// An emulator set up to run the CPUDIAG self-test: PC starts at
    /// [`CPUDIAG_ORIGIN`] and a jump to 0x0000 mid-run is treated as
    /// the diagnostic's failure sentinel rather than a normal branch.
    pub fn new_self_test() -> Self {
        Self {
            cpu: Cpu::new_self_test(),
            bus: Bus::new(),
        }
    }

    /// Load a raw ROM image at `origin`.
    pub fn load_rom(&mut self, data: &[u8], origin: u16) -> Result<(), RomError> {
        self.bus.load_rom(data, origin)
    }

    /// Apply CPUDIAG's two compatibility patches. Only meaningful once
    /// the diagnostic has been loaded at [`CPUDIAG_ORIGIN`]; calling
    /// this against an arbitrary ROM would corrupt it.
    pub fn apply_cpudiag_patches(&mut self) {
        self.bus.poke(CPUDIAG_SP_FIXUP_ADDR, CPUDIAG_SP_FIXUP_VALUE);
        for (i, &byte) in CPUDIAG_DAA_SKIP_BYTES.iter().enumerate() {
            self.bus
                .poke(CPUDIAG_DAA_SKIP_ADDR + i as u16, byte);
        }
    }

    /// Load and run the CPUDIAG self-test to completion, returning why
    /// the CPU halted. Convenience wrapper combining [`Self::new_self_test`],
    /// [`Self::load_rom`] and [`Self::apply_cpudiag_patches`].
    pub fn run_cpudiag(data: &[u8]) -> Result<(Self, HaltReason), RomError> {
        let mut emu = Self::new_self_test();
        emu.load_rom(data, CPUDIAG_ORIGIN)?;
        emu.apply_cpudiag_patches();
        let reason = emu.run_until_halt();
        Ok((emu, reason))
    }

    /// Execute a single instruction. Returns `true` once the CPU has
    /// halted.
    pub fn step(&mut self) -> bool {
        self.cpu.step(&mut self.bus)
    }

    /// Clock the CPU until it halts (BDOS trap, diag failure sentinel,
    /// or unknown opcode), or until [`MAX_STEPS`] instructions have run
    /// without halting.
    pub fn run_until_halt(&mut self) -> HaltReason {
        for _ in 0..MAX_STEPS {
            if self.cpu.step(&mut self.bus) {
                break;
            }
        }
        self.cpu
            .halt_reason
            .unwrap_or(HaltReason::UnknownOpcode(0))
    }

    /// Everything the BDOS shim has printed so far.
    pub fn bdos_output(&self) -> &str {
        self.bus.bdos_output()
    }
}

impl Default for Emu {
    fn default() -> Self {
        Self::new()
    }
}
