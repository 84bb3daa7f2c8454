//! WebAssembly bindings, built only with the `wasm` feature.
//!
//! Exposes the same surface as the C ABI in `lib.rs` -- create, load a
//! ROM, step or run to completion, read back BDOS output and register
//! state -- through `wasm-bindgen` for use from JavaScript.

use wasm_bindgen::prelude::*;

use crate::cpu::HaltReason;
use crate::emu::Emu;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Emulator instance wrapped for JavaScript consumption.
#[wasm_bindgen]
pub struct WasmEmu {
    inner: Emu,
}

#[wasm_bindgen]
impl WasmEmu {
    /// A fresh emulator with PC at 0x0000.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmEmu {
        WasmEmu { inner: Emu::new() }
    }

    /// A fresh emulator set up for the CPUDIAG self-test (PC at
    /// 0x0100, diag-failure sentinel armed).
    pub fn new_self_test() -> WasmEmu {
        WasmEmu {
            inner: Emu::new_self_test(),
        }
    }

    /// Load a raw ROM image at `origin`. Returns `true` on success.
    pub fn load_rom(&mut self, data: &[u8], origin: u16) -> bool {
        self.inner.load_rom(data, origin).is_ok()
    }

    /// Apply CPUDIAG's stack-pointer and DAA-skip patches.
    pub fn apply_cpudiag_patches(&mut self) {
        self.inner.apply_cpudiag_patches();
    }

    /// Execute one instruction. Returns `true` once halted.
    pub fn step(&mut self) -> bool {
        self.inner.step()
    }

    /// Clock until halted; returns the instruction count executed.
    pub fn run_until_halt(&mut self) -> u32 {
        let before = self.inner.cpu.op_count;
        self.inner.run_until_halt();
        (self.inner.cpu.op_count - before) as u32
    }

    /// Whether the CPU has halted.
    pub fn is_halted(&self) -> bool {
        self.inner.cpu.is_halted()
    }

    /// Human-readable reason the CPU halted, or an empty string if
    /// it's still running.
    pub fn halt_reason(&self) -> String {
        match self.inner.cpu.halt_reason {
            None => String::new(),
            Some(HaltReason::BdosCall) => "bdos-call".to_string(),
            Some(HaltReason::DiagFailure) => "diag-failure".to_string(),
            Some(HaltReason::UnknownOpcode(op)) => format!("unknown-opcode-0x{op:02x}"),
        }
    }

    /// Everything the BDOS shim has printed so far.
    pub fn bdos_output(&self) -> String {
        self.inner.bdos_output().to_string()
    }

    pub fn pc(&self) -> u16 {
        self.inner.cpu.pc
    }

    pub fn sp(&self) -> u16 {
        self.inner.cpu.sp
    }

    pub fn a(&self) -> u8 {
        self.inner.cpu.a
    }

    pub fn f(&self) -> u8 {
        self.inner.cpu.f
    }
}

impl Default for WasmEmu {
    fn default() -> Self {
        Self::new()
    }
}
