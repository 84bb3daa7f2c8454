//! Intel 8080 emulator core.
//!
//! A cycle-accounting interpreter for 8080 machine code, built to run
//! the classic CPUDIAG self-test: a flat 16 KiB memory bus, a CPU with
//! a dense opcode dispatch table, and a minimal CP/M BDOS console shim
//! (write-byte and write-`$`-terminated-string) that CPUDIAG uses to
//! report its results.
//!
//! No OS APIs are used beyond what the host needs to hand in a ROM
//! image; all I/O is through byte buffers and a plain-text output
//! string.
//!
//! # Modules
//!
//! - [`memory`]: the flat 16 KiB RAM array
//! - [`bus`]: routes CPU memory accesses and BDOS traps to RAM/shim
//! - [`bdos`]: the CP/M BDOS console shim (function codes 2 and 9)
//! - [`cpu`]: the 8080 interpreter itself
//! - [`emu`]: couples a CPU to a bus and drives the fetch/execute loop

pub mod bdos;
pub mod bus;
pub mod cpu;
mod emu;
pub mod memory;

#[cfg(feature = "wasm")]
mod wasm;

use std::slice;

pub use cpu::HaltReason;
pub use emu::{Emu, CPUDIAG_ORIGIN};
pub use memory::RomError;

/// Create a new emulator instance with a zeroed CPU and bus.
/// Returns null on allocation failure.
#[no_mangle]
pub extern "C" fn emu_create() -> *mut Emu {
    let emu = Box::new(Emu::new());
    Box::into_raw(emu)
}

/// Create an emulator instance configured for the CPUDIAG self-test:
/// PC starts at [`CPUDIAG_ORIGIN`] and a jump to 0x0000 mid-run is
/// treated as the diagnostic's failure sentinel.
#[no_mangle]
pub extern "C" fn emu_create_self_test() -> *mut Emu {
    let emu = Box::new(Emu::new_self_test());
    Box::into_raw(emu)
}

/// Destroy an emulator instance. Safe to call with a null pointer.
#[no_mangle]
pub extern "C" fn emu_destroy(emu: *mut Emu) {
    if !emu.is_null() {
        unsafe {
            drop(Box::from_raw(emu));
        }
    }
}

/// Load a raw ROM image into RAM at `origin`.
/// Returns 0 on success, -1 on a null pointer, -2 if the image does
/// not fit in the 16 KiB RAM window.
#[no_mangle]
pub extern "C" fn emu_load_rom(emu: *mut Emu, data: *const u8, len: usize, origin: u16) -> i32 {
    if emu.is_null() || data.is_null() {
        return -1;
    }

    let emu = unsafe { &mut *emu };
    let rom_data = unsafe { slice::from_raw_parts(data, len) };

    match emu.load_rom(rom_data, origin) {
        Ok(()) => 0,
        Err(_) => -2,
    }
}

/// Apply CPUDIAG's stack-pointer and DAA-skip compatibility patches.
/// Only meaningful after loading the diagnostic at [`CPUDIAG_ORIGIN`].
#[no_mangle]
pub extern "C" fn emu_apply_cpudiag_patches(emu: *mut Emu) {
    if emu.is_null() {
        return;
    }
    unsafe { &mut *emu }.apply_cpudiag_patches();
}

/// Execute a single instruction. Returns non-zero once the CPU has
/// halted.
#[no_mangle]
pub extern "C" fn emu_step(emu: *mut Emu) -> i32 {
    if emu.is_null() {
        return 1;
    }
    unsafe { &mut *emu }.step() as i32
}

/// Clock the CPU until it halts. Returns the number of instructions
/// executed.
#[no_mangle]
pub extern "C" fn emu_run_until_halt(emu: *mut Emu) -> u64 {
    if emu.is_null() {
        return 0;
    }
    let emu = unsafe { &mut *emu };
    let before = emu.cpu.op_count;
    emu.run_until_halt();
    emu.cpu.op_count - before
}

/// Copy the BDOS console output accumulated so far into `out`. Returns
/// the number of bytes written, or the required buffer size (as a
/// negative number) if `out` is too small.
#[no_mangle]
pub extern "C" fn emu_bdos_output(emu: *const Emu, out: *mut u8, cap: usize) -> i32 {
    if emu.is_null() {
        return 0;
    }

    let emu = unsafe { &*emu };
    let output = emu.bdos_output().as_bytes();
    if output.len() > cap {
        return -(output.len() as i32);
    }

    if !out.is_null() {
        let buffer = unsafe { slice::from_raw_parts_mut(out, output.len()) };
        buffer.copy_from_slice(output);
    }
    output.len() as i32
}

/// Read one of the CPU's 8-bit registers. `which` follows the 8080's
/// standard 3-bit register field encoding (0=B,1=C,2=D,3=E,4=H,5=L,
/// 6=F,7=A); any other value returns 0.
#[no_mangle]
pub extern "C" fn emu_get_reg8(emu: *const Emu, which: u8) -> u8 {
    if emu.is_null() {
        return 0;
    }
    let cpu = &unsafe { &*emu }.cpu;
    match which {
        0 => cpu.b,
        1 => cpu.c,
        2 => cpu.d,
        3 => cpu.e,
        4 => cpu.h,
        5 => cpu.l,
        6 => cpu.f,
        7 => cpu.a,
        _ => 0,
    }
}

/// Read the program counter.
#[no_mangle]
pub extern "C" fn emu_get_pc(emu: *const Emu) -> u16 {
    if emu.is_null() {
        return 0;
    }
    unsafe { &*emu }.cpu.pc
}

/// Read the stack pointer.
#[no_mangle]
pub extern "C" fn emu_get_sp(emu: *const Emu) -> u16 {
    if emu.is_null() {
        return 0;
    }
    unsafe { &*emu }.cpu.sp
}

/// Returns non-zero once the CPU has halted, and if non-null, writes a
/// reason code to `reason_out`: 0 = BDOS call, 1 = diag failure
/// sentinel, 2 = unknown opcode (in which case `reason_out[1]` is
/// unused -- query [`emu_get_pc`] for where it stopped).
#[no_mangle]
pub extern "C" fn emu_is_halted(emu: *const Emu, reason_out: *mut u8) -> i32 {
    if emu.is_null() {
        return 0;
    }
    let cpu = &unsafe { &*emu }.cpu;
    match cpu.halt_reason {
        None => 0,
        Some(reason) => {
            if !reason_out.is_null() {
                let code = match reason {
                    HaltReason::BdosCall => 0,
                    HaltReason::DiagFailure => 1,
                    HaltReason::UnknownOpcode(_) => 2,
                };
                unsafe { *reason_out = code };
            }
            1
        }
    }
}
