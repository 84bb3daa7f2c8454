//! Opcode decoding: opcode byte -> tagged instruction
//!
//! The source keeps a runtime `unordered_map<uint8_t, Instruction>` from
//! opcode to a pair of member-function pointers (an addressing-mode
//! preparer and an operation). That hashes on every fetch and gives the
//! compiler no way to check that every opcode is accounted for.
//!
//! Here `decode` is a total function over `u8`: every one of the 256
//! opcode values produces an [`Instruction`], falling back to
//! [`Op::Undefined`] for anything the original instruction table didn't
//! recognise (HLT, the RST vectors, IN, DI and the rest are simply
//! absent from that table, so they fault here too). The addressing-mode
//! tag is carried for documentation/tracing purposes; the actual operand
//! (which register, which flag condition, which ALU operation) is baked
//! directly into the `Op` variant rather than resolved through a second
//! pointer-chasing pass.

/// One of the seven 8080 general-purpose registers addressable by the
/// standard 3-bit register field. The eighth encoding (0b110) always
/// means "memory via HL" and is represented separately, never as a
/// `Reg8` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
}

/// A 16-bit register pair used by LXI/INX/DCX/DAD. `Sp` stands in for
/// the pair when the opcode addresses the stack pointer directly
/// instead of a register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegPair16 {
    Bc,
    De,
    Hl,
    Sp,
}

/// Which register pair STAX/LDAX addresses (only BC and DE are valid).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegPairBD {
    Bc,
    De,
}

/// The pair PUSH/POP move between the register file and the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPair {
    Bc,
    De,
    Hl,
    /// A and F packed together as the processor status word.
    Psw,
}

/// Flag test used by conditional jump/call/return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
    Po,
    Pe,
    P,
    M,
}

/// Which arithmetic/logical operation an ALU opcode performs. Shared
/// between the register, memory and immediate forms of each op so the
/// flag logic lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

/// Addressing mode tag, carried alongside `Op` for tracing/diagnostics.
/// Execution never branches on this; it branches on the `Op` variant,
/// which already carries its resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrModeTag {
    Implicit,
    Imm8,
    Imm16,
    Direct,
    RegDirect,
    RegIndirectBD,
    RegIndirectHl,
    RegIndirectSp,
    ImmRegIndirectHl,
}

/// The resolved operation an opcode performs. Every variant that needs
/// an operand carries it directly (a register, a condition, an ALU
/// kind) rather than leaving it to be resolved through a raw pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    LxiRp(RegPair16),
    Stax(RegPairBD),
    Ldax(RegPairBD),
    Inx(RegPair16),
    Dcx(RegPair16),
    Dad(RegPair16),
    InrReg(Reg8),
    DcrReg(Reg8),
    InrM,
    DcrM,
    MviReg(Reg8),
    MviM,
    Rlc,
    Rrc,
    Ral,
    Rar,
    Shld,
    Lhld,
    Cma,
    Daa,
    Sta,
    Lda,
    Stc,
    Cmc,
    MovRR(Reg8, Reg8),
    MovRM(Reg8),
    MovMR(Reg8),
    AluReg(AluOp, Reg8),
    AluM(AluOp),
    AluImm(AluOp),
    Jmp,
    JmpCond(Cond),
    Pchl,
    Call,
    CallCond(Cond),
    Ret,
    RetCond(Cond),
    Push(StackPair),
    Pop(StackPair),
    Xthl,
    Sphl,
    Xchg,
    Out,
    Ei,
    /// Opcode not present in the instruction table: decodes but faults
    /// the CPU the moment it would execute (HLT, RST, IN, DI and the
    /// Z80-only prefixes all land here).
    Undefined,
}

/// A decoded opcode: its mnemonic (for diagnostics), its addressing
/// mode tag, the operation to run, and its cycle cost.
///
/// `cycles` is the cost charged when a conditional jump/call/return is
/// *not* taken (and the unconditional cost for everything else).
/// `cycles_taken` is `Some` only for the conditional control-flow
/// opcodes, where taking the branch costs more.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub mode: AddrModeTag,
    pub op: Op,
    pub cycles: u8,
    pub cycles_taken: Option<u8>,
}

const fn instr(mnemonic: &'static str, mode: AddrModeTag, op: Op, cycles: u8) -> Instruction {
    Instruction {
        mnemonic,
        mode,
        op,
        cycles,
        cycles_taken: None,
    }
}

const fn branch_instr(
    mnemonic: &'static str,
    mode: AddrModeTag,
    op: Op,
    cycles_not_taken: u8,
    cycles_taken: u8,
) -> Instruction {
    Instruction {
        mnemonic,
        mode,
        op,
        cycles: cycles_not_taken,
        cycles_taken: Some(cycles_taken),
    }
}

/// Maps the standard 3-bit register field (bits 2-0 or 5-3 of an
/// opcode) to a register, or `None` for the memory-via-HL encoding
/// (0b110).
const fn reg_of(code: u8) -> Option<Reg8> {
    match code & 0x07 {
        0 => Some(Reg8::B),
        1 => Some(Reg8::C),
        2 => Some(Reg8::D),
        3 => Some(Reg8::E),
        4 => Some(Reg8::H),
        5 => Some(Reg8::L),
        6 => None,
        7 => Some(Reg8::A),
        _ => unreachable!(),
    }
}

const fn alu_kind(group: u8) -> AluOp {
    match group {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbb,
        4 => AluOp::Ana,
        5 => AluOp::Xra,
        6 => AluOp::Ora,
        7 => AluOp::Cmp,
        _ => unreachable!(),
    }
}

/// Decode a single opcode byte into its instruction. Total over `u8`:
/// opcodes the original instruction table never populated decode to
/// [`Op::Undefined`].
pub fn decode(opcode: u8) -> Instruction {
    // The MOV grid (0x40-0x7F) and the ALU grid (0x80-0xBF) follow a
    // regular bit pattern, so they're generated rather than spelled out
    // opcode by opcode. 0x76 (MOV M,M in the grid's own numbering) is
    // HLT on a real 8080 and is not in the original table, so it is
    // excluded here and falls through to the explicit match's
    // catch-all as Undefined.
    if (0x40..=0x7F).contains(&opcode) && opcode != 0x76 {
        let dst = reg_of(opcode >> 3);
        let src = reg_of(opcode);
        return match (dst, src) {
            (Some(d), Some(s)) => instr("MOV r,r", AddrModeTag::RegDirect, Op::MovRR(d, s), 5),
            (Some(d), None) => instr("MOV r,M", AddrModeTag::RegIndirectHl, Op::MovRM(d), 7),
            (None, Some(s)) => instr("MOV M,r", AddrModeTag::RegIndirectHl, Op::MovMR(s), 7),
            (None, None) => unreachable!("0x76 excluded above"),
        };
    }

    if (0x80..=0xBF).contains(&opcode) {
        let kind = alu_kind((opcode >> 3) & 0x07);
        return match reg_of(opcode) {
            Some(r) => instr("ALU r", AddrModeTag::RegDirect, Op::AluReg(kind, r), 4),
            None => instr("ALU M", AddrModeTag::RegIndirectHl, Op::AluM(kind), 7),
        };
    }

    match opcode {
        0x00 => instr("NOP", AddrModeTag::Implicit, Op::Nop, 4),
        0x01 => instr("LXI BC", AddrModeTag::Imm16, Op::LxiRp(RegPair16::Bc), 10),
        0x02 => instr(
            "STAX BC",
            AddrModeTag::RegIndirectBD,
            Op::Stax(RegPairBD::Bc),
            7,
        ),
        0x03 => instr("INX BC", AddrModeTag::RegDirect, Op::Inx(RegPair16::Bc), 5),
        0x04 => instr(
            "INR B",
            AddrModeTag::RegDirect,
            Op::InrReg(Reg8::B),
            5,
        ),
        0x05 => instr(
            "DCR B",
            AddrModeTag::RegDirect,
            Op::DcrReg(Reg8::B),
            5,
        ),
        0x06 => instr("MVI B,d", AddrModeTag::Imm8, Op::MviReg(Reg8::B), 7),
        0x07 => instr("RLC", AddrModeTag::Implicit, Op::Rlc, 4),
        0x09 => instr("DAD BC", AddrModeTag::RegDirect, Op::Dad(RegPair16::Bc), 10),
        0x0a => instr(
            "LDAX BC",
            AddrModeTag::RegIndirectBD,
            Op::Ldax(RegPairBD::Bc),
            7,
        ),
        0x0b => instr("DCX BC", AddrModeTag::RegDirect, Op::Dcx(RegPair16::Bc), 5),
        0x0c => instr("INR C", AddrModeTag::RegDirect, Op::InrReg(Reg8::C), 5),
        0x0d => instr("DCR C", AddrModeTag::RegDirect, Op::DcrReg(Reg8::C), 5),
        0x0e => instr("MVI C,d", AddrModeTag::Imm8, Op::MviReg(Reg8::C), 7),
        0x0f => instr("RRC", AddrModeTag::Implicit, Op::Rrc, 4),
        0x11 => instr("LXI DE", AddrModeTag::Imm16, Op::LxiRp(RegPair16::De), 10),
        0x12 => instr(
            "STAX DE",
            AddrModeTag::RegIndirectBD,
            Op::Stax(RegPairBD::De),
            7,
        ),
        0x13 => instr("INX DE", AddrModeTag::RegDirect, Op::Inx(RegPair16::De), 5),
        0x14 => instr("INR D", AddrModeTag::RegDirect, Op::InrReg(Reg8::D), 5),
        0x15 => instr("DCR D", AddrModeTag::RegDirect, Op::DcrReg(Reg8::D), 5),
        0x16 => instr("MVI D,d", AddrModeTag::Imm8, Op::MviReg(Reg8::D), 7),
        0x17 => instr("RAL", AddrModeTag::Implicit, Op::Ral, 4),
        0x19 => instr("DAD DE", AddrModeTag::RegDirect, Op::Dad(RegPair16::De), 10),
        0x1a => instr(
            "LDAX DE",
            AddrModeTag::RegIndirectBD,
            Op::Ldax(RegPairBD::De),
            7,
        ),
        0x1b => instr("DCX DE", AddrModeTag::RegDirect, Op::Dcx(RegPair16::De), 5),
        0x1c => instr("INR E", AddrModeTag::RegDirect, Op::InrReg(Reg8::E), 5),
        0x1d => instr("DCR E", AddrModeTag::RegDirect, Op::DcrReg(Reg8::E), 5),
        0x1e => instr("MVI E,d", AddrModeTag::Imm8, Op::MviReg(Reg8::E), 7),
        0x1f => instr("RAR", AddrModeTag::Implicit, Op::Rar, 4),
        0x21 => instr("LXI HL", AddrModeTag::Imm16, Op::LxiRp(RegPair16::Hl), 10),
        0x22 => instr("SHLD", AddrModeTag::Imm16, Op::Shld, 16),
        0x23 => instr("INX HL", AddrModeTag::RegDirect, Op::Inx(RegPair16::Hl), 5),
        0x24 => instr("INR H", AddrModeTag::RegDirect, Op::InrReg(Reg8::H), 5),
        0x25 => instr("DCR H", AddrModeTag::RegDirect, Op::DcrReg(Reg8::H), 5),
        0x26 => instr("MVI H,d", AddrModeTag::Imm8, Op::MviReg(Reg8::H), 7),
        0x27 => instr("DAA", AddrModeTag::Implicit, Op::Daa, 4),
        0x29 => instr("DAD HL", AddrModeTag::RegDirect, Op::Dad(RegPair16::Hl), 10),
        0x2a => instr("LHLD", AddrModeTag::Imm16, Op::Lhld, 16),
        0x2b => instr("DCX HL", AddrModeTag::RegDirect, Op::Dcx(RegPair16::Hl), 5),
        0x2c => instr("INR L", AddrModeTag::RegDirect, Op::InrReg(Reg8::L), 5),
        0x2d => instr("DCR L", AddrModeTag::RegDirect, Op::DcrReg(Reg8::L), 5),
        0x2e => instr("MVI L,d", AddrModeTag::Imm8, Op::MviReg(Reg8::L), 7),
        0x2f => instr("CMA", AddrModeTag::Implicit, Op::Cma, 4),
        0x31 => instr("LXI SP", AddrModeTag::Imm16, Op::LxiRp(RegPair16::Sp), 10),
        0x32 => instr("STA adr", AddrModeTag::Direct, Op::Sta, 13),
        0x33 => instr("INX SP", AddrModeTag::RegDirect, Op::Inx(RegPair16::Sp), 5),
        0x34 => instr("INR M", AddrModeTag::RegIndirectHl, Op::InrM, 10),
        0x35 => instr("DCR M", AddrModeTag::RegIndirectHl, Op::DcrM, 10),
        0x36 => instr("MVI M,d", AddrModeTag::ImmRegIndirectHl, Op::MviM, 10),
        0x37 => instr("STC", AddrModeTag::Implicit, Op::Stc, 4),
        0x39 => instr("DAD SP", AddrModeTag::RegDirect, Op::Dad(RegPair16::Sp), 10),
        0x3a => instr("LDA adr", AddrModeTag::Direct, Op::Lda, 13),
        0x3b => instr("DCX SP", AddrModeTag::RegDirect, Op::Dcx(RegPair16::Sp), 5),
        0x3c => instr("INR A", AddrModeTag::RegDirect, Op::InrReg(Reg8::A), 5),
        0x3d => instr("DCR A", AddrModeTag::RegDirect, Op::DcrReg(Reg8::A), 5),
        0x3e => instr("MVI A,d", AddrModeTag::Imm8, Op::MviReg(Reg8::A), 7),
        0x3f => instr("CMC", AddrModeTag::Implicit, Op::Cmc, 4),

        0xc0 => branch_instr("RNZ", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::Nz), 5, 11),
        0xc1 => instr("POP BC", AddrModeTag::RegDirect, Op::Pop(StackPair::Bc), 10),
        0xc2 => branch_instr("JNZ", AddrModeTag::Imm16, Op::JmpCond(Cond::Nz), 10, 10),
        0xc3 => instr("JMP", AddrModeTag::Imm16, Op::Jmp, 10),
        0xc4 => branch_instr("CNZ", AddrModeTag::Imm16, Op::CallCond(Cond::Nz), 11, 17),
        0xc5 => instr("PUSH BC", AddrModeTag::RegDirect, Op::Push(StackPair::Bc), 11),
        0xc6 => instr("ADI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Add), 7),
        0xc8 => branch_instr("RZ", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::Z), 5, 11),
        0xc9 => instr("RET", AddrModeTag::RegIndirectSp, Op::Ret, 10),
        0xca => branch_instr("JZ", AddrModeTag::Imm16, Op::JmpCond(Cond::Z), 10, 10),
        0xcc => branch_instr("CZ", AddrModeTag::Imm16, Op::CallCond(Cond::Z), 11, 17),
        0xcd => instr("CALL", AddrModeTag::Imm16, Op::Call, 17),
        0xce => instr("ACI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Adc), 7),
        0xd0 => branch_instr("RNC", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::Nc), 5, 11),
        0xd1 => instr("POP DE", AddrModeTag::RegDirect, Op::Pop(StackPair::De), 10),
        0xd2 => branch_instr("JNC", AddrModeTag::Imm16, Op::JmpCond(Cond::Nc), 10, 10),
        0xd3 => instr("OUT d", AddrModeTag::Direct, Op::Out, 10),
        0xd4 => branch_instr("CNC", AddrModeTag::Imm16, Op::CallCond(Cond::Nc), 11, 17),
        0xd5 => instr("PUSH DE", AddrModeTag::RegDirect, Op::Push(StackPair::De), 11),
        0xd6 => instr("SUI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Sub), 7),
        0xd8 => branch_instr("RC", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::C), 5, 11),
        0xda => branch_instr("JC", AddrModeTag::Imm16, Op::JmpCond(Cond::C), 10, 10),
        0xdc => branch_instr("CC", AddrModeTag::Imm16, Op::CallCond(Cond::C), 11, 17),
        0xde => instr("SBI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Sbb), 7),
        0xe0 => branch_instr("RPO", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::Po), 5, 11),
        0xe1 => instr("POP HL", AddrModeTag::RegDirect, Op::Pop(StackPair::Hl), 10),
        0xe2 => branch_instr("JPO", AddrModeTag::Imm16, Op::JmpCond(Cond::Po), 10, 10),
        0xe3 => instr("XTHL", AddrModeTag::Implicit, Op::Xthl, 18),
        0xe4 => branch_instr("CPO", AddrModeTag::Imm16, Op::CallCond(Cond::Po), 11, 17),
        0xe5 => instr("PUSH HL", AddrModeTag::RegDirect, Op::Push(StackPair::Hl), 11),
        0xe6 => instr("ANI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Ana), 7),
        0xe8 => branch_instr("RPE", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::Pe), 5, 11),
        0xe9 => instr("PCHL", AddrModeTag::RegDirect, Op::Pchl, 5),
        0xea => branch_instr("JPE", AddrModeTag::Imm16, Op::JmpCond(Cond::Pe), 10, 10),
        0xeb => instr("XCHG", AddrModeTag::RegDirect, Op::Xchg, 4),
        0xec => branch_instr("CPE", AddrModeTag::Imm16, Op::CallCond(Cond::Pe), 11, 17),
        0xee => instr("XRI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Xra), 7),
        0xf0 => branch_instr("RP", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::P), 5, 11),
        0xf1 => instr("POP PSW", AddrModeTag::Implicit, Op::Pop(StackPair::Psw), 10),
        0xf2 => branch_instr("JP", AddrModeTag::Imm16, Op::JmpCond(Cond::P), 10, 10),
        0xf4 => branch_instr("CP", AddrModeTag::Imm16, Op::CallCond(Cond::P), 11, 17),
        0xf5 => instr("PUSH PSW", AddrModeTag::RegDirect, Op::Push(StackPair::Psw), 11),
        0xf6 => instr("ORI d", AddrModeTag::Imm8, Op::AluImm(AluOp::Ora), 7),
        0xf8 => branch_instr("RM", AddrModeTag::RegIndirectSp, Op::RetCond(Cond::M), 5, 11),
        0xf9 => instr("SPHL", AddrModeTag::RegDirect, Op::Sphl, 5),
        0xfa => branch_instr("JM adr", AddrModeTag::Imm16, Op::JmpCond(Cond::M), 10, 10),
        0xfb => instr("EI", AddrModeTag::Implicit, Op::Ei, 4),
        0xfc => branch_instr("CM", AddrModeTag::Imm16, Op::CallCond(Cond::M), 11, 17),
        0xfe => instr("CPI A,d", AddrModeTag::Imm8, Op::AluImm(AluOp::Cmp), 7),

        _ => instr("...", AddrModeTag::Implicit, Op::Undefined, 1),
    }
}
