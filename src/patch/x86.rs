//! 32-bit x86 instruction encoding.
//!
//! Each encoder appends one instruction to a [`PatchBuilder`] and returns the
//! extended builder, so instructions chain naturally:
//!
//! ```
//! use asmpatch::{PatchBuilder, Reg32};
//!
//! let patch = PatchBuilder::new(0x0040_1000)
//!     .push(Reg32::Eax)
//!     .call(0x0040_2000)
//!     .pop(Reg32::Eax)
//!     .ret()
//!     .finalize();
//! assert_eq!(patch.len(), 8);
//! ```

use serde::{Deserialize, Serialize};

use super::codebuf::PatchBuilder;

/// x86 32-bit general-purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Reg32 {
    Eax = 0,
    Ecx = 1,
    Edx = 2,
    Ebx = 3,
    Esp = 4,
    Ebp = 5,
    Esi = 6,
    Edi = 7,
}

impl Reg32 {
    /// Get the register code OR-ed into PUSH/POP opcodes.
    pub fn code(self) -> u8 {
        (self as u8) & 0x7
    }
}

/// Opcode of a one-byte NOP.
pub const NOP: u8 = 0x90;
/// Opcode of CALL rel32.
pub const CALL_REL32: u8 = 0xE8;
/// Opcode of JMP rel32.
pub const JMP_REL32: u8 = 0xE9;
/// Size of a CALL/JMP rel32 instruction.
pub const REL32_INSN_LEN: usize = 5;

/// Displacement of a rel32 branch starting at `insn_start` and landing on `target`.
///
/// Relative branches count from the end of the instruction. The arithmetic
/// wraps at 32 bits, matching the address space of the target.
pub fn rel32(insn_start: usize, target: usize) -> u32 {
    (target as u32)
        .wrapping_sub(insn_start as u32)
        .wrapping_sub(REL32_INSN_LEN as u32)
}

impl PatchBuilder {
    /// NOP
    pub fn nop(self) -> Self {
        self.byte(NOP)
    }

    /// RET (near, no stack cleanup)
    pub fn ret(self) -> Self {
        self.byte(0xC3)
    }

    /// RET 4 (near, pops one stdcall argument)
    pub fn ret_near(self) -> Self {
        self.bytes(&[0xC2, 0x04, 0x00])
    }

    /// PUSH r32
    pub fn push(self, reg: Reg32) -> Self {
        self.byte(0x50 | reg.code())
    }

    /// POP r32
    pub fn pop(self, reg: Reg32) -> Self {
        self.byte(0x58 | reg.code())
    }

    /// PUSHFD
    pub fn pushf(self) -> Self {
        self.byte(0x9C)
    }

    /// POPFD
    pub fn popf(self) -> Self {
        self.byte(0x9D)
    }

    /// MOV ESP, EBP
    pub fn restore_stack_ptr(self) -> Self {
        self.bytes(&[0x8B, 0xE5])
    }

    /// CALL rel32 to the absolute address `target`.
    pub fn call(self, target: usize) -> Self {
        let disp = rel32(self.cursor(), target);
        self.byte(CALL_REL32).dword(disp)
    }

    /// JMP rel32 to the absolute address `target`.
    pub fn jmp(self, target: usize) -> Self {
        let disp = rel32(self.cursor(), target);
        self.byte(JMP_REL32).dword(disp)
    }

    /// CALL rel32 to the address of `func`.
    pub fn call_ptr<T>(self, func: *const T) -> Self {
        self.call(func as usize)
    }

    /// JMP rel32 to the address of `addr`.
    pub fn jmp_ptr<T>(self, addr: *const T) -> Self {
        self.jmp(addr as usize)
    }

    // ==================== Register shorthand ====================

    pub fn push_eax(self) -> Self {
        self.push(Reg32::Eax)
    }
    pub fn push_ecx(self) -> Self {
        self.push(Reg32::Ecx)
    }
    pub fn push_edx(self) -> Self {
        self.push(Reg32::Edx)
    }
    pub fn push_ebx(self) -> Self {
        self.push(Reg32::Ebx)
    }
    pub fn push_esp(self) -> Self {
        self.push(Reg32::Esp)
    }
    pub fn push_ebp(self) -> Self {
        self.push(Reg32::Ebp)
    }
    pub fn push_esi(self) -> Self {
        self.push(Reg32::Esi)
    }
    pub fn push_edi(self) -> Self {
        self.push(Reg32::Edi)
    }
    pub fn pop_eax(self) -> Self {
        self.pop(Reg32::Eax)
    }
    pub fn pop_ecx(self) -> Self {
        self.pop(Reg32::Ecx)
    }
    pub fn pop_edx(self) -> Self {
        self.pop(Reg32::Edx)
    }
    pub fn pop_ebx(self) -> Self {
        self.pop(Reg32::Ebx)
    }
    pub fn pop_esp(self) -> Self {
        self.pop(Reg32::Esp)
    }
    pub fn pop_ebp(self) -> Self {
        self.pop(Reg32::Ebp)
    }
    pub fn pop_esi(self) -> Self {
        self.pop(Reg32::Esi)
    }
    pub fn pop_edi(self) -> Self {
        self.pop(Reg32::Edi)
    }
}
