//! Multi-instruction idioms built on the encoders.

use super::codebuf::PatchBuilder;
use super::x86::{JMP_REL32, NOP};
use crate::error::{Error, Result};
use crate::trampoline::{
    self, CdeclCall, Convention, FastCall, IntoFnPtr, StdCall, ThisCall, Trampolines,
};

/// Largest size NOP padding may grow a patch to.
pub const MAX_PAD_SIZE: usize = 64 * 1024;

impl PatchBuilder {
    /// Standard stdcall epilogue:
    /// `pop edi; pop esi; pop ebx; mov esp, ebp; pop ebp; ret 4`.
    pub fn ret_stdcall_full(self) -> Self {
        self.pop_edi()
            .pop_esi()
            .pop_ebx()
            .restore_stack_ptr()
            .pop_ebp()
            .ret_near()
    }

    /// Call `target` with EFLAGS, EAX, ECX and EDX preserved around it.
    pub fn safe_call(self, target: usize) -> Self {
        self.pushf()
            .push_eax()
            .push_ecx()
            .push_edx()
            .call(target)
            .pop_edx()
            .pop_ecx()
            .pop_eax()
            .popf()
    }

    /// [`safe_call`](Self::safe_call) to the address of `func`.
    pub fn safe_call_ptr<T>(self, func: *const T) -> Self {
        self.safe_call(func as usize)
    }

    /// Fill with NOPs until the patch is exactly `size` bytes long.
    ///
    /// Padding only grows a patch: `size` must exceed the current length and
    /// stay within [`MAX_PAD_SIZE`].
    pub fn nop_pad_to_size(self, size: usize) -> Result<Self> {
        let current = self.len();
        if size <= current || size > MAX_PAD_SIZE {
            return Err(Error::InvalidPad {
                requested: size,
                current,
            });
        }
        let fill = vec![NOP; size - current];
        Ok(self.bytes(&fill))
    }

    /// Append `count` NOPs.
    pub fn nops(self, count: usize) -> Result<Self> {
        let size = self.len().saturating_add(count);
        self.nop_pad_to_size(size)
    }

    /// Check that live memory at the cursor holds a `0F 8x` (Jcc rel32).
    ///
    /// Returns the second opcode byte. The builder is not modified.
    ///
    /// # Safety
    /// The two bytes at [`cursor`](Self::cursor) must be mapped and readable
    /// in this process.
    pub unsafe fn conditional_jump_at_cursor(&self) -> Result<u8> {
        let address = self.cursor();
        // SAFETY: the caller guarantees the cursor points at readable memory.
        let found = unsafe { std::ptr::read_unaligned(address as *const [u8; 2]) };
        if found[0] != 0x0F || (found[1] & 0xF0) != 0x80 {
            return Err(Error::NoConditionalJump { address, found });
        }
        Ok(found[1])
    }

    /// Turn the Jcc rel32 at the cursor into `nop; jmp rel32`.
    ///
    /// Appends `90 E9`, so the six-byte conditional jump becomes an
    /// unconditional one once the caller appends a 4-byte displacement. When
    /// the live bytes are not a conditional jump nothing is appended and the
    /// untouched builder comes back alongside the error. Use
    /// [`conditional_jump_at_cursor`](Self::conditional_jump_at_cursor) to
    /// check without consuming the builder at all.
    ///
    /// # Safety
    /// Same as [`conditional_jump_at_cursor`](Self::conditional_jump_at_cursor).
    pub unsafe fn condjmp_to_nopjmp(self) -> std::result::Result<Self, (Self, Error)> {
        // SAFETY: forwarded to the caller.
        let opcode = match unsafe { self.conditional_jump_at_cursor() } {
            Ok(opcode) => opcode,
            Err(err) => return Err((self, err)),
        };
        tracing::trace!(
            address = format_args!("{:#x}", self.cursor()),
            opcode = format_args!("0F {:02X}", opcode),
            "rewriting conditional jump"
        );
        Ok(self.byte(NOP).byte(JMP_REL32))
    }

    /// Call a closure through a stdcall trampoline.
    pub fn call_closure<Args, F>(self, f: F) -> Result<Self>
    where
        F: IntoFnPtr<StdCall, Args>,
    {
        self.call_closure_by::<StdCall, Args, F>(f)
    }

    /// Call a closure through a cdecl trampoline.
    pub fn call_closure_cdecl<Args, F>(self, f: F) -> Result<Self>
    where
        F: IntoFnPtr<CdeclCall, Args>,
    {
        self.call_closure_by::<CdeclCall, Args, F>(f)
    }

    /// Call a closure through a thiscall trampoline.
    pub fn call_closure_thiscall<Args, F>(self, f: F) -> Result<Self>
    where
        F: IntoFnPtr<ThisCall, Args>,
    {
        self.call_closure_by::<ThisCall, Args, F>(f)
    }

    /// Call a closure through a fastcall trampoline.
    pub fn call_closure_fastcall<Args, F>(self, f: F) -> Result<Self>
    where
        F: IntoFnPtr<FastCall, Args>,
    {
        self.call_closure_by::<FastCall, Args, F>(f)
    }

    /// Call a closure through a trampoline with convention `C`.
    pub fn call_closure_by<C, Args, F>(self, f: F) -> Result<Self>
    where
        C: Convention,
        F: IntoFnPtr<C, Args>,
    {
        let ptr = trampoline::create_fn_ptr_by::<C, Args, F>(f)?;
        Ok(self.call(<F as IntoFnPtr<C, Args>>::addr(ptr)))
    }

    /// Like [`call_closure_by`](Self::call_closure_by), under the budget of `trampolines`.
    pub fn call_closure_with<C, Args, F>(self, trampolines: &Trampolines, f: F) -> Result<Self>
    where
        C: Convention,
        F: IntoFnPtr<C, Args>,
    {
        let ptr = trampolines.fn_ptr::<C, Args, F>(f)?;
        Ok(self.call(<F as IntoFnPtr<C, Args>>::addr(ptr)))
    }
}
