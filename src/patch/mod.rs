//! Patch construction for 32-bit x86 targets.
//!
//! This module provides:
//! - An append-only byte buffer anchored at an absolute address
//! - x86 instruction encoders with rel32 fixups
//! - Composite idioms (stdcall epilogue, register-preserving call, padding,
//!   conditional-jump rewrite, calls into closures)
//! - The finalized, immutable patch handed to the memory writer

mod codebuf;
mod macros;
mod result;
pub mod x86;

pub use codebuf::PatchBuilder;
pub use macros::MAX_PAD_SIZE;
pub use result::PatchResult;
pub use x86::Reg32;

/// Start a patch at `addr`.
pub fn patch(addr: usize) -> PatchBuilder {
    PatchBuilder::new(addr)
}
