//! asmpatch - runtime machine-code patches for 32-bit x86
//!
//! This library builds short instruction sequences anchored at an absolute
//! address and hands them back as a [`PatchResult`] for an external writer to
//! copy into executable memory. The [`trampoline`] module turns closures into
//! plain function pointers so patched code can call back into Rust.

pub mod config;
pub mod error;
pub mod patch;
pub mod recipe;
pub mod trampoline;

// Re-export commonly used types
pub use config::{PatchConfig, TrampolineConfig};
pub use error::{Error, Result};
pub use patch::{PatchBuilder, PatchResult, Reg32, patch};
pub use trampoline::{CallingConvention, Trampolines};
