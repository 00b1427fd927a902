//! Calling conventions a trampoline can be generated for.

/// x86 calling convention of a generated dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    /// Callee cleans the stack, arguments pushed right to left
    #[default]
    StdCall,
    /// Caller cleans the stack
    CdeclCall,
    /// Like stdcall, first argument (`this`) in ECX
    ThisCall,
    /// First two arguments in ECX/EDX, callee cleans the rest
    FastCall,
}

impl CallingConvention {
    /// Name of the Rust ABI string the dispatcher is declared with on x86.
    pub fn abi_name(self) -> &'static str {
        match self {
            CallingConvention::StdCall => "stdcall",
            CallingConvention::CdeclCall => "cdecl",
            CallingConvention::ThisCall => "thiscall",
            CallingConvention::FastCall => "fastcall",
        }
    }
}

impl std::fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abi_name())
    }
}

/// Type-level calling convention, selecting the dispatcher's linkage.
pub trait Convention: Send + Sync + 'static {
    const KIND: CallingConvention;
}

/// `extern "stdcall"` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdCall;

/// `extern "cdecl"` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdeclCall;

/// `extern "thiscall"` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThisCall;

/// `extern "fastcall"` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastCall;

impl Convention for StdCall {
    const KIND: CallingConvention = CallingConvention::StdCall;
}

impl Convention for CdeclCall {
    const KIND: CallingConvention = CallingConvention::CdeclCall;
}

impl Convention for ThisCall {
    const KIND: CallingConvention = CallingConvention::ThisCall;
}

impl Convention for FastCall {
    const KIND: CallingConvention = CallingConvention::FastCall;
}
