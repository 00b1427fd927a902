//! Declarative patch recipes (TOML).
//!
//! A recipe names the anchor address and lists the instructions to emit:
//!
//! ```toml
//! address = 0x401000
//!
//! [[op]]
//! kind = "safe_call"
//! target = 0x402000
//!
//! [[op]]
//! kind = "pad_to"
//! size = 16
//! ```
//!
//! Only position-independent operations are expressible. The conditional-jump
//! rewrite needs the live bytes of the target process and closure calls need
//! a closure, so both stay in the Rust API.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::patch::{PatchBuilder, PatchResult, Reg32};

/// One instruction (or idiom) in a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Op {
    Byte { value: u8 },
    Word { value: u16 },
    Dword { value: u32 },
    Bytes { values: Vec<u8> },
    Nop,
    Ret,
    RetNear,
    Push { reg: Reg32 },
    Pop { reg: Reg32 },
    Pushf,
    Popf,
    RestoreStackPtr,
    RetStdcallFull,
    Call { target: u64 },
    Jmp { target: u64 },
    SafeCall { target: u64 },
    PadTo { size: usize },
    Nops { count: usize },
}

/// A patch description loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecipe {
    pub address: u64,
    #[serde(default, rename = "op")]
    pub ops: Vec<Op>,
}

/// Recipes target 32-bit processes; wider addresses are a typo, not a patch.
fn address32(value: u64, what: &str) -> Result<usize> {
    u32::try_from(value)
        .map(|v| v as usize)
        .map_err(|_| Error::Recipe(format!("{} {:#x} does not fit in 32 bits", what, value)))
}

impl PatchRecipe {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Recipe(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Emit every op in order and finalize the patch.
    pub fn assemble(&self) -> Result<PatchResult> {
        let mut builder = PatchBuilder::new(address32(self.address, "address")?);
        for (index, op) in self.ops.iter().enumerate() {
            builder = Self::emit(builder, op).map_err(|e| match e {
                Error::Recipe(msg) => Error::Recipe(format!("op #{}: {}", index, msg)),
                other => other,
            })?;
        }
        Ok(builder.finalize())
    }

    fn emit(builder: PatchBuilder, op: &Op) -> Result<PatchBuilder> {
        tracing::trace!(cursor = format_args!("{:#x}", builder.cursor()), ?op, "emit");
        let builder = match *op {
            Op::Byte { value } => builder.byte(value),
            Op::Word { value } => builder.word(value),
            Op::Dword { value } => builder.dword(value),
            Op::Bytes { ref values } => builder.bytes(values),
            Op::Nop => builder.nop(),
            Op::Ret => builder.ret(),
            Op::RetNear => builder.ret_near(),
            Op::Push { reg } => builder.push(reg),
            Op::Pop { reg } => builder.pop(reg),
            Op::Pushf => builder.pushf(),
            Op::Popf => builder.popf(),
            Op::RestoreStackPtr => builder.restore_stack_ptr(),
            Op::RetStdcallFull => builder.ret_stdcall_full(),
            Op::Call { target } => builder.call(address32(target, "call target")?),
            Op::Jmp { target } => builder.jmp(address32(target, "jump target")?),
            Op::SafeCall { target } => builder.safe_call(address32(target, "call target")?),
            Op::PadTo { size } => builder.nop_pad_to_size(size)?,
            Op::Nops { count } => builder.nops(count)?,
        };
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_assemble() {
        let recipe = PatchRecipe::from_toml_str(
            r#"
address = 0x1000

[[op]]
kind = "push"
reg = "ebp"

[[op]]
kind = "jmp"
target = 0x1000

[[op]]
kind = "pad_to"
size = 8
"#,
        )
        .unwrap();

        assert_eq!(recipe.ops.len(), 3);
        let patch = recipe.assemble().unwrap();
        assert_eq!(patch.address(), 0x1000);
        // jmp starts at 0x1001: 0x1000 - 0x1006 = -6
        assert_eq!(
            patch.bytes(),
            &[0x55, 0xE9, 0xFA, 0xFF, 0xFF, 0xFF, 0x90, 0x90]
        );
    }

    #[test]
    fn test_empty_recipe() {
        let patch = PatchRecipe::from_toml_str("address = 16").unwrap().assemble().unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_unknown_kind() {
        let err = PatchRecipe::from_toml_str("address = 0\n[[op]]\nkind = \"hlt\"\n");
        assert!(matches!(err, Err(Error::Recipe(_))));
    }

    #[test]
    fn test_wide_address_rejected() {
        let recipe = PatchRecipe {
            address: 0,
            ops: vec![Op::Call {
                target: 0x1_0000_0000,
            }],
        };
        let err = recipe.assemble().unwrap_err();
        assert!(err.to_string().contains("op #0"));
    }

    #[test]
    fn test_bad_padding_propagates() {
        let recipe = PatchRecipe {
            address: 0,
            ops: vec![Op::Dword { value: 1 }, Op::PadTo { size: 2 }],
        };
        assert!(matches!(
            recipe.assemble(),
            Err(Error::InvalidPad {
                requested: 2,
                current: 4
            })
        ));
    }

    #[test]
    fn test_huge_nop_count_rejected() {
        let recipe = PatchRecipe::from_toml_str(
            "address = 0\n[[op]]\nkind = \"nop\"\n[[op]]\nkind = \"nops\"\ncount = 4294967295\n",
        )
        .unwrap();
        assert!(matches!(recipe.assemble(), Err(Error::InvalidPad { current: 1, .. })));
    }

    #[test]
    fn test_entries_are_tagged_by_kind() {
        let recipe = PatchRecipe::from_toml_str("address = 0\n[[op]]\nkind = \"pushf\"\n").unwrap();
        assert_eq!(recipe.ops.len(), 1);
        assert!(matches!(recipe.ops[0], Op::Pushf));

        let err = PatchRecipe::from_toml_str("address = 0\n[[op]]\nop = \"pushf\"\n");
        assert!(matches!(err, Err(Error::Recipe(_))));
    }
}
