//! Error type shared by the builder, the trampolines and the front-end.

use thiserror::Error;

/// Errors raised while constructing a patch.
#[derive(Debug, Error)]
pub enum Error {
    /// Padding was asked to keep or shrink the patch, or to exceed the pad limit.
    #[error("cannot pad patch from {current} to {requested} bytes")]
    InvalidPad { requested: usize, current: usize },

    /// The live bytes at the cursor are not a `0F 8x` conditional jump.
    #[error(
        "no conditional jump at {address:#x} (found {:02X} {:02X})",
        .found[0],
        .found[1]
    )]
    NoConditionalJump { address: usize, found: [u8; 2] },

    /// A closure does not fit the trampoline's inline storage.
    #[error("closure needs {required} bytes of inline storage, budget is {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid patch recipe: {0}")]
    Recipe(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
