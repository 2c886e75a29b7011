use thiserror::Error;

/// Everything that can go wrong while loading or running a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmulatorError {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("Stack overflow: call at {address:#06x} with a full call stack")]
    StackOverflow { address: u16 },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,

    #[error("Cannot fetch an instruction at {address:#06x}")]
    InvalidFetch { address: u16 },

    #[error("Unknown opcode {opcode:#06x}")]
    UnknownOpcode { opcode: u16 },

    #[error("Memory access out of bounds at address {address:#06x}")]
    MemoryOutOfBounds { address: usize },

    #[error("Attempted to overwrite the font at address {address:#06x}")]
    ProtectedWrite { address: u16 },
}

impl EmulatorError {
    /// Whether execution can go on after this error.
    /// Only unknown opcodes can be stepped over.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EmulatorError::UnknownOpcode { .. })
    }
}

pub type Result<T> = std::result::Result<T, EmulatorError>;
