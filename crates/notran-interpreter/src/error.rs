//! Error handling for the NOTRAN interpreter.
//!
//! One `thiserror`-derived enum, a local `Result<T>` alias, and
//! `From<String>`/`From<&str>` for a catch-all variant. Only the *hard*
//! error kinds from the decode loop's error catalogue are represented
//! here — soft conditions are logged and clamped inline, never surfaced
//! as `Err`.

use thiserror::Error;

/// Result alias used throughout `notran-interpreter`.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Fatal interpreter errors: decode-loop invariants a well-formed program
/// never violates, but a malformed or adversarial byte stream can.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `CALL` pushed past the return-address stack's configured capacity.
    #[error("call stack overflow (capacity {capacity})")]
    CallStackOverflow {
        /// Configured `InterpreterConfig::call_stack_capacity`.
        capacity: usize,
    },

    /// `RETURN` executed with an empty return-address stack.
    #[error("call stack underflow")]
    CallStackUnderflow,

    /// `CALL`/`JUMP` target address lies outside the code buffer.
    #[error("jump/call target 0x{target:04x} outside code (length {code_len})")]
    TargetOutOfRange {
        /// The rejected target address.
        target: u16,
        /// Length of the code buffer, in bytes.
        code_len: usize,
    },

    /// The byte stream ended mid-instruction (not enough operand bytes
    /// remaining for the opcode that was just decoded).
    #[error("unexpected end of code stream at pc=0x{pc:04x}")]
    UnexpectedEof {
        /// Program counter at the start of the truncated instruction.
        pc: u16,
    },

    /// A note-type byte was encountered while assigning notes to an event,
    /// but no voice is currently active to receive it.
    #[error("note byte at pc=0x{pc:04x} encountered with no active voice")]
    NoActiveVoiceForNote {
        /// Program counter of the offending byte.
        pc: u16,
    },

    /// Generic error carrying a free-text message.
    #[error("{0}")]
    Other(String),
}

impl From<notran_core::CoreError> for RuntimeError {
    fn from(err: notran_core::CoreError) -> Self {
        RuntimeError::Other(err.to_string())
    }
}

impl From<String> for RuntimeError {
    fn from(msg: String) -> Self {
        RuntimeError::Other(msg)
    }
}

impl From<&str> for RuntimeError {
    fn from(msg: &str) -> Self {
        RuntimeError::Other(msg.to_string())
    }
}
