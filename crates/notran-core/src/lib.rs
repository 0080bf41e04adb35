//! Shared bytecode ISA, static tables and voice-state types for NOTRAN.
//!
//! This crate is the single authoritative definition of the NOTRAN
//! bytecode contract: the opcode layout (`isa`), the static lookup tables
//! derived from it (`tables`), and the per-voice state shapes shared by
//! the compiler and the interpreter (`voice`). Neither `notran-compiler`
//! nor `notran-interpreter` duplicates any of these constants.

#![warn(missing_docs)]

pub mod isa;
pub mod tables;
pub mod voice;

mod error;

pub use error::{CoreError, Result};

/// Number of voice slots the synthesizer supports.
pub const NUM_VOICES: usize = 4;

/// Number of bytes in one wavetable.
pub const WAVETABLE_SIZE: usize = 256;

/// Sentinel `remaining_duration` meaning "this voice is not participating".
pub const DURATION_INACTIVE: u8 = 0xFF;

/// Sentinel `remaining_duration` meaning "active, but needs a note this event".
pub const DURATION_NEEDS_NOTE: u8 = 0x00;
