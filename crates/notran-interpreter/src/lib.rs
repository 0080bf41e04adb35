//! NOTRAN bytecode interpreter and phase-accumulator synthesis engine.
//!
//! Turns a [`notran_compiler::CodeObject`]'s bytes (or any byte stream
//! honoring the same ISA) plus a [`WavetableBank`] into a stream of
//! unsigned 8-bit mono samples, pulled in fixed-size chunks by the
//! caller rather than pushed to a sink.

#![warn(missing_docs)]

pub mod decoder;
pub mod error;
pub mod synth;
pub mod wavetable;

use serde::{Deserialize, Serialize};

use notran_core::tables::{self, DEFAULT_SAMPLE_RATE, NUM_NOTES};
use notran_core::voice::RuntimeVoiceState;
use notran_core::NUM_VOICES;

pub use error::{Result, RuntimeError};
pub use wavetable::WavetableBank;

/// Interpreter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Output sample rate, in Hz. Defaults to the original hardware
    /// tuning; the frequency-increment table is derived from whatever
    /// value is configured here.
    pub sample_rate: u32,
    /// Maximum number of `JUMP` opcodes to execute before terminating
    /// normally. `None` means unbounded.
    pub max_jumps: Option<u32>,
    /// Capacity of the `CALL`/`RETURN` return-address stack.
    pub call_stack_capacity: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_jumps: None,
            call_stack_capacity: 256,
        }
    }
}

/// Bytecode interpreter and synthesis engine.
///
/// Owns the code buffer, the return-address stack, the four
/// [`RuntimeVoiceState`] slots and the derived frequency table. The
/// wavetable bank is a borrowed, shared, read-only resource passed to
/// [`Interpreter::run_to_buffer`] rather than owned by the interpreter
/// itself.
pub struct Interpreter {
    code: Vec<u8>,
    pc: u16,
    voices: [RuntimeVoiceState; NUM_VOICES],
    call_stack: Vec<u16>,
    call_stack_capacity: usize,
    tempo: u8,
    declared_voice_count: u8,
    jumps_remaining: Option<u32>,
    stopped: bool,
    samples_remaining_in_event: u32,
    frequency_table: [u16; NUM_NOTES],
}

impl Interpreter {
    /// Create an interpreter over `code`, ready to run from offset 0.
    pub fn new(code: Vec<u8>, config: &InterpreterConfig) -> Self {
        Self {
            code,
            pc: 0,
            voices: [RuntimeVoiceState::new(); NUM_VOICES],
            call_stack: Vec::new(),
            call_stack_capacity: config.call_stack_capacity,
            tempo: 1,
            declared_voice_count: 0,
            jumps_remaining: config.max_jumps,
            stopped: false,
            samples_remaining_in_event: 0,
            frequency_table: tables::frequency_table(config.sample_rate),
        }
    }

    /// Whether the interpreter has terminated (normally or on a hard
    /// error) and will produce no further samples.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Current program counter, relative to the start of the code buffer
    /// passed to [`Interpreter::new`].
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Current tempo: the scaling factor from duration units to sample
    /// counts.
    pub fn tempo(&self) -> u8 {
        self.tempo
    }

    /// Read-only access to the four runtime voice slots, for tests and
    /// introspecting hosts.
    pub fn voices(&self) -> &[RuntimeVoiceState; NUM_VOICES] {
        &self.voices
    }

    /// Run the interpreter, filling `buffer` with up to `buffer.len()`
    /// unsigned 8-bit mono samples. Stops early (returning a short count)
    /// on `END`, jump-budget exhaustion, or a hard decode error (logged
    /// via `log::error!`); [`Interpreter::is_stopped`] distinguishes a
    /// short write caused by termination from one that merely ran out of
    /// ready samples (which can't happen here, since decoding is
    /// synchronous, but mirrors the audio sink's back-pressure contract).
    pub fn run_to_buffer(&mut self, buffer: &mut [u8], bank: &WavetableBank) -> usize {
        let mut written = 0;
        while written < buffer.len() {
            if self.stopped {
                break;
            }
            if self.samples_remaining_in_event == 0 {
                match self.decode_event() {
                    Ok(Some(duration_units)) => {
                        self.samples_remaining_in_event =
                            u32::from(self.tempo) * u32::from(duration_units);
                        continue;
                    }
                    Ok(None) => {
                        self.stopped = true;
                        break;
                    }
                    Err(err) => {
                        log::error!("notran interpreter: {err}");
                        self.stopped = true;
                        break;
                    }
                }
            }
            buffer[written] = synth::tick(&mut self.voices, bank);
            written += 1;
            self.samples_remaining_in_event -= 1;
        }
        written
    }
}
