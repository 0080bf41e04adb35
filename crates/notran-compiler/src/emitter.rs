//! Byte emitter and voice/event tracker.
//!
//! Owns the code buffer exclusively until it is handed
//! back to the caller as a finished [`crate::CodeObject`]. Also owns the
//! four [`notran_core::voice::CompileVoiceState`] slots, the event
//! tracker, and the single SUB/ESB back-patch slot.

use notran_core::isa::{self, Command};
use notran_core::tables::{self, Accidental, DurationLetter, DurationModifier};
use notran_core::voice::CompileVoiceState;
use notran_core::{DURATION_INACTIVE, NUM_VOICES};

use crate::error::{CompileError, Result};
use crate::event::EventState;
use crate::lexer::{KeywordSpec, NotePitch, NoteSpec};

/// Per-line byte emitter, voice-state tracker and code buffer owner.
pub struct Emitter {
    code: Vec<u8>,
    voices: [CompileVoiceState; NUM_VOICES],
    event: EventState,
    sub_patch_addr: Option<usize>,
    base_address: u16,
    max_code_size: usize,
    done: bool,
    /// Non-fatal diagnostics raised while emitting (e.g. a clamped pitch)
    /// that don't stop encoding of the note that triggered them. Drained
    /// by the caller after each spec via [`Emitter::take_soft_diagnostics`].
    soft_diagnostics: Vec<CompileError>,
}

impl Emitter {
    /// Create an emitter with all voices inactive and an empty code buffer.
    pub fn new(base_address: u16, max_code_size: usize) -> Self {
        Self {
            code: Vec::new(),
            voices: [CompileVoiceState::default(); NUM_VOICES],
            event: EventState::Closed,
            sub_patch_addr: None,
            base_address,
            max_code_size,
            done: false,
            soft_diagnostics: Vec::new(),
        }
    }

    /// Drain any soft diagnostics (e.g. clamped pitches) accumulated since
    /// the last call. These are reported but don't prevent the triggering
    /// note from being encoded with its clamped value.
    pub fn take_soft_diagnostics(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.soft_diagnostics)
    }

    /// Current length of the code buffer, in bytes.
    pub fn offset(&self) -> u16 {
        self.code.len() as u16
    }

    /// Absolute address (`base + offset`) for the current write position.
    pub fn absolute_address(&self) -> u16 {
        self.base_address.wrapping_add(self.offset())
    }

    /// Whether `END` has already been emitted.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether a `SUB` is still unresolved (no matching `ESB` yet).
    pub fn has_hanging_sub(&self) -> bool {
        self.sub_patch_addr.is_some()
    }

    /// Consume the emitter, returning the finished code buffer.
    pub fn into_code(self) -> Vec<u8> {
        self.code
    }

    /// Whether an event is currently open (a keyword/label encountered
    /// here would need to force-close it first).
    pub fn event_open(&self) -> bool {
        self.event.is_open()
    }

    /// Force-close an open event without redistributing durations. Used
    /// for error recovery when an executable control or label is found
    /// mid-event; any voice still needing a note simply keeps needing one
    /// and will be picked up by the next note the source provides.
    pub fn force_close_event(&mut self) {
        self.event = EventState::Closed;
    }

    fn push_byte(&mut self, line: usize, byte: u8) -> Result<()> {
        if self.code.len() >= self.max_code_size {
            return Err(CompileError::CodeOverflow {
                line,
                max: self.max_code_size,
            });
        }
        self.code.push(byte);
        Ok(())
    }

    fn push_bytes(&mut self, line: usize, bytes: &[u8]) -> Result<()> {
        for byte in bytes {
            self.push_byte(line, *byte)?;
        }
        Ok(())
    }

    /// Apply one keyword specification, emitting bytecode and/or updating
    /// voice state as appropriate.
    pub fn apply_keyword(
        &mut self,
        line: usize,
        keyword: KeywordSpec,
        resolve: impl FnOnce(u32) -> Option<u16>,
    ) -> Result<()> {
        if self.event.is_open() {
            self.force_close_event();
            return Err(CompileError::ExecutableControlInEvent { line });
        }
        self.apply_keyword_inner(line, keyword, resolve)
    }

    fn apply_keyword_inner(
        &mut self,
        line: usize,
        keyword: KeywordSpec,
        resolve: impl FnOnce(u32) -> Option<u16>,
    ) -> Result<()> {
        match keyword {
            KeywordSpec::Nvc(n) => {
                let n = require_range(line, "NVC voice count", n, 1, 4)?;
                self.push_bytes(line, &[isa::command_byte(isa::OP_SETVOICES, 0), n])
            }
            KeywordSpec::Act(list) => {
                for raw in list {
                    let n = require_range(line, "ACT voice", raw, 1, 4)?;
                    let idx = n - 1;
                    self.push_bytes(line, &[isa::command_byte(isa::OP_ACTIVATE, 0), idx])?;
                    self.voices[idx as usize].activate();
                }
                Ok(())
            }
            KeywordSpec::Dct(list) => {
                for raw in list {
                    let n = require_range(line, "DCT voice", raw, 1, 4)?;
                    let idx = n - 1;
                    self.push_bytes(line, &[isa::command_byte(isa::OP_DEACTIVATE_OR_REST, 0), idx])?;
                    self.voices[idx as usize].deactivate();
                }
                Ok(())
            }
            KeywordSpec::Wav { waveform, voice } => {
                let waveform = require_range(line, "WAV waveform", waveform, 1, 16)?;
                let voice = require_range(line, "WAV voice", voice, 1, 4)?;
                let slot = &mut self.voices[(voice - 1) as usize];
                slot.waveform = (waveform - 1) as u8;
                slot.use_absolute = true;
                Ok(())
            }
            KeywordSpec::Tpo(t) => {
                let t = require_range(line, "TPO tempo", t, 1, 255)?;
                self.push_bytes(line, &[isa::command_byte(isa::OP_TEMPO, 0), t])
            }
            KeywordSpec::Abs => {
                for voice in &mut self.voices {
                    voice.use_absolute = true;
                }
                Ok(())
            }
            KeywordSpec::Jmp(id) => self.emit_control_transfer(line, isa::OP_JUMP, id, resolve),
            KeywordSpec::Jsr(id) => self.emit_control_transfer(line, isa::OP_CALL, id, resolve),
            KeywordSpec::Rts => self.push_byte(line, isa::command_byte(isa::OP_RETURN, 0)),
            KeywordSpec::Sub => {
                if self.sub_patch_addr.is_some() {
                    return Err(CompileError::NestedSub { line });
                }
                self.push_byte(line, isa::command_byte(isa::OP_JUMP, 0))?;
                self.sub_patch_addr = Some(self.code.len());
                self.push_bytes(line, &[0, 0])
            }
            KeywordSpec::Esb => {
                let addr = self
                    .sub_patch_addr
                    .take()
                    .ok_or(CompileError::EsbWithoutSub { line })?;
                let target = self.code.len() as u16;
                let [lo, hi] = target.to_le_bytes();
                self.code[addr] = lo;
                self.code[addr + 1] = hi;
                Ok(())
            }
            KeywordSpec::End => {
                self.push_byte(line, isa::command_byte(isa::OP_END, 0))?;
                self.done = true;
                Ok(())
            }
        }
    }

    fn emit_control_transfer(
        &mut self,
        line: usize,
        opcode: u8,
        id: u32,
        resolve: impl FnOnce(u32) -> Option<u16>,
    ) -> Result<()> {
        let id_byte = require_range(line, "identifier", id, 1, 255)?;
        let absolute = resolve(id_byte as u32).ok_or(CompileError::UndefinedIdentifier {
            line,
            id: id_byte,
        })?;
        let relative = absolute.wrapping_sub(self.base_address);
        let [lo, hi] = relative.to_le_bytes();
        self.push_bytes(line, &[isa::command_byte(opcode, 0), lo, hi])
    }

    /// Apply one note or rest specification.
    pub fn apply_note(&mut self, line: usize, note: NoteSpec) -> Result<()> {
        if !self.event.is_open() {
            if !self.voices.iter().any(CompileVoiceState::is_active) {
                return Err(CompileError::NoVoicesActive { line });
            }
            self.event = EventState::Open { cursor: 0 };
        }

        let cursor = match self.event {
            EventState::Open { cursor } => cursor,
            EventState::Closed => unreachable!("event was just opened above"),
        };

        let idx = (cursor..NUM_VOICES)
            .find(|&i| self.voices[i].needs_note())
            .ok_or_else(|| {
                CompileError::Other(format!(
                    "line {line}: event open but no voice slot from {cursor} needs a note"
                ))
            })?;

        if let Some(explicit) = note.voice {
            if explicit as usize != idx + 1 {
                return Err(CompileError::VoiceMismatch {
                    line,
                    expected: (idx + 1) as u8,
                    actual: explicit,
                });
            }
        }

        let duration_code = tables::duration_code(note.duration_letter, note.duration_modifier)
            .ok_or(CompileError::IllegalDuration { line })?;
        let time_units = tables::duration_time_units(duration_code)
            .expect("a valid duration code always has a time-units entry");

        match note.pitch {
            NotePitch::Rest => {
                self.push_byte(
                    line,
                    isa::command_byte(isa::OP_DEACTIVATE_OR_REST, duration_code),
                )?;
            }
            NotePitch::Pitch {
                letter,
                accidental,
                octave,
            } => {
                self.emit_pitched_note(line, idx, letter, accidental, octave, duration_code)?;
            }
        }

        self.voices[idx].remaining_duration = time_units as u8;
        let next_cursor = idx + 1;
        if self.any_active_voice_needs_note() {
            self.event = EventState::Open {
                cursor: next_cursor,
            };
        } else {
            self.close_event();
        }
        Ok(())
    }

    fn any_active_voice_needs_note(&self) -> bool {
        self.voices
            .iter()
            .any(|v| v.is_active() && v.needs_note())
    }

    fn close_event(&mut self) {
        let min = self
            .voices
            .iter()
            .filter(|v| v.is_active())
            .map(|v| v.remaining_duration)
            .min()
            .unwrap_or(0);
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.remaining_duration = voice.remaining_duration.saturating_sub(min);
            }
        }
        self.event = EventState::Closed;
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_pitched_note(
        &mut self,
        line: usize,
        idx: usize,
        letter: u8,
        accidental: Accidental,
        octave: Option<u8>,
        duration_code: u8,
    ) -> Result<()> {
        let no_octave_history = octave.is_none() && self.voices[idx].octave == 0;
        let octave = match octave {
            Some(o) => o,
            None => {
                if self.voices[idx].octave == 0 {
                    4
                } else {
                    self.voices[idx].octave
                }
            }
        };

        let (absolute_pitch, clamped) = tables::absolute_pitch(octave, letter, accidental)
            .ok_or(CompileError::IllegalDuration { line })?;
        if no_octave_history {
            log::warn!("line {line}: voice {idx} has no octave history, defaulting to octave 4");
            self.soft_diagnostics.push(CompileError::PitchOutOfRange {
                line,
                value: i32::from(tables::pitch_base(letter, accidental).unwrap_or(0)) - 12,
                clamped: absolute_pitch,
            });
        } else if clamped {
            log::warn!("line {line}: pitch out of range, clamped to {absolute_pitch}");
            self.soft_diagnostics.push(CompileError::PitchOutOfRange {
                line,
                value: i32::from(octave) * 12 + i32::from(
                    tables::pitch_base(letter, accidental).unwrap_or(0),
                ) - 12,
                clamped: absolute_pitch,
            });
        }

        let last_pitch = self.voices[idx].last_pitch;
        let delta = absolute_pitch - i32::from(last_pitch);
        let use_short =
            !self.voices[idx].use_absolute && last_pitch != 0 && (-7..=7).contains(&delta);

        if use_short {
            let nibble = isa::nibble_from_delta(delta as i8)
                .expect("eligibility check bounds delta to -7..=7");
            self.push_byte(line, isa::command_byte(nibble, duration_code))?;
        } else {
            let pitch_byte = (absolute_pitch * 2) as u8;
            let waveform_and_duration = (self.voices[idx].waveform << 4) | duration_code;
            self.push_bytes(
                line,
                &[
                    isa::command_byte(isa::OP_LONG_NOTE_ABS, 0),
                    pitch_byte,
                    waveform_and_duration,
                ],
            )?;
        }

        self.voices[idx].last_pitch = absolute_pitch as u8;
        self.voices[idx].octave = octave;
        self.voices[idx].use_absolute = false;
        Ok(())
    }
}

fn require_range(line: usize, what: &'static str, value: u32, lo: u32, hi: u32) -> Result<u8> {
    if value < lo || value > hi {
        return Err(CompileError::ArgumentOutOfRange {
            line,
            what,
            value: i64::from(value),
            expected: range_text(lo, hi),
        });
    }
    Ok(value as u8)
}

fn range_text(lo: u32, hi: u32) -> &'static str {
    match (lo, hi) {
        (1, 4) => "1..=4",
        (1, 16) => "1..=16",
        (1, 255) => "1..=255",
        _ => "out of range",
    }
}

/// Decode helper re-exported for tests/consumers that want to verify a
/// byte they just emitted round-trips through [`Command::decode`].
#[cfg(test)]
pub(crate) fn decode_last(bytes: &[u8]) -> Command {
    Command::decode(bytes[0], &bytes[1..])
}
