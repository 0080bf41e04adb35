//! Decode loop: fetches opcodes, dispatches control vs. note commands,
//! maintains the return-address stack and jump-budget counter.
//!
//! A guarded instruction loop that runs until either the current event's
//! notes are fully assigned or a control command interrupts it; jumps are
//! bounded by an optional budget so a malformed program can't spin the
//! host forever.

use notran_core::isa::{self, Command};
use notran_core::tables;

use crate::error::{Result, RuntimeError};
use crate::Interpreter;

impl Interpreter {
    /// Decode exactly one event: drain any pure control commands, then
    /// assign a note to every active voice that needs one. Returns the
    /// event's playback duration in time units, or `None` if the
    /// interpreter has stopped (clean termination, not an error).
    pub(crate) fn decode_event(&mut self) -> Result<Option<u16>> {
        loop {
            self.drain_controls()?;
            if self.stopped {
                return Ok(None);
            }
            if self.pc as usize >= self.code.len() {
                self.stopped = true;
                return Ok(None);
            }

            if !self.any_active_voice() {
                return Err(RuntimeError::NoActiveVoiceForNote { pc: self.pc });
            }

            let mut cursor = 0usize;
            let mut reentered_controls = false;
            while let Some(idx) = self.next_needs_note(cursor) {
                if self.pc as usize >= self.code.len() {
                    return Err(RuntimeError::UnexpectedEof { pc: self.pc });
                }
                let byte = self.code[self.pc as usize];
                let (high, low) = isa::split_command(byte);
                if Command::is_pure_control(high, low) {
                    reentered_controls = true;
                    break;
                }
                self.assign_note(idx)?;
                cursor = idx + 1;
            }

            if !reentered_controls {
                return Ok(Some(self.close_event()));
            }
            // A control command interrupted assignment; loop back and
            // drain it before resuming with the voices still pending.
        }
    }

    fn drain_controls(&mut self) -> Result<()> {
        loop {
            if self.stopped || self.pc as usize >= self.code.len() {
                return Ok(());
            }
            let byte = self.code[self.pc as usize];
            let (high, low) = isa::split_command(byte);
            if !Command::is_pure_control(high, low) {
                return Ok(());
            }

            let extra_len = Command::extra_bytes(high, low);
            let pc = self.pc as usize;
            let end = pc + 1 + extra_len;
            if end > self.code.len() {
                return Err(RuntimeError::UnexpectedEof { pc: self.pc });
            }
            let cmd = Command::decode(byte, &self.code[pc + 1..end]);
            self.pc = end as u16;
            self.execute_control(cmd)?;
        }
    }

    fn execute_control(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::End => self.stopped = true,
            Command::Tempo(t) => {
                if t == 0 {
                    log::warn!("TEMPO 0 is invalid, clamping to 1");
                    self.tempo = 1;
                } else {
                    self.tempo = t;
                }
            }
            Command::Call { target } => {
                self.check_target(target)?;
                if self.call_stack.len() >= self.call_stack_capacity {
                    return Err(RuntimeError::CallStackOverflow {
                        capacity: self.call_stack_capacity,
                    });
                }
                self.call_stack.push(self.pc);
                self.pc = target;
            }
            Command::Return => {
                self.pc = self
                    .call_stack
                    .pop()
                    .ok_or(RuntimeError::CallStackUnderflow)?;
            }
            Command::Jump { target } => {
                self.check_target(target)?;
                self.pc = target;
                if let Some(n) = self.jumps_remaining.as_mut() {
                    *n = n.saturating_sub(1);
                    if *n == 0 {
                        self.stopped = true;
                    }
                }
            }
            Command::SetVoices(n) => {
                let clamped = n.clamp(1, 4);
                if clamped != n {
                    log::warn!("SETVOICES {n} out of range, clamped to {clamped}");
                }
                self.declared_voice_count = clamped;
            }
            Command::Activate { voice } => self.voices[voice as usize].activate(),
            Command::Deactivate { voice } => self.voices[voice as usize].deactivate(),
            Command::Unknown { byte } => {
                log::warn!("unrecognized control byte 0x{byte:02x}, skipping");
            }
            // Short notes, rests and long notes never reach here: they
            // aren't "pure control" per `Command::is_pure_control`.
            Command::Rest { .. }
            | Command::ShortNote { .. }
            | Command::LongNoteAbs { .. }
            | Command::LongNoteRel { .. } => {
                unreachable!("note-type commands aren't pure control")
            }
        }
        Ok(())
    }

    fn check_target(&self, target: u16) -> Result<()> {
        if target as usize > self.code.len() {
            return Err(RuntimeError::TargetOutOfRange {
                target,
                code_len: self.code.len(),
            });
        }
        Ok(())
    }

    fn any_active_voice(&self) -> bool {
        self.voices.iter().any(|v| v.is_active())
    }

    fn next_needs_note(&self, cursor: usize) -> Option<usize> {
        (cursor..self.voices.len()).find(|&i| self.voices[i].is_active() && self.voices[i].needs_note())
    }

    fn assign_note(&mut self, idx: usize) -> Result<()> {
        let pc = self.pc as usize;
        let byte = self.code[pc];
        let (high, low) = isa::split_command(byte);
        let extra_len = Command::extra_bytes(high, low);
        let end = pc + 1 + extra_len;
        if end > self.code.len() {
            return Err(RuntimeError::UnexpectedEof { pc: self.pc });
        }
        let cmd = Command::decode(byte, &self.code[pc + 1..end]);
        self.pc = end as u16;

        match cmd {
            Command::Rest { duration_code } => {
                self.voices[idx].freq_increment = 0;
                self.voices[idx].remaining_duration = self.duration_units(duration_code);
            }
            Command::ShortNote { delta, duration_code } => {
                let last_pitch = i32::from(self.voices[idx].note_offset) / 2;
                self.set_pitch(idx, last_pitch + i32::from(delta));
                self.voices[idx].remaining_duration = self.duration_units(duration_code);
            }
            Command::LongNoteAbs {
                pitch_byte,
                waveform,
                duration_code,
            } => {
                self.voices[idx].wavetable_index = waveform;
                self.set_pitch(idx, i32::from(pitch_byte) / 2);
                self.voices[idx].remaining_duration = self.duration_units(duration_code);
            }
            Command::LongNoteRel {
                delta,
                waveform,
                duration_code,
            } => {
                self.voices[idx].wavetable_index = waveform;
                let last_pitch = i32::from(self.voices[idx].note_offset) / 2;
                self.set_pitch(idx, last_pitch + i32::from(delta));
                self.voices[idx].remaining_duration = self.duration_units(duration_code);
            }
            other => {
                return Err(RuntimeError::Other(format!(
                    "expected a note command at pc=0x{:04x}, got {other:?}",
                    self.pc
                )))
            }
        }
        Ok(())
    }

    fn set_pitch(&mut self, idx: usize, raw_note_id: i32) {
        let clamped = raw_note_id.clamp(1, (tables::NUM_NOTES - 1) as i32);
        if clamped != raw_note_id {
            log::warn!("voice {idx}: pitch {raw_note_id} out of range, clamped to {clamped}");
        }
        self.voices[idx].note_offset = (clamped * 2) as u8;
        self.voices[idx].freq_increment = self.frequency_table[clamped as usize];
    }

    fn duration_units(&self, duration_code: u8) -> u8 {
        match tables::duration_time_units(duration_code) {
            Some(units) => units as u8,
            None => {
                log::warn!("duration code {duration_code} has no time-units entry, using 1");
                1
            }
        }
    }

    fn close_event(&mut self) -> u16 {
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
        u16::from(min)
    }
}
