//! Phase-accumulator synthesis engine.
//!
//! A small free function that turns per-voice state into one output
//! sample and advances each voice's phase accumulator.

use notran_core::voice::RuntimeVoiceState;
use notran_core::NUM_VOICES;

use crate::wavetable::WavetableBank;

/// Produce one output sample from the current voice states, then advance
/// every contributing voice's phase accumulator.
///
/// Silent voices (`freq_increment == 0`) and voices whose
/// `wavetable_index` has no matching table in `bank` are skipped for both
/// the mix and the phase advance.
pub fn tick(voices: &mut [RuntimeVoiceState; NUM_VOICES], bank: &WavetableBank) -> u8 {
    let mut accumulator: u16 = 0;

    for voice in voices.iter() {
        if !voice.is_active() || voice.freq_increment == 0 {
            continue;
        }
        if let Some(table) = bank.get(voice.wavetable_index) {
            accumulator = accumulator.saturating_add(u16::from(table[voice.phase_int as usize]));
        }
    }

    let sample = accumulator.min(255) as u8;

    for voice in voices.iter_mut() {
        if voice.is_active() && voice.freq_increment != 0 && bank.get(voice.wavetable_index).is_some() {
            voice.advance_phase();
        }
    }

    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use notran_core::WAVETABLE_SIZE;

    fn single_table_bank(value: u8) -> WavetableBank {
        WavetableBank::from_bytes(&[value; WAVETABLE_SIZE]).unwrap()
    }

    #[test]
    fn silent_voice_contributes_nothing() {
        let mut voices = [RuntimeVoiceState::new(); NUM_VOICES];
        voices[0].remaining_duration = 10;
        voices[0].freq_increment = 0;
        let bank = single_table_bank(200);
        assert_eq!(tick(&mut voices, &bank), 0);
    }

    #[test]
    fn saturating_mix_clamps_to_255() {
        let mut voices = [RuntimeVoiceState::new(); NUM_VOICES];
        for v in &mut voices {
            v.remaining_duration = 10;
            v.freq_increment = 1;
        }
        let bank = single_table_bank(100);
        // 4 voices * 100 = 400, clamped to 255.
        assert_eq!(tick(&mut voices, &bank), 255);
    }

    #[test]
    fn out_of_range_wavetable_index_is_skipped() {
        let mut voices = [RuntimeVoiceState::new(); NUM_VOICES];
        voices[0].remaining_duration = 10;
        voices[0].freq_increment = 1;
        voices[0].wavetable_index = 5;
        let bank = single_table_bank(255);
        assert_eq!(tick(&mut voices, &bank), 0);
    }

    #[test]
    fn phase_advances_by_freq_increment() {
        let mut voices = [RuntimeVoiceState::new(); NUM_VOICES];
        voices[0].remaining_duration = 10;
        voices[0].freq_increment = 0x0105;
        let bank = single_table_bank(0);
        tick(&mut voices, &bank);
        assert_eq!(voices[0].phase(), 0x0105);
    }
}
