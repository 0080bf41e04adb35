//! Static/derived lookup tables backing the compiler's note parser and the
//! interpreter's synthesis engine.

/// Default interpreter sample rate, matching the original hardware tuning.
pub const DEFAULT_SAMPLE_RATE: u32 = 8772;

/// Number of entries in the frequency-increment table (note IDs 0..61).
pub const NUM_NOTES: usize = 62;

/// Reference pitch used to anchor the equal-tempered frequency table:
/// note ID `A4_NOTE_ID` sounds at `A4_FREQUENCY_HZ`.
const A4_NOTE_ID: i32 = 46;
const A4_FREQUENCY_HZ: f64 = 440.0;

/// Pitch-letter base table.
///
/// Indexed by `(letter_ordinal) * 3 + accidental`, where `letter_ordinal`
/// is the letter's 1-based position in the alphabet (A=1 .. G=7) and
/// `accidental` is -1 (flat), 0 (natural) or +1 (sharp). This gives index
/// range 2..=22 (21 populated entries); indices 0 and 1 are unused
/// sentinels and are never read by [`pitch_base`].
///
/// Values are chromatic positions in a C=1 scale (C=1, C#=2, D=3, ...,
/// B=12, with wraparound for enharmonic edge cases like `Cb`=0 and `B#`=13
/// handled by the surrounding octave arithmetic in the compiler).
#[rustfmt::skip]
const PITCH_TABLE: [u8; 23] = [
    0xFF, 0xFF, //  0,  1: unused
    9,          //  2: Ab
    10,         //  3: A
    11,         //  4: A#
    11,         //  5: Bb
    12,         //  6: B
    13,         //  7: B#
    0,          //  8: Cb
    1,          //  9: C
    2,          // 10: C#
    2,          // 11: Db
    3,          // 12: D
    4,          // 13: D#
    4,          // 14: Eb
    5,          // 15: E
    6,          // 16: E#
    5,          // 17: Fb
    6,          // 18: F
    7,          // 19: F#
    7,          // 20: Gb
    8,          // 21: G
    9,          // 22: G#
];

/// An accidental modifying a pitch letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    /// `@` in NOTRAN source.
    Flat,
    /// No accidental.
    Natural,
    /// `#` in NOTRAN source.
    Sharp,
}

impl Accidental {
    fn offset(self) -> i32 {
        match self {
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
        }
    }
}

/// Look up the chromatic base value (0..13) for a pitch letter + accidental.
///
/// `letter` must be an uppercase ASCII byte in `'A'..='G'`; anything else
/// is a logic error in the caller (the tokenizer only ever produces
/// letters in that range) and returns `None`.
pub fn pitch_base(letter: u8, accidental: Accidental) -> Option<u8> {
    if !letter.is_ascii_uppercase() || !(b'A'..=b'G').contains(&letter) {
        return None;
    }
    let ordinal = i32::from(letter - b'A') + 1;
    let index = ordinal * 3 + accidental.offset();
    PITCH_TABLE.get(index as usize).copied().filter(|&v| v != 0xFF)
}

/// Compute an absolute pitch (1..61) from octave + pitch letter + accidental.
///
/// Returns `None` if the letter is invalid; returns `Some(clamped)` when
/// the raw value falls outside `1..=61` (callers are expected to report an
/// error and use the clamped value to keep compiling). Per spec, an
/// out-of-range pitch — too low or too high — is clamped to the maximum
/// (61), not saturated to the nearer bound.
pub fn absolute_pitch(octave: u8, letter: u8, accidental: Accidental) -> Option<(i32, bool)> {
    let base = pitch_base(letter, accidental)?;
    let raw = i32::from(octave) * 12 + i32::from(base) - 12;
    let out_of_range = !(1..=61).contains(&raw);
    let clamped = if out_of_range { 61 } else { raw };
    Some((clamped, out_of_range))
}

/// A duration letter (`W`, `H`, `Q`, `E`, `S`, `T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationLetter {
    /// Whole note.
    Whole,
    /// Half note.
    Half,
    /// Quarter note.
    Quarter,
    /// Eighth note.
    Eighth,
    /// Sixteenth note.
    Sixteenth,
    /// Thirty-second note.
    ThirtySecond,
}

impl DurationLetter {
    /// Parse a duration letter from its NOTRAN source character.
    pub fn from_char(c: u8) -> Option<Self> {
        match c {
            b'W' => Some(Self::Whole),
            b'H' => Some(Self::Half),
            b'Q' => Some(Self::Quarter),
            b'E' => Some(Self::Eighth),
            b'S' => Some(Self::Sixteenth),
            b'T' => Some(Self::ThirtySecond),
            _ => None,
        }
    }
}

/// A duration modifier: none, dotted, or triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationModifier {
    /// No modifier.
    None,
    /// `.` suffix: dotted (1.5x).
    Dotted,
    /// `3` suffix: triplet.
    Triplet,
}

/// Duration code table: `[letter][modifier]`, 0 = invalid combination.
///
/// Order: W, W., H, H., H3, Q, Q., Q3, E, E., E3, S, S., S3, T assigns
/// codes 1..15 in that order; `W3` and `T.`/`T3` are invalid (0).
const DURATION_CODES: [[u8; 3]; 6] = [
    [1, 2, 0],  // Whole: base, dotted, (no triplet)
    [3, 4, 5],  // Half
    [6, 7, 8],  // Quarter
    [9, 10, 11], // Eighth
    [12, 13, 14], // Sixteenth
    [15, 0, 0], // ThirtySecond: base only
];

/// Time-unit value for each duration code (index 1..15; index 0 unused).
const DURATION_TIME_UNITS: [u16; 16] = [
    0, 192, 144, 96, 72, 64, 48, 36, 32, 24, 18, 16, 12, 9, 8, 6,
];

/// Resolve `(letter, modifier)` to a duration code (1..15), or `None` if
/// the combination is invalid (code 0 in the table above).
pub fn duration_code(letter: DurationLetter, modifier: DurationModifier) -> Option<u8> {
    let row = DURATION_CODES[letter as usize];
    let code = match modifier {
        DurationModifier::None => row[0],
        DurationModifier::Dotted => row[1],
        DurationModifier::Triplet => row[2],
    };
    if code == 0 { None } else { Some(code) }
}

/// Time-units value for a duration code (1..15).
pub fn duration_time_units(code: u8) -> Option<u16> {
    DURATION_TIME_UNITS.get(code as usize).copied().filter(|&v| v != 0)
}

/// Build the 62-entry frequency-increment table for a given sample rate.
///
/// Equal tempered, anchored so note ID [`A4_NOTE_ID`] sounds at
/// [`A4_FREQUENCY_HZ`]; note ID 0 is silence (increment 0). Computed at
/// construction time rather than baked in as a single fixed array because
/// the interpreter's sample rate is configurable: callers derive their own
/// increment table from whatever master clock they're driving the decode
/// loop at, instead of a hardcoded one.
pub fn frequency_table(sample_rate: u32) -> [u16; NUM_NOTES] {
    let mut table = [0u16; NUM_NOTES];
    for (id, slot) in table.iter_mut().enumerate().skip(1) {
        let semitones_from_a4 = id as f64 - f64::from(A4_NOTE_ID);
        let freq_hz = A4_FREQUENCY_HZ * 2f64.powf(semitones_from_a4 / 12.0);
        let increment = (freq_hz * 65536.0 / f64::from(sample_rate)).round();
        *slot = increment.clamp(0.0, u16::MAX as f64) as u16;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_letter_bases_match_spec_table() {
        assert_eq!(pitch_base(b'A', Accidental::Natural), Some(10));
        assert_eq!(pitch_base(b'B', Accidental::Natural), Some(12));
        assert_eq!(pitch_base(b'C', Accidental::Natural), Some(1));
        assert_eq!(pitch_base(b'D', Accidental::Natural), Some(3));
        assert_eq!(pitch_base(b'E', Accidental::Natural), Some(5));
        assert_eq!(pitch_base(b'F', Accidental::Natural), Some(6));
        assert_eq!(pitch_base(b'G', Accidental::Natural), Some(8));
    }

    #[test]
    fn sharp_and_flat_offset_by_one() {
        assert_eq!(pitch_base(b'C', Accidental::Sharp), Some(2));
        assert_eq!(pitch_base(b'D', Accidental::Flat), Some(2));
    }

    #[test]
    fn c4_is_absolute_pitch_37() {
        let (pitch, clamped) = absolute_pitch(4, b'C', Accidental::Natural).unwrap();
        assert_eq!(pitch, 37);
        assert!(!clamped);
    }

    #[test]
    fn out_of_range_pitch_is_clamped_to_maximum() {
        // Octave 1, Cb: raw = 1*12 + 0 - 12 = 0, below range. Per spec,
        // out-of-range pitches clamp to the maximum (61), not to 1.
        let (pitch, clamped) = absolute_pitch(1, b'C', Accidental::Flat).unwrap();
        assert!(clamped);
        assert_eq!(pitch, 61);
    }

    #[test]
    fn duration_table_matches_spec() {
        assert_eq!(
            duration_code(DurationLetter::Quarter, DurationModifier::None),
            Some(6)
        );
        assert_eq!(duration_time_units(6), Some(48));
        assert_eq!(duration_time_units(1), Some(192)); // W
        assert_eq!(duration_time_units(15), Some(6)); // T
        assert_eq!(
            duration_code(DurationLetter::Whole, DurationModifier::Triplet),
            None
        ); // W3 invalid
        assert_eq!(
            duration_code(DurationLetter::ThirtySecond, DurationModifier::Dotted),
            None
        ); // T. invalid
    }

    #[test]
    fn frequency_table_note_zero_is_silent() {
        let table = frequency_table(DEFAULT_SAMPLE_RATE);
        assert_eq!(table[0], 0);
    }

    #[test]
    fn frequency_table_c4_is_middle_c() {
        let table = frequency_table(DEFAULT_SAMPLE_RATE);
        // C4 = 261.63 Hz at 8772 Hz sample rate.
        let expected = (261.63 * 65536.0 / 8772.0).round() as u16;
        assert!((i32::from(table[37]) - i32::from(expected)).abs() <= 1);
    }

    #[test]
    fn frequency_table_is_monotonic() {
        let table = frequency_table(DEFAULT_SAMPLE_RATE);
        for i in 2..NUM_NOTES {
            assert!(table[i] > table[i - 1], "table not monotonic at {i}");
        }
    }

    #[test]
    fn frequency_table_rescales_with_sample_rate() {
        let low = frequency_table(8772);
        let high = frequency_table(44_100);
        // Same note, lower sample rate -> larger phase increment per sample.
        assert!(low[37] > high[37]);
    }
}
