//! Line tokenizer: splits one source line into a label and a sequence of
//! specifications (keywords or notes).
//!
//! Keyword tokens are recognized and their arguments consumed by a small
//! hand-rolled word scanner; note tokens, which have a small regex-like
//! grammar, are parsed with `nom` combinators.

use nom::branch::alt;
use nom::character::complete::{char, one_of};
use nom::combinator::{all_consuming, map, opt, value};
use nom::sequence::tuple;
use nom::IResult;

use notran_core::tables::{Accidental, DurationLetter, DurationModifier};

use crate::error::CompileError;

/// One parsed keyword with its (syntactically valid, range-unchecked)
/// arguments. Range validation happens in `crate::emitter`, where the
/// line number and voice/event context are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordSpec {
    /// `NVC n`
    Nvc(u32),
    /// `ACT n[,n]*`
    Act(Vec<u32>),
    /// `DCT n[,n]*`
    Dct(Vec<u32>),
    /// `WAV w,v`
    Wav {
        /// Waveform number, as written (1..16 expected).
        waveform: u32,
        /// Voice number, as written (1..4 expected).
        voice: u32,
    },
    /// `TPO t`
    Tpo(u32),
    /// `ABS`
    Abs,
    /// `JMP id`
    Jmp(u32),
    /// `JSR id`
    Jsr(u32),
    /// `RTS`
    Rts,
    /// `SUB`
    Sub,
    /// `ESB`
    Esb,
    /// `END`
    End,
}

/// A pitch specification: either a rest, or a letter with optional
/// accidental and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotePitch {
    /// `R`
    Rest,
    /// A letter (`A..G`) with optional accidental and explicit octave.
    Pitch {
        /// Upper-case ASCII letter `A..G`.
        letter: u8,
        /// Accidental modifying the letter.
        accidental: Accidental,
        /// Explicit octave digit, if written.
        octave: Option<u8>,
    },
}

/// A fully tokenized note, before any voice-state-dependent decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSpec {
    /// Explicit voice digit, if the source wrote one.
    pub voice: Option<u8>,
    /// Pitch or rest.
    pub pitch: NotePitch,
    /// Duration letter.
    pub duration_letter: DurationLetter,
    /// Duration modifier (none/dotted/triplet).
    pub duration_modifier: DurationModifier,
}

/// One specification on a line: a keyword or a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    /// A keyword with its raw arguments.
    Keyword(KeywordSpec),
    /// A note or rest.
    Note(NoteSpec),
}

/// Result of tokenizing one source line.
#[derive(Debug, Clone, Default)]
pub struct LineTokens {
    /// Numeric label bound to this line's code offset, if any. Range
    /// (1..255) is validated by the caller, not here.
    pub label: Option<u32>,
    /// True if this line is a `*` comment (no code, listing only).
    pub is_comment: bool,
    /// Specifications parsed from the line, in source order.
    pub specs: Vec<Spec>,
}

const KEYWORDS: &[&str] = &[
    "NVC", "ACT", "DCT", "WAV", "TPO", "ABS", "JMP", "JSR", "RTS", "SUB", "ESB", "END",
];

/// Tokenize one source line. Returns the parsed tokens plus any
/// diagnostics raised by malformed specifications (recovery: the rest of
/// the current `;`-delimited segment is skipped, tokenizing resumes at
/// the next segment).
pub fn tokenize_line(line_number: usize, raw_line: &str) -> (LineTokens, Vec<CompileError>) {
    let line = raw_line.trim_end_matches(['\r', '\n']);
    let upper = line.to_ascii_uppercase();

    if upper.trim().is_empty() {
        return (LineTokens::default(), Vec::new());
    }

    let first = upper.chars().next().unwrap();
    if first == '*' {
        return (
            LineTokens {
                is_comment: true,
                ..Default::default()
            },
            Vec::new(),
        );
    }

    // A leading digit introduces a numeric label; otherwise the whole line
    // is specifications, whether or not it's indented (the `;`-delimited
    // seed programs in the bytecode contract are written unindented, e.g.
    // `NVC4; ACT1,2,3,4; ...`).
    let (label, rest) = if first.is_ascii_digit() {
        let digit_count = upper.chars().take_while(|c| c.is_ascii_digit()).count();
        let (digits, rest) = upper.split_at(digit_count);
        (digits.parse::<u32>().ok(), rest)
    } else {
        (None, upper.as_str())
    };

    let mut specs = Vec::new();
    let mut diagnostics = Vec::new();
    for segment in rest.split(';') {
        let words: Vec<&str> = segment.split_whitespace().collect();
        tokenize_segment(line_number, &words, &mut specs, &mut diagnostics);
    }

    (
        LineTokens {
            label,
            is_comment: false,
            specs,
        },
        diagnostics,
    )
}

fn tokenize_segment(
    line_number: usize,
    words: &[&str],
    specs: &mut Vec<Spec>,
    diagnostics: &mut Vec<CompileError>,
) {
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        if let Some(keyword) = KEYWORDS.iter().find(|kw| word.starts_with(*kw)) {
            let inline_arg = &word[keyword.len()..];
            let (arg, consumed_next) = if inline_arg.is_empty() && i + 1 < words.len() {
                (words[i + 1], true)
            } else {
                (inline_arg, false)
            };
            match parse_keyword(line_number, keyword, arg) {
                Ok(spec) => specs.push(Spec::Keyword(spec)),
                Err(err) => {
                    diagnostics.push(err);
                    return;
                }
            }
            i += if consumed_next { 2 } else { 1 };
            continue;
        }

        if let Ok((_, note)) = all_consuming(parse_note)(word) {
            specs.push(Spec::Note(note));
            i += 1;
            continue;
        }

        // A bare rest/pitch word (no duration attached, e.g. the `R` in
        // `R Q`) followed by a separate duration word is the same note,
        // just space-separated instead of run together as `RQ`.
        if let Ok((_, (voice, pitch))) = all_consuming(parse_note_head)(word) {
            if let Some(next) = words.get(i + 1) {
                if let Ok((_, (duration_letter, duration_modifier))) = all_consuming(duration)(next)
                {
                    specs.push(Spec::Note(NoteSpec {
                        voice,
                        pitch,
                        duration_letter,
                        duration_modifier,
                    }));
                    i += 2;
                    continue;
                }
            }
        }

        diagnostics.push(CompileError::IncomprehensibleSpecification {
            line: line_number,
            text: word.to_string(),
        });
        return;
    }
}

fn parse_keyword(line_number: usize, keyword: &str, arg: &str) -> Result<KeywordSpec, CompileError> {
    match keyword {
        "NVC" => Ok(KeywordSpec::Nvc(parse_operand(line_number, "NVC argument", arg)?)),
        "TPO" => Ok(KeywordSpec::Tpo(parse_operand(line_number, "TPO argument", arg)?)),
        "JMP" => Ok(KeywordSpec::Jmp(parse_operand(line_number, "JMP identifier", arg)?)),
        "JSR" => Ok(KeywordSpec::Jsr(parse_operand(line_number, "JSR identifier", arg)?)),
        "ACT" => Ok(KeywordSpec::Act(parse_operand_list(line_number, "ACT argument", arg)?)),
        "DCT" => Ok(KeywordSpec::Dct(parse_operand_list(line_number, "DCT argument", arg)?)),
        "WAV" => {
            let mut parts = arg.splitn(2, ',');
            let waveform = parts.next().unwrap_or("");
            let voice = parts.next().unwrap_or("");
            Ok(KeywordSpec::Wav {
                waveform: parse_operand(line_number, "WAV waveform", waveform)?,
                voice: parse_operand(line_number, "WAV voice", voice)?,
            })
        }
        "ABS" => Ok(KeywordSpec::Abs),
        "RTS" => Ok(KeywordSpec::Rts),
        "SUB" => Ok(KeywordSpec::Sub),
        "ESB" => Ok(KeywordSpec::Esb),
        "END" => Ok(KeywordSpec::End),
        _ => Err(CompileError::IncomprehensibleSpecification {
            line: line_number,
            text: format!("{keyword} {arg}").trim().to_string(),
        }),
    }
}

fn parse_operand(line_number: usize, what: &'static str, text: &str) -> Result<u32, CompileError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CompileError::IncomprehensibleSpecification {
            line: line_number,
            text: format!("{what}: {text:?}"),
        });
    }
    // Integer operands are one byte wide; 1+ decimal digits are accepted
    // but a value above 255 is reported as overflow rather than silently
    // truncated.
    let value: u64 = text.parse().map_err(|_| CompileError::ArgumentOutOfRange {
        line: line_number,
        what,
        value: i64::MAX,
        expected: "0..=255",
    })?;
    if value > 255 {
        return Err(CompileError::ArgumentOutOfRange {
            line: line_number,
            what,
            value: value as i64,
            expected: "0..=255",
        });
    }
    Ok(value as u32)
}

fn parse_operand_list(
    line_number: usize,
    what: &'static str,
    text: &str,
) -> Result<Vec<u32>, CompileError> {
    if text.is_empty() {
        return Err(CompileError::IncomprehensibleSpecification {
            line: line_number,
            text: format!("{what}: empty list"),
        });
    }
    text.split(',')
        .map(|part| parse_operand(line_number, what, part))
        .collect()
}

fn voice_digit(input: &str) -> IResult<&str, u8> {
    map(one_of("1234"), |c| c.to_digit(10).unwrap() as u8)(input)
}

fn rest_or_pitch(input: &str) -> IResult<&str, NotePitch> {
    alt((
        value(NotePitch::Rest, char('R')),
        map(
            tuple((one_of("ABCDEFG"), opt(one_of("#@")), opt(one_of("123456")))),
            |(letter, accidental, octave)| NotePitch::Pitch {
                letter: letter as u8,
                accidental: match accidental {
                    Some('#') => Accidental::Sharp,
                    Some('@') => Accidental::Flat,
                    _ => Accidental::Natural,
                },
                octave: octave.map(|d| d.to_digit(10).unwrap() as u8),
            },
        ),
    ))(input)
}

fn duration(input: &str) -> IResult<&str, (DurationLetter, DurationModifier)> {
    map(
        tuple((one_of("WHQEST"), opt(one_of(".3")))),
        |(letter, modifier)| {
            let duration_letter =
                DurationLetter::from_char(letter as u8).expect("one_of restricts to WHQEST");
            let duration_modifier = match modifier {
                Some('.') => DurationModifier::Dotted,
                Some('3') => DurationModifier::Triplet,
                _ => DurationModifier::None,
            };
            (duration_letter, duration_modifier)
        },
    )(input)
}

fn parse_note(input: &str) -> IResult<&str, NoteSpec> {
    map(
        tuple((opt(voice_digit), rest_or_pitch, duration)),
        |(voice, pitch, (duration_letter, duration_modifier))| NoteSpec {
            voice,
            pitch,
            duration_letter,
            duration_modifier,
        },
    )(input)
}

/// The `[voice?] ('R' | pitch[octave?])` head of a note, without the
/// trailing duration. Used to recognize a rest/pitch word that has its
/// duration split off into a separate whitespace-delimited word.
fn parse_note_head(input: &str) -> IResult<&str, (Option<u8>, NotePitch)> {
    tuple((opt(voice_digit), rest_or_pitch))(input)
}
