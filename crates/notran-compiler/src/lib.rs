//! NOTRAN compiler: source text in, bytecode out.
//!
//! Ties together the tokenizer ([`lexer`]), the identifier table
//! ([`symbol`]) and the byte emitter / voice-event tracker ([`emitter`])
//! behind a single [`compile`] entry point.

#![warn(missing_docs)]

pub mod emitter;
pub mod error;
pub mod event;
pub mod lexer;
pub mod symbol;

use serde::{Deserialize, Serialize};

use emitter::Emitter;
use error::CompileError;
use lexer::Spec;
use symbol::SymbolTable;

pub use error::Result;

/// Compiler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// 16-bit base address that symbol/absolute addresses are offset from.
    pub base_address: u16,
    /// Whether [`compile`] should populate [`CodeObject::listing`].
    pub listing_enabled: bool,
    /// Maximum number of distinct numeric identifiers the symbol table
    /// will hold before reporting overflow.
    pub max_identifiers: usize,
    /// Maximum size, in bytes, of the emitted code buffer.
    pub max_code_size: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            base_address: 0,
            listing_enabled: false,
            max_identifiers: 100,
            max_code_size: 8192,
        }
    }
}

/// One source line's contribution to a listing: its text and the half-open
/// byte range `[start, end)` it occupies in the emitted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingLine {
    /// 1-based source line number.
    pub line: usize,
    /// Source text, as written (not uppercased).
    pub text: String,
    /// Absolute address (`base_address + offset`) the line's first emitted
    /// byte landed at. Equal to `end` when the line emitted no bytes.
    pub start_address: u16,
    /// Absolute address one past the line's last emitted byte.
    pub end_address: u16,
}

/// Output of a (possibly partially failed) compilation.
#[derive(Debug, Clone, Default)]
pub struct CodeObject {
    /// The emitted byte stream, handed to the external object writer
    /// unframed (packaging into a container format is out of scope here).
    pub code: Vec<u8>,
    /// Per-line listing entries, present only when
    /// [`CompilerConfig::listing_enabled`] was set.
    pub listing: Vec<ListingLine>,
}

/// Compile NOTRAN source text into a [`CodeObject`].
///
/// Diagnostics are line-local and non-fatal by default: a malformed
/// specification is reported and the rest of its `;`-delimited segment is
/// skipped, but compilation proceeds to the next line so that later
/// problems are also surfaced in one pass. `no voices active` at event
/// open is the one fatal condition and aborts the remaining source;
/// everything collected so far is still returned via
/// [`CompileError::Failed`]'s diagnostics list.
///
/// Returns `Ok` only if zero diagnostics were recorded; otherwise
/// `Err(CompileError::Failed { diagnostics })`.
pub fn compile(source: &str, config: &CompilerConfig) -> Result<CodeObject> {
    let mut symbols = SymbolTable::new(config.max_identifiers);
    let mut emitter = Emitter::new(config.base_address, config.max_code_size);
    let mut diagnostics = Vec::new();
    let mut listing = Vec::new();

    'lines: for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;
        if emitter.is_done() {
            break;
        }

        let (tokens, tok_diags) = lexer::tokenize_line(line_number, raw_line);
        diagnostics.extend(tok_diags);

        if tokens.is_comment {
            continue;
        }

        let start_address = emitter.absolute_address();

        if let Some(label) = tokens.label {
            if emitter.event_open() {
                emitter.force_close_event();
                diagnostics.push(CompileError::IdentifierInEvent { line: line_number });
            }
            match u8::try_from(label) {
                Ok(id) if id >= 1 => {
                    if let Err(err) = symbols.define(line_number, id, emitter.absolute_address()) {
                        diagnostics.push(err);
                    }
                }
                _ => diagnostics.push(CompileError::ArgumentOutOfRange {
                    line: line_number,
                    what: "identifier",
                    value: i64::from(label),
                    expected: "1..=255",
                }),
            }
        }

        for spec in tokens.specs {
            let result = match spec {
                Spec::Keyword(keyword) => {
                    emitter.apply_keyword(line_number, keyword, |id| symbols.resolve(id as u8))
                }
                Spec::Note(note) => emitter.apply_note(line_number, note),
            };
            diagnostics.extend(emitter.take_soft_diagnostics());
            if let Err(err) = result {
                let fatal = matches!(err, CompileError::NoVoicesActive { .. })
                    || matches!(err, CompileError::CodeOverflow { .. });
                diagnostics.push(err);
                if fatal {
                    break 'lines;
                }
            }
        }

        if config.listing_enabled {
            listing.push(ListingLine {
                line: line_number,
                text: raw_line.to_string(),
                start_address,
                end_address: emitter.absolute_address(),
            });
        }
    }

    if emitter.has_hanging_sub() {
        diagnostics.push(CompileError::HangingSub {
            line: source.lines().count(),
        });
    }

    if !diagnostics.is_empty() {
        return Err(CompileError::Failed { diagnostics });
    }

    Ok(CodeObject {
        code: emitter.into_code(),
        listing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_one_nvc_act_wav_tpo_end() {
        let config = CompilerConfig::default();
        let object = compile("NVC4; ACT1,2,3,4; WAV1,1; TPO 100; END", &config).unwrap();
        assert_eq!(
            object.code,
            vec![0x50, 0x04, 0x90, 0x00, 0x90, 0x01, 0x90, 0x02, 0x90, 0x03, 0x10, 0x64, 0x00]
        );
    }

    #[test]
    fn scenario_two_first_note_is_long_absolute() {
        let config = CompilerConfig::default();
        let object = compile("ACT1\nC4Q", &config).unwrap();
        assert_eq!(&object.code[2..], &[0x60, 2 * 37, 0x06]);
    }

    #[test]
    fn scenario_three_second_note_is_short() {
        let config = CompilerConfig::default();
        let object = compile("ACT1\nC4Q\nD4Q", &config).unwrap();
        assert_eq!(&object.code[5..], &[0x26]);
    }

    #[test]
    fn scenario_four_label_then_jump_to_self() {
        let config = CompilerConfig::default();
        let object = compile("1 JMP 1", &config).unwrap();
        assert_eq!(object.code, vec![0x40, 0x00, 0x00]);
    }

    #[test]
    fn scenario_five_empty_sub_esb() {
        let config = CompilerConfig::default();
        let object = compile("SUB\nESB", &config).unwrap();
        assert_eq!(object.code, vec![0x40, 0x03, 0x00]);
    }

    #[test]
    fn scenario_six_rest_ignores_history() {
        let config = CompilerConfig::default();
        let object = compile("ACT1\nR Q", &config).unwrap();
        assert_eq!(&object.code[2..], &[0x86]);
    }

    #[test]
    fn undefined_forward_reference_is_reported() {
        let config = CompilerConfig::default();
        let err = compile("JMP 9\nEND", &config).unwrap_err();
        match err {
            CompileError::Failed { diagnostics } => {
                assert!(diagnostics
                    .iter()
                    .any(|d| matches!(d, CompileError::UndefinedIdentifier { id: 9, .. })));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_label_is_reported_but_compilation_continues() {
        let config = CompilerConfig::default();
        let err = compile("1 END\n1 END", &config).unwrap_err();
        match err {
            CompileError::Failed { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert!(matches!(
                    diagnostics[0],
                    CompileError::DuplicateIdentifier { id: 1, .. }
                ));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn no_voices_active_is_fatal_and_stops_compilation() {
        let config = CompilerConfig::default();
        let err = compile("R Q\nEND", &config).unwrap_err();
        match err {
            CompileError::Failed { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert!(matches!(diagnostics[0], CompileError::NoVoicesActive { .. }));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn listing_records_address_ranges_per_line() {
        let config = CompilerConfig {
            listing_enabled: true,
            ..CompilerConfig::default()
        };
        let object = compile("ACT1\nC4Q\nEND", &config).unwrap();
        assert_eq!(object.listing.len(), 3);
        assert_eq!(object.listing[0].start_address, 0);
        assert_eq!(object.listing[0].end_address, 2);
        assert_eq!(object.listing[1].start_address, 2);
        assert_eq!(object.listing[1].end_address, 5);
    }

    #[test]
    fn label_mid_event_is_reported_but_compilation_continues() {
        let config = CompilerConfig::default();
        let err = compile("ACT1,2\nC4Q\n1 END", &config).unwrap_err();
        match err {
            CompileError::Failed { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert!(matches!(
                    diagnostics[0],
                    CompileError::IdentifierInEvent { line: 3 }
                ));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn hanging_sub_is_reported_at_end() {
        let config = CompilerConfig::default();
        let err = compile("SUB\nEND", &config).unwrap_err();
        match err {
            CompileError::Failed { diagnostics } => {
                assert!(diagnostics.iter().any(|d| matches!(d, CompileError::HangingSub { .. })));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
