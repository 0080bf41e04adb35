//! Multi-line seed scenarios exercising `compile`'s public API end to end,
//! beyond the unit-level coverage in `emitter`'s own test module.

use notran_compiler::{compile, CompilerConfig};

fn compile_ok(source: &str) -> Vec<u8> {
    compile(source, &CompilerConfig::default())
        .unwrap_or_else(|err| panic!("expected compilation to succeed: {err}"))
        .code
}

#[test]
fn setup_then_tempo_then_end() {
    let code = compile_ok("NVC4; ACT1,2,3,4; WAV1,1; TPO 100; END");
    assert_eq!(
        code,
        vec![0x50, 0x04, 0x90, 0x00, 0x90, 0x01, 0x90, 0x02, 0x90, 0x03, 0x10, 0x64, 0x00]
    );
}

#[test]
fn c4_then_d4_selects_long_then_short() {
    let code = compile_ok("ACT1\nC4Q\nD4Q\nEND");
    assert_eq!(&code[..2], &[0x90, 0x00]);
    assert_eq!(&code[2..5], &[0x60, 2 * 37, 0x06]);
    assert_eq!(&code[5..6], &[0x26]);
    assert_eq!(&code[6..], &[0x00]);
}

#[test]
fn label_jump_to_self_is_three_bytes() {
    let code = compile_ok("1 JMP 1");
    assert_eq!(code, vec![0x40, 0x00, 0x00]);
}

#[test]
fn sub_esb_round_trip_with_inner_code() {
    // SUB; RTS; ESB -- the JMP placeholder must point just past the
    // single RTS byte it skips over.
    let code = compile_ok("SUB\nRTS\nESB\nEND");
    assert_eq!(code[0], 0x40);
    let target = u16::from_le_bytes([code[1], code[2]]);
    assert_eq!(target, 4); // byte offset right after RTS (index 3)
    assert_eq!(code[3], 0x30); // RTS
}

#[test]
fn rest_on_active_voice_emits_fixed_byte() {
    let code = compile_ok("ACT1\nR Q\nEND");
    assert_eq!(&code[2..3], &[0x86]);
}

#[test]
fn two_voice_event_completes_with_minimum_duration_subtracted() {
    // C4Q (48 units) against E4H (96 units): the quarter note's voice
    // becomes free again after 48 units while the half note's voice still
    // has 48 remaining -- captured indirectly by compiling a second event
    // and checking the byte count, since voice-internal state isn't
    // exposed outside `notran-compiler::emitter`.
    let code = compile_ok("ACT1,2\nC4Q\nE4H\nEND");
    // ACT1, ACT2 (2+2) + long C4Q (3) + long E4H (3) + END (1) = 11
    assert_eq!(code.len(), 2 + 2 + 3 + 3 + 1);
}

#[test]
fn pitch_out_of_range_is_reported_but_compilation_continues() {
    let err = compile("ACT1\nG6Q\nEND", &CompilerConfig::default()).unwrap_err();
    match err {
        notran_compiler::error::CompileError::Failed { diagnostics } => {
            assert!(diagnostics.iter().any(|d| matches!(
                d,
                notran_compiler::error::CompileError::PitchOutOfRange { .. }
            )));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn voice_mismatch_is_reported() {
    let err = compile("ACT1,2\n2C4Q\nEND", &CompilerConfig::default()).unwrap_err();
    match err {
        notran_compiler::error::CompileError::Failed { diagnostics } => {
            assert!(diagnostics
                .iter()
                .any(|d| matches!(d, notran_compiler::error::CompileError::VoiceMismatch { .. })));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}
