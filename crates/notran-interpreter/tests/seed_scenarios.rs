//! End-to-end scenarios running real `notran-compiler` output through the
//! interpreter, plus a couple of hand-assembled byte streams for behavior
//! the compiler never emits on its own (e.g. deliberately bad jump
//! targets).

use notran_compiler::{compile, CompilerConfig};
use notran_core::WAVETABLE_SIZE;
use notran_interpreter::{Interpreter, InterpreterConfig, WavetableBank};

fn compile_ok(source: &str) -> Vec<u8> {
    compile(source, &CompilerConfig::default())
        .unwrap_or_else(|err| panic!("expected compilation to succeed: {err}"))
        .code
}

fn one_table_bank(value: u8) -> WavetableBank {
    WavetableBank::from_bytes(&[value; WAVETABLE_SIZE]).unwrap()
}

#[test]
fn c4_then_d4_runs_to_completion_and_stops() {
    let code = compile_ok("ACT1\nC4Q\nD4Q\nEND");
    let mut interp = Interpreter::new(code, &InterpreterConfig::default());
    let bank = one_table_bank(200);

    // Quarter note is 48 time units at tempo 1: two quarter notes plus
    // however many samples it takes to notice END is 96 samples of audio.
    let mut buf = [0u8; 96];
    let written = interp.run_to_buffer(&mut buf, &bank);
    assert_eq!(written, 96);
    assert!(!interp.is_stopped());

    // One more pull drains the END and reports zero further samples.
    let mut tail = [0u8; 4];
    let written_tail = interp.run_to_buffer(&mut tail, &bank);
    assert_eq!(written_tail, 0);
    assert!(interp.is_stopped());
}

#[test]
fn silent_wavetable_produces_silent_output() {
    let code = compile_ok("ACT1\nC4Q\nEND");
    let mut interp = Interpreter::new(code, &InterpreterConfig::default());
    let bank = one_table_bank(0);
    let mut buf = [0u8; 48];
    let written = interp.run_to_buffer(&mut buf, &bank);
    assert_eq!(written, 48);
    assert!(buf.iter().all(|&s| s == 0));
}

#[test]
fn two_voices_saturate_when_both_loud() {
    let code = compile_ok("ACT1,2\nC4Q\nC4Q\nEND");
    let mut interp = Interpreter::new(code, &InterpreterConfig::default());
    let bank = one_table_bank(200);
    let mut buf = [0u8; 1];
    interp.run_to_buffer(&mut buf, &bank);
    // 200 + 200 saturates to 255.
    assert_eq!(buf[0], 255);
}

#[test]
fn sub_esb_subroutine_runs_and_returns() {
    // SUB/ESB wraps a subroutine body (skipped over on fall-through) that
    // activates voice 0 and plays one note before returning; the call site
    // is a backward JSR to the label marking the body's first line.
    let code = compile_ok("SUB\n1 ACT1\nC4Q\nRTS\nESB\n2 JSR 1\nEND");
    let mut interp = Interpreter::new(code, &InterpreterConfig::default());
    let bank = one_table_bank(100);
    let mut buf = [0u8; 64];
    let written = interp.run_to_buffer(&mut buf, &bank);
    assert_eq!(written, 48, "the subroutine's quarter note is 48 time units");
    assert!(interp.is_stopped());
}

#[test]
fn jump_budget_halts_an_infinite_loop() {
    let code = compile_ok("1 JMP 1");
    let config = InterpreterConfig {
        max_jumps: Some(10),
        ..InterpreterConfig::default()
    };
    let mut interp = Interpreter::new(code, &config);
    let bank = one_table_bank(100);
    let mut buf = [0u8; 16];
    let written = interp.run_to_buffer(&mut buf, &bank);
    assert_eq!(written, 0);
    assert!(interp.is_stopped());
}

#[test]
fn jump_target_past_code_end_is_a_hard_error() {
    // Hand-assembled: JMP to an address past the end of a 3-byte buffer.
    let code = vec![0x40, 0xFF, 0x00];
    let mut interp = Interpreter::new(code, &InterpreterConfig::default());
    let bank = one_table_bank(100);
    let mut buf = [0u8; 8];
    let written = interp.run_to_buffer(&mut buf, &bank);
    assert_eq!(written, 0);
    assert!(interp.is_stopped());
}

#[test]
fn phase_accumulator_wraps_exactly_mod_65536() {
    let code = compile_ok("ACT1\nC4Q\nEND");
    let config = InterpreterConfig {
        // A high sample rate keeps the increment small so we can step
        // through many samples without the accumulator wrapping before
        // we've verified the math.
        sample_rate: 96_000,
        ..InterpreterConfig::default()
    };
    let mut interp = Interpreter::new(code, &config);
    let bank = one_table_bank(1);
    let mut buf = [0u8; 1];
    interp.run_to_buffer(&mut buf, &bank);
    let phase_after_one_tick = interp.voices()[0].phase();
    let increment = interp.voices()[0].freq_increment;
    assert_eq!(phase_after_one_tick, increment);
}

#[test]
fn deactivated_voice_stops_contributing() {
    let code = compile_ok("ACT1,2\nC4Q\nC4Q\nDCT1\nC4Q\nEND");
    let mut interp = Interpreter::new(code, &InterpreterConfig::default());
    let bank = one_table_bank(200);
    let mut buf = [0u8; 48];
    interp.run_to_buffer(&mut buf, &bank);
    // Voice 0 was deactivated before the second event; voice 1's note is
    // still playing (48 units each, so the second event starts right as
    // the first ends).
    let mut second_event = [0u8; 1];
    interp.run_to_buffer(&mut second_event, &bank);
    assert!(!interp.voices()[0].is_active());
}
