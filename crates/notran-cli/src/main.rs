//! Demo command-line front end for the NOTRAN toolchain.
//!
//! Two subcommands mirror the library split: `compile` runs the source
//! compiler and writes bytecode (plus an optional listing), `play` runs
//! the interpreter against a compiled program and a wavetable bank and
//! writes raw unsigned 8-bit mono samples. No audio device output and no
//! container/header framing -- both are explicit non-goals.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use notran_compiler::{compile, CompilerConfig};
use notran_interpreter::{Interpreter, InterpreterConfig, WavetableBank};

/// NOTRAN compiler and interpreter demo CLI.
#[derive(Parser)]
#[command(name = "notran", about = "NOTRAN bytecode compiler and interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a NOTRAN source file to bytecode.
    Compile(CompileArgs),
    /// Interpret a compiled program against a wavetable bank.
    Play(PlayArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// Path to a `.ntr` source file.
    input: PathBuf,

    /// Where to write the compiled bytecode. Defaults to `<input>.bin`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a per-line address listing to stdout.
    #[arg(long)]
    listing: bool,

    /// Load compiler configuration (base address, identifier/code limits)
    /// from a JSON file instead of the documented defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct PlayArgs {
    /// Path to compiled bytecode (as produced by `compile`).
    code: PathBuf,

    /// Path to a flat wavetable bank: a non-zero multiple of 256 bytes.
    wavetables: PathBuf,

    /// Where to write raw unsigned 8-bit mono samples.
    #[arg(short, long)]
    output: PathBuf,

    /// Output sample rate in Hz. Defaults to the documented hardware tuning.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Maximum number of `JUMP` opcodes before terminating normally.
    #[arg(long)]
    max_jumps: Option<u32>,

    /// How many samples to pull per `run_to_buffer` call.
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Compile(args) => run_compile(args),
        Command::Play(args) => run_play(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_compile(args: CompileArgs) -> Result<(), String> {
    let source = fs::read_to_string(&args.input)
        .map_err(|err| format!("reading {}: {err}", args.input.display()))?;

    let config = match args.config {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .map_err(|err| format!("reading {}: {err}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|err| format!("parsing {}: {err}", path.display()))?
        }
        None => CompilerConfig::default(),
    };

    let object = compile(&source, &config).map_err(|err| err.to_string())?;

    let output_path = args
        .output
        .unwrap_or_else(|| args.input.with_extension("bin"));
    fs::write(&output_path, &object.code)
        .map_err(|err| format!("writing {}: {err}", output_path.display()))?;
    println!(
        "compiled {} bytes -> {}",
        object.code.len(),
        output_path.display()
    );

    if args.listing {
        for line in &object.listing {
            println!(
                "{:>5}  {:04x}..{:04x}  {}",
                line.line, line.start_address, line.end_address, line.text
            );
        }
    }

    Ok(())
}

fn run_play(args: PlayArgs) -> Result<(), String> {
    let code = fs::read(&args.code).map_err(|err| format!("reading {}: {err}", args.code.display()))?;
    let wavetable_bytes = fs::read(&args.wavetables)
        .map_err(|err| format!("reading {}: {err}", args.wavetables.display()))?;
    let bank = WavetableBank::from_bytes(&wavetable_bytes).map_err(|err| err.to_string())?;

    let mut config = InterpreterConfig::default();
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if args.max_jumps.is_some() {
        config.max_jumps = args.max_jumps;
    }

    let mut interpreter = Interpreter::new(code, &config);
    let mut buffer = vec![0u8; args.chunk_size.max(1)];
    let mut out = Vec::new();

    loop {
        let written = interpreter.run_to_buffer(&mut buffer, &bank);
        out.extend_from_slice(&buffer[..written]);
        if interpreter.is_stopped() {
            break;
        }
    }

    fs::write(&args.output, &out)
        .map_err(|err| format!("writing {}: {err}", args.output.display()))?;
    println!("wrote {} samples -> {}", out.len(), args.output.display());

    Ok(())
}
