//! Error handling for the NOTRAN compiler.

use thiserror::Error;

/// Convenient result alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// A single line-local compiler diagnostic.
///
/// Every variant except [`CompileError::Failed`] corresponds to one of the
/// error kinds listed in the bytecode contract's error catalogue; `line`
/// is the 1-based source line the diagnostic applies to.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An argument was outside the range a keyword or note field allows.
    #[error("line {line}: {what} out of range: {value} (expected {expected})")]
    ArgumentOutOfRange {
        /// 1-based source line number.
        line: usize,
        /// Name of the argument/field that was out of range.
        what: &'static str,
        /// The value that was rejected.
        value: i64,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },

    /// `JMP`/`JSR` referenced an identifier with no prior definition.
    #[error("line {line}: undefined identifier {id}")]
    UndefinedIdentifier {
        /// 1-based source line number.
        line: usize,
        /// The identifier that was never defined.
        id: u8,
    },

    /// A numeric label was defined more than once.
    #[error("line {line}: duplicate identifier {id}")]
    DuplicateIdentifier {
        /// 1-based source line number.
        line: usize,
        /// The identifier that was redefined.
        id: u8,
    },

    /// More identifiers were defined than the symbol table's configured
    /// capacity allows.
    #[error("symbol table overflow: more than {max} identifiers")]
    SymbolTableOverflow {
        /// Configured maximum number of identifiers.
        max: usize,
    },

    /// The code buffer grew past its configured maximum size.
    #[error("line {line}: code overflow: exceeds {max} bytes")]
    CodeOverflow {
        /// 1-based source line number.
        line: usize,
        /// Configured maximum code size, in bytes.
        max: usize,
    },

    /// A token did not match any known keyword or note syntax.
    #[error("line {line}: incomprehensible specification: {text:?}")]
    IncomprehensibleSpecification {
        /// 1-based source line number.
        line: usize,
        /// The raw text that failed to parse.
        text: String,
    },

    /// An explicit voice digit did not match the voice slot the event
    /// tracker expected next.
    #[error("line {line}: voice mismatch: expected voice {expected}, got voice {actual}")]
    VoiceMismatch {
        /// 1-based source line number.
        line: usize,
        /// 1-based voice slot the event tracker expected.
        expected: u8,
        /// 1-based voice slot the source actually specified.
        actual: u8,
    },

    /// A computed absolute pitch fell outside `1..=61` and was clamped.
    #[error("line {line}: pitch out of range: {value} (clamped to {clamped})")]
    PitchOutOfRange {
        /// 1-based source line number.
        line: usize,
        /// The raw, unclamped absolute pitch.
        value: i32,
        /// The clamped value actually used.
        clamped: i32,
    },

    /// A duration letter/modifier combination has no valid duration code.
    #[error("line {line}: illegal duration")]
    IllegalDuration {
        /// 1-based source line number.
        line: usize,
    },

    /// A keyword (executable control) was encountered while an event was
    /// still open; the event was force-closed to allow compilation to
    /// continue.
    #[error("line {line}: executable control in event")]
    ExecutableControlInEvent {
        /// 1-based source line number.
        line: usize,
    },

    /// A numeric label was declared while an event was open.
    #[error("line {line}: identifier in event")]
    IdentifierInEvent {
        /// 1-based source line number.
        line: usize,
    },

    /// `SUB` was encountered while a previous `SUB` had no matching `ESB`.
    #[error("line {line}: nested SUB")]
    NestedSub {
        /// 1-based source line number.
        line: usize,
    },

    /// `ESB` was encountered with no pending `SUB`.
    #[error("line {line}: ESB without SUB")]
    EsbWithoutSub {
        /// 1-based source line number.
        line: usize,
    },

    /// `END` was reached with a `SUB` still unresolved.
    #[error("line {line}: hanging SUB at END")]
    HangingSub {
        /// 1-based source line number.
        line: usize,
    },

    /// A note was encountered while opening an event, but no voice slot
    /// is currently active. Fatal: compilation of the remaining source is
    /// aborted (see `DESIGN.md` for why this doesn't call `process::exit`).
    #[error("line {line}: no voices active")]
    NoVoicesActive {
        /// 1-based source line number.
        line: usize,
    },

    /// Terminal error returned by [`crate::compile`] when one or more
    /// diagnostics were recorded; the object is not emitted.
    #[error("compilation failed with {} diagnostic(s)", diagnostics.len())]
    Failed {
        /// Every diagnostic recorded during the failed compilation, in
        /// the order they were encountered.
        diagnostics: Vec<CompileError>,
    },

    /// Generic error carrying a free-text message.
    #[error("{0}")]
    Other(String),
}

impl From<notran_core::CoreError> for CompileError {
    fn from(err: notran_core::CoreError) -> Self {
        CompileError::Other(err.to_string())
    }
}

impl From<String> for CompileError {
    fn from(msg: String) -> Self {
        CompileError::Other(msg)
    }
}

impl From<&str> for CompileError {
    fn from(msg: &str) -> Self {
        CompileError::Other(msg.to_string())
    }
}
