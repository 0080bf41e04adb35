//! Error type shared by the two crates built on top of this one.

/// Result alias used throughout `notran-core`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while working with the raw ISA/tables in this
/// crate, independent of whether the caller is compiling or interpreting.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// A value was outside the range the ISA allows for it.
    #[error("{what} out of range: {value} (expected {expected})")]
    OutOfRange {
        /// Name of the field/argument that was out of range.
        what: &'static str,
        /// The value that was rejected.
        value: i64,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },

    /// Generic error carrying a free-text message.
    #[error("{0}")]
    Other(String),
}

impl From<String> for CoreError {
    fn from(msg: String) -> Self {
        CoreError::Other(msg)
    }
}

impl From<&str> for CoreError {
    fn from(msg: &str) -> Self {
        CoreError::Other(msg.to_string())
    }
}
