//! Wavetable bank: a read-only collection of 256-byte unsigned tables the
//! synthesis engine indexes by voice `wavetable_index`.

use notran_core::WAVETABLE_SIZE;

use crate::error::{Result, RuntimeError};

/// An immutable, shared set of 256-byte wavetables parsed from a flat
/// concatenated byte buffer.
#[derive(Debug, Clone, Default)]
pub struct WavetableBank {
    tables: Vec<[u8; WAVETABLE_SIZE]>,
}

impl WavetableBank {
    /// Parse a wavetable bank from a flat byte buffer. `data.len()` must
    /// be a non-zero multiple of [`notran_core::WAVETABLE_SIZE`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() || data.len() % WAVETABLE_SIZE != 0 {
            return Err(RuntimeError::Other(format!(
                "wavetable data length {} is not a non-zero multiple of {WAVETABLE_SIZE}",
                data.len()
            )));
        }
        let tables = data
            .chunks_exact(WAVETABLE_SIZE)
            .map(|chunk| {
                let mut table = [0u8; WAVETABLE_SIZE];
                table.copy_from_slice(chunk);
                table
            })
            .collect();
        Ok(Self { tables })
    }

    /// Number of tables in the bank.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the bank holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up a table by index. Returns `None` for an out-of-range
    /// index; the synthesis engine treats this as "skip this voice" (the
    /// soft "invalid wavetable index" condition).
    pub fn get(&self, index: u8) -> Option<&[u8; WAVETABLE_SIZE]> {
        self.tables.get(index as usize)
    }
}
