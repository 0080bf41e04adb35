//! Event tracker: groups simultaneous notes into one logical event.
//!
//! Modeled as a small tagged state machine rather than implicit shared
//! mutable state scattered across parser functions.

/// Tracker state: either no event is being built, or one is open with a
/// cursor pointing at the next voice slot to search for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventState {
    /// No event is currently being assembled.
    #[default]
    Closed,
    /// An event is open; `cursor` is the voice slot index to resume
    /// searching from for the next note.
    Open {
        /// Next voice slot index (0..4) to consider.
        cursor: usize,
    },
}

impl EventState {
    /// Whether an event is currently open.
    pub fn is_open(&self) -> bool {
        matches!(self, EventState::Open { .. })
    }
}
