//! Centralized constants for the call agent
//!
//! Single source of truth for thresholds and defaults shared by the
//! config structs and their validation.

/// Escalation thresholds
pub mod escalation {
    /// Consecutive unclear turns before the call is handed to staff
    pub const UNCLEAR_THRESHOLD: u32 = 2;

    /// Consecutive negative-sentiment turns before the call is handed to staff
    pub const ANGER_THRESHOLD: u32 = 2;
}

/// Conversation context limits
pub mod context {
    /// Turns kept in the rolling history window
    pub const HISTORY_WINDOW: usize = 3;
}

/// Speech recognition and classification
pub mod recognition {
    /// Transcripts below this confidence are treated as unclear
    pub const MIN_CONFIDENCE: f32 = 0.5;

    /// Response-time budget for the intent classifier
    pub const CLASSIFIER_TIMEOUT_MS: u64 = 10_000;
}

/// Per-call channel sizing
pub mod channels {
    pub const INPUT_CAPACITY: usize = 32;
    pub const CLEANUP_INTERVAL_MS: u64 = 30_000;
}
