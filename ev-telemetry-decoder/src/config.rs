//! Decoder configuration
//!
//! The protocol interprets every wall-clock field in one fixed civil
//! timezone, configured once at construction and threaded explicitly through
//! the decode path - never re-resolved per frame.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// The protocol's reference timezone (UTC+8)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Configuration for the decoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Civil timezone offset for envelope and device timestamps, in hours
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Treat a checksum mismatch as fatal for the frame instead of a
    /// data-quality diagnostic
    #[serde(default)]
    pub enforce_checksum: bool,
}

fn default_utc_offset_hours() -> i32 {
    DEFAULT_UTC_OFFSET_HOURS
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            enforce_checksum: false,
        }
    }
}

impl DecoderConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the civil timezone offset in hours
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// Builder method: enable or disable strict checksum enforcement
    pub fn with_checksum_enforcement(mut self, enabled: bool) -> Self {
        self.enforce_checksum = enabled;
        self
    }

    /// The configured offset as a `chrono` timezone
    ///
    /// Out-of-range offsets are clamped to the civil range -12..=+14 so the
    /// conversion cannot fail.
    pub fn timezone(&self) -> FixedOffset {
        let clamped = self.utc_offset_hours.clamp(-12, 14);
        FixedOffset::east_opt(clamped * 3600).expect("clamped offset is within +/-24h")
    }
}
