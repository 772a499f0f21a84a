//! Tracking id formatting
//!
//! A tracking id is `REGIONCODE-BEATCODE-SEQ` where SEQ is a zero-padded
//! sequence allocated per (region, beat) pair. Allocation itself lives in
//! the store (`db::certificates`) so it shares the creation transaction.

/// Minimum digits in the sequence component
pub const SEQ_WIDTH: usize = 4;

/// Format a tracking id from its parts
///
/// Sequences wider than [`SEQ_WIDTH`] digits keep their natural width, so
/// ids stay unique past 9999.
pub fn format_tracking_id(region_code: &str, beat_code: &str, seq: u32) -> String {
    format!("{region_code}-{beat_code}-{seq:0width$}", width = SEQ_WIDTH)
}

/// Extract the sequence component of a tracking id
pub fn parse_sequence(tracking_id: &str) -> Option<u32> {
    tracking_id.rsplit('-').next()?.parse().ok()
}
