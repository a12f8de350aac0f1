//! Counters for every recoverable failure class.
//!
//! Nothing here aborts processing; each counter maps to one of the
//! drop-the-packet / drop-the-section / skip-the-descriptor policies.

use serde::Serialize;

#[derive(Debug, Default, Clone, Serialize)]
pub struct DemuxStats {
    /// Packets seen (after framing, including dropped ones).
    pub packets: u64,
    /// Sync byte mismatches that triggered a resync scan.
    pub sync_losses: u64,
    /// Packets flagged by transport_error_indicator.
    pub transport_errors: u64,
    /// Packets with transport_scrambling_control != 0.
    pub scrambled_packets: u64,
    /// Packets dropped by the continuity gate.
    pub continuity_drops: u64,
    /// Accepted duplicate packets (payload not re-processed).
    pub duplicate_packets: u64,
    /// Malformed adaptation fields / bad marker bits.
    pub packet_errors: u64,
    /// Sections discarded before completion.
    pub truncated_sections: u64,
    /// Sections failing CRC or header validation.
    pub section_errors: u64,
    /// Sections with a table_id outside the recognized set.
    pub unknown_tables: u64,
    /// Tables decoded successfully.
    pub tables_decoded: u64,
    /// PES headers parsed on non-PSI PIDs.
    pub pes_headers: u64,
    /// Null packets (PID 0x1FFF).
    pub null_packets: u64,
}

impl DemuxStats {
    pub fn new() -> Self {
        Self::default()
    }
}
