//! Per-PID continuity_counter tracking.
//!
//! A payload-bearing packet must advance the counter by one (mod 16).
//! A single duplicate is tolerated; the duplicate window re-arms only after
//! an in-sequence packet is accepted on that PID.

use std::collections::HashMap;

use crate::constants::NULL_PID;
use crate::packet::{AdaptationField, TsHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Duplicate packet accepted; payload must not be re-processed.
    AcceptDuplicate,
    Drop,
}

#[derive(Default)]
struct PidState {
    last_cc: u8,
    duplicate_seen: bool,
}

/// Tracks continuity per PID and decides whether each packet may proceed.
#[derive(Default)]
pub struct ContinuityGate {
    pids: HashMap<u16, PidState>,
    drop_count: u64,
}

impl ContinuityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count
    }

    /// Applies the continuity rules to one parsed packet header.
    pub fn check(&mut self, header: &TsHeader, adaptation: Option<&AdaptationField>) -> Verdict {
        if header.pid == NULL_PID {
            return Verdict::Accept;
        }

        if adaptation.map_or(false, |af| af.discontinuity_indicator) {
            // explicit discontinuity resets the PID state
            self.pids.insert(
                header.pid,
                PidState {
                    last_cc: header.continuity_counter,
                    duplicate_seen: false,
                },
            );
            return Verdict::Accept;
        }

        let state = match self.pids.entry(header.pid) {
            std::collections::hash_map::Entry::Vacant(v) => {
                v.insert(PidState {
                    last_cc: header.continuity_counter,
                    duplicate_seen: false,
                });
                return Verdict::Accept;
            }
            std::collections::hash_map::Entry::Occupied(o) => o.into_mut(),
        };

        let cc = header.continuity_counter;
        if !header.has_payload() {
            // adaptation-only packets must not advance the counter
            if cc == state.last_cc {
                return Verdict::Accept;
            }
            log::debug!(
                "continuity drop on pid {:#06x}: adaptation-only cc {} != {}",
                header.pid,
                cc,
                state.last_cc
            );
            self.drop_count += 1;
            return Verdict::Drop;
        }

        let expected = (state.last_cc + 1) & 0x0F;
        if cc == expected {
            state.last_cc = cc;
            state.duplicate_seen = false;
            return Verdict::Accept;
        }
        if cc == state.last_cc {
            if state.duplicate_seen {
                log::debug!(
                    "continuity drop on pid {:#06x}: second duplicate cc {}",
                    header.pid,
                    cc
                );
                state.duplicate_seen = false;
                self.drop_count += 1;
                return Verdict::Drop;
            }
            state.duplicate_seen = true;
            return Verdict::AcceptDuplicate;
        }

        log::debug!(
            "continuity drop on pid {:#06x}: cc {} (expected {})",
            header.pid,
            cc,
            expected
        );
        self.drop_count += 1;
        state.last_cc = cc;
        state.duplicate_seen = false;
        Verdict::Drop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(pid: u16, cc: u8, afc: u8) -> TsHeader {
        TsHeader {
            pid,
            continuity_counter: cc,
            adaptation_field_control: afc,
            ..Default::default()
        }
    }

    #[test]
    fn in_sequence_accepted() {
        let mut gate = ContinuityGate::new();
        for cc in [3u8, 4, 5, 6] {
            assert_eq!(gate.check(&header(0x100, cc, 0b01), None), Verdict::Accept);
        }
        assert_eq!(gate.drop_count(), 0);
    }

    #[test]
    fn wraps_mod_16() {
        let mut gate = ContinuityGate::new();
        assert_eq!(gate.check(&header(0x100, 15, 0b01), None), Verdict::Accept);
        assert_eq!(gate.check(&header(0x100, 0, 0b01), None), Verdict::Accept);
    }

    #[test]
    fn gap_drops_packet() {
        let mut gate = ContinuityGate::new();
        assert_eq!(gate.check(&header(0x100, 3, 0b01), None), Verdict::Accept);
        assert_eq!(gate.check(&header(0x100, 5, 0b01), None), Verdict::Drop);
        // counter resynchronizes on the dropped packet's value
        assert_eq!(gate.check(&header(0x100, 6, 0b01), None), Verdict::Accept);
        assert_eq!(gate.drop_count(), 1);
    }

    #[test]
    fn single_duplicate_window() {
        let mut gate = ContinuityGate::new();
        assert_eq!(gate.check(&header(0x100, 7, 0b01), None), Verdict::Accept);
        assert_eq!(
            gate.check(&header(0x100, 7, 0b01), None),
            Verdict::AcceptDuplicate
        );
        assert_eq!(gate.check(&header(0x100, 7, 0b01), None), Verdict::Drop);
        // window re-arms after an in-sequence packet
        assert_eq!(gate.check(&header(0x100, 8, 0b01), None), Verdict::Accept);
        assert_eq!(
            gate.check(&header(0x100, 8, 0b01), None),
            Verdict::AcceptDuplicate
        );
    }

    #[test]
    fn adaptation_only_must_repeat_cc() {
        let mut gate = ContinuityGate::new();
        assert_eq!(gate.check(&header(0x100, 9, 0b01), None), Verdict::Accept);
        assert_eq!(gate.check(&header(0x100, 9, 0b10), None), Verdict::Accept);
        assert_eq!(gate.check(&header(0x100, 10, 0b10), None), Verdict::Drop);
    }

    #[test]
    fn discontinuity_indicator_resets() {
        let mut gate = ContinuityGate::new();
        assert_eq!(gate.check(&header(0x100, 3, 0b01), None), Verdict::Accept);
        let af = AdaptationField {
            discontinuity_indicator: true,
            ..Default::default()
        };
        let h = header(0x100, 11, 0b11);
        assert_eq!(gate.check(&h, Some(&af)), Verdict::Accept);
        assert_eq!(gate.check(&header(0x100, 12, 0b01), None), Verdict::Accept);
        assert_eq!(gate.drop_count(), 0);
    }

    #[test]
    fn null_pid_bypasses() {
        let mut gate = ContinuityGate::new();
        assert_eq!(gate.check(&header(NULL_PID, 1, 0b01), None), Verdict::Accept);
        assert_eq!(gate.check(&header(NULL_PID, 9, 0b01), None), Verdict::Accept);
    }
}
