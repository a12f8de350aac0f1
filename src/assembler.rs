//! Per-PID reassembly of PSI/SI sections from packet payloads.
//!
//! A section may be split across packets, and one payload may pack several
//! sections back to back. The accumulation buffer lives from the first PUSI
//! fragment until the expected total length is reached, then the completed
//! section is moved out to the caller.

use std::collections::HashMap;

/// Per-PID accumulation state.
#[derive(Default)]
struct PidBuffer {
    buf: Vec<u8>,
    expected: usize,
}

/// Reassembles complete sections from ordered per-PID payloads.
#[derive(Default)]
pub struct SectionAssembler {
    pids: HashMap<u16, PidBuffer>,
    /// PID of the PSI payload seen most recently; continuation fragments are
    /// only accepted on this PID.
    last_psi_pid: Option<u16>,
    truncated_count: u64,
}

impl SectionAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections discarded because a new PUSI arrived before completion.
    pub fn truncated_count(&self) -> u64 {
        self.truncated_count
    }

    /// Drops any partial state for a PID (continuity discontinuity).
    pub fn invalidate(&mut self, pid: u16) {
        if let Some(state) = self.pids.get_mut(&pid) {
            if !state.buf.is_empty() {
                log::debug!(
                    "pid {:#06x}: invalidating {} buffered bytes",
                    pid,
                    state.buf.len()
                );
                self.truncated_count += 1;
            }
            state.buf.clear();
            state.expected = 0;
        }
    }

    /// Feeds one PSI payload; returns every section completed by it.
    pub fn push(&mut self, pid: u16, pusi: bool, payload: &[u8]) -> Vec<Vec<u8>> {
        let mut sections = Vec::new();
        if payload.is_empty() {
            return sections;
        }

        if pusi {
            self.push_unit_start(pid, payload, &mut sections);
            self.last_psi_pid = Some(pid);
        } else {
            // no pointer_field in the payload
            if self.last_psi_pid != Some(pid) {
                return sections;
            }
            let state = match self.pids.get_mut(&pid) {
                Some(s) if !s.buf.is_empty() => s,
                _ => return sections,
            };

            let mut rest = payload;
            if state.expected == 0 {
                // the section header itself straddled the packet boundary
                let need = 3 - state.buf.len();
                let n = need.min(rest.len());
                state.buf.extend_from_slice(&rest[..n]);
                rest = &rest[n..];
                if state.buf.len() < 3 {
                    return sections;
                }
                let section_length =
                    (((state.buf[1] & 0x0F) as usize) << 8) | state.buf[2] as usize;
                state.expected = 3 + section_length;
            }

            let want = state.expected - state.buf.len();
            let n = want.min(rest.len());
            state.buf.extend_from_slice(&rest[..n]);
            if state.buf.len() == state.expected {
                sections.push(std::mem::take(&mut state.buf));
                state.expected = 0;
            }
        }

        sections
    }

    fn push_unit_start(&mut self, pid: u16, payload: &[u8], sections: &mut Vec<Vec<u8>>) {
        let pointer_field = payload[0] as usize;
        if 1 + pointer_field > payload.len() {
            return;
        }

        let state = self.pids.entry(pid).or_default();

        if !state.buf.is_empty() {
            // pre-pointer bytes finish the outstanding section only when the
            // count matches exactly; otherwise the tail is dropped
            if pointer_field != 0
                && state.expected > state.buf.len()
                && state.expected - state.buf.len() == pointer_field
            {
                state.buf.extend_from_slice(&payload[1..1 + pointer_field]);
                sections.push(std::mem::take(&mut state.buf));
            } else {
                log::debug!(
                    "pid {:#06x}: discarding incomplete section ({} of {} bytes)",
                    pid,
                    state.buf.len(),
                    state.expected
                );
                self.truncated_count += 1;
                state.buf.clear();
            }
            state.expected = 0;
        }

        let mut idx = 1 + pointer_field;
        while idx < payload.len() {
            if payload[idx] == 0xFF {
                // stuffing terminates the section loop
                break;
            }
            if idx + 3 > payload.len() {
                // the 3-byte section header straddles the packet boundary;
                // expected stays 0 until the next fragment completes it
                state.buf.clear();
                state.buf.extend_from_slice(&payload[idx..]);
                state.expected = 0;
                break;
            }

            let section_length = (((payload[idx + 1] & 0x0F) as usize) << 8) | payload[idx + 2] as usize;
            let total = 3 + section_length;
            let end = (idx + total).min(payload.len());
            state.buf.clear();
            state.buf.extend_from_slice(&payload[idx..end]);
            state.expected = total;

            if state.buf.len() == total {
                sections.push(std::mem::take(&mut state.buf));
                state.expected = 0;
            }

            idx += total;
        }
    }

    /// Drains all partial buffers (stream close); their content is dropped.
    pub fn finish(&mut self) {
        for (pid, state) in self.pids.iter_mut() {
            if !state.buf.is_empty() {
                log::debug!(
                    "pid {:#06x}: {} bytes unfinished at end of stream",
                    pid,
                    state.buf.len()
                );
                state.buf.clear();
                state.expected = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(table_id: u8, body_len: usize) -> Vec<u8> {
        let mut s = vec![table_id, 0xB0 | ((body_len >> 8) as u8 & 0x0F), body_len as u8];
        s.extend((0..body_len).map(|i| i as u8));
        s
    }

    #[test]
    fn single_packet_section() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x00, 13);
        let mut payload = vec![0x00]; // pointer_field
        payload.extend_from_slice(&sec);
        payload.resize(184, 0xFF);

        let out = asm.push(0x0000, true, &payload);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], sec);
        assert_eq!(out[0].len(), 3 + 13);
    }

    #[test]
    fn multiple_sections_in_one_payload() {
        let mut asm = SectionAssembler::new();
        let a = section(0x42, 10);
        let b = section(0x4E, 8);
        let mut payload = vec![0x00];
        payload.extend_from_slice(&a);
        payload.extend_from_slice(&b);
        payload.resize(184, 0xFF);

        let out = asm.push(0x0011, true, &payload);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], a);
        assert_eq!(out[1], b);
    }

    #[test]
    fn cross_packet_section() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x02, 197); // 200 bytes total
        let mut first = vec![0x00];
        first.extend_from_slice(&sec[..183]);
        assert_eq!(first.len(), 184);

        let out = asm.push(0x10, true, &first);
        assert!(out.is_empty());

        let mut second = sec[183..].to_vec();
        second.resize(184, 0xFF);
        let out = asm.push(0x10, false, &second);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], sec);

        // buffer is empty afterwards: more continuation data is ignored
        let out = asm.push(0x10, false, &[0xAAu8; 184]);
        assert!(out.is_empty());
    }

    #[test]
    fn pointer_field_completes_previous() {
        let mut asm = SectionAssembler::new();
        let first_sec = section(0x42, 181); // 184 bytes: 180 in pkt 1, 4 in pkt 2
        let next_sec = section(0x4E, 5);

        let mut p1 = vec![0x00];
        p1.extend_from_slice(&first_sec[..180]);
        assert!(asm.push(0x11, true, &p1[..181]).is_empty());

        let mut p2 = vec![4u8]; // pointer_field: 4 bytes belong to the old section
        p2.extend_from_slice(&first_sec[180..]);
        p2.extend_from_slice(&next_sec);
        p2.resize(184, 0xFF);

        let out = asm.push(0x11, true, &p2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], first_sec);
        assert_eq!(out[1], next_sec);
    }

    #[test]
    fn mismatched_pointer_drops_tail() {
        let mut asm = SectionAssembler::new();
        let first_sec = section(0x42, 181);
        let next_sec = section(0x4E, 5);

        let mut p1 = vec![0x00];
        p1.extend_from_slice(&first_sec[..180]);
        assert!(asm.push(0x11, true, &p1[..181]).is_empty());

        // pointer says 2 but 4 bytes are outstanding: tail must be discarded
        let mut p2 = vec![2u8];
        p2.extend_from_slice(&first_sec[180..182]);
        p2.extend_from_slice(&next_sec);
        p2.resize(184, 0xFF);

        let out = asm.push(0x11, true, &p2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], next_sec);
        assert_eq!(asm.truncated_count(), 1);
    }

    #[test]
    fn new_pusi_discards_incomplete() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x02, 250);
        let mut p1 = vec![0x00];
        p1.extend_from_slice(&sec[..183]);
        assert!(asm.push(0x10, true, &p1).is_empty());

        let fresh = section(0x02, 20);
        let mut p2 = vec![0x00];
        p2.extend_from_slice(&fresh);
        p2.resize(184, 0xFF);
        let out = asm.push(0x10, true, &p2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], fresh);
        assert_eq!(asm.truncated_count(), 1);
    }

    #[test]
    fn continuation_requires_matching_pid() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x02, 197);
        let mut p1 = vec![0x00];
        p1.extend_from_slice(&sec[..183]);
        assert!(asm.push(0x10, true, &p1).is_empty());

        // continuation arriving on a different PID must not append
        let out = asm.push(0x11, false, &sec[183..]);
        assert!(out.is_empty());
    }

    #[test]
    fn stuffing_stops_loop() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x00, 9);
        let mut payload = vec![0x00];
        payload.extend_from_slice(&sec);
        payload.push(0xFF);
        payload.extend_from_slice(&section(0x00, 5)); // unreachable after stuffing
        payload.resize(184, 0xFF);
        let out = asm.push(0x0000, true, &payload);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn header_straddles_packet_boundary() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x42, 40);
        // pointer_field pushes the section start to the very last byte, so
        // only 1 of the 3 header bytes fits in the first payload
        let mut p1 = vec![182u8];
        p1.extend_from_slice(&[0xAAu8; 182]);
        p1.extend_from_slice(&sec[..1]);
        assert_eq!(p1.len(), 184);
        assert!(asm.push(0x11, true, &p1).is_empty());

        let mut p2 = sec[1..].to_vec();
        p2.resize(184, 0xFF);
        let out = asm.push(0x11, false, &p2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], sec);
    }

    #[test]
    fn invalidate_clears_partial_state() {
        let mut asm = SectionAssembler::new();
        let sec = section(0x02, 197);
        let mut p1 = vec![0x00];
        p1.extend_from_slice(&sec[..183]);
        assert!(asm.push(0x10, true, &p1).is_empty());

        asm.invalidate(0x10);
        assert_eq!(asm.truncated_count(), 1);
        let out = asm.push(0x10, false, &sec[183..]);
        assert!(out.is_empty());
    }
}
