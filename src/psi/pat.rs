//! Program Association Table (table_id 0x00).

use super::header::SectionReader;
use crate::utils::read_be_16;

#[derive(Debug, Clone)]
pub struct PatSection {
    pub transport_stream_id: u16,
    pub version: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    /// PIDs announced for program_number 0 (the NIT).
    pub network_pids: Vec<u16>,
    pub programs: Vec<PatEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatEntry {
    pub program_number: u16,
    pub program_map_pid: u16,
}

pub fn parse_pat(section: &[u8]) -> anyhow::Result<PatSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x00 {
        anyhow::bail!("not PAT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let mut network_pids = Vec::new();
    let mut programs: Vec<PatEntry> = Vec::new();
    let mut idx = 0;
    while idx + 4 <= sec.body.len() {
        let program_number = read_be_16(&sec.body[idx..]);
        let pid = ((sec.body[idx + 2] & 0x1F) as u16) << 8 | sec.body[idx + 3] as u16;
        idx += 4;
        if program_number == 0 {
            network_pids.push(pid);
        } else if !programs.iter().any(|p| p.program_map_pid == pid) {
            // the same PMT PID announced twice is kept once
            programs.push(PatEntry {
                program_number,
                program_map_pid: pid,
            });
        }
    }

    Ok(PatSection {
        transport_stream_id: sec.table_id_extension,
        version: sec.version,
        section_number: sec.section_number,
        last_section_number: sec.last_section,
        network_pids,
        programs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::header::append_crc;

    fn build_pat(entries: &[(u16, u16)]) -> Vec<u8> {
        let len = 5 + entries.len() * 4 + 4;
        let mut s = vec![0x00, 0xB0 | ((len >> 8) as u8 & 0x0F), len as u8];
        s.extend_from_slice(&0x1234u16.to_be_bytes());
        s.push(0xC1);
        s.push(0x00);
        s.push(0x00);
        for (pn, pid) in entries {
            s.extend_from_slice(&pn.to_be_bytes());
            s.extend_from_slice(&(0xE000 | pid).to_be_bytes());
        }
        append_crc(&mut s);
        s
    }

    #[test]
    fn pat_round_trip() {
        let sec = build_pat(&[(0, 0x0010), (1, 0x0100)]);
        let pat = parse_pat(&sec).unwrap();
        assert_eq!(pat.transport_stream_id, 0x1234);
        assert_eq!(pat.version, 0);
        assert_eq!(pat.network_pids, vec![0x0010]);
        assert_eq!(
            pat.programs,
            vec![PatEntry {
                program_number: 1,
                program_map_pid: 0x0100
            }]
        );
    }

    #[test]
    fn duplicate_pmt_pids_deduplicated() {
        let sec = build_pat(&[(1, 0x0100), (2, 0x0100), (3, 0x0101)]);
        let pat = parse_pat(&sec).unwrap();
        assert_eq!(pat.programs.len(), 2);
    }

    #[test]
    fn not_applicable_section_skipped() {
        let mut sec = build_pat(&[(1, 0x0100)]);
        sec[5] = 0xC0; // current_next_indicator = 0
        let len = sec.len();
        sec.truncate(len - 4);
        append_crc(&mut sec);
        assert!(parse_pat(&sec).is_err());
    }

    #[test]
    fn crc_failure_rejected() {
        let mut sec = build_pat(&[(1, 0x0100)]);
        let last = sec.len() - 1;
        sec[last] ^= 0xFF;
        assert!(parse_pat(&sec).is_err());
    }
}
