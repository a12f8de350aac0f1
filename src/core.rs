//! Stream driver: framing, gating, reassembly and dispatch for one TS.

use std::collections::HashSet;

use serde::Serialize;

use crate::assembler::SectionAssembler;
use crate::catalog::SiCatalog;
use crate::constants::{NULL_PID, SYSTEM_PIDS};
use crate::continuity::{ContinuityGate, Verdict};
use crate::desc::Descriptor;
use crate::framer::{detect_unit_size, Framer, UnitSize};
use crate::packet::{parse_packet, PacketError};
use crate::pes;
use crate::psi::{self, Decoded, Table};
use crate::stats::DemuxStats;

pub struct Options {
    pub path: std::path::PathBuf,
}

/// Demultiplexes one transport stream, packet by packet.
///
/// Each packet is fully handled before the next is read; completed tables
/// are folded into the catalog as they appear.
pub struct TsDemuxer {
    gate: ContinuityGate,
    assembler: SectionAssembler,
    pub catalog: SiCatalog,
    pub stats: DemuxStats,
    /// PIDs classified as PES by start-code inspection.
    pes_pids: HashSet<u16>,
}

impl Default for TsDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl TsDemuxer {
    pub fn new() -> Self {
        TsDemuxer {
            gate: ContinuityGate::new(),
            assembler: SectionAssembler::new(),
            catalog: SiCatalog::new(),
            stats: DemuxStats::new(),
            pes_pids: HashSet::new(),
        }
    }

    fn is_psi_pid(&self, pid: u16) -> bool {
        SYSTEM_PIDS.contains(&pid)
            || self
                .catalog
                .pat
                .as_ref()
                .map_or(false, |pat| {
                    pat.network_pids.contains(&pid)
                        || pat.programs.iter().any(|p| p.program_map_pid == pid)
                })
    }

    /// Handles one 188-byte window. Returns tables completed by this packet.
    pub fn push_packet(&mut self, window: &[u8]) -> Result<Vec<Table>, PacketError> {
        self.stats.packets += 1;

        let packet = match parse_packet(window) {
            Ok(p) => p,
            Err(PacketError::Scrambled(c)) => {
                self.stats.scrambled_packets += 1;
                return Err(PacketError::Scrambled(c));
            }
            Err(PacketError::BadSync(b)) => {
                self.stats.sync_losses += 1;
                return Err(PacketError::BadSync(b));
            }
            Err(e) => {
                self.stats.packet_errors += 1;
                return Err(e);
            }
        };

        if packet.header.transport_error_indicator {
            self.stats.transport_errors += 1;
        }
        if packet.header.pid == NULL_PID {
            self.stats.null_packets += 1;
            return Ok(Vec::new());
        }

        match self.gate.check(&packet.header, packet.adaptation.as_ref()) {
            Verdict::Accept => {}
            Verdict::AcceptDuplicate => {
                // identical payload was already processed
                self.stats.duplicate_packets += 1;
                return Ok(Vec::new());
            }
            Verdict::Drop => {
                self.stats.continuity_drops += 1;
                let before = self.assembler.truncated_count();
                self.assembler.invalidate(packet.header.pid);
                self.stats.truncated_sections += self.assembler.truncated_count() - before;
                return Ok(Vec::new());
            }
        }

        let Some(payload) = packet.payload else {
            return Ok(Vec::new());
        };
        let pid = packet.header.pid;
        let pusi = packet.header.payload_unit_start_indicator;

        if !self.is_psi_pid(pid) {
            if pusi && pes::is_pes(payload) {
                self.pes_pids.insert(pid);
                match pes::parse_pes_header(payload) {
                    Ok(_) => self.stats.pes_headers += 1,
                    Err(_) => self.stats.packet_errors += 1,
                }
                return Ok(Vec::new());
            }
            if self.pes_pids.contains(&pid) {
                // ES continuation; not interpreted
                return Ok(Vec::new());
            }
        }

        let truncated_before = self.assembler.truncated_count();
        let sections = self.assembler.push(pid, pusi, payload);
        self.stats.truncated_sections += self.assembler.truncated_count() - truncated_before;

        let mut tables = Vec::new();
        for section in sections {
            match psi::decode(section) {
                Ok(Decoded::Table(table)) => {
                    self.stats.tables_decoded += 1;
                    self.catalog.update(pid, table.clone());
                    tables.push(table);
                }
                Ok(Decoded::Unknown(table_id)) => {
                    log::debug!("pid {pid:#06x}: unknown table_id {table_id:#04x}");
                    self.stats.unknown_tables += 1;
                }
                Err(e) => {
                    log::debug!("pid {pid:#06x}: section dropped: {e}");
                    self.stats.section_errors += 1;
                }
            }
        }
        Ok(tables)
    }

    /// Drains per-PID state at end of stream.
    pub fn finish(&mut self) {
        self.assembler.finish();
        debug_assert_eq!(self.stats.continuity_drops, self.gate.drop_count());
    }
}

/// Result of analyzing a whole stream.
pub struct Analysis {
    pub unit_size: UnitSize,
    pub catalog: SiCatalog,
    pub stats: DemuxStats,
}

/// Reads `data` to the end through a fresh demuxer.
pub fn run_buffer(data: &[u8]) -> anyhow::Result<Analysis> {
    let unit_size = detect_unit_size(data)?;
    let mut framer = Framer::new(data, unit_size);
    let mut demuxer = TsDemuxer::new();

    while let Some(window) = framer.next() {
        match demuxer.push_packet(window) {
            Ok(_) | Err(PacketError::Scrambled(_)) => {}
            Err(PacketError::BadSync(_)) => {
                if !framer.resync() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("packet error: {e}");
            }
        }
    }
    demuxer.finish();

    Ok(Analysis {
        unit_size,
        catalog: demuxer.catalog,
        stats: demuxer.stats,
    })
}

/// Opens and analyzes a stored TS file. EOF is the normal exit; an
/// unsupported framing is the only fatal error past open.
pub fn run(opts: &Options) -> anyhow::Result<Analysis> {
    let data = std::fs::read(&opts.path)
        .map_err(|e| anyhow::anyhow!("{}: {e}", opts.path.display()))?;
    run_buffer(&data)
}

#[derive(Serialize)]
pub struct StreamJson {
    pub pid: u16,
    pub stream_type: u8,
    pub codec: &'static str,
}

#[derive(Serialize)]
pub struct ProgramJson {
    pub program: u16,
    pub pmt_pid: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcr_pid: Option<u16>,
    pub streams: Vec<StreamJson>,
}

#[derive(Serialize)]
pub struct ServiceJson {
    pub service_id: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
}

#[derive(Serialize)]
pub struct ReportJson {
    pub timestamp: String,
    pub unit_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_time: Option<String>,
    pub programs: Vec<ProgramJson>,
    pub services: Vec<ServiceJson>,
    pub events: usize,
    pub stats: DemuxStats,
}

impl Analysis {
    /// Shapes the catalog into the JSON report the CLI prints.
    pub fn report(&self) -> ReportJson {
        let mut programs = Vec::new();
        if let Some(pat) = &self.catalog.pat {
            for entry in &pat.programs {
                let pmt = self.catalog.pmts.get(&entry.program_map_pid);
                programs.push(ProgramJson {
                    program: entry.program_number,
                    pmt_pid: entry.program_map_pid,
                    pcr_pid: pmt.map(|p| p.pcr_pid),
                    streams: pmt
                        .map(|p| {
                            p.streams
                                .iter()
                                .map(|s| StreamJson {
                                    pid: s.elementary_pid,
                                    stream_type: s.stream_type,
                                    codec: s.stream_type_name(),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                });
            }
        }

        let mut services = Vec::new();
        if let Some(sdt) = &self.catalog.sdt {
            for svc in &sdt.services {
                let mut name = String::new();
                let mut provider = String::new();
                for d in svc.descriptors.iter() {
                    if let Descriptor::Service(sd) = d {
                        name = sd.service_name.clone();
                        provider = sd.provider_name.clone();
                    }
                }
                services.push(ServiceJson {
                    service_id: svc.service_id,
                    name,
                    provider,
                });
            }
        }

        ReportJson {
            timestamp: chrono::Utc::now().to_rfc3339(),
            unit_size: self.unit_size.size,
            stream_time: self.catalog.stream_time.map(|t| t.to_string()),
            programs,
            services,
            events: self.catalog.event_count(),
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::header::append_crc;

    /// Wraps a PSI payload (pointer_field included) into one TS packet.
    fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
        let mut p = vec![0x47];
        let mut b1 = ((pid >> 8) as u8) & 0x1F;
        if pusi {
            b1 |= 0x40;
        }
        p.push(b1);
        p.push(pid as u8);
        p.push(0x10 | (cc & 0x0F));
        p.extend_from_slice(payload);
        p.resize(188, 0xFF);
        p
    }

    fn pat_section() -> Vec<u8> {
        let mut s = vec![0x00, 0xB0, 0x0D, 0x12, 0x34, 0xC1, 0x00, 0x00];
        s.extend_from_slice(&[0x00, 0x01, 0xE1, 0x00]);
        append_crc(&mut s);
        s
    }

    #[test]
    fn pat_flows_through_pipeline() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(&pat_section());

        let mut demuxer = TsDemuxer::new();
        let tables = demuxer.push_packet(&ts_packet(0x0000, true, 0, &payload)).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(matches!(tables[0], Table::Pat(_)));
        assert!(demuxer.catalog.pat.is_some());
        assert_eq!(demuxer.stats.tables_decoded, 1);
    }

    #[test]
    fn crc_failure_counted_not_fatal() {
        let mut section = pat_section();
        let last = section.len() - 1;
        section[last] ^= 0x01;
        let mut payload = vec![0x00];
        payload.extend_from_slice(&section);

        let mut demuxer = TsDemuxer::new();
        let tables = demuxer.push_packet(&ts_packet(0x0000, true, 0, &payload)).unwrap();
        assert!(tables.is_empty());
        assert_eq!(demuxer.stats.section_errors, 1);
        assert!(demuxer.catalog.pat.is_none());
    }

    #[test]
    fn continuity_gap_invalidates_section() {
        // section split across two packets with a CC gap in between
        let mut demuxer = TsDemuxer::new();

        let mut p1 = vec![0x00, 0x42, 0xB0, 0xC9]; // 0xC9 = 201 body bytes
        p1.extend_from_slice(&vec![0u8; 180]);
        demuxer.push_packet(&ts_packet(0x0011, true, 5, &p1)).unwrap();

        // CC jumps from 5 to 7: packet dropped, buffer invalidated
        let cont = vec![0u8; 24];
        demuxer.push_packet(&ts_packet(0x0011, false, 7, &cont)).unwrap();
        assert_eq!(demuxer.stats.continuity_drops, 1);
        assert_eq!(demuxer.stats.truncated_sections, 1);
    }

    #[test]
    fn pes_pid_not_assembled() {
        let mut payload = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x00, 0x00];
        payload.resize(100, 0x55);
        let mut demuxer = TsDemuxer::new();
        let tables = demuxer.push_packet(&ts_packet(0x0100, true, 0, &payload)).unwrap();
        assert!(tables.is_empty());
        assert_eq!(demuxer.stats.pes_headers, 1);
    }

    #[test]
    fn scrambled_packet_counted() {
        let mut p = ts_packet(0x0100, true, 0, &[0x00]);
        p[3] |= 0x80; // scrambling control
        let mut demuxer = TsDemuxer::new();
        assert!(demuxer.push_packet(&p).is_err());
        assert_eq!(demuxer.stats.scrambled_packets, 1);
    }

    #[test]
    fn end_to_end_buffer_run() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(&pat_section());
        let mut data = ts_packet(0x0000, true, 0, &payload);
        // pad with null packets so the probe sees a clean 188 cadence
        for cc in 1..=25u8 {
            data.extend_from_slice(&ts_packet(NULL_PID, false, cc, &[]));
        }

        let analysis = run_buffer(&data).unwrap();
        assert_eq!(analysis.unit_size.size, 188);
        assert!(analysis.catalog.pat.is_some());
        assert_eq!(analysis.stats.null_packets, 25);

        let report = analysis.report();
        assert_eq!(report.programs.len(), 1);
        assert_eq!(report.programs[0].pmt_pid, 0x0100);
    }
}
