//! In-memory catalog of the latest decoded tables.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::psi::{
    BatSection, BitSection, CatSection, EitSection, NitSection, PatSection, PmtSection,
    SdtSection, Table, TsdtSection,
};

/// Keeps the most recent version of each table, keyed the way downstream
/// consumers look them up (PMTs by PID, EIT sections by service and section
/// identity).
#[derive(Default)]
pub struct SiCatalog {
    pub pat: Option<PatSection>,
    pub cat: Option<CatSection>,
    pub tsdt: Option<TsdtSection>,
    /// PMT PID → table; the PAT maps program_number → PID.
    pub pmts: HashMap<u16, PmtSection>,
    pub nit: Option<NitSection>,
    pub sdt: Option<SdtSection>,
    pub bat: Option<BatSection>,
    pub bit: Option<BitSection>,
    /// (service_id, table_id, section_number) → EIT section.
    pub eits: HashMap<(u16, u8, u8), EitSection>,
    /// Last TDT/TOT wall clock seen in the stream.
    pub stream_time: Option<NaiveDateTime>,
}

impl SiCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one decoded table into the catalog. `pid` is the PID the
    /// section arrived on, used to key PMTs.
    pub fn update(&mut self, pid: u16, table: Table) {
        match table {
            Table::Pat(t) => self.pat = Some(t),
            Table::Cat(t) => self.cat = Some(t),
            Table::Tsdt(t) => self.tsdt = Some(t),
            Table::Pmt(t) => {
                self.pmts.insert(pid, t);
            }
            Table::Nit(t) => self.nit = Some(t),
            Table::Sdt(t) => self.sdt = Some(t),
            Table::Bat(t) => self.bat = Some(t),
            Table::Bit(t) => self.bit = Some(t),
            Table::Eit(t) => {
                self.eits
                    .insert((t.service_id, t.table_id, t.section_number), t);
            }
            Table::Tdt(t) => self.stream_time = Some(t.time),
            Table::Tot(t) => self.stream_time = Some(t.time),
        }
    }

    /// PIDs currently known to carry PMT sections.
    pub fn pmt_pids(&self) -> Vec<u16> {
        self.pat
            .as_ref()
            .map(|pat| pat.programs.iter().map(|p| p.program_map_pid).collect())
            .unwrap_or_default()
    }

    /// Total number of EIT events accumulated across all services.
    pub fn event_count(&self) -> usize {
        self.eits.values().map(|e| e.events.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::PatEntry;

    #[test]
    fn pat_supplies_pmt_pids() {
        let mut catalog = SiCatalog::new();
        catalog.update(
            0x0000,
            Table::Pat(PatSection {
                transport_stream_id: 1,
                version: 0,
                section_number: 0,
                last_section_number: 0,
                network_pids: vec![0x0010],
                programs: vec![PatEntry {
                    program_number: 0x0408,
                    program_map_pid: 0x1FC8,
                }],
            }),
        );
        assert_eq!(catalog.pmt_pids(), vec![0x1FC8]);
    }
}
