//! PSI/SI table decoding: dispatch completed sections by table_id.

pub mod bat;
pub mod bit;
pub mod cat;
pub mod eit;
pub mod header;
pub mod nit;
pub mod pat;
pub mod pmt;
pub mod sdt;
pub mod tdt;
pub mod tsdt;

pub use bat::{parse_bat, BatSection};
pub use bit::{parse_bit, BitSection};
pub use cat::{parse_cat, CatSection};
pub use eit::{parse_eit, EitEvent, EitSection};
pub use nit::{parse_nit, NitSection};
pub use pat::{parse_pat, PatEntry, PatSection};
pub use pmt::{parse_pmt, stream_type_name, EsInfo, PmtSection};
pub use sdt::{parse_sdt, RunningStatus, SdtSection, SdtService};
pub use tdt::{parse_tdt_tot, TdtSection, TimeSection, TotSection};
pub use tsdt::{parse_tsdt, TsdtSection};

/// One decoded PSI/SI table.
#[derive(Debug, Clone)]
pub enum Table {
    Pat(PatSection),
    Cat(CatSection),
    Pmt(PmtSection),
    Tsdt(TsdtSection),
    Nit(NitSection),
    Sdt(SdtSection),
    Bat(BatSection),
    Eit(EitSection),
    Tdt(TdtSection),
    Tot(TotSection),
    Bit(BitSection),
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Pat(_) => "PAT",
            Table::Cat(_) => "CAT",
            Table::Pmt(_) => "PMT",
            Table::Tsdt(_) => "TSDT",
            Table::Nit(_) => "NIT",
            Table::Sdt(_) => "SDT",
            Table::Bat(_) => "BAT",
            Table::Eit(_) => "EIT",
            Table::Tdt(_) => "TDT",
            Table::Tot(_) => "TOT",
            Table::Bit(_) => "BIT",
        }
    }
}

/// Outcome of dispatching one section.
#[derive(Debug)]
pub enum Decoded {
    Table(Table),
    /// table_id outside the recognized set; the section is skipped.
    Unknown(u8),
}

/// Decodes one complete, assembler-emitted section.
///
/// The section is consumed: decoded tables own their strings and sub-records,
/// nothing borrows from the input afterwards.
pub fn decode(section: Vec<u8>) -> anyhow::Result<Decoded> {
    let Some(&table_id) = section.first() else {
        anyhow::bail!("empty section");
    };

    let table = match table_id {
        0x00 => Table::Pat(parse_pat(&section)?),
        0x01 => Table::Cat(parse_cat(&section)?),
        0x02 => Table::Pmt(parse_pmt(&section)?),
        0x03 => Table::Tsdt(parse_tsdt(&section)?),
        0x40 | 0x41 => Table::Nit(parse_nit(&section)?),
        0x42 | 0x46 => Table::Sdt(parse_sdt(&section)?),
        0x4A => Table::Bat(parse_bat(&section)?),
        0x4E..=0x6F => Table::Eit(parse_eit(&section)?),
        0x70 | 0x73 => match parse_tdt_tot(&section)? {
            TimeSection::Tdt(t) => Table::Tdt(t),
            TimeSection::Tot(t) => Table::Tot(t),
        },
        0xC4 => Table::Bit(parse_bit(&section)?),
        other => return Ok(Decoded::Unknown(other)),
    };

    Ok(Decoded::Table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::header::append_crc;

    #[test]
    fn unknown_table_id_reported() {
        let mut s = vec![0x72, 0xB0, 0x09, 0x00, 0x00, 0xC1, 0x00, 0x00];
        append_crc(&mut s);
        match decode(s).unwrap() {
            Decoded::Unknown(tid) => assert_eq!(tid, 0x72),
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn pat_dispatches() {
        let mut s = vec![0x00, 0xB0, 0x0D, 0x12, 0x34, 0xC1, 0x00, 0x00];
        s.extend_from_slice(&[0x00, 0x01, 0xE1, 0x00]);
        append_crc(&mut s);
        match decode(s).unwrap() {
            Decoded::Table(Table::Pat(pat)) => {
                assert_eq!(pat.transport_stream_id, 0x1234);
                assert_eq!(pat.programs[0].program_map_pid, 0x0100);
            }
            other => panic!("expected PAT, got {other:?}"),
        }
    }

    #[test]
    fn corrupted_section_is_error() {
        let mut s = vec![0x00, 0xB0, 0x0D, 0x12, 0x34, 0xC1, 0x00, 0x00];
        s.extend_from_slice(&[0x00, 0x01, 0xE1, 0x00]);
        append_crc(&mut s);
        let last = s.len() - 1;
        s[last] ^= 0x01;
        assert!(decode(s).is_err());
    }
}
