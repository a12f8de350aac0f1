//! Bouquet Association Table (table_id 0x4A).

use super::header::SectionReader;
use super::nit::{parse_two_loop_body, TransportEntry};
use crate::desc::DescriptorLoop;

#[derive(Debug, Clone)]
pub struct BatSection {
    pub bouquet_id: u16,
    pub version: u8,
    pub bouquet_descriptors: DescriptorLoop,
    pub transports: Vec<TransportEntry>,
}

pub fn parse_bat(section: &[u8]) -> anyhow::Result<BatSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x4A {
        anyhow::bail!("not BAT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let (bouquet_descriptors, transports) = parse_two_loop_body(sec.body)?;
    Ok(BatSection {
        bouquet_id: sec.table_id_extension,
        version: sec.version,
        bouquet_descriptors,
        transports,
    })
}
