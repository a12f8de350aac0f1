//! TS Description Table (table_id 0x03), H.222.0 §2.4.4.12.

use super::header::SectionReader;
use crate::desc::DescriptorLoop;

#[derive(Debug, Clone)]
pub struct TsdtSection {
    pub version: u8,
    pub descriptors: DescriptorLoop,
}

pub fn parse_tsdt(section: &[u8]) -> anyhow::Result<TsdtSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x03 {
        anyhow::bail!("not TSDT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    Ok(TsdtSection {
        version: sec.version,
        descriptors: DescriptorLoop::parse(sec.body),
    })
}
