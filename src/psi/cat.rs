//! Conditional Access Table (table_id 0x01).

use super::header::SectionReader;
use crate::desc::DescriptorLoop;

#[derive(Debug, Clone)]
pub struct CatSection {
    pub version: u8,
    pub descriptors: DescriptorLoop,
}

pub fn parse_cat(section: &[u8]) -> anyhow::Result<CatSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x01 {
        anyhow::bail!("not CAT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    Ok(CatSection {
        version: sec.version,
        descriptors: DescriptorLoop::parse(sec.body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;

    #[test]
    fn cat_with_ca_descriptor() {
        let desc = [0x09, 0x04, 0x06, 0x05, 0xE0, 0x31];
        let len = 5 + desc.len() + 4;
        let mut s = vec![0x01, 0xB0, len as u8, 0xFF, 0xFF, 0xC3, 0x00, 0x00];
        s.extend_from_slice(&desc);
        append_crc(&mut s);

        let cat = parse_cat(&s).unwrap();
        assert_eq!(cat.version, 1);
        assert_eq!(cat.descriptors.len(), 1);
        match &cat.descriptors.entries[0] {
            Descriptor::ConditionalAccess(ca) => {
                assert_eq!(ca.ca_system_id, 0x0605);
                assert_eq!(ca.ca_pid, 0x0031);
            }
            other => panic!("wrong descriptor: {other:?}"),
        }
    }
}
