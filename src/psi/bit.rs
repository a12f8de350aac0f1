//! Broadcaster Information Table (table_id 0xC4), ARIB STD-B10.

use super::header::SectionReader;
use crate::desc::DescriptorLoop;

#[derive(Debug, Clone)]
pub struct BitSection {
    pub original_network_id: u16,
    pub version: u8,
    pub broadcast_view_propriety: bool,
    pub first_descriptors: DescriptorLoop,
    pub broadcasters: Vec<BroadcasterEntry>,
}

#[derive(Debug, Clone)]
pub struct BroadcasterEntry {
    pub broadcaster_id: u8,
    pub descriptors: DescriptorLoop,
}

pub fn parse_bit(section: &[u8]) -> anyhow::Result<BitSection> {
    let sec = SectionReader::new(section, true)?;
    if sec.table_id != 0xC4 {
        anyhow::bail!("not BIT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let b = sec.body;
    if b.len() < 2 {
        anyhow::bail!("BIT body too short");
    }
    let broadcast_view_propriety = b[0] & 0x10 != 0;
    let first_len = ((b[0] & 0x0F) as usize) << 8 | b[1] as usize;
    if 2 + first_len > b.len() {
        anyhow::bail!("truncated first descriptor loop");
    }
    let first_descriptors = DescriptorLoop::parse(&b[2..2 + first_len]);

    let mut broadcasters = Vec::new();
    let mut idx = 2 + first_len;
    while idx + 3 <= b.len() {
        let broadcaster_id = b[idx];
        let desc_len = ((b[idx + 1] & 0x0F) as usize) << 8 | b[idx + 2] as usize;
        idx += 3;
        if idx + desc_len > b.len() {
            anyhow::bail!("broadcaster descriptors overrun");
        }
        broadcasters.push(BroadcasterEntry {
            broadcaster_id,
            descriptors: DescriptorLoop::parse(&b[idx..idx + desc_len]),
        });
        idx += desc_len;
    }

    Ok(BitSection {
        original_network_id: sec.table_id_extension,
        version: sec.version,
        broadcast_view_propriety,
        first_descriptors,
        broadcasters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;

    #[test]
    fn bit_broadcaster_loop() {
        let name = [0xD8, 0x05, 0x1B, 0x28, 0x4A, b'N', b'X'];
        let mut body = vec![0xF0, 0x00]; // no first descriptors
        body.push(0x03); // broadcaster_id
        body.push(0xF0);
        body.push(name.len() as u8);
        body.extend_from_slice(&name);

        let len = 5 + body.len() + 4;
        let mut s = vec![0xC4, 0xB0, len as u8];
        s.extend_from_slice(&0x0004u16.to_be_bytes());
        s.extend_from_slice(&[0xC1, 0x00, 0x00]);
        s.append(&mut body);
        append_crc(&mut s);

        let bit = parse_bit(&s).unwrap();
        assert_eq!(bit.original_network_id, 0x0004);
        assert_eq!(bit.broadcasters.len(), 1);
        assert_eq!(bit.broadcasters[0].broadcaster_id, 0x03);
        match &bit.broadcasters[0].descriptors.entries[0] {
            Descriptor::BroadcasterName(d) => assert_eq!(d.name, "ＮＸ"),
            other => panic!("wrong descriptor: {other:?}"),
        }
    }
}
