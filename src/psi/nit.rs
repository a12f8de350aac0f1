//! Network Information Table (table_id 0x40 actual / 0x41 other).

use super::header::SectionReader;
use crate::desc::DescriptorLoop;
use crate::utils::read_be_16;

#[derive(Debug, Clone)]
pub struct NitSection {
    pub table_id: u8,
    pub network_id: u16,
    pub version: u8,
    pub network_descriptors: DescriptorLoop,
    pub transports: Vec<TransportEntry>,
}

#[derive(Debug, Clone)]
pub struct TransportEntry {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub descriptors: DescriptorLoop,
}

/// Parses the two-loop body shared by NIT and BAT.
pub(super) fn parse_two_loop_body(
    body: &[u8],
) -> anyhow::Result<(DescriptorLoop, Vec<TransportEntry>)> {
    if body.len() < 2 {
        anyhow::bail!("body too short");
    }
    let first_len = ((body[0] & 0x0F) as usize) << 8 | body[1] as usize;
    if 2 + first_len + 2 > body.len() {
        anyhow::bail!("truncated first descriptor loop");
    }
    let first_loop = DescriptorLoop::parse(&body[2..2 + first_len]);

    let mut idx = 2 + first_len;
    let ts_loop_len = ((body[idx] & 0x0F) as usize) << 8 | body[idx + 1] as usize;
    idx += 2;
    let ts_end = idx + ts_loop_len;
    if ts_end > body.len() {
        anyhow::bail!("truncated transport stream loop");
    }

    let mut transports = Vec::new();
    while idx + 6 <= ts_end {
        let transport_stream_id = read_be_16(&body[idx..]);
        let original_network_id = read_be_16(&body[idx + 2..]);
        let desc_len = ((body[idx + 4] & 0x0F) as usize) << 8 | body[idx + 5] as usize;
        idx += 6;
        if idx + desc_len > ts_end {
            anyhow::bail!("transport descriptors overrun");
        }
        transports.push(TransportEntry {
            transport_stream_id,
            original_network_id,
            descriptors: DescriptorLoop::parse(&body[idx..idx + desc_len]),
        });
        idx += desc_len;
    }

    Ok((first_loop, transports))
}

pub fn parse_nit(section: &[u8]) -> anyhow::Result<NitSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x40 && sec.table_id != 0x41 {
        anyhow::bail!("not NIT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let (network_descriptors, transports) = parse_two_loop_body(sec.body)?;
    Ok(NitSection {
        table_id: sec.table_id,
        network_id: sec.table_id_extension,
        version: sec.version,
        network_descriptors,
        transports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;

    #[test]
    fn nit_with_name_and_transport() {
        // network_name "ＴＶ" + one transport with a service list
        let name_desc = [0x40, 0x05, 0x1B, 0x28, 0x4A, b'T', b'V'];
        let svc_list = [0x41, 0x03, 0x04, 0x08, 0x01];
        let mut body = vec![0xF0, name_desc.len() as u8];
        body.extend_from_slice(&name_desc);
        let ts_loop_len = 6 + svc_list.len();
        body.extend_from_slice(&[0xF0, ts_loop_len as u8]);
        body.extend_from_slice(&0x7FE1u16.to_be_bytes());
        body.extend_from_slice(&0x0004u16.to_be_bytes());
        body.extend_from_slice(&[0xF0, svc_list.len() as u8]);
        body.extend_from_slice(&svc_list);

        let len = 5 + body.len() + 4;
        let mut s = vec![0x40, 0xB0 | ((len >> 8) as u8 & 0x0F), len as u8];
        s.extend_from_slice(&0x0004u16.to_be_bytes());
        s.extend_from_slice(&[0xC1, 0x00, 0x00]);
        s.append(&mut body);
        append_crc(&mut s);

        let nit = parse_nit(&s).unwrap();
        assert_eq!(nit.network_id, 0x0004);
        assert_eq!(nit.transports.len(), 1);
        assert_eq!(nit.transports[0].transport_stream_id, 0x7FE1);
        match &nit.network_descriptors.entries[0] {
            Descriptor::NetworkName(d) => assert_eq!(d.name, "ＴＶ"),
            other => panic!("wrong descriptor: {other:?}"),
        }
        match &nit.transports[0].descriptors.entries[0] {
            Descriptor::ServiceList(d) => {
                assert_eq!(d.services[0].service_id, 0x0408);
                assert_eq!(d.services[0].service_type, 0x01);
            }
            other => panic!("wrong descriptor: {other:?}"),
        }
    }
}
