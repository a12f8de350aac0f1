//! Service Description Table (table_id 0x42 actual / 0x46 other).

use super::header::SectionReader;
use crate::desc::DescriptorLoop;
use crate::utils::read_be_16;

/// Running status per ARIB STD-B10 table 5-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningStatus {
    Undefined,
    NotRunning,
    StartsSoon,
    Stopped,
    Running,
    Reserved(u8),
}

impl From<u8> for RunningStatus {
    fn from(v: u8) -> Self {
        match v {
            0 => RunningStatus::Undefined,
            1 => RunningStatus::NotRunning,
            2 => RunningStatus::StartsSoon,
            3 => RunningStatus::Stopped,
            4 => RunningStatus::Running,
            other => RunningStatus::Reserved(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SdtSection {
    pub table_id: u8,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub version: u8,
    pub services: Vec<SdtService>,
}

#[derive(Debug, Clone)]
pub struct SdtService {
    pub service_id: u16,
    pub eit_user_defined_flags: u8,
    pub eit_schedule_flag: bool,
    pub eit_present_following_flag: bool,
    pub running_status: RunningStatus,
    pub free_ca_mode: bool,
    pub descriptors: DescriptorLoop,
}

pub fn parse_sdt(section: &[u8]) -> anyhow::Result<SdtSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x42 && sec.table_id != 0x46 {
        anyhow::bail!("not SDT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let b = sec.body;
    if b.len() < 3 {
        anyhow::bail!("SDT body too short");
    }
    let original_network_id = read_be_16(b);
    // one reserved byte follows original_network_id

    let mut services = Vec::new();
    let mut idx = 3;
    while idx + 5 <= b.len() {
        let service_id = read_be_16(&b[idx..]);
        let flags = b[idx + 2];
        let desc_len = ((b[idx + 3] & 0x0F) as usize) << 8 | b[idx + 4] as usize;
        idx += 5;
        if idx + desc_len > b.len() {
            anyhow::bail!("service descriptors overrun");
        }
        services.push(SdtService {
            service_id,
            eit_user_defined_flags: (flags & 0x1C) >> 2,
            eit_schedule_flag: flags & 0x02 != 0,
            eit_present_following_flag: flags & 0x01 != 0,
            running_status: RunningStatus::from((b[idx - 2] & 0xE0) >> 5),
            free_ca_mode: b[idx - 2] & 0x10 != 0,
            descriptors: DescriptorLoop::parse(&b[idx..idx + desc_len]),
        });
        idx += desc_len;
    }

    Ok(SdtSection {
        table_id: sec.table_id,
        transport_stream_id: sec.table_id_extension,
        original_network_id,
        version: sec.version,
        services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;

    #[test]
    fn sdt_service_entry() {
        let svc_desc = [0x48, 0x05, 0x01, 0x00, 0x01, 0x1B, 0x7E];
        let mut body = vec![0x00, 0x04, 0xFF]; // original_network_id + reserved
        body.extend_from_slice(&0x0408u16.to_be_bytes());
        body.push(0b000_101_1_1); // EIT flags
        body.push(0x90 | ((svc_desc.len() >> 8) as u8 & 0x0F)); // running 4, free_CA
        body.push(svc_desc.len() as u8);
        body.extend_from_slice(&svc_desc);

        let len = 5 + body.len() + 4;
        let mut s = vec![0x42, 0xB0, len as u8];
        s.extend_from_slice(&0x7FE1u16.to_be_bytes());
        s.extend_from_slice(&[0xC1, 0x00, 0x00]);
        s.append(&mut body);
        append_crc(&mut s);

        let sdt = parse_sdt(&s).unwrap();
        assert_eq!(sdt.transport_stream_id, 0x7FE1);
        assert_eq!(sdt.original_network_id, 0x0004);
        assert_eq!(sdt.services.len(), 1);
        let svc = &sdt.services[0];
        assert_eq!(svc.service_id, 0x0408);
        assert!(svc.eit_schedule_flag);
        assert!(svc.eit_present_following_flag);
        assert_eq!(svc.eit_user_defined_flags, 0b101);
        assert_eq!(svc.running_status, RunningStatus::Running);
        assert!(svc.free_ca_mode);
        assert!(matches!(
            svc.descriptors.entries[0],
            Descriptor::Service(ref d) if d.service_type == 0x01
        ));
    }
}
