//! Program Map Table (table_id 0x02).

use super::header::SectionReader;
use crate::desc::DescriptorLoop;

#[derive(Debug, Clone)]
pub struct PmtSection {
    pub program_number: u16,
    pub version: u8,
    pub pcr_pid: u16,
    pub program_descriptors: DescriptorLoop,
    pub streams: Vec<EsInfo>,
}

#[derive(Debug, Clone)]
pub struct EsInfo {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub descriptors: DescriptorLoop,
}

impl EsInfo {
    pub fn stream_type_name(&self) -> &'static str {
        stream_type_name(self.stream_type)
    }
}

pub fn stream_type_name(stream_type: u8) -> &'static str {
    match stream_type {
        0x01 => "MPEG-1 Video",
        0x02 => "MPEG-2 Video",
        0x03 => "MPEG-1 Audio",
        0x04 => "MPEG-2 Audio",
        0x05 => "Private Sections",
        0x06 => "PES Private Data",
        0x0A..=0x0D => "ISO/IEC 13818-6",
        0x0F => "AAC Audio (ADTS)",
        0x10 => "MPEG-4 Visual",
        0x11 => "AAC Audio (LATM)",
        0x1B => "H.264/AVC Video",
        0x24 => "H.265/HEVC Video",
        0x80 => "LPCM",
        0x81 => "AC-3",
        0x82 | 0x85 | 0x86 => "DTS",
        0x83 => "MLP",
        0x87 => "DD+",
        0xFD => "VC-1",
        _ => "unknown",
    }
}

pub fn parse_pmt(section: &[u8]) -> anyhow::Result<PmtSection> {
    let sec = SectionReader::new(section, false)?;
    if sec.table_id != 0x02 {
        anyhow::bail!("not PMT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let b = sec.body;
    if b.len() < 4 {
        anyhow::bail!("PMT body too short");
    }
    let pcr_pid = ((b[0] & 0x1F) as u16) << 8 | b[1] as u16;
    let program_info_length = ((b[2] & 0x0F) as usize) << 8 | b[3] as usize;
    if 4 + program_info_length > b.len() {
        anyhow::bail!("truncated program descriptors");
    }
    let program_descriptors = DescriptorLoop::parse(&b[4..4 + program_info_length]);

    let mut streams = Vec::new();
    let mut idx = 4 + program_info_length;
    while idx + 5 <= b.len() {
        let stream_type = b[idx];
        let elementary_pid = ((b[idx + 1] & 0x1F) as u16) << 8 | b[idx + 2] as u16;
        let es_info_length = ((b[idx + 3] & 0x0F) as usize) << 8 | b[idx + 4] as usize;
        idx += 5;
        if idx + es_info_length > b.len() {
            anyhow::bail!("truncated ES descriptors");
        }
        streams.push(EsInfo {
            stream_type,
            elementary_pid,
            descriptors: DescriptorLoop::parse(&b[idx..idx + es_info_length]),
        });
        idx += es_info_length;
    }

    Ok(PmtSection {
        program_number: sec.table_id_extension,
        version: sec.version,
        pcr_pid,
        program_descriptors,
        streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;

    #[test]
    fn pmt_streams_and_descriptors() {
        let mut body = vec![
            0xE1, 0x00, // PCR PID 0x0100
            0xF0, 0x00, // no program descriptors
            0x1B, 0xE1, 0x00, 0xF0, 0x03, 0x52, 0x01, 0x00, // H.264 + stream_identifier
            0x0F, 0xE1, 0x10, 0xF0, 0x00, // AAC
        ];
        let len = 5 + body.len() + 4;
        let mut s = vec![0x02, 0xB0, len as u8];
        s.extend_from_slice(&0x0408u16.to_be_bytes());
        s.extend_from_slice(&[0xC1, 0x00, 0x00]);
        s.append(&mut body);
        append_crc(&mut s);

        let pmt = parse_pmt(&s).unwrap();
        assert_eq!(pmt.program_number, 0x0408);
        assert_eq!(pmt.pcr_pid, 0x0100);
        assert!(pmt.program_descriptors.is_empty());
        assert_eq!(pmt.streams.len(), 2);
        assert_eq!(pmt.streams[0].stream_type_name(), "H.264/AVC Video");
        assert_eq!(pmt.streams[0].elementary_pid, 0x0100);
        assert!(matches!(
            pmt.streams[0].descriptors.entries[0],
            Descriptor::StreamIdentifier(_)
        ));
        assert_eq!(pmt.streams[1].elementary_pid, 0x0110);
    }
}
