//! Event Information Table (table_ids 0x4E/0x4F present/following,
//! 0x50..0x6F schedule).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::header::SectionReader;
use super::sdt::RunningStatus;
use crate::desc::DescriptorLoop;
use crate::utils::{bcd_hms, bcd_to_dec, mjd_to_date, read_be_16};

#[derive(Debug, Clone)]
pub struct EitSection {
    pub table_id: u8,
    pub service_id: u16,
    pub version: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub segment_last_section_number: u8,
    pub last_table_id: u8,
    pub events: Vec<EitEvent>,
}

#[derive(Debug, Clone)]
pub struct EitEvent {
    pub event_id: u16,
    /// JST wall clock; None when the 40-bit field is all ones (undefined).
    pub start_time: Option<NaiveDateTime>,
    /// None encodes the 0xFFFFFF "undefined duration" sentinel.
    pub duration: Option<NaiveTime>,
    pub running_status: RunningStatus,
    pub free_ca_mode: bool,
    pub descriptors: DescriptorLoop,
}

impl EitSection {
    pub fn is_present_following(&self) -> bool {
        matches!(self.table_id, 0x4E | 0x4F)
    }

    pub fn is_schedule(&self) -> bool {
        (0x50..=0x6F).contains(&self.table_id)
    }
}

fn decode_start_time(buf: &[u8]) -> Option<NaiveDateTime> {
    if buf[..5].iter().all(|&b| b == 0xFF) {
        return None;
    }
    let mjd = read_be_16(buf);
    let date: NaiveDate = mjd_to_date(mjd)?;
    let time = bcd_hms(&buf[2..5])?;
    Some(NaiveDateTime::new(date, time))
}

fn decode_duration(buf: &[u8]) -> Option<NaiveTime> {
    if buf[0] == 0xFF && buf[1] == 0xFF && buf[2] == 0xFF {
        return None;
    }
    bcd_hms(buf)
}

pub fn parse_eit(section: &[u8]) -> anyhow::Result<EitSection> {
    let sec = SectionReader::new(section, true)?;
    if !matches!(sec.table_id, 0x4E | 0x4F | 0x50..=0x6F) {
        anyhow::bail!("not EIT");
    }
    if !sec.current_next {
        anyhow::bail!("not yet applicable");
    }

    let b = sec.body;
    if b.len() < 6 {
        anyhow::bail!("EIT body too short");
    }
    let transport_stream_id = read_be_16(b);
    let original_network_id = read_be_16(&b[2..]);
    let segment_last_section_number = b[4];
    let last_table_id = b[5];

    let mut events = Vec::new();
    let mut idx = 6;
    while idx + 12 <= b.len() {
        let event_id = read_be_16(&b[idx..]);
        let start_time = decode_start_time(&b[idx + 2..idx + 7]);
        let duration = decode_duration(&b[idx + 7..idx + 10]);
        let running_status = RunningStatus::from((b[idx + 10] & 0xE0) >> 5);
        let free_ca_mode = b[idx + 10] & 0x10 != 0;
        let desc_len = ((b[idx + 10] & 0x0F) as usize) << 8 | b[idx + 11] as usize;
        idx += 12;
        if idx + desc_len > b.len() {
            anyhow::bail!("event descriptors overrun");
        }
        events.push(EitEvent {
            event_id,
            start_time,
            duration,
            running_status,
            free_ca_mode,
            descriptors: DescriptorLoop::parse(&b[idx..idx + desc_len]),
        });
        idx += desc_len;
    }

    Ok(EitSection {
        table_id: sec.table_id,
        service_id: sec.table_id_extension,
        version: sec.version,
        section_number: sec.section_number,
        last_section_number: sec.last_section,
        transport_stream_id,
        original_network_id,
        segment_last_section_number,
        last_table_id,
        events,
    })
}

/// Duration expressed in whole seconds, for schedule arithmetic.
pub fn duration_seconds(buf: &[u8]) -> Option<u32> {
    if buf.len() < 3 || (buf[0] == 0xFF && buf[1] == 0xFF && buf[2] == 0xFF) {
        return None;
    }
    let h = bcd_to_dec(&buf[0..1], 2);
    let m = bcd_to_dec(&buf[1..2], 2);
    let s = bcd_to_dec(&buf[2..3], 2);
    Some(h * 3600 + m * 60 + s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;

    fn build_eit(table_id: u8, events: &[Vec<u8>]) -> Vec<u8> {
        let mut body = vec![0x7F, 0xE1, 0x00, 0x04, 0x00, table_id];
        for ev in events {
            body.extend_from_slice(ev);
        }
        let len = 5 + body.len() + 4;
        let mut s = vec![table_id, 0xB0 | ((len >> 8) as u8 & 0x0F), len as u8];
        s.extend_from_slice(&0x0408u16.to_be_bytes());
        s.extend_from_slice(&[0xC1, 0x00, 0x00]);
        s.append(&mut body);
        append_crc(&mut s);
        s
    }

    fn event(id: u16, desc: &[u8]) -> Vec<u8> {
        let mut ev = id.to_be_bytes().to_vec();
        // 2022-01-01 (MJD 59580) 21:00:00, duration 1:54:30
        ev.extend_from_slice(&59580u16.to_be_bytes());
        ev.extend_from_slice(&[0x21, 0x00, 0x00]);
        ev.extend_from_slice(&[0x01, 0x54, 0x30]);
        ev.push(0x90 | ((desc.len() >> 8) as u8 & 0x0F));
        ev.push(desc.len() as u8);
        ev.extend_from_slice(desc);
        ev
    }

    #[test]
    fn eit_present_following_event() {
        let short_event = [
            0x4D, 0x0A, b'j', b'p', b'n', 0x05, 0x1B, 0x28, 0x4A, b'T', b'V', 0x00,
        ];
        let s = build_eit(0x4E, &[event(0x3039, &short_event)]);
        let eit = parse_eit(&s).unwrap();
        assert!(eit.is_present_following());
        assert_eq!(eit.service_id, 0x0408);
        assert_eq!(eit.transport_stream_id, 0x7FE1);
        assert_eq!(eit.original_network_id, 0x0004);
        assert_eq!(eit.events.len(), 1);

        let ev = &eit.events[0];
        assert_eq!(ev.event_id, 0x3039);
        let start = ev.start_time.unwrap();
        assert_eq!(
            start,
            NaiveDateTime::new(
                NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                NaiveTime::from_hms_opt(21, 0, 0).unwrap()
            )
        );
        assert_eq!(ev.duration, NaiveTime::from_hms_opt(1, 54, 30));
        assert_eq!(ev.running_status, RunningStatus::Running);
        match &ev.descriptors.entries[0] {
            Descriptor::ShortEvent(d) => assert_eq!(d.event_name, "ＴＶ"),
            other => panic!("wrong descriptor: {other:?}"),
        }
    }

    #[test]
    fn undefined_duration_is_none() {
        let mut ev = 0x0001u16.to_be_bytes().to_vec();
        ev.extend_from_slice(&[0xFF; 5]); // undefined start
        ev.extend_from_slice(&[0xFF, 0xFF, 0xFF]); // undefined duration
        ev.extend_from_slice(&[0x00, 0x00]);
        let s = build_eit(0x50, &[ev]);
        let eit = parse_eit(&s).unwrap();
        assert!(eit.is_schedule());
        assert_eq!(eit.events[0].start_time, None);
        assert_eq!(eit.events[0].duration, None);
    }

    #[test]
    fn schedule_range_dispatch() {
        let s = build_eit(0x6F, &[]);
        assert!(parse_eit(&s).unwrap().is_schedule());
        let s = build_eit(0x70, &[]);
        assert!(parse_eit(&s).is_err());
    }

    #[test]
    fn duration_seconds_conversion() {
        assert_eq!(duration_seconds(&[0x01, 0x54, 0x30]), Some(6870));
        assert_eq!(duration_seconds(&[0xFF, 0xFF, 0xFF]), None);
    }
}
