//! TS packet header and adaptation field parsing per ITU-T Rec. H.222.0.

use thiserror::Error;

use crate::constants::{TS_PACKET_SIZE, TS_SYNC_BYTE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// First byte of the packet window is not 0x47; the caller must resync.
    #[error("sync_byte not found [{0:#04x}]")]
    BadSync(u8),

    /// transport_scrambling_control != 0; the payload is opaque.
    #[error("scrambled payload (control {0:#04b})")]
    Scrambled(u8),

    /// A conditional adaptation-field block runs past adaptation_field_length.
    #[error("adaptation field over-read")]
    AdaptationOverrun,

    /// A marker bit required to be 1 was 0.
    #[error("marker_bit must have the value '1'")]
    BadMarker,

    /// PES optional header truncated or malformed.
    #[error("truncated PES header")]
    TruncatedPes,
}

/// The fixed 4-byte TS packet header.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsHeader {
    pub transport_error_indicator: bool,
    pub payload_unit_start_indicator: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub transport_scrambling_control: u8,
    pub adaptation_field_control: u8,
    pub continuity_counter: u8,
}

impl TsHeader {
    pub fn has_adaptation(&self) -> bool {
        self.adaptation_field_control & 0b10 != 0
    }

    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control & 0b01 != 0
    }
}

/// 42-bit clock reference: 33-bit base at 90 kHz plus 9-bit extension at 27 MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReference {
    pub base: u64,
    pub extension: u16,
}

impl ClockReference {
    /// Full 27 MHz tick count.
    pub fn ticks_27mhz(&self) -> u64 {
        self.base * 300 + self.extension as u64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LegalTimeWindow {
    pub valid: bool,
    pub offset: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct SeamlessSplice {
    pub splice_type: u8,
    pub dts_next_au: u64,
}

/// Adaptation field; every conditional member is present only when its flag
/// bit was set and it fit within adaptation_field_length.
#[derive(Debug, Clone, Default)]
pub struct AdaptationField {
    pub length: u8,
    pub discontinuity_indicator: bool,
    pub random_access_indicator: bool,
    pub elementary_stream_priority_indicator: bool,

    pub pcr: Option<ClockReference>,
    pub opcr: Option<ClockReference>,
    pub splice_countdown: Option<i8>,
    pub private_data: Vec<u8>,

    pub ltw: Option<LegalTimeWindow>,
    pub piecewise_rate: Option<u32>,
    pub seamless_splice: Option<SeamlessSplice>,
}

/// A parsed 188-byte packet: header, optional adaptation field and the
/// payload slice borrowed from the source window.
#[derive(Debug)]
pub struct TsPacket<'a> {
    pub header: TsHeader,
    pub adaptation: Option<AdaptationField>,
    pub payload: Option<&'a [u8]>,
}

fn parse_clock_reference(p: &[u8]) -> ClockReference {
    let base = (p[0] as u64) << 25
        | (p[1] as u64) << 17
        | (p[2] as u64) << 9
        | (p[3] as u64) << 1
        | ((p[4] & 0x80) as u64) >> 7;
    let extension = ((p[4] & 0x01) as u16) << 8 | p[5] as u16;
    ClockReference { base, extension }
}

fn take<'a>(body: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], PacketError> {
    if *pos + n > body.len() {
        return Err(PacketError::AdaptationOverrun);
    }
    let s = &body[*pos..*pos + n];
    *pos += n;
    Ok(s)
}

fn parse_adaptation_field(buf: &[u8]) -> Result<(AdaptationField, usize), PacketError> {
    let mut af = AdaptationField {
        length: buf[0],
        ..Default::default()
    };
    let consumed = 1 + af.length as usize;
    if af.length == 0 {
        return Ok((af, consumed));
    }
    if consumed > buf.len() {
        return Err(PacketError::AdaptationOverrun);
    }

    let body = &buf[1..consumed];
    let flags = body[0];
    af.discontinuity_indicator = flags & 0x80 != 0;
    af.random_access_indicator = flags & 0x40 != 0;
    af.elementary_stream_priority_indicator = flags & 0x20 != 0;
    let pcr_flag = flags & 0x10 != 0;
    let opcr_flag = flags & 0x08 != 0;
    let splicing_point_flag = flags & 0x04 != 0;
    let private_data_flag = flags & 0x02 != 0;
    let extension_flag = flags & 0x01 != 0;

    let mut pos = 1usize;

    if pcr_flag {
        af.pcr = Some(parse_clock_reference(take(body, &mut pos, 6)?));
    }
    if opcr_flag {
        af.opcr = Some(parse_clock_reference(take(body, &mut pos, 6)?));
    }
    if splicing_point_flag {
        af.splice_countdown = Some(take(body, &mut pos, 1)?[0] as i8);
    }
    if private_data_flag {
        let len = take(body, &mut pos, 1)?[0] as usize;
        af.private_data = take(body, &mut pos, len)?.to_vec();
    }
    if extension_flag {
        let ext_len = take(body, &mut pos, 1)?[0] as usize;
        let ext_flags = take(body, &mut pos, 1)?[0];
        let ltw_flag = ext_flags & 0x80 != 0;
        let piecewise_flag = ext_flags & 0x40 != 0;
        let seamless_flag = ext_flags & 0x20 != 0;

        if ltw_flag {
            if ext_len < 2 {
                return Err(PacketError::AdaptationOverrun);
            }
            let p = take(body, &mut pos, 2)?;
            af.ltw = Some(LegalTimeWindow {
                valid: p[0] & 0x80 != 0,
                offset: ((p[0] & 0x3F) as u16) << 8 | p[1] as u16,
            });
        }
        if piecewise_flag {
            if ext_len < 3 {
                return Err(PacketError::AdaptationOverrun);
            }
            let p = take(body, &mut pos, 3)?;
            af.piecewise_rate =
                Some(((p[0] & 0x7F) as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32);
        }
        if seamless_flag {
            if ext_len < 5 {
                return Err(PacketError::AdaptationOverrun);
            }
            let p = take(body, &mut pos, 5)?;
            if p[0] & 0x01 == 0 || p[2] & 0x01 == 0 || p[4] & 0x01 == 0 {
                return Err(PacketError::BadMarker);
            }
            let splice_type = (p[0] & 0xF0) >> 4;
            let dts = ((p[0] & 0x0E) as u64) << 29
                | (p[1] as u64) << 22
                | ((p[2] & 0xFE) as u64) << 14
                | (p[3] as u64) << 7
                | ((p[4] & 0xFE) as u64) >> 1;
            af.seamless_splice = Some(SeamlessSplice {
                splice_type,
                dts_next_au: dts,
            });
        }
    }

    // remainder is stuffing
    Ok((af, consumed))
}

/// Parses one 188-byte window. Scrambled packets are rejected before any
/// payload is exposed; adaptation-only packets carry `payload == None`.
pub fn parse_packet(window: &[u8]) -> Result<TsPacket<'_>, PacketError> {
    debug_assert_eq!(window.len(), TS_PACKET_SIZE);

    if window[0] != TS_SYNC_BYTE {
        return Err(PacketError::BadSync(window[0]));
    }

    let header = TsHeader {
        transport_error_indicator: window[1] & 0x80 != 0,
        payload_unit_start_indicator: window[1] & 0x40 != 0,
        transport_priority: window[1] & 0x20 != 0,
        pid: ((window[1] & 0x1F) as u16) << 8 | window[2] as u16,
        transport_scrambling_control: (window[3] & 0xC0) >> 6,
        adaptation_field_control: (window[3] & 0x30) >> 4,
        continuity_counter: window[3] & 0x0F,
    };

    if header.transport_scrambling_control != 0 {
        return Err(PacketError::Scrambled(header.transport_scrambling_control));
    }

    let mut offset = 4usize;
    let adaptation = if header.has_adaptation() {
        let (af, consumed) = parse_adaptation_field(&window[4..])?;
        offset += consumed;
        Some(af)
    } else {
        None
    };

    let payload = if header.has_payload() && offset < TS_PACKET_SIZE {
        Some(&window[offset..])
    } else {
        None
    };

    Ok(TsPacket {
        header,
        adaptation,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_packet() -> Vec<u8> {
        let mut p = vec![0xFFu8; 188];
        p[0] = 0x47;
        p[1] = 0x40; // PUSI, PID high bits 0
        p[2] = 0x00;
        p[3] = 0x15; // payload only, CC=5
        p
    }

    #[test]
    fn header_fields() {
        let mut p = base_packet();
        p[1] = 0x5F; // TEI=0, PUSI=1, priority=0? 0x5F = 0101_1111
        p[2] = 0xFE;
        let pkt = parse_packet(&p).unwrap();
        assert!(pkt.header.payload_unit_start_indicator);
        assert!(pkt.header.transport_priority);
        assert_eq!(pkt.header.pid, 0x1FFE);
        assert_eq!(pkt.header.continuity_counter, 5);
        assert!(pkt.payload.is_some());
        assert_eq!(pkt.payload.unwrap().len(), 184);
    }

    #[test]
    fn bad_sync_rejected() {
        let mut p = base_packet();
        p[0] = 0x48;
        assert_eq!(parse_packet(&p).unwrap_err(), PacketError::BadSync(0x48));
    }

    #[test]
    fn scrambled_rejected() {
        let mut p = base_packet();
        p[3] = 0x95; // scrambling control 0b10
        assert_eq!(parse_packet(&p).unwrap_err(), PacketError::Scrambled(0b10));
    }

    #[test]
    fn adaptation_with_pcr() {
        let mut p = base_packet();
        p[3] = 0x35; // adaptation + payload, CC=5
        p[4] = 7; // adaptation_field_length
        p[5] = 0x10; // PCR_flag
        // PCR base 0x1_0000_0001, extension 0x102
        // base bits: 33 bits over p[6..10] + top bit of p[10]
        p[6] = 0x80;
        p[7] = 0x00;
        p[8] = 0x00;
        p[9] = 0x00;
        p[10] = 0x80 | 0x7E | 0x01; // top bit = base LSB... see below
        p[11] = 0x02;
        // base = 0x80<<25 | 0<<17 | 0<<9 | 0<<1 | 1 = 0x1_0000_0001
        // ext  = (p[10]&1)<<8 | p[11] = 0x102
        let pkt = parse_packet(&p).unwrap();
        let af = pkt.adaptation.unwrap();
        let pcr = af.pcr.unwrap();
        assert_eq!(pcr.base, 0x1_0000_0001);
        assert_eq!(pcr.extension, 0x102);
        assert_eq!(pcr.ticks_27mhz(), 0x1_0000_0001 * 300 + 0x102);
        // payload starts after 4 + 1 + 7
        assert_eq!(pkt.payload.unwrap().len(), 188 - 12);
    }

    #[test]
    fn adaptation_only_has_no_payload() {
        let mut p = base_packet();
        p[3] = 0x25; // adaptation only
        p[4] = 183;
        p[5] = 0x00;
        let pkt = parse_packet(&p).unwrap();
        assert!(pkt.payload.is_none());
        assert!(pkt.adaptation.is_some());
    }

    #[test]
    fn adaptation_overrun_detected() {
        let mut p = base_packet();
        p[3] = 0x35;
        p[4] = 2; // too short for a PCR
        p[5] = 0x10; // PCR_flag set
        assert_eq!(
            parse_packet(&p).unwrap_err(),
            PacketError::AdaptationOverrun
        );
    }

    #[test]
    fn seamless_splice_marker_check() {
        let mut p = base_packet();
        p[3] = 0x35;
        p[4] = 8;
        p[5] = 0x01; // extension flag
        p[6] = 6; // extension length
        p[7] = 0x20; // seamless_splice_flag
        // DTS_next_AU with all markers set, value 0
        p[8] = 0x01;
        p[9] = 0x00;
        p[10] = 0x01;
        p[11] = 0x00;
        p[12] = 0x01;
        let pkt = parse_packet(&p).unwrap();
        let ss = pkt.adaptation.unwrap().seamless_splice.unwrap();
        assert_eq!(ss.dts_next_au, 0);

        // clear one marker
        p[10] = 0x00;
        assert_eq!(parse_packet(&p).unwrap_err(), PacketError::BadMarker);
    }

    #[test]
    fn discontinuity_and_private_data() {
        let mut p = base_packet();
        p[3] = 0x35;
        p[4] = 6;
        p[5] = 0x82; // discontinuity + private data
        p[6] = 3;
        p[7] = 0xAA;
        p[8] = 0xBB;
        p[9] = 0xCC;
        let pkt = parse_packet(&p).unwrap();
        let af = pkt.adaptation.unwrap();
        assert!(af.discontinuity_indicator);
        assert_eq!(af.private_data, vec![0xAA, 0xBB, 0xCC]);
    }
}
