//! Time and Date Table (0x70, no CRC) and Time Offset Table (0x73, CRC).

use chrono::NaiveDateTime;

use super::header::{SectionReader, CRC32_SIZE};
use crate::desc::DescriptorLoop;
use crate::utils::{bcd_hms, mjd_to_date, read_be_16};

#[derive(Debug, Clone)]
pub enum TimeSection {
    Tdt(TdtSection),
    Tot(TotSection),
}

#[derive(Debug, Clone)]
pub struct TdtSection {
    /// JST wall clock carried as 16-bit MJD + 24-bit BCD.
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct TotSection {
    pub time: NaiveDateTime,
    pub descriptors: DescriptorLoop,
}

fn decode_jst(buf: &[u8]) -> anyhow::Result<NaiveDateTime> {
    let mjd = read_be_16(buf);
    let date = mjd_to_date(mjd).ok_or_else(|| anyhow::anyhow!("MJD {mjd} out of range"))?;
    let time = bcd_hms(&buf[2..5]).ok_or_else(|| anyhow::anyhow!("invalid BCD time"))?;
    Ok(NaiveDateTime::new(date, time))
}

pub fn parse_tdt_tot(section: &[u8]) -> anyhow::Result<TimeSection> {
    match section.first().copied() {
        Some(0x70) => {
            // short form, exactly the 5 time bytes, no CRC
            let sec = SectionReader::new(section, false)?;
            if sec.section_syntax_indicator {
                anyhow::bail!("TDT must carry section_syntax_indicator 0");
            }
            if sec.section_length != 5 {
                anyhow::bail!("bad TDT length {}", sec.section_length);
            }
            Ok(TimeSection::Tdt(TdtSection {
                time: decode_jst(sec.body)?,
            }))
        }
        Some(0x73) => {
            let sec = SectionReader::new(section, true)?;
            if sec.section_syntax_indicator {
                anyhow::bail!("TOT must carry section_syntax_indicator 0");
            }
            let body = sec.body;
            // short-form section: the CRC is inside body, strip it here
            if body.len() < 5 + 2 + CRC32_SIZE {
                anyhow::bail!("TOT body too short");
            }
            let crc_calc = super::header::CRC_MPEG.checksum(&section[..section.len() - CRC32_SIZE]);
            let crc_read = u32::from_be_bytes(section[section.len() - CRC32_SIZE..].try_into()?);
            if crc_calc != crc_read {
                anyhow::bail!("TOT CRC mismatch");
            }

            let time = decode_jst(body)?;
            let desc_len = ((body[5] & 0x0F) as usize) << 8 | body[6] as usize;
            if 7 + desc_len > body.len() - CRC32_SIZE {
                anyhow::bail!("TOT descriptors overrun");
            }
            Ok(TimeSection::Tot(TotSection {
                time,
                descriptors: DescriptorLoop::parse(&body[7..7 + desc_len]),
            }))
        }
        _ => anyhow::bail!("not TDT/TOT"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Descriptor;
    use crate::psi::header::append_crc;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn tdt_time() {
        // MJD 59580 = 2022-01-01, 12:34:56
        let mut s = vec![0x70, 0x70, 0x05];
        s.extend_from_slice(&59580u16.to_be_bytes());
        s.extend_from_slice(&[0x12, 0x34, 0x56]);
        match parse_tdt_tot(&s).unwrap() {
            TimeSection::Tdt(tdt) => {
                assert_eq!(
                    tdt.time,
                    NaiveDateTime::new(
                        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                        NaiveTime::from_hms_opt(12, 34, 56).unwrap()
                    )
                );
            }
            other => panic!("wrong table: {other:?}"),
        }
    }

    #[test]
    fn tot_with_local_time_offset() {
        let mut lto = vec![0x58, 0x0D];
        lto.extend_from_slice(b"JPN");
        lto.push(0b000000_0_0);
        lto.extend_from_slice(&[0x09, 0x00]);
        lto.extend_from_slice(&[0x00; 5]);
        lto.extend_from_slice(&[0x09, 0x00]);

        let mut body = 59580u16.to_be_bytes().to_vec();
        body.extend_from_slice(&[0x00, 0x00, 0x00]);
        body.push(0xF0);
        body.push(lto.len() as u8);
        body.extend_from_slice(&lto);

        let len = body.len() + 4;
        let mut s = vec![0x73, 0x70 | ((len >> 8) as u8 & 0x0F), len as u8];
        s.extend_from_slice(&body);
        append_crc(&mut s);

        match parse_tdt_tot(&s).unwrap() {
            TimeSection::Tot(tot) => {
                assert_eq!(tot.time.date(), NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
                assert_eq!(tot.descriptors.len(), 1);
                assert!(matches!(
                    tot.descriptors.entries[0],
                    Descriptor::LocalTimeOffset(_)
                ));
            }
            other => panic!("wrong table: {other:?}"),
        }
    }

    #[test]
    fn syntax_sections_rejected() {
        // TOT dressed up as a syntax-1 section with a valid CRC: the fixed
        // field layout no longer lines up, so it must be dropped outright
        let mut s = vec![0x73, 0xB0, 0x14, 0x00, 0x00, 0xC1, 0x00, 0x00];
        s.extend_from_slice(&59580u16.to_be_bytes());
        s.extend_from_slice(&[0x12, 0x34, 0x56, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00]);
        append_crc(&mut s);
        assert!(parse_tdt_tot(&s).is_err());

        let mut s = vec![0x70, 0xB0, 0x09, 0x00, 0x00, 0xC1, 0x00, 0x00];
        append_crc(&mut s);
        assert!(parse_tdt_tot(&s).is_err());
    }

    #[test]
    fn tot_crc_checked() {
        let mut body = 59580u16.to_be_bytes().to_vec();
        body.extend_from_slice(&[0x00, 0x00, 0x00, 0xF0, 0x00]);
        let len = body.len() + 4;
        let mut s = vec![0x73, 0x70, len as u8];
        s.extend_from_slice(&body);
        append_crc(&mut s);
        assert!(parse_tdt_tot(&s).is_ok());

        let last = s.len() - 1;
        s[last] ^= 0x01;
        assert!(parse_tdt_tot(&s).is_err());
    }
}
