//! Generic PSI / SI section header with CRC-32 (MPEG-2) validation.
//!
//! Input here is a complete section as produced by the assembler: the
//! pointer_field has already been consumed upstream.

use crc::{Crc, CRC_32_MPEG_2};

pub const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);
pub const CRC32_SIZE: usize = 4;

/// Length cap for ordinary PSI sections (section_length truncated to 10 bits).
pub const MAX_SECTION_LENGTH: usize = 0x3FD;
/// Length cap for private and long-form SI sections (EIT, TOT, BIT).
pub const MAX_PRIVATE_SECTION_LENGTH: usize = 0xFFD;

/// Validated section header; `body` excludes the fixed header and the CRC.
pub struct SectionReader<'a> {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    pub section_length: usize,
    pub table_id_extension: u16,
    pub version: u8,
    pub current_next: bool,
    pub section_number: u8,
    pub last_section: u8,
    pub body: &'a [u8],
}

impl<'a> SectionReader<'a> {
    /// Validates length bounds and (for syntax sections) the trailing CRC-32.
    ///
    /// `long_form` selects the 0xFFD length cap used by EIT/TOT/BIT and
    /// private sections.
    pub fn new(section: &'a [u8], long_form: bool) -> anyhow::Result<Self> {
        if section.len() < 3 {
            anyhow::bail!("short section");
        }
        let table_id = section[0];
        let section_syntax_indicator = section[1] & 0x80 != 0;
        let section_length = (((section[1] & 0x0F) as usize) << 8) | section[2] as usize;

        let cap = if long_form {
            MAX_PRIVATE_SECTION_LENGTH
        } else {
            MAX_SECTION_LENGTH
        };
        if section_length > cap {
            anyhow::bail!("section_length {section_length} out of range");
        }
        if section.len() != 3 + section_length {
            anyhow::bail!(
                "section size mismatch: have {}, header says {}",
                section.len(),
                3 + section_length
            );
        }

        if !section_syntax_indicator {
            // short form: no syntax header, no CRC
            return Ok(Self {
                table_id,
                section_syntax_indicator,
                section_length,
                table_id_extension: 0,
                version: 0,
                current_next: true,
                section_number: 0,
                last_section: 0,
                body: &section[3..],
            });
        }

        if section.len() < 8 + CRC32_SIZE {
            anyhow::bail!("syntax section too short");
        }

        let crc_calc = CRC_MPEG.checksum(&section[..section.len() - CRC32_SIZE]);
        let crc_read = u32::from_be_bytes(section[section.len() - CRC32_SIZE..].try_into()?);
        if crc_calc != crc_read {
            anyhow::bail!("CRC-32 mismatch: calc {crc_calc:#010x}, read {crc_read:#010x}");
        }

        let section_number = section[6];
        let last_section = section[7];
        if section_number > last_section {
            anyhow::bail!("section_number {section_number} > last_section_number {last_section}");
        }

        Ok(Self {
            table_id,
            section_syntax_indicator,
            section_length,
            table_id_extension: u16::from_be_bytes(section[3..5].try_into()?),
            version: (section[5] & 0x3E) >> 1,
            current_next: section[5] & 0x01 != 0,
            section_number,
            last_section,
            body: &section[8..section.len() - CRC32_SIZE],
        })
    }
}

/// Appends the MPEG-2 CRC of `section` to it; test fixtures and muxer-side
/// tooling share this with the validator so the two can never disagree.
pub fn append_crc(section: &mut Vec<u8>) {
    let crc = CRC_MPEG.checksum(section);
    section.extend_from_slice(&crc.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    /// CRC-32/MPEG-2 check value from the catalogue of parametrised CRCs.
    #[test]
    fn crc_check_value() {
        assert_eq!(CRC_MPEG.checksum(b"123456789"), 0x0376E6E7);
    }

    fn build_section(table_id: u8, body: &[u8]) -> Vec<u8> {
        let len = 5 + body.len() + CRC32_SIZE;
        let mut s = vec![table_id, 0xB0 | ((len >> 8) as u8 & 0x0F), len as u8];
        s.extend_from_slice(&[0x12, 0x34]); // table_id_extension
        s.push(0xC1); // version 0, current
        s.push(0x00);
        s.push(0x00);
        s.extend_from_slice(body);
        append_crc(&mut s);
        s
    }

    #[test]
    fn parses_valid_syntax_section() {
        let sec = build_section(0x00, &[0xAA, 0xBB]);
        let r = SectionReader::new(&sec, false).unwrap();
        assert_eq!(r.table_id, 0x00);
        assert!(r.section_syntax_indicator);
        assert_eq!(r.table_id_extension, 0x1234);
        assert_eq!(r.version, 0);
        assert!(r.current_next);
        assert_eq!(r.body, &[0xAA, 0xBB]);
    }

    #[test]
    fn rejects_flipped_crc() {
        let mut sec = build_section(0x00, &[0xAA, 0xBB]);
        let last = sec.len() - 1;
        sec[last] ^= 0x01;
        assert!(SectionReader::new(&sec, false).is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut sec = build_section(0x00, &[0xAA, 0xBB]);
        sec.push(0x00);
        assert!(SectionReader::new(&sec, false).is_err());
    }

    #[test]
    fn rejects_oversize_short_form_length() {
        // section_length 0x3FE exceeds the 10-bit cap for ordinary tables
        let mut sec = vec![0x00, 0xB3, 0xFE];
        sec.resize(3 + 0x3FE, 0);
        assert!(SectionReader::new(&sec, false).is_err());
    }

    #[test]
    fn short_form_section_skips_crc() {
        // TDT-like: syntax indicator 0, 5-byte body, no CRC
        let sec = vec![0x70, 0x70, 0x05, 0xC0, 0x79, 0x12, 0x45, 0x00];
        let r = SectionReader::new(&sec, false).unwrap();
        assert!(!r.section_syntax_indicator);
        assert_eq!(r.body.len(), 5);
    }

    #[test]
    fn rejects_inverted_section_numbers() {
        let len = 5 + CRC32_SIZE;
        let mut s = vec![0x00, 0xB0, len as u8, 0x00, 0x00, 0xC1, 0x02, 0x01];
        append_crc(&mut s);
        assert!(SectionReader::new(&s, false).is_err());
    }
}
