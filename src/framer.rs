//! Packet-size probing and 188-byte unit framing.
//!
//! Recordings come in three framings: bare 188-byte TS, 192-byte TTS with a
//! 4-byte timestamp prefix, and 204-byte TS with a 16-byte FEC trailer.
//! The probe counts sync bytes at each candidate stride over the head of the
//! stream and picks the framing with the most hits.

use thiserror::Error;

use crate::constants::{
    FEC_TS_PACKET_SIZE, SYNC_PROBE_MIN_HITS, SYNC_PROBE_SIZE, TS_PACKET_SIZE, TS_SYNC_BYTE,
    TTS_PACKET_SIZE,
};

#[derive(Debug, Error)]
pub enum FramerError {
    /// No candidate framing produced enough sync hits over the probe window.
    #[error("unsupported stream framing: no TS sync pattern found")]
    UnsupportedFraming,

    /// The stream is shorter than one probe window.
    #[error("stream too short to probe ({0} bytes)")]
    StreamTooShort(usize),
}

/// Detected packet framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSize {
    /// Bytes per stored packet unit (188, 192 or 204).
    pub size: usize,
    /// Offset of the 188-byte TS packet within each unit (4 for TTS).
    pub offset: usize,
}

impl UnitSize {
    fn new(size: usize) -> Self {
        let offset = if size == TTS_PACKET_SIZE { 4 } else { 0 };
        UnitSize { size, offset }
    }
}

/// Probes the head of `data` and returns the detected framing.
///
/// Ties break towards the smaller unit: 188 > 192 > 204.
pub fn detect_unit_size(data: &[u8]) -> Result<UnitSize, FramerError> {
    if data.len() < FEC_TS_PACKET_SIZE {
        return Err(FramerError::StreamTooShort(data.len()));
    }
    let window = &data[..data.len().min(SYNC_PROBE_SIZE)];

    let sync_count = |unit: usize, offset: usize| -> u32 {
        let mut cnt = 0;
        let mut i = 0;
        while i + offset < window.len() {
            if window[i + offset] == TS_SYNC_BYTE {
                cnt += 1;
            }
            i += unit;
        }
        cnt
    };

    let ts_cnt = sync_count(TS_PACKET_SIZE, 0);
    let tts_cnt = sync_count(TTS_PACKET_SIZE, TTS_PACKET_SIZE - TS_PACKET_SIZE);
    let fects_cnt = sync_count(FEC_TS_PACKET_SIZE, 0);

    let (best, size) = if ts_cnt >= tts_cnt && ts_cnt >= fects_cnt {
        (ts_cnt, TS_PACKET_SIZE)
    } else if tts_cnt >= fects_cnt {
        (tts_cnt, TTS_PACKET_SIZE)
    } else {
        (fects_cnt, FEC_TS_PACKET_SIZE)
    };

    if best < SYNC_PROBE_MIN_HITS {
        return Err(FramerError::UnsupportedFraming);
    }
    Ok(UnitSize::new(size))
}

/// Iterator over 188-byte TS packet windows, framing bytes stripped.
///
/// A window whose first byte is not 0x47 is still yielded; the caller decides
/// whether to resync (see [`Framer::resync`]).
pub struct Framer<'a> {
    data: &'a [u8],
    unit: UnitSize,
    pos: usize,
}

impl<'a> Framer<'a> {
    pub fn new(data: &'a [u8], unit: UnitSize) -> Self {
        Framer { data, unit, pos: 0 }
    }

    pub fn unit_size(&self) -> UnitSize {
        self.unit
    }

    /// Current read offset into the source buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Scans forward for the next unit whose TS window starts with 0x47 and
    /// realigns the cursor there. Returns false when the stream is exhausted.
    pub fn resync(&mut self) -> bool {
        let mut pos = self.pos.saturating_add(1);
        while pos + self.unit.size <= self.data.len() {
            if self.data[pos + self.unit.offset] == TS_SYNC_BYTE {
                self.pos = pos;
                return true;
            }
            pos += 1;
        }
        self.pos = self.data.len();
        false
    }
}

impl<'a> Iterator for Framer<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.pos + self.unit.size > self.data.len() {
            return None;
        }
        let start = self.pos + self.unit.offset;
        let window = &self.data[start..start + TS_PACKET_SIZE];
        self.pos += self.unit.size;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(len: usize, unit: usize, offset: usize) -> Vec<u8> {
        // pseudo-random filler that never collides with 0x47
        let mut v: Vec<u8> = (0..len)
            .map(|i| {
                let b = (i as u32).wrapping_mul(2654435761) as u8;
                if b == TS_SYNC_BYTE {
                    0x48
                } else {
                    b
                }
            })
            .collect();
        let mut i = 0;
        while i + offset < v.len() {
            v[i + offset] = TS_SYNC_BYTE;
            i += unit;
        }
        v
    }

    #[test]
    fn probe_prefers_188() {
        let data = filled(4096, 188, 0);
        let unit = detect_unit_size(&data).unwrap();
        assert_eq!(unit.size, 188);
        assert_eq!(unit.offset, 0);
    }

    #[test]
    fn probe_detects_tts() {
        // 20 of 21 candidate positions carry the sync byte
        let mut data = filled(4096, 192, 4);
        data[5 * 192 + 4] = 0x00;
        let unit = detect_unit_size(&data).unwrap();
        assert_eq!(unit.size, 192);
        assert_eq!(unit.offset, 4);
    }

    #[test]
    fn probe_detects_fec_204() {
        let data = filled(4096, 204, 0);
        let unit = detect_unit_size(&data).unwrap();
        assert_eq!(unit.size, 204);
        assert_eq!(unit.offset, 0);
    }

    #[test]
    fn probe_rejects_noise() {
        let data: Vec<u8> = (0..4096)
            .map(|i| {
                let b = (i as u32).wrapping_mul(40503) as u8;
                if b == TS_SYNC_BYTE {
                    0x48
                } else {
                    b
                }
            })
            .collect();
        assert!(matches!(
            detect_unit_size(&data),
            Err(FramerError::UnsupportedFraming)
        ));
    }

    #[test]
    fn framer_strips_tts_prefix() {
        let data = filled(192 * 8, 192, 4);
        let unit = detect_unit_size(&data).unwrap();
        let windows: Vec<&[u8]> = Framer::new(&data, unit).collect();
        assert_eq!(windows.len(), 8);
        for w in windows {
            assert_eq!(w.len(), 188);
            assert_eq!(w[0], TS_SYNC_BYTE);
        }
    }

    #[test]
    fn resync_realigns_to_unit() {
        let mut data = filled(188 * 6, 188, 0);
        // corrupt the head so the first window loses sync
        data[0] = 0x00;
        let unit = UnitSize { size: 188, offset: 0 };
        let mut framer = Framer::new(&data, unit);
        let first = framer.next().unwrap();
        assert_ne!(first[0], TS_SYNC_BYTE);
        // rewind conceptually: resync from the bad position
        let mut framer = Framer::new(&data, unit);
        assert!(framer.resync());
        assert_eq!(framer.position() % 188, 0);
        let w = framer.next().unwrap();
        assert_eq!(w[0], TS_SYNC_BYTE);
    }
}
