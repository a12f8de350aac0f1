//! Constants for MPEG-TS packet framing and well-known PIDs

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
/// Timestamped TS (4-byte TTS prefix per packet)
pub const TTS_PACKET_SIZE: usize = 192;
/// TS with a 16-byte FEC trailer per packet
pub const FEC_TS_PACKET_SIZE: usize = 204;
pub const TS_SYNC_BYTE: u8 = 0x47;

/// PES packet constants
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Null packets carry no payload and are exempt from continuity checks
pub const NULL_PID: u16 = 0x1FFF;

/// System PIDs that carry PSI/SI sections
pub const PID_PAT: u16 = 0x0000;
pub const PID_CAT: u16 = 0x0001;
pub const PID_TSDT: u16 = 0x0002;
pub const PID_NIT: u16 = 0x0010;
pub const PID_SDT_BAT: u16 = 0x0011;
pub const PID_EIT: u16 = 0x0012;
pub const PID_TDT_TOT: u16 = 0x0014;
pub const PID_BIT: u16 = 0x0024;

/// PIDs the demuxer always treats as section-bearing
pub const SYSTEM_PIDS: &[u16] = &[
    PID_PAT,
    PID_CAT,
    PID_TSDT,
    PID_NIT,
    PID_SDT_BAT,
    PID_EIT,
    0x0013, // RST/ST
    PID_TDT_TOT,
    0x0017, // EIT (terrestrial p/f)
    0x0023, // SDTT
    PID_BIT,
    0x0026, // EIT (partial reception)
    0x0027, // EIT
];

/// Number of bytes inspected when probing the packet unit size
pub const SYNC_PROBE_SIZE: usize = 1 << 12;
/// Minimum sync hits over the probe window to accept a framing
pub const SYNC_PROBE_MIN_HITS: u32 = 4;
