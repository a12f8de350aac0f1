//! Descriptors defined by ITU-T Rec. H.222.0 (tags 0x02..0x38).

use anyhow::bail;

use crate::utils::{read_be_16, read_be_32, read_bits};

/// ITU-T Rec. H.262 Table 6-4
pub const FRAME_RATE_TABLE: [(u8, f64); 8] = [
    (0b0001, 24000.0 / 1001.0),
    (0b0010, 24.0),
    (0b0011, 25.0),
    (0b0100, 30000.0 / 1001.0),
    (0b0101, 30.0),
    (0b0110, 50.0),
    (0b0111, 60000.0 / 1001.0),
    (0b1000, 60.0),
];

#[derive(Debug, Clone)]
pub struct VideoStreamDescriptor {
    pub multiple_frame_rate_flag: bool,
    pub frame_rate_code: u8,
    pub mpeg_1_only_flag: bool,
    pub constrained_parameter_flag: bool,
    pub still_picture_flag: bool,
    /// Present only when `mpeg_1_only_flag` is clear.
    pub profile_and_level_indication: Option<u8>,
    pub chroma_format: Option<u8>,
    pub frame_rate_extension_flag: Option<bool>,
}

impl VideoStreamDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("video_stream: empty");
        }
        let mpeg_1_only = data[0] & 0x04 != 0;
        let mut d = VideoStreamDescriptor {
            multiple_frame_rate_flag: data[0] & 0x80 != 0,
            frame_rate_code: (data[0] & 0x78) >> 3,
            mpeg_1_only_flag: mpeg_1_only,
            constrained_parameter_flag: data[0] & 0x02 != 0,
            still_picture_flag: data[0] & 0x01 != 0,
            profile_and_level_indication: None,
            chroma_format: None,
            frame_rate_extension_flag: None,
        };
        if !mpeg_1_only {
            if data.len() < 3 {
                bail!("video_stream: truncated MPEG-2 fields");
            }
            d.profile_and_level_indication = Some(data[1]);
            d.chroma_format = Some((data[2] & 0xC0) >> 6);
            d.frame_rate_extension_flag = Some(data[2] & 0x20 != 0);
        }
        Ok(d)
    }

    pub fn frame_rate(&self) -> Option<f64> {
        FRAME_RATE_TABLE
            .iter()
            .find(|(code, _)| *code == self.frame_rate_code)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone)]
pub struct AudioStreamDescriptor {
    pub free_format_flag: bool,
    pub id: bool,
    pub layer: u8,
    pub variable_rate_audio_indicator: bool,
}

impl AudioStreamDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("audio_stream: empty");
        }
        Ok(AudioStreamDescriptor {
            free_format_flag: data[0] & 0x80 != 0,
            id: data[0] & 0x40 != 0,
            layer: (data[0] & 0x30) >> 4,
            variable_rate_audio_indicator: data[0] & 0x08 != 0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyDescriptor {
    pub temporal_scalability_flag: bool,
    pub spatial_scalability_flag: bool,
    pub quality_scalability_flag: bool,
    pub hierarchy_type: u8,
    pub hierarchy_layer_index: u8,
    pub tref_present_flag: bool,
    pub hierarchy_embedded_layer_index: u8,
    pub hierarchy_channel: u8,
}

impl HierarchyDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("hierarchy: need 4 bytes");
        }
        Ok(HierarchyDescriptor {
            temporal_scalability_flag: data[0] & 0x40 != 0,
            spatial_scalability_flag: data[0] & 0x20 != 0,
            quality_scalability_flag: data[0] & 0x10 != 0,
            hierarchy_type: data[0] & 0x0F,
            hierarchy_layer_index: data[1] & 0x3F,
            tref_present_flag: data[2] & 0x80 != 0,
            hierarchy_embedded_layer_index: data[2] & 0x3F,
            hierarchy_channel: data[3] & 0x3F,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationDescriptor {
    pub format_identifier: u32,
    pub additional_identification_info: Vec<u8>,
}

impl RegistrationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("registration: need 4 bytes");
        }
        Ok(RegistrationDescriptor {
            format_identifier: read_be_32(data),
            additional_identification_info: data[4..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DataStreamAlignmentDescriptor {
    pub alignment_type: u8,
}

impl DataStreamAlignmentDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("data_stream_alignment: empty");
        }
        Ok(DataStreamAlignmentDescriptor {
            alignment_type: data[0],
        })
    }
}

#[derive(Debug, Clone)]
pub struct TargetBackgroundGridDescriptor {
    pub horizontal_size: u16,
    pub vertical_size: u16,
    pub aspect_ratio_information: u8,
}

impl TargetBackgroundGridDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("target_background_grid: need 4 bytes");
        }
        Ok(TargetBackgroundGridDescriptor {
            horizontal_size: read_bits(data, 0, 14) as u16,
            vertical_size: read_bits(&data[1..], 6, 14) as u16,
            aspect_ratio_information: data[3] & 0x0F,
        })
    }
}

#[derive(Debug, Clone)]
pub struct VideoWindowDescriptor {
    pub horizontal_offset: u16,
    pub vertical_offset: u16,
    pub window_priority: u8,
}

impl VideoWindowDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("video_window: need 4 bytes");
        }
        Ok(VideoWindowDescriptor {
            horizontal_offset: read_bits(data, 0, 14) as u16,
            vertical_offset: read_bits(&data[1..], 6, 14) as u16,
            window_priority: data[3] & 0x0F,
        })
    }
}

/// Conditional access descriptor (tag 0x09).
#[derive(Debug, Clone)]
pub struct CaDescriptor {
    pub ca_system_id: u16,
    pub ca_pid: u16,
    pub private_data: Vec<u8>,
}

impl CaDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("CA: need 4 bytes");
        }
        Ok(CaDescriptor {
            ca_system_id: read_be_16(data),
            ca_pid: ((data[2] & 0x1F) as u16) << 8 | data[3] as u16,
            private_data: data[4..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Iso639LanguageEntry {
    /// Three ISO 639-2 letters, e.g. `jpn`.
    pub language_code: [u8; 3],
    pub audio_type: u8,
}

#[derive(Debug, Clone)]
pub struct Iso639LanguageDescriptor {
    pub languages: Vec<Iso639LanguageEntry>,
}

impl Iso639LanguageDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("ISO_639_language: empty");
        }
        let languages = data
            .chunks_exact(4)
            .map(|c| Iso639LanguageEntry {
                language_code: [c[0], c[1], c[2]],
                audio_type: c[3],
            })
            .collect();
        Ok(Iso639LanguageDescriptor { languages })
    }
}

#[derive(Debug, Clone)]
pub struct SystemClockDescriptor {
    pub external_clock_reference_indicator: bool,
    pub clock_accuracy_integer: u8,
    pub clock_accuracy_exponent: u8,
}

impl SystemClockDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("system_clock: need 2 bytes");
        }
        Ok(SystemClockDescriptor {
            external_clock_reference_indicator: data[0] & 0x80 != 0,
            clock_accuracy_integer: data[0] & 0x3F,
            clock_accuracy_exponent: (data[1] & 0xE0) >> 5,
        })
    }

    /// Accuracy in ppm; meaningful only without an external reference.
    pub fn accuracy_ppm(&self) -> f64 {
        self.clock_accuracy_integer as f64 * 10f64.powi(-(self.clock_accuracy_exponent as i32))
    }
}

#[derive(Debug, Clone)]
pub struct MultiplexBufferUtilizationDescriptor {
    pub bound_valid_flag: bool,
    pub ltw_offset_lower_bound: u16,
    pub ltw_offset_upper_bound: u16,
}

impl MultiplexBufferUtilizationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("multiplex_buffer_utilization: need 4 bytes");
        }
        Ok(MultiplexBufferUtilizationDescriptor {
            bound_valid_flag: data[0] & 0x80 != 0,
            ltw_offset_lower_bound: read_bits(data, 1, 15) as u16,
            ltw_offset_upper_bound: read_bits(&data[2..], 1, 15) as u16,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CopyrightDescriptor {
    pub copyright_identifier: u32,
    pub additional_copyright_info: Vec<u8>,
}

impl CopyrightDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("copyright: need 4 bytes");
        }
        Ok(CopyrightDescriptor {
            copyright_identifier: read_be_32(data),
            additional_copyright_info: data[4..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MaximumBitrateDescriptor {
    /// Units of 50 bytes/second.
    pub maximum_bitrate: u32,
}

impl MaximumBitrateDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 3 {
            bail!("maximum_bitrate: need 3 bytes");
        }
        Ok(MaximumBitrateDescriptor {
            maximum_bitrate: read_bits(data, 2, 22) as u32,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Mpeg4AudioDescriptor {
    pub profile_and_level: u8,
}

impl Mpeg4AudioDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("MPEG-4_audio: empty");
        }
        Ok(Mpeg4AudioDescriptor {
            profile_and_level: data[0],
        })
    }
}

#[derive(Debug, Clone)]
pub struct AvcVideoDescriptor {
    pub profile_idc: u8,
    pub constraint_set_flags: u8,
    pub avc_compatible_flags: u8,
    pub level_idc: u8,
    pub avc_still_present: bool,
    pub avc_24_hour_picture_flag: bool,
    pub frame_packing_sei_not_present_flag: bool,
}

impl AvcVideoDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("AVC_video: need 4 bytes");
        }
        Ok(AvcVideoDescriptor {
            profile_idc: data[0],
            constraint_set_flags: (data[1] & 0xFC) >> 2,
            avc_compatible_flags: data[1] & 0x03,
            level_idc: data[2],
            avc_still_present: data[3] & 0x80 != 0,
            avc_24_hour_picture_flag: data[3] & 0x40 != 0,
            frame_packing_sei_not_present_flag: data[3] & 0x20 != 0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AvcTimingAndHrdDescriptor {
    pub hrd_management_valid_flag: bool,
    pub picture_and_timing_info_present: bool,
    pub is_90khz: Option<bool>,
    pub n: Option<u32>,
    pub k: Option<u32>,
    pub num_units_in_tick: Option<u32>,
    pub fixed_frame_rate_flag: bool,
    pub temporal_poc_flag: bool,
    pub picture_to_display_conversion_flag: bool,
}

impl AvcTimingAndHrdDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("AVC_timing_and_HRD: need 2 bytes");
        }
        let hrd_management_valid_flag = data[0] & 0x80 != 0;
        let picture_and_timing_info_present = data[0] & 0x01 != 0;

        let mut pos = 1usize;
        let mut is_90khz = None;
        let mut n = None;
        let mut k = None;
        let mut num_units_in_tick = None;

        if picture_and_timing_info_present {
            if pos >= data.len() {
                bail!("AVC_timing_and_HRD: truncated timing info");
            }
            let khz = data[pos] & 0x80 != 0;
            is_90khz = Some(khz);
            pos += 1;
            if !khz {
                if pos + 8 > data.len() {
                    bail!("AVC_timing_and_HRD: truncated N/K");
                }
                n = Some(read_be_32(&data[pos..]));
                k = Some(read_be_32(&data[pos + 4..]));
                pos += 8;
            }
            if pos + 4 > data.len() {
                bail!("AVC_timing_and_HRD: truncated num_units_in_tick");
            }
            num_units_in_tick = Some(read_be_32(&data[pos..]));
            pos += 4;
        }

        if pos >= data.len() {
            bail!("AVC_timing_and_HRD: missing flags byte");
        }
        Ok(AvcTimingAndHrdDescriptor {
            hrd_management_valid_flag,
            picture_and_timing_info_present,
            is_90khz,
            n,
            k,
            num_units_in_tick,
            fixed_frame_rate_flag: data[pos] & 0x80 != 0,
            temporal_poc_flag: data[pos] & 0x40 != 0,
            picture_to_display_conversion_flag: data[pos] & 0x20 != 0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Mpeg4AudioExtensionDescriptor {
    pub audio_profile_level_indications: Vec<u8>,
    /// Size of the attached audioSpecificConfig, when present.
    pub asc_size: Option<u8>,
}

impl Mpeg4AudioExtensionDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("MPEG-4_audio_extension: empty");
        }
        let asc_flag = data[0] & 0x80 != 0;
        let num_of_loops = (data[0] & 0x0F) as usize;
        if 1 + num_of_loops > data.len() {
            bail!("MPEG-4_audio_extension: truncated profile loop");
        }
        let audio_profile_level_indications = data[1..1 + num_of_loops].to_vec();
        let asc_size = if asc_flag {
            if 1 + num_of_loops >= data.len() {
                bail!("MPEG-4_audio_extension: missing ASC size");
            }
            Some(data[1 + num_of_loops])
        } else {
            None
        };
        Ok(Mpeg4AudioExtensionDescriptor {
            audio_profile_level_indications,
            asc_size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HevcDescriptor {
    pub profile_space: u8,
    pub tier_flag: bool,
    pub profile_idc: u8,
    pub profile_compatibility_indication: u32,
    pub progressive_source_flag: bool,
    pub interlaced_source_flag: bool,
    pub non_packed_constraint_flag: bool,
    pub frame_only_constraint_flag: bool,
    pub level_idc: u8,
    pub temporal_layer_subset_flag: bool,
    pub hevc_still_present_flag: bool,
    pub hevc_24hr_picture_present_flag: bool,
    pub temporal_id_min: Option<u8>,
    pub temporal_id_max: Option<u8>,
}

impl HevcDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 13 {
            bail!("HEVC: need 13 bytes");
        }
        let temporal_layer_subset_flag = data[12] & 0x80 != 0;
        let (temporal_id_min, temporal_id_max) = if temporal_layer_subset_flag {
            if data.len() < 15 {
                bail!("HEVC: truncated temporal layer bounds");
            }
            (Some(data[13] & 0x07), Some(data[14] & 0x07))
        } else {
            (None, None)
        };
        Ok(HevcDescriptor {
            profile_space: (data[0] & 0xC0) >> 6,
            tier_flag: data[0] & 0x20 != 0,
            profile_idc: data[0] & 0x1F,
            profile_compatibility_indication: read_be_32(&data[1..]),
            progressive_source_flag: data[5] & 0x80 != 0,
            interlaced_source_flag: data[5] & 0x40 != 0,
            non_packed_constraint_flag: data[5] & 0x20 != 0,
            frame_only_constraint_flag: data[5] & 0x10 != 0,
            level_idc: data[11],
            temporal_layer_subset_flag,
            hevc_still_present_flag: data[12] & 0x40 != 0,
            hevc_24hr_picture_present_flag: data[12] & 0x20 != 0,
            temporal_id_min,
            temporal_id_max,
        })
    }
}
