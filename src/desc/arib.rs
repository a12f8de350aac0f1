//! Descriptors defined by ARIB STD-B10 §6 (tags 0xC0..0xFE).

use anyhow::bail;

use crate::text;
use crate::utils::{read_be_16, read_be_32, read_bits};

#[derive(Debug, Clone)]
pub struct HierarchicalTransmissionDescriptor {
    /// true = high quality layer.
    pub quality_level: bool,
    pub reference_pid: u16,
}

impl HierarchicalTransmissionDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 3 {
            bail!("hierarchical_transmission: need 3 bytes");
        }
        Ok(HierarchicalTransmissionDescriptor {
            quality_level: data[0] & 0x01 != 0,
            reference_pid: ((data[1] & 0x1F) as u16) << 8 | data[2] as u16,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ComponentControl {
    pub component_tag: u8,
    pub digital_recording_control_data: u8,
    pub user_defined: u8,
    pub maximum_bitrate: Option<u8>,
}

/// Digital copy control descriptor (tag 0xC1).
#[derive(Debug, Clone)]
pub struct DigitalCopyControlDescriptor {
    pub digital_recording_control_data: u8,
    pub user_defined: u8,
    pub maximum_bitrate: Option<u8>,
    pub component_controls: Vec<ComponentControl>,
}

impl DigitalCopyControlDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("digital_copy_control: empty");
        }
        let drcd = (data[0] & 0xC0) >> 6;
        let maximum_bitrate_flag = data[0] & 0x20 != 0;
        let component_control_flag = data[0] & 0x10 != 0;
        let user_defined = data[0] & 0x0F;

        let mut pos = 1usize;
        let maximum_bitrate = if maximum_bitrate_flag {
            if pos >= data.len() {
                bail!("digital_copy_control: missing maximum_bitrate");
            }
            let b = data[pos];
            pos += 1;
            Some(b)
        } else {
            None
        };

        let mut component_controls = Vec::new();
        if component_control_flag {
            if pos >= data.len() {
                bail!("digital_copy_control: missing component_control_length");
            }
            let ctrl_len = data[pos] as usize;
            pos += 1;
            let end = pos + ctrl_len;
            if end > data.len() {
                bail!("digital_copy_control: component loop overruns");
            }
            while pos + 2 <= end {
                let component_tag = data[pos];
                let b = data[pos + 1];
                pos += 2;
                let mb_flag = b & 0x20 != 0;
                let maximum_bitrate = if mb_flag {
                    if pos >= end {
                        bail!("digital_copy_control: truncated component bitrate");
                    }
                    let v = data[pos];
                    pos += 1;
                    Some(v)
                } else {
                    None
                };
                component_controls.push(ComponentControl {
                    component_tag,
                    digital_recording_control_data: (b & 0xC0) >> 6,
                    user_defined: b & 0x0F,
                    maximum_bitrate,
                });
            }
        }

        Ok(DigitalCopyControlDescriptor {
            digital_recording_control_data: drcd,
            user_defined,
            maximum_bitrate,
            component_controls,
        })
    }
}

/// Audio component descriptor (tag 0xC4).
#[derive(Debug, Clone)]
pub struct AudioComponentDescriptor {
    pub stream_content: u8,
    pub component_type: u8,
    pub component_tag: u8,
    pub stream_type: u8,
    pub simulcast_group_tag: u8,
    pub es_multi_lingual_flag: bool,
    pub main_component_flag: bool,
    pub quality_indicator: u8,
    pub sampling_rate: u8,
    pub language_code: [u8; 3],
    pub language_code_2: Option<[u8; 3]>,
    pub text: String,
}

impl AudioComponentDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 9 {
            bail!("audio_component: need 9 bytes");
        }
        let es_multi_lingual_flag = data[5] & 0x80 != 0;
        let mut pos = 9usize;
        let language_code_2 = if es_multi_lingual_flag {
            if pos + 3 > data.len() {
                bail!("audio_component: missing second language");
            }
            let c = [data[pos], data[pos + 1], data[pos + 2]];
            pos += 3;
            Some(c)
        } else {
            None
        };
        Ok(AudioComponentDescriptor {
            stream_content: data[0] & 0x0F,
            component_type: data[1],
            component_tag: data[2],
            stream_type: data[3],
            simulcast_group_tag: data[4],
            es_multi_lingual_flag,
            main_component_flag: data[5] & 0x40 != 0,
            quality_indicator: (data[5] & 0x30) >> 4,
            sampling_rate: (data[5] & 0x0E) >> 1,
            language_code: [data[6], data[7], data[8]],
            language_code_2,
            text: text::decode(&data[pos..]),
        })
    }
}

/// Destination of a hyperlink, selected by `link_destination_type`.
#[derive(Debug, Clone)]
pub enum LinkDestination {
    Service {
        original_network_id: u16,
        transport_stream_id: u16,
        service_id: u16,
    },
    Event {
        original_network_id: u16,
        transport_stream_id: u16,
        service_id: u16,
        event_id: u16,
    },
    Module {
        original_network_id: u16,
        transport_stream_id: u16,
        service_id: u16,
        event_id: u16,
        component_tag: u8,
        module_id: u16,
    },
    Content {
        original_network_id: u16,
        transport_stream_id: u16,
        service_id: u16,
        content_id: u32,
    },
    ContentModule {
        original_network_id: u16,
        transport_stream_id: u16,
        service_id: u16,
        content_id: u32,
        component_tag: u8,
        module_id: u16,
    },
    ErtNode {
        information_provider_id: u16,
        event_relation_id: u16,
        node_id: u16,
    },
    StoredContent {
        uri: String,
    },
}

#[derive(Debug, Clone)]
pub struct HyperlinkDescriptor {
    pub hyper_linkage_type: u8,
    pub link_destination_type: u8,
    pub destinations: Vec<LinkDestination>,
    pub private_data: Vec<u8>,
}

impl HyperlinkDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 3 {
            bail!("hyperlink: need 3 bytes");
        }
        let hyper_linkage_type = data[0];
        let link_destination_type = data[1];
        let selector_length = data[2] as usize;
        if 3 + selector_length > data.len() {
            bail!("hyperlink: selector overruns");
        }
        let sel = &data[3..3 + selector_length];

        let mut destinations = Vec::new();
        let mut pos = 0usize;
        let need = |pos: usize, n: usize| -> anyhow::Result<()> {
            if pos + n > sel.len() {
                bail!("hyperlink: truncated selector");
            }
            Ok(())
        };
        while pos < sel.len() {
            match link_destination_type {
                0x01 => {
                    need(pos, 6)?;
                    destinations.push(LinkDestination::Service {
                        original_network_id: read_be_16(&sel[pos..]),
                        transport_stream_id: read_be_16(&sel[pos + 2..]),
                        service_id: read_be_16(&sel[pos + 4..]),
                    });
                    pos += 6;
                }
                0x02 => {
                    need(pos, 8)?;
                    destinations.push(LinkDestination::Event {
                        original_network_id: read_be_16(&sel[pos..]),
                        transport_stream_id: read_be_16(&sel[pos + 2..]),
                        service_id: read_be_16(&sel[pos + 4..]),
                        event_id: read_be_16(&sel[pos + 6..]),
                    });
                    pos += 8;
                }
                0x03 => {
                    need(pos, 11)?;
                    destinations.push(LinkDestination::Module {
                        original_network_id: read_be_16(&sel[pos..]),
                        transport_stream_id: read_be_16(&sel[pos + 2..]),
                        service_id: read_be_16(&sel[pos + 4..]),
                        event_id: read_be_16(&sel[pos + 6..]),
                        component_tag: sel[pos + 8],
                        module_id: read_be_16(&sel[pos + 9..]),
                    });
                    pos += 11;
                }
                0x04 => {
                    need(pos, 10)?;
                    destinations.push(LinkDestination::Content {
                        original_network_id: read_be_16(&sel[pos..]),
                        transport_stream_id: read_be_16(&sel[pos + 2..]),
                        service_id: read_be_16(&sel[pos + 4..]),
                        content_id: read_be_32(&sel[pos + 6..]),
                    });
                    pos += 10;
                }
                0x05 => {
                    need(pos, 13)?;
                    destinations.push(LinkDestination::ContentModule {
                        original_network_id: read_be_16(&sel[pos..]),
                        transport_stream_id: read_be_16(&sel[pos + 2..]),
                        service_id: read_be_16(&sel[pos + 4..]),
                        content_id: read_be_32(&sel[pos + 6..]),
                        component_tag: sel[pos + 10],
                        module_id: read_be_16(&sel[pos + 11..]),
                    });
                    pos += 13;
                }
                0x06 => {
                    need(pos, 6)?;
                    destinations.push(LinkDestination::ErtNode {
                        information_provider_id: read_be_16(&sel[pos..]),
                        event_relation_id: read_be_16(&sel[pos + 2..]),
                        node_id: read_be_16(&sel[pos + 4..]),
                    });
                    pos += 6;
                }
                0x07 => {
                    // URI per ARIB STD-B24 Part 2 Section 9
                    destinations.push(LinkDestination::StoredContent {
                        uri: String::from_utf8_lossy(&sel[pos..]).into_owned(),
                    });
                    pos = sel.len();
                }
                other => bail!("hyperlink: unknown link_destination_type {other:#04x}"),
            }
        }

        Ok(HyperlinkDescriptor {
            hyper_linkage_type,
            link_destination_type,
            destinations,
            private_data: data[3 + selector_length..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TargetRegionDescriptor {
    pub region_spec_type: u8,
}

impl TargetRegionDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("target_region: empty");
        }
        Ok(TargetRegionDescriptor {
            region_spec_type: data[0],
        })
    }
}

/// Data content descriptor (tag 0xC7).
#[derive(Debug, Clone)]
pub struct DataContentDescriptor {
    pub data_component_id: u16,
    pub entry_component: u8,
    pub selector_bytes: Vec<u8>,
    pub component_refs: Vec<u8>,
    pub language_code: [u8; 3],
    pub text: String,
}

impl DataContentDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("data_content: need 4 bytes");
        }
        let data_component_id = read_be_16(data);
        let entry_component = data[2];
        let select_length = data[3] as usize;
        let mut pos = 4usize;
        if pos + select_length + 1 > data.len() {
            bail!("data_content: selector overruns");
        }
        let selector_bytes = data[pos..pos + select_length].to_vec();
        pos += select_length;

        let num_refs = data[pos] as usize;
        pos += 1;
        if pos + num_refs + 4 > data.len() {
            bail!("data_content: component refs overrun");
        }
        let component_refs = data[pos..pos + num_refs].to_vec();
        pos += num_refs;

        let language_code = [data[pos], data[pos + 1], data[pos + 2]];
        pos += 3;
        let text_len = data[pos] as usize;
        pos += 1;
        if pos + text_len > data.len() {
            bail!("data_content: text overruns");
        }
        let text = text::decode(&data[pos..pos + text_len]);

        Ok(DataContentDescriptor {
            data_component_id,
            entry_component,
            selector_bytes,
            component_refs,
            language_code,
            text,
        })
    }
}

#[derive(Debug, Clone)]
pub struct VideoDecodeControlDescriptor {
    pub still_picture_flag: bool,
    pub sequence_end_code_flag: bool,
    pub video_encode_format: u8,
    pub transfer_characteristics: u8,
}

impl VideoDecodeControlDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("video_decode_control: empty");
        }
        Ok(VideoDecodeControlDescriptor {
            still_picture_flag: data[0] & 0x80 != 0,
            sequence_end_code_flag: data[0] & 0x40 != 0,
            video_encode_format: (data[0] & 0x3C) >> 2,
            transfer_characteristics: data[0] & 0x03,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TsInformationTransmission {
    pub transmission_type_info: u8,
    pub service_ids: Vec<u16>,
}

/// TS information descriptor (tag 0xCD): remote-control key and TS name.
#[derive(Debug, Clone)]
pub struct TsInformationDescriptor {
    pub remote_control_key_id: u8,
    pub ts_name: String,
    pub transmissions: Vec<TsInformationTransmission>,
}

impl TsInformationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("TS_information: need 2 bytes");
        }
        let remote_control_key_id = data[0];
        let name_len = ((data[1] & 0xFC) >> 2) as usize;
        let transmission_count = (data[1] & 0x03) as usize;
        let mut pos = 2usize;
        if pos + name_len > data.len() {
            bail!("TS_information: name overruns");
        }
        let ts_name = text::decode(&data[pos..pos + name_len]);
        pos += name_len;

        let mut transmissions = Vec::new();
        for _ in 0..transmission_count {
            if pos + 2 > data.len() {
                bail!("TS_information: truncated transmission entry");
            }
            let transmission_type_info = data[pos];
            let num_of_service = data[pos + 1] as usize;
            pos += 2;
            if pos + num_of_service * 2 > data.len() {
                bail!("TS_information: service list overruns");
            }
            let service_ids = data[pos..pos + num_of_service * 2]
                .chunks_exact(2)
                .map(read_be_16)
                .collect();
            pos += num_of_service * 2;
            transmissions.push(TsInformationTransmission {
                transmission_type_info,
                service_ids,
            });
        }

        Ok(TsInformationDescriptor {
            remote_control_key_id,
            ts_name,
            transmissions,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BroadcasterIdEntry {
    pub original_network_id: u16,
    pub broadcaster_id: u8,
}

/// Sub-body of the extended broadcaster descriptor, selected by
/// `broadcaster_type` (0x1 terrestrial TV, 0x2 terrestrial sound).
#[derive(Debug, Clone)]
pub enum ExtendedBroadcasterBody {
    Terrestrial {
        terrestrial_broadcaster_id: u16,
        affiliation_ids: Vec<u8>,
        broadcaster_ids: Vec<BroadcasterIdEntry>,
        private_data: Vec<u8>,
    },
    TerrestrialSound {
        terrestrial_sound_broadcaster_id: u16,
        sound_broadcast_affiliation_ids: Vec<u8>,
        broadcaster_ids: Vec<BroadcasterIdEntry>,
        private_data: Vec<u8>,
    },
    Other(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct ExtendedBroadcasterDescriptor {
    pub broadcaster_type: u8,
    pub body: ExtendedBroadcasterBody,
}

impl ExtendedBroadcasterDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("extended_broadcaster: empty");
        }
        let broadcaster_type = (data[0] & 0xF0) >> 4;
        let rest = &data[1..];

        let body = match broadcaster_type {
            0x1 | 0x2 => {
                if rest.len() < 3 {
                    bail!("extended_broadcaster: truncated terrestrial form");
                }
                let broadcaster_id = read_be_16(rest);
                let affiliation_count = ((rest[2] & 0xF0) >> 4) as usize;
                let broadcaster_count = (rest[2] & 0x0F) as usize;
                let mut pos = 3usize;
                if pos + affiliation_count + broadcaster_count * 3 > rest.len() {
                    bail!("extended_broadcaster: loops overrun");
                }
                let affiliation_ids = rest[pos..pos + affiliation_count].to_vec();
                pos += affiliation_count;
                let broadcaster_ids = rest[pos..pos + broadcaster_count * 3]
                    .chunks_exact(3)
                    .map(|c| BroadcasterIdEntry {
                        original_network_id: read_be_16(c),
                        broadcaster_id: c[2],
                    })
                    .collect();
                pos += broadcaster_count * 3;
                let private_data = rest[pos..].to_vec();

                if broadcaster_type == 0x1 {
                    ExtendedBroadcasterBody::Terrestrial {
                        terrestrial_broadcaster_id: broadcaster_id,
                        affiliation_ids,
                        broadcaster_ids,
                        private_data,
                    }
                } else {
                    ExtendedBroadcasterBody::TerrestrialSound {
                        terrestrial_sound_broadcaster_id: broadcaster_id,
                        sound_broadcast_affiliation_ids: affiliation_ids,
                        broadcaster_ids,
                        private_data,
                    }
                }
            }
            _ => ExtendedBroadcasterBody::Other(rest.to_vec()),
        };

        Ok(ExtendedBroadcasterDescriptor {
            broadcaster_type,
            body,
        })
    }
}

/// Logo transmission descriptor (tag 0xCF); the sub-body depends on
/// `logo_transmission_type`.
#[derive(Debug, Clone)]
pub enum LogoTransmission {
    /// Type 0x01: CDT transmission.
    Cdt {
        logo_id: u16,
        logo_version: u16,
        download_data_id: u16,
    },
    /// Type 0x02: CDT shared with another stream.
    CdtShared { logo_id: u16 },
    /// Type 0x03: simple logo as an ARIB character string.
    Text(String),
    Other { logo_transmission_type: u8, data: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct LogoTransmissionDescriptor {
    pub body: LogoTransmission,
}

impl LogoTransmissionDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("logo_transmission: empty");
        }
        let ltype = data[0];
        let rest = &data[1..];
        let body = match ltype {
            0x01 => {
                if rest.len() < 6 {
                    bail!("logo_transmission: truncated CDT form");
                }
                LogoTransmission::Cdt {
                    logo_id: (read_be_16(rest)) & 0x01FF,
                    logo_version: read_be_16(&rest[2..]) & 0x0FFF,
                    download_data_id: read_be_16(&rest[4..]),
                }
            }
            0x02 => {
                if rest.len() < 2 {
                    bail!("logo_transmission: truncated shared form");
                }
                LogoTransmission::CdtShared {
                    logo_id: read_be_16(rest) & 0x01FF,
                }
            }
            0x03 => LogoTransmission::Text(text::decode(rest)),
            other => LogoTransmission::Other {
                logo_transmission_type: other,
                data: rest.to_vec(),
            },
        };
        Ok(LogoTransmissionDescriptor { body })
    }
}

/// Series descriptor (tag 0xD5).
#[derive(Debug, Clone)]
pub struct SeriesDescriptor {
    pub series_id: u16,
    pub repeat_label: u8,
    pub program_pattern: u8,
    pub expire_date_valid_flag: bool,
    /// MJD; meaningful only when the valid flag is set.
    pub expire_date: u16,
    pub episode_number: u16,
    pub last_episode_number: u16,
    pub series_name: String,
}

impl SeriesDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 8 {
            bail!("series: need 8 bytes");
        }
        Ok(SeriesDescriptor {
            series_id: read_be_16(data),
            repeat_label: (data[2] & 0xF0) >> 4,
            program_pattern: (data[2] & 0x0E) >> 1,
            expire_date_valid_flag: data[2] & 0x01 != 0,
            expire_date: read_be_16(&data[3..]),
            episode_number: read_bits(&data[5..], 0, 12) as u16,
            last_episode_number: read_bits(&data[6..], 4, 12) as u16,
            series_name: text::decode(&data[8..]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EventGroupEntry {
    pub service_id: u16,
    pub event_id: u16,
}

#[derive(Debug, Clone)]
pub struct EventGroupCrossEntry {
    pub original_network_id: u16,
    pub transport_stream_id: u16,
    pub service_id: u16,
    pub event_id: u16,
}

/// Event group descriptor (tag 0xD6). Group types 4 and 5 (relay/movement
/// across networks) carry an additional cross-network list.
#[derive(Debug, Clone)]
pub struct EventGroupDescriptor {
    pub group_type: u8,
    pub events: Vec<EventGroupEntry>,
    pub cross_events: Vec<EventGroupCrossEntry>,
    pub private_data: Vec<u8>,
}

impl EventGroupDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("event_group: empty");
        }
        let group_type = (data[0] & 0xF0) >> 4;
        let event_count = (data[0] & 0x0F) as usize;
        if 1 + event_count * 4 > data.len() {
            bail!("event_group: event list overruns");
        }
        let events = data[1..1 + event_count * 4]
            .chunks_exact(4)
            .map(|c| EventGroupEntry {
                service_id: read_be_16(c),
                event_id: read_be_16(&c[2..]),
            })
            .collect();

        let rest = &data[1 + event_count * 4..];
        let (cross_events, private_data) = if group_type == 4 || group_type == 5 {
            let cross = rest
                .chunks_exact(8)
                .map(|c| EventGroupCrossEntry {
                    original_network_id: read_be_16(c),
                    transport_stream_id: read_be_16(&c[2..]),
                    service_id: read_be_16(&c[4..]),
                    event_id: read_be_16(&c[6..]),
                })
                .collect();
            (cross, Vec::new())
        } else {
            (Vec::new(), rest.to_vec())
        };

        Ok(EventGroupDescriptor {
            group_type,
            events,
            cross_events,
            private_data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SiParameterEntry {
    pub table_id: u8,
    pub table_description: Vec<u8>,
}

/// SI parameter descriptor (tag 0xD7).
#[derive(Debug, Clone)]
pub struct SiParameterDescriptor {
    pub parameter_version: u8,
    /// MJD of the last update.
    pub update_time: u16,
    pub tables: Vec<SiParameterEntry>,
}

impl SiParameterDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 3 {
            bail!("SI_parameter: need 3 bytes");
        }
        let parameter_version = data[0];
        let update_time = read_be_16(&data[1..]);
        let mut tables = Vec::new();
        let mut pos = 3usize;
        while pos + 2 <= data.len() {
            let table_id = data[pos];
            let len = data[pos + 1] as usize;
            pos += 2;
            if pos + len > data.len() {
                bail!("SI_parameter: table description overruns");
            }
            tables.push(SiParameterEntry {
                table_id,
                table_description: data[pos..pos + len].to_vec(),
            });
            pos += len;
        }
        Ok(SiParameterDescriptor {
            parameter_version,
            update_time,
            tables,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BroadcasterNameDescriptor {
    pub name: String,
}

impl BroadcasterNameDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("broadcaster_name: empty");
        }
        Ok(BroadcasterNameDescriptor {
            name: text::decode(data),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CaUnit {
    pub ca_unit_id: u8,
    pub component_tags: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ComponentGroup {
    pub component_group_id: u8,
    pub ca_units: Vec<CaUnit>,
    pub total_bitrate: Option<u8>,
    pub text: String,
}

/// Component group descriptor (tag 0xD9): multi-view grouping.
#[derive(Debug, Clone)]
pub struct ComponentGroupDescriptor {
    pub component_group_type: u8,
    pub groups: Vec<ComponentGroup>,
}

impl ComponentGroupDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("component_group: empty");
        }
        let component_group_type = (data[0] & 0xE0) >> 5;
        let total_bit_rate_flag = data[0] & 0x10 != 0;
        let num_of_group = (data[0] & 0x0F) as usize;

        let mut groups = Vec::new();
        let mut pos = 1usize;
        for _ in 0..num_of_group {
            if pos >= data.len() {
                bail!("component_group: truncated group header");
            }
            let component_group_id = (data[pos] & 0xF0) >> 4;
            let num_of_ca_unit = (data[pos] & 0x0F) as usize;
            pos += 1;

            let mut ca_units = Vec::new();
            for _ in 0..num_of_ca_unit {
                if pos >= data.len() {
                    bail!("component_group: truncated CA unit");
                }
                let ca_unit_id = (data[pos] & 0xF0) >> 4;
                let num_of_component = (data[pos] & 0x0F) as usize;
                pos += 1;
                if pos + num_of_component > data.len() {
                    bail!("component_group: component tags overrun");
                }
                ca_units.push(CaUnit {
                    ca_unit_id,
                    component_tags: data[pos..pos + num_of_component].to_vec(),
                });
                pos += num_of_component;
            }

            let total_bitrate = if total_bit_rate_flag {
                if pos >= data.len() {
                    bail!("component_group: missing total bitrate");
                }
                let v = data[pos];
                pos += 1;
                Some(v)
            } else {
                None
            };

            if pos >= data.len() {
                bail!("component_group: missing text length");
            }
            let text_len = data[pos] as usize;
            pos += 1;
            if pos + text_len > data.len() {
                bail!("component_group: text overruns");
            }
            let text = text::decode(&data[pos..pos + text_len]);
            pos += text_len;

            groups.push(ComponentGroup {
                component_group_id,
                ca_units,
                total_bitrate,
                text,
            });
        }

        Ok(ComponentGroupDescriptor {
            component_group_type,
            groups,
        })
    }
}

/// SI prime TS descriptor (tag 0xDA).
#[derive(Debug, Clone)]
pub struct SiPrimeTsDescriptor {
    pub parameter_version: u8,
    pub update_time: u16,
    pub si_prime_ts_network_id: u16,
    pub si_prime_transport_stream_id: u16,
    pub tables: Vec<SiParameterEntry>,
}

impl SiPrimeTsDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 7 {
            bail!("SI_prime_TS: need 7 bytes");
        }
        let mut tables = Vec::new();
        let mut pos = 7usize;
        while pos + 2 <= data.len() {
            let table_id = data[pos];
            let len = data[pos + 1] as usize;
            pos += 2;
            if pos + len > data.len() {
                bail!("SI_prime_TS: table description overruns");
            }
            tables.push(SiParameterEntry {
                table_id,
                table_description: data[pos..pos + len].to_vec(),
            });
            pos += len;
        }
        Ok(SiPrimeTsDescriptor {
            parameter_version: data[0],
            update_time: read_be_16(&data[1..]),
            si_prime_ts_network_id: read_be_16(&data[3..]),
            si_prime_transport_stream_id: read_be_16(&data[5..]),
            tables,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BoardInformationDescriptor {
    pub title: String,
    pub text: String,
}

impl BoardInformationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("board_information: need 2 bytes");
        }
        let title_len = data[0] as usize;
        if 1 + title_len + 1 > data.len() {
            bail!("board_information: truncated title");
        }
        let title = text::decode(&data[1..1 + title_len]);
        let text_pos = 1 + title_len;
        let text_len = data[text_pos] as usize;
        if text_pos + 1 + text_len > data.len() {
            bail!("board_information: truncated text");
        }
        let text = text::decode(&data[text_pos + 1..text_pos + 1 + text_len]);
        Ok(BoardInformationDescriptor { title, text })
    }
}

#[derive(Debug, Clone)]
pub struct LdtLinkEntry {
    pub description_id: u16,
    pub description_type: u8,
}

#[derive(Debug, Clone)]
pub struct LdtLinkageDescriptor {
    pub original_service_id: u16,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub descriptions: Vec<LdtLinkEntry>,
}

impl LdtLinkageDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 6 {
            bail!("LDT_linkage: need 6 bytes");
        }
        let descriptions = data[6..]
            .chunks_exact(4)
            .map(|c| LdtLinkEntry {
                description_id: read_be_16(c),
                description_type: c[2] & 0x0F,
            })
            .collect();
        Ok(LdtLinkageDescriptor {
            original_service_id: read_be_16(data),
            transport_stream_id: read_be_16(&data[2..]),
            original_network_id: read_be_16(&data[4..]),
            descriptions,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConnectedTransmissionDescriptor {
    pub connected_transmission_group_id: u16,
    pub segment_type: u8,
    pub modulation_type_a: u8,
    pub modulation_type_b: u8,
    pub modulation_type_c: u8,
    pub additional_info: Vec<u8>,
}

impl ConnectedTransmissionDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 3 {
            bail!("connected_transmission: need 3 bytes");
        }
        Ok(ConnectedTransmissionDescriptor {
            connected_transmission_group_id: read_be_16(data),
            segment_type: (data[2] & 0xC0) >> 6,
            modulation_type_a: (data[2] & 0x30) >> 4,
            modulation_type_b: (data[2] & 0x0C) >> 2,
            modulation_type_c: data[2] & 0x03,
            additional_info: data[3..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ContentAvailabilityDescriptor {
    pub copy_restriction_mode: bool,
    pub image_constraint_token: bool,
    pub retention_mode: bool,
    pub retention_state: u8,
    pub encryption_mode: bool,
}

impl ContentAvailabilityDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("content_availability: empty");
        }
        Ok(ContentAvailabilityDescriptor {
            copy_restriction_mode: data[0] & 0x40 != 0,
            image_constraint_token: data[0] & 0x20 != 0,
            retention_mode: data[0] & 0x10 != 0,
            retention_state: (data[0] & 0x0E) >> 1,
            encryption_mode: data[0] & 0x01 != 0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServiceGroupPair {
    pub primary_service_id: u16,
    pub secondary_service_id: u16,
}

/// Service group descriptor (tag 0xE0); type 1 pairs simultaneous services.
#[derive(Debug, Clone)]
pub struct ServiceGroupDescriptor {
    pub service_group_type: u8,
    pub pairs: Vec<ServiceGroupPair>,
    pub private_data: Vec<u8>,
}

impl ServiceGroupDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("service_group: empty");
        }
        let service_group_type = (data[0] & 0xF0) >> 4;
        let rest = &data[1..];
        let (pairs, private_data) = if service_group_type == 1 {
            let pairs = rest
                .chunks_exact(4)
                .map(|c| ServiceGroupPair {
                    primary_service_id: read_be_16(c),
                    secondary_service_id: read_be_16(&c[2..]),
                })
                .collect();
            (pairs, Vec::new())
        } else {
            (Vec::new(), rest.to_vec())
        };
        Ok(ServiceGroupDescriptor {
            service_group_type,
            pairs,
            private_data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AreaBroadcastStation {
    pub station_id: u32,
    pub location_code: u16,
    pub broadcast_signal_format: u8,
    pub additional_station_info: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AreaBroadcastingInformationDescriptor {
    pub stations: Vec<AreaBroadcastStation>,
}

impl AreaBroadcastingInformationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("area_broadcasting_information: empty");
        }
        let num = data[0] as usize;
        let mut stations = Vec::new();
        let mut pos = 1usize;
        for _ in 0..num {
            if pos + 7 > data.len() {
                bail!("area_broadcasting_information: truncated station");
            }
            let info_len = data[pos + 6] as usize;
            if pos + 7 + info_len > data.len() {
                bail!("area_broadcasting_information: station info overruns");
            }
            stations.push(AreaBroadcastStation {
                station_id: read_bits(&data[pos..], 0, 24) as u32,
                location_code: read_be_16(&data[pos + 3..]),
                broadcast_signal_format: data[pos + 5],
                additional_station_info: data[pos + 7..pos + 7 + info_len].to_vec(),
            });
            pos += 7 + info_len;
        }
        Ok(AreaBroadcastingInformationDescriptor { stations })
    }
}

#[derive(Debug, Clone)]
pub struct AccessControlDescriptor {
    pub ca_system_id: u16,
    pub transmission_type: u8,
    pub pid: u16,
    pub private_data: Vec<u8>,
}

impl AccessControlDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("access_control: need 4 bytes");
        }
        Ok(AccessControlDescriptor {
            ca_system_id: read_be_16(data),
            transmission_type: (data[2] & 0xE0) >> 5,
            pid: ((data[2] & 0x1F) as u16) << 8 | data[3] as u16,
            private_data: data[4..].to_vec(),
        })
    }
}

/// Carousel compatible composite descriptor (tag 0xF7); sub-descriptors are
/// carried opaque.
#[derive(Debug, Clone)]
pub struct CarouselCompatibleCompositeDescriptor {
    pub sub_descriptors: Vec<u8>,
}

impl CarouselCompatibleCompositeDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        Ok(CarouselCompatibleCompositeDescriptor {
            sub_descriptors: data.to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TerrestrialDeliverySystemDescriptor {
    pub area_code: u16,
    pub guard_interval: u8,
    pub transmission_mode: u8,
    /// Units of 1/7 MHz.
    pub frequencies: Vec<u16>,
}

impl TerrestrialDeliverySystemDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("terrestrial_delivery_system: need 2 bytes");
        }
        Ok(TerrestrialDeliverySystemDescriptor {
            area_code: read_bits(data, 0, 12) as u16,
            guard_interval: (data[1] & 0x0C) >> 2,
            transmission_mode: data[1] & 0x03,
            frequencies: data[2..].chunks_exact(2).map(read_be_16).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PartialReceptionDescriptor {
    pub service_ids: Vec<u16>,
}

impl PartialReceptionDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        Ok(PartialReceptionDescriptor {
            service_ids: data.chunks_exact(2).map(read_be_16).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EmergencyInformationEntry {
    pub service_id: u16,
    pub start_end_flag: bool,
    /// false = first level, true = second level.
    pub signal_level: bool,
    pub area_codes: Vec<u16>,
}

/// Emergency warning broadcast descriptor (tag 0xFC).
#[derive(Debug, Clone)]
pub struct EmergencyInformationDescriptor {
    pub entries: Vec<EmergencyInformationEntry>,
}

impl EmergencyInformationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("emergency_information: empty");
        }
        let mut entries = Vec::new();
        let mut pos = 0usize;
        while pos + 4 <= data.len() {
            let service_id = read_be_16(&data[pos..]);
            let start_end_flag = data[pos + 2] & 0x80 != 0;
            let signal_level = data[pos + 2] & 0x40 != 0;
            let area_len = data[pos + 3] as usize;
            pos += 4;
            if pos + area_len > data.len() {
                bail!("emergency_information: area codes overrun");
            }
            let area_codes = data[pos..pos + area_len]
                .chunks_exact(2)
                .map(|c| (read_be_16(c) & 0xFFF0) >> 4)
                .collect();
            pos += area_len;
            entries.push(EmergencyInformationEntry {
                service_id,
                start_end_flag,
                signal_level,
                area_codes,
            });
        }
        Ok(EmergencyInformationDescriptor { entries })
    }
}

#[derive(Debug, Clone)]
pub struct DataComponentDescriptor {
    pub data_component_id: u16,
    pub additional_data_component_info: Vec<u8>,
}

impl DataComponentDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("data_component: need 2 bytes");
        }
        Ok(DataComponentDescriptor {
            data_component_id: read_be_16(data),
            additional_data_component_info: data[2..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SystemManagementDescriptor {
    pub system_management_id: u16,
    pub additional_identification_info: Vec<u8>,
}

impl SystemManagementDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("system_management: need 2 bytes");
        }
        Ok(SystemManagementDescriptor {
            system_management_id: read_be_16(data),
            additional_identification_info: data[2..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_copy_control_component_loop() {
        let data = [
            0b01_1_1_0000, // control data 01, bitrate + component flags
            0x30,          // maximum_bitrate
            0x05,          // component_control_length
            0x10, 0b10_1_0_0000, 0x20, // tag 0x10, with bitrate
            0x11, 0b00_0_0_0000, // tag 0x11, no bitrate
        ];
        let d = DigitalCopyControlDescriptor::parse(&data).unwrap();
        assert_eq!(d.digital_recording_control_data, 0b01);
        assert_eq!(d.maximum_bitrate, Some(0x30));
        assert_eq!(d.component_controls.len(), 2);
        assert_eq!(d.component_controls[0].maximum_bitrate, Some(0x20));
        assert_eq!(d.component_controls[0].digital_recording_control_data, 0b10);
        assert_eq!(d.component_controls[1].maximum_bitrate, None);
    }

    #[test]
    fn audio_component_dual_language() {
        let mut data = vec![
            0x02, // stream_content
            0x02, // component_type: dual mono
            0x10, 0x0F, 0xFF, 0b1_1_01_111_0,
        ];
        data.extend_from_slice(b"jpn");
        data.extend_from_slice(b"eng");
        data.extend_from_slice(&[0x1B, 0x28, 0x4A, b'X']);
        let d = AudioComponentDescriptor::parse(&data).unwrap();
        assert!(d.es_multi_lingual_flag);
        assert!(d.main_component_flag);
        assert_eq!(d.quality_indicator, 0b01);
        assert_eq!(d.sampling_rate, 0b111);
        assert_eq!(&d.language_code, b"jpn");
        assert_eq!(d.language_code_2.as_ref().unwrap(), b"eng");
        assert_eq!(d.text, "Ｘ");
    }

    #[test]
    fn hyperlink_event_destination() {
        let data = [
            0x00, 0x02, 0x08, // linkage type, destination type 2, selector len
            0x7F, 0xE1, 0x7F, 0xE1, 0x04, 0x08, 0xAB, 0xCD,
        ];
        let d = HyperlinkDescriptor::parse(&data).unwrap();
        assert_eq!(d.destinations.len(), 1);
        match &d.destinations[0] {
            LinkDestination::Event { event_id, .. } => assert_eq!(*event_id, 0xABCD),
            other => panic!("wrong destination: {other:?}"),
        }
    }

    #[test]
    fn event_group_relay_form() {
        let data = [
            0b0100_0001, // type 4 (relay), one event
            0x04, 0x08, 0x30, 0x39, // service/event
            0x00, 0x04, 0x7F, 0xE1, 0x05, 0xDC, 0x30, 0x3A, // cross entry
        ];
        let d = EventGroupDescriptor::parse(&data).unwrap();
        assert_eq!(d.group_type, 4);
        assert_eq!(d.events.len(), 1);
        assert_eq!(d.cross_events.len(), 1);
        assert_eq!(d.cross_events[0].event_id, 0x303A);
        assert!(d.private_data.is_empty());
    }

    #[test]
    fn component_group_with_bitrate() {
        let data = [
            0b000_1_0001, // multi-view, bitrate flag, one group
            0b0000_0001,  // group 0, one CA unit
            0b0001_0010,  // CA unit 1, two components
            0x30, 0x31, // component tags
            0x40, // total bitrate
            0x00, // text length
        ];
        let d = ComponentGroupDescriptor::parse(&data).unwrap();
        assert_eq!(d.groups.len(), 1);
        assert_eq!(d.groups[0].ca_units.len(), 1);
        assert_eq!(d.groups[0].ca_units[0].component_tags, vec![0x30, 0x31]);
        assert_eq!(d.groups[0].total_bitrate, Some(0x40));
    }

    #[test]
    fn logo_transmission_forms() {
        let d = LogoTransmissionDescriptor::parse(&[0x01, 0x01, 0x23, 0x04, 0x56, 0x78, 0x9A]).unwrap();
        match d.body {
            LogoTransmission::Cdt {
                logo_id,
                logo_version,
                download_data_id,
            } => {
                assert_eq!(logo_id, 0x0123);
                assert_eq!(logo_version, 0x0456);
                assert_eq!(download_data_id, 0x789A);
            }
            other => panic!("wrong body: {other:?}"),
        }

        let d = LogoTransmissionDescriptor::parse(&[0x02, 0x01, 0x42]).unwrap();
        assert!(matches!(
            d.body,
            LogoTransmission::CdtShared { logo_id: 0x0142 }
        ));
    }

    #[test]
    fn terrestrial_delivery_frequencies() {
        let data = [0x5E, 0b1111_01_10, 0x16, 0x61, 0x16, 0x9B];
        let d = TerrestrialDeliverySystemDescriptor::parse(&data).unwrap();
        assert_eq!(d.area_code, 0x5EF);
        assert_eq!(d.guard_interval, 0b01);
        assert_eq!(d.transmission_mode, 0b10);
        assert_eq!(d.frequencies, vec![0x1661, 0x169B]);
    }

    #[test]
    fn emergency_information_area_codes() {
        let data = [
            0x04, 0x08, // service_id
            0b1_1_000000, 0x04, // flags + area_code_length
            0x12, 0x30, 0x45, 0x60, // two 12-bit codes
        ];
        let d = EmergencyInformationDescriptor::parse(&data).unwrap();
        assert_eq!(d.entries.len(), 1);
        assert!(d.entries[0].start_end_flag);
        assert_eq!(d.entries[0].area_codes, vec![0x123, 0x456]);
    }

    #[test]
    fn series_episode_numbers() {
        let mut data = vec![
            0x00, 0x2A, // series_id
            0b0011_010_1, // repeat 3, pattern 2, expire valid
            0xC0, 0x79, // expire MJD
            0x00, 0xC8, 0x0C, // episode 12, last 2048... see asserts
        ];
        data.extend_from_slice(&[0x1B, 0x28, 0x4A, b'S']);
        let d = SeriesDescriptor::parse(&data).unwrap();
        assert_eq!(d.series_id, 0x002A);
        assert_eq!(d.repeat_label, 3);
        assert_eq!(d.program_pattern, 2);
        assert!(d.expire_date_valid_flag);
        assert_eq!(d.episode_number, 0x00C);
        assert_eq!(d.last_episode_number, 0x80C);
        assert_eq!(d.series_name, "Ｓ");
    }
}
