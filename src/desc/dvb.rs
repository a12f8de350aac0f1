//! Descriptors shared between ETSI EN 300 468 and ARIB STD-B10
//! (tags 0x40..0x68). Text fields carry ARIB STD-B24 character streams.

use anyhow::bail;

use crate::text;
use crate::utils::{bcd_to_dec, read_be_16, read_bits};

#[derive(Debug, Clone)]
pub struct NetworkNameDescriptor {
    pub name: String,
}

impl NetworkNameDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("network_name: empty");
        }
        Ok(NetworkNameDescriptor {
            name: text::decode(data),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServiceListEntry {
    pub service_id: u16,
    pub service_type: u8,
}

#[derive(Debug, Clone)]
pub struct ServiceListDescriptor {
    pub services: Vec<ServiceListEntry>,
}

impl ServiceListDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("service_list: empty");
        }
        let services = data
            .chunks_exact(3)
            .map(|c| ServiceListEntry {
                service_id: read_be_16(c),
                service_type: c[2],
            })
            .collect();
        Ok(ServiceListDescriptor { services })
    }
}

#[derive(Debug, Clone)]
pub struct StuffingDescriptor {
    pub bytes: Vec<u8>,
}

impl StuffingDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        Ok(StuffingDescriptor {
            bytes: data.to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SatelliteDeliverySystemDescriptor {
    /// GHz, from 8 BCD digits.
    pub frequency_ghz: f64,
    /// Degrees, from 4 BCD digits.
    pub orbital_position: f64,
    pub west_east_flag: bool,
    pub polarisation: u8,
    pub modulation: u8,
    /// Msymbol/s, from 7 BCD digits.
    pub symbol_rate: f64,
    pub fec_inner: u8,
}

impl SatelliteDeliverySystemDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 11 {
            bail!("satellite_delivery_system: need 11 bytes");
        }
        Ok(SatelliteDeliverySystemDescriptor {
            frequency_ghz: bcd_to_dec(&data[0..4], 8) as f64 / 100_000.0,
            orbital_position: bcd_to_dec(&data[4..6], 4) as f64 / 10.0,
            west_east_flag: data[6] & 0x80 != 0,
            polarisation: (data[6] & 0x60) >> 5,
            modulation: data[6] & 0x1F,
            symbol_rate: bcd_to_dec(&data[7..11], 7) as f64 / 10_000.0,
            fec_inner: data[10] & 0x0F,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BouquetNameDescriptor {
    pub name: String,
}

impl BouquetNameDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("bouquet_name: empty");
        }
        Ok(BouquetNameDescriptor {
            name: text::decode(data),
        })
    }
}

/// Service descriptor (tag 0x48): type plus provider/service names.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub service_type: u8,
    pub provider_name: String,
    pub service_name: String,
}

impl ServiceDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 3 {
            bail!("service: need 3 bytes");
        }
        let service_type = data[0];
        let provider_len = data[1] as usize;
        if 2 + provider_len + 1 > data.len() {
            bail!("service: truncated provider name");
        }
        let provider_name = text::decode(&data[2..2 + provider_len]);
        let name_pos = 2 + provider_len;
        let name_len = data[name_pos] as usize;
        if name_pos + 1 + name_len > data.len() {
            bail!("service: truncated service name");
        }
        let service_name = text::decode(&data[name_pos + 1..name_pos + 1 + name_len]);
        Ok(ServiceDescriptor {
            service_type,
            provider_name,
            service_name,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CountryAvailabilityDescriptor {
    pub country_availability_flag: bool,
    pub country_codes: Vec<[u8; 3]>,
}

impl CountryAvailabilityDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("country_availability: empty");
        }
        let country_codes = data[1..]
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Ok(CountryAvailabilityDescriptor {
            country_availability_flag: data[0] & 0x80 != 0,
            country_codes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LinkageDescriptor {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub service_id: u16,
    pub linkage_type: u8,
    pub private_data: Vec<u8>,
}

impl LinkageDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 7 {
            bail!("linkage: need 7 bytes");
        }
        Ok(LinkageDescriptor {
            transport_stream_id: read_be_16(data),
            original_network_id: read_be_16(&data[2..]),
            service_id: read_be_16(&data[4..]),
            linkage_type: data[6],
            private_data: data[7..].to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NvodReferenceEntry {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub service_id: u16,
}

#[derive(Debug, Clone)]
pub struct NvodReferenceDescriptor {
    pub references: Vec<NvodReferenceEntry>,
}

impl NvodReferenceDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("NVOD_reference: empty");
        }
        let references = data
            .chunks_exact(6)
            .map(|c| NvodReferenceEntry {
                transport_stream_id: read_be_16(c),
                original_network_id: read_be_16(&c[2..]),
                service_id: read_be_16(&c[4..]),
            })
            .collect();
        Ok(NvodReferenceDescriptor { references })
    }
}

#[derive(Debug, Clone)]
pub struct TimeShiftedServiceDescriptor {
    pub reference_service_id: u16,
}

impl TimeShiftedServiceDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("time_shifted_service: need 2 bytes");
        }
        Ok(TimeShiftedServiceDescriptor {
            reference_service_id: read_be_16(data),
        })
    }
}

/// Short event descriptor (tag 0x4D): the EPG headline.
#[derive(Debug, Clone)]
pub struct ShortEventDescriptor {
    pub language_code: [u8; 3],
    pub event_name: String,
    pub text: String,
}

impl ShortEventDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 5 {
            bail!("short_event: need 5 bytes");
        }
        let language_code = [data[0], data[1], data[2]];
        let name_len = data[3] as usize;
        if 4 + name_len + 1 > data.len() {
            bail!("short_event: truncated event name");
        }
        let event_name = text::decode(&data[4..4 + name_len]);
        let text_pos = 4 + name_len;
        let text_len = data[text_pos] as usize;
        if text_pos + 1 + text_len > data.len() {
            bail!("short_event: truncated text");
        }
        let text = text::decode(&data[text_pos + 1..text_pos + 1 + text_len]);
        Ok(ShortEventDescriptor {
            language_code,
            event_name,
            text,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExtendedEventItem {
    pub description: String,
    pub item: String,
}

/// Extended event descriptor (tag 0x4E): (description, value) items plus a
/// trailing free-text field. Long texts span several descriptors, numbered
/// `descriptor_number` of `last_descriptor_number`.
#[derive(Debug, Clone)]
pub struct ExtendedEventDescriptor {
    pub descriptor_number: u8,
    pub last_descriptor_number: u8,
    pub language_code: [u8; 3],
    pub items: Vec<ExtendedEventItem>,
    pub text: String,
}

impl ExtendedEventDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 6 {
            bail!("extended_event: need 6 bytes");
        }
        let descriptor_number = (data[0] & 0xF0) >> 4;
        let last_descriptor_number = data[0] & 0x0F;
        let language_code = [data[1], data[2], data[3]];
        let length_of_items = data[4] as usize;
        if 5 + length_of_items + 1 > data.len() {
            bail!("extended_event: truncated item loop");
        }

        let mut items = Vec::new();
        let item_buf = &data[5..5 + length_of_items];
        let mut pos = 0usize;
        while pos < item_buf.len() {
            let desc_len = item_buf[pos] as usize;
            if pos + 1 + desc_len + 1 > item_buf.len() {
                bail!("extended_event: item description overruns loop");
            }
            let description = text::decode(&item_buf[pos + 1..pos + 1 + desc_len]);
            pos += 1 + desc_len;
            let item_len = item_buf[pos] as usize;
            if pos + 1 + item_len > item_buf.len() {
                bail!("extended_event: item text overruns loop");
            }
            let item = text::decode(&item_buf[pos + 1..pos + 1 + item_len]);
            pos += 1 + item_len;
            items.push(ExtendedEventItem { description, item });
        }

        let text_pos = 5 + length_of_items;
        let text_len = data[text_pos] as usize;
        if text_pos + 1 + text_len > data.len() {
            bail!("extended_event: truncated text");
        }
        let text = text::decode(&data[text_pos + 1..text_pos + 1 + text_len]);

        Ok(ExtendedEventDescriptor {
            descriptor_number,
            last_descriptor_number,
            language_code,
            items,
            text,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TimeShiftedEventDescriptor {
    pub reference_service_id: u16,
    pub reference_event_id: u16,
}

impl TimeShiftedEventDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 4 {
            bail!("time_shifted_event: need 4 bytes");
        }
        Ok(TimeShiftedEventDescriptor {
            reference_service_id: read_be_16(data),
            reference_event_id: read_be_16(&data[2..]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub stream_content: u8,
    pub component_type: u8,
    pub component_tag: u8,
    pub language_code: [u8; 3],
    pub text: String,
}

impl ComponentDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 6 {
            bail!("component: need 6 bytes");
        }
        Ok(ComponentDescriptor {
            stream_content: data[0] & 0x0F,
            component_type: data[1],
            component_tag: data[2],
            language_code: [data[3], data[4], data[5]],
            text: text::decode(&data[6..]),
        })
    }
}

/// Where a mosaic cell links to, selected by `cell_linkage_info`.
#[derive(Debug, Clone)]
pub enum CellLinkage {
    None,
    Bouquet {
        bouquet_id: u16,
    },
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
}

#[derive(Debug, Clone)]
pub struct MosaicCell {
    pub logical_cell_id: u8,
    pub presentation_info: u8,
    pub elementary_cell_ids: Vec<u8>,
    pub linkage: CellLinkage,
}

#[derive(Debug, Clone)]
pub struct MosaicDescriptor {
    pub mosaic_entry_point: bool,
    pub horizontal_cells: u8,
    pub vertical_cells: u8,
    pub cells: Vec<MosaicCell>,
}

impl MosaicDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("mosaic: empty");
        }
        let mut d = MosaicDescriptor {
            mosaic_entry_point: data[0] & 0x80 != 0,
            horizontal_cells: (data[0] & 0x70) >> 4,
            vertical_cells: data[0] & 0x07,
            cells: Vec::new(),
        };

        let mut pos = 1usize;
        while pos < data.len() {
            if pos + 3 > data.len() {
                bail!("mosaic: truncated cell header");
            }
            let logical_cell_id = (data[pos] & 0xFC) >> 2;
            let presentation_info = data[pos + 1] & 0x07;
            let field_len = data[pos + 2] as usize;
            pos += 3;
            if pos + field_len + 1 > data.len() {
                bail!("mosaic: truncated elementary cell field");
            }
            let elementary_cell_ids = data[pos..pos + field_len]
                .iter()
                .map(|b| b & 0x3F)
                .collect();
            pos += field_len;
            let cell_linkage_info = data[pos];
            pos += 1;

            let need = |pos: usize, n: usize| -> anyhow::Result<()> {
                if pos + n > data.len() {
                    bail!("mosaic: truncated cell linkage");
                }
                Ok(())
            };
            let linkage = match cell_linkage_info {
                0x01 => {
                    need(pos, 2)?;
                    let l = CellLinkage::Bouquet {
                        bouquet_id: read_be_16(&data[pos..]),
                    };
                    pos += 2;
                    l
                }
                0x02 | 0x03 => {
                    need(pos, 6)?;
                    let l = CellLinkage::Service {
                        original_network_id: read_be_16(&data[pos..]),
                        transport_stream_id: read_be_16(&data[pos + 2..]),
                        service_id: read_be_16(&data[pos + 4..]),
                    };
                    pos += 6;
                    l
                }
                0x04 => {
                    need(pos, 8)?;
                    let l = CellLinkage::Event {
                        original_network_id: read_be_16(&data[pos..]),
                        transport_stream_id: read_be_16(&data[pos + 2..]),
                        service_id: read_be_16(&data[pos + 4..]),
                        event_id: read_be_16(&data[pos + 6..]),
                    };
                    pos += 8;
                    l
                }
                _ => CellLinkage::None,
            };

            d.cells.push(MosaicCell {
                logical_cell_id,
                presentation_info,
                elementary_cell_ids,
                linkage,
            });
        }

        Ok(d)
    }
}

#[derive(Debug, Clone)]
pub struct StreamIdentifierDescriptor {
    pub component_tag: u8,
}

impl StreamIdentifierDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() != 1 {
            bail!("stream_identifier: need exactly 1 byte");
        }
        Ok(StreamIdentifierDescriptor {
            component_tag: data[0],
        })
    }
}

#[derive(Debug, Clone)]
pub struct CaIdentifierDescriptor {
    pub ca_system_ids: Vec<u16>,
}

impl CaIdentifierDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("CA_identifier: empty");
        }
        Ok(CaIdentifierDescriptor {
            ca_system_ids: data.chunks_exact(2).map(read_be_16).collect(),
        })
    }
}

/// Genre nibbles per ARIB STD-B10 Annex H.
#[derive(Debug, Clone, Copy)]
pub struct ContentNibble {
    pub level_1: u8,
    pub level_2: u8,
    pub user_1: u8,
    pub user_2: u8,
}

#[derive(Debug, Clone)]
pub struct ContentDescriptor {
    pub nibbles: Vec<ContentNibble>,
}

impl ContentDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("content: empty");
        }
        let nibbles = data
            .chunks_exact(2)
            .map(|c| ContentNibble {
                level_1: (c[0] & 0xF0) >> 4,
                level_2: c[0] & 0x0F,
                user_1: (c[1] & 0xF0) >> 4,
                user_2: c[1] & 0x0F,
            })
            .collect();
        Ok(ContentDescriptor { nibbles })
    }
}

#[derive(Debug, Clone)]
pub struct ParentalRatingEntry {
    pub country_code: [u8; 3],
    pub rating: u8,
}

#[derive(Debug, Clone)]
pub struct ParentalRatingDescriptor {
    pub ratings: Vec<ParentalRatingEntry>,
}

impl ParentalRatingDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        let ratings = data
            .chunks_exact(4)
            .map(|c| ParentalRatingEntry {
                country_code: [c[0], c[1], c[2]],
                rating: c[3],
            })
            .collect();
        Ok(ParentalRatingDescriptor { ratings })
    }
}

#[derive(Debug, Clone)]
pub struct LocalTimeOffsetEntry {
    pub country_code: [u8; 3],
    pub country_region_id: u8,
    pub polarity: bool,
    /// BCD HHMM.
    pub local_time_offset: u16,
    /// 40-bit MJD + BCD time of the next change.
    pub time_of_change: u64,
    /// BCD HHMM.
    pub next_time_offset: u16,
}

#[derive(Debug, Clone)]
pub struct LocalTimeOffsetDescriptor {
    pub offsets: Vec<LocalTimeOffsetEntry>,
}

impl LocalTimeOffsetDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("local_time_offset: empty");
        }
        let offsets = data
            .chunks_exact(13)
            .map(|c| LocalTimeOffsetEntry {
                country_code: [c[0], c[1], c[2]],
                country_region_id: (c[3] & 0xFC) >> 2,
                polarity: c[3] & 0x01 != 0,
                local_time_offset: read_be_16(&c[4..]),
                time_of_change: read_bits(&c[6..], 0, 40),
                next_time_offset: read_be_16(&c[11..]),
            })
            .collect();
        Ok(LocalTimeOffsetDescriptor { offsets })
    }
}

#[derive(Debug, Clone)]
pub struct IntPlatformEntry {
    pub platform_id: u32,
    pub action_type: u8,
    pub int_versioning_flag: bool,
    pub int_version: u8,
}

/// data_broadcast_id descriptor (tag 0x66). `data_broadcast_id == 0x000B`
/// selects the IP/MAC notification form.
#[derive(Debug, Clone)]
pub struct DataBroadcastIdDescriptor {
    pub data_broadcast_id: u16,
    pub platforms: Vec<IntPlatformEntry>,
    pub id_selector_bytes: Vec<u8>,
}

impl DataBroadcastIdDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.len() < 2 {
            bail!("data_broadcast_id: need 2 bytes");
        }
        let data_broadcast_id = read_be_16(data);
        let mut platforms = Vec::new();
        let id_selector_bytes;

        if data_broadcast_id == 0x000B {
            if data.len() < 3 {
                bail!("data_broadcast_id: missing platform loop length");
            }
            let loop_len = data[2] as usize;
            if 3 + loop_len > data.len() {
                bail!("data_broadcast_id: platform loop overruns");
            }
            for c in data[3..3 + loop_len].chunks_exact(6) {
                platforms.push(IntPlatformEntry {
                    platform_id: read_bits(c, 0, 24) as u32,
                    action_type: c[3],
                    int_versioning_flag: c[4] & 0x20 != 0,
                    int_version: c[4] & 0x1F,
                });
            }
            id_selector_bytes = data[3 + loop_len..].to_vec();
        } else {
            id_selector_bytes = data[2..].to_vec();
        }

        Ok(DataBroadcastIdDescriptor {
            data_broadcast_id,
            platforms,
            id_selector_bytes,
        })
    }
}

/// Where hybrid (broadcast/broadband) content lives.
#[derive(Debug, Clone)]
pub enum HybridLocation {
    None,
    Component { component_tag: u8, module_id: u16 },
    Url(String),
}

#[derive(Debug, Clone)]
pub struct HybridInformationDescriptor {
    pub format: u8,
    pub location: HybridLocation,
}

impl HybridInformationDescriptor {
    pub fn parse(data: &[u8]) -> anyhow::Result<Self> {
        if data.is_empty() {
            bail!("hybrid_information: empty");
        }
        let has_location = data[0] & 0x80 != 0;
        let location_type = data[0] & 0x40 != 0;
        let format = (data[0] & 0x3C) >> 2;

        let location = if !has_location {
            HybridLocation::None
        } else if !location_type {
            if data.len() < 4 {
                bail!("hybrid_information: truncated component form");
            }
            HybridLocation::Component {
                component_tag: data[1],
                module_id: read_be_16(&data[2..]),
            }
        } else {
            if data.len() < 2 {
                bail!("hybrid_information: missing URL length");
            }
            let url_len = data[1] as usize;
            if 2 + url_len > data.len() {
                bail!("hybrid_information: truncated URL");
            }
            HybridLocation::Url(String::from_utf8_lossy(&data[2..2 + url_len]).into_owned())
        };

        Ok(HybridInformationDescriptor { format, location })
    }
}
