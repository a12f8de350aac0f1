//! Descriptor loop decoding per ITU-T Rec. H.222.0 §2.6 and ARIB STD-B10 §6.
//!
//! Descriptors are flat `tag, length, body` records; a loop is decoded by
//! dispatching on the tag and advancing `2 + length` regardless of whether
//! the body parsed. Unknown tags are kept as raw bytes, malformed bodies are
//! dropped, and the loop itself never fails.

pub mod arib;
pub mod dvb;
pub mod mpeg;

pub use arib::*;
pub use dvb::*;
pub use mpeg::*;

/// One decoded descriptor; `Unknown` keeps tags outside the recognized set.
#[derive(Debug, Clone)]
pub enum Descriptor {
    // ITU-T Rec. H.222.0
    VideoStream(VideoStreamDescriptor),
    AudioStream(AudioStreamDescriptor),
    Hierarchy(HierarchyDescriptor),
    Registration(RegistrationDescriptor),
    DataStreamAlignment(DataStreamAlignmentDescriptor),
    TargetBackgroundGrid(TargetBackgroundGridDescriptor),
    VideoWindow(VideoWindowDescriptor),
    ConditionalAccess(CaDescriptor),
    Iso639Language(Iso639LanguageDescriptor),
    SystemClock(SystemClockDescriptor),
    MultiplexBufferUtilization(MultiplexBufferUtilizationDescriptor),
    Copyright(CopyrightDescriptor),
    MaximumBitrate(MaximumBitrateDescriptor),
    Mpeg4Audio(Mpeg4AudioDescriptor),
    AvcVideo(AvcVideoDescriptor),
    AvcTimingAndHrd(AvcTimingAndHrdDescriptor),
    Mpeg4AudioExtension(Mpeg4AudioExtensionDescriptor),
    Hevc(HevcDescriptor),

    // DVB (ETSI EN 300 468) shared by ARIB STD-B10
    NetworkName(NetworkNameDescriptor),
    ServiceList(ServiceListDescriptor),
    Stuffing(StuffingDescriptor),
    SatelliteDeliverySystem(SatelliteDeliverySystemDescriptor),
    BouquetName(BouquetNameDescriptor),
    Service(ServiceDescriptor),
    CountryAvailability(CountryAvailabilityDescriptor),
    Linkage(LinkageDescriptor),
    NvodReference(NvodReferenceDescriptor),
    TimeShiftedService(TimeShiftedServiceDescriptor),
    ShortEvent(ShortEventDescriptor),
    ExtendedEvent(ExtendedEventDescriptor),
    TimeShiftedEvent(TimeShiftedEventDescriptor),
    Component(ComponentDescriptor),
    Mosaic(MosaicDescriptor),
    StreamIdentifier(StreamIdentifierDescriptor),
    CaIdentifier(CaIdentifierDescriptor),
    Content(ContentDescriptor),
    ParentalRating(ParentalRatingDescriptor),
    LocalTimeOffset(LocalTimeOffsetDescriptor),
    DataBroadcastId(DataBroadcastIdDescriptor),
    HybridInformation(HybridInformationDescriptor),

    // ARIB STD-B10
    HierarchicalTransmission(HierarchicalTransmissionDescriptor),
    DigitalCopyControl(DigitalCopyControlDescriptor),
    AudioComponent(AudioComponentDescriptor),
    Hyperlink(HyperlinkDescriptor),
    TargetRegion(TargetRegionDescriptor),
    DataContent(DataContentDescriptor),
    VideoDecodeControl(VideoDecodeControlDescriptor),
    TsInformation(TsInformationDescriptor),
    ExtendedBroadcaster(ExtendedBroadcasterDescriptor),
    LogoTransmission(LogoTransmissionDescriptor),
    Series(SeriesDescriptor),
    EventGroup(EventGroupDescriptor),
    SiParameter(SiParameterDescriptor),
    BroadcasterName(BroadcasterNameDescriptor),
    ComponentGroup(ComponentGroupDescriptor),
    SiPrimeTs(SiPrimeTsDescriptor),
    BoardInformation(BoardInformationDescriptor),
    LdtLinkage(LdtLinkageDescriptor),
    ConnectedTransmission(ConnectedTransmissionDescriptor),
    ContentAvailability(ContentAvailabilityDescriptor),
    ServiceGroup(ServiceGroupDescriptor),
    AreaBroadcastingInformation(AreaBroadcastingInformationDescriptor),
    AccessControl(AccessControlDescriptor),
    CarouselCompatibleComposite(CarouselCompatibleCompositeDescriptor),
    TerrestrialDeliverySystem(TerrestrialDeliverySystemDescriptor),
    PartialReception(PartialReceptionDescriptor),
    EmergencyInformation(EmergencyInformationDescriptor),
    DataComponent(DataComponentDescriptor),
    SystemManagement(SystemManagementDescriptor),

    Unknown { tag: u8, data: Vec<u8> },
}

impl Descriptor {
    /// Decodes one descriptor body. `data` excludes the tag/length header.
    ///
    /// Tags 0x00 and 0x01 are reserved and always fail.
    pub fn parse(tag: u8, data: &[u8]) -> anyhow::Result<Descriptor> {
        use Descriptor as D;
        Ok(match tag {
            0x00 | 0x01 => anyhow::bail!("reserved descriptor tag {tag:#04x}"),
            0x02 => D::VideoStream(VideoStreamDescriptor::parse(data)?),
            0x03 => D::AudioStream(AudioStreamDescriptor::parse(data)?),
            0x04 => D::Hierarchy(HierarchyDescriptor::parse(data)?),
            0x05 => D::Registration(RegistrationDescriptor::parse(data)?),
            0x06 => D::DataStreamAlignment(DataStreamAlignmentDescriptor::parse(data)?),
            0x07 => D::TargetBackgroundGrid(TargetBackgroundGridDescriptor::parse(data)?),
            0x08 => D::VideoWindow(VideoWindowDescriptor::parse(data)?),
            0x09 => D::ConditionalAccess(CaDescriptor::parse(data)?),
            0x0A => D::Iso639Language(Iso639LanguageDescriptor::parse(data)?),
            0x0B => D::SystemClock(SystemClockDescriptor::parse(data)?),
            0x0C => D::MultiplexBufferUtilization(MultiplexBufferUtilizationDescriptor::parse(data)?),
            0x0D => D::Copyright(CopyrightDescriptor::parse(data)?),
            0x0E => D::MaximumBitrate(MaximumBitrateDescriptor::parse(data)?),
            0x1C => D::Mpeg4Audio(Mpeg4AudioDescriptor::parse(data)?),
            0x28 => D::AvcVideo(AvcVideoDescriptor::parse(data)?),
            0x2A => D::AvcTimingAndHrd(AvcTimingAndHrdDescriptor::parse(data)?),
            0x2E => D::Mpeg4AudioExtension(Mpeg4AudioExtensionDescriptor::parse(data)?),
            0x38 => D::Hevc(HevcDescriptor::parse(data)?),

            0x40 => D::NetworkName(NetworkNameDescriptor::parse(data)?),
            0x41 => D::ServiceList(ServiceListDescriptor::parse(data)?),
            0x42 => D::Stuffing(StuffingDescriptor::parse(data)?),
            0x43 => D::SatelliteDeliverySystem(SatelliteDeliverySystemDescriptor::parse(data)?),
            0x47 => D::BouquetName(BouquetNameDescriptor::parse(data)?),
            0x48 => D::Service(ServiceDescriptor::parse(data)?),
            0x49 => D::CountryAvailability(CountryAvailabilityDescriptor::parse(data)?),
            0x4A => D::Linkage(LinkageDescriptor::parse(data)?),
            0x4B => D::NvodReference(NvodReferenceDescriptor::parse(data)?),
            0x4C => D::TimeShiftedService(TimeShiftedServiceDescriptor::parse(data)?),
            0x4D => D::ShortEvent(ShortEventDescriptor::parse(data)?),
            0x4E => D::ExtendedEvent(ExtendedEventDescriptor::parse(data)?),
            0x4F => D::TimeShiftedEvent(TimeShiftedEventDescriptor::parse(data)?),
            0x50 => D::Component(ComponentDescriptor::parse(data)?),
            0x51 => D::Mosaic(MosaicDescriptor::parse(data)?),
            0x52 => D::StreamIdentifier(StreamIdentifierDescriptor::parse(data)?),
            0x53 => D::CaIdentifier(CaIdentifierDescriptor::parse(data)?),
            0x54 => D::Content(ContentDescriptor::parse(data)?),
            0x55 => D::ParentalRating(ParentalRatingDescriptor::parse(data)?),
            0x58 => D::LocalTimeOffset(LocalTimeOffsetDescriptor::parse(data)?),
            0x66 => D::DataBroadcastId(DataBroadcastIdDescriptor::parse(data)?),
            0x68 => D::HybridInformation(HybridInformationDescriptor::parse(data)?),

            0xC0 => D::HierarchicalTransmission(HierarchicalTransmissionDescriptor::parse(data)?),
            0xC1 => D::DigitalCopyControl(DigitalCopyControlDescriptor::parse(data)?),
            0xC4 => D::AudioComponent(AudioComponentDescriptor::parse(data)?),
            0xC5 => D::Hyperlink(HyperlinkDescriptor::parse(data)?),
            0xC6 => D::TargetRegion(TargetRegionDescriptor::parse(data)?),
            0xC7 => D::DataContent(DataContentDescriptor::parse(data)?),
            0xC8 => D::VideoDecodeControl(VideoDecodeControlDescriptor::parse(data)?),
            0xCD => D::TsInformation(TsInformationDescriptor::parse(data)?),
            0xCE => D::ExtendedBroadcaster(ExtendedBroadcasterDescriptor::parse(data)?),
            0xCF => D::LogoTransmission(LogoTransmissionDescriptor::parse(data)?),
            0xD5 => D::Series(SeriesDescriptor::parse(data)?),
            0xD6 => D::EventGroup(EventGroupDescriptor::parse(data)?),
            0xD7 => D::SiParameter(SiParameterDescriptor::parse(data)?),
            0xD8 => D::BroadcasterName(BroadcasterNameDescriptor::parse(data)?),
            0xD9 => D::ComponentGroup(ComponentGroupDescriptor::parse(data)?),
            0xDA => D::SiPrimeTs(SiPrimeTsDescriptor::parse(data)?),
            0xDB => D::BoardInformation(BoardInformationDescriptor::parse(data)?),
            0xDC => D::LdtLinkage(LdtLinkageDescriptor::parse(data)?),
            0xDD => D::ConnectedTransmission(ConnectedTransmissionDescriptor::parse(data)?),
            0xDE => D::ContentAvailability(ContentAvailabilityDescriptor::parse(data)?),
            0xE0 => D::ServiceGroup(ServiceGroupDescriptor::parse(data)?),
            0xE1 => D::AreaBroadcastingInformation(AreaBroadcastingInformationDescriptor::parse(data)?),
            0xF6 => D::AccessControl(AccessControlDescriptor::parse(data)?),
            0xF7 => D::CarouselCompatibleComposite(CarouselCompatibleCompositeDescriptor::parse(data)?),
            0xFA => D::TerrestrialDeliverySystem(TerrestrialDeliverySystemDescriptor::parse(data)?),
            0xFB => D::PartialReception(PartialReceptionDescriptor::parse(data)?),
            0xFC => D::EmergencyInformation(EmergencyInformationDescriptor::parse(data)?),
            0xFD => D::DataComponent(DataComponentDescriptor::parse(data)?),
            0xFE => D::SystemManagement(SystemManagementDescriptor::parse(data)?),

            _ => D::Unknown {
                tag,
                data: data.to_vec(),
            },
        })
    }
}

/// Result of decoding a descriptor loop.
#[derive(Debug, Clone, Default)]
pub struct DescriptorLoop {
    pub entries: Vec<Descriptor>,
    /// Tags outside the recognized set (also kept as `Unknown` entries).
    pub unknown: u32,
    /// Descriptors skipped because their body failed to parse.
    pub dropped: u32,
}

impl DescriptorLoop {
    /// Walks `tag, length` records across `buf`. A record whose advertised
    /// length runs past the loop end drops the remainder of the loop.
    pub fn parse(buf: &[u8]) -> DescriptorLoop {
        let mut out = DescriptorLoop::default();
        let mut pos = 0usize;

        while pos + 2 <= buf.len() {
            let tag = buf[pos];
            let len = buf[pos + 1] as usize;
            if pos + 2 + len > buf.len() {
                log::debug!(
                    "descriptor {tag:#04x} length {len} overruns loop of {} bytes",
                    buf.len()
                );
                out.dropped += 1;
                break;
            }
            let body = &buf[pos + 2..pos + 2 + len];
            match Descriptor::parse(tag, body) {
                Ok(d) => {
                    if matches!(d, Descriptor::Unknown { .. }) {
                        out.unknown += 1;
                    }
                    out.entries.push(d);
                }
                Err(e) => {
                    log::debug!("descriptor {tag:#04x} dropped: {e}");
                    out.dropped += 1;
                }
            }
            pos += 2 + len;
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_closure_over_mixed_tags() {
        // stream_identifier + unknown private tag + CA identifier
        let buf = [
            0x52, 0x01, 0x07, // stream_identifier, component_tag 7
            0x91, 0x02, 0xAB, 0xCD, // unrecognized
            0x53, 0x02, 0x00, 0x05, // CA_identifier, system 0x0005
        ];
        let dl = DescriptorLoop::parse(&buf);
        assert_eq!(dl.len(), 3);
        assert_eq!(dl.unknown, 1);
        assert_eq!(dl.dropped, 0);
        assert!(matches!(dl.entries[0], Descriptor::StreamIdentifier(ref d) if d.component_tag == 7));
        assert!(matches!(dl.entries[1], Descriptor::Unknown { tag: 0x91, .. }));
    }

    #[test]
    fn reserved_tag_is_dropped() {
        let buf = [0x00, 0x01, 0xFF, 0x52, 0x01, 0x09];
        let dl = DescriptorLoop::parse(&buf);
        assert_eq!(dl.dropped, 1);
        assert_eq!(dl.len(), 1);
    }

    #[test]
    fn overrunning_length_stops_loop() {
        let buf = [0x52, 0x10, 0x00];
        let dl = DescriptorLoop::parse(&buf);
        assert!(dl.is_empty());
        assert_eq!(dl.dropped, 1);
    }

    #[test]
    fn malformed_body_does_not_stop_loop() {
        // stream_identifier with wrong length, then a valid one
        let buf = [0x52, 0x02, 0x07, 0x08, 0x52, 0x01, 0x0A];
        let dl = DescriptorLoop::parse(&buf);
        assert_eq!(dl.dropped, 1);
        assert_eq!(dl.len(), 1);
        assert!(matches!(dl.entries[0], Descriptor::StreamIdentifier(ref d) if d.component_tag == 0x0A));
    }
}
