//! Ensemble configuration model built from the FIC

use crate::protection::ProtectionProfile;
use crate::{Error, TableKind};

/// Maximum number of services in an ensemble
pub const MAX_SERVICES: usize = 64;

/// Maximum number of service components in a configuration
pub const MAX_COMPONENTS: usize = 64;

/// Number of sub-channel identifiers
pub const MAX_SUB_CHANNELS: usize = 64;

/// Maximum number of announcement clusters in a configuration
pub const MAX_CLUSTERS: usize = 128;

/// Maximum number of FM alternative frequencies kept per service
pub const MAX_FM_FREQUENCIES: usize = 16;

/// Fixed-capacity arena whose slots are tagged in use or free
///
/// Storage is allocated once; a full arena rejects new entries with
/// [`Error::CapacityExceeded`].
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Slots<T, const N: usize> {
    /// Table reported on overflow
    kind: TableKind,
    /// Slots, `None` when free
    slots: Vec<Option<T>>,
}

impl<T, const N: usize> Slots<T, N> {
    /// Returns an empty arena.
    pub(crate) fn new(kind: TableKind) -> Self {
        Self {
            kind,
            slots: std::iter::repeat_with(|| None).take(N).collect(),
        }
    }

    /// Frees all slots.
    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Returns entry in given slot.
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Returns mutable entry in given slot.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Stores an entry in given slot, replacing any previous one.
    pub(crate) fn set(&mut self, index: usize, value: T) -> Result<(), Error> {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(Error::InvalidInput(format!(
                "Slot {index} out of range for {} table",
                self.kind
            ))),
        }
    }

    /// Stores an entry in the first free slot and returns its index.
    pub(crate) fn insert(&mut self, value: T) -> Result<usize, Error> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::CapacityExceeded {
                kind: self.kind,
                capacity: N,
            })?;
        self.slots[index] = Some(value);
        Ok(index)
    }

    /// Frees given slot and returns its entry.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Returns index of the first entry satisfying a predicate.
    pub(crate) fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(&mut pred))
    }

    /// Returns the first entry satisfying a predicate.
    pub(crate) fn find(&self, pred: impl FnMut(&T) -> bool) -> Option<&T> {
        self.position(pred).and_then(|index| self.get(index))
    }

    /// Returns the first mutable entry satisfying a predicate.
    pub(crate) fn find_mut(&mut self, pred: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.position(pred).and_then(|index| self.get_mut(index))
    }

    /// Returns iterator over entries in use with their slot indices.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
    }

    /// Returns iterator over mutable entries in use.
    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Returns number of slots in use.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Programme guide entry of a service
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct EpgEntry {
    /// Start time (minutes after midnight)
    pub time: u16,
    /// Programme title
    pub text: String,
    /// Programme description
    pub description: String,
}

/// Service of the ensemble
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Service {
    /// Service identifier (16 bits for programme services, 32 bits for data services)
    pub(crate) sid: u32,
    /// Label, space-trimmed
    pub(crate) label: String,
    /// Short label built from the character flag field
    pub(crate) short_label: String,
    /// Whether the label was received
    pub(crate) has_name: bool,
    /// Language code (FIG 0/17)
    pub(crate) language: u8,
    /// International programme type code (FIG 0/17)
    pub(crate) program_type: u8,
    /// FM alternative frequencies (kHz) from FIG 0/21
    pub(crate) fm_frequencies: Vec<u32>,
    /// Programme guide, kept sorted by time
    pub(crate) epg: Vec<EpgEntry>,
    /// Whether the service was handed out by a service list query
    pub(crate) shown: bool,
}

impl Service {
    /// Returns a service without label.
    pub(crate) fn new(sid: u32) -> Self {
        Self {
            sid,
            label: String::new(),
            short_label: String::new(),
            has_name: false,
            language: 0,
            program_type: 0,
            fm_frequencies: Vec::new(),
            epg: Vec::new(),
            shown: false,
        }
    }
}

/// Ensemble-wide information, kept across configuration changes
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Ensemble {
    /// Ensemble label, latched once
    pub(crate) name: Option<String>,
    /// Ensemble identifier
    pub(crate) eid: Option<u16>,
    /// Extended country code (FIG 0/9)
    pub(crate) ecc: Option<u8>,
    /// Local time offset in half hours (FIG 0/9)
    pub(crate) lto: i8,
    /// International table identifier (FIG 0/9)
    pub(crate) international_table: u8,
    /// Number of services announced by FIG 0/7
    pub(crate) service_count: Option<u8>,
    /// Services
    pub(crate) services: Slots<Service, MAX_SERVICES>,
}

impl Ensemble {
    /// Returns an empty ensemble.
    pub(crate) fn new() -> Self {
        Self {
            name: None,
            eid: None,
            ecc: None,
            lto: 0,
            international_table: 0,
            service_count: None,
            services: Slots::new(TableKind::Services),
        }
    }
}

/// Sub-channel of the MSC
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct SubChannel {
    /// Sub-channel identifier (0 to 63)
    pub id: u8,
    /// Start address in the CIF (capacity units)
    pub start_address: u16,
    /// Size (capacity units)
    pub size: u16,
    /// Whether the short (UEP table) form was used
    pub short_form: bool,
    /// Protection profile and level
    pub protection: ProtectionProfile,
    /// Bit rate (kbit/s)
    pub bit_rate: u16,
    /// Language code (FIG 0/5)
    pub language: u8,
    /// FEC scheme for packet mode (FIG 0/14)
    pub fec_scheme: u8,
}

/// Transport mechanism of a service component
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy)]
pub enum TransportMechanism {
    /// Stream mode audio
    StreamAudio,
    /// Stream mode data
    StreamData,
    /// Packet mode data
    PacketData,
}

/// Service component of a configuration
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct ServiceComponent {
    /// Service identifier
    pub(crate) sid: u32,
    /// Position in the FIG 0/2 component list
    pub(crate) component_nr: u8,
    /// Transport mechanism
    pub(crate) transport: TransportMechanism,
    /// Sub-channel carrying the component
    pub(crate) sub_channel_id: Option<u8>,
    /// Audio service component type (stream audio) or data service component type
    pub(crate) component_type: u8,
    /// Whether the component is the primary one of its service
    pub(crate) primary: bool,
    /// Service component identifier (packet mode)
    pub(crate) scid: Option<u16>,
    /// Service component identifier within the service (FIG 0/8)
    pub(crate) sc_ids: Option<u8>,
    /// Packet address (FIG 0/3)
    pub(crate) packet_address: u16,
    /// Whether data groups are used (FIG 0/3)
    pub(crate) data_groups: bool,
    /// User application type (FIG 0/13)
    pub(crate) app_type: Option<u16>,
    /// Language code (FIG 0/5 long form)
    pub(crate) language: u8,
    /// Component label (FIG 1/4)
    pub(crate) label: Option<String>,
}

impl ServiceComponent {
    /// Returns a component with defaults for the optional fields.
    pub(crate) fn new(sid: u32, component_nr: u8, transport: TransportMechanism) -> Self {
        Self {
            sid,
            component_nr,
            transport,
            sub_channel_id: None,
            component_type: 0,
            primary: false,
            scid: None,
            sc_ids: None,
            packet_address: 0,
            data_groups: false,
            app_type: None,
            language: 0,
            label: None,
        }
    }
}

/// Announcement cluster
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct Cluster {
    /// Cluster identifier
    pub(crate) id: u8,
    /// Announcement support flags
    pub(crate) flags: u16,
    /// Member services
    pub(crate) services: Vec<u32>,
    /// Whether an announcement is running
    pub(crate) announcing: bool,
}

/// Multiplex configuration, of which a current and a next one are held
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct DabConfig {
    /// Sub-channels indexed by identifier
    pub(crate) sub_channels: Slots<SubChannel, MAX_SUB_CHANNELS>,
    /// Service components
    pub(crate) components: Slots<ServiceComponent, MAX_COMPONENTS>,
    /// Announcement clusters
    pub(crate) clusters: Slots<Cluster, MAX_CLUSTERS>,
}

impl DabConfig {
    /// Returns an empty configuration.
    pub(crate) fn new() -> Self {
        Self {
            sub_channels: Slots::new(TableKind::SubChannels),
            components: Slots::new(TableKind::Components),
            clusters: Slots::new(TableKind::Clusters),
        }
    }

    /// Frees all entries.
    pub(crate) fn reset(&mut self) {
        self.sub_channels.clear();
        self.components.clear();
        self.clusters.clear();
    }

    /// Returns whether any component belongs to a service.
    pub(crate) fn has_service(&self, sid: u32) -> bool {
        self.components.find(|c| c.sid == sid).is_some()
    }
}

/// Service list entry
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ServiceInfo {
    /// Service identifier
    pub sid: u32,
    /// Label
    pub label: String,
    /// Short label
    pub short_label: String,
    /// Whether the primary component is stream audio
    pub is_audio: bool,
    /// Whether the service is listed for the first time
    pub is_new: bool,
}

/// Everything needed to start decoding an audio service
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AudioServiceData {
    /// Service identifier
    pub sid: u32,
    /// Service label
    pub label: String,
    /// Position of the component in its service
    pub component_nr: u8,
    /// Sub-channel carrying the audio
    pub sub_channel: SubChannel,
    /// Audio service component type (`0` for MPEG-1 Layer II, `63` for DAB+)
    pub asc_ty: u8,
    /// Language code
    pub language: u8,
    /// International programme type code
    pub program_type: u8,
    /// First FM alternative frequency (kHz)
    pub fm_frequency: Option<u32>,
}

/// Everything needed to start decoding a packet mode data service
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PacketServiceData {
    /// Service identifier
    pub sid: u32,
    /// Service label
    pub label: String,
    /// Position of the component in its service
    pub component_nr: u8,
    /// Sub-channel carrying the packets
    pub sub_channel: SubChannel,
    /// Data service component type
    pub dsc_ty: u8,
    /// Packet address
    pub packet_address: u16,
    /// Whether data groups are used
    pub data_groups: bool,
    /// User application type
    pub app_type: Option<u16>,
}

#[cfg(test)]
mod tests_of_slots {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut slots = Slots::<u32, 3>::new(TableKind::Clusters);
        assert_eq!(slots.insert(10).unwrap(), 0);
        assert_eq!(slots.insert(11).unwrap(), 1);
        assert_eq!(slots.insert(12).unwrap(), 2);
        assert!(matches!(
            slots.insert(13),
            Err(Error::CapacityExceeded {
                kind: TableKind::Clusters,
                capacity: 3
            })
        ));
        assert_eq!(slots.remove(1), Some(11));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.insert(14).unwrap(), 1);
        assert_eq!(slots.position(|&v| v == 12), Some(2));
        assert_eq!(slots.find(|&v| v > 13), Some(&14));
        slots.clear();
        assert_eq!(slots.iter().count(), 0);
    }

    #[test]
    fn test_set() {
        let mut slots = Slots::<u8, 4>::new(TableKind::SubChannels);
        slots.set(3, 7).unwrap();
        assert!(slots.set(4, 7).is_err());
        assert_eq!(slots.get(3), Some(&7));
        assert_eq!(slots.get(2), None);
        if let Some(v) = slots.get_mut(3) {
            *v = 8;
        }
        assert_eq!(slots.iter().collect::<Vec<_>>(), [(3, &8)]);
    }
}
