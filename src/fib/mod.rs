//! Fast information block decoder
//!
//! Valid FIBs are scanned for fast information groups (FIGs), which build up the ensemble
//! configuration. Two configurations are held: the current one, and the next one announced by
//! FIGs with the C/N flag set. The next configuration takes effect when the change flags of
//! FIG 0/0 go from `3` back to `0`.
//!
//! All state sits behind one mutex, so queries may come from any thread while FIBs are decoded.
//!
//! # Examples
//!
//! ```
//! use dabcore::fib::FibDecoder;
//!
//! let decoder = FibDecoder::new(None);
//! let mut fib = [0xFFu8; 30];
//! // FIG 0/0: ensemble 0x4FFF, no change announced, CIF count 0
//! fib[.. 6].copy_from_slice(&[0x05, 0x00, 0x4F, 0xFF, 0x00, 0x00]);
//! decoder.process_fib(&fib, 0);
//! assert_eq!(decoder.ensemble_id(), Some(0x4FFF));
//! assert_eq!(decoder.country_id(), Some(4));
//! assert!(!decoder.sync_reached());
//! ```

mod charsets;
mod fig0;
mod fig1;
mod model;

use std::sync::{Mutex, MutexGuard, PoisonError};

use bitvec::prelude::*;
use itertools::Itertools;
use tracing::{debug, info, trace, warn};

pub use charsets::{decode_label, short_label, Charset};
pub use model::{
    AudioServiceData, EpgEntry, PacketServiceData, ServiceInfo, SubChannel, TransportMechanism,
    MAX_CLUSTERS, MAX_COMPONENTS, MAX_SERVICES, MAX_SUB_CHANNELS,
};

use crate::events::{emit, ClockTime, DabEvent, EventSender};
use crate::Error;
use model::{DabConfig, Ensemble, ServiceComponent};

/// Number of FIB bytes holding FIGs
pub const FIB_DATA_BYTES: usize = 30;

/// FIG header marking the end of the useful part of a FIB
const END_MARKER: u8 = 0xFF;

/// Returns `len` bits (1 to 32) read MSB first from `offset` bits into `data`.
fn bits<T: TryFrom<u32>>(data: &[u8], offset: usize, len: usize) -> Option<T> {
    if len == 0 || len > 32 {
        return None;
    }
    let field = data.view_bits::<Msb0>().get(offset .. offset + len)?;
    T::try_from(field.load_be::<u32>()).ok()
}

/// Mutable state of the decoder
#[derive(Debug)]
struct FibState {
    /// Ensemble-wide information
    ensemble: Ensemble,
    /// Current and next configurations
    configs: [DabConfig; 2],
    /// Index of the current configuration
    active: usize,
    /// Change flags of the last FIG 0/0
    prev_change_flag: u8,
    /// CIF count of the last FIG 0/0
    cif_count: Option<u16>,
    /// Alarm announcements flag of the last FIG 0/0
    alarm: bool,
    /// Last reported time
    clock: Option<ClockTime>,
    /// Whether FIBs are accepted
    connected: bool,
    /// Event channel
    events: Option<EventSender>,
}

impl FibState {
    /// Returns fresh state.
    fn new(events: Option<EventSender>) -> Self {
        Self {
            ensemble: Ensemble::new(),
            configs: [DabConfig::new(), DabConfig::new()],
            active: 0,
            prev_change_flag: 0,
            cif_count: None,
            alarm: false,
            clock: None,
            connected: true,
            events,
        }
    }

    /// Returns configuration in force.
    fn current(&self) -> &DabConfig {
        &self.configs[self.active]
    }

    /// Returns configuration addressed by the C/N flag.
    fn config_mut(&mut self, next: bool) -> &mut DabConfig {
        let index = if next { 1 - self.active } else { self.active };
        &mut self.configs[index]
    }

    /// Sends an event.
    fn emit(&self, event: DabEvent) {
        emit(self.events.as_ref(), event);
    }

    /// Logs a table overflow and reports it as an event.
    fn report_overflow(&self, error: &Error) {
        warn!(%error, "entry dropped");
        if let Error::CapacityExceeded { kind, capacity } = *error {
            self.emit(DabEvent::CapacityExceeded { kind, capacity });
        }
    }

    /// Scans the FIGs of a FIB.
    fn process_fib(&mut self, fib: &[u8], fic_index: usize) {
        let mut offset = 0;
        while offset < fib.len() {
            let header = fib[offset];
            if header == END_MARKER {
                break;
            }
            let fig_type = header >> 5;
            let length = usize::from(header & 0x1F);
            let Some(body) = fib.get(offset + 1 .. offset + 1 + length) else {
                debug!(fic_index, offset, length, "FIG runs past end of FIB");
                break;
            };
            match fig_type {
                0 => self.process_fig0(body),
                1 => self.process_fig1(body),
                2 => trace!("FIG 2 label ignored"),
                _ => trace!(fig_type, fic_index, "FIG type not handled"),
            }
            offset += 1 + length;
        }
    }

    /// Returns the audio component of a service: the primary one if it exists, else the first.
    fn audio_component(&self, sid: u32) -> Option<&ServiceComponent> {
        self.current()
            .components
            .iter()
            .map(|(_, c)| c)
            .filter(|c| c.sid == sid && c.transport == TransportMechanism::StreamAudio)
            .min_by_key(|c| (!c.primary, c.component_nr))
    }
}

/// Decoder of the FIBs of one ensemble
#[derive(Debug)]
pub struct FibDecoder {
    /// State shared between the decoding thread and queries
    state: Mutex<FibState>,
}

impl FibDecoder {
    /// Returns decoder ready to accept FIBs.
    ///
    /// # Parameters
    ///
    /// - `events`: Channel for notifications, if any.
    #[must_use]
    pub fn new(events: Option<EventSender>) -> Self {
        Self {
            state: Mutex::new(FibState::new(events)),
        }
    }

    /// Locks the state; a panic on another thread leaves the data usable.
    fn lock(&self) -> MutexGuard<'_, FibState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the ensemble and both configurations and starts accepting FIBs.
    pub fn connect_channel(&self) {
        let mut state = self.lock();
        let events = state.events.take();
        *state = FibState::new(events);
        debug!("channel connected");
    }

    /// Stops accepting FIBs and clears the ensemble; no FIB is processed after this returns.
    pub fn disconnect_channel(&self) {
        let mut state = self.lock();
        let events = state.events.take();
        *state = FibState::new(events);
        state.connected = false;
        debug!("channel disconnected");
    }

    /// Decodes one FIB whose CRC has been checked.
    ///
    /// # Parameters
    ///
    /// - `fib`: FIB bytes; only the first 30 are read, so the CRC may be included.
    ///
    /// - `fic_index`: Index of the FIC block within its transmission frame.
    pub fn process_fib(&self, fib: &[u8], fic_index: usize) {
        let Some(fib) = fib.get(.. FIB_DATA_BYTES) else {
            debug!(len = fib.len(), "FIB too short");
            return;
        };
        let mut state = self.lock();
        if state.connected {
            state.process_fib(fib, fic_index);
        }
    }

    /// Returns whether the ensemble label has been received.
    #[must_use]
    pub fn sync_reached(&self) -> bool {
        self.lock().ensemble.name.is_some()
    }

    /// Returns ensemble label.
    #[must_use]
    pub fn ensemble_name(&self) -> Option<String> {
        self.lock().ensemble.name.clone()
    }

    /// Returns ensemble identifier.
    #[must_use]
    pub fn ensemble_id(&self) -> Option<u16> {
        self.lock().ensemble.eid
    }

    /// Returns country identifier (first nibble of the ensemble identifier).
    #[must_use]
    pub fn country_id(&self) -> Option<u8> {
        self.ensemble_id().map(|eid| eid.to_be_bytes()[0] >> 4)
    }

    /// Returns extended country code.
    #[must_use]
    pub fn ecc(&self) -> Option<u8> {
        self.lock().ensemble.ecc
    }

    /// Returns local time offset in half hours.
    #[must_use]
    pub fn local_time_offset(&self) -> i8 {
        self.lock().ensemble.lto
    }

    /// Returns international table identifier.
    #[must_use]
    pub fn international_table(&self) -> u8 {
        self.lock().ensemble.international_table
    }

    /// Returns CIF count of the last FIG 0/0.
    #[must_use]
    pub fn cif_count(&self) -> Option<u16> {
        self.lock().cif_count
    }

    /// Returns whether alarm announcements are enabled.
    #[must_use]
    pub fn alarm(&self) -> bool {
        self.lock().alarm
    }

    /// Returns last received time.
    #[must_use]
    pub fn clock_time(&self) -> Option<ClockTime> {
        self.lock().clock
    }

    /// Returns number of services announced by FIG 0/7.
    #[must_use]
    pub fn service_count(&self) -> Option<u8> {
        self.lock().ensemble.service_count
    }

    /// Returns labelled services sorted by label.
    #[must_use]
    pub fn get_services(&self) -> Vec<ServiceInfo> {
        let mut state = self.lock();
        let FibState {
            ensemble,
            configs,
            active,
            ..
        } = &mut *state;
        let current = &configs[*active];
        ensemble
            .services
            .values_mut()
            .filter(|service| service.has_name)
            .map(|service| {
                let is_new = !service.shown;
                service.shown = true;
                let is_audio = current
                    .components
                    .find(|c| c.sid == service.sid && c.transport == TransportMechanism::StreamAudio)
                    .is_some();
                ServiceInfo {
                    sid: service.sid,
                    label: service.label.clone(),
                    short_label: service.short_label.clone(),
                    is_audio,
                    is_new,
                }
            })
            .sorted_by(|a, b| a.label.cmp(&b.label))
            .collect()
    }

    /// Returns announcement types supported by a service (FIG 0/18 flags of its clusters).
    #[must_use]
    pub fn announcement_support(&self, sid: u32) -> u16 {
        self.lock()
            .current()
            .clusters
            .iter()
            .filter(|(_, cluster)| cluster.services.contains(&sid))
            .fold(0, |flags, (_, cluster)| flags | cluster.flags)
    }

    /// Returns identifier of the service with given label.
    #[must_use]
    pub fn get_sid(&self, label: &str) -> Option<u32> {
        self.lock()
            .ensemble
            .services
            .find(|s| s.has_name && s.label == label)
            .map(|s| s.sid)
    }

    /// Returns sub-channel carrying the primary stream of a service.
    #[must_use]
    pub fn get_sub_channel_id(&self, sid: u32) -> Option<u8> {
        let state = self.lock();
        state
            .current()
            .components
            .iter()
            .map(|(_, c)| c)
            .filter(|c| c.sid == sid && c.sub_channel_id.is_some())
            .min_by_key(|c| (!c.primary, c.component_nr))
            .and_then(|c| c.sub_channel_id)
    }

    /// Returns what is needed to decode the audio of a service.
    #[must_use]
    pub fn get_data_for_audio_service(&self, sid: u32) -> Option<AudioServiceData> {
        let state = self.lock();
        let component = state.audio_component(sid)?;
        let sub_channel = *state
            .current()
            .sub_channels
            .get(usize::from(component.sub_channel_id?))?;
        let service = state.ensemble.services.find(|s| s.sid == sid);
        Some(AudioServiceData {
            sid,
            label: service.map(|s| s.label.clone()).unwrap_or_default(),
            component_nr: component.component_nr,
            sub_channel,
            asc_ty: component.component_type,
            language: [component.language, sub_channel.language]
                .into_iter()
                .find(|&language| language != 0)
                .or(service.map(|s| s.language))
                .unwrap_or(0),
            program_type: service.map_or(0, |s| s.program_type),
            fm_frequency: service.and_then(|s| s.fm_frequencies.first().copied()),
        })
    }

    /// Returns what is needed to decode a packet mode component of a service.
    #[must_use]
    pub fn get_data_for_packet_service(
        &self,
        sid: u32,
        component_nr: u8,
    ) -> Option<PacketServiceData> {
        let state = self.lock();
        let component = state.current().components.find(|c| {
            c.sid == sid
                && c.component_nr == component_nr
                && c.transport == TransportMechanism::PacketData
        })?;
        let sub_channel = *state
            .current()
            .sub_channels
            .get(usize::from(component.sub_channel_id?))?;
        let label = component.label.clone().or_else(|| {
            state
                .ensemble
                .services
                .find(|s| s.sid == sid)
                .map(|s| s.label.clone())
        });
        Some(PacketServiceData {
            sid,
            label: label.unwrap_or_default(),
            component_nr,
            sub_channel,
            dsc_ty: component.component_type,
            packet_address: component.packet_address,
            data_groups: component.data_groups,
            app_type: component.app_type,
        })
    }

    /// Adds or replaces the programme guide entry of a service at given time.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is not known.
    pub fn set_epg_data(
        &self,
        sid: u32,
        time: u16,
        text: &str,
        description: &str,
    ) -> Result<(), Error> {
        let mut state = self.lock();
        let service = state
            .ensemble
            .services
            .find_mut(|s| s.sid == sid)
            .ok_or_else(|| Error::InvalidInput(format!("Service {sid:#x} is not known")))?;
        let entry = EpgEntry {
            time,
            text: text.to_string(),
            description: description.to_string(),
        };
        match service.epg.binary_search_by_key(&time, |e| e.time) {
            Ok(index) => service.epg[index] = entry,
            Err(index) => service.epg.insert(index, entry),
        }
        Ok(())
    }

    /// Returns programme guide of a service, sorted by time.
    #[must_use]
    pub fn get_time_table(&self, sid: u32) -> Vec<EpgEntry> {
        self.lock()
            .ensemble
            .services
            .find(|s| s.sid == sid)
            .map(|s| s.epg.clone())
            .unwrap_or_default()
    }

    /// Returns programme guide of the service with given label.
    #[must_use]
    pub fn get_time_table_by_name(&self, label: &str) -> Vec<EpgEntry> {
        self.get_sid(label)
            .map(|sid| self.get_time_table(sid))
            .unwrap_or_default()
    }

    /// Puts the next configuration into force without waiting for FIG 0/0.
    pub fn force_configuration_change(&self) {
        info!("configuration change forced");
        self.lock().swap_configs();
    }
}
