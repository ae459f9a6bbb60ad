//! FIG type 0: multiplex configuration information

use tracing::{debug, info, trace, warn};

use super::model::{
    Cluster, ServiceComponent, SubChannel, TransportMechanism, MAX_FM_FREQUENCIES,
};
use super::{bits, FibState};
use crate::events::{ClockTime, DabEvent};
use crate::protection::{uep_table_entry, ProtectionProfile};

/// Fields of the FIG 0 type byte used by the handlers
#[derive(Clone, Copy, Debug)]
pub(super) struct Fig0Header {
    /// C/N flag: the FIG describes the next configuration
    pub(super) next: bool,
    /// P/D flag: service identifiers are 32 bits long
    pub(super) data_services: bool,
}

impl Fig0Header {
    /// Returns service identifier length in bits.
    fn sid_bits(self) -> usize {
        if self.data_services {
            32
        } else {
            16
        }
    }
}

/// Handler of one repeated structure; returns the byte offset of the next one.
type Handler = fn(&mut FibState, &[u8], usize, Fig0Header) -> Option<usize>;

impl FibState {
    /// Dispatches the body of a FIG 0 (type byte included) to its extension handler.
    pub(super) fn process_fig0(&mut self, fig: &[u8]) {
        let Some(&type_byte) = fig.first() else {
            return;
        };
        let header = Fig0Header {
            next: type_byte & 0x80 != 0,
            data_services: type_byte & 0x20 != 0,
        };
        let extension = type_byte & 0x1F;
        if type_byte & 0x40 != 0 {
            trace!(extension, "skipping FIG 0 for other ensemble");
            return;
        }
        let handler: Handler = match extension {
            0 => FibState::fig0_ensemble,
            1 => FibState::fig0_sub_channels,
            2 => FibState::fig0_services,
            3 => FibState::fig0_packet_components,
            5 => FibState::fig0_language,
            7 => FibState::fig0_configuration_info,
            8 => FibState::fig0_global_definition,
            9 => FibState::fig0_country,
            10 => FibState::fig0_date_time,
            13 => FibState::fig0_user_applications,
            14 => FibState::fig0_fec,
            17 => FibState::fig0_programme_type,
            18 => FibState::fig0_announcement_support,
            19 => FibState::fig0_announcement_switching,
            21 => FibState::fig0_frequency_info,
            _ => {
                trace!(extension, "FIG 0 extension not handled");
                return;
            }
        };
        let data = &fig[1 ..];
        let mut offset = 0;
        while offset < data.len() {
            match handler(self, data, offset, header) {
                Some(next) if next > offset => offset = next,
                _ => {
                    trace!(extension, offset, "truncated FIG 0 field");
                    break;
                }
            }
        }
    }

    /// FIG 0/0: ensemble identifier, change flags and CIF count.
    fn fig0_ensemble(&mut self, data: &[u8], _offset: usize, _header: Fig0Header) -> Option<usize> {
        let eid: u16 = bits(data, 0, 16)?;
        let change_flag: u8 = bits(data, 16, 2)?;
        let alarm: u8 = bits(data, 18, 1)?;
        let cif_count_hi: u16 = bits(data, 19, 5)?;
        let cif_count_lo: u16 = bits(data, 24, 8)?;
        self.ensemble.eid = Some(eid);
        self.alarm = alarm == 1;
        self.cif_count = Some(250 * cif_count_hi + cif_count_lo);
        if change_flag == 0 && self.prev_change_flag == 3 {
            self.swap_configs();
        }
        self.prev_change_flag = change_flag;
        Some(data.len())
    }

    /// Puts the next configuration into force.
    pub(super) fn swap_configs(&mut self) {
        self.active ^= 1;
        self.configs[1 - self.active].reset();
        self.cleanup_service_list();
        info!(
            sub_channels = self.current().sub_channels.len(),
            components = self.current().components.len(),
            "configuration change took effect"
        );
        self.emit(DabEvent::ConfigurationChanged);
    }

    /// Frees services with no component in the current configuration.
    fn cleanup_service_list(&mut self) {
        let orphans: Vec<usize> = self
            .ensemble
            .services
            .iter()
            .filter(|(_, service)| !self.configs[self.active].has_service(service.sid))
            .map(|(index, _)| index)
            .collect();
        for index in orphans {
            if let Some(service) = self.ensemble.services.remove(index) {
                debug!(sid = service.sid, label = %service.label, "service removed");
            }
        }
    }

    /// FIG 0/1: sub-channel organisation.
    fn fig0_sub_channels(&mut self, data: &[u8], offset: usize, header: Fig0Header) -> Option<usize> {
        let bit = 8 * offset;
        let id: u8 = bits(data, bit, 6)?;
        let start_address: u16 = bits(data, bit + 6, 10)?;
        let long_form: u8 = bits(data, bit + 16, 1)?;
        let (next, description) = if long_form == 1 {
            let option: u8 = bits(data, bit + 17, 3)?;
            let level: u8 = bits(data, bit + 20, 2)?;
            let size: u16 = bits(data, bit + 22, 10)?;
            let description = ProtectionProfile::from_long_form(option, level).and_then(|profile| {
                profile
                    .eep_bit_rate(usize::from(size))
                    .map(|bit_rate| (profile, bit_rate, size))
            });
            (offset + 4, description)
        } else {
            let index: usize = bits(data, bit + 18, 6)?;
            let description = uep_table_entry(index).map(|entry| {
                (ProtectionProfile::Uep(entry.level), entry.bit_rate, entry.size)
            });
            (offset + 3, description)
        };
        let config = self.config_mut(header.next);
        if config.sub_channels.get(usize::from(id)).is_some() {
            return Some(next);
        }
        match description {
            Ok((protection, bit_rate, size)) => {
                let sub_channel = SubChannel {
                    id,
                    start_address,
                    size,
                    short_form: long_form == 0,
                    protection,
                    bit_rate,
                    language: 0,
                    fec_scheme: 0,
                };
                if let Err(error) = config.sub_channels.set(usize::from(id), sub_channel) {
                    warn!(%error, "sub-channel not recorded");
                } else {
                    debug!(id, start_address, size, %protection, bit_rate, "sub-channel");
                }
            }
            Err(error) => warn!(id, %error, "sub-channel ignored"),
        }
        Some(next)
    }

    /// FIG 0/2: service organisation.
    fn fig0_services(&mut self, data: &[u8], offset: usize, header: Fig0Header) -> Option<usize> {
        let mut bit = 8 * offset;
        let sid: u32 = bits(data, bit, header.sid_bits())?;
        bit += header.sid_bits();
        let num_components: u8 = bits(data, bit + 4, 4)?;
        bit += 8;
        for component_nr in 0 .. num_components {
            let tmid: u8 = bits(data, bit, 2)?;
            let primary = bits::<u8>(data, bit + 14, 1)? == 1;
            match tmid {
                0 | 1 => {
                    let component_type: u8 = bits(data, bit + 2, 6)?;
                    let sub_channel_id: u8 = bits(data, bit + 8, 6)?;
                    if tmid == 0 {
                        self.bind_audio_service(
                            header.next,
                            sid,
                            component_nr,
                            sub_channel_id,
                            component_type,
                            primary,
                        );
                    } else {
                        self.bind_stream_data_service(
                            header.next,
                            sid,
                            component_nr,
                            sub_channel_id,
                            component_type,
                            primary,
                        );
                    }
                }
                3 => {
                    let scid: u16 = bits(data, bit + 2, 12)?;
                    self.bind_packet_service(header.next, sid, component_nr, scid, primary);
                }
                _ => trace!(sid, "FIDC component skipped"),
            }
            bit += 16;
        }
        Some(bit / 8)
    }

    /// Returns slot of the component `(sid, component_nr)`, allocating it if needed.
    fn upsert_component(
        &mut self,
        next: bool,
        sid: u32,
        component_nr: u8,
        transport: TransportMechanism,
    ) -> Option<&mut ServiceComponent> {
        let config = self.config_mut(next);
        let found = config
            .components
            .position(|c| c.sid == sid && c.component_nr == component_nr);
        let index = match found {
            Some(index) => index,
            None => match config
                .components
                .insert(ServiceComponent::new(sid, component_nr, transport))
            {
                Ok(index) => index,
                Err(error) => {
                    self.report_overflow(&error);
                    return None;
                }
            },
        };
        self.config_mut(next).components.get_mut(index)
    }

    /// Binds a stream mode audio component to its service.
    pub(super) fn bind_audio_service(
        &mut self,
        next: bool,
        sid: u32,
        component_nr: u8,
        sub_channel_id: u8,
        asc_ty: u8,
        primary: bool,
    ) {
        let transport = TransportMechanism::StreamAudio;
        if let Some(component) = self.upsert_component(next, sid, component_nr, transport) {
            component.transport = transport;
            component.sub_channel_id = Some(sub_channel_id);
            component.component_type = asc_ty;
            component.primary = primary;
        }
    }

    /// Binds a stream mode data component to its service.
    fn bind_stream_data_service(
        &mut self,
        next: bool,
        sid: u32,
        component_nr: u8,
        sub_channel_id: u8,
        dsc_ty: u8,
        primary: bool,
    ) {
        let transport = TransportMechanism::StreamData;
        if let Some(component) = self.upsert_component(next, sid, component_nr, transport) {
            component.transport = transport;
            component.sub_channel_id = Some(sub_channel_id);
            component.component_type = dsc_ty;
            component.primary = primary;
        }
    }

    /// Binds a packet mode component to its service; its sub-channel follows from FIG 0/3.
    pub(super) fn bind_packet_service(
        &mut self,
        next: bool,
        sid: u32,
        component_nr: u8,
        scid: u16,
        primary: bool,
    ) {
        let transport = TransportMechanism::PacketData;
        if let Some(component) = self.upsert_component(next, sid, component_nr, transport) {
            component.transport = transport;
            component.scid = Some(scid);
            component.primary = primary;
        }
    }

    /// FIG 0/3: packet mode service components.
    fn fig0_packet_components(
        &mut self,
        data: &[u8],
        offset: usize,
        header: Fig0Header,
    ) -> Option<usize> {
        let bit = 8 * offset;
        let scid: u16 = bits(data, bit, 12)?;
        let scca_flag: u8 = bits(data, bit + 15, 1)?;
        let dg_flag: u8 = bits(data, bit + 16, 1)?;
        let dsc_ty: u8 = bits(data, bit + 18, 6)?;
        let sub_channel_id: u8 = bits(data, bit + 24, 6)?;
        let packet_address: u16 = bits(data, bit + 30, 10)?;
        let next = offset + if scca_flag == 1 { 7 } else { 5 };
        let config = self.config_mut(header.next);
        match config.components.find_mut(|c| c.scid == Some(scid)) {
            Some(component) => {
                component.component_type = dsc_ty;
                component.sub_channel_id = Some(sub_channel_id);
                component.packet_address = packet_address;
                component.data_groups = dg_flag == 0;
            }
            None => trace!(scid, "packet component not yet bound"),
        }
        Some(next)
    }

    /// FIG 0/5: service component language.
    fn fig0_language(&mut self, data: &[u8], offset: usize, header: Fig0Header) -> Option<usize> {
        let bit = 8 * offset;
        let long_form: u8 = bits(data, bit, 1)?;
        let config = self.config_mut(header.next);
        if long_form == 0 {
            let fic: u8 = bits(data, bit + 1, 1)?;
            let sub_channel_id: usize = bits(data, bit + 2, 6)?;
            let language: u8 = bits(data, bit + 8, 8)?;
            // FIC data channels share the id space but are not MSC sub-channels
            if fic == 0 {
                if let Some(sub_channel) = config.sub_channels.get_mut(sub_channel_id) {
                    sub_channel.language = language;
                }
            }
            Some(offset + 2)
        } else {
            let scid: u16 = bits(data, bit + 4, 12)?;
            let language: u8 = bits(data, bit + 16, 8)?;
            if let Some(component) = config.components.find_mut(|c| c.scid == Some(scid)) {
                component.language = language;
            }
            Some(offset + 3)
        }
    }

    /// FIG 0/7: configuration information.
    fn fig0_configuration_info(
        &mut self,
        data: &[u8],
        _offset: usize,
        _header: Fig0Header,
    ) -> Option<usize> {
        let services: u8 = bits(data, 0, 6)?;
        let reconfiguration_count: u16 = bits(data, 6, 10)?;
        if self.ensemble.service_count != Some(services) {
            debug!(services, reconfiguration_count, "service count");
            self.ensemble.service_count = Some(services);
            self.emit(DabEvent::ServiceCount(services));
        }
        Some(data.len())
    }

    /// FIG 0/8: service component global definition.
    fn fig0_global_definition(
        &mut self,
        data: &[u8],
        offset: usize,
        header: Fig0Header,
    ) -> Option<usize> {
        let mut bit = 8 * offset;
        let sid: u32 = bits(data, bit, header.sid_bits())?;
        bit += header.sid_bits();
        let extension_flag: u8 = bits(data, bit, 1)?;
        let sc_ids: u8 = bits(data, bit + 4, 4)?;
        let long_form: u8 = bits(data, bit + 8, 1)?;
        let config = self.config_mut(header.next);
        let component = if long_form == 0 {
            let sub_channel_id: u8 = bits(data, bit + 10, 6)?;
            bit += 16;
            config
                .components
                .find_mut(|c| c.sid == sid && c.sub_channel_id == Some(sub_channel_id))
        } else {
            let scid: u16 = bits(data, bit + 12, 12)?;
            bit += 24;
            config
                .components
                .find_mut(|c| c.sid == sid && c.scid == Some(scid))
        };
        if let Some(component) = component {
            component.sc_ids = Some(sc_ids);
        }
        if extension_flag == 1 {
            bit += 8;
        }
        Some(bit / 8)
    }

    /// FIG 0/9: country, local time offset and international table.
    fn fig0_country(&mut self, data: &[u8], _offset: usize, _header: Fig0Header) -> Option<usize> {
        let negative: u8 = bits(data, 2, 1)?;
        let half_hours: i8 = bits(data, 3, 5)?;
        let ecc: u8 = bits(data, 8, 8)?;
        let international_table: u8 = bits(data, 16, 8)?;
        self.ensemble.lto = if negative == 1 { -half_hours } else { half_hours };
        self.ensemble.ecc = Some(ecc);
        self.ensemble.international_table = international_table;
        Some(data.len())
    }

    /// FIG 0/10: date and time.
    fn fig0_date_time(&mut self, data: &[u8], _offset: usize, _header: Fig0Header) -> Option<usize> {
        let mjd: u32 = bits(data, 1, 17)?;
        let long_form: u8 = bits(data, 20, 1)?;
        let utc_hour: u8 = bits(data, 21, 5)?;
        let utc_minute: u8 = bits(data, 26, 6)?;
        let utc_second: u8 = if long_form == 1 {
            bits(data, 32, 6)?
        } else {
            0
        };
        let mut day = i64::from(mjd);
        let mut minutes = 60 * i64::from(utc_hour)
            + i64::from(utc_minute)
            + 30 * i64::from(self.ensemble.lto);
        if minutes < 0 {
            minutes += 1440;
            day -= 1;
        } else if minutes >= 1440 {
            minutes -= 1440;
            day += 1;
        }
        let (year, month, day) = mjd_to_date(day);
        let time = ClockTime {
            year,
            month,
            day,
            hour: u8::try_from(minutes / 60).ok()?,
            minute: u8::try_from(minutes % 60).ok()?,
            utc_hour,
            utc_minute,
            utc_second,
        };
        if self.clock != Some(time) {
            self.clock = Some(time);
            self.emit(DabEvent::ClockTime(time));
        }
        Some(data.len())
    }

    /// FIG 0/13: user application information.
    fn fig0_user_applications(
        &mut self,
        data: &[u8],
        offset: usize,
        header: Fig0Header,
    ) -> Option<usize> {
        let mut bit = 8 * offset;
        let sid: u32 = bits(data, bit, header.sid_bits())?;
        bit += header.sid_bits();
        let sc_ids: u8 = bits(data, bit, 4)?;
        let num_apps: u8 = bits(data, bit + 4, 4)?;
        bit += 8;
        let mut first_app = None;
        for _ in 0 .. num_apps {
            let app_type: u16 = bits(data, bit, 11)?;
            let data_len: usize = bits(data, bit + 11, 5)?;
            first_app.get_or_insert(app_type);
            bit += 16 + 8 * data_len;
        }
        if let Some(app_type) = first_app {
            let config = self.config_mut(header.next);
            let component = config.components.find_mut(|c| {
                c.sid == sid && (c.sc_ids == Some(sc_ids) || (sc_ids == 0 && c.primary))
            });
            if let Some(component) = component {
                component.app_type = Some(app_type);
            }
        }
        Some(bit / 8)
    }

    /// FIG 0/14: FEC sub-channel organisation.
    fn fig0_fec(&mut self, data: &[u8], offset: usize, header: Fig0Header) -> Option<usize> {
        let bit = 8 * offset;
        let sub_channel_id: usize = bits(data, bit, 6)?;
        let fec_scheme: u8 = bits(data, bit + 6, 2)?;
        if let Some(sub_channel) = self
            .config_mut(header.next)
            .sub_channels
            .get_mut(sub_channel_id)
        {
            sub_channel.fec_scheme = fec_scheme;
        }
        Some(offset + 1)
    }

    /// FIG 0/17: programme type.
    fn fig0_programme_type(
        &mut self,
        data: &[u8],
        offset: usize,
        _header: Fig0Header,
    ) -> Option<usize> {
        let mut bit = 8 * offset;
        let sid: u32 = bits(data, bit, 16)?;
        let language_flag: u8 = bits(data, bit + 18, 1)?;
        let complementary_flag: u8 = bits(data, bit + 19, 1)?;
        bit += 24;
        let language = if language_flag == 1 {
            let language: u8 = bits(data, bit, 8)?;
            bit += 8;
            Some(language)
        } else {
            None
        };
        let program_type: u8 = bits(data, bit + 3, 5)?;
        bit += 8;
        if complementary_flag == 1 {
            bit += 8;
        }
        if let Some(service) = self.ensemble.services.find_mut(|s| s.sid == sid) {
            service.program_type = program_type;
            if let Some(language) = language {
                service.language = language;
            }
        }
        Some(bit / 8)
    }

    /// FIG 0/18: announcement support.
    fn fig0_announcement_support(
        &mut self,
        data: &[u8],
        offset: usize,
        header: Fig0Header,
    ) -> Option<usize> {
        let mut bit = 8 * offset;
        let sid: u32 = bits(data, bit, 16)?;
        let flags: u16 = bits(data, bit + 16, 16)?;
        let num_clusters: usize = bits(data, bit + 35, 5)?;
        bit += 40;
        for _ in 0 .. num_clusters {
            let id: u8 = bits(data, bit, 8)?;
            bit += 8;
            let config = self.config_mut(header.next);
            if let Some(cluster) = config.clusters.find_mut(|c| c.id == id) {
                cluster.flags = flags;
                if !cluster.services.contains(&sid) {
                    cluster.services.push(sid);
                }
                continue;
            }
            let cluster = Cluster {
                id,
                flags,
                services: vec![sid],
                announcing: false,
            };
            if let Err(error) = config.clusters.insert(cluster) {
                self.report_overflow(&error);
            }
        }
        Some(bit / 8)
    }

    /// FIG 0/19: announcement switching.
    fn fig0_announcement_switching(
        &mut self,
        data: &[u8],
        offset: usize,
        _header: Fig0Header,
    ) -> Option<usize> {
        let mut bit = 8 * offset;
        let id: u8 = bits(data, bit, 8)?;
        let flags: u16 = bits(data, bit + 8, 16)?;
        let region_flag: u8 = bits(data, bit + 25, 1)?;
        let sub_channel_id: u8 = bits(data, bit + 26, 6)?;
        bit += 32;
        if region_flag == 1 {
            bit += 8;
        }
        let active = self.active;
        let Some(cluster) = self.configs[active].clusters.find_mut(|c| c.id == id) else {
            return Some(bit / 8);
        };
        let starting = flags != 0 && !cluster.announcing;
        let stopping = flags == 0 && cluster.announcing;
        if !starting && !stopping {
            return Some(bit / 8);
        }
        cluster.announcing = starting;
        let services = cluster.services.clone();
        for sid in services {
            let event = if starting {
                DabEvent::StartAnnouncement {
                    sid,
                    flags,
                    sub_channel_id,
                }
            } else {
                DabEvent::StopAnnouncement { sid }
            };
            self.emit(event);
        }
        debug!(cluster = id, flags, starting, "announcement switched");
        Some(bit / 8)
    }

    /// FIG 0/21: frequency information; FM alternative frequencies are kept.
    fn fig0_frequency_info(
        &mut self,
        data: &[u8],
        offset: usize,
        _header: Fig0Header,
    ) -> Option<usize> {
        let list_len: usize = bits(data, 8 * offset + 11, 5)?;
        let end = (offset + 2 + list_len).min(data.len());
        let mut pos = offset + 2;
        while pos + 3 <= end {
            let bit = 8 * pos;
            let id: u32 = bits(data, bit, 16)?;
            let range_modulation: u8 = bits(data, bit + 16, 4)?;
            let freq_list_len: usize = bits(data, bit + 21, 3)?;
            let freq_list = data.get(pos + 3 .. (pos + 3 + freq_list_len).min(end))?;
            if range_modulation == 0b1000 {
                self.add_fm_frequencies(id, freq_list);
            }
            pos += 3 + freq_list_len;
        }
        Some(offset + 2 + list_len)
    }

    /// Records FM frequencies (87.6 to 107.9 MHz in 100 kHz steps) of a service.
    fn add_fm_frequencies(&mut self, sid: u32, codes: &[u8]) {
        let Some(service) = self.ensemble.services.find_mut(|s| s.sid == sid) else {
            return;
        };
        for &code in codes.iter().filter(|&&code| (1 ..= 204).contains(&code)) {
            let frequency = 87_500 + 100 * u32::from(code);
            if service.fm_frequencies.len() < MAX_FM_FREQUENCIES
                && !service.fm_frequencies.contains(&frequency)
            {
                service.fm_frequencies.push(frequency);
            }
        }
    }
}

/// Returns Gregorian `(year, month, day)` of a modified Julian date.
pub(super) fn mjd_to_date(mjd: i64) -> (u16, u8, u8) {
    let j = mjd + 2_400_001 + 32_044;
    let g = j / 146_097;
    let dg = j % 146_097;
    let c = (dg / 36_524 + 1) * 3 / 4;
    let dc = dg - c * 36_524;
    let b = dc / 1_461;
    let db = dc % 1_461;
    let a = (db / 365 + 1) * 3 / 4;
    let da = db - a * 365;
    let y = g * 400 + c * 100 + b * 4 + a;
    let m = (da * 5 + 308) / 153 - 2;
    let d = da - (m + 4) * 153 / 5 + 122;
    let year = y - 4_800 + (m + 2) / 12;
    let month = (m + 2) % 12 + 1;
    let day = d + 1;
    (
        u16::try_from(year).unwrap_or(0),
        u8::try_from(month).unwrap_or(0),
        u8::try_from(day).unwrap_or(0),
    )
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;

    #[test]
    fn test_mjd_to_date() {
        assert_eq!(mjd_to_date(51_544), (2000, 1, 1));
        assert_eq!(mjd_to_date(51_604), (2000, 3, 1));
        assert_eq!(mjd_to_date(60_000), (2023, 2, 25));
        assert_eq!(mjd_to_date(45_000), (1982, 1, 31));
    }
}
