//! FIG type 1: labels

use tracing::{debug, info, trace};

use super::charsets::{decode_label, short_label, Charset};
use super::model::Service;
use super::{bits, FibState};
use crate::events::DabEvent;

/// Number of bytes in a label
const LABEL_BYTES: usize = 16;

/// Label with its character flag field
struct Label<'a> {
    /// Raw label bytes
    raw: &'a [u8],
    /// Character flag field selecting the short label
    flags: u16,
    /// Character set
    charset: Charset,
}

impl Label<'_> {
    /// Returns decoded label.
    fn text(&self) -> String {
        decode_label(self.raw, self.charset)
    }

    /// Returns decoded short label.
    fn short(&self) -> String {
        short_label(self.raw, self.flags, self.charset)
    }
}

/// Returns label following an identifier field of `id_bytes` bytes.
fn label_after(data: &[u8], id_bytes: usize, charset: Charset) -> Option<Label<'_>> {
    let raw = data.get(id_bytes .. id_bytes + LABEL_BYTES)?;
    let flags: u16 = bits(data, 8 * (id_bytes + LABEL_BYTES), 16)?;
    Some(Label {
        raw,
        flags,
        charset,
    })
}

impl FibState {
    /// Handles the body of a FIG 1 (type byte included).
    pub(super) fn process_fig1(&mut self, fig: &[u8]) {
        let Some(&type_byte) = fig.first() else {
            return;
        };
        let charset = Charset::from_field(type_byte >> 4);
        let extension = type_byte & 0x07;
        if type_byte & 0x08 != 0 {
            trace!(extension, "skipping FIG 1 for other ensemble");
            return;
        }
        let data = &fig[1 ..];
        let handled = match extension {
            0 => self.fig1_ensemble_label(data, charset),
            1 => self.fig1_programme_service_label(data, charset),
            4 => self.fig1_component_label(data, charset),
            5 => self.fig1_data_service_label(data, charset),
            6 => {
                trace!("X-PAD user application label");
                Some(())
            }
            _ => {
                trace!(extension, "FIG 1 extension not handled");
                Some(())
            }
        };
        if handled.is_none() {
            trace!(extension, "truncated FIG 1");
        }
    }

    /// FIG 1/0: ensemble label, latched once.
    fn fig1_ensemble_label(&mut self, data: &[u8], charset: Charset) -> Option<()> {
        let eid: u16 = bits(data, 0, 16)?;
        let label = label_after(data, 2, charset)?;
        if self.ensemble.name.is_some() {
            return Some(());
        }
        let name = label.text();
        info!(eid, %name, "ensemble found");
        self.ensemble.name = Some(name.clone());
        self.ensemble.eid = Some(eid);
        self.emit(DabEvent::EnsembleName { eid, name });
        Some(())
    }

    /// FIG 1/1: programme service label.
    fn fig1_programme_service_label(&mut self, data: &[u8], charset: Charset) -> Option<()> {
        let sid: u32 = bits(data, 0, 16)?;
        let label = label_after(data, 2, charset)?;
        self.add_service_label(sid, &label);
        Some(())
    }

    /// FIG 1/5: data service label.
    fn fig1_data_service_label(&mut self, data: &[u8], charset: Charset) -> Option<()> {
        let sid: u32 = bits(data, 0, 32)?;
        let label = label_after(data, 4, charset)?;
        self.add_service_label(sid, &label);
        Some(())
    }

    /// FIG 1/4: service component label.
    fn fig1_component_label(&mut self, data: &[u8], charset: Charset) -> Option<()> {
        let data_service: u8 = bits(data, 0, 1)?;
        let sc_ids: u8 = bits(data, 4, 4)?;
        let sid_bytes = if data_service == 1 { 4 } else { 2 };
        let sid: u32 = bits(data, 8, 8 * sid_bytes)?;
        let label = label_after(data, 1 + sid_bytes, charset)?;
        let active = self.active;
        if let Some(component) = self.configs[active]
            .components
            .find_mut(|c| c.sid == sid && c.sc_ids == Some(sc_ids))
        {
            component.label = Some(label.text());
        }
        Some(())
    }

    /// Creates the service `sid` or sets its label if still missing.
    fn add_service_label(&mut self, sid: u32, label: &Label<'_>) {
        if let Some(service) = self.ensemble.services.find_mut(|s| s.sid == sid) {
            if !service.has_name {
                service.label = label.text();
                service.short_label = label.short();
                service.has_name = true;
            }
            return;
        }
        let mut service = Service::new(sid);
        service.label = label.text();
        service.short_label = label.short();
        service.has_name = true;
        let event = DabEvent::ServiceAdded {
            sid,
            label: service.label.clone(),
        };
        match self.ensemble.services.insert(service) {
            Ok(_) => {
                debug!(sid, "service added");
                self.emit(event);
            }
            Err(error) => self.report_overflow(&error),
        }
    }
}
