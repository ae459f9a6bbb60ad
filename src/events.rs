//! Notifications raised while decoding the FIC
//!
//! Decoders hold an optional [`EventSender`]; a missing or disconnected receiver is not an error.

use std::sync::mpsc::{Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::TableKind;

/// Local and UTC time carried by FIG 0/10
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Default, Deserialize, Serialize)]
pub struct ClockTime {
    /// Local year
    pub year: u16,
    /// Local month (`1` to `12`)
    pub month: u8,
    /// Local day of month
    pub day: u8,
    /// Local hour
    pub hour: u8,
    /// Local minute
    pub minute: u8,
    /// UTC hour
    pub utc_hour: u8,
    /// UTC minute
    pub utc_minute: u8,
    /// UTC second, zero when only the short time form is transmitted
    pub utc_second: u8,
}

/// Events reported by the FIC decoders
#[derive(Clone, PartialEq, Debug)]
pub enum DabEvent {
    /// Ensemble label received for the first time
    EnsembleName {
        /// Ensemble identifier
        eid: u16,
        /// Ensemble label
        name: String,
    },
    /// Service label received for a new service
    ServiceAdded {
        /// Service identifier
        sid: u32,
        /// Service label
        label: String,
    },
    /// Number of services announced by FIG 0/7
    ServiceCount(u8),
    /// Multiplex reconfiguration took effect
    ConfigurationChanged,
    /// Transmitted time changed
    ClockTime(ClockTime),
    /// Announcement started on a service
    StartAnnouncement {
        /// Service identifier
        sid: u32,
        /// Announcement switching flags
        flags: u16,
        /// Sub-channel carrying the announcement
        sub_channel_id: u8,
    },
    /// Announcement ended on a service
    StopAnnouncement {
        /// Service identifier
        sid: u32,
    },
    /// A bounded table is full and an entry was dropped
    CapacityExceeded {
        /// Table that overflowed
        kind: TableKind,
        /// Capacity of the table
        capacity: usize,
    },
    /// Number of FIBs passing their CRC, out of the last ten
    FicQuality(u8),
    /// Bit error rate of the FIC Viterbi decoder over the last reporting interval
    FicBitErrorRate(f64),
}

/// Sending half of the event channel
pub type EventSender = Sender<DabEvent>;

/// Returns both halves of an event channel.
#[must_use]
pub fn channel() -> (EventSender, Receiver<DabEvent>) {
    std::sync::mpsc::channel()
}

/// Sends an event if a receiver is listening.
pub(crate) fn emit(sender: Option<&EventSender>, event: DabEvent) {
    if let Some(sender) = sender {
        if sender.send(event).is_err() {
            tracing::trace!("event receiver disconnected");
        }
    }
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;

    #[test]
    fn test_emit() {
        let (sender, receiver) = channel();
        emit(Some(&sender), DabEvent::ConfigurationChanged);
        emit(None, DabEvent::ServiceCount(3));
        assert_eq!(receiver.try_recv().unwrap(), DabEvent::ConfigurationChanged);
        assert!(receiver.try_recv().is_err());
        drop(receiver);
        emit(Some(&sender), DabEvent::FicQuality(10));
    }
}
