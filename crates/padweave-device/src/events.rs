use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Capacity of the hot-plug queue. Bursts beyond it collapse into the
/// pending re-enumeration anyway.
const HOTPLUG_CAPACITY: usize = 32;

/// Notification from a platform watcher that the device set may differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugEvent {
    DeviceListChanged,
    Arrived { instance_id: Box<str> },
    Removed { instance_id: Box<str> },
}

/// Producer side, cloned into every platform watcher thread.
#[derive(Debug, Clone)]
pub struct HotplugSender(Sender<HotplugEvent>);

/// Consumer side, drained by the session before each poll.
#[derive(Debug)]
pub struct HotplugReceiver(Receiver<HotplugEvent>);

#[must_use]
pub fn hotplug_channel() -> (HotplugSender, HotplugReceiver) {
    let (tx, rx) = bounded(HOTPLUG_CAPACITY);
    (HotplugSender(tx), HotplugReceiver(rx))
}

impl HotplugSender {
    /// Queues an event without blocking. A full queue already guarantees a
    /// re-enumeration, so the event is dropped.
    pub fn notify(&self, event: HotplugEvent) -> bool {
        match self.0.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::trace!("Hot-plug queue full, dropping {event:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl HotplugReceiver {
    /// Drains every pending event and reports whether any of them asks for
    /// a re-enumeration.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        let mut refresh = false;
        for event in self.0.try_iter() {
            log::debug!("Hot-plug: {event:?}");
            refresh = true;
        }
        refresh
    }
}
