//! State change notifications for UIs and other control-thread observers.

use std::path::PathBuf;

use crossbeam_channel::{Sender, TrySendError};

// -------------------------------------------------------------------------------------------------

/// Events sent from the synthesizer to observers, when slots or the selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthEvent {
    /// A sample got decoded and published into the given slot.
    SampleLoaded { slot: usize, path: PathBuf },
    /// The given slot got emptied.
    SampleUnloaded { slot: usize },
    /// The current slot changed, either via the sample store or via the `slotNum` parameter.
    SlotSelected { slot: usize },
}

// -------------------------------------------------------------------------------------------------

/// Send an event without ever blocking: full or disconnected channels drop the event.
pub(crate) fn send_event(sender: Option<&Sender<SynthEvent>>, event: SynthEvent) {
    if let Some(sender) = sender {
        match sender.try_send(event) {
            Ok(()) => (),
            Err(TrySendError::Full(event)) => {
                log::warn!("Synth event channel is full. Dropping event {event:?}");
            }
            Err(TrySendError::Disconnected(_)) => {
                // observer is gone: nothing to notify
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sends_never_fail() {
        send_event(None, SynthEvent::SlotSelected { slot: 0 });

        let (sender, receiver) = crossbeam_channel::bounded(1);
        send_event(Some(&sender), SynthEvent::SlotSelected { slot: 1 });
        // full: dropped
        send_event(Some(&sender), SynthEvent::SlotSelected { slot: 2 });
        assert_eq!(
            receiver.try_iter().collect::<Vec<_>>(),
            vec![SynthEvent::SlotSelected { slot: 1 }]
        );

        // disconnected: dropped
        drop(receiver);
        send_event(Some(&sender), SynthEvent::SampleUnloaded { slot: 1 });
    }
}
