//! The control-thread side of the synthesizer: sample slots, options and session state.

use std::{path::Path, sync::Arc, time::Duration};

use crossbeam_channel::Sender;
use crossbeam_queue::ArrayQueue;

use crate::{
    controls::ControlParameters,
    error::Error,
    event::SynthEvent,
    processor::{ProcessorMessage, PublishedState, SynthProcessor},
    sample::Sample,
    smoother::SmoothingState,
    state::{StateElement, SynthState},
    store::{SampleStore, MAX_SAMPLES},
};

// -------------------------------------------------------------------------------------------------

/// Options to configure a [`Synthesizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthOptions {
    /// Number of sample slots. By default [`MAX_SAMPLES`].
    pub slot_count: usize,
    /// Maximum duration of samples loaded via [`Synthesizer::load`]. By default 55 seconds.
    pub max_sample_length: Duration,
    /// Capacity of the control-to-render message queue. By default 16.
    pub message_queue_size: usize,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            slot_count: MAX_SAMPLES,
            max_sample_length: Duration::from_secs(55),
            message_queue_size: 16,
        }
    }
}

impl SynthOptions {
    pub fn slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    pub fn max_sample_length(mut self, max_sample_length: Duration) -> Self {
        self.max_sample_length = max_sample_length;
        self
    }

    pub fn message_queue_size(mut self, message_queue_size: usize) -> Self {
        self.message_queue_size = message_queue_size;
        self
    }

    /// Validate all parameters. Returns `Error::ParameterError` on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if self.slot_count == 0 || self.slot_count > MAX_SAMPLES {
            return Err(Error::ParameterError(format!(
                "slot count must be in range [1, {MAX_SAMPLES}], but is {}",
                self.slot_count
            )));
        }
        if self.max_sample_length.is_zero() {
            return Err(Error::ParameterError(
                "max sample length must be > 0".to_string(),
            ));
        }
        if self.message_queue_size == 0 {
            return Err(Error::ParameterError(
                "message queue size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Control-thread handle of the sample playback engine.
///
/// Loads and unloads samples, selects slots and saves or restores session state. Rendering
/// happens in the [`SynthProcessor`] which gets created along with the synthesizer and is
/// meant to be moved to the audio thread. Neither side ever waits for the other.
pub struct Synthesizer {
    store: SampleStore,
    options: SynthOptions,
    message_queue: Arc<ArrayQueue<ProcessorMessage>>,
    published_state: Arc<PublishedState>,
}

impl Synthesizer {
    /// Create a new synthesizer and its render-thread processor.
    ///
    /// When an `event_sender` is given, slot loads, unloads and selection changes are
    /// reported through it. Events get dropped when the channel is full.
    pub fn new(
        sample_rate: u32,
        options: SynthOptions,
        event_sender: Option<Sender<SynthEvent>>,
    ) -> Result<(Self, SynthProcessor), Error> {
        options.validate()?;
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "sample rate must be > 0".to_string(),
            ));
        }
        let store = SampleStore::new(
            options.slot_count,
            options.max_sample_length,
            event_sender.clone(),
        )?;
        let message_queue = Arc::new(ArrayQueue::new(options.message_queue_size));
        let published_state = Arc::new(PublishedState::new(SmoothingState::default(), 0));
        let processor = SynthProcessor::new(
            store.table(),
            sample_rate,
            Arc::clone(&message_queue),
            Arc::clone(&published_state),
            event_sender,
        );
        log::info!(
            "Created synthesizer with {} slots at {sample_rate} Hz",
            options.slot_count
        );
        let synth = Self {
            store,
            options,
            message_queue,
            published_state,
        };
        Ok((synth, processor))
    }

    pub fn options(&self) -> &SynthOptions {
        &self.options
    }

    /// Read-only access to the sample slots.
    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Mutable access to the sample slots.
    pub fn store_mut(&mut self) -> &mut SampleStore {
        &mut self.store
    }

    /// Load a file into the first free slot, using the configured max sample length, and
    /// select it. See [`SampleStore::load_file`].
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, Error> {
        self.store.load_file(path, None, true)
    }

    /// Smoothing state as of the last rendered block.
    pub fn smoothing_state(&self) -> SmoothingState {
        self.published_state.smoothing()
    }

    /// Write the current session state into a new document.
    ///
    /// `parameters` are the host's current control values.
    pub fn save_state(&self, parameters: &ControlParameters) -> StateElement {
        let slots = (0..self.store.slot_count())
            .filter_map(|slot| {
                self.store
                    .slot_file_path(slot)
                    .map(|path| (slot, path.to_string_lossy().into_owned()))
            })
            .collect();
        SynthState {
            parameters: *parameters,
            last_slot_num: self.published_state.last_slot_num(),
            smoothing: self.published_state.smoothing(),
            current_slot: self.store.current_slot(),
            slots,
        }
        .to_element()
    }

    /// Restore a session from a document created with [`Self::save_state`].
    ///
    /// Empties all slots, then decodes the document's files into their original slots. Files
    /// which can no longer be loaded leave their slot empty. Returns the control values the
    /// host should apply. Documents of other kinds are ignored: slots stay untouched and the
    /// default control values are returned.
    pub fn restore_state(&mut self, document: &StateElement) -> ControlParameters {
        let state = match SynthState::from_element(document) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("Ignoring synth state: {err}");
                return SynthState::default().parameters;
            }
        };

        self.store.unload_all();
        let max_length = self.store.max_sample_length();
        for (slot, path) in &state.slots {
            if *slot >= self.store.slot_count() {
                log::warn!("Skipping sample '{path}' of out of range slot {slot}");
                continue;
            }
            match Sample::from_file(path, max_length) {
                Ok(sample) => {
                    // slot index was checked above
                    let _ = self.store.load_sample(*slot, sample);
                }
                Err(err) => {
                    log::warn!("Failed to restore sample '{path}' into slot {slot}: {err}");
                }
            }
        }
        if self.store.select(state.current_slot).is_err() {
            log::warn!(
                "Restored current slot {} is out of range",
                state.current_slot
            );
        }

        // apply immediately for save_state calls before the next block got rendered
        self.published_state
            .store(state.smoothing, state.last_slot_num);
        let message = ProcessorMessage::Restore {
            smoothing: state.smoothing,
            last_slot_num: state.last_slot_num,
        };
        if self.message_queue.force_push(message).is_some() {
            log::warn!("Processor message queue is full. Dropped oldest message");
        }

        log::info!(
            "Restored synth state with {} loaded slots",
            (0..self.store.slot_count())
                .filter(|slot| self.store.is_loaded(*slot))
                .count()
        );
        state.parameters
    }

    /// [`Self::save_state`] into an opaque binary blob.
    pub fn save_state_bytes(&self, parameters: &ControlParameters) -> Result<Vec<u8>, Error> {
        self.save_state(parameters).to_bytes()
    }

    /// [`Self::restore_state`] from an opaque binary blob.
    pub fn restore_state_bytes(&mut self, bytes: &[u8]) -> Result<ControlParameters, Error> {
        let document = StateElement::from_bytes(bytes)?;
        Ok(self.restore_state(&document))
    }
}

// -------------------------------------------------------------------------------------------------
