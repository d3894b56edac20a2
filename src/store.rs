//! Fixed-size set of sample slots, shared lock-free between the control and the render thread.
//!
//! Slot contents are published via [`basedrop::SharedCell`]s: the control thread decodes a
//! sample completely, then swaps it into the slot's cell. The render thread clones the cell's
//! current reference at the start of a block and drops it at the end. Dropping the last
//! reference never frees memory on the dropping thread: basedrop queues the allocation for the
//! store's [`Collector`], which runs on the control thread only.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use basedrop::{Collector, Handle, Shared, SharedCell};
use crossbeam_channel::Sender;

use crate::{
    error::Error,
    event::{send_event, SynthEvent},
    sample::{Sample, SampleFileFormat},
};

// -------------------------------------------------------------------------------------------------

/// Default number of sample slots.
pub const MAX_SAMPLES: usize = 16;

/// Display name of empty slots.
pub const NOT_LOADED_NAME: &str = "Not Loaded";

// -------------------------------------------------------------------------------------------------

/// Contents of a single slot: either a fully decoded sample or nothing.
pub type SampleSlot = Option<Sample>;

// -------------------------------------------------------------------------------------------------

/// The slot array and slot selection, shared by [`SampleStore`] and the render thread.
///
/// All accessors are lock-free and allocation free.
pub struct SlotTable {
    slots: Box<[SharedCell<SampleSlot>]>,
    current_slot: AtomicUsize,
}

impl SlotTable {
    fn new(handle: &Handle, slot_count: usize) -> Self {
        let slots = (0..slot_count)
            .map(|_| SharedCell::new(Shared::new(handle, None)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            current_slot: AtomicUsize::new(0),
        }
    }

    /// Number of slots. Never changes after creation.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the currently selected slot. Always a valid slot index.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current_slot.load(Ordering::Acquire)
    }

    /// Select the given slot. Empty slots may be selected too.
    pub fn select(&self, slot: usize) -> Result<usize, Error> {
        if slot >= self.slot_count() {
            return Err(Error::SlotOutOfRange(slot));
        }
        self.current_slot.store(slot, Ordering::Release);
        Ok(slot)
    }

    /// Get a reference to the given slot's contents, or `None` when the index is out of range.
    #[inline]
    pub fn slot(&self, slot: usize) -> Option<Shared<SampleSlot>> {
        self.slots.get(slot).map(SharedCell::get)
    }

    /// Get a reference to the current slot's contents.
    #[inline]
    pub fn current(&self) -> Shared<SampleSlot> {
        self.slots[self.current_slot()].get()
    }

    fn publish(&self, slot: usize, contents: Shared<SampleSlot>) {
        // the replaced value is queued for the collector once its last reader drops it
        self.slots[slot].set(contents);
    }
}

// -------------------------------------------------------------------------------------------------

/// Owns the sample slots and decodes files into them. Lives on the control thread.
///
/// Mutating operations may block on file I/O and allocate. The render thread only ever sees
/// complete slots through the shared [`SlotTable`].
pub struct SampleStore {
    collector: Collector,
    table: Arc<SlotTable>,
    max_sample_length: Duration,
    event_sender: Option<Sender<SynthEvent>>,
}

impl SampleStore {
    /// Sentinel index for failed load operations, see [`Self::load_index`].
    pub const NOT_FOUND: i32 = -1;

    /// Create a new store with `slot_count` empty slots.
    pub fn new(
        slot_count: usize,
        max_sample_length: Duration,
        event_sender: Option<Sender<SynthEvent>>,
    ) -> Result<Self, Error> {
        if slot_count == 0 {
            return Err(Error::ParameterError(
                "sample store needs at least one slot".to_string(),
            ));
        }
        let collector = Collector::new();
        let table = Arc::new(SlotTable::new(&collector.handle(), slot_count));
        Ok(Self {
            collector,
            table,
            max_sample_length,
            event_sender,
        })
    }

    /// Shared access to the slot table, e.g. for a renderer.
    pub fn table(&self) -> Arc<SlotTable> {
        Arc::clone(&self.table)
    }

    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    /// Maximum length of samples which get loaded via [`Self::load_file`].
    pub fn max_sample_length(&self) -> Duration {
        self.max_sample_length
    }

    /// Like [`Self::load`], using the store's max sample length.
    pub fn load_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        exclude_slot: Option<usize>,
        auto_select: bool,
    ) -> Result<usize, Error> {
        let max_length = self.max_sample_length;
        self.load(path, max_length, exclude_slot, auto_select)
    }

    /// Decode a WAV or FLAC file into the lowest empty slot other than `exclude_slot`.
    ///
    /// When `auto_select` is set, the newly loaded slot becomes the current slot.
    /// Returns the index of the loaded slot. On errors, the store remains untouched.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        path: P,
        max_length: Duration,
        exclude_slot: Option<usize>,
        auto_select: bool,
    ) -> Result<usize, Error> {
        let path = path.as_ref();
        // check the cheap things first, before decoding anything
        SampleFileFormat::from_path(path)?;
        let slot = self.open_slot_except(exclude_slot).ok_or(Error::NoFreeSlot)?;
        let sample = Sample::from_file(path, max_length).inspect_err(|err| {
            log::warn!("Failed to load sample '{}': {err}", path.display());
        })?;
        self.load_sample(slot, sample)?;
        if auto_select {
            self.select(slot)?;
        }
        Ok(slot)
    }

    /// Like [`Self::load`], but signals failures via the [`Self::NOT_FOUND`] sentinel.
    pub fn load_index<P: AsRef<Path>>(
        &mut self,
        path: P,
        max_length: Duration,
        exclude_slot: Option<usize>,
        auto_select: bool,
    ) -> i32 {
        match self.load(path, max_length, exclude_slot, auto_select) {
            Ok(slot) => slot as i32,
            Err(_) => Self::NOT_FOUND,
        }
    }

    /// Publish an already decoded sample into the given slot, replacing its previous contents.
    pub fn load_sample(&mut self, slot: usize, sample: Sample) -> Result<usize, Error> {
        if slot >= self.slot_count() {
            return Err(Error::SlotOutOfRange(slot));
        }
        let path = sample.file_path().to_path_buf();
        log::info!(
            "Loaded sample '{}' into slot {slot} ({} frames, {} channels, {} Hz)",
            path.display(),
            sample.frame_count(),
            sample.channel_count(),
            sample.sample_rate()
        );
        let contents = Shared::new(&self.collector.handle(), Some(sample));
        self.table.publish(slot, contents);
        self.collect_garbage();
        send_event(
            self.event_sender.as_ref(),
            SynthEvent::SampleLoaded { slot, path },
        );
        Ok(slot)
    }

    /// Empty the given slot. The selection is not changed, even when the slot is the current one.
    pub fn unload(&mut self, slot: usize) -> Result<(), Error> {
        if slot >= self.slot_count() {
            return Err(Error::SlotOutOfRange(slot));
        }
        if self.is_loaded(slot) {
            log::info!("Unloading sample slot {slot}");
        }
        let contents = Shared::new(&self.collector.handle(), None);
        self.table.publish(slot, contents);
        self.collect_garbage();
        send_event(
            self.event_sender.as_ref(),
            SynthEvent::SampleUnloaded { slot },
        );
        Ok(())
    }

    /// Empty all slots.
    pub fn unload_all(&mut self) {
        for slot in 0..self.slot_count() {
            if self.is_loaded(slot) {
                // the slot index is valid: unloading can't fail
                let _ = self.unload(slot);
            }
        }
    }

    /// Set the current slot. Returns the given slot index for chaining.
    pub fn select(&self, slot: usize) -> Result<usize, Error> {
        let slot = self.table.select(slot)?;
        log::debug!("Selected sample slot {slot}");
        send_event(self.event_sender.as_ref(), SynthEvent::SlotSelected { slot });
        Ok(slot)
    }

    /// Select the next slot, wrapping around at the end. Empty slots are not skipped.
    pub fn select_next(&self) -> usize {
        let next = (self.current_slot() + 1) % self.slot_count();
        self.select(next).unwrap_or(next)
    }

    /// Select the previous slot, wrapping around at the start. Empty slots are not skipped.
    pub fn select_previous(&self) -> usize {
        let slot_count = self.slot_count();
        let previous = (self.current_slot() + slot_count - 1) % slot_count;
        self.select(previous).unwrap_or(previous)
    }

    pub fn current_slot(&self) -> usize {
        self.table.current_slot()
    }

    /// The lowest-indexed empty slot, if any.
    pub fn first_open_slot(&self) -> Option<usize> {
        self.open_slot_except(None)
    }

    fn open_slot_except(&self, exclude_slot: Option<usize>) -> Option<usize> {
        (0..self.slot_count()).find(|slot| Some(*slot) != exclude_slot && !self.is_loaded(*slot))
    }

    pub fn is_loaded(&self, slot: usize) -> bool {
        self.table.slot(slot).is_some_and(|contents| contents.is_some())
    }

    /// File path of the given slot's sample, if loaded.
    pub fn slot_file_path(&self, slot: usize) -> Option<PathBuf> {
        let contents = self.table.slot(slot)?;
        (*contents)
            .as_ref()
            .map(|sample| sample.file_path().to_path_buf())
    }

    /// Display name of the given slot's sample, or [`NOT_LOADED_NAME`] when empty.
    pub fn slot_name(&self, slot: usize) -> String {
        self.table
            .slot(slot)
            .and_then(|contents| (*contents).as_ref().map(Sample::name))
            .unwrap_or_else(|| NOT_LOADED_NAME.to_string())
    }

    /// Display name of the current slot's sample, or [`NOT_LOADED_NAME`] when empty.
    pub fn current_slot_name(&self) -> String {
        self.slot_name(self.current_slot())
    }

    /// Free memory of replaced slot contents which no longer are referenced by any reader.
    /// Called automatically after every load and unload operation.
    pub fn collect_garbage(&mut self) {
        self.collector.collect();
    }

    /// Number of sample allocations which are alive or waiting for collection.
    pub fn allocation_count(&self) -> usize {
        self.collector.alloc_count()
    }
}

// -------------------------------------------------------------------------------------------------
