//! The render-thread side of the synthesizer.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crossbeam_channel::Sender;
use crossbeam_queue::ArrayQueue;

use crate::{
    controls::ControlParameters,
    event::{send_event, SynthEvent},
    renderer::{PlaybackRenderer, Ramp},
    smoother::{ScratchSmoother, SmoothingState},
    store::SlotTable,
    utils::{buffer::clear_buffer, AtomicF32},
};

// -------------------------------------------------------------------------------------------------

/// Messages from the control thread, consumed at the start of the next render block.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ProcessorMessage {
    /// Replace smoothing state and the last applied slot parameter, e.g. after a state restore.
    Restore {
        smoothing: SmoothingState,
        last_slot_num: usize,
    },
}

// -------------------------------------------------------------------------------------------------

/// Render state, published by the processor after each block for the control thread.
#[derive(Debug)]
pub(crate) struct PublishedState {
    last_scratch: AtomicF32,
    smoothed_scratch: AtomicF32,
    last_volume: AtomicF32,
    smoothed_volume: AtomicF32,
    last_slot_num: AtomicUsize,
}

impl PublishedState {
    pub fn new(smoothing: SmoothingState, last_slot_num: usize) -> Self {
        let state = Self {
            last_scratch: AtomicF32::default(),
            smoothed_scratch: AtomicF32::default(),
            last_volume: AtomicF32::default(),
            smoothed_volume: AtomicF32::default(),
            last_slot_num: AtomicUsize::new(0),
        };
        state.store(smoothing, last_slot_num);
        state
    }

    pub fn store(&self, smoothing: SmoothingState, last_slot_num: usize) {
        self.last_scratch
            .store(smoothing.last_scratch, Ordering::Relaxed);
        self.smoothed_scratch
            .store(smoothing.smoothed_scratch, Ordering::Relaxed);
        self.last_volume.store(smoothing.last_volume, Ordering::Relaxed);
        self.smoothed_volume
            .store(smoothing.smoothed_volume, Ordering::Relaxed);
        self.last_slot_num.store(last_slot_num, Ordering::Release);
    }

    pub fn smoothing(&self) -> SmoothingState {
        SmoothingState {
            last_scratch: self.last_scratch.load(Ordering::Relaxed),
            smoothed_scratch: self.smoothed_scratch.load(Ordering::Relaxed),
            last_volume: self.last_volume.load(Ordering::Relaxed),
            smoothed_volume: self.smoothed_volume.load(Ordering::Relaxed),
        }
    }

    pub fn last_slot_num(&self) -> usize {
        self.last_slot_num.load(Ordering::Acquire)
    }
}

// -------------------------------------------------------------------------------------------------

/// Renders the synthesizer's output, block by block. Lives on the real-time audio thread.
///
/// Processing never allocates, locks, blocks or does I/O. Created together with its
/// control-thread counterpart via [`Synthesizer::new`](crate::Synthesizer::new).
pub struct SynthProcessor {
    renderer: PlaybackRenderer,
    smoother: ScratchSmoother,
    last_slot_num: usize,
    message_queue: Arc<ArrayQueue<ProcessorMessage>>,
    published_state: Arc<PublishedState>,
    event_sender: Option<Sender<SynthEvent>>,
}

impl SynthProcessor {
    pub(crate) fn new(
        slots: Arc<SlotTable>,
        sample_rate: u32,
        message_queue: Arc<ArrayQueue<ProcessorMessage>>,
        published_state: Arc<PublishedState>,
        event_sender: Option<Sender<SynthEvent>>,
    ) -> Self {
        let smoother = ScratchSmoother::with_state(sample_rate, published_state.smoothing());
        let last_slot_num = published_state.last_slot_num();
        Self {
            renderer: PlaybackRenderer::new(slots),
            smoother,
            last_slot_num,
            message_queue,
            published_state,
            event_sender,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.smoother.sample_rate()
    }

    /// Change the sample rate of the output stream, e.g. when the host reconfigures its
    /// audio device. Only affects the scale of the slew rate.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.smoother.set_sample_rate(sample_rate);
    }

    /// Current smoothing state of the processor.
    pub fn smoothing_state(&self) -> SmoothingState {
        self.smoother.state()
    }

    /// Render a block of interleaved audio into `output` with the given control values.
    ///
    /// The whole buffer gets overwritten: trailing samples which don't fill a complete frame
    /// are cleared. Block sizes may vary from call to call.
    pub fn process(
        &mut self,
        output: &mut [f32],
        channel_count: usize,
        parameters: &ControlParameters,
    ) {
        Self::assert_no_alloc(|| self.process_block(output, channel_count, parameters));
    }

    fn process_block(
        &mut self,
        output: &mut [f32],
        channel_count: usize,
        parameters: &ControlParameters,
    ) {
        self.process_messages();

        let parameters = parameters.clamped();
        if parameters.slot_num != self.last_slot_num {
            self.apply_slot_num(parameters.slot_num);
        }

        if channel_count == 0 {
            clear_buffer(output);
            return;
        }
        let frame_count = output.len() / channel_count;
        clear_buffer(&mut output[frame_count * channel_count..]);
        let trajectory = self.smoother.next_block(
            parameters.scratch,
            parameters.volume,
            parameters.slew_rate,
            parameters.slew_curve,
            frame_count,
        );
        let position: Ramp = trajectory
            .position
            .map(|scratch| parameters.region_position(scratch));
        self.renderer.render(
            output,
            channel_count,
            0,
            frame_count,
            position,
            trajectory.volume,
        );

        self.published_state
            .store(self.smoother.state(), self.last_slot_num);
    }

    fn process_messages(&mut self) {
        while let Some(message) = self.message_queue.pop() {
            match message {
                ProcessorMessage::Restore {
                    smoothing,
                    last_slot_num,
                } => {
                    self.smoother.set_state(smoothing);
                    self.last_slot_num = last_slot_num;
                }
            }
        }
    }

    fn apply_slot_num(&mut self, slot_num: usize) {
        self.last_slot_num = slot_num;
        if self.renderer.slots().select(slot_num).is_ok() {
            // sending may allocate or log when the channel is full
            Self::permit_alloc(|| {
                send_event(
                    self.event_sender.as_ref(),
                    SynthEvent::SlotSelected { slot: slot_num },
                )
            });
        }
    }

    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }

    #[inline]
    fn permit_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::permit_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sample::Sample, store::SampleStore};
    use std::time::Duration;

    fn processor(store: &SampleStore) -> (SynthProcessor, Arc<ArrayQueue<ProcessorMessage>>) {
        let queue = Arc::new(ArrayQueue::new(4));
        let published = Arc::new(PublishedState::new(SmoothingState::default(), 0));
        let processor =
            SynthProcessor::new(store.table(), 48000, Arc::clone(&queue), published, None);
        (processor, queue)
    }

    #[test]
    fn renders_region() {
        let mut store = SampleStore::new(2, Duration::from_secs(1), None).unwrap();
        let buffer = (0..8).map(|f| f as f32).collect();
        store
            .load_sample(0, Sample::from_interleaved("ramp.wav", buffer, 1, 48000).unwrap())
            .unwrap();
        let (mut processor, _) = processor(&store);

        // scratch is at rest at 0: plays the region start
        let parameters = ControlParameters {
            start: 0.5,
            end: 1.0,
            ..Default::default()
        };
        let mut output = [1.0; 8];
        processor.process(&mut output, 2, &parameters);
        assert_eq!(output, [4.0; 8]);
    }

    #[test]
    fn slot_parameter_changes() {
        let mut store = SampleStore::new(2, Duration::from_secs(1), None).unwrap();
        store
            .load_sample(1, Sample::from_interleaved("one.wav", vec![0.5; 4], 1, 48000).unwrap())
            .unwrap();
        let (mut processor, _) = processor(&store);

        let mut output = [1.0; 4];
        processor.process(&mut output, 1, &ControlParameters::default());
        assert_eq!(output, [0.0; 4]);

        let parameters = ControlParameters {
            slot_num: 1,
            ..Default::default()
        };
        processor.process(&mut output, 1, &parameters);
        assert_eq!(store.current_slot(), 1);
        assert_eq!(output, [0.5; 4]);

        // selections from the control thread stick while the parameter doesn't change
        store.select(0).unwrap();
        processor.process(&mut output, 1, &parameters);
        assert_eq!(store.current_slot(), 0);
        assert_eq!(output, [0.0; 4]);

        // out of range slots are ignored
        let parameters = ControlParameters {
            slot_num: 7,
            ..Default::default()
        };
        processor.process(&mut output, 1, &parameters);
        assert_eq!(store.current_slot(), 0);
    }

    #[test]
    fn restores_smoothing() {
        let store = SampleStore::new(1, Duration::from_secs(1), None).unwrap();
        let (mut processor, queue) = processor(&store);
        let smoothing = SmoothingState {
            last_scratch: 0.75,
            smoothed_scratch: 0.75,
            last_volume: 0.5,
            smoothed_volume: 0.5,
        };
        queue
            .push(ProcessorMessage::Restore {
                smoothing,
                last_slot_num: 0,
            })
            .unwrap();
        let parameters = ControlParameters {
            scratch: 0.75,
            volume: 0.5,
            ..Default::default()
        };
        let mut output = [0.0; 16];
        processor.process(&mut output, 2, &parameters);
        assert_eq!(processor.smoothing_state(), smoothing);
        assert_eq!(processor.published_state.smoothing(), smoothing);
    }

    #[test]
    fn ignores_empty_layouts() {
        let store = SampleStore::new(1, Duration::from_secs(1), None).unwrap();
        let (mut processor, _) = processor(&store);
        processor.process(&mut [], 2, &ControlParameters::default());
        let mut output = [1.0; 2];
        processor.process(&mut output, 0, &ControlParameters::default());
        assert_eq!(output, [0.0; 2]);
        assert_eq!(processor.smoothing_state(), SmoothingState::default());
    }

    #[test]
    fn clears_incomplete_frames() {
        let mut store = SampleStore::new(1, Duration::from_secs(1), None).unwrap();
        store
            .load_sample(0, Sample::from_interleaved("q.wav", vec![0.25; 4], 1, 48000).unwrap())
            .unwrap();
        let (mut processor, _) = processor(&store);

        let mut output = [9.0; 5];
        processor.process(&mut output, 2, &ControlParameters::default());
        assert_eq!(output, [0.25, 0.25, 0.25, 0.25, 0.0]);

        let mut output = [9.0; 1];
        processor.process(&mut output, 2, &ControlParameters::default());
        assert_eq!(output, [0.0]);
    }
}
