//! Playback of the active sample slot along an arbitrary position ramp.

use std::sync::Arc;

use crate::{sample::Sample, store::SlotTable, utils::buffer::clear_buffer};

// -------------------------------------------------------------------------------------------------

/// Linear interpolation of a control value across the frames of one render block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start: f32,
    pub end: f32,
}

impl Ramp {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// A ramp which does not move.
    pub const fn constant(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Value at the relative block position `t` in range `[0, 1)`.
    #[inline]
    pub fn at(&self, t: f32) -> f32 {
        self.start + (self.end - self.start) * t
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Apply a mapping function to both ends of the ramp.
    pub fn map<F: Fn(f32) -> f32>(self, f: F) -> Self {
        Self::new(f(self.start), f(self.end))
    }
}

// -------------------------------------------------------------------------------------------------

/// Renders the currently selected slot of a [`SlotTable`] into interleaved output buffers.
///
/// Rendering never allocates, locks or blocks: the active sample is accessed through a
/// reference count which is released at the end of each call.
pub struct PlaybackRenderer {
    slots: Arc<SlotTable>,
}

impl PlaybackRenderer {
    pub fn new(slots: Arc<SlotTable>) -> Self {
        Self { slots }
    }

    /// The slot table this renderer plays from.
    pub fn slots(&self) -> &Arc<SlotTable> {
        &self.slots
    }

    /// Render `frame_count` frames of the active slot into `output`, starting at `start_frame`.
    ///
    /// `position` is a fraction of the active sample's total length, `volume` a linear gain.
    /// Both are interpolated linearly across the block. Existing output content in the rendered
    /// range gets overwritten. Empty slots render silence.
    pub fn render(
        &self,
        output: &mut [f32],
        channel_count: usize,
        start_frame: usize,
        frame_count: usize,
        position: Ramp,
        volume: Ramp,
    ) {
        let contents = self.slots.current();
        render_sample(
            (*contents).as_ref(),
            output,
            channel_count,
            start_frame,
            frame_count,
            position,
            volume,
        );
    }
}

// -------------------------------------------------------------------------------------------------

/// Render the given sample, or silence when `sample` is `None`, into `output`.
///
/// Frames outside of the output buffer are skipped. Positions outside of `[0, 1]` are clamped
/// to the first or last source frame. Non-finite ramps render silence.
pub fn render_sample(
    sample: Option<&Sample>,
    output: &mut [f32],
    channel_count: usize,
    start_frame: usize,
    frame_count: usize,
    position: Ramp,
    volume: Ramp,
) {
    if channel_count == 0 || frame_count == 0 {
        return;
    }
    let output_frames = output.len() / channel_count;
    if start_frame >= output_frames {
        return;
    }
    let end_frame = start_frame.saturating_add(frame_count).min(output_frames);
    let output = &mut output[start_frame * channel_count..end_frame * channel_count];

    let sample = match sample {
        Some(sample) if position.is_finite() && volume.is_finite() => sample,
        _ => {
            clear_buffer(output);
            return;
        }
    };

    let source = sample.buffer();
    let source_channels = sample.channel_count();
    let source_frames = sample.frame_count();
    let last_frame = (source_frames - 1) as f64;

    let position_start = position.start as f64;
    let position_delta = position.end as f64 - position_start;
    for (frame_index, frame) in output.chunks_exact_mut(channel_count).enumerate() {
        let t = frame_index as f64 / frame_count as f64;
        let gain = volume.at(t as f32);
        // f64 keeps sub-frame precision for long samples
        let source_position =
            ((position_start + position_delta * t) * source_frames as f64).clamp(0.0, last_frame);
        let index = source_position as usize;
        let next_index = (index + 1).min(source_frames - 1);
        let fraction = (source_position - index as f64) as f32;
        let current = &source[index * source_channels..(index + 1) * source_channels];
        let next = &source[next_index * source_channels..(next_index + 1) * source_channels];
        for (channel, out) in frame.iter_mut().enumerate() {
            let source_channel = channel % source_channels;
            let a = current[source_channel];
            let b = next[source_channel];
            *out = (a + (b - a) * fraction) * gain;
        }
    }
}

// -------------------------------------------------------------------------------------------------
