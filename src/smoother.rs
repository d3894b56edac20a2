//! Slew limiting of scratch and volume jumps into per-block ramps.

use crate::renderer::Ramp;

// -------------------------------------------------------------------------------------------------

/// Move `prev` towards `target` by at most one block's worth of slew.
///
/// The raw distance `|target - prev|` is shaped by the `slew_curve` (`0` is near linear, `1`
/// compresses small jumps) and capped by the `slew_rate`, scaled so that a rate of `1` moves
/// through the full `0..1` range within roughly 20 ms at any block size. The step never
/// overshoots the target.
pub fn slew_step(
    prev: f32,
    target: f32,
    slew_rate: f32,
    slew_curve: f32,
    block_size: usize,
    sample_rate: u32,
) -> f32 {
    let delta = target - prev;
    let distance = delta.abs();
    if distance == 0.0 || !distance.is_finite() {
        return prev;
    }
    let step = (distance * (slew_curve * (std::f32::consts::SQRT_2 - 1.0) + 1.0))
        .powf(slew_curve + 1.0)
        .min(slew_cap(slew_rate, block_size, sample_rate));
    if step >= distance {
        target
    } else {
        prev + step.copysign(delta)
    }
}

/// Maximum distance [`slew_step`] moves within a single block.
pub fn slew_cap(slew_rate: f32, block_size: usize, sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    (slew_rate.max(0.0) * block_size as f32 * 48.0 / sample_rate as f32).min(1.0)
}

// -------------------------------------------------------------------------------------------------

/// Scratch and volume values carried from one render block to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingState {
    /// Raw scratch control value of the last block.
    pub last_scratch: f32,
    /// Rendered scratch position at the end of the last block.
    pub smoothed_scratch: f32,
    /// Raw volume control value of the last block.
    pub last_volume: f32,
    /// Rendered volume at the end of the last block.
    pub smoothed_volume: f32,
}

impl Default for SmoothingState {
    fn default() -> Self {
        Self {
            last_scratch: 0.0,
            smoothed_scratch: 0.0,
            last_volume: 1.0,
            smoothed_volume: 1.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Position and volume ramps of a single render block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTrajectory {
    /// Normalized scratch position, not yet mapped into the playback region.
    pub position: Ramp,
    pub volume: Ramp,
}

// -------------------------------------------------------------------------------------------------

/// Turns raw scratch and volume control values into slew-limited per-block trajectories.
///
/// Owned by the render thread: the state only changes within [`Self::next_block`] or when
/// explicitly restored.
#[derive(Debug, Clone)]
pub struct ScratchSmoother {
    state: SmoothingState,
    sample_rate: u32,
}

impl ScratchSmoother {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_state(sample_rate, SmoothingState::default())
    }

    pub fn with_state(sample_rate: u32, state: SmoothingState) -> Self {
        Self { state, sample_rate }
    }

    pub fn state(&self) -> SmoothingState {
        self.state
    }

    pub fn set_state(&mut self, state: SmoothingState) {
        self.state = state;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Calculate the trajectory of the next block with `block_size` frames.
    pub fn next_block(
        &mut self,
        scratch: f32,
        volume: f32,
        slew_rate: f32,
        slew_curve: f32,
        block_size: usize,
    ) -> BlockTrajectory {
        self.state.last_scratch = scratch;
        self.state.last_volume = volume;

        let position_start = self.state.smoothed_scratch;
        let position_end = slew_step(
            position_start,
            scratch,
            slew_rate,
            slew_curve,
            block_size,
            self.sample_rate,
        );
        let volume_start = self.state.smoothed_volume;
        let volume_end = volume;

        self.state.smoothed_scratch = position_end;
        self.state.smoothed_volume = volume_end;

        BlockTrajectory {
            position: Ramp::new(position_start, position_end),
            volume: Ramp::new(volume_start, volume_end),
        }
    }
}

// -------------------------------------------------------------------------------------------------
