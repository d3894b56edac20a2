//! The synthesizer's host-facing control parameters.

use four_cc::FourCC;

use crate::{
    error::Error,
    parameter::{FloatParameter, IntegerParameter, Parameter, ParameterValueUpdate},
    store::MAX_SAMPLES,
    utils::{db_to_linear, linear_to_db},
};

// -------------------------------------------------------------------------------------------------

/// Plain values of all control parameters, as consumed by the processor once per block.
///
/// The struct is a small `Copy` value: hosts keep their own copy, apply automation to it via
/// [`Self::apply_update`] and pass it by reference into each
/// [`SynthProcessor::process`](crate::SynthProcessor::process) call.
///
/// `start` and `end` describe the playable region of the active sample as fractions of its
/// length. `start <= end` is the caller's responsibility: a reversed region simply plays the
/// scratch range backwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlParameters {
    pub slot_num: usize,
    pub scratch: f32,
    pub volume: f32,
    pub slew_rate: f32,
    pub slew_curve: f32,
    pub start: f32,
    pub end: f32,
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            slot_num: Self::SLOT_NUM.default_value() as usize,
            scratch: Self::SCRATCH.default_value(),
            volume: Self::VOLUME.default_value(),
            slew_rate: Self::SLEW_RATE.default_value(),
            slew_curve: Self::SLEW_CURVE.default_value(),
            start: Self::START.default_value(),
            end: Self::END.default_value(),
        }
    }
}

impl ControlParameters {
    pub const SLOT_NUM: IntegerParameter = IntegerParameter::new(
        FourCC(*b"SLOT"),
        "Slot #",
        0..=(MAX_SAMPLES as i32 - 1),
        0,
    );
    pub const SCRATCH: FloatParameter =
        FloatParameter::new(FourCC(*b"SCRA"), "Scratch", 0.0..=1.0, 0.0);
    pub const VOLUME: FloatParameter =
        FloatParameter::new(FourCC(*b"VOLU"), "Volume", 0.0..=1.0, 1.0);
    pub const SLEW_RATE: FloatParameter =
        FloatParameter::new(FourCC(*b"SLRT"), "Slew Rate", 0.0..=1.0, 0.5);
    pub const SLEW_CURVE: FloatParameter =
        FloatParameter::new(FourCC(*b"SLCV"), "Slew Curve", 0.0..=1.0, 0.0);
    pub const START: FloatParameter =
        FloatParameter::new(FourCC(*b"STRT"), "Scratch Start", 0.0..=1.0, 0.0);
    pub const END: FloatParameter =
        FloatParameter::new(FourCC(*b"END_"), "Scratch End", 0.0..=1.0, 1.0);

    /// Descriptors of all parameters, in the order hosts should expose them.
    pub fn parameters() -> Vec<Box<dyn Parameter>> {
        let gain_to_string = |v: f32| {
            let db = linear_to_db(v);
            if db <= -60.0 {
                "-INF".to_string()
            } else {
                format!("{:.2}", db)
            }
        };
        let string_to_gain = |s: &str| {
            if s.trim().eq_ignore_ascii_case("-inf") {
                Some(0.0)
            } else {
                let s = s.trim_end_matches(|c: char| {
                    c.eq_ignore_ascii_case(&'d')
                        || c.eq_ignore_ascii_case(&'b')
                        || c.is_whitespace()
                });
                s.trim().parse::<f32>().ok().map(db_to_linear)
            }
        };
        vec![
            Self::SLOT_NUM.into_box(),
            Self::SCRATCH.into_box(),
            Self::VOLUME
                .with_unit("dB")
                .with_display(gain_to_string, string_to_gain)
                .into_box(),
            Self::SLEW_RATE.into_box(),
            Self::SLEW_CURVE.into_box(),
            Self::START.into_box(),
            Self::END.into_box(),
        ]
    }

    /// Apply a host parameter update to the plain values.
    pub fn apply_update(&mut self, id: FourCC, update: &ParameterValueUpdate) -> Result<(), Error> {
        let invalid_value = || Error::ParameterError(format!("invalid value for parameter '{id}'"));
        match id {
            _ if id == Self::SLOT_NUM.id() => {
                let slot = Self::SLOT_NUM.update_value(update).ok_or_else(invalid_value)?;
                self.slot_num = slot as usize;
            }
            _ if id == Self::SCRATCH.id() => {
                self.scratch = Self::SCRATCH.update_value(update).ok_or_else(invalid_value)?;
            }
            _ if id == Self::VOLUME.id() => {
                self.volume = Self::VOLUME.update_value(update).ok_or_else(invalid_value)?;
            }
            _ if id == Self::SLEW_RATE.id() => {
                self.slew_rate = Self::SLEW_RATE.update_value(update).ok_or_else(invalid_value)?;
            }
            _ if id == Self::SLEW_CURVE.id() => {
                self.slew_curve = Self::SLEW_CURVE
                    .update_value(update)
                    .ok_or_else(invalid_value)?;
            }
            _ if id == Self::START.id() => {
                self.start = Self::START.update_value(update).ok_or_else(invalid_value)?;
            }
            _ if id == Self::END.id() => {
                self.end = Self::END.update_value(update).ok_or_else(invalid_value)?;
            }
            _ => {
                return Err(Error::ParameterError(format!(
                    "Invalid/unknown parameter '{id}'"
                )))
            }
        }
        Ok(())
    }

    /// Copy of the parameters with all values clamped into their valid ranges.
    pub fn clamped(&self) -> Self {
        let max_slot = *Self::SLOT_NUM.range().end() as usize;
        Self {
            slot_num: self.slot_num.min(max_slot),
            scratch: Self::SCRATCH.clamp_value(self.scratch),
            volume: Self::VOLUME.clamp_value(self.volume),
            slew_rate: Self::SLEW_RATE.clamp_value(self.slew_rate),
            slew_curve: Self::SLEW_CURVE.clamp_value(self.slew_curve),
            start: Self::START.clamp_value(self.start),
            end: Self::END.clamp_value(self.end),
        }
    }

    /// Map a normalized scratch value into the `[start, end]` region of the sample.
    #[inline]
    pub fn region_position(&self, scratch: f32) -> f32 {
        scratch * (self.end - self.start) + self.start
    }
}

// -------------------------------------------------------------------------------------------------
