use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{float::strip_unit, Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A discrete (integer) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<i32>,
    default: i32,
    unit: &'static str,
}

impl IntegerParameter {
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<i32>,
        default: i32,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            unit: "",
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    pub fn range(&self) -> &RangeInclusive<i32> {
        &self.range
    }

    pub fn default_value(&self) -> i32 {
        self.default
    }

    pub fn clamp_value(&self, value: i32) -> i32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    pub fn normalize_value(&self, value: i32) -> f32 {
        if self.range.start() == self.range.end() {
            return 0.0;
        }
        (value as f32 - *self.range.start() as f32)
            / (*self.range.end() as f32 - *self.range.start() as f32)
    }

    pub fn denormalize_value(&self, normalized: f32) -> i32 {
        let normalized = normalized.clamp(0.0, 1.0);
        let value = *self.range.start() as f32
            + normalized * (*self.range.end() as f32 - *self.range.start() as f32);
        value.round() as i32
    }

    /// Resolve a host's parameter update to a plain, clamped value.
    pub fn update_value(&self, update: &ParameterValueUpdate) -> Option<i32> {
        match update {
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = (*raw).downcast_ref::<i32>() {
                    Some(self.clamp_value(*value))
                } else if let Some(value) = (*raw).downcast_ref::<usize>() {
                    Some(self.clamp_value(i32::try_from(*value).unwrap_or(i32::MAX)))
                } else {
                    log::warn!("Invalid value type for integer parameter '{}'", self.id);
                    None
                }
            }
            ParameterValueUpdate::Normalized(normalized) => {
                Some(self.denormalize_value(*normalized))
            }
        }
    }
}

impl Parameter for IntegerParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Integer {
            range: self.range.clone(),
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String {
        let value = self.denormalize_value(normalized);
        if include_unit && !self.unit.is_empty() {
            format!("{} {}", value, self.unit)
        } else {
            value.to_string()
        }
    }

    fn string_to_normalized_value(&self, string: String) -> Option<f32> {
        let value = strip_unit(&string, self.unit).parse::<i32>().ok()?;
        Some(self.normalize_value(self.clamp_value(value)))
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let param = IntegerParameter::new(FourCC(*b"TEST"), "Test", 0..=15, 0);
        assert_eq!(param.default_normalized_value(), 0.0);
        assert_eq!(param.denormalize_value(1.0), 15);
        assert_eq!(param.denormalize_value(0.5), 8);
        assert_eq!(param.clamp_value(20), 15);
        assert_eq!(param.normalized_value_to_string(1.0, true), "15");
        assert_eq!(
            param.string_to_normalized_value(" 30 ".to_string()),
            Some(1.0)
        );
        assert_eq!(param.string_to_normalized_value("x".to_string()), None);
        assert_eq!(
            param.update_value(&ParameterValueUpdate::Raw(Box::new(3i32))),
            Some(3)
        );
        assert_eq!(
            param.update_value(&ParameterValueUpdate::Raw(Box::new(99usize))),
            Some(15)
        );
        assert_eq!(
            param.update_value(&ParameterValueUpdate::Raw(Box::new(1.0f32))),
            None
        );
    }
}
