//! Persisted session state: a small nested key/value document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{controls::ControlParameters, error::Error, smoother::SmoothingState};

// -------------------------------------------------------------------------------------------------

/// A tagged node with string attributes and child nodes.
///
/// Attribute values are stored as strings, so documents written by older or newer versions
/// remain readable: typed getters fall back to a default when an attribute is missing or
/// can't be parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<StateElement>,
}

impl StateElement {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn set_attribute<V: ToString>(&mut self, name: &str, value: V) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn string_attribute(&self, name: &str, default: &str) -> String {
        self.attribute(name).unwrap_or(default).to_string()
    }

    pub fn int_attribute(&self, name: &str, default: i64) -> i64 {
        self.attribute(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn float_attribute(&self, name: &str, default: f32) -> f32 {
        self.attribute(name)
            .and_then(|value| value.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(default)
    }

    pub fn add_child(&mut self, child: StateElement) -> &mut StateElement {
        self.children.push(child);
        let index = self.children.len() - 1;
        &mut self.children[index]
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&StateElement> {
        self.children.iter().find(|child| child.has_tag(tag))
    }

    /// All children with the given tag.
    pub fn children_with_tag<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a StateElement> + 'a {
        self.children.iter().filter(move |child| child.has_tag(tag))
    }

    /// Serialize the document into an opaque binary blob, e.g. for plugin hosts.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize a document from a blob created with [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// -------------------------------------------------------------------------------------------------

/// Tag of the root element of synthesizer documents.
pub const ROOT_TAG: &str = "Itch";
/// Tag of the sample store child element.
pub const SYNTH_TAG: &str = "Synth";
/// Tag of the store's per slot child elements.
pub const SLOT_TAG: &str = "Slot";

/// Slew rate used when a document doesn't specify one.
pub const DEFAULT_RESTORED_SLEW_RATE: f32 = 0.25;

// -------------------------------------------------------------------------------------------------

/// Everything the synthesizer persists, in plain values.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthState {
    pub parameters: ControlParameters,
    /// Slot index which was last applied from the `slot_num` parameter.
    pub last_slot_num: usize,
    pub smoothing: SmoothingState,
    /// The sample store's current slot.
    pub current_slot: usize,
    /// File paths of all loaded slots, as `(slot index, path)` pairs.
    pub slots: Vec<(usize, String)>,
}

impl Default for SynthState {
    fn default() -> Self {
        Self {
            parameters: ControlParameters {
                slew_rate: DEFAULT_RESTORED_SLEW_RATE,
                ..Default::default()
            },
            last_slot_num: 0,
            smoothing: SmoothingState::default(),
            current_slot: 0,
            slots: Vec::new(),
        }
    }
}

impl SynthState {
    /// Write the state into a new root document.
    pub fn to_element(&self) -> StateElement {
        let mut root = StateElement::new(ROOT_TAG);
        let parameters = &self.parameters;
        root.set_attribute("slotNum", parameters.slot_num);
        root.set_attribute("lastSlotNum", self.last_slot_num);
        root.set_attribute("scratch", parameters.scratch);
        root.set_attribute("lastScratch", self.smoothing.last_scratch);
        root.set_attribute("lastLastScratch", self.smoothing.smoothed_scratch);
        root.set_attribute("volume", parameters.volume);
        root.set_attribute("lastVolume", self.smoothing.last_volume);
        root.set_attribute("lastLastVolume", self.smoothing.smoothed_volume);
        root.set_attribute("slewRate", parameters.slew_rate);
        root.set_attribute("slewCurve", parameters.slew_curve);
        root.set_attribute("start", parameters.start);
        root.set_attribute("end", parameters.end);

        let synth = root.add_child(StateElement::new(SYNTH_TAG));
        synth.set_attribute("currentSlot", self.current_slot);
        for (index, path) in &self.slots {
            let slot = synth.add_child(StateElement::new(SLOT_TAG));
            slot.set_attribute("index", index);
            slot.set_attribute("path", path);
        }
        root
    }

    /// Read the state from a root document. Missing or malformed attributes fall back to
    /// their defaults. Fails only when the root element isn't a synthesizer document.
    pub fn from_element(root: &StateElement) -> Result<Self, Error> {
        if !root.has_tag(ROOT_TAG) {
            return Err(Error::StateError(format!(
                "unexpected root element '{}'",
                root.tag
            )));
        }
        let defaults = Self::default();
        let index_attribute = |element: &StateElement, name: &str, default: usize| {
            usize::try_from(element.int_attribute(name, default as i64)).unwrap_or(default)
        };

        let parameters = ControlParameters {
            slot_num: index_attribute(root, "slotNum", defaults.parameters.slot_num),
            scratch: root.float_attribute("scratch", defaults.parameters.scratch),
            volume: root.float_attribute("volume", defaults.parameters.volume),
            slew_rate: root.float_attribute("slewRate", defaults.parameters.slew_rate),
            slew_curve: root.float_attribute("slewCurve", defaults.parameters.slew_curve),
            start: root.float_attribute("start", defaults.parameters.start),
            end: root.float_attribute("end", defaults.parameters.end),
        }
        .clamped();
        let smoothing = SmoothingState {
            last_scratch: root.float_attribute("lastScratch", defaults.smoothing.last_scratch),
            smoothed_scratch: root
                .float_attribute("lastLastScratch", defaults.smoothing.smoothed_scratch),
            last_volume: root.float_attribute("lastVolume", defaults.smoothing.last_volume),
            smoothed_volume: root
                .float_attribute("lastLastVolume", defaults.smoothing.smoothed_volume),
        };
        let last_slot_num = index_attribute(root, "lastSlotNum", defaults.last_slot_num);

        let (current_slot, slots) = match root.child(SYNTH_TAG) {
            Some(synth) => {
                let current_slot = index_attribute(synth, "currentSlot", defaults.current_slot);
                let slots = synth
                    .children_with_tag(SLOT_TAG)
                    .filter_map(|slot| {
                        let index = usize::try_from(slot.int_attribute("index", -1)).ok()?;
                        let path = slot.attribute("path").filter(|path| !path.is_empty())?;
                        Some((index, path.to_string()))
                    })
                    .collect();
                (current_slot, slots)
            }
            None => (defaults.current_slot, defaults.slots),
        };

        Ok(Self {
            parameters,
            last_slot_num,
            smoothing,
            current_slot,
            slots,
        })
    }
}

// -------------------------------------------------------------------------------------------------
