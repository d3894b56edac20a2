#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod controls;
mod error;
mod event;
mod processor;
mod sample;
mod state;
mod store;
mod synth;

// public, flat re-exports
pub use controls::ControlParameters;
pub use error::Error;
pub use event::SynthEvent;
pub use processor::SynthProcessor;
pub use sample::{Sample, SampleFileFormat};
pub use state::{StateElement, SynthState};
pub use store::{SampleSlot, SampleStore, SlotTable, MAX_SAMPLES, NOT_LOADED_NAME};
pub use synth::{SynthOptions, Synthesizer};

// public mods
pub mod parameter;
pub mod renderer;
pub mod smoother;
pub mod utils;
