//! Renders a scripted scratch gesture over a sample file into a WAV file.
//!
//! The sample gets loaded on the control (main) thread while a separate render thread
//! processes blocks, like an audio device callback would do.

use std::{f32::consts::PI, io, path::PathBuf, thread};

use arg::{parse_args, Args};

use itch::{ControlParameters, Error, SynthEvent, SynthOptions, Synthesizer};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

const SAMPLE_RATE: u32 = 48000;
const CHANNEL_COUNT: usize = 2;
const BLOCK_SIZE: usize = 256;

// -------------------------------------------------------------------------------------------------

/// render-scratch: scratch a WAV or FLAC file into a new WAV file.
#[derive(Args, Debug, Default)]
struct Arguments {
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    /// By default \"debug\" in dev builds and \"warn\" in release builds.
    log_level: Option<log::Level>,
    #[arg(short = "d", long = "duration", default_value = "4.0")]
    /// Length of the rendered output in seconds.
    duration: f32,
    #[arg(short = "s", long = "slew-rate", default_value = "0.5")]
    /// Slew rate of the scratch control in range 0-1.
    slew_rate: f32,
    #[arg(required)]
    /// The sample file to scratch.
    input_path: PathBuf,
    #[arg(required)]
    /// Path of the rendered WAV file.
    output_path: PathBuf,
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        // disable logging in chatty modules
        .with_module_level("symphonia_core", log::LevelFilter::Warn)
        .with_module_level("symphonia_format", log::LevelFilter::Warn)
        .init()
        .expect("Failed to set logger");

    // Create the synth and print its notifications
    let (event_sender, event_receiver) = crossbeam_channel::bounded(32);
    let (mut synth, mut processor) =
        Synthesizer::new(SAMPLE_RATE, SynthOptions::default(), Some(event_sender))?;
    let slot = synth.load(&args.input_path)?;
    println!(
        "Loaded '{}' into slot {slot}",
        synth.store().current_slot_name()
    );

    // Render the gesture on a separate thread
    let block_count = (args.duration.max(0.0) * SAMPLE_RATE as f32) as usize / BLOCK_SIZE;
    let slew_rate = args.slew_rate;
    let render_thread = thread::spawn(move || {
        let mut output = vec![0.0; block_count * BLOCK_SIZE * CHANNEL_COUNT];
        for (block_index, block) in output
            .chunks_exact_mut(BLOCK_SIZE * CHANNEL_COUNT)
            .enumerate()
        {
            let time = (block_index * BLOCK_SIZE) as f32 / SAMPLE_RATE as f32;
            let parameters = ControlParameters {
                slot_num: slot,
                // forward and back strokes, getting faster over time
                scratch: 0.5 - 0.5 * (PI * time * (1.0 + time)).cos(),
                // fade out in the last second
                volume: (args.duration - time).clamp(0.0, 1.0),
                slew_rate,
                ..Default::default()
            };
            processor.process(block, CHANNEL_COUNT, &parameters);
        }
        output
    });
    let output = render_thread
        .join()
        .map_err(|_| Error::IoError(io::Error::other("render thread panicked")))?;

    for event in event_receiver.try_iter() {
        if let SynthEvent::SlotSelected { slot } = event {
            println!("Selected slot {slot}");
        }
    }

    // Write the result
    let wav_error = |err: hound::Error| Error::IoError(io::Error::other(err));
    let spec = hound::WavSpec {
        channels: CHANNEL_COUNT as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.output_path, spec)
        .map_err(wav_error)?;
    for sample in output {
        writer
            .write_sample(sample)
            .map_err(wav_error)?;
    }
    writer
        .finalize()
        .map_err(wav_error)?;
    println!(
        "Rendered {block_count} blocks into '{}'",
        args.output_path.display()
    );

    Ok(())
}
