use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use itch::{
    renderer::{PlaybackRenderer, Ramp},
    ControlParameters, Error, Sample, SampleStore, SynthEvent, SynthOptions, Synthesizer,
    NOT_LOADED_NAME,
};

// -------------------------------------------------------------------------------------------------

fn write_wav(path: &Path, samples: &[f32], channel_count: u16) {
    let spec = hound::WavSpec {
        channels: channel_count,
        sample_rate: 44100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for sample in samples {
        writer.write_sample(*sample).unwrap();
    }
    writer.finalize().unwrap();
}

// 16 frames of 16-bit stereo at 44.1 kHz in verbatim subframes: the left channel ramps up
// from 0 in steps of 1/16, the right channel mirrors it.
const STEREO_RAMP_FLAC: [u8; 117] = [
    0x66, 0x4c, 0x61, 0x43, 0x80, 0x00, 0x00, 0x22, 0x00, 0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x0a, 0xc4, 0x42, 0xf0, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xf8, 0x69, 0x18, 0x00, 0x0f,
    0x92, 0x02, 0x00, 0x00, 0x08, 0x00, 0x10, 0x00, 0x18, 0x00, 0x20, 0x00, 0x28, 0x00, 0x30, 0x00,
    0x38, 0x00, 0x40, 0x00, 0x48, 0x00, 0x50, 0x00, 0x58, 0x00, 0x60, 0x00, 0x68, 0x00, 0x70, 0x00,
    0x78, 0x00, 0x02, 0x00, 0x00, 0xf8, 0x00, 0xf0, 0x00, 0xe8, 0x00, 0xe0, 0x00, 0xd8, 0x00, 0xd0,
    0x00, 0xc8, 0x00, 0xc0, 0x00, 0xb8, 0x00, 0xb0, 0x00, 0xa8, 0x00, 0xa0, 0x00, 0x98, 0x00, 0x90,
    0x00, 0x88, 0x00, 0xee, 0xb5,
];

fn ten_frame_file(dir: &Path) -> PathBuf {
    let path = dir.join("ten.wav");
    let frames = (0..10).map(|f| f as f32 / 10.0).collect::<Vec<_>>();
    write_wav(&path, &frames, 1);
    path
}

// -------------------------------------------------------------------------------------------------

#[test]
fn renders_first_half_of_a_loaded_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = ten_frame_file(dir.path());

    let mut store = SampleStore::new(4, Duration::from_secs(1), None).unwrap();
    let slot = store.load(&path, Duration::from_secs(1), None, false).unwrap();
    assert_eq!(slot, 0);
    assert_eq!(store.select(0).unwrap(), 0);

    let renderer = PlaybackRenderer::new(store.table());
    let mut output = [0.0; 10];
    renderer.render(
        &mut output,
        1,
        0,
        10,
        Ramp::new(0.0, 0.5),
        Ramp::constant(1.0),
    );
    let expected = [0.0, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45];
    for (rendered, expected) in output.iter().zip(expected) {
        assert!((rendered - expected).abs() < 1e-6, "{rendered} != {expected}");
    }
}

#[test]
fn unloading_the_current_slot_renders_silence() {
    let dir = tempfile::tempdir().unwrap();
    let path = ten_frame_file(dir.path());

    let mut store = SampleStore::new(4, Duration::from_secs(1), None).unwrap();
    let slot = store.load(&path, Duration::from_secs(1), None, true).unwrap();
    store.unload(slot).unwrap();
    assert_eq!(store.current_slot(), slot);
    assert_eq!(store.current_slot_name(), NOT_LOADED_NAME);

    let renderer = PlaybackRenderer::new(store.table());
    let mut output = [1.0; 20];
    renderer.render(
        &mut output,
        2,
        0,
        10,
        Ramp::new(0.0, 1.0),
        Ramp::constant(1.0),
    );
    assert_eq!(output, [0.0; 20]);
}

#[test]
fn consecutive_loads_never_replace_occupied_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = ten_frame_file(dir.path());
    let other_path = dir.path().join("other.flac");

    let mut store = SampleStore::new(2, Duration::from_secs(1), None).unwrap();
    store.load(&path, Duration::from_secs(1), None, false).unwrap();
    assert_eq!(store.first_open_slot(), Some(1));

    // the first load fails to decode and must not consume the free slot
    assert!(store
        .load(&other_path, Duration::from_secs(1), None, false)
        .is_err());
    assert_eq!(store.first_open_slot(), Some(1));

    // the second one reuses it, leaving slot 0 alone
    assert_eq!(
        store.load(&path, Duration::from_secs(1), None, false).unwrap(),
        1
    );
    assert_eq!(store.slot_file_path(0), Some(path.clone()));
    assert_eq!(store.first_open_slot(), None);
}

#[test]
fn decodes_flac_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.flac");
    std::fs::write(&path, STEREO_RAMP_FLAC).unwrap();
    let expected = (0..16)
        .flat_map(|frame| [frame as f32 / 16.0, -(frame as f32) / 16.0])
        .collect::<Vec<_>>();

    let sample = Sample::from_file(&path, Duration::from_secs(1)).unwrap();
    assert_eq!(sample.channel_count(), 2);
    assert_eq!(sample.frame_count(), 16);
    assert_eq!(sample.sample_rate(), 44100);
    assert_eq!(sample.buffer(), expected.as_slice());
    assert_eq!(sample.name(), "ramp.flac");

    let mut store = SampleStore::new(2, Duration::from_secs(1), None).unwrap();
    let slot = store.load(&path, Duration::from_secs(1), Some(0), true).unwrap();
    assert_eq!(slot, 1);
    assert_eq!(store.current_slot_name(), "ramp.flac");

    // second half of the file, frame by frame
    let renderer = PlaybackRenderer::new(store.table());
    let mut output = [0.0; 4];
    renderer.render(
        &mut output,
        2,
        0,
        2,
        Ramp::new(0.5, 1.0),
        Ramp::constant(1.0),
    );
    assert_eq!(output, [0.5, -0.5, 0.75, -0.75]);
}

#[test]
fn unsupported_files_leave_the_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.ogg");
    std::fs::write(&path, b"OggS").unwrap();

    let mut store = SampleStore::new(2, Duration::from_secs(1), None).unwrap();
    assert_eq!(
        store.load_index(&path, Duration::from_secs(1), None, true),
        SampleStore::NOT_FOUND
    );
    assert!(matches!(
        store.load(&path, Duration::from_secs(1), None, true),
        Err(Error::UnsupportedFileFormat(_))
    ));
    assert_eq!(store.first_open_slot(), Some(0));
    assert_eq!(store.current_slot(), 0);
}

#[test]
fn state_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = ten_frame_file(dir.path());
    let missing_path = dir.path().join("gone.wav");
    write_wav(&missing_path, &[0.5; 4], 2);

    let options = SynthOptions::default().slot_count(4);
    let (mut synth, mut processor) = Synthesizer::new(44100, options, None).unwrap();
    synth.load(&path).unwrap();
    synth.load(&missing_path).unwrap();
    synth.store().select(1).unwrap();

    let parameters = ControlParameters {
        scratch: 0.8,
        volume: 0.7,
        slew_rate: 0.3,
        slew_curve: 0.2,
        start: 0.1,
        end: 0.6,
        ..Default::default()
    };
    let mut output = vec![0.0; 128 * 2];
    processor.process(&mut output, 2, &parameters);
    processor.process(&mut output, 2, &parameters);
    let smoothing = processor.smoothing_state();

    let bytes = synth.save_state_bytes(&parameters).unwrap();
    std::fs::remove_file(&missing_path).unwrap();

    let (mut restored_synth, mut restored_processor) =
        Synthesizer::new(44100, options, None).unwrap();
    let restored_parameters = restored_synth.restore_state_bytes(&bytes).unwrap();
    assert_eq!(restored_parameters, parameters);

    let store = restored_synth.store();
    assert_eq!(store.current_slot(), 1);
    assert!(store.is_loaded(0));
    assert_eq!(store.slot_file_path(0), Some(path));
    // the missing file leaves its slot empty
    assert!(!store.is_loaded(1));
    assert_eq!(store.current_slot_name(), NOT_LOADED_NAME);

    assert_eq!(restored_synth.smoothing_state(), smoothing);
    // the render thread picks up the smoothing state with its next block
    let at_rest = ControlParameters {
        scratch: smoothing.smoothed_scratch,
        volume: smoothing.smoothed_volume,
        ..restored_parameters
    };
    restored_processor.process(&mut output, 2, &at_rest);
    assert_eq!(
        restored_processor.smoothing_state().smoothed_scratch,
        smoothing.smoothed_scratch
    );
}

#[test]
fn events() {
    let dir = tempfile::tempdir().unwrap();
    let path = ten_frame_file(dir.path());

    let (sender, receiver) = crossbeam_channel::bounded(8);
    let (mut synth, mut processor) =
        Synthesizer::new(44100, SynthOptions::default(), Some(sender)).unwrap();
    synth.load(&path).unwrap();
    processor.process(
        &mut [0.0; 64],
        1,
        &ControlParameters {
            slot_num: 3,
            ..Default::default()
        },
    );
    synth.store_mut().unload(0).unwrap();

    assert_eq!(
        receiver.try_iter().collect::<Vec<_>>(),
        vec![
            SynthEvent::SampleLoaded { slot: 0, path },
            SynthEvent::SlotSelected { slot: 0 },
            SynthEvent::SlotSelected { slot: 3 },
            SynthEvent::SampleUnloaded { slot: 0 },
        ]
    );
    assert_eq!(synth.store().current_slot(), 3);
}
