#![cfg(all(debug_assertions, feature = "assert-allocs"))]

use itch::{ControlParameters, Sample, SynthOptions, Synthesizer};

// -------------------------------------------------------------------------------------------------

#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

#[test]
fn processing_does_not_allocate() {
    const CHANNEL_COUNT: usize = 2;
    const FRAME_COUNT: usize = 128;

    let (event_sender, event_receiver) = crossbeam_channel::bounded(4);
    let (mut synth, mut processor) = Synthesizer::new(
        48000,
        SynthOptions::default().slot_count(2),
        Some(event_sender),
    )
    .unwrap();
    synth
        .store_mut()
        .load_sample(1, Sample::from_interleaved("b.wav", vec![0.5; 512], 2, 44100).unwrap())
        .unwrap();

    let violations = assert_no_alloc::violation_count();
    let mut output = vec![0.0; FRAME_COUNT * CHANNEL_COUNT];
    for block in 0..50 {
        // replace the first slot from the control side every now and then
        if block % 10 == 0 {
            let sample =
                Sample::from_interleaved("a.wav", vec![0.25; 1024], 1, 48000).unwrap();
            synth.store_mut().load_sample(0, sample).unwrap();
        }
        if block == 25 {
            let state = synth.save_state_bytes(&ControlParameters::default()).unwrap();
            synth.restore_state_bytes(&state).unwrap();
        }
        let parameters = ControlParameters {
            // toggles the slot selection, overflowing the event channel
            slot_num: block % 2,
            scratch: (block as f32 / 50.0).fract(),
            slew_rate: 1.0,
            ..Default::default()
        };
        processor.process(&mut output, CHANNEL_COUNT, &parameters);
    }
    assert_eq!(assert_no_alloc::violation_count(), violations);

    synth.store_mut().collect_garbage();
    assert!(event_receiver.try_iter().count() > 0);
}
