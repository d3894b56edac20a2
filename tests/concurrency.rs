use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use itch::{ControlParameters, Sample, SynthOptions, Synthesizer};

// -------------------------------------------------------------------------------------------------

#[test]
fn load_and_unload_while_rendering() {
    const CHANNEL_COUNT: usize = 2;
    const FRAME_COUNT: usize = 64;

    let (mut synth, mut processor) =
        Synthesizer::new(48000, SynthOptions::default().slot_count(2), None).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let render_thread = thread::spawn({
        let running = Arc::clone(&running);
        move || {
            let mut output = vec![0.0; FRAME_COUNT * CHANNEL_COUNT];
            let mut rendered_blocks = 0;
            let mut scratch = 0.0;
            while running.load(Ordering::Acquire) {
                scratch = (scratch + 0.01) % 1.0;
                let parameters = ControlParameters {
                    scratch,
                    slew_rate: 1.0,
                    ..Default::default()
                };
                processor.process(&mut output, CHANNEL_COUNT, &parameters);
                // every sample is either silence or one of the complete sample buffers
                for value in &output {
                    assert!(
                        *value == 0.0 || *value == 0.25 || *value == -0.5,
                        "unexpected sample value {value}"
                    );
                }
                rendered_blocks += 1;
            }
            rendered_blocks
        }
    });

    // replace the contents of the current slot again and again, with alternating layouts
    for iteration in 0..200 {
        let sample = if iteration % 2 == 0 {
            Sample::from_interleaved("a.wav", vec![0.25; 4096], 1, 48000).unwrap()
        } else {
            Sample::from_interleaved("b.wav", vec![-0.5; 1024 * 2], 2, 44100).unwrap()
        };
        synth.store_mut().load_sample(0, sample).unwrap();
        if iteration % 3 == 0 {
            synth.store_mut().unload(0).unwrap();
        }
        thread::sleep(Duration::from_micros(100));
    }
    synth.store_mut().unload(0).unwrap();

    running.store(false, Ordering::Release);
    let rendered_blocks = render_thread.join().unwrap();
    assert!(rendered_blocks > 0);

    // all replaced samples got released once the renderer no longer uses them
    synth.store_mut().collect_garbage();
    assert!(!synth.store().is_loaded(0));
    assert_eq!(synth.store().allocation_count(), 2);
}
