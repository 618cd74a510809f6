#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use spine_detect::{DetectB, DetectorConfig};

#[derive(Debug, Arbitrary)]
struct Input {
    fixed_threshold: Option<f64>,
    k: f64,
    refractory_window_ms: f64,
    samples: Vec<(f64, f64, f64)>,
}

// Drive the detector with arbitrary configs and samples. Invalid configs and
// non-finite samples must be rejected, never panic.
fuzz_target!(|input: Input| {
    let config = DetectorConfig {
        fixed_threshold: input.fixed_threshold,
        k: input.k,
        refractory_window_ms: input.refractory_window_ms,
        ..DetectorConfig::default()
    };
    let Ok(mut detector) = DetectB::new(config) else {
        return;
    };
    for (value, timestamp_ms, dt_ms) in input.samples {
        if let Ok(signal) = detector.process(value, timestamp_ms, dt_ms) {
            assert!((0.0..=1.0).contains(&signal.confidence));
            assert!(signal.fire_count <= signal.sample_count);
        }
    }
});
