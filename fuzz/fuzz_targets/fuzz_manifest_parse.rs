#![no_main]

use libfuzzer_sys::fuzz_target;

use spine_manifest::{Manifest, ManifestVerifier};
use spine_types::Event;

// Parse arbitrary bytes as a manifest and check an empty bundle against it.
fuzz_target!(|data: &[u8]| {
    if let Ok(manifest) = serde_json::from_slice::<Manifest>(data) {
        let events: Vec<Event> = Vec::new();
        let _ = ManifestVerifier::verify_bundle(&events, &manifest);
        let _ = serde_json::to_string(&manifest);
    }
});
