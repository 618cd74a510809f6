#![no_main]

use libfuzzer_sys::fuzz_target;

use spine_crypto::fold_chain;
use spine_ledger::ReplayVerifier;

// Replay arbitrary bytes as a spine file. Must never panic, and the verified
// prefix must always fold to the reported head.
fuzz_target!(|data: &[u8]| {
    let outcome = ReplayVerifier::replay_bytes(data);
    assert_eq!(outcome.head(), fold_chain(&outcome.events));
    if let Some(index) = outcome.break_index() {
        assert_eq!(index, outcome.events.len());
    }
});
