#![no_main]

//! Recording parser fuzzer.
//!
//! Arbitrary bytes must either fail to parse or produce a recording that
//! replays to the end without panicking.

use libfuzzer_sys::fuzz_target;
use skirmish::replay::{Recording, ReplayEngine};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(recording) = Recording::from_json(text) else {
        return;
    };
    // Keep runtime bounded on huge boards.
    let cells = u32::from(recording.config.grid_width) * u32::from(recording.config.grid_height);
    if cells > 4096 || recording.len() > 1024 {
        return;
    }
    if let Ok(mut engine) = ReplayEngine::new(recording) {
        engine.run_to_end();
    }
});
