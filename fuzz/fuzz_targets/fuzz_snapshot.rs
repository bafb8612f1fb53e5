#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Corrupt snapshots must be rejected, never panic
    let _ = pathfinder::index::snapshot::decode_mapping(data);
});
