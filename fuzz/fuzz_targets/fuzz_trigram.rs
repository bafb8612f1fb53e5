#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Trigram extraction must accept any UTF-8 path and any query
    if let Ok(s) = std::str::from_utf8(data) {
        let name = pathfinder::utils::basename(s);
        assert!(s.ends_with(name));

        let trigrams = pathfinder::utils::basename_trigrams(s);
        assert!(trigrams.windows(2).all(|w| w[0] < w[1]));

        let _ = pathfinder::utils::query_trigrams(s);
    }
});
