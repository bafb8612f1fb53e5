#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pathfinder::query::weighted_distance;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    query: &'a [u8],
    candidate: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let d = weighted_distance(input.query, input.candidate);

    // Inserting every candidate byte after the query is always possible
    if input.candidate.starts_with(input.query) {
        assert_eq!(d as usize, input.candidate.len() - input.query.len());
    }
    assert_eq!(weighted_distance(input.query, input.query), 0);
});
