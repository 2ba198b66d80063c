#![no_main]

use libfuzzer_sys::fuzz_target;
use rdpshelf::profile::codec;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic
    let profile = codec::decode_bytes("fuzz.rdp", data);

    // Whatever was decoded must encode again
    let _text = codec::to_rdp_text(&profile);
});
