#![no_main]

use libfuzzer_sys::fuzz_target;
use rdpshelf::profile::store;

fuzz_target!(|data: &[u8]| {
    // Parse arbitrary text as a profiles document; failures are fine, panics are not
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(profiles) = store::parse_document(s) {
            let _json = serde_json::to_string(&profiles);
        }
    }
});
