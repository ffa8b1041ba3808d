#![no_main]

use ffmpeg_sandbox::transfer::ObjectUrl;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(url) = ObjectUrl::parse(raw) {
            assert!(!url.bucket.is_empty());
            assert!(!url.key.is_empty());
        }
    }
});
