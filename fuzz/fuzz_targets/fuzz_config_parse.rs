#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(cfg) = ffmpeg_sandbox::Config::parse(s) {
            assert!(cfg.sandbox.effective_suffix_len() >= ffmpeg_sandbox::config::MIN_SUFFIX_LEN);
        }
    }
});
