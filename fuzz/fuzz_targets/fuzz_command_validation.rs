#![no_main]

use ffmpeg_sandbox::sandbox::CommandValidator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(command) = std::str::from_utf8(data) {
        let validator = CommandValidator::default();
        assert_eq!(
            validator.validate(command).is_ok(),
            command.starts_with(validator.tool())
        );
    }
});
