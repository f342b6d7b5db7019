#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlform::{parse_with_config, Config, MixedContent};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = xmlform::parse(s);
        let _ = parse_with_config(s, Config::default().with_mixed_content(MixedContent::Preserve));
    }
});
