#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlform::{render_html, render_source, to_xml, SchemaIndex, TranscodeOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let doc = render_source(s, &SchemaIndex::empty(), &TranscodeOptions::default());
        let _ = render_html(&doc);
        let _ = to_xml(&doc);
    }
});
