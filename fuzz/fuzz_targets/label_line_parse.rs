//! Fuzz target for label line parsing.
//!
//! Feeds arbitrary UTF-8 text to the line parser,
//! checking for panics or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelcurate::label::fuzz_parse_label_line;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_parse_label_line(text);
});
