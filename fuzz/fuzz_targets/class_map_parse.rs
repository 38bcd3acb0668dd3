//! Fuzz target for `OLD=NEW` class map parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelcurate::remap::{remap_text, ClassMap};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(map) = ClassMap::parse(input) {
        let _ = remap_text("0 0.5 0.5 0.1 0.1\n1 0.2 0.2 0.1 0.1\n", &map);
    }
});
