#![no_main]

use libfuzzer_sys::fuzz_target;
use nodesel::selector::{parse, type_hint};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(selector) = parse(input) {
        let _ = type_hint(&selector);
        let _ = parse(&selector.to_string());
    }
});
