#![no_main]

use libfuzzer_sys::fuzz_target;
use tabq_core::parser;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (ignore invalid UTF-8)
    if let Ok(query) = std::str::from_utf8(data) {
        // Limit query length to prevent timeout
        if query.len() > 10_000 {
            return;
        }

        // Parsing arbitrary input must never panic
        let _ = parser::parse(query);
    }
});
