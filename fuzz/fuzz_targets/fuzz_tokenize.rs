#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|line: &str| {
    // The tokenizer must reject or split any line without panicking.
    let _ = mc_dsl::tokenize(line);
});
