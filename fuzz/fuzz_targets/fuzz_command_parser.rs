#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // The remote line protocol sees arbitrary serial bytes; parse must
    // never panic and malformed input must map to None.
    let _ = winch_core::Command::parse(data);
});
