#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Line parser must not panic on any input.
    if let Ok(s) = std::str::from_utf8(data) {
        for line in s.lines() {
            let _ = covup::llvm::parse_line_hits(line);
        }
    }
});
