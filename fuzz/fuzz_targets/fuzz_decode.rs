#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpngread::{Diagnostics, Limits, PngSession};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 26),
        ..Default::default()
    };
    let mut diagnostics = Diagnostics::new();
    // Must never panic, and a failure must be reported exactly once
    let result = PngSession::open_with_limits(data, &mut diagnostics, limits)
        .and_then(|mut session| session.decode_to_vec());
    match result {
        Ok(out) => assert_eq!(
            out.pixels().len(),
            out.bytes_per_row * out.header.height as usize
        ),
        Err(_) => assert_eq!(diagnostics.errors().count(), 1),
    }
});
