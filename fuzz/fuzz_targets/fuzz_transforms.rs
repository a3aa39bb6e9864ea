#![no_main]
use libfuzzer_sys::fuzz_target;
use zenpngread::{FillerPlacement, Limits, LogSink, PngSession, Transform};

const TOGGLES: [Transform; 14] = [
    Transform::PaletteToRgb,
    Transform::GrayTo8,
    Transform::Strip16,
    Transform::StripAlpha,
    Transform::InvertAlpha,
    Transform::AddAlpha {
        value: 0xFFFF,
        placement: FillerPlacement::After,
    },
    Transform::Filler {
        value: 0,
        placement: FillerPlacement::Before,
    },
    Transform::Packing,
    Transform::Bgr,
    Transform::SwapAlpha,
    Transform::GrayToRgb,
    Transform::InvertMono,
    Transform::Swap16,
    Transform::PackSwap,
];

fuzz_target!(|input: &[u8]| {
    // first two bytes pick transforms, the rest is the stream
    let Some((mask, data)) = input.split_first_chunk::<2>() else {
        return;
    };
    let mask = u16::from_le_bytes(*mask);
    let limits = Limits {
        max_pixels: Some(1 << 20),
        max_memory_bytes: Some(1 << 26),
        ..Default::default()
    };
    let Ok(mut session) = PngSession::open_with_limits(data, LogSink, limits) else {
        return;
    };
    for (i, toggle) in TOGGLES.iter().enumerate() {
        if mask & (1 << i) != 0 {
            let _ = session.apply_transform(*toggle);
        }
    }
    if session.lock().is_err() {
        return;
    }
    let Ok(needed) = session.required_buffer_size() else {
        return;
    };
    let mut buf = vec![0u8; needed];
    let _ = session.decode(&mut buf);
});
