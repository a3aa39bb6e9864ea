//! Row kernels for the transform pipeline.
//!
//! Each kernel reads one source row and appends the transformed row to
//! `out`. Samples of 16-bit rows are two bytes, most significant first,
//! until [`swap_bytes`] runs.

/// Extract the `index`th packed sample of a 1, 2, 4 or 8-bit row.
#[inline]
pub(crate) fn sample(row: &[u8], index: usize, depth: u8) -> u8 {
    if depth == 8 {
        return row[index];
    }
    let per_byte = usize::from(8 / depth);
    let byte = row[index / per_byte];
    let shift = 8 - usize::from(depth) * (index % per_byte + 1);
    (byte >> shift) & ((1_u16 << depth) - 1) as u8
}

/// Palette lookup table, padded to 256 entries.
///
/// Entries past the PLTE chunk are black, and alpha past the tRNS chunk is
/// opaque.
#[derive(Clone, Debug)]
pub(crate) struct Palette {
    pub rgb: [[u8; 3]; 256],
    pub alpha: Option<[u8; 256]>,
}

impl Palette {
    pub(crate) fn new(plte: &[u8], trns: Option<&[u8]>) -> Self {
        let mut rgb = [[0_u8; 3]; 256];
        for (entry, px) in rgb.iter_mut().zip(plte.chunks_exact(3)) {
            entry.copy_from_slice(px);
        }
        let alpha = trns.filter(|t| !t.is_empty()).map(|t| {
            let mut alpha = [0xFF_u8; 256];
            for (a, &t) in alpha.iter_mut().zip(t) {
                *a = t;
            }
            alpha
        });
        Self { rgb, alpha }
    }
}

pub(crate) fn expand_palette(src: &[u8], width: usize, depth: u8, palette: &Palette, out: &mut Vec<u8>) {
    for i in 0..width {
        let index = usize::from(sample(src, i, depth));
        out.extend_from_slice(&palette.rgb[index]);
        if let Some(alpha) = &palette.alpha {
            out.push(alpha[index]);
        }
    }
}

/// Scale 1, 2 or 4-bit gray to 8 bits (0b1 -> 0xFF, 0b11 -> 0xFF, ...).
pub(crate) fn expand_gray(src: &[u8], width: usize, depth: u8, out: &mut Vec<u8>) {
    let scale = gray_scale(depth);
    out.extend((0..width).map(|i| sample(src, i, depth) * scale));
}

pub(crate) fn gray_scale(depth: u8) -> u8 {
    match depth {
        1 => 0xFF,
        2 => 0x55,
        4 => 0x11,
        _ => 1,
    }
}

/// Append an alpha sample to every pixel: transparent where the pixel
/// equals `key`, opaque elsewhere.
pub(crate) fn trns_to_alpha(src: &[u8], pixel_bytes: usize, sample_bytes: usize, key: &[u8], out: &mut Vec<u8>) {
    for px in src.chunks_exact(pixel_bytes) {
        out.extend_from_slice(px);
        let alpha = if px == key { 0 } else { 0xFF };
        out.extend(std::iter::repeat_n(alpha, sample_bytes));
    }
}

/// Drop the trailing alpha sample of each pixel.
pub(crate) fn strip_alpha(src: &[u8], pixel_bytes: usize, sample_bytes: usize, out: &mut Vec<u8>) {
    for px in src.chunks_exact(pixel_bytes) {
        out.extend_from_slice(&px[..pixel_bytes - sample_bytes]);
    }
}

/// Replicate the gray sample into R, G and B, keeping alpha if present.
pub(crate) fn gray_to_rgb(src: &[u8], pixel_bytes: usize, sample_bytes: usize, out: &mut Vec<u8>) {
    for px in src.chunks_exact(pixel_bytes) {
        let (gray, alpha) = px.split_at(sample_bytes);
        for _ in 0..3 {
            out.extend_from_slice(gray);
        }
        out.extend_from_slice(alpha);
    }
}

/// Keep the most significant byte of every 16-bit sample.
pub(crate) fn strip_16(src: &[u8], out: &mut Vec<u8>) {
    out.extend(src.chunks_exact(2).map(|s| s[0]));
}

/// Invert gray samples. Alpha samples of gray-alpha rows are left alone.
///
/// `row_bits` is the number of meaningful bits in the row; padding bits
/// after them in the last byte are copied unchanged.
pub(crate) fn invert_mono(
    src: &[u8],
    pixel_bytes: usize,
    sample_bytes: usize,
    with_alpha: bool,
    row_bits: usize,
    out: &mut Vec<u8>,
) {
    if !with_alpha {
        let start = out.len();
        out.extend(src.iter().map(|b| !b));
        let used = row_bits % 8;
        if used != 0 {
            if let (Some(last), Some(&orig)) = (out[start..].last_mut(), src.last()) {
                let padding = 0xFF_u8 >> used;
                *last = (*last & !padding) | (orig & padding);
            }
        }
        return;
    }
    for px in src.chunks_exact(pixel_bytes) {
        let (gray, alpha) = px.split_at(sample_bytes);
        out.extend(gray.iter().map(|b| !b));
        out.extend_from_slice(alpha);
    }
}

/// Invert the trailing alpha sample of each pixel.
pub(crate) fn invert_alpha(src: &[u8], pixel_bytes: usize, sample_bytes: usize, out: &mut Vec<u8>) {
    for px in src.chunks_exact(pixel_bytes) {
        let (color, alpha) = px.split_at(pixel_bytes - sample_bytes);
        out.extend_from_slice(color);
        out.extend(alpha.iter().map(|b| !b));
    }
}

/// One byte per sample for 1, 2 and 4-bit rows, values unscaled.
pub(crate) fn unpack(src: &[u8], samples: usize, depth: u8, out: &mut Vec<u8>) {
    out.extend((0..samples).map(|i| sample(src, i, depth)));
}

/// Swap the first and third samples of each pixel (RGB -> BGR, RGBA -> BGRA).
pub(crate) fn bgr(src: &[u8], pixel_bytes: usize, sample_bytes: usize, out: &mut Vec<u8>) {
    let start = out.len();
    out.extend_from_slice(src);
    let row = &mut out[start..];

    #[cfg(feature = "simd")]
    {
        let swizzled = match pixel_bytes {
            3 if sample_bytes == 1 => garb::bytes::rgb_to_bgr_inplace(row).is_ok(),
            4 if sample_bytes == 1 => garb::bytes::rgba_to_bgra_inplace(row).is_ok(),
            _ => false,
        };
        if swizzled {
            return;
        }
    }

    for px in row.chunks_exact_mut(pixel_bytes) {
        for k in 0..sample_bytes {
            px.swap(k, 2 * sample_bytes + k);
        }
    }
}

/// Reverse the order of the pixels packed into each byte.
pub(crate) fn packswap(src: &[u8], depth: u8, out: &mut Vec<u8>) {
    out.extend(src.iter().map(|&b| match depth {
        1 => b.reverse_bits(),
        2 => ((b >> 6) & 0x03) | ((b >> 2) & 0x0C) | ((b << 2) & 0x30) | ((b << 6) & 0xC0),
        4 => b.rotate_left(4),
        _ => b,
    }));
}

/// Add a filler sample before or after each pixel.
pub(crate) fn filler(src: &[u8], pixel_bytes: usize, value: u16, sample_bytes: usize, before: bool, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes();
    let fill = if sample_bytes == 2 { &bytes[..] } else { &bytes[1..] };
    for px in src.chunks_exact(pixel_bytes) {
        if before {
            out.extend_from_slice(fill);
            out.extend_from_slice(px);
        } else {
            out.extend_from_slice(px);
            out.extend_from_slice(fill);
        }
    }
}

/// Move the trailing alpha sample to the front (RGBA -> ARGB, GA -> AG).
pub(crate) fn swap_alpha(src: &[u8], pixel_bytes: usize, sample_bytes: usize, out: &mut Vec<u8>) {
    for px in src.chunks_exact(pixel_bytes) {
        let (color, alpha) = px.split_at(pixel_bytes - sample_bytes);
        out.extend_from_slice(alpha);
        out.extend_from_slice(color);
    }
}

/// Swap the bytes of every 16-bit sample.
pub(crate) fn swap_bytes(src: &[u8], out: &mut Vec<u8>) {
    for s in src.chunks_exact(2) {
        out.extend_from_slice(&[s[1], s[0]]);
    }
}
