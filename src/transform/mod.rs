//! Pre-decode transforms and the row pipeline they compile to.
//!
//! Toggles are recorded in issued order. At lock they are folded into a
//! configuration and compiled against the image into a list of row
//! stages. Stages always run in the engine's fixed order (the libpng
//! order) regardless of issue order: expand, strip alpha, gray to RGB,
//! strip 16, invert mono, unpack, BGR, packswap, filler, invert alpha,
//! swap alpha, swap bytes.
//!
//! A filler channel is only reported as alpha: the row stages after it
//! still see a colour type without alpha, so alpha inversion and alpha
//! swapping leave a filler-added channel alone.

pub(crate) mod ops;

use log::debug;

use crate::error::PngReadError;
use crate::header::{ImageHeader, row_bytes};
use crate::pixel::{ColorType, PixelLayout};
use ops::Palette;

/// Where a filler channel goes relative to the pixel's samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FillerPlacement {
    /// XRGB / XG
    Before,
    /// RGBX / GX
    After,
}

/// A decode-time pixel transform.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Expand palette images to RGB, or RGBA when a tRNS chunk is present.
    /// Like libpng, this also expands low-depth gray and tRNS colour keys.
    PaletteToRgb,
    /// Expand 1, 2 and 4-bit grayscale to 8 bits, scaling values.
    /// Like libpng, this also expands palette images, tRNS included.
    GrayTo8,
    /// Reduce 16-bit samples to 8 bits by keeping the high byte.
    Strip16,
    /// Remove the alpha channel. A tRNS chunk is then ignored.
    StripAlpha,
    /// Store alpha as transparency (0 = opaque).
    InvertAlpha,
    /// Add a filler channel to 8/16-bit gray or RGB pixels and report it as alpha.
    /// [`Transform::InvertAlpha`] and [`Transform::SwapAlpha`] leave the channel alone.
    AddAlpha {
        value: u16,
        placement: FillerPlacement,
    },
    /// Add a filler channel to 8/16-bit gray or RGB pixels. The colour type is unchanged.
    Filler {
        value: u16,
        placement: FillerPlacement,
    },
    /// Store 1, 2 and 4-bit samples one per byte, values unscaled.
    Packing,
    /// Store colour as blue, green, red.
    Bgr,
    /// Move alpha before the colour samples (ARGB, AG).
    SwapAlpha,
    /// Replicate gray into red, green and blue. Implies [`Transform::GrayTo8`].
    GrayToRgb,
    /// Invert the gray samples of grayscale images.
    InvertMono,
    /// Store 16-bit samples little-endian.
    Swap16,
    /// Reverse the order of 1, 2 and 4-bit pixels within each byte.
    PackSwap,
}

/// Transforms in the order they were issued.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformSet {
    items: Vec<Transform>,
}

impl TransformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transform. Returns `false` if it was already present; the
    /// duplicate is still recorded.
    pub fn push(&mut self, transform: Transform) -> bool {
        let fresh = !self.items.contains(&transform);
        self.items.push(transform);
        fresh
    }

    pub fn as_slice(&self) -> &[Transform] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transform> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a TransformSet {
    type Item = &'a Transform;
    type IntoIter = std::slice::Iter<'a, Transform>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Transform> for TransformSet {
    fn from_iter<I: IntoIterator<Item = Transform>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Engine configuration accumulated from the toggles.
#[derive(Clone, Copy, Debug, Default)]
struct Config {
    expand: bool,
    expand_trns: bool,
    strip_16: bool,
    strip_alpha: bool,
    invert_alpha: bool,
    filler: Option<(u16, FillerPlacement)>,
    /// Sticky: a later plain filler keeps the channel reported as alpha.
    add_alpha: bool,
    packing: bool,
    bgr: bool,
    swap_alpha: bool,
    gray_to_rgb: bool,
    invert_mono: bool,
    swap_16: bool,
    packswap: bool,
}

impl Config {
    fn from_set(set: &TransformSet) -> Self {
        let mut cfg = Config::default();
        for transform in set {
            match *transform {
                Transform::PaletteToRgb => {
                    cfg.expand = true;
                    cfg.expand_trns = true;
                }
                Transform::GrayTo8 => cfg.expand = true,
                Transform::Strip16 => cfg.strip_16 = true,
                Transform::StripAlpha => cfg.strip_alpha = true,
                Transform::InvertAlpha => cfg.invert_alpha = true,
                // a later filler replaces the value and placement of an earlier one
                Transform::AddAlpha { value, placement } => {
                    cfg.filler = Some((value, placement));
                    cfg.add_alpha = true;
                }
                Transform::Filler { value, placement } => cfg.filler = Some((value, placement)),
                Transform::Packing => cfg.packing = true,
                Transform::Bgr => cfg.bgr = true,
                Transform::SwapAlpha => cfg.swap_alpha = true,
                Transform::GrayToRgb => {
                    cfg.gray_to_rgb = true;
                    cfg.expand = true;
                }
                Transform::InvertMono => cfg.invert_mono = true,
                Transform::Swap16 => cfg.swap_16 = true,
                Transform::PackSwap => cfg.packswap = true,
            }
        }
        if cfg.strip_alpha {
            cfg.expand_trns = false;
        }
        cfg
    }
}

/// Shape of a row at some point in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RowInfo {
    pub color_type: ColorType,
    pub bit_depth: u8,
    pub channels: u8,
}

impl RowInfo {
    pub(crate) fn of(header: &ImageHeader) -> Self {
        Self {
            color_type: header.color_type,
            bit_depth: header.bit_depth,
            channels: header.channels,
        }
    }

    fn sample_bytes(&self) -> usize {
        if self.bit_depth == 16 { 2 } else { 1 }
    }

    /// Bytes per pixel; only meaningful for 8 and 16-bit rows.
    fn pixel_bytes(&self) -> usize {
        usize::from(self.channels) * self.sample_bytes()
    }
}

#[derive(Clone, Debug)]
enum Step {
    ExpandPalette(Box<Palette>),
    ExpandGray,
    TrnsToAlpha(Vec<u8>),
    StripAlpha,
    GrayToRgb,
    Strip16,
    InvertMono,
    InvertAlpha,
    Unpack,
    Bgr,
    PackSwap,
    Filler { value: u16, before: bool },
    SwapAlpha,
    SwapBytes,
}

#[derive(Clone, Debug)]
struct Stage {
    step: Step,
    /// Row shape going into this stage.
    input: RowInfo,
}

impl Stage {
    fn apply(&self, width: usize, src: &[u8], out: &mut Vec<u8>) {
        let info = &self.input;
        let depth = info.bit_depth;
        let px = info.pixel_bytes();
        let sb = info.sample_bytes();
        match &self.step {
            Step::ExpandPalette(palette) => ops::expand_palette(src, width, depth, palette, out),
            Step::ExpandGray => ops::expand_gray(src, width, depth, out),
            Step::TrnsToAlpha(key) => ops::trns_to_alpha(src, px, sb, key, out),
            Step::StripAlpha => ops::strip_alpha(src, px, sb, out),
            Step::GrayToRgb => ops::gray_to_rgb(src, px, sb, out),
            Step::Strip16 => ops::strip_16(src, out),
            Step::InvertMono => {
                let with_alpha = info.color_type == ColorType::GrayAlpha;
                let row_bits = width * usize::from(info.channels) * usize::from(depth);
                ops::invert_mono(src, px, sb, with_alpha, row_bits, out)
            }
            Step::InvertAlpha => ops::invert_alpha(src, px, sb, out),
            Step::Unpack => ops::unpack(src, width * usize::from(info.channels), depth, out),
            Step::Bgr => ops::bgr(src, px, sb, out),
            Step::PackSwap => ops::packswap(src, depth, out),
            Step::Filler { value, before } => ops::filler(src, px, *value, sb, *before, out),
            Step::SwapAlpha => ops::swap_alpha(src, px, sb, out),
            Step::SwapBytes => ops::swap_bytes(src, out),
        }
    }
}

/// What the pipeline needs to know about the image beyond its header.
pub(crate) struct SourceImage<'a> {
    pub header: ImageHeader,
    /// PLTE chunk, RGB triplets.
    pub palette: Option<&'a [u8]>,
    /// tRNS chunk, raw.
    pub trns: Option<&'a [u8]>,
}

/// Compiled row transforms for one locked session.
#[derive(Debug)]
pub(crate) struct Pipeline {
    width: usize,
    stages: Vec<Stage>,
    input: RowInfo,
    output: RowInfo,
    layout: Option<PixelLayout>,
    scratch: [Vec<u8>; 2],
}

impl Pipeline {
    /// Compile `set` against `source`. Returns the pipeline and one warning
    /// per transform that has no effect on this image.
    pub(crate) fn build(
        source: &SourceImage<'_>,
        set: &TransformSet,
    ) -> Result<(Self, Vec<String>), PngReadError> {
        let cfg = Config::from_set(set);
        let header = source.header;
        let input = RowInfo::of(&header);
        let mut info = input;
        let mut stages = Vec::new();
        let mut push = |step: Step, info: &RowInfo| {
            stages.push(Stage {
                step,
                input: *info,
            })
        };

        let mut bgr_applied = false;
        let mut swap_alpha_applied = false;
        let mut filler_applied = None;
        let mut alpha_added = false;

        if cfg.expand {
            if info.color_type == ColorType::Palette {
                let plte = source.palette.ok_or_else(|| {
                    PngReadError::MalformedInput("palette image without PLTE chunk".into())
                })?;
                // palette tRNS follows any expansion, unlike gray and RGB colour keys
                let trns = if cfg.strip_alpha { None } else { source.trns };
                let palette = Palette::new(plte, trns);
                let with_alpha = palette.alpha.is_some();
                push(Step::ExpandPalette(Box::new(palette)), &info);
                info = if with_alpha {
                    RowInfo {
                        color_type: ColorType::Rgba,
                        bit_depth: 8,
                        channels: 4,
                    }
                } else {
                    RowInfo {
                        color_type: ColorType::Rgb,
                        bit_depth: 8,
                        channels: 3,
                    }
                };
            } else {
                let source_depth = info.bit_depth;
                if info.color_type == ColorType::Gray && info.bit_depth < 8 {
                    push(Step::ExpandGray, &info);
                    info.bit_depth = 8;
                }
                if cfg.expand_trns && matches!(info.color_type, ColorType::Gray | ColorType::Rgb) {
                    if let Some(key) = source.trns.and_then(|t| trns_key(t, info.color_type, source_depth)) {
                        push(Step::TrnsToAlpha(key), &info);
                        info.color_type = info.color_type.with_alpha();
                        info.channels += 1;
                    }
                }
            }
        }
        if cfg.strip_alpha && info.color_type.has_alpha() {
            push(Step::StripAlpha, &info);
            info.color_type = info.color_type.without_alpha();
            info.channels -= 1;
        }
        if cfg.gray_to_rgb && info.color_type.is_gray() && info.bit_depth >= 8 {
            push(Step::GrayToRgb, &info);
            info.color_type = if info.color_type.has_alpha() {
                ColorType::Rgba
            } else {
                ColorType::Rgb
            };
            info.channels += 2;
        }
        if cfg.strip_16 && info.bit_depth == 16 {
            push(Step::Strip16, &info);
            info.bit_depth = 8;
        }
        if cfg.invert_mono && info.color_type.is_gray() {
            push(Step::InvertMono, &info);
        }
        if cfg.packing && info.bit_depth < 8 {
            push(Step::Unpack, &info);
            info.bit_depth = 8;
        }
        if cfg.bgr && matches!(info.color_type, ColorType::Rgb | ColorType::Rgba) {
            push(Step::Bgr, &info);
            bgr_applied = true;
        }
        if cfg.packswap && info.bit_depth < 8 {
            push(Step::PackSwap, &info);
        }
        if let Some((value, placement)) = cfg.filler {
            if matches!(info.color_type, ColorType::Gray | ColorType::Rgb) && info.bit_depth >= 8 {
                let before = placement == FillerPlacement::Before;
                push(Step::Filler { value, before }, &info);
                info.channels += 1;
                alpha_added = cfg.add_alpha;
                filler_applied = Some(placement);
            }
        }
        if cfg.invert_alpha && info.color_type.has_alpha() {
            push(Step::InvertAlpha, &info);
        }
        if cfg.swap_alpha && info.color_type.has_alpha() {
            push(Step::SwapAlpha, &info);
            swap_alpha_applied = true;
        }
        if cfg.swap_16 && info.bit_depth == 16 {
            push(Step::SwapBytes, &info);
        }

        let warnings = set
            .iter()
            .filter(|t| !stages.iter().any(|s| drives(t, &s.step)))
            .map(|t| {
                format!(
                    "transform {t:?} has no effect on a {}-bit {:?} image",
                    header.bit_depth, header.color_type
                )
            })
            .collect();

        let mut output = info;
        if alpha_added {
            output.color_type = output.color_type.with_alpha();
        }
        let layout = layout_of(&output, bgr_applied, swap_alpha_applied, filler_applied);
        debug!(
            "pipeline: {} stages, {:?} -> {:?}, layout {:?}",
            stages.len(),
            input,
            output,
            layout
        );

        let pipeline = Self {
            width: header.width as usize,
            stages,
            input,
            output,
            layout,
            scratch: [Vec::new(), Vec::new()],
        };
        Ok((pipeline, warnings))
    }

    /// Header of the rows this pipeline produces.
    pub(crate) fn output_header(&self, source: &ImageHeader) -> ImageHeader {
        ImageHeader {
            bit_depth: self.output.bit_depth,
            channels: self.output.channels,
            color_type: self.output.color_type,
            ..*source
        }
    }

    pub(crate) fn layout(&self) -> Option<PixelLayout> {
        self.layout
    }

    /// Bytes in one source row.
    pub(crate) fn input_row_bytes(&self) -> usize {
        row_bytes(self.width, usize::from(self.input.channels) * usize::from(self.input.bit_depth))
            .unwrap_or(0)
    }

    /// Transform one source row into `dst`, which holds exactly one output row.
    pub(crate) fn run(&mut self, src: &[u8], dst: &mut [u8]) -> Result<(), PngReadError> {
        if self.stages.is_empty() {
            let row = src.get(..dst.len()).ok_or_else(|| short_row(dst.len(), src.len()))?;
            dst.copy_from_slice(row);
            return Ok(());
        }
        let [mut cur, mut next] = std::mem::take(&mut self.scratch);
        cur.clear();
        cur.extend_from_slice(src.get(..self.input_row_bytes()).ok_or_else(|| short_row(self.input_row_bytes(), src.len()))?);
        for stage in &self.stages {
            next.clear();
            stage.apply(self.width, &cur, &mut next);
            std::mem::swap(&mut cur, &mut next);
        }
        let result = match cur.get(..dst.len()) {
            Some(row) if row.len() == cur.len() => {
                dst.copy_from_slice(row);
                Ok(())
            }
            _ => Err(PngReadError::DecodeFailure(format!(
                "transformed row is {} bytes, expected {}",
                cur.len(),
                dst.len()
            ))),
        };
        self.scratch = [cur, next];
        result
    }
}

fn short_row(needed: usize, actual: usize) -> PngReadError {
    PngReadError::DecodeFailure(format!("engine produced a {actual}-byte row, expected {needed}"))
}

/// Colour key of a tRNS chunk in the row format it will be compared against.
///
/// `trns` holds two bytes per sample as stored in the file, or for images
/// below 16 bits one byte per sample as the engine reports it. Gray keys of
/// 1, 2 and 4-bit images are scaled the same way the gray samples are.
/// Returns `None` for a short chunk.
fn trns_key(trns: &[u8], color_type: ColorType, source_depth: u8) -> Option<Vec<u8>> {
    let samples = match color_type {
        ColorType::Gray => 1,
        ColorType::Rgb => 3,
        _ => return None,
    };
    let values: Vec<u16> = if source_depth < 16 && trns.len() == samples {
        trns.iter().map(|&v| u16::from(v)).collect()
    } else {
        trns.get(..samples * 2)?
            .chunks_exact(2)
            .map(|s| u16::from_be_bytes([s[0], s[1]]))
            .collect()
    };
    let key = match source_depth {
        16 => values.iter().flat_map(|v| v.to_be_bytes()).collect(),
        8 => values.iter().map(|&v| (v & 0xFF) as u8).collect(),
        depth => {
            let mask = (1_u16 << depth) - 1;
            values
                .iter()
                .map(|&v| (v & mask) as u8 * ops::gray_scale(depth))
                .collect()
        }
    };
    Some(key)
}

/// Whether `transform` is responsible for `step`.
fn drives(transform: &Transform, step: &Step) -> bool {
    match transform {
        Transform::PaletteToRgb => matches!(
            step,
            Step::ExpandPalette(_) | Step::ExpandGray | Step::TrnsToAlpha(_)
        ),
        Transform::GrayTo8 => matches!(step, Step::ExpandPalette(_) | Step::ExpandGray),
        Transform::Strip16 => matches!(step, Step::Strip16),
        Transform::StripAlpha => matches!(step, Step::StripAlpha),
        Transform::InvertAlpha => matches!(step, Step::InvertAlpha),
        Transform::AddAlpha { .. } | Transform::Filler { .. } => matches!(step, Step::Filler { .. }),
        Transform::Packing => matches!(step, Step::Unpack),
        Transform::Bgr => matches!(step, Step::Bgr),
        Transform::SwapAlpha => matches!(step, Step::SwapAlpha),
        Transform::GrayToRgb => matches!(step, Step::GrayToRgb | Step::ExpandPalette(_)),
        Transform::InvertMono => matches!(step, Step::InvertMono),
        Transform::Swap16 => matches!(step, Step::SwapBytes),
        Transform::PackSwap => matches!(step, Step::PackSwap),
    }
}

fn layout_of(
    info: &RowInfo,
    bgr: bool,
    swap_alpha: bool,
    filler: Option<FillerPlacement>,
) -> Option<PixelLayout> {
    if swap_alpha || filler == Some(FillerPlacement::Before) {
        return None;
    }
    let eight = match info.bit_depth {
        8 => true,
        16 => false,
        _ => return None,
    };
    let layout = match (info.color_type, info.channels, eight, bgr) {
        (ColorType::Gray, 1, true, _) => PixelLayout::Gray8,
        (ColorType::Gray, 1, false, _) => PixelLayout::Gray16,
        (ColorType::GrayAlpha, 2, true, _) => PixelLayout::GrayAlpha8,
        (ColorType::GrayAlpha, 2, false, _) => PixelLayout::GrayAlpha16,
        (ColorType::Rgb, 3, true, false) => PixelLayout::Rgb8,
        (ColorType::Rgb, 3, true, true) => PixelLayout::Bgr8,
        (ColorType::Rgb, 3, false, false) => PixelLayout::Rgb16,
        (ColorType::Rgb, 4, true, false) => PixelLayout::Rgbx8,
        (ColorType::Rgb, 4, true, true) => PixelLayout::Bgrx8,
        (ColorType::Rgba, 4, true, false) => PixelLayout::Rgba8,
        (ColorType::Rgba, 4, true, true) => PixelLayout::Bgra8,
        (ColorType::Rgba, 4, false, false) => PixelLayout::Rgba16,
        _ => return None,
    };
    Some(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(width: u32, bit_depth: u8, color_type: ColorType) -> ImageHeader {
        ImageHeader {
            width,
            height: 1,
            bit_depth,
            channels: color_type.channels(),
            color_type,
            interlaced: false,
        }
    }

    fn build(
        header: ImageHeader,
        palette: Option<&[u8]>,
        trns: Option<&[u8]>,
        set: &[Transform],
    ) -> (Pipeline, Vec<String>) {
        let source = SourceImage {
            header,
            palette,
            trns,
        };
        Pipeline::build(&source, &set.iter().copied().collect()).unwrap()
    }

    fn transform_row(pipeline: &mut Pipeline, header: &ImageHeader, src: &[u8]) -> Vec<u8> {
        let out = pipeline.output_header(header);
        let mut dst = vec![0_u8; out.bytes_per_row().unwrap()];
        pipeline.run(src, &mut dst).unwrap();
        dst
    }

    #[test]
    fn empty_set_is_identity() {
        let header = source(2, 8, ColorType::Rgb);
        let (mut p, warnings) = build(header, None, None, &[]);
        assert!(warnings.is_empty());
        assert_eq!(p.output_header(&header), header);
        assert_eq!(p.layout(), Some(PixelLayout::Rgb8));
        assert_eq!(transform_row(&mut p, &header, &[1, 2, 3, 4, 5, 6]), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn palette_with_trns_becomes_rgba() {
        let header = source(3, 2, ColorType::Palette);
        let plte = [255, 0, 0, 0, 255, 0, 0, 0, 255];
        let (mut p, _) = build(header, Some(&plte), Some(&[0, 128]), &[Transform::PaletteToRgb]);
        let out = p.output_header(&header);
        assert_eq!(out.color_type, ColorType::Rgba);
        assert_eq!((out.bit_depth, out.channels), (8, 4));
        assert_eq!(
            transform_row(&mut p, &header, &[0b0001_1000]),
            [255, 0, 0, 0, 0, 255, 0, 128, 0, 0, 255, 255]
        );
    }

    #[test]
    fn strip_alpha_ignores_trns() {
        let header = source(1, 8, ColorType::Palette);
        let (p, _) = build(
            header,
            Some(&[1, 2, 3]),
            Some(&[0]),
            &[Transform::PaletteToRgb, Transform::StripAlpha],
        );
        assert_eq!(p.output_header(&header).color_type, ColorType::Rgb);
    }

    #[test]
    fn gray_to_rgb_expands_low_depth_first() {
        let header = source(4, 1, ColorType::Gray);
        let (mut p, warnings) = build(header, None, None, &[Transform::GrayToRgb]);
        assert!(warnings.is_empty());
        let out = p.output_header(&header);
        assert_eq!((out.color_type, out.bit_depth, out.channels), (ColorType::Rgb, 8, 3));
        assert_eq!(
            transform_row(&mut p, &header, &[0b1001_0000]),
            [255, 255, 255, 0, 0, 0, 0, 0, 0, 255, 255, 255]
        );
    }

    #[test]
    fn gray_trns_key_is_scaled_with_samples() {
        let header = source(4, 2, ColorType::Gray);
        // key 0b01 scales to 0x55
        let (mut p, _) = build(header, None, Some(&[0, 1]), &[Transform::PaletteToRgb]);
        assert_eq!(p.output_header(&header).color_type, ColorType::GrayAlpha);
        assert_eq!(
            transform_row(&mut p, &header, &[0b0001_1011]),
            [0, 255, 85, 0, 170, 255, 255, 255]
        );
    }

    #[test]
    fn one_byte_trns_keys() {
        assert_eq!(trns_key(&[77], ColorType::Gray, 8), Some(vec![77]));
        assert_eq!(trns_key(&[0, 77], ColorType::Gray, 8), Some(vec![77]));
        assert_eq!(trns_key(&[3], ColorType::Gray, 4), Some(vec![0x33]));
        assert_eq!(trns_key(&[1, 2, 3], ColorType::Rgb, 8), Some(vec![1, 2, 3]));
        assert_eq!(trns_key(&[1, 2], ColorType::Rgb, 8), None);
    }

    #[test]
    fn rgb16_trns_key_compares_full_samples() {
        let header = source(2, 16, ColorType::Rgb);
        let trns = [0, 1, 0, 2, 0, 3];
        let (mut p, _) = build(header, None, Some(&trns), &[Transform::PaletteToRgb]);
        assert_eq!(p.layout(), Some(PixelLayout::Rgba16));
        let row = [0, 1, 0, 2, 0, 3, 0, 1, 0, 2, 0, 4];
        assert_eq!(
            transform_row(&mut p, &header, &row),
            [0, 1, 0, 2, 0, 3, 0, 0, 0, 1, 0, 2, 0, 4, 0xFF, 0xFF]
        );
    }

    #[test]
    fn filler_adds_a_channel_without_alpha() {
        let header = source(1, 8, ColorType::Rgb);
        let filler = Transform::Filler {
            value: 0xFF,
            placement: FillerPlacement::After,
        };
        let (mut p, _) = build(header, None, None, &[filler, Transform::Bgr]);
        let out = p.output_header(&header);
        assert_eq!((out.color_type, out.channels), (ColorType::Rgb, 4));
        assert_eq!(p.layout(), Some(PixelLayout::Bgrx8));
        // BGR runs before the filler whatever the issue order
        assert_eq!(transform_row(&mut p, &header, &[1, 2, 3]), [3, 2, 1, 0xFF]);
    }

    #[test]
    fn swap_alpha_leaves_added_alpha_last() {
        let header = source(1, 8, ColorType::Gray);
        let add = Transform::AddAlpha {
            value: 0x7F,
            placement: FillerPlacement::After,
        };
        let (mut p, warnings) = build(header, None, None, &[Transform::SwapAlpha, add]);
        let out = p.output_header(&header);
        assert_eq!((out.color_type, out.channels), (ColorType::GrayAlpha, 2));
        assert_eq!(p.layout(), Some(PixelLayout::GrayAlpha8));
        assert_eq!(transform_row(&mut p, &header, &[9]), [9, 0x7F]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("SwapAlpha"));
    }

    #[test]
    fn invert_alpha_leaves_added_alpha_alone() {
        let header = source(1, 8, ColorType::Rgb);
        let add = Transform::AddAlpha {
            value: 0x10,
            placement: FillerPlacement::After,
        };
        let (mut p, warnings) = build(header, None, None, &[add, Transform::InvertAlpha]);
        assert_eq!(p.layout(), Some(PixelLayout::Rgba8));
        assert_eq!(transform_row(&mut p, &header, &[1, 2, 3]), [1, 2, 3, 0x10]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn add_alpha_survives_a_later_filler() {
        let header = source(1, 8, ColorType::Rgb);
        let set = [
            Transform::AddAlpha {
                value: 0xFF,
                placement: FillerPlacement::After,
            },
            Transform::Filler {
                value: 0x20,
                placement: FillerPlacement::After,
            },
        ];
        let (mut p, _) = build(header, None, None, &set);
        let out = p.output_header(&header);
        assert_eq!((out.color_type, out.channels), (ColorType::Rgba, 4));
        assert_eq!(p.layout(), Some(PixelLayout::Rgba8));
        assert_eq!(transform_row(&mut p, &header, &[1, 2, 3]), [1, 2, 3, 0x20]);
    }

    #[test]
    fn any_palette_expansion_applies_trns() {
        let header = source(5, 8, ColorType::Palette);
        let plte = [10, 20, 30, 40, 50, 60];
        for t in [Transform::GrayTo8, Transform::GrayToRgb, Transform::PaletteToRgb] {
            let (mut p, warnings) = build(header, Some(&plte), Some(&[0]), &[t]);
            assert!(warnings.is_empty(), "{t:?}: {warnings:?}");
            let out = p.output_header(&header);
            assert_eq!((out.color_type, out.channels), (ColorType::Rgba, 4), "{t:?}");
            assert_eq!(out.bytes_per_row().unwrap(), 20);
            assert_eq!(
                transform_row(&mut p, &header, &[0, 1, 1, 0, 1]),
                [
                    10, 20, 30, 0, 40, 50, 60, 255, 40, 50, 60, 255, 10, 20, 30, 0, 40, 50, 60, 255
                ]
            );
        }
    }

    #[test]
    fn invert_mono_on_partial_byte() {
        let header = source(5, 1, ColorType::Gray);
        let (mut p, _) = build(header, None, None, &[Transform::InvertMono]);
        assert_eq!(transform_row(&mut p, &header, &[0xA0]), [0x58]);
    }

    #[test]
    fn later_filler_wins() {
        let header = source(1, 8, ColorType::Gray);
        let set = [
            Transform::Filler {
                value: 1,
                placement: FillerPlacement::After,
            },
            Transform::Filler {
                value: 2,
                placement: FillerPlacement::Before,
            },
        ];
        let (mut p, _) = build(header, None, None, &set);
        assert_eq!(transform_row(&mut p, &header, &[9]), [2, 9]);
    }

    #[test]
    fn strip16_then_swap16_has_nothing_to_swap() {
        let header = source(1, 16, ColorType::Gray);
        let (mut p, warnings) = build(header, None, None, &[Transform::Swap16, Transform::Strip16]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Swap16"));
        assert_eq!(transform_row(&mut p, &header, &[0xAB, 0xCD]), [0xAB]);
    }

    #[test]
    fn inapplicable_transforms_warn() {
        let header = source(2, 8, ColorType::Rgb);
        let (p, warnings) = build(
            header,
            None,
            None,
            &[Transform::Strip16, Transform::InvertMono, Transform::Bgr],
        );
        assert_eq!(warnings.len(), 2);
        assert_eq!(p.output_header(&header).bytes_per_row().unwrap(), 6);
    }

    #[test]
    fn packing_and_packswap() {
        let header = source(4, 2, ColorType::Gray);
        let (mut p, _) = build(header, None, None, &[Transform::Packing]);
        assert_eq!(p.output_header(&header).bit_depth, 8);
        assert_eq!(transform_row(&mut p, &header, &[0b1101_0010]), [3, 1, 0, 2]);

        let (mut p, _) = build(header, None, None, &[Transform::PackSwap]);
        assert_eq!(p.output_header(&header).bit_depth, 2);
        assert_eq!(transform_row(&mut p, &header, &[0b1101_0010]), [0b1000_0111]);
    }

    #[test]
    fn palette_without_plte_is_malformed() {
        let source = SourceImage {
            header: source(1, 8, ColorType::Palette),
            palette: None,
            trns: None,
        };
        let set: TransformSet = [Transform::PaletteToRgb].into_iter().collect();
        assert!(matches!(
            Pipeline::build(&source, &set),
            Err(PngReadError::MalformedInput(_))
        ));
    }
}
