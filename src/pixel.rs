/// PNG colour type, as reported by the header or by a locked session.
///
/// After lock this is the colour type of the decoded rows, which a transform
/// may have changed (palette expansion, gray to RGB, stripping alpha).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    /// Single gray channel.
    Gray,
    /// Single channel of palette indices.
    Palette,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Gray and alpha.
    GrayAlpha,
}

impl ColorType {
    /// Channels stored per pixel for this colour type, without any filler.
    pub fn channels(self) -> u8 {
        match self {
            Self::Gray | Self::Palette => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the colour type carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::GrayAlpha)
    }

    /// Whether pixels carry colour (RGB family or palette).
    pub fn has_color(self) -> bool {
        matches!(self, Self::Rgb | Self::Rgba | Self::Palette)
    }

    pub(crate) fn is_gray(self) -> bool {
        matches!(self, Self::Gray | Self::GrayAlpha)
    }

    pub(crate) fn with_alpha(self) -> Self {
        match self {
            Self::Gray => Self::GrayAlpha,
            Self::Rgb => Self::Rgba,
            other => other,
        }
    }

    pub(crate) fn without_alpha(self) -> Self {
        match self {
            Self::GrayAlpha => Self::Gray,
            Self::Rgba => Self::Rgb,
            other => other,
        }
    }
}

/// Pixel memory layout of byte-addressable decoded output.
///
/// 16-bit layouts hold samples in the byte order the session produced:
/// big-endian, or little-endian after [`Transform::Swap16`](crate::Transform::Swap16).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Single channel, 8-bit grayscale.
    Gray8,
    /// 2 channels, 8-bit gray and alpha.
    GrayAlpha8,
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
    /// 4 channels, 8-bit RGBX (4th byte is filler, not alpha).
    Rgbx8,
    /// 3 channels, 8-bit BGR.
    Bgr8,
    /// 4 channels, 8-bit BGRA.
    Bgra8,
    /// 4 channels, 8-bit BGRX (opaque; 4th byte is padding, not alpha).
    Bgrx8,
    /// Single channel, 16-bit grayscale.
    Gray16,
    /// 2 channels, 16-bit gray and alpha.
    GrayAlpha16,
    /// 3 channels, 16-bit RGB.
    Rgb16,
    /// 4 channels, 16-bit RGBA.
    Rgba16,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::GrayAlpha8 | Self::Gray16 => 2,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Rgbx8 | Self::Bgra8 | Self::Bgrx8 | Self::GrayAlpha16 => 4,
            Self::Rgb16 => 6,
            Self::Rgba16 => 8,
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray8 | Self::Gray16 => 1,
            Self::GrayAlpha8 | Self::GrayAlpha16 => 2,
            Self::Rgb8 | Self::Bgr8 | Self::Rgb16 => 3,
            Self::Rgba8 | Self::Rgbx8 | Self::Bgra8 | Self::Bgrx8 | Self::Rgba16 => 4,
        }
    }

    /// Whether this layout has the same memory representation as `other`.
    ///
    /// For example, `Bgra8` and `Bgrx8` are compatible (same 4-byte B,G,R,X/A layout).
    pub fn is_memory_compatible(&self, other: PixelLayout) -> bool {
        if *self == other {
            return true;
        }
        matches!(
            (*self, other),
            (Self::Bgra8, Self::Bgrx8)
                | (Self::Bgrx8, Self::Bgra8)
                | (Self::Rgba8, Self::Rgbx8)
                | (Self::Rgbx8, Self::Rgba8)
        )
    }
}

/// Pixel types that decoded output can be viewed as.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy + 'static {
    /// Layout this pixel type reads.
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::Gray<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Gray8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::Rgb<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::Rgba<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::BGR<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Bgr8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::BGRA<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Bgra8
    }
}
