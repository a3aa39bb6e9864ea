#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::header::ImageHeader;
use crate::pixel::PixelLayout;

/// Rows decoded into an owned buffer by [`PngSession::decode_to_vec`](crate::PngSession::decode_to_vec).
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<u8>,
    /// Header of the decoded rows, transforms applied.
    pub header: ImageHeader,
    pub bytes_per_row: usize,
    layout: Option<PixelLayout>,
}

impl DecodeOutput {
    pub(crate) fn new(
        pixels: Vec<u8>,
        header: ImageHeader,
        bytes_per_row: usize,
        layout: Option<PixelLayout>,
    ) -> Self {
        Self {
            pixels,
            header,
            bytes_per_row,
            layout,
        }
    }

    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the pixel data.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Typed layout of the pixels, or `None` for sub-byte depths and
    /// orders with no [`PixelLayout`] (filler before, alpha first).
    pub fn layout(&self) -> Option<PixelLayout> {
        self.layout
    }

    /// One decoded row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let start = (y as usize).checked_mul(self.bytes_per_row)?;
        self.pixels.get(start..start.checked_add(self.bytes_per_row)?)
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`crate::PngReadError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], crate::PngReadError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        match self.layout {
            Some(layout) if layout.is_memory_compatible(P::layout()) => {
                Ok(self.pixels().as_pixels())
            }
            actual => Err(crate::PngReadError::LayoutMismatch {
                expected: P::layout(),
                actual,
            }),
        }
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    ///
    /// Returns [`crate::PngReadError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(
        &self,
    ) -> Result<imgref::ImgRef<'_, P>, crate::PngReadError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.header.width as usize,
            self.header.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(
        &self,
    ) -> Result<imgref::ImgVec<P>, crate::PngReadError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.header.width as usize,
            self.header.height as usize,
        ))
    }
}
