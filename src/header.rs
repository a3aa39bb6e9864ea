//! Image header and output geometry.

use crate::error::PngReadError;
use crate::pixel::ColorType;

/// Parsed image header.
///
/// Before lock a session reports the header as stored in the file. After
/// lock it reports the header of the decoded rows: the same image, with bit
/// depth, channel count and colour type as changed by the transforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    /// Bits per sample: 1, 2, 4, 8 or 16.
    pub bit_depth: u8,
    /// Samples per pixel, including any filler channel.
    pub channels: u8,
    pub color_type: ColorType,
    /// Whether the file stores pixels Adam7-interlaced.
    pub interlaced: bool,
}

impl ImageHeader {
    /// Bits occupied by one pixel.
    pub fn bits_per_pixel(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bit_depth)
    }

    /// Bytes in one tightly packed row: `ceil(width * channels * bit_depth / 8)`.
    pub fn bytes_per_row(&self) -> Result<usize, PngReadError> {
        row_bytes(self.width as usize, self.bits_per_pixel()).ok_or(
            PngReadError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            },
        )
    }

    /// Bytes needed to hold the whole image: `bytes_per_row * height`.
    pub fn required_buffer_size(&self) -> Result<usize, PngReadError> {
        self.bytes_per_row()?
            .checked_mul(self.height as usize)
            .ok_or(PngReadError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            })
    }

    /// Checks the invariants a parsed header must hold.
    pub(crate) fn validate(&self) -> Result<(), PngReadError> {
        if self.width == 0 || self.height == 0 {
            return Err(PngReadError::MalformedInput(format!(
                "zero image dimension {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.bit_depth, 1 | 2 | 4 | 8 | 16) {
            return Err(PngReadError::MalformedInput(format!(
                "invalid bit depth {}",
                self.bit_depth
            )));
        }
        if !(1..=4).contains(&self.channels) {
            return Err(PngReadError::MalformedInput(format!(
                "invalid channel count {}",
                self.channels
            )));
        }
        Ok(())
    }
}

/// Bytes needed for `width` pixels of `pixel_bits` bits each, rounded up.
pub(crate) fn row_bytes(width: usize, pixel_bits: usize) -> Option<usize> {
    let bits = width.checked_mul(pixel_bits)?;
    Some(bits / 8 + usize::from(bits % 8 != 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u32, height: u32, bit_depth: u8, color_type: ColorType) -> ImageHeader {
        ImageHeader {
            width,
            height,
            bit_depth,
            channels: color_type.channels(),
            color_type,
            interlaced: false,
        }
    }

    #[test]
    fn rgb8_geometry() {
        let h = header(640, 1136, 8, ColorType::Rgb);
        assert_eq!(h.bytes_per_row().unwrap(), 1920);
        assert_eq!(h.required_buffer_size().unwrap(), 2_181_120);
    }

    #[test]
    fn sub_byte_rows_round_up() {
        assert_eq!(header(1, 1, 1, ColorType::Gray).bytes_per_row().unwrap(), 1);
        assert_eq!(header(9, 1, 1, ColorType::Gray).bytes_per_row().unwrap(), 2);
        assert_eq!(header(3, 1, 4, ColorType::Palette).bytes_per_row().unwrap(), 2);
        assert_eq!(header(5, 1, 2, ColorType::Gray).bytes_per_row().unwrap(), 2);
    }

    #[test]
    fn sixteen_bit_rgba() {
        let h = header(3, 2, 16, ColorType::Rgba);
        assert_eq!(h.bytes_per_row().unwrap(), 24);
        assert_eq!(h.required_buffer_size().unwrap(), 48);
    }

    #[test]
    fn rejects_bad_depth() {
        let h = header(3, 2, 3, ColorType::Gray);
        assert!(matches!(h.validate(), Err(PngReadError::MalformedInput(_))));
    }
}
