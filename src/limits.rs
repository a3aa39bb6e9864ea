//! Caller-set resource limits, checked against the IHDR at open and against
//! the output geometry at lock.

use crate::error::PngReadError;
use crate::header::ImageHeader;

/// Resource limits for a decode session.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes held at once for decoded pixels: the caller buffer,
    /// plus the de-interlacing frame for Adam7 images. Also caps the
    /// engine's own allocations.
    pub max_memory_bytes: Option<u64>,
}

/// Scratch frame needed to de-interlace `source`; zero when progressive.
fn frame_bytes(source: &ImageHeader) -> Result<u64, PngReadError> {
    if !source.interlaced {
        return Ok(0);
    }
    Ok(source.required_buffer_size()? as u64)
}

fn over(what: &str, value: u64, limit: Option<u64>) -> Result<(), PngReadError> {
    match limit {
        Some(limit) if value > limit => Err(PngReadError::LimitExceeded(format!(
            "{what} {value} is over the limit of {limit}"
        ))),
        _ => Ok(()),
    }
}

impl Limits {
    /// Check the dimensions in the IHDR, and for interlaced images the
    /// size of the frame the engine de-interlaces into.
    pub(crate) fn check_header(&self, header: &ImageHeader) -> Result<(), PngReadError> {
        let (width, height) = (u64::from(header.width), u64::from(header.height));
        over("image width", width, self.max_width)?;
        over("image height", height, self.max_height)?;
        over("pixel count", width * height, self.max_pixels)?;
        if self.max_memory_bytes.is_some() {
            over("de-interlacing frame bytes", frame_bytes(header)?, self.max_memory_bytes)?;
        }
        Ok(())
    }

    /// Check the decoded size of a locked session. `output` is the header
    /// after transforms, `source` the header as stored.
    pub(crate) fn check_output(
        &self,
        source: &ImageHeader,
        output: &ImageHeader,
    ) -> Result<(), PngReadError> {
        let buffer = output.required_buffer_size()? as u64;
        let total = buffer.saturating_add(frame_bytes(source)?);
        over("decoded bytes", total, self.max_memory_bytes)
    }

    /// Allocation limits for the `png` decoder.
    pub(crate) fn engine_limits(&self) -> png::Limits {
        let mut limits = png::Limits::default();
        if let Some(max) = self.max_memory_bytes {
            limits.bytes = usize::try_from(max).unwrap_or(usize::MAX);
        }
        limits
    }

}
