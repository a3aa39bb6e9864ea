//! Binding to the `png` crate.
//!
//! The engine is opened with untransformed output and parsed up to the first
//! IDAT chunk. Transforms are compiled separately into a [`Pipeline`] and
//! applied to each engine row on its way into the caller buffer. No `png`
//! type leaves this module.

use std::io::Read;

use log::{debug, trace};

use crate::bridge::{self, StreamBridge};
use crate::error::PngReadError;
use crate::header::ImageHeader;
use crate::limits::Limits;
use crate::pixel::ColorType;
use crate::rows::RowTable;
use crate::transform::{Pipeline, SourceImage, TransformSet};

/// The decode engine: the `png` crate, and the minor series this build
/// requires. Cargo keeps the resolved version inside that series.
pub const ENGINE_VERSION: &str = "png-rs 0.17";

/// Which operation an engine error surfaced from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Open,
    Decode,
}

fn map_error(err: png::DecodingError, phase: Phase) -> PngReadError {
    match err {
        png::DecodingError::IoError(io) => match bridge::truncation(&io) {
            Some(short) => PngReadError::TruncatedSource {
                requested: short.requested,
                received: short.received,
            },
            None if phase == Phase::Open => PngReadError::InvalidStream(io.to_string()),
            None => PngReadError::DecodeFailure(io.to_string()),
        },
        png::DecodingError::LimitsExceeded => {
            PngReadError::LimitExceeded("engine allocation limit reached".into())
        }
        other if phase == Phase::Open => PngReadError::MalformedInput(other.to_string()),
        other => PngReadError::DecodeFailure(other.to_string()),
    }
}

fn color_type(ct: png::ColorType) -> ColorType {
    match ct {
        png::ColorType::Grayscale => ColorType::Gray,
        png::ColorType::Rgb => ColorType::Rgb,
        png::ColorType::Indexed => ColorType::Palette,
        png::ColorType::GrayscaleAlpha => ColorType::GrayAlpha,
        png::ColorType::Rgba => ColorType::Rgba,
    }
}

/// A parsed PNG stream, positioned at its pixel data.
pub(crate) struct Engine<R: Read> {
    reader: png::Reader<StreamBridge<R>>,
    header: ImageHeader,
    palette: Option<Vec<u8>>,
    trns: Option<Vec<u8>>,
}

impl<R: Read> Engine<R> {
    /// Parse the stream up to the pixel data.
    pub(crate) fn open(stream: R, limits: &Limits) -> Result<Self, PngReadError> {
        let mut decoder = png::Decoder::new(StreamBridge::new(stream));
        decoder.set_transformations(png::Transformations::IDENTITY);
        decoder.set_limits(limits.engine_limits());
        let reader = decoder
            .read_info()
            .map_err(|e| map_error(e, Phase::Open))?;

        let info = reader.info();
        let color_type = color_type(info.color_type);
        let header = ImageHeader {
            width: info.width,
            height: info.height,
            bit_depth: info.bit_depth as u8,
            channels: color_type.channels(),
            color_type,
            interlaced: info.interlaced,
        };
        header.validate()?;
        limits.check_header(&header)?;
        let palette = info.palette.as_ref().map(|p| p.to_vec());
        let trns = info.trns.as_ref().map(|t| t.to_vec());

        debug!(
            "opened {}x{} {}-bit {:?}{}, palette: {}, tRNS: {}",
            header.width,
            header.height,
            header.bit_depth,
            header.color_type,
            if header.interlaced { " interlaced" } else { "" },
            palette.is_some(),
            trns.is_some()
        );
        Ok(Self {
            reader,
            header,
            palette,
            trns,
        })
    }

    pub(crate) fn header(&self) -> ImageHeader {
        self.header
    }

    /// Compile `transforms` against this image.
    pub(crate) fn lock(
        &self,
        transforms: &TransformSet,
    ) -> Result<(Pipeline, Vec<String>), PngReadError> {
        let source = SourceImage {
            header: self.header,
            palette: self.palette.as_deref(),
            trns: self.trns.as_deref(),
        };
        Pipeline::build(&source, transforms)
    }

    /// Materialize every row into `rows`, then validate the rest of the stream.
    pub(crate) fn decode(
        &mut self,
        rows: &mut RowTable<'_>,
        pipeline: &mut Pipeline,
    ) -> Result<(), PngReadError> {
        let height = self.header.height as usize;
        if rows.height() != height {
            return Err(PngReadError::InvalidOperation("row table height differs from image"));
        }
        if self.header.interlaced {
            self.decode_interlaced(rows, pipeline)?;
        } else {
            for y in 0..height {
                let row = self
                    .reader
                    .next_row()
                    .map_err(|e| map_error(e, Phase::Decode))?
                    .ok_or_else(|| {
                        PngReadError::DecodeFailure(format!("image data ended at row {y} of {height}"))
                    })?;
                let dst = rows
                    .row_mut(y)
                    .ok_or(PngReadError::InvalidOperation("row index out of range"))?;
                pipeline.run(row.data(), dst)?;
            }
        }
        trace!("all {height} rows written, validating trailer");
        self.reader
            .finish()
            .map_err(|e| map_error(e, Phase::Decode))?;
        debug!("decode complete");
        Ok(())
    }

    /// Adam7 images are de-interlaced by the engine into scratch first.
    fn decode_interlaced(
        &mut self,
        rows: &mut RowTable<'_>,
        pipeline: &mut Pipeline,
    ) -> Result<(), PngReadError> {
        let mut frame = vec![0_u8; self.reader.output_buffer_size()];
        self.reader
            .next_frame(&mut frame)
            .map_err(|e| map_error(e, Phase::Decode))?;
        let stride = pipeline.input_row_bytes();
        if stride == 0 {
            return Err(PngReadError::DecodeFailure("empty source row".into()));
        }
        trace!("de-interlaced {} bytes, {stride} per row", frame.len());
        for (y, src) in frame.chunks_exact(stride).take(rows.height()).enumerate() {
            let dst = rows
                .row_mut(y)
                .ok_or(PngReadError::InvalidOperation("row index out of range"))?;
            pipeline.run(src, dst)?;
        }
        if frame.len() / stride < rows.height() {
            return Err(PngReadError::DecodeFailure(format!(
                "engine frame holds {} rows, expected {}",
                frame.len() / stride,
                rows.height()
            )));
        }
        Ok(())
    }
}

impl<R: Read> Drop for Engine<R> {
    fn drop(&mut self) {
        trace!("engine released");
    }
}
