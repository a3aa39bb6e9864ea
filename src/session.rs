//! The decode session a caller drives: open, configure, lock, decode.

use std::io::Read;

use log::debug;

use crate::decode::DecodeOutput;
use crate::engine::{ENGINE_VERSION, Engine};
use crate::error::PngReadError;
use crate::header::ImageHeader;
use crate::limits::Limits;
use crate::pixel::{ColorType, PixelLayout};
use crate::rows::RowTable;
use crate::sink::{DiagnosticSink, LogSink};
use crate::transform::{Pipeline, Transform, TransformSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Header parsed, transforms may be added.
    Configuring,
    /// Geometry is final, decode not yet run.
    Locked,
    /// Rows were decoded into a caller buffer.
    Finished,
    /// Closed by the caller or by a failed operation.
    Closed,
}

/// A single-use PNG decode session over a byte stream.
///
/// Opening parses the header. Transforms may then be added until the session
/// is locked, either explicitly with [`lock`](Self::lock) or implicitly by
/// the first decode. After lock the reported geometry is final and a buffer
/// of [`required_buffer_size`](Self::required_buffer_size) bytes receives the
/// rows. A session decodes at most once.
///
/// The stream is read forward only and never past the end of the PNG. To
/// decode the same image again, reposition the stream and open a new
/// session. Pass `&mut reader` to keep ownership of the stream.
///
/// Every error an operation returns is also reported to the session's
/// [`DiagnosticSink`].
///
/// ```no_run
/// use zenpngread::{Diagnostics, PngSession, Transform};
///
/// let file = std::fs::File::open("photo.png")?;
/// let mut diagnostics = Diagnostics::new();
/// let mut session = PngSession::open(std::io::BufReader::new(file), &mut diagnostics)?;
/// session.apply_transform(Transform::Bgr)?;
/// session.lock()?;
/// let mut buf = vec![0_u8; session.required_buffer_size()?];
/// session.decode(&mut buf)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PngSession<R: Read, S: DiagnosticSink = LogSink> {
    engine: Option<Engine<R>>,
    sink: S,
    limits: Limits,
    source_header: ImageHeader,
    transforms: TransformSet,
    pipeline: Option<Pipeline>,
    phase: Phase,
}

impl<R: Read, S: DiagnosticSink> PngSession<R, S> {
    /// Open a session with no resource limits.
    pub fn open(source: R, sink: S) -> Result<Self, PngReadError> {
        Self::open_with_limits(source, sink, Limits::default())
    }

    /// Open a session; `limits` are checked against the header here and
    /// against the output size at lock.
    pub fn open_with_limits(source: R, mut sink: S, limits: Limits) -> Result<Self, PngReadError> {
        let engine = match Engine::open(source, &limits) {
            Ok(engine) => engine,
            Err(err) => {
                sink.on_error(&err.to_string());
                return Err(err);
            }
        };
        let source_header = engine.header();
        Ok(Self {
            engine: Some(engine),
            sink,
            limits,
            source_header,
            transforms: TransformSet::new(),
            pipeline: None,
            phase: Phase::Configuring,
        })
    }

    fn fail<T>(&mut self, err: PngReadError) -> Result<T, PngReadError> {
        self.sink.on_error(&err.to_string());
        Err(err)
    }

    /// Header of the rows decode will produce. Before lock this is the
    /// image as stored.
    pub fn header(&self) -> ImageHeader {
        match &self.pipeline {
            Some(pipeline) => pipeline.output_header(&self.source_header),
            None => self.source_header,
        }
    }

    /// Header of the image as stored in the stream.
    pub fn source_header(&self) -> ImageHeader {
        self.source_header
    }

    pub fn width(&self) -> u32 {
        self.source_header.width
    }

    pub fn height(&self) -> u32 {
        self.source_header.height
    }

    pub fn bit_depth(&self) -> u8 {
        self.header().bit_depth
    }

    pub fn channels(&self) -> u8 {
        self.header().channels
    }

    pub fn color_type(&self) -> ColorType {
        self.header().color_type
    }

    pub fn interlaced(&self) -> bool {
        self.source_header.interlaced
    }

    /// Bytes in one output row. Final only after lock.
    pub fn bytes_per_row(&self) -> Result<usize, PngReadError> {
        self.header().bytes_per_row()
    }

    /// Bytes the decode buffer must hold. Final only after lock.
    pub fn required_buffer_size(&self) -> Result<usize, PngReadError> {
        self.header().required_buffer_size()
    }

    /// Typed layout of the output rows, when they have one. `None` before lock.
    pub fn layout(&self) -> Option<PixelLayout> {
        self.pipeline.as_ref().and_then(Pipeline::layout)
    }

    pub fn engine_version(&self) -> &'static str {
        ENGINE_VERSION
    }

    /// Transforms added so far, in the order they were added.
    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    /// Whether the geometry is final.
    pub fn is_locked(&self) -> bool {
        self.phase != Phase::Configuring
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Add a transform. Fails once the session is locked.
    ///
    /// Adding a transform that is already present is allowed and reported as
    /// a warning.
    pub fn apply_transform(&mut self, transform: Transform) -> Result<(), PngReadError> {
        if self.phase != Phase::Configuring {
            return self.fail(PngReadError::InvalidOperation(
                "transforms cannot be added after the session is locked",
            ));
        }
        if !self.transforms.push(transform) {
            self.sink
                .on_warning(&format!("transform {transform:?} was already applied"));
        }
        Ok(())
    }

    /// Finalize transforms and geometry. Locking a locked session does nothing.
    ///
    /// A failure here closes the session.
    pub fn lock(&mut self) -> Result<(), PngReadError> {
        match self.phase {
            Phase::Configuring => {}
            Phase::Locked => return Ok(()),
            Phase::Finished | Phase::Closed => {
                return self.fail(PngReadError::InvalidOperation(
                    "session has already finished",
                ));
            }
        }
        let Some(engine) = self.engine.as_ref() else {
            return self.fail(PngReadError::InvalidOperation("session is closed"));
        };
        let compiled = engine.lock(&self.transforms).and_then(|(pipeline, warnings)| {
            let out = pipeline.output_header(&self.source_header);
            self.limits.check_output(&self.source_header, &out)?;
            Ok((pipeline, warnings))
        });
        let (pipeline, warnings) = match compiled {
            Ok(compiled) => compiled,
            Err(err) => {
                self.close();
                return self.fail(err);
            }
        };
        for warning in &warnings {
            self.sink.on_warning(warning);
        }
        self.pipeline = Some(pipeline);
        self.phase = Phase::Locked;
        let header = self.header();
        debug!(
            "locked: {} transforms, {}-bit {:?} x{}, layout {:?}",
            self.transforms.len(),
            header.bit_depth,
            header.color_type,
            header.channels,
            self.layout()
        );
        Ok(())
    }

    /// Decode every row into `buffer`, locking first if needed.
    ///
    /// `buffer` must hold at least [`required_buffer_size`](Self::required_buffer_size)
    /// bytes. A short buffer is rejected before any stream access and the
    /// session stays usable. Bytes past the image are left untouched. Any
    /// other failure closes the session. Runs at most once.
    pub fn decode(&mut self, buffer: &mut [u8]) -> Result<(), PngReadError> {
        self.lock()?;
        if self.phase != Phase::Locked {
            return self.fail(PngReadError::InvalidOperation(
                "session has already finished",
            ));
        }
        let header = self.header();
        let (stride, needed) = match header
            .bytes_per_row()
            .and_then(|stride| Ok((stride, header.required_buffer_size()?)))
        {
            Ok(geometry) => geometry,
            Err(err) => return self.fail(err),
        };
        if buffer.len() < needed {
            return self.fail(PngReadError::BufferTooSmall {
                needed,
                actual: buffer.len(),
            });
        }

        let result = match (self.engine.as_mut(), self.pipeline.as_mut()) {
            (Some(engine), Some(pipeline)) => {
                RowTable::new(buffer, header.height as usize, stride)
                    .and_then(|mut rows| engine.decode(&mut rows, pipeline))
            }
            _ => Err(PngReadError::InvalidOperation("session is closed")),
        };
        match result {
            Ok(()) => {
                self.engine = None;
                self.phase = Phase::Finished;
                Ok(())
            }
            Err(err) => {
                self.close();
                self.fail(err)
            }
        }
    }

    /// Decode into a newly allocated buffer.
    pub fn decode_to_vec(&mut self) -> Result<DecodeOutput, PngReadError> {
        self.lock()?;
        let size = match self.required_buffer_size() {
            Ok(size) => size,
            Err(err) => return self.fail(err),
        };
        let mut pixels = vec![0_u8; size];
        self.decode(&mut pixels)?;
        let header = self.header();
        let bytes_per_row = self.bytes_per_row()?;
        Ok(DecodeOutput::new(pixels, header, bytes_per_row, self.layout()))
    }

    /// Release the engine. Further locks and decodes fail.
    pub fn close(&mut self) {
        if self.engine.take().is_some() {
            debug!("session closed");
        }
        self.phase = Phase::Closed;
    }

    /// Consume the session, returning its diagnostic sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<R: Read, S: DiagnosticSink> core::fmt::Debug for PngSession<R, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PngSession")
            .field("header", &self.header())
            .field("transforms", &self.transforms)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Decode a whole PNG stream with no transforms, logging diagnostics.
pub fn decode_png<R: Read>(source: R) -> Result<DecodeOutput, PngReadError> {
    PngSession::open(source, LogSink)?.decode_to_vec()
}
