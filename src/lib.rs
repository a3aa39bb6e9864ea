//! # zenpngread
//!
//! Single-use PNG decode sessions with libpng-style transforms, decoding
//! rows straight into a caller-owned buffer.
//!
//! A [`PngSession`] goes through two phases:
//!
//! 1. **Configure.** [`PngSession::open`] parses the header from any
//!    [`std::io::Read`] source. [`Transform`]s may be added with
//!    [`PngSession::apply_transform`].
//! 2. **Decode.** [`PngSession::lock`] finalizes the output geometry.
//!    [`PngSession::decode`] then writes every row into a buffer of
//!    [`PngSession::required_buffer_size`] bytes, `bytes_per_row` apart.
//!
//! The source is read forward only, never past the end of the PNG, and
//! never seeked. A session decodes once; open a new one to decode again.
//!
//! Errors are returned as [`PngReadError`] and also delivered, together with
//! warnings, to the [`DiagnosticSink`] passed at open. [`LogSink`] forwards
//! them to the `log` crate; [`Diagnostics`] records them.
//!
//! ## Transforms
//!
//! Transforms run in a fixed order whatever order they were added in: the
//! order libpng uses. Transforms that do not apply to the image (say
//! [`Transform::Strip16`] on an 8-bit image) are skipped with a warning.
//!
//! ## Usage
//!
//! ```no_run
//! use zenpngread::{LogSink, PngSession, Transform};
//!
//! let file = std::fs::File::open("image.png")?;
//! let mut session = PngSession::open(std::io::BufReader::new(file), LogSink)?;
//! println!("{}x{} {:?}", session.width(), session.height(), session.color_type());
//!
//! session.apply_transform(Transform::PaletteToRgb)?;
//! session.apply_transform(Transform::Strip16)?;
//! let decoded = session.decode_to_vec()?;
//! println!("{:?}, {} bytes per row", decoded.layout(), decoded.bytes_per_row);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Features
//!
//! - `rgb`: typed pixel views of [`DecodeOutput`]
//! - `imgref`: `ImgRef`/`ImgVec` views (implies `rgb`)
//! - `simd`: SIMD channel swizzles for [`Transform::Bgr`]

#![forbid(unsafe_code)]

mod bridge;
mod decode;
mod engine;
mod error;
mod header;
mod limits;
mod pixel;
mod rows;
mod session;
mod sink;
mod transform;

pub use decode::DecodeOutput;
pub use engine::ENGINE_VERSION;
pub use error::PngReadError;
pub use header::ImageHeader;
pub use limits::Limits;
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::{ColorType, PixelLayout};
pub use rows::row_ranges;
pub use session::{PngSession, decode_png};
pub use sink::{Diagnostic, DiagnosticSink, Diagnostics, LogSink, Severity};
pub use transform::{FillerPlacement, Transform, TransformSet};
