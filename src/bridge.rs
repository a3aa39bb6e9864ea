//! Stream bridge between a caller's byte source and the decode engine.
//!
//! The engine pulls bytes through [`Read`]. Every fill the bridge performs on
//! the source is exact: a source that ends early produces a
//! [`TruncatedRead`] instead of a short result. Fills are bounded by the PNG
//! container framing (signature, chunk header, chunk body plus CRC) so the
//! source is never read past the IEND chunk, whatever read-ahead the engine
//! asks for. Chunk contents are not interpreted here.

use std::fmt;
use std::io::{self, Read};

use log::trace;

const SIGNATURE_LEN: usize = 8;
const CHUNK_HEADER_LEN: usize = 8;
const CRC_LEN: u64 = 4;

/// A fill that hit end-of-input before it was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TruncatedRead {
    pub requested: usize,
    pub received: usize,
}

impl fmt::Display for TruncatedRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source ended after {} of {} requested bytes",
            self.received, self.requested
        )
    }
}

impl std::error::Error for TruncatedRead {}

/// Recover the truncation payload from an I/O error raised by the bridge.
pub(crate) fn truncation(err: &io::Error) -> Option<TruncatedRead> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<TruncatedRead>())
        .copied()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Framing {
    Signature,
    ChunkHeader,
    ChunkBody { remaining: u64, last: bool },
    End,
}

pub(crate) struct StreamBridge<R> {
    source: R,
    framing: Framing,
    staged: [u8; 8],
    staged_len: usize,
    staged_pos: usize,
}

impl<R: Read> StreamBridge<R> {
    pub(crate) fn new(source: R) -> Self {
        Self {
            source,
            framing: Framing::Signature,
            staged: [0; 8],
            staged_len: 0,
            staged_pos: 0,
        }
    }

    /// Fill `buf` completely from the source or fail.
    fn fill_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => {
                    let short = TruncatedRead {
                        requested: buf.len(),
                        received: filled,
                    };
                    trace!("{short}");
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, short));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn stage(&mut self, len: usize) -> io::Result<()> {
        let mut staged = [0_u8; 8];
        self.fill_exact(&mut staged[..len])?;
        self.staged = staged;
        self.staged_len = len;
        self.staged_pos = 0;
        Ok(())
    }
}

impl<R: Read> Read for StreamBridge<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.staged_pos == self.staged_len {
            match self.framing {
                Framing::Signature => {
                    self.stage(SIGNATURE_LEN)?;
                    self.framing = Framing::ChunkHeader;
                }
                Framing::ChunkHeader => {
                    self.stage(CHUNK_HEADER_LEN)?;
                    let [l0, l1, l2, l3, t0, t1, t2, t3] = self.staged;
                    let length = u32::from_be_bytes([l0, l1, l2, l3]);
                    let last = [t0, t1, t2, t3] == *b"IEND";
                    trace!(
                        "chunk {:?}, {length} bytes",
                        String::from_utf8_lossy(&[t0, t1, t2, t3])
                    );
                    self.framing = Framing::ChunkBody {
                        remaining: u64::from(length) + CRC_LEN,
                        last,
                    };
                }
                Framing::ChunkBody { remaining, last } => {
                    let n = usize::try_from(remaining).map_or(out.len(), |r| r.min(out.len()));
                    self.fill_exact(&mut out[..n])?;
                    let remaining = remaining - n as u64;
                    self.framing = if remaining > 0 {
                        Framing::ChunkBody { remaining, last }
                    } else if last {
                        Framing::End
                    } else {
                        Framing::ChunkHeader
                    };
                    return Ok(n);
                }
                Framing::End => return Ok(0),
            }
        }
        let staged = &self.staged[self.staged_pos..self.staged_len];
        let n = staged.len().min(out.len());
        out[..n].copy_from_slice(&staged[..n]);
        self.staged_pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        // CRC is not checked by the bridge.
        out.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        out
    }

    fn framed() -> Vec<u8> {
        let mut out = SIGNATURE.to_vec();
        out.extend(chunk(b"abCD", &[1, 2, 3]));
        out.extend(chunk(b"IDAT", &[9; 40]));
        out.extend(chunk(b"IEND", &[]));
        out
    }

    /// Yields at most one byte per read call.
    struct Trickle<R>(R);

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    #[test]
    fn stops_at_iend() {
        let png = framed();
        let mut input = png.clone();
        input.extend_from_slice(b"trailing bytes");

        let mut cursor = Cursor::new(input);
        let mut out = Vec::new();
        StreamBridge::new(&mut cursor).read_to_end(&mut out).unwrap();

        assert_eq!(out, png);
        assert_eq!(cursor.position(), png.len() as u64);
    }

    #[test]
    fn exact_fills_over_trickling_source() {
        let png = framed();
        let mut out = Vec::new();
        StreamBridge::new(Trickle(Cursor::new(png.clone())))
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, png);
    }

    #[test]
    fn short_source_is_truncation() {
        let png = framed();
        let cut = &png[..png.len() - 20];
        let mut out = Vec::new();
        let err = StreamBridge::new(cut).read_to_end(&mut out).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let short = truncation(&err).expect("bridge payload");
        assert!(short.received < short.requested);
    }

    #[test]
    fn empty_source_is_truncation() {
        let mut buf = [0_u8; 32];
        let err = StreamBridge::new(io::empty()).read(&mut buf).unwrap_err();
        assert_eq!(
            truncation(&err),
            Some(TruncatedRead {
                requested: 8,
                received: 0
            })
        );
    }

    #[test]
    fn foreign_errors_pass_through() {
        let err = io::Error::other("boom");
        assert!(truncation(&err).is_none());
    }
}
