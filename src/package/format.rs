//! Container-level definitions for `.rap` recording packages.
//!
//! ```text
//! u8      format_version          (= 1)
//! i32     recording_count N
//! N ×     i64 compressed_length L, u8[L] DEFLATE(record payload)
//! ```
//!
//! All integers are little-endian. Each record payload is compressed on its
//! own so a reader can skip or stream entries without inflating the rest.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use super::codec::CodecError;

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Conventional file extension for recording packages.
pub const FILE_EXTENSION: &str = "rap";

/// Map a short read to `TruncatedStream`, anything else to `Io`.
pub(crate) fn stream_error(e: io::Error) -> CodecError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::TruncatedStream
    } else {
        CodecError::Io(e)
    }
}

/// Fixed header at the start of every package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    pub recording_count: i32,
}

impl ContainerHeader {
    /// Version(1) + RecordingCount(4) = 5
    pub const SIZE: usize = 5;

    pub fn new(recording_count: i32) -> Self {
        Self {
            version: FORMAT_VERSION,
            recording_count,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u8(self.version)?;
        w.write_i32::<LittleEndian>(self.recording_count)?;
        Ok(())
    }

    /// Read and validate a header, consuming exactly [`Self::SIZE`] bytes on
    /// success.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let version = r.read_u8().map_err(stream_error)?;
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let recording_count = r.read_i32::<LittleEndian>().map_err(stream_error)?;
        if recording_count < 0 {
            return Err(CodecError::CorruptPayload(format!(
                "negative recording count {recording_count}"
            )));
        }
        Ok(Self {
            version,
            recording_count,
        })
    }
}

/// Compress a record payload with raw DEFLATE.
pub fn compress_deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Largest record payload a package entry may inflate to.
pub const MAX_PAYLOAD_SIZE: u64 = 256 * 1024 * 1024;

/// Inflate a raw DEFLATE record payload of at most `limit` bytes.
///
/// Anything that inflates past `limit` is rejected before it is fully
/// buffered.
pub fn decompress_deflate(data: &[u8], limit: u64) -> Result<Vec<u8>, CodecError> {
    let mut decoder = DeflateDecoder::new(data).take(limit.saturating_add(1));
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).min(limit as usize));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodecError::CorruptPayload(format!("decompression failed: {e}")))?;
    if out.len() as u64 > limit {
        return Err(CodecError::CorruptPayload(format!(
            "payload inflates past {limit} bytes"
        )));
    }
    Ok(out)
}
