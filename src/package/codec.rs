//! Packaging recordings into `.rap` containers and unpacking them again.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::format::{
    ContainerHeader, MAX_PAYLOAD_SIZE, compress_deflate, decompress_deflate, stream_error,
};
use super::wire::{read_recording, write_recording};
use crate::schema::Recording;

/// Errors from packaging and unpacking.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("No recordings to package")]
    EmptyInput,
    #[error("Unsupported package version: {0}")]
    UnsupportedVersion(u8),
    #[error("Package ended unexpectedly")]
    TruncatedStream,
    #[error("Corrupt recording payload: {0}")]
    CorruptPayload(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Package `recordings` into an in-memory container.
pub fn encode(recordings: &[Recording]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    encode_to(&mut out, recordings)?;
    Ok(out)
}

/// Package `recordings` into `w`.
pub fn encode_to<W: Write>(w: &mut W, recordings: &[Recording]) -> Result<(), CodecError> {
    if recordings.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let count = i32::try_from(recordings.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} recordings do not fit in one package", recordings.len()),
        )
    })?;

    ContainerHeader::new(count).write_to(w)?;

    let mut payload = Vec::new();
    for recording in recordings {
        payload.clear();
        write_recording(&mut payload, recording)?;
        let compressed = compress_deflate(&payload)?;
        log::debug!(
            "Packed recording '{}': {} bytes -> {} bytes",
            recording.name(),
            payload.len(),
            compressed.len()
        );
        w.write_i64::<LittleEndian>(compressed.len() as i64)?;
        w.write_all(&compressed)?;
    }
    Ok(())
}

/// Unpack every recording in an in-memory container.
pub fn decode(bytes: &[u8]) -> Result<Vec<Recording>, CodecError> {
    let mut reader = bytes;
    decode_from(&mut reader)
}

/// Unpack every recording from `r`.
///
/// Only the declared number of entries is read; anything after them is left
/// in the stream.
pub fn decode_from<R: Read>(r: &mut R) -> Result<Vec<Recording>, CodecError> {
    let header = ContainerHeader::read_from(r)?;
    let mut recordings = Vec::with_capacity(header.recording_count.min(1024) as usize);
    let mut compressed = Vec::new();

    for i in 0..header.recording_count {
        let len = r.read_i64::<LittleEndian>().map_err(stream_error)?;
        let len = u64::try_from(len).map_err(|_| {
            CodecError::CorruptPayload(format!("entry {i} has negative length {len}"))
        })?;

        // Read through `take` so a bogus length cannot force a huge allocation.
        compressed.clear();
        r.by_ref()
            .take(len)
            .read_to_end(&mut compressed)
            .map_err(stream_error)?;
        if (compressed.len() as u64) < len {
            return Err(CodecError::TruncatedStream);
        }

        let payload = decompress_deflate(&compressed, MAX_PAYLOAD_SIZE)?;
        recordings.push(read_recording(&payload)?);
    }

    log::debug!("Unpacked {} recordings", recordings.len());
    Ok(recordings)
}

/// Number of recordings in an in-memory container, from the header alone.
pub fn peek(bytes: &[u8]) -> Result<usize, CodecError> {
    let mut reader = bytes;
    peek_from(&mut reader)
}

/// Number of recordings in the container at the head of `r`.
///
/// Consumes exactly the 5 header bytes.
pub fn peek_from<R: Read>(r: &mut R) -> Result<usize, CodecError> {
    let header = ContainerHeader::read_from(r)?;
    Ok(header.recording_count as usize)
}

/// Write `recordings` to a package file, replacing any existing file.
pub fn write_file<P: AsRef<Path>>(path: P, recordings: &[Recording]) -> Result<(), CodecError> {
    if recordings.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    encode_to(&mut writer, recordings)?;
    writer.flush()?;
    log::info!(
        "Wrote {} recordings to {}",
        recordings.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read every recording from a package file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Recording>, CodecError> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let recordings = decode_from(&mut reader)?;
    log::info!(
        "Read {} recordings from {}",
        recordings.len(),
        path.as_ref().display()
    );
    Ok(recordings)
}

/// Number of recordings in a package file, reading only its header.
pub fn peek_file<P: AsRef<Path>>(path: P) -> Result<usize, CodecError> {
    let mut file = File::open(path)?;
    peek_from(&mut file)
}
