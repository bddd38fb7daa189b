//! Field-level encoding of a single [`Recording`] inside a package entry.
//!
//! ```text
//! string    := u32 byte_len, UTF-8 bytes
//! map       := u32 count, count × (string, string)     ascending keys
//! event     := f64 time, string name, string contents
//! vector    := f64 time, f64 x, f64 y, f64 z
//! life      := f64 time, u8 kind
//!
//! recording := string name, map metadata, u32 n × event, u32 n × subject
//! subject   := i64 id, string name, map metadata,
//!              u32 n × vector (positions), u32 n × vector (rotations),
//!              u32 n × life, u32 n × event
//! ```
//!
//! Every parse failure inside a payload is `CorruptPayload`: the container
//! already delivered the full compressed entry, so a short read here means
//! the payload itself is malformed.

use std::io::{self, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::DVec3;

use super::codec::CodecError;
use crate::schema::{
    EulerAngles, LifecycleKind, Metadata, NamedEvent, NamedEventSample, Recording, Sample,
    SubjectRecording,
};

/// Smallest encoded size of each element kind, used to reject counts that
/// cannot fit in the remaining payload before allocating.
const MIN_EVENT_SIZE: usize = 8 + 4 + 4;
const MIN_VECTOR_SIZE: usize = 8 * 4;
const MIN_LIFE_SIZE: usize = 8 + 1;
const MIN_PAIR_SIZE: usize = 4 + 4;
const MIN_SUBJECT_SIZE: usize = 8 + 4 + 4 + 4 * 4;

// ---- writing ----

fn write_len<W: Write>(w: &mut W, len: usize) -> io::Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("length {len} does not fit in u32"),
        )
    })?;
    w.write_u32::<LittleEndian>(len)
}

fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())
}

fn write_map<W: Write>(w: &mut W, map: &Metadata) -> io::Result<()> {
    write_len(w, map.len())?;
    for (key, value) in map {
        write_string(w, key)?;
        write_string(w, value)?;
    }
    Ok(())
}

fn write_events<W: Write>(w: &mut W, events: &[NamedEventSample]) -> io::Result<()> {
    write_len(w, events.len())?;
    for event in events {
        w.write_f64::<LittleEndian>(event.time)?;
        write_string(w, &event.value.name)?;
        write_string(w, &event.value.contents)?;
    }
    Ok(())
}

fn write_vectors<W: Write>(
    w: &mut W,
    samples: impl ExactSizeIterator<Item = (f64, DVec3)>,
) -> io::Result<()> {
    write_len(w, samples.len())?;
    for (time, v) in samples {
        w.write_f64::<LittleEndian>(time)?;
        w.write_f64::<LittleEndian>(v.x)?;
        w.write_f64::<LittleEndian>(v.y)?;
        w.write_f64::<LittleEndian>(v.z)?;
    }
    Ok(())
}

fn write_subject<W: Write>(w: &mut W, subject: &SubjectRecording) -> io::Result<()> {
    w.write_i64::<LittleEndian>(subject.id)?;
    write_string(w, &subject.name)?;
    write_map(w, &subject.metadata)?;
    write_vectors(w, subject.positions.iter().map(|s| (s.time, s.value)))?;
    write_vectors(w, subject.rotations.iter().map(|s| (s.time, s.value.degrees())))?;

    write_len(w, subject.lifecycle.len())?;
    for life in &subject.lifecycle {
        w.write_f64::<LittleEndian>(life.time)?;
        w.write_u8(life.value as u8)?;
    }

    write_events(w, &subject.events)
}

/// Serialize one recording into an uncompressed payload.
pub fn write_recording<W: Write>(w: &mut W, recording: &Recording) -> io::Result<()> {
    write_string(w, recording.name())?;
    write_map(w, recording.metadata())?;
    write_events(w, recording.events())?;
    write_len(w, recording.subjects().len())?;
    for subject in recording.subjects() {
        write_subject(w, subject)?;
    }
    Ok(())
}

// ---- reading ----

/// Cursor over a decompressed payload.
struct PayloadReader<'a> {
    buf: &'a [u8],
}

fn corrupt(what: &str) -> impl FnOnce(io::Error) -> CodecError + '_ {
    move |_| CodecError::CorruptPayload(format!("payload ends inside {what}"))
}

impl<'a> PayloadReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn u8(&mut self, what: &str) -> Result<u8, CodecError> {
        self.buf.read_u8().map_err(corrupt(what))
    }

    fn f64(&mut self, what: &str) -> Result<f64, CodecError> {
        self.buf.read_f64::<LittleEndian>().map_err(corrupt(what))
    }

    fn i64(&mut self, what: &str) -> Result<i64, CodecError> {
        self.buf.read_i64::<LittleEndian>().map_err(corrupt(what))
    }

    /// Read an element count and check it can fit in what is left.
    fn count(&mut self, what: &str, min_size: usize) -> Result<usize, CodecError> {
        let n = self.buf.read_u32::<LittleEndian>().map_err(corrupt(what))? as usize;
        if n.saturating_mul(min_size) > self.buf.len() {
            return Err(CodecError::CorruptPayload(format!(
                "{what} count {n} exceeds remaining {} bytes",
                self.buf.len()
            )));
        }
        Ok(n)
    }

    fn string(&mut self, what: &str) -> Result<String, CodecError> {
        let len = self.count(what, 1)?;
        let (bytes, rest) = self.buf.split_at(len);
        self.buf = rest;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| CodecError::CorruptPayload(format!("{what} is not valid UTF-8")))
    }

    fn map(&mut self, what: &str) -> Result<Metadata, CodecError> {
        let n = self.count(what, MIN_PAIR_SIZE)?;
        let mut map = Metadata::new();
        for _ in 0..n {
            let key = self.string("metadata key")?;
            let value = self.string("metadata value")?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn events(&mut self) -> Result<Vec<NamedEventSample>, CodecError> {
        let n = self.count("events", MIN_EVENT_SIZE)?;
        let mut events = Vec::with_capacity(n);
        for _ in 0..n {
            let time = self.f64("event time")?;
            let name = self.string("event name")?;
            let contents = self.string("event contents")?;
            events.push(Sample::new(time, NamedEvent { name, contents }));
        }
        Ok(events)
    }

    fn vectors(&mut self, what: &str) -> Result<Vec<Sample<DVec3>>, CodecError> {
        let n = self.count(what, MIN_VECTOR_SIZE)?;
        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            let time = self.f64(what)?;
            let x = self.f64(what)?;
            let y = self.f64(what)?;
            let z = self.f64(what)?;
            samples.push(Sample::new(time, DVec3::new(x, y, z)));
        }
        Ok(samples)
    }

    fn subject(&mut self) -> Result<SubjectRecording, CodecError> {
        let id = self.i64("subject id")?;
        let name = self.string("subject name")?;
        let metadata = self.map("subject metadata")?;
        let positions = self.vectors("positions")?;
        let rotations = self
            .vectors("rotations")?
            .into_iter()
            .map(|s| Sample::new(s.time, EulerAngles(s.value)))
            .collect();

        let n = self.count("lifecycle events", MIN_LIFE_SIZE)?;
        let mut lifecycle = Vec::with_capacity(n);
        for _ in 0..n {
            let time = self.f64("lifecycle time")?;
            let raw = self.u8("lifecycle kind")?;
            let kind = LifecycleKind::from_u8(raw).ok_or_else(|| {
                CodecError::CorruptPayload(format!("unknown lifecycle kind {raw}"))
            })?;
            lifecycle.push(Sample::new(time, kind));
        }

        let events = self.events()?;
        Ok(SubjectRecording {
            id,
            name,
            metadata,
            positions,
            rotations,
            lifecycle,
            events,
        })
    }
}

/// Parse one uncompressed payload. The whole buffer must be consumed.
pub fn read_recording(payload: &[u8]) -> Result<Recording, CodecError> {
    let mut reader = PayloadReader::new(payload);
    let name = reader.string("recording name")?;
    let metadata = reader.map("recording metadata")?;
    let events = reader.events()?;

    let n = reader.count("subjects", MIN_SUBJECT_SIZE)?;
    let mut subjects = Vec::with_capacity(n);
    for _ in 0..n {
        subjects.push(reader.subject()?);
    }

    if !reader.buf.is_empty() {
        return Err(CodecError::CorruptPayload(format!(
            "{} trailing bytes after recording",
            reader.buf.len()
        )));
    }
    Ok(Recording::new(subjects, events, metadata).with_name(name))
}
