//! JSON view of recordings.
//!
//! Field order is fixed by the structs below, floats are written in their
//! shortest round-trip form and strings are escaped by `serde_json`. JSON has
//! no NaN or infinity, so a recording holding one fails to export instead of
//! silently turning into `null`.

use std::io::Write;

use serde::{Serialize, Serializer, ser};

use crate::schema::{
    LifecycleEventSample, Metadata, NamedEventSample, Recording, SubjectRecording, VectorSample,
};

fn finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(ser::Error::custom(format!(
            "non-finite number {value} cannot be written as JSON"
        )))
    }
}

#[derive(Serialize)]
struct EventJson<'a> {
    #[serde(rename = "Time", serialize_with = "finite")]
    time: f64,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Contents")]
    contents: &'a str,
}

impl<'a> From<&'a NamedEventSample> for EventJson<'a> {
    fn from(e: &'a NamedEventSample) -> Self {
        Self {
            time: e.time,
            name: &e.value.name,
            contents: &e.value.contents,
        }
    }
}

#[derive(Serialize)]
struct LifecycleJson {
    #[serde(rename = "Time", serialize_with = "finite")]
    time: f64,
    #[serde(rename = "Type")]
    kind: &'static str,
}

impl From<&LifecycleEventSample> for LifecycleJson {
    fn from(e: &LifecycleEventSample) -> Self {
        Self {
            time: e.time,
            kind: e.value.as_str(),
        }
    }
}

#[derive(Serialize)]
struct VectorJson {
    #[serde(rename = "Time", serialize_with = "finite")]
    time: f64,
    #[serde(rename = "X", serialize_with = "finite")]
    x: f64,
    #[serde(rename = "Y", serialize_with = "finite")]
    y: f64,
    #[serde(rename = "Z", serialize_with = "finite")]
    z: f64,
}

impl From<&VectorSample> for VectorJson {
    fn from(s: &VectorSample) -> Self {
        Self {
            time: s.time,
            x: s.value.x,
            y: s.value.y,
            z: s.value.z,
        }
    }
}

#[derive(Serialize)]
struct SubjectJson<'a> {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Metadata")]
    metadata: &'a Metadata,
    #[serde(rename = "Duration", serialize_with = "finite")]
    duration: f64,
    #[serde(rename = "LifeCycleEvents")]
    lifecycle: Vec<LifecycleJson>,
    #[serde(rename = "CustomEvents")]
    events: Vec<EventJson<'a>>,
    #[serde(rename = "Positions")]
    positions: Vec<VectorJson>,
    #[serde(rename = "Rotations")]
    rotations: Vec<VectorJson>,
}

impl<'a> From<&'a SubjectRecording> for SubjectJson<'a> {
    fn from(s: &'a SubjectRecording) -> Self {
        Self {
            id: s.id,
            name: &s.name,
            metadata: &s.metadata,
            duration: s.duration().unwrap_or(0.0),
            lifecycle: s.lifecycle.iter().map(LifecycleJson::from).collect(),
            events: s.events.iter().map(EventJson::from).collect(),
            positions: s.positions.iter().map(VectorJson::from).collect(),
            rotations: s
                .rotations
                .iter()
                .map(|r| VectorJson::from(&VectorSample::new(r.time, r.value.degrees())))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct RecordingJson<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Duration", serialize_with = "finite")]
    duration: f64,
    #[serde(rename = "Metadata")]
    metadata: &'a Metadata,
    #[serde(rename = "CustomEvents")]
    events: Vec<EventJson<'a>>,
    #[serde(rename = "Subjects")]
    subjects: Vec<SubjectJson<'a>>,
}

impl<'a> From<&'a Recording> for RecordingJson<'a> {
    fn from(r: &'a Recording) -> Self {
        Self {
            name: r.name(),
            duration: r.duration(),
            metadata: r.metadata(),
            events: r.events().iter().map(EventJson::from).collect(),
            subjects: r.subjects().iter().map(SubjectJson::from).collect(),
        }
    }
}

/// Render one recording as a JSON object.
pub fn to_json(recording: &Recording) -> serde_json::Result<String> {
    serde_json::to_string(&RecordingJson::from(recording))
}

/// Write `recordings` as a JSON array.
pub fn write_json<W: Write>(
    writer: W,
    recordings: &[Recording],
    pretty: bool,
) -> serde_json::Result<()> {
    let views: Vec<RecordingJson<'_>> = recordings.iter().map(RecordingJson::from).collect();
    if pretty {
        serde_json::to_writer_pretty(writer, &views)
    } else {
        serde_json::to_writer(writer, &views)
    }
}
