//! CSV tables for recordings.
//!
//! One directory per export, one file per table. A single recording gets
//! tables keyed by subject id; several recordings get an extra leading
//! `Recording` column plus a `Recordings.csv` index. Session-level events and
//! metadata use subject id `-1`.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::schema::{Metadata, NamedEventSample, Recording};

/// Subject id used for rows that belong to the whole session.
pub const SESSION_SUBJECT_ID: i64 = -1;

/// Quote a cell if it contains a comma, quote, CR or LF.
pub fn csv_cell(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

/// One output file being built.
struct Table {
    file: &'static str,
    body: String,
}

impl Table {
    fn new(file: &'static str, header: &str, multi: bool) -> Self {
        let body = if multi {
            format!("Recording, {header}\n")
        } else {
            format!("{header}\n")
        };
        Self { file, body }
    }

    /// Append one row. `recording` is the leading column for multi exports.
    fn row(&mut self, recording: Option<usize>, cells: &[&dyn std::fmt::Display]) {
        let mut first = true;
        if let Some(i) = recording {
            let _ = write!(self.body, "{i}");
            first = false;
        }
        for cell in cells {
            if !first {
                self.body.push_str(", ");
            }
            let _ = write!(self.body, "{cell}");
            first = false;
        }
        self.body.push('\n');
    }
}

fn event_rows(table: &mut Table, recording: Option<usize>, id: i64, events: &[NamedEventSample]) {
    for e in events {
        table.row(
            recording,
            &[
                &id,
                &e.time,
                &csv_cell(&e.value.name),
                &csv_cell(&e.value.contents),
            ],
        );
    }
}

fn metadata_rows(table: &mut Table, recording: Option<usize>, id: i64, metadata: &Metadata) {
    for (key, value) in metadata {
        table.row(recording, &[&id, &csv_cell(key), &csv_cell(value)]);
    }
}

/// Build every table for `recordings`, in file order.
fn build_tables(recordings: &[Recording]) -> Vec<Table> {
    let multi = recordings.len() > 1;
    let mut index = Table::new("Recordings.csv", "ID, Name", false);
    let mut subjects = Table::new("Subjects.csv", "ID, Name", multi);
    let mut metadata = Table::new("SubjectMetaData.csv", "SubjectID, Key, Value", multi);
    let mut events = Table::new("CustomEvents.csv", "SubjectID, Time, Name, Contents", multi);
    let mut positions = Table::new("PositionData.csv", "SubjectID, Time, X, Y, Z", multi);
    let mut rotations = Table::new("RotationData.csv", "SubjectID, Time, X, Y, Z", multi);
    let mut lifecycle = Table::new("LifeCycleEvents.csv", "SubjectID, Time, Event", multi);

    for (i, recording) in recordings.iter().enumerate() {
        let r = multi.then_some(i);
        index.row(None, &[&i, &csv_cell(recording.name())]);

        for s in recording.subjects() {
            subjects.row(r, &[&s.id, &csv_cell(&s.name)]);
            metadata_rows(&mut metadata, r, s.id, &s.metadata);
            event_rows(&mut events, r, s.id, &s.events);
            for p in &s.positions {
                positions.row(r, &[&s.id, &p.time, &p.value.x, &p.value.y, &p.value.z]);
            }
            for q in &s.rotations {
                let d = q.value.degrees();
                rotations.row(r, &[&s.id, &q.time, &d.x, &d.y, &d.z]);
            }
            for l in &s.lifecycle {
                lifecycle.row(r, &[&s.id, &l.time, &l.value]);
            }
        }

        metadata_rows(&mut metadata, r, SESSION_SUBJECT_ID, recording.metadata());
        event_rows(&mut events, r, SESSION_SUBJECT_ID, recording.events());
    }

    let mut tables = Vec::with_capacity(7);
    if multi {
        tables.push(index);
    }
    tables.extend([subjects, metadata, events, positions, rotations, lifecycle]);
    tables
}

/// Write CSV tables for `recordings` into `dir`, creating it if needed.
///
/// Returns the paths written.
pub fn write_csv_dir<P: AsRef<Path>>(
    dir: P,
    recordings: &[Recording],
) -> io::Result<Vec<PathBuf>> {
    if recordings.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no recordings to export",
        ));
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for table in build_tables(recordings) {
        let path = dir.join(table.file);
        fs::write(&path, table.body)?;
        written.push(path);
    }
    log::info!("Exported {} CSV tables to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EulerAngles, LifecycleKind, NamedEvent, Sample, SubjectRecording};
    use glam::DVec3;
    use tempfile::tempdir;

    fn recording(name: &str) -> Recording {
        let mut subject = SubjectRecording::new(3, "box, large");
        subject.metadata.insert("color".into(), "red".into());
        subject.positions = vec![Sample::new(0.5, DVec3::new(1.0, 2.5, -3.0))];
        subject.rotations = vec![Sample::new(0.5, EulerAngles::new(0.0, 45.0, 0.0))];
        subject.lifecycle = vec![Sample::new(0.25, LifecycleKind::Enable)];
        subject.events = vec![Sample::new(0.75, NamedEvent::new("said", "\"hi\""))];

        let mut metadata = Metadata::new();
        metadata.insert("map".into(), "dust".into());
        Recording::new(
            vec![subject],
            vec![Sample::new(0.1, NamedEvent::new("round", "1"))],
            metadata,
        )
        .with_name(name)
    }

    #[test]
    fn test_cell_quoting() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a,b"), "\"a,b\"");
        assert_eq!(csv_cell("say \"x\""), "\"say \"\"x\"\"\"");
        assert_eq!(csv_cell("two\nlines"), "\"two\nlines\"");
        assert!(matches!(csv_cell("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_single_recording_tables() {
        let dir = tempdir().unwrap();
        let written = write_csv_dir(dir.path(), &[recording("only")]).unwrap();
        assert_eq!(written.len(), 6);
        assert!(!dir.path().join("Recordings.csv").exists());

        let read = |f: &str| fs::read_to_string(dir.path().join(f)).unwrap();
        assert_eq!(read("Subjects.csv"), "ID, Name\n3, \"box, large\"\n");
        assert_eq!(
            read("CustomEvents.csv"),
            "SubjectID, Time, Name, Contents\n3, 0.75, said, \"\"\"hi\"\"\"\n-1, 0.1, round, 1\n"
        );
        assert_eq!(
            read("PositionData.csv"),
            "SubjectID, Time, X, Y, Z\n3, 0.5, 1, 2.5, -3\n"
        );
        assert_eq!(
            read("RotationData.csv"),
            "SubjectID, Time, X, Y, Z\n3, 0.5, 0, 45, 0\n"
        );
        assert_eq!(
            read("LifeCycleEvents.csv"),
            "SubjectID, Time, Event\n3, 0.25, Enable\n"
        );
        assert_eq!(
            read("SubjectMetaData.csv"),
            "SubjectID, Key, Value\n3, color, red\n-1, map, dust\n"
        );
    }

    #[test]
    fn test_multiple_recordings_tables() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("export");
        let written = write_csv_dir(&out, &[recording("first"), recording("second")]).unwrap();
        assert_eq!(written.len(), 7);

        let read = |f: &str| fs::read_to_string(out.join(f)).unwrap();
        assert_eq!(read("Recordings.csv"), "ID, Name\n0, first\n1, second\n");
        assert_eq!(
            read("Subjects.csv"),
            "Recording, ID, Name\n0, 3, \"box, large\"\n1, 3, \"box, large\"\n"
        );
        let lifecycle = read("LifeCycleEvents.csv");
        assert!(lifecycle.starts_with("Recording, SubjectID, Time, Event\n"));
        assert!(lifecycle.contains("1, 3, 0.25, Enable\n"));
    }

    #[test]
    fn test_empty_export_rejected() {
        let dir = tempdir().unwrap();
        assert!(write_csv_dir(dir.path(), &[]).is_err());
    }
}
